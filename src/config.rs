//! Chart of accounts configuration

use serde::Deserialize;

/// Settings for slug generation and location building
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CoaConfig {
    /// Leading segment of generated chart slugs
    #[serde(default = "default_slug_prefix")]
    pub slug_prefix: String,
    /// Number of trailing entity-slug characters embedded in generated slugs
    #[serde(default = "default_entity_slug_tail")]
    pub entity_slug_tail: usize,
    /// Number of random lowercase alphanumeric characters closing generated slugs
    #[serde(default = "default_slug_suffix_len")]
    pub slug_suffix_len: usize,
    /// Path prefix for generated locations
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
}

fn default_slug_prefix() -> String {
    "coa".to_string()
}

fn default_entity_slug_tail() -> usize {
    5
}

fn default_slug_suffix_len() -> usize {
    15
}

fn default_url_prefix() -> String {
    "/ledger".to_string()
}

impl Default for CoaConfig {
    fn default() -> Self {
        Self {
            slug_prefix: default_slug_prefix(),
            entity_slug_tail: default_entity_slug_tail(),
            slug_suffix_len: default_slug_suffix_len(),
            url_prefix: default_url_prefix(),
        }
    }
}
