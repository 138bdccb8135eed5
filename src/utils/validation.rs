//! Validation utilities

use crate::traits::*;
use crate::types::*;

/// Validate that an account code is valid
pub fn validate_account_code(code: &str) -> LedgerResult<()> {
    if code.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Account code cannot be empty".to_string(),
        ));
    }

    if code.len() > 10 {
        return Err(LedgerError::Validation(
            "Account code cannot exceed 10 characters".to_string(),
        ));
    }

    // Check for valid characters (alphanumeric, dashes, dots)
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        return Err(LedgerError::Validation(
            "Account code can only contain alphanumeric characters, dashes, and dots".to_string(),
        ));
    }

    Ok(())
}

/// Validate that an account name is valid
pub fn validate_account_name(name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Account name cannot be empty".to_string(),
        ));
    }

    if name.len() > 100 {
        return Err(LedgerError::Validation(
            "Account name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate a chart of accounts slug
pub fn validate_slug(slug: &str) -> LedgerResult<()> {
    if slug.is_empty() || slug.len() > 150 {
        return Err(LedgerError::Validation(format!(
            "Slug '{}' must be between 1 and 150 characters",
            slug
        )));
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(LedgerError::Validation(format!(
            "Slug '{}' can only contain alphanumeric characters, dashes, and underscores",
            slug
        )));
    }

    Ok(())
}

/// Enhanced account validator with detailed checks
pub struct EnhancedAccountValidator;

impl AccountValidator for EnhancedAccountValidator {
    fn validate_account(&self, account: &Account) -> LedgerResult<()> {
        validate_account_code(&account.code)?;
        validate_account_name(&account.name)?;

        if account.role_default || account.role.is_root() {
            return Err(LedgerError::Validation(format!(
                "Account {} cannot be created with structural role {}",
                account.code, account.role
            )));
        }

        Ok(())
    }
}
