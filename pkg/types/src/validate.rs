use crate::error::{GovernanceError, GovernanceResult};
use crate::resources::ResourceAmounts;

/// Validate an identifier used in namespace names and registry keys
/// (org IDs, zone IDs, VDC IDs, zone names).
/// Rules: lowercase `[a-z0-9-]`, max 63 chars, no leading/trailing hyphens.
pub fn validate_identifier(what: &str, value: &str) -> GovernanceResult<()> {
    if value.is_empty() {
        return Err(GovernanceError::InvalidInput(format!(
            "{} must not be empty",
            what
        )));
    }
    if value.len() > 63 {
        return Err(GovernanceError::InvalidInput(format!(
            "{} '{}' exceeds 63 characters (got {})",
            what,
            value,
            value.len()
        )));
    }
    if value.starts_with('-') || value.ends_with('-') {
        return Err(GovernanceError::InvalidInput(format!(
            "{} '{}' must not start or end with a hyphen",
            what, value
        )));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(GovernanceError::InvalidInput(format!(
            "{} '{}' must contain only lowercase letters, digits, and hyphens [a-z0-9-]",
            what, value
        )));
    }
    Ok(())
}

/// Resource requests and quotas must not be negative.
pub fn validate_amounts(what: &str, amounts: &ResourceAmounts) -> GovernanceResult<()> {
    match amounts.first_negative() {
        Some(resource) => Err(GovernanceError::InvalidInput(format!(
            "{} {} must not be negative (got {})",
            what,
            resource,
            amounts.get(resource)
        ))),
        None => Ok(()),
    }
}
