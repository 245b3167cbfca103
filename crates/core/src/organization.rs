//! Validation for categories, tags, teams and comments.

use serde::Serialize;

use crate::error::CoreError;

/// Maximum length of a category, tag or team name.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of a free-text description.
pub const MAX_DESCRIPTION_LENGTH: usize = 1_000;

/// Maximum length of a layout comment.
pub const MAX_COMMENT_LENGTH: usize = 5_000;

/// Colour used when a category or tag is created without one.
pub const DEFAULT_COLOR: &str = "#6366F1";

/// Result of deleting an owned entity that may already be gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    AlreadyDeleted,
}

/// Validate and trim a display name. `entity` is used in error messages.
pub fn normalize_name(entity: &str, name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!(
            "{entity} name must not be empty"
        )));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "{entity} name must not exceed {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate a `#RRGGBB` hex colour, returning it upper-cased.
pub fn normalize_color(color: Option<&str>) -> Result<String, CoreError> {
    let Some(color) = color else {
        return Ok(DEFAULT_COLOR.to_string());
    };
    let hex = color.strip_prefix('#').unwrap_or("");
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CoreError::Validation(format!(
            "Color must be a hex value like #1A2B3C, got '{color}'"
        )));
    }
    Ok(format!("#{}", hex.to_ascii_uppercase()))
}

/// Validate an optional description.
pub fn validate_description(description: Option<&str>) -> Result<(), CoreError> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LENGTH => Err(CoreError::Validation(
            format!("Description must not exceed {MAX_DESCRIPTION_LENGTH} characters"),
        )),
        _ => Ok(()),
    }
}

/// Validate the body of a layout comment.
pub fn validate_comment(comment: &str) -> Result<(), CoreError> {
    if comment.trim().is_empty() {
        return Err(CoreError::Validation(
            "Comment must not be empty".to_string(),
        ));
    }
    if comment.chars().count() > MAX_COMMENT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Comment must not exceed {MAX_COMMENT_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed() {
        assert_eq!(normalize_name("Tag", "  hero ").unwrap(), "hero");
    }

    #[test]
    fn blank_name_rejected() {
        let err = normalize_name("Category", " ").unwrap_err();
        assert!(err.to_string().contains("Category name must not be empty"));
    }

    #[test]
    fn long_name_rejected() {
        assert!(normalize_name("Tag", &"t".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn color_defaults_and_normalizes() {
        assert_eq!(normalize_color(None).unwrap(), DEFAULT_COLOR);
        assert_eq!(normalize_color(Some("#a1b2c3")).unwrap(), "#A1B2C3");
    }

    #[test]
    fn malformed_colors_rejected() {
        for bad in ["a1b2c3", "#a1b2", "#gggggg", "#a1b2c3d4", ""] {
            assert!(normalize_color(Some(bad)).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn comment_must_have_content() {
        assert!(validate_comment("  ").is_err());
        assert!(validate_comment("Move the CTA up").is_ok());
    }

    #[test]
    fn delete_outcome_serializes_snake_case() {
        let json = serde_json::to_string(&DeleteOutcome::AlreadyDeleted).unwrap();
        assert_eq!(json, "\"already_deleted\"");
    }
}
