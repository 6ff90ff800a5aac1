//! Validation helpers for user input, run before a command is built.

use validator::{ValidationError, ValidationErrors};

/// Minimum length of a virtual player name, after trimming.
pub const PLAYER_NAME_MIN: usize = 2;
/// Maximum length of a virtual player name, after trimming.
pub const PLAYER_NAME_MAX: usize = 20;

/// Validates a virtual player name: 2 to 20 characters once surrounding whitespace is removed.
///
/// # Examples
///
/// ```ignore
/// validate_player_name("Alice")  // Ok
/// validate_player_name(" A ")    // Err - too short after trim
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if !(PLAYER_NAME_MIN..=PLAYER_NAME_MAX).contains(&len) {
        let mut err = ValidationError::new("player_name_length");
        err.message = Some(
            format!(
                "Player name must be between {PLAYER_NAME_MIN} and {PLAYER_NAME_MAX} characters (got {len})"
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Validates a team name: non-empty once trimmed.
pub fn validate_team_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("team_name_empty");
        err.message = Some("Team name must not be empty".into());
        return Err(err);
    }
    Ok(())
}

/// Validates that `name` is not already used as a key by `existing`.
pub fn validate_unique<'a>(
    name: &str,
    mut existing: impl Iterator<Item = &'a String>,
) -> Result<(), ValidationError> {
    if existing.any(|taken| taken == name) {
        let mut err = ValidationError::new("name_taken");
        err.message = Some(format!("\"{name}\" already exists").into());
        err.add_param("value".into(), &name);
        return Err(err);
    }
    Ok(())
}

/// Wrap a single field error into the collection returned by command builders.
pub(crate) fn field_error(field: &'static str, error: ValidationError) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_player_name_bounds() {
        assert!(validate_player_name("Al").is_ok());
        assert!(validate_player_name("  Alice  ").is_ok());
        assert!(validate_player_name(&"x".repeat(20)).is_ok());
        assert!(validate_player_name(" A ").is_err()); // too short after trim
        assert!(validate_player_name(&"x".repeat(21)).is_err()); // too long
        assert!(validate_player_name("").is_err());
    }

    #[test]
    fn test_validate_player_name_counts_characters_not_bytes() {
        assert!(validate_player_name("Zoé").is_ok());
        assert!(validate_player_name(&"é".repeat(20)).is_ok());
    }

    #[test]
    fn test_validate_team_name() {
        assert!(validate_team_name("Red").is_ok());
        assert!(validate_team_name("   ").is_err());
    }

    #[test]
    fn test_validate_unique() {
        let taken = ["Red".to_string(), "Blue".to_string()];
        assert!(validate_unique("Green", taken.iter()).is_ok());
        let err = validate_unique("Red", taken.iter()).unwrap_err();
        assert_eq!(err.code, "name_taken");
    }
}
