//! Shared field validation.

use crate::error::{AppError, MAX_TEXT_LEN};

/// Trim `value` and accept it if it holds 1..=200 characters.
fn trimmed(value: &str) -> Option<String> {
    let value = value.trim();
    let len = value.chars().count();
    (len > 0 && len <= MAX_TEXT_LEN).then(|| value.to_string())
}

/// Validate and trim a department name.
pub fn validate_name(name: &str) -> Result<String, AppError> {
    trimmed(name).ok_or(AppError::InvalidName)
}

/// Validate and trim an employee's full name.
pub fn validate_full_name(full_name: &str) -> Result<String, AppError> {
    trimmed(full_name).ok_or(AppError::InvalidFullName)
}

/// Validate and trim an employee's position.
pub fn validate_position(position: &str) -> Result<String, AppError> {
    trimmed(position).ok_or(AppError::InvalidPosition)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(validate_name("  Engineering \t").unwrap(), "Engineering");
    }

    #[test]
    fn test_rejects_blank() {
        assert!(matches!(validate_name(""), Err(AppError::InvalidName)));
        assert!(matches!(validate_name("   "), Err(AppError::InvalidName)));
        assert!(matches!(validate_full_name("\n"), Err(AppError::InvalidFullName)));
        assert!(matches!(validate_position(""), Err(AppError::InvalidPosition)));
    }

    #[test]
    fn test_length_limit_in_characters() {
        let max = "я".repeat(MAX_TEXT_LEN);
        assert_eq!(validate_name(&max).unwrap(), max);

        let over = "a".repeat(MAX_TEXT_LEN + 1);
        assert!(matches!(validate_name(&over), Err(AppError::InvalidName)));

        // Surrounding whitespace does not count towards the limit
        let padded = format!("  {}  ", "b".repeat(MAX_TEXT_LEN));
        assert!(validate_position(&padded).is_ok());
    }
}
