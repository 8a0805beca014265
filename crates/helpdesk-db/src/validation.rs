//! Input validation for ticket, comment and reference-data fields.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty value where one is required.
    Empty(String),
    /// Value shorter than allowed.
    TooShort { field: String, min: usize, actual: usize },
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Colour is not a `#rrggbb` hex string.
    InvalidColor(String),
    /// Name already used by another row.
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// The input field this error is about.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Empty(field) => field,
            ValidationError::TooShort { field, .. } => field,
            ValidationError::TooLong { field, .. } => field,
            ValidationError::InvalidColor(_) => "color",
            ValidationError::Duplicate { field, .. } => field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::TooShort { field, min, actual } => {
                write!(f, "{} is too short ({} chars, min {})", field, actual, min)
            }
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::InvalidColor(value) => {
                write!(f, "Invalid color '{}': expected #rrggbb", value)
            }
            ValidationError::Duplicate { field, value } => {
                write!(f, "{} '{}' is already taken", field, value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Minimum length of a ticket subject.
pub const MIN_SUBJECT_LENGTH: usize = 3;

/// Maximum length of a ticket subject.
pub const MAX_SUBJECT_LENGTH: usize = 255;

/// Minimum length of ticket and comment content.
pub const MIN_CONTENT_LENGTH: usize = 6;

/// Maximum length of a status/priority/category name.
pub const MAX_NAME_LENGTH: usize = 64;

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();

    if actual == 0 {
        return Err(ValidationError::Empty(field.to_string()));
    }

    if actual < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
            actual,
        });
    }

    if actual > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            actual,
        });
    }

    Ok(())
}

/// Validate a ticket subject.
pub fn validate_subject(subject: &str) -> Result<(), ValidationError> {
    check_length("subject", subject.trim(), MIN_SUBJECT_LENGTH, MAX_SUBJECT_LENGTH)
}

/// Validate ticket or comment content.
pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    check_length("content", content.trim(), MIN_CONTENT_LENGTH, usize::MAX)
}

/// Validate a status/priority/category name.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    check_length("name", name.trim(), 1, MAX_NAME_LENGTH)
}

/// Validate a `#rrggbb` colour.
pub fn validate_color(color: &str) -> Result<(), ValidationError> {
    let color = color.trim();
    let hex = match color.strip_prefix('#') {
        Some(hex) => hex,
        None => return Err(ValidationError::InvalidColor(color.to_string())),
    };

    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidColor(color.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_subject() {
        assert!(validate_subject("Printer on fire").is_ok());
        assert!(validate_subject("  abc  ").is_ok()); // trimmed

        assert!(matches!(validate_subject(""), Err(ValidationError::Empty(_))));
        assert!(matches!(validate_subject("   "), Err(ValidationError::Empty(_))));
        assert!(matches!(
            validate_subject("ab"),
            Err(ValidationError::TooShort { min: 3, actual: 2, .. })
        ));

        let long = "a".repeat(300);
        assert!(matches!(
            validate_subject(&long),
            Err(ValidationError::TooLong { max: 255, .. })
        ));
    }

    #[test]
    fn test_validate_content() {
        assert!(validate_content("It does not print.").is_ok());
        assert!(matches!(
            validate_content("short"),
            Err(ValidationError::TooShort { .. })
        ));
    }

    #[test]
    fn test_validate_color() {
        assert!(validate_color("#0014f4").is_ok());
        assert!(validate_color("#ABCDEF").is_ok());

        assert!(validate_color("0014f4").is_err());
        assert!(validate_color("#0014f").is_err());
        assert!(validate_color("#00zzzz").is_err());
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::TooShort {
            field: "subject".to_string(),
            min: 3,
            actual: 1,
        };
        assert_eq!(err.to_string(), "subject is too short (1 chars, min 3)");
        assert_eq!(err.field(), "subject");

        let err = ValidationError::InvalidColor("red".to_string());
        assert_eq!(err.to_string(), "Invalid color 'red': expected #rrggbb");
        assert_eq!(err.field(), "color");
    }
}
