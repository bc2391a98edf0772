// Validation utilities module
// Provides custom validation functions for domain-specific rules

use validator::ValidationError;

/// Event type tags accepted on a booking
pub const EVENT_TYPES: &[&str] = &[
    "government",
    "corporate",
    "educational",
    "cultural",
    "exhibitions",
    "community",
    "competitions",
    "workshops",
    "lectures",
    "music",
    "other",
];

/// Validates that every selected event type is a known tag
pub fn validate_event_types(event_types: &[String]) -> Result<(), ValidationError> {
    for tag in event_types {
        if !EVENT_TYPES.contains(&tag.to_lowercase().as_str()) {
            return Err(ValidationError::new("unknown_event_type"));
        }
    }
    Ok(())
}

/// Validates that a contact number is plausible: digits with optional
/// leading '+', separators allowed
pub fn validate_contact_no(contact: &str) -> Result<(), ValidationError> {
    let digits = contact
        .chars()
        .filter(|c| c.is_ascii_digit())
        .count();
    let valid_chars = contact
        .chars()
        .all(|c| c.is_ascii_digit() || c == '+' || c == '-' || c == ' ' || c == '(' || c == ')');
    if digits >= 7 && digits <= 15 && valid_chars {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_contact_no"))
    }
}

/// Validates that a currency code is a three-letter uppercase code
pub fn validate_currency(currency: &str) -> Result<(), ValidationError> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_currency"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_event_types_known_tags() {
        let tags = vec!["cultural".to_string(), "music".to_string()];
        assert!(validate_event_types(&tags).is_ok());
    }

    #[test]
    fn test_validate_event_types_unknown_tag() {
        let tags = vec!["rave".to_string()];
        assert!(validate_event_types(&tags).is_err());
    }

    #[test]
    fn test_validate_contact_no() {
        assert!(validate_contact_no("+94 21 222 5555").is_ok());
        assert!(validate_contact_no("0212225555").is_ok());
        assert!(validate_contact_no("call me").is_err());
        assert!(validate_contact_no("123").is_err());
    }

    #[test]
    fn test_validate_currency() {
        assert!(validate_currency("LKR").is_ok());
        assert!(validate_currency("usd").is_err());
        assert!(validate_currency("RUPEES").is_err());
    }
}
