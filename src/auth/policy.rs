use thiserror::Error;

pub const MIN_PASSWORD_LENGTH: usize = 8;

const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// First password rule that failed, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PasswordViolation {
    #[error("Password is required")]
    Missing,
    #[error("Password must be at least 8 characters long")]
    TooShort,
    #[error("Password must contain at least one uppercase letter")]
    NoUppercase,
    #[error("Password must contain at least one lowercase letter")]
    NoLowercase,
    #[error("Password must contain at least one number")]
    NoDigit,
    #[error("Password must contain at least one special character (!@#$%^&*...)")]
    NoSpecialCharacter,
}

pub type ValidationResult = Result<(), PasswordViolation>;

/// Checks password strength. Rules run in a fixed order and the first
/// failing rule is reported.
pub fn validate(password: Option<&str>) -> ValidationResult {
    let password = match password {
        Some(p) if !p.is_empty() => p,
        _ => return Err(PasswordViolation::Missing),
    };

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordViolation::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PasswordViolation::NoUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PasswordViolation::NoLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordViolation::NoDigit);
    }
    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        return Err(PasswordViolation::NoSpecialCharacter);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_strong_password() {
        assert_eq!(validate(Some("Abcdef1!")), Ok(()));
        assert_eq!(validate(Some("Secur3P@ssw0rd{}")), Ok(()));
    }

    #[test]
    fn reports_each_rule() {
        assert_eq!(validate(None), Err(PasswordViolation::Missing));
        assert_eq!(validate(Some("")), Err(PasswordViolation::Missing));
        assert_eq!(validate(Some("Ab1!xyz")), Err(PasswordViolation::TooShort));
        assert_eq!(validate(Some("abcdef1!")), Err(PasswordViolation::NoUppercase));
        assert_eq!(validate(Some("ABCDEF1!")), Err(PasswordViolation::NoLowercase));
        assert_eq!(validate(Some("Abcdefg!")), Err(PasswordViolation::NoDigit));
        assert_eq!(
            validate(Some("Abcdefg1")),
            Err(PasswordViolation::NoSpecialCharacter)
        );
    }

    #[test]
    fn earlier_rule_wins_when_several_fail() {
        // short, no upper, no digit, no special
        assert_eq!(validate(Some("abc")), Err(PasswordViolation::TooShort));
        // no upper, no lower, no special
        assert_eq!(validate(Some("12345678")), Err(PasswordViolation::NoUppercase));
        // no digit, no special
        assert_eq!(validate(Some("Abcdefgh")), Err(PasswordViolation::NoDigit));
    }

    #[test]
    fn characters_outside_the_set_are_not_special() {
        assert_eq!(
            validate(Some("Abcdef1-_+=")),
            Err(PasswordViolation::NoSpecialCharacter)
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 7 chars, 8+ bytes
        assert_eq!(validate(Some("Ab1!ééé")), Err(PasswordViolation::TooShort));
    }
}
