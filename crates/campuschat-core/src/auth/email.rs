//! Email address checks for signup and login.

use campuschat_types::error::VerificationError;

/// Normalize and syntactically validate an email address.
///
/// Returns the trimmed, lowercased address.
pub fn validate_email(raw: &str) -> Result<String, VerificationError> {
    let email = raw.trim().to_lowercase();
    let invalid = || VerificationError::InvalidEmail(raw.trim().to_string());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    // Require a dotted domain with non-empty labels.
    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return Err(invalid());
    }
    Ok(email)
}

/// Domain part of an already-validated address.
pub fn email_domain(email: &str) -> &str {
    email.rsplit_once('@').map(|(_, d)| d).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses_are_normalized() {
        assert_eq!(validate_email("  Ada@Inst.EDU ").unwrap(), "ada@inst.edu");
        assert_eq!(validate_email("a.b+c@mail.inst.edu").unwrap(), "a.b+c@mail.inst.edu");
    }

    #[test]
    fn test_invalid_addresses() {
        for bad in ["", "ada", "@inst.edu", "ada@", "ada@inst", "ada@@inst.edu", "a da@inst.edu", "ada@inst..edu"] {
            assert!(
                matches!(validate_email(bad), Err(VerificationError::InvalidEmail(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_email_domain() {
        assert_eq!(email_domain("ada@inst.edu"), "inst.edu");
    }
}
