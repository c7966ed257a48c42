use std::sync::LazyLock;

use regex::Regex;

use super::ApiError;

/// Shell metacharacters stripped from command-runner arguments. Everything
/// else, including `$()`, backticks and newlines, passes through.
static COMMAND_METACHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[;&|]").unwrap_or_else(|e| panic!("invalid metachar pattern: {e}"))
});

/// Minimum length plus one lowercase, one uppercase, one digit.
pub fn validate_password(password: &str, min_length: usize) -> Result<(), ApiError> {
    let long_enough = password.len() >= min_length;
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_lower && has_upper && has_digit {
        Ok(())
    } else {
        Err(ApiError::WeakPassword)
    }
}

/// Extension allow-list check on the name as submitted. The name is not
/// canonicalized first, so `../../etc/passwd.txt` passes.
#[must_use]
pub fn has_allowed_extension(filename: &str, allowed: &[String]) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
}

#[must_use]
pub fn strip_command_metachars(args: &str) -> String {
    COMMAND_METACHARS.replace_all(args, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_complexity() {
        assert!(validate_password("CorrectHorse1", 8).is_ok());
        assert!(validate_password("short1A", 8).is_err());
        assert!(validate_password("nouppercase1", 8).is_err());
        assert!(validate_password("NOLOWERCASE1", 8).is_err());
        assert!(validate_password("NoDigitsHere", 8).is_err());
    }

    #[test]
    fn test_min_length_is_configurable() {
        assert!(validate_password("Ab1", 3).is_ok());
        assert!(validate_password("Ab1", 4).is_err());
    }

    #[test]
    fn test_extension_allow_list() {
        let allowed = vec!["txt".to_string(), "xml".to_string()];
        assert!(has_allowed_extension("notes.txt", &allowed));
        assert!(has_allowed_extension("NOTES.TXT", &allowed));
        assert!(!has_allowed_extension("shell.php", &allowed));
        assert!(!has_allowed_extension("noextension", &allowed));
        // Traversal segments survive the check as long as the suffix fits.
        assert!(has_allowed_extension("../../tmp/x.txt", &allowed));
    }

    #[test]
    fn test_metachar_strip_is_partial() {
        assert_eq!(strip_command_metachars("localhost; id"), "localhost id");
        assert_eq!(strip_command_metachars("a | b && c"), "a  b  c");
        // Substitution forms are untouched.
        assert_eq!(strip_command_metachars("$(id)"), "$(id)");
        assert_eq!(strip_command_metachars("`id`"), "`id`");
    }
}
