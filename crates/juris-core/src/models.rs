//! Domain models for Juris accounts.

pub mod client;
pub mod user;

use crate::error::{JurisError, JurisResult};

/// Reject `value` when it is longer than `max` characters.
pub(crate) fn check_length(field: &str, value: Option<&str>, max: usize) -> JurisResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(JurisError::validation(format!(
            "{field} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_limit_is_inclusive() {
        assert!(check_length("name", Some("abc"), 3).is_ok());
        assert!(check_length("name", None, 0).is_ok());
        let err = check_length("name", Some("abcd"), 3).unwrap_err();
        assert!(err.to_string().contains("name must be at most 3"));
    }
}
