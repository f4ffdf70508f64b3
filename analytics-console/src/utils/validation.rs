use serde::Deserialize;
use validator::ValidateEmail;

pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Invalid email format";
pub const PASSWORD_REQUIRED: &str = "Password is required";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Per-field messages rendered next to the inputs. At most one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginErrors {
    pub email: Option<&'static str>,
    pub password: Option<&'static str>,
}

impl LoginErrors {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }
}

impl LoginForm {
    pub fn normalized_email(&self) -> &str {
        self.email.trim()
    }

    pub fn validate(&self) -> Result<(), LoginErrors> {
        let email = self.normalized_email();
        let errors = LoginErrors {
            email: if email.is_empty() {
                Some(EMAIL_REQUIRED)
            } else if !email.validate_email() {
                Some(EMAIL_INVALID)
            } else {
                None
            },
            password: if self.password.is_empty() {
                Some(PASSWORD_REQUIRED)
            } else if self.password.chars().count() < MIN_PASSWORD_LEN {
                Some(PASSWORD_TOO_SHORT)
            } else {
                None
            },
        };

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn empty_email_is_required() {
        let errors = form("", "secret1").validate().unwrap_err();
        assert_eq!(errors.email, Some(EMAIL_REQUIRED));
        assert_eq!(errors.password, None);
    }

    #[test]
    fn whitespace_email_is_required() {
        let errors = form("   ", "secret1").validate().unwrap_err();
        assert_eq!(errors.email, Some(EMAIL_REQUIRED));
    }

    #[test]
    fn malformed_email_is_invalid() {
        let errors = form("abc", "secret1").validate().unwrap_err();
        assert_eq!(errors.email, Some(EMAIL_INVALID));
    }

    #[test]
    fn short_password_is_rejected() {
        let errors = form("agent@example.com", "12345").validate().unwrap_err();
        assert_eq!(errors.email, None);
        assert_eq!(errors.password, Some(PASSWORD_TOO_SHORT));
        assert!(PASSWORD_TOO_SHORT.contains("at least 6 characters"));
    }

    #[test]
    fn empty_password_is_required() {
        let errors = form("agent@example.com", "").validate().unwrap_err();
        assert_eq!(errors.password, Some(PASSWORD_REQUIRED));
    }

    #[test]
    fn both_fields_report_together() {
        let errors = form("abc", "1").validate().unwrap_err();
        assert_eq!(
            errors,
            LoginErrors {
                email: Some(EMAIL_INVALID),
                password: Some(PASSWORD_TOO_SHORT),
            }
        );
    }

    #[test]
    fn valid_input_passes() {
        assert!(form("agent@example.com", "123456").validate().is_ok());
        assert!(form("  agent@example.com ", "hunter22").validate().is_ok());
    }
}
