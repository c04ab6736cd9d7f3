//! Request payload checks, collected per field so a client sees every
//! problem at once.

use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(&mut self, field: &'static str, message: &'static str) {
        self.errors.push(FieldError { field, message });
    }

    pub fn email(&mut self, field: &'static str, value: &str) -> &mut Self {
        if !is_email(value) {
            self.fail(field, "Invalid email format");
        }
        self
    }

    pub fn optional_email(&mut self, field: &'static str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.email(field, value);
        }
        self
    }

    pub fn password(&mut self, field: &'static str, value: &str) -> &mut Self {
        let len = value.chars().count();
        if len < 6 {
            self.fail(field, "Password must be at least 6 characters");
        } else if len > 128 {
            self.fail(field, "Password must be less than 128 characters");
        }
        self
    }

    pub fn name(&mut self, field: &'static str, value: &str) -> &mut Self {
        let len = value.trim().chars().count();
        if len == 0 {
            self.fail(field, "Name is required");
        } else if len > 100 {
            self.fail(field, "Name must be less than 100 characters");
        }
        self
    }

    pub fn required(&mut self, field: &'static str, value: &str, message: &'static str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, message);
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

/// Loose shape check: one `@` with something on each side and a dot in the domain.
fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !value.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_email("ana@example.com"));
        assert!(is_email("a.b+c@mail.example.org"));
        assert!(!is_email("ana"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("ana@example"));
        assert!(!is_email("ana@@example.com"));
        assert!(!is_email("ana maria@example.com"));
    }

    #[test]
    fn collects_every_failure() {
        let err = Validator::new()
            .email("email", "nope")
            .password("password", "123")
            .name("name", "  ")
            .finish()
            .unwrap_err();

        let ApiError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        let names: Vec<_> = fields.iter().map(|f| f.field).collect();
        assert_eq!(names, ["email", "password", "name"]);
    }

    #[test]
    fn password_bounds() {
        assert!(Validator::new().password("p", "123456").finish().is_ok());
        assert!(Validator::new().password("p", &"x".repeat(128)).finish().is_ok());
        assert!(Validator::new().password("p", &"x".repeat(129)).finish().is_err());
    }
}
