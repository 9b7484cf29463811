//! Local validation for the auth and profile forms.

use crate::error::ClientError;

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), ClientError> {
        require("Username", &self.username)?;
        require("Email", &self.email)?;
        require("Password", &self.password)?;
        if self.password != self.confirm_password {
            return Err(ClientError::Validation("Passwords do not match".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PasswordChangeForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordChangeForm {
    pub fn validate(&self) -> Result<(), ClientError> {
        require("Current password", &self.current_password)?;
        require("New password", &self.new_password)?;
        if self.new_password != self.confirm_password {
            return Err(ClientError::Validation("New passwords do not match".to_string()));
        }
        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<(), ClientError> {
    if value.trim().is_empty() {
        Err(ClientError::Validation(format!("{} is required", field)))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_confirmation_mismatch() {
        let form = RegistrationForm {
            username: "satoshi".into(),
            email: "satoshi@example.com".into(),
            password: "hunter2".into(),
            confirm_password: "hunter3".into(),
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match");
    }

    #[test]
    fn test_registration_requires_fields() {
        let form = RegistrationForm {
            username: " ".into(),
            ..Default::default()
        };
        assert_eq!(form.validate().unwrap_err().to_string(), "Username is required");
    }

    #[test]
    fn test_password_change() {
        let mut form = PasswordChangeForm {
            current_password: "old".into(),
            new_password: "new-pass".into(),
            confirm_password: "new-pass".into(),
        };
        assert!(form.validate().is_ok());

        form.confirm_password = "other".into();
        assert!(matches!(form.validate(), Err(ClientError::Validation(_))));
    }
}
