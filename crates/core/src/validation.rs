//! Presence and format checks run before a form is submitted to the API.
//!
//! These are the only checks the application performs itself; everything
//! else is validated by the API. A failed check blocks the submission and is
//! shown inline, so the messages are written for shoppers.

use thiserror::Error;

/// Minimum password length accepted by registration and user forms.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A form field failed a local check.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Informe o nome.")]
    NameRequired,
    #[error("Informe um e-mail válido.")]
    InvalidEmail,
    #[error("A senha deve ter pelo menos {MIN_PASSWORD_LENGTH} caracteres.")]
    PasswordTooShort,
    #[error("As senhas não coincidem.")]
    PasswordMismatch,
    #[error("Informe um preço válido.")]
    InvalidPrice,
    #[error("Campo obrigatório: {0}.")]
    Required(&'static str),
}

/// Require a non-blank name.
///
/// # Errors
///
/// Returns [`ValidationError::NameRequired`] for an empty or blank name.
pub fn require_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }
    Ok(())
}

/// Require a non-blank field.
///
/// # Errors
///
/// Returns [`ValidationError::Required`] naming the field.
pub fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

/// Require a structurally valid email: one `@`, non-empty local part, and a
/// dotted domain.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidEmail`] otherwise.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail);
    };
    let domain_ok = !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.');
    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

/// Check a new password and its confirmation.
///
/// Length is checked before equality so a short password always reports the
/// length rule.
///
/// # Errors
///
/// Returns [`ValidationError::PasswordTooShort`] or
/// [`ValidationError::PasswordMismatch`].
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_name() {
        assert_eq!(require_name("   "), Err(ValidationError::NameRequired));
        assert!(require_name("Ana").is_ok());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ana@loja.com.br").is_ok());
        assert!(validate_email(" ana@loja.com ").is_ok());
        assert!(validate_email("ana").is_err());
        assert!(validate_email("@loja.com").is_err());
        assert!(validate_email("ana@loja").is_err());
        assert!(validate_email("ana@.com").is_err());
        assert!(validate_email("a na@loja.com").is_err());
        assert!(validate_email("a@b@loja.com").is_err());
    }

    #[test]
    fn test_password_rules() {
        assert_eq!(
            validate_new_password("12345", "12345"),
            Err(ValidationError::PasswordTooShort)
        );
        assert_eq!(
            validate_new_password("123456", "1234567"),
            Err(ValidationError::PasswordMismatch)
        );
        assert!(validate_new_password("123456", "123456").is_ok());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ValidationError::PasswordMismatch.to_string(),
            "As senhas não coincidem."
        );
        assert_eq!(
            ValidationError::PasswordTooShort.to_string(),
            "A senha deve ter pelo menos 6 caracteres."
        );
    }
}
