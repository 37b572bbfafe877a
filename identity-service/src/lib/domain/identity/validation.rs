//! Shape checks for client-supplied credentials. No side effects.

use crate::identity::errors::EmailError;
use crate::identity::errors::NameError;
use crate::identity::errors::PasswordPolicyError;
use crate::identity::errors::TokenFieldError;

pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_MAX_LENGTH: usize = 40;
pub const NAME_MAX_LENGTH: usize = 128;

/// ASCII characters of the Unicode symbol categories, which do not count as
/// punctuation.
const ASCII_SYMBOLS: &str = "$+<=>^`|~";

/// Check that `email` has an `@` placed before its last `.`.
pub fn validate_email(email: &str) -> Result<(), EmailError> {
    if email.trim().is_empty() {
        return Err(EmailError::Empty);
    }
    let at = email.find('@').ok_or(EmailError::MissingAt)?;
    let last_dot = email.rfind('.').ok_or(EmailError::MissingDot)?;
    if at >= last_dot {
        return Err(EmailError::AtAfterLastDot);
    }
    Ok(())
}

/// Check length bounds, then require lowercase, uppercase, digit and
/// punctuation. The first missing class is reported, in that order.
pub fn validate_password(password: &str) -> Result<(), PasswordPolicyError> {
    let length = password.chars().count();
    if length > PASSWORD_MAX_LENGTH {
        return Err(PasswordPolicyError::TooLong {
            max: PASSWORD_MAX_LENGTH,
        });
    }
    if length < PASSWORD_MIN_LENGTH {
        return Err(PasswordPolicyError::TooShort {
            min: PASSWORD_MIN_LENGTH,
        });
    }

    let mut has_lowercase = false;
    let mut has_uppercase = false;
    let mut has_digit = false;
    let mut has_punctuation = false;
    for c in password.chars() {
        has_lowercase |= c.is_lowercase();
        has_uppercase |= c.is_uppercase();
        has_digit |= c.is_numeric();
        has_punctuation |= is_punctuation(c);
    }

    if !has_lowercase {
        Err(PasswordPolicyError::MissingLowercase)
    } else if !has_uppercase {
        Err(PasswordPolicyError::MissingUppercase)
    } else if !has_digit {
        Err(PasswordPolicyError::MissingDigit)
    } else if !has_punctuation {
        Err(PasswordPolicyError::MissingPunctuation)
    } else {
        Ok(())
    }
}

/// ASCII punctuation in the Unicode sense (`!"#%&'()*,-./:;?@[\]_{}`).
/// Non-ASCII punctuation is not accepted.
fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() && !ASCII_SYMBOLS.contains(c)
}

pub fn validate_name(name: &str) -> Result<(), NameError> {
    if name.trim().is_empty() {
        return Err(NameError::Empty);
    }
    if name.chars().count() > NAME_MAX_LENGTH {
        return Err(NameError::TooLong {
            max: NAME_MAX_LENGTH,
        });
    }
    Ok(())
}

/// Only presence is checked here; the token engine does the rest.
pub fn validate_token(token: &str) -> Result<(), TokenFieldError> {
    if token.trim().is_empty() {
        return Err(TokenFieldError::Empty);
    }
    Ok(())
}
