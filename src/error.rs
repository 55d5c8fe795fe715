//! Error types shared by the library and the CLI.
//!
//! Errors are `anyhow` errors throughout. Commands tag their failures with an `ErrorType` so that
//! callers can tell an authentication problem from a storage or validation problem without
//! parsing messages.

use std::fmt::{Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of a failure surfaced by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// The home directory or `config.json` is missing or invalid.
    Config,
    /// Reading or writing the key-value store failed.
    Storage,
    /// Sign-in failed or no user is signed in.
    Auth,
    /// The user supplied input that cannot be accepted.
    Validation,
    /// A network request to an identity provider failed.
    Request,
}

impl Display for ErrorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorType::Config => "configuration error",
            ErrorType::Storage => "storage error",
            ErrorType::Auth => "authentication error",
            ErrorType::Validation => "invalid input",
            ErrorType::Request => "request failed",
        };
        f.write_str(s)
    }
}

/// Extension for tagging a result with an `ErrorType` on its way out of a command.
pub trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| e.into().context(error_type))
    }
}

/// Returns the `ErrorType` that a command attached to `e`, if any.
pub fn error_type(e: &Error) -> Option<ErrorType> {
    e.downcast_ref::<ErrorType>().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_pub_result_attaches_type() {
        let r: std::result::Result<(), Error> = Err(anyhow!("disk is full"));
        let e = r.pub_result(ErrorType::Storage).unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Storage));
        assert_eq!(format!("{e:#}"), "storage error: disk is full");
    }

    #[test]
    fn test_untagged_error_has_no_type() {
        let e = anyhow!("plain");
        assert_eq!(error_type(&e), None);
    }
}
