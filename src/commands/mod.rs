//! Command handlers for the finboard CLI.
//!
//! This module contains implementations for all CLI subcommands. Each handler returns an `Out`
//! carrying the message for the user and, when there is one, the structured result.

mod auth;
mod dashboard;
mod init;
mod transactions;

use crate::error::{ErrorType, IntoResult};
use crate::model::User;
use crate::{Config, Result};
use anyhow::anyhow;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use auth::{sign_in, sign_out, whoami};
pub use dashboard::{categories, dashboard, resume, Dashboard, Resume};
pub use init::init;
pub use transactions::{list, register, remove, TransactionRow};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Reads the persisted user. Every user-scoped command starts here.
///
/// # Errors
/// - `ErrorType::Storage` if the store cannot be read.
/// - `ErrorType::Auth` if nobody is signed in.
async fn signed_in_user(config: &Config) -> Result<User> {
    let mut session = config.session();
    session.restore().await.pub_result(ErrorType::Storage)?;
    session
        .current_user()
        .cloned()
        .ok_or_else(|| anyhow!("Nobody is signed in, run 'finboard sign-in' first"))
        .pub_result(ErrorType::Auth)
}
