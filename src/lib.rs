//! finboard: a local-first personal finance tool.
//!
//! Users sign in with Google or Apple, register income and expense transactions, and view the
//! dashboard totals and a monthly breakdown of expenses by category. All state lives in a local
//! key-value store.

pub mod aggregate;
pub mod args;
pub mod auth;
pub mod commands;
mod config;
mod error;
pub mod format;
pub mod model;
pub mod storage;
pub mod transactions;
mod utils;


pub use config::Config;
pub use error::{error_type, Error, ErrorType, IntoResult, Result};
pub use model::Amount;
pub use storage::Mode;
