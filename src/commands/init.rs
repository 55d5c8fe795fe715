use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::storage::Mode;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory with an initial `config.json` and an empty store.
///
/// # Arguments
/// - `finboard_home` - The directory that will be the root of data directory, e.g.
///   `$HOME/finboard`
/// - `mode` - In `Mode::Memory` no SQLite file is created.
///
/// # Errors
/// - Returns an error if any file operations fail or the store already exists.
pub async fn init(finboard_home: &Path, mode: Mode) -> Result<Out<()>> {
    let config = Config::create(finboard_home, mode)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the finboard directory at {}",
        config.root().display()
    )
    .into())
}
