use clap::Parser;
use finboard::aggregate::MonthFilter;
use finboard::args::{Args, Command};
use finboard::{commands, error_type, Config, ErrorType, IntoResult, Mode, Result};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            match error_type(&e) {
                Some(kind) => debug!("Failure type: {kind:?}"),
                None => debug!("Untyped failure"),
            }
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().finboard_home().path();

    // When FINBOARD_IN_MEMORY is set and non-empty, state is kept in memory for the duration of
    // this process only and the SQLite file is neither created nor read.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init => commands::init(home, mode).await?.print(),

        Command::SignIn(sign_in_args) => {
            let config = load(home, mode).await?;
            commands::sign_in(&config, sign_in_args).await?.print()
        }

        Command::SignOut => commands::sign_out(&load(home, mode).await?)
            .await?
            .print(),

        Command::Whoami => commands::whoami(&load(home, mode).await?)
            .await?
            .print(),

        Command::Register(register_args) => {
            let config = load(home, mode).await?;
            commands::register(&config, register_args).await?.print()
        }

        Command::Remove(remove_args) => {
            let config = load(home, mode).await?;
            commands::remove(&config, remove_args).await?.print()
        }

        Command::List => commands::list(&load(home, mode).await?)
            .await?
            .print(),

        Command::Dashboard => commands::dashboard(&load(home, mode).await?)
            .await?
            .print(),

        Command::Resume(resume_args) => {
            let config = load(home, mode).await?;
            let month = resume_args.selected(MonthFilter::current());
            commands::resume(&config, month).await?.print()
        }

        Command::Categories => commands::categories().print(),
    };
    Ok(())
}

async fn load(home: &Path, mode: Mode) -> Result<Config> {
    Config::load(home, mode).await.pub_result(ErrorType::Config)
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
