//! These structs provide the CLI interface for the finboard CLI.

use crate::aggregate::MonthFilter;
use crate::auth::{Provider, DEFAULT_REDIRECT_URI};
use crate::model::TransactionType;
use clap::{ArgAction, Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// finboard: record your income and expenses and see where the money goes.
///
/// Sign in with Google or Apple, register transactions, and view the dashboard totals and the
/// monthly breakdown of expenses by category. Everything is stored locally in $FINBOARD_HOME.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory, the configuration file and the local store.
    ///
    /// This is the first command you should run. Pass --finboard-home if you do not want the data
    /// in $HOME/finboard.
    Init,
    /// Sign in with Google or Apple.
    ///
    /// Prints a URL to open in your browser and waits for the provider to redirect back to
    /// REDIRECT_URI. Press Ctrl-C to cancel.
    SignIn(SignInArgs),
    /// Forget the signed-in user. Their transactions stay on this device.
    SignOut,
    /// Show the signed-in user.
    Whoami,
    /// Register an entry or an expense.
    Register(RegisterArgs),
    /// Remove a transaction by its id.
    Remove(RemoveArgs),
    /// List every transaction of the signed-in user.
    List,
    /// Show the totals of entries, expenses and the balance.
    Dashboard,
    /// Show the expenses of a month broken down by category.
    Resume(ResumeArgs),
    /// List the categories a transaction can be tagged with.
    Categories,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where finboard data and configuration is held. Defaults to ~/finboard
    #[arg(long, env = "FINBOARD_HOME", default_value_t = default_finboard_home())]
    finboard_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, finboard_home: PathBuf) -> Self {
        Self {
            log_level,
            finboard_home: finboard_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn finboard_home(&self) -> &DisplayPath {
        &self.finboard_home
    }
}

/// Args for the `finboard sign-in` command.
#[derive(Debug, Parser, Clone)]
pub struct SignInArgs {
    /// The identity provider.
    #[arg(value_enum)]
    provider: Provider,

    /// The OAuth client id registered with the provider.
    #[arg(long, env = "CLIENT_ID")]
    client_id: String,

    /// The OAuth client secret, if the provider issued one.
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Where the provider sends the browser back to. The port must be free on this machine.
    #[arg(long, env = "REDIRECT_URI", default_value = DEFAULT_REDIRECT_URI)]
    redirect_uri: String,
}

impl SignInArgs {
    pub fn new(
        provider: Provider,
        client_id: impl Into<String>,
        client_secret: Option<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            client_id: client_id.into(),
            client_secret,
            redirect_uri: redirect_uri.into(),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }
}

/// Args for the `finboard register` command.
///
/// Everything is optional on the command line so that missing values are reported the same way
/// as invalid ones.
#[derive(Debug, Parser, Clone, Default)]
pub struct RegisterArgs {
    /// What the transaction was, e.g. "Pizza".
    #[arg(long)]
    name: Option<String>,

    /// The amount, e.g. 40 or 1.234,56. Always positive; --type says which way it goes.
    #[arg(long)]
    amount: Option<String>,

    /// positive (an entry) or negative (an expense).
    #[arg(long = "type", value_enum)]
    kind: Option<TransactionType>,

    /// A category key, see `finboard categories`.
    #[arg(long)]
    category: Option<String>,
}

impl RegisterArgs {
    pub fn new(
        name: impl Into<String>,
        amount: impl Into<String>,
        kind: Option<TransactionType>,
        category: Option<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            amount: Some(amount.into()),
            kind,
            category,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn amount(&self) -> &str {
        self.amount.as_deref().unwrap_or_default()
    }

    pub fn kind(&self) -> Option<TransactionType> {
        self.kind
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

/// Args for the `finboard remove` command.
#[derive(Debug, Parser, Clone)]
pub struct RemoveArgs {
    /// The id of the transaction, as shown by `finboard list`.
    id: String,
}

impl RemoveArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Args for the `finboard resume` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ResumeArgs {
    /// The month to show as YYYY-MM. Defaults to the current month.
    #[arg(long)]
    month: Option<MonthFilter>,

    /// Go back one month. Repeat to go further back.
    #[arg(long, action = ArgAction::Count, conflicts_with = "next")]
    prev: u8,

    /// Go forward one month. Repeat to go further.
    #[arg(long, action = ArgAction::Count)]
    next: u8,
}

impl ResumeArgs {
    pub fn new(month: Option<MonthFilter>, prev: u8, next: u8) -> Self {
        Self { month, prev, next }
    }

    /// The selected month, relative to `today` when no month was given.
    pub fn selected(&self, today: MonthFilter) -> MonthFilter {
        let mut month = self.month.unwrap_or(today);
        for _ in 0..self.prev {
            month = month.previous();
        }
        for _ in 0..self.next {
            month = month.next();
        }
        month
    }
}

fn default_finboard_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("finboard"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --finboard-home or FINBOARD_HOME instead of relying on the \
                default finboard home directory. If you continue using the program right now, you \
                may have problems!",
            );
            PathBuf::from("finboard")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["finboard", "--finboard-home", "/tmp/fb"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_register_args() {
        let args = parse(&[
            "register", "--name", "Pizza", "--amount", "40", "--type", "expense", "--category",
            "food",
        ]);
        let Command::Register(register) = args.command() else {
            panic!("expected register");
        };
        assert_eq!(register.name(), "Pizza");
        assert_eq!(register.kind(), Some(TransactionType::Negative));
        assert_eq!(register.category(), Some("food"));
        assert_eq!(args.common().finboard_home().path(), Path::new("/tmp/fb"));
    }

    #[test]
    fn test_register_args_may_be_missing() {
        let args = parse(&["register"]);
        let Command::Register(register) = args.command() else {
            panic!("expected register");
        };
        assert_eq!(register.name(), "");
        assert!(register.kind().is_none());
    }

    #[test]
    fn test_resume_selection() {
        let june = MonthFilter::new(2021, 6).unwrap();
        let args = parse(&["resume", "--prev", "--prev"]);
        let Command::Resume(resume) = args.command() else {
            panic!("expected resume");
        };
        assert_eq!(resume.selected(june), MonthFilter::new(2021, 4).unwrap());

        let args = parse(&["resume", "--month", "2020-12", "--next"]);
        let Command::Resume(resume) = args.command() else {
            panic!("expected resume");
        };
        assert_eq!(resume.selected(june), MonthFilter::new(2021, 1).unwrap());

        assert!(Args::try_parse_from(["finboard", "resume", "--prev", "--next"]).is_err());
    }

    #[test]
    fn test_sign_in_args() {
        let args = parse(&["sign-in", "apple", "--client-id", "com.example.finboard"]);
        let Command::SignIn(sign_in) = args.command() else {
            panic!("expected sign-in");
        };
        assert_eq!(sign_in.provider(), Provider::Apple);
        assert_eq!(sign_in.client_id(), "com.example.finboard");
    }
}
