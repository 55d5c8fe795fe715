//! Sign-in, sign-out and whoami command handlers.

use crate::args::SignInArgs;
use crate::auth::{self, IdentityProvider, ProviderSettings, SignInOutcome};
use crate::commands::{signed_in_user, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::User;
use crate::{Config, Result};

/// Handles `finboard sign-in`: runs the OAuth flow of the chosen provider and stores the user.
///
/// A cancelled sign-in is not an error; it leaves nobody signed in.
///
/// # Errors
/// - `ErrorType::Config` if the provider settings are invalid.
/// - `ErrorType::Auth` if the flow fails or the profile cannot be read.
pub async fn sign_in(config: &Config, args: &SignInArgs) -> Result<Out<User>> {
    let settings = ProviderSettings::new(
        args.client_id(),
        args.client_secret().map(str::to_string),
        args.redirect_uri(),
    )
    .pub_result(ErrorType::Config)?;
    let provider = auth::provider(args.provider(), settings).pub_result(ErrorType::Request)?;
    sign_in_with(config, provider.as_ref()).await
}

pub(crate) async fn sign_in_with(
    config: &Config,
    provider: &dyn IdentityProvider,
) -> Result<Out<User>> {
    let mut session = config.session();
    match session.sign_in(provider).await.pub_result(ErrorType::Auth)? {
        SignInOutcome::SignedIn(user) => Ok(Out::new(
            format!("Signed in as {} <{}>", user.name(), user.email()),
            user,
        )),
        SignInOutcome::Cancelled => Ok("Sign-in was cancelled, nobody is signed in".into()),
    }
}

/// Handles `finboard sign-out`.
pub async fn sign_out(config: &Config) -> Result<Out<()>> {
    let mut session = config.session();
    session.sign_out().await.pub_result(ErrorType::Storage)?;
    Ok("Signed out".into())
}

/// Handles `finboard whoami`.
///
/// # Errors
/// `ErrorType::Auth` if nobody is signed in.
pub async fn whoami(config: &Config) -> Result<Out<User>> {
    let user = signed_in_user(config).await?;
    Ok(Out::new(
        format!("{} <{}>", user.name(), user.email()),
        user,
    ))
}
