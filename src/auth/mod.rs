//! The auth session: who is signed in, and how they get there.
//!
//! The signed-in `User` is persisted under `Keys::user`. A cancelled or failed sign-in never
//! writes a user, so an empty store always means "unauthenticated".

mod apple;
mod callback;
mod google;
mod provider;

use crate::model::User;
use crate::storage::{get_json, set_json, Keys, SharedStorage};
use crate::Result;
use tracing::{debug, info};

pub use apple::AppleProvider;
pub use google::GoogleProvider;
pub use provider::{
    AuthGrant, AuthResponse, IdentityProvider, Provider, ProviderSettings, DEFAULT_REDIRECT_URI,
};

/// Where the session stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// The persisted user has not been read yet.
    #[default]
    Loading,
    SignedOut,
    SignedIn(User),
}

/// The result of a sign-in attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    SignedIn(User),
    Cancelled,
}

/// Holds the current user and keeps it in sync with the store.
#[derive(Debug, Clone)]
pub struct AuthSession {
    storage: SharedStorage,
    keys: Keys,
    state: SessionState,
}

impl AuthSession {
    /// Creates a session in the `Loading` state. Call `restore` to read the persisted user.
    pub fn new(storage: SharedStorage, keys: Keys) -> Self {
        Self {
            storage,
            keys,
            state: SessionState::Loading,
        }
    }

    /// Reads the persisted user, if any.
    pub async fn restore(&mut self) -> Result<&SessionState> {
        let user: Option<User> = get_json(self.storage.as_ref(), &self.keys.user()).await?;
        self.state = match user {
            Some(user) => {
                debug!("Restored session for {}", user.email());
                SessionState::SignedIn(user)
            }
            None => SessionState::SignedOut,
        };
        Ok(&self.state)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Loading
    }

    pub fn current_user(&self) -> Option<&User> {
        match &self.state {
            SessionState::SignedIn(user) => Some(user),
            _ => None,
        }
    }

    /// Runs the sign-in flow of `provider`. The user is persisted only when the flow succeeds.
    ///
    /// # Errors
    /// Returns an error if the flow fails, the profile cannot be fetched or the user cannot be
    /// stored. The session is left signed out in that case.
    pub async fn sign_in(&mut self, provider: &dyn IdentityProvider) -> Result<SignInOutcome> {
        info!("Signing in with {}", provider.provider());
        let grant = match provider.authorize().await {
            Ok(AuthResponse::Success(grant)) => grant,
            Ok(AuthResponse::Cancel) => {
                self.state = SessionState::SignedOut;
                return Ok(SignInOutcome::Cancelled);
            }
            Err(e) => {
                self.state = SessionState::SignedOut;
                return Err(e);
            }
        };

        let user = match self.persist(provider, &grant).await {
            Ok(user) => user,
            Err(e) => {
                self.state = SessionState::SignedOut;
                return Err(e);
            }
        };
        info!("Signed in as {}", user.email());
        self.state = SessionState::SignedIn(user.clone());
        Ok(SignInOutcome::SignedIn(user))
    }

    async fn persist(&self, provider: &dyn IdentityProvider, grant: &AuthGrant) -> Result<User> {
        let user = provider.fetch_profile(grant).await?;
        set_json(self.storage.as_ref(), &self.keys.user(), &user).await?;
        Ok(user)
    }

    /// Forgets the signed-in user.
    pub async fn sign_out(&mut self) -> Result<()> {
        self.storage.remove(&self.keys.user()).await?;
        self.state = SessionState::SignedOut;
        info!("Signed out");
        Ok(())
    }
}

/// Creates the `IdentityProvider` for `kind`.
pub fn provider(kind: Provider, settings: ProviderSettings) -> Result<Box<dyn IdentityProvider>> {
    Ok(match kind {
        Provider::Google => Box::new(GoogleProvider::new(settings)?),
        Provider::Apple => Box::new(AppleProvider::new(settings)),
    })
}
