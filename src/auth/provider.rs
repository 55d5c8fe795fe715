use crate::model::User;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// The redirect URI used when `REDIRECT_URI` is not set.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3030";

/// The identity providers a user can sign in with.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Google,
    Apple,
}

serde_plain::derive_display_from_serialize!(Provider);
serde_plain::derive_fromstr_from_deserialize!(Provider);

/// The OAuth client registration used to talk to a provider.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ProviderSettings {
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: Url,
}

impl ProviderSettings {
    /// # Errors
    /// Returns an error if `redirect_uri` is not a valid URL.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: Option<String>,
        redirect_uri: &str,
    ) -> Result<Self> {
        let redirect_uri = Url::parse(redirect_uri)
            .with_context(|| format!("The redirect URI '{redirect_uri}' is not a valid URL"))?;
        Ok(Self {
            client_id: client_id.into(),
            client_secret,
            redirect_uri,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }
}

/// The parameters a provider handed back after the user approved the sign-in, e.g. an access
/// token or an id token.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct AuthGrant {
    params: BTreeMap<String, String>,
}

impl AuthGrant {
    pub fn new(params: BTreeMap<String, String>) -> Self {
        Self { params }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }
}

/// The outcome of the interactive part of a sign-in.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum AuthResponse {
    /// The user approved the sign-in.
    Success(AuthGrant),
    /// The user backed out.
    Cancel,
}

/// A source of identities. Implementations run the provider's OAuth flow and then read the user's
/// profile.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    fn provider(&self) -> Provider;

    /// Runs the interactive authorization. Cancellation by the user is `Ok(AuthResponse::Cancel)`;
    /// anything else that goes wrong is an error.
    async fn authorize(&self) -> Result<AuthResponse>;

    /// Reads the profile of the user who produced `grant`.
    async fn fetch_profile(&self, grant: &AuthGrant) -> Result<User>;
}
