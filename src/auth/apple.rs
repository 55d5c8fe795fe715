//! Sign in with Apple.
//!
//! Apple posts the result of the authorization to the redirect URI (`response_mode=form_post`).
//! The identity comes from the claims of the `id_token`; the display name is only sent in the
//! `user` form field, and only on the first sign-in.

use crate::auth::callback::wait_for_callback;
use crate::auth::{AuthGrant, AuthResponse, IdentityProvider, Provider, ProviderSettings};
use crate::model::User;
use crate::Result;
use anyhow::Context;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

const AUTH_URL: &str = "https://appleid.apple.com/auth/authorize";
const ID_TOKEN: &str = "id_token";
const USER: &str = "user";

pub struct AppleProvider {
    settings: ProviderSettings,
}

impl AppleProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }

    fn authorize_url(&self, state: &str) -> Result<Url> {
        let mut url = Url::parse(AUTH_URL)?;
        url.query_pairs_mut()
            .append_pair("client_id", self.settings.client_id())
            .append_pair("redirect_uri", self.settings.redirect_uri().as_str())
            .append_pair("response_type", "code id_token")
            .append_pair("response_mode", "form_post")
            .append_pair("scope", "name email")
            .append_pair("state", state);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for AppleProvider {
    fn provider(&self) -> Provider {
        Provider::Apple
    }

    async fn authorize(&self) -> Result<AuthResponse> {
        let state = uuid::Uuid::new_v4().to_string();
        let url = self.authorize_url(&state)?;
        info!("Open this URL in your browser to sign in with Apple:\n\n{url}\n");
        wait_for_callback(self.settings.redirect_uri(), &state).await
    }

    async fn fetch_profile(&self, grant: &AuthGrant) -> Result<User> {
        let token = grant
            .get(ID_TOKEN)
            .context("The Apple redirect did not include an id_token")?;
        let claims = decode_claims(token)?;
        let name = grant
            .get(USER)
            .and_then(|json| serde_json::from_str::<AppleUser>(json).ok())
            .and_then(|u| u.name)
            .and_then(|n| n.full_name());
        debug!("Apple identity {}", claims.sub);

        let email = claims.email.unwrap_or_default();
        let name = name.unwrap_or_else(|| email.clone());
        Ok(User::new(claims.sub, name, email, None))
    }
}

/// The claims of the id_token that identify the user.
#[derive(Debug, Deserialize)]
struct IdClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AppleUser {
    #[serde(default)]
    name: Option<AppleName>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppleName {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

impl AppleName {
    fn full_name(self) -> Option<String> {
        let parts: Vec<String> = [self.first_name, self.last_name]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// Reads the payload of a JWT. The signature is not checked; the token arrives directly from
/// Apple over the loopback redirect.
fn decode_claims(token: &str) -> Result<IdClaims> {
    let payload = token
        .split('.')
        .nth(1)
        .context("The id_token is not a JWT")?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .context("The id_token payload is not valid base64")?;
    serde_json::from_slice(&bytes).context("The id_token payload is not valid JSON")
}
