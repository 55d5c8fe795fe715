//! Sign in with Google: authorization code flow with PKCE, then one userinfo request.

use crate::auth::callback::wait_for_callback;
use crate::auth::{AuthGrant, AuthResponse, IdentityProvider, Provider, ProviderSettings};
use crate::model::User;
use crate::Result;
use anyhow::{anyhow, Context};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, RedirectUrl,
    Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use tracing::{debug, info};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v1/userinfo";
const SCOPES: &[&str] = &["profile", "email"];
const ACCESS_TOKEN: &str = "access_token";

pub struct GoogleProvider {
    settings: ProviderSettings,
    http: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        // The token endpoint must not be followed through redirects.
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Unable to create the HTTP client")?;
        Ok(Self { settings, http })
    }
}

#[async_trait::async_trait]
impl IdentityProvider for GoogleProvider {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    async fn authorize(&self) -> Result<AuthResponse> {
        let mut client = BasicClient::new(ClientId::new(self.settings.client_id().to_string()))
            .set_auth_uri(AuthUrl::new(AUTH_URL.to_string())?)
            .set_token_uri(TokenUrl::new(TOKEN_URL.to_string())?)
            .set_redirect_uri(RedirectUrl::from_url(self.settings.redirect_uri().clone()));
        if let Some(secret) = self.settings.client_secret() {
            client = client.set_client_secret(ClientSecret::new(secret.to_string()));
        }

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, csrf_token) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(SCOPES.iter().map(|s| Scope::new(s.to_string())))
            .set_pkce_challenge(pkce_challenge)
            .url();

        info!("Open this URL in your browser to sign in with Google:\n\n{auth_url}\n");

        let grant = match wait_for_callback(self.settings.redirect_uri(), csrf_token.secret()).await? {
            AuthResponse::Cancel => return Ok(AuthResponse::Cancel),
            AuthResponse::Success(grant) => grant,
        };
        let code = grant
            .get("code")
            .context("The Google redirect did not include an authorization code")?;

        let token = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(pkce_verifier)
            .request_async(&self.http)
            .await
            .map_err(|e| anyhow!("Unable to exchange the authorization code: {e}"))?;
        debug!("Received a Google access token");

        let mut grant = AuthGrant::default();
        grant.insert(ACCESS_TOKEN, token.access_token().secret());
        Ok(AuthResponse::Success(grant))
    }

    async fn fetch_profile(&self, grant: &AuthGrant) -> Result<User> {
        let token = grant
            .get(ACCESS_TOKEN)
            .context("The Google grant has no access token")?;
        let profile: GoogleProfile = self
            .http
            .get(USERINFO_URL)
            .query(&[("alt", "json")])
            .bearer_auth(token)
            .send()
            .await
            .context("Unable to reach the Google userinfo endpoint")?
            .error_for_status()
            .context("The Google userinfo request failed")?
            .json()
            .await
            .context("Unable to parse the Google userinfo response")?;
        Ok(profile.into())
    }
}

/// The response of the userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
struct GoogleProfile {
    id: String,
    email: String,
    name: String,
    #[serde(default)]
    picture: Option<String>,
}

impl From<GoogleProfile> for User {
    fn from(p: GoogleProfile) -> Self {
        User::new(p.id, p.name, p.email, p.picture)
    }
}

#[test]
fn test_profile_to_user() {
    let json = r#"{
        "id": "any_id",
        "email": "raphael@example.com",
        "verified_email": true,
        "name": "Raphael",
        "given_name": "Raphael",
        "picture": "https://example.com/any_photo.png",
        "locale": "pt-BR"
    }"#;
    let profile: GoogleProfile = serde_json::from_str(json).unwrap();
    let user: User = profile.into();
    assert_eq!(user.id(), "any_id");
    assert_eq!(user.email(), "raphael@example.com");
    assert_eq!(user.photo(), Some("https://example.com/any_photo.png"));
}
