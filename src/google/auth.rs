use crate::config::GoogleConfig;
use crate::error::{AppError, Result};
use crate::session::TokenSet;
use oauth2::{
    AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
    EndpointSet, RedirectUrl, RefreshToken, Scope, StandardRevocableToken, TokenResponse,
    TokenUrl,
    basic::{
        BasicClient, BasicErrorResponse, BasicRevocationErrorResponse,
        BasicTokenIntrospectionResponse, BasicTokenResponse,
    },
};
use reqwest::redirect::Policy;
use tracing::instrument;
use url::Url;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const GOOGLE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets.readonly",
    "https://www.googleapis.com/auth/drive.readonly",
];

// Type alias for the client when Auth and Token URLs are set
type ConfiguredClient = Client<
    BasicErrorResponse,
    BasicTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,    // HasAuthUrl
    EndpointNotSet, // HasDeviceAuthUrl
    EndpointNotSet, // HasIntrospectionUrl
    EndpointNotSet, // HasRevocationUrl
    EndpointSet,    // HasTokenUrl
>;

pub struct GoogleAuth {
    client: ConfiguredClient,
    http_client: reqwest::Client,
}

impl GoogleAuth {
    pub fn new(config: &GoogleConfig) -> Result<Self> {
        let client_id = ClientId::new(config.client_id.clone());
        let client_secret = ClientSecret::new(config.client_secret.clone());

        let auth_url = AuthUrl::new(GOOGLE_AUTH_URL.to_string())
            .map_err(|e| AppError::Auth(format!("Invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
            .map_err(|e| AppError::Auth(format!("Invalid token URL: {}", e)))?;

        let client = BasicClient::new(client_id)
            .set_client_secret(client_secret)
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(
                RedirectUrl::new(config.redirect_uri.clone())
                    .map_err(|e| AppError::Auth(format!("Invalid redirect URL: {}", e)))?,
            );

        let http_client = reqwest::ClientBuilder::new()
            .redirect(Policy::none())
            .build()
            .map_err(|e| AppError::Auth(format!("Failed to build reqwest client: {}", e)))?;

        Ok(Self {
            client,
            http_client,
        })
    }

    pub fn http_client(&self) -> reqwest::Client {
        self.http_client.clone()
    }

    /// Build the consent URL. `prompt=consent` forces the consent screen on
    /// every call so Google reissues a refresh token even for a user who
    /// already authorized once; without it a repeat authorization silently
    /// omits the refresh token.
    pub fn authorize_url(&self) -> Url {
        let scopes = GOOGLE_SCOPES
            .iter()
            .map(|s| Scope::new(s.to_string()))
            .collect::<Vec<Scope>>();

        let (url, _csrf_token) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(scopes)
            .add_extra_param("access_type", "offline")
            .add_extra_param("include_granted_scopes", "true")
            .add_extra_param("prompt", "consent")
            .url();

        url
    }

    /// Exchange a one-time authorization code for a token set. Codes are
    /// single-use: a replayed code fails at the token endpoint, and this
    /// call is never retried.
    #[instrument(name = "Exchanging authorization code", skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet> {
        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| AppError::Auth(format!("Failed to exchange code: {:?}", e)))?;

        Ok(Self::parse_tokens(token_result, None))
    }

    /// Mint a fresh access token from a stored refresh token.
    #[instrument(name = "Refreshing access token", skip_all)]
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenSet> {
        let token_result = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| AppError::Auth(format!("Failed to refresh token: {:?}", e)))?;

        Ok(Self::parse_tokens(token_result, Some(refresh_token)))
    }

    /// If `fallback_refresh_token` is provided, it is kept when the token
    /// response doesn't include a refresh token (common in refresh flows).
    fn parse_tokens(
        token_result: BasicTokenResponse,
        fallback_refresh_token: Option<&str>,
    ) -> TokenSet {
        let access_token = token_result.access_token().secret().clone();

        let refresh_token = token_result
            .refresh_token()
            .map(|token| token.secret().clone())
            .or_else(|| fallback_refresh_token.map(str::to_string));

        // Default to 1 hour if not provided
        let expires_in = token_result
            .expires_in()
            .map(|d| d.as_secs() as i64)
            .unwrap_or(3600);
        let expires_at = chrono::Utc::now().timestamp() + expires_in;

        TokenSet {
            access_token,
            refresh_token,
            expires_at,
        }
    }
}
