use log::{debug, info};
use oauth2::basic::{
    BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
    BasicTokenType,
};
use oauth2::{
    AccessToken, AuthType, AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse,
    RefreshToken, RequestTokenError, Scope, StandardRevocableToken, TokenResponse, TokenUrl,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::OsuConfig;
use crate::error::{Error, Result};
use crate::osu::Session;

/// Token endpoint answer. Only `access_token` is guaranteed; the rest is optional.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OsuTokenResponse {
    access_token: AccessToken,
    #[serde(default, rename = "token_type")]
    raw_token_type: Option<String>,
    #[serde(skip, default = "bearer")]
    token_type: BasicTokenType,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<RefreshToken>,
}

fn bearer() -> BasicTokenType {
    BasicTokenType::Bearer
}

impl TokenResponse<BasicTokenType> for OsuTokenResponse {
    fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    // the API only ever issues bearer tokens
    fn token_type(&self) -> &BasicTokenType {
        &self.token_type
    }

    fn expires_in(&self) -> Option<Duration> {
        self.expires_in.map(Duration::from_secs)
    }

    fn refresh_token(&self) -> Option<&RefreshToken> {
        self.refresh_token.as_ref()
    }

    fn scopes(&self) -> Option<&Vec<Scope>> {
        None
    }
}

type OsuOAuthClient = oauth2::Client<
    BasicErrorResponse,
    OsuTokenResponse,
    BasicTokenType,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
>;

type TokenError = RequestTokenError<reqwest::Error, BasicErrorResponse>;

/// Client-credentials grant against `{api_base}/oauth/token` with the `public` scope.
///
/// The exchange goes through `http`, so it is bound by the same timeout as
/// every other request. The token is used as-is for the whole run; nothing
/// here tracks its expiry.
pub async fn obtain_token(config: &OsuConfig, http: &Client) -> Result<Session> {
    let api_base = config.api_base.trim_end_matches('/');

    let client = OsuOAuthClient::new(
        ClientId::new(config.client_id.clone()),
        Some(ClientSecret::new(config.client_secret.clone())),
        AuthUrl::new(format!("{}/oauth/authorize", api_base))
            .map_err(|e| Error::Config(format!("invalid API_BASE: {}", e)))?,
        Some(
            TokenUrl::new(format!("{}/oauth/token", api_base))
                .map_err(|e| Error::Config(format!("invalid API_BASE: {}", e)))?,
        ),
    )
    .set_auth_type(AuthType::RequestBody);

    let token_result = client
        .exchange_client_credentials()
        .add_scope(Scope::new("public".to_string()))
        .request_async(|request| send_token_request(http, request))
        .await
        .map_err(|e| Error::Auth(describe(e)))?;

    debug!(
        "Token type {}, expires in {:?}",
        token_result.raw_token_type.as_deref().unwrap_or("not given"),
        token_result.expires_in()
    );
    info!("Obtained access token from {}", api_base);
    Ok(Session::new(
        api_base,
        token_result.access_token().secret().clone(),
    ))
}

async fn send_token_request(
    http: &Client,
    request: HttpRequest,
) -> core::result::Result<HttpResponse, reqwest::Error> {
    let response = http
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;
    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}

fn describe(err: TokenError) -> String {
    match err {
        RequestTokenError::ServerResponse(response) => {
            format!("token endpoint rejected the credentials: {}", response.error())
        }
        RequestTokenError::Request(e) if e.is_timeout() => {
            format!("token endpoint did not answer in time: {}", e)
        }
        RequestTokenError::Request(e) => format!("token request failed: {}", e),
        RequestTokenError::Parse(e, _) => format!("unreadable token response: {}", e),
        RequestTokenError::Other(message) => message,
    }
}
