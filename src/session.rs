//! Login and the session cookies replayed on every outbound call.

use crate::config::Config;
use crate::error::{AuthError, Result};

use regex::Regex;
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::sync::LazyLock;

/// User agent sent on every request and on the socket handshake.
pub const USER_AGENT: &str = "gluebot";

static API_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bapi_token=([^;]+)").expect("hardcoded api_token regex"));

static SESSION_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bsession_id=([^;]+)").expect("hardcoded session_id regex"));

/// The two opaque tokens issued by the login endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    api_token: String,
    session_id: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("api_token", &"[redacted]")
            .field("session_id", &"[redacted]")
            .finish()
    }
}

impl Session {
    pub fn new(api_token: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            session_id: session_id.into(),
        }
    }

    /// Extract both tokens from the login response's `Set-Cookie` values.
    pub fn from_set_cookie<'a>(
        values: impl IntoIterator<Item = &'a str>,
    ) -> std::result::Result<Self, AuthError> {
        let mut api_token = None;
        let mut session_id = None;

        for value in values {
            if let Some(captures) = API_TOKEN_REGEX.captures(value) {
                api_token = Some(captures[1].trim().to_string());
            }
            if let Some(captures) = SESSION_ID_REGEX.captures(value) {
                session_id = Some(captures[1].trim().to_string());
            }
        }

        let api_token = api_token
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken { cookie: "api_token" })?;
        let session_id = session_id
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken { cookie: "session_id" })?;

        Ok(Self::new(api_token, session_id))
    }

    /// POST the credentials to `{base}/login/submit` and collect the cookies.
    pub async fn login(config: &Config) -> Result<Self> {
        // The tokens arrive on the redirect itself, so it must not be followed.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.request_timeout)
            .default_headers(default_headers(&config.base_url))
            .build()?;

        let response = client
            .post(format!("{}/login/submit", config.base_url))
            .form(&[
                ("name", config.username.as_str()),
                ("password", config.password.as_str()),
                ("submit", "log+in"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
            }
            .into());
        }

        let session = Self::from_set_cookie(
            response
                .headers()
                .get_all(header::SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok()),
        )?;

        tracing::debug!(status = status.as_u16(), "login accepted");
        Ok(session)
    }

    /// `Cookie` header value carrying both tokens.
    pub fn cookie_header(&self) -> String {
        format!("session_id={}; api_token={}", self.session_id, self.api_token)
    }
}

/// Headers the chat service expects from its own web client.
pub fn default_headers(base_url: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    if let Ok(origin) = HeaderValue::from_str(base_url) {
        headers.insert(header::ORIGIN, origin);
    }
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers
}
