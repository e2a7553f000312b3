//! Authenticated HTTP transport for the VMS API.
//!
//! A [`Client`] is obtained by logging in with [`Client::authenticate`]. The
//! bearer token returned by the login endpoint is attached to every request
//! issued through the client afterwards.

mod error;

use std::fmt;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use error::ClientError;

/// Domain of the official VMS service.
pub const OFFICIAL_DOMAIN: &str = "https://go-vorteil.io";

const LOGIN_PATH: &str = "auth/api/login";

/// Credentials exchanged for a bearer token at login.
#[derive(Clone, Eq, PartialEq, Serialize)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials from a username and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    accepted_terms: bool,
    jwt: String,
}

/// HTTP client bound to one VMS domain and one bearer token.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    domain: String,
    token: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Logs in to `domain` and returns a client carrying the issued token.
    ///
    /// The domain should include the scheme (for example
    /// `https://go-vorteil.io`); a trailing slash is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Remote`] when the login endpoint rejects the
    /// credentials, [`ClientError::Transport`] when the request fails, and
    /// [`ClientError::Parse`] when the response carries no token.
    pub async fn authenticate(
        domain: &str,
        credentials: &Credentials,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::new();
        let base = normalise_domain(domain);
        let url = join_url(&base, LOGIN_PATH);
        debug!(%url, username = %credentials.username, "logging in");

        let response = http.post(url).json(credentials).send().await?;
        let login: LoginResponse = read_json(check_status(response)?).await?;
        debug!(accepted_terms = login.accepted_terms, "login accepted");

        Ok(Self {
            http,
            domain: base,
            token: login.jwt,
        })
    }

    /// Builds a client from an existing bearer token without logging in.
    #[must_use]
    pub fn with_token(domain: &str, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            domain: normalise_domain(domain),
            token: token.into(),
        }
    }

    /// Returns the domain this client talks to, without a trailing slash.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Appends `path` to the client's domain. `path` should not start with a
    /// slash.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        join_url(&self.domain, path)
    }

    /// Starts an authenticated request against `path`.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%method, %url, "dispatching request");
        self.http.request(method, url).bearer_auth(&self.token)
    }

    /// Sends a request and rejects any status other than `200 OK`.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        check_status(response)
    }

    /// Issues an authenticated `GET` and decodes the JSON body.
    pub(crate) async fn get_json<T>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .send(self.request(Method::GET, path).query(query))
            .await?;
        read_json(response).await
    }
}

/// Converts a non-200 response into [`ClientError::Remote`].
pub(crate) fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response);
    }
    debug!(status = status.as_u16(), url = %response.url(), "request rejected");
    Err(ClientError::Remote {
        status: status.as_u16(),
        text: status.to_string(),
    })
}

/// Reads the full body and decodes it as JSON.
pub(crate) async fn read_json<T>(response: Response) -> Result<T, ClientError>
where
    T: DeserializeOwned,
{
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|err| ClientError::Parse {
        message: err.to_string(),
    })
}

fn normalise_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('/').to_owned()
}

fn join_url(domain: &str, path: &str) -> String {
    format!("{domain}/{}", path.trim_start_matches('/'))
}
