// Async HTTP client for the practice-tracker REST API.
//
// Base path: /api/
// Auth: optional `Authorization: Bearer <jwt>` header

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::auth::{Credentials, LoginRequest, TokenResponse};
use crate::resource::{ListParams, Resource};
use crate::transport::TransportConfig;

const NDJSON: &str = "application/x-ndjson";

// ── Error response shape (RFC 7807 problem JSON) ─────────────────────

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    /// Translation key such as `error.idexists` or `error.http.404`.
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_key: Option<String>,
}

impl ErrorResponse {
    fn into_error(self, status: reqwest::StatusCode) -> Error {
        let error_key = self.error_key.or_else(|| {
            self.message
                .as_deref()
                .and_then(|m| m.strip_prefix("error."))
                .map(str::to_owned)
        });
        let message = self
            .title
            .or(self.detail)
            .or(self.message)
            .unwrap_or_else(|| status.to_string());
        Error::Api {
            status: status.as_u16(),
            message,
            error_key,
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the practice-tracker REST API.
///
/// Cheap to clone; the underlying `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build an anonymous client.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Build a client that sends `Authorization: Bearer <token>` on every request.
    pub fn with_token(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid token header value: {e}"),
            })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);

        let http = transport.build_client_with_headers(headers)?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Build a client for the given credentials, logging in first if needed.
    pub async fn connect(
        base_url: &str,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        match credentials {
            Credentials::None => Self::new(base_url, transport),
            Credentials::Token(token) => Self::with_token(base_url, token, transport),
            Credentials::Login {
                username,
                password,
                remember_me,
            } => {
                let anonymous = Self::new(base_url, transport)?;
                let token = anonymous
                    .authenticate(username, password, *remember_me)
                    .await?;
                Self::with_token(base_url, &token, transport)
            }
        }
    }

    /// Build the base URL ending in `/api/`.
    ///
    /// `http://host:8080` and `http://host:8080/api` both become
    /// `http://host:8080/api/`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/api") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/"));
        }

        Ok(url)
    }

    /// The normalized `/api/` base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    fn item_path<R: Resource>(id: i64) -> String {
        format!("{}/{id}", R::COLLECTION)
    }

    fn require_id<R: Resource>(entity: &R) -> Result<i64, Error> {
        entity.id().ok_or(Error::MissingId { entity: R::NAME })
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PATCH {url}");

        let resp = self.http.patch(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    async fn send_delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            decode(&body)
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ErrorResponse>(&raw).ok();

        match status {
            reqwest::StatusCode::UNAUTHORIZED => Error::Authentication {
                message: parsed
                    .and_then(|e| e.detail.or(e.title))
                    .unwrap_or_else(|| "bad credentials or expired token".into()),
            },
            reqwest::StatusCode::FORBIDDEN => Error::Forbidden {
                message: parsed
                    .and_then(|e| e.detail.or(e.title))
                    .unwrap_or_else(|| status.to_string()),
            },
            _ => match parsed {
                Some(err) => err.into_error(status),
                None => Error::Api {
                    status: status.as_u16(),
                    message: if raw.is_empty() {
                        status.to_string()
                    } else {
                        raw
                    },
                    error_key: None,
                },
            },
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Authentication ───────────────────────────────────────────────

    /// Exchange a username and password for a JWT.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
        remember_me: bool,
    ) -> Result<SecretString, Error> {
        let body = LoginRequest::new(username, password, remember_me);
        let resp: TokenResponse = self.post("authenticate", &body).await?;
        debug!(username, "authenticated");
        Ok(SecretString::from(resp.id_token))
    }

    // ── Collections ──────────────────────────────────────────────────

    /// `GET /api/{collection}`.
    pub async fn list<R: Resource>(&self, params: &ListParams) -> Result<Vec<R>, Error> {
        self.get_with_params(R::COLLECTION, &params.to_query())
            .await
    }

    /// `GET /api/{collection}` as newline-delimited JSON, one entity per line.
    pub async fn list_ndjson<R: Resource>(&self, params: &ListParams) -> Result<Vec<R>, Error> {
        let url = self.url(R::COLLECTION)?;
        debug!("GET {url} (ndjson)");

        let resp = self
            .http
            .get(url)
            .header(ACCEPT, NDJSON)
            .query(&params.to_query())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(self.parse_error(status, resp).await);
        }

        let body = resp.text().await?;
        body.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(decode)
            .collect()
    }

    // ── Items ────────────────────────────────────────────────────────

    /// `GET /api/{collection}/{id}`.
    pub async fn get_one<R: Resource>(&self, id: i64) -> Result<R, Error> {
        self.get(&Self::item_path::<R>(id)).await
    }

    /// `POST /api/{collection}`; the server assigns the id and answers 201.
    pub async fn create<R: Resource>(&self, entity: &R) -> Result<R, Error> {
        self.post(R::COLLECTION, entity).await
    }

    /// `PUT /api/{collection}/{id}`, full replacement.
    pub async fn update<R: Resource>(&self, entity: &R) -> Result<R, Error> {
        let id = Self::require_id(entity)?;
        self.put(&Self::item_path::<R>(id), entity).await
    }

    /// `PATCH /api/{collection}/{id}`; only fields present in the body change.
    pub async fn partial_update<R: Resource>(&self, entity: &R) -> Result<R, Error> {
        let id = Self::require_id(entity)?;
        self.patch(&Self::item_path::<R>(id), entity).await
    }

    /// `DELETE /api/{collection}/{id}`; the server answers 204.
    pub async fn delete<R: Resource>(&self, id: i64) -> Result<(), Error> {
        self.send_delete(&Self::item_path::<R>(id)).await
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}
