//! Typed client for the note-indexing backend.
//!
//! # Responsibilities
//! - One method per backend operation, all funnelled through [`ApiClient::request`]
//! - Attach the resolved target as the control header
//! - Classify every failure into an [`ApiError`] exactly once
//!
//! # Design Decisions
//! - Successful bodies decode leniently: 204 or unparseable JSON gives
//!   the empty result
//! - Nothing is retried

use axum::http::header::CONTENT_TYPE;
use axum::http::header::InvalidHeaderName;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::client::error::{codes, ApiError};
use crate::client::multipart::MultipartForm;
use crate::client::types::{
    IngestRequest, IngestResponse, ReindexResponse, SearchRequest, SearchResponse, StatsResponse,
    UploadResponse,
};
use crate::client::upload::{UploadFile, UploadOutcome, UPLOAD_PATH};
use crate::config::RelayConfig;
use crate::relay::{ProxyGateway, ProxyRequest, Relay, RelayResponse, RemoteRelay, ReqwestTransport, X_BASE_URL};
use crate::target::TargetResolver;

/// Options for [`ApiClient::request`].
#[derive(Debug, Clone)]
pub struct RequestOptions<'a> {
    pub method: Method,
    /// Pre-encoded JSON body.
    pub body: Option<Bytes>,
    /// Backend to use instead of the stored one.
    pub target_override: Option<&'a str>,
}

impl Default for RequestOptions<'_> {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            target_override: None,
        }
    }
}

/// How [`ApiClient::from_config`] reaches the backend.
#[derive(Debug, Clone, Copy)]
pub enum Connection<'a> {
    /// Through a relay server at this URL.
    Remote { relay_url: &'a str },
    /// Forward in-process with a [`ProxyGateway`].
    Direct,
}

/// Client for the backend's JSON contract, reached through a [`Relay`].
#[derive(Clone)]
pub struct ApiClient {
    relay: Arc<dyn Relay>,
    resolver: TargetResolver,
    control_header: HeaderName,
}

impl ApiClient {
    pub fn new(relay: Arc<dyn Relay>, resolver: TargetResolver) -> Self {
        Self {
            relay,
            resolver,
            control_header: HeaderName::from_static(X_BASE_URL),
        }
    }

    /// Build a client whose relay speaks the control header from `config`.
    /// Direct connections also fall back to the configured default target.
    pub fn from_config(
        config: &RelayConfig,
        connection: Connection<'_>,
        resolver: TargetResolver,
    ) -> Result<Self, InvalidHeaderName> {
        let control_header = HeaderName::from_bytes(config.relay.control_header.as_bytes())?;
        let relay: Arc<dyn Relay> = match connection {
            Connection::Direct => Arc::new(
                ProxyGateway::new(Arc::new(ReqwestTransport::new()))
                    .with_control_header(control_header.clone())
                    .with_default_target(config.relay.default_target.clone()),
            ),
            Connection::Remote { relay_url } => Arc::new(RemoteRelay::new(relay_url, &config.relay.path_prefix)),
        };
        Ok(Self::new(relay, resolver).with_control_header(control_header))
    }

    pub fn with_control_header(mut self, name: HeaderName) -> Self {
        self.control_header = name;
        self
    }

    pub fn resolver(&self) -> &TargetResolver {
        &self.resolver
    }

    /// `POST /v1/search`
    pub async fn search(
        &self,
        body: &SearchRequest,
        target_override: Option<&str>,
    ) -> Result<SearchResponse, ApiError> {
        self.request(
            "/v1/search",
            RequestOptions {
                method: Method::POST,
                body: Some(json_body(body)?),
                target_override,
            },
        )
        .await
    }

    /// `POST /v1/ingest`
    pub async fn ingest(
        &self,
        body: &IngestRequest,
        target_override: Option<&str>,
    ) -> Result<IngestResponse, ApiError> {
        self.request(
            "/v1/ingest",
            RequestOptions {
                method: Method::POST,
                body: Some(json_body(body)?),
                target_override,
            },
        )
        .await
    }

    /// `POST /v1/reindex`, sent without a body.
    pub async fn reindex(&self, target_override: Option<&str>) -> Result<ReindexResponse, ApiError> {
        self.request(
            "/v1/reindex",
            RequestOptions {
                method: Method::POST,
                body: None,
                target_override,
            },
        )
        .await
    }

    /// `GET /v1/stats`
    pub async fn stats(&self, target_override: Option<&str>) -> Result<StatsResponse, ApiError> {
        self.request(
            "/v1/stats",
            RequestOptions {
                method: Method::GET,
                body: None,
                target_override,
            },
        )
        .await
    }

    /// Upload one file as `multipart/form-data` to `/v1/upload`.
    ///
    /// 404 and 405 mean the backend lacks the endpoint and are reported as
    /// [`UploadOutcome::EndpointUnsupported`], not as errors.
    pub async fn upload(
        &self,
        file: &UploadFile,
        target_override: Option<&str>,
    ) -> Result<UploadOutcome, ApiError> {
        let form = MultipartForm::new().file("file", &file.name, &file.data);
        let content_type = HeaderValue::from_str(&form.content_type())
            .map_err(|e| ApiError::new(e.to_string(), codes::INVALID_ARGUMENT, None, None))?;

        let request = ProxyRequest::from_path(Method::POST, UPLOAD_PATH)
            .with_header(CONTENT_TYPE, content_type)
            .with_body(form.finish());
        let response = self.send(request, target_override).await?;

        if response.status == StatusCode::NOT_FOUND || response.status == StatusCode::METHOD_NOT_ALLOWED {
            tracing::info!(file = %file.name, status = response.status.as_u16(), "Upload endpoint not available");
            return Ok(UploadOutcome::EndpointUnsupported {
                status: response.status.as_u16(),
            });
        }
        if !response.is_success() {
            return Err(ApiError::from_response(&response));
        }

        let payload = UploadResponse::from_body(&response.body);
        Ok(UploadOutcome::from_payload(payload))
    }

    /// Issue one JSON call and decode its result.
    pub async fn request<T>(&self, path: &str, options: RequestOptions<'_>) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Default,
    {
        let mut request = ProxyRequest::from_path(options.method, path)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(body) = options.body {
            request = request.with_body(body);
        }

        let response = self.send(request, options.target_override).await?;
        if !response.is_success() {
            let err = ApiError::from_response(&response);
            tracing::debug!(path = %path, status = ?err.status(), code = %err.code(), "Backend returned an error");
            return Err(err);
        }
        Ok(decode_lenient(path, &response))
    }

    /// Attach the resolved target and hand the request to the relay.
    async fn send(
        &self,
        mut request: ProxyRequest,
        target_override: Option<&str>,
    ) -> Result<RelayResponse, ApiError> {
        let target = self.resolver.resolve(target_override);
        let value = HeaderValue::from_str(&target).map_err(|e| {
            tracing::warn!(target = %target, error = %e, "Backend target is not a valid header value");
            ApiError::network()
        })?;
        request.headers.insert(self.control_header.clone(), value);

        let path = request.joined_path();
        self.relay.relay(request).await.map_err(|e| {
            tracing::warn!(path = %path, target = %target, error = %e, "Relay call failed");
            ApiError::network()
        })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("resolver", &self.resolver)
            .field("control_header", &self.control_header)
            .finish_non_exhaustive()
    }
}

fn json_body<B: Serialize>(body: &B) -> Result<Bytes, ApiError> {
    serde_json::to_vec(body)
        .map(Bytes::from)
        .map_err(|e| ApiError::new(e.to_string(), codes::INVALID_ARGUMENT, None, None))
}

fn decode_lenient<T>(path: &str, response: &RelayResponse) -> T
where
    T: DeserializeOwned + Default,
{
    if response.status == StatusCode::NO_CONTENT {
        return T::default();
    }
    serde_json::from_slice(&response.body).unwrap_or_else(|e| {
        tracing::debug!(path = %path, error = %e, "Unparseable success body, using empty result");
        T::default()
    })
}
