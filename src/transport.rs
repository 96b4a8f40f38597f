// Transport layer: the one place that touches the network. `GraphClient`
// only sees `ApiRequest` in and `ApiResponse` out, which lets tests swap
// in `mock::MockTransport` without a server.
//
// The real implementation is a blocking reqwest client: every call blocks
// until the server answers or the configured timeout fires.

use reqwest::blocking::Client;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::config::{BodyEncoding, InstagramConfig};
use crate::error::{ConfigError, Result};

pub mod mock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// A Graph API call. For GET the params become the query string, for POST
/// they form the body.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>, params: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            params,
        }
    }

    pub fn post(url: impl Into<String>, params: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            params,
        }
    }

    /// First value sent under `key`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Params as a flat JSON object of strings.
    pub fn json_body(&self) -> Value {
        let body: Map<String, Value> = self
            .params
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(body)
    }
}

// Never print the token.
impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(k, v)| {
                if k == "access_token" {
                    (k.as_str(), "<redacted>")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("params", &params)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request did not get an HTTP response at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

pub trait Transport {
    fn send(&self, request: &ApiRequest) -> std::result::Result<ApiResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &ApiRequest) -> std::result::Result<ApiResponse, TransportError> {
        (**self).send(request)
    }
}

/// Blocking HTTP transport backed by reqwest.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    encoding: BodyEncoding,
}

impl HttpTransport {
    pub fn new(encoding: BodyEncoding, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(HttpTransport { client, encoding })
    }

    pub fn from_config(config: &InstagramConfig) -> Result<Self> {
        Self::new(config.body_encoding, Duration::from_secs(config.timeout_secs))
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> std::result::Result<ApiResponse, TransportError> {
        let builder = match request.method {
            Method::Get => self.client.get(&request.url).query(&request.params),
            Method::Post => match self.encoding {
                BodyEncoding::Json => self.client.post(&request.url).json(&request.json_body()),
                BodyEncoding::Form => self.client.post(&request.url).form(&request.params),
            },
        };

        let res = builder
            .send()
            .map_err(|e| TransportError(e.without_url().to_string()))?;
        let status = res.status().as_u16();
        // A body we cannot read is still a response; keep the status.
        let body = res.text().unwrap_or_else(|_| "".into());
        Ok(ApiResponse { status, body })
    }
}
