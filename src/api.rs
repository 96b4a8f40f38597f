// API client module: a small blocking client for the Instagram Graph API
// content-publishing endpoints. Each method issues exactly one request and
// hands back the decoded answer; nothing is retried or cached.

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::config::{Config, Credentials};
use crate::error::{ApiFailure, InstapostError, Result};
use crate::media::{
    AccountInfo, CarouselSpec, ContainerHandle, ContainerStatus, MediaSpec, PublishResult,
    PublishingLimit, MAX_CAROUSEL_CHILDREN,
};
use crate::transport::{ApiRequest, HttpTransport, Transport};

/// Client bound to one account. Holds the transport, the credentials and
/// the versioned API root (e.g. `https://graph.instagram.com/v22.0`).
pub struct GraphClient<T> {
    transport: T,
    credentials: Credentials,
    api_root: String,
}

impl GraphClient<HttpTransport> {
    /// Build a client from the loaded configuration. Fails when the
    /// credentials are missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials = config.credentials()?;
        let transport = HttpTransport::from_config(&config.instagram)?;
        Ok(GraphClient::new(
            transport,
            credentials,
            config.instagram.api_root(),
        ))
    }
}

impl<T: Transport> GraphClient<T> {
    pub fn new(transport: T, credentials: Credentials, api_root: impl Into<String>) -> Self {
        let api_root = api_root.into().trim_end_matches('/').to_string();
        GraphClient {
            transport,
            credentials,
            api_root,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn url(&self, node: &str, edge: Option<&str>) -> String {
        match edge {
            Some(edge) => format!("{}/{}/{}", self.api_root, node, edge),
            None => format!("{}/{}", self.api_root, node),
        }
    }

    /// Prepend the access token to a parameter list.
    fn with_token(&self, params: Vec<(String, String)>) -> Vec<(String, String)> {
        let mut all = Vec::with_capacity(params.len() + 1);
        all.push((
            "access_token".to_string(),
            self.credentials.access_token.clone(),
        ));
        all.extend(params);
        all
    }

    /// Send one request and decode the JSON object it returns.
    fn call(&self, request: ApiRequest) -> std::result::Result<Map<String, Value>, ApiFailure> {
        debug!(method = %request.method, url = %request.url, "graph request");
        let res = self
            .transport
            .send(&request)
            .map_err(|e| ApiFailure::Transport(e.0))?;
        if !res.is_success() {
            return Err(ApiFailure::Status {
                status: res.status,
                body: res.body,
            });
        }
        match serde_json::from_str::<Value>(&res.body) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(ApiFailure::Decode { body: res.body }),
        }
    }

    /// Read the account profile. Any failure is logged and turned into
    /// `None`, so callers only have to decide whether to go on.
    pub fn check_credentials(&self) -> Option<AccountInfo> {
        let request = ApiRequest::get(
            self.url(&self.credentials.account_id, None),
            self.with_token(vec![(
                "fields".to_string(),
                "id,username,account_type".to_string(),
            )]),
        );
        let result = self.call(request).and_then(|map| {
            let body = Value::Object(map);
            serde_json::from_value::<AccountInfo>(body.clone()).map_err(|_| {
                ApiFailure::MissingField {
                    field: "id",
                    body: body.to_string(),
                }
            })
        });
        match result {
            Ok(account) => {
                info!(
                    id = %account.id,
                    username = account.username.as_deref().unwrap_or(""),
                    "Credentials are valid"
                );
                Some(account)
            }
            Err(failure) => {
                error!("Credential check failed: {}", failure);
                None
            }
        }
    }

    /// Create a media container for a single post or a carousel child.
    /// The spec is validated before anything is sent.
    pub fn create_media_container(&self, spec: &MediaSpec) -> Result<ContainerHandle> {
        spec.validate()?;
        let request = ApiRequest::post(
            self.url(&self.credentials.account_id, Some("media")),
            self.with_token(spec.to_params()),
        );
        let id = self
            .call(request)
            .and_then(|map| require_id(&map))
            .map_err(|failure| {
                error!("Error creating media container: {}", failure);
                InstapostError::MediaContainer(failure)
            })?;
        info!(container_id = %id, kind = %spec.kind, "Media container created");
        Ok(ContainerHandle { id })
    }

    /// Combine already created child containers into one carousel container.
    pub fn create_carousel_container(
        &self,
        children: &[String],
        caption: Option<&str>,
    ) -> Result<ContainerHandle> {
        let spec = CarouselSpec::new(children.to_vec(), caption.map(str::to_string));
        spec.validate()?;
        if spec.children.len() > MAX_CAROUSEL_CHILDREN {
            warn!(
                children = spec.children.len(),
                "Carousel exceeds {} children, the platform will likely reject it",
                MAX_CAROUSEL_CHILDREN
            );
        }
        let request = ApiRequest::post(
            self.url(&self.credentials.account_id, Some("media")),
            self.with_token(spec.to_params()),
        );
        let id = self
            .call(request)
            .and_then(|map| require_id(&map))
            .map_err(|failure| {
                error!("Error creating carousel container: {}", failure);
                InstapostError::MediaContainer(failure)
            })?;
        info!(container_id = %id, children = spec.children.len(), "Carousel container created");
        Ok(ContainerHandle { id })
    }

    /// Ask for the processing state of a container. One request, no polling.
    pub fn check_container_status(&self, container_id: &str) -> Result<ContainerStatus> {
        require_container_id(container_id)?;
        let request = ApiRequest::get(
            self.url(container_id, None),
            self.with_token(vec![("fields".to_string(), "status_code".to_string())]),
        );
        let status = self
            .call(request)
            .and_then(|map| require_string(&map, "status_code"))
            .map_err(|failure| {
                error!("Error checking container status: {}", failure);
                InstapostError::StatusCheck(failure)
            })?;
        let status = ContainerStatus::from(status.as_str());
        info!(container_id, status = %status, "Container status");
        Ok(status)
    }

    /// Make a container live. Returns the id of the published media.
    pub fn publish_media_container(&self, container_id: &str) -> Result<PublishResult> {
        require_container_id(container_id)?;
        let request = ApiRequest::post(
            self.url(&self.credentials.account_id, Some("media_publish")),
            self.with_token(vec![(
                "creation_id".to_string(),
                container_id.to_string(),
            )]),
        );
        let media_id = self
            .call(request)
            .and_then(|map| require_id(&map))
            .map_err(|failure| {
                error!("Error publishing media: {}", failure);
                InstapostError::Publish(failure)
            })?;
        info!(media_id = %media_id, "Media published successfully");
        Ok(PublishResult { media_id })
    }

    /// Current usage of the rolling publishing quota.
    pub fn get_content_publishing_limit(&self) -> Result<PublishingLimit> {
        let request = ApiRequest::get(
            self.url(
                &self.credentials.account_id,
                Some("content_publishing_limit"),
            ),
            self.with_token(vec![(
                "fields".to_string(),
                "quota_usage,config".to_string(),
            )]),
        );
        let limit = self
            .call(request)
            .and_then(parse_limit)
            .map_err(|failure| {
                error!("Error fetching publishing limit: {}", failure);
                InstapostError::PublishingLimit(failure)
            })?;
        info!(
            quota_usage = ?limit.quota_usage,
            remaining = ?limit.remaining(),
            "Content publishing limit"
        );
        Ok(limit)
    }
}

fn require_container_id(container_id: &str) -> Result<()> {
    if container_id.trim().is_empty() {
        return Err(InstapostError::InvalidArgument(
            "container id must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn require_id(map: &Map<String, Value>) -> std::result::Result<String, ApiFailure> {
    require_string(map, "id")
}

/// Ids come back as strings, but accept numbers too.
fn require_string(
    map: &Map<String, Value>,
    field: &'static str,
) -> std::result::Result<String, ApiFailure> {
    match map.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ApiFailure::MissingField {
            field,
            body: Value::Object(map.clone()).to_string(),
        }),
    }
}

/// The endpoint wraps its answer in `{"data": [ {...} ]}`. An empty `data`
/// array means no usage has been recorded yet and yields the default.
fn parse_limit(map: Map<String, Value>) -> std::result::Result<PublishingLimit, ApiFailure> {
    let body = Value::Object(map);
    let entry = match body.get("data").and_then(Value::as_array) {
        Some(data) => data.first().cloned(),
        None => {
            return Err(ApiFailure::MissingField {
                field: "data",
                body: body.to_string(),
            })
        }
    };
    match entry {
        None => Ok(PublishingLimit::default()),
        Some(entry) => serde_json::from_value(entry).map_err(|_| ApiFailure::Decode {
            body: body.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::media::MediaKind;
    use crate::transport::mock::MockTransport;
    use crate::transport::Method;

    const ROOT: &str = "https://graph.instagram.com/v22.0";

    fn client(mock: &MockTransport) -> GraphClient<&MockTransport> {
        GraphClient::new(
            mock,
            Credentials {
                access_token: "EAABtoken".to_string(),
                account_id: "17841400000000000".to_string(),
            },
            ROOT,
        )
    }

    #[test]
    fn test_create_container_sends_token_and_url() {
        let mock = MockTransport::new().ok(r#"{"id":"123"}"#);
        let handle = client(&mock)
            .create_media_container(
                &MediaSpec::image("https://cdn.example.com/a.jpg").with_caption("hi"),
            )
            .unwrap();
        assert_eq!(handle.id, "123");

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, Method::Post);
        assert_eq!(calls[0].url, format!("{}/17841400000000000/media", ROOT));
        assert_eq!(calls[0].param("access_token"), Some("EAABtoken"));
        assert_eq!(calls[0].param("image_url"), Some("https://cdn.example.com/a.jpg"));
        assert_eq!(calls[0].param("caption"), Some("hi"));
    }

    #[test]
    fn test_invalid_spec_makes_no_call() {
        let mock = MockTransport::new();
        for kind in [
            MediaKind::Image,
            MediaKind::Stories,
            MediaKind::Video,
            MediaKind::Reels,
        ] {
            let err = client(&mock)
                .create_media_container(&MediaSpec::for_kind(kind, ""))
                .unwrap_err();
            assert!(matches!(err, InstapostError::InvalidArgument(_)));
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_missing_id_keeps_body() {
        let body = r#"{"error":{"message":"Only photo or video can be accepted"}}"#;
        let mock = MockTransport::new().ok(body);
        let err = client(&mock)
            .create_media_container(&MediaSpec::image("https://cdn.example.com/a.jpg"))
            .unwrap_err();
        assert!(matches!(err, InstapostError::MediaContainer(_)));
        assert!(err.response_body().unwrap().contains("Only photo or video"));
    }

    #[test]
    fn test_http_error_status() {
        let mock = MockTransport::new().respond(400, r#"{"error":{"code":100}}"#);
        let err = client(&mock).publish_media_container("123").unwrap_err();
        match err {
            InstapostError::Publish(ApiFailure::Status { status, body }) => {
                assert_eq!(status, 400);
                assert!(body.contains("100"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_json_body() {
        let mock = MockTransport::new().ok("<html>bad gateway</html>");
        let err = client(&mock).publish_media_container("123").unwrap_err();
        assert!(matches!(
            err,
            InstapostError::Publish(ApiFailure::Decode { .. })
        ));
    }

    #[test]
    fn test_publish_sends_creation_id() {
        let mock = MockTransport::new().ok(r#"{"id":"456"}"#);
        let result = client(&mock).publish_media_container("123").unwrap();
        assert_eq!(result.media_id, "456");
        let call = &mock.calls()[0];
        assert_eq!(call.url, format!("{}/17841400000000000/media_publish", ROOT));
        assert_eq!(call.param("creation_id"), Some("123"));
    }

    #[test]
    fn test_numeric_id_is_accepted() {
        let mock = MockTransport::new().ok(r#"{"id":17900000000000000}"#);
        let result = client(&mock).publish_media_container("123").unwrap();
        assert_eq!(result.media_id, "17900000000000000");
    }

    #[test]
    fn test_check_credentials_ok() {
        let mock = MockTransport::new()
            .ok(r#"{"id":"1784","username":"acme","account_type":"BUSINESS"}"#);
        let account = client(&mock).check_credentials().unwrap();
        assert_eq!(account.username.as_deref(), Some("acme"));
        assert_eq!(account.account_type.as_deref(), Some("BUSINESS"));

        let call = &mock.calls()[0];
        assert_eq!(call.method, Method::Get);
        assert_eq!(call.url, format!("{}/17841400000000000", ROOT));
        assert_eq!(call.param("fields"), Some("id,username,account_type"));
    }

    #[test]
    fn test_check_credentials_swallows_failures() {
        let mock = MockTransport::new()
            .fail("connection refused")
            .respond(401, r#"{"error":{"type":"OAuthException"}}"#)
            .ok(r#"{"username":"no-id"}"#);
        let client = client(&mock);
        assert!(client.check_credentials().is_none());
        assert!(client.check_credentials().is_none());
        assert!(client.check_credentials().is_none());
        assert_eq!(mock.call_count(), 3);
    }

    #[test]
    fn test_carousel_children_joined() {
        let mock = MockTransport::new().ok(r#"{"id":"999"}"#);
        let children = vec!["1".to_string(), "2".to_string(), "3".to_string()];
        let handle = client(&mock)
            .create_carousel_container(&children, Some("album"))
            .unwrap();
        assert_eq!(handle.id, "999");
        let call = &mock.calls()[0];
        assert_eq!(call.param("children"), Some("1,2,3"));
        assert_eq!(call.param("media_type"), Some("CAROUSEL"));
        assert_eq!(call.param("caption"), Some("album"));
    }

    #[test]
    fn test_empty_carousel_makes_no_call() {
        let mock = MockTransport::new();
        let err = client(&mock).create_carousel_container(&[], None).unwrap_err();
        assert!(matches!(err, InstapostError::InvalidArgument(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_status_passthrough() {
        let mock = MockTransport::new()
            .ok(r#"{"status_code":"IN_PROGRESS","id":"123"}"#)
            .ok(r#"{"id":"123"}"#);
        let client = client(&mock);
        let status = client.check_container_status("123").unwrap();
        assert_eq!(status.as_str(), "IN_PROGRESS");
        assert_eq!(mock.calls()[0].url, format!("{}/123", ROOT));
        assert_eq!(mock.calls()[0].param("fields"), Some("status_code"));

        let err = client.check_container_status("123").unwrap_err();
        assert!(matches!(err, InstapostError::StatusCheck(_)));
    }

    #[test]
    fn test_status_transport_error() {
        let mock = MockTransport::new().fail("timed out");
        let err = client(&mock).check_container_status("123").unwrap_err();
        assert!(matches!(
            err,
            InstapostError::StatusCheck(ApiFailure::Transport(_))
        ));
    }

    #[test]
    fn test_publishing_limit() {
        let mock = MockTransport::new().ok(
            r#"{"data":[{"quota_usage":2,"config":{"quota_total":50,"quota_duration":86400}}]}"#,
        );
        let limit = client(&mock).get_content_publishing_limit().unwrap();
        assert_eq!(limit.quota_usage, Some(2));
        assert_eq!(limit.remaining(), Some(48));
        assert_eq!(
            mock.calls()[0].url,
            format!("{}/17841400000000000/content_publishing_limit", ROOT)
        );
    }

    #[test]
    fn test_publishing_limit_empty_data() {
        let mock = MockTransport::new().ok(r#"{"data":[]}"#);
        let limit = client(&mock).get_content_publishing_limit().unwrap();
        assert_eq!(limit, PublishingLimit::default());
    }

    #[test]
    fn test_publishing_limit_error_body_is_failure() {
        let body = r#"{"error":{"message":"Unsupported get request","code":100}}"#;
        let mock = MockTransport::new().ok(body);
        let err = client(&mock).get_content_publishing_limit().unwrap_err();
        match err {
            InstapostError::PublishingLimit(ApiFailure::MissingField { field, body: got }) => {
                assert_eq!(field, "data");
                assert!(got.contains("Unsupported get request"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_publishing_limit_bad_entry_is_decode_failure() {
        let mock = MockTransport::new().ok(r#"{"data":[{"quota_usage":"lots"}]}"#);
        let err = client(&mock).get_content_publishing_limit().unwrap_err();
        assert!(matches!(
            err,
            InstapostError::PublishingLimit(ApiFailure::Decode { .. })
        ));
    }
}
