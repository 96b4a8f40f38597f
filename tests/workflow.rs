//! End-to-end posting workflow against a mock transport.
//!
//! The mock records every request, so these tests check both the outcome
//! and exactly which calls were (or were not) made.

use instapost::media::MediaKind;
use instapost::orchestrator::{publish_carousel, PostRequest};
use instapost::transport::mock::MockTransport;
use instapost::transport::Method;
use instapost::{
    post_to_instagram, publish_single_media, Credentials, GraphClient, InstapostError, MediaSpec,
    Orchestrator,
};

const ROOT: &str = "https://graph.facebook.com/v22.0";

fn client(mock: &MockTransport) -> GraphClient<&MockTransport> {
    GraphClient::new(
        mock,
        Credentials {
            access_token: "EAABtoken".to_string(),
            account_id: "17841405822304914".to_string(),
        },
        ROOT,
    )
}

#[test]
fn test_empty_image_url_makes_no_call() {
    for kind in [MediaKind::Image, MediaKind::Stories] {
        let mock = MockTransport::new().ok(r#"{"id":"123"}"#);
        let err = client(&mock)
            .create_media_container(&MediaSpec::for_kind(kind, ""))
            .unwrap_err();
        assert!(matches!(err, InstapostError::InvalidArgument(_)));
        assert_eq!(mock.call_count(), 0);
    }
}

#[test]
fn test_empty_video_url_makes_no_call() {
    for kind in [MediaKind::Video, MediaKind::Reels] {
        let mock = MockTransport::new().ok(r#"{"id":"123"}"#);
        let err = client(&mock)
            .create_media_container(&MediaSpec::for_kind(kind, ""))
            .unwrap_err();
        assert!(matches!(err, InstapostError::InvalidArgument(_)));
        assert_eq!(mock.call_count(), 0);
    }
}

#[test]
fn test_post_creates_then_publishes() {
    let mock = MockTransport::new()
        .ok(r#"{"id":"123"}"#)
        .ok(r#"{"id":"456"}"#);

    let result = post_to_instagram(
        &client(&mock),
        "https://images.example.com/photo.jpeg",
        Some("Automated post"),
    )
    .unwrap();
    assert_eq!(result.media_id, "456");

    let calls = mock.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].method, Method::Post);
    assert_eq!(calls[0].url, format!("{}/17841405822304914/media", ROOT));
    assert_eq!(
        calls[0].param("image_url"),
        Some("https://images.example.com/photo.jpeg")
    );
    assert_eq!(calls[0].param("caption"), Some("Automated post"));
    assert_eq!(calls[1].method, Method::Post);
    assert_eq!(
        calls[1].url,
        format!("{}/17841405822304914/media_publish", ROOT)
    );
    assert_eq!(calls[1].param("creation_id"), Some("123"));
}

#[test]
fn test_container_without_id_skips_publish() {
    let mock = MockTransport::new()
        .ok(r#"{"error":{"message":"Media download has failed"}}"#)
        .ok(r#"{"id":"456"}"#);

    let err = post_to_instagram(&client(&mock), "https://images.example.com/photo.jpeg", None)
        .unwrap_err();
    assert!(matches!(err, InstapostError::MediaContainer(_)));
    assert!(err
        .response_body()
        .unwrap()
        .contains("Media download has failed"));
    assert_eq!(mock.call_count(), 1);
}

#[test]
fn test_container_transport_error_skips_publish() {
    let mock = MockTransport::new().fail("dns error").ok(r#"{"id":"456"}"#);
    let err = publish_single_media(
        &client(&mock),
        &MediaSpec::stories("https://images.example.com/story.jpeg"),
    )
    .unwrap_err();
    assert!(matches!(err, InstapostError::MediaContainer(_)));
    assert_eq!(mock.call_count(), 1);
}

#[test]
fn test_credential_check_transport_error_is_none() {
    let mock = MockTransport::new().fail("connection refused");
    assert!(client(&mock).check_credentials().is_none());
    assert_eq!(mock.call_count(), 1);
}

#[test]
fn test_carousel_container_children_field() {
    let mock = MockTransport::new().ok(r#"{"id":"789"}"#);
    let children = vec!["1".to_string(), "2".to_string(), "3".to_string()];
    client(&mock)
        .create_carousel_container(&children, None)
        .unwrap();

    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, Method::Post);
    assert_eq!(calls[0].param("children"), Some("1,2,3"));
    assert_eq!(calls[0].param("caption"), None);
}

#[test]
fn test_empty_carousel_makes_no_call() {
    let mock = MockTransport::new().ok(r#"{"id":"789"}"#);
    let err = client(&mock)
        .create_carousel_container(&[], Some("nothing"))
        .unwrap_err();
    assert!(matches!(err, InstapostError::InvalidArgument(_)));
    assert_eq!(mock.call_count(), 0);

    let err = publish_carousel(&client(&mock), &[], None).unwrap_err();
    assert!(matches!(err, InstapostError::InvalidArgument(_)));
    assert_eq!(mock.call_count(), 0);
}

#[test]
fn test_status_is_passed_through() {
    let mock = MockTransport::new().ok(r#"{"status_code":"IN_PROGRESS","id":"123"}"#);
    let status = client(&mock).check_container_status("123").unwrap();
    assert_eq!(status.as_str(), "IN_PROGRESS");
    assert_eq!(mock.calls()[0].method, Method::Get);
}

#[test]
fn test_carousel_child_failure_abandons_rest() {
    let mock = MockTransport::new()
        .ok(r#"{"id":"c1"}"#)
        .respond(400, r#"{"error":{"message":"Invalid video"}}"#)
        .ok(r#"{"id":"unused"}"#);
    let err = publish_carousel(
        &client(&mock),
        &[
            MediaSpec::carousel_image("https://images.example.com/1.jpeg"),
            MediaSpec::carousel_video("https://videos.example.com/2.mp4"),
            MediaSpec::carousel_image("https://images.example.com/3.jpeg"),
        ],
        Some("trip"),
    )
    .unwrap_err();
    assert!(matches!(err, InstapostError::MediaContainer(_)));
    assert_eq!(mock.call_count(), 2);
}

#[test]
fn test_full_run_reports_every_stage() {
    let mock = MockTransport::new()
        .ok(r#"{"id":"17841405822304914","username":"acme","account_type":"BUSINESS"}"#)
        .ok(r#"{"id":"123"}"#)
        .ok(r#"{"id":"456"}"#)
        .ok(r#"{"data":[{"quota_usage":3,"config":{"quota_total":100,"quota_duration":86400}}]}"#);
    let client = client(&mock);

    let report = Orchestrator::new(&client).run(&PostRequest::Single(
        MediaSpec::image("https://images.example.com/photo.jpeg").with_caption("hi"),
    ));

    assert!(report.is_success());
    assert_eq!(report.account.unwrap().id, "17841405822304914");
    assert_eq!(report.outcome.unwrap().media_id, "456");
    assert_eq!(report.limit.unwrap().unwrap().remaining(), Some(97));

    let urls = mock.urls();
    assert_eq!(
        urls,
        vec![
            format!("{}/17841405822304914", ROOT),
            format!("{}/17841405822304914/media", ROOT),
            format!("{}/17841405822304914/media_publish", ROOT),
            format!("{}/17841405822304914/content_publishing_limit", ROOT),
        ]
    );
}

#[test]
fn test_limit_failure_does_not_hide_published_post() {
    let mock = MockTransport::new()
        .ok(r#"{"id":"123"}"#)
        .ok(r#"{"id":"456"}"#)
        .respond(403, r#"{"error":{"message":"missing permission"}}"#);
    let client = client(&mock);

    let report = Orchestrator::new(&client)
        .verify_credentials(false)
        .run(&PostRequest::Single(MediaSpec::image(
            "https://images.example.com/photo.jpeg",
        )));

    assert!(report.is_success());
    assert!(matches!(
        report.limit,
        Some(Err(InstapostError::PublishingLimit(_)))
    ));
}
