// Posting workflow: container creation followed by publish, optionally
// wrapped in a credential check up front and a quota check at the end.
//
// Steps run strictly one after the other. When a step fails the rest are
// skipped; a container that was created but never published is left for
// the platform to expire.

use tracing::{error, info, warn};

use crate::api::GraphClient;
use crate::error::{InstapostError, Result};
use crate::media::{AccountInfo, MediaKind, MediaSpec, PublishResult, PublishingLimit};
use crate::transport::Transport;

pub const INVALID_CREDENTIALS: &str =
    "Invalid credentials. Please update your config and try again.";

/// Create a container for `spec` and publish it.
pub fn publish_single_media<T: Transport>(
    client: &GraphClient<T>,
    spec: &MediaSpec,
) -> Result<PublishResult> {
    if spec.kind == MediaKind::CarouselItem {
        return Err(InstapostError::InvalidArgument(
            "carousel items can only be published as part of a carousel".to_string(),
        ));
    }
    let result = client
        .create_media_container(spec)
        .and_then(|container| client.publish_media_container(&container.id));
    if let Err(e) = &result {
        error!("Error during single media publishing: {}", e);
    }
    result
}

/// Publish a single image from a public URL.
pub fn post_to_instagram<T: Transport>(
    client: &GraphClient<T>,
    image_url: &str,
    caption: Option<&str>,
) -> Result<PublishResult> {
    let mut spec = MediaSpec::image(image_url);
    if let Some(caption) = caption {
        spec = spec.with_caption(caption);
    }
    publish_single_media(client, &spec)
}

/// Create one child container per item, combine them into a carousel and
/// publish it. Every item is validated before the first request.
pub fn publish_carousel<T: Transport>(
    client: &GraphClient<T>,
    items: &[MediaSpec],
    caption: Option<&str>,
) -> Result<PublishResult> {
    if items.is_empty() {
        return Err(InstapostError::InvalidArgument(
            "a carousel needs at least one item".to_string(),
        ));
    }
    for item in items {
        if item.kind != MediaKind::CarouselItem {
            return Err(InstapostError::InvalidArgument(format!(
                "{} media cannot be a carousel item",
                item.kind
            )));
        }
        item.validate()?;
    }

    let result = build_and_publish_carousel(client, items, caption);
    if let Err(e) = &result {
        error!("Error during carousel publishing: {}", e);
    }
    result
}

fn build_and_publish_carousel<T: Transport>(
    client: &GraphClient<T>,
    items: &[MediaSpec],
    caption: Option<&str>,
) -> Result<PublishResult> {
    let mut children = Vec::with_capacity(items.len());
    for item in items {
        children.push(client.create_media_container(item)?.id);
    }
    let carousel = client.create_carousel_container(&children, caption)?;
    client.publish_media_container(&carousel.id)
}

/// What to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostRequest {
    Single(MediaSpec),
    Carousel {
        items: Vec<MediaSpec>,
        caption: Option<String>,
    },
}

/// Everything a run produced, for the caller to report.
#[derive(Debug)]
pub struct PostReport {
    /// Profile from the credential check, if one ran and succeeded.
    pub account: Option<AccountInfo>,
    pub outcome: Result<PublishResult>,
    /// `None` when the quota check was skipped.
    pub limit: Option<Result<PublishingLimit>>,
}

impl PostReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Runs a full post: credential check, publish, quota check.
pub struct Orchestrator<'a, T> {
    client: &'a GraphClient<T>,
    verify_credentials: bool,
    check_limit: bool,
}

impl<'a, T: Transport> Orchestrator<'a, T> {
    pub fn new(client: &'a GraphClient<T>) -> Self {
        Self {
            client,
            verify_credentials: true,
            check_limit: true,
        }
    }

    pub fn verify_credentials(mut self, enabled: bool) -> Self {
        self.verify_credentials = enabled;
        self
    }

    pub fn check_limit(mut self, enabled: bool) -> Self {
        self.check_limit = enabled;
        self
    }

    /// A failed credential check ends the run. A failed post does not stop
    /// the quota check.
    pub fn run(&self, request: &PostRequest) -> PostReport {
        let mut account = None;
        if self.verify_credentials {
            account = self.client.check_credentials();
            if account.is_none() {
                warn!("{}", INVALID_CREDENTIALS);
                return PostReport {
                    account: None,
                    outcome: Err(InstapostError::Authentication(
                        INVALID_CREDENTIALS.to_string(),
                    )),
                    limit: None,
                };
            }
        }

        let outcome = match request {
            PostRequest::Single(spec) => publish_single_media(self.client, spec),
            PostRequest::Carousel { items, caption } => {
                publish_carousel(self.client, items, caption.as_deref())
            }
        };
        if let Ok(published) = &outcome {
            info!(media_id = %published.media_id, "Post published");
        }

        let limit = self
            .check_limit
            .then(|| self.client.get_content_publishing_limit());

        PostReport {
            account,
            outcome,
            limit,
        }
    }
}
