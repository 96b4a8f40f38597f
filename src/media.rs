// Request and response records exchanged with the Graph API. None of these
// are stored: each one is built for a single call and dropped afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{InstapostError, Result};

/// The platform rejects carousels outside this range. Only the lower
/// bound is checked locally.
pub const MAX_CAROUSEL_CHILDREN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Reels,
    Stories,
    CarouselItem,
}

impl MediaKind {
    /// Value sent as `media_type`. Single images and image carousel
    /// items are sent without one.
    pub fn media_type(&self, has_video: bool) -> Option<&'static str> {
        match self {
            MediaKind::Image => None,
            MediaKind::Video => Some("VIDEO"),
            MediaKind::Reels => Some("REELS"),
            MediaKind::Stories => Some("STORIES"),
            MediaKind::CarouselItem if has_video => Some("VIDEO"),
            MediaKind::CarouselItem => None,
        }
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            "reels" => Ok(MediaKind::Reels),
            "stories" => Ok(MediaKind::Stories),
            "carousel_item" | "carousel-item" => Ok(MediaKind::CarouselItem),
            _ => Err(format!(
                "Invalid media kind: '{}'. Valid options: image, video, reels, stories, carousel_item",
                s
            )),
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaKind::Image => "IMAGE",
            MediaKind::Video => "VIDEO",
            MediaKind::Reels => "REELS",
            MediaKind::Stories => "STORIES",
            MediaKind::CarouselItem => "CAROUSEL_ITEM",
        };
        f.write_str(name)
    }
}

/// What to put in a media container. Images travel as `image_url`,
/// videos as `video_url`; which one is required depends on `kind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSpec {
    pub kind: MediaKind,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub caption: Option<String>,
}

impl MediaSpec {
    pub fn image(url: impl Into<String>) -> Self {
        Self::with_image(MediaKind::Image, url)
    }

    pub fn stories(url: impl Into<String>) -> Self {
        Self::with_image(MediaKind::Stories, url)
    }

    pub fn video(url: impl Into<String>) -> Self {
        Self::with_video(MediaKind::Video, url)
    }

    pub fn reels(url: impl Into<String>) -> Self {
        Self::with_video(MediaKind::Reels, url)
    }

    pub fn carousel_image(url: impl Into<String>) -> Self {
        Self::with_image(MediaKind::CarouselItem, url)
    }

    pub fn carousel_video(url: impl Into<String>) -> Self {
        Self::with_video(MediaKind::CarouselItem, url)
    }

    /// Build a spec for `kind`, placing `url` in the field that kind reads.
    pub fn for_kind(kind: MediaKind, url: impl Into<String>) -> Self {
        match kind {
            MediaKind::Video | MediaKind::Reels => Self::with_video(kind, url),
            _ => Self::with_image(kind, url),
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    fn with_image(kind: MediaKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            image_url: Some(url.into()),
            video_url: None,
            caption: None,
        }
    }

    fn with_video(kind: MediaKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            image_url: None,
            video_url: Some(url.into()),
            caption: None,
        }
    }

    /// Check that the URL the kind needs is present. Runs before any
    /// request is built.
    pub fn validate(&self) -> Result<()> {
        let image = non_empty(&self.image_url);
        let video = non_empty(&self.video_url);
        match self.kind {
            MediaKind::Image | MediaKind::Stories if image.is_none() => {
                Err(InstapostError::InvalidArgument(format!(
                    "{} media requires an image URL",
                    self.kind
                )))
            }
            MediaKind::Video | MediaKind::Reels if video.is_none() => {
                Err(InstapostError::InvalidArgument(format!(
                    "{} media requires a video URL",
                    self.kind
                )))
            }
            MediaKind::CarouselItem if image.is_none() && video.is_none() => {
                Err(InstapostError::InvalidArgument(
                    "carousel items require an image or video URL".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Form fields for the media-creation endpoint, minus the access token.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let video = non_empty(&self.video_url);
        let mut params = Vec::new();

        if let Some(media_type) = self.kind.media_type(video.is_some()) {
            params.push(("media_type".to_string(), media_type.to_string()));
        }
        match self.kind {
            MediaKind::Video | MediaKind::Reels => {
                if let Some(url) = video {
                    params.push(("video_url".to_string(), url.to_string()));
                }
            }
            MediaKind::Image | MediaKind::Stories => {
                if let Some(url) = non_empty(&self.image_url) {
                    params.push(("image_url".to_string(), url.to_string()));
                }
            }
            MediaKind::CarouselItem => {
                match video {
                    Some(url) => params.push(("video_url".to_string(), url.to_string())),
                    None => {
                        if let Some(url) = non_empty(&self.image_url) {
                            params.push(("image_url".to_string(), url.to_string()));
                        }
                    }
                }
                params.push(("is_carousel_item".to_string(), "true".to_string()));
            }
        }
        // Captions belong to the carousel, not to its children.
        if self.kind != MediaKind::CarouselItem {
            if let Some(caption) = non_empty(&self.caption) {
                params.push(("caption".to_string(), caption.to_string()));
            }
        }
        params
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Server-side staging object for a post that is not live yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    pub id: String,
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarouselSpec {
    pub children: Vec<String>,
    pub caption: Option<String>,
}

impl CarouselSpec {
    pub fn new(children: Vec<String>, caption: Option<String>) -> Self {
        Self { children, caption }
    }

    pub fn validate(&self) -> Result<()> {
        if self.children.is_empty() {
            return Err(InstapostError::InvalidArgument(
                "a carousel needs at least one child container".to_string(),
            ));
        }
        if self.children.iter().any(|c| c.trim().is_empty()) {
            return Err(InstapostError::InvalidArgument(
                "carousel child container ids must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("media_type".to_string(), "CAROUSEL".to_string()),
            ("children".to_string(), self.children.join(",")),
        ];
        if let Some(caption) = non_empty(&self.caption) {
            params.push(("caption".to_string(), caption.to_string()));
        }
        params
    }
}

/// The id of a live post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishResult {
    pub media_id: String,
}

/// Processing state reported for a container. Values the platform adds
/// later are kept verbatim in `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatus {
    Expired,
    Error,
    Finished,
    InProgress,
    Published,
    Unknown(String),
}

impl ContainerStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ContainerStatus::Expired => "EXPIRED",
            ContainerStatus::Error => "ERROR",
            ContainerStatus::Finished => "FINISHED",
            ContainerStatus::InProgress => "IN_PROGRESS",
            ContainerStatus::Published => "PUBLISHED",
            ContainerStatus::Unknown(raw) => raw,
        }
    }

    /// Whether the container can be handed to the publish endpoint.
    pub fn is_ready(&self) -> bool {
        matches!(self, ContainerStatus::Finished)
    }
}

impl From<&str> for ContainerStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "EXPIRED" => ContainerStatus::Expired,
            "ERROR" => ContainerStatus::Error,
            "FINISHED" => ContainerStatus::Finished,
            "IN_PROGRESS" => ContainerStatus::InProgress,
            "PUBLISHED" => ContainerStatus::Published,
            other => ContainerStatus::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile returned by the credential check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub account_type: Option<String>,
}

/// How much of the rolling publishing quota has been used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishingLimit {
    #[serde(default)]
    pub quota_usage: Option<u64>,
    #[serde(default)]
    pub config: Option<QuotaConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaConfig {
    #[serde(default)]
    pub quota_total: Option<u64>,
    #[serde(default)]
    pub quota_duration: Option<u64>,
}

impl PublishingLimit {
    pub fn remaining(&self) -> Option<u64> {
        let total = self.config.as_ref()?.quota_total?;
        Some(total.saturating_sub(self.quota_usage.unwrap_or(0)))
    }
}
