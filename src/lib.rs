// Library root
// -----------
// The binary (`main.rs`) is a thin clap front end over these modules.
//
// Module responsibilities:
// - `api`: one method per Graph API call (credential check, container
//   creation, carousel, status, publish, publishing limit).
// - `orchestrator`: sequences those calls into a full post.
// - `transport`: the HTTP seam; a blocking reqwest client and a mock.
// - `media`, `config`, `error`, `logging`: shared types and setup.
// - `compose`: draws text on a template image.
// - `ui`: terminal output and the interactive menu.
pub mod api;
pub mod compose;
pub mod config;
pub mod error;
pub mod logging;
pub mod media;
pub mod orchestrator;
pub mod transport;
pub mod ui;

pub use api::GraphClient;
pub use config::{Config, Credentials};
pub use error::{ApiFailure, InstapostError, Result};
pub use media::{ContainerHandle, ContainerStatus, MediaKind, MediaSpec, PublishResult};
pub use orchestrator::{post_to_instagram, publish_single_media, Orchestrator, PostRequest};
