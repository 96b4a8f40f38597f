// UI layer: terminal output for the CLI commands and an interactive menu
// built on `dialoguer`. Remote calls run behind an `indicatif` spinner.

use anyhow::Result;
use crossterm::style::{Color, Stylize};
use crossterm::tty::IsTty;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use crate::api::GraphClient;
use crate::compose::{compose_post_image, DEFAULT_OUTPUT};
use crate::config::ComposeConfig;
use crate::error::InstapostError;
use crate::media::{AccountInfo, MediaKind, MediaSpec, PublishingLimit};
use crate::orchestrator::{Orchestrator, PostReport, PostRequest, INVALID_CREDENTIALS};
use crate::transport::Transport;

/// Color `text` when stdout is a terminal; plain text otherwise.
fn colored(text: &str, color: Color) -> String {
    paint(text, color, std::io::stdout().is_tty())
}

fn paint(text: &str, color: Color, tty: bool) -> String {
    if tty {
        text.with(color).to_string()
    } else {
        text.to_string()
    }
}

/// Run `f` while a spinner with `message` is shown on stderr.
pub fn with_spinner<T>(message: &str, f: impl FnOnce() -> T) -> Result<T> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = f();
    spinner.finish_and_clear();
    Ok(out)
}

pub fn print_account(account: &AccountInfo) {
    println!(
        "{} {} (@{}, {})",
        colored("Credentials are valid.", Color::Green),
        account.id,
        account.username.as_deref().unwrap_or("unknown"),
        account.account_type.as_deref().unwrap_or("unknown type"),
    );
}

pub fn print_limit(limit: &PublishingLimit) {
    let usage = limit
        .quota_usage
        .map(|u| u.to_string())
        .unwrap_or_else(|| "?".into());
    match (limit.config.as_ref().and_then(|c| c.quota_total), limit.remaining()) {
        (Some(total), Some(remaining)) => println!(
            "Publishing limit: {}/{} used, {} remaining",
            usage, total, remaining
        ),
        _ => println!("Publishing limit: {} used", usage),
    }
}

/// Print the outcome of a post. Each stage gets its own line so a failure
/// names the step that broke.
pub fn print_report(report: &PostReport) {
    if let Some(account) = &report.account {
        print_account(account);
    }
    match &report.outcome {
        Ok(published) => println!(
            "{} Post ID: {}",
            colored("Post published successfully.", Color::Green),
            published.media_id
        ),
        Err(InstapostError::Authentication(_)) => {
            println!("{}", colored(INVALID_CREDENTIALS, Color::Red))
        }
        Err(e) => println!("{} {}", colored("Error during posting:", Color::Red), e),
    }
    match &report.limit {
        Some(Ok(limit)) => print_limit(limit),
        Some(Err(e)) => println!(
            "{} {}",
            colored("Could not fetch publishing limit:", Color::Yellow),
            e
        ),
        None => {}
    }
}

/// Main interactive menu. Runs a select loop until the user picks "Exit".
pub fn main_menu<T: Transport>(client: &GraphClient<T>, compose: &ComposeConfig) -> Result<()> {
    loop {
        let items = vec![
            "Check credentials",
            "Post single media",
            "Post carousel",
            "Check container status",
            "Publish existing container",
            "Check publishing limit",
            "Compose post image",
            "Exit",
        ];
        let selection = Select::new().items(&items).default(0).interact()?;
        match selection {
            0 => match with_spinner("Checking credentials...", || client.check_credentials())? {
                Some(account) => print_account(&account),
                None => println!("{}", colored(INVALID_CREDENTIALS, Color::Red)),
            },
            1 => handle_single(client)?,
            2 => handle_carousel(client)?,
            3 => {
                let id: String = Input::new().with_prompt("Container id").interact_text()?;
                match with_spinner("Checking status...", || client.check_container_status(&id))? {
                    Ok(status) => println!("Container {}: {}", id, status),
                    Err(e) => println!("{} {}", colored("Status check failed:", Color::Red), e),
                }
            }
            4 => {
                let id: String = Input::new().with_prompt("Container id").interact_text()?;
                match with_spinner("Publishing...", || client.publish_media_container(&id))? {
                    Ok(published) => println!(
                        "{} Post ID: {}",
                        colored("Post published successfully.", Color::Green),
                        published.media_id
                    ),
                    Err(e) => println!("{} {}", colored("Error during posting:", Color::Red), e),
                }
            }
            5 => match with_spinner("Fetching limit...", || client.get_content_publishing_limit())? {
                Ok(limit) => print_limit(&limit),
                Err(e) => println!(
                    "{} {}",
                    colored("Could not fetch publishing limit:", Color::Red),
                    e
                ),
            },
            6 => handle_compose(compose)?,
            7 => break,
            _ => {}
        }
    }
    Ok(())
}

fn prompt_caption() -> Result<Option<String>> {
    let caption: String = Input::new()
        .with_prompt("Caption (empty for none)")
        .allow_empty(true)
        .interact_text()?;
    Ok(Some(caption).filter(|c| !c.trim().is_empty()))
}

/// Collect kind, URL and caption, confirm, then post.
fn handle_single<T: Transport>(client: &GraphClient<T>) -> Result<()> {
    let kinds = vec![MediaKind::Image, MediaKind::Video, MediaKind::Reels, MediaKind::Stories];
    let labels: Vec<String> = kinds.iter().map(|k| k.to_string()).collect();
    let kind = kinds[Select::new()
        .with_prompt("Media kind")
        .items(&labels)
        .default(0)
        .interact()?];
    let url: String = Input::new()
        .with_prompt("Public media URL")
        .interact_text()?;
    let mut spec = MediaSpec::for_kind(kind, url);
    if let Some(caption) = prompt_caption()? {
        spec = spec.with_caption(caption);
    }
    if let Err(e) = spec.validate() {
        println!("{}", colored(&e.to_string(), Color::Red));
        return Ok(());
    }
    if !Confirm::new().with_prompt("Publish now?").default(true).interact()? {
        return Ok(());
    }

    let orchestrator = Orchestrator::new(client);
    let report = with_spinner("Publishing...", || {
        orchestrator.run(&PostRequest::Single(spec))
    })?;
    print_report(&report);
    Ok(())
}

/// Collect carousel items until an empty URL is entered.
fn handle_carousel<T: Transport>(client: &GraphClient<T>) -> Result<()> {
    let mut items: Vec<MediaSpec> = Vec::new();
    loop {
        let url: String = Input::new()
            .with_prompt(format!("Item {} URL (empty to finish)", items.len() + 1))
            .allow_empty(true)
            .interact_text()?;
        if url.trim().is_empty() {
            break;
        }
        let is_video = Select::new()
            .items(&["image", "video"])
            .default(0)
            .interact()?
            == 1;
        items.push(if is_video {
            MediaSpec::carousel_video(url)
        } else {
            MediaSpec::carousel_image(url)
        });
    }
    if items.is_empty() {
        println!("A carousel needs at least one item.");
        return Ok(());
    }
    let caption = prompt_caption()?;
    if !Confirm::new()
        .with_prompt(format!("Publish carousel with {} items?", items.len()))
        .default(true)
        .interact()?
    {
        return Ok(());
    }

    let orchestrator = Orchestrator::new(client);
    let report = with_spinner("Publishing carousel...", || {
        orchestrator.run(&PostRequest::Carousel { items, caption })
    })?;
    print_report(&report);
    Ok(())
}

fn handle_compose(compose: &ComposeConfig) -> Result<()> {
    let text: String = Input::new().with_prompt("Text").interact_text()?;
    let output: String = Input::new()
        .with_prompt("Output path")
        .default(DEFAULT_OUTPUT.to_string())
        .interact_text()?;
    match compose_post_image(&text, compose, &PathBuf::from(output)) {
        Ok(path) => println!(
            "Image written to {}. Host it at a public URL before posting.",
            path.display()
        ),
        Err(e) => println!("{} {}", colored("Image composition failed:", Color::Red), e),
    }
    Ok(())
}
