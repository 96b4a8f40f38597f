// Entrypoint for the CLI application.
// - Parses arguments, loads the config and installs logging.
// - Each subcommand maps onto one library operation; `post` and `carousel`
//   run the full check -> publish -> quota sequence.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use instapost::compose::{compose_post_image, DEFAULT_OUTPUT};
use instapost::logging::LogFormat;
use instapost::orchestrator::INVALID_CREDENTIALS;
use instapost::transport::Transport;
use instapost::ui;
use instapost::{
    Config, GraphClient, InstapostError, MediaKind, MediaSpec, Orchestrator, PostRequest,
};

#[derive(Parser, Debug)]
#[command(name = "instapost", version)]
#[command(about = "Publish images, videos and carousels to Instagram", long_about = None)]
struct Cli {
    /// Config file (defaults to <config dir>/instapost/config.toml)
    #[arg(short, long, global = true, env = "INSTAPOST_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format (text, json or pretty)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the configured token and account work
    Check,

    /// Publish a single image, video, reel or story from a public URL
    Post {
        /// Publicly reachable media URL
        #[arg(long)]
        url: String,

        /// image, video, reels or stories
        #[arg(long, default_value = "image")]
        kind: MediaKind,

        #[arg(long)]
        caption: Option<String>,

        /// Do not verify credentials first
        #[arg(long)]
        skip_check: bool,

        /// Do not query the publishing limit afterwards
        #[arg(long)]
        no_limit_check: bool,
    },

    /// Publish a carousel. Prefix an item with `video:` for videos.
    Carousel {
        #[arg(required = true, value_parser = parse_carousel_item)]
        items: Vec<MediaSpec>,

        #[arg(long)]
        caption: Option<String>,

        #[arg(long)]
        skip_check: bool,

        #[arg(long)]
        no_limit_check: bool,
    },

    /// Show the processing status of a media container
    Status { container_id: String },

    /// Publish an already created media container
    Publish { container_id: String },

    /// Show the content publishing limit
    Limit,

    /// Draw text onto the configured template image
    Compose {
        #[arg(long)]
        text: String,

        #[arg(long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
    },

    /// Interactive menu
    Menu,
}

fn parse_carousel_item(arg: &str) -> Result<MediaSpec, String> {
    let spec = if let Some(url) = arg.strip_prefix("video:") {
        MediaSpec::carousel_video(url)
    } else {
        MediaSpec::carousel_image(arg.strip_prefix("image:").unwrap_or(arg))
    };
    spec.validate().map_err(|e| e.to_string())?;
    Ok(spec)
}

fn main() {
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            e.downcast_ref::<InstapostError>()
                .map(InstapostError::exit_code)
                .unwrap_or(1)
        }
    };
    std::process::exit(code);
}

/// Returns the process exit code.
fn run(cli: Cli) -> Result<i32> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let mut logging = config.logging_config(cli.verbose)?;
    if let Some(format) = cli.log_format {
        logging.format = format;
    }
    let _log = logging.install();

    match cli.command {
        // Composing works offline and needs no credentials.
        Command::Compose { text, output } => compose(&config, &text, &output),
        command => {
            let client = GraphClient::from_config(&config)?;
            run_remote(&client, &config, command)
        }
    }
}

fn compose(config: &Config, text: &str, output: &Path) -> Result<i32> {
    let path = compose_post_image(text, &config.compose, output).map_err(InstapostError::from)?;
    println!("Image written to {}", path.display());
    Ok(0)
}

fn run_remote<T: Transport>(
    client: &GraphClient<T>,
    config: &Config,
    command: Command,
) -> Result<i32> {
    match command {
        Command::Check => {
            match ui::with_spinner("Checking credentials...", || client.check_credentials())? {
                Some(account) => {
                    ui::print_account(&account);
                    Ok(0)
                }
                None => {
                    println!("{}", INVALID_CREDENTIALS);
                    Ok(2)
                }
            }
        }
        Command::Post {
            url,
            kind,
            caption,
            skip_check,
            no_limit_check,
        } => {
            if kind == MediaKind::CarouselItem {
                return Err(InstapostError::InvalidArgument(
                    "use the carousel command for carousel items".to_string(),
                )
                .into());
            }
            let mut spec = MediaSpec::for_kind(kind, url);
            if let Some(caption) = caption {
                spec = spec.with_caption(caption);
            }
            spec.validate()?;
            publish(client, PostRequest::Single(spec), skip_check, no_limit_check)
        }
        Command::Carousel {
            items,
            caption,
            skip_check,
            no_limit_check,
        } => publish(
            client,
            PostRequest::Carousel { items, caption },
            skip_check,
            no_limit_check,
        ),
        Command::Status { container_id } => {
            let status = client.check_container_status(&container_id)?;
            if status.is_ready() {
                println!("{} (ready to publish)", status);
            } else {
                println!("{}", status);
            }
            Ok(0)
        }
        Command::Publish { container_id } => {
            let published = ui::with_spinner("Publishing...", || {
                client.publish_media_container(&container_id)
            })??;
            println!("Post published successfully. Post ID: {}", published.media_id);
            Ok(0)
        }
        Command::Limit => {
            let limit = client.get_content_publishing_limit()?;
            ui::print_limit(&limit);
            Ok(0)
        }
        Command::Menu => {
            ui::main_menu(client, &config.compose)?;
            Ok(0)
        }
        Command::Compose { text, output } => compose(config, &text, &output),
    }
}

fn publish<T: Transport>(
    client: &GraphClient<T>,
    request: PostRequest,
    skip_check: bool,
    no_limit_check: bool,
) -> Result<i32> {
    let orchestrator = Orchestrator::new(client)
        .verify_credentials(!skip_check)
        .check_limit(!no_limit_check);
    let report = ui::with_spinner("Publishing...", || orchestrator.run(&request))?;
    ui::print_report(&report);
    Ok(match &report.outcome {
        Ok(_) => 0,
        Err(e) => e.exit_code(),
    })
}
