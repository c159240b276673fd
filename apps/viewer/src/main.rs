use std::{io, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use caption_client::{
    caption_or_fallback, CaptionMedia, CaptionService, HttpCaptionService,
    UnavailableCaptionService,
};
use chrono::Utc;
use clap::Parser;
use shared::domain::StoryDraft;
use story_core::PlaybackController;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod demo;
mod terminal;

use config::{load_settings, Settings};

const TRENDING_TOPIC_LIMIT: usize = 5;

#[derive(Parser, Debug)]
#[command(about = "Full-screen story viewer for the terminal")]
struct Args {
    /// Settings file; defaults to ./viewer.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Index in the story ring to open.
    #[arg(long, default_value_t = 0)]
    open: usize,
    /// Media reference to post as a new story before opening the viewer.
    #[arg(long = "add-story")]
    add_story: Vec<String>,
    /// Generate captions for stories added with --add-story.
    #[arg(long)]
    caption: bool,
    /// Print trending topics from the caption service.
    #[arg(long)]
    trends: bool,
}

fn build_caption_service(settings: &Settings) -> Result<Arc<dyn CaptionService>> {
    match settings.caption_config() {
        Some(config) => {
            let service =
                HttpCaptionService::new(config).context("failed to build caption service")?;
            Ok(Arc::new(service))
        }
        None => Ok(Arc::new(UnavailableCaptionService::new(
            "no caption API key configured (APP__CAPTION_API_KEY)",
        ))),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let settings = load_settings(args.config.as_deref())?;
    let captions = build_caption_service(&settings)?;
    let store = Arc::new(demo::seed_store(Utc::now()));

    for media_url in &args.add_story {
        let mut draft = StoryDraft::new(demo::current_user(), media_url.clone());
        if args.caption {
            let media = CaptionMedia::Url(media_url.clone());
            draft.caption = Some(caption_or_fallback(captions.as_ref(), &media, None).await);
        }
        let story = store
            .add_story(draft)
            .with_context(|| format!("failed to add story '{media_url}'"))?;
        info!(story_id = story.id.0, "posted story");
    }

    if args.trends {
        match captions.trending_topics(TRENDING_TOPIC_LIMIT).await {
            Ok(topics) => {
                println!("Trending:");
                for topic in topics {
                    println!("  #{topic}");
                }
            }
            Err(err) => warn!(error = %err, "trending topics unavailable"),
        }
    }

    for line in terminal::render_story_ring(&store.list(), Utc::now()) {
        println!("{line}");
    }

    let controller = PlaybackController::new(Arc::clone(&store), settings.timing());
    let reason = terminal::run(
        &controller,
        args.open,
        settings.bar_width,
        BufReader::new(tokio::io::stdin()),
        &mut io::stdout(),
    )
    .await?;
    info!(?reason, unviewed = store.unviewed_count(), "viewer finished");

    Ok(())
}
