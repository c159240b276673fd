use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{ensure, Context};
use caption_client::{CaptionConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use serde::Deserialize;
use story_core::PlaybackTiming;
use url::Url;

const DEFAULT_CONFIG_FILE: &str = "viewer.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tick_interval_ms: u64,
    pub story_duration_ms: u64,
    pub bar_width: usize,
    pub caption_api_url: String,
    pub caption_api_key: Option<String>,
    pub caption_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 30,
            story_duration_ms: 5000,
            bar_width: 12,
            caption_api_url: DEFAULT_BASE_URL.into(),
            caption_api_key: None,
            caption_model: DEFAULT_MODEL.into(),
        }
    }
}

impl Settings {
    pub fn timing(&self) -> PlaybackTiming {
        PlaybackTiming::new(
            Duration::from_millis(self.tick_interval_ms),
            Duration::from_millis(self.story_duration_ms),
        )
    }

    /// `None` when no API key is configured.
    pub fn caption_config(&self) -> Option<CaptionConfig> {
        let api_key = self.caption_api_key.as_deref()?.trim();
        if api_key.is_empty() {
            return None;
        }
        Some(CaptionConfig {
            base_url: self.caption_api_url.clone(),
            model: self.caption_model.clone(),
            api_key: api_key.to_string(),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.tick_interval_ms > 0, "tick_interval_ms must be positive");
        ensure!(
            self.story_duration_ms >= self.tick_interval_ms,
            "story_duration_ms ({}) must be at least tick_interval_ms ({})",
            self.story_duration_ms,
            self.tick_interval_ms
        );
        ensure!(self.bar_width > 0, "bar_width must be positive");
        Url::parse(&self.caption_api_url)
            .with_context(|| format!("invalid caption_api_url '{}'", self.caption_api_url))?;
        ensure!(
            !self.caption_model.trim().is_empty(),
            "caption_model must not be empty"
        );
        Ok(())
    }
}

/// Defaults, then the TOML file, then `APP__*` environment variables.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = match path {
        Some(path) => read_settings_file(path)?,
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                read_settings_file(&default_path)?
            } else {
                Settings::default()
            }
        }
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    settings.validate()?;
    Ok(settings)
}

fn read_settings_file(path: &Path) -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    parse_settings(&raw).with_context(|| format!("invalid settings file '{}'", path.display()))
}

fn parse_settings(raw: &str) -> anyhow::Result<Settings> {
    Ok(toml::from_str::<Settings>(raw)?)
}

fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("APP__TICK_INTERVAL_MS") {
        settings.tick_interval_ms = v
            .parse()
            .with_context(|| format!("APP__TICK_INTERVAL_MS is not a number: '{v}'"))?;
    }
    if let Some(v) = lookup("APP__STORY_DURATION_MS") {
        settings.story_duration_ms = v
            .parse()
            .with_context(|| format!("APP__STORY_DURATION_MS is not a number: '{v}'"))?;
    }
    if let Some(v) = lookup("APP__CAPTION_API_URL") {
        settings.caption_api_url = v;
    }
    if let Some(v) = lookup("APP__CAPTION_API_KEY") {
        settings.caption_api_key = Some(v);
    }
    if let Some(v) = lookup("APP__CAPTION_MODEL") {
        settings.caption_model = v;
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
