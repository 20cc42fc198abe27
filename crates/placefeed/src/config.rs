// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scrape configuration: defaults, environment overlay and derived settings.
//!
//! Resolution order is explicit CLI flag > environment variable > default.
//! This module handles the last two; the binary applies flags on top.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{PlacefeedError, PlacefeedResult};

/// Default search phrase.
pub const DEFAULT_SEARCH_TERM: &str = "Toko";

/// Default coordinate used in single-query mode.
pub const DEFAULT_COORDINATE: &str = "@-6.8890102,106.873541,13z";

/// Default bound on scroll rounds per feed.
pub const DEFAULT_MAX_SCROLL_ATTEMPTS: u32 = 5;

/// Whether to scrape one coordinate or every point in the positions file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RunMode {
    Batch { positions: PathBuf },
    Single { coordinate: String, area: Option<String> },
}

impl Default for RunMode {
    fn default() -> Self {
        RunMode::Batch {
            positions: PathBuf::from("positions.json"),
        }
    }
}

/// CSS selectors and attribute names describing the one known page layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selectors {
    /// Scrollable results container.
    pub feed: String,
    /// One clickable entry inside the feed.
    pub card: String,
    /// Root of the detail panel opened by a card click.
    pub panel: String,
    /// Heading inside the panel, relative to `panel`.
    pub title: String,
    /// Item buttons inside the panel, relative to `panel`.
    pub item_button: String,
    /// Attribute holding the structured identifier (e.g. `phone:tel:0812...`).
    pub item_id_attribute: String,
    /// Attribute holding the human-readable label (e.g. `Address: ...`).
    pub item_label_attribute: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            feed: "[role='feed']".into(),
            card: "[role='feed'] a.hfpxzc".into(),
            panel: "div.bJzME.Hu9e2e.tTVLSc > div > div.e07Vkf.kA9KIf > div > div".into(),
            title: "h1".into(),
            item_button: "button[data-item-id]".into(),
            item_id_attribute: "data-item-id".into(),
            item_label_attribute: "aria-label".into(),
        }
    }
}

impl Selectors {
    /// Absolute selector for the panel title.
    pub fn title_selector(&self) -> String {
        format!("{} {}", self.panel, self.title)
    }

    /// Absolute selector for the panel's item buttons.
    pub fn item_button_selector(&self) -> String {
        format!("{} {}", self.panel, self.item_button)
    }
}

/// Delays used to pace interaction with the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pacing {
    /// Lower bound of the randomized wait after clicking a card.
    pub click_delay_min: Duration,
    /// Upper bound of the randomized wait after clicking a card.
    pub click_delay_max: Duration,
    /// Base wait after a scroll round; multiplied by the round number.
    pub scroll_delay: Duration,
    /// Cap on the per-round scroll wait.
    pub scroll_delay_max: Duration,
    /// Pixels per scroll step.
    pub scroll_step_px: u32,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            click_delay_min: Duration::from_secs(2),
            click_delay_max: Duration::from_secs(5),
            scroll_delay: Duration::from_millis(1500),
            scroll_delay_max: Duration::from_secs(8),
            scroll_step_px: 400,
        }
    }
}

impl Pacing {
    /// No waiting at all. Used for tests and dry runs.
    pub fn immediate() -> Self {
        Self {
            click_delay_min: Duration::ZERO,
            click_delay_max: Duration::ZERO,
            scroll_delay: Duration::ZERO,
            scroll_delay_max: Duration::ZERO,
            scroll_step_px: 400,
        }
    }

    /// Wait after scroll round `attempt` (0-based).
    pub fn scroll_backoff(&self, attempt: u32) -> Duration {
        self.scroll_delay
            .saturating_mul(attempt.saturating_add(1))
            .min(self.scroll_delay_max)
    }
}

/// Full configuration for a scrape run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub search_term: String,
    pub mode: RunMode,
    pub headless: bool,
    pub max_scroll_attempts: u32,
    pub output_dir: PathBuf,
    /// Extra attempts for a failed query point before it is skipped.
    pub point_retries: u32,
    pub navigation_timeout: Duration,
    pub load_state_timeout: Duration,
    pub feed_timeout: Duration,
    pub panel_timeout: Duration,
    pub selectors: Selectors,
    pub pacing: Pacing,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            search_term: DEFAULT_SEARCH_TERM.into(),
            mode: RunMode::default(),
            headless: true,
            max_scroll_attempts: DEFAULT_MAX_SCROLL_ATTEMPTS,
            output_dir: PathBuf::from("output"),
            point_retries: 0,
            navigation_timeout: Duration::from_secs(30),
            load_state_timeout: Duration::from_secs(5),
            feed_timeout: Duration::from_secs(5),
            panel_timeout: Duration::from_secs(5),
            selectors: Selectors::default(),
            pacing: Pacing::default(),
        }
    }
}

impl ScrapeConfig {
    /// Defaults overlaid with `PLACEFEED_*` environment variables.
    pub fn from_env() -> PlacefeedResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> PlacefeedResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(term) = get("PLACEFEED_SEARCH") {
            config.search_term = term;
        }
        if let Some(raw) = get("PLACEFEED_HEADLESS") {
            config.headless = parse_bool("PLACEFEED_HEADLESS", &raw)?;
        }
        if let Some(raw) = get("PLACEFEED_MAX_SCROLLS") {
            config.max_scroll_attempts = parse_u32("PLACEFEED_MAX_SCROLLS", &raw)?;
        }
        if let Some(raw) = get("PLACEFEED_POINT_RETRIES") {
            config.point_retries = parse_u32("PLACEFEED_POINT_RETRIES", &raw)?;
        }
        if let Some(dir) = get("PLACEFEED_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }

        let mode = get("PLACEFEED_MODE").unwrap_or_else(|| "batch".into());
        config.mode = match mode.trim().to_ascii_lowercase().as_str() {
            "batch" => RunMode::Batch {
                positions: get("PLACEFEED_POSITIONS")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("positions.json")),
            },
            "single" => RunMode::Single {
                coordinate: get("PLACEFEED_COORDINATE")
                    .unwrap_or_else(|| DEFAULT_COORDINATE.into()),
                area: get("PLACEFEED_AREA"),
            },
            other => {
                return Err(PlacefeedError::InvalidInput(format!(
                    "PLACEFEED_MODE must be `batch` or `single`, got {other:?}"
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> PlacefeedResult<()> {
        if self.search_term.trim().is_empty() {
            return Err(PlacefeedError::InvalidInput("search term is empty".into()));
        }
        if self.max_scroll_attempts == 0 {
            return Err(PlacefeedError::InvalidInput(
                "max scroll attempts must be at least 1".into(),
            ));
        }
        if self.pacing.click_delay_min > self.pacing.click_delay_max {
            return Err(PlacefeedError::InvalidInput(format!(
                "click delay range is inverted: {:?} > {:?}",
                self.pacing.click_delay_min, self.pacing.click_delay_max
            )));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, raw: &str) -> PlacefeedResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(PlacefeedError::InvalidInput(format!(
            "{key} must be a boolean, got {other:?}"
        ))),
    }
}

fn parse_u32(key: &str, raw: &str) -> PlacefeedResult<u32> {
    raw.trim().parse().map_err(|_| {
        PlacefeedError::InvalidInput(format!("{key} must be a non-negative integer, got {raw:?}"))
    })
}
