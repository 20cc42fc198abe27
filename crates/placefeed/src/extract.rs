// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Card extraction: click a feed entry, wait for its detail panel, parse it.
//!
//! Each card runs through `Clicked → AwaitingPanel → Parsing` and ends as
//! recorded, skipped as a duplicate, or failed. Failures never leave the card
//! boundary; the caller simply moves on to the next card.

use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::aggregate::ResultAggregator;
use crate::config::{Pacing, ScrapeConfig, Selectors};
use crate::parse::{parse_address, parse_phone, parse_title};
use crate::renderer::{ElementHandle, RenderContext, WaitOptions};
use crate::types::{DedupIndex, ExtractedRecord};

/// Where in the per-card sequence processing stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStage {
    Clicked,
    AwaitingPanel,
    Parsing,
}

/// Terminal state of one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardOutcome {
    Recorded(ExtractedRecord),
    SkippedDuplicate { title: String },
    Failed { stage: CardStage, reason: String },
}

/// Counts for one pass over a feed's cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub cards: usize,
    pub recorded: usize,
    pub duplicates: usize,
    pub failed: usize,
}

/// Runs the per-card state machine against one page.
pub struct CardExtractor<'a> {
    selectors: &'a Selectors,
    pacing: &'a Pacing,
    panel_timeout: Duration,
}

impl<'a> CardExtractor<'a> {
    pub fn new(selectors: &'a Selectors, pacing: &'a Pacing, panel_timeout: Duration) -> Self {
        Self {
            selectors,
            pacing,
            panel_timeout,
        }
    }

    pub fn from_config(config: &'a ScrapeConfig) -> Self {
        Self::new(&config.selectors, &config.pacing, config.panel_timeout)
    }

    /// Process every card in scan order into `aggregator`.
    ///
    /// A fresh [`DedupIndex`] scopes duplicate detection to this feed.
    pub async fn extract_all(
        &self,
        ctx: &mut dyn RenderContext,
        cards: &[ElementHandle],
        aggregator: &mut ResultAggregator,
    ) -> ExtractionStats {
        let mut dedup = DedupIndex::new();
        let mut stats = ExtractionStats {
            cards: cards.len(),
            ..ExtractionStats::default()
        };

        for (position, &card) in cards.iter().enumerate() {
            match self.extract(ctx, card, &mut dedup).await {
                CardOutcome::Recorded(record) => {
                    tracing::info!(
                        card = position + 1,
                        of = cards.len(),
                        title = %record.title,
                        "card recorded"
                    );
                    aggregator.push(record);
                    stats.recorded += 1;
                }
                CardOutcome::SkippedDuplicate { title } => {
                    tracing::debug!(card = position + 1, %title, "duplicate card skipped");
                    stats.duplicates += 1;
                }
                CardOutcome::Failed { stage, reason } => {
                    tracing::warn!(card = position + 1, ?stage, "card failed: {reason}");
                    stats.failed += 1;
                }
            }
        }

        stats
    }

    /// Process one card. Never returns an error; failures become
    /// [`CardOutcome::Failed`].
    pub async fn extract(
        &self,
        ctx: &mut dyn RenderContext,
        card: ElementHandle,
        dedup: &mut DedupIndex,
    ) -> CardOutcome {
        let mut stage = CardStage::Clicked;
        match self.run(ctx, card, dedup, &mut stage).await {
            Ok(outcome) => outcome,
            Err(e) => CardOutcome::Failed {
                stage,
                reason: format!("{e:#}"),
            },
        }
    }

    async fn run(
        &self,
        ctx: &mut dyn RenderContext,
        card: ElementHandle,
        dedup: &mut DedupIndex,
        stage: &mut CardStage,
    ) -> Result<CardOutcome> {
        ctx.click(card).await?;
        let pause = self.click_pause();
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }

        *stage = CardStage::AwaitingPanel;
        let attached = ctx
            .wait_for_selector(&self.selectors.panel, WaitOptions::attached(self.panel_timeout))
            .await?;
        if !attached {
            return Ok(CardOutcome::Failed {
                stage: CardStage::AwaitingPanel,
                reason: format!(
                    "detail panel did not attach within {}ms",
                    self.panel_timeout.as_millis()
                ),
            });
        }

        *stage = CardStage::Parsing;
        let title = match ctx.query_selector(&self.selectors.title_selector()).await? {
            Some(heading) => parse_title(ctx.get_text(heading).await?.as_deref()),
            None => parse_title(None),
        };
        if dedup.contains(&title) {
            return Ok(CardOutcome::SkippedDuplicate { title });
        }

        let buttons = ctx.query_all(&self.selectors.item_button_selector()).await?;

        let first_label = match buttons.first() {
            Some(&button) => self.item_label(ctx, button).await?,
            None => None,
        };

        let mut identifiers = Vec::with_capacity(buttons.len());
        for &button in &buttons {
            if let Some(id) = ctx
                .get_attribute(button, &self.selectors.item_id_attribute)
                .await?
            {
                identifiers.push(id);
            }
        }

        let record = ExtractedRecord {
            address: parse_address(first_label.as_deref()),
            phone: parse_phone(&identifiers),
            title,
        };
        dedup.insert(&record.title);
        Ok(CardOutcome::Recorded(record))
    }

    /// Label attribute of an item button, falling back to its text.
    async fn item_label(
        &self,
        ctx: &mut dyn RenderContext,
        button: ElementHandle,
    ) -> Result<Option<String>> {
        if let Some(label) = ctx
            .get_attribute(button, &self.selectors.item_label_attribute)
            .await?
        {
            return Ok(Some(label));
        }
        ctx.get_text(button).await
    }

    fn click_pause(&self) -> Duration {
        let (min, max) = (self.pacing.click_delay_min, self.pacing.click_delay_max);
        if min >= max {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_pause_stays_within_bounds() {
        let selectors = Selectors::default();
        let pacing = Pacing::default();
        let extractor = CardExtractor::new(&selectors, &pacing, Duration::from_secs(1));
        for _ in 0..50 {
            let pause = extractor.click_pause();
            assert!(pause >= pacing.click_delay_min);
            assert!(pause <= pacing.click_delay_max);
        }
    }

    #[test]
    fn click_pause_with_collapsed_range() {
        let selectors = Selectors::default();
        let pacing = Pacing {
            click_delay_min: Duration::from_millis(250),
            click_delay_max: Duration::from_millis(100),
            ..Pacing::immediate()
        };
        let extractor = CardExtractor::new(&selectors, &pacing, Duration::from_secs(1));
        assert_eq!(extractor.click_pause(), Duration::from_millis(250));
        let pacing = Pacing::immediate();
        let extractor = CardExtractor::new(&selectors, &pacing, Duration::from_secs(1));
        assert!(extractor.click_pause().is_zero());
    }

    #[test]
    fn stage_serializes_snake_case() {
        let json = serde_json::to_string(&CardStage::AwaitingPanel).unwrap();
        assert_eq!(json, "\"awaiting_panel\"");
    }
}
