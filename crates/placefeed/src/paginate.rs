// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Feed pagination: scroll the results container until it stops growing.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::Pacing;
use crate::renderer::RenderContext;

/// What a pagination pass did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationOutcome {
    /// Scroll rounds performed.
    pub attempts: u32,
    /// Height measurements taken (one per round).
    pub measurements: u32,
    /// Last measured `scrollHeight` of the feed.
    pub final_height: f64,
    /// `true` when two consecutive measurements matched; `false` when the
    /// attempt bound stopped a still-growing feed.
    pub stabilized: bool,
}

/// Drives stepped scrolling of a feed container.
pub struct FeedPaginator<'a> {
    pacing: &'a Pacing,
}

impl<'a> FeedPaginator<'a> {
    pub fn new(pacing: &'a Pacing) -> Self {
        Self { pacing }
    }

    /// Scroll `feed_selector` until its height stops changing or
    /// `max_attempts` rounds have run. Reaching the bound is not an error.
    pub async fn paginate(
        &self,
        ctx: &mut dyn RenderContext,
        feed_selector: &str,
        max_attempts: u32,
    ) -> Result<PaginationOutcome> {
        let mut previous_height: Option<f64> = None;
        let mut current_height = 0.0_f64;
        let mut attempts = 0u32;

        while previous_height != Some(current_height) && attempts < max_attempts {
            ctx.scroll_to_bottom(feed_selector, self.pacing.scroll_step_px)
                .await?;

            let delay = self.pacing.scroll_backoff(attempts);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            previous_height = Some(current_height);
            current_height = ctx.evaluate_height(feed_selector).await?;
            attempts += 1;

            tracing::debug!(
                attempt = attempts,
                height = current_height,
                delay_ms = delay.as_millis() as u64,
                "feed scroll round"
            );
        }

        let stabilized = previous_height == Some(current_height);
        if !stabilized {
            tracing::debug!(max_attempts, "feed still growing at scroll bound");
        }

        Ok(PaginationOutcome {
            attempts,
            measurements: attempts,
            final_height: current_height,
            stabilized,
        })
    }
}
