// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Batch driver: run the extraction pipeline over every query point.
//!
//! Points are processed strictly one after another, each in a fresh browser
//! context. Every point runs behind its own failure boundary, so a bad
//! location is logged and skipped instead of ending the batch.

use std::time::Instant;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::aggregate::{RecordSink, ResultAggregator};
use crate::config::{RunMode, ScrapeConfig};
use crate::extract::{CardExtractor, ExtractionStats};
use crate::paginate::{FeedPaginator, PaginationOutcome};
use crate::positions::load_positions;
use crate::renderer::{LoadState, RenderContext, Renderer, WaitOptions};
use crate::search_url::query_url;
use crate::types::{LocationQuery, PlacefeedError};

/// Label given to the query in single-coordinate mode.
pub const SINGLE_LABEL: &str = "single";

/// Outcome of one successfully scraped point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointReport {
    pub label: String,
    pub url: String,
    pub pagination: PaginationOutcome,
    pub extraction: ExtractionStats,
    pub persisted: usize,
    pub elapsed_ms: u64,
}

/// A point that failed every attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointFailure {
    pub label: String,
    pub attempts: u32,
    pub error: String,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub completed: Vec<PointReport>,
    pub failed: Vec<PointFailure>,
}

impl BatchReport {
    pub fn total_records(&self) -> usize {
        self.completed.iter().map(|p| p.persisted).sum()
    }
}

/// Build the query list for the configured run mode.
pub fn plan_queries(config: &ScrapeConfig) -> Result<Vec<LocationQuery>> {
    match &config.mode {
        RunMode::Single { coordinate, area } => Ok(vec![LocationQuery::new(
            SINGLE_LABEL,
            config.search_term.clone(),
            area.clone(),
            coordinate.clone(),
        )]),
        RunMode::Batch { positions } => {
            let points = load_positions(positions)?;
            Ok(points
                .iter()
                .map(|p| p.to_query(&config.search_term))
                .collect())
        }
    }
}

/// Sequences the pipeline across query points.
pub struct BatchDriver<'a> {
    renderer: &'a dyn Renderer,
    config: &'a ScrapeConfig,
    sinks: Vec<Box<dyn RecordSink>>,
}

impl<'a> BatchDriver<'a> {
    pub fn new(renderer: &'a dyn Renderer, config: &'a ScrapeConfig) -> Self {
        Self {
            renderer,
            config,
            sinks: Vec::new(),
        }
    }

    /// Add a persistence collaborator.
    pub fn with_sink(mut self, sink: impl RecordSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Run every query in order. Per-point failures are collected, not raised.
    pub async fn run_batch(&self, queries: &[LocationQuery]) -> BatchReport {
        let mut report = BatchReport::default();
        tracing::info!(points = queries.len(), "batch started");

        for (index, query) in queries.iter().enumerate() {
            tracing::info!(
                point = %query.label,
                index = index + 1,
                of = queries.len(),
                "scraping point"
            );
            match self.run_supervised(query).await {
                Ok(point) => report.completed.push(point),
                Err(failure) => report.failed.push(failure),
            }
        }

        tracing::info!(
            completed = report.completed.len(),
            failed = report.failed.len(),
            records = report.total_records(),
            "batch finished"
        );
        report
    }

    /// Failure boundary for one point, with the configured retries.
    async fn run_supervised(&self, query: &LocationQuery) -> std::result::Result<PointReport, PointFailure> {
        let max_attempts = self.config.point_retries.saturating_add(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.run_point(query).await {
                Ok(report) => return Ok(report),
                Err(e) => {
                    last_error = format!("{e:#}");
                    tracing::warn!(
                        point = %query.label,
                        attempt,
                        max_attempts,
                        "point failed: {last_error}"
                    );
                }
            }
        }

        Err(PointFailure {
            label: query.label.clone(),
            attempts: max_attempts,
            error: last_error,
        })
    }

    /// Open a session, scrape one point, flush its records, close the session.
    pub async fn run_point(&self, query: &LocationQuery) -> Result<PointReport> {
        let started = Instant::now();
        let url = query_url(query)?;

        let mut ctx = self
            .renderer
            .new_context()
            .await
            .context("failed to open browser context")?;

        let result = self.scrape(ctx.as_mut(), query, &url).await;

        if let Err(e) = ctx.close().await {
            tracing::warn!(point = %query.label, "failed to close browser context: {e}");
        }

        let (pagination, extraction, persisted) = result?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            point = %query.label,
            cards = extraction.cards,
            recorded = extraction.recorded,
            duplicates = extraction.duplicates,
            failed = extraction.failed,
            elapsed_ms,
            "point complete"
        );

        Ok(PointReport {
            label: query.label.clone(),
            url,
            pagination,
            extraction,
            persisted,
            elapsed_ms,
        })
    }

    async fn scrape(
        &self,
        ctx: &mut dyn RenderContext,
        query: &LocationQuery,
        url: &str,
    ) -> Result<(PaginationOutcome, ExtractionStats, usize)> {
        let config = self.config;
        let selectors = &config.selectors;

        let nav = ctx
            .navigate(url, config.navigation_timeout.as_millis() as u64)
            .await
            .with_context(|| format!("failed to open {url}"))?;
        tracing::debug!(final_url = %nav.final_url, load_time_ms = nav.load_time_ms, "navigated");

        if !ctx
            .wait_for_load_state(LoadState::NetworkIdle, config.load_state_timeout)
            .await?
        {
            tracing::debug!(point = %query.label, "network did not go idle; continuing");
        }

        if !ctx
            .wait_for_selector(&selectors.feed, WaitOptions::attached(config.feed_timeout))
            .await?
        {
            return Err(PlacefeedError::FeedNotFound {
                selector: selectors.feed.clone(),
                timeout_ms: config.feed_timeout.as_millis() as u64,
            }
            .into());
        }

        let pagination = FeedPaginator::new(&config.pacing)
            .paginate(ctx, &selectors.feed, config.max_scroll_attempts)
            .await?;

        let cards = ctx.query_all(&selectors.card).await?;
        tracing::info!(
            point = %query.label,
            cards = cards.len(),
            scroll_rounds = pagination.attempts,
            stabilized = pagination.stabilized,
            "feed loaded"
        );

        let mut aggregator = ResultAggregator::new(query.clone());
        let extraction = CardExtractor::from_config(config)
            .extract_all(ctx, &cards, &mut aggregator)
            .await;

        let persisted = aggregator.flush(&self.sinks)?;
        Ok((pagination, extraction, persisted))
    }
}
