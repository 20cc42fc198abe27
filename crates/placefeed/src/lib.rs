// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! placefeed — extract name/address/phone records from map-search result feeds.
//!
//! The pipeline per query point: open a browser context, load the search
//! feed, scroll it until it stops growing ([`paginate`]), click every card and
//! parse its detail panel ([`extract`], [`parse`]), then hand the de-duplicated
//! records to persistence sinks ([`aggregate`], [`storage`]). [`batch`]
//! sequences this over the points of a positions file.

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod extract;
pub mod paginate;
pub mod parse;
pub mod positions;
pub mod renderer;
pub mod search_url;
pub mod storage;
pub mod types;

pub use aggregate::{RecordSink, ResultAggregator};
pub use batch::{plan_queries, BatchDriver, BatchReport, PointFailure, PointReport};
pub use config::{Pacing, RunMode, ScrapeConfig, Selectors};
pub use extract::{CardExtractor, CardOutcome, CardStage, ExtractionStats};
pub use paginate::{FeedPaginator, PaginationOutcome};
pub use renderer::chromium::{ChromiumRenderer, LaunchOptions};
pub use renderer::{ElementHandle, LoadState, RenderContext, Renderer, WaitOptions, WaitState};
pub use search_url::{build_search_url, query_url};
pub use storage::{load_json, save_csv, save_json, FileSink};
pub use types::*;
