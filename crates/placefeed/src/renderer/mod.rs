// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Renderer abstraction for browser-driven feed scraping.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide). Everything in
//! the extraction pipeline talks to a page only through `RenderContext`.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// Opaque reference to an element on the context's current page.
///
/// Handles carry the page generation they were issued for; once the
/// context navigates, older handles are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    pub(crate) generation: u64,
    pub(crate) index: usize,
}

impl ElementHandle {
    /// Build a handle. Intended for `RenderContext` implementations.
    pub fn new(generation: u64, index: usize) -> Self {
        Self { generation, index }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Element state to wait for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    /// Present in the DOM.
    #[default]
    Attached,
    /// Present and rendered with a non-empty box.
    Visible,
    /// Absent from the DOM.
    Detached,
}

/// Options for [`RenderContext::wait_for_selector`].
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub state: WaitState,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            state: WaitState::Attached,
        }
    }
}

impl WaitOptions {
    pub fn attached(timeout: Duration) -> Self {
        Self {
            timeout,
            state: WaitState::Attached,
        }
    }
}

/// Document load milestones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    DomContentLoaded,
    Load,
    /// Load finished and no new resource requests for a quiet period.
    NetworkIdle,
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently active contexts.
    fn active_contexts(&self) -> usize;
}

/// A single browser context (tab).
///
/// Timeouts on the `wait_*` methods are reported as `Ok(false)`; every other
/// failure is an error.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a timeout. Invalidates all outstanding handles.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;
    /// First element matching `selector`, if any.
    async fn query_selector(&mut self, selector: &str) -> Result<Option<ElementHandle>>;
    /// All elements matching `selector`, in document order.
    async fn query_all(&mut self, selector: &str) -> Result<Vec<ElementHandle>>;
    /// Rendered text of an element. `None` when the element has no text.
    async fn get_text(&mut self, handle: ElementHandle) -> Result<Option<String>>;
    /// Attribute value of an element. `None` when the attribute is absent.
    async fn get_attribute(&mut self, handle: ElementHandle, name: &str) -> Result<Option<String>>;
    /// Click an element.
    async fn click(&mut self, handle: ElementHandle) -> Result<()>;
    /// Wait until `selector` reaches the requested state.
    async fn wait_for_selector(&mut self, selector: &str, options: WaitOptions) -> Result<bool>;
    /// Wait until the document reaches a load milestone.
    async fn wait_for_load_state(&mut self, state: LoadState, timeout: Duration) -> Result<bool>;
    /// Scroll a container to its bottom edge in steps of `step_px`.
    async fn scroll_to_bottom(&mut self, selector: &str, step_px: u32) -> Result<()>;
    /// Current `scrollHeight` of a container (0 when it is missing).
    async fn evaluate_height(&mut self, selector: &str) -> Result<f64>;
    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A no-op renderer used when Chromium is unavailable.
///
/// Useful for dry runs: every context request fails, so each query point is
/// reported as failed without touching the network.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Err(anyhow::anyhow!("Browser not available — dry-run mode"))
    }
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
    fn active_contexts(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_renderer_refuses_contexts() {
        let renderer = NoopRenderer;
        assert!(renderer.new_context().await.is_err());
        assert_eq!(renderer.active_contexts(), 0);
        renderer.shutdown().await.unwrap();
    }

    #[test]
    fn wait_options_default_to_attached_five_seconds() {
        let opts = WaitOptions::default();
        assert_eq!(opts.state, WaitState::Attached);
        assert_eq!(opts.timeout, Duration::from_secs(5));
    }
}
