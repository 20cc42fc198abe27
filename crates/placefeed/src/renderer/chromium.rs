// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Chromium-based renderer using chromiumoxide.

use super::{
    ElementHandle, LoadState, NavigationResult, RenderContext, Renderer, WaitOptions, WaitState,
};
use crate::types::PlacefeedError;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Interval between DOM probes while waiting on a selector or load state.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Quiet period without new resource entries that counts as network idle.
const NETWORK_IDLE_QUIET: Duration = Duration::from_millis(500);

/// Pause between scroll steps inside the page.
const SCROLL_STEP_PAUSE_MS: u32 = 60;

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. PLACEFEED_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("PLACEFEED_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. System PATH
    for name in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 3. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Options for launching Chromium.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    /// Explicit binary; falls back to [`find_chromium`].
    pub executable: Option<PathBuf>,
    /// Extra command-line switches appended after the defaults.
    pub extra_args: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            extra_args: Vec::new(),
        }
    }
}

/// Chromium-based renderer.
///
/// Owns the browser process and a throwaway profile directory. Both are
/// released when the renderer is dropped.
pub struct ChromiumRenderer {
    browser: Mutex<Browser>,
    handler_task: JoinHandle<()>,
    active_count: Arc<AtomicUsize>,
    profile_dir: TempDir,
}

impl ChromiumRenderer {
    /// Launch a Chromium instance.
    pub async fn launch(options: LaunchOptions) -> Result<Self> {
        let chrome_path = match options.executable {
            Some(path) => path,
            None => find_chromium()
                .context("Chromium not found. Set PLACEFEED_CHROMIUM_PATH or install Chrome.")?,
        };

        let profile_dir = tempfile::Builder::new()
            .prefix("placefeed-profile-")
            .tempdir()
            .context("failed to create temporary browser profile")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(profile_dir.path())
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-accelerated-2d-canvas")
            .arg("--disable-extensions")
            .window_size(1366, 900);
        builder = if options.headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };
        for arg in &options.extra_args {
            builder = builder.arg(arg.as_str());
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("chromium handler event error: {e}");
                }
            }
        });

        tracing::info!(
            headless = options.headless,
            profile = %profile_dir.path().display(),
            "Chromium launched"
        );

        Ok(Self {
            browser: Mutex::new(browser),
            handler_task,
            active_count: Arc::new(AtomicUsize::new(0)),
            profile_dir,
        })
    }

    /// Path of the temporary profile directory owned by this renderer.
    pub fn profile_dir(&self) -> &std::path::Path {
        self.profile_dir.path()
    }
}

impl Drop for ChromiumRenderer {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            page,
            elements: Vec::new(),
            generation: 0,
            active_count: Arc::clone(&self.active_count),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            tracing::warn!("failed to close Chromium cleanly: {e}");
        }
        let _ = browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
    /// Elements issued as handles for the current page generation.
    elements: Vec<Element>,
    generation: u64,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumContext {
    fn register(&mut self, found: Vec<Element>) -> Vec<ElementHandle> {
        let start = self.elements.len();
        self.elements.extend(found);
        (start..self.elements.len())
            .map(|index| ElementHandle::new(self.generation, index))
            .collect()
    }

    fn element(&self, handle: ElementHandle) -> Result<&Element> {
        if handle.generation != self.generation {
            return Err(PlacefeedError::StaleHandle(format!(
                "handle from page generation {} used on generation {}",
                handle.generation, self.generation
            ))
            .into());
        }
        self.elements
            .get(handle.index)
            .ok_or_else(|| PlacefeedError::StaleHandle(format!("unknown element #{}", handle.index)).into())
    }

    /// Evaluate an expression, awaiting promises, and return its JSON value
    /// (`Null` for `undefined`).
    async fn eval(&self, script: &str) -> Result<serde_json::Value> {
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(|e| anyhow::anyhow!("invalid evaluate params: {e}"))?;

        let result = self
            .page
            .evaluate_expression(params)
            .await
            .context("JS execution failed")?;

        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn probe(&self, script: &str) -> Result<bool> {
        Ok(self.eval(script).await?.as_bool().unwrap_or(false))
    }
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn selector_probe_js(selector: &str, state: WaitState) -> String {
    let sel = js_string(selector);
    match state {
        WaitState::Attached => format!("document.querySelector({sel}) !== null"),
        WaitState::Detached => format!("document.querySelector({sel}) === null"),
        WaitState::Visible => format!(
            "(() => {{ const el = document.querySelector({sel}); \
             if (!el) return false; const r = el.getBoundingClientRect(); \
             return r.width > 0 && r.height > 0; }})()"
        ),
    }
}

fn stepped_scroll_js(selector: &str, step_px: u32) -> String {
    let sel = js_string(selector);
    let step = step_px.max(1);
    format!(
        r#"(async () => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            const target = el.scrollHeight;
            for (let i = 0; i < 1000 && el.scrollTop + el.clientHeight < target; i++) {{
                const before = el.scrollTop;
                el.scrollBy({{ top: {step}, behavior: 'smooth' }});
                await new Promise(r => setTimeout(r, {SCROLL_STEP_PAUSE_MS}));
                if (el.scrollTop === before) el.scrollTop = before + {step};
                if (el.scrollTop === before) break;
            }}
            return true;
        }})()"#
    )
}

fn height_js(selector: &str) -> String {
    let sel = js_string(selector);
    format!("(() => {{ const el = document.querySelector({sel}); return el ? el.scrollHeight : 0; }})()")
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        self.generation += 1;
        self.elements.clear();

        let start = Instant::now();

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(timeout_ms),
            self.page.goto(url),
        )
        .await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(_)) => {
                let final_url = self
                    .page
                    .url()
                    .await
                    .unwrap_or_default()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| url.to_string());

                Ok(NavigationResult {
                    final_url,
                    load_time_ms,
                })
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn query_selector(&mut self, selector: &str) -> Result<Option<ElementHandle>> {
        Ok(self.query_all(selector).await?.into_iter().next())
    }

    async fn query_all(&mut self, selector: &str) -> Result<Vec<ElementHandle>> {
        let found = self
            .page
            .find_elements(selector)
            .await
            .with_context(|| format!("query failed for selector {selector}"))?;
        Ok(self.register(found))
    }

    async fn get_text(&mut self, handle: ElementHandle) -> Result<Option<String>> {
        let text = self
            .element(handle)?
            .inner_text()
            .await
            .context("failed to read element text")?;
        Ok(text.map(|t| t.trim().to_string()))
    }

    async fn get_attribute(&mut self, handle: ElementHandle, name: &str) -> Result<Option<String>> {
        self.element(handle)?
            .attribute(name)
            .await
            .with_context(|| format!("failed to read attribute {name}"))
    }

    async fn click(&mut self, handle: ElementHandle) -> Result<()> {
        self.element(handle)?
            .click()
            .await
            .context("click failed")?;
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, options: WaitOptions) -> Result<bool> {
        let deadline = Instant::now() + options.timeout;
        let probe = selector_probe_js(selector, options.state);
        loop {
            if self.probe(&probe).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_load_state(&mut self, state: LoadState, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        let mut last_count: Option<u64> = None;
        let mut quiet_since = Instant::now();
        loop {
            let ready = match state {
                LoadState::DomContentLoaded => {
                    self.probe("document.readyState !== 'loading'").await?
                }
                LoadState::Load => self.probe("document.readyState === 'complete'").await?,
                LoadState::NetworkIdle => {
                    let snapshot = self
                        .eval(
                            "({ complete: document.readyState === 'complete', \
                             resources: performance.getEntriesByType('resource').length })",
                        )
                        .await?;
                    let complete = snapshot["complete"].as_bool().unwrap_or(false);
                    let count = snapshot["resources"].as_u64().unwrap_or(0);
                    if last_count != Some(count) {
                        last_count = Some(count);
                        quiet_since = Instant::now();
                    }
                    complete && quiet_since.elapsed() >= NETWORK_IDLE_QUIET
                }
            };
            if ready {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn scroll_to_bottom(&mut self, selector: &str, step_px: u32) -> Result<()> {
        let found = self.probe(&stepped_scroll_js(selector, step_px)).await?;
        if !found {
            tracing::warn!(selector, "scroll container not found");
        }
        Ok(())
    }

    async fn evaluate_height(&mut self, selector: &str) -> Result<f64> {
        let value = self.eval(&height_js(selector)).await?;
        Ok(value.as_f64().unwrap_or(0.0))
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        self.eval(script).await
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        let _ = self.page.close().await;
        Ok(())
    }
}
