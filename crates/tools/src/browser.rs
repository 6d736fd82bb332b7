//! Browser session lifecycle backed by Chromium CDP.
//!
//! One session per process: a visible Chromium instance with a single
//! page, guarded by a shared mutex so browser operations never overlap.
//! The session is an explicit state machine — a page reference cannot
//! exist while the session is closed.

use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures_util::StreamExt;
use proto::BrowserError;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Upper bound on a single page load; a hung load becomes a
/// `NavigationFailed` instead of blocking the turn indefinitely.
const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(20);
/// Fixed wait after navigation so client-side rendering can settle.
const SETTLE_DELAY: Duration = Duration::from_secs(3);
/// Per-candidate wait when probing for a "start navigation" control.
const SELECTOR_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Live browser resources. Exists only while the session is open.
struct OpenSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

enum SessionState {
    Closed,
    Open(OpenSession),
}

/// Owns the lifetime of one browser process and one page.
pub struct BrowserSession {
    state: SessionState,
}

impl BrowserSession {
    /// Creates a session in the `Closed` state.
    pub fn new() -> Self {
        Self {
            state: SessionState::Closed,
        }
    }

    /// Whether a browser is currently open.
    pub fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Open(_))
    }

    /// Launches a visible Chromium instance with one blank page.
    ///
    /// Idempotent: calling `open` on an already-open session is a no-op
    /// success and does not leak a second browser process. On launch
    /// failure the state remains `Closed`.
    pub async fn open(&mut self) -> Result<(), BrowserError> {
        if self.is_open() {
            debug!("browser session already open; open() is a no-op");
            return Ok(());
        }

        let config = BrowserConfig::builder()
            .with_head()
            .build()
            .map_err(BrowserError::LaunchFailed)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                // Launch is all-or-nothing: tear the half-open browser
                // down again so state stays Closed.
                let _ = browser.close().await;
                handler_task.abort();
                return Err(BrowserError::LaunchFailed(format!(
                    "failed to create page: {e}"
                )));
            }
        };

        debug!("browser session opened");
        self.state = SessionState::Open(OpenSession {
            browser,
            page,
            handler_task,
        });
        Ok(())
    }

    /// Loads `url` on the current page, waits for client-side rendering
    /// to settle, then makes a best-effort attempt to click a "start
    /// navigation" control from `nav_selectors`.
    ///
    /// Fails with [`BrowserError::SessionNotOpen`] when the session is
    /// closed, without touching any browser state. The optional click
    /// step never fails the call.
    pub async fn navigate_to(
        &mut self,
        url: &str,
        nav_selectors: &[&str],
    ) -> Result<(), BrowserError> {
        let SessionState::Open(open) = &mut self.state else {
            return Err(BrowserError::SessionNotOpen);
        };

        debug!(url, "navigating page");
        timeout(PAGE_LOAD_TIMEOUT, open.page.goto(url))
            .await
            .map_err(|_| {
                BrowserError::NavigationFailed(format!(
                    "page load timed out after {}s",
                    PAGE_LOAD_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;

        tokio::time::sleep(SETTLE_DELAY).await;

        try_click_start_navigation(&open.page, nav_selectors).await;
        Ok(())
    }

    /// Tears down the page, browser process, and CDP handler task.
    ///
    /// No-op success when already closed. The state is forced to
    /// `Closed` even when teardown fails; the failure is reported as
    /// [`BrowserError::TeardownFailed`] so the caller can surface it.
    pub async fn close(&mut self) -> Result<(), BrowserError> {
        match std::mem::replace(&mut self.state, SessionState::Closed) {
            SessionState::Closed => {
                debug!("browser session already closed; close() is a no-op");
                Ok(())
            }
            SessionState::Open(mut open) => {
                let result = open
                    .browser
                    .close()
                    .await
                    .map_err(|e| BrowserError::TeardownFailed(e.to_string()));
                open.handler_task.abort();
                if let Err(err) = &result {
                    warn!(%err, "browser teardown failed; session is closed regardless");
                } else {
                    debug!("browser session closed");
                }
                result.map(|_| ())
            }
        }
    }
}

impl Default for BrowserSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Probes the selector candidates in order and clicks the first one
/// that appears. Host pages change their markup freely, so every
/// failure here is swallowed — the correct URL is already loaded.
async fn try_click_start_navigation(page: &Page, selectors: &[&str]) {
    for selector in selectors {
        let element = match timeout(SELECTOR_PROBE_TIMEOUT, page.find_element(*selector)).await {
            Ok(Ok(element)) => element,
            _ => continue,
        };
        match element.click().await {
            Ok(_) => debug!(selector, "clicked start-navigation control"),
            Err(e) => debug!(selector, error = %e, "start-navigation click failed"),
        }
        return;
    }
    debug!("no start-navigation control found; continuing without it");
}

/// Returns the process-wide browser session singleton.
///
/// The mutex serializes all tool calls against the single page handle,
/// which is not safe for concurrent use.
pub fn shared_session() -> Arc<Mutex<BrowserSession>> {
    static SESSION: OnceLock<Arc<Mutex<BrowserSession>>> = OnceLock::new();
    SESSION
        .get_or_init(|| Arc::new(Mutex::new(BrowserSession::new())))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_closed() {
        let session = BrowserSession::new();
        assert!(!session.is_open());
    }

    #[tokio::test]
    async fn navigate_before_open_fails_without_state_change() {
        let mut session = BrowserSession::new();
        let err = session
            .navigate_to("https://map.baidu.com/dir/a/b", &[])
            .await
            .expect_err("navigate on closed session must fail");
        assert!(matches!(err, BrowserError::SessionNotOpen));
        assert!(!session.is_open());
    }

    #[tokio::test]
    async fn close_when_already_closed_is_noop_success() {
        let mut session = BrowserSession::new();
        session.close().await.expect("close on closed session");
        assert!(!session.is_open());

        // Still closed and still a no-op the second time.
        session.close().await.expect("second close");
        assert!(!session.is_open());
    }

    #[test]
    fn shared_session_returns_same_instance() {
        let a = shared_session();
        let b = shared_session();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
