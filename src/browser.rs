//! Browser session and browsing-context ownership.
//!
//! A [`BrowsingSession`] owns one headless Chrome process plus the main tab
//! that holds the search results for the whole run. Product pages open in a
//! separate [`DetailTab`], an owned handle that closes its tab and refocuses
//! the main tab on every exit path, including early failure: at most one
//! detail tab is open at a time and the search results are never lost.

use std::ffi::OsStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{debug, warn};

use crate::stealth;

pub struct BrowsingSession {
    browser: Browser,
    main: Arc<Tab>,
}

impl BrowsingSession {
    /// Launch a hardened Chrome session and open the main tab.
    pub fn launch() -> Result<Self> {
        let ua_arg = format!("--user-agent={}", stealth::random_user_agent());
        let args = vec![
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-infobars"),
            OsStr::new("--window-position=0,0"),
            OsStr::new("--ignore-certificate-errors"),
            OsStr::new("--incognito"),
            OsStr::new("--headless=new"),
            OsStr::new(&ua_arg),
        ];

        let browser = Browser::new(LaunchOptions {
            headless: false, // modern headless mode passed via args
            window_size: Some((1920, 1080)),
            args,
            ..Default::default()
        })
        .context("failed to launch stealth browser")?;

        let main = browser.new_tab().context("failed to open main tab")?;
        stealth::prepare_tab(&main)?;

        Ok(Self { browser, main })
    }

    pub fn main_tab(&self) -> &Arc<Tab> {
        &self.main
    }

    /// Open an isolated detail tab at `url`. The returned handle owns the
    /// tab; dropping it tears the tab down and refocuses the main tab.
    pub fn open_detail(&self, url: &str) -> Result<DetailTab> {
        let tab = self.browser.new_tab().context("failed to open detail tab")?;
        stealth::prepare_tab(&tab)?;
        tab.navigate_to(url)
            .with_context(|| format!("failed to navigate detail tab to {url}"))?;
        if let Err(err) = tab.wait_until_navigated() {
            warn!(%url, error = %err, "detail page navigation did not settle, extracting anyway");
        }
        debug!(%url, "detail tab open");
        Ok(DetailTab {
            tab,
            main: Arc::clone(&self.main),
            closed: false,
        })
    }

    /// Best-effort refocus of the main search tab.
    pub fn focus_main(&self) {
        if let Err(err) = self.main.activate() {
            warn!(error = %err, "failed to refocus main tab");
        }
    }
}

/// Owned handle to a product-detail tab.
pub struct DetailTab {
    tab: Arc<Tab>,
    main: Arc<Tab>,
    closed: bool,
}

impl DetailTab {
    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// Close the tab and hand focus back to the main search tab.
    pub fn close(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(err) = self.tab.close(true) {
            warn!(error = %err, "failed to close detail tab");
        }
        if let Err(err) = self.main.activate() {
            warn!(error = %err, "failed to refocus main tab after closing detail tab");
        }
    }
}

impl Drop for DetailTab {
    fn drop(&mut self) {
        self.teardown();
    }
}
