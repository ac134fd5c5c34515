//! Stealth & automation-detection evasion.
//!
//! Flipkart serves a degraded page (or a login wall) to obvious automation,
//! so every tab gets a fingerprint-hardening script injected before any page
//! script runs, and navigation is paced with jittered, human-ish delays.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use headless_chrome::Tab;
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::time::sleep;

static USER_AGENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/123.0.0.0 Safari/537.36",
    ]
});

/// Pick a user agent for this session.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36")
}

/// The fingerprint-hardening script. Runs before any page script via
/// `Page.addScriptToEvaluateOnNewDocument`.
pub fn get_stealth_script() -> String {
    let script = r#"
        // Unmask navigator.webdriver
        Object.defineProperty(navigator, 'webdriver', {
            get: () => undefined,
        });

        // Headless Chrome ships without window.chrome; real Chrome never does.
        window.chrome = {
            runtime: {
                connect: function() {
                    return {
                        onMessage: { addListener: function() {}, removeListener: function() {} },
                        postMessage: function() {},
                        disconnect: function() {}
                    };
                },
                sendMessage: function() {},
                onMessage: { addListener: function() {}, removeListener: function() {} }
            },
            app: { isInstalled: false },
            csi: function() {},
            loadTimes: function() { return { navigationType: "Other", connectionInfo: "h2" }; }
        };

        // Notification permission query must not answer 'prompt' in headless
        const originalQuery = window.navigator.permissions.query;
        window.navigator.permissions.query = (parameters) => (
            parameters.name === 'notifications' ?
            Promise.resolve({ state: Notification.permission }) :
            originalQuery(parameters)
        );

        // Standard Chrome plugin set (headless exposes an empty PluginArray)
        Object.defineProperty(navigator, 'plugins', {
            get: () => {
                const pdf = {
                    0: { type: "application/x-google-chrome-pdf", suffixes: "pdf", description: "Portable Document Format" },
                    description: "Portable Document Format",
                    filename: "internal-pdf-viewer",
                    length: 1,
                    name: "Chrome PDF Plugin"
                };
                const p = [pdf, pdf, pdf];
                Object.setPrototypeOf(p, PluginArray.prototype);
                return p;
            }
        });
    "#;

    script.to_string()
}

/// Inject the stealth script into a fresh tab so it runs on every document
/// the tab navigates to.
pub fn prepare_tab(tab: &Arc<Tab>) -> Result<()> {
    tab.enable_debugger()?;
    tab.call_method(
        headless_chrome::protocol::cdp::Page::AddScriptToEvaluateOnNewDocument {
            source: get_stealth_script(),
            world_name: None,
            include_command_line_api: None,
            run_immediately: None,
        },
    )?;
    Ok(())
}

/// Scroll to the bottom of the page with END-key presses, pausing between
/// presses so lazily loaded content (review blocks in particular) renders.
pub async fn scroll_to_page_end(tab: &Arc<Tab>, presses: u32) -> Result<()> {
    for _ in 0..presses {
        tab.press_key("End")?;
        let pause = rand::thread_rng().gen_range(800..1400);
        sleep(Duration::from_millis(pause)).await;
    }
    Ok(())
}

/// Short jittered pause between page interactions.
pub async fn human_pause() {
    let millis = rand::thread_rng().gen_range(400..1100);
    sleep(Duration::from_millis(millis)).await;
}
