//! Selector cascade engine.
//!
//! Each field is described by an ordered list of [`Strategy`] descriptors.
//! The cascade tries them strictly in order and the first strategy that
//! locates an element and yields non-empty trimmed text wins. A strategy
//! failure is never an error, only a signal to advance to the next one;
//! new fallbacks are added by appending to the strategy list.

use std::time::Duration;

use headless_chrome::Tab;

use crate::record::NOT_AVAILABLE;

/// How to locate an element on the rendered page.
#[derive(Debug, Clone, Copy)]
pub enum Locator {
    Css(&'static str),
    XPath(&'static str),
}

/// One extraction strategy: a locator plus an optional bounded wait.
/// Without a wait the lookup is a single immediate query.
#[derive(Debug, Clone, Copy)]
pub struct Strategy {
    pub locator: Locator,
    pub wait: Option<Duration>,
}

impl Strategy {
    pub const fn css(selector: &'static str) -> Self {
        Self { locator: Locator::Css(selector), wait: None }
    }

    pub const fn css_wait(selector: &'static str, secs: u64) -> Self {
        Self { locator: Locator::Css(selector), wait: Some(Duration::from_secs(secs)) }
    }

    pub const fn xpath(query: &'static str) -> Self {
        Self { locator: Locator::XPath(query), wait: None }
    }

    pub const fn xpath_wait(query: &'static str, secs: u64) -> Self {
        Self { locator: Locator::XPath(query), wait: Some(Duration::from_secs(secs)) }
    }
}

/// Outcome of probing a single strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Element located; carries its inner text (possibly empty).
    Hit(String),
    /// Element absent on an immediate query.
    Miss,
    /// Element did not appear within the strategy's wait budget.
    TimedOut,
}

/// Run the cascade policy over a probe function. The first [`Probe::Hit`]
/// with non-empty trimmed text wins; if every strategy fails the sentinel
/// [`NOT_AVAILABLE`] is returned. Never errors.
pub fn run_cascade(strategies: &[Strategy], mut probe: impl FnMut(&Strategy) -> Probe) -> String {
    for strategy in strategies {
        match probe(strategy) {
            Probe::Hit(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    return text.to_string();
                }
            }
            Probe::Miss | Probe::TimedOut => {}
        }
    }
    NOT_AVAILABLE.to_string()
}

/// Resolve a field on a live tab by running the cascade against the DOM.
pub fn resolve_field(tab: &Tab, strategies: &[Strategy]) -> String {
    run_cascade(strategies, |strategy| probe_tab(tab, strategy))
}

fn probe_tab(tab: &Tab, strategy: &Strategy) -> Probe {
    let element = match (strategy.locator, strategy.wait) {
        (Locator::Css(selector), Some(timeout)) => {
            tab.wait_for_element_with_custom_timeout(selector, timeout)
        }
        (Locator::Css(selector), None) => tab.find_element(selector),
        (Locator::XPath(query), Some(timeout)) => {
            tab.wait_for_xpath_with_custom_timeout(query, timeout)
        }
        (Locator::XPath(query), None) => tab.find_element_by_xpath(query),
    };

    match element {
        Ok(element) => match element.get_inner_text() {
            Ok(text) => Probe::Hit(text),
            Err(_) => Probe::Miss,
        },
        Err(_) if strategy.wait.is_some() => Probe::TimedOut,
        Err(_) => Probe::Miss,
    }
}
