//! Crawl frontier: scope-checked, deduplicated URL queue
//!
//! The frontier owns all traversal state. Workers share it behind a single
//! mutex so that a normalized URL is handed out for fetching at most once.

use std::collections::{HashMap, VecDeque};
use tracing::debug;
use url::Url;

/// Lifecycle of a frontier entry. An entry never re-enters `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Pending,
    Visited,
    Failed,
}

/// Breadth-first URL frontier with normalized-URL dedup and scope filtering.
pub struct Frontier {
    scope: String,
    pending: VecDeque<String>,
    states: HashMap<String, EntryState>,
    in_flight: usize,
    attempts: u32,
}

impl Frontier {
    /// Create a frontier seeded with the crawl root.
    ///
    /// The scope defaults to the normalized root URL, so only links under
    /// the root's URL tree are followed. An explicit scope prefix overrides
    /// that.
    pub fn new(root_url: &str, scope_override: Option<&str>) -> crate::error::Result<Self> {
        // Validate the root up front; a bad seed is a configuration error.
        Url::parse(root_url)?;
        let root = normalize_url(root_url);
        let scope = scope_override
            .map(|s| normalize_url(s))
            .unwrap_or_else(|| root.clone());

        let mut frontier = Self {
            scope,
            pending: VecDeque::new(),
            states: HashMap::new(),
            in_flight: 0,
            attempts: 0,
        };
        frontier.states.insert(root.clone(), EntryState::Pending);
        frontier.pending.push_back(root);
        Ok(frontier)
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Add a URL to the pending set.
    ///
    /// Returns `false` when the URL is out of scope or already known; both
    /// cases are silently discarded (never marked Failed).
    pub fn enqueue(&mut self, url: &str) -> bool {
        let normalized = normalize_url(url);
        if !normalized.starts_with(&self.scope) {
            debug!("Skipping {} - outside scope {}", url, self.scope);
            return false;
        }
        if self.states.contains_key(&normalized) {
            return false;
        }
        self.states.insert(normalized.clone(), EntryState::Pending);
        self.pending.push_back(normalized);
        true
    }

    /// Pop the next URL to fetch, FIFO. `None` means nothing is pending
    /// right now; combine with [`Frontier::is_exhausted`] to decide whether
    /// to stop or wait for in-flight fetches to discover more links.
    pub fn next_pending(&mut self) -> Option<String> {
        let url = self.pending.pop_front()?;
        self.in_flight += 1;
        self.attempts += 1;
        Some(url)
    }

    pub fn mark_visited(&mut self, url: &str) {
        self.transition(url, EntryState::Visited);
    }

    pub fn mark_failed(&mut self, url: &str, reason: &str) {
        debug!("Marking {} failed: {}", url, reason);
        self.transition(url, EntryState::Failed);
    }

    fn transition(&mut self, url: &str, state: EntryState) {
        self.states.insert(normalize_url(url), state);
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// True once nothing is pending and no fetch is in flight. New links can
    /// no longer appear, so traversal terminates.
    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty() && self.in_flight == 0
    }

    /// Fetch attempts handed out so far (budget accounting).
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn visited_count(&self) -> usize {
        self.count_state(EntryState::Visited)
    }

    pub fn failed_count(&self) -> usize {
        self.count_state(EntryState::Failed)
    }

    fn count_state(&self, state: EntryState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }
}

/// Normalize a URL for deduplication: drop the fragment and trim the
/// trailing slash from non-root paths.
pub fn normalize_url(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        let mut normalized = parsed.clone();
        normalized.set_fragment(None);

        let path = parsed.path().trim_end_matches('/');
        if path.is_empty() {
            normalized.set_path("/");
        } else {
            normalized.set_path(path);
        }

        normalized.to_string()
    } else {
        url.to_string()
    }
}
