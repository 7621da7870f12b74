//! Action logging with glob filtering and a bounded in-memory history
//!
//! The middleware traces every dispatched action and keeps the most recent
//! summaries so failed lookups can be inspected after the fact.
//!
//! ```ignore
//! let middleware = ActionLogMiddleware::new(ActionLogConfig {
//!     capacity: 50,
//!     filter: ActionFilter::new(Some("Prediction*"), None),
//! });
//! // ... dispatch ...
//! for entry in middleware.log().recent(10) {
//!     println!("{} {}", entry.sequence, entry.summary);
//! }
//! ```

use std::collections::VecDeque;
use std::time::Instant;

use crate::action::Action;
use crate::store::Middleware;

/// Include/exclude glob patterns over action names.
///
/// `*` matches any run of characters, `?` exactly one. An empty include
/// list admits everything; excludes are applied after includes.
#[derive(Debug, Clone, Default)]
pub struct ActionFilter {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl ActionFilter {
    /// Build from comma-separated pattern lists
    ///
    /// ```
    /// use aqmap_core::action_log::ActionFilter;
    ///
    /// let filter = ActionFilter::new(Some("Prediction*, Marker*"), Some("*DidLoad"));
    /// assert!(filter.should_log("PredictionDidError"));
    /// assert!(filter.should_log("MarkersClear"));
    /// assert!(!filter.should_log("PredictionDidLoad"));
    /// assert!(!filter.should_log("PanelToggle"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        fn split(patterns: &str) -> Vec<String> {
            patterns
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        }

        Self {
            include_patterns: include.map(split).unwrap_or_default(),
            exclude_patterns: exclude.map(split).unwrap_or_default(),
        }
    }

    pub fn should_log(&self, action_name: &str) -> bool {
        if !self.include_patterns.is_empty()
            && !self
                .include_patterns
                .iter()
                .any(|p| glob_match(p, action_name))
        {
            return false;
        }

        !self
            .exclude_patterns
            .iter()
            .any(|p| glob_match(p, action_name))
    }
}

/// An entry in the action log
#[derive(Debug, Clone)]
pub struct ActionLogEntry {
    pub name: &'static str,
    pub summary: String,
    pub timestamp: Instant,
    /// Monotonic sequence number, unaffected by eviction
    pub sequence: u64,
    /// Set once the reducer has run
    pub state_changed: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ActionLogConfig {
    /// Maximum number of entries to keep
    pub capacity: usize,
    pub filter: ActionFilter,
}

impl Default for ActionLogConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            filter: ActionFilter::default(),
        }
    }
}

impl ActionLogConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }
}

/// Ring buffer of recent actions; oldest entries are evicted first
#[derive(Debug, Clone)]
pub struct ActionLog {
    entries: VecDeque<ActionLogEntry>,
    config: ActionLogConfig,
    next_sequence: u64,
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new(ActionLogConfig::default())
    }
}

impl ActionLog {
    pub fn new(config: ActionLogConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.capacity),
            config,
            next_sequence: 0,
        }
    }

    /// Record an action if it passes the filter
    pub fn log(&mut self, action: &Action) -> Option<&ActionLogEntry> {
        let name = action.name();
        if self.config.capacity == 0 || !self.config.filter.should_log(name) {
            return None;
        }

        let entry = ActionLogEntry {
            name,
            summary: action.summary(),
            timestamp: Instant::now(),
            sequence: self.next_sequence,
            state_changed: None,
        };
        self.next_sequence += 1;

        if self.entries.len() >= self.config.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.entries.back()
    }

    pub fn update_last_state_changed(&mut self, changed: bool) {
        if let Some(entry) = self.entries.back_mut() {
            entry.state_changed = Some(changed);
        }
    }

    /// Oldest first
    pub fn entries(&self) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter()
    }

    /// The most recent `count` entries, newest first
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter().rev().take(count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Middleware that traces actions and records them in an [`ActionLog`]
#[derive(Debug, Clone, Default)]
pub struct ActionLogMiddleware {
    log: ActionLog,
    last_action_logged: bool,
}

impl ActionLogMiddleware {
    pub fn new(config: ActionLogConfig) -> Self {
        Self {
            log: ActionLog::new(config),
            last_action_logged: false,
        }
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut ActionLog {
        &mut self.log
    }
}

impl Middleware for ActionLogMiddleware {
    fn before(&mut self, action: &Action) {
        let name = action.name();
        if self.log.config.filter.should_log(name) {
            tracing::debug!(action = %name, category = action.category().name(), "action");
        }
        self.last_action_logged = self.log.log(action).is_some();
    }

    fn after(&mut self, _action: &Action, state_changed: bool) {
        if self.last_action_logged {
            self.log.update_last_state_changed(state_changed);
        }
    }
}

/// Glob match supporting `*` and `?`
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let mut pi = 0;
    let mut ti = 0;
    let mut star: Option<(usize, usize)> = None;

    while ti < text.len() {
        if pi < pattern.len() && (pattern[pi] == '?' || pattern[pi] == text[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < pattern.len() && pattern[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((star_pi, star_ti)) = star {
            // backtrack: let the last star absorb one more character
            pi = star_pi + 1;
            ti = star_ti + 1;
            star = Some((star_pi, star_ti + 1));
        } else {
            return false;
        }
    }

    pattern[pi..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::Coordinate;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("Prediction*", "PredictionDidLoad"));
        assert!(glob_match("*Did*", "SearchDidLoad"));
        assert!(!glob_match("Panel????", "PanelToggle"));
        assert!(glob_match("Panel??????", "PanelToggle"));
        assert!(glob_match("*", ""));
        assert!(!glob_match("Marker", "MarkersClear"));
        assert!(glob_match("*Clear", "MarkersClear"));
    }

    #[test]
    fn test_filter_include_then_exclude() {
        let filter = ActionFilter::new(Some("Marker*"), Some("*Deleted"));
        assert!(filter.should_log("MarkerDrawCreated"));
        assert!(!filter.should_log("MarkerDrawDeleted"));
        assert!(!filter.should_log("PanelToggle"));

        let filter = ActionFilter::default();
        assert!(filter.should_log("PanelToggle"));
    }

    #[test]
    fn test_log_evicts_oldest() {
        let mut log = ActionLog::new(ActionLogConfig::with_capacity(2));
        log.log(&Action::PanelToggle);
        log.log(&Action::PanelDismiss);
        log.log(&Action::MarkersClear);

        let names: Vec<_> = log.entries().map(|e| e.name).collect();
        assert_eq!(names, vec!["PanelDismiss", "MarkersClear"]);
        assert_eq!(log.recent(1).next().map(|e| e.sequence), Some(2));
    }

    #[test]
    fn test_middleware_records_state_change() {
        let mut middleware = ActionLogMiddleware::default();
        let action = Action::MarkerDrawCreated(Coordinate::new(19.1, 72.9));

        middleware.before(&action);
        middleware.after(&action, true);

        let entry = middleware.log().recent(1).next().cloned().unwrap();
        assert_eq!(entry.name, "MarkerDrawCreated");
        assert_eq!(entry.state_changed, Some(true));
    }

    #[test]
    fn test_filtered_action_leaves_previous_entry_alone() {
        let mut middleware = ActionLogMiddleware::new(ActionLogConfig {
            capacity: 10,
            filter: ActionFilter::new(None, Some("Panel*")),
        });
        middleware.before(&Action::MarkersClear);
        middleware.after(&Action::MarkersClear, false);
        middleware.before(&Action::PanelToggle);
        middleware.after(&Action::PanelToggle, true);

        assert_eq!(middleware.log().len(), 1);
        let entry = middleware.log().recent(1).next().unwrap();
        assert_eq!(entry.state_changed, Some(false));
    }
}
