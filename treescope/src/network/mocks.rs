//! Network mock rules.
//!
//! Rules are consulted in insertion order and the first enabled match
//! wins. A match counts as a hit immediately, before the caller delivers
//! the mocked response.

use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};
use treescope_common::{MockResponse, MockRule};

/// A rule as supplied by a client, before it gets an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockSpec {
    pub url_pattern: String,
    #[serde(default)]
    pub is_regex: bool,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub response: MockResponse,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl MockSpec {
    pub fn new(url_pattern: impl Into<String>) -> Self {
        Self {
            url_pattern: url_pattern.into(),
            is_regex: false,
            method: None,
            response: MockResponse::default(),
            enabled: true,
        }
    }
}

#[derive(Debug)]
struct Entry {
    rule: MockRule,
    /// Compiled once at add time; `None` for substring rules and malformed patterns
    regex: Option<Regex>,
}

impl Entry {
    fn matches(&self, method: &str, url: &str) -> bool {
        if !self.rule.enabled {
            return false;
        }
        if self.rule.method.as_ref().is_some_and(|m| !m.eq_ignore_ascii_case(method)) {
            return false;
        }
        if self.rule.is_regex {
            self.regex.as_ref().is_some_and(|re| re.is_match(url))
        } else {
            url.contains(self.rule.url_pattern.as_str())
        }
    }
}

#[derive(Debug, Default)]
pub struct MockRegistry {
    entries: Vec<Entry>,
    last_id: u64,
}

impl MockRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule and return it with its assigned id.
    pub fn add(&mut self, spec: MockSpec) -> MockRule {
        self.last_id += 1;
        let id = format!("mock_{}", self.last_id);

        let regex = if spec.is_regex {
            match Regex::new(&spec.url_pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Mock {id} has a malformed pattern and will never match: {e}");
                    None
                }
            }
        } else {
            None
        };

        let rule = MockRule {
            id,
            url_pattern: spec.url_pattern,
            is_regex: spec.is_regex,
            method: spec.method,
            response: spec.response,
            enabled: spec.enabled,
            hit_count: 0,
        };
        self.entries.push(Entry { rule: rule.clone(), regex });
        rule
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.rule.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.rule.id == id) {
            Some(entry) => {
                entry.rule.enabled = enabled;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn list(&self) -> Vec<MockRule> {
        self.entries.iter().map(|e| e.rule.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First enabled rule matching the request. Increments its hit count.
    pub fn find_matching_mock(&mut self, method: &str, url: &str) -> Option<MockRule> {
        let entry = self.entries.iter_mut().find(|e| e.matches(method, url))?;
        entry.rule.hit_count += 1;
        Some(entry.rule.clone())
    }
}
