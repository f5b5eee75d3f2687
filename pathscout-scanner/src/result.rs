use crate::error::ScanError;
use std::collections::HashSet;

/// One endpoint-looking literal and the source around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCandidateMatch {
    /// Exact source text of the literal, delimiters included.
    pub value: String,
    /// Source text of the nearest reportable construct, optionally with the
    /// literal wrapped in highlight markers.
    pub context: String,
}

impl EndpointCandidateMatch {
    pub fn new(value: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            context: context.into(),
        }
    }
}

/// Matches found under one label (a file, a URL, or an inline script of either).
#[derive(Debug, Clone)]
pub struct LabelMatches {
    pub label: String,
    pub matches: Vec<EndpointCandidateMatch>,
}

/// A label that produced no result, and why.
#[derive(Debug)]
pub struct LabelFailure {
    pub label: String,
    pub error: ScanError,
}

/// Everything one invocation has gathered so far.
#[derive(Debug, Default)]
pub struct CrawlState {
    entries: Vec<LabelMatches>,
    failures: Vec<LabelFailure>,
    external_script_urls: HashSet<String>,
    fetched_urls: HashSet<String>,
    interrupted: bool,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the matches for a label. A label seen again replaces its
    /// earlier entry but keeps its position.
    pub fn insert(&mut self, label: String, matches: Vec<EndpointCandidateMatch>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.label == label) {
            entry.matches = matches;
        } else {
            self.entries.push(LabelMatches { label, matches });
        }
    }

    pub fn record_failure(&mut self, label: String, error: ScanError) {
        self.failures.push(LabelFailure { label, error });
    }

    pub fn get(&self, label: &str) -> Option<&[EndpointCandidateMatch]> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.matches.as_slice())
    }

    /// Entries in the order they completed.
    pub fn entries(&self) -> &[LabelMatches] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LabelMatches> {
        self.entries
    }

    pub fn failures(&self) -> &[LabelFailure] {
        &self.failures
    }

    pub fn external_script_urls(&self) -> &HashSet<String> {
        &self.external_script_urls
    }

    pub(crate) fn add_external_script_url(&mut self, url: String) {
        self.external_script_urls.insert(url);
    }

    pub(crate) fn mark_fetched(&mut self, url: &str) {
        self.fetched_urls.insert(url.to_string());
    }

    /// External script URLs not already fetched by this invocation.
    pub(crate) fn pending_external_script_urls(&self) -> Vec<String> {
        let mut pending: Vec<String> = self
            .external_script_urls
            .difference(&self.fetched_urls)
            .cloned()
            .collect();
        pending.sort();
        pending
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    /// Total number of matches across all labels.
    pub fn match_count(&self) -> usize {
        self.entries.iter().map(|e| e.matches.len()).sum()
    }
}
