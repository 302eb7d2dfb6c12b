//! Core types for the newsdesk domain.

use std::sync::LazyLock;

use regex::Regex;
use strum::{Display, EnumString};
use thiserror::Error;
use time::OffsetDateTime;

use localnews::domain::{ArticleRecord, DetectionMethod};

use crate::location::LocationToken;

/// Theme filter accepted by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Theme {
    #[strum(ascii_case_insensitive)]
    Business,
    #[strum(ascii_case_insensitive)]
    Economics,
    #[strum(ascii_case_insensitive)]
    Entertainment,
    #[strum(ascii_case_insensitive)]
    Finance,
    #[strum(ascii_case_insensitive)]
    Health,
    #[strum(ascii_case_insensitive)]
    Politics,
    #[strum(ascii_case_insensitive)]
    Science,
    #[strum(ascii_case_insensitive)]
    Sports,
    #[strum(ascii_case_insensitive)]
    Tech,
    #[strum(ascii_case_insensitive)]
    Crime,
    #[strum(ascii_case_insensitive)]
    Lifestyle,
    #[strum(ascii_case_insensitive)]
    Travel,
    #[strum(ascii_case_insensitive)]
    General,
}

static PERIOD_EXPR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[dh]$").unwrap());
static RELATIVE_EXPR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+ (?:hours?|days?) ago$").unwrap());
static ABSOLUTE_EXPR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// A date expression consumed verbatim by the backend.
///
/// Accepted shapes: `"7d"`, `"24h"`, `"3 days ago"`, `"12 hours ago"`, or an
/// absolute `YYYY-MM-DD` date. Only the shape is validated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateExpr(String);

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid date expression: {0:?}")]
pub struct InvalidDateExpr(pub String);

impl DateExpr {
    pub fn parse(raw: &str) -> Result<Self, InvalidDateExpr> {
        let raw = raw.trim();
        if PERIOD_EXPR.is_match(raw) || RELATIVE_EXPR.is_match(raw) || ABSOLUTE_EXPR.is_match(raw)
        {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidDateExpr(raw.to_string()))
        }
    }

    /// Parses a pure period expression (`"7d"`, `"24h"`), the only shape the
    /// latest-headlines endpoint accepts.
    pub fn parse_period(raw: &str) -> Result<Self, InvalidDateExpr> {
        let raw = raw.trim();
        if PERIOD_EXPR.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidDateExpr(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("page_size must be within 1..=1000, got {0}")]
    PageSizeOutOfRange(u32),
    #[error(transparent)]
    InvalidDate(#[from] InvalidDateExpr),
}

/// One logical search, immutable once constructed. Produced fresh per user
/// interaction; nothing is shared between `search()` invocations.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    query: String,
    locations: Vec<LocationToken>,
    theme: Option<Theme>,
    date_from: Option<DateExpr>,
    page_size: u32,
    clustering: Option<bool>,
}

pub const MAX_PAGE_SIZE: u32 = 1000;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

impl SearchRequest {
    /// An empty `locations` sequence means "any location": a single unscoped
    /// backend call is issued.
    pub fn new(query: impl Into<String>, locations: Vec<LocationToken>) -> Self {
        Self {
            query: query.into(),
            locations,
            theme: None,
            date_from: None,
            page_size: DEFAULT_PAGE_SIZE,
            clustering: None,
        }
    }

    pub fn with_theme(mut self, theme: Option<Theme>) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_date_from(mut self, raw: &str) -> Result<Self, RequestError> {
        self.date_from = Some(DateExpr::parse(raw)?);
        Ok(self)
    }

    pub fn with_page_size(mut self, page_size: u32) -> Result<Self, RequestError> {
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(RequestError::PageSizeOutOfRange(page_size));
        }
        self.page_size = page_size;
        Ok(self)
    }

    /// Forces near-duplicate clustering on or off for this request,
    /// overriding the orchestrator's heuristic.
    pub fn with_clustering(mut self, enabled: bool) -> Self {
        self.clustering = Some(enabled);
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn locations(&self) -> &[LocationToken] {
        &self.locations
    }

    pub fn theme(&self) -> Option<Theme> {
        self.theme
    }

    pub fn date_from(&self) -> Option<&DateExpr> {
        self.date_from.as_ref()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn clustering(&self) -> Option<bool> {
        self.clustering
    }
}

/// A latest-headlines request: no boolean query, a `when` period instead.
#[derive(Debug, Clone)]
pub struct HeadlinesRequest {
    locations: Vec<LocationToken>,
    when: DateExpr,
    theme: Option<Theme>,
    page_size: u32,
}

impl HeadlinesRequest {
    pub fn new(locations: Vec<LocationToken>, when: &str) -> Result<Self, RequestError> {
        Ok(Self {
            locations,
            when: DateExpr::parse_period(when)?,
            theme: None,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_theme(mut self, theme: Option<Theme>) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Result<Self, RequestError> {
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(RequestError::PageSizeOutOfRange(page_size));
        }
        self.page_size = page_size;
        Ok(self)
    }

    pub fn locations(&self) -> &[LocationToken] {
        &self.locations
    }

    pub fn when(&self) -> &DateExpr {
        &self.when
    }

    pub fn theme(&self) -> Option<Theme> {
        self.theme
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}

/// Output of query enhancement.
#[derive(Debug, Clone)]
pub struct EnhancedRequest {
    /// Boolean query guaranteed to pass validation.
    pub query: String,
    /// Ranked location suggestions when the topic implies geography.
    pub suggested_locations: Vec<LocationToken>,
    pub suggested_theme: Option<Theme>,
    /// True when the template expansion failed validation and the safe
    /// AND-joined fallback was used instead.
    pub degraded: bool,
    /// Short human-readable explanation of the enhancements made.
    pub rationale: String,
}

/// An article plus the request-scoped metadata the orchestrator attaches:
/// which location calls produced it and which (location, method) pairs the
/// backend detected. Lives only for the duration of one request.
#[derive(Debug, Clone)]
pub struct Article {
    pub raw: ArticleRecord,
    /// (location, detection method) pairs reported by the backend.
    pub detected_locations: Vec<(LocationToken, DetectionMethod)>,
    /// The per-location queries this article came back under. An article
    /// returned by two location calls carries both tokens.
    pub origins: Vec<LocationToken>,
}

impl Article {
    pub fn id(&self) -> &str {
        &self.raw.id
    }

    pub fn title(&self) -> &str {
        &self.raw.title
    }

    pub fn published_at(&self) -> OffsetDateTime {
        self.raw.published_at
    }

    pub fn source(&self) -> &str {
        &self.raw.source
    }

    /// Highest-confidence detection method across all detected locations.
    pub fn best_confidence(&self) -> Option<DetectionMethod> {
        self.detected_locations.iter().map(|(_, m)| *m).max()
    }
}

/// A group of articles judged to report the same underlying story.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub representative: Article,
    /// All members, ordered by publication time.
    pub members: Vec<Article>,
    /// Distinct locations covered by the cluster's members.
    pub coverage_locations: Vec<LocationToken>,
    /// Best detection confidence across members; `None` when no member
    /// carries a location mention.
    pub max_confidence: Option<DetectionMethod>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Per-request diagnostics returned alongside a (possibly reduced) result
/// set. A partial failure is surfaced here, never silently dropped.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// Locations whose calls were dropped after exhausting retries (or were
    /// never issued because the request was cancelled).
    pub failed_locations: Vec<LocationToken>,
    /// True when the result set is reduced relative to what was asked for.
    pub degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_parses_case_insensitively() {
        assert_eq!("business".parse::<Theme>().unwrap(), Theme::Business);
        assert_eq!("TECH".parse::<Theme>().unwrap(), Theme::Tech);
        assert!("gardening".parse::<Theme>().is_err());
    }

    #[test]
    fn date_expr_accepts_documented_shapes() {
        for raw in ["7d", "24h", "3 days ago", "1 day ago", "12 hours ago", "2026-01-15"] {
            assert!(DateExpr::parse(raw).is_ok(), "{raw} should parse");
        }
        for raw in ["yesterday", "7", "d7", "2026-1-5", "soon"] {
            assert!(DateExpr::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn period_expr_rejects_non_periods() {
        assert!(DateExpr::parse_period("7d").is_ok());
        assert!(DateExpr::parse_period("24h").is_ok());
        assert!(DateExpr::parse_period("3 days ago").is_err());
        assert!(DateExpr::parse_period("2026-01-15").is_err());
    }

    #[test]
    fn page_size_bounds_are_enforced() {
        let request = SearchRequest::new("flooding", vec![]);
        assert!(request.clone().with_page_size(0).is_err());
        assert!(request.clone().with_page_size(1001).is_err());
        assert_eq!(
            request.with_page_size(1000).unwrap().page_size(),
            MAX_PAGE_SIZE
        );
    }
}
