//! Wire types for article records returned by the Local News API.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// How a location mention was attributed to an article by the backend.
///
/// Variants are declared in ascending confidence so the derived `Ord` is the
/// total confidence order: `dedicated_source` outranks everything,
/// `ai_extracted` ranks below every structural signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    AiExtracted,
    RegionalSource,
    ProximityMention,
    StandardFormat,
    LocalSection,
    DedicatedSource,
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionMethod::AiExtracted => write!(f, "ai_extracted"),
            DetectionMethod::RegionalSource => write!(f, "regional_source"),
            DetectionMethod::ProximityMention => write!(f, "proximity_mention"),
            DetectionMethod::StandardFormat => write!(f, "standard_format"),
            DetectionMethod::LocalSection => write!(f, "local_section"),
            DetectionMethod::DedicatedSource => write!(f, "dedicated_source"),
        }
    }
}

/// A single location the backend attributed to an article, together with the
/// method that found it. The method belongs to the (article, location) pair,
/// not to the article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationMention {
    pub location: String,
    pub detection_method: DetectionMethod,
}

/// One article record as returned by the search endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Opaque backend-assigned identifier.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    /// Publishing outlet, e.g. "sfchronicle.com".
    pub source: String,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub location_mentions: Vec<LocationMention>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_method_confidence_order_is_total() {
        use DetectionMethod::*;

        assert!(DedicatedSource > LocalSection);
        assert!(LocalSection > StandardFormat);
        assert!(StandardFormat > ProximityMention);
        assert!(ProximityMention > RegionalSource);
        assert!(RegionalSource > AiExtracted);

        let mut methods = vec![LocalSection, AiExtracted, DedicatedSource];
        methods.sort();
        assert_eq!(methods, vec![AiExtracted, LocalSection, DedicatedSource]);
    }

    #[test]
    fn detection_method_deserializes_from_snake_case() {
        let mention: LocationMention = serde_json::from_str(
            r#"{"location": "Austin, Texas", "detection_method": "dedicated_source"}"#,
        )
        .unwrap();
        assert_eq!(mention.detection_method, DetectionMethod::DedicatedSource);
    }

    #[test]
    fn article_record_tolerates_missing_optionals() {
        let record: ArticleRecord = serde_json::from_str(
            r#"{
                "id": "abc123",
                "title": "City council approves new housing plan",
                "published_at": "2026-08-20T12:30:00Z",
                "source": "example.com"
            }"#,
        )
        .unwrap();
        assert!(record.summary.is_none());
        assert!(record.location_mentions.is_empty());
    }
}
