//! Deterministic query enhancement: template expansion, not learned inference.
//!
//! Maps a free-text topic plus an optional domain context to a validated
//! boolean query, ranked location suggestions and a theme hint. Semantic
//! expansion stays with the calling agent; this module only applies fixed
//! vocabulary tables. No network calls.

use std::sync::LazyLock;

use regex::Regex;
use strum::{Display, EnumString};

use crate::location::LocationToken;
use crate::types::{EnhancedRequest, Theme};

use super::parser::validate;

/// Optional domain hint for enhancement. Auto-detected from the topic when
/// absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum DomainContext {
    #[strum(ascii_case_insensitive)]
    Business,
    #[strum(ascii_case_insensitive)]
    Technology,
    #[strum(ascii_case_insensitive)]
    Healthcare,
    #[strum(ascii_case_insensitive, serialize = "real_estate", serialize = "RealEstate")]
    RealEstate,
    #[strum(ascii_case_insensitive)]
    Politics,
}

struct DomainVocabulary {
    /// Topic words that imply this domain when no explicit context is given.
    hints: &'static [&'static str],
    /// Inclusion terms OR'd into the query to widen recall.
    expansion: &'static [&'static str],
    /// Noise terms excluded with a trailing NOT group.
    exclusions: &'static [&'static str],
    theme: Theme,
}

fn vocabulary(domain: DomainContext) -> &'static DomainVocabulary {
    match domain {
        DomainContext::Business => &DomainVocabulary {
            hints: &[
                "layoffs", "merger", "acquisition", "earnings", "ipo", "bankruptcy", "revenue",
                "investment",
            ],
            expansion: &["merger", "acquisition", "earnings", "expansion", "investment"],
            exclusions: &["sports", "entertainment", "celebrity"],
            theme: Theme::Business,
        },
        DomainContext::Technology => &DomainVocabulary {
            hints: &["tech", "startup", "software", "ai", "cybersecurity", "funding", "platform"],
            expansion: &["startup", "funding", "platform", "innovation", "cybersecurity"],
            exclusions: &["gaming", "entertainment", "celebrity"],
            theme: Theme::Tech,
        },
        DomainContext::Healthcare => &DomainVocabulary {
            hints: &["hospital", "health", "medical", "pharmaceutical", "clinic", "vaccine"],
            expansion: &["hospital", "clinic", "pharmaceutical", "\"public health\"", "patient"],
            exclusions: &["wellness", "fitness", "celebrity"],
            theme: Theme::Health,
        },
        DomainContext::RealEstate => &DomainVocabulary {
            hints: &["housing", "zoning", "property", "construction", "rent", "mortgage"],
            expansion: &["housing", "zoning", "development", "construction", "\"real estate\""],
            exclusions: &["vacation", "tourism", "\"reality show\""],
            theme: Theme::Business,
        },
        DomainContext::Politics => &DomainVocabulary {
            hints: &["election", "policy", "legislation", "council", "mayor", "governor", "vote"],
            expansion: &["policy", "legislation", "council", "regulation", "governance"],
            exclusions: &["celebrity", "gossip", "satire"],
            theme: Theme::Politics,
        },
    }
}

const ALL_DOMAINS: [DomainContext; 5] = [
    DomainContext::Business,
    DomainContext::Technology,
    DomainContext::Healthcare,
    DomainContext::RealEstate,
    DomainContext::Politics,
];

/// Regional aliases expanded into ranked location suggestions.
static REGION_ALIASES: &[(&str, &[&str])] = &[
    (
        "bay area",
        &[
            "San Francisco, California",
            "Oakland, California",
            "San Jose, California",
        ],
    ),
    (
        "silicon valley",
        &[
            "San Jose, California",
            "Palo Alto, California",
            "Mountain View, California",
        ],
    ),
    (
        "twin cities",
        &["Minneapolis, Minnesota", "St. Paul, Minnesota"],
    ),
    (
        "pacific northwest",
        &["Seattle, Washington", "Portland, Oregon"],
    ),
    (
        "new england",
        &["Massachusetts", "Connecticut", "Rhode Island", "New Hampshire", "Maine", "Vermont"],
    ),
];

static NON_TERM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9*?\-]").unwrap());

const NOISE_WORDS: &[&str] = &[
    "in", "the", "for", "with", "from", "about", "a", "an", "of", "on", "and", "or", "not",
    "near", "news", "latest", "recent",
];

/// Enhances a free-text topic into a validated boolean query.
///
/// The produced query always passes [`validate`]; when the template expansion
/// does not (e.g. the topic itself injects broken syntax), the enhancer falls
/// back to a plain AND-join and marks the result `degraded`.
pub fn enhance(topic: &str, domain_context: Option<DomainContext>) -> EnhancedRequest {
    let (remaining_topic, suggested_locations) = extract_regions(topic);
    let terms = meaningful_terms(&remaining_topic);

    let domain = domain_context.or_else(|| detect_domain(&terms));
    let suggested_theme = domain.map(|d| vocabulary(d).theme);

    let candidate = build_query(&terms, domain);
    let mut rationale = describe(&terms, domain, &suggested_locations);
    let (query, degraded) = finalize(candidate, &terms, &mut rationale);

    EnhancedRequest {
        query,
        suggested_locations,
        suggested_theme,
        degraded,
        rationale,
    }
}

/// Pulls region aliases out of the topic, returning the topic with the alias
/// phrases removed plus the suggested location tokens, in alias order.
fn extract_regions(topic: &str) -> (String, Vec<LocationToken>) {
    let mut remaining = topic.to_lowercase();
    let mut locations = Vec::new();

    for (alias, expansions) in REGION_ALIASES {
        if remaining.contains(alias) {
            remaining = remaining.replace(alias, " ");
            for raw in *expansions {
                // Alias tables hold pre-validated canonical tokens.
                if let Ok(token) = LocationToken::parse(raw) {
                    locations.push(token);
                }
            }
        }
    }

    (remaining, locations)
}

fn meaningful_terms(topic: &str) -> Vec<String> {
    topic
        .split_whitespace()
        .map(|w| NON_TERM.replace_all(w, "").to_lowercase())
        .filter(|w| !w.is_empty() && !NOISE_WORDS.contains(&w.as_str()))
        .collect()
}

/// First domain whose hint vocabulary intersects the topic terms, in fixed
/// table order, so detection is deterministic.
fn detect_domain(terms: &[String]) -> Option<DomainContext> {
    ALL_DOMAINS.into_iter().find(|domain| {
        vocabulary(*domain)
            .hints
            .iter()
            .any(|hint| terms.iter().any(|t| t == hint))
    })
}

fn build_query(terms: &[String], domain: Option<DomainContext>) -> String {
    let topic_clause = match terms.len() {
        0 => "local".to_string(),
        1 => terms[0].clone(),
        _ => format!(
            "(\"{}\" OR ({}))",
            terms.join(" "),
            terms.join(" AND ")
        ),
    };

    let Some(domain) = domain else {
        return topic_clause;
    };
    let vocab = vocabulary(domain);

    format!(
        "{} AND ({}) NOT ({})",
        topic_clause,
        vocab.expansion.join(" OR "),
        vocab.exclusions.join(" OR "),
    )
}

/// Accepts the candidate only when it validates; otherwise falls back to a
/// plain AND-join and flags the result degraded. Terms reaching this point
/// have already been sanitized, so the template normally validates and the
/// fallback is a safety net against future template changes.
fn finalize(candidate: String, terms: &[String], rationale: &mut String) -> (String, bool) {
    if validate(&candidate).is_valid() {
        (candidate, false)
    } else {
        rationale.push_str("; template expansion failed validation, using plain AND-join");
        (fallback_query(terms), true)
    }
}

/// Safe fallback: plain AND-joined terms, no grouping.
fn fallback_query(terms: &[String]) -> String {
    if terms.is_empty() {
        "local".to_string()
    } else {
        terms.join(" AND ")
    }
}

fn describe(
    terms: &[String],
    domain: Option<DomainContext>,
    locations: &[LocationToken],
) -> String {
    let mut parts = vec![format!("{} topic term(s)", terms.len())];
    match domain {
        Some(d) => parts.push(format!("{d} vocabulary applied")),
        None => parts.push("no domain detected".to_string()),
    }
    if !locations.is_empty() {
        parts.push(format!("{} location(s) suggested", locations.len()));
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enhanced_query_always_validates() {
        let inputs = [
            ("tech layoffs", None),
            ("hospital merger", Some(DomainContext::Healthcare)),
            ("zoning changes downtown", Some(DomainContext::RealEstate)),
            ("mayor election results", None),
            ("", None),
            ("((((", None),
        ];
        for (topic, domain) in inputs {
            let enhanced = enhance(topic, domain);
            assert!(
                validate(&enhanced.query).is_valid(),
                "{topic:?} produced invalid query {:?}",
                enhanced.query
            );
        }
    }

    #[test]
    fn business_topic_gets_vocabulary_and_noise_filter() {
        let enhanced = enhance("tech layoffs", None);
        assert!(enhanced.query.contains("NOT ("));
        assert!(enhanced.query.contains(" OR "));
        assert!(!enhanced.degraded);
        // "layoffs" hints Business before "tech" hints Technology.
        assert_eq!(enhanced.suggested_theme, Some(Theme::Business));
    }

    #[test]
    fn explicit_domain_context_wins_over_detection() {
        let enhanced = enhance("tech layoffs", Some(DomainContext::Technology));
        assert_eq!(enhanced.suggested_theme, Some(Theme::Tech));
    }

    #[test]
    fn region_alias_suggests_locations() {
        let enhanced = enhance("startup funding in the bay area", None);
        let suggested: Vec<&str> = enhanced
            .suggested_locations
            .iter()
            .map(|t| t.as_str())
            .collect();
        assert_eq!(
            suggested,
            vec![
                "San Francisco, California",
                "Oakland, California",
                "San Jose, California"
            ]
        );
        // The alias words themselves do not leak into the query.
        assert!(!enhanced.query.contains("bay"));
    }

    #[test]
    fn unknown_topic_stays_plain() {
        let enhanced = enhance("quilting festival", None);
        assert_eq!(enhanced.suggested_theme, None);
        assert!(!enhanced.query.contains("NOT"));
        assert!(validate(&enhanced.query).is_valid());
    }

    #[test]
    fn single_term_topic_has_no_phrase_group() {
        let enhanced = enhance("wildfire", None);
        assert_eq!(enhanced.query, "wildfire");
    }

    #[test]
    fn invalid_candidate_falls_back_to_and_join() {
        let terms = vec!["tesla".to_string(), "recall".to_string()];
        let mut rationale = "2 topic term(s)".to_string();

        let (query, degraded) = finalize("((broken".to_string(), &terms, &mut rationale);

        assert!(degraded);
        assert_eq!(query, "tesla AND recall");
        assert!(validate(&query).is_valid());
        assert!(rationale.contains("plain AND-join"));
    }

    #[test]
    fn enhancement_is_deterministic() {
        let a = enhance("hospital merger in the twin cities", None);
        let b = enhance("hospital merger in the twin cities", None);
        assert_eq!(a.query, b.query);
        assert_eq!(a.suggested_locations, b.suggested_locations);
        assert_eq!(a.suggested_theme, b.suggested_theme);
    }
}
