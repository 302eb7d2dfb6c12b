//! Deduplication/clustering of near-duplicate stories.
//!
//! Articles from different sources rarely share a unique key, so equivalence
//! is judged from normalized-title similarity plus publication-time
//! proximity. The pass is a deterministic single sweep: sort by
//! `(published_at, id)`, then grow "open" clusters by comparing each incoming
//! article against the anchors still inside the time window. Pure
//! transformation; the input articles are consumed, never mutated in place.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;

use crate::config::ClusterSettings;
use crate::types::{Article, Cluster};

/// Groups near-duplicate articles into clusters, ordered by composite rank:
/// best detection confidence first, then coverage breadth, then representative
/// recency.
pub fn cluster_articles(mut articles: Vec<Article>, settings: &ClusterSettings) -> Vec<Cluster> {
    // Stable order regardless of backend response jitter.
    articles.sort_by(|a, b| {
        a.published_at()
            .cmp(&b.published_at())
            .then_with(|| a.id().cmp(b.id()))
    });

    let window = settings.time_window();
    let mut open: Vec<OpenCluster> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();

    for article in articles {
        let id = article.id().to_string();

        // Exact duplicate backend ids always collapse, similarity aside.
        if let Some(&idx) = by_id.get(&id) {
            open[idx].members.push(article);
            continue;
        }

        let target = open.iter().position(|cluster| {
            article.published_at() - cluster.anchor_published <= window
                && strsim::normalized_levenshtein(
                    &normalize_title(article.title()),
                    &cluster.anchor_title,
                ) >= settings.title_similarity_threshold
        });

        let idx = match target {
            Some(idx) => {
                open[idx].members.push(article);
                idx
            }
            None => {
                open.push(OpenCluster {
                    anchor_published: article.published_at(),
                    anchor_title: normalize_title(article.title()),
                    members: vec![article],
                });
                open.len() - 1
            }
        };
        by_id.insert(id, idx);
    }

    let mut clusters: Vec<Cluster> = open.into_iter().map(OpenCluster::build).collect();
    rank(&mut clusters);
    clusters
}

/// One cluster per article, ranked with the same composite order. Used when
/// [`should_cluster`] decides collapsing is not worthwhile.
pub fn singleton_clusters(articles: Vec<Article>) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = articles
        .into_iter()
        .map(|article| {
            OpenCluster {
                anchor_published: article.published_at(),
                anchor_title: normalize_title(article.title()),
                members: vec![article],
            }
            .build()
        })
        .collect();
    rank(&mut clusters);
    clusters
}

/// Composite output rank: best detection confidence, then coverage breadth,
/// then representative recency, then id for full determinism.
fn rank(clusters: &mut [Cluster]) {
    clusters.sort_by(|a, b| {
        b.max_confidence
            .cmp(&a.max_confidence)
            .then_with(|| b.coverage_locations.len().cmp(&a.coverage_locations.len()))
            .then_with(|| {
                b.representative
                    .published_at()
                    .cmp(&a.representative.published_at())
            })
            .then_with(|| a.representative.id().cmp(b.representative.id()))
    });
}

struct OpenCluster {
    anchor_published: time::OffsetDateTime,
    anchor_title: String,
    members: Vec<Article>,
}

impl OpenCluster {
    fn build(self) -> Cluster {
        let representative = self
            .members
            .iter()
            .min_by(|a, b| representative_order(a, b))
            .expect("cluster is never empty")
            .clone();

        let coverage_locations = self
            .members
            .iter()
            .flat_map(|m| {
                m.detected_locations
                    .iter()
                    .map(|(token, _)| token.clone())
                    .chain(m.origins.iter().cloned())
            })
            .unique()
            .collect();

        let max_confidence = self.members.iter().filter_map(Article::best_confidence).max();

        Cluster {
            representative,
            members: self.members,
            coverage_locations,
            max_confidence,
        }
    }
}

/// Representative selection order: highest (location, method) confidence,
/// then earliest publication, then backend id, so selection is deterministic.
fn representative_order(a: &Article, b: &Article) -> Ordering {
    b.best_confidence()
        .cmp(&a.best_confidence())
        .then_with(|| a.published_at().cmp(&b.published_at()))
        .then_with(|| a.id().cmp(b.id()))
}

static TITLE_NOISE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9 ]").unwrap());

fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = TITLE_NOISE.replace_all(&lowered, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[a-zA-Z]+\b").unwrap());

/// Broad, event-style vocabulary likely to produce duplicate coverage.
const BROAD_TERMS: &[&str] = &[
    "layoffs",
    "merger",
    "acquisition",
    "funding",
    "investment",
    "policy",
    "regulation",
    "crisis",
    "shortage",
    "disruption",
    "fire",
    "flood",
    "earthquake",
    "storm",
    "accident",
    "breakthrough",
    "launch",
    "partnership",
    "deal",
];

/// Heuristic for whether a result set is worth collapsing into clusters:
/// large pages, broad-event vocabulary, or short queries all tend to return
/// many near-duplicates.
pub fn should_cluster(query: &str, page_size: u32) -> bool {
    if page_size >= 50 {
        return true;
    }

    let query_lower = query.to_lowercase();
    if BROAD_TERMS.iter().any(|term| query_lower.contains(term)) {
        return true;
    }

    let meaningful_terms = WORD
        .find_iter(query)
        .filter(|m| {
            !matches!(
                m.as_str().to_lowercase().as_str(),
                "and" | "or" | "not" | "near"
            )
        })
        .count();

    meaningful_terms <= 3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationToken;
    use localnews::domain::{ArticleRecord, DetectionMethod};
    use time::macros::datetime;
    use time::OffsetDateTime;

    fn location(raw: &str) -> LocationToken {
        LocationToken::parse(raw).unwrap()
    }

    fn article(
        id: &str,
        title: &str,
        published_at: OffsetDateTime,
        detected: &[(&str, DetectionMethod)],
    ) -> Article {
        Article {
            raw: ArticleRecord {
                id: id.to_string(),
                title: title.to_string(),
                summary: None,
                published_at,
                source: "example.com".to_string(),
                theme: None,
                link: None,
                location_mentions: vec![],
            },
            detected_locations: detected
                .iter()
                .map(|(l, m)| (location(l), *m))
                .collect(),
            origins: vec![],
        }
    }

    const T0: OffsetDateTime = datetime!(2026-08-20 12:00 UTC);

    #[test]
    fn near_duplicate_titles_within_window_cluster_together() {
        let articles = vec![
            article("a1", "City council approves downtown housing plan", T0, &[]),
            article(
                "b7",
                "City council approves downtown housing plans",
                T0 + time::Duration::hours(3),
                &[],
            ),
            article("c2", "Rodeo weekend draws record crowds", T0, &[]),
        ];

        let clusters = cluster_articles(articles, &ClusterSettings::default());
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters.iter().map(Cluster::len).max(), Some(2));
    }

    #[test]
    fn similar_titles_outside_window_stay_apart() {
        let articles = vec![
            article("a1", "Refinery fire forces evacuations", T0, &[]),
            article(
                "b2",
                "Refinery fire forces evacuations",
                T0 + time::Duration::hours(80),
                &[],
            ),
        ];

        let clusters = cluster_articles(articles, &ClusterSettings::default());
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn duplicate_backend_ids_always_collapse() {
        let articles = vec![
            article("same-id", "Completely different headline", T0, &[]),
            article(
                "same-id",
                "Nothing alike at all here",
                T0 + time::Duration::hours(1),
                &[],
            ),
        ];

        let clusters = cluster_articles(articles, &ClusterSettings::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 2);
    }

    #[test]
    fn representative_prefers_confidence_over_recency() {
        let articles = vec![
            article(
                "newer",
                "Hospital system announces merger",
                T0 + time::Duration::hours(2),
                &[("Austin, Texas", DetectionMethod::AiExtracted)],
            ),
            article(
                "older",
                "Hospital system announces merger",
                T0,
                &[("Austin, Texas", DetectionMethod::DedicatedSource)],
            ),
        ];

        let clusters = cluster_articles(articles, &ClusterSettings::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].representative.id(), "older");
        assert_eq!(
            clusters[0].max_confidence,
            Some(DetectionMethod::DedicatedSource)
        );
    }

    #[test]
    fn representative_ties_break_on_earliest_then_id() {
        let articles = vec![
            article(
                "zz",
                "Storm knocks out power across county",
                T0,
                &[("Texas", DetectionMethod::LocalSection)],
            ),
            article(
                "aa",
                "Storm knocks out power across county",
                T0,
                &[("Texas", DetectionMethod::LocalSection)],
            ),
        ];

        let clusters = cluster_articles(articles, &ClusterSettings::default());
        assert_eq!(clusters[0].representative.id(), "aa");
    }

    #[test]
    fn ranking_orders_by_confidence_then_coverage_then_recency() {
        let weak_broad = article(
            "w",
            "School board weighs new budget",
            T0 + time::Duration::hours(5),
            &[
                ("Austin, Texas", DetectionMethod::ProximityMention),
                ("Dallas, Texas", DetectionMethod::ProximityMention),
            ],
        );
        let strong_narrow = article(
            "s",
            "Port expansion project approved",
            T0,
            &[("Houston, Texas", DetectionMethod::DedicatedSource)],
        );

        let clusters = cluster_articles(
            vec![weak_broad, strong_narrow],
            &ClusterSettings::default(),
        );
        assert_eq!(clusters[0].representative.id(), "s");
        assert_eq!(clusters[1].representative.id(), "w");
    }

    #[test]
    fn equal_rank_clusters_order_by_recency() {
        let older = article(
            "old",
            "Bridge repairs begin on main street",
            T0,
            &[("Texas", DetectionMethod::LocalSection)],
        );
        let newer = article(
            "new",
            "Completely unrelated festival announcement",
            T0 + time::Duration::hours(6),
            &[("Texas", DetectionMethod::LocalSection)],
        );

        let clusters = cluster_articles(vec![older, newer], &ClusterSettings::default());
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].representative.id(), "new");
    }

    #[test]
    fn clustering_is_idempotent_over_representatives() {
        let articles = vec![
            article("a", "Wildfire burns north of town", T0, &[]),
            article(
                "b",
                "Wildfire burning north of town grows",
                T0 + time::Duration::hours(1),
                &[],
            ),
            article("c", "Farmers market reopens for season", T0, &[]),
        ];

        let first = cluster_articles(articles, &ClusterSettings::default());
        let representatives: Vec<Article> = first
            .iter()
            .map(|c| c.representative.clone())
            .collect();

        let second = cluster_articles(representatives, &ClusterSettings::default());
        assert_eq!(second.len(), first.len());
    }

    #[test]
    fn coverage_unions_detected_locations_and_origins() {
        let mut a = article(
            "a",
            "Transit authority expands bus routes",
            T0,
            &[("Austin, Texas", DetectionMethod::LocalSection)],
        );
        a.origins = vec![location("Austin, Texas"), location("Texas")];

        let clusters = cluster_articles(vec![a], &ClusterSettings::default());
        assert_eq!(clusters[0].coverage_locations.len(), 2);
    }

    #[test]
    fn should_cluster_heuristics() {
        // Large pages always cluster.
        assert!(should_cluster("very specific niche topic query here", 50));
        // Broad event vocabulary clusters.
        assert!(should_cluster("downtown warehouse fire", 10));
        // Short queries cluster.
        assert!(should_cluster("school board", 10));
        // Long, specific, non-broad queries do not.
        assert!(!should_cluster(
            "quarterly water utility infrastructure maintenance schedule downtown",
            10
        ));
    }
}
