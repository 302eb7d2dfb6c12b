//! Location normalization for the search backend.
//!
//! The backend partitions its index by location and only accepts
//! `"City, AdminUnit"` or `"AdminUnit"` tokens; anything else is rejected here
//! before it reaches the wire.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// A canonical `"City, AdminUnit"` or `"AdminUnit"` string accepted by the
/// search backend. Construction goes through [`LocationToken::parse`], so a
/// held token always matches one of the two shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationToken(String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid location format: {raw:?} (expected \"City, AdminUnit\" or \"AdminUnit\")")]
pub struct InvalidLocationFormat {
    pub raw: String,
}

// A name part is alphabetic with internal spaces, periods, apostrophes and
// hyphens ("St. Paul", "Coeur d'Alene", "Winston-Salem").
static LOCATION_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z .'\-]*[A-Za-z.](, [A-Za-z][A-Za-z .'\-]*[A-Za-z.])?$").unwrap()
});

impl LocationToken {
    pub fn parse(raw: &str) -> Result<Self, InvalidLocationFormat> {
        let normalized = normalize(raw);
        if LOCATION_SHAPE.is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(InvalidLocationFormat {
                raw: raw.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for LocationToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LocationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Collapses whitespace and normalizes the comma separator to `", "`.
fn normalize(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.split_once(',') {
        Some((city, admin)) => format!("{}, {}", city.trim(), admin.trim()),
        None => collapsed,
    }
}

/// Result of resolving a batch of raw location strings.
///
/// Invalid entries do not abort the resolution of the others; each failure is
/// reported per entry.
#[derive(Debug, Clone, Default)]
pub struct ResolvedLocations {
    /// Valid tokens, deduplicated preserving first-seen order.
    pub tokens: Vec<LocationToken>,
    /// Per-entry failures, in input order.
    pub rejected: Vec<InvalidLocationFormat>,
}

/// Normalizes a list of raw place names into canonical [`LocationToken`]s.
pub fn resolve<S: AsRef<str>>(raw_locations: &[S]) -> ResolvedLocations {
    let mut resolved = ResolvedLocations::default();

    for raw in raw_locations {
        match LocationToken::parse(raw.as_ref()) {
            Ok(token) => {
                let seen = resolved
                    .tokens
                    .iter()
                    .any(|t| t.as_str().eq_ignore_ascii_case(token.as_str()));
                if !seen {
                    resolved.tokens.push(token);
                }
            }
            Err(err) => resolved.rejected.push(err),
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_city_admin_and_bare_admin() {
        assert_eq!(
            LocationToken::parse("San Francisco, California")
                .unwrap()
                .as_str(),
            "San Francisco, California"
        );
        assert_eq!(LocationToken::parse("Texas").unwrap().as_str(), "Texas");
        assert_eq!(
            LocationToken::parse("St. Paul, Minnesota").unwrap().as_str(),
            "St. Paul, Minnesota"
        );
        assert_eq!(
            LocationToken::parse("Winston-Salem, North Carolina")
                .unwrap()
                .as_str(),
            "Winston-Salem, North Carolina"
        );
    }

    #[test]
    fn normalizes_whitespace_around_comma() {
        assert_eq!(
            LocationToken::parse("  Austin ,   Texas ").unwrap().as_str(),
            "Austin, Texas"
        );
    }

    #[test]
    fn rejects_malformed_entries() {
        for raw in ["bad-location!!", "", "123", "Austin, Texas, USA", ",Texas"] {
            assert!(LocationToken::parse(raw).is_err(), "{raw:?} should fail");
        }
    }

    #[test]
    fn resolve_reports_per_entry_failures() {
        let resolved = resolve(&["San Francisco, California", "bad-location!!"]);
        assert_eq!(resolved.tokens.len(), 1);
        assert_eq!(resolved.tokens[0].as_str(), "San Francisco, California");
        assert_eq!(resolved.rejected.len(), 1);
        assert_eq!(resolved.rejected[0].raw, "bad-location!!");
    }

    #[test]
    fn resolve_dedups_preserving_first_seen_order() {
        let resolved = resolve(&[
            "Austin, Texas",
            "Boston, Massachusetts",
            "austin, texas",
            "Austin, Texas",
        ]);
        let tokens: Vec<&str> = resolved.tokens.iter().map(|t| t.as_str()).collect();
        assert_eq!(tokens, vec!["Austin, Texas", "Boston, Massachusetts"]);
        assert!(resolved.rejected.is_empty());
    }
}
