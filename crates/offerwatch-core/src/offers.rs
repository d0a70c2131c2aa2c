use serde::{Deserialize, Serialize};

use crate::variants::{Source, Variant};

/// One offer block as pulled out of listing markup, before any cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOffer {
    pub title: String,
    pub text: String,
    /// Absolute URL, already resolved against the page base.
    pub link: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Normalized offer used for identity and comparison.
///
/// `link` is the canonical form: no fragment, no tracking parameters,
/// sorted query, lower-case host, no trailing slash outside the root path.
/// Text fields carry no whitespace runs and no surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalOffer {
    pub source: Source,
    pub variant: Variant,
    pub title: String,
    pub text: String,
    pub link: String,
    pub category: Option<String>,
}

/// A canonical offer paired with its content fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintedOffer {
    #[serde(flatten)]
    pub offer: CanonicalOffer,
    /// Lowercase hex SHA-256 over the canonical field tuple.
    pub hash: String,
}

/// Per-variant or aggregate classification counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferCounts {
    pub found: usize,
    pub new: usize,
    pub changed: usize,
    pub unchanged: usize,
}

impl OfferCounts {
    pub fn add(&mut self, other: &OfferCounts) {
        self.found += other.found;
        self.new += other.new;
        self.changed += other.changed;
        self.unchanged += other.unchanged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_offer_category_defaults_to_none() {
        let raw: RawOffer = serde_json::from_str(
            r#"{"title":"Save 20%","text":"On rooms","link":"https://example.com/a"}"#,
        )
        .unwrap();
        assert!(raw.category.is_none());
    }

    #[test]
    fn fingerprinted_offer_flattens_fields() {
        let offer = FingerprintedOffer {
            offer: CanonicalOffer {
                source: Source::Us,
                variant: Variant::UsFlorida,
                title: "t".to_string(),
                text: "x".to_string(),
                link: "https://example.com/a".to_string(),
                category: None,
            },
            hash: "abc".to_string(),
        };
        let json = serde_json::to_value(&offer).unwrap();
        assert_eq!(json["variant"], "us-florida");
        assert_eq!(json["hash"], "abc");
        assert!(json["category"].is_null());
    }

    #[test]
    fn counts_add_accumulates_every_field() {
        let mut total = OfferCounts::default();
        total.add(&OfferCounts {
            found: 3,
            new: 1,
            changed: 1,
            unchanged: 1,
        });
        total.add(&OfferCounts {
            found: 2,
            new: 2,
            changed: 0,
            unchanged: 0,
        });
        assert_eq!(
            total,
            OfferCounts {
                found: 5,
                new: 3,
                changed: 1,
                unchanged: 1
            }
        );
    }
}
