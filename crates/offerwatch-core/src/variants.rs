//! Crawl variants, their coarse sources, and per-variant cookie presets.
//!
//! A variant simulates one visitor geography against the same listing site.
//! The geography is carried entirely by the cookies injected at the start of
//! each fetch; the server is expected to honor them over IP geolocation.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

pub const DEFAULT_US_BASE_URL: &str = "https://disneyworld.disney.go.com/special-offers/";
pub const DEFAULT_CA_BASE_URL: &str = "https://disneyworld.disney.go.com/en_CA/special-offers/";

/// Characters left unescaped by JavaScript's `encodeURIComponent`, which is
/// what the site itself uses when writing these cookies.
const COOKIE_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Coarse geography an offer is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Us,
    Ca,
}

impl Source {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Us => "us",
            Source::Ca => "ca",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Source {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "us" => Ok(Source::Us),
            "ca" => Ok(Source::Ca),
            other => Err(ConfigError::UnknownSource(other.to_string())),
        }
    }
}

/// Fine-grained geo/cookie profile used for one crawl pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    Us,
    UsFlorida,
    Ca,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Us, Variant::UsFlorida, Variant::Ca];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Us => "us",
            Variant::UsFlorida => "us-florida",
            Variant::Ca => "ca",
        }
    }

    #[must_use]
    pub fn source(self) -> Source {
        match self {
            Variant::Us | Variant::UsFlorida => Source::Us,
            Variant::Ca => Source::Ca,
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Variant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "us" => Ok(Variant::Us),
            "us-florida" => Ok(Variant::UsFlorida),
            "ca" => Ok(Variant::Ca),
            other => Err(ConfigError::UnknownSource(other.to_string())),
        }
    }
}

/// Listing page URL per coarse source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseUrls {
    pub us: String,
    pub ca: String,
}

impl Default for BaseUrls {
    fn default() -> Self {
        Self {
            us: DEFAULT_US_BASE_URL.to_string(),
            ca: DEFAULT_CA_BASE_URL.to_string(),
        }
    }
}

impl BaseUrls {
    #[must_use]
    pub fn for_source(&self, source: Source) -> &str {
        match source {
            Source::Us => &self.us,
            Source::Ca => &self.ca,
        }
    }
}

/// Everything the pipeline needs to crawl one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantPreset {
    pub variant: Variant,
    pub source: Source,
    pub base_url: String,
    pub cookies: Vec<(String, String)>,
}

impl VariantPreset {
    #[must_use]
    pub fn new(variant: Variant, base_urls: &BaseUrls) -> Self {
        let source = variant.source();
        Self {
            variant,
            source,
            base_url: base_urls.for_source(source).to_string(),
            cookies: cookie_preset(variant),
        }
    }
}

/// Maps an invocation's source selector to the variants it runs.
///
/// `None`, `"all"` and the legacy `"us"` selector run every variant;
/// `"us-only"`, `"us-florida"`, and `"ca"` select one variant.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownSource`] for any other selector.
pub fn resolve_variants(selector: Option<&str>) -> Result<Vec<Variant>, ConfigError> {
    match selector.map(str::trim) {
        None | Some("" | "all" | "us") => Ok(Variant::ALL.to_vec()),
        Some("us-only") => Ok(vec![Variant::Us]),
        Some("us-florida") => Ok(vec![Variant::UsFlorida]),
        Some("ca") => Ok(vec![Variant::Ca]),
        Some(other) => Err(ConfigError::UnknownSource(other.to_string())),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AkamaiGeo<'a> {
    zip_code: &'a str,
    region: &'a str,
    country: &'a str,
    metro: &'a str,
    metro_code: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SiteGeo<'a> {
    zip_code: &'a str,
    region: &'a str,
    country: &'a str,
    metro: &'a str,
    metro_code: &'a str,
    #[serde(rename = "countryisocode")]
    country_iso_code: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LocaleCookie<'a> {
    content_locale: &'a str,
    version: &'a str,
    precedence: u8,
    akamai: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LanguageCookie<'a> {
    preferred_language: &'a str,
    version: &'a str,
    precedence: u8,
    language: &'a str,
    akamai: &'a str,
}

fn encode_cookie_json<T: Serialize>(value: &T) -> String {
    // Serializing these borrowed-str structs cannot fail.
    let json = serde_json::to_string(value).unwrap_or_default();
    utf8_percent_encode(&json, COOKIE_COMPONENT).to_string()
}

/// Returns the cookies injected into the jar before the first request for
/// `variant`. The plain US variant relies on the site's defaults.
#[must_use]
pub fn cookie_preset(variant: Variant) -> Vec<(String, String)> {
    match variant {
        Variant::Us => Vec::new(),
        Variant::UsFlorida => vec![
            (
                "geolocation_aka_jar".to_string(),
                encode_cookie_json(&AkamaiGeo {
                    zip_code: "32830",
                    region: "FL",
                    country: "US",
                    metro: "LAKE BUENA VISTA",
                    metro_code: "534",
                }),
            ),
            (
                "GEOLOCATION_jar".to_string(),
                encode_cookie_json(&SiteGeo {
                    zip_code: "32830",
                    region: "FL",
                    country: "united states",
                    metro: "lake buena vista",
                    metro_code: "534",
                    country_iso_code: "us",
                }),
            ),
        ],
        Variant::Ca => vec![
            (
                "localeCookie_jar_aka".to_string(),
                encode_cookie_json(&LocaleCookie {
                    content_locale: "en_CA",
                    version: "3",
                    precedence: 0,
                    akamai: "true",
                }),
            ),
            (
                "languageSelection_jar_aka".to_string(),
                encode_cookie_json(&LanguageCookie {
                    preferred_language: "en_CA",
                    version: "1",
                    precedence: 0,
                    language: "en_CA",
                    akamai: "true",
                }),
            ),
            (
                "geolocation_aka_jar".to_string(),
                encode_cookie_json(&AkamaiGeo {
                    zip_code: "M5H 2N2",
                    region: "ON",
                    country: "CA",
                    metro: "TORONTO",
                    metro_code: "0",
                }),
            ),
            (
                "GEOLOCATION_jar".to_string(),
                encode_cookie_json(&SiteGeo {
                    zip_code: "M5H 2N2",
                    region: "ON",
                    country: "canada",
                    metro: "toronto",
                    metro_code: "0",
                    country_iso_code: "ca",
                }),
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_variants_defaults_to_all() {
        assert_eq!(resolve_variants(None).unwrap(), Variant::ALL.to_vec());
        assert_eq!(resolve_variants(Some("all")).unwrap(), Variant::ALL.to_vec());
    }

    #[test]
    fn resolve_variants_legacy_us_selector_runs_every_variant() {
        assert_eq!(resolve_variants(Some("us")).unwrap(), Variant::ALL.to_vec());
    }

    #[test]
    fn resolve_variants_single_variant_selectors() {
        assert_eq!(resolve_variants(Some("us-only")).unwrap(), vec![Variant::Us]);
        assert_eq!(
            resolve_variants(Some("us-florida")).unwrap(),
            vec![Variant::UsFlorida]
        );
        assert_eq!(resolve_variants(Some("ca")).unwrap(), vec![Variant::Ca]);
    }

    #[test]
    fn resolve_variants_rejects_unknown_selector() {
        let err = resolve_variants(Some("mx")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSource(ref s) if s == "mx"));
    }

    #[test]
    fn variant_maps_to_coarse_source() {
        assert_eq!(Variant::Us.source(), Source::Us);
        assert_eq!(Variant::UsFlorida.source(), Source::Us);
        assert_eq!(Variant::Ca.source(), Source::Ca);
    }

    #[test]
    fn variant_serializes_kebab_case() {
        let json = serde_json::to_string(&Variant::UsFlorida).unwrap();
        assert_eq!(json, "\"us-florida\"");
        let parsed: Variant = "us-florida".parse().unwrap();
        assert_eq!(parsed, Variant::UsFlorida);
    }

    #[test]
    fn preset_picks_base_url_by_source() {
        let urls = BaseUrls::default();
        let ca = VariantPreset::new(Variant::Ca, &urls);
        assert_eq!(ca.base_url, DEFAULT_CA_BASE_URL);
        assert_eq!(ca.source, Source::Ca);
        let fl = VariantPreset::new(Variant::UsFlorida, &urls);
        assert_eq!(fl.base_url, DEFAULT_US_BASE_URL);
    }

    #[test]
    fn us_preset_has_no_cookies() {
        assert!(cookie_preset(Variant::Us).is_empty());
    }

    #[test]
    fn florida_preset_encodes_json_like_encode_uri_component() {
        let cookies = cookie_preset(Variant::UsFlorida);
        let (name, value) = &cookies[0];
        assert_eq!(name, "geolocation_aka_jar");
        assert_eq!(
            value,
            "%7B%22zipCode%22%3A%2232830%22%2C%22region%22%3A%22FL%22%2C%22country%22%3A%22US%22%2C%22metro%22%3A%22LAKE%20BUENA%20VISTA%22%2C%22metroCode%22%3A%22534%22%7D"
        );
    }

    #[test]
    fn ca_preset_carries_locale_cookies() {
        let names: Vec<_> = cookie_preset(Variant::Ca)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(
            names,
            vec![
                "localeCookie_jar_aka",
                "languageSelection_jar_aka",
                "geolocation_aka_jar",
                "GEOLOCATION_jar"
            ]
        );
    }
}
