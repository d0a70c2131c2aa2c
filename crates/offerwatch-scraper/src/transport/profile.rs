//! Fixed desktop-browser header profile sent on every hop.
//!
//! The listing site varies both content and redirects by client
//! fingerprint, so every request must look like the same real browser.

use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA, REFERER,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use reqwest::Url;

use crate::error::FetchError;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";
const ACCEPT_LANGUAGE_EN_US: &str = "en-US,en;q=0.9";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserProfile {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    /// Fixed referer; `None` uses the origin of the starting URL.
    pub referer: Option<String>,
}

impl BrowserProfile {
    #[must_use]
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_owned(),
            accept: ACCEPT_HTML.to_owned(),
            accept_language: ACCEPT_LANGUAGE_EN_US.to_owned(),
            referer: None,
        }
    }

    /// Builds the header set for a fetch that starts at `start_url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if a profile value is not a legal
    /// header value.
    pub(super) fn headers(&self, start_url: &Url) -> Result<HeaderMap, FetchError> {
        let referer = self.referer.clone().unwrap_or_else(|| {
            format!("{}/", start_url.origin().ascii_serialization())
        });

        let value = |raw: &str| {
            HeaderValue::from_str(raw).map_err(|e| FetchError::InvalidUrl {
                url: start_url.to_string(),
                reason: format!("invalid header value \"{raw}\": {e}"),
            })
        };

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, value(&self.user_agent)?);
        headers.insert(ACCEPT, value(&self.accept)?);
        headers.insert(ACCEPT_LANGUAGE, value(&self.accept_language)?);
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(REFERER, value(&referer)?);
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referer_defaults_to_start_origin() {
        let profile = BrowserProfile::new("test-agent");
        let url = Url::parse("https://disneyworld.disney.go.com/special-offers/").unwrap();
        let headers = profile.headers(&url).unwrap();
        assert_eq!(
            headers.get(REFERER).unwrap(),
            "https://disneyworld.disney.go.com/"
        );
        assert_eq!(headers.get(USER_AGENT).unwrap(), "test-agent");
        assert_eq!(headers.get(PRAGMA).unwrap(), "no-cache");
    }

    #[test]
    fn explicit_referer_wins() {
        let mut profile = BrowserProfile::new("test-agent");
        profile.referer = Some("https://example.com/start".to_string());
        let url = Url::parse("https://other.example.com/").unwrap();
        let headers = profile.headers(&url).unwrap();
        assert_eq!(headers.get(REFERER).unwrap(), "https://example.com/start");
    }

    #[test]
    fn control_characters_in_user_agent_are_rejected() {
        let profile = BrowserProfile::new("bad\nagent");
        let url = Url::parse("https://example.com/").unwrap();
        assert!(matches!(
            profile.headers(&url),
            Err(FetchError::InvalidUrl { .. })
        ));
    }
}
