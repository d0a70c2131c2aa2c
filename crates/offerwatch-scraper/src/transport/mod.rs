//! HTTP transport for geo-localized listing pages.
//!
//! Redirects are followed by hand rather than by `reqwest`, because every
//! hop has to merge `Set-Cookie` values into the jar before the next
//! request, reject relocations to an unrelated international site, and
//! detect revisits of the same `(url, cookie state)` pair.

mod cookies;
mod profile;

use std::collections::HashSet;
use std::time::Duration;

use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use reqwest::{redirect, Client, Url};

use crate::error::FetchError;

pub use cookies::{CookieJar, MARKER_COOKIE};
pub use profile::BrowserProfile;

pub const DEFAULT_MAX_REDIRECTS: usize = 10;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Hosts that indicate the site bounced the crawl to its international
/// landing page instead of the requested locale.
pub const DEFAULT_HIJACK_HOSTS: &[&str] = &["disneyinternational.com"];

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Budget for the whole fetch, across every hop and the body read.
    pub timeout: Duration,
    pub max_redirects: usize,
    pub profile: BrowserProfile,
    pub hijack_hosts: Vec<String>,
}

impl TransportConfig {
    #[must_use]
    pub fn new(user_agent: &str) -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            profile: BrowserProfile::new(user_agent),
            hijack_hosts: DEFAULT_HIJACK_HOSTS.iter().map(|h| (*h).to_owned()).collect(),
        }
    }

    #[must_use]
    pub fn from_scrape_config(config: &offerwatch_core::ScrapeConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.fetch_timeout_secs),
            max_redirects: config.max_redirects,
            ..Self::new(&config.user_agent)
        }
    }

    fn is_hijack(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.hijack_hosts.iter().any(|h| {
            let h = h.to_ascii_lowercase();
            host == h || host.ends_with(&format!(".{h}"))
        })
    }
}

/// Fetches listing pages with a fresh cookie jar per call.
///
/// Holds no cookie state between calls, so one `Transport` can serve every
/// variant of a run.
pub struct Transport {
    client: Client,
    config: TransportConfig,
}

impl Transport {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: TransportConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(CONNECT_TIMEOUT.min(config.timeout))
            .build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Fetches `url` with `preset` cookies injected, following redirects
    /// manually, and returns the landing page body.
    ///
    /// On timeout the in-flight request future is dropped, which aborts the
    /// pending I/O.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`]: `url` or a `Location` cannot be parsed.
    /// - [`FetchError::RedirectLoop`]: the same URL was revisited with the same cookies.
    /// - [`FetchError::TooManyRedirects`]: more than `max_redirects` hops.
    /// - [`FetchError::LocaleHijack`]: a redirect pointed at a hijack host.
    /// - [`FetchError::MissingLocation`]: a 3xx without `Location`.
    /// - [`FetchError::UnexpectedStatus`]: any non-2xx, non-3xx status.
    /// - [`FetchError::Timeout`]: the overall budget ran out.
    /// - [`FetchError::Http`]: network or TLS failure.
    pub async fn fetch_page(
        &self,
        url: &str,
        preset: &[(String, String)],
    ) -> Result<String, FetchError> {
        let start = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;

        let timeout = self.config.timeout;
        match tokio::time::timeout(timeout, self.follow(start, preset)).await {
            Ok(result) => result,
            Err(_elapsed) => {
                tracing::warn!(url, ?timeout, "fetch timed out");
                Err(FetchError::Timeout {
                    url: url.to_owned(),
                    timeout,
                })
            }
        }
    }

    async fn follow(&self, start: Url, preset: &[(String, String)]) -> Result<String, FetchError> {
        let headers = self.config.profile.headers(&start)?;
        let mut jar = CookieJar::seeded(preset);
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = start.clone();

        for hop in 0..=self.config.max_redirects {
            let visit_key = format!("{current}|{}", jar.state_key());
            if !visited.insert(visit_key) {
                tracing::warn!(url = %current, hop, "redirect loop detected");
                return Err(FetchError::RedirectLoop {
                    url: current.to_string(),
                });
            }

            let mut request = self.client.get(current.clone()).headers(headers.clone());
            if let Some(cookie) = jar.header_value() {
                request = request.header(COOKIE, cookie);
            }

            let response = request.send().await?;
            let status = response.status();

            for value in response.headers().get_all(SET_COOKIE) {
                match value.to_str() {
                    Ok(raw) => {
                        jar.merge_set_cookie(raw);
                    }
                    Err(_) => {
                        tracing::debug!(url = %current, "skipping non-ASCII Set-Cookie header");
                    }
                }
            }

            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| FetchError::MissingLocation {
                        status: status.as_u16(),
                        url: current.to_string(),
                    })?;
                let next = current.join(location).map_err(|e| FetchError::InvalidUrl {
                    url: location.to_owned(),
                    reason: e.to_string(),
                })?;

                if self.config.is_hijack(&next) {
                    tracing::warn!(from = %current, to = %next, "refusing locale-hijack redirect");
                    return Err(FetchError::LocaleHijack {
                        from: current.to_string(),
                        to: next.to_string(),
                    });
                }

                tracing::debug!(
                    hop,
                    status = status.as_u16(),
                    from = %current,
                    to = %next,
                    cookies = jar.len(),
                    "following redirect"
                );
                current = next;
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: current.to_string(),
                });
            }

            tracing::debug!(url = %current, hops = hop, "landed on listing page");
            return Ok(response.text().await?);
        }

        Err(FetchError::TooManyRedirects {
            url: start.to_string(),
            max_redirects: self.config.max_redirects,
        })
    }
}
