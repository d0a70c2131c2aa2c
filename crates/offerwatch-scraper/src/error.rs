use std::time::Duration;

use thiserror::Error;

/// Failure to obtain a listing page. Fails only the variant being fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fetch of {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("redirect {status} from {url} has no Location header")]
    MissingLocation { status: u16, url: String },

    #[error("redirect loop detected at {url}")]
    RedirectLoop { url: String },

    #[error("exceeded {max_redirects} redirects starting from {url} without landing page")]
    TooManyRedirects { url: String, max_redirects: usize },

    #[error("redirected from {from} to international site {to}; refusing locale hijack")]
    LocaleHijack { from: String, to: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// A raw offer that cannot be given a canonical identity.
#[derive(Debug, Error)]
pub enum CanonicalError {
    #[error("offer link is empty")]
    EmptyLink,

    #[error("offer link \"{link}\" cannot be resolved against {base_url}: {reason}")]
    InvalidLink {
        link: String,
        base_url: String,
        reason: String,
    },
}
