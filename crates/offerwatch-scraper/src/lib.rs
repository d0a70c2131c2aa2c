pub mod canonical;
pub mod error;
pub mod extract;
pub mod transport;

pub use canonical::{canonicalize, canonicalize_link, canonicalize_offers, fingerprint};
pub use error::{CanonicalError, FetchError};
pub use extract::extract_offers;
pub use transport::{BrowserProfile, CookieJar, Transport, TransportConfig};
