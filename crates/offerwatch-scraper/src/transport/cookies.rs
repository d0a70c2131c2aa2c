//! Per-fetch cookie jar threaded through the manual redirect loop.

use std::collections::BTreeMap;

/// Marker cookie the listing site expects on every first visit.
pub const MARKER_COOKIE: (&str, &str) = ("gp", "1");

/// Name → value cookie store scoped to a single `fetch_page` call.
///
/// Domain, path and expiry attributes are ignored. A jar only lives for the
/// redirect chain of one listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    entries: BTreeMap<String, String>,
}

impl CookieJar {
    /// Builds the initial jar: the marker cookie, then the variant preset.
    /// Preset values override the marker on a name collision.
    #[must_use]
    pub fn seeded(preset: &[(String, String)]) -> Self {
        let mut jar = Self::default();
        jar.set(MARKER_COOKIE.0, MARKER_COOKIE.1);
        for (name, value) in preset {
            jar.set(name, value);
        }
        jar
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.entries.insert(name.to_owned(), value.to_owned());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges one `Set-Cookie` header value.
    ///
    /// Only the leading `name=value` pair is used; attributes after the first
    /// `;` are dropped. Values may themselves contain `=`. Pairs without a
    /// name or without `=` are ignored. Returns whether the jar accepted it.
    pub fn merge_set_cookie(&mut self, header: &str) -> bool {
        let pair = header.split(';').next().unwrap_or_default();
        let Some((name, value)) = pair.split_once('=') else {
            return false;
        };
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.set(name, value.trim());
        true
    }

    /// Value for the outgoing `Cookie` header, or `None` for an empty jar.
    #[must_use]
    pub fn header_value(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        Some(
            self.entries
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Canonical name-sorted view of the jar, used as part of the redirect
    /// visit key.
    #[must_use]
    pub fn state_key(&self) -> String {
        self.entries
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(";")
    }
}
