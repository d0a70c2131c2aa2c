//! Canonical identity and content fingerprint for extracted offers.

use std::collections::HashSet;

use offerwatch_core::{CanonicalOffer, FingerprintedOffer, RawOffer, Source, Variant};
use reqwest::Url;
use sha2::{Digest, Sha256};

use crate::error::CanonicalError;

/// Query keys dropped from links, compared case-insensitively.
const TRACKING_KEYS: &[&str] = &["cmp", "mcid", "icid", "cid", "clk", "mkwid", "ef_id", "affid"];

/// Key prefixes dropped from links, compared case-insensitively.
const TRACKING_PREFIXES: &[&str] = &["utm_"];

fn is_tracking_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    TRACKING_KEYS.contains(&key.as_str()) || TRACKING_PREFIXES.iter().any(|p| key.starts_with(p))
}

/// Collapses whitespace runs to one space and trims both ends.
pub(crate) fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves `raw` against `base_url` and normalizes it into the canonical
/// link form.
///
/// Trailing slashes on a non-root path are all removed, which keeps the
/// result a fixed point under repeated application.
///
/// # Errors
///
/// - [`CanonicalError::EmptyLink`] if `raw` is blank.
/// - [`CanonicalError::InvalidLink`] if `base_url` or the joined link does
///   not parse.
pub fn canonicalize_link(raw: &str, base_url: &str) -> Result<String, CanonicalError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CanonicalError::EmptyLink);
    }

    let invalid = |reason: String| CanonicalError::InvalidLink {
        link: raw.to_owned(),
        base_url: base_url.to_owned(),
        reason,
    };
    let base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    let mut url = base.join(raw).map_err(|e| invalid(e.to_string()))?;

    url.set_fragment(None);

    // `Url` lower-cases hosts of special schemes while parsing; opaque hosts
    // keep their spelling, so fold them here as well.
    if let Some(host) = url.host_str() {
        if host.bytes().any(|b| b.is_ascii_uppercase()) {
            let lowered = host.to_ascii_lowercase();
            url.set_host(Some(&lowered))
                .map_err(|e| invalid(e.to_string()))?;
        }
    }

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_key(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    params.sort_by(|a, b| a.0.cmp(&b.0));

    if params.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(&params);
    }

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = match path.trim_end_matches('/') {
            "" => "/".to_owned(),
            rest => rest.to_owned(),
        };
        url.set_path(&trimmed);
    }

    Ok(url.to_string())
}

/// Maps one raw offer into canonical form for `(source, variant)`.
///
/// A category that is blank after whitespace normalization becomes `None`.
///
/// # Errors
///
/// Propagates [`canonicalize_link`] failures.
pub fn canonicalize(
    raw: &RawOffer,
    source: Source,
    variant: Variant,
    base_url: &str,
) -> Result<CanonicalOffer, CanonicalError> {
    let link = canonicalize_link(&raw.link, base_url)?;
    let category = raw
        .category
        .as_deref()
        .map(normalize_whitespace)
        .filter(|c| !c.is_empty());

    Ok(CanonicalOffer {
        source,
        variant,
        title: normalize_whitespace(&raw.title),
        text: normalize_whitespace(&raw.text),
        link,
        category,
    })
}

/// Hex SHA-256 over the field tuple `[source, variant, title, text, link,
/// category]`, serialized as a JSON array so that field boundaries and an
/// absent category are unambiguous.
#[must_use]
pub fn fingerprint(offer: &CanonicalOffer) -> String {
    let tuple = serde_json::json!([
        offer.source.as_str(),
        offer.variant.as_str(),
        offer.title,
        offer.text,
        offer.link,
        offer.category,
    ]);
    format!("{:x}", Sha256::digest(tuple.to_string().as_bytes()))
}

/// Canonicalizes, fingerprints, and deduplicates one variant's raw offers.
///
/// Offers with a blank link are dropped silently; offers whose link cannot
/// be resolved are dropped with a warning. Among offers sharing a
/// `(variant, link)` key the first one wins and input order is preserved.
#[must_use]
pub fn canonicalize_offers(
    source: Source,
    variant: Variant,
    base_url: &str,
    raws: &[RawOffer],
) -> Vec<FingerprintedOffer> {
    let mut seen: HashSet<(Variant, String)> = HashSet::new();
    let mut out = Vec::with_capacity(raws.len());

    for raw in raws {
        let offer = match canonicalize(raw, source, variant, base_url) {
            Ok(offer) => offer,
            Err(CanonicalError::EmptyLink) => continue,
            Err(e) => {
                tracing::warn!(%variant, link = %raw.link, error = %e, "dropping offer with unusable link");
                continue;
            }
        };

        if !seen.insert((offer.variant, offer.link.clone())) {
            tracing::debug!(%variant, link = %offer.link, "dropping duplicate offer");
            continue;
        }

        let hash = fingerprint(&offer);
        out.push(FingerprintedOffer { offer, hash });
    }

    out
}

#[cfg(test)]
#[path = "canonical_test.rs"]
mod tests;
