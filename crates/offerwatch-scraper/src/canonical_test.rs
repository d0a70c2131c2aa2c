use super::*;

const BASE: &str = "https://disneyworld.disney.go.com/special-offers/";

fn raw(title: &str, text: &str, link: &str, category: Option<&str>) -> RawOffer {
    RawOffer {
        title: title.to_string(),
        text: text.to_string(),
        link: link.to_string(),
        category: category.map(str::to_string),
    }
}

#[test]
fn strips_tracking_sorts_params_and_drops_fragment() {
    let link = canonicalize_link("https://Example.com/a/?utm_source=x&b=2&a=1#frag", BASE).unwrap();
    assert_eq!(link, "https://example.com/a?a=1&b=2");
}

#[test]
fn tracking_keys_match_case_insensitively() {
    let link = canonicalize_link(
        "https://example.com/deal?CMP=abc&Utm_Medium=email&ICID=1&ef_id=9&keep=yes",
        BASE,
    )
    .unwrap();
    assert_eq!(link, "https://example.com/deal?keep=yes");
}

#[test]
fn query_is_removed_when_only_tracking_remains() {
    let link = canonicalize_link("https://example.com/deal?mcid=1&affid=2", BASE).unwrap();
    assert_eq!(link, "https://example.com/deal");
}

#[test]
fn sort_is_stable_for_repeated_keys() {
    let link = canonicalize_link("https://example.com/x?b=1&a=2&b=0", BASE).unwrap();
    assert_eq!(link, "https://example.com/x?a=2&b=1&b=0");
}

#[test]
fn root_path_keeps_its_slash() {
    let link = canonicalize_link("https://Example.com/", BASE).unwrap();
    assert_eq!(link, "https://example.com/");
    let link = canonicalize_link("https://example.com/?utm_campaign=z", BASE).unwrap();
    assert_eq!(link, "https://example.com/");
}

#[test]
fn relative_links_resolve_against_base() {
    let link = canonicalize_link("room-deal/?cid=5", BASE).unwrap();
    assert_eq!(
        link,
        "https://disneyworld.disney.go.com/special-offers/room-deal"
    );
}

#[test]
fn blank_link_is_rejected() {
    assert!(matches!(
        canonicalize_link("   ", BASE),
        Err(CanonicalError::EmptyLink)
    ));
}

#[test]
fn invalid_base_is_rejected() {
    assert!(matches!(
        canonicalize_link("/relative", "nope"),
        Err(CanonicalError::InvalidLink { .. })
    ));
}

#[test]
fn link_canonicalization_is_idempotent() {
    for input in [
        "https://Example.com/a/?utm_source=x&b=2&a=1#frag",
        "https://example.com/path//?q=hello+world&z=%2F",
        "/special-offers/dining/?clk=1",
        "https://example.com/",
    ] {
        let once = canonicalize_link(input, BASE).unwrap();
        let twice = canonicalize_link(&once, BASE).unwrap();
        assert_eq!(once, twice, "not a fixed point for {input}");
    }
}

#[test]
fn whitespace_is_collapsed_and_trimmed() {
    assert_eq!(normalize_whitespace("  Save\n\t up   to 25% "), "Save up to 25%");
    assert_eq!(normalize_whitespace(" \n "), "");
}

#[test]
fn canonicalize_normalizes_every_text_field() {
    let offer = canonicalize(
        &raw("  Room\n Offer ", "Save  big", "/a/", Some("  Rooms  ")),
        Source::Us,
        Variant::UsFlorida,
        BASE,
    )
    .unwrap();
    assert_eq!(offer.title, "Room Offer");
    assert_eq!(offer.text, "Save big");
    assert_eq!(offer.category.as_deref(), Some("Rooms"));
    assert_eq!(offer.link, "https://disneyworld.disney.go.com/a");
    assert_eq!(offer.source, Source::Us);
    assert_eq!(offer.variant, Variant::UsFlorida);

    let again = canonicalize(
        &raw(&offer.title, &offer.text, &offer.link, offer.category.as_deref()),
        Source::Us,
        Variant::UsFlorida,
        BASE,
    )
    .unwrap();
    assert_eq!(again, offer);
}

#[test]
fn blank_category_becomes_none() {
    let offer = canonicalize(&raw("t", "x", "/a", Some(" \t ")), Source::Ca, Variant::Ca, BASE).unwrap();
    assert!(offer.category.is_none());
}

#[test]
fn fingerprint_is_hex_sha256_and_deterministic() {
    let offer = canonicalize(&raw("t", "x", "/a", None), Source::Us, Variant::Us, BASE).unwrap();
    let hash = fingerprint(&offer);
    assert_eq!(hash.len(), 64);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(hash, fingerprint(&offer.clone()));
}

#[test]
fn fingerprint_changes_with_category_only() {
    let base = canonicalize(&raw("t", "x", "/a", None), Source::Us, Variant::Us, BASE).unwrap();
    let mut with_category = base.clone();
    with_category.category = Some("Rooms".to_string());
    assert_ne!(fingerprint(&base), fingerprint(&with_category));
}

#[test]
fn fingerprint_distinguishes_variant() {
    let us = canonicalize(&raw("t", "x", "/a", None), Source::Us, Variant::Us, BASE).unwrap();
    let fl = canonicalize(&raw("t", "x", "/a", None), Source::Us, Variant::UsFlorida, BASE).unwrap();
    assert_ne!(fingerprint(&us), fingerprint(&fl));
}

#[test]
fn fingerprint_ignores_cosmetic_whitespace() {
    let a = canonicalize(&raw("Save 20%", "On rooms", "/a", None), Source::Us, Variant::Us, BASE).unwrap();
    let b = canonicalize(
        &raw("  Save   20%\n", "On\trooms ", "/a/", None),
        Source::Us,
        Variant::Us,
        BASE,
    )
    .unwrap();
    assert_eq!(fingerprint(&a), fingerprint(&b));
}

#[test]
fn fingerprint_does_not_confuse_shifted_field_boundaries() {
    let a = CanonicalOffer {
        source: Source::Us,
        variant: Variant::Us,
        title: "ab".to_string(),
        text: "c".to_string(),
        link: "https://example.com/".to_string(),
        category: None,
    };
    let b = CanonicalOffer {
        title: "a".to_string(),
        text: "bc".to_string(),
        ..a.clone()
    };
    assert_ne!(fingerprint(&a), fingerprint(&b));
}

#[test]
fn duplicate_links_keep_first_occurrence() {
    let raws = vec![
        raw("First", "one", "https://example.com/deal", None),
        raw("Second", "two", "https://example.com/other", None),
        raw("Third", "three", "https://example.com/deal", None),
    ];
    let offers = canonicalize_offers(Source::Us, Variant::Us, BASE, &raws);
    let titles: Vec<_> = offers.iter().map(|o| o.offer.title.as_str()).collect();
    assert_eq!(titles, vec!["First", "Second"]);
}

#[test]
fn tracking_param_and_trailing_slash_variants_collapse_to_one() {
    let raws = vec![
        raw("Deal", "Save", "https://example.com/deal?utm_source=newsletter", None),
        raw("Deal", "Save", "https://example.com/deal/", None),
    ];
    let offers = canonicalize_offers(Source::Us, Variant::Us, BASE, &raws);
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].offer.link, "https://example.com/deal");
    assert_eq!(offers[0].hash, fingerprint(&offers[0].offer));
}

#[test]
fn blank_links_are_excluded_before_dedup() {
    let raws = vec![
        raw("No link", "x", "", None),
        raw("Has link", "y", "https://example.com/a", None),
    ];
    let offers = canonicalize_offers(Source::Ca, Variant::Ca, BASE, &raws);
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].offer.title, "Has link");
}
