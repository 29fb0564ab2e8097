//! URL canonicalization for deduplication.
//!
//! Normalization produces the identity key used by the visited set and
//! the worklist diff: two URLs name the same resource iff their
//! normalized forms are byte-equal. The display form shown to users is
//! kept separately and never altered.

use url::Url;

/// Canonicalize a URL string for equality testing.
///
/// Strips trailing path separators unless the path is the root, leaves
/// the query string and fragment untouched and appended in their
/// original order. Idempotent: `normalize(normalize(u)) == normalize(u)`.
///
/// Fails closed: input that cannot be parsed as an absolute URL is
/// returned unchanged and acts as its own unique identity.
pub fn normalize(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if parsed.cannot_be_a_base() {
        return url.to_string();
    }

    let mut path = parsed.path().to_string();
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }

    let mut normalized = format!("{}://{}{}", parsed.scheme(), parsed.authority(), path);
    if let Some(query) = parsed.query() {
        normalized.push('?');
        normalized.push_str(query);
    }
    if let Some(fragment) = parsed.fragment() {
        normalized.push('#');
        normalized.push_str(fragment);
    }

    normalized
}

/// Lowercased host of a URL, if it parses.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

/// True when both URLs share the same host.
pub fn same_domain(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(ha), Some(hb)) => ha.eq_ignore_ascii_case(hb),
        _ => false,
    }
}
