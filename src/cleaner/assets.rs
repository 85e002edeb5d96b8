use crate::env::{Rect, Viewport};

/// URLs that cannot take a query string without changing what they mean
pub fn is_bustable(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() {
        return false;
    }
    let lower = url.to_ascii_lowercase();
    !["data:", "blob:", "javascript:", "about:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

/// Set `param=stamp` on `url`, replacing any earlier value of `param`
/// and keeping the fragment at the end.
pub fn bust_url(url: &str, param: &str, stamp: i64) -> String {
    let (without_fragment, fragment) = match url.split_once('#') {
        Some((head, frag)) => (head, Some(frag)),
        None => (url, None),
    };
    let (base, query) = match without_fragment.split_once('?') {
        Some((base, query)) => (base, query),
        None => (without_fragment, ""),
    };

    let mut pairs: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            let pair = *pair;
            if pair.is_empty() {
                return false;
            }
            let key = pair.split_once('=').map(|(k, _)| k).unwrap_or(pair);
            key != param
        })
        .collect();
    let stamp_pair = format!("{}={}", param, stamp);
    pairs.push(&stamp_pair);

    let mut busted = format!("{}?{}", base, pairs.join("&"));
    if let Some(fragment) = fragment {
        busted.push('#');
        busted.push_str(fragment);
    }
    busted
}

/// Whether any part of `rect` overlaps the viewport
pub fn in_viewport(rect: &Rect, viewport: &Viewport) -> bool {
    rect.width > 0.0
        && rect.height > 0.0
        && rect.top < viewport.height
        && rect.bottom() > 0.0
        && rect.left < viewport.width
        && rect.right() > 0.0
}

/// `rel` attribute names a stylesheet (`"stylesheet"`, `"alternate stylesheet"`)
pub fn is_stylesheet_rel(rel: &str) -> bool {
    rel.split_ascii_whitespace()
        .any(|token| token.eq_ignore_ascii_case("stylesheet"))
}
