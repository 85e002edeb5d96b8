//! Cookie expiry generation.
//!
//! Script can only delete a cookie by overwriting it with the same name,
//! domain and path plus an expiry in the past. The page cannot see a
//! cookie's domain or path, so every plausible combination is written:
//! host-only, each parent domain with and without a leading dot, at `/`
//! and at every ancestor of the current path.

use std::net::IpAddr;

use crate::env::PageLocation;

pub const EXPIRED: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// How a cookie shows up in `document.cookie`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieKey {
    /// `name=value`
    Named(String),
    /// A bare token with no `=`: the cookie has an empty name and this value
    Nameless(String),
}

impl CookieKey {
    /// Leading pair of an expiry write that lands in this cookie's slot
    fn lead(&self) -> String {
        match self {
            CookieKey::Named(name) => format!("{}=", name),
            CookieKey::Nameless(value) => value.clone(),
        }
    }
}

/// Cookie keys from a `document.cookie` string, deduplicated in order
pub fn cookie_keys(raw: &str) -> Vec<CookieKey> {
    let mut keys: Vec<CookieKey> = Vec::new();
    for pair in raw.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let key = match pair.split_once('=') {
            Some((name, value)) if name.trim().is_empty() => {
                let value = value.trim();
                if value.is_empty() {
                    continue;
                }
                CookieKey::Nameless(value.to_string())
            }
            Some((name, _)) => CookieKey::Named(name.trim().to_string()),
            None => CookieKey::Nameless(pair.to_string()),
        };
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// The hostname and each parent domain with at least two labels.
/// `a.b.example.com` gives `a.b.example.com`, `b.example.com`, `example.com`.
pub fn domain_candidates(hostname: &str) -> Vec<String> {
    let host = hostname.trim().trim_end_matches('.');
    if host.is_empty() || host.parse::<IpAddr>().is_ok() || host.starts_with('[') {
        return Vec::new();
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() == 1 {
        return vec![host.to_string()];
    }
    (0..labels.len() - 1)
        .map(|i| labels[i..].join("."))
        .collect()
}

/// `/` followed by every ancestor of `pathname`, with and without a trailing slash
pub fn path_candidates(pathname: &str) -> Vec<String> {
    let mut paths = vec!["/".to_string()];
    let mut current = String::new();
    for segment in pathname.split('/').filter(|s| !s.is_empty()) {
        current.push('/');
        current.push_str(segment);
        for candidate in [current.clone(), format!("{}/", current)] {
            if !paths.contains(&candidate) {
                paths.push(candidate);
            }
        }
    }
    paths
}

/// Every cookie string needed to expire `key` as seen from `location`
pub fn expiry_writes(key: &CookieKey, location: &PageLocation) -> Vec<String> {
    let lead = key.lead();
    let domains = domain_candidates(&location.hostname);
    let mut writes = Vec::new();
    for path in path_candidates(&location.pathname) {
        writes.push(format!("{}; expires={}; path={}", lead, EXPIRED, path));
        for domain in &domains {
            writes.push(format!(
                "{}; expires={}; path={}; domain={}",
                lead, EXPIRED, path, domain
            ));
            writes.push(format!(
                "{}; expires={}; path={}; domain=.{}",
                lead, EXPIRED, path, domain
            ));
        }
    }
    writes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_keys() {
        let named = |n: &str| CookieKey::Named(n.to_string());
        assert_eq!(cookie_keys(""), Vec::<CookieKey>::new());
        assert_eq!(cookie_keys("a=1; b=2;c=3"), vec![named("a"), named("b"), named("c")]);
        assert_eq!(
            cookie_keys("flag; a=x=y; a=2; =v; ="),
            vec![
                CookieKey::Nameless("flag".to_string()),
                named("a"),
                CookieKey::Nameless("v".to_string())
            ]
        );
    }

    #[test]
    fn test_domain_candidates() {
        assert_eq!(
            domain_candidates("a.b.example.com"),
            vec!["a.b.example.com", "b.example.com", "example.com"]
        );
        assert_eq!(domain_candidates("example.com"), vec!["example.com"]);
        assert_eq!(domain_candidates("localhost"), vec!["localhost"]);
        assert!(domain_candidates("192.168.0.1").is_empty());
        assert!(domain_candidates("").is_empty());
    }

    #[test]
    fn test_path_candidates() {
        assert_eq!(path_candidates("/"), vec!["/"]);
        assert_eq!(
            path_candidates("/app/index.html"),
            vec!["/", "/app", "/app/", "/app/index.html", "/app/index.html/"]
        );
    }

    #[test]
    fn test_expiry_writes_cover_dotted_and_bare_domains() {
        let location = PageLocation::new("a.example.com", "/");
        let writes = expiry_writes(&CookieKey::Named("sid".to_string()), &location);
        assert_eq!(writes.len(), 5);
        assert!(writes.contains(&format!("sid=; expires={}; path=/", EXPIRED)));
        assert!(writes.contains(&format!("sid=; expires={}; path=/; domain=.example.com", EXPIRED)));
        assert!(writes.contains(&format!("sid=; expires={}; path=/; domain=a.example.com", EXPIRED)));
    }

    #[test]
    fn test_nameless_expiry_has_no_equals_sign() {
        let location = PageLocation::new("localhost", "/");
        let writes = expiry_writes(&CookieKey::Nameless("flag".to_string()), &location);
        assert_eq!(writes[0], format!("flag; expires={}; path=/", EXPIRED));
    }
}
