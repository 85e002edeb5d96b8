use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

use crate::common::errors::EnvError;
use crate::env::{CookieJar, PageLocation};

/// A stored cookie with the scoping a browser tracks for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    #[serde(default)]
    pub value: String,
    /// Domain without a leading dot
    pub domain: String,
    /// Set without a `domain` attribute: only sent to exactly `domain`
    #[serde(default)]
    pub host_only: bool,
    #[serde(default = "root")]
    pub path: String,
    #[serde(default)]
    pub http_only: bool,
}

fn root() -> String {
    "/".to_string()
}

impl Cookie {
    /// Host-only cookie at `/`
    pub fn host(name: &str, value: &str, host: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            domain: host.to_string(),
            host_only: true,
            path: root(),
            http_only: false,
        }
    }

    /// Cookie shared with every subdomain of `domain`
    pub fn domain(name: &str, value: &str, domain: &str) -> Self {
        Self {
            domain: domain.trim_start_matches('.').to_string(),
            host_only: false,
            ..Self::host(name, value, domain)
        }
    }

    pub fn at_path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    fn same_slot(&self, other: &Cookie) -> bool {
        self.name == other.name
            && self.domain == other.domain
            && self.host_only == other.host_only
            && self.path == other.path
    }

    /// Sent along with a request to `host` + `path`
    fn visible_from(&self, host: &str, path: &str) -> bool {
        let domain_ok = if self.host_only {
            host == self.domain
        } else {
            domain_matches(host, &self.domain)
        };
        domain_ok && path_matches(path, &self.path)
    }
}

/// RFC 6265 domain matching
fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain
        || (host.ends_with(domain) && host[..host.len() - domain.len()].ends_with('.'))
}

/// RFC 6265 path matching
fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

/// Directory part of a request path, used when a cookie names no path
fn default_path(pathname: &str) -> String {
    match pathname.rfind('/') {
        Some(0) | None => root(),
        Some(idx) => pathname[..idx].to_string(),
    }
}

/// Cookie jar that applies `document.cookie` writes the way a browser does,
/// scoped to one page location.
#[derive(Debug)]
pub struct MemoryCookieJar {
    location: PageLocation,
    cookies: RefCell<Vec<Cookie>>,
}

impl MemoryCookieJar {
    pub fn new(location: PageLocation) -> Self {
        Self {
            location,
            cookies: RefCell::new(Vec::new()),
        }
    }

    /// Seed a cookie directly, bypassing script restrictions
    pub fn insert(&self, cookie: Cookie) {
        let mut cookies = self.cookies.borrow_mut();
        cookies.retain(|c| !c.same_slot(&cookie));
        cookies.push(cookie);
    }

    /// Every stored cookie, HttpOnly and foreign-domain ones included
    pub fn all(&self) -> Vec<Cookie> {
        self.cookies.borrow().clone()
    }

    fn parse_write(&self, raw: &str) -> Result<(Cookie, bool), EnvError> {
        let mut parts = raw.split(';');
        let pair = parts.next().unwrap_or("").trim();
        let (name, value) = match pair.split_once('=') {
            Some((n, v)) => (n.trim(), v.trim()),
            None => ("", pair),
        };
        if name.is_empty() && value.is_empty() {
            return Err(EnvError::new("document.cookie", "empty cookie string"));
        }

        let host = self.location.hostname.to_ascii_lowercase();
        let mut cookie = Cookie::host(name, value, &host);
        cookie.path = default_path(&self.location.pathname);
        let mut expired = false;

        for attr in parts {
            let (key, val) = match attr.split_once('=') {
                Some((k, v)) => (k.trim().to_ascii_lowercase(), v.trim()),
                None => (attr.trim().to_ascii_lowercase(), ""),
            };
            match key.as_str() {
                "expires" => {
                    if let Ok(when) = DateTime::parse_from_rfc2822(val) {
                        expired |= when.with_timezone(&Utc) <= Utc::now();
                    }
                }
                "max-age" => {
                    if let Ok(secs) = val.parse::<i64>() {
                        expired |= secs <= 0;
                    }
                }
                "path" if val.starts_with('/') => cookie.path = val.to_string(),
                "domain" if !val.is_empty() => {
                    cookie.domain = val.trim_start_matches('.').to_ascii_lowercase();
                    cookie.host_only = false;
                }
                "httponly" => cookie.http_only = true,
                _ => {}
            }
        }
        Ok((cookie, expired))
    }
}

impl CookieJar for MemoryCookieJar {
    fn read_all(&self) -> Result<String, EnvError> {
        let host = self.location.hostname.to_ascii_lowercase();
        let pairs: Vec<String> = self
            .cookies
            .borrow()
            .iter()
            .filter(|c| !c.http_only && c.visible_from(&host, &self.location.pathname))
            .map(|c| {
                if c.name.is_empty() {
                    c.value.clone()
                } else {
                    format!("{}={}", c.name, c.value)
                }
            })
            .collect();
        Ok(pairs.join("; "))
    }

    fn write(&self, raw: &str) -> Result<(), EnvError> {
        let (cookie, expired) = self.parse_write(raw)?;
        let host = self.location.hostname.to_ascii_lowercase();

        // Script cannot create HttpOnly cookies, nor set foreign domains
        if cookie.http_only || !domain_matches(&host, &cookie.domain) {
            return Ok(());
        }

        let mut cookies = self.cookies.borrow_mut();
        if cookies.iter().any(|c| c.http_only && c.same_slot(&cookie)) {
            return Ok(());
        }
        cookies.retain(|c| !c.same_slot(&cookie));
        if !expired {
            cookies.push(cookie);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jar() -> MemoryCookieJar {
        MemoryCookieJar::new(PageLocation::new("a.b.example.com", "/app/index.html"))
    }

    #[test]
    fn test_domain_and_path_matching() {
        assert!(domain_matches("a.b.example.com", "example.com"));
        assert!(!domain_matches("badexample.com", "example.com"));
        assert!(path_matches("/app/index.html", "/app"));
        assert!(path_matches("/app/index.html", "/"));
        assert!(!path_matches("/application", "/app"));
    }

    #[test]
    fn test_write_then_read() {
        let jar = jar();
        jar.write("theme=dark; path=/").unwrap();
        jar.write("lang=en; domain=.example.com; path=/").unwrap();
        assert_eq!(jar.read_all().unwrap(), "theme=dark; lang=en");
    }

    #[test]
    fn test_expiry_needs_matching_scope() {
        let jar = jar();
        jar.insert(Cookie::domain("sid", "1", "example.com"));
        jar.write("sid=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/").unwrap();
        assert_eq!(jar.read_all().unwrap(), "sid=1");
        jar.write("sid=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/; domain=example.com")
            .unwrap();
        assert_eq!(jar.read_all().unwrap(), "");
    }

    #[test]
    fn test_http_only_and_foreign_are_untouchable() {
        let jar = jar();
        jar.insert(Cookie::host("secret", "x", "a.b.example.com").http_only());
        jar.write("secret=; max-age=0; path=/").unwrap();
        jar.write("evil=1; domain=other.org").unwrap();
        assert_eq!(jar.all().len(), 1);
        assert_eq!(jar.read_all().unwrap(), "");
    }

    #[test]
    fn test_default_path_is_directory() {
        let jar = jar();
        jar.write("scoped=1").unwrap();
        assert_eq!(jar.all()[0].path, "/app");
    }
}
