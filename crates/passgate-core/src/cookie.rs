//! Cookie header parsing and `Set-Cookie` rendering.

use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue};

/// Default cookie lifetime (10 years).
pub const DEFAULT_COOKIE_MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 10);

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Attributes applied to the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    /// Hide the cookie from client-side scripts.
    pub http_only: bool,
    /// Only send the cookie over HTTPS.
    pub secure: bool,
    /// Cookie lifetime.
    pub max_age: Duration,
    /// Cookie path.
    pub path: String,
    /// `SameSite` policy (omitted when `None`).
    pub same_site: Option<SameSite>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: false,
            max_age: DEFAULT_COOKIE_MAX_AGE,
            path: "/".to_string(),
            same_site: Some(SameSite::Lax),
        }
    }
}

impl CookieOptions {
    /// Set the `Secure` flag.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set the `HttpOnly` flag.
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set the cookie lifetime.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Set the cookie path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the `SameSite` policy.
    pub fn with_same_site(mut self, same_site: Option<SameSite>) -> Self {
        self.same_site = same_site;
        self
    }
}

/// A pending change to a response cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieChange {
    /// Set `name` to `value`.
    Set {
        name: String,
        value: String,
        options: CookieOptions,
    },
    /// Expire `name` on the client.
    Clear { name: String, options: CookieOptions },
}

impl CookieChange {
    /// Name of the cookie this change targets.
    pub fn name(&self) -> &str {
        match self {
            CookieChange::Set { name, .. } | CookieChange::Clear { name, .. } => name,
        }
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        match self {
            CookieChange::Set {
                name,
                value,
                options,
            } => render(name, value, options, options.max_age.as_secs(), None),
            CookieChange::Clear { name, options } => render(
                name,
                "",
                options,
                0,
                Some("Thu, 01 Jan 1970 00:00:00 GMT"),
            ),
        }
    }
}

fn render(
    name: &str,
    value: &str,
    options: &CookieOptions,
    max_age: u64,
    expires: Option<&str>,
) -> String {
    let mut cookie = format!("{name}={value}; Max-Age={max_age}; Path={}", options.path);
    if let Some(expires) = expires {
        cookie.push_str("; Expires=");
        cookie.push_str(expires);
    }
    if options.http_only {
        cookie.push_str("; HttpOnly");
    }
    if options.secure {
        cookie.push_str("; Secure");
    }
    if let Some(same_site) = options.same_site {
        cookie.push_str("; SameSite=");
        cookie.push_str(same_site.as_str());
    }
    cookie
}

/// Find the value of cookie `name` in the request's `Cookie` headers.
///
/// Empty values are treated as absent.
pub fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            if key.trim() != name {
                return None;
            }
            let val = val.trim().trim_matches('"');
            (!val.is_empty()).then(|| val.to_string())
        })
}

/// Append each change as a `Set-Cookie` header.
pub fn append_set_cookies(headers: &mut HeaderMap, changes: &[CookieChange]) {
    for change in changes {
        match HeaderValue::from_str(&change.to_header_value()) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(err) => {
                tracing::warn!(cookie = change.name(), error = %err, "dropping unrenderable cookie");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_find_cookie() {
        let headers = headers_with_cookie("theme=dark; __session=abc.def.ghi; lang=en");
        assert_eq!(
            find_cookie(&headers, "__session"),
            Some("abc.def.ghi".to_string())
        );
        assert_eq!(find_cookie(&headers, "lang"), Some("en".to_string()));
        assert_eq!(find_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_find_cookie_ignores_empty_and_missing_header() {
        assert_eq!(find_cookie(&HeaderMap::new(), "__session"), None);
        let headers = headers_with_cookie("__session=; other=1");
        assert_eq!(find_cookie(&headers, "__session"), None);
    }

    #[test]
    fn test_render_set_cookie() {
        let change = CookieChange::Set {
            name: "__session".into(),
            value: "token".into(),
            options: CookieOptions::default()
                .with_secure(true)
                .with_max_age(Duration::from_secs(3600)),
        };
        assert_eq!(
            change.to_header_value(),
            "__session=token; Max-Age=3600; Path=/; HttpOnly; Secure; SameSite=Lax"
        );
    }

    #[test]
    fn test_render_clear_cookie() {
        let change = CookieChange::Clear {
            name: "__session".into(),
            options: CookieOptions::default().with_same_site(None),
        };
        let value = change.to_header_value();
        assert!(value.starts_with("__session=; Max-Age=0; Path=/"));
        assert!(value.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
        assert!(value.contains("HttpOnly"));
        assert!(!value.contains("SameSite"));
    }
}
