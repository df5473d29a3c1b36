//! Session cookie jar.
//!
//! The jar maps cookie names to their latest value. Only the `name=value` pair of each
//! `Set-Cookie` header is kept; attributes (`Path`, `HttpOnly`, ...) are ignored.

/// Cookies accumulated over the responses of one session, in first-set order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<(String, String)>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a cookie, replacing the value of a same-named one in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self.cookies.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.cookies.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.cookies.iter().position(|(n, _)| n == name)?;
        Some(self.cookies.remove(index).1)
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cookies.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Merges raw `Set-Cookie` header values. Returns the number of cookies set.
    pub fn merge_set_cookies<'a>(&mut self, headers: impl IntoIterator<Item = &'a str>) -> usize {
        let mut merged = 0;
        for (name, value) in headers.into_iter().filter_map(parse_set_cookie) {
            self.set(name, value);
            merged += 1;
        }
        merged
    }

    /// The `Cookie` request header value (`a=1; b=2`), or `None` when the jar is empty.
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();

        Some(pairs.join("; "))
    }
}

/// Extracts the name and value of a `Set-Cookie` header value.
pub fn parse_set_cookie(header: &str) -> Option<(&str, &str)> {
    let pair = header.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();

    if name.is_empty() {
        return None;
    }

    Some((name, value.trim()))
}
