use std::collections::HashSet;

use super::ResponseCookie;

/// Cookies accumulated while a request runs through the chain.
///
/// Insertion order is kept. When the set is written out, every distinct name
/// gets exactly one header carrying the last value pushed for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieSet {
    cookies: Vec<ResponseCookie>,
}

impl CookieSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cookie: ResponseCookie) {
        self.cookies.push(cookie);
    }

    pub fn append(&mut self, other: CookieSet) {
        self.cookies.extend(other.cookies);
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Every pushed cookie, duplicates included.
    pub fn iter(&self) -> impl Iterator<Item = &ResponseCookie> {
        self.cookies.iter()
    }

    /// The cookies to emit: one per name, last value wins, in the order of
    /// each name's final occurrence.
    pub fn effective(&self) -> Vec<&ResponseCookie> {
        let mut seen = HashSet::new();
        let mut out: Vec<&ResponseCookie> = self
            .cookies
            .iter()
            .rev()
            .filter(|c| seen.insert(c.name.as_str()))
            .collect();
        out.reverse();
        out
    }
}

impl Extend<ResponseCookie> for CookieSet {
    fn extend<T: IntoIterator<Item = ResponseCookie>>(&mut self, iter: T) {
        self.cookies.extend(iter);
    }
}

impl FromIterator<ResponseCookie> for CookieSet {
    fn from_iter<T: IntoIterator<Item = ResponseCookie>>(iter: T) -> Self {
        Self {
            cookies: iter.into_iter().collect(),
        }
    }
}
