//! Ordered headers

use crate::utils::stable_sort_by_first;

use hyper::HeaderMap;

/// Immutable http header container
#[derive(Debug, Default)]
pub struct OrderedHeaders<'a> {
    /// Ascending headers (header names are lowercase)
    headers: Vec<(&'a str, &'a str)>,
}

impl<'a> OrderedHeaders<'a> {
    /// Constructs [`OrderedHeaders`] from slice
    ///
    /// + header names must be lowercase
    /// + header values must be valid
    #[cfg(test)]
    #[must_use]
    pub fn from_slice_unchecked(slice: &[(&'a str, &'a str)]) -> Self {
        for (name, _) in slice {
            let is_valid = |c: u8| c == b'-' || c.is_ascii_lowercase() || c.is_ascii_digit();
            assert!(name.as_bytes().iter().copied().all(is_valid));
        }
        let mut headers = slice.to_vec();
        stable_sort_by_first(&mut headers);
        Self { headers }
    }

    /// Constructs [`OrderedHeaders`] from a header map
    ///
    /// # Errors
    /// Returns [`std::str::Utf8Error`] if a header value is not valid UTF-8
    pub fn from_headers(map: &'a HeaderMap) -> Result<Self, std::str::Utf8Error> {
        let mut headers = Vec::with_capacity(map.len());
        for (name, value) in map {
            let value = std::str::from_utf8(value.as_bytes())?;
            headers.push((name.as_str(), value));
        }
        stable_sort_by_first(&mut headers);
        Ok(Self { headers })
    }

    /// The run of pairs named `name`
    fn run(&self, name: &str) -> &[(&'a str, &'a str)] {
        let start = self.headers.partition_point(|&(n, _)| n < name);
        let len = self.headers[start..].iter().take_while(|&&(n, _)| n == name).count();
        &self.headers[start..start + len]
    }

    /// Gets all values of a header, in the order they were received.
    pub fn get_all(&self, name: impl AsRef<str>) -> impl Iterator<Item = &'a str> + '_ {
        self.run(name.as_ref()).iter().map(|&(_, v)| v)
    }

    /// Gets header value by name. Time `O(logn)`
    ///
    /// Returns `None` if the header is absent or repeated.
    pub fn get_unique(&self, name: impl AsRef<str>) -> Option<&'a str> {
        match self.run(name.as_ref()) {
            [(_, v)] => Some(*v),
            _ => None,
        }
    }

    pub fn contains(&self, name: impl AsRef<str>) -> bool {
        !self.run(name.as_ref()).is_empty()
    }

    /// Selects the headers named in `names`. A name the request lacks is
    /// looked up with `fallback` instead. Time `O(mlogn)`
    #[must_use]
    pub fn find_multiple_with_on_missing(&self, names: &[&'a str], fallback: impl Fn(&'a str) -> Option<&'a str>) -> Self {
        let mut headers = Vec::with_capacity(names.len());
        for &name in names {
            match self.run(name) {
                [] => headers.extend(fallback(name).map(|v| (name, v))),
                found => headers.extend_from_slice(found),
            }
        }
        stable_sort_by_first(&mut headers);
        Self { headers }
    }

    /// Returns an iterator over (name, value) pairs
    pub fn iter_pairs(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        self.headers.iter().copied()
    }
}

impl<'a> AsRef<[(&'a str, &'a str)]> for OrderedHeaders<'a> {
    fn as_ref(&self) -> &[(&'a str, &'a str)] {
        self.headers.as_ref()
    }
}
