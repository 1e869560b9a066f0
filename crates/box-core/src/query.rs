//! Query-string construction for Box API requests.
//!
//! [`QueryStringBuilder`] accumulates `key=value` pairs in insertion order and
//! percent-encodes values with the narrow substitution table the Box API
//! decodes on its side. The table is not RFC 3986 or
//! `application/x-www-form-urlencoded`: a space becomes `+`, escapes use
//! lowercase hex, and only the characters listed in [`encode`] are touched.
//! Everything else, including `%` and all non-ASCII text, passes through
//! unchanged. Keys are never encoded.

use std::borrow::Cow;
use std::fmt;

use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};

/// Separator used to join the values of a multi-value parameter.
pub const VALUE_SEPARATOR: char = ',';

/// Mutable, chainable accumulator for a URL query string.
///
/// The buffer is either empty or a well-formed `?k1=v1&k2=v2...` string.
/// Appending requires `&mut self`, so a builder is confined to the request
/// that owns it; hand the finished string or URL to other threads instead.
///
/// # Examples
///
/// ```
/// use box_core::QueryStringBuilder;
///
/// let mut query = QueryStringBuilder::new();
/// query.append_param("query", "annual report").append_number("limit", 50);
/// assert_eq!(query.to_string(), "?query=annual+report&limit=50");
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryStringBuilder {
    buffer: String,
}

impl QueryStringBuilder {
    /// Create an empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Continue from a query string obtained elsewhere.
    ///
    /// The fragment is trusted verbatim: it is neither validated nor
    /// re-encoded, and it should already start with `?` when non-empty.
    #[must_use]
    pub fn from_existing(existing: impl Into<String>) -> Self {
        Self {
            buffer: existing.into(),
        }
    }

    /// Append a single parameter, encoding `value`.
    ///
    /// An empty value yields `key=`.
    pub fn append_param(&mut self, key: &str, value: &str) -> &mut Self {
        if key.is_empty() {
            warn!(value, "appending query parameter with an empty key");
        }

        self.buffer
            .push(if self.buffer.is_empty() { '?' } else { '&' });
        self.buffer.push_str(key);
        self.buffer.push('=');
        encode_into(&mut self.buffer, value);
        self
    }

    /// Append a multi-value parameter as one comma-joined, encoded value.
    ///
    /// The values are joined with [`VALUE_SEPARATOR`] before encoding, so a
    /// comma inside an individual value cannot be told apart from the
    /// separator once it reaches the API. Such values are still appended, with
    /// a warning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyValues`] when `values` is empty. The builder is
    /// left unchanged.
    pub fn append_values<S>(&mut self, key: &str, values: &[S]) -> Result<&mut Self>
    where
        S: AsRef<str>,
    {
        if values.is_empty() {
            return Err(Error::EmptyValues(key.to_string()));
        }

        let mut joined = String::new();
        for (index, value) in values.iter().enumerate() {
            let value = value.as_ref();
            if value.contains(VALUE_SEPARATOR) {
                warn!(key, value, "multi-value query parameter element contains a comma");
            }
            if index > 0 {
                joined.push(VALUE_SEPARATOR);
            }
            joined.push_str(value);
        }

        Ok(self.append_param(key, &joined))
    }

    /// Append an integer parameter in plain base-10 form.
    pub fn append_number(&mut self, key: &str, value: impl Into<i64>) -> &mut Self {
        let value: i64 = value.into();
        self.append_param(key, &value.to_string())
    }

    /// The query string built so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Returns true if nothing has been appended or seeded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Produce a copy of `existing` whose query component is this builder's.
    ///
    /// The URL is rebuilt from its parts rather than by searching its text for
    /// the old query, so a path that happens to contain the query text is left
    /// alone. Any prior query is dropped; the fragment is kept. Merging an
    /// empty builder removes the query entirely.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedUrl`] if the combined string does not parse.
    pub fn merge_into_url(&self, existing: &Url) -> Result<Url> {
        let mut base = existing.clone();
        let fragment = base.fragment().map(str::to_owned);
        base.set_fragment(None);
        base.set_query(None);

        let mut merged = String::from(base.as_str());
        merged.push_str(&self.buffer);
        if let Some(fragment) = fragment {
            merged.push('#');
            merged.push_str(&fragment);
        }

        debug!(
            original = %existing,
            merged = %merged,
            "merging query string into URL"
        );

        Url::parse(&merged).map_err(|err| Error::MalformedUrl(format!("`{merged}`: {err}")))
    }
}

impl fmt::Display for QueryStringBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buffer)
    }
}

impl From<QueryStringBuilder> for String {
    fn from(builder: QueryStringBuilder) -> Self {
        builder.buffer
    }
}

/// Encode a query value with the Box substitution table.
///
/// | char | out | char | out | char | out |
/// |------|-----|------|-----|------|-----|
/// | space | `+` | `'` | `%27` | `;` | `%3b` |
/// | `!` | `%21` | `(` | `%28` | `=` | `%3d` |
/// | `"` | `%22` | `)` | `%29` | `?` | `%3f` |
/// | `#` | `%23` | `+` | `%2b` | `@` | `%40` |
/// | `$` | `%24` | `,` | `%2c` | `[` | `%5b` |
/// | `&` | `%26` | `/` | `%2f` | `]` | `%5d` |
/// | `:` | `%3a` | `{` | `%7b` | `}` | `%7d` |
///
/// Returns the input unchanged (borrowed) when nothing needs escaping.
#[must_use]
pub fn encode(value: &str) -> Cow<'_, str> {
    if !value.chars().any(|c| escape(c).is_some()) {
        return Cow::Borrowed(value);
    }

    let mut encoded = String::with_capacity(value.len() + 8);
    encode_into(&mut encoded, value);
    Cow::Owned(encoded)
}

fn encode_into(buffer: &mut String, input: &str) {
    for c in input.chars() {
        match escape(c) {
            Some(escaped) => buffer.push_str(escaped),
            None => buffer.push(c),
        }
    }
}

const fn escape(c: char) -> Option<&'static str> {
    let escaped = match c {
        ' ' => "+",
        '!' => "%21",
        '"' => "%22",
        '#' => "%23",
        '$' => "%24",
        '&' => "%26",
        '\'' => "%27",
        '(' => "%28",
        ')' => "%29",
        '+' => "%2b",
        ',' => "%2c",
        '/' => "%2f",
        ':' => "%3a",
        ';' => "%3b",
        '=' => "%3d",
        '?' => "%3f",
        '@' => "%40",
        '[' => "%5b",
        ']' => "%5d",
        '{' => "%7b",
        '}' => "%7d",
        _ => return None,
    };
    Some(escaped)
}
