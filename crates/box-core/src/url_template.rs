//! Resource path templates.
//!
//! API resources are addressed by short templates such as
//! `metadata_templates/%s/%s/schema`, joined onto the connection's base URL.

use url::Url;

use crate::error::{Error, Result};
use crate::query::QueryStringBuilder;

const PLACEHOLDER: &str = "%s";

/// A relative resource path with `%s` placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlTemplate {
    template: &'static str,
}

impl UrlTemplate {
    /// Create a template. Placeholders are filled in order.
    #[must_use]
    pub const fn new(template: &'static str) -> Self {
        Self { template }
    }

    /// The raw template text.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.template
    }

    /// Number of `%s` placeholders in the template.
    #[must_use]
    pub fn placeholders(&self) -> usize {
        self.template.matches(PLACEHOLDER).count()
    }

    /// Substitute `values` into the template.
    ///
    /// Each value must be a single, non-empty path segment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the number of values does not
    /// match the placeholders, or a value is not a single path segment: empty,
    /// a dot-segment (`.`, `..`, or either spelled with `%2e`), or containing
    /// `/`, `\\`, `?` or `#`.
    pub fn expand(&self, values: &[&str]) -> Result<String> {
        let expected = self.placeholders();
        if values.len() != expected {
            return Err(Error::InvalidEndpoint(format!(
                "template `{}` takes {expected} value(s), got {}",
                self.template,
                values.len()
            )));
        }

        let mut pieces = self.template.split(PLACEHOLDER);
        let mut path = String::from(pieces.next().unwrap_or_default());
        for (value, piece) in values.iter().zip(pieces) {
            if !is_path_segment(value) {
                return Err(Error::InvalidEndpoint(format!(
                    "`{value}` is not a valid path segment for `{}`",
                    self.template
                )));
            }
            path.push_str(value);
            path.push_str(piece);
        }

        Ok(path)
    }

    /// Expand the template and join it onto `base`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] for bad values and
    /// [`Error::MalformedUrl`] if the joined URL does not parse.
    pub fn build(&self, base: &Url, values: &[&str]) -> Result<Url> {
        let path = self.expand(values)?;
        base.join(&path)
            .map_err(|err| Error::MalformedUrl(format!("joining `{path}` onto `{base}`: {err}")))
    }

    /// Expand the template, join it onto `base` and merge `query` into it.
    ///
    /// # Errors
    ///
    /// Same as [`UrlTemplate::build`] and [`QueryStringBuilder::merge_into_url`].
    pub fn build_with_query(
        &self,
        base: &Url,
        query: &QueryStringBuilder,
        values: &[&str],
    ) -> Result<Url> {
        let url = self.build(base, values)?;
        query.merge_into_url(&url)
    }
}

fn is_path_segment(value: &str) -> bool {
    if value.is_empty() || value.contains(['/', '\\', '?', '#']) {
        return false;
    }

    // `Url::join` resolves dot-segments, including percent-encoded dots
    let decoded = value.to_ascii_lowercase().replace("%2e", ".");
    decoded != "." && decoded != ".."
}
