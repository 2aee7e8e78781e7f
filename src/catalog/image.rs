//! Image reference rendering.

/// How a stored image reference is rendered in a response.
///
/// One policy is chosen per deployment and applied to every color of every
/// product a service returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePolicy {
    /// Prefix non-empty references with a base URL; empty references become null.
    AbsoluteUrl(String),
    /// Return the stored reference unchanged.
    PassThrough,
}

impl ImagePolicy {
    pub fn absolute_url(base_url: impl Into<String>) -> Self {
        ImagePolicy::AbsoluteUrl(base_url.into())
    }

    pub fn resolve(&self, stored: Option<&str>) -> Option<String> {
        match self {
            ImagePolicy::PassThrough => stored.map(str::to_string),
            ImagePolicy::AbsoluteUrl(base_url) => {
                let path = stored.filter(|s| !s.is_empty())?;
                // Avoid `//` when both sides carry the separator.
                let base = if path.starts_with('/') {
                    base_url.trim_end_matches('/')
                } else {
                    base_url.as_str()
                };
                Some(format!("{base}{path}"))
            }
        }
    }
}
