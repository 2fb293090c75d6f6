use thiserror::Error;
use url::Url;

/// Reasons a news item's source link is not handed to the browser.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OpenUrlError {
    #[error("Item has no source URL")]
    Missing,
    #[error("Invalid URL: {0}")]
    Invalid(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    NoHost,
}

/// Check a backend-supplied link before passing it to `open::that`.
///
/// Only absolute http(s) URLs with a host pass; anything else could launch
/// an arbitrary handler on the user's machine.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, OpenUrlError> {
    let url_str = url_str.trim();
    if url_str.is_empty() {
        return Err(OpenUrlError::Missing);
    }
    let url = Url::parse(url_str)?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(OpenUrlError::UnsupportedScheme(scheme.to_owned())),
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(OpenUrlError::NoHost),
    }
}
