//! Page identity
//!
//! Two URLs name the same page iff their normalized forms are equal.

use url::Url;

use crate::error::Result;

const KEY_PREFIX: &str = "highlights:";

/// Normalize a page URL.
///
/// Drops the fragment, strips the listed tracking parameters (remaining
/// parameters keep their order) and trims one trailing slash unless the
/// path is the root.
pub fn normalize_url<S: AsRef<str>>(raw: &str, tracking_params: &[S]) -> Result<String> {
    let mut url = Url::parse(raw.trim())?;
    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| !tracking_params.iter().any(|t| t.as_ref() == name.as_ref()))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else if url.query_pairs().count() != kept.len() {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(&path[..path.len() - 1]);
    }

    Ok(url.into())
}

/// Storage key for a normalized page URL
pub fn storage_key(normalized: &str) -> String {
    format!("{KEY_PREFIX}{normalized}")
}
