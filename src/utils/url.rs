// src/utils/url.rs

//! URL helpers.

use crate::error::{AppError, Result};

/// Image extensions accepted for upload.
pub const IMAGE_SUFFIXES: &[&str] = &[".jpg", ".jpeg", ".png"];

/// File suffix (with the dot) of the URL's path, restricted to images.
///
/// The query string and fragment are ignored.
///
/// # Examples
/// ```
/// use kidsync::utils::url::url_suffix;
///
/// assert_eq!(
///     url_suffix("https://cdn.example.com/photos/original.jpeg?sig=abc").unwrap(),
///     ".jpeg"
/// );
/// ```
pub fn url_suffix(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url)?;
    let path = parsed.path();

    let (_, ext) = path.rsplit_once('.').ok_or_else(|| {
        AppError::invariant(format!("get extension from url failed: {url}"))
    })?;
    let suffix = format!(".{ext}");

    if !IMAGE_SUFFIXES.contains(&suffix.as_str()) {
        return Err(AppError::invariant(format!(
            "unexpected image extension: {suffix}"
        )));
    }
    Ok(suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_suffix_accepts_images() {
        assert_eq!(url_suffix("https://x.com/a/b.jpg").unwrap(), ".jpg");
        assert_eq!(url_suffix("https://x.com/a/b.png#frag").unwrap(), ".png");
    }

    #[test]
    fn test_url_suffix_ignores_query() {
        assert_eq!(
            url_suffix("https://x.com/a/b.jpg?name=c.gif").unwrap(),
            ".jpg"
        );
    }

    #[test]
    fn test_url_suffix_rejects_other_types() {
        let err = url_suffix("https://x.com/a/b.gif").unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains(".gif"));
    }

    #[test]
    fn test_url_suffix_requires_extension() {
        assert!(url_suffix("https://x.com/a/photo").is_err());
    }

    #[test]
    fn test_url_suffix_rejects_bad_url() {
        assert!(matches!(url_suffix("not a url"), Err(AppError::Url(_))));
    }
}
