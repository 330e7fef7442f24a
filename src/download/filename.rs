//! Filename derivation for downloaded artifacts.
//!
//! Artifact files are named after the item title. Titles go through
//! [`sanitize_filename`] and get the extension of the artifact URL.

use url::Url;

use super::constants::FALLBACK_EXTENSION;

/// Characters that are reserved on at least one common filesystem.
const RESERVED_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Replaces every reserved filesystem character with `_`.
///
/// The mapping is one character for one character: nothing is trimmed,
/// collapsed or truncated, and an empty title stays empty. Applying it twice
/// gives the same result as applying it once.
///
/// # Example
///
/// ```
/// use harvester_core::sanitize_filename;
///
/// assert_eq!(sanitize_filename("A/B: C?"), "A_B_ C_");
/// ```
#[must_use]
pub fn sanitize_filename(raw: &str) -> String {
    raw.chars()
        .map(|ch| if RESERVED_CHARS.contains(&ch) { '_' } else { ch })
        .collect()
}

/// Returns the lowercased extension (with leading dot) of the URL's last path segment.
pub(crate) fn extension_from_url(url: &Url) -> Option<String> {
    let last_segment = url.path_segments()?.next_back()?;
    let dot_index = last_segment.rfind('.')?;
    let ext = &last_segment[dot_index..];
    if ext.len() <= 1 || ext.len() > 12 {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Returns the last path segment of the URL without its extension.
pub(crate) fn stem_from_url(url: &Url) -> Option<String> {
    let last_segment = url.path_segments()?.next_back()?;
    let stem = last_segment
        .rfind('.')
        .map_or(last_segment, |dot| &last_segment[..dot]);
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Builds `<sanitized title><ext>` for an artifact.
///
/// When the title is missing or blank the artifact URL's file stem is used
/// instead, so two untitled items still get distinct names.
#[must_use]
pub fn artifact_filename(title: Option<&str>, artifact_url: &Url) -> String {
    let extension =
        extension_from_url(artifact_url).unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
    let stem = title
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
        .or_else(|| stem_from_url(artifact_url))
        .unwrap_or_else(|| "artifact".to_string());
    format!("{}{extension}", sanitize_filename(&stem))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn samples() -> Vec<&'static str> {
        vec![
            "",
            "   ",
            "Plain Title",
            "Attention Is All You Need",
            r#"a\b/c:d*e?f"g<h>i|j"#,
            "___",
            "::::",
            "Résumé: naïve / 日本語 <test>",
            "trailing?",
            "tab\tand\nnewline",
        ]
    }

    #[test]
    fn test_sanitize_replaces_every_reserved_char() {
        assert_eq!(sanitize_filename(r#"\/:*?"<>|"#), "_________");
    }

    #[test]
    fn test_sanitize_output_has_no_reserved_chars() {
        for sample in samples() {
            let sanitized = sanitize_filename(sample);
            assert!(
                !sanitized.chars().any(|c| RESERVED_CHARS.contains(&c)),
                "reserved char left in {sanitized:?} (from {sample:?})"
            );
        }
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for sample in samples() {
            let once = sanitize_filename(sample);
            assert_eq!(sanitize_filename(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_sanitize_preserves_length_and_whitespace() {
        assert_eq!(sanitize_filename(""), "");
        assert_eq!(sanitize_filename("   "), "   ");
        assert_eq!(sanitize_filename("a::b"), "a__b");
        let unicode = "Résumé: 日本語";
        assert_eq!(
            sanitize_filename(unicode).chars().count(),
            unicode.chars().count()
        );
    }

    #[test]
    fn test_extension_from_url_lowercases() {
        let url = Url::parse("https://example.com/files/Paper-Conference.PDF").unwrap();
        assert_eq!(extension_from_url(&url).as_deref(), Some(".pdf"));
    }

    #[test]
    fn test_extension_from_url_missing() {
        let url = Url::parse("https://example.com/download/12345").unwrap();
        assert_eq!(extension_from_url(&url), None);
    }

    #[test]
    fn test_artifact_filename_uses_title() {
        let url = Url::parse("https://example.com/file/abc-Paper-Conference.pdf").unwrap();
        assert_eq!(
            artifact_filename(Some("Deep Nets: A Survey"), &url),
            "Deep Nets_ A Survey.pdf"
        );
    }

    #[test]
    fn test_artifact_filename_falls_back_to_url_stem() {
        let url = Url::parse("https://example.com/file/abc-Paper-Conference.pdf").unwrap();
        assert_eq!(artifact_filename(None, &url), "abc-Paper-Conference.pdf");
        assert_eq!(artifact_filename(Some("  "), &url), "abc-Paper-Conference.pdf");
    }

    #[test]
    fn test_artifact_filename_without_extension_uses_fallback() {
        let url = Url::parse("https://example.com/download/12345").unwrap();
        assert_eq!(artifact_filename(Some("Title"), &url), "Title.bin");
    }
}
