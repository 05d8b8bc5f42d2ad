//! Supported languages
//!
//! The first entry is the auto-detect sentinel: it may be chosen as a source
//! language but never as a target, and it is never the result of matching a
//! detected language.

/// Source-language value meaning "let the provider figure it out"
pub const AUTO_DETECT: &str = "Auto Detect";

/// Every language a project can be configured with, sentinel first
pub const LANGUAGES: &[&str] = &[
    AUTO_DETECT,
    "Indonesian",
    "English",
    "Korean",
    "Japanese",
    "Mandarin",
    "French",
    "German",
    "Spanish",
    "Arabic",
    "Russian",
];

/// Target language used when a project leaves it blank
pub const DEFAULT_TARGET_LANGUAGE: &str = "Indonesian";

/// Whether a source-language value is the auto-detect sentinel
pub fn is_auto_detect(language: &str) -> bool {
    language.trim().eq_ignore_ascii_case(AUTO_DETECT)
}

/// Languages valid as a translation target
pub fn target_languages() -> impl Iterator<Item = &'static str> {
    LANGUAGES.iter().copied().filter(|l| !is_auto_detect(l))
}

/// Match a provider-reported language name against the supported list
///
/// Comparison is case-insensitive on the trimmed name; the sentinel never
/// matches.
pub fn match_supported_language(detected: &str) -> Option<&'static str> {
    let detected = detected.trim();
    target_languages().find(|l| l.eq_ignore_ascii_case(detected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_is_case_insensitive() {
        assert_eq!(match_supported_language("korean"), Some("Korean"));
        assert_eq!(match_supported_language("  JAPANESE "), Some("Japanese"));
    }

    #[test]
    fn test_sentinel_never_matches() {
        assert_eq!(match_supported_language("auto detect"), None);
        assert_eq!(match_supported_language("Klingon"), None);
    }

    #[test]
    fn test_target_languages_exclude_sentinel() {
        assert!(target_languages().all(|l| l != AUTO_DETECT));
        assert_eq!(target_languages().count(), LANGUAGES.len() - 1);
    }
}
