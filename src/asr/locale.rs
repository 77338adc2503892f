/// Recognition locales for the supported two-letter language tags. The
/// Indian languages need the regional suffix for the speech API to pick the
/// right model; the rest pass through unchanged.
const LOCALE_MAP: &[(&str, &str)] = &[
    ("en", "en"),
    ("es", "es"),
    ("fr", "fr"),
    ("de", "de"),
    ("it", "it"),
    ("pt", "pt"),
    ("hi", "hi-IN"),
    ("kn", "kn-IN"),
    ("te", "te-IN"),
    ("ta", "ta-IN"),
    ("ml", "ml-IN"),
    ("gu", "gu-IN"),
    ("bn", "bn-IN"),
    ("mr", "mr-IN"),
    ("pa", "pa-IN"),
];

const FALLBACK_LOCALE: &str = "en";

/// Map a source language tag to its recognition locale, falling back to
/// English for anything unsupported.
pub fn recognition_locale(src_lang: &str) -> &'static str {
    LOCALE_MAP
        .iter()
        .find(|(lang, _)| *lang == src_lang)
        .map(|(_, locale)| *locale)
        .unwrap_or(FALLBACK_LOCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indian_languages_get_regional_suffix() {
        assert_eq!(recognition_locale("kn"), "kn-IN");
        assert_eq!(recognition_locale("hi"), "hi-IN");
        assert_eq!(recognition_locale("pa"), "pa-IN");
    }

    #[test]
    fn european_languages_pass_through() {
        assert_eq!(recognition_locale("es"), "es");
        assert_eq!(recognition_locale("en"), "en");
    }

    #[test]
    fn unsupported_language_falls_back_to_english() {
        assert_eq!(recognition_locale("xx"), "en");
        assert_eq!(recognition_locale(""), "en");
        assert_eq!(recognition_locale("EN"), "en");
    }

    #[test]
    fn table_covers_the_whole_whitelist() {
        let indian = ["hi", "kn", "te", "ta", "ml", "gu", "bn", "mr", "pa"];
        let european = ["en", "es", "fr", "de", "it", "pt"];

        assert_eq!(LOCALE_MAP.len(), indian.len() + european.len());
        for lang in indian {
            assert_eq!(recognition_locale(lang), format!("{lang}-IN"));
        }
        for lang in european {
            assert_eq!(recognition_locale(lang), lang);
        }
    }
}
