use watchlist_scanner::localization::{create_localization_manager, detect_language, t_args_lang, t_lang};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_and_french_bundles_load() {
        let manager = create_localization_manager().expect("Failed to create localization manager");
        assert!(manager.is_language_supported("en"));
        assert!(manager.is_language_supported("fr"));
        assert!(!manager.is_language_supported("de"));
    }

    #[test]
    fn test_language_detection_falls_back_to_english() {
        let manager = create_localization_manager().unwrap();
        assert_eq!(detect_language(&manager, Some("fr-FR")), "fr");
        assert_eq!(detect_language(&manager, Some("de")), "en");
        assert_eq!(detect_language(&manager, None), "en");
    }

    #[test]
    fn test_messages_with_arguments() {
        let manager = create_localization_manager().unwrap();
        assert_eq!(
            t_args_lang(&manager, "add-success", &[("term", "Palm Oil")], Some("en")),
            "Added \"Palm Oil\" to your watchlist."
        );
        assert_eq!(
            t_args_lang(&manager, "result-found", &[("items", "Sugar, MSG")], Some("en")),
            "Found: Sugar, MSG"
        );
    }

    #[test]
    fn test_every_english_key_exists_in_french() {
        let manager = create_localization_manager().unwrap();
        let keys = [
            "welcome-title",
            "help-title",
            "watchlist-empty",
            "add-prompt",
            "add-alias-note",
            "remove-button-expired",
            "remove-usage",
            "scan-busy",
            "scan-not-found",
            "scan-error",
            "result-all-clear-title",
            "nova-unknown",
            "error-load-watchlist",
            "error-save-watchlist",
            "unsupported-message",
        ];
        for key in keys {
            let fr = t_lang(&manager, key, Some("fr"));
            assert!(!fr.starts_with("Missing"), "missing French message: {key}");
            assert_ne!(fr, t_lang(&manager, key, Some("en")), "untranslated: {key}");
        }
    }

    #[test]
    fn test_missing_key_fallback() {
        let manager = create_localization_manager().unwrap();
        assert_eq!(t_lang(&manager, "no-such-key", None), "Missing translation: no-such-key");
    }
}
