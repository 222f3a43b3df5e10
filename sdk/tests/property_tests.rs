use proptest::prelude::*;
use sdk::errors::{EngineError, LibrarianErrorExt};
use sdk::types::{flatten_themes, split_themes};

proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "\\PC*") {
        // Hints are static strings: never empty, never echo the raw message.
        let errs = vec![
            EngineError::Config(error_str.clone()),
            EngineError::Transport(error_str.clone()),
            EngineError::LLMProvider(error_str.clone()),
            EngineError::Index(error_str.clone()),
            EngineError::BookData(error_str.clone()),
            EngineError::ToolArgument {
                tool: "get_summary_by_title".to_string(),
                reason: error_str.clone(),
            },
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            if error_str.len() > 12 {
                prop_assert!(!hint.contains(&error_str));
            }
        }
    }
}

proptest! {
    #[test]
    fn test_theme_flatten_split_round_trip(
        themes in proptest::collection::vec("[a-z][a-z ]{0,10}[a-z]", 0..6)
    ) {
        let flat = flatten_themes(&themes);
        prop_assert_eq!(split_themes(&flat), themes);
    }
}
