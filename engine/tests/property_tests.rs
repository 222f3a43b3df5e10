use librarian_engine::agent::{render_context, NO_CONTEXT};
use librarian_engine::config::Config;
use librarian_engine::index::cosine_similarity;
use librarian_engine::tools::{BookCatalog, SUMMARY_NOT_FOUND};
use proptest::prelude::*;
use sdk::types::{BookRecord, RetrievalHit};

fn book(title: &str, full: &str) -> BookRecord {
    BookRecord {
        title: title.to_string(),
        themes: vec![],
        summary_short: format!("short {}", title),
        summary_full: full.to_string(),
    }
}

// Catalogue lookup is exact: known titles give their full summary, anything
// else gives the sentinel, and repeated lookups agree.
proptest! {
    #[test]
    fn test_catalog_exact_lookup(
        titles in prop::collection::hash_set("[A-Za-z0-9 ]{1,24}", 1..8),
        probe in "[A-Za-z0-9 ]{0,24}",
    ) {
        let books: Vec<BookRecord> = titles
            .iter()
            .map(|t| book(t, &format!("full::{}", t)))
            .collect();
        let catalog = BookCatalog::from_records(&books);

        for title in &titles {
            prop_assert_eq!(catalog.get_summary_by_title(title), format!("full::{}", title));
        }

        let first = catalog.get_summary_by_title(&probe);
        prop_assert_eq!(&first, &catalog.get_summary_by_title(&probe));
        if titles.contains(&probe) {
            prop_assert_eq!(first, format!("full::{}", probe));
        } else {
            prop_assert_eq!(first, SUMMARY_NOT_FOUND);
        }
    }

    #[test]
    fn test_catalog_lookup_is_case_sensitive(title in "[a-z]{3,16}") {
        let catalog = BookCatalog::from_records(&[book(&title, "found")]);
        prop_assert_eq!(catalog.get_summary_by_title(&title.to_uppercase()), SUMMARY_NOT_FOUND);
        prop_assert_eq!(catalog.get_summary_by_title(&format!(" {}", title)), SUMMARY_NOT_FOUND);
    }
}

// The context block has a header line plus one line per hit, in order.
proptest! {
    #[test]
    fn test_render_context_line_per_hit(
        hits in prop::collection::vec(
            ("[A-Za-z ]{1,20}", "[A-Za-z .,]{0,60}", prop::collection::vec("[a-z]{1,10}", 0..4)),
            0..10,
        )
    ) {
        let hits: Vec<RetrievalHit> = hits
            .into_iter()
            .map(|(title, doc, themes)| RetrievalHit::new(doc, title, themes))
            .collect();
        let block = render_context(&hits);

        if hits.is_empty() {
            prop_assert_eq!(block, NO_CONTEXT);
        } else {
            let lines: Vec<&str> = block.lines().collect();
            prop_assert_eq!(lines.len(), hits.len() + 1);
            prop_assert_eq!(lines[0], "Context (RAG):");
            for (line, hit) in lines[1..].iter().zip(&hits) {
                let prefix = format!("- {}: ", hit.metadata.title);
                prop_assert!(line.starts_with(&prefix));
                prop_assert!(line.ends_with(')'));
            }
        }
    }
}

// Any positive RAG_TOP_K override is accepted as-is; non-numeric values fail.
proptest! {
    #[test]
    fn test_top_k_override(k in 1usize..10_000) {
        let mut config = Config::default();
        let value = k.to_string();
        config
            .apply_overrides(|key| (key == "RAG_TOP_K").then(|| value.clone()))
            .unwrap();
        config.validate_and_process().unwrap();
        prop_assert_eq!(config.index.top_k, k);
    }

    #[test]
    fn test_non_numeric_top_k_rejected(value in "[a-z]{1,8}") {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| (key == "RAG_TOP_K").then(|| value.clone()));
        prop_assert!(result.is_err());
    }
}

// Cosine similarity is symmetric and bounded.
proptest! {
    #[test]
    fn test_cosine_similarity_bounds(
        pair in (1usize..16).prop_flat_map(|n| (
            prop::collection::vec(-100.0f32..100.0, n),
            prop::collection::vec(-100.0f32..100.0, n),
        ))
    ) {
        let (a, b) = pair;
        let ab = cosine_similarity(&a, &b);
        let ba = cosine_similarity(&b, &a);
        prop_assert!((ab - ba).abs() < 1e-5);
        prop_assert!((-1.0001..=1.0001).contains(&ab));
    }
}
