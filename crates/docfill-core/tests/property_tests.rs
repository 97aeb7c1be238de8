//! Property-based tests for docfill-core
//!
//! Parser rules over generated line sets, and fill behaviour over generated
//! mappings applied to in-memory DOCX templates.

use std::collections::BTreeMap;

use docfill_core::fixtures::DocxBuilder;
use docfill_core::{extract, fill, parse_key_values, KeyValues};
use proptest::prelude::*;

fn key() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,11}"
}

fn value() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 .,/-]{0,24}"
}

/// Lines the parser must skip
fn noise_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[ \t]{1,4}",
        "#[ -~]{0,20}",
        "[A-Za-z0-9 ]{1,20}",   // no colon
        " *: *[a-z]{0,10}",     // empty key
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ============================================================
    // Key-Value Parser
    // ============================================================

    #[test]
    fn parse_matches_last_occurrence(
        pairs in prop::collection::vec((key(), value()), 0..12),
        pad in "[ \t]{0,3}",
    ) {
        let text = pairs
            .iter()
            .map(|(k, v)| format!("{pad}{k}{pad}:{pad}{v}{pad}"))
            .collect::<Vec<_>>()
            .join("\n");

        let expected: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.clone(), v.trim().to_string()))
            .collect();

        prop_assert_eq!(parse_key_values(&text).into_inner(), expected);
    }

    #[test]
    fn parse_skips_noise_lines(
        noise in prop::collection::vec(noise_line(), 0..10),
        k in key(),
        v in value(),
    ) {
        let mut lines = noise.clone();
        lines.push(format!("{k}: {v}"));
        let text = lines.join("\r\n");

        let parsed = parse_key_values(&text);
        prop_assert_eq!(parsed.len(), 1);
        prop_assert_eq!(parsed.get(&k), Some(v.trim()));
    }

    #[test]
    fn parse_output_is_trimmed_and_keyed(text in "[ -~\n]{0,200}") {
        for (k, v) in parse_key_values(&text).iter() {
            prop_assert!(!k.is_empty());
            prop_assert!(!k.starts_with('#'));
            prop_assert_eq!(k, k.trim());
            prop_assert_eq!(v, v.trim());
        }
    }

    // ============================================================
    // Template Filler
    // ============================================================

    #[test]
    fn fill_replaces_every_known_placeholder(k in key(), v in value()) {
        let template = DocxBuilder::new()
            .paragraph(&format!("Campo {{{{{k}}}}} fim"))
            .build();
        let values: KeyValues = [(k.clone(), v.clone())].into_iter().collect();

        let filled = fill(&template, &values).unwrap();
        prop_assert_eq!(extract(&filled, "docx").unwrap(), format!("Campo {v} fim"));
    }

    #[test]
    fn fill_twice_equals_fill_once(
        pairs in prop::collection::btree_map(key(), value(), 1..5),
    ) {
        let body = pairs
            .keys()
            .map(|k| format!("{{{{{k}}}}} {{{{missing}}}}"))
            .collect::<Vec<_>>();
        let mut builder = DocxBuilder::new();
        for line in &body {
            builder = builder.paragraph(line);
        }
        let template = builder.build();
        let values = KeyValues::from(pairs);

        let once = fill(&template, &values).unwrap();
        let twice = fill(&once, &values).unwrap();
        prop_assert_eq!(extract(&once, "docx").unwrap(), extract(&twice, "docx").unwrap());
    }
}
