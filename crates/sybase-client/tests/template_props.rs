//! Property tests for query template rewriting.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use sybase_client::{QueryTemplate, SlotKind, Value};

/// SQL fragments without markers or quotes.
fn plain_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,=()*<>_]{0,20}"
}

proptest! {
    #[test]
    fn prop_plain_text_is_unchanged(sql in plain_text()) {
        let template = QueryTemplate::parse(&sql, &[]).unwrap();
        prop_assert_eq!(template.text(), sql.as_str());
        prop_assert!(template.slots().is_empty());
        prop_assert!(template.placeholders().is_empty());
    }

    #[test]
    fn prop_value_markers_are_numbered(parts in prop::collection::vec(plain_text(), 1..8)) {
        let sql = parts.join("%v");
        let template = QueryTemplate::parse(&sql, &[]).unwrap();

        let markers = parts.len() - 1;
        prop_assert_eq!(template.value_slots(), markers);
        prop_assert!(template.slots().iter().all(|s| *s == SlotKind::Value));

        let expected: String = parts
            .iter()
            .enumerate()
            .map(|(i, part)| if i == 0 { part.clone() } else { format!("@par{i}{part}") })
            .collect();
        prop_assert_eq!(template.text(), expected.as_str());
    }

    #[test]
    fn prop_quoted_markers_are_literal(inner in "[a-z%: ]{0,20}") {
        let sql = format!("select '{inner}'");
        let template = QueryTemplate::parse(&sql, &[]).unwrap();
        prop_assert_eq!(template.text(), sql.as_str());
        prop_assert!(template.slots().is_empty());
    }

    #[test]
    fn prop_integer_literals_are_inlined(v in any::<i64>()) {
        let template = QueryTemplate::parse("select %d", &[Value::Int(v)]).unwrap();
        prop_assert_eq!(template.text(), format!("select {v}"));
        prop_assert_eq!(template.slots(), &[SlotKind::Literal][..]);
        prop_assert_eq!(template.value_slots(), 0);
    }

    #[test]
    fn prop_placeholders_are_recorded(names in prop::collection::vec("[a-z][a-z0-9_]{0,10}", 1..5)) {
        let sql = format!(
            "exec p {}",
            names.iter().map(|n| format!(":{n} output")).collect::<Vec<_>>().join(", ")
        );
        let template = QueryTemplate::parse(&sql, &[]).unwrap();
        prop_assert_eq!(template.placeholders(), names.as_slice());
        prop_assert!(!template.text().contains(':'));
    }
}
