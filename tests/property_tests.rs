//! Property-based tests using proptest
//!
//! Generate random documents and option sets to check the guarantees the
//! sanitizer makes for every input.

use proptest::prelude::*;
use serde_json::{Map, Value};
use std::collections::HashSet;

use nosql_sanitize::application::is_email;
use nosql_sanitize::{OptionResolver, PartialOptions, SanitizeOptions, Sanitizer};

/// Strategy for keys made of letters and operator characters (never emails)
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e$.]{1,6}"
}

/// Strategy for string values with operator characters and braces
fn text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 $.{}()*+?|^\\[\\]\\\\/]{0,12}"
}

/// Strategy for strings that are either emails or operator-laden text
fn email_or_text_strategy() -> impl Strategy<Value = String> {
    prop_oneof!["[a-z]{1,6}@[a-z]{1,6}\\.com", text_strategy()]
}

/// Strategy for nested JSON documents
fn document_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::from),
        text_strategy().prop_map(Value::String),
    ];

    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec((key_strategy(), inner), 0..6)
                .prop_map(|pairs| Value::Object(pairs.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

fn defaults() -> SanitizeOptions {
    OptionResolver::resolve(PartialOptions::new()).unwrap()
}

/// Every key and string in `value`, recursively
fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|item| collect_strings(item, out)),
        Value::Object(fields) => {
            for (key, val) in fields {
                out.push(key.clone());
                collect_strings(val, out);
            }
        }
        _ => {}
    }
}

proptest! {
    /// Sanitizing an already sanitized document changes nothing
    #[test]
    fn sanitize_is_idempotent(doc in document_strategy()) {
        let options = defaults();
        let sanitizer = Sanitizer::new(&options);

        let once = sanitizer.sanitize(doc).unwrap();
        let twice = sanitizer.sanitize(once.clone()).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// No operator or brace characters survive in keys or string values
    #[test]
    fn operators_are_neutralized(doc in document_strategy()) {
        let options = defaults();
        let sanitized = Sanitizer::new(&options).sanitize(doc).unwrap();

        let mut strings = Vec::new();
        collect_strings(&sanitized, &mut strings);
        for s in strings {
            prop_assert!(
                !s.contains(['$', '.', '{', '}', '[', ']', '(', ')']),
                "operator character left in {:?}",
                s
            );
        }
    }

    /// Control characters are stripped from string values
    #[test]
    fn control_characters_are_stripped(
        prefix in "[a-z]{0,5}",
        control in prop::sample::select(vec!['\u{0}', '\u{7}', '\u{1b}', '\u{7f}', '\u{85}', '\u{9f}']),
        suffix in "[a-z]{0,5}",
    ) {
        let options = defaults();
        let input = format!("{}{}{}", prefix, control, suffix);
        let sanitized = Sanitizer::new(&options).sanitize_string(&input, true);
        prop_assert_eq!(sanitized, format!("{}{}", prefix, suffix));
    }

    /// With an allow-list, only allowed keys reach the output
    #[test]
    fn allow_list_filters_keys(
        pairs in prop::collection::vec(("[a-d]{1,2}", text_strategy()), 0..10),
    ) {
        let options = OptionResolver::resolve(
            PartialOptions::new().with_allowed_keys(["a", "b"]),
        )
        .unwrap();
        let doc = Value::Object(
            pairs
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect(),
        );

        let sanitized = Sanitizer::new(&options).sanitize(doc).unwrap();
        let allowed: HashSet<&str> = ["a", "b"].into_iter().collect();
        for key in sanitized.as_object().unwrap().keys() {
            prop_assert!(allowed.contains(key.as_str()));
        }
    }

    /// A denied key survives only when it carries an email, and then verbatim
    #[test]
    fn denied_key_keeps_only_emails(value in email_or_text_strategy()) {
        let options = OptionResolver::resolve(
            PartialOptions::new()
                .with_allowed_keys(["contact", "name"])
                .with_denied_keys(["contact"]),
        )
        .unwrap();
        let doc = serde_json::json!({ "contact": value.clone(), "name": "x" });

        let sanitized = Sanitizer::new(&options).sanitize(doc).unwrap();
        let fields = sanitized.as_object().unwrap();

        prop_assert_eq!(fields.get("name"), Some(&Value::from("x")));
        if is_email(&value) {
            prop_assert_eq!(fields.get("contact"), Some(&Value::String(value)));
        } else {
            prop_assert!(fields.get("contact").is_none());
        }
    }

    /// Distinct arrays never hold the same scalar twice
    #[test]
    fn distinct_arrays_have_unique_scalars(
        items in prop::collection::vec(prop_oneof![
            any::<i8>().prop_map(Value::from),
            "[a-c]{1,2}".prop_map(Value::String),
        ], 0..20),
    ) {
        let options = OptionResolver::resolve(
            PartialOptions::new().with_array_options(nosql_sanitize::domain::ArrayOptions {
                filter_null: false,
                distinct: true,
            }),
        )
        .unwrap();

        let sanitized = Sanitizer::new(&options).sanitize(Value::Array(items)).unwrap();
        let rendered: Vec<String> = sanitized
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        let unique: HashSet<&String> = rendered.iter().collect();
        prop_assert_eq!(unique.len(), rendered.len());
    }
}
