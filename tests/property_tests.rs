//! Integration property tests for input-filter.
//!
//! These tests check invariants that span inputs, input filters and the
//! plugin managers, using property-based testing.

use std::sync::Arc;

use input_filter::file::is_empty_file;
use input_filter::input::{FileInput, Input, InputInterface};
use input_filter::input_filter::{InputFilter, InputFilterInterface};
use input_filter::plugin::{canonical_name, Plugin, ValidatorPluginManager};
use input_filter::validator::{Callback, ValidatorRole};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// Strategy: upload status codes other than "no file"
fn arb_sent_status() -> impl Strategy<Value = i64> {
    prop_oneof![Just(0i64), 1i64..4, 6i64..9]
}

// Strategy: a descriptor reporting "no file"
fn arb_no_file() -> impl Strategy<Value = Value> {
    "[a-z0-9/]{0,12}".prop_map(|tmp_name| json!({"tmp_name": tmp_name, "error": 4}))
}

// Strategy: a descriptor reporting a sent (possibly broken) file
fn arb_sent() -> impl Strategy<Value = Value> {
    ("[a-z0-9/]{1,12}", arb_sent_status())
        .prop_map(|(tmp_name, error)| json!({"tmp_name": tmp_name, "error": error}))
}

// Strategy: any raw value a client might post for a file field
fn arb_raw_upload() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        Just(json!("")),
        Just(json!([])),
        "[a-z.]{1,10}".prop_map(Value::from),
        arb_no_file(),
        arb_sent(),
        prop::collection::vec(prop_oneof![arb_no_file(), arb_sent()], 1..5).prop_map(Value::Array),
    ]
}

fn plugins_with_accepting_upload_validator() -> Arc<ValidatorPluginManager> {
    let mut plugins = ValidatorPluginManager::with_defaults();
    plugins.register_or_replace(ValidatorPluginManager::UPLOAD_FILE, |_| {
        Ok(Plugin::Validator(Arc::new(Callback::new("x", "x", |_, _| true))))
    });
    Arc::new(plugins)
}

proptest! {
    /// Property: a multi-file value is empty exactly when every slot reports "no file"
    #[test]
    fn proptest_multi_file_emptiness_is_all_no_file(
        slots in prop::collection::vec(prop::bool::ANY, 1..8)
    ) {
        let items: Vec<Value> = slots
            .iter()
            .enumerate()
            .map(|(i, sent)| {
                let error = if *sent { 0 } else { 4 };
                json!({"tmp_name": format!("/tmp/upload-{i}"), "error": error})
            })
            .collect();

        prop_assert_eq!(
            is_empty_file(&Value::Array(items)),
            slots.iter().all(|sent| !sent)
        );
    }

    /// Property: the upload validator is injected at most once, whatever is validated
    #[test]
    fn proptest_upload_validator_injected_at_most_once(
        values in prop::collection::vec(arb_raw_upload(), 1..6),
        required in prop::bool::ANY,
        allow_empty in prop::bool::ANY,
    ) {
        let mut input = FileInput::with_plugins("upload", plugins_with_accepting_upload_validator());
        input.set_required(required);
        input.set_allow_empty(allow_empty);

        for value in values {
            input.set_value(value);
            input.is_valid(None);

            // The chain starts empty and the replacement reports no special
            // role, so its length counts injections.
            prop_assert!(input.validator_chain().len() <= 1);
        }
    }

    /// Property: file inputs never get a not-empty validator
    #[test]
    fn proptest_file_input_never_injects_not_empty(value in arb_raw_upload()) {
        let mut input = FileInput::with_plugins("upload", plugins_with_accepting_upload_validator());
        input.set_value(value);
        input.is_valid(None);

        prop_assert!(!input.validator_chain().has_role(ValidatorRole::NotEmpty));
    }

    /// Property: merging copies the source's upload-validator policy
    #[test]
    fn proptest_merge_copies_auto_prepend(source_flag in prop::bool::ANY, target_flag in prop::bool::ANY) {
        let source = FileInput::new("source").with_auto_prepend_upload_validator(source_flag);
        let mut target = FileInput::new("target").with_auto_prepend_upload_validator(target_flag);

        target.merge(&source);

        prop_assert_eq!(target.auto_prepend_upload_validator(), source_flag);
    }

    /// Property: merging a plain input keeps the file input's policy
    #[test]
    fn proptest_merge_from_plain_input_keeps_policy(flag in prop::bool::ANY) {
        let source = Input::new("source");
        let mut target = FileInput::new("target").with_auto_prepend_upload_validator(flag);

        target.merge(&source);

        prop_assert_eq!(target.auto_prepend_upload_validator(), flag);
    }

    /// Property: canonical names ignore case and separators
    #[test]
    fn proptest_canonical_name_is_idempotent(name in "[A-Za-z_\\-./ \\\\]{0,24}") {
        let once = canonical_name(&name);
        prop_assert_eq!(canonical_name(&once), once.clone());
        prop_assert!(once.chars().all(|c| !c.is_uppercase()));
    }

    /// Property: every input lands in exactly one of valid or invalid, or is skipped
    #[test]
    fn proptest_input_filter_partitions_inputs(
        present in prop::collection::vec(prop::option::of("[0-9]{0,4}|[a-z]{1,4}"), 1..6)
    ) {
        let mut filter = InputFilter::new();
        let mut data = Map::new();
        for (i, value) in present.iter().enumerate() {
            let name = format!("field{i}");
            let mut input = Input::new(name.clone());
            input.set_required(i % 2 == 0);
            filter.add(input);
            if let Some(value) = value {
                data.insert(name, Value::from(value.as_str()));
            }
        }
        filter.set_data(data.clone());

        let valid = filter.is_valid(None).unwrap();

        for i in 0..present.len() {
            let name = format!("field{i}");
            let in_valid = filter.valid_inputs().contains(&name);
            let in_invalid = filter.invalid_inputs().contains(&name);
            prop_assert!(!(in_valid && in_invalid));
            let skipped = !data.contains_key(&name) && i % 2 != 0;
            prop_assert_eq!(skipped, !in_valid && !in_invalid);
        }
        prop_assert_eq!(valid, filter.invalid_inputs().is_empty());
        prop_assert_eq!(valid, filter.verified_values().is_ok());
    }
}
