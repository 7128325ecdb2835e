//! Upload form validation demonstration.
//!
//! This example shows:
//! 1. Building an input filter from JSON input specs
//! 2. Pointing the upload-integrity validator at an upload directory
//! 3. Validating a submission with a real uploaded file
//! 4. Reading per-input messages from a rejected submission
//!
//! Run with: `cargo run --example file_upload_form`

use std::fs;
use std::sync::Arc;

use input_filter::plugin::{FilterPluginManager, Plugin, ValidatorPluginManager};
use input_filter::validator::UploadFile;
use input_filter::{Factory, InputFilterInterface, InputSpec};
use serde_json::{json, Map, Value};

fn submission(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Upload Form Example ===\n");

    let upload_dir = tempfile::tempdir()?;
    let tmp_path = upload_dir.path().join("upload-q81x");
    fs::write(&tmp_path, b"%PDF-1.7 quarterly figures")?;

    let mut validators = ValidatorPluginManager::with_defaults();
    let dir = upload_dir.path().to_path_buf();
    validators.register_or_replace(ValidatorPluginManager::UPLOAD_FILE, move |_| {
        let options = json!({"upload_dir": dir});
        Ok(Plugin::Validator(Arc::new(UploadFile::from_options(&options)?)))
    });
    let factory = Factory::with_plugin_managers(
        Arc::new(FilterPluginManager::with_defaults()),
        Arc::new(validators),
    );

    let specs: Vec<InputSpec> = serde_json::from_value(json!([
        {
            "name": "title",
            "filters": [{"name": "StringTrim"}],
            "validators": [{"name": "StringLength", "options": {"min": 3, "max": 64}}],
        },
        {
            "name": "report",
            "type": "file",
            "validators": [
                {"name": "FileSize", "options": {"max": 4096}},
                {"name": "FileMimeType", "options": {"mime_types": ["application/pdf"]}},
            ],
        },
    ]))?;

    // Scenario 1: a well-formed submission
    println!("--- Scenario 1: Valid Upload ---");
    let mut form = factory.create_input_filter(&specs)?;
    form.set_data(submission(json!({
        "title": "  Q3 report ",
        "report": {
            "tmp_name": tmp_path.to_string_lossy(),
            "name": "q3.pdf",
            "size": 26,
            "type": "application/pdf",
            "error": 0,
        },
    })));

    if form.is_valid(None)? {
        let values = form.verified_values()?;
        println!("Accepted: {}", serde_json::to_string_pretty(values.as_ref())?);
    } else {
        println!("Unexpected rejection: {:?}", form.messages());
    }

    // Scenario 2: short title and no file sent
    println!("\n--- Scenario 2: Rejected Submission ---");
    form.set_data(submission(json!({
        "title": "Q3",
        "report": {"tmp_name": "", "name": "", "size": 0, "type": "", "error": 4},
    })));

    if form.is_valid(None)? {
        println!("Unexpected success");
    } else {
        for (name, errors) in form.messages() {
            for error in errors {
                println!("{name}: [{}] {}", error.code(), error.message());
            }
        }
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
