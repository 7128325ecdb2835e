//! Filtering and validation of request input, including file uploads.
//!
//! This crate validates the fields of a submitted form or API payload as one
//! data set:
//! - **Inputs**: a named value with a [`FilterChain`] and a [`ValidatorChain`]
//! - **File inputs**: upload descriptors validated before any filter runs,
//!   with the upload-integrity validator injected automatically
//! - **Input filters**: collections of inputs, nested or built from specs
//! - **Plugin managers**: name-based registries of filters, validators and
//!   input filters that check every instance they build
//!
//! # Core Types
//!
//! - [`Input`] / [`FileInput`]: the two input types
//! - [`InputFilter`]: validates a data map across its inputs
//! - [`ValidatorPluginManager`] / [`FilterPluginManager`] /
//!   [`InputFilterPluginManager`]: plugin registries
//! - [`Verified<T>`]: values that passed validation
//!
//! # Examples
//!
//! ```
//! use input_filter::{FileInput, Input, InputFilter, InputFilterInterface, InputInterface};
//! use input_filter::filter::StringTrim;
//! use serde_json::json;
//!
//! let mut title = Input::new("title");
//! title.filter_chain_mut().attach(StringTrim);
//!
//! let mut attachment = FileInput::new("attachment");
//! attachment.set_required(false);
//!
//! let mut form = InputFilter::new();
//! form.add(title).add(attachment);
//!
//! form.set_data(
//!     json!({
//!         "title": "  Quarterly report ",
//!         "attachment": {"tmp_name": "", "name": "", "size": 0, "type": "", "error": 4},
//!     })
//!     .as_object()
//!     .unwrap()
//!     .clone(),
//! );
//!
//! assert!(form.is_valid(None).unwrap());
//! let values = form.verified_values().unwrap();
//! assert_eq!(values.as_ref()["title"], json!("Quarterly report"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod verified;

pub mod file;
pub mod filter;
pub mod input;
pub mod input_filter;
pub mod plugin;
pub mod validator;
pub mod value;

#[cfg(test)]
mod test_utils;

pub use error::Error;
pub use filter::{Filter, FilterChain};
pub use input::{FileInput, Input, InputInterface};
pub use input_filter::{Factory, InputFilter, InputFilterInterface, InputSpec};
pub use plugin::{
    FilterPluginManager, InputFilterPluginManager, Plugin, ValidatorPluginManager,
};
pub use validator::{ValidationError, Validator, ValidatorChain};
pub use verified::Verified;
