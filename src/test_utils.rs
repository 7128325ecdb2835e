//! Proptest strategies shared by unit tests.

use proptest::prelude::*;

use crate::file::{FileDescriptor, UploadErrorCode};
use crate::value::Value;

/// Any upload status, known or not.
pub(crate) fn arb_error_code() -> impl Strategy<Value = UploadErrorCode> {
    prop_oneof![
        Just(UploadErrorCode::Ok),
        Just(UploadErrorCode::IniSize),
        Just(UploadErrorCode::FormSize),
        Just(UploadErrorCode::Partial),
        Just(UploadErrorCode::NoFile),
        Just(UploadErrorCode::NoTmpDir),
        Just(UploadErrorCode::CantWrite),
        Just(UploadErrorCode::Extension),
        // 5 is unassigned; everything else unknown lies outside 0..=8
        prop_oneof![Just(5i64), 9i64..1000, -1000i64..0].prop_map(UploadErrorCode::Other),
    ]
}

fn arb_field() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[a-zA-Z0-9_./-]{0,24}")
}

/// A descriptor with any combination of fields present.
pub(crate) fn arb_descriptor() -> impl Strategy<Value = FileDescriptor> {
    (
        arb_field(),
        arb_field(),
        proptest::option::of(0u64..10_000_000),
        proptest::option::of("[a-z]{1,8}/[a-z0-9.+-]{1,12}"),
        proptest::option::of(arb_error_code()),
    )
        .prop_map(|(tmp_name, name, size, mime_type, error)| FileDescriptor {
            tmp_name,
            name,
            size,
            mime_type,
            error,
        })
}

/// A descriptor value whose status is [`UploadErrorCode::NoFile`].
pub(crate) fn arb_no_file_value() -> impl Strategy<Value = Value> {
    arb_descriptor().prop_map(|mut descriptor| {
        descriptor.tmp_name.get_or_insert_with(String::new);
        descriptor.error = Some(UploadErrorCode::NoFile);
        descriptor.to_value()
    })
}

/// A descriptor value whose status is anything but [`UploadErrorCode::NoFile`].
pub(crate) fn arb_sent_file_value() -> impl Strategy<Value = Value> {
    (arb_descriptor(), arb_error_code())
        .prop_filter("status must not be NoFile", |(_, code)| {
            *code != UploadErrorCode::NoFile
        })
        .prop_map(|(mut descriptor, code)| {
            descriptor.tmp_name.get_or_insert_with(|| "/tmp/upload".to_string());
            descriptor.error = Some(code);
            descriptor.to_value()
        })
}
