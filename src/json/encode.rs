//! Purpose: Encode primitive JSON trees to text.
//! Exports: `to_string`.
//! Role: Encoder half of the transcoder boundary.
//! Invariants: Output is compact; pretty rendering belongs to the CLI.
//! Invariants: Object key order is preserved as built.

use serde_json::Value;

use crate::core::error::{Error, ErrorKind};

pub(crate) fn to_string(value: &Value) -> Result<String, Error> {
    serde_json::to_string(value).map_err(encode_error)
}

fn encode_error(err: serde_json::Error) -> Error {
    Error::new(ErrorKind::Internal)
        .with_message("json encode failed")
        .with_source(err)
}
