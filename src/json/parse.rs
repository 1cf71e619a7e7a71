//! Purpose: Provide the internal runtime JSON decode entrypoints and failure categories.
//! Exports: `from_str`, `ParseFailureCategory`, `categorize_error`, `categorize_message`, `hint_for_error`.
//! Role: Parser boundary that centralizes simd-json usage details.
//! Invariants: Decoding uses simd-json; input buffers are copied once to satisfy its mutable-slice API.
//! Invariants: Category mapping is deterministic and never echoes payload bytes.
//! Notes: Error mapping to domain errors is done by callsites so context stays explicit.

use serde::de::DeserializeOwned;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ParseFailureCategory {
    Syntax,
    NumericRange,
    Utf8,
    DepthLimit,
    Unknown,
}

impl ParseFailureCategory {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::NumericRange => "numeric-range",
            Self::Utf8 => "utf8",
            Self::DepthLimit => "depth-limit",
            Self::Unknown => "unknown",
        }
    }
}

pub(crate) fn from_str<T: DeserializeOwned>(input: &str) -> Result<T, simd_json::Error> {
    let mut bytes = input.as_bytes().to_vec();
    simd_json::serde::from_slice(&mut bytes)
}

pub(crate) fn categorize_error(err: &simd_json::Error) -> ParseFailureCategory {
    categorize_message(&err.to_string())
}

pub(crate) fn categorize_message(message: &str) -> ParseFailureCategory {
    let lower = message.to_ascii_lowercase();
    if lower.contains("utf8") || lower.contains("utf-8") {
        return ParseFailureCategory::Utf8;
    }
    if lower.contains("recursion") || lower.contains("depth") {
        return ParseFailureCategory::DepthLimit;
    }
    if ["number", "overflow", "out of range"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        return ParseFailureCategory::NumericRange;
    }
    if ["syntax", "expected", "unexpected", "eof", "character", "trailing", "invalid"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        return ParseFailureCategory::Syntax;
    }
    ParseFailureCategory::Unknown
}

pub(crate) fn hint_for_error(err: &simd_json::Error, context: &str) -> String {
    format!(
        "Input is not valid JSON (parse category: {}; context: {context}).",
        categorize_error(err).label()
    )
}
