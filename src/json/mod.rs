//! Purpose: Internal JSON transcoding boundary shared by the codec and CLI.
//! Exports: `parse` (text to primitive tree) and `encode` (primitive tree to text).
//! Role: Single seam for transcoder details so callsites avoid ad hoc encode/decode logic.
//! Invariants: Runtime JSON decoding and encoding go through this module.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

pub(crate) mod encode;
pub(crate) mod parse;
