//! Purpose: Value-object runtime: type-directed decoding, defaults, and a mutability policy.
//! Exports: `api` (facade, codec, schema types, errors) and the `record!` macro.
//! Role: Library backing the `classy` CLI and any crate declaring value objects.
//! Invariants: `api` is the public path; `core` and the JSON boundary stay crate-private.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub(crate) mod core;
pub(crate) mod json;
mod macros;
