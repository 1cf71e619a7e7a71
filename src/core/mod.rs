// Core modules implementing classification, decoding, defaults, and error modeling.
pub mod decode;
pub mod error;
pub mod matcher;
pub mod record;
pub mod registry;
pub mod scalar;
pub mod schema;
pub mod synth;
pub mod types;
pub mod value;
