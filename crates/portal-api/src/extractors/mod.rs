//! Custom extractors for request processing

pub mod admin_key;
pub mod json;

pub use admin_key::AdminKey;
pub use json::{JsonBody, ValidatedJson};
