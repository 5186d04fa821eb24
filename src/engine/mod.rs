// src/engine/mod.rs
pub mod complete;
pub mod execute;
pub mod usage;

pub use complete::{autocomplete, autocomplete_tokens};
pub use execute::{execute, USAGE_SEPARATOR};
pub use usage::{usage, usage_text, Usage};
