// src/data/mod.rs
pub mod data;
pub mod operator;
pub mod os;

pub use data::{Data, Value};
pub use operator::ArgValue;
pub use os::{BashOs, Os};
