// src/flags/mod.rs
pub mod bool_flags;
pub mod flag;
pub mod value_flags;

pub use bool_flags::{BoolFlag, BoolValueFlag, BoolValuesFlag};
pub use flag::{FlagHandler, FlagProcessor, FLAG_STOP};
pub use value_flags::{flag, list_flag, menu_flag, ItemizedListFlag, MapFlag, OptionalFlag, ValueFlag};
