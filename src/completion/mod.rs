// src/completion/mod.rs
pub mod completers;
pub mod file_completer;
pub mod record;

pub use completers::{Completer, CompleterFromFunc, DeferredCompleter, SimpleCompleter};
pub use file_completer::FileCompleter;
pub use record::{process_completion, Autocompletion, Completion, DeferredCompletion};
