//! cmdgraph - build shell CLIs from graphs of processors
//!
//! A command is a directed graph of nodes, each holding a processor that
//! implements the execute / complete / usage trio. Three engines traverse
//! the same graph to run the command, produce shell completions, and
//! render help text.

pub mod args;
pub mod branch;
pub mod completion;
pub mod core;
pub mod data;
pub mod engine;
pub mod flags;
pub mod fs;
pub mod input;
pub mod processors;
pub mod shell;
pub mod stores;

pub use crate::args::{Arg, ArgOpts, Complexecute, Validator};
pub use crate::branch::BranchNode;
pub use crate::completion::{Completer, FileCompleter, SimpleCompleter};
pub use crate::core::{leaf, serial, serial_with_tail, CmdError, GraphNode, Output, Processor};
pub use crate::data::{ArgValue, Data, Value};
pub use crate::engine::{autocomplete, autocomplete_tokens, execute, usage_text};
pub use crate::flags::{BoolFlag, FlagProcessor};
pub use crate::input::{Count, Input};
pub use crate::processors::{CacheNode, IfElse, ListBreaker, NodeRepeater, ShellCommand, ShortcutNode};
pub use crate::shell::{Shell, ShellResult};
pub use crate::stores::{CacheStore, MemoryCache, MemoryShortcuts, ShortcutStore};
