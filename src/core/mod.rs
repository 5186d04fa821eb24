// src/core/mod.rs
pub mod errors;
pub mod node;
pub mod output;
pub mod processor;

pub use errors::{CmdError, TokenList};
pub use node::{leaf, serial, serial_with_tail, GraphNode, SerialNode};
pub use output::Output;
pub use processor::{
    printer, shell_line, ExecuteData, ExecutorFn, ExecutorProcessor, NoopProcessor, Processor,
    SimpleProcessor,
};
