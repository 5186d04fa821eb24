//! Shell Wrapper
//!
//! The host-facing entry point. Ties together the three engines for a
//! single command graph: the wrapper hands in the token list (or raw comp
//! line), and receives buffered stdout/stderr, the lines to `eval`, the
//! function-wrap flag, and an exit code.

use std::sync::Arc;

use crate::core::errors::CmdError;
use crate::core::node::GraphNode;
use crate::core::output::Output;
use crate::data::Data;
use crate::engine;
use crate::input::Input;

/// What one execution hands back to the enclosing shell function.
#[derive(Debug, Default)]
pub struct ShellResult {
    pub stdout: String,
    pub stderr: String,
    /// Lines the wrapper should `eval` in the caller's session.
    pub eval_lines: Vec<String>,
    /// Wrap the eval lines in a shell function before running them.
    pub function_wrap: bool,
    pub exit_code: i32,
}

/// A named command graph plus the entry points the host wrapper calls.
pub struct Shell {
    name: String,
    root: Arc<dyn GraphNode>,
}

impl Shell {
    pub fn new(name: impl Into<String>, root: Arc<dyn GraphNode>) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute against pre-split tokens (program name excluded).
    pub async fn execute<I, S>(&self, args: I) -> ShellResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut input = Input::from_args(args);
        let root = self.root.clone();
        tokio::task::block_in_place(move || {
            let mut output = Output::new();
            let mut data = Data::new();
            match engine::execute(&root, &mut input, &mut output, &mut data) {
                Ok(exec_data) => {
                    let (stdout, stderr) = output.into_parts();
                    ShellResult {
                        stdout,
                        stderr,
                        eval_lines: exec_data.executable,
                        function_wrap: exec_data.function_wrap,
                        exit_code: 0,
                    }
                }
                Err(_) => {
                    let (stdout, stderr) = output.into_parts();
                    ShellResult {
                        stdout,
                        stderr,
                        eval_lines: Vec::new(),
                        function_wrap: false,
                        exit_code: 1,
                    }
                }
            }
        })
    }

    /// Complete against a raw comp line (the first token is the program
    /// name). Completion failures produce no suggestions.
    pub async fn autocomplete(&self, comp_line: &str) -> Vec<String> {
        let root = self.root.clone();
        let comp_line = comp_line.to_string();
        tokio::task::block_in_place(move || {
            match engine::autocomplete(&root, &comp_line) {
                Ok(completion) => completion.suggestions,
                Err(_) => Vec::new(),
            }
        })
    }

    /// Render the command's usage document.
    pub fn usage(&self) -> Result<String, CmdError> {
        engine::usage_text(&self.root)
    }
}

// ============================================================================
// Tests
// ============================================================================
