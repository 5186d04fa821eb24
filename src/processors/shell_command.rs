//! Shell Command Processor
//!
//! Spawns a child process, captures its output, parses the stdout buffer
//! into a typed value, and stores it in the data bag. Also usable as a
//! completer: child stdout lines become suggestions. The child is the
//! engine's only suspension point; the async process API is bridged into
//! the sync walk the same way the rest of the crate bridges async
//! surfaces.

use std::sync::Arc;

use tracing::debug;

use crate::args::Validator;
use crate::completion::completers::Completer;
use crate::completion::record::Completion;
use crate::core::errors::CmdError;
use crate::core::output::Output;
use crate::core::processor::{ExecuteData, Processor};
use crate::data::{ArgValue, Data};
use crate::engine::usage::Usage;
use crate::input::Input;

fn run_child(command: &str, args: &[String]) -> Result<(String, String, bool), CmdError> {
    debug!(command, "spawning child process");
    let result = tokio::task::block_in_place(|| {
        let handle = tokio::runtime::Handle::current();
        handle.block_on(async {
            tokio::process::Command::new(command)
                .args(args)
                .output()
                .await
        })
    });
    match result {
        Ok(out) => Ok((
            String::from_utf8_lossy(&out.stdout).to_string(),
            String::from_utf8_lossy(&out.stderr).to_string(),
            out.status.success(),
        )),
        Err(e) => Err(CmdError::ShellCommand(e.to_string())),
    }
}

type LineProcessor = Arc<dyn Fn(&str, &mut Output) + Send + Sync>;

/// Runs a configured command and stores its parsed stdout under `name`.
pub struct ShellCommand<T: ArgValue> {
    name: String,
    command: String,
    args: Vec<String>,
    forward_stdout: bool,
    run_on_complete: bool,
    validators: Vec<Validator<T>>,
    line_processor: Option<LineProcessor>,
}

impl<T: ArgValue> ShellCommand<T> {
    pub fn new(name: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args,
            forward_stdout: false,
            run_on_complete: false,
            validators: Vec::new(),
            line_processor: None,
        }
    }

    /// Forward captured stdout to the invocation's output.
    pub fn forward_stdout(mut self) -> Self {
        self.forward_stdout = true;
        self
    }

    /// Also run the command during completion walks.
    pub fn run_on_complete(mut self) -> Self {
        self.run_on_complete = true;
        self
    }

    pub fn validator(mut self, v: Validator<T>) -> Self {
        self.validators.push(v);
        self
    }

    /// Observe each stdout line as it is processed.
    pub fn line_processor<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &mut Output) + Send + Sync + 'static,
    {
        self.line_processor = Some(Arc::new(f));
        self
    }

    pub fn arc(self) -> Arc<dyn Processor> {
        Arc::new(self)
    }

    fn execute_impl(&self, output: &mut Output, data: &mut Data) -> Result<(), CmdError> {
        let (stdout, stderr, ok) = run_child(&self.command, &self.args)?;
        if !ok {
            return Err(CmdError::ShellCommand(stderr.trim_end().to_string()));
        }
        if let Some(f) = &self.line_processor {
            for line in stdout.lines() {
                f(line, output);
            }
        }
        if self.forward_stdout {
            output.stdout(&stdout);
        }

        let trimmed = stdout.trim();
        let value = if trimmed.is_empty() {
            T::zero()
        } else {
            let tokens: Vec<String> = if T::is_list() {
                trimmed.split_whitespace().map(|s| s.to_string()).collect()
            } else {
                vec![trimmed.to_string()]
            };
            T::parse_tokens(&tokens).map_err(|message| CmdError::Conversion {
                name: self.name.clone(),
                message,
            })?
        };
        data.set(self.name.clone(), value.clone());
        for v in &self.validators {
            v.validate(&self.name, &value)?;
        }
        Ok(())
    }
}

impl<T: ArgValue> Processor for ShellCommand<T> {
    fn execute(
        &self,
        _input: &mut Input,
        output: &mut Output,
        data: &mut Data,
        _exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        self.execute_impl(output, data)
    }

    fn complete(
        &self,
        _input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
        if self.run_on_complete {
            let mut scratch = Output::new();
            self.execute_impl(&mut scratch, data)?;
        }
        Ok(None)
    }

    fn usage(
        &self,
        _input: &mut Input,
        _data: &mut Data,
        _usage: &mut Usage,
    ) -> Result<(), CmdError> {
        Ok(())
    }
}

/// A completer whose suggestions are the child's stdout lines.
pub struct ShellCommandCompleter {
    command: String,
    args: Vec<String>,
}

impl ShellCommandCompleter {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

impl<T: ArgValue> Completer<T> for ShellCommandCompleter {
    fn complete(&self, _sofar: &T, _data: &Data) -> Result<Completion, CmdError> {
        let (stdout, stderr, ok) = run_child(&self.command, &self.args)?;
        if !ok {
            return Err(CmdError::ShellCommand(stderr.trim_end().to_string()));
        }
        let suggestions: Vec<String> = stdout
            .trim()
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        Ok(Completion::simple(suggestions))
    }
}

// ============================================================================
// Tests
// ============================================================================
