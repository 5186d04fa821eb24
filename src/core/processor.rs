//! Processor Contract
//!
//! Every node payload implements the Execute / Complete / Usage trio. The
//! engines drive these three methods over the graph; processors consume the
//! shared input tape and populate the shared data bag.

use std::sync::Arc;

use crate::completion::record::Completion;
use crate::data::Data;
use crate::engine::usage::Usage;
use crate::input::Input;

use super::errors::CmdError;
use super::output::Output;

/// In-process callback run after a successful graph walk.
pub type ExecutorFn = Arc<dyn Fn(&mut Output, &mut Data) -> Result<(), CmdError> + Send + Sync>;

/// What an execution produces for the host: shell lines to be `eval`'d,
/// in-process callbacks, and whether the host should wrap the lines in a
/// shell function.
#[derive(Default)]
pub struct ExecuteData {
    pub executable: Vec<String>,
    pub executor: Vec<ExecutorFn>,
    pub function_wrap: bool,
}

impl std::fmt::Debug for ExecuteData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecuteData")
            .field("executable", &self.executable)
            .field("executor", &self.executor.len())
            .field("function_wrap", &self.function_wrap)
            .finish()
    }
}

/// A node payload. Implementations consume input, populate data, and
/// contribute to execution output, completion suggestions, or usage text
/// depending on the engine driving them.
pub trait Processor: Send + Sync {
    fn execute(
        &self,
        input: &mut Input,
        output: &mut Output,
        data: &mut Data,
        exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError>;

    /// Consume input the way `execute` would for fully-provided arguments,
    /// and return the completion record when the cursor lands on this
    /// processor's tokens.
    fn complete(&self, input: &mut Input, data: &mut Data)
        -> Result<Option<Completion>, CmdError>;

    fn usage(&self, input: &mut Input, data: &mut Data, usage: &mut Usage)
        -> Result<(), CmdError>;
}

/// A processor with no behavior. Useful as a graph terminator.
pub struct NoopProcessor;

impl Processor for NoopProcessor {
    fn execute(
        &self,
        _input: &mut Input,
        _output: &mut Output,
        _data: &mut Data,
        _exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        Ok(())
    }

    fn complete(
        &self,
        _input: &mut Input,
        _data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
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

type SimpleExecuteFn =
    dyn Fn(&mut Input, &mut Output, &mut Data, &mut ExecuteData) -> Result<(), CmdError>
        + Send
        + Sync;
type SimpleCompleteFn =
    dyn Fn(&mut Input, &mut Data) -> Result<Option<Completion>, CmdError> + Send + Sync;

/// A processor built from closures; completion and usage default to no-ops.
pub struct SimpleProcessor {
    execute_fn: Option<Box<SimpleExecuteFn>>,
    complete_fn: Option<Box<SimpleCompleteFn>>,
}

impl SimpleProcessor {
    pub fn new<F>(execute_fn: F) -> Self
    where
        F: Fn(&mut Input, &mut Output, &mut Data, &mut ExecuteData) -> Result<(), CmdError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            execute_fn: Some(Box::new(execute_fn)),
            complete_fn: None,
        }
    }

    pub fn with_complete<F>(mut self, complete_fn: F) -> Self
    where
        F: Fn(&mut Input, &mut Data) -> Result<Option<Completion>, CmdError>
            + Send
            + Sync
            + 'static,
    {
        self.complete_fn = Some(Box::new(complete_fn));
        self
    }
}

impl Processor for SimpleProcessor {
    fn execute(
        &self,
        input: &mut Input,
        output: &mut Output,
        data: &mut Data,
        exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        match &self.execute_fn {
            Some(f) => f(input, output, data, exec_data),
            None => Ok(()),
        }
    }

    fn complete(
        &self,
        input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
        match &self.complete_fn {
            Some(f) => f(input, data),
            None => Ok(None),
        }
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

/// Registers an in-process callback to run after the graph walk succeeds.
pub struct ExecutorProcessor {
    callback: ExecutorFn,
}

impl ExecutorProcessor {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&mut Output, &mut Data) -> Result<(), CmdError> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }
}

impl Processor for ExecutorProcessor {
    fn execute(
        &self,
        _input: &mut Input,
        _output: &mut Output,
        _data: &mut Data,
        exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        exec_data.executor.push(self.callback.clone());
        Ok(())
    }

    fn complete(
        &self,
        _input: &mut Input,
        _data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
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

/// A processor that prints a fixed line during execution.
pub fn printer(line: impl Into<String>) -> Arc<dyn Processor> {
    let line = line.into();
    Arc::new(SimpleProcessor::new(move |_, output, _, _| {
        output.stdoutln(&line);
        Ok(())
    }))
}

/// A processor that appends a fixed shell line to the executable list.
pub fn shell_line(line: impl Into<String>) -> Arc<dyn Processor> {
    let line = line.into();
    Arc::new(SimpleProcessor::new(move |_, _, _, exec| {
        exec.executable.push(line.clone());
        Ok(())
    }))
}
