//! Execute Engine
//!
//! Walks the graph in dependency order, letting each processor consume
//! input and populate data, then runs any registered in-process callbacks.
//! Usage-classified errors get the command's usage text printed below the
//! error message.

use std::sync::Arc;

use tracing::debug;

use crate::core::errors::CmdError;
use crate::core::node::GraphNode;
use crate::core::output::Output;
use crate::core::processor::ExecuteData;
use crate::data::Data;
use crate::input::Input;

use super::usage::usage_text;

pub const USAGE_SEPARATOR: &str = "======= Command Usage =======";

/// Walk the graph in execute mode without the top-level bookkeeping
/// (extra-args check, executor callbacks, error reporting). Specialty
/// processors reuse this for their inner subgraphs.
pub(crate) fn walk(
    start: &Arc<dyn GraphNode>,
    input: &mut Input,
    output: &mut Output,
    data: &mut Data,
    exec_data: &mut ExecuteData,
) -> Result<(), CmdError> {
    let mut node = Some(start.clone());
    while let Some(n) = node {
        n.execute(input, output, data, exec_data)?;
        node = n.next(input, data)?;
    }
    Ok(())
}

/// Execute a graph against the given input.
///
/// On success the returned [`ExecuteData`] carries the shell lines for the
/// host to eval. Errors are written to the output's stderr; usage errors
/// additionally get the rendered usage below a separator line.
pub fn execute(
    root: &Arc<dyn GraphNode>,
    input: &mut Input,
    output: &mut Output,
    data: &mut Data,
) -> Result<ExecuteData, CmdError> {
    debug!(remaining = input.num_remaining(), "execute walk starting");
    let mut exec_data = ExecuteData::default();
    let mut result = walk(root, input, output, data, &mut exec_data);

    if output.ignores_not_enough_args() {
        if let Err(CmdError::NotEnoughArgs { .. }) = &result {
            result = Ok(());
        }
    }

    if result.is_ok() && !input.fully_processed() {
        result = Err(CmdError::ExtraArgs(input.remaining_values().into()));
    }

    if let Err(err) = result {
        report(root, output, &err);
        return Err(err);
    }

    let callbacks = std::mem::take(&mut exec_data.executor);
    for callback in &callbacks {
        if let Err(err) = callback(output, data) {
            report(root, output, &err);
            return Err(err);
        }
    }
    exec_data.executor = callbacks;

    debug!(lines = exec_data.executable.len(), "execute walk finished");
    Ok(exec_data)
}

fn report(root: &Arc<dyn GraphNode>, output: &mut Output, err: &CmdError) {
    output.err(err);
    if err.is_usage_error() {
        if let Ok(text) = usage_text(root) {
            output.stderrln(USAGE_SEPARATOR);
            output.stderr(text);
        }
    }
}
