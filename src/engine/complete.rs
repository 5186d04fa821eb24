//! Complete Engine
//!
//! Walks the graph in complete mode: processors consume fully-provided
//! arguments exactly as execute would, and the processor owning the cursor
//! token returns the completion record. The record then runs through the
//! post-processing pipeline against the token being completed.

use std::sync::Arc;

use tracing::debug;

use crate::completion::record::{process_completion, Autocompletion, Completion};
use crate::core::errors::CmdError;
use crate::core::node::GraphNode;
use crate::core::output::Output;
use crate::core::processor::ExecuteData;
use crate::data::Data;
use crate::input::Input;

/// Walk the graph until a processor claims the cursor token.
pub(crate) fn complete_walk(
    start: &Arc<dyn GraphNode>,
    input: &mut Input,
    data: &mut Data,
) -> Result<Option<Completion>, CmdError> {
    let mut node = Some(start.clone());
    while let Some(n) = node {
        if let Some(completion) = n.complete(input, data)? {
            return Ok(Some(completion));
        }
        node = n.next(input, data)?;
    }
    Ok(None)
}

/// Complete against a raw shell line (`COMP_LINE`). The first token is the
/// program name and is skipped.
pub fn autocomplete(root: &Arc<dyn GraphNode>, comp_line: &str) -> Result<Autocompletion, CmdError> {
    let mut input = Input::from_comp_line(comp_line);
    input.pop();
    autocomplete_input(root, input)
}

/// Complete against pre-split tokens (program name excluded). The last
/// token is the one under the cursor; pass a trailing empty token for a
/// cursor on fresh whitespace.
pub fn autocomplete_tokens<I, S>(root: &Arc<dyn GraphNode>, tokens: I) -> Result<Autocompletion, CmdError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    autocomplete_input(root, Input::from_args(tokens))
}

fn autocomplete_input(root: &Arc<dyn GraphNode>, mut input: Input) -> Result<Autocompletion, CmdError> {
    let cursor = input
        .remaining_values()
        .last()
        .cloned()
        .unwrap_or_default();
    let delimiter = input.delimiter();
    let mut data = Data::new();
    debug!(cursor = %cursor, "complete walk starting");

    let completion = match complete_walk(root, &mut input, &mut data)? {
        Some(c) => c,
        None => return Ok(Autocompletion::default()),
    };
    let completion = resolve_deferred(completion, &mut input, &mut data)?;
    Ok(process_completion(&completion, &cursor, delimiter))
}

/// Run any deferred sub-graphs, then resolve the real completion record.
pub(crate) fn resolve_deferred(
    mut completion: Completion,
    input: &mut Input,
    data: &mut Data,
) -> Result<Completion, CmdError> {
    while let Some(deferred) = completion.deferred.take() {
        let mut output = Output::ignoring_not_enough_args();
        let mut exec_data = ExecuteData::default();
        match super::execute::walk(&deferred.graph, input, &mut output, data, &mut exec_data) {
            Ok(()) | Err(CmdError::NotEnoughArgs { .. }) => {}
            Err(err) => return Err(err),
        }
        completion = (deferred.resolve)(data)?;
    }
    Ok(completion)
}
