//! Conditional Processors
//!
//! Wrap subgraphs behind a predicate over input and data. The false branch
//! is optional; with no alternative the processor cancels cleanly.

use std::sync::Arc;

use crate::completion::record::Completion;
use crate::core::errors::CmdError;
use crate::core::node::GraphNode;
use crate::core::output::Output;
use crate::core::processor::{ExecuteData, Processor};
use crate::data::{Data, Value};
use crate::engine::complete::complete_walk;
use crate::engine::execute::walk;
use crate::engine::usage::{walk_usage, Usage};
use crate::input::Input;

type Predicate = Arc<dyn Fn(&Input, &Data) -> bool + Send + Sync>;

pub struct IfElse {
    predicate: Predicate,
    truthy: Arc<dyn GraphNode>,
    falsy: Option<Arc<dyn GraphNode>>,
}

impl IfElse {
    pub fn new<F>(predicate: F, truthy: Arc<dyn GraphNode>, falsy: Arc<dyn GraphNode>) -> Self
    where
        F: Fn(&Input, &Data) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            truthy,
            falsy: Some(falsy),
        }
    }

    /// No alternative: unmatched input skips the subgraph entirely.
    pub fn if_only<F>(predicate: F, truthy: Arc<dyn GraphNode>) -> Self
    where
        F: Fn(&Input, &Data) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            truthy,
            falsy: None,
        }
    }

    /// Predicate over data-key presence; a stored `false` counts as absent.
    pub fn if_data(key: impl Into<String>, truthy: Arc<dyn GraphNode>) -> Self {
        Self::if_only(data_predicate(key.into()), truthy)
    }

    pub fn if_else_data(
        key: impl Into<String>,
        truthy: Arc<dyn GraphNode>,
        falsy: Arc<dyn GraphNode>,
    ) -> Self {
        let key = key.into();
        Self {
            predicate: Arc::new(data_predicate(key)),
            truthy,
            falsy: Some(falsy),
        }
    }

    pub fn arc(self) -> Arc<dyn Processor> {
        Arc::new(self)
    }

    fn pick(&self, input: &Input, data: &Data) -> Option<&Arc<dyn GraphNode>> {
        if (self.predicate)(input, data) {
            Some(&self.truthy)
        } else {
            self.falsy.as_ref()
        }
    }
}

fn data_predicate(key: String) -> impl Fn(&Input, &Data) -> bool {
    move |_input, data| match data.value(&key) {
        Some(Value::Bool(b)) => *b,
        Some(_) => true,
        None => false,
    }
}

impl Processor for IfElse {
    fn execute(
        &self,
        input: &mut Input,
        output: &mut Output,
        data: &mut Data,
        exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        match self.pick(input, data) {
            Some(subgraph) => {
                let subgraph = subgraph.clone();
                walk(&subgraph, input, output, data, exec_data)
            }
            None => Ok(()),
        }
    }

    fn complete(
        &self,
        input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
        match self.pick(input, data) {
            Some(subgraph) => {
                let subgraph = subgraph.clone();
                complete_walk(&subgraph, input, data)
            }
            None => Ok(None),
        }
    }

    fn usage(
        &self,
        input: &mut Input,
        data: &mut Data,
        usage: &mut Usage,
    ) -> Result<(), CmdError> {
        walk_usage(&self.truthy, input, data, usage)?;
        if let Some(falsy) = &self.falsy {
            walk_usage(falsy, input, data, usage)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
