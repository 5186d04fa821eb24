//! Graph Nodes
//!
//! A node couples a processor with an edge that picks the next node after
//! Execute/Complete. The default edge is linear; branch nodes and the
//! specialty processors override `next` to dispatch on input.

use std::sync::Arc;

use crate::data::Data;
use crate::input::Input;

use super::errors::CmdError;
use super::processor::Processor;

/// A graph node: a processor plus its outgoing edge.
///
/// Graphs are immutable `Arc`-shared values; subgraphs may be shared
/// between nodes (the result is a DAG, never an ownership cycle).
pub trait GraphNode: Processor {
    /// Resolve the outgoing edge after execute/complete. May consume input
    /// (branch dispatch pops the keyword).
    fn next(
        &self,
        input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Arc<dyn GraphNode>>, CmdError>;

    /// The edge followed by the usage walker. Input-dependent nodes return
    /// `None` and render their subgraphs inside `usage` instead.
    fn usage_next(&self) -> Option<Arc<dyn GraphNode>>;
}

/// A linear node: run the processor, then continue to `next`.
pub struct SerialNode {
    processor: Arc<dyn Processor>,
    next: Option<Arc<dyn GraphNode>>,
}

impl SerialNode {
    pub fn new(processor: Arc<dyn Processor>, next: Option<Arc<dyn GraphNode>>) -> Self {
        Self { processor, next }
    }
}

impl Processor for SerialNode {
    fn execute(
        &self,
        input: &mut Input,
        output: &mut crate::core::output::Output,
        data: &mut Data,
        exec_data: &mut crate::core::processor::ExecuteData,
    ) -> Result<(), CmdError> {
        self.processor.execute(input, output, data, exec_data)
    }

    fn complete(
        &self,
        input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<crate::completion::record::Completion>, CmdError> {
        self.processor.complete(input, data)
    }

    fn usage(
        &self,
        input: &mut Input,
        data: &mut Data,
        usage: &mut crate::engine::usage::Usage,
    ) -> Result<(), CmdError> {
        self.processor.usage(input, data, usage)
    }
}

impl GraphNode for SerialNode {
    fn next(
        &self,
        _input: &mut Input,
        _data: &mut Data,
    ) -> Result<Option<Arc<dyn GraphNode>>, CmdError> {
        Ok(self.next.clone())
    }

    fn usage_next(&self) -> Option<Arc<dyn GraphNode>> {
        self.next.clone()
    }
}

/// Chain processors left-to-right into a linear graph.
pub fn serial(processors: Vec<Arc<dyn Processor>>) -> Arc<dyn GraphNode> {
    serial_with_tail(processors, None)
}

/// Chain processors left-to-right, ending at an existing subgraph.
pub fn serial_with_tail(
    processors: Vec<Arc<dyn Processor>>,
    tail: Option<Arc<dyn GraphNode>>,
) -> Arc<dyn GraphNode> {
    let mut next = tail;
    for processor in processors.into_iter().rev() {
        next = Some(Arc::new(SerialNode::new(processor, next)) as Arc<dyn GraphNode>);
    }
    match next {
        Some(node) => node,
        None => Arc::new(SerialNode::new(
            Arc::new(crate::core::processor::NoopProcessor),
            None,
        )),
    }
}

/// Wrap a single processor as a terminal node.
pub fn leaf(processor: Arc<dyn Processor>) -> Arc<dyn GraphNode> {
    Arc::new(SerialNode::new(processor, None))
}
