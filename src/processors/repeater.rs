//! Node Repeater
//!
//! Runs an inner subgraph repeatedly, each iteration a fresh pass over the
//! shared input. Terminates on reaching the maximum, running out of input
//! after the minimum, or an inner parse failure after the minimum. A
//! not-enough-args error before the minimum propagates.

use std::sync::Arc;

use crate::completion::record::Completion;
use crate::core::errors::CmdError;
use crate::core::node::GraphNode;
use crate::core::output::Output;
use crate::core::processor::{ExecuteData, Processor};
use crate::data::Data;
use crate::engine::complete::complete_walk;
use crate::engine::execute::walk;
use crate::engine::usage::{walk_usage, Usage};
use crate::input::{Count, Input};

pub struct NodeRepeater {
    inner: Arc<dyn GraphNode>,
    min: usize,
    optional: Count,
}

impl NodeRepeater {
    pub fn new(inner: Arc<dyn GraphNode>, min: usize, optional: Count) -> Self {
        Self { inner, min, optional }
    }

    pub fn arc(self) -> Arc<dyn Processor> {
        Arc::new(self)
    }

    fn at_max(&self, iterations: usize) -> bool {
        match self.optional {
            Count::Fixed(n) => iterations >= self.min + n,
            Count::Unbounded => false,
        }
    }

    fn parse_failure(err: &CmdError) -> bool {
        matches!(err, CmdError::NotEnoughArgs { .. } | CmdError::Conversion { .. })
    }
}

impl Processor for NodeRepeater {
    fn execute(
        &self,
        input: &mut Input,
        output: &mut Output,
        data: &mut Data,
        exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        let mut iterations = 0;
        loop {
            if self.at_max(iterations) {
                return Ok(());
            }
            if iterations >= self.min && input.num_remaining() == 0 {
                return Ok(());
            }
            let before = input.num_remaining();
            match walk(&self.inner, input, output, data, exec_data) {
                Ok(()) => {}
                Err(err) if iterations >= self.min && Self::parse_failure(&err) => {
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
            iterations += 1;
            // An iteration that consumed nothing would never terminate.
            if input.num_remaining() == before && iterations >= self.min {
                return Ok(());
            }
        }
    }

    fn complete(
        &self,
        input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
        let mut iterations = 0;
        loop {
            if self.at_max(iterations) {
                return Ok(None);
            }
            if iterations >= self.min && input.num_remaining() == 0 {
                return Ok(None);
            }
            let before = input.num_remaining();
            match complete_walk(&self.inner, input, data) {
                Ok(Some(completion)) => return Ok(Some(completion)),
                Ok(None) => {}
                Err(err) if iterations >= self.min && Self::parse_failure(&err) => {
                    return Ok(None);
                }
                Err(err) => return Err(err),
            }
            iterations += 1;
            if input.num_remaining() == before && iterations >= self.min {
                return Ok(None);
            }
        }
    }

    fn usage(
        &self,
        input: &mut Input,
        data: &mut Data,
        usage: &mut Usage,
    ) -> Result<(), CmdError> {
        walk_usage(&self.inner, input, data, usage)?;
        if !matches!(self.optional, Count::Fixed(0)) {
            usage.add_usage_token("...");
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{Arg, ArgOpts};
    use crate::core::serial;
    use crate::engine;

    fn pair_graph() -> Arc<dyn GraphNode> {
        // Each iteration consumes a key and an int value, accumulating.
        let key = Arg::<String>::new("key", "key", ArgOpts::new().custom_setter(|v, data| {
            let mut keys: Vec<String> = data.get("keys").unwrap_or_default();
            keys.push(v);
            data.set("keys", keys);
        }));
        let value = Arg::<i64>::new("value", "value", ArgOpts::new().custom_setter(|v, data| {
            let mut values: Vec<i64> = data.get("values").unwrap_or_default();
            values.push(v);
            data.set("values", values);
        }));
        serial(vec![key.arc(), value.arc()])
    }

    fn run(root: &Arc<dyn GraphNode>, args: &[&str]) -> (Data, Result<(), CmdError>) {
        let mut input = Input::from_args(args.iter().copied());
        let mut output = Output::new();
        let mut data = Data::new();
        let result = engine::execute(root, &mut input, &mut output, &mut data).map(|_| ());
        (data, result)
    }

    #[test]
    fn test_repeats_until_input_runs_out() {
        let root = serial(vec![NodeRepeater::new(pair_graph(), 1, Count::Unbounded).arc()]);
        let (data, result) = run(&root, &["a", "1", "b", "2", "c", "3"]);
        result.unwrap();
        assert_eq!(data.string_list("keys"), Some(vec!["a".into(), "b".into(), "c".into()]));
        assert_eq!(data.int_list("values"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_min_iterations_enforced() {
        let root = serial(vec![NodeRepeater::new(pair_graph(), 2, Count::Unbounded).arc()]);
        let (_, result) = run(&root, &["a", "1"]);
        let err = result.unwrap_err();
        assert!(matches!(err, CmdError::NotEnoughArgs { .. }), "{}", err);
    }

    #[test]
    fn test_max_iterations_leaves_rest() {
        let repeater = NodeRepeater::new(pair_graph(), 0, Count::Fixed(1)).arc();
        let rest = Arg::<Vec<String>>::list("rest", "rest", 0, Count::Unbounded, ArgOpts::new());
        let root = serial(vec![repeater, rest.arc()]);
        let (data, result) = run(&root, &["a", "1", "b", "2"]);
        result.unwrap();
        assert_eq!(data.string_list("keys"), Some(vec!["a".to_string()]));
        assert_eq!(data.string_list("rest"), Some(vec!["b".into(), "2".into()]));
    }

    #[test]
    fn test_parse_failure_after_min_stops() {
        // Third pair's value is not an int; after the minimum the repeater
        // stops instead of failing.
        let repeater = NodeRepeater::new(pair_graph(), 1, Count::Unbounded).arc();
        let rest = Arg::<Vec<String>>::list("rest", "rest", 0, Count::Unbounded, ArgOpts::new());
        let root = serial(vec![repeater, rest.arc()]);
        let (data, result) = run(&root, &["a", "1", "b", "oops"]);
        result.unwrap();
        assert_eq!(data.int_list("values"), Some(vec![1]));
    }

    #[test]
    fn test_parse_failure_before_min_propagates() {
        let root = serial(vec![NodeRepeater::new(pair_graph(), 1, Count::Unbounded).arc()]);
        let (_, result) = run(&root, &["a", "oops"]);
        assert!(matches!(result.unwrap_err(), CmdError::Conversion { .. }));
    }

    #[test]
    fn test_completion_inside_iteration() {
        let inner = serial(vec![Arg::<String>::new(
            "choice",
            "choice",
            ArgOpts::new()
                .completer(crate::completion::completers::SimpleCompleter::new(["apple", "pear"])),
        )
        .arc()]);
        let root = serial(vec![NodeRepeater::new(inner, 0, Count::Unbounded).arc()]);
        let out = engine::autocomplete_tokens(&root, ["apple", "p"]).unwrap();
        assert_eq!(out.suggestions, vec!["pear"]);
    }
}
