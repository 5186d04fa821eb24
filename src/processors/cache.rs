//! Cache Node
//!
//! Wraps an inner subgraph with a persistent per-key history of past
//! invocations. A `history` sub-keyword prints the most recent cached
//! lines; otherwise the inner graph runs and, on success or validation
//! failure (but not parse/usage failure), the transformed tokens are
//! appended to the bounded history.

use std::sync::Arc;

use tracing::debug;

use crate::args::ArgOpts;
use crate::completion::record::Completion;
use crate::core::errors::CmdError;
use crate::core::node::{serial, GraphNode};
use crate::core::output::Output;
use crate::core::processor::{ExecuteData, ExecutorProcessor, Processor};
use crate::data::Data;
use crate::engine::complete::complete_walk;
use crate::engine::execute::walk;
use crate::engine::usage::{walk_usage, Usage};
use crate::flags::{flag, BoolFlag, FlagProcessor};
use crate::input::Input;
use crate::stores::CacheStore;

pub const HISTORY_KEYWORD: &str = "history";

const PREFIX_DATA_KEY: &str = "cache-history-prefix";

pub struct CacheNode {
    key: String,
    store: Arc<dyn CacheStore>,
    inner: Arc<dyn GraphNode>,
    history_graph: Arc<dyn GraphNode>,
    cap: usize,
}

impl CacheNode {
    pub fn new(key: impl Into<String>, store: Arc<dyn CacheStore>, inner: Arc<dyn GraphNode>) -> Self {
        Self::with_options(key, store, inner, 100, 1)
    }

    /// `cap` bounds stored entries; `default_history_len` is the `-n`
    /// default when printing.
    pub fn with_options(
        key: impl Into<String>,
        store: Arc<dyn CacheStore>,
        inner: Arc<dyn GraphNode>,
        cap: usize,
        default_history_len: i64,
    ) -> Self {
        let key = key.into();
        let history_graph = history_graph(key.clone(), store.clone(), default_history_len);
        Self {
            key,
            store,
            inner,
            history_graph,
            cap,
        }
    }

    pub fn arc(self) -> Arc<dyn Processor> {
        Arc::new(self)
    }

    fn record(&self, entry: Vec<String>) {
        if entry.is_empty() {
            return;
        }
        let history = self.store.history(&self.key);
        if history.last() == Some(&entry) {
            return;
        }
        debug!(key = %self.key, "cache entry recorded");
        self.store.append(&self.key, entry, self.cap);
        self.store.mark_changed();
    }
}

impl Processor for CacheNode {
    fn execute(
        &self,
        input: &mut Input,
        output: &mut Output,
        data: &mut Data,
        exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        if input.peek() == Some(HISTORY_KEYWORD) {
            let prefix = input.processed_values();
            input.pop();
            data.set(PREFIX_DATA_KEY.to_string(), prefix);
            return walk(&self.history_graph, input, output, data, exec_data);
        }

        let snapshot = input.snapshot();
        let result = walk(&self.inner, input, output, data, exec_data);
        match &result {
            Ok(()) => {
                if input.fully_processed() {
                    self.record(input.get_snapshot(snapshot));
                }
            }
            Err(CmdError::ValidationFailed { .. }) => {
                self.record(input.get_snapshot(snapshot));
            }
            Err(_) => {}
        }
        result
    }

    fn complete(
        &self,
        input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
        if input.peek() == Some(HISTORY_KEYWORD) && input.num_remaining() > 1 {
            input.pop();
            return complete_walk(&self.history_graph, input, data);
        }
        complete_walk(&self.inner, input, data)
    }

    fn usage(
        &self,
        input: &mut Input,
        data: &mut Data,
        usage: &mut Usage,
    ) -> Result<(), CmdError> {
        usage.add_symbol(HISTORY_KEYWORD, "print the cached invocation history");
        walk_usage(&self.inner, input, data, usage)
    }
}

fn history_graph(key: String, store: Arc<dyn CacheStore>, default_len: i64) -> Arc<dyn GraphNode> {
    let flags = FlagProcessor::new(vec![
        flag::<i64>(
            "n",
            Some('n'),
            "number of history entries to print",
            ArgOpts::new().default_value(default_len),
        ),
        BoolFlag::new("prefix", Some('p'), "prefix entries with the preceding arguments"),
    ]);
    let printer = ExecutorProcessor::new(move |output: &mut Output, data: &mut Data| {
        let n = data.int("n").unwrap_or(default_len).max(0) as usize;
        let with_prefix = data.bool("prefix").unwrap_or(false);
        let prefix = data.string_list(PREFIX_DATA_KEY).unwrap_or_default();
        let history = store.history(&key);
        let start = history.len().saturating_sub(n);
        for entry in &history[start..] {
            let line = entry.join(" ");
            if with_prefix && !prefix.is_empty() {
                output.stdoutln(format!("{} {}", prefix.join(" "), line));
            } else {
                output.stdoutln(line);
            }
        }
        Ok(())
    });
    serial(vec![flags.arc(), Arc::new(printer)])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{validators, Arg};
    use crate::branch::BranchNode;
    use crate::input::Count;
    use crate::stores::MemoryCache;

    fn inner_graph() -> Arc<dyn GraphNode> {
        serial(vec![
        Arg::<String>::new("s", "a string", ArgOpts::new()).arc(),
        Arg::<Vec<i64>>::list("il", "two ints", 2, Count::Fixed(0), ArgOpts::new()).arc(),
        Arg::<Vec<f64>>::list("fl", "some floats", 1, Count::Fixed(3), ArgOpts::new()).arc(),
        ])
    }

    fn run(root: &Arc<dyn GraphNode>, args: &[&str]) -> (String, Data, Result<(), CmdError>) {
        let mut input = Input::from_args(args.iter().copied());
        let mut output = Output::new();
        let mut data = Data::new();
        let result = crate::engine::execute(root, &mut input, &mut output, &mut data).map(|_| ());
        (output.into_parts().0, data, result)
    }

    #[test]
    fn test_history_prints_last_n() {
        let store = Arc::new(MemoryCache::with_history(
            "money",
            &[&["first", "1"], &["second", "2"], &["usd", "1", "2", "4"]],
        ));
        let root = serial(vec![CacheNode::new("money", store, inner_graph()).arc()]);
        let (stdout, _, result) = run(&root, &["history", "-n", "2"]);
        result.unwrap();
        assert_eq!(stdout, "second 2\nusd 1 2 4\n");
    }

    #[test]
    fn test_history_default_length() {
        let store = Arc::new(MemoryCache::with_history("money", &[&["a", "1", "2", "3"], &["b", "4", "5", "6"]]));
        let root = serial(vec![CacheNode::new("money", store, inner_graph()).arc()]);
        let (stdout, _, result) = run(&root, &["history"]);
        result.unwrap();
        assert_eq!(stdout, "b 4 5 6\n");
    }

    #[test]
    fn test_history_prefix_flag() {
        let store = Arc::new(MemoryCache::with_history("money", &[&["usd", "1", "2", "4"]]));
        let cache = CacheNode::new("money", store, inner_graph()).arc();
        let root = BranchNode::new(vec![("money", serial(vec![cache]))]).arc();
        let (stdout, _, result) = run(&root, &["money", "history", "-p"]);
        result.unwrap();
        assert_eq!(stdout, "money usd 1 2 4\n");
    }

    #[test]
    fn test_successful_run_recorded() {
        let store = Arc::new(MemoryCache::new());
        let root = serial(vec![CacheNode::new("money", store.clone(), inner_graph()).arc()]);
        let (_, _, result) = run(&root, &["usd", "1", "2", "4"]);
        result.unwrap();
        assert_eq!(
            store.history("money"),
            vec![vec!["usd".to_string(), "1".to_string(), "2".to_string(), "4".to_string()]]
        );
        assert!(store.changed());
    }

    #[test]
    fn test_duplicate_entry_not_recorded_again() {
        let store = Arc::new(MemoryCache::with_history("money", &[&["usd", "1", "2", "4"]]));
        let root = serial(vec![CacheNode::new("money", store.clone(), inner_graph()).arc()]);
        let (_, _, result) = run(&root, &["usd", "1", "2", "4"]);
        result.unwrap();
        assert_eq!(store.history("money").len(), 1);
        assert!(!store.changed());
    }

    #[test]
    fn test_validation_failure_still_recorded() {
        let store = Arc::new(MemoryCache::new());
        let inner = serial(vec![Arg::<i64>::new(
            "n",
            "a number",
            ArgOpts::new().validator(validators::gte(0)),
        )
        .arc()]);
        let root = serial(vec![CacheNode::new("nums", store.clone(), inner).arc()]);
        let (_, _, result) = run(&root, &["-5"]);
        assert!(matches!(result.unwrap_err(), CmdError::ValidationFailed { .. }));
        assert_eq!(store.history("nums"), vec![vec!["-5".to_string()]]);
    }

    #[test]
    fn test_parse_failure_not_recorded() {
        let store = Arc::new(MemoryCache::new());
        let root = serial(vec![CacheNode::new("money", store.clone(), inner_graph()).arc()]);
        let (_, _, result) = run(&root, &["usd", "x", "2", "4"]);
        assert!(result.is_err());
        assert!(store.history("money").is_empty());
        assert!(!store.changed());
    }

    #[test]
    fn test_cap_drops_oldest_entries() {
        let store = Arc::new(MemoryCache::new());
        let inner = serial(vec![Arg::<String>::new("s", "a string", ArgOpts::new()).arc()]);
        let root = serial(vec![
            CacheNode::with_options("k", store.clone(), inner, 2, 1).arc(),
        ]);
        for token in ["a", "b", "c"] {
            let (_, _, result) = run(&root, &[token]);
            result.unwrap();
        }
        assert_eq!(
            store.history("k"),
            vec![vec!["b".to_string()], vec!["c".to_string()]]
        );
    }

    #[test]
    fn test_completion_flows_to_inner() {
        let store = Arc::new(MemoryCache::new());
        let inner = serial(vec![Arg::<String>::new(
            "s",
            "a string",
            ArgOpts::new().completer(crate::completion::completers::SimpleCompleter::new(["usd", "eur"])),
        )
        .arc()]);
        let root = serial(vec![CacheNode::new("money", store, inner).arc()]);
        let out = crate::engine::autocomplete_tokens(&root, ["u"]).unwrap();
        assert_eq!(out.suggestions, vec!["usd"]);
    }
}
