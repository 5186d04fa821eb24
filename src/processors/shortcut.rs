//! Shortcut Node
//!
//! Wraps an inner subgraph with a persistent name → token-list store. A
//! hidden `shortcuts` sub-branch manages the store (add, delete, get,
//! list, search); any other leading token naming a stored shortcut is
//! spliced out and replaced by the stored tokens before the inner graph
//! runs. Adding a shortcut runs the inner graph over the value tokens so
//! the stored form is the transformed one; transformers must therefore be
//! idempotent with respect to their own output.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex_lite::Regex;
use tracing::debug;

use crate::args::{Arg, ArgOpts};
use crate::branch::BranchNode;
use crate::completion::completers::CompleterFromFunc;
use crate::completion::record::Completion;
use crate::core::errors::CmdError;
use crate::core::node::{leaf, serial, GraphNode};
use crate::core::output::Output;
use crate::core::processor::{ExecuteData, ExecutorProcessor, Processor, SimpleProcessor};
use crate::data::Data;
use crate::engine::complete::complete_walk;
use crate::engine::execute::walk;
use crate::engine::usage::{walk_usage, Usage};
use crate::input::{Count, Input};
use crate::stores::ShortcutStore;

pub const SHORTCUTS_KEYWORD: &str = "shortcuts";

lazy_static! {
    static ref SHORTCUT_NAME: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

pub struct ShortcutNode {
    inner: Arc<dyn GraphNode>,
    cli: Arc<dyn GraphNode>,
    store_name: String,
    store: Arc<dyn ShortcutStore>,
}

impl ShortcutNode {
    pub fn new(
        store_name: impl Into<String>,
        store: Arc<dyn ShortcutStore>,
        inner: Arc<dyn GraphNode>,
    ) -> Self {
        let store_name = store_name.into();
        let cli = shortcuts_cli(&store_name, store.clone(), inner.clone());
        Self {
            inner,
            cli,
            store_name,
            store,
        }
    }

    pub fn arc(self) -> Arc<dyn Processor> {
        Arc::new(self)
    }

    fn expand(&self, input: &mut Input) {
        if let Some(token) = input.peek() {
            if let Some(tokens) = self.store.get(&self.store_name, token) {
                debug!(shortcut = %token, "shortcut expanded");
                input.pop();
                input.push_front(tokens);
            }
        }
    }
}

impl Processor for ShortcutNode {
    fn execute(
        &self,
        input: &mut Input,
        output: &mut Output,
        data: &mut Data,
        exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        if input.peek() == Some(SHORTCUTS_KEYWORD) {
            input.pop();
            return walk(&self.cli, input, output, data, exec_data);
        }
        self.expand(input);
        walk(&self.inner, input, output, data, exec_data)
    }

    fn complete(
        &self,
        input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
        if input.num_remaining() > 1 {
            if input.peek() == Some(SHORTCUTS_KEYWORD) {
                input.pop();
                return complete_walk(&self.cli, input, data);
            }
            // Never expand the token still under the cursor.
            self.expand(input);
        }
        complete_walk(&self.inner, input, data)
    }

    fn usage(
        &self,
        input: &mut Input,
        data: &mut Data,
        usage: &mut Usage,
    ) -> Result<(), CmdError> {
        usage.add_symbol("*", "Start of new shortcut-able section");
        walk_usage(&self.inner, input, data, usage)
    }
}

// ============================================================================
// The hidden `shortcuts` sub-branch
// ============================================================================

fn format_entry(name: &str, tokens: &[String]) -> String {
    format!("{}: {}", name, tokens.join(" "))
}

fn name_arg(store_name: &str, store: Arc<dyn ShortcutStore>) -> Arg<Vec<String>> {
    let store_name = store_name.to_string();
    Arg::<Vec<String>>::list(
        "shortcut",
        "shortcut name",
        1,
        Count::Unbounded,
        ArgOpts::new().completer(CompleterFromFunc::new(move |_: &Vec<String>, _: &Data| {
            Ok(Completion {
                suggestions: store.names(&store_name),
                distinct: true,
                ..Completion::default()
            })
        })),
    )
}

fn add_node(
    store_name: String,
    store: Arc<dyn ShortcutStore>,
    inner: Arc<dyn GraphNode>,
) -> Arc<dyn GraphNode> {
    let exec_store = store.clone();
    let exec_store_name = store_name.clone();
    let exec_inner = inner.clone();
    let processor = SimpleProcessor::new(move |input, _output, data, _exec| {
        let name = match input.pop() {
            Some(r) => input.value(r).to_string(),
            None => {
                return Err(CmdError::NotEnoughArgs {
                    name: "shortcut".to_string(),
                    required: 1,
                    got: 0,
                })
            }
        };
        if !SHORTCUT_NAME.is_match(&name) {
            return Err(CmdError::custom(format!("invalid shortcut name \"{}\"", name)));
        }
        if name == SHORTCUTS_KEYWORD {
            return Err(CmdError::custom(format!(
                "shortcut name cannot be \"{}\"",
                SHORTCUTS_KEYWORD
            )));
        }
        if exec_store.get(&exec_store_name, &name).is_some() {
            return Err(CmdError::custom(format!("shortcut \"{}\" already exists", name)));
        }

        // Run the inner graph over the value tokens so transformers and
        // complexecute rewrite them in place, then capture the transformed
        // form. Partial invocations are allowed.
        let snapshot = input.snapshot();
        let mut scratch_output = Output::ignoring_not_enough_args();
        let mut scratch_exec = ExecuteData::default();
        match walk(&exec_inner, input, &mut scratch_output, data, &mut scratch_exec) {
            Ok(()) | Err(CmdError::NotEnoughArgs { .. }) => {}
            Err(err) => return Err(err),
        }
        let tokens = input.get_snapshot(snapshot);
        if tokens.is_empty() {
            return Err(CmdError::NotEnoughArgs {
                name: "shortcut value".to_string(),
                required: 1,
                got: 0,
            });
        }
        exec_store.set(&exec_store_name, &name, tokens);
        Ok(())
    })
    .with_complete(move |input: &mut Input, data: &mut Data| {
        if input.num_remaining() <= 1 {
            // The cursor is on the new shortcut's name: nothing to suggest.
            input.pop();
            return Ok(Some(Completion::default()));
        }
        input.pop();
        complete_walk(&inner, input, data)
    });
    leaf(Arc::new(processor))
}

fn delete_node(store_name: String, store: Arc<dyn ShortcutStore>) -> Arc<dyn GraphNode> {
    let names = name_arg(&store_name, store.clone());
    let callback = ExecutorProcessor::new(move |output: &mut Output, data: &mut Data| {
        for name in data.string_list("shortcut").unwrap_or_default() {
            if !store.delete(&store_name, &name) {
                output.stderrln(format!("Shortcut \"{}\" does not exist", name));
            }
        }
        Ok(())
    });
    serial(vec![names.arc(), Arc::new(callback)])
}

fn get_node(store_name: String, store: Arc<dyn ShortcutStore>) -> Arc<dyn GraphNode> {
    let names = name_arg(&store_name, store.clone());
    let callback = ExecutorProcessor::new(move |output: &mut Output, data: &mut Data| {
        for name in data.string_list("shortcut").unwrap_or_default() {
            match store.get(&store_name, &name) {
                Some(tokens) => output.stdoutln(format_entry(&name, &tokens)),
                None => output.stderrln(format!("Shortcut \"{}\" does not exist", name)),
            }
        }
        Ok(())
    });
    serial(vec![names.arc(), Arc::new(callback)])
}

fn list_node(store_name: String, store: Arc<dyn ShortcutStore>) -> Arc<dyn GraphNode> {
    let callback = ExecutorProcessor::new(move |output: &mut Output, _: &mut Data| {
        let mut names = store.names(&store_name);
        names.sort();
        for name in names {
            if let Some(tokens) = store.get(&store_name, &name) {
                output.stdoutln(format_entry(&name, &tokens));
            }
        }
        Ok(())
    });
    leaf(Arc::new(callback))
}

fn search_node(store_name: String, store: Arc<dyn ShortcutStore>) -> Arc<dyn GraphNode> {
    let patterns = Arg::<Vec<String>>::list(
        "regexp",
        "filter patterns",
        1,
        Count::Unbounded,
        ArgOpts::new(),
    );
    let callback = ExecutorProcessor::new(move |output: &mut Output, data: &mut Data| {
        let mut regexes = Vec::new();
        for pattern in data.string_list("regexp").unwrap_or_default() {
            let regex = Regex::new(&pattern)
                .map_err(|e| CmdError::custom(format!("invalid regex \"{}\": {}", pattern, e)))?;
            regexes.push(regex);
        }
        let mut names = store.names(&store_name);
        names.sort();
        for name in names {
            if let Some(tokens) = store.get(&store_name, &name) {
                let line = format_entry(&name, &tokens);
                if regexes.iter().all(|r| r.is_match(&line)) {
                    output.stdoutln(line);
                }
            }
        }
        Ok(())
    });
    serial(vec![patterns.arc(), Arc::new(callback)])
}

fn shortcuts_cli(
    store_name: &str,
    store: Arc<dyn ShortcutStore>,
    inner: Arc<dyn GraphNode>,
) -> Arc<dyn GraphNode> {
    BranchNode::new(vec![
        ("add a", add_node(store_name.to_string(), store.clone(), inner)),
        ("delete d", delete_node(store_name.to_string(), store.clone())),
        ("get g", get_node(store_name.to_string(), store.clone())),
        ("list l", list_node(store_name.to_string(), store.clone())),
        ("search s", search_node(store_name.to_string(), store)),
    ])
    .arc()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryShortcuts;

    fn inner_graph() -> Arc<dyn GraphNode> {
        serial(vec![
        Arg::<String>::new("s", "a string", ArgOpts::new()).arc(),
        Arg::<Vec<i64>>::list("il", "two ints", 2, Count::Fixed(0), ArgOpts::new()).arc(),
        Arg::<Vec<f64>>::list("fl", "some floats", 1, Count::Fixed(3), ArgOpts::new()).arc(),
        ])
    }

    fn node(store: Arc<MemoryShortcuts>) -> Arc<dyn GraphNode> {
        serial(vec![ShortcutNode::new("money-cli", store, inner_graph()).arc()])
    }

    fn run(root: &Arc<dyn GraphNode>, args: &[&str]) -> (String, String, Data, Result<(), CmdError>) {
        let mut input = Input::from_args(args.iter().copied());
        let mut output = Output::new();
        let mut data = Data::new();
        let result = crate::engine::execute(root, &mut input, &mut output, &mut data).map(|_| ());
        let (stdout, stderr) = output.into_parts();
        (stdout, stderr, data, result)
    }

    #[test]
    fn test_add_then_use() {
        let store = Arc::new(MemoryShortcuts::new());
        let root = node(store.clone());

        let (_, _, _, result) = run(&root, &["shortcuts", "add", "money", "usd", "1", "2", "4"]);
        result.unwrap();
        assert_eq!(
            store.get("money-cli", "money"),
            Some(vec!["usd".to_string(), "1".to_string(), "2".to_string(), "4".to_string()])
        );

        let (_, _, data, result) = run(&root, &["money"]);
        result.unwrap();
        assert_eq!(data.string("s").as_deref(), Some("usd"));
        assert_eq!(data.int_list("il"), Some(vec![1, 2]));
        assert_eq!(data.float_list("fl"), Some(vec![4.0]));
    }

    #[test]
    fn test_add_captures_transformed_tokens() {
        let store = Arc::new(MemoryShortcuts::new());
        let inner = serial(vec![Arg::<String>::new(
            "s",
            "a string",
            ArgOpts::new().transformer(|v: String, _| Ok(v.to_uppercase())),
        )
        .arc()]);
        let root = serial(vec![ShortcutNode::new("cli", store.clone(), inner).arc()]);

        let (_, _, _, result) = run(&root, &["shortcuts", "add", "big", "word"]);
        result.unwrap();
        assert_eq!(store.get("cli", "big"), Some(vec!["WORD".to_string()]));

        // Expansion splices the stored, already-transformed token.
        let (_, _, data, result) = run(&root, &["big"]);
        result.unwrap();
        assert_eq!(data.string("s").as_deref(), Some("WORD"));
    }

    #[test]
    fn test_add_partial_capture_allowed() {
        let store = Arc::new(MemoryShortcuts::new());
        let root = node(store.clone());
        // Only the first argument is provided; not-enough-args from the
        // inner graph is suppressed.
        let (_, _, _, result) = run(&root, &["shortcuts", "add", "partial", "usd"]);
        result.unwrap();
        assert_eq!(store.get("money-cli", "partial"), Some(vec!["usd".to_string()]));
    }

    #[test]
    fn test_add_existing_fails() {
        let store = Arc::new(MemoryShortcuts::with_entries("money-cli", &[("money", &["usd"])]));
        let root = node(store);
        let (_, _, _, result) = run(&root, &["shortcuts", "add", "money", "eur"]);
        assert_eq!(
            result.unwrap_err().to_string(),
            "shortcut \"money\" already exists"
        );
    }

    #[test]
    fn test_add_rejects_keyword_and_bad_names() {
        let store = Arc::new(MemoryShortcuts::new());
        let root = node(store);
        let (_, _, _, result) = run(&root, &["shortcuts", "add", "shortcuts", "x"]);
        assert!(result.unwrap_err().to_string().contains("cannot be \"shortcuts\""));
        let root = node(Arc::new(MemoryShortcuts::new()));
        let (_, _, _, result) = run(&root, &["shortcuts", "add", "bad name!", "x"]);
        assert!(result.unwrap_err().to_string().contains("invalid shortcut name"));
    }

    #[test]
    fn test_delete_get_list() {
        let store = Arc::new(MemoryShortcuts::with_entries(
            "money-cli",
            &[("money", &["usd", "1", "2", "4"]), ("euros", &["eur", "3", "4", "5"])],
        ));
        let root = node(store.clone());

        let (stdout, _, _, result) = run(&root, &["shortcuts", "get", "money"]);
        result.unwrap();
        assert_eq!(stdout, "money: usd 1 2 4\n");

        let (stdout, _, _, result) = run(&root, &["shortcuts", "list"]);
        result.unwrap();
        assert_eq!(stdout, "euros: eur 3 4 5\nmoney: usd 1 2 4\n");

        let (_, _, _, result) = run(&root, &["shortcuts", "delete", "money"]);
        result.unwrap();
        assert_eq!(store.get("money-cli", "money"), None);

        let (_, stderr, _, result) = run(&root, &["shortcuts", "delete", "money"]);
        result.unwrap();
        assert_eq!(stderr, "Shortcut \"money\" does not exist\n");
    }

    #[test]
    fn test_search_filters_by_all_regexes() {
        let store = Arc::new(MemoryShortcuts::with_entries(
            "money-cli",
            &[("money", &["usd", "1"]), ("euros", &["eur", "1"]), ("pounds", &["gbp", "2"])],
        ));
        let root = node(store);
        let (stdout, _, _, result) = run(&root, &["shortcuts", "search", "1", "^e"]);
        result.unwrap();
        assert_eq!(stdout, "euros: eur 1\n");
    }

    #[test]
    fn test_synonym_subcommands() {
        let store = Arc::new(MemoryShortcuts::with_entries("money-cli", &[("money", &["usd"])]));
        let root = node(store);
        let (stdout, _, _, result) = run(&root, &["shortcuts", "l"]);
        result.unwrap();
        assert_eq!(stdout, "money: usd\n");
    }

    #[test]
    fn test_non_shortcut_input_flows_to_inner() {
        let store = Arc::new(MemoryShortcuts::new());
        let root = node(store);
        let (_, _, data, result) = run(&root, &["eur", "5", "6", "7.5"]);
        result.unwrap();
        assert_eq!(data.string("s").as_deref(), Some("eur"));
        assert_eq!(data.int_list("il"), Some(vec![5, 6]));
        assert_eq!(data.float_list("fl"), Some(vec![7.5]));
    }

    #[test]
    fn test_delete_completion_suggests_names() {
        let store = Arc::new(MemoryShortcuts::with_entries(
            "money-cli",
            &[("money", &["usd"]), ("euros", &["eur"])],
        ));
        let root = node(store);
        let out = crate::engine::autocomplete_tokens(&root, ["shortcuts", "delete", "m"]).unwrap();
        assert_eq!(out.suggestions, vec!["money"]);
    }

    #[test]
    fn test_cursor_on_shortcut_name_not_expanded() {
        let store = Arc::new(MemoryShortcuts::with_entries("money-cli", &[("money", &["usd"])]));
        let inner = serial(vec![Arg::<String>::new(
            "s",
            "a string",
            ArgOpts::new().completer(crate::completion::completers::SimpleCompleter::new(["moneybags"])),
        )
        .arc()]);
        let root = serial(vec![ShortcutNode::new("money-cli", store, inner).arc()]);
        let out = crate::engine::autocomplete_tokens(&root, ["money"]).unwrap();
        // The inner completer sees the literal token, not the expansion.
        assert_eq!(out.suggestions, vec!["moneybags"]);
    }
}
