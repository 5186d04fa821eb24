//! Branch Node
//!
//! Keyword dispatch: the next input token picks the subgraph to traverse.
//! Supports synonyms, a default subgraph for unmatched input, and explicit
//! ordering of the branch usage listing.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::completion::record::Completion;
use crate::core::errors::{CmdError, TokenList};
use crate::core::node::GraphNode;
use crate::core::output::Output;
use crate::core::processor::{ExecuteData, Processor};
use crate::data::Data;
use crate::engine::complete::complete_walk;
use crate::engine::usage::{walk_usage, Usage};
use crate::input::Input;

pub struct BranchNode {
    branches: IndexMap<String, Arc<dyn GraphNode>>,
    /// alias → canonical key
    synonyms: HashMap<String, String>,
    default: Option<Arc<dyn GraphNode>>,
    default_completion: bool,
    /// `None`: alphabetical. `Some(vec![])`: no branch usage. Populated:
    /// the given order; unknown or duplicate keys are rejected.
    usage_order: Option<Vec<String>>,
}

impl BranchNode {
    /// Build from `(key, subgraph)` pairs. A key may carry inline synonyms
    /// as extra whitespace-separated words: `"hello hi greetings"`.
    pub fn new<S: AsRef<str>>(branches: Vec<(S, Arc<dyn GraphNode>)>) -> Self {
        let mut node = Self {
            branches: IndexMap::new(),
            synonyms: HashMap::new(),
            default: None,
            default_completion: false,
            usage_order: None,
        };
        for (key, subgraph) in branches {
            let mut words = key.as_ref().split_whitespace();
            let canonical = words.next().unwrap_or_default().to_string();
            for alias in words {
                node.synonyms.insert(alias.to_string(), canonical.clone());
            }
            node.branches.insert(canonical, subgraph);
        }
        node
    }

    pub fn with_synonyms(mut self, canonical: &str, aliases: &[&str]) -> Self {
        for alias in aliases {
            self.synonyms.insert(alias.to_string(), canonical.to_string());
        }
        self
    }

    pub fn with_default(mut self, default: Arc<dyn GraphNode>) -> Self {
        self.default = Some(default);
        self
    }

    /// When the cursor sits on the branch keyword, complete through the
    /// default subgraph instead of suggesting branch names.
    pub fn default_completion(mut self) -> Self {
        self.default_completion = true;
        self
    }

    pub fn usage_order<S: Into<String>>(mut self, order: Vec<S>) -> Self {
        self.usage_order = Some(order.into_iter().map(|s| s.into()).collect());
        self
    }

    pub fn arc(self) -> Arc<dyn GraphNode> {
        Arc::new(self)
    }

    fn resolve(&self, token: &str) -> Option<&Arc<dyn GraphNode>> {
        if let Some(subgraph) = self.branches.get(token) {
            return Some(subgraph);
        }
        self.synonyms.get(token).and_then(|canonical| self.branches.get(canonical))
    }

    fn sorted_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.branches.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn key_display(&self, canonical: &str) -> String {
        let mut aliases: Vec<&str> = self
            .synonyms
            .iter()
            .filter(|(_, c)| c.as_str() == canonical)
            .map(|(a, _)| a.as_str())
            .collect();
        if aliases.is_empty() {
            return canonical.to_string();
        }
        aliases.sort();
        format!("{}|{}", canonical, aliases.join("|"))
    }
}

impl Processor for BranchNode {
    fn execute(
        &self,
        _input: &mut Input,
        _output: &mut Output,
        _data: &mut Data,
        _exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        // Dispatch happens in `next`; the keyword pop is atomic with edge
        // resolution.
        Ok(())
    }

    fn complete(
        &self,
        input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
        if input.num_remaining() > 1 {
            // Cursor is past the keyword: dispatch through `next`.
            return Ok(None);
        }
        if self.default_completion {
            if let Some(default) = &self.default {
                return complete_walk(default, input, data);
            }
        }
        Ok(Some(Completion {
            suggestions: self.branches.keys().cloned().collect(),
            case_insensitive: true,
            ..Completion::default()
        }))
    }

    fn usage(
        &self,
        input: &mut Input,
        data: &mut Data,
        usage: &mut Usage,
    ) -> Result<(), CmdError> {
        let order: Vec<String> = match &self.usage_order {
            None => self.sorted_keys(),
            Some(order) => {
                let mut seen = std::collections::HashSet::new();
                for key in order {
                    if !self.branches.contains_key(key) {
                        return Err(CmdError::custom(format!(
                            "branch usage order references unknown key \"{}\"",
                            key
                        )));
                    }
                    if !seen.insert(key.clone()) {
                        return Err(CmdError::custom(format!(
                            "branch usage order repeats key \"{}\"",
                            key
                        )));
                    }
                }
                order.clone()
            }
        };

        for key in &order {
            let subgraph = &self.branches[key];
            let mut sub = Usage::default();
            walk_usage(subgraph, input, data, &mut sub)?;
            usage.add_sub_usage(self.key_display(key), sub);
        }

        if let Some(default) = &self.default {
            walk_usage(default, input, data, usage)?;
        }
        Ok(())
    }
}

impl GraphNode for BranchNode {
    fn next(
        &self,
        input: &mut Input,
        _data: &mut Data,
    ) -> Result<Option<Arc<dyn GraphNode>>, CmdError> {
        if let Some(token) = input.peek() {
            if let Some(subgraph) = self.resolve(token) {
                let subgraph = subgraph.clone();
                input.pop();
                return Ok(Some(subgraph));
            }
        }
        match &self.default {
            Some(default) => Ok(Some(default.clone())),
            None => Err(CmdError::Branching(TokenList(self.sorted_keys()))),
        }
    }

    fn usage_next(&self) -> Option<Arc<dyn GraphNode>> {
        None
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{leaf, printer, serial};
    use crate::engine;

    fn run(root: &Arc<dyn GraphNode>, args: &[&str]) -> (String, Result<(), CmdError>) {
        let mut input = Input::from_args(args.iter().copied());
        let mut output = Output::new();
        let mut data = Data::new();
        let result = engine::execute(root, &mut input, &mut output, &mut data).map(|_| ());
        (output.stdout_str().to_string(), result)
    }

    fn greeting_branch() -> Arc<dyn GraphNode> {
        BranchNode::new(vec![("hello hi greetings", leaf(printer("yo")))])
            .with_synonyms("hello", &["hey", "howdy"])
            .with_default(leaf(printer("default")))
            .arc()
    }

    #[test]
    fn test_branch_key_dispatch() {
        let (stdout, result) = run(&greeting_branch(), &["hello"]);
        result.unwrap();
        assert_eq!(stdout, "yo\n");
    }

    #[test]
    fn test_branch_synonym_dispatch() {
        for alias in ["hi", "greetings", "hey", "howdy"] {
            let (stdout, result) = run(&greeting_branch(), &[alias]);
            result.unwrap();
            assert_eq!(stdout, "yo\n", "alias {}", alias);
        }
    }

    #[test]
    fn test_branch_default_does_not_pop() {
        // The unmatched token flows into the default subgraph.
        let default = serial(vec![crate::args::Arg::<String>::new(
            "s",
            "a string",
            crate::args::ArgOpts::new(),
        )
        .arc()]);
        let root = BranchNode::new(vec![("hello", leaf(printer("yo")))])
            .with_default(default)
            .arc();
        let mut input = Input::from_args(["what"]);
        let mut output = Output::new();
        let mut data = Data::new();
        engine::execute(&root, &mut input, &mut output, &mut data).unwrap();
        assert_eq!(data.string("s").as_deref(), Some("what"));
    }

    #[test]
    fn test_branch_default_fallback_prints() {
        let (stdout, result) = run(&greeting_branch(), &["what"]);
        // "what" is left for the default subgraph, which consumes nothing;
        // the engine then flags it as an extra arg.
        assert!(result.is_err());
        assert_eq!(stdout, "default\n");
    }

    #[test]
    fn test_branch_error_without_default() {
        let root = BranchNode::new(vec![
            ("beta", leaf(printer("b"))),
            ("alpha", leaf(printer("a"))),
        ])
        .arc();
        let (_, result) = run(&root, &["gamma"]);
        let err = result.unwrap_err();
        assert!(err.is_usage_error());
        assert_eq!(err.to_string(), "Branching argument must be one of [alpha beta]");
    }

    #[test]
    fn test_branch_completion_suggests_canonical_keys() {
        let root = greeting_branch();
        let out = engine::autocomplete_tokens(&root, [""]).unwrap();
        assert_eq!(out.suggestions, vec!["hello"]);
        // Synonyms are not suggested.
        let out = engine::autocomplete_tokens(&root, ["ho"]).unwrap();
        assert!(out.suggestions.is_empty());
    }

    #[test]
    fn test_branch_completion_past_keyword_delegates() {
        let sub = serial(vec![crate::args::Arg::<String>::new(
            "s",
            "a string",
            crate::args::ArgOpts::new()
                .completer(crate::completion::completers::SimpleCompleter::new(["one", "two"])),
        )
        .arc()]);
        let root = BranchNode::new(vec![("go", sub)]).arc();
        let out = engine::autocomplete_tokens(&root, ["go", "t"]).unwrap();
        assert_eq!(out.suggestions, vec!["two"]);
    }

    #[test]
    fn test_branch_default_completion_flag() {
        let default = serial(vec![crate::args::Arg::<String>::new(
            "s",
            "a string",
            crate::args::ArgOpts::new()
                .completer(crate::completion::completers::SimpleCompleter::new(["door", "window"])),
        )
        .arc()]);
        let root = BranchNode::new(vec![("hello", leaf(printer("yo")))])
            .with_default(default)
            .default_completion()
            .arc();
        let out = engine::autocomplete_tokens(&root, ["d"]).unwrap();
        assert_eq!(out.suggestions, vec!["door"]);
    }

    #[test]
    fn test_branch_usage_alphabetical_when_unordered() {
        let root = BranchNode::new(vec![
            ("beta", leaf(printer("b"))),
            ("alpha", leaf(printer("a"))),
        ])
        .arc();
        let text = engine::usage_text(&root).unwrap();
        let alpha = text.find("alpha:").unwrap();
        let beta = text.find("beta:").unwrap();
        assert!(alpha < beta, "{}", text);
    }

    #[test]
    fn test_branch_usage_empty_order_hides_branches() {
        let root = BranchNode::new(vec![("beta", leaf(printer("b")))])
            .usage_order(Vec::<String>::new())
            .arc();
        let text = engine::usage_text(&root).unwrap();
        assert!(!text.contains("beta"), "{}", text);
    }

    #[test]
    fn test_branch_usage_order_rejects_unknown_key() {
        let root = BranchNode::new(vec![("beta", leaf(printer("b")))])
            .usage_order(vec!["gamma"])
            .arc();
        assert!(engine::usage_text(&root).is_err());
    }

    #[test]
    fn test_branch_usage_order_rejects_duplicate_key() {
        let root = BranchNode::new(vec![("beta", leaf(printer("b")))])
            .usage_order(vec!["beta", "beta"])
            .arc();
        assert!(engine::usage_text(&root).is_err());
    }

    #[test]
    fn test_branch_usage_shows_synonyms() {
        let root = greeting_branch();
        let text = engine::usage_text(&root).unwrap();
        assert!(
            text.contains("hello|greetings|hey|hi|howdy:"),
            "{}",
            text
        );
    }
}
