//! Argument Processors
//!
//! Typed positional arguments: single required, single optional, and list
//! (with a minimum and an optional count that may be unbounded). All three
//! share one algorithm for execute, complete, and usage; flags reuse the
//! same core against their spliced value tokens.

use std::sync::Arc;

use tracing::trace;

use crate::completion::record::Completion;
use crate::core::errors::CmdError;
use crate::core::node::GraphNode;
use crate::core::output::Output;
use crate::core::processor::{ExecuteData, Processor};
use crate::data::{ArgValue, Data};
use crate::engine::usage::Usage;
use crate::input::{ArgRef, Count, Input, InputBreaker};

use super::complexecute::run_complexecute;
use super::options::{ArgOpts, ShortcutExpansion};

pub struct Arg<T: ArgValue> {
    name: String,
    desc: String,
    min: usize,
    optional: Count,
    opts: ArgOpts<T>,
}

impl<T: ArgValue> Arg<T> {
    /// A single required argument.
    pub fn new(name: impl Into<String>, desc: impl Into<String>, opts: ArgOpts<T>) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
            min: 1,
            optional: Count::Fixed(0),
            opts,
        }
    }

    /// A single optional argument.
    pub fn optional(name: impl Into<String>, desc: impl Into<String>, opts: ArgOpts<T>) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
            min: 0,
            optional: Count::Fixed(1),
            opts,
        }
    }

    /// A list argument consuming `min` to `min + optional` tokens.
    pub fn list(
        name: impl Into<String>,
        desc: impl Into<String>,
        min: usize,
        optional: Count,
        opts: ArgOpts<T>,
    ) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
            min,
            optional,
            opts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arc(self) -> Arc<dyn Processor> {
        Arc::new(self)
    }

    fn breakers(&self) -> Vec<Arc<dyn InputBreaker>> {
        self.opts
            .breakers
            .iter()
            .map(|b| b.clone() as Arc<dyn InputBreaker>)
            .collect()
    }

    fn store(&self, value: T, data: &mut Data) {
        match &self.opts.custom_setter {
            Some(setter) => setter(value, data),
            None => data.set(self.name.clone(), value),
        }
    }

    fn apply_default(&self, data: &mut Data) {
        if let Some(default) = &self.opts.default {
            let value = default(data);
            self.store(value, data);
        }
    }

    /// Absent-flag behavior: apply the default supplier unless something
    /// already wrote this key.
    pub(crate) fn apply_default_if_unset(&self, data: &mut Data) {
        if !data.has(&self.name) {
            self.apply_default(data);
        }
    }

    pub(crate) fn desc(&self) -> &str {
        &self.desc
    }

    pub(crate) fn validator_descs(&self) -> Vec<String> {
        self.opts.validators.iter().map(|v| v.desc().to_string()).collect()
    }

    /// Parse with fallbacks: the full token run, then the run without the
    /// trailing (cursor) token, then the zero value.
    fn parse_best_effort(&self, tokens: &[String]) -> T {
        T::parse_tokens(tokens)
            .or_else(|_| match tokens.len() {
                0 | 1 => Err(()),
                n => T::parse_tokens(&tokens[..n - 1]).map_err(|_| ()),
            })
            .unwrap_or_else(|_| T::zero())
    }

    /// The shared execute algorithm, also used by flags against their
    /// spliced value tokens.
    pub(crate) fn execute_core(
        &self,
        input: &mut Input,
        data: &mut Data,
        extra_breakers: &[Arc<dyn InputBreaker>],
    ) -> Result<(), CmdError> {
        expand_shortcut(self.opts.shortcut.as_ref(), input);

        let mut breakers = self.breakers();
        breakers.extend_from_slice(extra_breakers);
        let (refs, enough) = input.pop_n(self.min, self.optional, &breakers, data);
        trace!(arg = %self.name, popped = refs.len(), enough, "argument pop");

        if refs.is_empty() {
            if self.min > 0 {
                return Err(CmdError::NotEnoughArgs {
                    name: self.name.clone(),
                    required: self.min,
                    got: 0,
                });
            }
            self.apply_default(data);
            return Ok(());
        }

        if let (Some(cfg), Some(completer)) = (self.opts.complexecute, &self.opts.completer) {
            run_complexecute(cfg, completer, &refs, input, data)?;
        }

        let tokens = input.values(&refs);
        let mut value = T::parse_tokens(&tokens).map_err(|message| CmdError::Conversion {
            name: self.name.clone(),
            message,
        })?;

        // Tokens spliced in from a stored shortcut were captured after
        // transformation; do not transform them again.
        let already_transformed = refs.iter().all(|&r| input.is_transformed(r));
        if !self.opts.transformers.is_empty() && !already_transformed {
            for t in &self.opts.transformers {
                value = t.apply(value, data).map_err(CmdError::Transformer)?;
            }
            if T::is_list() && value.token_len() != refs.len() {
                return Err(CmdError::Transformer(
                    "transformers must return a value that is the same length as the input value"
                        .to_string(),
                ));
            }
            write_back(input, &refs, &value, true);
        } else {
            write_back(input, &refs, &value, false);
        }

        self.store(value.clone(), data);

        for v in &self.opts.validators {
            v.validate(&self.name, &value)?;
        }

        if !enough {
            return Err(CmdError::NotEnoughArgs {
                name: self.name.clone(),
                required: self.min,
                got: refs.len(),
            });
        }
        Ok(())
    }

    /// The shared complete algorithm.
    pub(crate) fn complete_core(
        &self,
        input: &mut Input,
        data: &mut Data,
        extra_breakers: &[Arc<dyn InputBreaker>],
    ) -> Result<Option<Completion>, CmdError> {
        // Do not expand a shortcut name the user is still typing.
        if input.num_remaining() > 1 {
            expand_shortcut(self.opts.shortcut.as_ref(), input);
        }

        let mut breakers = self.breakers();
        breakers.extend_from_slice(extra_breakers);
        let (refs, _) = input.pop_n(self.min, self.optional, &breakers, data);

        if !input.fully_processed() {
            // Cursor is further right: mimic execute, best effort, no
            // validation.
            if refs.is_empty() {
                self.apply_default(data);
                return Ok(None);
            }
            let tokens = input.values(&refs);
            if let Ok(mut value) = T::parse_tokens(&tokens) {
                let already_transformed = refs.iter().all(|&r| input.is_transformed(r));
                if !already_transformed {
                    for t in &self.opts.transformers {
                        match t.apply(value, data) {
                            Ok(v) => value = v,
                            Err(_) => return Ok(None),
                        }
                    }
                }
                write_back(input, &refs, &value, false);
                self.store(value, data);
            }
            return Ok(None);
        }

        // The cursor lands on this argument's tokens.
        let tokens = input.values(&refs);
        let sofar = self.parse_best_effort(&tokens);
        let completion = match &self.opts.completer {
            Some(completer) => {
                let mut completion = completer.complete(&sofar, data)?;
                if tokens.len() > 1 {
                    completion.prior_values = tokens[..tokens.len() - 1].to_vec();
                }
                completion
            }
            None => Completion::default(),
        };
        Ok(Some(completion))
    }

    pub(crate) fn usage_core(&self, input: &mut Input, data: &mut Data, usage: &mut Usage) {
        // When the caller supplied enough tokens for this argument, it has
        // no usage left to show.
        let breakers = self.breakers();
        let (refs, enough) = input.pop_n(self.min, self.optional, &breakers, data);
        if enough && !refs.is_empty() {
            return;
        }

        if self.opts.hidden {
            return;
        }

        let display = self.name.to_uppercase();
        for _ in 0..self.min {
            usage.add_usage_token(display.clone());
        }
        match self.optional {
            Count::Fixed(0) => {}
            Count::Fixed(n) => {
                let inner = vec![display.clone(); n].join(" ");
                usage.add_usage_token(format!("[ {} ]", inner));
            }
            Count::Unbounded => {
                usage.add_usage_token(format!("[ {} ... ]", display));
            }
        }

        let mut notes: Vec<String> = self.opts.validators.iter().map(|v| v.desc().to_string()).collect();
        if let Some(default) = &self.opts.default {
            let rendered = default(data).render().join(" ");
            notes.push(format!("Default: {}", rendered));
        }
        usage.add_arg(display, self.desc.clone(), notes);

        for b in &self.opts.breakers {
            if let Some((symbol, desc)) = b.usage_symbol() {
                usage.add_symbol(symbol, desc);
            }
        }
    }
}

fn write_back<T: ArgValue>(input: &mut Input, refs: &[ArgRef], value: &T, mark: bool) {
    let rendered = value.render();
    for (&r, token) in refs.iter().zip(rendered.iter()) {
        input.set_value(r, token.clone());
        if mark {
            input.set_transformed(r);
        }
    }
}

/// Splice a stored shortcut's tokens over the next input token when it
/// names one.
fn expand_shortcut(expansion: Option<&ShortcutExpansion>, input: &mut Input) {
    let Some(exp) = expansion else { return };
    let Some(token) = input.peek() else { return };
    if let Some(tokens) = exp.store.get(&exp.store_name, token) {
        input.pop();
        input.push_front(tokens);
    }
}

impl<T: ArgValue> Processor for Arg<T> {
    fn execute(
        &self,
        input: &mut Input,
        _output: &mut Output,
        data: &mut Data,
        _exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        self.execute_core(input, data, &[])
    }

    fn complete(
        &self,
        input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
        self.complete_core(input, data, &[])
    }

    fn usage(
        &self,
        input: &mut Input,
        data: &mut Data,
        usage: &mut Usage,
    ) -> Result<(), CmdError> {
        self.usage_core(input, data, usage);
        Ok(())
    }
}

impl<T: ArgValue> GraphNode for Arg<T> {
    fn next(
        &self,
        _input: &mut Input,
        _data: &mut Data,
    ) -> Result<Option<Arc<dyn GraphNode>>, CmdError> {
        Ok(None)
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
    use crate::args::validators;
    use crate::completion::completers::SimpleCompleter;
    use crate::core::serial;
    use crate::engine;
    use crate::processors::list_breaker::ListBreaker;

    fn exec(arg: Arc<dyn Processor>, args: &[&str]) -> (Data, Result<(), CmdError>) {
        let root = serial(vec![arg]);
        let mut input = Input::from_args(args.iter().copied());
        let mut output = Output::new();
        let mut data = Data::new();
        let result = engine::execute(&root, &mut input, &mut output, &mut data).map(|_| ());
        (data, result)
    }

    #[test]
    fn test_required_string() {
        let (data, result) = exec(Arg::<String>::new("s", "a string", ArgOpts::new()).arc(), &["hi"]);
        result.unwrap();
        assert_eq!(data.string("s").as_deref(), Some("hi"));
    }

    #[test]
    fn test_required_missing() {
        let (data, result) = exec(Arg::<String>::new("s", "a string", ArgOpts::new()).arc(), &[]);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Argument \"s\" requires at least 1 argument, got 0"
        );
        assert!(!data.has("s"));
    }

    #[test]
    fn test_int_conversion_error() {
        let (_, result) = exec(Arg::<i64>::new("n", "a number", ArgOpts::new()).arc(), &["x"]);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("failed to parse argument \"n\""), "{}", err);
        assert!(err.contains("invalid digit"), "{}", err);
    }

    #[test]
    fn test_optional_with_default() {
        let arg = Arg::<i64>::optional("n", "a number", ArgOpts::new().default_value(7));
        let (data, result) = exec(arg.arc(), &[]);
        result.unwrap();
        assert_eq!(data.int("n"), Some(7));
    }

    #[test]
    fn test_optional_without_default_left_unset() {
        let (data, result) = exec(Arg::<i64>::optional("n", "a number", ArgOpts::new()).arc(), &[]);
        result.unwrap();
        assert!(!data.has("n"));
    }

    #[test]
    fn test_optional_present_skips_default() {
        let arg = Arg::<i64>::optional("n", "a number", ArgOpts::new().default_value(7));
        let (data, result) = exec(arg.arc(), &["3"]);
        result.unwrap();
        assert_eq!(data.int("n"), Some(3));
    }

    #[test]
    fn test_list_bounds() {
        let arg = Arg::<Vec<i64>>::list("il", "ints", 2, Count::Fixed(0), ArgOpts::new());
        let (data, result) = exec(arg.arc(), &["1", "2"]);
        result.unwrap();
        assert_eq!(data.int_list("il"), Some(vec![1, 2]));
    }

    #[test]
    fn test_list_not_enough_still_stores() {
        let arg = Arg::<Vec<i64>>::list("il", "ints", 2, Count::Fixed(0), ArgOpts::new());
        let (data, result) = exec(arg.arc(), &["1"]);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Argument \"il\" requires at least 2 argument, got 1"
        );
        // Partial value stored before the error surfaced.
        assert_eq!(data.int_list("il"), Some(vec![1]));
    }

    #[test]
    fn test_unbounded_list_consumes_everything() {
        let arg = Arg::<Vec<String>>::list("extra", "the rest", 0, Count::Unbounded, ArgOpts::new());
        let (data, result) = exec(arg.arc(), &["a", "b", "c"]);
        result.unwrap();
        assert_eq!(data.string_list("extra"), Some(vec!["a".into(), "b".into(), "c".into()]));
    }

    #[test]
    fn test_extra_args_error() {
        let (_, result) = exec(Arg::<String>::new("s", "a string", ArgOpts::new()).arc(), &["a", "b"]);
        assert_eq!(result.unwrap_err().to_string(), "Unprocessed extra args: [b]");
    }

    #[test]
    fn test_list_breaker_stops_consumption() {
        let arg = Arg::<Vec<String>>::list(
            "sl",
            "strings",
            0,
            Count::Unbounded,
            ArgOpts::new().breaker(ListBreaker::token(";").discarding()),
        );
        let tail = Arg::<String>::new("s", "after", ArgOpts::new());
        let root = serial(vec![arg.arc(), tail.arc()]);
        let mut input = Input::from_args(["a", "b", ";", "c"]);
        let mut output = Output::new();
        let mut data = Data::new();
        engine::execute(&root, &mut input, &mut output, &mut data).unwrap();
        assert_eq!(data.string_list("sl"), Some(vec!["a".into(), "b".into()]));
        assert_eq!(data.string("s").as_deref(), Some("c"));
    }

    #[test]
    fn test_validator_failure() {
        let arg = Arg::<i64>::new("n", "a number", ArgOpts::new().validator(validators::gte(0)));
        let (data, result) = exec(arg.arc(), &["-4"]);
        let err = result.unwrap_err();
        assert!(!err.is_usage_error());
        assert_eq!(
            err.to_string(),
            "validation for \"n\" failed: value must be >= 0, got -4"
        );
        // Stored before validation ran.
        assert_eq!(data.int("n"), Some(-4));
    }

    #[test]
    fn test_transformer_rewrites_in_place() {
        let arg = Arg::<String>::new(
            "s",
            "a string",
            ArgOpts::new().transformer(|v: String, _| Ok(v.to_uppercase())),
        );
        let root = serial(vec![arg.arc()]);
        let mut input = Input::from_args(["hello"]);
        let snapshot = input.snapshot();
        let mut output = Output::new();
        let mut data = Data::new();
        engine::execute(&root, &mut input, &mut output, &mut data).unwrap();
        assert_eq!(data.string("s").as_deref(), Some("HELLO"));
        assert_eq!(input.get_snapshot(snapshot), vec!["HELLO"]);
    }

    #[test]
    fn test_list_transformer_must_preserve_count() {
        let arg = Arg::<Vec<String>>::list(
            "sl",
            "strings",
            0,
            Count::Unbounded,
            ArgOpts::new().transformer(|mut v: Vec<String>, _| {
                v.push("extra".to_string());
                Ok(v)
            }),
        );
        let (_, result) = exec(arg.arc(), &["a", "b"]);
        assert_eq!(
            result.unwrap_err().to_string(),
            "transformers must return a value that is the same length as the input value"
        );
    }

    #[test]
    fn test_custom_setter_diverts_storage() {
        let arg = Arg::<String>::new(
            "s",
            "a string",
            ArgOpts::new().custom_setter(|v, data| data.set("elsewhere", v)),
        );
        let (data, result) = exec(arg.arc(), &["hi"]);
        result.unwrap();
        assert!(!data.has("s"));
        assert_eq!(data.string("elsewhere").as_deref(), Some("hi"));
    }

    #[test]
    fn test_complexecute_end_to_end() {
        let arg = Arg::<String>::new(
            "s",
            "a string",
            ArgOpts::new()
                .completer(SimpleCompleter::new(["one", "two", "three", "four", "five", "six"]))
                .complexecute(crate::args::Complexecute::strict()),
        );
        let root = serial(vec![arg.arc()]);
        let mut input = Input::from_args(["fi"]);
        let mut output = Output::new();
        let mut data = Data::new();
        engine::execute(&root, &mut input, &mut output, &mut data).unwrap();
        assert_eq!(data.string("s").as_deref(), Some("five"));
        assert!(input.fully_processed());
    }

    #[test]
    fn test_complete_cursor_on_arg() {
        let arg = Arg::<String>::new(
            "s",
            "a string",
            ArgOpts::new().completer(SimpleCompleter::new(["alpha", "beta"])),
        );
        let root = serial(vec![arg.arc()]);
        let out = engine::autocomplete_tokens(&root, ["a"]).unwrap();
        assert_eq!(out.suggestions, vec!["alpha"]);
    }

    #[test]
    fn test_complete_cursor_past_arg() {
        let first = Arg::<String>::new("s", "a string", ArgOpts::new());
        let second = Arg::<String>::new(
            "t",
            "another",
            ArgOpts::new().completer(CompleterSeesData),
        );
        let root = serial(vec![first.arc(), second.arc()]);
        let out = engine::autocomplete_tokens(&root, ["val", ""]).unwrap();
        assert_eq!(out.suggestions, vec!["val-suggestion"]);
    }

    struct CompleterSeesData;

    impl crate::completion::completers::Completer<String> for CompleterSeesData {
        fn complete(
            &self,
            _sofar: &String,
            data: &Data,
        ) -> Result<Completion, CmdError> {
            let earlier = data.string("s").unwrap_or_default();
            Ok(Completion::simple([format!("{}-suggestion", earlier)]))
        }
    }

    #[test]
    fn test_complete_distinct_list() {
        let arg = Arg::<Vec<String>>::list(
            "sl",
            "strings",
            0,
            Count::Unbounded,
            ArgOpts::new().completer(SimpleCompleter::new(["red", "green", "blue"]).distinct()),
        );
        let root = serial(vec![arg.arc()]);
        let out = engine::autocomplete_tokens(&root, ["green", ""]).unwrap();
        assert_eq!(out.suggestions, vec!["blue", "red"]);
    }

    #[test]
    fn test_complete_invalid_int_still_completes() {
        let arg = Arg::<i64>::new(
            "n",
            "a number",
            ArgOpts::new().completer(SimpleCompleter::new(["10", "11", "2"])),
        );
        let root = serial(vec![arg.arc()]);
        // "1" is not a full int match, but string completion still works;
        // the shared prefix "1" equals the cursor, so both survive.
        let out = engine::autocomplete_tokens(&root, ["1"]).unwrap();
        assert_eq!(out.suggestions, vec!["10", "11"]);
        let out = engine::autocomplete_tokens(&root, ["10"]).unwrap();
        assert_eq!(out.suggestions, vec!["10"]);
    }

    #[test]
    fn test_usage_rendering() {
        let arg = Arg::<String>::new(
            "s",
            "a string",
            ArgOpts::new().validator(validators::min_length(2)),
        );
        let tail = Arg::<Vec<String>>::list("rest", "the rest", 0, Count::Unbounded, ArgOpts::new());
        let root = serial(vec![arg.arc(), tail.arc()]);
        let text = engine::usage_text(&root).unwrap();
        assert!(text.contains("S [ REST ... ]"), "{}", text);
        assert!(text.contains("S: a string"), "{}", text);
        assert!(text.contains("must be at least 2 characters"), "{}", text);
    }

    #[test]
    fn test_hidden_arg_skips_usage() {
        let arg = Arg::<String>::new("secret", "hidden", ArgOpts::new().hidden());
        let root = serial(vec![arg.arc()]);
        let text = engine::usage_text(&root).unwrap();
        assert!(!text.contains("SECRET"), "{}", text);
    }
}
