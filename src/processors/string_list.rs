//! String List of Lists
//!
//! A list argument paired with a separator symbol: the consumed run is
//! split into sublists at the separator, and the minimum/maximum bounds
//! apply to the number of sublists.

use std::sync::Arc;

use crate::completion::record::Completion;
use crate::core::errors::CmdError;
use crate::core::output::Output;
use crate::core::processor::{ExecuteData, Processor};
use crate::data::Data;
use crate::engine::usage::Usage;
use crate::input::{Count, Input};

pub struct StringListList {
    name: String,
    desc: String,
    separator: String,
    min_lists: usize,
    optional_lists: Count,
}

impl StringListList {
    pub fn new(
        name: impl Into<String>,
        desc: impl Into<String>,
        separator: impl Into<String>,
        min_lists: usize,
        optional_lists: Count,
    ) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
            separator: separator.into(),
            min_lists,
            optional_lists,
        }
    }

    pub fn arc(self) -> Arc<dyn Processor> {
        Arc::new(self)
    }

    fn max_lists(&self) -> Option<usize> {
        match self.optional_lists {
            Count::Fixed(n) => Some(self.min_lists + n),
            Count::Unbounded => None,
        }
    }

    /// Consume tokens into sublists, stopping before a separator that
    /// would begin a sublist past the maximum.
    fn consume(&self, input: &mut Input) -> Vec<Vec<String>> {
        let mut lists: Vec<Vec<String>> = vec![Vec::new()];
        while let Some(token) = input.peek() {
            if token == self.separator {
                if let Some(max) = self.max_lists() {
                    if lists.len() >= max {
                        break;
                    }
                }
                input.pop();
                lists.push(Vec::new());
            } else {
                let token = token.to_string();
                input.pop();
                lists.last_mut().unwrap().push(token);
            }
        }
        while lists.last().map(|l| l.is_empty()).unwrap_or(false) {
            lists.pop();
        }
        lists
    }
}

impl Processor for StringListList {
    fn execute(
        &self,
        input: &mut Input,
        _output: &mut Output,
        data: &mut Data,
        _exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        let lists = self.consume(input);
        let got = lists.len();
        data.set_custom(self.name.clone(), lists);
        if got < self.min_lists {
            return Err(CmdError::NotEnoughArgs {
                name: self.name.clone(),
                required: self.min_lists,
                got,
            });
        }
        Ok(())
    }

    fn complete(
        &self,
        input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
        let consumed_cursor = input.num_remaining() > 0;
        let lists = self.consume(input);
        data.set_custom(self.name.clone(), lists);
        if consumed_cursor && input.fully_processed() {
            return Ok(Some(Completion::default()));
        }
        Ok(None)
    }

    fn usage(
        &self,
        input: &mut Input,
        _data: &mut Data,
        usage: &mut Usage,
    ) -> Result<(), CmdError> {
        if input.num_remaining() > 0 {
            let _ = self.consume(input);
            return Ok(());
        }
        let display = self.name.to_uppercase();
        for i in 0..self.min_lists {
            if i > 0 {
                usage.add_usage_token(self.separator.clone());
            }
            usage.add_usage_token(format!("{} ...", display));
        }
        if !matches!(self.optional_lists, Count::Fixed(0)) {
            usage.add_usage_token(format!("[ {} {} ... ]", self.separator, display));
        }
        usage.add_arg(display, self.desc.clone(), Vec::new());
        usage.add_symbol(self.separator.clone(), "list separator");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::serial;
    use crate::engine;

    fn run(args: &[&str], min: usize, optional: Count) -> (Data, Result<(), CmdError>) {
        let root = serial(vec![StringListList::new("groups", "token groups", ";", min, optional).arc()]);
        let mut input = Input::from_args(args.iter().copied());
        let mut output = Output::new();
        let mut data = Data::new();
        let result = engine::execute(&root, &mut input, &mut output, &mut data).map(|_| ());
        (data, result)
    }

    fn lists(data: &Data) -> Vec<Vec<String>> {
        data.get_custom::<Vec<Vec<String>>>("groups").cloned().unwrap_or_default()
    }

    #[test]
    fn test_split_on_separator() {
        let (data, result) = run(&["a", "b", ";", "c", ";", "d", "e", "f"], 0, Count::Unbounded);
        result.unwrap();
        assert_eq!(
            lists(&data),
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string()],
                vec!["d".to_string(), "e".to_string(), "f".to_string()],
            ]
        );
    }

    #[test]
    fn test_min_applies_to_sublist_count() {
        let (_, result) = run(&["a", "b"], 2, Count::Fixed(0));
        assert_eq!(
            result.unwrap_err().to_string(),
            "Argument \"groups\" requires at least 2 argument, got 1"
        );
    }

    #[test]
    fn test_max_stops_before_extra_sublist() {
        // The second separator would start sublist three; with max two the
        // rest is left on the tape and flagged as extra.
        let (data, result) = run(&["a", ";", "b", ";", "c"], 0, Count::Fixed(2));
        assert!(result.is_err());
        assert_eq!(
            lists(&data),
            vec![vec!["a".to_string()], vec!["b".to_string()]]
        );
    }

    #[test]
    fn test_trailing_separator_drops_empty_sublist() {
        let (data, result) = run(&["a", ";"], 0, Count::Unbounded);
        result.unwrap();
        assert_eq!(lists(&data), vec![vec!["a".to_string()]]);
    }

    #[test]
    fn test_empty_input_zero_sublists() {
        let (data, result) = run(&[], 0, Count::Unbounded);
        result.unwrap();
        assert!(lists(&data).is_empty());
    }
}
