//! Value-Carrying Flags
//!
//! Flags whose inner argument consumes one or more value tokens: Flag,
//! ListFlag, OptionalFlag, ItemizedListFlag, MenuFlag, and MapFlag. All of
//! them reuse the shared argument core against the spliced tape slice.

use std::fmt::Display;
use std::sync::Arc;

use crate::args::validators::in_list;
use crate::args::{Arg, ArgOpts};
use crate::completion::completers::{Completer, SimpleCompleter};
use crate::completion::record::Completion;
use crate::core::errors::CmdError;
use crate::core::output::Output;
use crate::core::processor::ExecuteData;
use crate::data::{ArgValue, Data};
use crate::engine::usage::Usage;
use crate::input::{Count, Input, InputBreaker};

use super::flag::FlagHandler;

/// A flag backed by a typed argument: `Flag[T]` (exactly one value) and
/// `ListFlag[T]` (a bounded run that stops at the next recognized flag).
pub struct ValueFlag<T: ArgValue> {
    short: Option<char>,
    arg: Arg<T>,
}

impl<T: ArgValue> FlagHandler for ValueFlag<T> {
    fn name(&self) -> &str {
        self.arg.name()
    }

    fn short(&self) -> Option<char> {
        self.short
    }

    fn desc(&self) -> &str {
        self.arg.desc()
    }

    fn execute_values(
        &self,
        breakers: &[Arc<dyn InputBreaker>],
        input: &mut Input,
        _output: &mut Output,
        data: &mut Data,
        _exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        self.arg.execute_core(input, data, breakers)
    }

    fn complete_values(
        &self,
        breakers: &[Arc<dyn InputBreaker>],
        input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
        self.arg.complete_core(input, data, breakers)
    }

    fn post_scan(&self, data: &mut Data) {
        self.arg.apply_default_if_unset(data);
    }

    fn usage(&self, usage: &mut Usage) {
        let display = match self.short {
            Some(c) => format!("--{}|-{}", self.name(), c),
            None => format!("--{}", self.name()),
        };
        let mut desc = self.desc().to_string();
        for note in self.arg.validator_descs() {
            desc.push_str("; ");
            desc.push_str(&note);
        }
        usage.add_flag(display, desc);
    }
}

/// A flag taking exactly one value of type T.
pub fn flag<T: ArgValue>(
    name: impl Into<String>,
    short: Option<char>,
    desc: impl Into<String>,
    opts: ArgOpts<T>,
) -> Arc<dyn FlagHandler> {
    Arc::new(ValueFlag {
        short,
        arg: Arg::new(name, desc, opts),
    })
}

/// A flag taking `min` to `min + optional` values; consumption stops at
/// the next recognized flag token.
pub fn list_flag<T>(
    name: impl Into<String>,
    short: Option<char>,
    desc: impl Into<String>,
    min: usize,
    optional: Count,
    opts: ArgOpts<Vec<T>>,
) -> Arc<dyn FlagHandler>
where
    T: ArgValue,
    Vec<T>: ArgValue,
{
    Arc::new(ValueFlag {
        short,
        arg: Arg::list(name, desc, min, optional, opts),
    })
}

/// Shortcut for `Flag[T]` with an in-list validator and a completer over
/// the enumerated choices.
pub fn menu_flag<T>(
    name: impl Into<String>,
    short: Option<char>,
    desc: impl Into<String>,
    choices: Vec<T>,
) -> Arc<dyn FlagHandler>
where
    T: ArgValue + PartialEq + Display,
{
    let rendered: Vec<String> = choices.iter().flat_map(|c| c.render()).collect();
    flag(
        name,
        short,
        desc,
        ArgOpts::new()
            .validator(in_list(choices))
            .completer(SimpleCompleter::new(rendered)),
    )
}

/// Zero or one value: presence without a value stores the supplied
/// default, and the flag never swallows the next flag token.
pub struct OptionalFlag<T: ArgValue> {
    short: Option<char>,
    present_default: T,
    arg: Arg<T>,
}

impl<T: ArgValue> OptionalFlag<T> {
    pub fn new(
        name: impl Into<String>,
        short: Option<char>,
        desc: impl Into<String>,
        present_default: T,
        opts: ArgOpts<T>,
    ) -> Arc<dyn FlagHandler> {
        Arc::new(Self {
            short,
            present_default,
            arg: Arg::new(name, desc, opts),
        })
    }

    fn next_is_value(&self, breakers: &[Arc<dyn InputBreaker>], input: &Input, data: &Data) -> bool {
        match input.peek() {
            Some(token) => !breakers.iter().any(|b| b.breaks(token, data)),
            None => false,
        }
    }
}

impl<T: ArgValue> FlagHandler for OptionalFlag<T> {
    fn name(&self) -> &str {
        self.arg.name()
    }

    fn short(&self) -> Option<char> {
        self.short
    }

    fn desc(&self) -> &str {
        self.arg.desc()
    }

    fn execute_values(
        &self,
        breakers: &[Arc<dyn InputBreaker>],
        input: &mut Input,
        _output: &mut Output,
        data: &mut Data,
        _exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        if self.next_is_value(breakers, input, data) {
            self.arg.execute_core(input, data, breakers)
        } else {
            data.set(self.name().to_string(), self.present_default.clone());
            Ok(())
        }
    }

    fn complete_values(
        &self,
        breakers: &[Arc<dyn InputBreaker>],
        input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
        if input.num_remaining() == 1 {
            // The cursor is the value position; let the inner argument
            // suggest values.
            return self.arg.complete_core(input, data, breakers);
        }
        if self.next_is_value(breakers, input, data) {
            self.arg.complete_core(input, data, breakers)
        } else {
            data.set(self.name().to_string(), self.present_default.clone());
            Ok(None)
        }
    }
}

/// One value per occurrence; occurrences accumulate into a list and the
/// flag is exempt from duplicate detection.
pub struct ItemizedListFlag<T: ArgValue> {
    name: String,
    short: Option<char>,
    desc: String,
    completer: Option<Arc<dyn Completer<Vec<T>>>>,
}

impl<T> ItemizedListFlag<T>
where
    T: ArgValue,
    Vec<T>: ArgValue,
{
    pub fn new(
        name: impl Into<String>,
        short: Option<char>,
        desc: impl Into<String>,
    ) -> Arc<dyn FlagHandler> {
        Arc::new(Self {
            name: name.into(),
            short,
            desc: desc.into(),
            completer: None,
        })
    }

    pub fn with_completer(
        name: impl Into<String>,
        short: Option<char>,
        desc: impl Into<String>,
        completer: impl Completer<Vec<T>> + 'static,
    ) -> Arc<dyn FlagHandler> {
        Arc::new(Self {
            name: name.into(),
            short,
            desc: desc.into(),
            completer: Some(Arc::new(completer)),
        })
    }

    fn accumulate(&self, token: &str, data: &mut Data) -> Result<(), CmdError> {
        let value = T::parse_tokens(&[token.to_string()]).map_err(|message| CmdError::Conversion {
            name: self.name.clone(),
            message,
        })?;
        let mut list: Vec<T> = data.get(&self.name).unwrap_or_default();
        list.push(value);
        data.set(self.name.clone(), list);
        Ok(())
    }
}

impl<T> FlagHandler for ItemizedListFlag<T>
where
    T: ArgValue,
    Vec<T>: ArgValue,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn short(&self) -> Option<char> {
        self.short
    }

    fn desc(&self) -> &str {
        &self.desc
    }

    fn itemized(&self) -> bool {
        true
    }

    fn execute_values(
        &self,
        _breakers: &[Arc<dyn InputBreaker>],
        input: &mut Input,
        _output: &mut Output,
        data: &mut Data,
        _exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        match input.pop() {
            Some(r) => self.accumulate(&input.value(r).to_string(), data),
            None => Err(CmdError::NotEnoughArgs {
                name: self.name.clone(),
                required: 1,
                got: 0,
            }),
        }
    }

    fn complete_values(
        &self,
        _breakers: &[Arc<dyn InputBreaker>],
        input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
        let r = match input.pop() {
            Some(r) => r,
            None => return Ok(None),
        };
        if !input.fully_processed() {
            let _ = self.accumulate(&input.value(r).to_string(), data);
            return Ok(None);
        }
        // The cursor is on this occurrence's value: complete against the
        // list accumulated so far.
        let sofar: Vec<T> = data.get(&self.name).unwrap_or_default();
        match &self.completer {
            Some(completer) => {
                let mut completion = completer.complete(&sofar, data)?;
                completion.prior_values = sofar.iter().flat_map(|v| v.render()).collect();
                Ok(Some(completion))
            }
            None => Ok(Some(Completion::default())),
        }
    }
}

/// One key from a K→V map; stores the mapped value. Unknown keys are an
/// error unless `allow_unknown`, which stores V's zero value.
pub struct MapFlag<K: ArgValue, V: ArgValue> {
    name: String,
    short: Option<char>,
    desc: String,
    entries: Vec<(K, V)>,
    allow_unknown: bool,
}

impl<K, V> MapFlag<K, V>
where
    K: ArgValue + PartialEq + Display,
    V: ArgValue,
{
    pub fn new(
        name: impl Into<String>,
        short: Option<char>,
        desc: impl Into<String>,
        entries: Vec<(K, V)>,
        allow_unknown: bool,
    ) -> Arc<dyn FlagHandler> {
        Arc::new(Self {
            name: name.into(),
            short,
            desc: desc.into(),
            entries,
            allow_unknown,
        })
    }

    fn keys(&self) -> Vec<String> {
        self.entries.iter().flat_map(|(k, _)| k.render()).collect()
    }
}

impl<K, V> FlagHandler for MapFlag<K, V>
where
    K: ArgValue + PartialEq + Display,
    V: ArgValue,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn short(&self) -> Option<char> {
        self.short
    }

    fn desc(&self) -> &str {
        &self.desc
    }

    fn execute_values(
        &self,
        _breakers: &[Arc<dyn InputBreaker>],
        input: &mut Input,
        _output: &mut Output,
        data: &mut Data,
        _exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        let r = input.pop().ok_or_else(|| CmdError::NotEnoughArgs {
            name: self.name.clone(),
            required: 1,
            got: 0,
        })?;
        let token = input.value(r).to_string();
        let key = K::parse_tokens(&[token.clone()]).map_err(|message| CmdError::Conversion {
            name: self.name.clone(),
            message,
        })?;
        match self.entries.iter().find(|(k, _)| *k == key) {
            Some((_, v)) => data.set(self.name.clone(), v.clone()),
            None if self.allow_unknown => data.set(self.name.clone(), V::zero()),
            None => {
                return Err(CmdError::ValidationFailed {
                    name: self.name.clone(),
                    reason: format!(
                        "value must be one of [{}], got {}",
                        self.keys().join(" "),
                        token
                    ),
                })
            }
        }
        Ok(())
    }

    fn complete_values(
        &self,
        _breakers: &[Arc<dyn InputBreaker>],
        input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
        let r = match input.pop() {
            Some(r) => r,
            None => return Ok(None),
        };
        if !input.fully_processed() {
            let token = input.value(r).to_string();
            if let Ok(key) = K::parse_tokens(&[token]) {
                if let Some((_, v)) = self.entries.iter().find(|(k, _)| *k == key) {
                    data.set(self.name.clone(), v.clone());
                }
            }
            return Ok(None);
        }
        Ok(Some(Completion::simple(self.keys())))
    }
}

// ============================================================================
// Tests
// ============================================================================
