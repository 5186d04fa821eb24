//! Flag Group Processor
//!
//! A single processor owning a set of flag descriptors. At execute and
//! complete time it scans the remaining input (not just the current
//! position), splicing each recognized flag plus its values out of the
//! tape and running the flag's inner argument against the spliced slice.
//!
//! Recognized syntaxes: `--name`, `-c`, multi-flag `-abc` (when every rune
//! is a combinable boolean-shaped flag), and the flag stop `--` which
//! disables flag parsing for the rest of the scan.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex_lite::Regex;
use tracing::trace;

use crate::completion::record::Completion;
use crate::core::errors::{CmdError, TokenList};
use crate::core::output::Output;
use crate::core::processor::{ExecuteData, Processor};
use crate::data::Data;
use crate::engine::usage::Usage;
use crate::input::{Input, InputBreaker};

lazy_static! {
    static ref LONG_FLAG: Regex = Regex::new(r"^--[a-zA-Z0-9][a-zA-Z0-9_-]*$").unwrap();
    static ref SHORT_FLAG: Regex = Regex::new(r"^-[a-zA-Z]$").unwrap();
    static ref MULTI_FLAG: Regex = Regex::new(r"^-[a-zA-Z]{2,}$").unwrap();
}

pub const FLAG_STOP: &str = "--";

/// One flag descriptor owned by a [`FlagProcessor`].
pub trait FlagHandler: Send + Sync {
    fn name(&self) -> &str;
    fn short(&self) -> Option<char>;
    fn desc(&self) -> &str;

    /// Zero-value boolean-shaped flags may combine into `-abc`.
    fn combinable(&self) -> bool {
        false
    }

    /// Itemized flags may appear multiple times; each occurrence
    /// accumulates.
    fn itemized(&self) -> bool {
        false
    }

    fn hidden(&self) -> bool {
        false
    }

    /// Process the flag's values. The flag token itself is already popped;
    /// the input cursor sits on the first value token. `breakers` detect
    /// other recognized flags so list values stop cleanly.
    fn execute_values(
        &self,
        breakers: &[Arc<dyn InputBreaker>],
        input: &mut Input,
        output: &mut Output,
        data: &mut Data,
        exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError>;

    /// Complete the flag's values; returns the record when the cursor is on
    /// one of them.
    fn complete_values(
        &self,
        breakers: &[Arc<dyn InputBreaker>],
        input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Completion>, CmdError>;

    /// Absent-flag behavior, run once the scan finishes.
    fn post_scan(&self, _data: &mut Data) {}

    /// Contribute this flag's row (and notes) to the flag section.
    fn usage(&self, usage: &mut Usage) {
        let display = match self.short() {
            Some(c) => format!("--{}|-{}", self.name(), c),
            None => format!("--{}", self.name()),
        };
        usage.add_flag(display, self.desc());
    }
}

/// Detects tokens this flag group recognizes, so a list-valued flag stops
/// consuming at the next flag.
struct RecognizedFlagBreaker {
    names: HashSet<String>,
    shorts: HashSet<char>,
    combinable_shorts: HashSet<char>,
}

impl RecognizedFlagBreaker {
    fn recognizes(&self, token: &str) -> bool {
        if token == FLAG_STOP {
            return true;
        }
        if let Some(name) = token.strip_prefix("--") {
            return LONG_FLAG.is_match(token) && self.names.contains(name);
        }
        if SHORT_FLAG.is_match(token) {
            let c = token.chars().nth(1).unwrap();
            return self.shorts.contains(&c);
        }
        if MULTI_FLAG.is_match(token) {
            return token.chars().skip(1).all(|c| self.combinable_shorts.contains(&c));
        }
        false
    }
}

impl InputBreaker for RecognizedFlagBreaker {
    fn breaks(&self, value: &str, _data: &Data) -> bool {
        self.recognizes(value)
    }
}

enum TokenKind {
    FlagStop,
    Single(String),
    Multi(Vec<String>),
    Other,
}

/// The flag group processor.
pub struct FlagProcessor {
    flags: IndexMap<String, Arc<dyn FlagHandler>>,
    shorts: HashMap<char, String>,
}

impl FlagProcessor {
    pub fn new(handlers: Vec<Arc<dyn FlagHandler>>) -> Self {
        let mut flags = IndexMap::new();
        let mut shorts = HashMap::new();
        for handler in handlers {
            if let Some(c) = handler.short() {
                shorts.insert(c, handler.name().to_string());
            }
            flags.insert(handler.name().to_string(), handler);
        }
        Self { flags, shorts }
    }

    pub fn arc(self) -> Arc<dyn Processor> {
        Arc::new(self)
    }

    fn breaker(&self) -> Arc<dyn InputBreaker> {
        Arc::new(RecognizedFlagBreaker {
            names: self.flags.keys().cloned().collect(),
            shorts: self.shorts.keys().copied().collect(),
            combinable_shorts: self
                .shorts
                .iter()
                .filter(|(_, name)| self.flags[name.as_str()].combinable())
                .map(|(c, _)| *c)
                .collect(),
        })
    }

    /// Classify a token the way the scan sees it.
    fn classify(&self, token: &str) -> Result<TokenKind, CmdError> {
        if token == FLAG_STOP {
            return Ok(TokenKind::FlagStop);
        }
        if let Some(name) = token.strip_prefix("--") {
            if LONG_FLAG.is_match(token) && self.flags.contains_key(name) {
                return Ok(TokenKind::Single(name.to_string()));
            }
            return Ok(TokenKind::Other);
        }
        if SHORT_FLAG.is_match(token) {
            let c = token.chars().nth(1).unwrap();
            return Ok(match self.shorts.get(&c) {
                Some(name) => TokenKind::Single(name.clone()),
                None => TokenKind::Other,
            });
        }
        if MULTI_FLAG.is_match(token) {
            let runes: Vec<char> = token.chars().skip(1).collect();
            let mut known = Vec::new();
            let mut unknown = Vec::new();
            for c in &runes {
                match self.shorts.get(c) {
                    Some(name) if self.flags[name].combinable() => known.push(name.clone()),
                    _ => unknown.push(c.to_string()),
                }
            }
            if unknown.is_empty() {
                return Ok(TokenKind::Multi(known));
            }
            if known.is_empty() {
                // No rune is a known flag: the token is someone else's value.
                return Ok(TokenKind::Other);
            }
            return Err(CmdError::MultiFlag {
                token: token.to_string(),
                unknown: TokenList(unknown),
            });
        }
        Ok(TokenKind::Other)
    }

    fn check_duplicate(&self, name: &str, data: &Data) -> Result<(), CmdError> {
        let handler = &self.flags[name];
        if data.has(handler.name()) && !handler.itemized() {
            return Err(CmdError::DuplicateFlag(handler.name().to_string()));
        }
        Ok(())
    }

    /// Suggestions for a cursor sitting on `-`, `--`, or a flag-name
    /// prefix: every flag the invocation has not yet set. Itemized lists
    /// still advertise themselves.
    fn flag_name_completion(&self, data: &Data) -> Completion {
        let mut suggestions = Vec::new();
        for handler in self.flags.values() {
            if handler.hidden() {
                continue;
            }
            if data.has(handler.name()) && !handler.itemized() {
                continue;
            }
            suggestions.push(format!("--{}", handler.name()));
            if let Some(c) = handler.short() {
                suggestions.push(format!("-{}", c));
            }
        }
        Completion::simple(suggestions)
    }
}

impl Processor for FlagProcessor {
    fn execute(
        &self,
        input: &mut Input,
        output: &mut Output,
        data: &mut Data,
        exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        let base = input.offset();
        let breakers: Vec<Arc<dyn InputBreaker>> = vec![self.breaker()];
        let mut i = 0;
        while i < input.num_remaining() {
            let token = input.peek_at(i).unwrap_or_default().to_string();
            match self.classify(&token)? {
                TokenKind::FlagStop => {
                    input.set_offset(base + i);
                    input.pop();
                    input.set_offset(base);
                    break;
                }
                TokenKind::Single(name) => {
                    trace!(flag = %name, "flag spliced");
                    self.check_duplicate(&name, data)?;
                    input.set_offset(base + i);
                    input.pop();
                    let result = self.flags[&name].execute_values(
                        &breakers, input, output, data, exec_data,
                    );
                    input.set_offset(base);
                    result?;
                }
                TokenKind::Multi(names) => {
                    input.set_offset(base + i);
                    input.pop();
                    input.set_offset(base);
                    for name in names {
                        self.check_duplicate(&name, data)?;
                        input.set_offset(base + i);
                        let result = self.flags[&name].execute_values(
                            &breakers, input, output, data, exec_data,
                        );
                        input.set_offset(base);
                        result?;
                    }
                }
                TokenKind::Other => i += 1,
            }
        }

        for handler in self.flags.values() {
            if !data.has(handler.name()) {
                handler.post_scan(data);
            }
        }
        Ok(())
    }

    fn complete(
        &self,
        input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
        let base = input.offset();
        let breakers: Vec<Arc<dyn InputBreaker>> = vec![self.breaker()];
        let mut i = 0;
        while i < input.num_remaining() {
            let token = input.peek_at(i).unwrap_or_default().to_string();
            let is_cursor = i == input.num_remaining() - 1;
            if is_cursor {
                if token.starts_with('-') {
                    return Ok(Some(self.flag_name_completion(data)));
                }
                break;
            }
            match self.classify(&token)? {
                TokenKind::FlagStop => {
                    input.set_offset(base + i);
                    input.pop();
                    input.set_offset(base);
                    break;
                }
                TokenKind::Single(name) => {
                    input.set_offset(base + i);
                    input.pop();
                    let result = self.flags[&name].complete_values(&breakers, input, data);
                    input.set_offset(base);
                    if let Some(completion) = result? {
                        return Ok(Some(completion));
                    }
                }
                TokenKind::Multi(names) => {
                    input.set_offset(base + i);
                    input.pop();
                    input.set_offset(base);
                    for name in names {
                        input.set_offset(base + i);
                        let result = self.flags[&name].complete_values(&breakers, input, data);
                        input.set_offset(base);
                        if let Some(completion) = result? {
                            return Ok(Some(completion));
                        }
                    }
                }
                TokenKind::Other => i += 1,
            }
        }
        Ok(None)
    }

    fn usage(
        &self,
        _input: &mut Input,
        _data: &mut Data,
        usage: &mut Usage,
    ) -> Result<(), CmdError> {
        for handler in self.flags.values() {
            if !handler.hidden() {
                handler.usage(usage);
            }
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
    use crate::flags::bool_flags::BoolFlag;

    #[test]
    fn test_flag_token_patterns() {
        assert!(LONG_FLAG.is_match("--boo"));
        assert!(LONG_FLAG.is_match("--dry-run"));
        assert!(!LONG_FLAG.is_match("--"));
        assert!(SHORT_FLAG.is_match("-r"));
        assert!(!SHORT_FLAG.is_match("-9"));
        assert!(MULTI_FLAG.is_match("-abc"));
        assert!(!MULTI_FLAG.is_match("-a"));
    }

    #[test]
    fn test_rerun_with_same_input_detects_duplicate() {
        // The data bag persists across runs, so re-providing a flag is a
        // duplicate even though each run parses a fresh tape.
        let group = FlagProcessor::new(vec![BoolFlag::new("all", Some('a'), "all")]);
        let mut data = Data::new();
        let mut output = Output::new();
        let mut exec = ExecuteData::default();

        let mut input = Input::from_args(["-a"]);
        group.execute(&mut input, &mut output, &mut data, &mut exec).unwrap();
        assert_eq!(data.bool("all"), Some(true));

        let mut input = Input::from_args(["-a"]);
        let err = group
            .execute(&mut input, &mut output, &mut data, &mut exec)
            .unwrap_err();
        assert_eq!(err.to_string(), "flag \"all\" already set");
    }

    #[test]
    fn test_scan_leaves_unrecognized_tokens_in_place() {
        let group = FlagProcessor::new(vec![BoolFlag::new("all", Some('a'), "all")]);
        let mut data = Data::new();
        let mut output = Output::new();
        let mut exec = ExecuteData::default();
        let mut input = Input::from_args(["keep", "-a", "also"]);
        group.execute(&mut input, &mut output, &mut data, &mut exec).unwrap();
        assert_eq!(input.remaining_values(), vec!["keep", "also"]);
    }
}
