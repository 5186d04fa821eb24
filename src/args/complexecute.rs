//! Complexecute
//!
//! Complete-for-execute: during execution, run the argument's completer on
//! each popped token and canonicalize it when exactly one suggestion
//! matches. Strict mode fails on zero or many suggestions; lenient mode
//! leaves the token unchanged. Completers observe the side flag through
//! the data bag.

use std::sync::Arc;

use crate::completion::completers::Completer;
use crate::core::errors::{CmdError, TokenList};
use crate::data::{ArgValue, Data};
use crate::input::{ArgRef, Input};

use super::options::Complexecute;

pub(crate) fn run_complexecute<T: ArgValue>(
    cfg: Complexecute,
    completer: &Arc<dyn Completer<T>>,
    refs: &[ArgRef],
    input: &mut Input,
    data: &mut Data,
) -> Result<(), CmdError> {
    for i in 1..=refs.len() {
        let tokens = input.values(&refs[..i]);
        let token = tokens[i - 1].clone();
        let partial = T::parse_tokens(&tokens).unwrap_or_else(|_| T::zero());

        data.complexecute = true;
        let result = completer.complete(&partial, data);
        data.complexecute = false;
        let completion = result?;

        if cfg.exact_match && completion.suggestions.iter().any(|s| s == &token) {
            continue;
        }

        let mut suggestions = completion.suggestions.clone();
        if completion.case_insensitive {
            let lowered = token.to_lowercase();
            suggestions.retain(|s| s.to_lowercase().starts_with(&lowered));
        } else {
            suggestions.retain(|s| s.starts_with(&token));
        }

        if suggestions.len() == 1 {
            input.set_value(refs[i - 1], suggestions[0].clone());
        } else if !cfg.lenient {
            suggestions.sort();
            return Err(CmdError::Complexecute {
                token,
                got: suggestions.len(),
                suggestions: TokenList(suggestions),
            });
        }
        // Lenient: 0 or many suggestions leave the token as typed.
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
