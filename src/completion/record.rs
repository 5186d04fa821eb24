//! Completion Record
//!
//! The record a processor returns for the token at the cursor, plus the
//! post-processing pipeline that turns it into the final suggestion list
//! handed back to the shell.

use std::sync::Arc;

use crate::core::errors::CmdError;
use crate::core::node::GraphNode;
use crate::data::Data;

/// A completion sub-graph run before suggestions are resolved, so the
/// resolver can see data populated by earlier processors.
pub struct DeferredCompletion {
    pub graph: Arc<dyn GraphNode>,
    pub resolve: Arc<dyn Fn(&Data) -> Result<Completion, CmdError> + Send + Sync>,
}

/// Suggestions plus the knobs that control post-processing.
#[derive(Clone, Default)]
pub struct Completion {
    pub suggestions: Vec<String>,
    /// Drop suggestions already present among the list argument's
    /// accumulated values.
    pub distinct: bool,
    /// Case-insensitive prefix matching (and sorting).
    pub case_insensitive: bool,
    /// Case-insensitive sorting only.
    pub case_insensitive_sort: bool,
    /// Do not prefix-filter against the cursor token. Used by the file
    /// completer, which filters against the basename itself.
    pub ignore_filter: bool,
    /// Return suggestions but never collapse to a shared-prefix autofill.
    pub dont_complete: bool,
    /// The resolved completion must not get a trailing space appended
    /// (directory continuation).
    pub spaceless: bool,
    /// With multiple suggestions, emit a trailing " " sentinel so the shell
    /// does not auto-append a space after filling the common prefix.
    pub space_sentinel: bool,
    /// Values the list argument has already accumulated, for `distinct`.
    pub prior_values: Vec<String>,
    /// Run this sub-graph first, then resolve the real completion.
    pub deferred: Option<Arc<DeferredCompletion>>,
}

impl Completion {
    pub fn simple<I, S>(suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suggestions: suggestions.into_iter().map(|s| s.into()).collect(),
            ..Self::default()
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("suggestions", &self.suggestions)
            .field("distinct", &self.distinct)
            .field("case_insensitive", &self.case_insensitive)
            .field("ignore_filter", &self.ignore_filter)
            .field("dont_complete", &self.dont_complete)
            .field("spaceless", &self.spaceless)
            .field("deferred", &self.deferred.is_some())
            .finish()
    }
}

/// The final, shell-facing completion result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Autocompletion {
    pub suggestions: Vec<String>,
    /// The shell must not append a trailing space after completing.
    pub spaceless: bool,
}

// ============================================================================
// Post-processing
// ============================================================================

fn longest_common_prefix(values: &[String], case_insensitive: bool) -> String {
    let first = match values.first() {
        Some(f) => f.clone(),
        None => return String::new(),
    };
    let mut end = first.len();
    for v in &values[1..] {
        let mut common = 0;
        for (a, b) in first[..end].chars().zip(v.chars()) {
            let matches = if case_insensitive {
                a.eq_ignore_ascii_case(&b)
            } else {
                a == b
            };
            if !matches {
                break;
            }
            common += a.len_utf8();
        }
        end = common;
        if end == 0 {
            break;
        }
    }
    first[..end].to_string()
}

fn escape_for_shell(suggestion: &str, delimiter: Option<char>) -> String {
    if delimiter.is_some() || !suggestion.chars().any(|c| c == ' ') {
        // Inside an open quote the shell keeps whitespace as-is.
        return suggestion.to_string();
    }
    suggestion.replace(' ', "\\ ")
}

/// Run the §completion pipeline: distinct filter, prefix filter, sort,
/// shared-prefix autofill, quoting.
pub fn process_completion(
    completion: &Completion,
    cursor: &str,
    delimiter: Option<char>,
) -> Autocompletion {
    let mut suggestions: Vec<String> = completion.suggestions.clone();

    if completion.distinct {
        suggestions.retain(|s| !completion.prior_values.contains(s));
    }

    if !completion.ignore_filter {
        if completion.case_insensitive {
            let lowered = cursor.to_lowercase();
            suggestions.retain(|s| s.to_lowercase().starts_with(&lowered));
        } else {
            suggestions.retain(|s| s.starts_with(cursor));
        }
    }

    if completion.case_insensitive || completion.case_insensitive_sort {
        suggestions.sort_by_key(|s| s.to_lowercase());
    } else {
        suggestions.sort();
    }

    if suggestions.len() == 1 {
        let only = suggestions.remove(0);
        let spaceless = completion.spaceless || only.ends_with('/');
        return Autocompletion {
            suggestions: vec![escape_for_shell(&only, delimiter)],
            spaceless,
        };
    }

    if !completion.dont_complete && suggestions.len() > 1 {
        let lcp = longest_common_prefix(&suggestions, completion.case_insensitive);
        if lcp.len() > cursor.len() {
            // Autofill: collapse to the shared prefix. The user is still
            // mid-token, so no trailing space.
            return Autocompletion {
                suggestions: vec![escape_for_shell(&lcp, delimiter)],
                spaceless: true,
            };
        }
    }

    let mut suggestions: Vec<String> = suggestions
        .iter()
        .map(|s| escape_for_shell(s, delimiter))
        .collect();
    if completion.space_sentinel && !completion.spaceless && suggestions.len() > 1 {
        suggestions.push(" ".to_string());
    }
    Autocompletion {
        suggestions,
        spaceless: completion.spaceless,
    }
}

// ============================================================================
// Tests
// ============================================================================
