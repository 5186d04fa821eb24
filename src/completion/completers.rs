//! Completers
//!
//! The typed completer contract plus the general-purpose implementations.
//! The file completer lives in its own module; the shell-command completer
//! next to the shell-command processor.

use std::sync::Arc;

use crate::core::errors::CmdError;
use crate::core::node::GraphNode;
use crate::data::{ArgValue, Data};

use super::record::{Completion, DeferredCompletion};

/// Produces the completion record for an argument, given the value parsed
/// so far. The complexecute side flag is visible through `data`.
pub trait Completer<T>: Send + Sync {
    fn complete(&self, sofar: &T, data: &Data) -> Result<Completion, CmdError>;
}

/// A fixed suggestion list.
pub struct SimpleCompleter {
    suggestions: Vec<String>,
    distinct: bool,
    case_insensitive: bool,
}

impl SimpleCompleter {
    pub fn new<I, S>(suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suggestions: suggestions.into_iter().map(|s| s.into()).collect(),
            distinct: false,
            case_insensitive: false,
        }
    }

    /// Drop suggestions the list argument already holds.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }
}

impl<T: ArgValue> Completer<T> for SimpleCompleter {
    fn complete(&self, _sofar: &T, _data: &Data) -> Result<Completion, CmdError> {
        Ok(Completion {
            suggestions: self.suggestions.clone(),
            distinct: self.distinct,
            case_insensitive: self.case_insensitive,
            ..Completion::default()
        })
    }
}

/// A completer built from a closure over the parsed-so-far value and data.
pub struct CompleterFromFunc<T> {
    #[allow(clippy::type_complexity)]
    f: Arc<dyn Fn(&T, &Data) -> Result<Completion, CmdError> + Send + Sync>,
}

impl<T> CompleterFromFunc<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T, &Data) -> Result<Completion, CmdError> + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }
}

impl<T: ArgValue> Completer<T> for CompleterFromFunc<T> {
    fn complete(&self, sofar: &T, data: &Data) -> Result<Completion, CmdError> {
        (self.f)(sofar, data)
    }
}

/// Runs a sub-graph before resolving suggestions, so the resolver sees the
/// data that graph populates.
pub struct DeferredCompleter {
    graph: Arc<dyn GraphNode>,
    #[allow(clippy::type_complexity)]
    resolve: Arc<dyn Fn(&Data) -> Result<Completion, CmdError> + Send + Sync>,
}

impl DeferredCompleter {
    pub fn new<F>(graph: Arc<dyn GraphNode>, resolve: F) -> Self
    where
        F: Fn(&Data) -> Result<Completion, CmdError> + Send + Sync + 'static,
    {
        Self {
            graph,
            resolve: Arc::new(resolve),
        }
    }
}

impl<T: ArgValue> Completer<T> for DeferredCompleter {
    fn complete(&self, _sofar: &T, _data: &Data) -> Result<Completion, CmdError> {
        Ok(Completion {
            deferred: Some(Arc::new(DeferredCompletion {
                graph: self.graph.clone(),
                resolve: self.resolve.clone(),
            })),
            ..Completion::default()
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
