//! Argument Options
//!
//! The options record shared by positional arguments and flag values:
//! validators, transformers, completer, default supplier, custom setter,
//! list breakers, shortcut substitution, complexecute policy, and the
//! hide-from-usage switch.

use std::sync::Arc;

use crate::completion::completers::Completer;
use crate::data::{ArgValue, Data};
use crate::processors::list_breaker::ListBreaker;
use crate::stores::ShortcutStore;

/// How complexecute resolves suggestions during execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Complexecute {
    /// Best-effort: 0 or many suggestions leave the token unchanged instead
    /// of failing.
    pub lenient: bool,
    /// Accept a token that exactly equals one of the suggestions, even when
    /// there are several.
    pub exact_match: bool,
}

impl Complexecute {
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn lenient() -> Self {
        Self {
            lenient: true,
            ..Self::default()
        }
    }

    pub fn with_exact_match(mut self) -> Self {
        self.exact_match = true;
        self
    }
}

/// Substitute a stored shortcut before the argument consumes tokens.
#[derive(Clone)]
pub struct ShortcutExpansion {
    pub store_name: String,
    pub store: Arc<dyn ShortcutStore>,
}

pub struct Transformer<T> {
    #[allow(clippy::type_complexity)]
    f: Arc<dyn Fn(T, &Data) -> Result<T, String> + Send + Sync>,
}

impl<T> Transformer<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(T, &Data) -> Result<T, String> + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    pub fn apply(&self, value: T, data: &Data) -> Result<T, String> {
        (self.f)(value, data)
    }
}

impl<T> Clone for Transformer<T> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

pub type DefaultFn<T> = Arc<dyn Fn(&Data) -> T + Send + Sync>;
pub type SetterFn<T> = Arc<dyn Fn(T, &mut Data) + Send + Sync>;

pub struct ArgOpts<T: ArgValue> {
    pub validators: Vec<super::validators::Validator<T>>,
    pub transformers: Vec<Transformer<T>>,
    pub completer: Option<Arc<dyn Completer<T>>>,
    pub default: Option<DefaultFn<T>>,
    pub custom_setter: Option<SetterFn<T>>,
    pub breakers: Vec<Arc<ListBreaker>>,
    pub complexecute: Option<Complexecute>,
    pub shortcut: Option<ShortcutExpansion>,
    pub hidden: bool,
}

impl<T: ArgValue> Default for ArgOpts<T> {
    fn default() -> Self {
        Self {
            validators: Vec::new(),
            transformers: Vec::new(),
            completer: None,
            default: None,
            custom_setter: None,
            breakers: Vec::new(),
            complexecute: None,
            shortcut: None,
            hidden: false,
        }
    }
}

impl<T: ArgValue> ArgOpts<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validator(mut self, v: super::validators::Validator<T>) -> Self {
        self.validators.push(v);
        self
    }

    pub fn transformer<F>(mut self, f: F) -> Self
    where
        F: Fn(T, &Data) -> Result<T, String> + Send + Sync + 'static,
    {
        self.transformers.push(Transformer::new(f));
        self
    }

    pub fn completer(mut self, c: impl Completer<T> + 'static) -> Self {
        self.completer = Some(Arc::new(c));
        self
    }

    pub fn default_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Data) -> T + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(f));
        self
    }

    pub fn default_value(self, value: T) -> Self {
        self.default_fn(move |_| value.clone())
    }

    pub fn custom_setter<F>(mut self, f: F) -> Self
    where
        F: Fn(T, &mut Data) + Send + Sync + 'static,
    {
        self.custom_setter = Some(Arc::new(f));
        self
    }

    pub fn breaker(mut self, b: ListBreaker) -> Self {
        self.breakers.push(Arc::new(b));
        self
    }

    pub fn complexecute(mut self, cfg: Complexecute) -> Self {
        self.complexecute = Some(cfg);
        self
    }

    pub fn shortcut(mut self, store_name: impl Into<String>, store: Arc<dyn ShortcutStore>) -> Self {
        self.shortcut = Some(ShortcutExpansion {
            store_name: store_name.into(),
            store,
        });
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}
