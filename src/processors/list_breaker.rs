//! List Breaker
//!
//! Ends a list argument's consumption mid-stream. Attached to a list
//! argument's options; the predicate inspects each candidate token before
//! it is popped. A breaker may discard the break token or leave it for the
//! next processor, and may contribute a symbol legend to usage.

use std::sync::Arc;

use crate::data::Data;
use crate::input::InputBreaker;

pub struct ListBreaker {
    predicate: Arc<dyn Fn(&str, &Data) -> bool + Send + Sync>,
    discard: bool,
    usage: Option<(String, String)>,
}

impl ListBreaker {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&str, &Data) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            discard: false,
            usage: None,
        }
    }

    /// Break on a literal token, with a matching usage symbol.
    pub fn token(token: impl Into<String>) -> Self {
        let token = token.into();
        let matched = token.clone();
        Self::new(move |value, _| value == matched).with_usage(token, "list breaker")
    }

    /// Consume and drop the break token instead of leaving it on the tape.
    pub fn discarding(mut self) -> Self {
        self.discard = true;
        self
    }

    pub fn with_usage(mut self, symbol: impl Into<String>, desc: impl Into<String>) -> Self {
        self.usage = Some((symbol.into(), desc.into()));
        self
    }

    pub fn usage_symbol(&self) -> Option<(&str, &str)> {
        self.usage.as_ref().map(|(s, d)| (s.as_str(), d.as_str()))
    }
}

impl InputBreaker for ListBreaker {
    fn breaks(&self, value: &str, data: &Data) -> bool {
        (self.predicate)(value, data)
    }

    fn discard(&self) -> bool {
        self.discard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_breaker() {
        let b = ListBreaker::token(";");
        let data = Data::new();
        assert!(b.breaks(";", &data));
        assert!(!b.breaks("x", &data));
        assert!(!b.discard());
        assert_eq!(b.usage_symbol(), Some((";", "list breaker")));
    }

    #[test]
    fn test_discarding() {
        let b = ListBreaker::token(";").discarding();
        assert!(b.discard());
    }
}
