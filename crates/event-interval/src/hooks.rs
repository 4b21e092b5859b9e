//! Override hooks for overlap decisions.
//!
//! A [`HookChain`] holds callbacks that may replace the boolean produced by an
//! overlap test. Hooks run in registration order, each receiving the result of
//! the previous one; an empty chain returns the computed result unchanged.
//! Hooks only get shared references, so the event record cannot change while
//! it is being evaluated.
//!
//! The primary entry point passes an [`IntersectQuery`], the legacy
//! timestamp entry point a [`LegacyIntersectQuery`]. Both chains are the same
//! mechanism with different context types.

use std::fmt;

use crate::classifier::IntersectMode;
use crate::event::Event;
use crate::instant::ZonedInstant;

/// A single override hook: `(result, event, query) -> result`.
pub type Hook<Q> = Box<dyn Fn(bool, &Event, &Q) -> bool + Send + Sync>;

/// Context passed to hooks registered for [`Evaluator::intersects`](crate::Evaluator::intersects).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectQuery {
    pub start: ZonedInstant,
    pub end: ZonedInstant,
    pub mode: IntersectMode,
}

/// Context passed to hooks registered for the legacy timestamp entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyIntersectQuery {
    /// The raw start as supplied by the caller.
    pub start: Option<String>,
    /// The raw end as supplied by the caller.
    pub end: Option<String>,
    pub mode: IntersectMode,
    pub timezone: Option<String>,
}

/// Ordered list of override hooks for one query context type.
pub struct HookChain<Q> {
    hooks: Vec<Hook<Q>>,
}

impl<Q> Default for HookChain<Q> {
    fn default() -> Self {
        HookChain { hooks: Vec::new() }
    }
}

impl<Q> fmt::Debug for HookChain<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookChain")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl<Q> HookChain<Q> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook. It runs after every hook registered before it.
    pub fn register<H>(&mut self, hook: H)
    where
        H: Fn(bool, &Event, &Q) -> bool + Send + Sync + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Thread `result` through every hook in order.
    pub fn apply(&self, result: bool, event: &Event, query: &Q) -> bool {
        self.hooks
            .iter()
            .fold(result, |acc, hook| hook(acc, event, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_empty_chain_is_identity() {
        let chain: HookChain<u8> = HookChain::new();
        let event = Event::default();
        assert!(chain.apply(true, &event, &0));
        assert!(!chain.apply(false, &event, &0));
        assert!(chain.is_empty());
    }

    #[test]
    fn test_hooks_run_in_registration_order() {
        let mut chain: HookChain<u8> = HookChain::new();
        // force true, then negate: order matters
        chain.register(|_, _, _| true);
        chain.register(|result, _, _| !result);
        assert!(!chain.apply(false, &Event::default(), &0));
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_hooks_see_context() {
        let mut chain: HookChain<LegacyIntersectQuery> = HookChain::new();
        chain.register(|result, event, query| {
            result && event.status.as_deref() != Some("cancelled") && query.timezone.is_some()
        });

        let query = LegacyIntersectQuery {
            start: Some("1710061200".to_string()),
            end: None,
            mode: IntersectMode::Week,
            timezone: Some("UTC".to_string()),
        };
        let active = Event::default();
        let cancelled = Event {
            status: Some("cancelled".to_string()),
            ..Default::default()
        };
        assert!(chain.apply(true, &active, &query));
        assert!(!chain.apply(true, &cancelled, &query));
    }

    #[test]
    fn test_every_hook_is_called() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut chain: HookChain<()> = HookChain::new();
        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            chain.register(move |result, _, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                result
            });
        }
        assert!(chain.apply(true, &Event::default(), &()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_debug_shows_count() {
        let mut chain: HookChain<()> = HookChain::new();
        chain.register(|r, _, _| r);
        assert_eq!(format!("{chain:?}"), "HookChain { hooks: 1 }");
    }
}
