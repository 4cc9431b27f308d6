//! Tracking Context
//!
//! The tracking context is how dependencies are discovered. Every compute
//! function receives a [`Deps`] view; each read through it of a registered
//! rule is recorded as a dependency of the rule being evaluated.
//!
//! # Implementation
//!
//! Each engine keeps an evaluation stack of the rules currently running.
//! Entering an evaluation pushes the rule's key; the returned guard pops it
//! when dropped. A frame stays on the stack while the rule's change cascades,
//! so a key found on the stack again has had a change flow back into it. The
//! engine only reports that as a cycle when the rules' latest reads actually
//! form one; re-entry through a stale edge just runs nested.
//!
//! Calls that come back in through the engine's own API (a listener calling
//! `set`, say) start a detached scope: frames below it are not considered
//! when checking for re-entry.

use std::cell::{Cell, RefCell};

use smallvec::SmallVec;

use super::engine::Engine;
use crate::error::{Error, Result};
use crate::graph::RuleKey;

/// Keys read during one evaluation. Most rules read only a handful.
pub(crate) type Reads = SmallVec<[RuleKey; 4]>;

/// Read-only view over other rules' values, handed to a compute function.
///
/// Every tracked read records that the rule being evaluated depends on the
/// key that was read.
pub struct Deps<'a, V> {
    engine: &'a Engine<V>,
    rule: &'a RuleKey,
    reads: RefCell<Reads>,
}

impl<'a, V> Deps<'a, V>
where
    V: Clone + PartialEq + 'static,
{
    pub(crate) fn new(engine: &'a Engine<V>, rule: &'a RuleKey) -> Self {
        Self {
            engine,
            rule,
            reads: RefCell::new(SmallVec::new()),
        }
    }

    /// Read another rule's current value and record the dependency.
    ///
    /// Returns `None` without recording anything if `key` is not a registered
    /// rule. Returns `None` (but still records the dependency) if the rule has
    /// not produced a value yet, which happens for forward references during
    /// construction. The dependent is re-run once that value arrives.
    pub fn get(&self, key: &str) -> Option<V> {
        let key = self.engine.lookup(key)?;
        self.track(key);
        self.engine.stored(key.as_str())
    }

    /// Like [`get`](Self::get), but fails if the key is unknown or unset.
    pub fn require(&self, key: &str) -> Result<V> {
        let key = self
            .engine
            .lookup(key)
            .ok_or_else(|| Error::UnknownRule(RuleKey::from(key)))?;
        self.track(key);
        self.engine
            .stored(key.as_str())
            .ok_or_else(|| Error::NoValue(key.clone()))
    }

    /// Read a value without recording a dependency.
    pub fn peek(&self, key: &str) -> Option<V> {
        self.engine.stored(key)
    }

    /// The rule currently being evaluated.
    pub fn rule(&self) -> &RuleKey {
        self.rule
    }

    /// The engine running this evaluation, for reentrant calls.
    pub fn engine(&self) -> &Engine<V> {
        self.engine
    }

    /// Keys read so far during this evaluation.
    pub fn reads(&self) -> Vec<RuleKey> {
        self.reads.borrow().to_vec()
    }

    fn track(&self, key: &RuleKey) {
        let mut reads = self.reads.borrow_mut();
        if !reads.contains(key) {
            reads.push(key.clone());
        }
    }

    pub(crate) fn into_reads(self) -> Reads {
        self.reads.into_inner()
    }
}

/// Stack of rules currently being evaluated by one engine.
#[derive(Debug, Default)]
pub(crate) struct EvalStack {
    frames: RefCell<Vec<RuleKey>>,

    /// Index of the first frame in the current scope.
    base: Cell<usize>,
}

impl EvalStack {
    /// Push `key` onto the stack.
    ///
    /// The returned guard pops the frame when dropped.
    pub fn enter(&self, key: &RuleKey) -> EvalFrame<'_> {
        self.frames.borrow_mut().push(key.clone());
        EvalFrame {
            stack: self,
            key: key.clone(),
        }
    }

    /// Check whether `key` is being evaluated in the current scope.
    pub fn contains(&self, key: &RuleKey) -> bool {
        let frames = self.frames.borrow();
        frames[self.base.get().min(frames.len())..].contains(key)
    }

    /// Start a new scope above the current frames.
    ///
    /// The previous scope is restored when the guard is dropped.
    pub fn detach(&self) -> Detached<'_> {
        let depth = self.frames.borrow().len();
        Detached {
            stack: self,
            previous: self.base.replace(depth),
        }
    }

    /// Number of evaluations in progress.
    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    /// The innermost rule being evaluated, if any.
    pub fn current(&self) -> Option<RuleKey> {
        self.frames.borrow().last().cloned()
    }
}

/// Guard that pops an evaluation frame when dropped.
///
/// This keeps the stack balanced even if a compute function panics.
pub(crate) struct EvalFrame<'a> {
    stack: &'a EvalStack,
    key: RuleKey,
}

impl Drop for EvalFrame<'_> {
    fn drop(&mut self) {
        let popped = self.stack.frames.borrow_mut().pop();

        if let Some(key) = popped {
            debug_assert_eq!(
                key, self.key,
                "EvalFrame mismatch: expected {}, got {}",
                self.key, key
            );
        }
    }
}

/// Guard that restores the enclosing scope when dropped.
pub(crate) struct Detached<'a> {
    stack: &'a EvalStack,
    previous: usize,
}

impl Drop for Detached<'_> {
    fn drop(&mut self) {
        self.stack.base.set(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_tracks_current_rule() {
        let stack = EvalStack::default();
        let a = RuleKey::from("a");

        assert_eq!(stack.depth(), 0);
        assert!(stack.current().is_none());

        {
            let _frame = stack.enter(&a);
            assert_eq!(stack.depth(), 1);
            assert_eq!(stack.current(), Some(a.clone()));
        }

        // Frame should be popped after drop
        assert_eq!(stack.depth(), 0);
        assert!(stack.current().is_none());
    }

    #[test]
    fn nested_frames() {
        let stack = EvalStack::default();
        let a = RuleKey::from("a");
        let b = RuleKey::from("b");

        let _outer = stack.enter(&a);
        {
            let _inner = stack.enter(&b);
            assert_eq!(stack.current(), Some(b.clone()));
        }
        assert_eq!(stack.current(), Some(a.clone()));
    }

    #[test]
    fn contains_sees_every_frame_in_scope() {
        let stack = EvalStack::default();
        let a = RuleKey::from("a");
        let b = RuleKey::from("b");

        let _fa = stack.enter(&a);
        let _fb = stack.enter(&b);
        assert!(stack.contains(&a));
        assert!(stack.contains(&b));
        assert!(!stack.contains(&RuleKey::from("c")));

        // Re-entry pushes another frame
        let _again = stack.enter(&a);
        assert_eq!(stack.depth(), 3);
    }

    #[test]
    fn detached_scope_hides_outer_frames() {
        let stack = EvalStack::default();
        let a = RuleKey::from("a");
        let b = RuleKey::from("b");

        let _fa = stack.enter(&a);
        {
            let _scope = stack.detach();
            assert!(!stack.contains(&a));
            assert_eq!(stack.current(), Some(a.clone()));

            let _fb = stack.enter(&b);
            assert!(stack.contains(&b));
        }

        // Enclosing scope restored
        assert!(stack.contains(&a));
        assert!(!stack.contains(&b));
        assert_eq!(stack.depth(), 1);
    }
}
