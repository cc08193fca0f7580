//! One-shot completions and the "all characters complete" barrier.
//!
//! A [`Completion`] is settled exactly once, either resolved with a value or
//! rejected with a [`SceneError`]. Later attempts to settle it are ignored.
//! Clones share the same slot, so the caller and the system driving the work
//! observe the same outcome.

use crate::error::SceneError;
use crate::resources::gamestate::GameStates;
use bevy_ecs::prelude::Resource;
use std::fmt;
use std::sync::{Arc, OnceLock};

pub struct Completion<T> {
    slot: Arc<OnceLock<Result<T, SceneError>>>,
}

impl<T> Clone for Completion<T> {
    fn clone(&self) -> Self {
        Completion {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for Completion<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("outcome", &self.slot.get())
            .finish()
    }
}

impl<T> Completion<T> {
    pub fn new() -> Self {
        Completion {
            slot: Arc::new(OnceLock::new()),
        }
    }

    /// Completion that is already resolved.
    pub fn resolved(value: T) -> Self {
        let c = Self::new();
        c.resolve(value);
        c
    }

    /// Completion that is already rejected.
    pub fn rejected(error: SceneError) -> Self {
        let c = Self::new();
        c.reject(error);
        c
    }

    /// Resolve; returns `false` if it was already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.slot.set(Ok(value)).is_ok()
    }

    /// Reject; returns `false` if it was already settled.
    pub fn reject(&self, error: SceneError) -> bool {
        self.slot.set(Err(error)).is_ok()
    }

    pub fn is_settled(&self) -> bool {
        self.slot.get().is_some()
    }

    pub fn outcome(&self) -> Option<&Result<T, SceneError>> {
        self.slot.get()
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.slot.get(), Some(Ok(_)))
    }

    /// Whether `other` shares the same slot.
    pub fn same_as(&self, other: &Completion<T>) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

/// A pending `wait_for_all_complete` call.
#[derive(Debug, Clone)]
pub struct Waiter {
    pub completion: Completion<()>,
    /// State to request once the barrier opens.
    pub then: Option<GameStates>,
}

/// Polling barrier that opens when no live characters remain.
///
/// The registry is checked every `poll_interval` seconds of world time. The
/// first check happens when the barrier is armed.
#[derive(Resource, Debug, Clone)]
pub struct CompletionBarrier {
    pub poll_interval: f32,
    pub next_poll: f32,
    pub waiters: Vec<Waiter>,
}

impl Default for CompletionBarrier {
    fn default() -> Self {
        Self::new(0.2)
    }
}

impl CompletionBarrier {
    pub fn new(poll_interval: f32) -> Self {
        CompletionBarrier {
            poll_interval,
            next_poll: 0.0,
            waiters: Vec::new(),
        }
    }

    pub fn is_armed(&self) -> bool {
        !self.waiters.is_empty()
    }

    /// Drop every waiter without settling it.
    pub fn disarm(&mut self) -> Vec<Waiter> {
        std::mem::take(&mut self.waiters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settles_exactly_once() {
        let c: Completion<u32> = Completion::new();
        let observer = c.clone();
        assert!(c.resolve(1));
        assert!(!c.resolve(2));
        assert!(!c.reject(SceneError::RenderSurfaceUnavailable));
        assert_eq!(observer.outcome(), Some(&Ok(1)));
        assert!(observer.same_as(&c));
    }

    #[test]
    fn rejection_is_visible_to_clones() {
        let c: Completion<()> = Completion::new();
        let observer = c.clone();
        c.reject(SceneError::RenderSurfaceUnavailable);
        assert_eq!(
            observer.outcome(),
            Some(&Err(SceneError::RenderSurfaceUnavailable))
        );
        assert!(!observer.is_ok());
    }
}
