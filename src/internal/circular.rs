//! Circular dependency detection infrastructure.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};
use crate::key::Key;

pub(crate) const MAX_DEPTH: usize = 256;

// Keys currently being constructed on this thread, outermost first
thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<Key>> = const { RefCell::new(Vec::new()) };
}

/// Marks a key as under construction until dropped.
///
/// Entering a key that is already on this thread's stack yields
/// [`DiError::Circular`] with the full path instead of recursing into a
/// once-cell that is still being initialised.
pub(crate) struct StackGuard {
    _private: (),
}

impl StackGuard {
    pub(crate) fn enter(key: &Key) -> DiResult<Self> {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            if stack.iter().any(|k| k == key) {
                let mut path: Vec<String> = stack.iter().map(Key::qualified_name).collect();
                path.push(key.qualified_name());
                return Err(DiError::Circular(path));
            }

            if stack.len() >= MAX_DEPTH {
                return Err(DiError::DepthExceeded(MAX_DEPTH));
            }

            stack.push(key.clone());
            Ok(StackGuard { _private: () })
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}
