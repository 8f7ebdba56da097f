//! Re-entrancy guard.
//!
//! A subtype hook may run nested checks, and a nested check may come back to
//! the query that started it. Each thread tracks the queries currently being
//! evaluated on its stack so such a cycle answers `false` instead of
//! recursing forever.
//!
//! The `false` given to a re-entered query is provisional. Every query in
//! flight when it is handed out is tainted, and a tainted answer must not be
//! cached: it depends on which query happened to start the cycle.

use std::cell::RefCell;

use lion_core::id::EngineId;

use crate::store::CacheKey;

struct Frame {
    key: (EngineId, CacheKey),
    tainted: bool,
}

thread_local! {
    static IN_FLIGHT: RefCell<Vec<Frame>> = RefCell::new(Vec::new());
}

/// Marks a query as in flight until dropped.
pub(crate) struct InFlight {
    key: (EngineId, CacheKey),
}

impl InFlight {
    /// Mark `key` as in flight, or return `None` if it already is.
    ///
    /// Refusing an entry taints every query currently in flight on this
    /// thread.
    pub(crate) fn enter(engine: EngineId, key: CacheKey) -> Option<Self> {
        let key = (engine, key);
        IN_FLIGHT.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|frame| frame.key == key) {
                for frame in stack.iter_mut() {
                    frame.tainted = true;
                }
                return None;
            }
            stack.push(Frame { key, tainted: false });
            Some(Self { key })
        })
    }

    /// Whether a re-entered query was answered while this one was in flight.
    pub(crate) fn is_tainted(&self) -> bool {
        IN_FLIGHT.with(|stack| {
            stack
                .borrow()
                .iter()
                .rev()
                .find(|frame| frame.key == self.key)
                .map_or(false, |frame| frame.tainted)
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        IN_FLIGHT.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|frame| frame.key == self.key) {
                stack.remove(pos);
            }
        });
    }
}
