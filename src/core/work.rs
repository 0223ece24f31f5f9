//! Work item trait and related types

use std::fmt;

/// A trait representing a unit of work submitted to a worker pool.
///
/// Ownership of a work item transfers to the pool at submission time.
/// The pool executes each item at most once on one of its worker threads;
/// an item still queued when the pool is torn down is dropped without
/// running.
pub trait WorkItem: Send {
    /// Execute the work item
    fn run(&mut self);

    /// Get the item's type name for debugging and statistics
    fn name(&self) -> &str {
        "WorkItem"
    }
}

impl fmt::Debug for dyn WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkItem({})", self.name())
    }
}

/// A boxed work item that can be sent across threads
pub type BoxedWorkItem = Box<dyn WorkItem>;

/// Helper to create a work item from a closure
pub struct ClosureWork<F>
where
    F: FnOnce() + Send,
{
    closure: Option<F>,
    name: String,
}

impl<F> ClosureWork<F>
where
    F: FnOnce() + Send,
{
    /// Create a new closure work item
    pub fn new(closure: F) -> Self {
        Self {
            closure: Some(closure),
            name: "ClosureWork".to_string(),
        }
    }

    /// Create a new closure work item with a custom name
    pub fn with_name<S: Into<String>>(closure: F, name: S) -> Self {
        Self {
            closure: Some(closure),
            name: name.into(),
        }
    }
}

impl<F> WorkItem for ClosureWork<F>
where
    F: FnOnce() + Send,
{
    fn run(&mut self) {
        if let Some(closure) = self.closure.take() {
            closure();
        } else {
            // The pool never runs an item twice; reaching this is a caller bug.
            log::warn!("ClosureWork '{}' run a second time, ignoring", self.name);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
