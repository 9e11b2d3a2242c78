//! Delayed task scheduling shared by all handlers.
//!
//! One worker task owns a min-heap of deadlines. Cancelling a task removes it
//! from the registry and leaves a tombstone in the heap that the worker skips
//! when the deadline comes up.

mod registry;
mod worker;

pub use registry::*;
pub use worker::*;
