//! Observers, their registry and the event dispatcher.
//!
//! An observer declares which capabilities it has by returning itself from
//! `as_lifecycle`, `as_command` or `as_periodic`. The registry files it under
//! every declared capability; the dispatcher and the periodic loop only ever
//! call through those declarations.

mod dispatch;
mod help;
mod periodic;
mod registry;
mod traits;

pub use dispatch::*;
pub use help::*;
pub use periodic::*;
pub use registry::*;
pub use traits::*;
