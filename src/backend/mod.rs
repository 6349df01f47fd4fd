//! Backend abstraction layer
//!
//! Provides the boundary between the render graph and whatever owns the
//! actual GPU objects, plus a dummy implementation for tests and tooling.

pub mod dummy;
pub mod traits;
pub mod types;

pub use dummy::{DummyBackend, DummyResource};
pub use traits::*;
pub use types::*;
