//! Grid execution engine for the Labyrinth interpreter: the `Grid` a
//! program lives on, the `Maiden`s that walk it, the `Dispatcher` that
//! gives each cell meaning, and the `Engine` that drives the scheduling
//! loop tying them together.

mod dispatcher;
mod engine;
mod error;
mod grid;
mod maiden;
mod random;

pub use dispatcher::{arity, dispatch, Effect, Status};
pub use engine::{DebugOptions, DebugRenderer, Engine, NullRenderer};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use grid::Grid;
pub use maiden::Maiden;
pub use random::Random;
