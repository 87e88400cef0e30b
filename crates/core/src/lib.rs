//! Value model for the Labyrinth interpreter: tagged `Value`s, the
//! refcounted `Array` they can hold, and the `Coordinate` used for grid
//! positions and velocities.

mod array;
mod coordinate;
mod value;

pub use array::Array;
pub use coordinate::{Coordinate, DOWN, LEFT, RIGHT, UP, ZERO};
pub use value::{Value, ValueError};
