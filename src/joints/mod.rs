//! Engine-agnostic joint layer
//!
//! Descriptors are authored as data, optionally rescaled once, and materialized into a
//! simulation world through the [`adapter`](crate::adapter) traits.

pub mod definition;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod point;
pub mod variants;

pub use definition::*;
pub use descriptor::*;
pub use error::JointError;
pub use factory::{CreationOutcome, create_constraint};
pub use point::{Point, ScaleFactor};
pub use variants::*;

#[cfg(test)]
mod tests;
