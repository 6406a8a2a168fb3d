//! Classifiers that derive problem and step shapes from a generic [`Representation`].
//!
//! [`Representation`]: crate::model::Representation

pub mod authorization;
pub mod polling;
pub mod problem;
pub mod redirection;

pub use authorization::*;
pub use polling::*;
pub use problem::*;
pub use redirection::*;
