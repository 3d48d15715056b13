//! Domain layer: challenge records, rate windows and the value objects that
//! flow through the verification engine.

pub mod entities;
pub mod value_objects;

pub use entities::*;
pub use value_objects::*;
