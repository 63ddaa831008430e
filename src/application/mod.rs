//! Application layer: collaborator traits, errors and the render pipeline.

pub mod error;
pub mod platform;
pub mod render;
