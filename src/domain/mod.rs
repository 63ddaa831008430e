//! Domain types shared by the cache and the render pipeline.

pub mod entity;
pub mod keys;
pub mod providers;
