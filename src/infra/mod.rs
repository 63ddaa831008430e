//! Infrastructure adapters: file storage, HTTP hosting and telemetry.

pub mod error;
pub mod http;
pub mod loader;
pub mod telemetry;
