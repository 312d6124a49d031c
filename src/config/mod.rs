//! Configuration parsing and types.
//!
//! - `service` - Per-service configuration (`ServiceConfig`, `ContainerOptions`)
//! - `types` - Root project file structure (`Config`)
//! - `parser` - YAML config loading
//! - `validation` - Name, image/build and link validation

mod parser;
mod service;
mod types;
mod validation;

pub use parser::*;
pub use service::*;
pub use types::*;
pub use validation::*;
