//! # hform-core
//!
//! Core types shared by every hform crate.
//!
//! This crate provides:
//! - `ErrorPath` / `PathSegment`: instance locations relative to the validated root
//! - `Keyword`: the closed set of validation keywords an error can report
//! - `ValidationError`: one reported constraint violation (the wire contract
//!   consumed by the form layer)
//! - Structural JSON helpers (`deep_equal`, instance type names)
//!
//! Schema-authoring errors are not defined here. They live next to the code
//! that detects them (`hform-logic`, `hform-schema`).

pub mod keyword;
pub mod path;
pub mod validation;
pub mod value;

pub use keyword::Keyword;
pub use path::{ErrorPath, PathSegment};
pub use validation::ValidationError;
pub use value::{deep_equal, is_integral, type_name};
