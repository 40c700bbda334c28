//! Core document model, error types, and LaTeX escaping.
//!
//! This crate does no container or XML I/O of its own: it is the
//! shared vocabulary `doctex-convert` and `doctex-image` build on, the
//! way `docling-core` is the shared vocabulary for `docling-backend`.
//! It depends on `doctex-math` only for the `MathNode` type embedded
//! in [`model::Inline::Math`].

pub mod error;
pub mod escape;
pub mod model;

pub use error::{DoctexError, Result};
pub use escape::escape_latex;
