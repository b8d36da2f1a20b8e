//! Shared primitive types used across the grammar, engine and tree modules

pub mod span;

pub use span::Span;
