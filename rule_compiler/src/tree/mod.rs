//! Parse tree output: nodes with schema-ordered field captures

pub mod node;

pub use node::{FieldValue, ParseNode};
