//! Ready-made grammars

pub mod calculator;

pub use calculator::{evaluate, BinaryOp, Expr, TreeShapeError};
