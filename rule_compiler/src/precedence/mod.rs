//! Operator precedence and associativity supplied alongside a grammar

pub mod table;

pub use table::{Associativity, PrecedenceEntry, PrecedenceLoadError, PrecedenceTable};
