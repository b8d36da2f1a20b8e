//! Token source contract for the parse engine
//!
//! The engine never sees raw text. It consumes classified terminals
//! (`kind`, `literal`, `position`) terminated by an explicit `EndOfInput`
//! token, wrapped in a validated [`TokenStream`] that hides trivia.

pub mod token;
pub mod token_stream;

pub use token::{Token, END_OF_INPUT};
pub use token_stream::{TokenStream, TokenStreamError};
