//! Identifier grammars recognized inside free-text field values.

pub mod arxiv;
pub mod doi;

pub use arxiv::{ArxivIdentifier, EPRINT_TYPE};
pub use doi::Doi;
