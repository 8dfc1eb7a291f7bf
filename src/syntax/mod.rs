//! Java front end: tokens, syntax tree and parser.

mod kind;
pub mod lexer;
mod parser;
mod tree;

pub use kind::SyntaxKind;
pub use parser::{ParseError, parse};
pub use tree::{Children, NodeId, NodeRef, SyntaxTree};
