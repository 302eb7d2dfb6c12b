//! Boolean query mini-language: validation and enhancement.
//!
//! The backend accepts terms, `AND`/`OR`/`NOT`, parenthesized groups, quoted
//! exact phrases, `*`/`?` wildcards and a `NEAR("a","b",dist[,inOrder])`
//! proximity operator. [`validate`] checks a query against that grammar;
//! [`enhance`] builds one from a free-text topic.

mod enhancer;
mod parser;

pub use enhancer::{enhance, DomainContext};
pub use parser::{validate, SyntaxError, SyntaxErrorKind, ValidationResult, ValidationWarning};
