//! # codebrief syntax
//!
//! Turns source files into a language-independent syntax tree and reduces
//! that tree to the imports, functions and classes it declares.
//!
//! ## Architecture
//!
//! ```text
//! Source Code
//!     │
//!     ├──> Language Detection (from extension)
//!     │
//!     ├──> Grammar Cache (lazy, per language)
//!     │
//!     ├──> Tree-sitter Parsing → GenericAstNode
//!     │
//!     └──> Condenser (construct table lookup per node)
//!          └─> CondensedAst { imports, functions, classes }
//! ```
//!
//! ## Example
//!
//! ```rust
//! use codebrief_syntax::{condense, Language, SyntaxParser};
//!
//! let parser = SyntaxParser::default();
//! let tree = parser
//!     .parse("import {x} from './y'\nfunction add(a, b) {}", Language::TypeScript)
//!     .unwrap();
//!
//! let condensed = condense(&tree);
//! assert_eq!(condensed.imports[0].source, "./y");
//! assert_eq!(condensed.functions[0].params, vec!["a", "b"]);
//! ```

mod ast;
mod condenser;
mod constructs;
mod error;
mod language;
mod parser;

pub use ast::{Descendants, GenericAstNode, Position};
pub use condenser::{condense, dequote};
pub use error::{Result, SyntaxError};
pub use language::Language;
pub use parser::{GrammarCache, SyntaxParser};
