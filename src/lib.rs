//! Rebuilds protoc's flat descriptor lists into a linked, mutable AST and
//! describes it back as `.proto` source.

pub mod ast;
pub mod collector;
pub mod common;
pub mod compile;
pub mod context;
pub mod emit;
pub mod error;
pub mod json;
pub mod mutate;
pub mod options;
pub mod print;
pub mod visitor;

pub use ast::{Ast, NodeRef};
pub use error::{Error, Result};
pub use mutate::{AField, ExtensibleFile, Function};
pub use options::Options;
pub use print::{render, Print};
pub use visitor::{walk, walk_all, Visitor, Walk};
