//! The BTOR IR dialect: sorts and operations over fixed-width bit vectors
//! and arrays, a two-block transition-system [`Module`], a structural
//! verifier, and a textual form with printer and parser.
pub mod module;
pub mod ops;
pub mod parse;
pub mod print;
pub mod types;
pub mod verify;

pub use module::{Block, BlockKind, Module, Value};
pub use ops::{BinaryKind, ExtKind, Op, OverflowKind, Pred, ReduceKind, UnaryKind};
pub use parse::{ParseError, parse_module};
pub use print::print_module;
pub use types::Sort;
pub use verify::{VerifyError, verify};
