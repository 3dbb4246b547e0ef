//! BTOR2 format front end: line tags, resolved sorts, and the `parser`
//! producing an indexed [`Model`] ready for translation into BTOR IR.
pub mod parser;
pub use parser::{Line, Model, ParseError, Sort, Tag};
