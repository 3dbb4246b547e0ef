//! Parser for the textual form emitted by [`print_module`]. Sort annotations
//! are authoritative only where the data model needs them (constants, inputs,
//! extension widths, array sorts); everything else is re-checked by the
//! verifier against the operations themselves.
//!
//! [`print_module`]: super::print::print_module
use std::collections::HashMap;

use thiserror::Error;

use super::module::{Block, Module, Value};
use super::ops::{BinaryKind, ExtKind, Op, OverflowKind, Pred, ReduceKind, UnaryKind};
use super::types::Sort;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {lineno}: expected {expected}, found `{found}`")]
    Expected {
        lineno: u32,
        expected: String,
        found: String,
    },
    #[error("line {lineno}: unknown operation `{name}`")]
    UnknownOp { lineno: u32, name: String },
    #[error("line {lineno}: unknown comparison predicate `{name}`")]
    UnknownPred { lineno: u32, name: String },
    #[error("line {lineno}: unknown value `%{name}`")]
    UnknownValue { lineno: u32, name: String },
    #[error("line {lineno}: value `%{name}` is defined twice")]
    Redefined { lineno: u32, name: String },
    #[error("line {lineno}: number out of range")]
    Number { lineno: u32 },
    #[error("line {lineno}: `{op}` requires a {expected} sort annotation")]
    BadSort {
        lineno: u32,
        op: String,
        expected: &'static str,
    },
    #[error("unexpected end of input")]
    Eof,
}

#[derive(Clone, PartialEq, Eq, Debug)]
enum Tok {
    /// Bare identifier, including dotted op names like `btor.add`
    Ident(String),
    /// `%`-prefixed value name
    Value(String),
    Int(u128),
    Punct(char),
}

impl std::fmt::Display for Tok {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tok::Ident(s) => write!(f, "{s}"),
            Tok::Value(s) => write!(f, "%{s}"),
            Tok::Int(n) => write!(f, "{n}"),
            Tok::Punct(c) => write!(f, "{c}"),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<(Tok, u32)>, ParseError> {
    let mut toks = Vec::new();
    let mut lineno = 1u32;
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                lineno += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '/' => {
                // line comment
                chars.next();
                if chars.peek() == Some(&'/') {
                    for c in chars.by_ref() {
                        if c == '\n' {
                            lineno += 1;
                            break;
                        }
                    }
                } else {
                    return Err(ParseError::Expected {
                        lineno,
                        expected: "`//`".to_string(),
                        found: "/".to_string(),
                    });
                }
            }
            '%' => {
                chars.next();
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    return Err(ParseError::Expected {
                        lineno,
                        expected: "value name after `%`".to_string(),
                        found: chars.peek().map(|c| c.to_string()).unwrap_or_default(),
                    });
                }
                toks.push((Tok::Value(name), lineno));
            }
            c if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() {
                        digits.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value: u128 = digits.parse().map_err(|_| ParseError::Number { lineno })?;
                toks.push((Tok::Int(value), lineno));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                toks.push((Tok::Ident(name), lineno));
            }
            '{' | '}' | '(' | ')' | '[' | ']' | ',' | ':' | '=' | '<' | '>' => {
                chars.next();
                toks.push((Tok::Punct(c), lineno));
            }
            other => {
                return Err(ParseError::Expected {
                    lineno,
                    expected: "a token".to_string(),
                    found: other.to_string(),
                });
            }
        }
    }
    Ok(toks)
}

/// Parse a module from its textual form.
pub fn parse_module(text: &str) -> Result<Module, ParseError> {
    let toks = tokenize(text)?;
    let mut parser = Parser { toks, pos: 0 };
    parser.module()
}

struct Parser {
    toks: Vec<(Tok, u32)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos).map(|(t, _)| t)
    }

    fn lineno(&self) -> u32 {
        self.toks
            .get(self.pos)
            .or_else(|| self.toks.last())
            .map(|(_, l)| *l)
            .unwrap_or(1)
    }

    fn next(&mut self) -> Result<Tok, ParseError> {
        let tok = self.toks.get(self.pos).map(|(t, _)| t.clone());
        self.pos += 1;
        tok.ok_or(ParseError::Eof)
    }

    fn expected(&self, what: impl Into<String>, found: &Tok) -> ParseError {
        ParseError::Expected {
            lineno: self.lineno(),
            expected: what.into(),
            found: found.to_string(),
        }
    }

    fn punct(&mut self, c: char) -> Result<(), ParseError> {
        let tok = self.next()?;
        if tok == Tok::Punct(c) {
            Ok(())
        } else {
            Err(self.expected(format!("`{c}`"), &tok))
        }
    }

    fn keyword(&mut self, word: &str) -> Result<(), ParseError> {
        let tok = self.next()?;
        if tok == Tok::Ident(word.to_string()) {
            Ok(())
        } else {
            Err(self.expected(format!("`{word}`"), &tok))
        }
    }

    fn int(&mut self) -> Result<u128, ParseError> {
        let tok = self.next()?;
        match tok {
            Tok::Int(n) => Ok(n),
            other => Err(self.expected("an integer", &other)),
        }
    }

    fn small_int(&mut self) -> Result<u32, ParseError> {
        let lineno = self.lineno();
        u32::try_from(self.int()?).map_err(|_| ParseError::Number { lineno })
    }

    fn value_name(&mut self) -> Result<String, ParseError> {
        let tok = self.next()?;
        match tok {
            Tok::Value(name) => Ok(name),
            other => Err(self.expected("a value", &other)),
        }
    }

    fn sort(&mut self) -> Result<Sort, ParseError> {
        let tok = self.next()?;
        match tok {
            Tok::Ident(word) if word == "bv" => {
                self.punct('<')?;
                let width = self.small_int()?;
                self.punct('>')?;
                Ok(Sort::BitVec(width))
            }
            Tok::Ident(word) if word == "array" => {
                self.punct('<')?;
                let index = self.bitvec_sort()?;
                self.punct(',')?;
                let element = self.bitvec_sort()?;
                self.punct('>')?;
                Ok(Sort::Array { index, element })
            }
            other => Err(self.expected("a sort", &other)),
        }
    }

    fn bitvec_sort(&mut self) -> Result<u32, ParseError> {
        let lineno = self.lineno();
        match self.sort()? {
            Sort::BitVec(width) => Ok(width),
            Sort::Array { .. } => Err(ParseError::BadSort {
                lineno,
                op: "array".to_string(),
                expected: "bit vector",
            }),
        }
    }

    fn module(&mut self) -> Result<Module, ParseError> {
        self.keyword("module")?;
        self.punct('{')?;

        self.keyword("init")?;
        self.punct('{')?;
        let init = self.block_body(Vec::new())?;

        self.keyword("next")?;
        self.punct('(')?;
        let mut args = Vec::new();
        let mut arg_names = Vec::new();
        if self.peek() != Some(&Tok::Punct(')')) {
            loop {
                let name = self.value_name()?;
                self.punct(':')?;
                let sort = self.sort()?;
                arg_names.push(name);
                args.push(sort);
                match self.next()? {
                    Tok::Punct(',') => continue,
                    Tok::Punct(')') => break,
                    other => return Err(self.expected("`,` or `)`", &other)),
                }
            }
        } else {
            self.punct(')')?;
        }
        self.punct('{')?;
        let next = self.block_body_named(args, &arg_names)?;

        self.punct('}')?;
        if let Some(tok) = self.peek() {
            let tok = tok.clone();
            return Err(self.expected("end of input", &tok));
        }

        Ok(Module {
            states: next.args.clone(),
            init,
            next,
        })
    }

    fn block_body(&mut self, args: Vec<Sort>) -> Result<Block, ParseError> {
        self.block_body_named(args, &[])
    }

    /// Parse ops up to and including `yield ... }`.
    fn block_body_named(
        &mut self,
        args: Vec<Sort>,
        arg_names: &[String],
    ) -> Result<Block, ParseError> {
        let mut block = Block::new(args);
        let mut names: HashMap<String, Value> = HashMap::new();
        for (i, name) in arg_names.iter().enumerate() {
            names.insert(name.clone(), Value::Arg(i));
        }

        loop {
            let tok = self.next()?;
            match tok {
                Tok::Value(name) => {
                    self.punct('=')?;
                    let op = self.op(&names)?;
                    let lineno = self.lineno();
                    let Some(value) = block.push(op) else {
                        return Err(ParseError::Expected {
                            lineno,
                            expected: "an operation with a result".to_string(),
                            found: "one without".to_string(),
                        });
                    };
                    if names.insert(name.clone(), value).is_some() {
                        return Err(ParseError::Redefined { lineno, name });
                    }
                }
                Tok::Ident(word) if word == "yield" => {
                    if self.peek().is_some_and(|t| matches!(t, Tok::Value(_))) {
                        loop {
                            let name = self.value_name()?;
                            block.yields.push(self.lookup(&names, &name)?);
                            if self.peek() == Some(&Tok::Punct(',')) {
                                self.punct(',')?;
                            } else {
                                break;
                            }
                        }
                    }
                    self.punct('}')?;
                    return Ok(block);
                }
                Tok::Ident(_) => {
                    self.pos -= 1;
                    let op = self.op(&names)?;
                    block.push(op);
                }
                other => return Err(self.expected("an operation or `yield`", &other)),
            }
        }
    }

    fn lookup(&self, names: &HashMap<String, Value>, name: &str) -> Result<Value, ParseError> {
        names
            .get(name)
            .copied()
            .ok_or_else(|| ParseError::UnknownValue {
                lineno: self.lineno(),
                name: name.to_string(),
            })
    }

    fn operand(&mut self, names: &HashMap<String, Value>) -> Result<Value, ParseError> {
        let name = self.value_name()?;
        self.lookup(names, &name)
    }

    fn op(&mut self, names: &HashMap<String, Value>) -> Result<Op, ParseError> {
        let lineno = self.lineno();
        let tok = self.next()?;
        let Tok::Ident(full) = tok else {
            return Err(self.expected("an operation name", &tok));
        };
        let Some(name) = full.strip_prefix("btor.") else {
            return Err(ParseError::UnknownOp {
                lineno,
                name: full,
            });
        };

        if let Some(kind) = unary_kind(name) {
            let operand = self.operand(names)?;
            self.annotation(1)?;
            return Ok(Op::Unary { kind, operand });
        }
        if let Some(kind) = reduce_kind(name) {
            let operand = self.operand(names)?;
            self.annotation(1)?;
            return Ok(Op::Reduce { kind, operand });
        }
        if let Some(kind) = binary_kind(name) {
            let lhs = self.operand(names)?;
            self.punct(',')?;
            let rhs = self.operand(names)?;
            self.annotation(1)?;
            return Ok(Op::Binary { kind, lhs, rhs });
        }
        if let Some(kind) = overflow_kind(name) {
            let lhs = self.operand(names)?;
            self.punct(',')?;
            let rhs = self.operand(names)?;
            self.annotation(1)?;
            return Ok(Op::Overflow { kind, lhs, rhs });
        }

        match name {
            "constant" => {
                let value = self.int()?;
                self.punct(':')?;
                let sort = self.sort()?;
                if !matches!(sort, Sort::BitVec(_)) {
                    return Err(ParseError::BadSort {
                        lineno,
                        op: full,
                        expected: "bit vector",
                    });
                }
                Ok(Op::Constant { value, sort })
            }
            "input" => {
                let id = self.int()? as u64;
                self.punct(':')?;
                let lineno = self.lineno();
                let Sort::BitVec(width) = self.sort()? else {
                    return Err(ParseError::BadSort {
                        lineno,
                        op: full,
                        expected: "bit vector",
                    });
                };
                Ok(Op::Input { id, width })
            }
            "nd_state" => {
                let id = self.int()? as u64;
                self.punct(':')?;
                let sort = self.sort()?;
                Ok(Op::NdState { id, sort })
            }
            "array" => {
                self.punct(':')?;
                let sort = self.array_sort(&full)?;
                Ok(Op::Array { sort })
            }
            "init_array" => {
                let init = self.operand(names)?;
                self.punct(':')?;
                let sort = self.array_sort(&full)?;
                Ok(Op::InitArray { init, sort })
            }
            "cmp" => {
                let tok = self.next()?;
                let Tok::Ident(word) = tok else {
                    return Err(self.expected("a predicate", &tok));
                };
                let pred =
                    Pred::from_mnemonic(&word).ok_or_else(|| ParseError::UnknownPred {
                        lineno,
                        name: word,
                    })?;
                self.punct(',')?;
                let lhs = self.operand(names)?;
                self.punct(',')?;
                let rhs = self.operand(names)?;
                self.annotation(1)?;
                Ok(Op::Cmp { pred, lhs, rhs })
            }
            "slice" => {
                let operand = self.operand(names)?;
                self.punct(',')?;
                let upper = self.small_int()?;
                self.punct(',')?;
                let lower = self.small_int()?;
                self.annotation(2)?;
                Ok(Op::Slice {
                    operand,
                    upper,
                    lower,
                })
            }
            "sext" | "uext" => {
                let kind = if name == "sext" {
                    ExtKind::Sext
                } else {
                    ExtKind::Uext
                };
                let operand = self.operand(names)?;
                self.punct(':')?;
                self.sort()?;
                self.punct(',')?;
                let lineno = self.lineno();
                let Sort::BitVec(width) = self.sort()? else {
                    return Err(ParseError::BadSort {
                        lineno,
                        op: full,
                        expected: "bit vector",
                    });
                };
                Ok(Op::Ext {
                    kind,
                    operand,
                    width,
                })
            }
            "concat" => {
                let lhs = self.operand(names)?;
                self.punct(',')?;
                let rhs = self.operand(names)?;
                self.annotation(3)?;
                Ok(Op::Concat { lhs, rhs })
            }
            "ite" => {
                let cond = self.operand(names)?;
                self.punct(',')?;
                let then_value = self.operand(names)?;
                self.punct(',')?;
                let else_value = self.operand(names)?;
                self.annotation(1)?;
                Ok(Op::Ite {
                    cond,
                    then_value,
                    else_value,
                })
            }
            "read" => {
                let array = self.operand(names)?;
                self.punct('[')?;
                let index = self.operand(names)?;
                self.punct(']')?;
                self.annotation(2)?;
                Ok(Op::Read { array, index })
            }
            "write" => {
                let value = self.operand(names)?;
                self.punct(',')?;
                let array = self.operand(names)?;
                self.punct('[')?;
                let index = self.operand(names)?;
                self.punct(']')?;
                self.annotation(1)?;
                Ok(Op::Write {
                    value,
                    array,
                    index,
                })
            }
            "constraint" => {
                let cond = self.operand(names)?;
                Ok(Op::Constraint { cond })
            }
            "assert_not" => {
                let cond = self.operand(names)?;
                self.punct(',')?;
                let property = self.int()? as u64;
                Ok(Op::AssertNot { cond, property })
            }
            _ => Err(ParseError::UnknownOp {
                lineno,
                name: full,
            }),
        }
    }

    /// Consume `: sort (, sort)*` — decorative annotations re-derived by the
    /// verifier from the operations themselves.
    fn annotation(&mut self, count: usize) -> Result<(), ParseError> {
        self.punct(':')?;
        for i in 0..count {
            if i > 0 {
                self.punct(',')?;
            }
            self.sort()?;
        }
        Ok(())
    }

    fn array_sort(&mut self, op: &str) -> Result<Sort, ParseError> {
        let lineno = self.lineno();
        match self.sort()? {
            sort @ Sort::Array { .. } => Ok(sort),
            Sort::BitVec(_) => Err(ParseError::BadSort {
                lineno,
                op: op.to_string(),
                expected: "array",
            }),
        }
    }
}

fn unary_kind(name: &str) -> Option<UnaryKind> {
    let kind = match name {
        "not" => UnaryKind::Not,
        "inc" => UnaryKind::Inc,
        "dec" => UnaryKind::Dec,
        "neg" => UnaryKind::Neg,
        _ => return None,
    };
    Some(kind)
}

fn reduce_kind(name: &str) -> Option<ReduceKind> {
    let kind = match name {
        "redand" => ReduceKind::RedAnd,
        "redor" => ReduceKind::RedOr,
        "redxor" => ReduceKind::RedXor,
        _ => return None,
    };
    Some(kind)
}

fn binary_kind(name: &str) -> Option<BinaryKind> {
    let kind = match name {
        "add" => BinaryKind::Add,
        "sub" => BinaryKind::Sub,
        "mul" => BinaryKind::Mul,
        "sdiv" => BinaryKind::SDiv,
        "udiv" => BinaryKind::UDiv,
        "smod" => BinaryKind::SMod,
        "srem" => BinaryKind::SRem,
        "urem" => BinaryKind::URem,
        "and" => BinaryKind::And,
        "nand" => BinaryKind::Nand,
        "nor" => BinaryKind::Nor,
        "or" => BinaryKind::Or,
        "xor" => BinaryKind::Xor,
        "xnor" => BinaryKind::Xnor,
        "iff" => BinaryKind::Iff,
        "implies" => BinaryKind::Implies,
        "sll" => BinaryKind::ShiftLL,
        "srl" => BinaryKind::ShiftRL,
        "sra" => BinaryKind::ShiftRA,
        "rol" => BinaryKind::RotateL,
        "ror" => BinaryKind::RotateR,
        _ => return None,
    };
    Some(kind)
}

fn overflow_kind(name: &str) -> Option<OverflowKind> {
    let kind = match name {
        "saddo" => OverflowKind::SAdd,
        "uaddo" => OverflowKind::UAdd,
        "ssubo" => OverflowKind::SSub,
        "usubo" => OverflowKind::USub,
        "smulo" => OverflowKind::SMul,
        "umulo" => OverflowKind::UMul,
        "sdivo" => OverflowKind::SDiv,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::print::print_module;
    use crate::ir::verify::{VerifyError, verify};

    const COUNTER_IR: &str = "\
module {
  init {
    %0 = btor.constant 0 : bv<4>
    yield %0
  }
  next(%arg0: bv<4>) {
    %0 = btor.constant 1 : bv<4>
    %1 = btor.add %arg0, %0 : bv<4>
    %2 = btor.constant 15 : bv<4>
    %3 = btor.cmp eq, %arg0, %2 : bv<4>
    btor.assert_not %3, 0
    yield %1
  }
}
";

    #[test]
    fn parses_and_reprints_counter() {
        let module = parse_module(COUNTER_IR).unwrap();
        verify(&module).unwrap();
        assert_eq!(module.states, vec![Sort::BitVec(4)]);
        assert_eq!(module.next.ops.len(), 5);
        assert_eq!(print_module(&module).unwrap(), COUNTER_IR);
    }

    #[test]
    fn parses_array_ops() {
        let text = "\
module {
  init {
    %0 = btor.constant 0 : bv<8>
    %1 = btor.init_array %0 : array<bv<3>, bv<8>>
    yield %1
  }
  next(%arg0: array<bv<3>, bv<8>>) {
    %0 = btor.constant 2 : bv<3>
    %1 = btor.read %arg0[%0] : array<bv<3>, bv<8>>, bv<8>
    %2 = btor.write %1, %arg0[%0] : array<bv<3>, bv<8>>
    yield %2
  }
}
";
        let module = parse_module(text).unwrap();
        verify(&module).unwrap();
        assert_eq!(print_module(&module).unwrap(), text);
    }

    #[test]
    fn huge_slice_bound_fails_verification() {
        let text = "\
module {
  init {
    %0 = btor.constant 0 : bv<4>
    %1 = btor.slice %0, 4294967295, 0 : bv<4>, bv<1>
    yield %0
  }
  next(%arg0: bv<4>) {
    yield %arg0
  }
}
";
        let module = parse_module(text).unwrap();
        assert!(matches!(
            verify(&module),
            Err(VerifyError::SliceOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_unknown_value() {
        let text = "\
module {
  init {
    %0 = btor.not %missing : bv<1>
    yield %0
  }
  next() {
    yield
  }
}
";
        let err = parse_module(text).unwrap_err();
        assert!(matches!(err, ParseError::UnknownValue { .. }));
    }

    #[test]
    fn rejects_unknown_op() {
        let err = parse_module("module { init { %0 = btor.bogus %1 : bv<1>").unwrap_err();
        assert!(matches!(err, ParseError::UnknownOp { .. }));
    }

    #[test]
    fn comments_are_skipped() {
        let text = "\
// counter
module {
  init {
    %0 = btor.constant 0 : bv<4> // start at zero
    yield %0
  }
  next(%arg0: bv<4>) {
    yield %arg0
  }
}
";
        let module = parse_module(text).unwrap();
        assert_eq!(module.init.ops.len(), 1);
    }
}
