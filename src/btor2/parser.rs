use std::collections::HashMap;

use thiserror::Error;

/// Errors encountered when parsing BTOR2 text
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {lineno}: {msg}")]
    Syntax { lineno: u32, msg: String },
    #[error("line {lineno}: unknown keyword `{word}`")]
    UnknownKeyword { lineno: u32, word: String },
    #[error("line {lineno}: reference to undefined id {id}")]
    UndefinedId { lineno: u32, id: u64 },
    #[error("line {lineno}: id {id} is not a sort")]
    NotASort { lineno: u32, id: u64 },
    #[error("line {lineno}: id {id} does not produce a value")]
    NotAValue { lineno: u32, id: u64 },
    #[error("line {lineno}: ids must be positive and strictly increasing")]
    IdOutOfOrder { lineno: u32 },
    #[error("line {lineno}: invalid {what} `{text}`")]
    Number {
        lineno: u32,
        what: &'static str,
        text: String,
    },
    #[error("line {lineno}: bit vectors wider than 128 bits are not supported here")]
    WidthUnsupported { lineno: u32 },
    #[error("line {lineno}: constant does not fit in {width} bits")]
    ConstantTooWide { lineno: u32, width: u32 },
}

/// Every BTOR2 keyword handled by the translations
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Tag {
    // structure
    Sort,
    Input,
    State,
    Init,
    Next,
    Bad,
    Constraint,
    Output,
    Fair,
    Justice,
    // constants
    Const,
    Constd,
    Consth,
    One,
    Ones,
    Zero,
    // unary
    Not,
    Inc,
    Dec,
    Neg,
    Redand,
    Redor,
    Redxor,
    // binary
    Add,
    And,
    Concat,
    Eq,
    Iff,
    Implies,
    Mul,
    Nand,
    Neq,
    Nor,
    Or,
    Read,
    Rol,
    Ror,
    Saddo,
    Sdiv,
    Sdivo,
    Sgt,
    Sgte,
    Sll,
    Slt,
    Slte,
    Smod,
    Smulo,
    Sra,
    Srem,
    Srl,
    Ssubo,
    Sub,
    Uaddo,
    Udiv,
    Ugt,
    Ugte,
    Ult,
    Ulte,
    Umulo,
    Urem,
    Usubo,
    Xnor,
    Xor,
    // ternary
    Ite,
    Write,
    // indexed
    Slice,
    Sext,
    Uext,
}

impl Tag {
    pub fn from_keyword(word: &str) -> Option<Tag> {
        let tag = match word {
            "sort" => Tag::Sort,
            "input" => Tag::Input,
            "state" => Tag::State,
            "init" => Tag::Init,
            "next" => Tag::Next,
            "bad" => Tag::Bad,
            "constraint" => Tag::Constraint,
            "output" => Tag::Output,
            "fair" => Tag::Fair,
            "justice" => Tag::Justice,
            "const" => Tag::Const,
            "constd" => Tag::Constd,
            "consth" => Tag::Consth,
            "one" => Tag::One,
            "ones" => Tag::Ones,
            "zero" => Tag::Zero,
            "not" => Tag::Not,
            "inc" => Tag::Inc,
            "dec" => Tag::Dec,
            "neg" => Tag::Neg,
            "redand" => Tag::Redand,
            "redor" => Tag::Redor,
            "redxor" => Tag::Redxor,
            "add" => Tag::Add,
            "and" => Tag::And,
            "concat" => Tag::Concat,
            "eq" => Tag::Eq,
            "iff" => Tag::Iff,
            "implies" => Tag::Implies,
            "mul" => Tag::Mul,
            "nand" => Tag::Nand,
            "neq" => Tag::Neq,
            "nor" => Tag::Nor,
            "or" => Tag::Or,
            "read" => Tag::Read,
            "rol" => Tag::Rol,
            "ror" => Tag::Ror,
            "saddo" => Tag::Saddo,
            "sdiv" => Tag::Sdiv,
            "sdivo" => Tag::Sdivo,
            "sgt" => Tag::Sgt,
            "sgte" => Tag::Sgte,
            "sll" => Tag::Sll,
            "slt" => Tag::Slt,
            "slte" => Tag::Slte,
            "smod" => Tag::Smod,
            "smulo" => Tag::Smulo,
            "sra" => Tag::Sra,
            "srem" => Tag::Srem,
            "srl" => Tag::Srl,
            "ssubo" => Tag::Ssubo,
            "sub" => Tag::Sub,
            "uaddo" => Tag::Uaddo,
            "udiv" => Tag::Udiv,
            "ugt" => Tag::Ugt,
            "ugte" => Tag::Ugte,
            "ult" => Tag::Ult,
            "ulte" => Tag::Ulte,
            "umulo" => Tag::Umulo,
            "urem" => Tag::Urem,
            "usubo" => Tag::Usubo,
            "xnor" => Tag::Xnor,
            "xor" => Tag::Xor,
            "ite" => Tag::Ite,
            "write" => Tag::Write,
            "slice" => Tag::Slice,
            "sext" => Tag::Sext,
            "uext" => Tag::Uext,
            _ => return None,
        };
        Some(tag)
    }

    /// Whether a line with this tag produces a value other lines may reference.
    pub fn has_result(&self) -> bool {
        !matches!(
            self,
            Tag::Sort
                | Tag::Init
                | Tag::Next
                | Tag::Bad
                | Tag::Constraint
                | Tag::Output
                | Tag::Fair
                | Tag::Justice
        )
    }
}

/// A resolved BTOR2 sort. Array sorts reference the ids of their index and
/// element sorts, which must themselves be bit-vector sorts.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Sort {
    BitVec { width: u32 },
    Array { index: u64, element: u64 },
}

/// One parsed BTOR2 line
#[derive(Clone, Debug)]
pub struct Line {
    pub id: u64,
    pub lineno: u32,
    pub tag: Tag,
    /// Sort id, for lines that carry one.
    pub sort: Option<u64>,
    /// Signed references to earlier value lines; a negative reference means
    /// the bitwise negation of the referenced value.
    pub args: Vec<i64>,
    /// Immediate operands: slice bounds and extension amounts.
    pub immediates: Vec<u64>,
    /// Evaluated constant for const/constd/consth/one/ones/zero lines.
    pub const_value: Option<u128>,
    pub symbol: Option<String>,
}

/// A parsed BTOR2 model, indexed by line id, with the ordered collections and
/// the input/bad numbering the translations rely on.
#[derive(Debug, Default)]
pub struct Model {
    lines: HashMap<u64, Line>,
    order: Vec<u64>,
    sorts: HashMap<u64, Sort>,
    pub states: Vec<u64>,
    /// state id -> id of its `init` line
    pub init_lines: HashMap<u64, u64>,
    /// state id -> signed id of its initial value
    pub state_init: HashMap<u64, i64>,
    /// state id -> signed id of its next value
    pub state_next: HashMap<u64, i64>,
    pub nexts: Vec<u64>,
    pub bads: Vec<u64>,
    pub constraints: Vec<u64>,
    /// input line id -> input ordinal, assigned in file order
    pub input_numbers: HashMap<u64, u64>,
    /// bad line id -> property ordinal, assigned in file order
    pub bad_numbers: HashMap<u64, u64>,
}

impl Model {
    pub fn parse(text: &str) -> Result<Model, ParseError> {
        Parser::default().parse(text)
    }

    pub fn line(&self, id: u64) -> Option<&Line> {
        self.lines.get(&id)
    }

    pub fn sort(&self, id: u64) -> Option<Sort> {
        self.sorts.get(&id).copied()
    }

    /// Resolve the sort of a value-producing line.
    pub fn sort_of(&self, line: &Line) -> Option<Sort> {
        line.sort.and_then(|id| self.sort(id))
    }

    /// Line ids in file order.
    pub fn order(&self) -> &[u64] {
        &self.order
    }
}

#[derive(Default)]
struct Parser {
    model: Model,
    max_id: u64,
}

impl Parser {
    fn parse(mut self, text: &str) -> Result<Model, ParseError> {
        for (index, raw) in text.lines().enumerate() {
            let lineno = (index + 1) as u32;
            let content = match raw.find(';') {
                Some(at) => &raw[..at],
                None => raw,
            };
            let mut words = content.split_whitespace();
            let Some(first) = words.next() else { continue };
            let id = parse_u64(first, "id", lineno)?;
            if id == 0 || id <= self.max_id {
                return Err(ParseError::IdOutOfOrder { lineno });
            }
            let word = words
                .next()
                .ok_or_else(|| syntax(lineno, "missing keyword after id"))?;
            let tag = Tag::from_keyword(word).ok_or_else(|| ParseError::UnknownKeyword {
                lineno,
                word: word.to_string(),
            })?;
            self.parse_line(id, lineno, tag, &mut words)?;
            self.max_id = id;
        }
        Ok(self.model)
    }

    fn parse_line<'a>(
        &mut self,
        id: u64,
        lineno: u32,
        tag: Tag,
        words: &mut impl Iterator<Item = &'a str>,
    ) -> Result<(), ParseError> {
        let mut line = Line {
            id,
            lineno,
            tag,
            sort: None,
            args: Vec::new(),
            immediates: Vec::new(),
            const_value: None,
            symbol: None,
        };
        let mut allow_symbol = false;

        match tag {
            Tag::Sort => {
                let kind = words
                    .next()
                    .ok_or_else(|| syntax(lineno, "expected `bitvec` or `array`"))?;
                let sort = match kind {
                    "bitvec" => {
                        let width = self.next_u64(words, "width", lineno)?;
                        if width == 0 {
                            return Err(syntax(lineno, "bit vector width must be positive"));
                        }
                        let width = u32::try_from(width)
                            .map_err(|_| ParseError::WidthUnsupported { lineno })?;
                        Sort::BitVec { width }
                    }
                    "array" => {
                        let index = self.next_sort_id(words, lineno)?;
                        let element = self.next_sort_id(words, lineno)?;
                        Sort::Array { index, element }
                    }
                    other => {
                        return Err(syntax(lineno, format!("unknown sort kind `{other}`")));
                    }
                };
                self.model.sorts.insert(id, sort);
            }
            Tag::Input => {
                line.sort = Some(self.next_sort_id(words, lineno)?);
                let number = self.model.input_numbers.len() as u64;
                self.model.input_numbers.insert(id, number);
                allow_symbol = true;
            }
            Tag::State => {
                line.sort = Some(self.next_sort_id(words, lineno)?);
                self.model.states.push(id);
                allow_symbol = true;
            }
            Tag::One | Tag::Ones | Tag::Zero => {
                let sort = self.next_sort_id(words, lineno)?;
                line.sort = Some(sort);
                let width = self.bitvec_width(sort, lineno)?;
                line.const_value = Some(match tag {
                    Tag::One => 1,
                    Tag::Ones => width_mask(width, lineno)?,
                    _ => 0,
                });
            }
            Tag::Const | Tag::Constd | Tag::Consth => {
                let sort = self.next_sort_id(words, lineno)?;
                line.sort = Some(sort);
                let width = self.bitvec_width(sort, lineno)?;
                let text = words
                    .next()
                    .ok_or_else(|| syntax(lineno, "expected constant"))?;
                let radix = match tag {
                    Tag::Const => 2,
                    Tag::Constd => 10,
                    _ => 16,
                };
                line.const_value = Some(parse_constant(text, radix, width, lineno)?);
            }
            Tag::Init | Tag::Next => {
                line.sort = Some(self.next_sort_id(words, lineno)?);
                let state = self.next_value_ref(words, lineno)?;
                let value = self.next_value_ref(words, lineno)?;
                line.args = vec![state, value];
                if state <= 0 {
                    return Err(syntax(lineno, "state operand must be a positive id"));
                }
                let state = state as u64;
                let target = self
                    .model
                    .line(state)
                    .ok_or(ParseError::UndefinedId { lineno, id: state })?;
                if target.tag != Tag::State {
                    return Err(syntax(lineno, format!("id {state} is not a state")));
                }
                if tag == Tag::Init {
                    if self.model.init_lines.insert(state, id).is_some() {
                        return Err(syntax(lineno, format!("state {state} already has an init")));
                    }
                    self.model.state_init.insert(state, value);
                } else {
                    if self.model.state_next.insert(state, value).is_some() {
                        return Err(syntax(lineno, format!("state {state} already has a next")));
                    }
                    self.model.nexts.push(id);
                }
            }
            Tag::Bad | Tag::Constraint | Tag::Output | Tag::Fair => {
                let arg = self.next_value_ref(words, lineno)?;
                line.args = vec![arg];
                match tag {
                    Tag::Bad => {
                        let number = self.model.bad_numbers.len() as u64;
                        self.model.bad_numbers.insert(id, number);
                        self.model.bads.push(id);
                    }
                    Tag::Constraint => self.model.constraints.push(id),
                    _ => {}
                }
                allow_symbol = true;
            }
            Tag::Justice => {
                let count = self.next_u64(words, "justice arity", lineno)?;
                for _ in 0..count {
                    let arg = self.next_value_ref(words, lineno)?;
                    line.args.push(arg);
                }
            }
            Tag::Not
            | Tag::Inc
            | Tag::Dec
            | Tag::Neg
            | Tag::Redand
            | Tag::Redor
            | Tag::Redxor => {
                line.sort = Some(self.next_sort_id(words, lineno)?);
                line.args = vec![self.next_value_ref(words, lineno)?];
            }
            Tag::Ite | Tag::Write => {
                line.sort = Some(self.next_sort_id(words, lineno)?);
                line.args = vec![
                    self.next_value_ref(words, lineno)?,
                    self.next_value_ref(words, lineno)?,
                    self.next_value_ref(words, lineno)?,
                ];
            }
            Tag::Slice => {
                line.sort = Some(self.next_sort_id(words, lineno)?);
                line.args = vec![self.next_value_ref(words, lineno)?];
                let upper = self.next_u64(words, "upper bound", lineno)?;
                let lower = self.next_u64(words, "lower bound", lineno)?;
                line.immediates = vec![upper, lower];
            }
            Tag::Sext | Tag::Uext => {
                line.sort = Some(self.next_sort_id(words, lineno)?);
                line.args = vec![self.next_value_ref(words, lineno)?];
                let amount = self.next_u64(words, "extension amount", lineno)?;
                line.immediates = vec![amount];
            }
            // remaining tags are the binary operators
            _ => {
                line.sort = Some(self.next_sort_id(words, lineno)?);
                line.args = vec![
                    self.next_value_ref(words, lineno)?,
                    self.next_value_ref(words, lineno)?,
                ];
            }
        }

        if let Some(extra) = words.next() {
            if allow_symbol {
                line.symbol = Some(extra.to_string());
            } else {
                return Err(syntax(lineno, format!("unexpected trailing token `{extra}`")));
            }
        }
        if words.next().is_some() {
            return Err(syntax(lineno, "unexpected trailing tokens"));
        }

        if tag != Tag::Sort {
            self.model.order.push(id);
            self.model.lines.insert(id, line);
        }
        Ok(())
    }

    fn next_u64<'a>(
        &self,
        words: &mut impl Iterator<Item = &'a str>,
        what: &'static str,
        lineno: u32,
    ) -> Result<u64, ParseError> {
        let text = words
            .next()
            .ok_or_else(|| syntax(lineno, format!("expected {what}")))?;
        parse_u64(text, what, lineno)
    }

    fn next_sort_id<'a>(
        &self,
        words: &mut impl Iterator<Item = &'a str>,
        lineno: u32,
    ) -> Result<u64, ParseError> {
        let id = self.next_u64(words, "sort id", lineno)?;
        if !self.model.sorts.contains_key(&id) {
            return Err(ParseError::NotASort { lineno, id });
        }
        Ok(id)
    }

    /// A signed reference to an earlier value-producing line.
    fn next_value_ref<'a>(
        &self,
        words: &mut impl Iterator<Item = &'a str>,
        lineno: u32,
    ) -> Result<i64, ParseError> {
        let text = words
            .next()
            .ok_or_else(|| syntax(lineno, "expected operand"))?;
        let value: i64 = text.parse().map_err(|_| ParseError::Number {
            lineno,
            what: "operand",
            text: text.to_string(),
        })?;
        if value == 0 {
            return Err(syntax(lineno, "operand id must be non-zero"));
        }
        let id = value.unsigned_abs();
        let target = self
            .model
            .line(id)
            .ok_or(ParseError::UndefinedId { lineno, id })?;
        if !target.tag.has_result() {
            return Err(ParseError::NotAValue { lineno, id });
        }
        Ok(value)
    }

    fn bitvec_width(&self, sort: u64, lineno: u32) -> Result<u32, ParseError> {
        match self.model.sort(sort) {
            Some(Sort::BitVec { width }) => Ok(width),
            _ => Err(syntax(lineno, "expected a bit vector sort")),
        }
    }
}

fn syntax(lineno: u32, msg: impl Into<String>) -> ParseError {
    ParseError::Syntax {
        lineno,
        msg: msg.into(),
    }
}

fn parse_u64(text: &str, what: &'static str, lineno: u32) -> Result<u64, ParseError> {
    text.parse().map_err(|_| ParseError::Number {
        lineno,
        what,
        text: text.to_string(),
    })
}

fn width_mask(width: u32, lineno: u32) -> Result<u128, ParseError> {
    match width {
        0 => Ok(0),
        1..=127 => Ok((1u128 << width) - 1),
        128 => Ok(u128::MAX),
        _ => Err(ParseError::WidthUnsupported { lineno }),
    }
}

/// Evaluate a BTOR2 constant into the two's complement representation of its
/// `width`-bit value. Negative decimal constants are wrapped modulo 2^width.
pub fn parse_constant(
    text: &str,
    radix: u32,
    width: u32,
    lineno: u32,
) -> Result<u128, ParseError> {
    if width > 128 {
        return Err(ParseError::WidthUnsupported { lineno });
    }
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = u128::from_str_radix(digits, radix).map_err(|_| ParseError::Number {
        lineno,
        what: "constant",
        text: text.to_string(),
    })?;
    let mask = width_mask(width, lineno)?;
    let value = if negative {
        magnitude.wrapping_neg() & mask
    } else {
        magnitude
    };
    if value & !mask != 0 {
        return Err(ParseError::ConstantTooWide { lineno, width });
    }
    Ok(value & mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTER: &str = "\
1 sort bitvec 4
2 zero 1
3 state 1 counter
4 init 1 3 2
5 one 1
6 add 1 3 5
7 next 1 3 6
8 ones 1
9 eq 1 3 8
10 bad 9
";

    #[test]
    fn parses_counter_model() {
        let model = Model::parse(COUNTER).unwrap();
        assert_eq!(model.states, vec![3]);
        assert_eq!(model.state_init.get(&3), Some(&2));
        assert_eq!(model.state_next.get(&3), Some(&6));
        assert_eq!(model.bads, vec![10]);
        assert_eq!(model.bad_numbers.get(&10), Some(&0));

        let add = model.line(6).unwrap();
        assert_eq!(add.tag, Tag::Add);
        assert_eq!(add.args, vec![3, 5]);
        assert_eq!(model.sort_of(add), Some(Sort::BitVec { width: 4 }));

        let ones = model.line(8).unwrap();
        assert_eq!(ones.const_value, Some(0xf));
    }

    #[test]
    fn comments_and_symbols() {
        let model = Model::parse("1 sort bitvec 1 ; comment\n2 input 1 reset\n").unwrap();
        let input = model.line(2).unwrap();
        assert_eq!(input.symbol.as_deref(), Some("reset"));
        assert_eq!(model.input_numbers.get(&2), Some(&0));
    }

    #[test]
    fn negative_decimal_constant_wraps() {
        let model = Model::parse("1 sort bitvec 4\n2 constd 1 -1\n").unwrap();
        assert_eq!(model.line(2).unwrap().const_value, Some(0xf));
    }

    #[test]
    fn hex_and_binary_constants() {
        let model = Model::parse("1 sort bitvec 8\n2 consth 1 ff\n3 const 1 1010\n").unwrap();
        assert_eq!(model.line(2).unwrap().const_value, Some(0xff));
        assert_eq!(model.line(3).unwrap().const_value, Some(0b1010));
    }

    #[test]
    fn rejects_duplicate_init_lines() {
        let err = Model::parse(
            "1 sort bitvec 4\n2 zero 1\n3 state 1\n4 init 1 3 2\n5 one 1\n6 init 1 3 5\n",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Syntax { lineno: 6, .. }));
    }

    #[test]
    fn rejects_duplicate_next_lines() {
        let err = Model::parse(
            "1 sort bitvec 4\n2 state 1\n3 next 1 2 2\n4 next 1 2 2\n",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Syntax { lineno: 4, .. }));
    }

    #[test]
    fn rejects_forward_references() {
        let err = Model::parse("1 sort bitvec 1\n2 not 1 3\n").unwrap_err();
        assert!(matches!(err, ParseError::UndefinedId { lineno: 2, id: 3 }));
    }

    #[test]
    fn rejects_out_of_order_ids() {
        let err = Model::parse("2 sort bitvec 1\n1 zero 2\n").unwrap_err();
        assert!(matches!(err, ParseError::IdOutOfOrder { lineno: 2 }));
    }

    #[test]
    fn rejects_constant_overflow() {
        let err = Model::parse("1 sort bitvec 2\n2 constd 1 9\n").unwrap_err();
        assert!(matches!(err, ParseError::ConstantTooWide { width: 2, .. }));
    }

    #[test]
    fn array_sorts_resolve() {
        let model =
            Model::parse("1 sort bitvec 3\n2 sort bitvec 8\n3 sort array 1 2\n4 state 3\n")
                .unwrap();
        let state = model.line(4).unwrap();
        assert_eq!(
            model.sort_of(state),
            Some(Sort::Array {
                index: 1,
                element: 2
            })
        );
    }
}
