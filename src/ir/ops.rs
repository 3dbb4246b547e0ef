//! Operations of the BTOR IR dialect. Each operation knows its textual
//! mnemonic and, where the spelling differs, the BTOR2 keyword it serializes
//! to.
use serde::{Deserialize, Serialize};

use super::module::Value;
use super::types::Sort;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum UnaryKind {
    Not,
    Inc,
    Dec,
    Neg,
}

impl UnaryKind {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            UnaryKind::Not => "not",
            UnaryKind::Inc => "inc",
            UnaryKind::Dec => "dec",
            UnaryKind::Neg => "neg",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ReduceKind {
    RedAnd,
    RedOr,
    RedXor,
}

impl ReduceKind {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            ReduceKind::RedAnd => "redand",
            ReduceKind::RedOr => "redor",
            ReduceKind::RedXor => "redxor",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum BinaryKind {
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    SMod,
    SRem,
    URem,
    And,
    Nand,
    Nor,
    Or,
    Xor,
    Xnor,
    Iff,
    Implies,
    ShiftLL,
    ShiftRL,
    ShiftRA,
    RotateL,
    RotateR,
}

impl BinaryKind {
    /// The mnemonic doubles as the BTOR2 keyword for every binary operation.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            BinaryKind::Add => "add",
            BinaryKind::Sub => "sub",
            BinaryKind::Mul => "mul",
            BinaryKind::SDiv => "sdiv",
            BinaryKind::UDiv => "udiv",
            BinaryKind::SMod => "smod",
            BinaryKind::SRem => "srem",
            BinaryKind::URem => "urem",
            BinaryKind::And => "and",
            BinaryKind::Nand => "nand",
            BinaryKind::Nor => "nor",
            BinaryKind::Or => "or",
            BinaryKind::Xor => "xor",
            BinaryKind::Xnor => "xnor",
            BinaryKind::Iff => "iff",
            BinaryKind::Implies => "implies",
            BinaryKind::ShiftLL => "sll",
            BinaryKind::ShiftRL => "srl",
            BinaryKind::ShiftRA => "sra",
            BinaryKind::RotateL => "rol",
            BinaryKind::RotateR => "ror",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum OverflowKind {
    SAdd,
    UAdd,
    SSub,
    USub,
    SMul,
    UMul,
    SDiv,
}

impl OverflowKind {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            OverflowKind::SAdd => "saddo",
            OverflowKind::UAdd => "uaddo",
            OverflowKind::SSub => "ssubo",
            OverflowKind::USub => "usubo",
            OverflowKind::SMul => "smulo",
            OverflowKind::UMul => "umulo",
            OverflowKind::SDiv => "sdivo",
        }
    }
}

/// Comparison predicates. The IR spelling follows the dialect (`sle`, `ne`);
/// `btor2_keyword` gives the BTOR2 spelling (`slte`, `neq`).
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Pred {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

impl Pred {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Pred::Eq => "eq",
            Pred::Ne => "ne",
            Pred::Slt => "slt",
            Pred::Sle => "sle",
            Pred::Sgt => "sgt",
            Pred::Sge => "sge",
            Pred::Ult => "ult",
            Pred::Ule => "ule",
            Pred::Ugt => "ugt",
            Pred::Uge => "uge",
        }
    }

    pub fn btor2_keyword(&self) -> &'static str {
        match self {
            Pred::Eq => "eq",
            Pred::Ne => "neq",
            Pred::Slt => "slt",
            Pred::Sle => "slte",
            Pred::Sgt => "sgt",
            Pred::Sge => "sgte",
            Pred::Ult => "ult",
            Pred::Ule => "ulte",
            Pred::Ugt => "ugt",
            Pred::Uge => "ugte",
        }
    }

    pub fn from_mnemonic(name: &str) -> Option<Pred> {
        let pred = match name {
            "eq" => Pred::Eq,
            "ne" => Pred::Ne,
            "slt" => Pred::Slt,
            "sle" => Pred::Sle,
            "sgt" => Pred::Sgt,
            "sge" => Pred::Sge,
            "ult" => Pred::Ult,
            "ule" => Pred::Ule,
            "ugt" => Pred::Ugt,
            "uge" => Pred::Uge,
            _ => return None,
        };
        Some(pred)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ExtKind {
    Sext,
    Uext,
}

impl ExtKind {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            ExtKind::Sext => "sext",
            ExtKind::Uext => "uext",
        }
    }
}

/// One operation of the dialect.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Op {
    /// `btor.constant <value> : bv<w>`
    Constant { value: u128, sort: Sort },
    /// `btor.input <n> : bv<w>` — the n-th nondeterministic input
    Input { id: u64, width: u32 },
    /// `btor.nd_state <n> : <sort>` — a nondeterministic value for state n
    NdState { id: u64, sort: Sort },
    /// `btor.array : <sort>` — an unconstrained array state
    Array { sort: Sort },
    /// `btor.init_array <v> : <sort>` — an array with every cell set to `v`
    InitArray { init: Value, sort: Sort },
    Unary { kind: UnaryKind, operand: Value },
    Reduce { kind: ReduceKind, operand: Value },
    Binary { kind: BinaryKind, lhs: Value, rhs: Value },
    Overflow { kind: OverflowKind, lhs: Value, rhs: Value },
    Cmp { pred: Pred, lhs: Value, rhs: Value },
    /// Bits `lower..=upper` of the operand
    Slice { operand: Value, upper: u32, lower: u32 },
    /// Sign or zero extension to `width` bits
    Ext { kind: ExtKind, operand: Value, width: u32 },
    Concat { lhs: Value, rhs: Value },
    Ite { cond: Value, then_value: Value, else_value: Value },
    Read { array: Value, index: Value },
    Write { value: Value, array: Value, index: Value },
    /// Global assumption over every execution
    Constraint { cond: Value },
    /// The n-th bad property: asserts its operand never holds
    AssertNot { cond: Value, property: u64 },
}

impl Op {
    pub fn has_result(&self) -> bool {
        !matches!(self, Op::Constraint { .. } | Op::AssertNot { .. })
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Op::Constant { .. } => "constant",
            Op::Input { .. } => "input",
            Op::NdState { .. } => "nd_state",
            Op::Array { .. } => "array",
            Op::InitArray { .. } => "init_array",
            Op::Unary { kind, .. } => kind.mnemonic(),
            Op::Reduce { kind, .. } => kind.mnemonic(),
            Op::Binary { kind, .. } => kind.mnemonic(),
            Op::Overflow { kind, .. } => kind.mnemonic(),
            Op::Cmp { .. } => "cmp",
            Op::Slice { .. } => "slice",
            Op::Ext { kind, .. } => kind.mnemonic(),
            Op::Concat { .. } => "concat",
            Op::Ite { .. } => "ite",
            Op::Read { .. } => "read",
            Op::Write { .. } => "write",
            Op::Constraint { .. } => "constraint",
            Op::AssertNot { .. } => "assert_not",
        }
    }

}
