//! Structural and sort verification for BTOR IR modules, along with the
//! forward sort-inference pass shared by the printer and the serializer.
use thiserror::Error;

use super::module::{Block, BlockKind, Module, Value};
use super::ops::Op;
use super::types::Sort;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("{block} block: operand {value:?} of op {index} is undefined or defined later")]
    UnknownValue {
        block: BlockKind,
        index: usize,
        value: Value,
    },
    #[error("`{op}` expects a bit vector operand, got {sort}")]
    NotBitVec { op: &'static str, sort: Sort },
    #[error("`{op}` expects an array operand, got {sort}")]
    NotArray { op: &'static str, sort: Sort },
    #[error("`{op}` operand sorts differ: {lhs} vs {rhs}")]
    OperandSortMismatch {
        op: &'static str,
        lhs: Sort,
        rhs: Sort,
    },
    #[error("`{op}` condition must be bv<1>, got {sort}")]
    NotBool { op: &'static str, sort: Sort },
    #[error("extension result width {result} is narrower than operand width {operand}")]
    ExtNarrows { operand: u32, result: u32 },
    #[error("slice bounds [{lower}, {upper}] out of range for operand width {width}")]
    SliceOutOfRange { width: u32, upper: u32, lower: u32 },
    #[error("constant {value} does not fit in {width} bits")]
    ConstantTooWide { value: u128, width: u32 },
    #[error("`{op}` element width {found} does not match array element width {expected}")]
    ElementWidthMismatch {
        op: &'static str,
        expected: u32,
        found: u32,
    },
    #[error("`{op}` index width {found} does not match array index width {expected}")]
    IndexWidthMismatch {
        op: &'static str,
        expected: u32,
        found: u32,
    },
    #[error("{block} block yields {found} values, module has {expected} states")]
    YieldArity {
        block: BlockKind,
        expected: usize,
        found: usize,
    },
    #[error("{block} block yield {index} has sort {found}, state has sort {expected}")]
    YieldSortMismatch {
        block: BlockKind,
        index: usize,
        expected: Sort,
        found: Sort,
    },
    #[error("`{op}` result width overflows")]
    WidthOverflow { op: &'static str },
    #[error("next block arguments do not match the module state sorts")]
    NextArgsMismatch,
}

/// Result sorts of every operation in one block, resolved in a single forward
/// pass. Referencing an argument out of range, a later operation, or an
/// operation without a result is rejected here.
pub struct BlockSorts {
    args: Vec<Sort>,
    results: Vec<Option<Sort>>,
}

impl BlockSorts {
    pub fn sort_of(&self, value: Value) -> Option<Sort> {
        match value {
            Value::Arg(i) => self.args.get(i).copied(),
            Value::Inst(i) => self.results.get(i).copied().flatten(),
        }
    }
}

pub fn infer_block(block: &Block, kind: BlockKind) -> Result<BlockSorts, VerifyError> {
    let mut sorts = BlockSorts {
        args: block.args.clone(),
        results: Vec::with_capacity(block.ops.len()),
    };

    for (index, op) in block.ops.iter().enumerate() {
        let operand = |value: Value| -> Result<Sort, VerifyError> {
            let defined = match value {
                Value::Arg(i) => sorts.args.get(i).copied(),
                Value::Inst(i) if i < index => sorts.results.get(i).copied().flatten(),
                Value::Inst(_) => None,
            };
            defined.ok_or(VerifyError::UnknownValue {
                block: kind,
                index,
                value,
            })
        };

        let result = match *op {
            Op::Constant { sort, .. }
            | Op::NdState { sort, .. }
            | Op::Array { sort }
            | Op::InitArray { sort, .. } => Some(sort),
            Op::Input { width, .. } => Some(Sort::BitVec(width)),
            Op::Unary { operand: v, .. } => Some(operand(v)?),
            Op::Reduce { operand: v, .. } => {
                operand(v)?;
                Some(Sort::BOOL)
            }
            Op::Binary { lhs, rhs, .. } => {
                operand(rhs)?;
                Some(operand(lhs)?)
            }
            Op::Overflow { lhs, rhs, .. } | Op::Cmp { lhs, rhs, .. } => {
                operand(lhs)?;
                operand(rhs)?;
                Some(Sort::BOOL)
            }
            // bounds are checked here, before the result width is computed
            Op::Slice {
                operand: v,
                upper,
                lower,
            } => {
                let sort = operand(v)?;
                let width = sort
                    .bitvec_width()
                    .ok_or(VerifyError::NotBitVec { op: "slice", sort })?;
                if upper >= width || upper < lower {
                    return Err(VerifyError::SliceOutOfRange {
                        width,
                        upper,
                        lower,
                    });
                }
                Some(Sort::BitVec(upper - lower + 1))
            }
            Op::Ext {
                operand: v, width, ..
            } => {
                operand(v)?;
                Some(Sort::BitVec(width))
            }
            Op::Concat { lhs, rhs } => {
                let (l, r) = (operand(lhs)?, operand(rhs)?);
                match (l.bitvec_width(), r.bitvec_width()) {
                    (Some(lw), Some(rw)) => {
                        let width = lw
                            .checked_add(rw)
                            .ok_or(VerifyError::WidthOverflow { op: "concat" })?;
                        Some(Sort::BitVec(width))
                    }
                    _ => {
                        let sort = if l.is_array() { l } else { r };
                        return Err(VerifyError::NotBitVec { op: "concat", sort });
                    }
                }
            }
            Op::Ite {
                cond,
                then_value,
                else_value,
            } => {
                operand(cond)?;
                operand(else_value)?;
                Some(operand(then_value)?)
            }
            Op::Read { array, index: i } => {
                operand(i)?;
                match operand(array)? {
                    Sort::Array { element, .. } => Some(Sort::BitVec(element)),
                    sort => return Err(VerifyError::NotArray { op: "read", sort }),
                }
            }
            Op::Write {
                value,
                array,
                index: i,
            } => {
                operand(value)?;
                operand(i)?;
                match operand(array)? {
                    sort @ Sort::Array { .. } => Some(sort),
                    sort => return Err(VerifyError::NotArray { op: "write", sort }),
                }
            }
            Op::Constraint { cond } | Op::AssertNot { cond, .. } => {
                operand(cond)?;
                None
            }
        };
        sorts.results.push(result);
    }

    for (slot, &value) in block.yields.iter().enumerate() {
        if sorts.sort_of(value).is_none() {
            return Err(VerifyError::UnknownValue {
                block: kind,
                index: block.ops.len() + slot,
                value,
            });
        }
    }

    Ok(sorts)
}

/// Check the whole module: every operation well-sorted per the dialect rules,
/// both yields matching the module state sorts.
pub fn verify(module: &Module) -> Result<(), VerifyError> {
    if module.next.args != module.states {
        return Err(VerifyError::NextArgsMismatch);
    }
    verify_block(&module.init, BlockKind::Init, &module.states)?;
    verify_block(&module.next, BlockKind::Next, &module.states)?;
    Ok(())
}

fn verify_block(block: &Block, kind: BlockKind, states: &[Sort]) -> Result<(), VerifyError> {
    let sorts = infer_block(block, kind)?;

    let bitvec = |op: &'static str, sort: Sort| {
        sort.bitvec_width()
            .ok_or(VerifyError::NotBitVec { op, sort })
    };

    for op in &block.ops {
        let name = op.mnemonic();
        // infer_block resolved every operand already
        let sort_of = |v: Value| sorts.sort_of(v).expect("operand resolved by inference");
        match *op {
            Op::Constant { value, sort } => {
                let width = bitvec(name, sort)?;
                if width < 128 && value >> width != 0 {
                    return Err(VerifyError::ConstantTooWide { value, width });
                }
            }
            Op::Unary { operand, .. } | Op::Reduce { operand, .. } => {
                bitvec(name, sort_of(operand))?;
            }
            Op::Binary { lhs, rhs, .. } | Op::Overflow { lhs, rhs, .. } => {
                let (l, r) = (sort_of(lhs), sort_of(rhs));
                bitvec(name, l)?;
                if l != r {
                    return Err(VerifyError::OperandSortMismatch {
                        op: name,
                        lhs: l,
                        rhs: r,
                    });
                }
            }
            Op::Cmp { lhs, rhs, .. } => {
                let (l, r) = (sort_of(lhs), sort_of(rhs));
                if l != r {
                    return Err(VerifyError::OperandSortMismatch {
                        op: name,
                        lhs: l,
                        rhs: r,
                    });
                }
            }
            Op::Ext { operand, width, .. } => {
                let from = bitvec(name, sort_of(operand))?;
                if width < from {
                    return Err(VerifyError::ExtNarrows {
                        operand: from,
                        result: width,
                    });
                }
            }
            Op::InitArray { init, sort } => {
                let Sort::Array { element, .. } = sort else {
                    return Err(VerifyError::NotArray { op: name, sort });
                };
                let found = bitvec(name, sort_of(init))?;
                if found != element {
                    return Err(VerifyError::ElementWidthMismatch {
                        op: name,
                        expected: element,
                        found,
                    });
                }
            }
            Op::Ite {
                cond,
                then_value,
                else_value,
            } => {
                let cond_sort = sort_of(cond);
                if !cond_sort.is_bool() {
                    return Err(VerifyError::NotBool {
                        op: name,
                        sort: cond_sort,
                    });
                }
                let (t, e) = (sort_of(then_value), sort_of(else_value));
                if t != e {
                    return Err(VerifyError::OperandSortMismatch {
                        op: name,
                        lhs: t,
                        rhs: e,
                    });
                }
            }
            Op::Read { array, index } => {
                let Sort::Array { index: iw, .. } = sort_of(array) else {
                    unreachable!("inference rejected non-array read");
                };
                let found = bitvec(name, sort_of(index))?;
                if found != iw {
                    return Err(VerifyError::IndexWidthMismatch {
                        op: name,
                        expected: iw,
                        found,
                    });
                }
            }
            Op::Write {
                value,
                array,
                index,
            } => {
                let Sort::Array {
                    index: iw,
                    element,
                } = sort_of(array)
                else {
                    unreachable!("inference rejected non-array write");
                };
                let found = bitvec(name, sort_of(index))?;
                if found != iw {
                    return Err(VerifyError::IndexWidthMismatch {
                        op: name,
                        expected: iw,
                        found,
                    });
                }
                let value_width = bitvec(name, sort_of(value))?;
                if value_width != element {
                    return Err(VerifyError::ElementWidthMismatch {
                        op: name,
                        expected: element,
                        found: value_width,
                    });
                }
            }
            Op::Constraint { cond } | Op::AssertNot { cond, .. } => {
                let sort = sort_of(cond);
                if !sort.is_bool() {
                    return Err(VerifyError::NotBool { op: name, sort });
                }
            }
            // slice and concat are fully checked during inference
            Op::Input { .. }
            | Op::NdState { .. }
            | Op::Array { .. }
            | Op::Slice { .. }
            | Op::Concat { .. } => {}
        }
    }

    if block.yields.len() != states.len() {
        return Err(VerifyError::YieldArity {
            block: kind,
            expected: states.len(),
            found: block.yields.len(),
        });
    }
    for (index, (&value, &expected)) in block.yields.iter().zip(states).enumerate() {
        let found = sorts.sort_of(value).expect("yields resolved by inference");
        if found != expected {
            return Err(VerifyError::YieldSortMismatch {
                block: kind,
                index,
                expected,
                found,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ops::{BinaryKind, ExtKind, Pred};

    fn counter_module() -> Module {
        let mut module = Module::new(vec![Sort::BitVec(4)]);
        let zero = module
            .init
            .push(Op::Constant {
                value: 0,
                sort: Sort::BitVec(4),
            })
            .unwrap();
        module.init.yields = vec![zero];

        let one = module
            .next
            .push(Op::Constant {
                value: 1,
                sort: Sort::BitVec(4),
            })
            .unwrap();
        let sum = module
            .next
            .push(Op::Binary {
                kind: BinaryKind::Add,
                lhs: Value::Arg(0),
                rhs: one,
            })
            .unwrap();
        let full = module
            .next
            .push(Op::Constant {
                value: 0xf,
                sort: Sort::BitVec(4),
            })
            .unwrap();
        let hit = module
            .next
            .push(Op::Cmp {
                pred: Pred::Eq,
                lhs: Value::Arg(0),
                rhs: full,
            })
            .unwrap();
        module.next.push(Op::AssertNot {
            cond: hit,
            property: 0,
        });
        module.next.yields = vec![sum];
        module
    }

    #[test]
    fn accepts_well_sorted_module() {
        verify(&counter_module()).unwrap();
    }

    #[test]
    fn rejects_forward_reference() {
        let mut module = counter_module();
        module.next.ops[1] = Op::Binary {
            kind: BinaryKind::Add,
            lhs: Value::Inst(3),
            rhs: Value::Arg(0),
        };
        assert!(matches!(
            verify(&module),
            Err(VerifyError::UnknownValue { .. })
        ));
    }

    #[test]
    fn rejects_narrowing_extension() {
        let mut module = counter_module();
        let narrowed = module
            .init
            .push(Op::Ext {
                kind: ExtKind::Uext,
                operand: Value::Inst(0),
                width: 2,
            })
            .unwrap();
        let _ = narrowed;
        assert!(matches!(
            verify(&module),
            Err(VerifyError::ExtNarrows {
                operand: 4,
                result: 2
            })
        ));
    }

    #[test]
    fn rejects_slice_out_of_range() {
        let mut module = counter_module();
        module.init.push(Op::Slice {
            operand: Value::Inst(0),
            upper: 4,
            lower: 0,
        });
        assert!(matches!(
            verify(&module),
            Err(VerifyError::SliceOutOfRange { width: 4, .. })
        ));
    }

    #[test]
    fn rejects_slice_bounds_near_the_width_limit() {
        let mut module = counter_module();
        module.init.push(Op::Slice {
            operand: Value::Inst(0),
            upper: u32::MAX,
            lower: 0,
        });
        assert!(matches!(
            verify(&module),
            Err(VerifyError::SliceOutOfRange {
                width: 4,
                upper: u32::MAX,
                ..
            })
        ));
    }

    #[test]
    fn rejects_concat_width_overflow() {
        let mut module = counter_module();
        let wide = module
            .init
            .push(Op::NdState {
                id: 7,
                sort: Sort::BitVec(u32::MAX),
            })
            .unwrap();
        module.init.push(Op::Concat {
            lhs: wide,
            rhs: wide,
        });
        assert!(matches!(
            verify(&module),
            Err(VerifyError::WidthOverflow { op: "concat" })
        ));
    }

    #[test]
    fn rejects_wide_constant() {
        let mut module = counter_module();
        module.init.ops[0] = Op::Constant {
            value: 16,
            sort: Sort::BitVec(4),
        };
        assert!(matches!(
            verify(&module),
            Err(VerifyError::ConstantTooWide {
                value: 16,
                width: 4
            })
        ));
    }

    #[test]
    fn rejects_yield_arity_mismatch() {
        let mut module = counter_module();
        module.next.yields.clear();
        assert!(matches!(
            verify(&module),
            Err(VerifyError::YieldArity {
                block: BlockKind::Next,
                expected: 1,
                found: 0
            })
        ));
    }

    #[test]
    fn rejects_non_bool_assertion() {
        let mut module = counter_module();
        module.next.ops[4] = Op::AssertNot {
            cond: Value::Arg(0),
            property: 0,
        };
        assert!(matches!(verify(&module), Err(VerifyError::NotBool { .. })));
    }
}
