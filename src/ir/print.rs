//! Textual form of BTOR IR modules. The printer and `parse` round-trip:
//! result values are numbered `%0, %1, ...` per block, next-block arguments
//! are `%arg0, %arg1, ...`.
use std::fmt::Write;

use super::module::{Block, BlockKind, Module, Value};
use super::ops::Op;
use super::verify::{BlockSorts, VerifyError, infer_block};

/// Print a module. Fails only when the module is too malformed to type, so
/// run the verifier first for meaningful diagnostics.
pub fn print_module(module: &Module) -> Result<String, VerifyError> {
    let mut out = String::new();
    out.push_str("module {\n");

    out.push_str("  init {\n");
    print_block(&module.init, BlockKind::Init, &mut out)?;
    out.push_str("  }\n");

    out.push_str("  next(");
    for (i, sort) in module.next.args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "%arg{i}: {sort}");
    }
    out.push_str(") {\n");
    print_block(&module.next, BlockKind::Next, &mut out)?;
    out.push_str("  }\n");

    out.push_str("}\n");
    Ok(out)
}

fn print_block(block: &Block, kind: BlockKind, out: &mut String) -> Result<(), VerifyError> {
    let sorts = infer_block(block, kind)?;

    // result ordinal per op index
    let mut names: Vec<Option<usize>> = Vec::with_capacity(block.ops.len());
    let mut next_result = 0usize;
    for op in &block.ops {
        if op.has_result() {
            names.push(Some(next_result));
            next_result += 1;
        } else {
            names.push(None);
        }
    }

    let name = |value: Value| -> String {
        match value {
            Value::Arg(i) => format!("%arg{i}"),
            Value::Inst(i) => match names.get(i).copied().flatten() {
                Some(n) => format!("%{n}"),
                None => "%?".to_string(),
            },
        }
    };

    for (index, op) in block.ops.iter().enumerate() {
        out.push_str("    ");
        if let Some(n) = names[index] {
            let _ = write!(out, "%{n} = ");
        }
        print_op(op, &sorts, &name, out);
        out.push('\n');
    }

    out.push_str("    yield");
    for (i, &value) in block.yields.iter().enumerate() {
        let sep = if i == 0 { " " } else { ", " };
        let _ = write!(out, "{sep}{}", name(value));
    }
    out.push('\n');
    Ok(())
}

fn print_op(op: &Op, sorts: &BlockSorts, name: &dyn Fn(Value) -> String, out: &mut String) {
    let sort_of = |v: Value| sorts.sort_of(v).expect("operand resolved by inference");
    match *op {
        Op::Constant { value, sort } => {
            let _ = write!(out, "btor.constant {value} : {sort}");
        }
        Op::Input { id, width } => {
            let _ = write!(out, "btor.input {id} : bv<{width}>");
        }
        Op::NdState { id, sort } => {
            let _ = write!(out, "btor.nd_state {id} : {sort}");
        }
        Op::Array { sort } => {
            let _ = write!(out, "btor.array : {sort}");
        }
        Op::InitArray { init, sort } => {
            let _ = write!(out, "btor.init_array {} : {sort}", name(init));
        }
        Op::Unary { kind, operand } => {
            let _ = write!(
                out,
                "btor.{} {} : {}",
                kind.mnemonic(),
                name(operand),
                sort_of(operand)
            );
        }
        Op::Reduce { kind, operand } => {
            let _ = write!(
                out,
                "btor.{} {} : {}",
                kind.mnemonic(),
                name(operand),
                sort_of(operand)
            );
        }
        Op::Binary { kind, lhs, rhs } => {
            let _ = write!(
                out,
                "btor.{} {}, {} : {}",
                kind.mnemonic(),
                name(lhs),
                name(rhs),
                sort_of(lhs)
            );
        }
        Op::Overflow { kind, lhs, rhs } => {
            let _ = write!(
                out,
                "btor.{} {}, {} : {}",
                kind.mnemonic(),
                name(lhs),
                name(rhs),
                sort_of(lhs)
            );
        }
        Op::Cmp { pred, lhs, rhs } => {
            let _ = write!(
                out,
                "btor.cmp {}, {}, {} : {}",
                pred.mnemonic(),
                name(lhs),
                name(rhs),
                sort_of(lhs)
            );
        }
        Op::Slice {
            operand,
            upper,
            lower,
        } => {
            // infer_block already validated the bounds
            let result = upper.saturating_sub(lower).saturating_add(1);
            let _ = write!(
                out,
                "btor.slice {}, {upper}, {lower} : {}, bv<{result}>",
                name(operand),
                sort_of(operand)
            );
        }
        Op::Ext {
            kind,
            operand,
            width,
        } => {
            let _ = write!(
                out,
                "btor.{} {} : {}, bv<{width}>",
                kind.mnemonic(),
                name(operand),
                sort_of(operand)
            );
        }
        Op::Concat { lhs, rhs } => {
            let (l, r) = (sort_of(lhs), sort_of(rhs));
            let width = l
                .bitvec_width()
                .unwrap_or(0)
                .saturating_add(r.bitvec_width().unwrap_or(0));
            let _ = write!(
                out,
                "btor.concat {}, {} : {l}, {r}, bv<{width}>",
                name(lhs),
                name(rhs)
            );
        }
        Op::Ite {
            cond,
            then_value,
            else_value,
        } => {
            let _ = write!(
                out,
                "btor.ite {}, {}, {} : {}",
                name(cond),
                name(then_value),
                name(else_value),
                sort_of(then_value)
            );
        }
        Op::Read { array, index } => {
            let sort = sort_of(array);
            let element = match sort {
                super::types::Sort::Array { element, .. } => element,
                _ => 0,
            };
            let _ = write!(
                out,
                "btor.read {}[{}] : {sort}, bv<{element}>",
                name(array),
                name(index)
            );
        }
        Op::Write {
            value,
            array,
            index,
        } => {
            let _ = write!(
                out,
                "btor.write {}, {}[{}] : {}",
                name(value),
                name(array),
                name(index),
                sort_of(array)
            );
        }
        Op::Constraint { cond } => {
            let _ = write!(out, "btor.constraint {}", name(cond));
        }
        Op::AssertNot { cond, property } => {
            let _ = write!(out, "btor.assert_not {}, {property}", name(cond));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ops::{BinaryKind, Pred};
    use crate::ir::types::Sort;

    #[test]
    fn prints_counter_module() {
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
                value: 15,
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

        let text = print_module(&module).unwrap();
        let expected = "\
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
        assert_eq!(text, expected);
    }
}
