//! `import-btor`: lower a parsed BTOR2 model into a BTOR IR module.
//!
//! States become the module states. The init block computes each state's
//! initial value; states without an `init` line become nondeterministic. The
//! next block receives the current states as block arguments and computes the
//! `next` values, plus every `constraint` and `bad` line of the model.
//!
//! Value lines are lowered on demand with an explicit worklist, so only lines
//! reachable from an init, next, constraint, or bad are materialized. A
//! negative operand reference lowers the referenced line and then inserts a
//! `not` on the fly.
use std::collections::HashMap;

use tracing::debug;

use crate::btor2::{self, Line, Model, Tag};
use crate::error::{Error, Result};
use crate::ir::{self, Block, Op, Value};

pub fn import_btor(input: &str) -> Result<ir::Module> {
    let model = Model::parse(input)?;
    for &id in model.order() {
        let tag = model.line(id).map(|line| line.tag);
        if let Some(tag @ (Tag::Fair | Tag::Justice)) = tag {
            return Err(Error::translation(format!(
                "line {id}: `{tag:?}` properties are not supported",
            )));
        }
    }

    let lowering = Lowering { model: &model };
    let states: Vec<ir::Sort> = model
        .states
        .iter()
        .map(|&id| {
            let line = model.line(id).expect("state ids index parsed lines");
            lowering.sort_of_line(line)
        })
        .collect::<Result<_>>()?;
    debug!(
        states = states.len(),
        bads = model.bads.len(),
        constraints = model.constraints.len(),
        "lowering btor2 model"
    );
    let mut module = ir::Module::new(states.clone());

    // init block: one yield per state
    let mut cache: HashMap<i64, Value> = HashMap::new();
    let mut yields = Vec::with_capacity(states.len());
    for (position, (&state_id, &sort)) in model.states.iter().zip(&states).enumerate() {
        let value = match model.state_init.get(&state_id) {
            Some(&init_ref) => {
                let value = lowering.lower(&mut module.init, &mut cache, init_ref)?;
                // an array state initialized with a bit-vector value sets
                // every cell to that value
                if sort.is_array() && lowering.ref_sort(init_ref)?.is_array() {
                    value
                } else if sort.is_array() {
                    module
                        .init
                        .push(Op::InitArray { init: value, sort })
                        .expect("init_array produces a value")
                } else {
                    value
                }
            }
            None if sort.is_array() => module
                .init
                .push(Op::Array { sort })
                .expect("array produces a value"),
            None => module
                .init
                .push(Op::NdState {
                    id: position as u64,
                    sort,
                })
                .expect("nd_state produces a value"),
        };
        yields.push(value);
    }
    module.init.yields = yields;

    // next block: states arrive as block arguments
    let mut cache: HashMap<i64, Value> = HashMap::new();
    for (position, &state_id) in model.states.iter().enumerate() {
        cache.insert(state_id as i64, Value::Arg(position));
    }
    let mut yields = Vec::with_capacity(states.len());
    for (position, (&state_id, &sort)) in model.states.iter().zip(&states).enumerate() {
        let value = match model.state_next.get(&state_id) {
            Some(&next_ref) => lowering.lower(&mut module.next, &mut cache, next_ref)?,
            // a state with an init but no next keeps its value
            None if model.state_init.contains_key(&state_id) => Value::Arg(position),
            None => module
                .next
                .push(Op::NdState {
                    id: position as u64,
                    sort,
                })
                .expect("nd_state produces a value"),
        };
        yields.push(value);
    }

    // constraints and bad properties, in file order
    for &id in model.order() {
        let line = model.line(id).expect("ordered ids index parsed lines");
        match line.tag {
            Tag::Constraint => {
                let cond = lowering.lower(&mut module.next, &mut cache, line.args[0])?;
                module.next.push(Op::Constraint { cond });
            }
            Tag::Bad => {
                let cond = lowering.lower(&mut module.next, &mut cache, line.args[0])?;
                let property = model.bad_numbers[&id];
                module.next.push(Op::AssertNot { cond, property });
            }
            _ => {}
        }
    }
    module.next.yields = yields;

    Ok(module)
}

struct Lowering<'m> {
    model: &'m Model,
}

impl Lowering<'_> {
    /// Lower the line behind a signed reference, emitting every line it
    /// transitively depends on first.
    fn lower(&self, block: &mut Block, cache: &mut HashMap<i64, Value>, root: i64) -> Result<Value> {
        let mut todo: Vec<u64> = vec![root.unsigned_abs()];
        while let Some(&id) = todo.last() {
            if cache.contains_key(&(id as i64)) {
                todo.pop();
                continue;
            }
            let line = self
                .model
                .line(id)
                .ok_or_else(|| Error::translation(format!("dangling reference to line {id}")))?
                .clone();
            let missing: Vec<u64> = line
                .args
                .iter()
                .map(|reference| reference.unsigned_abs())
                .filter(|pending| !cache.contains_key(&(*pending as i64)))
                .collect();
            if !missing.is_empty() {
                todo.extend(missing);
                continue;
            }
            let value = self.emit(block, cache, &line)?;
            cache.insert(id as i64, value);
            todo.pop();
        }
        self.negate(block, cache, root)
    }

    /// Resolve a signed reference whose positive line is already lowered,
    /// inserting a `not` for negative references.
    fn negate(
        &self,
        block: &mut Block,
        cache: &mut HashMap<i64, Value>,
        reference: i64,
    ) -> Result<Value> {
        if let Some(&value) = cache.get(&reference) {
            return Ok(value);
        }
        let positive = cache[&(reference.unsigned_abs() as i64)];
        let negated = block
            .push(Op::Unary {
                kind: ir::UnaryKind::Not,
                operand: positive,
            })
            .expect("not produces a value");
        cache.insert(reference, negated);
        Ok(negated)
    }

    /// Emit the operation for one line. Every positive operand is already in
    /// the cache.
    fn emit(&self, block: &mut Block, cache: &mut HashMap<i64, Value>, line: &Line) -> Result<Value> {
        use ir::{BinaryKind as B, OverflowKind as O, Pred as P, ReduceKind as R, UnaryKind as U};

        let operand = |block: &mut Block, cache: &mut HashMap<i64, Value>, slot: usize| {
            self.negate(block, cache, line.args[slot])
        };

        let op = match line.tag {
            Tag::Const | Tag::Constd | Tag::Consth | Tag::One | Tag::Ones | Tag::Zero => {
                Op::Constant {
                    value: line.const_value.expect("constant lines carry a value"),
                    sort: self.sort_of_line(line)?,
                }
            }
            Tag::Input => match self.sort_of_line(line)? {
                ir::Sort::BitVec(width) => Op::Input {
                    id: self.model.input_numbers[&line.id],
                    width,
                },
                sort => Op::Array { sort },
            },
            // a state encountered as an operand outside the next block is an
            // unconstrained value
            Tag::State => {
                let position = self
                    .model
                    .states
                    .iter()
                    .position(|&id| id == line.id)
                    .expect("state lines are recorded in order");
                Op::NdState {
                    id: position as u64,
                    sort: self.sort_of_line(line)?,
                }
            }
            Tag::Not | Tag::Inc | Tag::Dec | Tag::Neg => {
                let kind = match line.tag {
                    Tag::Not => U::Not,
                    Tag::Inc => U::Inc,
                    Tag::Dec => U::Dec,
                    _ => U::Neg,
                };
                Op::Unary {
                    kind,
                    operand: operand(block, cache, 0)?,
                }
            }
            Tag::Redand | Tag::Redor | Tag::Redxor => {
                let kind = match line.tag {
                    Tag::Redand => R::RedAnd,
                    Tag::Redor => R::RedOr,
                    _ => R::RedXor,
                };
                Op::Reduce {
                    kind,
                    operand: operand(block, cache, 0)?,
                }
            }
            Tag::Slice => Op::Slice {
                operand: operand(block, cache, 0)?,
                upper: self.immediate(line, 0)?,
                lower: self.immediate(line, 1)?,
            },
            Tag::Sext | Tag::Uext => {
                let kind = if line.tag == Tag::Sext {
                    ir::ExtKind::Sext
                } else {
                    ir::ExtKind::Uext
                };
                let width = match self.sort_of_line(line)? {
                    ir::Sort::BitVec(width) => width,
                    sort => {
                        return Err(Error::translation(format!(
                            "line {}: extension with non bit-vector sort {sort}",
                            line.lineno
                        )));
                    }
                };
                Op::Ext {
                    kind,
                    operand: operand(block, cache, 0)?,
                    width,
                }
            }
            Tag::Concat => Op::Concat {
                lhs: operand(block, cache, 0)?,
                rhs: operand(block, cache, 1)?,
            },
            Tag::Read => Op::Read {
                array: operand(block, cache, 0)?,
                index: operand(block, cache, 1)?,
            },
            Tag::Ite => Op::Ite {
                cond: operand(block, cache, 0)?,
                then_value: operand(block, cache, 1)?,
                else_value: operand(block, cache, 2)?,
            },
            Tag::Write => Op::Write {
                array: operand(block, cache, 0)?,
                index: operand(block, cache, 1)?,
                value: operand(block, cache, 2)?,
            },
            Tag::Eq | Tag::Neq | Tag::Slt | Tag::Slte | Tag::Sgt | Tag::Sgte | Tag::Ult
            | Tag::Ulte | Tag::Ugt | Tag::Ugte => {
                let pred = match line.tag {
                    Tag::Eq => P::Eq,
                    Tag::Neq => P::Ne,
                    Tag::Slt => P::Slt,
                    Tag::Slte => P::Sle,
                    Tag::Sgt => P::Sgt,
                    Tag::Sgte => P::Sge,
                    Tag::Ult => P::Ult,
                    Tag::Ulte => P::Ule,
                    Tag::Ugt => P::Ugt,
                    _ => P::Uge,
                };
                Op::Cmp {
                    pred,
                    lhs: operand(block, cache, 0)?,
                    rhs: operand(block, cache, 1)?,
                }
            }
            Tag::Saddo | Tag::Uaddo | Tag::Ssubo | Tag::Usubo | Tag::Smulo | Tag::Umulo
            | Tag::Sdivo => {
                let kind = match line.tag {
                    Tag::Saddo => O::SAdd,
                    Tag::Uaddo => O::UAdd,
                    Tag::Ssubo => O::SSub,
                    Tag::Usubo => O::USub,
                    Tag::Smulo => O::SMul,
                    Tag::Umulo => O::UMul,
                    _ => O::SDiv,
                };
                Op::Overflow {
                    kind,
                    lhs: operand(block, cache, 0)?,
                    rhs: operand(block, cache, 1)?,
                }
            }
            Tag::Add | Tag::Sub | Tag::Mul | Tag::Sdiv | Tag::Udiv | Tag::Smod | Tag::Srem
            | Tag::Urem | Tag::And | Tag::Nand | Tag::Nor | Tag::Or | Tag::Xor | Tag::Xnor
            | Tag::Iff | Tag::Implies | Tag::Sll | Tag::Srl | Tag::Sra | Tag::Rol | Tag::Ror => {
                let kind = match line.tag {
                    Tag::Add => B::Add,
                    Tag::Sub => B::Sub,
                    Tag::Mul => B::Mul,
                    Tag::Sdiv => B::SDiv,
                    Tag::Udiv => B::UDiv,
                    Tag::Smod => B::SMod,
                    Tag::Srem => B::SRem,
                    Tag::Urem => B::URem,
                    Tag::And => B::And,
                    Tag::Nand => B::Nand,
                    Tag::Nor => B::Nor,
                    Tag::Or => B::Or,
                    Tag::Xor => B::Xor,
                    Tag::Xnor => B::Xnor,
                    Tag::Iff => B::Iff,
                    Tag::Implies => B::Implies,
                    Tag::Sll => B::ShiftLL,
                    Tag::Srl => B::ShiftRL,
                    Tag::Sra => B::ShiftRA,
                    Tag::Rol => B::RotateL,
                    _ => B::RotateR,
                };
                Op::Binary {
                    kind,
                    lhs: operand(block, cache, 0)?,
                    rhs: operand(block, cache, 1)?,
                }
            }
            Tag::Sort
            | Tag::Init
            | Tag::Next
            | Tag::Bad
            | Tag::Constraint
            | Tag::Output
            | Tag::Fair
            | Tag::Justice => {
                return Err(Error::translation(format!(
                    "line {}: `{:?}` cannot be used as a value",
                    line.lineno, line.tag
                )));
            }
        };

        block
            .push(op)
            .ok_or_else(|| Error::translation("lowered operation produced no value"))
    }

    fn immediate(&self, line: &Line, slot: usize) -> Result<u32> {
        u32::try_from(line.immediates[slot]).map_err(|_| {
            Error::translation(format!("line {}: immediate out of range", line.lineno))
        })
    }

    fn sort_of_line(&self, line: &Line) -> Result<ir::Sort> {
        let sort = self.model.sort_of(line).ok_or_else(|| {
            Error::translation(format!("line {}: missing sort", line.lineno))
        })?;
        self.ir_sort(sort, line.lineno)
    }

    /// The sort behind one signed reference.
    fn ref_sort(&self, reference: i64) -> Result<ir::Sort> {
        let id = reference.unsigned_abs();
        let line = self
            .model
            .line(id)
            .ok_or_else(|| Error::translation(format!("dangling reference to line {id}")))?;
        self.sort_of_line(line)
    }

    fn ir_sort(&self, sort: btor2::Sort, lineno: u32) -> Result<ir::Sort> {
        match sort {
            btor2::Sort::BitVec { width } => Ok(ir::Sort::BitVec(width)),
            btor2::Sort::Array { index, element } => {
                let index = self.element_width(index, lineno)?;
                let element = self.element_width(element, lineno)?;
                Ok(ir::Sort::Array { index, element })
            }
        }
    }

    fn element_width(&self, sort_id: u64, lineno: u32) -> Result<u32> {
        match self.model.sort(sort_id) {
            Some(btor2::Sort::BitVec { width }) => Ok(width),
            _ => Err(Error::translation(format!(
                "line {lineno}: array index and element sorts must be bit vectors"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{verify, BlockKind, Sort};

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
    fn lowers_counter_model() {
        let module = import_btor(COUNTER).unwrap();
        verify(&module).unwrap();
        assert_eq!(module.states, vec![Sort::BitVec(4)]);
        assert_eq!(module.init.yields.len(), 1);
        assert!(matches!(module.init.ops[0], Op::Constant { value: 0, .. }));
        assert!(
            module
                .next
                .ops
                .iter()
                .any(|op| matches!(op, Op::AssertNot { property: 0, .. }))
        );
    }

    #[test]
    fn negative_reference_inserts_not() {
        let source = "\
1 sort bitvec 1
2 state 1
3 next 1 2 -2
4 bad 2
";
        let module = import_btor(source).unwrap();
        verify(&module).unwrap();
        assert!(matches!(
            module.next.ops[0],
            Op::Unary {
                kind: ir::UnaryKind::Not,
                operand: Value::Arg(0)
            }
        ));
        assert_eq!(module.next.yields, vec![Value::Inst(0)]);
    }

    #[test]
    fn uninitialized_state_is_nondeterministic() {
        let source = "\
1 sort bitvec 8
2 state 1
3 next 1 2 2
";
        let module = import_btor(source).unwrap();
        verify(&module).unwrap();
        assert!(matches!(
            module.init.ops[0],
            Op::NdState {
                id: 0,
                sort: Sort::BitVec(8)
            }
        ));
    }

    #[test]
    fn state_without_next_keeps_its_value() {
        let source = "\
1 sort bitvec 8
2 zero 1
3 state 1
4 init 1 3 2
";
        let module = import_btor(source).unwrap();
        verify(&module).unwrap();
        assert_eq!(module.block(BlockKind::Next).yields, vec![Value::Arg(0)]);
    }

    #[test]
    fn array_state_init_broadcasts() {
        let source = "\
1 sort bitvec 3
2 sort bitvec 8
3 sort array 1 2
4 zero 2
5 state 3
6 init 3 5 4
7 next 3 5 5
";
        let module = import_btor(source).unwrap();
        verify(&module).unwrap();
        assert!(
            module
                .init
                .ops
                .iter()
                .any(|op| matches!(op, Op::InitArray { .. }))
        );
        assert_eq!(
            module.states,
            vec![Sort::Array {
                index: 3,
                element: 8
            }]
        );
    }

    #[test]
    fn shared_subterms_lower_once() {
        let source = "\
1 sort bitvec 4
2 sort bitvec 1
3 state 1
4 one 1
5 add 1 3 4
6 mul 1 5 5
7 next 1 3 6
8 ugt 2 5 3
9 bad 8
";
        let module = import_btor(source).unwrap();
        verify(&module).unwrap();
        let adds = module
            .next
            .ops
            .iter()
            .filter(|op| matches!(op, Op::Binary { kind: ir::BinaryKind::Add, .. }))
            .count();
        assert_eq!(adds, 1);
    }

    #[test]
    fn rejects_justice_properties() {
        let source = "\
1 sort bitvec 1
2 state 1
3 justice 1 2
";
        assert!(matches!(
            import_btor(source),
            Err(Error::Translation(_))
        ));
    }
}
