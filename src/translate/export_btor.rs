//! `export-btor`: serialize a BTOR IR module back into BTOR2 text.
//!
//! Lines are numbered sequentially and sorts are emitted on first use. Every
//! module state becomes a `state` line up front; the init block then decides
//! which states get `init` lines, and the next block supplies the `next`
//! lines plus `constraint` and `bad` lines. A state whose initial value is a
//! `nd_state` or `array` operation stays uninitialized, and an `init_array`
//! initializer broadcasts its scalar over the array state.
use std::collections::HashMap;
use std::fmt::Write;

use tracing::debug;

use crate::error::{Error, Result};
use crate::ir::{self, BlockKind, Module, Op, Value};
use crate::ir::verify::infer_block;

pub fn export_btor(module: &Module) -> Result<String> {
    debug!(states = module.states.len(), "serializing module to btor2");
    let mut serializer = Serializer {
        module,
        out: String::new(),
        next_line: 1,
        sorts: HashMap::new(),
        state_lines: Vec::new(),
    };
    serializer.run()?;
    Ok(serializer.out)
}

struct Serializer<'m> {
    module: &'m Module,
    out: String,
    next_line: u64,
    sorts: HashMap<ir::Sort, u64>,
    /// btor2 line id of each module state's `state` line
    state_lines: Vec<u64>,
}

impl Serializer<'_> {
    fn run(&mut self) -> Result<()> {
        for &sort in &self.module.states {
            let sort_id = self.sort_id(sort);
            let id = self.fresh();
            let _ = writeln!(self.out, "{id} state {sort_id}");
            self.state_lines.push(id);
        }
        self.init_block()?;
        self.next_block()?;
        Ok(())
    }

    fn init_block(&mut self) -> Result<()> {
        let block = &self.module.init;
        let mut cache: HashMap<Value, u64> = HashMap::new();
        // initializers that broadcast a scalar over an array state
        let mut broadcast: Vec<Option<Value>> = vec![None; self.module.states.len()];

        // nd_state, array, and init_array initializers fold into the state
        // line itself instead of producing value lines
        for (position, &value) in block.yields.iter().enumerate() {
            let Value::Inst(index) = value else { continue };
            if cache.contains_key(&value) {
                continue;
            }
            match block.ops[index] {
                Op::NdState { .. } | Op::Array { .. } => {
                    cache.insert(value, self.state_lines[position]);
                }
                Op::InitArray { init, .. } => {
                    cache.insert(value, self.state_lines[position]);
                    broadcast[position] = Some(init);
                }
                _ => {}
            }
        }

        self.emit_ops(block, BlockKind::Init, &mut cache)?;

        for (position, &value) in block.yields.iter().enumerate() {
            let sort_id = self.sort_id(self.module.states[position]);
            let state_line = self.state_lines[position];
            let initializer = match broadcast[position] {
                Some(inner) => self.cached(&cache, inner)?,
                None => {
                    let line = self.cached(&cache, value)?;
                    if line == state_line {
                        continue;
                    }
                    line
                }
            };
            let id = self.fresh();
            let _ = writeln!(self.out, "{id} init {sort_id} {state_line} {initializer}");
        }
        Ok(())
    }

    fn next_block(&mut self) -> Result<()> {
        let block = &self.module.next;
        let mut cache: HashMap<Value, u64> = HashMap::new();
        for (position, &line) in self.state_lines.iter().enumerate() {
            cache.insert(Value::Arg(position), line);
        }

        self.emit_ops(block, BlockKind::Next, &mut cache)?;

        for (position, &value) in block.yields.iter().enumerate() {
            let sort_id = self.sort_id(self.module.states[position]);
            let state_line = self.state_lines[position];
            let target = self.cached(&cache, value)?;
            let id = self.fresh();
            let _ = writeln!(self.out, "{id} next {sort_id} {state_line} {target}");
        }
        Ok(())
    }

    /// Emit one btor2 line per operation, in block order. Operations already
    /// in the cache were folded into state lines and are skipped.
    fn emit_ops(
        &mut self,
        block: &ir::Block,
        kind: BlockKind,
        cache: &mut HashMap<Value, u64>,
    ) -> Result<()> {
        let sorts = infer_block(block, kind)?;
        for (index, op) in block.ops.iter().enumerate() {
            let value = Value::Inst(index);
            if cache.contains_key(&value) {
                continue;
            }
            let result_sort = sorts.sort_of(value);

            let line = match *op {
                Op::Constant { value, sort } => {
                    let sort_id = self.sort_id(sort);
                    let id = self.fresh();
                    let _ = writeln!(self.out, "{id} constd {sort_id} {value}");
                    id
                }
                Op::Input { width, .. } => {
                    let sort_id = self.sort_id(ir::Sort::BitVec(width));
                    let id = self.fresh();
                    let _ = writeln!(self.out, "{id} input {sort_id}");
                    id
                }
                // a nondeterministic value is a fresh input each step; an
                // unconstrained array is a state with no init or next
                Op::NdState { sort, .. } => {
                    let sort_id = self.sort_id(sort);
                    let id = self.fresh();
                    let _ = writeln!(self.out, "{id} input {sort_id}");
                    id
                }
                Op::Array { sort } => {
                    let sort_id = self.sort_id(sort);
                    let id = self.fresh();
                    let _ = writeln!(self.out, "{id} state {sort_id}");
                    id
                }
                Op::InitArray { .. } => {
                    return Err(Error::translation(
                        "init_array is only meaningful as a state initializer",
                    ));
                }
                Op::Unary { kind, operand } => {
                    self.value_line(kind.mnemonic(), result_sort, &[operand], cache)?
                }
                Op::Reduce { kind, operand } => {
                    self.value_line(kind.mnemonic(), result_sort, &[operand], cache)?
                }
                Op::Binary { kind, lhs, rhs } => {
                    self.value_line(kind.mnemonic(), result_sort, &[lhs, rhs], cache)?
                }
                Op::Overflow { kind, lhs, rhs } => {
                    self.value_line(kind.mnemonic(), result_sort, &[lhs, rhs], cache)?
                }
                Op::Cmp { pred, lhs, rhs } => {
                    self.value_line(pred.btor2_keyword(), result_sort, &[lhs, rhs], cache)?
                }
                Op::Slice {
                    operand,
                    upper,
                    lower,
                } => {
                    let sort_id = self.result_sort_id(result_sort)?;
                    let operand = self.cached(cache, operand)?;
                    let id = self.fresh();
                    let _ = writeln!(self.out, "{id} slice {sort_id} {operand} {upper} {lower}");
                    id
                }
                Op::Ext {
                    kind,
                    operand,
                    width,
                } => {
                    let from = sorts
                        .sort_of(operand)
                        .and_then(|sort| sort.bitvec_width())
                        .ok_or_else(|| {
                            Error::translation("extension of a non bit-vector value")
                        })?;
                    let sort_id = self.result_sort_id(result_sort)?;
                    let operand = self.cached(cache, operand)?;
                    let amount = width.saturating_sub(from);
                    let id = self.fresh();
                    let _ = writeln!(
                        self.out,
                        "{id} {} {sort_id} {operand} {amount}",
                        kind.mnemonic()
                    );
                    id
                }
                Op::Concat { lhs, rhs } => {
                    self.value_line("concat", result_sort, &[lhs, rhs], cache)?
                }
                Op::Ite {
                    cond,
                    then_value,
                    else_value,
                } => self.value_line("ite", result_sort, &[cond, then_value, else_value], cache)?,
                Op::Read { array, index } => {
                    self.value_line("read", result_sort, &[array, index], cache)?
                }
                Op::Write {
                    value,
                    array,
                    index,
                } => self.value_line("write", result_sort, &[array, index, value], cache)?,
                Op::Constraint { cond } => {
                    let cond = self.cached(cache, cond)?;
                    let id = self.fresh();
                    let _ = writeln!(self.out, "{id} constraint {cond}");
                    continue;
                }
                Op::AssertNot { cond, .. } => {
                    let cond = self.cached(cache, cond)?;
                    let id = self.fresh();
                    let _ = writeln!(self.out, "{id} bad {cond}");
                    continue;
                }
            };
            cache.insert(value, line);
        }
        Ok(())
    }

    fn value_line(
        &mut self,
        keyword: &str,
        result_sort: Option<ir::Sort>,
        operands: &[Value],
        cache: &HashMap<Value, u64>,
    ) -> Result<u64> {
        let sort_id = self.result_sort_id(result_sort)?;
        let mut resolved = Vec::with_capacity(operands.len());
        for &operand in operands {
            resolved.push(self.cached(cache, operand)?);
        }
        let id = self.fresh();
        let _ = write!(self.out, "{id} {keyword} {sort_id}");
        for line in resolved {
            let _ = write!(self.out, " {line}");
        }
        self.out.push('\n');
        Ok(id)
    }

    fn cached(&self, cache: &HashMap<Value, u64>, value: Value) -> Result<u64> {
        cache
            .get(&value)
            .copied()
            .ok_or_else(|| Error::translation("operand has no serialized line"))
    }

    fn result_sort_id(&mut self, sort: Option<ir::Sort>) -> Result<u64> {
        let sort = sort.ok_or_else(|| Error::translation("operation has no result sort"))?;
        Ok(self.sort_id(sort))
    }

    /// Line id of a sort, emitting its `sort` line on first use.
    fn sort_id(&mut self, sort: ir::Sort) -> u64 {
        if let Some(&id) = self.sorts.get(&sort) {
            return id;
        }
        let id = match sort {
            ir::Sort::BitVec(width) => {
                let id = self.fresh();
                let _ = writeln!(self.out, "{id} sort bitvec {width}");
                id
            }
            ir::Sort::Array { index, element } => {
                let index_id = self.sort_id(ir::Sort::BitVec(index));
                let element_id = self.sort_id(ir::Sort::BitVec(element));
                let id = self.fresh();
                let _ = writeln!(self.out, "{id} sort array {index_id} {element_id}");
                id
            }
        };
        self.sorts.insert(sort, id);
        id
    }

    fn fresh(&mut self) -> u64 {
        let id = self.next_line;
        self.next_line += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::btor2::{self, Tag};
    use crate::translate::import_btor;

    const COUNTER: &str = "\
1 sort bitvec 4
2 zero 1
3 state 1
4 init 1 3 2
5 one 1
6 add 1 3 5
7 next 1 3 6
8 ones 1
9 eq 1 3 8
10 bad 9
";

    #[test]
    fn exported_counter_reparses() {
        let module = import_btor(COUNTER).unwrap();
        let text = export_btor(&module).unwrap();
        let model = btor2::Model::parse(&text).unwrap();
        assert_eq!(model.states.len(), 1);
        assert_eq!(model.bads.len(), 1);
        assert_eq!(model.state_init.len(), 1);
        assert_eq!(model.state_next.len(), 1);
    }

    #[test]
    fn counter_semantics_survive_a_round_trip() {
        let module = import_btor(COUNTER).unwrap();
        let text = export_btor(&module).unwrap();
        let again = import_btor(&text).unwrap();
        assert_eq!(module, again);
    }

    #[test]
    fn nondeterministic_state_stays_uninitialized() {
        let source = "\
1 sort bitvec 8
2 state 1
3 next 1 2 2
";
        let module = import_btor(source).unwrap();
        let text = export_btor(&module).unwrap();
        let model = btor2::Model::parse(&text).unwrap();
        assert_eq!(model.states.len(), 1);
        assert!(model.state_init.is_empty(), "no init line expected:\n{text}");
    }

    #[test]
    fn array_broadcast_init_round_trips() {
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
        let text = export_btor(&module).unwrap();
        let model = btor2::Model::parse(&text).unwrap();
        let state = model.states[0];
        let init_value = model.state_init[&state].unsigned_abs();
        let zero = model.line(init_value).unwrap();
        assert_eq!(zero.const_value, Some(0));
        assert!(matches!(
            model.sort_of(model.line(state).unwrap()),
            Some(btor2::Sort::Array { .. })
        ));
    }

    #[test]
    fn constraints_are_preserved() {
        let source = "\
1 sort bitvec 1
2 state 1
3 next 1 2 2
4 constraint 2
5 bad -2
";
        let module = import_btor(source).unwrap();
        let text = export_btor(&module).unwrap();
        let model = btor2::Model::parse(&text).unwrap();
        assert_eq!(model.constraints.len(), 1);
        assert_eq!(model.bads.len(), 1);
        let bad = model.line(model.bads[0]).unwrap();
        let not = model.line(bad.args[0] as u64).unwrap();
        assert_eq!(not.tag, Tag::Not);
    }

    #[test]
    fn constants_emit_as_decimal() {
        let source = "\
1 sort bitvec 8
2 consth 1 ff
3 state 1
4 init 1 3 2
5 next 1 3 3
";
        let module = import_btor(source).unwrap();
        let text = export_btor(&module).unwrap();
        assert!(text.contains("constd"), "expected constd lines:\n{text}");
        let model = btor2::Model::parse(&text).unwrap();
        let state = model.states[0];
        let value = model.state_init[&state].unsigned_abs();
        assert_eq!(model.line(value).unwrap().const_value, Some(0xff));
    }
}
