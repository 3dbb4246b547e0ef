//! The transition-system module: an init block that yields the initial state
//! values and a next block that maps the current states (its block arguments)
//! to the next states.
use super::ops::Op;
use super::types::Sort;

/// A reference to a value inside one block: either the n-th block argument or
/// the result of the n-th operation.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Value {
    Arg(usize),
    Inst(usize),
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BlockKind {
    Init,
    Next,
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockKind::Init => write!(f, "init"),
            BlockKind::Next => write!(f, "next"),
        }
    }
}

/// A straight-line block of operations closed by a `yield` of state values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    pub args: Vec<Sort>,
    pub ops: Vec<Op>,
    pub yields: Vec<Value>,
}

impl Block {
    pub fn new(args: Vec<Sort>) -> Block {
        Block {
            args,
            ops: Vec::new(),
            yields: Vec::new(),
        }
    }

    /// Append an operation, returning its result value if it produces one.
    pub fn push(&mut self, op: Op) -> Option<Value> {
        let index = self.ops.len();
        let result = op.has_result().then_some(Value::Inst(index));
        self.ops.push(op);
        result
    }
}

/// One transition system. `states` gives the sorts of the system's states and
/// is mirrored by the next block's arguments and both blocks' yields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Module {
    pub states: Vec<Sort>,
    pub init: Block,
    pub next: Block,
}

impl Module {
    pub fn new(states: Vec<Sort>) -> Module {
        let next = Block::new(states.clone());
        Module {
            states,
            init: Block::new(Vec::new()),
            next,
        }
    }

    pub fn block(&self, kind: BlockKind) -> &Block {
        match kind {
            BlockKind::Init => &self.init,
            BlockKind::Next => &self.next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ops::{BinaryKind, Op};

    #[test]
    fn push_tracks_results() {
        let mut block = Block::new(Vec::new());
        let zero = block
            .push(Op::Constant {
                value: 0,
                sort: Sort::BitVec(4),
            })
            .unwrap();
        assert_eq!(zero, Value::Inst(0));
        let sum = block
            .push(Op::Binary {
                kind: BinaryKind::Add,
                lhs: zero,
                rhs: zero,
            })
            .unwrap();
        assert_eq!(sum, Value::Inst(1));
        assert_eq!(
            block.push(Op::Constraint { cond: sum }),
            None,
            "constraint produces no value"
        );
    }

    #[test]
    fn module_seeds_next_args_from_states() {
        let module = Module::new(vec![Sort::BitVec(4), Sort::BOOL]);
        assert_eq!(module.next.args, module.states);
        assert!(module.init.args.is_empty());
    }
}
