//! Sorts of the BTOR IR dialect: fixed-width bit vectors and one-dimensional
//! arrays indexed by a bit vector.
use serde::{Deserialize, Serialize};

#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize,
)]
pub enum Sort {
    /// `bv<width>`
    BitVec(u32),
    /// `array<bv<index>, bv<element>>`: 2^index cells of `element`-bit values
    Array { index: u32, element: u32 },
}

impl Sort {
    pub const BOOL: Sort = Sort::BitVec(1);

    pub fn bitvec_width(&self) -> Option<u32> {
        match self {
            Sort::BitVec(width) => Some(*width),
            Sort::Array { .. } => None,
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Sort::BitVec(1))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Sort::Array { .. })
    }
}

impl std::fmt::Display for Sort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sort::BitVec(width) => write!(f, "bv<{width}>"),
            Sort::Array { index, element } => {
                write!(f, "array<bv<{index}>, bv<{element}>>")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(Sort::BitVec(8).to_string(), "bv<8>");
        assert_eq!(
            Sort::Array {
                index: 3,
                element: 16
            }
            .to_string(),
            "array<bv<3>, bv<16>>"
        );
    }

    #[test]
    fn bool_is_width_one() {
        assert!(Sort::BOOL.is_bool());
        assert!(!Sort::BitVec(2).is_bool());
        assert_eq!(Sort::BitVec(2).bitvec_width(), Some(2));
    }
}
