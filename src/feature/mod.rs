//! `if-feature` expressions.
//!
//! An expression such as `not f1 and (f2 or f3)` is compiled once into a
//! prefix-ordered sequence of 2-bit opcodes packed four to a byte, plus a
//! parallel table with one slot per `FEATURE` opcode. The slots start empty
//! and are filled by the worklist as the referenced features resolve, so an
//! expression can be compiled long before the features it names exist.
//!
//! ```text
//! "not f1 and (f2 or f3)"  →  AND NOT F OR F F     features: [f1, f2, f3]
//! "not not f1"             →  F                    features: [f1]
//! ```

mod compile;
mod eval;

pub use compile::{CompiledExpr, IfFeatureError, compile};
pub use eval::{FeatureSource, FeatureValue, evaluate, evaluate_value, feature_value};

use crate::base::{FeatureId, Name};

/// One 2-bit instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Not = 0,
    And = 1,
    Or = 2,
    Feature = 3,
}

impl Opcode {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Opcode::Not,
            1 => Opcode::And,
            2 => Opcode::Or,
            _ => Opcode::Feature,
        }
    }
}

/// Write `op` into slot `pos` of a packed opcode array.
pub(crate) fn set_opcode(packed: &mut [u8], pos: usize, op: Opcode) {
    let shift = 2 * (pos % 4);
    let byte = &mut packed[pos / 4];
    *byte &= !(0b11 << shift);
    *byte |= (op as u8) << shift;
}

/// Read slot `pos` of a packed opcode array.
pub(crate) fn get_opcode(packed: &[u8], pos: usize) -> Opcode {
    Opcode::from_bits(packed[pos / 4] >> (2 * (pos % 4)))
}

/// A compiled (or not yet compiled) `if-feature` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfFeatureExpr {
    text: Name,
    packed: Vec<u8>,
    len: usize,
    features: Vec<Option<FeatureId>>,
    compiled: bool,
}

impl IfFeatureExpr {
    /// An expression as written; compiled when its module is registered.
    pub fn new(text: Name) -> Self {
        Self {
            text,
            packed: Vec::new(),
            len: 0,
            features: Vec::new(),
            compiled: false,
        }
    }

    pub fn text(&self) -> &Name {
        &self.text
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Number of opcode slots.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The packed opcode bytes, `ceil(len / 4)` of them.
    pub fn packed(&self) -> &[u8] {
        &self.packed
    }

    pub fn opcode(&self, pos: usize) -> Opcode {
        get_opcode(&self.packed, pos)
    }

    pub fn opcodes(&self) -> impl Iterator<Item = Opcode> + '_ {
        (0..self.len).map(|pos| self.opcode(pos))
    }

    /// Feature slots in the order their `FEATURE` opcodes appear.
    pub fn features(&self) -> &[Option<FeatureId>] {
        &self.features
    }

    /// All feature slots are filled.
    pub fn is_resolved(&self) -> bool {
        self.compiled && self.features.iter().all(Option::is_some)
    }

    pub(crate) fn install(&mut self, compiled: &CompiledExpr<'_>) {
        self.packed = compiled.packed.clone();
        self.len = compiled.len;
        self.features = vec![None; compiled.features.len()];
        self.compiled = true;
    }

    pub(crate) fn set_feature(&mut self, slot: usize, feature: FeatureId) {
        if let Some(entry) = self.features.get_mut(slot) {
            *entry = Some(feature);
        }
    }
}
