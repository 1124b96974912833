//! Types, restrictions and the value checks that defaults are held to.

use std::fmt;

use crate::base::{IdentityId, ModuleId, Name, NodeId, TypeId, TypedefId};

use super::pattern::Pattern;

/// Built-in YANG types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Binary,
    Bits,
    Boolean,
    Decimal64,
    Empty,
    Enumeration,
    IdentityRef,
    InstanceIdentifier,
    Int8,
    Int16,
    Int32,
    Int64,
    LeafRef,
    String,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Union,
}

impl BaseType {
    pub fn from_builtin(name: &str) -> Option<Self> {
        Some(match name {
            "binary" => BaseType::Binary,
            "bits" => BaseType::Bits,
            "boolean" => BaseType::Boolean,
            "decimal64" => BaseType::Decimal64,
            "empty" => BaseType::Empty,
            "enumeration" => BaseType::Enumeration,
            "identityref" => BaseType::IdentityRef,
            "instance-identifier" => BaseType::InstanceIdentifier,
            "int8" => BaseType::Int8,
            "int16" => BaseType::Int16,
            "int32" => BaseType::Int32,
            "int64" => BaseType::Int64,
            "leafref" => BaseType::LeafRef,
            "string" => BaseType::String,
            "uint8" => BaseType::Uint8,
            "uint16" => BaseType::Uint16,
            "uint32" => BaseType::Uint32,
            "uint64" => BaseType::Uint64,
            "union" => BaseType::Union,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BaseType::Binary => "binary",
            BaseType::Bits => "bits",
            BaseType::Boolean => "boolean",
            BaseType::Decimal64 => "decimal64",
            BaseType::Empty => "empty",
            BaseType::Enumeration => "enumeration",
            BaseType::IdentityRef => "identityref",
            BaseType::InstanceIdentifier => "instance-identifier",
            BaseType::Int8 => "int8",
            BaseType::Int16 => "int16",
            BaseType::Int32 => "int32",
            BaseType::Int64 => "int64",
            BaseType::LeafRef => "leafref",
            BaseType::String => "string",
            BaseType::Uint8 => "uint8",
            BaseType::Uint16 => "uint16",
            BaseType::Uint32 => "uint32",
            BaseType::Uint64 => "uint64",
            BaseType::Union => "union",
        }
    }

    /// Value bounds of the integer types.
    pub fn integer_bounds(self) -> Option<(i128, i128)> {
        Some(match self {
            BaseType::Int8 => (i8::MIN.into(), i8::MAX.into()),
            BaseType::Int16 => (i16::MIN.into(), i16::MAX.into()),
            BaseType::Int32 => (i32::MIN.into(), i32::MAX.into()),
            BaseType::Int64 => (i64::MIN.into(), i64::MAX.into()),
            BaseType::Uint8 => (0, u8::MAX.into()),
            BaseType::Uint16 => (0, u16::MAX.into()),
            BaseType::Uint32 => (0, u32::MAX.into()),
            BaseType::Uint64 => (0, u64::MAX.into()),
            _ => return None,
        })
    }

    pub fn is_numeric(self) -> bool {
        self == BaseType::Decimal64 || self.integer_bounds().is_some()
    }

    pub fn has_length(self) -> bool {
        matches!(self, BaseType::String | BaseType::Binary)
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a `type` statement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeOwner {
    Node(NodeId),
    Typedef(TypedefId),
    /// A member of a union type.
    Union(TypeId),
    /// `deviate replace { type ... }` in the given module.
    Deviation(ModuleId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: Name,
    pub value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitValue {
    pub name: Name,
    pub position: Option<u32>,
}

/// Restrictions written on one `type` statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Restrictions {
    pub range: Option<String>,
    pub length: Option<String>,
    pub patterns: Vec<Pattern>,
    pub enums: Vec<EnumValue>,
    pub bits: Vec<BitValue>,
    pub fraction_digits: Option<u8>,
    /// Leafref `path` argument.
    pub path: Option<Name>,
    pub require_instance: Option<bool>,
    /// Identityref `base` arguments.
    pub bases: Vec<Name>,
    /// Union member types.
    pub members: Vec<TypeId>,
}

impl Restrictions {
    /// Restrictions that narrow the value space and so can invalidate an
    /// inherited default.
    pub fn narrows_values(&self) -> bool {
        self.range.is_some()
            || self.length.is_some()
            || !self.patterns.is_empty()
            || !self.enums.is_empty()
            || !self.bits.is_empty()
    }
}

/// One `type` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    /// `[prefix:]name` as written.
    pub name: Name,
    /// Module whose prefixes apply to `name` and the restrictions.
    pub module: ModuleId,
    pub owner: TypeOwner,
    pub restrictions: Restrictions,
    /// Built-in base, set once the derivation chain resolved.
    pub base: Option<BaseType>,
    /// The typedef this type derives from; `None` for a built-in.
    pub derived_from: Option<TypedefId>,
    pub leafref_target: Option<NodeId>,
    /// Resolved identityref bases written on this statement.
    pub identities: Vec<IdentityId>,
}

impl TypeSpec {
    pub(crate) fn new(name: Name, module: ModuleId, owner: TypeOwner) -> Self {
        Self {
            name,
            module,
            owner,
            restrictions: Restrictions::default(),
            base: None,
            derived_from: None,
            leafref_target: None,
            identities: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.base.is_some()
    }
}

/// A closed interval of integers (decimal64 values are scaled).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub min: i128,
    pub max: i128,
}

/// Value space of a `range` or `length`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSet {
    intervals: Vec<Interval>,
}

impl RangeSet {
    pub fn new(min: i128, max: i128) -> Self {
        Self {
            intervals: vec![Interval { min, max }],
        }
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn contains(&self, value: i128) -> bool {
        self.intervals
            .iter()
            .any(|interval| interval.min <= value && value <= interval.max)
    }

    fn min(&self) -> i128 {
        self.intervals.first().map_or(0, |interval| interval.min)
    }

    fn max(&self) -> i128 {
        self.intervals.last().map_or(0, |interval| interval.max)
    }

    fn covers(&self, interval: Interval) -> bool {
        self.intervals
            .iter()
            .any(|outer| outer.min <= interval.min && interval.max <= outer.max)
    }

    /// Parse a `range`/`length` argument that restricts `self`.
    ///
    /// `min`/`max` refer to the bounds of `self`; `scale` is the number of
    /// fraction digits for decimal64 values.
    pub fn restrict(&self, text: &str, scale: u8) -> Result<RangeSet, String> {
        let mut intervals: Vec<Interval> = Vec::new();
        for part in text.split('|') {
            let part = part.trim();
            let (lo, hi) = match part.split_once("..") {
                Some((lo, hi)) => (lo.trim(), hi.trim()),
                None => (part, part),
            };
            let bound = |text: &str| -> Result<i128, String> {
                match text {
                    "min" => Ok(self.min()),
                    "max" => Ok(self.max()),
                    _ => parse_number(text, scale),
                }
            };
            let interval = Interval {
                min: bound(lo)?,
                max: bound(hi)?,
            };
            if interval.min > interval.max {
                return Err(format!("range part \"{}\" is descending", part));
            }
            if intervals.last().is_some_and(|last| interval.min <= last.max) {
                return Err(format!(
                    "range part \"{}\" is not disjoint and ascending",
                    part
                ));
            }
            if !self.covers(interval) {
                return Err(format!(
                    "range part \"{}\" is not within the base type's range",
                    part
                ));
            }
            intervals.push(interval);
        }
        Ok(RangeSet { intervals })
    }
}

/// Parse an integer or a decimal scaled by `scale` fraction digits.
pub fn parse_number(text: &str, scale: u8) -> Result<i128, String> {
    let invalid = || format!("invalid number \"{}\"", text);
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) if scale > 0 => (int_part, frac_part),
        Some(_) => return Err(invalid()),
        None => (digits, ""),
    };
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if !frac_part.bytes().all(|b| b.is_ascii_digit()) || frac_part.len() > scale as usize {
        return Err(invalid());
    }
    if digits.contains('.') && frac_part.is_empty() {
        return Err(invalid());
    }

    let mut value: i128 = int_part.parse().map_err(|_| invalid())?;
    for pos in 0..scale as usize {
        let digit = frac_part.as_bytes().get(pos).map_or(0, |b| i128::from(b - b'0'));
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(invalid)?;
    }
    Ok(if negative { -value } else { value })
}

/// Check a `bits` value: space-separated names, each a member at most once.
pub fn check_bits_value(value: &str, bits: &[BitValue]) -> Result<(), String> {
    let mut seen: Vec<&str> = Vec::new();
    for name in value.split_ascii_whitespace() {
        if !bits.iter().any(|bit| bit.name == name) {
            return Err(format!("\"{}\" is not a bit of the type", name));
        }
        if seen.contains(&name) {
            return Err(format!("bit \"{}\" is set twice", name));
        }
        seen.push(name);
    }
    Ok(())
}

/// Check that `value` is plausible base64.
pub fn check_binary_value(value: &str) -> Result<(), String> {
    let stripped: Vec<u8> = value.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    let valid = stripped.len() % 4 == 0
        && stripped.iter().enumerate().all(|(pos, b)| {
            b.is_ascii_alphanumeric()
                || *b == b'+'
                || *b == b'/'
                || (*b == b'=' && pos + 2 >= stripped.len())
        });
    if valid {
        Ok(())
    } else {
        Err(format!("\"{}\" is not valid base64", value))
    }
}
