//! Three-valued evaluation of compiled `if-feature` expressions.

use rustc_hash::FxHashSet;

use super::{IfFeatureExpr, Opcode};
use crate::base::FeatureId;

/// Result of evaluating a feature or expression.
///
/// `Hidden` marks a feature that is unavailable because one of its own
/// `if-feature` conditions is false. It behaves as `false` for callers but
/// propagates through `not`, `and` and `or` unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureValue {
    True,
    False,
    Hidden,
}

impl FeatureValue {
    pub fn is_true(self) -> bool {
        self == FeatureValue::True
    }

    fn from_bool(value: bool) -> Self {
        if value {
            FeatureValue::True
        } else {
            FeatureValue::False
        }
    }
}

/// Where feature state comes from.
pub trait FeatureSource {
    /// The feature's own switch.
    fn is_enabled(&self, feature: FeatureId) -> bool;

    /// The feature's own `if-feature` expressions.
    fn if_features(&self, feature: FeatureId) -> &[IfFeatureExpr];
}

/// Evaluate `expr`, collapsing `Hidden` into `false`.
pub fn evaluate<S: FeatureSource + ?Sized>(expr: &IfFeatureExpr, source: &S) -> bool {
    evaluate_value(expr, source).is_true()
}

/// Evaluate `expr` keeping the three-valued result.
pub fn evaluate_value<S: FeatureSource + ?Sized>(expr: &IfFeatureExpr, source: &S) -> FeatureValue {
    let mut active = FxHashSet::default();
    eval_expr(expr, source, &mut active)
}

/// The value of one feature, including its own `if-feature` chain.
pub fn feature_value<S: FeatureSource + ?Sized>(feature: FeatureId, source: &S) -> FeatureValue {
    let mut active = FxHashSet::default();
    eval_feature(feature, source, &mut active)
}

fn eval_expr<S: FeatureSource + ?Sized>(
    expr: &IfFeatureExpr,
    source: &S,
    active: &mut FxHashSet<FeatureId>,
) -> FeatureValue {
    if !expr.is_compiled() || expr.is_empty() {
        return FeatureValue::Hidden;
    }
    let mut cursor = Cursor {
        expr,
        op: 0,
        feature: 0,
    };
    cursor.eval(source, active)
}

fn eval_feature<S: FeatureSource + ?Sized>(
    feature: FeatureId,
    source: &S,
    active: &mut FxHashSet<FeatureId>,
) -> FeatureValue {
    // A feature reached again through its own if-feature chain.
    if !active.insert(feature) {
        return FeatureValue::Hidden;
    }
    let mut value = FeatureValue::from_bool(source.is_enabled(feature));
    for expr in source.if_features(feature) {
        if eval_expr(expr, source, active) != FeatureValue::True {
            value = FeatureValue::Hidden;
            break;
        }
    }
    active.remove(&feature);
    value
}

struct Cursor<'e> {
    expr: &'e IfFeatureExpr,
    op: usize,
    feature: usize,
}

impl Cursor<'_> {
    fn eval<S: FeatureSource + ?Sized>(
        &mut self,
        source: &S,
        active: &mut FxHashSet<FeatureId>,
    ) -> FeatureValue {
        if self.op >= self.expr.len() {
            return FeatureValue::Hidden;
        }
        let op = self.expr.opcode(self.op);
        self.op += 1;
        match op {
            Opcode::Feature => {
                let slot = self.expr.features().get(self.feature).copied().flatten();
                self.feature += 1;
                match slot {
                    Some(feature) => eval_feature(feature, source, active),
                    None => FeatureValue::Hidden,
                }
            }
            Opcode::Not => match self.eval(source, active) {
                FeatureValue::True => FeatureValue::False,
                FeatureValue::False => FeatureValue::True,
                FeatureValue::Hidden => FeatureValue::Hidden,
            },
            Opcode::And | Opcode::Or => {
                let left = self.eval(source, active);
                let right = self.eval(source, active);
                if left == FeatureValue::Hidden || right == FeatureValue::Hidden {
                    return FeatureValue::Hidden;
                }
                FeatureValue::from_bool(if op == Opcode::And {
                    left.is_true() && right.is_true()
                } else {
                    left.is_true() || right.is_true()
                })
            }
        }
    }
}
