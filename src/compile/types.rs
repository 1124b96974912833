//! Type derivation, leafref/identityref linking and default validation.

use rustc_hash::FxHashSet;

use crate::base::{ModuleId, NodeId, TypeId, TypedefId};
use crate::error::CompileError;
use crate::parser::InstanceIdCursor;
use crate::resolve::{Resolve, Unresolved};
use crate::schema::{
    BaseType, BitValue, EnumValue, RangeSet, TypeOwner, check_binary_value, check_bits_value,
    parse_number,
};

use super::unres::{DefaultOwner, WorkKind};
use super::Compiler;

const MAX_FRACTION_DIGITS: u8 = 18;

impl Compiler<'_> {
    /// Chain `ty` to its built-in base through at most one typedef level and
    /// check the restrictions written on it.
    pub(crate) fn resolve_type(&mut self, ty: TypeId) -> Resolve<()> {
        if self.ctx.type_spec(ty).is_resolved() {
            return Ok(());
        }
        let name = self.ctx.type_spec(ty).name.clone();
        let (base, derived_from) = match self.ctx.find_typedef(ty)? {
            None => match BaseType::from_builtin(&name) {
                Some(base) => (base, None),
                None => return Err(CompileError::not_found("type", name.as_str()).into()),
            },
            Some(typedef) => {
                self.check_typedef_cycle(ty, typedef)?;
                let parent = self.ctx.type_spec(self.ctx.typedef(typedef).ty);
                match parent.base {
                    Some(base) => (base, Some(typedef)),
                    None => {
                        return Err(Unresolved::forward(format!(
                            "typedef \"{name}\" is not resolved yet"
                        )));
                    }
                }
            }
        };
        self.check_restrictions(ty, base, derived_from)?;

        let spec = self.ctx.type_mut(ty);
        spec.base = Some(base);
        spec.derived_from = derived_from;
        self.release_grouping(self.type_grouping(ty));
        self.after_type_resolved(ty, base);
        Ok(())
    }

    /// Queue what a freshly derived type makes possible.
    fn after_type_resolved(&mut self, ty: TypeId, base: BaseType) {
        let module = self.ctx.type_spec(ty).module;
        let Some(node) = self.type_node(ty) else {
            if let TypeOwner::Typedef(typedef) = self.ctx.type_spec(ty).owner {
                if self.ctx.typedef(typedef).default.is_none()
                    && self.ctx.type_spec(ty).restrictions.narrows_values()
                    && self.inherited_default(ty).is_some()
                {
                    self.queue(
                        module,
                        WorkKind::TypeDefault {
                            owner: DefaultOwner::Typedef(typedef),
                        },
                    );
                }
            }
            return;
        };
        if self.ctx.enclosing_grouping(node).is_some() {
            return;
        }
        if base == BaseType::LeafRef {
            self.queue(module, WorkKind::Leafref { ty, node });
        }
        let own_type = self.ctx.node(node).type_id() == Some(ty);
        if own_type && self.needs_default_check(node) {
            let node_module = self.ctx.node(node).module;
            self.queue(
                node_module,
                WorkKind::TypeDefault {
                    owner: DefaultOwner::Node(node),
                },
            );
        }
    }

    /// `typedef a { type b; }  typedef b { type a; }` never resolves; report
    /// it as a cycle instead of a dangling reference.
    fn check_typedef_cycle(&self, ty: TypeId, first: TypedefId) -> Resolve<()> {
        let TypeOwner::Typedef(own) = self.ctx.type_spec(ty).owner else {
            return Ok(());
        };
        let mut seen = FxHashSet::default();
        let mut current = first;
        loop {
            if current == own {
                let name = self.ctx.typedef(own).name.as_str();
                return Err(CompileError::cycle("typedef", name).into());
            }
            if !seen.insert(current) {
                return Ok(());
            }
            match self.ctx.find_typedef(self.ctx.typedef(current).ty) {
                Ok(Some(next)) => current = next,
                _ => return Ok(()),
            }
        }
    }

    fn check_restrictions(
        &self,
        ty: TypeId,
        base: BaseType,
        derived_from: Option<TypedefId>,
    ) -> Resolve<()> {
        let spec = self.ctx.type_spec(ty);
        let r = &spec.restrictions;
        let name = spec.name.as_str();
        let invalid = |message: String| -> Unresolved {
            CompileError::constraint(format!("type \"{name}\": {message}")).into()
        };
        let builtin = derived_from.is_none();

        if r.range.is_some() && !base.is_numeric() {
            return Err(invalid("range is only valid on numeric types".into()));
        }
        if r.length.is_some() && !base.has_length() {
            return Err(invalid("length is only valid on string and binary".into()));
        }
        if !r.patterns.is_empty() && base != BaseType::String {
            return Err(invalid("pattern is only valid on string".into()));
        }
        for pattern in &r.patterns {
            pattern.compile().map_err(invalid)?;
        }
        if !r.enums.is_empty() && base != BaseType::Enumeration {
            return Err(invalid("enum is only valid on enumeration".into()));
        }
        if !r.bits.is_empty() && base != BaseType::Bits {
            return Err(invalid("bit is only valid on bits".into()));
        }
        if r.path.is_some() && base != BaseType::LeafRef {
            return Err(invalid("path is only valid on leafref".into()));
        }
        if !r.bases.is_empty() && base != BaseType::IdentityRef {
            return Err(invalid("base is only valid on identityref".into()));
        }
        if !r.members.is_empty() && base != BaseType::Union {
            return Err(invalid("member types are only valid on union".into()));
        }

        match base {
            BaseType::Enumeration if builtin && r.enums.is_empty() => {
                return Err(invalid("enumeration needs at least one enum".into()));
            }
            BaseType::Bits if builtin && r.bits.is_empty() => {
                return Err(invalid("bits needs at least one bit".into()));
            }
            BaseType::LeafRef if builtin && r.path.is_none() => {
                return Err(invalid("leafref needs a path".into()));
            }
            BaseType::IdentityRef if builtin && r.bases.is_empty() => {
                return Err(invalid("identityref needs a base".into()));
            }
            BaseType::Union if builtin && r.members.is_empty() => {
                return Err(invalid("union needs member types".into()));
            }
            BaseType::Decimal64 => match (builtin, r.fraction_digits) {
                (true, None) => return Err(invalid("decimal64 needs fraction-digits".into())),
                (true, Some(digits)) if !(1..=MAX_FRACTION_DIGITS).contains(&digits) => {
                    return Err(invalid(format!("fraction-digits {digits} is out of 1..18")));
                }
                (false, Some(_)) => {
                    return Err(invalid("fraction-digits cannot be restricted".into()));
                }
                _ => {}
            },
            _ => {}
        }

        if let Some(parent) = derived_from.map(|typedef| self.ctx.typedef(typedef).ty) {
            self.check_subset(&r.enums, &self.effective_enums(parent), |e| e.name.as_str())
                .map_err(|missing| invalid(format!("enum \"{missing}\" is not in the base type")))?;
            self.check_subset(&r.bits, &self.effective_bits(parent), |b| b.name.as_str())
                .map_err(|missing| invalid(format!("bit \"{missing}\" is not in the base type")))?;
        }

        if base == BaseType::Union {
            if let Some(member) = r
                .members
                .iter()
                .find(|&&member| !self.ctx.type_spec(member).is_resolved())
            {
                return Err(Unresolved::forward(format!(
                    "union member \"{}\" is not resolved yet",
                    self.ctx.type_spec(*member).name
                )));
            }
        }

        if r.range.is_some() || r.length.is_some() {
            self.value_space(ty, base, derived_from).map_err(invalid)?;
        }
        Ok(())
    }

    fn check_subset<'v, T>(
        &self,
        restricted: &'v [T],
        parent: &[T],
        name: impl Fn(&T) -> &str,
    ) -> Result<(), &'v str>
    where
        T: 'v,
    {
        if parent.is_empty() {
            return Ok(());
        }
        for item in restricted {
            if !parent.iter().any(|p| name(p) == name(item)) {
                return Err(name(item));
            }
        }
        Ok(())
    }

    /// Enums of the closest level in the typedef chain that lists some.
    fn effective_enums(&self, ty: TypeId) -> Vec<EnumValue> {
        self.chain(ty)
            .into_iter()
            .map(|t| &self.ctx.type_spec(t).restrictions.enums)
            .find(|enums| !enums.is_empty())
            .cloned()
            .unwrap_or_default()
    }

    fn effective_bits(&self, ty: TypeId) -> Vec<BitValue> {
        self.chain(ty)
            .into_iter()
            .map(|t| &self.ctx.type_spec(t).restrictions.bits)
            .find(|bits| !bits.is_empty())
            .cloned()
            .unwrap_or_default()
    }

    fn fraction_digits(&self, ty: TypeId) -> u8 {
        self.chain(ty)
            .into_iter()
            .find_map(|t| self.ctx.type_spec(t).restrictions.fraction_digits)
            .unwrap_or(0)
    }

    /// `ty` followed by every type it derives from, as far as linked.
    fn chain(&self, ty: TypeId) -> Vec<TypeId> {
        let mut chain = vec![ty];
        let mut current = self.ctx.type_spec(ty).derived_from;
        while let Some(typedef) = current {
            let next = self.ctx.typedef(typedef).ty;
            if chain.contains(&next) {
                break;
            }
            chain.push(next);
            current = self.ctx.type_spec(next).derived_from;
        }
        chain
    }

    /// The range (numeric types) or length (string, binary) value space of
    /// `ty`, narrowing level by level from the built-in bounds.
    fn value_space(
        &self,
        ty: TypeId,
        base: BaseType,
        derived_from: Option<TypedefId>,
    ) -> Result<Option<RangeSet>, String> {
        let mut levels = vec![ty];
        if let Some(typedef) = derived_from {
            levels.extend(self.chain(self.ctx.typedef(typedef).ty));
        }
        let scale = levels
            .iter()
            .find_map(|&t| self.ctx.type_spec(t).restrictions.fraction_digits)
            .unwrap_or(0);
        let mut space = if let Some((min, max)) = base.integer_bounds() {
            RangeSet::new(min, max)
        } else if base == BaseType::Decimal64 {
            RangeSet::new(i64::MIN.into(), i64::MAX.into())
        } else if base.has_length() {
            RangeSet::new(0, u64::MAX.into())
        } else {
            return Ok(None);
        };
        for &level in levels.iter().rev() {
            let r = &self.ctx.type_spec(level).restrictions;
            let text = if base.has_length() { &r.length } else { &r.range };
            if let Some(text) = text {
                let level_scale = if base.has_length() { 0 } else { scale };
                space = space.restrict(text, level_scale)?;
            }
        }
        Ok(Some(space))
    }

    /// The nearest default up the typedef chain of `ty`, excluding `ty`'s own
    /// level when it belongs to a typedef.
    pub(crate) fn inherited_default(&self, ty: TypeId) -> Option<String> {
        let mut current = self.ctx.type_spec(ty).derived_from;
        let mut seen = FxHashSet::default();
        while let Some(typedef) = current {
            if !seen.insert(typedef) {
                return None;
            }
            let def = self.ctx.typedef(typedef);
            if let Some(default) = &def.default {
                return Some(default.clone());
            }
            current = self.ctx.type_spec(def.ty).derived_from;
        }
        None
    }

    pub(crate) fn link_leafref(&mut self, ty: TypeId, node: NodeId) -> Resolve<()> {
        if self.ctx.type_spec(ty).leafref_target.is_some() {
            return Ok(());
        }
        let target = self.ctx.resolve_leafref(ty, node)?;
        self.ctx.type_mut(ty).leafref_target = Some(target);
        Ok(())
    }

    pub(crate) fn link_identityref(&mut self, ty: TypeId) -> Resolve<()> {
        let spec = self.ctx.type_spec(ty);
        let module = spec.module;
        let mut identities = Vec::with_capacity(spec.restrictions.bases.len());
        for base in &spec.restrictions.bases {
            identities.push(self.ctx.find_identity(module, base)?);
        }
        self.ctx.type_mut(ty).identities = identities;
        Ok(())
    }

    /// Check a default value against its fully resolved type.
    pub(crate) fn check_default(&mut self, owner: DefaultOwner) -> Resolve<()> {
        let (ty, values, module) = match owner {
            DefaultOwner::Node(node) => {
                let n = self.ctx.node(node);
                let Some(ty) = n.type_id() else {
                    return Ok(());
                };
                let mut values: Vec<String> = n.defaults().into_iter().map(String::from).collect();
                if values.is_empty() {
                    values.extend(self.inherited_default(ty));
                }
                // Copies out of a grouping keep the grouping's prefixes on their type.
                (ty, values, self.ctx.type_spec(ty).module)
            }
            DefaultOwner::Typedef(typedef) => {
                let def = self.ctx.typedef(typedef);
                let ty = def.ty;
                let values: Vec<String> = def
                    .default
                    .clone()
                    .or_else(|| self.inherited_default(ty))
                    .into_iter()
                    .collect();
                (ty, values, def.module)
            }
        };
        let in_typedef = matches!(owner, DefaultOwner::Typedef(_));
        for value in &values {
            self.check_value(ty, value, module, in_typedef).map_err(|err| match err {
                Unresolved::Fatal(CompileError::Constraint(message)) => {
                    CompileError::constraint(format!("invalid default \"{value}\": {message}")).into()
                }
                other => other,
            })?;
        }
        Ok(())
    }

    fn check_value(
        &self,
        ty: TypeId,
        value: &str,
        module: ModuleId,
        in_typedef: bool,
    ) -> Resolve<()> {
        let spec = self.ctx.type_spec(ty);
        let Some(base) = spec.base else {
            return Err(Unresolved::forward(format!("type \"{}\" is not resolved yet", spec.name)));
        };
        let fail = |message: String| -> Resolve<()> { Err(CompileError::Constraint(message).into()) };

        match base {
            BaseType::Empty => fail("type empty cannot have a default".into()),
            BaseType::Boolean => match value {
                "true" | "false" => Ok(()),
                _ => fail("not a boolean".into()),
            },
            BaseType::Decimal64 => {
                let scale = self.fraction_digits(ty);
                self.check_in_space(ty, base, parse_number(value, scale))
            }
            _ if base.integer_bounds().is_some() => {
                self.check_in_space(ty, base, parse_number(value, 0))
            }
            BaseType::String => {
                let len = i128::try_from(value.chars().count()).unwrap_or(i128::MAX);
                self.check_in_space(ty, base, Ok(len))?;
                self.check_patterns(ty, value)
            }
            BaseType::Binary => check_binary_value(value).or_else(fail),
            BaseType::Enumeration => {
                if self.effective_enums(ty).iter().any(|e| e.name == value) {
                    Ok(())
                } else {
                    fail(format!("\"{value}\" is not an enum of the type"))
                }
            }
            BaseType::Bits => check_bits_value(value, &self.effective_bits(ty)).or_else(fail),
            BaseType::IdentityRef => {
                let bases = self.ctx.effective_identity_bases(ty);
                if bases.is_empty() {
                    return Err(Unresolved::forward("identityref bases are not linked yet"));
                }
                let identity = self.ctx.find_identity(module, value)?;
                if self.ctx.identity(identity).pending_bases() > 0 {
                    return Err(Unresolved::forward(format!(
                        "identity \"{value}\" is not fully derived yet"
                    )));
                }
                let derived = bases
                    .iter()
                    .any(|&base| base != identity && self.ctx.identity_derives_from(identity, base));
                if derived {
                    Ok(())
                } else {
                    fail(format!("identity \"{value}\" is not derived from the type's base"))
                }
            }
            BaseType::InstanceIdentifier => {
                let mut cursor = InstanceIdCursor::new(value);
                loop {
                    match cursor.next_segment() {
                        Ok(Some(_)) => loop {
                            match cursor.next_predicate() {
                                Ok(Some(_)) => {}
                                Ok(None) => break,
                                Err(error) => return fail(error.to_string()),
                            }
                        },
                        Ok(None) => return Ok(()),
                        Err(error) => return fail(error.to_string()),
                    }
                }
            }
            BaseType::LeafRef => {
                if in_typedef {
                    return Ok(());
                }
                let Some(target) = self.ctx.type_spec(ty).leafref_target else {
                    return Err(Unresolved::forward("leafref target is not linked yet"));
                };
                match self.ctx.node(target).type_id() {
                    Some(target_ty) => self.check_value(target_ty, value, module, false),
                    None => Ok(()),
                }
            }
            BaseType::Union => {
                let members = spec.restrictions.members.clone();
                let members = if members.is_empty() {
                    self.chain(ty)
                        .into_iter()
                        .map(|t| self.ctx.type_spec(t).restrictions.members.clone())
                        .find(|m| !m.is_empty())
                        .unwrap_or_default()
                } else {
                    members
                };
                let mut forward = None;
                for member in members {
                    match self.check_value(member, value, module, in_typedef) {
                        Ok(()) => return Ok(()),
                        Err(Unresolved::Forward(reason)) => forward = Some(reason),
                        Err(Unresolved::Fatal(_)) => {}
                    }
                }
                match forward {
                    Some(reason) => Err(Unresolved::Forward(reason)),
                    None => fail(format!("\"{value}\" matches no member type")),
                }
            }
            _ => Ok(()),
        }
    }

    /// Every pattern along the typedef chain must accept `value`.
    fn check_patterns(&self, ty: TypeId, value: &str) -> Resolve<()> {
        for level in self.chain(ty) {
            for pattern in &self.ctx.type_spec(level).restrictions.patterns {
                if !pattern.accepts(value).map_err(CompileError::Constraint)? {
                    let how = if pattern.invert_match { "matches" } else { "does not match" };
                    return Err(CompileError::constraint(format!(
                        "\"{value}\" {how} pattern \"{}\"",
                        pattern.expr
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }

    fn check_in_space(&self, ty: TypeId, base: BaseType, value: Result<i128, String>) -> Resolve<()> {
        let value = value.map_err(CompileError::Constraint)?;
        let derived_from = self.ctx.type_spec(ty).derived_from;
        let space = self.value_space(ty, base, derived_from).map_err(CompileError::Constraint)?;
        match space {
            Some(space) if !space.contains(value) => {
                let what = if base.has_length() { "length" } else { "value" };
                Err(CompileError::constraint(format!("{what} is out of the allowed range")).into())
            }
            _ => Ok(()),
        }
    }
}
