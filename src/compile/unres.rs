//! The worklist of deferred references.

use indexmap::IndexMap;

use crate::base::{FeatureId, IdentityId, ModuleId, Name, NodeId, TypeId, TypedefId};
use crate::schema::FeatureOwner;

/// Where a default value is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultOwner {
    Node(NodeId),
    Typedef(TypedefId),
}

/// One kind of deferred reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WorkKind {
    /// Chain a type through typedefs down to its built-in base.
    TypeDerivation { ty: TypeId },
    /// Check a default value against its resolved type.
    TypeDefault { owner: DefaultOwner },
    /// Link a leafref `path` to its target.
    Leafref { ty: TypeId, node: NodeId },
    /// Link identityref `base` names.
    Identityref { ty: TypeId },
    /// Link one `base` of an identity.
    IdentityBase { identity: IdentityId, index: usize },
    /// Fill one feature slot of a compiled `if-feature`.
    IfFeature {
        owner: FeatureOwner,
        expr: usize,
        slot: usize,
        name: Name,
    },
    /// Reject features whose `if-feature`s refer back to themselves.
    FeatureCheck { feature: FeatureId },
    /// Expand a `uses`.
    Uses { node: NodeId },
    /// Link a choice's default case.
    ChoiceDefault { node: NodeId },
    /// Link list keys.
    ListKeys { node: NodeId },
    /// Link `unique` arguments.
    ListUnique { node: NodeId },
    /// Splice an augment into its target.
    Augment { node: NodeId },
    /// Link and apply a deviation.
    Deviation { module: ModuleId, index: usize },
    /// Evaluate `must`/`when` once every name is linked.
    XPath { node: NodeId },
}

impl WorkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkKind::TypeDerivation { .. } => "type",
            WorkKind::TypeDefault { .. } => "default",
            WorkKind::Leafref { .. } => "leafref",
            WorkKind::Identityref { .. } => "identityref",
            WorkKind::IdentityBase { .. } => "identity base",
            WorkKind::IfFeature { .. } => "if-feature",
            WorkKind::FeatureCheck { .. } => "feature",
            WorkKind::Uses { .. } => "uses",
            WorkKind::ChoiceDefault { .. } => "choice default",
            WorkKind::ListKeys { .. } => "list keys",
            WorkKind::ListUnique { .. } => "unique",
            WorkKind::Augment { .. } => "augment",
            WorkKind::Deviation { .. } => "deviation",
            WorkKind::XPath { .. } => "xpath",
        }
    }

    /// Sweep order: expansions first, so later items see the copied nodes.
    fn phase(&self) -> u8 {
        match self {
            WorkKind::Uses { .. } => 0,
            WorkKind::Augment { .. } => 1,
            WorkKind::XPath { .. } => 3,
            _ => 2,
        }
    }

    pub fn is_xpath(&self) -> bool {
        matches!(self, WorkKind::XPath { .. })
    }
}

/// A work item: a reference waiting for its target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
    /// Module the reference is written in.
    pub module: ModuleId,
    pub kind: WorkKind,
}

impl WorkItem {
    pub fn new(module: ModuleId, kind: WorkKind) -> Self {
        Self { module, kind }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Pending,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Queued,
    AlreadyQueued,
}

/// Insertion-ordered, deduplicated worklist.
#[derive(Debug, Default)]
pub struct Unres {
    items: IndexMap<WorkItem, ItemState>,
}

impl Unres {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an item; adding one that is already known is a no-op.
    pub fn add(&mut self, item: WorkItem) -> AddOutcome {
        if self.items.contains_key(&item) {
            return AddOutcome::AlreadyQueued;
        }
        self.items.insert(item, ItemState::Pending);
        AddOutcome::Queued
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn state(&self, item: &WorkItem) -> Option<ItemState> {
        self.items.get(item).copied()
    }

    pub fn pending(&self) -> impl Iterator<Item = &WorkItem> {
        self.items
            .iter()
            .filter(|(_, state)| **state == ItemState::Pending)
            .map(|(item, _)| item)
    }

    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    pub fn resolved_count(&self) -> usize {
        self.items.len() - self.pending_count()
    }

    /// Pending items of one sweep, in phase order and queue order within a
    /// phase. XPath items are only included with `xpath`.
    pub(crate) fn snapshot(&self, xpath: bool) -> Vec<WorkItem> {
        let mut items: Vec<WorkItem> = self
            .pending()
            .filter(|item| item.kind.is_xpath() == xpath)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.kind.phase());
        items
    }

    /// Queue an item again, resolved or not. It keeps its original position.
    pub(crate) fn reopen(&mut self, item: WorkItem) {
        self.items.insert(item, ItemState::Pending);
    }

    pub(crate) fn mark_resolved(&mut self, item: &WorkItem) {
        if let Some(state) = self.items.get_mut(item) {
            *state = ItemState::Resolved;
        }
    }
}
