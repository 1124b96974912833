//! Schema nodes.
//!
//! A node is a common header (name, owning module, parent link, flags,
//! conditions) plus a closed [`NodeData`] variant with the kind-specific part.

use std::fmt;

use crate::base::{ModuleId, Name, NodeId, TypeId, TypedefId};
use crate::feature::IfFeatureExpr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Container,
    List,
    Leaf,
    LeafList,
    Choice,
    Case,
    AnyXml,
    AnyData,
    Uses,
    Grouping,
    Augment,
    Rpc,
    Action,
    Input,
    Output,
    Notification,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Container => "container",
            NodeKind::List => "list",
            NodeKind::Leaf => "leaf",
            NodeKind::LeafList => "leaf-list",
            NodeKind::Choice => "choice",
            NodeKind::Case => "case",
            NodeKind::AnyXml => "anyxml",
            NodeKind::AnyData => "anydata",
            NodeKind::Uses => "uses",
            NodeKind::Grouping => "grouping",
            NodeKind::Augment => "augment",
            NodeKind::Rpc => "rpc",
            NodeKind::Action => "action",
            NodeKind::Input => "input",
            NodeKind::Output => "output",
            NodeKind::Notification => "notification",
        }
    }

    /// Nodes that exist in instance data.
    pub fn is_data(self) -> bool {
        matches!(
            self,
            NodeKind::Container
                | NodeKind::List
                | NodeKind::Leaf
                | NodeKind::LeafList
                | NodeKind::AnyXml
                | NodeKind::AnyData
        )
    }

    /// Kinds allowed directly under a `choice` (short-hand cases included).
    pub fn is_case_member(self) -> bool {
        matches!(
            self,
            NodeKind::Case
                | NodeKind::Container
                | NodeKind::List
                | NodeKind::Leaf
                | NodeKind::LeafList
                | NodeKind::AnyXml
                | NodeKind::AnyData
                | NodeKind::Choice
        )
    }

    /// Operation roots: config is meaningless below these.
    pub fn is_operation(self) -> bool {
        matches!(
            self,
            NodeKind::Rpc
                | NodeKind::Action
                | NodeKind::Input
                | NodeKind::Output
                | NodeKind::Notification
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Status {
    #[default]
    Current,
    Deprecated,
    Obsolete,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Current => "current",
            Status::Deprecated => "deprecated",
            Status::Obsolete => "obsolete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Must {
    pub expr: String,
    pub error_message: Option<String>,
}

impl Must {
    pub fn new(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            error_message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct When {
    pub expr: String,
}

/// One `refine` inside a `uses`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refine {
    /// Descendant schema-nodeid relative to the `uses`.
    pub target: Name,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub config: Option<bool>,
    pub defaults: Vec<String>,
    pub mandatory: Option<bool>,
    pub presence: Option<String>,
    pub min_elements: Option<u32>,
    pub max_elements: Option<u32>,
    pub musts: Vec<Must>,
    /// Raw `if-feature` arguments, compiled when the refine is applied.
    pub if_features: Vec<Name>,
}

impl Refine {
    pub fn new(target: Name) -> Self {
        Self {
            target,
            description: None,
            reference: None,
            config: None,
            defaults: Vec::new(),
            mandatory: None,
            presence: None,
            min_elements: None,
            max_elements: None,
            musts: Vec::new(),
            if_features: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerData {
    pub presence: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListData {
    /// The `key` argument as written.
    pub key_names: Option<Name>,
    pub keys: Vec<NodeId>,
    /// `unique` arguments as written.
    pub unique_specs: Vec<String>,
    pub uniques: Vec<Vec<NodeId>>,
    pub min_elements: u32,
    pub max_elements: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafData {
    pub ty: TypeId,
    pub default: Option<String>,
    pub units: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafListData {
    pub ty: TypeId,
    pub defaults: Vec<String>,
    pub units: Option<String>,
    pub min_elements: u32,
    pub max_elements: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceData {
    pub default_name: Option<Name>,
    pub default_case: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsesData {
    pub grouping_name: Name,
    pub grouping: Option<NodeId>,
    pub refines: Vec<Refine>,
    /// Nested `augment` nodes, applied after expansion.
    pub augments: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingData {
    /// Nested uses and type derivations in the subtree still unresolved.
    pub pending: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentData {
    pub target_path: Name,
    pub target: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Container(ContainerData),
    List(ListData),
    Leaf(LeafData),
    LeafList(LeafListData),
    Choice(ChoiceData),
    Case,
    AnyXml,
    AnyData,
    Uses(UsesData),
    Grouping(GroupingData),
    Augment(AugmentData),
    Rpc,
    Action,
    Input,
    Output,
    Notification,
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Container(_) => NodeKind::Container,
            NodeData::List(_) => NodeKind::List,
            NodeData::Leaf(_) => NodeKind::Leaf,
            NodeData::LeafList(_) => NodeKind::LeafList,
            NodeData::Choice(_) => NodeKind::Choice,
            NodeData::Case => NodeKind::Case,
            NodeData::AnyXml => NodeKind::AnyXml,
            NodeData::AnyData => NodeKind::AnyData,
            NodeData::Uses(_) => NodeKind::Uses,
            NodeData::Grouping(_) => NodeKind::Grouping,
            NodeData::Augment(_) => NodeKind::Augment,
            NodeData::Rpc => NodeKind::Rpc,
            NodeData::Action => NodeKind::Action,
            NodeData::Input => NodeKind::Input,
            NodeData::Output => NodeKind::Output,
            NodeData::Notification => NodeKind::Notification,
        }
    }

    pub fn container() -> Self {
        NodeData::Container(ContainerData::default())
    }

    pub fn list(keys: Option<Name>) -> Self {
        NodeData::List(ListData {
            key_names: keys,
            ..ListData::default()
        })
    }

    pub fn leaf(ty: TypeId) -> Self {
        NodeData::Leaf(LeafData {
            ty,
            default: None,
            units: None,
        })
    }

    pub fn leaf_list(ty: TypeId) -> Self {
        NodeData::LeafList(LeafListData {
            ty,
            defaults: Vec::new(),
            units: None,
            min_elements: 0,
            max_elements: None,
        })
    }

    pub fn choice(default: Option<Name>) -> Self {
        NodeData::Choice(ChoiceData {
            default_name: default,
            default_case: None,
        })
    }

    pub fn uses(grouping: Name) -> Self {
        NodeData::Uses(UsesData {
            grouping_name: grouping,
            grouping: None,
            refines: Vec::new(),
            augments: Vec::new(),
        })
    }

    pub fn grouping() -> Self {
        NodeData::Grouping(GroupingData::default())
    }

    pub fn augment(target: Name) -> Self {
        NodeData::Augment(AugmentData {
            target_path: target,
            target: None,
        })
    }

    /// The type of a leaf or leaf-list.
    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            NodeData::Leaf(leaf) => Some(leaf.ty),
            NodeData::LeafList(leaf_list) => Some(leaf_list.ty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
    pub name: Name,
    pub module: ModuleId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Explicit `config`; `None` inherits.
    pub config: Option<bool>,
    /// Explicit `status`; `None` inherits.
    pub status: Option<Status>,
    pub mandatory: bool,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub if_features: Vec<IfFeatureExpr>,
    pub when: Option<When>,
    pub musts: Vec<Must>,
    pub typedefs: Vec<TypedefId>,
    /// Source line reported in diagnostics, 0 when unknown.
    pub line: u32,
    pub data: NodeData,
}

impl SchemaNode {
    pub(crate) fn new(name: Name, module: ModuleId, parent: Option<NodeId>, data: NodeData) -> Self {
        Self {
            name,
            module,
            parent,
            children: Vec::new(),
            config: None,
            status: None,
            mandatory: false,
            description: None,
            reference: None,
            if_features: Vec::new(),
            when: None,
            musts: Vec::new(),
            typedefs: Vec::new(),
            line: 0,
            data,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn list(&self) -> Option<&ListData> {
        match &self.data {
            NodeData::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn uses(&self) -> Option<&UsesData> {
        match &self.data {
            NodeData::Uses(uses) => Some(uses),
            _ => None,
        }
    }

    pub fn grouping(&self) -> Option<&GroupingData> {
        match &self.data {
            NodeData::Grouping(grouping) => Some(grouping),
            _ => None,
        }
    }

    pub fn augment(&self) -> Option<&AugmentData> {
        match &self.data {
            NodeData::Augment(augment) => Some(augment),
            _ => None,
        }
    }

    pub fn choice(&self) -> Option<&ChoiceData> {
        match &self.data {
            NodeData::Choice(choice) => Some(choice),
            _ => None,
        }
    }

    pub fn type_id(&self) -> Option<TypeId> {
        self.data.type_id()
    }

    /// Defaults of a leaf, leaf-list or choice, as written.
    pub fn defaults(&self) -> Vec<&str> {
        match &self.data {
            NodeData::Leaf(leaf) => leaf.default.iter().map(String::as_str).collect(),
            NodeData::LeafList(leaf_list) => leaf_list.defaults.iter().map(String::as_str).collect(),
            NodeData::Choice(choice) => choice.default_name.iter().map(|n| n.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// `min-elements` / `max-elements` of a list or leaf-list.
    pub fn element_bounds(&self) -> Option<(u32, Option<u32>)> {
        match &self.data {
            NodeData::List(list) => Some((list.min_elements, list.max_elements)),
            NodeData::LeafList(leaf_list) => Some((leaf_list.min_elements, leaf_list.max_elements)),
            _ => None,
        }
    }

    pub(crate) fn set_element_bounds(&mut self, min: Option<u32>, max: Option<u32>) {
        let (min_slot, max_slot) = match &mut self.data {
            NodeData::List(list) => (&mut list.min_elements, &mut list.max_elements),
            NodeData::LeafList(leaf_list) => {
                (&mut leaf_list.min_elements, &mut leaf_list.max_elements)
            }
            _ => return,
        };
        if let Some(min) = min {
            *min_slot = min;
        }
        if let Some(max) = max {
            *max_slot = Some(max);
        }
    }
}
