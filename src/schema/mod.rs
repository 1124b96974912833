//! The schema graph.
//!
//! Every entity lives in an arena owned by [`Context`] and is addressed by a
//! handle from [`crate::base`]. Parent links, leafref targets, identity bases
//! and grouping references are handles too, so the graph may be cyclic.
//!
//! ```text
//! Context
//!   ├── modules    Module      (imports, includes, top-level nodes, deviations)
//!   ├── nodes      SchemaNode  (header + NodeData variant)
//!   ├── types      TypeSpec    (one per `type` statement)
//!   ├── typedefs   Typedef
//!   ├── identities Identity
//!   └── features   Feature
//! ```

mod context;
mod defs;
mod deviation;
mod module;
mod node;
mod path;
mod pattern;
mod types;

pub use context::Context;
pub use defs::{Feature, FeatureOwner, Identity, Typedef};
pub use deviation::{Deviate, DeviateKind, Deviation};
pub use module::{Import, Module, YangVersion};
pub use node::{
    AugmentData, ChoiceData, ContainerData, GroupingData, LeafData, LeafListData, ListData, Must,
    NodeData, NodeKind, Refine, SchemaNode, Status, UsesData, When,
};
pub use pattern::Pattern;
pub use types::{
    BaseType, BitValue, EnumValue, Interval, RangeSet, Restrictions, TypeOwner, TypeSpec,
    check_binary_value, check_bits_value, parse_number,
};
