//! In-memory SysML system models
//!
//! A [`Model`] is a tree of namespaces holding structural [`Block`]s,
//! textual [`Requirement`]s and the [`Relationship`]s that trace one to the
//! other. Every element renders as `«stereotype» name`.

pub mod domain;
pub use domain::{
    Block, Config, ConstraintBlock, Element, ElementKind, ElementRef, ElementView, Error, Model,
    ModelElement, Multiplicity, Namer, Namespace, Package, Relationship, RelationshipKind,
    Requirement, Result, Role, Trace, TraceEntry, ValueType,
};
