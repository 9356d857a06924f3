//! Domain model for SysML-style system models.
//!
//! This module contains the element kinds, the structural and requirement
//! elements, the relationships between them, the namespaces that own them,
//! and the traceability queries over a model.

mod kind;
pub use kind::{Container, ElementKind, Stereotype};

mod error;
pub use error::{Error, Result};

mod config;
pub use config::Config;

/// Element identities, default names and requirement identifiers.
pub mod identity;
pub use identity::{new_identity, Namer};

/// The element capability and its owning, borrowed and weak forms.
pub mod element;
pub use element::{Element, ElementRef, ElementView, ModelElement};

/// Requirements and their identifiers.
pub mod requirement;
pub use requirement::{Identifier, Requirement, RequirementBuilder, RequirementId};

mod constraint;
pub use constraint::ConstraintBlock;

/// Structural blocks, multiplicities and value properties.
pub mod block;
pub use block::{Block, BlockBuilder, Multiplicity, ValueType};

/// Validated client/supplier relationships.
pub mod relationship;
pub use relationship::{Relationship, RelationshipKind, Role};

mod registry;
pub use registry::{Namespace, Registry};

mod package;
pub use package::{Package, PackageBuilder};

mod model;
pub use model::Model;

/// Requirements traceability over a namespace.
pub mod trace;
pub use trace::{MatrixRow, Trace, TraceEntry};
