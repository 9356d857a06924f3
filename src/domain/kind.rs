use std::fmt;

/// The closed set of element kinds known to the metamodel.
///
/// Every table that reasons about kinds (stereotypes, default names,
/// container admissibility, relationship roles) matches on this enum
/// exhaustively, so adding a kind forces each of them to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKind {
    /// The root namespace.
    Model,
    /// A nested namespace.
    Package,
    /// A structural block.
    Block,
    /// A constraint applied to a block's values.
    ConstraintBlock,
    /// A textual requirement.
    Requirement,
    /// An unconstrained client/supplier dependency.
    Dependency,
    /// A requirement derived from another requirement.
    DeriveReqt,
    /// An element satisfying a requirement.
    Satisfy,
    /// An element verifying a requirement.
    Verify,
    /// An element refining a requirement.
    Refine,
}

impl ElementKind {
    /// The lower-camel-cased kind name used as the stereotype.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Package => "package",
            Self::Block => "block",
            Self::ConstraintBlock => "constraintBlock",
            Self::Requirement => "requirement",
            Self::Dependency => "dependency",
            Self::DeriveReqt => "deriveReqt",
            Self::Satisfy => "satisfy",
            Self::Verify => "verify",
            Self::Refine => "refine",
        }
    }

    /// The display tag for this kind, e.g. `«block»`.
    #[must_use]
    pub const fn stereotype(self) -> Stereotype {
        Stereotype(self)
    }

    /// Prefix used when generating a default name (`block` in `block1`).
    #[must_use]
    pub fn default_name_prefix(self) -> String {
        self.as_str().to_lowercase()
    }

    /// Whether elements of this kind are relationships.
    #[must_use]
    pub const fn is_relationship(self) -> bool {
        match self {
            Self::Dependency | Self::DeriveReqt | Self::Satisfy | Self::Verify | Self::Refine => {
                true
            }
            Self::Model
            | Self::Package
            | Self::Block
            | Self::ConstraintBlock
            | Self::Requirement => false,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A kind rendered between guillemets, e.g. `«deriveReqt»`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stereotype(ElementKind);

impl Stereotype {
    /// The kind this stereotype denotes.
    #[must_use]
    pub const fn kind(self) -> ElementKind {
        self.0
    }
}

impl fmt::Display for Stereotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\u{ab}{}\u{bb}", self.0)
    }
}

/// The places an element can be owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    /// The root namespace of a model.
    Model,
    /// A package namespace.
    Package,
    /// The `parts` of a block.
    BlockParts,
    /// The `constraints` of a block.
    BlockConstraints,
}

impl Container {
    /// Whether this container accepts elements of the given kind.
    #[must_use]
    pub const fn admits(self, kind: ElementKind) -> bool {
        match self {
            Self::Model | Self::Package => match kind {
                ElementKind::Package
                | ElementKind::Block
                | ElementKind::Requirement
                | ElementKind::Dependency
                | ElementKind::DeriveReqt
                | ElementKind::Satisfy
                | ElementKind::Verify
                | ElementKind::Refine => true,
                ElementKind::Model | ElementKind::ConstraintBlock => false,
            },
            Self::BlockParts => matches!(kind, ElementKind::Block),
            Self::BlockConstraints => matches!(kind, ElementKind::ConstraintBlock),
        }
    }

    /// Human-readable description of what the container accepts, used in
    /// error messages.
    #[must_use]
    pub const fn expectation(self) -> &'static str {
        match self {
            Self::Model | Self::Package => "a package, block, requirement or relationship",
            Self::BlockParts => "a block",
            Self::BlockConstraints => "a constraint block",
        }
    }
}
