//! The element capability and the types that carry it.
//!
//! - [`ModelElement`] is the minimal capability every element has: identity,
//!   name and kind.
//! - [`Element`] owns any element that can be bound in a namespace.
//! - [`ElementView`] borrows any element reachable from a namespace,
//!   including block parts.
//! - [`ElementRef`] is a non-owning handle used for relationship endpoints
//!   and block references; it is resolved by identity.

use std::fmt;

use uuid::Uuid;

use crate::domain::{
    Block, ConstraintBlock, Container, ElementKind, Error, Package, Relationship, Requirement,
    Result, Stereotype,
};

/// Capability shared by every model element.
pub trait ModelElement {
    /// The element's immutable, process-unique identity.
    fn id(&self) -> Uuid;

    /// The element's display name.
    fn name(&self) -> &str;

    /// The element's kind.
    fn kind(&self) -> ElementKind;

    /// The element's display tag, e.g. `«block»`.
    fn stereotype(&self) -> Stereotype {
        self.kind().stereotype()
    }

    /// A non-owning handle to this element.
    fn handle(&self) -> ElementRef {
        ElementRef {
            id: self.id(),
            kind: self.kind(),
            name: self.name().to_string(),
        }
    }
}

/// Renders an element as `«stereotype» name`.
pub(crate) fn render<E: ModelElement + ?Sized>(
    element: &E,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    write!(f, "{} {}", element.stereotype(), element.name())
}

/// A weak, by-identity handle to an element.
///
/// The handle remembers the kind and the name the element had when the
/// handle was taken, for display. It never keeps the element alive; use
/// [`Model::resolve`](crate::Model::resolve) to dereference it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef {
    id: Uuid,
    kind: ElementKind,
    name: String,
}

impl ModelElement for ElementRef {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ElementKind {
        self.kind
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(self, f)
    }
}

/// Any element that can be owned by a namespace.
#[derive(Debug, PartialEq)]
pub enum Element {
    /// A nested namespace.
    Package(Package),
    /// A structural block.
    Block(Block),
    /// A constraint block.
    ///
    /// Namespaces refuse these; they live in a block's constraints.
    ConstraintBlock(ConstraintBlock),
    /// A requirement.
    Requirement(Requirement),
    /// A validated relationship.
    Relationship(Relationship),
}

impl Element {
    /// Borrows the element as a view.
    #[must_use]
    pub const fn view(&self) -> ElementView<'_> {
        match self {
            Self::Package(package) => ElementView::Package(package),
            Self::Block(block) => ElementView::Block(block),
            Self::ConstraintBlock(constraint) => ElementView::ConstraintBlock(constraint),
            Self::Requirement(requirement) => ElementView::Requirement(requirement),
            Self::Relationship(relationship) => ElementView::Relationship(relationship),
        }
    }

    /// Returns the package, if this is one.
    #[must_use]
    pub const fn as_package(&self) -> Option<&Package> {
        match self {
            Self::Package(package) => Some(package),
            _ => None,
        }
    }

    /// Returns the package mutably, if this is one.
    pub const fn as_package_mut(&mut self) -> Option<&mut Package> {
        match self {
            Self::Package(package) => Some(package),
            _ => None,
        }
    }

    /// Returns the block, if this is one.
    #[must_use]
    pub const fn as_block(&self) -> Option<&Block> {
        match self {
            Self::Block(block) => Some(block),
            _ => None,
        }
    }

    /// Returns the block mutably, if this is one.
    pub const fn as_block_mut(&mut self) -> Option<&mut Block> {
        match self {
            Self::Block(block) => Some(block),
            _ => None,
        }
    }

    /// Returns the requirement, if this is one.
    #[must_use]
    pub const fn as_requirement(&self) -> Option<&Requirement> {
        match self {
            Self::Requirement(requirement) => Some(requirement),
            _ => None,
        }
    }

    /// Returns the relationship, if this is one.
    #[must_use]
    pub const fn as_relationship(&self) -> Option<&Relationship> {
        match self {
            Self::Relationship(relationship) => Some(relationship),
            _ => None,
        }
    }
}

impl ModelElement for Element {
    fn id(&self) -> Uuid {
        self.view().id()
    }

    fn name(&self) -> &str {
        match self {
            Self::Package(package) => package.name(),
            Self::Block(block) => block.name(),
            Self::ConstraintBlock(constraint) => constraint.name(),
            Self::Requirement(requirement) => requirement.name(),
            Self::Relationship(relationship) => relationship.name(),
        }
    }

    fn kind(&self) -> ElementKind {
        self.view().kind()
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(self, f)
    }
}

impl From<Package> for Element {
    fn from(package: Package) -> Self {
        Self::Package(package)
    }
}

impl From<Block> for Element {
    fn from(block: Block) -> Self {
        Self::Block(block)
    }
}

impl From<ConstraintBlock> for Element {
    fn from(constraint: ConstraintBlock) -> Self {
        Self::ConstraintBlock(constraint)
    }
}

impl From<Requirement> for Element {
    fn from(requirement: Requirement) -> Self {
        Self::Requirement(requirement)
    }
}

impl From<Relationship> for Element {
    fn from(relationship: Relationship) -> Self {
        Self::Relationship(relationship)
    }
}

impl TryFrom<Element> for Block {
    type Error = Error;

    fn try_from(element: Element) -> Result<Self> {
        match element {
            Element::Block(block) => Ok(block),
            other => Err(Error::invalid_type(
                other,
                Container::BlockParts.expectation(),
            )),
        }
    }
}

impl TryFrom<Element> for ConstraintBlock {
    type Error = Error;

    fn try_from(element: Element) -> Result<Self> {
        match element {
            Element::ConstraintBlock(constraint) => Ok(constraint),
            other => Err(Error::invalid_type(
                other,
                Container::BlockConstraints.expectation(),
            )),
        }
    }
}

impl TryFrom<Element> for Package {
    type Error = Error;

    fn try_from(element: Element) -> Result<Self> {
        match element {
            Element::Package(package) => Ok(package),
            other => Err(Error::invalid_type(other, "a package")),
        }
    }
}

impl TryFrom<Element> for Requirement {
    type Error = Error;

    fn try_from(element: Element) -> Result<Self> {
        match element {
            Element::Requirement(requirement) => Ok(requirement),
            other => Err(Error::invalid_type(other, "a requirement")),
        }
    }
}

impl TryFrom<Element> for Relationship {
    type Error = Error;

    fn try_from(element: Element) -> Result<Self> {
        match element {
            Element::Relationship(relationship) => Ok(relationship),
            other => Err(Error::invalid_type(other, "a relationship")),
        }
    }
}

/// A borrowed view of any element reachable from a namespace.
///
/// Unlike [`Element`], a view can also point at a block part or a block's
/// constraint, which are owned by their block rather than by a namespace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementView<'a> {
    /// A package.
    Package(&'a Package),
    /// A block, either bound in a namespace or a part of another block.
    Block(&'a Block),
    /// A constraint block owned by a block.
    ConstraintBlock(&'a ConstraintBlock),
    /// A requirement.
    Requirement(&'a Requirement),
    /// A relationship.
    Relationship(&'a Relationship),
}

impl<'a> ElementView<'a> {
    /// Returns the requirement, if this is one.
    #[must_use]
    pub const fn as_requirement(self) -> Option<&'a Requirement> {
        match self {
            Self::Requirement(requirement) => Some(requirement),
            _ => None,
        }
    }

    /// Returns the block, if this is one.
    #[must_use]
    pub const fn as_block(self) -> Option<&'a Block> {
        match self {
            Self::Block(block) => Some(block),
            _ => None,
        }
    }

    /// Returns the relationship, if this is one.
    #[must_use]
    pub const fn as_relationship(self) -> Option<&'a Relationship> {
        match self {
            Self::Relationship(relationship) => Some(relationship),
            _ => None,
        }
    }
}

impl ModelElement for ElementView<'_> {
    fn id(&self) -> Uuid {
        match self {
            Self::Package(package) => package.id(),
            Self::Block(block) => block.id(),
            Self::ConstraintBlock(constraint) => constraint.id(),
            Self::Requirement(requirement) => requirement.id(),
            Self::Relationship(relationship) => relationship.id(),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Package(package) => package.name(),
            Self::Block(block) => block.name(),
            Self::ConstraintBlock(constraint) => constraint.name(),
            Self::Requirement(requirement) => requirement.name(),
            Self::Relationship(relationship) => relationship.name(),
        }
    }

    fn kind(&self) -> ElementKind {
        match self {
            Self::Package(package) => package.kind(),
            Self::Block(block) => block.kind(),
            Self::ConstraintBlock(constraint) => constraint.kind(),
            Self::Requirement(requirement) => requirement.kind(),
            Self::Relationship(relationship) => relationship.kind(),
        }
    }
}

impl fmt::Display for ElementView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(self, f)
    }
}
