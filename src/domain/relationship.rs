//! Dependency relationships and their role constraints.
//!
//! A [`Relationship`] is validated once, at construction, against a static
//! table of which element kinds may occupy each role. Once built it is
//! immutable, and is itself an element that can be bound in a namespace.

use std::fmt;

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::{
    identity::{Metadata, Namer},
    ElementKind, ElementRef, Error, ModelElement, Result,
};

/// The kinds of dependency relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationshipKind {
    /// The client depends on the supplier. Any elements may take part.
    Dependency,
    /// The client requirement is derived from the supplier requirement.
    DeriveReqt,
    /// The client satisfies the supplier requirement.
    ///
    /// By convention the client is a block, but any element is accepted.
    Satisfy,
    /// The client verifies the supplier requirement.
    Verify,
    /// The client refines the supplier requirement.
    Refine,
}

impl RelationshipKind {
    /// Every relationship kind.
    pub const ALL: [Self; 5] = [
        Self::Dependency,
        Self::DeriveReqt,
        Self::Satisfy,
        Self::Verify,
        Self::Refine,
    ];

    /// The element kind of relationships of this kind.
    #[must_use]
    pub const fn element_kind(self) -> ElementKind {
        match self {
            Self::Dependency => ElementKind::Dependency,
            Self::DeriveReqt => ElementKind::DeriveReqt,
            Self::Satisfy => ElementKind::Satisfy,
            Self::Verify => ElementKind::Verify,
            Self::Refine => ElementKind::Refine,
        }
    }

    /// The kind an endpoint must have to occupy `role`, or `None` if any
    /// element is accepted.
    #[must_use]
    pub const fn required(self, role: Role) -> Option<ElementKind> {
        match (self, role) {
            (Self::Dependency, Role::Client | Role::Supplier)
            | (Self::Satisfy | Self::Verify | Self::Refine, Role::Client) => None,
            (Self::DeriveReqt, Role::Client | Role::Supplier)
            | (Self::Satisfy | Self::Verify | Self::Refine, Role::Supplier) => {
                Some(ElementKind::Requirement)
            }
        }
    }

    /// Checks proposed endpoint kinds against the role table.
    ///
    /// The client is checked before the supplier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRelationship`] naming the first role whose
    /// endpoint has the wrong kind.
    pub fn check(self, client: ElementKind, supplier: ElementKind) -> Result<()> {
        for (role, found) in [(Role::Client, client), (Role::Supplier, supplier)] {
            if let Some(expected) = self.required(role) {
                if expected != found {
                    return Err(Error::InvalidRelationship {
                        relationship: self,
                        role,
                        expected,
                        found,
                    });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.element_kind().fmt(f)
    }
}

impl TryFrom<ElementKind> for RelationshipKind {
    type Error = Error;

    fn try_from(kind: ElementKind) -> Result<Self> {
        match kind {
            ElementKind::Dependency => Ok(Self::Dependency),
            ElementKind::DeriveReqt => Ok(Self::DeriveReqt),
            ElementKind::Satisfy => Ok(Self::Satisfy),
            ElementKind::Verify => Ok(Self::Verify),
            ElementKind::Refine => Ok(Self::Refine),
            ElementKind::Model
            | ElementKind::Package
            | ElementKind::Block
            | ElementKind::ConstraintBlock
            | ElementKind::Requirement => Err(Error::invalid_type(kind, "a relationship kind")),
        }
    }
}

/// The two ends of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// The dependent end.
    Client,
    /// The end depended upon.
    Supplier,
}

impl Role {
    /// The other end.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Client => Self::Supplier,
            Self::Supplier => Self::Client,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Client => "client",
            Self::Supplier => "supplier",
        })
    }
}

/// A validated, immutable relationship between a client and a supplier.
///
/// Endpoints are held as weak [`ElementRef`] handles: removing an endpoint
/// from its namespace leaves the relationship intact, and resolving the
/// dangling handle fails with [`Error::NotFound`].
#[derive(Debug, PartialEq, Eq)]
pub struct Relationship {
    meta: Metadata,
    kind: RelationshipKind,
    client: ElementRef,
    supplier: ElementRef,
}

impl Relationship {
    /// Proposes a relationship and validates its endpoints.
    ///
    /// The relationship receives a fresh identity and a generated name such
    /// as `derivereqt1`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRelationship`] if either endpoint has the
    /// wrong kind for its role. No name is generated on failure.
    #[instrument(skip_all, fields(%kind, client = %client.handle(), supplier = %supplier.handle()))]
    pub fn new<C, S>(
        kind: RelationshipKind,
        client: &C,
        supplier: &S,
        namer: &mut Namer,
    ) -> Result<Self>
    where
        C: ModelElement + ?Sized,
        S: ModelElement + ?Sized,
    {
        kind.check(client.kind(), supplier.kind())
            .inspect_err(|err| debug!(%err, "rejected relationship"))?;
        let meta = Metadata::new(kind.element_kind(), None, namer)?;
        debug!(name = %meta.name, "created relationship");
        Ok(Self {
            meta,
            kind,
            client: client.handle(),
            supplier: supplier.handle(),
        })
    }

    /// A plain dependency of `client` on `supplier`.
    ///
    /// # Errors
    ///
    /// Never fails for well-formed elements; see [`Relationship::new`].
    pub fn dependency<C, S>(client: &C, supplier: &S, namer: &mut Namer) -> Result<Self>
    where
        C: ModelElement + ?Sized,
        S: ModelElement + ?Sized,
    {
        Self::new(RelationshipKind::Dependency, client, supplier, namer)
    }

    /// `client` is derived from `supplier`; both must be requirements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRelationship`] unless both are requirements.
    pub fn derive_reqt<C, S>(client: &C, supplier: &S, namer: &mut Namer) -> Result<Self>
    where
        C: ModelElement + ?Sized,
        S: ModelElement + ?Sized,
    {
        Self::new(RelationshipKind::DeriveReqt, client, supplier, namer)
    }

    /// `client` satisfies the `supplier` requirement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRelationship`] unless `supplier` is a
    /// requirement.
    pub fn satisfy<C, S>(client: &C, supplier: &S, namer: &mut Namer) -> Result<Self>
    where
        C: ModelElement + ?Sized,
        S: ModelElement + ?Sized,
    {
        Self::new(RelationshipKind::Satisfy, client, supplier, namer)
    }

    /// `client` verifies the `supplier` requirement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRelationship`] unless `supplier` is a
    /// requirement.
    pub fn verify<C, S>(client: &C, supplier: &S, namer: &mut Namer) -> Result<Self>
    where
        C: ModelElement + ?Sized,
        S: ModelElement + ?Sized,
    {
        Self::new(RelationshipKind::Verify, client, supplier, namer)
    }

    /// `client` refines the `supplier` requirement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRelationship`] unless `supplier` is a
    /// requirement.
    pub fn refine<C, S>(client: &C, supplier: &S, namer: &mut Namer) -> Result<Self>
    where
        C: ModelElement + ?Sized,
        S: ModelElement + ?Sized,
    {
        Self::new(RelationshipKind::Refine, client, supplier, namer)
    }

    /// The kind of relationship.
    #[must_use]
    pub const fn relationship_kind(&self) -> RelationshipKind {
        self.kind
    }

    /// The dependent end.
    #[must_use]
    pub const fn client(&self) -> &ElementRef {
        &self.client
    }

    /// The end depended upon.
    #[must_use]
    pub const fn supplier(&self) -> &ElementRef {
        &self.supplier
    }

    /// The endpoint in the given role.
    #[must_use]
    pub const fn endpoint(&self, role: Role) -> &ElementRef {
        match role {
            Role::Client => &self.client,
            Role::Supplier => &self.supplier,
        }
    }

    /// The roles in which the element with identity `id` takes part.
    pub fn roles_of(&self, id: Uuid) -> impl Iterator<Item = Role> + '_ {
        [Role::Client, Role::Supplier]
            .into_iter()
            .filter(move |role| self.endpoint(*role).id() == id)
    }
}

impl ModelElement for Relationship {
    fn id(&self) -> Uuid {
        self.meta.uuid
    }

    fn name(&self) -> &str {
        self.meta.name.as_str()
    }

    fn kind(&self) -> ElementKind {
        self.kind.element_kind()
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::domain::element::render(self, f)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::{Block, ElementKind as Kind, Requirement};

    fn requirement(name: &str, namer: &mut Namer) -> Requirement {
        Requirement::builder().name(name).build(namer).unwrap()
    }

    fn block(name: &str, namer: &mut Namer) -> Block {
        Block::builder().name(name).build(namer).unwrap()
    }

    #[test]
    fn derive_reqt_between_requirements() {
        let mut namer = Namer::default();
        let top = requirement("Top-level", &mut namer);
        let functional = requirement("Functional", &mut namer);

        let derive = Relationship::derive_reqt(&functional, &top, &mut namer).unwrap();

        assert_eq!(derive.to_string(), "«deriveReqt» derivereqt1");
        assert_eq!(derive.client().to_string(), "«requirement» Functional");
        assert_eq!(derive.supplier().to_string(), "«requirement» Top-level");
        assert_eq!(derive.stereotype().to_string(), "«deriveReqt»");
    }

    #[test]
    fn derive_reqt_rejects_a_block_client() {
        let mut namer = Namer::default();
        let top = requirement("Top-level", &mut namer);
        let warp_drive = block("Warp Drive", &mut namer);

        let err = Relationship::derive_reqt(&warp_drive, &top, &mut namer).unwrap_err();

        assert_eq!(
            err,
            Error::InvalidRelationship {
                relationship: RelationshipKind::DeriveReqt,
                role: Role::Client,
                expected: ElementKind::Requirement,
                found: ElementKind::Block,
            }
        );
        assert_eq!(namer.issued(ElementKind::DeriveReqt), 0);
    }

    #[test]
    fn satisfy_accepts_any_client() {
        let mut namer = Namer::default();
        let functional = requirement("Functional", &mut namer);
        let warp_drive = block("Class-7 Warp Drive", &mut namer);

        let satisfy = Relationship::satisfy(&warp_drive, &functional, &mut namer).unwrap();
        assert_eq!(satisfy.stereotype().to_string(), "«satisfy»");
        assert_eq!(satisfy.client().kind(), ElementKind::Block);
        assert_eq!(satisfy.supplier().kind(), ElementKind::Requirement);

        let by_requirement = Relationship::satisfy(&functional, &functional, &mut namer);
        assert!(by_requirement.is_ok());
    }

    #[test]
    fn satisfy_with_reversed_roles_is_rejected() {
        let mut namer = Namer::default();
        let functional = requirement("Functional", &mut namer);
        let warp_drive = block("Class-7 Warp Drive", &mut namer);

        let err = Relationship::satisfy(&functional, &warp_drive, &mut namer).unwrap_err();

        assert_eq!(
            err,
            Error::InvalidRelationship {
                relationship: RelationshipKind::Satisfy,
                role: Role::Supplier,
                expected: ElementKind::Requirement,
                found: ElementKind::Block,
            }
        );
        assert_eq!(
            err.to_string(),
            "the supplier of a satisfy relationship must be a requirement, not a block"
        );
    }

    #[test_case(RelationshipKind::Dependency, Kind::Block, Kind::Package, true)]
    #[test_case(RelationshipKind::DeriveReqt, Kind::Requirement, Kind::Requirement, true)]
    #[test_case(RelationshipKind::DeriveReqt, Kind::Requirement, Kind::Block, false)]
    #[test_case(RelationshipKind::Satisfy, Kind::Package, Kind::Requirement, true)]
    #[test_case(RelationshipKind::Verify, Kind::Block, Kind::Requirement, true)]
    #[test_case(RelationshipKind::Verify, Kind::Requirement, Kind::Block, false)]
    #[test_case(RelationshipKind::Refine, Kind::Satisfy, Kind::Requirement, true)]
    fn role_table(
        kind: RelationshipKind,
        client: ElementKind,
        supplier: ElementKind,
        accepted: bool,
    ) {
        assert_eq!(kind.check(client, supplier).is_ok(), accepted);
    }

    #[test]
    fn kinds_convert_to_and_from_element_kinds() {
        for kind in RelationshipKind::ALL {
            assert!(kind.element_kind().is_relationship());
            assert_eq!(RelationshipKind::try_from(kind.element_kind()), Ok(kind));
        }
        assert!(matches!(
            RelationshipKind::try_from(ElementKind::Block),
            Err(Error::InvalidType { .. })
        ));
        assert_eq!(RelationshipKind::Verify.to_string(), "verify");
        assert_eq!(Role::Client.opposite(), Role::Supplier);
    }

    #[test]
    fn relationship_names_are_scoped_per_kind() {
        let mut namer = Namer::default();
        let a = requirement("A", &mut namer);
        let b = requirement("B", &mut namer);

        let first = Relationship::satisfy(&a, &b, &mut namer).unwrap();
        let derive = Relationship::derive_reqt(&a, &b, &mut namer).unwrap();
        let second = Relationship::satisfy(&b, &a, &mut namer).unwrap();

        assert_eq!(first.name(), "satisfy1");
        assert_eq!(derive.name(), "derivereqt1");
        assert_eq!(second.name(), "satisfy2");
    }

    #[test]
    fn roles_of_reports_self_links_twice() {
        let mut namer = Namer::default();
        let a = requirement("A", &mut namer);
        let b = requirement("B", &mut namer);

        let derive = Relationship::derive_reqt(&a, &b, &mut namer).unwrap();
        assert_eq!(derive.roles_of(a.id()).collect::<Vec<_>>(), [Role::Client]);
        assert_eq!(derive.roles_of(b.id()).collect::<Vec<_>>(), [Role::Supplier]);

        let loop_ = Relationship::dependency(&a, &a, &mut namer).unwrap();
        assert_eq!(
            loop_.roles_of(a.id()).collect::<Vec<_>>(),
            [Role::Client, Role::Supplier]
        );
    }
}
