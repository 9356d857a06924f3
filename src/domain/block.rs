//! Structural blocks.
//!
//! A [`Block`] owns its parts exclusively: removing a part (or dropping the
//! block) tears down the part's own parts with it. References, by contrast,
//! are weak [`ElementRef`] handles to blocks that live elsewhere.

use std::{fmt, num::NonZeroUsize, ops::Index};

use indexmap::{map::Entry, IndexMap};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::{
    identity::{binding_key, Metadata, Namer},
    ConstraintBlock, Element, ElementKind, ElementRef, Error, ModelElement, Result,
};

/// How many instances of a block a part stands for. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Multiplicity(NonZeroUsize);

impl Multiplicity {
    /// A multiplicity of one, the default.
    pub const ONE: Self = Self(NonZeroUsize::MIN);

    /// The multiplicity as an integer.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for Multiplicity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

const MULTIPLICITY_RANGE: &str = "multiplicity must be a positive integer";
const MULTIPLICITY_TYPE: &str = "an integer";
const MULTIPLICITY_OVERFLOW: &str = "multiplicity is too large";

impl TryFrom<usize> for Multiplicity {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self> {
        NonZeroUsize::new(value)
            .map(Self)
            .ok_or_else(|| Error::invalid_value(value, MULTIPLICITY_RANGE))
    }
}

impl TryFrom<i64> for Multiplicity {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        let value =
            usize::try_from(value).map_err(|_| Error::invalid_value(value, MULTIPLICITY_RANGE))?;
        Self::try_from(value)
    }
}

impl TryFrom<i32> for Multiplicity {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        Self::try_from(i64::from(value))
    }
}

impl TryFrom<u32> for Multiplicity {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        Self::try_from(i64::from(value))
    }
}

impl TryFrom<f64> for Multiplicity {
    type Error = Error;

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::float_cmp
    )]
    fn try_from(value: f64) -> Result<Self> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(Error::invalid_type(value, MULTIPLICITY_TYPE));
        }
        if value < 1.0 {
            return Err(Error::invalid_value(value, MULTIPLICITY_RANGE));
        }
        // `usize::MAX as f64` rounds up to a power of two, so it is already
        // out of range.
        if value >= usize::MAX as f64 {
            return Err(Error::invalid_value(value, MULTIPLICITY_OVERFLOW));
        }
        Self::try_from(value as usize)
    }
}

impl TryFrom<&str> for Multiplicity {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        let parsed = value
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::invalid_type(value, MULTIPLICITY_TYPE))?;
        Self::try_from(parsed)
    }
}

/// A value property: a magnitude and its unit.
///
/// Units are opaque to the metamodel; no arithmetic or conversion is
/// performed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueType {
    magnitude: f64,
    unit: String,
}

impl ValueType {
    /// Creates a value with the given magnitude and unit.
    #[must_use]
    pub fn new(magnitude: f64, unit: impl Into<String>) -> Self {
        Self {
            magnitude,
            unit: unit.into(),
        }
    }

    /// The numeric magnitude.
    #[must_use]
    pub const fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// The unit, e.g. `m` or `kg`.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{}", self.magnitude)
        } else {
            write!(f, "{} {}", self.magnitude, self.unit)
        }
    }
}

/// A block is the basic unit of structure in a system model.
///
/// It holds:
/// - parts: blocks it owns exclusively, keyed by name
/// - references: weak links to blocks owned elsewhere
/// - values: named [`ValueType`]s
/// - constraints: named [`ConstraintBlock`]s
/// - a positive [`Multiplicity`]
#[derive(Debug, PartialEq)]
pub struct Block {
    meta: Metadata,
    parts: IndexMap<String, Block>,
    references: Vec<ElementRef>,
    values: IndexMap<String, ValueType>,
    constraints: IndexMap<String, ConstraintBlock>,
    multiplicity: Multiplicity,
}

impl Block {
    /// Starts building a block.
    #[must_use]
    pub fn builder() -> BlockBuilder {
        BlockBuilder::default()
    }

    /// The block's parts, in insertion order.
    #[must_use]
    pub const fn parts(&self) -> &IndexMap<String, Self> {
        &self.parts
    }

    /// Looks up a part by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no part is bound under `name`.
    pub fn part(&self, name: &str) -> Result<&Self> {
        self.parts
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Looks up a part by name, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no part is bound under `name`.
    pub fn part_mut(&mut self, name: &str) -> Result<&mut Self> {
        self.parts
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Adds a part, transferring its ownership to this block.
    ///
    /// The part is bound under `name`, or under its own name if `name` is
    /// `None`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidValue`] if `name` is empty.
    /// - [`Error::DuplicateKey`] if a part is already bound under that name.
    #[instrument(skip(self, part), fields(block = %self.meta.name))]
    pub fn add_part(&mut self, name: Option<&str>, part: Self) -> Result<&mut Self> {
        let key = binding_key(name, part.name())?;
        insert_unique(&mut self.parts, key, part).inspect_err(|err| debug!(%err, "rejected part"))
    }

    /// Adds an arbitrary element as a part.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if the element is not a block, and
    /// otherwise fails as [`Block::add_part`] does.
    pub fn adopt_part(&mut self, name: Option<&str>, element: Element) -> Result<&mut Self> {
        let part = Self::try_from(element)?;
        self.add_part(name, part)
    }

    /// Removes a part and returns it.
    ///
    /// The part's own parts go with it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no part is bound under `name`.
    #[instrument(skip(self), fields(block = %self.meta.name))]
    pub fn remove_part(&mut self, name: &str) -> Result<Self> {
        let part = self
            .parts
            .shift_remove(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        debug!(
            part = name,
            descendants = part.descendants().len(),
            "removed part"
        );
        Ok(part)
    }

    /// All parts of this block, transitively, in depth-first order.
    #[must_use]
    pub fn descendants(&self) -> Vec<&Self> {
        let mut descendants = Vec::new();
        let mut stack: Vec<&Self> = self.parts.values().rev().collect();
        while let Some(part) = stack.pop() {
            descendants.push(part);
            stack.extend(part.parts.values().rev());
        }
        descendants
    }

    /// Adds a weak reference to another block.
    ///
    /// Returns `true` if the reference was added, or `false` if this block
    /// already references an element with the same identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] if `block` is not a block.
    pub fn add_reference<E: ModelElement + ?Sized>(&mut self, block: &E) -> Result<bool> {
        if block.kind() != ElementKind::Block {
            return Err(Error::invalid_type(block.handle(), "a block"));
        }
        if self.references.iter().any(|r| r.id() == block.id()) {
            return Ok(false);
        }
        self.references.push(block.handle());
        Ok(true)
    }

    /// Removes the reference to the block with the given identity.
    ///
    /// Returns `true` if a reference was removed.
    pub fn remove_reference(&mut self, id: Uuid) -> bool {
        let before = self.references.len();
        self.references.retain(|r| r.id() != id);
        before != self.references.len()
    }

    /// The block's references, in the order they were added.
    #[must_use]
    pub fn references(&self) -> &[ElementRef] {
        &self.references
    }

    /// Adds a named value property.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidValue`] if `name` is empty.
    /// - [`Error::DuplicateKey`] if a value is already bound under `name`.
    pub fn add_value(&mut self, name: &str, value: ValueType) -> Result<&mut ValueType> {
        let key = binding_key(Some(name), name)?;
        insert_unique(&mut self.values, key, value)
    }

    /// The block's value properties, in insertion order.
    #[must_use]
    pub const fn values(&self) -> &IndexMap<String, ValueType> {
        &self.values
    }

    /// Adds a constraint block.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidValue`] if `name` is empty.
    /// - [`Error::DuplicateKey`] if a constraint is already bound under that
    ///   name.
    pub fn add_constraint(
        &mut self,
        name: Option<&str>,
        constraint: ConstraintBlock,
    ) -> Result<&mut ConstraintBlock> {
        let key = binding_key(name, constraint.name())?;
        insert_unique(&mut self.constraints, key, constraint)
    }

    /// The block's constraints, in insertion order.
    #[must_use]
    pub const fn constraints(&self) -> &IndexMap<String, ConstraintBlock> {
        &self.constraints
    }

    /// The block's multiplicity.
    #[must_use]
    pub const fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    /// Sets the block's multiplicity.
    ///
    /// The current multiplicity is left untouched on failure.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidValue`] if the value is zero or negative.
    /// - [`Error::InvalidType`] if the value is not an integer.
    pub fn set_multiplicity<T>(&mut self, multiplicity: T) -> Result<()>
    where
        T: TryInto<Multiplicity, Error = Error>,
    {
        self.multiplicity = multiplicity.try_into()?;
        Ok(())
    }
}

impl ModelElement for Block {
    fn id(&self) -> Uuid {
        self.meta.uuid
    }

    fn name(&self) -> &str {
        self.meta.name.as_str()
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Block
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::domain::element::render(self, f)
    }
}

/// `block["hull"]` is shorthand for `block.part("hull")`.
///
/// # Panics
///
/// Panics if no part is bound under the name. Use [`Block::part`] for a
/// fallible lookup.
impl Index<&str> for Block {
    type Output = Self;

    fn index(&self, name: &str) -> &Self::Output {
        &self.parts[name]
    }
}

pub(crate) fn insert_unique<V>(
    map: &mut IndexMap<String, V>,
    key: String,
    value: V,
) -> Result<&mut V> {
    match map.entry(key) {
        Entry::Occupied(entry) => Err(Error::DuplicateKey(entry.key().clone())),
        Entry::Vacant(entry) => Ok(entry.insert(value)),
    }
}

/// Builder for [`Block`].
///
/// Nothing is validated until [`BlockBuilder::build`], which either returns a
/// fully valid block or an error without generating any names.
#[derive(Debug)]
pub struct BlockBuilder {
    name: Option<String>,
    multiplicity: Result<Multiplicity>,
    parts: Vec<Block>,
    references: Vec<ElementRef>,
    values: Vec<(String, ValueType)>,
    constraints: Vec<ConstraintBlock>,
}

impl Default for BlockBuilder {
    fn default() -> Self {
        Self {
            name: None,
            multiplicity: Ok(Multiplicity::ONE),
            parts: Vec::new(),
            references: Vec::new(),
            values: Vec::new(),
            constraints: Vec::new(),
        }
    }
}

impl BlockBuilder {
    /// Sets the block's name. A default name is generated otherwise.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the block's multiplicity. Defaults to one.
    #[must_use]
    pub fn multiplicity<T>(mut self, multiplicity: T) -> Self
    where
        T: TryInto<Multiplicity, Error = Error>,
    {
        self.multiplicity = multiplicity.try_into();
        self
    }

    /// Adds a part, bound under its own name.
    #[must_use]
    pub fn part(mut self, part: Block) -> Self {
        self.parts.push(part);
        self
    }

    /// Adds a weak reference to another block.
    #[must_use]
    pub fn reference<E: ModelElement + ?Sized>(mut self, block: &E) -> Self {
        self.references.push(block.handle());
        self
    }

    /// Adds a named value property.
    #[must_use]
    pub fn value(mut self, name: impl Into<String>, value: ValueType) -> Self {
        self.values.push((name.into(), value));
        self
    }

    /// Adds a constraint block, bound under its own name.
    #[must_use]
    pub fn constraint(mut self, constraint: ConstraintBlock) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Builds the block, stamping its identity.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidValue`] for an empty name or a non-positive
    ///   multiplicity.
    /// - [`Error::InvalidType`] for a non-integral multiplicity or a
    ///   reference to something other than a block.
    /// - [`Error::DuplicateKey`] if two parts, values or constraints share a
    ///   name.
    #[instrument(skip(self, namer), fields(name = ?self.name))]
    pub fn build(self, namer: &mut Namer) -> Result<Block> {
        let multiplicity = self.multiplicity?;

        let mut parts = IndexMap::with_capacity(self.parts.len());
        for part in self.parts {
            insert_unique(&mut parts, part.name().to_string(), part)?;
        }

        let mut references: Vec<ElementRef> = Vec::with_capacity(self.references.len());
        for reference in self.references {
            if reference.kind() != ElementKind::Block {
                return Err(Error::invalid_type(reference, "a block"));
            }
            if !references.iter().any(|r| r.id() == reference.id()) {
                references.push(reference);
            }
        }

        let mut values = IndexMap::with_capacity(self.values.len());
        for (name, value) in self.values {
            let key = binding_key(Some(name.as_str()), &name)?;
            insert_unique(&mut values, key, value)?;
        }

        let mut constraints = IndexMap::with_capacity(self.constraints.len());
        for constraint in self.constraints {
            insert_unique(&mut constraints, constraint.name().to_string(), constraint)?;
        }

        let meta = Metadata::new(ElementKind::Block, self.name, namer)?;
        debug!(name = %meta.name, parts = parts.len(), "created block");

        Ok(Block {
            meta,
            parts,
            references,
            values,
            constraints,
            multiplicity,
        })
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::Requirement;

    fn block(name: &str, namer: &mut Namer) -> Block {
        Block::builder().name(name).build(namer).unwrap()
    }

    #[test]
    fn removed_part_is_no_longer_found() {
        let mut namer = Namer::default();
        let mut starship = block("Starship", &mut namer);
        starship
            .add_part(Some("hull"), block("Primary Hull", &mut namer))
            .unwrap();

        assert_eq!(starship["hull"].to_string(), "«block» Primary Hull");

        let removed = starship.remove_part("hull").unwrap();
        assert_eq!(removed.name(), "Primary Hull");
        assert_eq!(
            starship.part("hull").unwrap_err(),
            Error::NotFound("hull".to_string())
        );
    }

    #[test]
    fn removing_a_part_takes_its_parts_with_it() {
        let mut namer = Namer::default();
        let mut nacelle = block("Nacelle", &mut namer);
        nacelle
            .add_part(None, block("Bussard Collector", &mut namer))
            .unwrap();
        let mut engineering = block("Engineering Hull", &mut namer);
        engineering.add_part(None, nacelle).unwrap();
        let mut starship = block("Starship", &mut namer);
        starship.add_part(None, engineering).unwrap();

        assert_eq!(starship.descendants().len(), 3);

        let removed = starship.remove_part("Engineering Hull").unwrap();
        assert!(starship.descendants().is_empty());
        assert_eq!(removed.descendants().len(), 2);
    }

    #[test]
    fn descendants_are_depth_first_in_insertion_order() {
        let mut namer = Namer::default();
        let mut a = block("a", &mut namer);
        a.add_part(None, block("a1", &mut namer)).unwrap();
        let mut root = block("root", &mut namer);
        root.add_part(None, a).unwrap();
        root.add_part(None, block("b", &mut namer)).unwrap();

        let names: Vec<_> = root.descendants().iter().map(|b| b.name()).collect();
        assert_eq!(names, ["a", "a1", "b"]);
    }

    #[test]
    fn duplicate_part_name_is_rejected() {
        let mut namer = Namer::default();
        let mut starship = block("Starship", &mut namer);
        starship.add_part(None, block("Pylon", &mut namer)).unwrap();

        let err = starship
            .add_part(None, block("Pylon", &mut namer))
            .unwrap_err();
        assert_eq!(err, Error::DuplicateKey("Pylon".to_string()));
        assert_eq!(starship.parts().len(), 1);
    }

    #[test]
    fn empty_part_name_is_rejected() {
        let mut namer = Namer::default();
        let mut starship = block("Starship", &mut namer);

        let err = starship
            .add_part(Some(""), block("Pylon", &mut namer))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
        assert!(starship.parts().is_empty());
    }

    #[test]
    fn adopting_a_non_block_is_invalid_type() {
        let mut namer = Namer::default();
        let mut starship = block("Starship", &mut namer);
        let requirement = Requirement::builder().name("Warp").build(&mut namer).unwrap();

        let err = starship
            .adopt_part(None, Element::from(requirement))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidType { .. }));
        assert!(starship.parts().is_empty());
    }

    #[test]
    fn unnamed_parts_get_generated_names() {
        let mut namer = Namer::default();
        let mut starship = block("Starship", &mut namer);
        let part = Block::builder().build(&mut namer).unwrap();

        let part = starship.add_part(None, part).unwrap();
        assert_eq!(part.name(), "block1");
    }

    #[test]
    fn failed_multiplicity_update_keeps_previous_value() {
        let mut namer = Namer::default();
        let mut nacelle = Block::builder()
            .name("Nacelle")
            .multiplicity(2_i64)
            .build(&mut namer)
            .unwrap();

        let err = nacelle.set_multiplicity(-1_i64).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
        assert_eq!(nacelle.multiplicity().get(), 2);

        let err = nacelle.set_multiplicity("mayonnaise").unwrap_err();
        assert!(matches!(err, Error::InvalidType { .. }));
        assert_eq!(nacelle.multiplicity().get(), 2);

        nacelle.set_multiplicity(4_usize).unwrap();
        assert_eq!(nacelle.multiplicity().get(), 4);
    }

    #[test_case(0_i64; "zero")]
    #[test_case(-1_i64; "negative")]
    fn non_positive_multiplicity_is_invalid_value(value: i64) {
        assert!(matches!(
            Multiplicity::try_from(value),
            Err(Error::InvalidValue { .. })
        ));
    }

    #[test_case(1.5; "fractional")]
    #[test_case(f64::NAN; "nan")]
    #[test_case(f64::INFINITY; "infinite")]
    fn non_integral_multiplicity_is_invalid_type(value: f64) {
        assert!(matches!(
            Multiplicity::try_from(value),
            Err(Error::InvalidType { .. })
        ));
    }

    #[test_case(1e30; "far beyond usize")]
    #[test_case(f64::MAX; "largest float")]
    fn oversized_float_multiplicity_is_invalid_value(value: f64) {
        assert_eq!(
            Multiplicity::try_from(value).unwrap_err(),
            Error::invalid_value(value, MULTIPLICITY_OVERFLOW)
        );
    }

    #[test]
    fn oversized_float_leaves_multiplicity_untouched() {
        let mut namer = Namer::default();
        let mut nacelle = Block::builder()
            .name("Nacelle")
            .multiplicity(2_i64)
            .build(&mut namer)
            .unwrap();

        assert!(nacelle.set_multiplicity(1e30).is_err());
        assert_eq!(nacelle.multiplicity().get(), 2);
    }

    #[test]
    fn integral_float_multiplicity_is_accepted() {
        assert_eq!(Multiplicity::try_from(3.0).unwrap().get(), 3);
        assert!(matches!(
            Multiplicity::try_from(-2.0),
            Err(Error::InvalidValue { .. })
        ));
    }

    #[test]
    fn invalid_builder_multiplicity_consumes_no_name() {
        let mut namer = Namer::default();
        let err = Block::builder().multiplicity(0_i64).build(&mut namer).unwrap_err();

        assert!(matches!(err, Error::InvalidValue { .. }));
        assert_eq!(namer.issued(ElementKind::Block), 0);
    }

    #[test]
    fn builder_rejects_duplicate_parts() {
        let mut namer = Namer::default();
        let err = Block::builder()
            .name("Starship")
            .part(block("Nacelle", &mut namer))
            .part(block("Nacelle", &mut namer))
            .build(&mut namer)
            .unwrap_err();

        assert_eq!(err, Error::DuplicateKey("Nacelle".to_string()));
    }

    #[test]
    fn references_are_weak_and_deduplicated() {
        let mut namer = Namer::default();
        let antimatter = block("Antimatter", &mut namer);
        let mut warp_core = block("Warp Core", &mut namer);

        assert!(warp_core.add_reference(&antimatter).unwrap());
        assert!(!warp_core.add_reference(&antimatter).unwrap());
        assert_eq!(warp_core.references().len(), 1);
        assert_eq!(warp_core.references()[0].id(), antimatter.id());

        drop(antimatter);
        assert_eq!(warp_core.references()[0].name(), "Antimatter");
        assert!(warp_core.remove_reference(warp_core.references()[0].id()));
        assert!(warp_core.references().is_empty());
    }

    #[test]
    fn references_must_be_blocks() {
        let mut namer = Namer::default();
        let requirement = Requirement::builder().build(&mut namer).unwrap();
        let mut warp_core = block("Warp Core", &mut namer);

        assert!(matches!(
            warp_core.add_reference(&requirement),
            Err(Error::InvalidType { .. })
        ));
        assert!(matches!(
            Block::builder().reference(&requirement).build(&mut namer),
            Err(Error::InvalidType { .. })
        ));
    }

    #[test]
    fn values_and_constraints_are_keyed_by_name() {
        let mut namer = Namer::default();
        let mut hull = block("Hull", &mut namer);
        hull.add_value("mass", ValueType::new(190_000.0, "t")).unwrap();
        let constraint = ConstraintBlock::new(Some("Newton"), "F = m * a", &mut namer).unwrap();
        hull.add_constraint(None, constraint).unwrap();

        assert_eq!(hull.values()["mass"].to_string(), "190000 t");
        assert_eq!(hull.constraints()["Newton"].expression(), "F = m * a");
        assert_eq!(
            hull.add_value("mass", ValueType::new(1.0, "t")).unwrap_err(),
            Error::DuplicateKey("mass".to_string())
        );
    }

    #[test]
    #[should_panic]
    fn indexing_a_missing_part_panics() {
        let mut namer = Namer::default();
        let starship = block("Starship", &mut namer);
        let _ = &starship["hull"];
    }
}
