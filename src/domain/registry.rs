//! Name-keyed element storage shared by packages and models.
//!
//! A [`Registry`] is an insertion-ordered map from unique names to owned
//! [`Element`]s. The [`Namespace`] trait layers the public protocol (insert,
//! lookup, remove, queries) on top of it, with admissibility decided by the
//! implementor's [`Container`].

use std::collections::BTreeMap;

use indexmap::IndexMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::{
    block::insert_unique,
    identity::binding_key,
    relationship::RelationshipKind,
    trace::{Trace, TraceEntry},
    Block, Container, Element, ElementKind, ElementView, Error, ModelElement, Relationship,
    Requirement, Result,
};

/// Insertion-ordered storage of the elements bound in one namespace.
#[derive(Debug, Default, PartialEq)]
pub struct Registry {
    entries: IndexMap<String, Element>,
}

impl Registry {
    /// Binds `element`, rejecting names that are already taken.
    pub(crate) fn bind(
        &mut self,
        container: Container,
        name: Option<&str>,
        element: Element,
    ) -> Result<&mut Element> {
        let key = Self::admit(container, name, &element)?;
        insert_unique(&mut self.entries, key, element)
    }

    /// Binds `element`, replacing and returning any element bound under the
    /// same name. A replaced binding keeps its position.
    pub(crate) fn rebind(
        &mut self,
        container: Container,
        name: Option<&str>,
        element: Element,
    ) -> Result<Option<Element>> {
        let key = Self::admit(container, name, &element)?;
        Ok(self.entries.insert(key, element))
    }

    fn admit(container: Container, name: Option<&str>, element: &Element) -> Result<String> {
        if !container.admits(element.kind()) {
            return Err(Error::invalid_type(element, container.expectation()));
        }
        binding_key(name, element.name())
    }

    /// Removes a binding, preserving the order of the rest.
    pub(crate) fn unbind(&mut self, name: &str) -> Result<Element> {
        self.entries
            .shift_remove(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Looks up an element by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing is bound under `name`.
    pub fn get(&self, name: &str) -> Result<&Element> {
        self.entries
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Looks up an element by name, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing is bound under `name`.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut Element> {
        self.entries
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// The bindings, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Element)> {
        self.entries
            .iter()
            .map(|(name, element)| (name.as_str(), element))
    }

    /// The number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an element is bound under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Every element reachable from this registry, depth first.
    ///
    /// Nested packages are descended into, as are block parts and block
    /// constraints. Each element appears before its own contents.
    #[must_use]
    pub fn walk(&self) -> Vec<ElementView<'_>> {
        let mut out = Vec::new();
        self.walk_into(&mut out);
        out
    }

    fn walk_into<'a>(&'a self, out: &mut Vec<ElementView<'a>>) {
        for element in self.entries.values() {
            out.push(element.view());
            match element {
                Element::Package(package) => package.registry().walk_into(out),
                Element::Block(block) => walk_block(block, out),
                Element::ConstraintBlock(_)
                | Element::Requirement(_)
                | Element::Relationship(_) => {}
            }
        }
    }

    /// Finds any reachable element by identity.
    #[must_use]
    pub fn find(&self, id: Uuid) -> Option<ElementView<'_>> {
        self.walk().into_iter().find(|view| view.id() == id)
    }

    /// Every reachable relationship, in walk order.
    #[must_use]
    pub fn relationships(&self) -> Vec<&Relationship> {
        self.walk()
            .into_iter()
            .filter_map(ElementView::as_relationship)
            .collect()
    }

    /// Every reachable requirement, in walk order.
    #[must_use]
    pub fn requirements(&self) -> Vec<&Requirement> {
        self.walk()
            .into_iter()
            .filter_map(ElementView::as_requirement)
            .collect()
    }
}

fn walk_block<'a>(block: &'a Block, out: &mut Vec<ElementView<'a>>) {
    out.extend(block.constraints().values().map(ElementView::ConstraintBlock));
    for part in block.parts().values() {
        out.push(ElementView::Block(part));
        walk_block(part, out);
    }
}

/// A container that binds unique names to elements.
///
/// Implementors supply their [`Container`] kind and their [`Registry`]; every
/// other operation is provided. All operations validate before mutating, so
/// a failed call leaves the namespace unchanged.
pub trait Namespace: ModelElement {
    /// Which element kinds this namespace admits.
    const CONTAINER: Container;

    /// The namespace's bindings.
    fn registry(&self) -> &Registry;

    /// The namespace's bindings, mutably.
    fn registry_mut(&mut self) -> &mut Registry;

    /// Extra checks run on an element before it is bound.
    ///
    /// The default accepts everything. The model root overrides this to
    /// require that relationship endpoints exist.
    ///
    /// # Errors
    ///
    /// Returns whatever error rejects the element.
    fn check_admission(&self, element: &Element) -> Result<()> {
        let _ = element;
        Ok(())
    }

    /// Binds an element under `name`, or under its own name if `name` is
    /// `None`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidType`] if this namespace does not admit the
    ///   element's kind.
    /// - [`Error::InvalidValue`] if `name` is empty.
    /// - [`Error::DuplicateKey`] if the name is already bound.
    #[instrument(skip(self, element), fields(namespace = %self.name()))]
    fn insert(&mut self, name: Option<&str>, element: impl Into<Element>) -> Result<&mut Element> {
        let element = element.into();
        if let Err(err) = self.check_admission(&element) {
            debug!(%err, "rejected insertion");
            return Err(err);
        }
        let bound = self
            .registry_mut()
            .bind(Self::CONTAINER, name, element)
            .inspect_err(|err| debug!(%err, "rejected insertion"))?;
        debug!(element = %bound, "inserted");
        Ok(bound)
    }

    /// Binds an element, replacing any element already bound under the same
    /// name. Returns the replaced element.
    ///
    /// # Errors
    ///
    /// Fails as [`Namespace::insert`] does, except that a taken name is not
    /// an error.
    #[instrument(skip(self, element), fields(namespace = %self.name()))]
    fn upsert(
        &mut self,
        name: Option<&str>,
        element: impl Into<Element>,
    ) -> Result<Option<Element>> {
        let element = element.into();
        if let Err(err) = self.check_admission(&element) {
            debug!(%err, "rejected insertion");
            return Err(err);
        }
        let replaced = self
            .registry_mut()
            .rebind(Self::CONTAINER, name, element)
            .inspect_err(|err| debug!(%err, "rejected insertion"))?;
        match &replaced {
            Some(previous) => debug!(%previous, "replaced"),
            None => debug!("inserted"),
        }
        Ok(replaced)
    }

    /// Looks up an element by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing is bound under `name`.
    fn lookup(&self, name: &str) -> Result<&Element> {
        self.registry().get(name)
    }

    /// Looks up an element by name, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing is bound under `name`.
    fn lookup_mut(&mut self, name: &str) -> Result<&mut Element> {
        self.registry_mut().get_mut(name)
    }

    /// Looks up an element through nested packages, e.g.
    /// `["Structure", "Starship"]`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidValue`] if `path` is empty.
    /// - [`Error::NotFound`] if a segment is not bound.
    /// - [`Error::InvalidType`] if an intermediate segment is not a package.
    fn lookup_path(&self, path: &[&str]) -> Result<&Element> {
        let Some((last, parents)) = path.split_last() else {
            return Err(Error::invalid_value("", "paths must not be empty"));
        };
        let mut registry = self.registry();
        for segment in parents {
            registry = registry
                .get(segment)?
                .as_package()
                .ok_or_else(|| Error::invalid_type(segment, "a package"))?
                .registry();
        }
        registry.get(last)
    }

    /// Looks up an element through nested packages, mutably.
    ///
    /// # Errors
    ///
    /// Fails as [`Namespace::lookup_path`] does.
    fn lookup_path_mut(&mut self, path: &[&str]) -> Result<&mut Element> {
        let Some((last, parents)) = path.split_last() else {
            return Err(Error::invalid_value("", "paths must not be empty"));
        };
        let mut registry = self.registry_mut();
        for segment in parents {
            registry = registry
                .get_mut(segment)?
                .as_package_mut()
                .ok_or_else(|| Error::invalid_type(segment, "a package"))?
                .registry_mut();
        }
        registry.get_mut(last)
    }

    /// Unbinds and returns an element.
    ///
    /// Only the binding is removed. A removed block takes its parts with it,
    /// but relationships elsewhere that point at the element are kept and
    /// become dangling.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing is bound under `name`.
    #[instrument(skip(self), fields(namespace = %self.name()))]
    fn remove(&mut self, name: &str) -> Result<Element> {
        self.registry_mut()
            .unbind(name)
            .inspect(|removed| debug!(element = %removed, "removed"))
    }

    /// A snapshot of the bindings, in insertion order.
    fn elements(&self) -> Vec<(&str, &Element)> {
        self.registry().iter().collect()
    }

    /// Whether an element is bound under `name`.
    fn contains(&self, name: &str) -> bool {
        self.registry().contains(name)
    }

    /// The number of direct bindings.
    fn len(&self) -> usize {
        self.registry().len()
    }

    /// Whether nothing is bound directly in this namespace.
    fn is_empty(&self) -> bool {
        self.registry().is_empty()
    }

    /// Finds any reachable element by identity, including block parts at
    /// any depth.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no reachable element has identity `id`.
    fn find(&self, id: Uuid) -> Result<ElementView<'_>> {
        self.registry()
            .find(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Every reachable relationship.
    fn relationships(&self) -> Vec<&Relationship> {
        self.registry().relationships()
    }

    /// Builds a traceability index over everything reachable.
    fn trace(&self) -> Trace<'_> {
        Trace::build(self.registry())
    }

    /// The relationships touching `requirement`, grouped by kind.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidType`] if `requirement` is not a requirement.
    /// - [`Error::NotFound`] if it is not reachable from this namespace.
    fn matrix_for<E>(&self, requirement: &E) -> Result<BTreeMap<RelationshipKind, Vec<TraceEntry>>>
    where
        E: ModelElement + ?Sized,
    {
        if requirement.kind() != ElementKind::Requirement {
            return Err(Error::invalid_type(requirement.handle(), "a requirement"));
        }
        self.find(requirement.id())?;
        Ok(self.trace().matrix_for(requirement.id()))
    }
}
