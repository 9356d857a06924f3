use std::{fmt, ops::Index};

use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    identity::{Metadata, Namer},
    registry::{Namespace, Registry},
    Container, Element, ElementKind, ModelElement, Result,
};

/// A named namespace grouping other elements, including nested packages.
#[derive(Debug, PartialEq)]
pub struct Package {
    meta: Metadata,
    registry: Registry,
}

impl Package {
    /// Starts building a package.
    #[must_use]
    pub fn builder() -> PackageBuilder {
        PackageBuilder::default()
    }
}

impl Namespace for Package {
    const CONTAINER: Container = Container::Package;

    fn registry(&self) -> &Registry {
        &self.registry
    }

    fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }
}

impl ModelElement for Package {
    fn id(&self) -> Uuid {
        self.meta.uuid
    }

    fn name(&self) -> &str {
        self.meta.name.as_str()
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Package
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::domain::element::render(self, f)
    }
}

/// `package["Warp Drive"]` is shorthand for `package.lookup("Warp Drive")`.
///
/// # Panics
///
/// Panics if nothing is bound under the name.
impl Index<&str> for Package {
    type Output = Element;

    fn index(&self, name: &str) -> &Self::Output {
        match self.registry.get(name) {
            Ok(element) => element,
            Err(err) => panic!("{err}"),
        }
    }
}

/// Builder for [`Package`].
#[derive(Debug, Default)]
pub struct PackageBuilder {
    name: Option<String>,
    elements: Vec<(Option<String>, Element)>,
}

impl PackageBuilder {
    /// Sets the package's name. A default name is generated otherwise.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds an element, bound under its own name.
    #[must_use]
    pub fn element(mut self, element: impl Into<Element>) -> Self {
        self.elements.push((None, element.into()));
        self
    }

    /// Adds an element bound under an explicit name.
    #[must_use]
    pub fn element_as(mut self, name: impl Into<String>, element: impl Into<Element>) -> Self {
        self.elements.push((Some(name.into()), element.into()));
        self
    }

    /// Builds the package, binding its elements in the order they were
    /// added.
    ///
    /// # Errors
    ///
    /// Fails as [`Namespace::insert`] does for the first element that
    /// cannot be bound, or with
    /// [`Error::InvalidValue`](crate::Error::InvalidValue) if the name is
    /// empty. No name is generated on failure.
    pub fn build(self, namer: &mut Namer) -> Result<Package> {
        let mut registry = Registry::default();
        for (name, element) in self.elements {
            registry.bind(Container::Package, name.as_deref(), element)?;
        }
        let meta = Metadata::new(ElementKind::Package, self.name, namer)?;
        debug!(name = %meta.name, elements = registry.len(), "created package");
        Ok(Package { meta, registry })
    }
}
