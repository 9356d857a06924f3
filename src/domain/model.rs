use std::{fmt, ops::Index};

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::{
    identity::{Metadata, Namer},
    registry::{Namespace, Registry},
    relationship::Role,
    Config, Container, Element, ElementKind, ElementRef, ElementView, Error, ModelElement, Result,
};

/// The root namespace of a system model.
///
/// A model owns the [`Namer`] that generates default names and requirement
/// identifiers for the elements built for it, so counters are scoped per
/// model.
///
/// [`Namespace::insert`], [`Namespace::upsert`] and [`Model::insert_at`]
/// check relationships before binding them: a relationship, or any
/// relationship inside an incoming package, must have both endpoints
/// reachable from the model root or from the incoming package itself.
/// Packages reached through [`Namespace::lookup_mut`] are plain packages
/// and do not repeat this check; use [`Model::insert_at`] to bind into a
/// nested package.
#[derive(Debug)]
pub struct Model {
    meta: Metadata,
    registry: Registry,
    namer: Namer,
}

impl Model {
    /// Creates an empty model with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if `name` is empty.
    pub fn new(name: Option<&str>) -> Result<Self> {
        Self::with_config(name, Config::default())
    }

    /// Creates an empty model whose requirement identifiers follow `config`.
    ///
    /// The model's own default name (`model1`) comes from its fresh namer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if `name` is empty.
    pub fn with_config(name: Option<&str>, config: Config) -> Result<Self> {
        let mut namer = Namer::new(config);
        let meta = Metadata::new(ElementKind::Model, name.map(str::to_string), &mut namer)?;
        debug!(name = %meta.name, "created model");
        Ok(Self {
            meta,
            registry: Registry::default(),
            namer,
        })
    }

    /// The identity service elements for this model are built with.
    #[must_use]
    pub const fn namer(&self) -> &Namer {
        &self.namer
    }

    /// The identity service, mutably, for building elements.
    pub const fn namer_mut(&mut self) -> &mut Namer {
        &mut self.namer
    }

    /// The model's configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        self.namer.config()
    }

    /// Binds an element inside the package at `path`, e.g.
    /// `["Structure", "Propulsion"]`. An empty path binds at the root.
    ///
    /// Relationship endpoints are checked against the whole model, not just
    /// the target package.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if a relationship endpoint or a path segment is
    ///   not reachable.
    /// - [`Error::InvalidType`] if the path leads to something other than a
    ///   package.
    /// - Otherwise fails as [`Namespace::insert`] does.
    #[instrument(skip(self, element), fields(model = %self.meta.name))]
    pub fn insert_at(
        &mut self,
        path: &[&str],
        name: Option<&str>,
        element: impl Into<Element>,
    ) -> Result<&mut Element> {
        let element = element.into();
        if path.is_empty() {
            return self.insert(name, element);
        }
        self.check_admission(&element)?;
        let target = self.lookup_path_mut(path)?;
        let package = target
            .as_package_mut()
            .ok_or_else(|| Error::invalid_type(path.join("/"), "a package"))?;
        package.insert(name, element)
    }

    /// Dereferences a weak handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the element is no longer reachable from
    /// this model.
    pub fn resolve(&self, handle: &ElementRef) -> Result<ElementView<'_>> {
        self.registry
            .find(handle.id())
            .ok_or_else(|| Error::NotFound(handle.to_string()))
    }
}

impl Namespace for Model {
    const CONTAINER: Container = Container::Model;

    fn registry(&self) -> &Registry {
        &self.registry
    }

    fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Rejects relationships whose endpoints are neither in this model nor
    /// arriving with them.
    fn check_admission(&self, element: &Element) -> Result<()> {
        let (relationships, arriving) = match element {
            Element::Relationship(relationship) => (vec![relationship], Vec::new()),
            Element::Package(package) => (package.relationships(), package.registry().walk()),
            Element::Block(_) | Element::ConstraintBlock(_) | Element::Requirement(_) => {
                return Ok(());
            }
        };
        for relationship in relationships {
            for role in [Role::Client, Role::Supplier] {
                let endpoint = relationship.endpoint(role);
                if arriving.iter().any(|view| view.id() == endpoint.id()) {
                    continue;
                }
                self.resolve(endpoint)?;
            }
        }
        Ok(())
    }
}

impl ModelElement for Model {
    fn id(&self) -> Uuid {
        self.meta.uuid
    }

    fn name(&self) -> &str {
        self.meta.name.as_str()
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Model
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::domain::element::render(self, f)
    }
}

/// `model["Structure"]` is shorthand for `model.lookup("Structure")`.
///
/// # Panics
///
/// Panics if nothing is bound under the name.
impl Index<&str> for Model {
    type Output = Element;

    fn index(&self, name: &str) -> &Self::Output {
        match self.registry.get(name) {
            Ok(element) => element,
            Err(err) => panic!("{err}"),
        }
    }
}
