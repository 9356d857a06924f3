use std::fmt;

use uuid::Uuid;

use crate::domain::{
    identity::{Metadata, Namer},
    ElementKind, ModelElement, Result,
};

/// A constraint on a block's values, such as `F = m * a`.
///
/// The expression is opaque to the metamodel; it is carried for display and
/// for downstream analysis tools.
#[derive(Debug, PartialEq, Eq)]
pub struct ConstraintBlock {
    meta: Metadata,
    expression: String,
}

impl ConstraintBlock {
    /// Creates a constraint block.
    ///
    /// A default name is generated when `name` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`](crate::Error::InvalidValue) if `name`
    /// is empty.
    pub fn new(
        name: Option<&str>,
        expression: impl Into<String>,
        namer: &mut Namer,
    ) -> Result<Self> {
        let meta = Metadata::new(
            ElementKind::ConstraintBlock,
            name.map(str::to_string),
            namer,
        )?;
        Ok(Self {
            meta,
            expression: expression.into(),
        })
    }

    /// The constraint expression.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl ModelElement for ConstraintBlock {
    fn id(&self) -> Uuid {
        self.meta.uuid
    }

    fn name(&self) -> &str {
        self.meta.name.as_str()
    }

    fn kind(&self) -> ElementKind {
        ElementKind::ConstraintBlock
    }
}

impl fmt::Display for ConstraintBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::domain::element::render(self, f)
    }
}
