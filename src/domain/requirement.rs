use std::{cmp::Ordering, fmt, num::NonZeroUsize};

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::{
    identity::{Metadata, Namer},
    ElementKind, ModelElement, Result,
};

/// A requirement's traceability identifier, e.g. `ID007`.
///
/// Format: `{PREFIX}{NUMBER}`, where the number is zero-padded to at least
/// `digits` characters. Identifiers are independent of the requirement's
/// name, which is what namespaces key on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequirementId {
    prefix: String,
    number: NonZeroUsize,
    digits: usize,
}

impl RequirementId {
    pub(crate) const fn new(prefix: String, number: NonZeroUsize, digits: usize) -> Self {
        Self {
            prefix,
            number,
            digits,
        }
    }

    /// Splits a written identifier into its alphabetic prefix and its digits.
    ///
    /// Returns `None` unless the text is zero or more ASCII letters followed
    /// by at least one ASCII digit and nothing else.
    pub(crate) fn split(text: &str) -> Option<(&str, &str)> {
        let boundary = text
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(text.len());
        let (prefix, number) = text.split_at(boundary);
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some((prefix, number))
    }

    /// The alphabetic prefix, e.g. `ID`.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The numeric component.
    #[must_use]
    pub const fn number(&self) -> NonZeroUsize {
        self.number
    }
}

impl fmt::Display for RequirementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:0width$}", self.prefix, self.number, width = self.digits)
    }
}

impl PartialOrd for RequirementId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RequirementId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.prefix
            .cmp(&other.prefix)
            .then(self.number.cmp(&other.number))
            .then(self.digits.cmp(&other.digits))
    }
}

/// An explicitly supplied requirement identifier, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    /// A bare number, formatted with the configured prefix and width.
    Number(i64),
    /// A bare number or an already formatted identifier such as `ID007`.
    Text(String),
}

impl From<i64> for Identifier {
    fn from(number: i64) -> Self {
        Self::Number(number)
    }
}

impl From<i32> for Identifier {
    fn from(number: i32) -> Self {
        Self::Number(number.into())
    }
}

impl From<u32> for Identifier {
    fn from(number: u32) -> Self {
        Self::Number(number.into())
    }
}

impl From<&str> for Identifier {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Identifier {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// A requirement is a textual statement a system must fulfil.
///
/// Requirements are related to each other and to the elements that satisfy,
/// verify or refine them through [`Relationship`](crate::Relationship)s held
/// in a namespace.
#[derive(Debug, PartialEq, Eq)]
pub struct Requirement {
    meta: Metadata,
    identifier: RequirementId,
    text: String,
}

impl Requirement {
    /// Starts building a requirement.
    #[must_use]
    pub fn builder() -> RequirementBuilder {
        RequirementBuilder::default()
    }

    /// The traceability identifier, e.g. `ID001`.
    #[must_use]
    pub const fn identifier(&self) -> &RequirementId {
        &self.identifier
    }

    /// The requirement statement.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl ModelElement for Requirement {
    fn id(&self) -> Uuid {
        self.meta.uuid
    }

    fn name(&self) -> &str {
        self.meta.name.as_str()
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Requirement
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::domain::element::render(self, f)
    }
}

/// Builder for [`Requirement`].
#[derive(Debug, Default)]
pub struct RequirementBuilder {
    name: Option<String>,
    text: String,
    identifier: Option<Identifier>,
}

impl RequirementBuilder {
    /// Sets the requirement's name. A default name is generated otherwise.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the requirement statement. Defaults to empty text.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Sets an explicit identifier. One is generated otherwise.
    #[must_use]
    pub fn identifier(mut self, identifier: impl Into<Identifier>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Builds the requirement, stamping its identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or the explicit identifier is
    /// malformed (see [`Namer::identifier`]). No counter is advanced on
    /// failure.
    #[instrument(skip(self, namer))]
    pub fn build(self, namer: &mut Namer) -> Result<Requirement> {
        let explicit = self
            .identifier
            .map(|identifier| namer.identifier(identifier))
            .transpose()?;
        let meta = Metadata::new(ElementKind::Requirement, self.name, namer)?;
        let identifier = explicit.unwrap_or_else(|| namer.next_identifier());

        debug!(name = %meta.name, %identifier, "created requirement");

        Ok(Requirement {
            meta,
            identifier,
            text: self.text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Error;

    #[test]
    fn identifiers_are_assigned_sequentially() {
        let mut namer = Namer::default();
        let top = Requirement::builder()
            .name("Top-level")
            .text("A constitution-class starship shall provide a 5-year mission capability.")
            .build(&mut namer)
            .unwrap();
        let functional = Requirement::builder()
            .name("Functional")
            .text("A constitution-class starship shall be able to travel at warp 8 or higher.")
            .build(&mut namer)
            .unwrap();

        assert_eq!(top.identifier().to_string(), "ID001");
        assert_eq!(functional.identifier().to_string(), "ID002");
        assert_eq!(top.to_string(), "«requirement» Top-level");
        assert_eq!(functional.to_string(), "«requirement» Functional");
    }

    #[test]
    fn text_defaults_to_empty() {
        let mut namer = Namer::default();
        let requirement = Requirement::builder().build(&mut namer).unwrap();

        assert_eq!(requirement.text(), "");
        assert_eq!(requirement.name(), "requirement1");
    }

    #[test]
    fn explicit_identifier_is_kept() {
        let mut namer = Namer::default();
        let requirement = Requirement::builder()
            .identifier(7_i64)
            .build(&mut namer)
            .unwrap();

        assert_eq!(requirement.identifier().to_string(), "ID007");
    }

    #[test]
    fn malformed_identifier_leaves_counters_untouched() {
        let mut namer = Namer::default();
        let err = Requirement::builder()
            .identifier("not-an-id")
            .build(&mut namer)
            .unwrap_err();

        assert!(matches!(err, Error::InvalidType { .. }));
        assert_eq!(namer.issued(ElementKind::Requirement), 0);
        assert_eq!(namer.next_identifier().to_string(), "ID001");
    }

    #[test]
    fn identifiers_order_numerically() {
        let namer = Namer::default();
        let nine = namer.identifier(Identifier::Number(9)).unwrap();
        let ten = namer.identifier(Identifier::Number(10)).unwrap();

        assert!(nine < ten);
    }

    #[test]
    fn split_accepts_prefix_and_digits() {
        assert_eq!(RequirementId::split("ID007"), Some(("ID", "007")));
        assert_eq!(RequirementId::split("42"), Some(("", "42")));
        assert_eq!(RequirementId::split("ID"), None);
        assert_eq!(RequirementId::split("ID7a"), None);
    }
}
