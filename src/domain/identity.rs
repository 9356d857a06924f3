//! Identity and default naming for model elements.
//!
//! Identities are random UUIDs stamped once, at construction, and never
//! reassigned. Default names and requirement identifiers come from counters
//! owned by a [`Namer`]; each [`Model`](crate::Model) owns its own, so two
//! models never influence each other's generated names.

use std::{collections::HashMap, num::NonZeroUsize};

use non_empty_string::NonEmptyString;
use uuid::Uuid;

use crate::domain::{
    requirement::{Identifier, RequirementId},
    Config, ElementKind, Error, Result,
};

const IDENTIFIER_RANGE: &str = "identifiers must be positive";
const IDENTIFIER_OVERFLOW: &str = "identifier number is too large";

/// Generates a new, process-unique identity token.
#[must_use]
pub fn new_identity() -> Uuid {
    Uuid::new_v4()
}

/// Identity and name shared by every element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Metadata {
    /// Globally unique, immutable identifier.
    pub(crate) uuid: Uuid,
    /// Modeler-defined or generated display name.
    pub(crate) name: NonEmptyString,
}

impl Metadata {
    /// Stamps a fresh identity, using `name` if given and a generated default
    /// otherwise.
    ///
    /// The name is validated before any counter is advanced.
    pub(crate) fn new(kind: ElementKind, name: Option<String>, namer: &mut Namer) -> Result<Self> {
        let name = match name {
            Some(name) => validate_name(name)?,
            None => namer.default_name(kind),
        };
        Ok(Self {
            uuid: new_identity(),
            name,
        })
    }
}

/// Validates an explicit element name.
pub(crate) fn validate_name(name: String) -> Result<NonEmptyString> {
    NonEmptyString::new(name).map_err(|_| Error::invalid_value("", "names must not be empty"))
}

/// Chooses the key an element is bound under in a namespace.
///
/// An explicit key must be non-empty; otherwise the element's own name is
/// used.
pub(crate) fn binding_key(explicit: Option<&str>, element_name: &str) -> Result<String> {
    match explicit {
        Some("") => Err(Error::invalid_value("", "names must not be empty")),
        Some(key) => Ok(key.to_string()),
        None => Ok(element_name.to_string()),
    }
}

/// The identity service of a model.
///
/// Hands out kind-scoped default names (`block1`, `block2`, `requirement1`,
/// ...) and sequential requirement identifiers (`ID001`, `ID002`, ...).
/// Counters only advance when a value is actually generated; supplying an
/// explicit name or identifier leaves them untouched.
#[derive(Debug, Clone, Default)]
pub struct Namer {
    config: Config,
    /// Number of default names issued so far, per kind.
    issued: HashMap<ElementKind, usize>,
    /// Number of requirement identifiers issued so far.
    identifiers: usize,
}

impl Namer {
    /// Creates a namer whose requirement identifiers follow `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            issued: HashMap::new(),
            identifiers: 0,
        }
    }

    /// The configuration identifiers are formatted with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Generates the next default name for `kind`, e.g. `block3`.
    ///
    /// # Panics
    ///
    /// Never in practice: kind prefixes are non-empty string literals.
    pub fn default_name(&mut self, kind: ElementKind) -> NonEmptyString {
        let counter = self.issued.entry(kind).or_default();
        *counter += 1;
        let name = format!("{}{counter}", kind.default_name_prefix());
        NonEmptyString::new(name).expect("kind prefixes are never empty")
    }

    /// How many default names have been issued for `kind`.
    #[must_use]
    pub fn issued(&self, kind: ElementKind) -> usize {
        self.issued.get(&kind).copied().unwrap_or_default()
    }

    /// Generates the next sequential requirement identifier.
    pub fn next_identifier(&mut self) -> RequirementId {
        self.identifiers += 1;
        let number = NonZeroUsize::MIN.saturating_add(self.identifiers - 1);
        RequirementId::new(
            self.config.identifier_prefix().to_string(),
            number,
            self.config.identifier_digits(),
        )
    }

    /// Validates and formats an explicitly supplied requirement identifier.
    ///
    /// Numbers are formatted with the configured prefix and width
    /// (`7` → `ID007`). Strings may be a bare number (`"7"`) or an
    /// already-formatted identifier (`"ID007"`), whose prefix and width are
    /// kept as written. The identifier counter is not advanced.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidValue`] if the number is zero or negative.
    /// - [`Error::InvalidType`] if a string is neither a number nor letters
    ///   followed by digits.
    pub fn identifier(&self, explicit: Identifier) -> Result<RequirementId> {
        let prefix = self.config.identifier_prefix();
        let digits = self.config.identifier_digits();
        match explicit {
            Identifier::Number(number) => {
                let number = usize::try_from(number)
                    .ok()
                    .and_then(NonZeroUsize::new)
                    .ok_or_else(|| Error::invalid_value(number, IDENTIFIER_RANGE))?;
                Ok(RequirementId::new(prefix.to_string(), number, digits))
            }
            Identifier::Text(text) => {
                let (written_prefix, written_number) = RequirementId::split(&text)
                    .ok_or_else(|| {
                        Error::invalid_type(&text, "a number or an identifier such as 'ID007'")
                    })?;
                // `split` guarantees digits only, so parsing can only overflow.
                let number = written_number
                    .parse::<usize>()
                    .map_err(|_| Error::invalid_value(&text, IDENTIFIER_OVERFLOW))?;
                let number = NonZeroUsize::new(number)
                    .ok_or_else(|| Error::invalid_value(&text, IDENTIFIER_RANGE))?;
                if written_prefix.is_empty() {
                    Ok(RequirementId::new(prefix.to_string(), number, digits))
                } else {
                    Ok(RequirementId::new(
                        written_prefix.to_string(),
                        number,
                        written_number.len(),
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn default_names_are_scoped_per_kind() {
        let mut namer = Namer::default();

        assert_eq!(namer.default_name(ElementKind::Block).as_str(), "block1");
        assert_eq!(namer.default_name(ElementKind::Block).as_str(), "block2");
        assert_eq!(
            namer.default_name(ElementKind::Requirement).as_str(),
            "requirement1"
        );
        assert_eq!(
            namer.default_name(ElementKind::DeriveReqt).as_str(),
            "derivereqt1"
        );
        assert_eq!(namer.issued(ElementKind::Block), 2);
        assert_eq!(namer.issued(ElementKind::Package), 0);
    }

    #[test]
    fn namers_do_not_share_counters() {
        let mut first = Namer::default();
        let mut second = Namer::default();

        first.default_name(ElementKind::Block);
        assert_eq!(second.default_name(ElementKind::Block).as_str(), "block1");
    }

    #[test]
    fn explicit_name_does_not_consume_counter() {
        let mut namer = Namer::default();
        let meta = Metadata::new(ElementKind::Block, Some("Hull".to_string()), &mut namer).unwrap();

        assert_eq!(meta.name.as_str(), "Hull");
        assert_eq!(namer.issued(ElementKind::Block), 0);
    }

    #[test]
    fn empty_name_is_rejected_without_consuming_counter() {
        let mut namer = Namer::default();
        let err = Metadata::new(ElementKind::Block, Some(String::new()), &mut namer).unwrap_err();

        assert!(matches!(err, Error::InvalidValue { .. }));
        assert_eq!(namer.issued(ElementKind::Block), 0);
    }

    #[test]
    fn identities_are_unique() {
        let mut namer = Namer::default();
        let a = Metadata::new(ElementKind::Block, None, &mut namer).unwrap();
        let b = Metadata::new(ElementKind::Block, None, &mut namer).unwrap();

        assert_ne!(a.uuid, b.uuid);
        assert!(!a.uuid.is_nil());
    }

    #[test]
    fn sequential_identifiers_are_zero_padded() {
        let mut namer = Namer::default();

        assert_eq!(namer.next_identifier().to_string(), "ID001");
        assert_eq!(namer.next_identifier().to_string(), "ID002");
    }

    #[test]
    fn identifier_width_follows_config() {
        let mut config = Config::default();
        config.set_identifier_prefix("REQ".to_string()).unwrap();
        config.set_identifier_digits(4);
        let mut namer = Namer::new(config);

        assert_eq!(namer.next_identifier().to_string(), "REQ0001");
    }

    #[test_case(Identifier::Number(7), "ID007"; "number")]
    #[test_case(Identifier::Number(1234), "ID1234"; "number wider than padding")]
    #[test_case(Identifier::from("7"), "ID007"; "numeric string")]
    #[test_case(Identifier::from("ID007"), "ID007"; "formatted")]
    #[test_case(Identifier::from("REQ12"), "REQ12"; "formatted keeps width")]
    fn explicit_identifiers(explicit: Identifier, expected: &str) {
        let namer = Namer::default();
        assert_eq!(namer.identifier(explicit).unwrap().to_string(), expected);
    }

    #[test_case(Identifier::Number(0); "zero")]
    #[test_case(Identifier::Number(-3); "negative")]
    #[test_case(Identifier::from("ID000"); "formatted zero")]
    fn non_positive_identifiers_are_invalid_values(explicit: Identifier) {
        let namer = Namer::default();
        assert!(matches!(
            namer.identifier(explicit),
            Err(Error::InvalidValue { .. })
        ));
    }

    #[test_case("ID99999999999999999999999"; "formatted")]
    #[test_case("99999999999999999999999"; "bare")]
    fn overflowing_identifiers_are_reported_as_too_large(text: &str) {
        let namer = Namer::default();
        assert_eq!(
            namer.identifier(Identifier::from(text)).unwrap_err(),
            Error::invalid_value(text, IDENTIFIER_OVERFLOW)
        );
    }

    #[test_case(""; "empty")]
    #[test_case("ID"; "prefix only")]
    #[test_case("abc-7"; "punctuation")]
    #[test_case("7ID"; "digits first")]
    fn malformed_identifiers_are_invalid_types(text: &str) {
        let namer = Namer::default();
        assert!(matches!(
            namer.identifier(Identifier::from(text)),
            Err(Error::InvalidType { .. })
        ));
    }

    #[test]
    fn explicit_identifier_does_not_consume_counter() {
        let mut namer = Namer::default();
        namer.identifier(Identifier::Number(9)).unwrap();

        assert_eq!(namer.next_identifier().to_string(), "ID001");
    }
}
