//! The global property type registry.
//!
//! Type implementations are stateless, so a single static instance of each
//! is shared across the whole process and handed out as `&'static dyn`.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::types::country::{CountryType, GenderType, LanguageType, TopicType};
use crate::types::email::EmailType;
use crate::types::entity::EntityType;
use crate::types::identifier::IdentifierType;
use crate::types::ip::IpType;
use crate::types::name::{AddressType, NameType};
use crate::types::phone::PhoneType;
use crate::types::string::{
    ChecksumType, DateType, HtmlType, JsonType, MimeTypeType, NumberType, StringType, TextType,
};
use crate::types::url::UrlType;
use crate::types::PropertyType;

static STRING: StringType = StringType;
static TEXT: TextType = TextType;
static HTML: HtmlType = HtmlType;
static JSON: JsonType = JsonType;
static MIME: MimeTypeType = MimeTypeType;
static CHECKSUM: ChecksumType = ChecksumType;
static NUMBER: NumberType = NumberType;
static DATE: DateType = DateType;
static NAME: NameType = NameType;
static ADDRESS: AddressType = AddressType;
static IDENTIFIER: IdentifierType = IdentifierType;
static EMAIL: EmailType = EmailType;
static URL: UrlType = UrlType;
static PHONE: PhoneType = PhoneType;
static COUNTRY: CountryType = CountryType;
static LANGUAGE: LanguageType = LanguageType;
static TOPIC: TopicType = TopicType;
static GENDER: GenderType = GenderType;
static IP: IpType = IpType;
static ENTITY: EntityType = EntityType;

const ALL_TYPES: &[&'static dyn PropertyType] = &[
    &STRING, &TEXT, &HTML, &JSON, &MIME, &CHECKSUM, &NUMBER, &DATE, &NAME, &ADDRESS,
    &IDENTIFIER, &EMAIL, &URL, &PHONE, &COUNTRY, &LANGUAGE, &TOPIC, &GENDER, &IP, &ENTITY,
];

/// Lookup tables over the known property types.
pub struct Registry {
    types: HashMap<&'static str, &'static dyn PropertyType>,
    matchable: Vec<&'static dyn PropertyType>,
    pivots: Vec<&'static dyn PropertyType>,
    groups: HashMap<&'static str, &'static dyn PropertyType>,
}

impl Registry {
    fn build() -> Self {
        let mut types = HashMap::new();
        let mut matchable = Vec::new();
        let mut pivots = Vec::new();
        let mut groups = HashMap::new();
        for &ty in ALL_TYPES {
            types.insert(ty.name(), ty);
            if ty.matchable() {
                matchable.push(ty);
            }
            if ty.pivot() {
                pivots.push(ty);
            }
            if let Some(group) = ty.group() {
                groups.insert(group, ty);
            }
        }
        Registry {
            types,
            matchable,
            pivots,
            groups,
        }
    }

    /// Look up a type by name, e.g. `"email"`.
    pub fn get(&self, name: &str) -> Option<&'static dyn PropertyType> {
        self.types.get(name).copied()
    }

    /// Like [`Registry::get`], but falls back to the string type for
    /// unknown names rather than failing.
    pub fn get_or_string(&self, name: &str) -> &'static dyn PropertyType {
        self.get(name).unwrap_or(&STRING)
    }

    /// The types usable for cross-reference matching.
    pub fn matchable(&self) -> &[&'static dyn PropertyType] {
        &self.matchable
    }

    /// The types that form pivot nodes in graph projections.
    pub fn pivots(&self) -> &[&'static dyn PropertyType] {
        &self.pivots
    }

    /// Resolve a group name, e.g. `"emails"`, to its type.
    pub fn group(&self, name: &str) -> Option<&'static dyn PropertyType> {
        self.groups.get(name).copied()
    }

    /// All registered type names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.types.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::build);

/// The process-wide type registry.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_types_are_reachable_by_name() {
        for &ty in ALL_TYPES {
            let found = registry().get(ty.name()).unwrap();
            assert_eq!(found.name(), ty.name());
        }
        assert_eq!(registry().names().len(), ALL_TYPES.len());
    }

    #[test]
    fn unknown_names_fall_back_to_string() {
        assert_eq!(registry().get_or_string("no-such-type").name(), "string");
        assert!(registry().get("no-such-type").is_none());
    }

    #[test]
    fn groups_resolve_to_their_type() {
        assert_eq!(registry().group("emails").unwrap().name(), "email");
        assert_eq!(registry().group("countries").unwrap().name(), "country");
        assert!(registry().group("email").is_none());
    }

    #[test]
    fn matchable_and_pivot_sets_are_consistent() {
        let matchable: Vec<_> = registry().matchable().iter().map(|t| t.name()).collect();
        assert!(matchable.contains(&"name"));
        assert!(matchable.contains(&"identifier"));
        assert!(!matchable.contains(&"text"));
        for ty in registry().pivots() {
            assert!(ty.matchable(), "pivot {} must be matchable", ty.name());
        }
    }
}
