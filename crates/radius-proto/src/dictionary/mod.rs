//! RADIUS Dictionary
//!
//! Maps attribute names to numeric codes and data types, in the
//! FreeRADIUS dictionary text format:
//!
//! ```text
//! VENDOR          Example         32473
//! ATTRIBUTE       User-Name       1       string
//! ATTRIBUTE       User-Password   2       string  encrypt=1
//! ATTRIBUTE       Acct-Status-Type 40     integer
//! VALUE           Acct-Status-Type Start  1
//! BEGIN-VENDOR    Example
//! ATTRIBUTE       Example-Group   1       string
//! END-VENDOR      Example
//! $INCLUDE        dictionary.local
//! ```
//!
//! A dictionary is loaded once and then only read. Lookups by name and by
//! code return the same `Arc<AttributeDefinition>`.
//!
//! # Example
//!
//! ```rust
//! use radius_proto::dictionary::{DataType, Dictionary};
//!
//! let dict = Dictionary::standard();
//! let def = dict.lookup_by_name("Acct-Status-Type").unwrap();
//! assert_eq!(def.data_type(), DataType::Integer);
//! assert_eq!(def.value_of("Start"), Some(1));
//! ```

mod definition;
mod error;
mod parser;

pub use definition::{AttributeCode, AttributeDefinition, DataType};
pub use error::DictionaryError;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Dictionary files embedded into the crate, in load order
const STANDARD_SOURCES: &[(&str, &str)] = &[
    (
        "dictionary.rfc2865",
        include_str!("../../dictionaries/dictionary.rfc2865"),
    ),
    (
        "dictionary.rfc2866",
        include_str!("../../dictionaries/dictionary.rfc2866"),
    ),
    (
        "dictionary.rfc2869",
        include_str!("../../dictionaries/dictionary.rfc2869"),
    ),
    (
        "dictionary.rfc3162",
        include_str!("../../dictionaries/dictionary.rfc3162"),
    ),
];

/// Read-only attribute dictionary
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    by_name: HashMap<String, Arc<AttributeDefinition>>,
    by_code: HashMap<AttributeCode, Arc<AttributeDefinition>>,
    vendors: HashMap<String, u32>,
}

impl Dictionary {
    /// Load a dictionary file, following `$INCLUDE` directives relative to it
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DictionaryError> {
        let mut builder = DictionaryBuilder::default();
        parser::load_file(&mut builder, path.as_ref())?;
        let dict = builder.build();
        debug!(
            path = %path.as_ref().display(),
            attributes = dict.len(),
            "Loaded RADIUS dictionary"
        );
        Ok(dict)
    }

    /// Parse dictionary text held in memory
    ///
    /// `$INCLUDE` paths are resolved against the current directory.
    pub fn parse(source: &str) -> Result<Self, DictionaryError> {
        let mut builder = DictionaryBuilder::default();
        parser::load_str(&mut builder, "<memory>", source, Path::new("."))?;
        Ok(builder.build())
    }

    /// The built-in dictionary covering RFC 2865, 2866, 2869 and 3162
    pub fn standard() -> Self {
        STANDARD_SOURCES
            .iter()
            .try_fold(Dictionary::default(), |dict, (name, text)| {
                let mut builder = DictionaryBuilder::default();
                parser::load_str(&mut builder, name, text, Path::new("."))?;
                dict.merge(&builder.build())
            })
            .expect("built-in dictionary sources are valid")
    }

    /// Combine two dictionaries
    ///
    /// Identical definitions are unified (their value names are combined);
    /// a name or code that means something different in each is an error.
    pub fn merge(&self, other: &Dictionary) -> Result<Dictionary, DictionaryError> {
        let mut builder = DictionaryBuilder::from_dictionary(self);
        let location = "merge";

        let mut vendors: Vec<_> = other.vendors.iter().collect();
        vendors.sort_by_key(|(_, id)| **id);
        for (name, id) in vendors {
            builder.add_vendor(location, name, *id)?;
        }

        let mut definitions: Vec<_> = other.by_code.values().collect();
        definitions.sort_by_key(|def| (def.vendor(), def.code().code));
        for def in definitions {
            builder.add_attribute(location, AttributeDefinition::clone(def))?;
        }

        Ok(builder.build())
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<&Arc<AttributeDefinition>> {
        self.by_name.get(name)
    }

    pub fn lookup_by_code(
        &self,
        code: u8,
        vendor: Option<u32>,
    ) -> Option<&Arc<AttributeDefinition>> {
        self.by_code.get(&AttributeCode { vendor, code })
    }

    /// Vendor-Id declared for a vendor name
    pub fn vendor_id(&self, name: &str) -> Option<u32> {
        self.vendors.get(name).copied()
    }

    /// Vendor name declared for a Vendor-Id
    pub fn vendor_name(&self, id: u32) -> Option<&str> {
        self.vendors
            .iter()
            .find(|(_, v)| **v == id)
            .map(|(name, _)| name.as_str())
    }

    /// Number of attribute definitions
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<AttributeDefinition>> {
        self.by_code.values()
    }
}

/// Mutable staging area used while a dictionary is being loaded
#[derive(Debug, Default)]
pub(crate) struct DictionaryBuilder {
    definitions: Vec<AttributeDefinition>,
    by_name: HashMap<String, usize>,
    by_code: HashMap<AttributeCode, usize>,
    vendors: HashMap<String, u32>,
}

impl DictionaryBuilder {
    fn from_dictionary(dict: &Dictionary) -> Self {
        let mut builder = DictionaryBuilder {
            vendors: dict.vendors.clone(),
            ..Default::default()
        };
        for def in dict.by_code.values() {
            let index = builder.definitions.len();
            builder.by_name.insert(def.name().to_string(), index);
            builder.by_code.insert(def.code(), index);
            builder.definitions.push(AttributeDefinition::clone(def));
        }
        builder
    }

    pub(crate) fn vendor_id(&self, name: &str) -> Option<u32> {
        self.vendors.get(name).copied()
    }

    pub(crate) fn add_vendor(
        &mut self,
        location: &str,
        name: &str,
        id: u32,
    ) -> Result<(), DictionaryError> {
        if let Some(&existing) = self.vendors.get(name) {
            if existing == id {
                return Ok(());
            }
            return Err(DictionaryError::Conflict {
                location: location.to_string(),
                reason: format!("vendor {} already has id {}, not {}", name, existing, id),
            });
        }
        if let Some((other, _)) = self.vendors.iter().find(|(_, v)| **v == id) {
            return Err(DictionaryError::Conflict {
                location: location.to_string(),
                reason: format!("vendor id {} already belongs to {}", id, other),
            });
        }
        self.vendors.insert(name.to_string(), id);
        Ok(())
    }

    pub(crate) fn add_attribute(
        &mut self,
        location: &str,
        def: AttributeDefinition,
    ) -> Result<(), DictionaryError> {
        let conflict = |reason: String| DictionaryError::Conflict {
            location: location.to_string(),
            reason,
        };

        if let Some(&index) = self.by_name.get(def.name()) {
            let existing = &mut self.definitions[index];
            if !existing.same_shape(&def) {
                return Err(conflict(format!(
                    "{} is already defined as {} ({}), not {} ({})",
                    def.name(),
                    existing.code(),
                    existing.data_type(),
                    def.code(),
                    def.data_type()
                )));
            }
            for (name, value) in def.values() {
                existing.add_value(name, *value).map_err(conflict)?;
            }
            return Ok(());
        }

        if let Some(&index) = self.by_code.get(&def.code()) {
            let existing = &self.definitions[index];
            return Err(conflict(format!(
                "code {} is already assigned to {} ({}), cannot redefine as {} ({})",
                def.code(),
                existing.name(),
                existing.data_type(),
                def.name(),
                def.data_type()
            )));
        }

        let index = self.definitions.len();
        self.by_name.insert(def.name().to_string(), index);
        self.by_code.insert(def.code(), index);
        self.definitions.push(def);
        Ok(())
    }

    pub(crate) fn add_value(
        &mut self,
        location: &str,
        attribute: &str,
        name: &str,
        value: u32,
    ) -> Result<(), DictionaryError> {
        let index =
            *self
                .by_name
                .get(attribute)
                .ok_or_else(|| DictionaryError::UnknownAttribute {
                    location: location.to_string(),
                    attribute: attribute.to_string(),
                })?;
        let def = &mut self.definitions[index];
        if def.data_type() != DataType::Integer {
            return Err(DictionaryError::Malformed {
                location: location.to_string(),
                reason: format!(
                    "VALUE requires an integer attribute, {} is {}",
                    attribute,
                    def.data_type()
                ),
            });
        }
        def.add_value(name, value)
            .map_err(|reason| DictionaryError::Conflict {
                location: location.to_string(),
                reason,
            })
    }

    pub(crate) fn build(self) -> Dictionary {
        let mut by_name = HashMap::with_capacity(self.definitions.len());
        let mut by_code = HashMap::with_capacity(self.definitions.len());
        for def in self.definitions {
            let def = Arc::new(def);
            by_name.insert(def.name().to_string(), Arc::clone(&def));
            by_code.insert(def.code(), def);
        }
        Dictionary {
            by_name,
            by_code,
            vendors: self.vendors,
        }
    }
}
