//! Attribute extraction from indexed entities.
//!
//! Entities tell the indexer their type name and hand out attribute values on
//! request. Implement [`Document`] by hand, with [`impl_document!`], or use
//! [`Record`] when the shape is only known at runtime.

use crate::index::normalize_field;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

/// An entity that can be indexed.
pub trait Document {
    /// Type name used to route the entity to its indices.
    fn type_name(&self) -> &str;

    /// Current value of the named attribute, or `None` if the entity has no
    /// such attribute.
    ///
    /// The indexer asks with the name an index was registered under first,
    /// then with its [`normalize_field`] form.
    fn attribute(&self, name: &str) -> Option<String>;
}

impl<T: Document + ?Sized> Document for &T {
    fn type_name(&self) -> &str {
        (**self).type_name()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        (**self).attribute(name)
    }
}

impl<T: Document + ?Sized> Document for Box<T> {
    fn type_name(&self) -> &str {
        (**self).type_name()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        (**self).attribute(name)
    }
}

impl<T: Document + ?Sized> Document for Rc<T> {
    fn type_name(&self) -> &str {
        (**self).type_name()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        (**self).attribute(name)
    }
}

impl<T: Document + ?Sized> Document for Arc<T> {
    fn type_name(&self) -> &str {
        (**self).type_name()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        (**self).attribute(name)
    }
}

/// Implements [`Document`] for a struct by mapping attribute names to fields.
///
/// Fields are rendered with `ToString`, so numeric fields index as decimals.
///
/// ```rust,ignore
/// struct Pet { id: String, color: String, name: String }
///
/// linkdex_core::impl_document!(Pet, "Pet", {
///     "Color" => color,
///     "Name" => name,
/// });
/// ```
#[macro_export]
macro_rules! impl_document {
    ($ty:ty, $type_name:expr, { $($attr:literal => $field:ident),* $(,)? }) => {
        impl $crate::Document for $ty {
            fn type_name(&self) -> &str {
                $type_name
            }

            fn attribute(&self, name: &str) -> Option<String> {
                match name {
                    $($attr => Some(self.$field.to_string()),)*
                    _ => None,
                }
            }
        }
    };
}

/// A document whose type and attributes are only known at runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    type_name: String,
    attributes: BTreeMap<String, String>,
}

impl Record {
    /// Creates an empty record of the given type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Sets an attribute. The name is stored normalised.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets an attribute in place.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.attributes
            .insert(normalize_field(name), value.into());
    }
}

impl Document for Record {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(&normalize_field(name)).cloned()
    }
}
