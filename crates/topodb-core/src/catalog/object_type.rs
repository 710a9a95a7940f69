//! Object-type definitions.

use rkyv::{Archive, Deserialize, Serialize};

/// An object-type definition (a model schema in the configuration database).
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, serde::Serialize)]
pub struct ObjectTypeDef {
    /// Object type id (unique within the catalog, e.g. "host").
    pub object_id: String,
    /// Human-readable name.
    pub name: String,
    /// Property definitions.
    pub fields: Vec<FieldDef>,
}

/// A property definition within an object type.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, serde::Serialize)]
pub struct FieldDef {
    /// Property id (unique within the object type, e.g. "bk_host_innerip").
    pub property_id: String,
    /// Human-readable name.
    pub name: String,
}

impl ObjectTypeDef {
    /// Create a new object-type definition.
    pub fn new(object_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a property to the object type.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add multiple properties.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Check whether the object type has a property with the given id.
    pub fn has_field(&self, property_id: &str) -> bool {
        self.fields.iter().any(|f| f.property_id == property_id)
    }

    /// List all property ids.
    pub fn field_ids(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.property_id.as_str()).collect()
    }
}

impl FieldDef {
    /// Create a new property definition.
    pub fn new(property_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            property_id: property_id.into(),
            name: name.into(),
        }
    }
}
