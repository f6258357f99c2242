// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element attribute and property data
//!
//! The IFC library hands property data back as loosely shaped JSON (the
//! web-ifc layout: entities carry `expressID` and a numeric `type`, scalar
//! attributes are wrapped as `{"type": <code>, "value": <v>}`). The types here
//! give that data a fixed shape and know how to decode it.

use crate::{ExpressId, LibraryError, ModelId, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// web-ifc value type codes
const VALUE_STRING: u64 = 1;
const VALUE_LABEL: u64 = 2;
const VALUE_ENUM: u64 = 3;
const VALUE_REAL: u64 = 4;
const VALUE_REF: u64 = 5;
const VALUE_INTEGER: u64 = 10;

/// A single decoded attribute value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    /// Enumeration literal such as `.ELEMENT.`
    Enum(String),
    /// Reference the library did not resolve
    Reference(ExpressId),
    /// Referenced entity resolved in place
    Entity(Box<NativeAttributes>),
    List(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Decode a raw library value
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => AttributeValue::Null,
            Value::Bool(b) => AttributeValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => AttributeValue::Integer(i),
                None => AttributeValue::Real(n.as_f64().unwrap_or(0.0)),
            },
            Value::String(s) => AttributeValue::Text(s.clone()),
            Value::Array(items) => {
                AttributeValue::List(items.iter().map(AttributeValue::from_json).collect())
            }
            Value::Object(map) => {
                if map.contains_key("expressID") {
                    return match NativeAttributes::from_json(value) {
                        Ok(entity) => AttributeValue::Entity(Box::new(entity)),
                        Err(_) => AttributeValue::Null,
                    };
                }
                let inner = map.get("value").unwrap_or(&Value::Null);
                match map.get("type").and_then(Value::as_u64) {
                    Some(VALUE_REF) => inner
                        .as_f64()
                        .and_then(ExpressId::from_f64)
                        .map(AttributeValue::Reference)
                        .unwrap_or(AttributeValue::Null),
                    Some(VALUE_ENUM) => match inner {
                        Value::String(s) => AttributeValue::Enum(s.clone()),
                        other => AttributeValue::from_json(other),
                    },
                    Some(VALUE_REAL) => inner
                        .as_f64()
                        .map(AttributeValue::Real)
                        .unwrap_or(AttributeValue::Null),
                    Some(VALUE_INTEGER) => match inner.as_i64() {
                        Some(i) => AttributeValue::Integer(i),
                        None => AttributeValue::from_json(inner),
                    },
                    Some(VALUE_STRING) | Some(VALUE_LABEL) => match inner {
                        Value::String(s) => AttributeValue::Text(s.clone()),
                        other => AttributeValue::from_json(other),
                    },
                    _ => AttributeValue::from_json(inner),
                }
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) | AttributeValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Real(v) => Some(*v),
            AttributeValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&NativeAttributes> {
        match self {
            AttributeValue::Entity(e) => Some(e),
            _ => None,
        }
    }

    /// Iterate over list items; a scalar yields itself once
    pub fn items(&self) -> Box<dyn Iterator<Item = &AttributeValue> + '_> {
        match self {
            AttributeValue::List(items) => Box::new(items.iter()),
            AttributeValue::Null => Box::new(std::iter::empty()),
            other => Box::new(std::iter::once(other)),
        }
    }

    /// Human readable rendering for property panels
    pub fn display(&self) -> String {
        match self {
            AttributeValue::Null => String::new(),
            AttributeValue::Bool(b) => b.to_string(),
            AttributeValue::Integer(i) => i.to_string(),
            AttributeValue::Real(r) => format!("{}", r),
            AttributeValue::Text(s) => s.clone(),
            AttributeValue::Enum(s) => s.trim_matches('.').to_string(),
            AttributeValue::Reference(id) => id.to_string(),
            AttributeValue::Entity(e) => e
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| e.express_id.to_string()),
            AttributeValue::List(items) => items
                .iter()
                .map(AttributeValue::display)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// The native attributes of one IFC entity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NativeAttributes {
    pub express_id: ExpressId,
    /// Numeric type code as reported by the library
    pub type_code: Option<u32>,
    /// IFC class name, when the library reports it
    pub ifc_type: Option<String>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl NativeAttributes {
    pub fn new(express_id: ExpressId) -> Self {
        Self {
            express_id,
            type_code: None,
            ifc_type: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_type(mut self, ifc_type: impl Into<String>) -> Self {
        self.ifc_type = Some(ifc_type.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Decode an entity object (`{"expressID": .., "type": .., ...}`)
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| LibraryError::malformed("entity is not an object"))?;
        let express_id = map
            .get("expressID")
            .and_then(Value::as_f64)
            .and_then(ExpressId::from_f64)
            .ok_or_else(|| LibraryError::malformed("entity has no expressID"))?;

        let mut entity = NativeAttributes::new(express_id);
        match map.get("type") {
            Some(Value::Number(n)) => entity.type_code = n.as_u64().map(|c| c as u32),
            Some(Value::String(s)) => entity.ifc_type = Some(s.clone()),
            _ => {}
        }
        for (key, raw) in map {
            if key == "expressID" || key == "type" {
                continue;
            }
            entity
                .attributes
                .insert(key.clone(), AttributeValue::from_json(raw));
        }
        Ok(entity)
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name).filter(|v| !v.is_null())
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttributeValue::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.text("Name")
    }

    pub fn global_id(&self) -> Option<&str> {
        self.text("GlobalId")
    }
}

/// A single property value with optional unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property name
    pub name: String,
    /// Property value as formatted string
    pub value: String,
    /// Unit of measurement (if applicable)
    pub unit: Option<String>,
}

impl Property {
    /// Create a new property
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            unit: None,
        }
    }

    /// Create a property with unit
    pub fn with_unit(
        name: impl Into<String>,
        value: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            unit: Some(unit.into()),
        }
    }

    /// Decode an `IfcProperty*` or `IfcQuantity*` entity
    fn from_native(entity: &NativeAttributes) -> Option<Self> {
        let name = entity.name()?.to_string();
        let value = entity
            .get("NominalValue")
            .or_else(|| {
                entity
                    .attributes
                    .iter()
                    .find(|(key, v)| key.ends_with("Value") && !v.is_null())
                    .map(|(_, v)| v)
            })
            .map(AttributeValue::display)
            .unwrap_or_default();
        let unit = entity.get("Unit").map(AttributeValue::display);
        Some(Self { name, value, unit })
    }
}

/// A property set containing multiple properties
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertySet {
    /// Entity id of the `IfcPropertySet` / `IfcElementQuantity`
    pub express_id: Option<ExpressId>,
    /// Property set name (e.g., "Pset_WallCommon")
    pub name: String,
    /// Properties in this set
    pub properties: Vec<Property>,
}

impl PropertySet {
    /// Create a new property set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            express_id: None,
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Add a property to this set
    pub fn add(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Get a property by name
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Decode a property set or quantity set entity
    pub fn from_native(entity: &NativeAttributes) -> Self {
        let members = entity
            .get("HasProperties")
            .or_else(|| entity.get("Quantities"));
        let properties = members
            .map(|list| {
                list.items()
                    .filter_map(AttributeValue::as_entity)
                    .filter_map(Property::from_native)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            express_id: Some(entity.express_id),
            name: entity.name().unwrap_or_default().to_string(),
            properties,
        }
    }

    /// Decode a JSON array of property set entities
    pub fn list_from_json(value: &Value) -> Result<Vec<Self>> {
        decode_list(value, |e| Some(PropertySet::from_native(e)))
    }
}

/// Property sets attached to the element's type object
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeProperties {
    pub express_id: ExpressId,
    pub name: Option<String>,
    pub ifc_type: Option<String>,
    pub property_sets: Vec<PropertySet>,
}

impl TypeProperties {
    pub fn from_native(entity: &NativeAttributes) -> Self {
        let property_sets = entity
            .get("HasPropertySets")
            .map(|list| {
                list.items()
                    .filter_map(AttributeValue::as_entity)
                    .map(PropertySet::from_native)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            express_id: entity.express_id,
            name: entity.name().map(str::to_string),
            ifc_type: entity.ifc_type.clone(),
            property_sets,
        }
    }

    pub fn list_from_json(value: &Value) -> Result<Vec<Self>> {
        decode_list(value, |e| Some(TypeProperties::from_native(e)))
    }
}

/// One layer of a layered material
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialLayer {
    pub material: Option<String>,
    pub thickness: Option<f64>,
}

/// A material assignment of an element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub express_id: ExpressId,
    pub name: Option<String>,
    pub ifc_type: Option<String>,
    pub category: Option<String>,
    pub layers: Vec<MaterialLayer>,
}

impl MaterialEntry {
    pub fn new(express_id: ExpressId, name: impl Into<String>) -> Self {
        Self {
            express_id,
            name: Some(name.into()),
            ifc_type: None,
            category: None,
            layers: Vec::new(),
        }
    }

    /// Decode `IfcMaterial`, `IfcMaterialLayerSet` or `IfcMaterialLayerSetUsage`
    pub fn from_native(entity: &NativeAttributes) -> Self {
        let layer_set = entity
            .get("ForLayerSet")
            .and_then(AttributeValue::as_entity)
            .unwrap_or(entity);
        let layers = layer_set
            .get("MaterialLayers")
            .map(|list| {
                list.items()
                    .filter_map(AttributeValue::as_entity)
                    .map(|layer| MaterialLayer {
                        material: layer
                            .get("Material")
                            .and_then(AttributeValue::as_entity)
                            .and_then(NativeAttributes::name)
                            .map(str::to_string),
                        thickness: layer.get("LayerThickness").and_then(AttributeValue::as_f64),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let name = entity
            .name()
            .or_else(|| layer_set.text("LayerSetName"))
            .map(str::to_string);
        Self {
            express_id: entity.express_id,
            name,
            ifc_type: entity.ifc_type.clone(),
            category: entity.text("Category").map(str::to_string),
            layers,
        }
    }

    pub fn list_from_json(value: &Value) -> Result<Vec<Self>> {
        decode_list(value, |e| Some(MaterialEntry::from_native(e)))
    }
}

fn decode_list<T>(value: &Value, f: impl Fn(&NativeAttributes) -> Option<T>) -> Result<Vec<T>> {
    let items = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        _ => return Err(LibraryError::malformed("expected an array of entities")),
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let entity = NativeAttributes::from_json(item)?;
        if let Some(decoded) = f(&entity) {
            out.push(decoded);
        }
    }
    Ok(out)
}

/// Everything the viewer shows for one selected element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementProperties {
    pub model_id: ModelId,
    pub express_id: ExpressId,
    pub native: NativeAttributes,
    pub property_sets: Vec<PropertySet>,
    pub type_properties: Vec<TypeProperties>,
    pub materials: Vec<MaterialEntry>,
}

impl ElementProperties {
    /// Find a property by set and property name
    pub fn property(&self, set: &str, name: &str) -> Option<&Property> {
        self.property_sets
            .iter()
            .filter(|pset| pset.name == set)
            .find_map(|pset| pset.get(name))
    }
}
