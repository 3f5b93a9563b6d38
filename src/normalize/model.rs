//! Typed view of a prefab document.
//!
//! The model exists so the normalization passes have one place that knows
//! which members carry defaults. Everything the model does not know about is
//! kept in `extra` maps and written back untouched.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{NormalizationError, StoreMode};
use crate::document::kind_name;
use crate::patch::escape_pointer_token;

/// Document member holding the source path of a template or nested instance.
pub const SOURCE_MEMBER: &str = "source";
/// Document member holding the id of the link that expanded a nested instance.
pub const LINK_ID_MEMBER: &str = "link_id";
/// Document member holding entities keyed by entity id.
pub const ENTITIES_MEMBER: &str = "entities";
/// Document member holding nested instances keyed by instance name.
pub const INSTANCES_MEMBER: &str = "instances";
/// Instance member holding override patches.
pub const PATCHES_MEMBER: &str = "patches";

const DEFAULT_SCALE: f64 = 1.0;
const ZERO_VECTOR: [f64; 3] = [0.0, 0.0, 0.0];

const fn default_active() -> bool {
    true
}

/// A document (or nested instance) as the normalization passes see it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrefabModel {
    /// Relative path of the document this DOM was loaded from.
    pub source: Option<String>,
    /// Link that expanded this nested instance.
    pub link_id: Option<u64>,
    /// Entities in document order.
    pub entities: Vec<(String, EntityModel)>,
    /// Nested instances in document order.
    pub instances: Vec<(String, PrefabModel)>,
    /// Unknown members in document order.
    pub extra: Map<String, Value>,
}

/// One entity of a document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntityModel {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Whether the entity starts active
    #[serde(default = "default_active")]
    pub active: bool,
    /// Local transform
    #[serde(default)]
    pub transform: TransformModel,
    /// Component bodies keyed by component type; opaque to the loader
    #[serde(default)]
    pub components: Map<String, Value>,
    /// Unknown members
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Local transform of an entity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransformModel {
    /// Translation in parent space
    pub translation: [f64; 3],
    /// Euler rotation in degrees
    pub rotation: [f64; 3],
    /// Uniform scale
    pub scale: f64,
    /// Unknown members
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for TransformModel {
    fn default() -> Self {
        Self {
            translation: ZERO_VECTOR,
            rotation: ZERO_VECTOR,
            scale: DEFAULT_SCALE,
            extra: Map::new(),
        }
    }
}

impl TransformModel {
    fn is_default(&self) -> bool {
        self.translation == ZERO_VECTOR
            && self.rotation == ZERO_VECTOR
            && self.scale == DEFAULT_SCALE
            && self.extra.is_empty()
    }

    fn to_value(&self, mode: StoreMode) -> Value {
        let strip = mode == StoreMode::StripDefaults;
        let mut out = Map::new();
        if !strip || self.translation != ZERO_VECTOR {
            out.insert("translation".to_string(), vector(self.translation));
        }
        if !strip || self.rotation != ZERO_VECTOR {
            out.insert("rotation".to_string(), vector(self.rotation));
        }
        if !strip || self.scale != DEFAULT_SCALE {
            out.insert("scale".to_string(), Value::from(self.scale));
        }
        out.extend(self.extra.clone());
        Value::Object(out)
    }
}

impl EntityModel {
    fn from_value(value: &Value, location: &str) -> Result<Self, NormalizationError> {
        if !value.is_object() {
            return Err(NormalizationError::invalid(
                location,
                format!("entity must be an object, found {}", kind_name(value)),
            ));
        }
        Self::deserialize(value).map_err(|err| NormalizationError::invalid(location, err.to_string()))
    }

    fn to_value(&self, mode: StoreMode) -> Value {
        let strip = mode == StoreMode::StripDefaults;
        let mut out = Map::new();
        if !strip || !self.name.is_empty() {
            out.insert("name".to_string(), Value::String(self.name.clone()));
        }
        if !strip || !self.active {
            out.insert("active".to_string(), Value::Bool(self.active));
        }
        if !strip || !self.transform.is_default() {
            out.insert("transform".to_string(), self.transform.to_value(mode));
        }
        if !strip || !self.components.is_empty() {
            out.insert("components".to_string(), Value::Object(self.components.clone()));
        }
        out.extend(self.extra.clone());
        Value::Object(out)
    }
}

impl PrefabModel {
    /// Reads a document DOM into the model.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizationError::InvalidDocument`] naming the JSON pointer of
    /// the first member with an unexpected shape.
    pub fn from_value(value: &Value) -> Result<Self, NormalizationError> {
        Self::from_value_at(value, "")
    }

    fn from_value_at(value: &Value, location: &str) -> Result<Self, NormalizationError> {
        let Some(members) = value.as_object() else {
            return Err(NormalizationError::invalid(
                location,
                format!("document must be an object, found {}", kind_name(value)),
            ));
        };

        let mut model = Self::default();
        for (name, member) in members {
            let member_location = format!("{location}/{}", escape_pointer_token(name));
            match name.as_str() {
                SOURCE_MEMBER => {
                    let source = member.as_str().ok_or_else(|| {
                        NormalizationError::invalid(
                            &member_location,
                            format!("source must be a string, found {}", kind_name(member)),
                        )
                    })?;
                    model.source = Some(source.to_string());
                }
                LINK_ID_MEMBER => {
                    let link_id = member.as_u64().ok_or_else(|| {
                        NormalizationError::invalid(
                            &member_location,
                            format!("link id must be an unsigned integer, found {}", kind_name(member)),
                        )
                    })?;
                    model.link_id = Some(link_id);
                }
                ENTITIES_MEMBER => {
                    for (id, entity) in object_member(member, &member_location)? {
                        let entity_location =
                            format!("{member_location}/{}", escape_pointer_token(id));
                        model
                            .entities
                            .push((id.clone(), EntityModel::from_value(entity, &entity_location)?));
                    }
                }
                INSTANCES_MEMBER => {
                    for (instance_name, instance) in object_member(member, &member_location)? {
                        let instance_location =
                            format!("{member_location}/{}", escape_pointer_token(instance_name));
                        model.instances.push((
                            instance_name.clone(),
                            Self::from_value_at(instance, &instance_location)?,
                        ));
                    }
                }
                _ => {
                    model.extra.insert(name.clone(), member.clone());
                }
            }
        }

        Ok(model)
    }

    /// Writes the model back to a DOM.
    ///
    /// Known members come first in a fixed order (`source`, `link_id`,
    /// `entities`, `instances`), followed by unknown members in document order.
    #[must_use]
    pub fn to_value(&self, mode: StoreMode) -> Value {
        let strip = mode == StoreMode::StripDefaults;
        let mut out = Map::new();

        if let Some(source) = &self.source {
            out.insert(SOURCE_MEMBER.to_string(), Value::String(source.clone()));
        }
        if let Some(link_id) = self.link_id {
            out.insert(LINK_ID_MEMBER.to_string(), Value::from(link_id));
        }
        if !strip || !self.entities.is_empty() {
            let entities =
                self.entities.iter().map(|(id, entity)| (id.clone(), entity.to_value(mode))).collect();
            out.insert(ENTITIES_MEMBER.to_string(), Value::Object(entities));
        }
        if !strip || !self.instances.is_empty() {
            let instances = self
                .instances
                .iter()
                .map(|(name, instance)| (name.clone(), instance.to_value(mode)))
                .collect();
            out.insert(INSTANCES_MEMBER.to_string(), Value::Object(instances));
        }
        for (name, member) in &self.extra {
            out.insert(name.clone(), member.clone());
        }

        Value::Object(out)
    }
}

fn object_member<'a>(
    member: &'a Value,
    location: &str,
) -> Result<&'a Map<String, Value>, NormalizationError> {
    member.as_object().ok_or_else(|| {
        NormalizationError::invalid(location, format!("expected an object, found {}", kind_name(member)))
    })
}

fn vector(values: [f64; 3]) -> Value {
    Value::Array(values.iter().copied().map(Value::from).collect())
}
