//! Robot design record and its field-level defaults.
//!
//! Upstream models do not always honor the requested schema, so [`RobotDesign::from_value`]
//! never fails: every missing, empty or wrongly-typed field falls back to a fixed default.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_NAME: &str = "Unnamed Robot";
pub const DEFAULT_PURPOSE: &str = "General Purpose";
pub const DEFAULT_SPECIFICATIONS: &str = "No specifications provided.";
pub const DEFAULT_CONTROL_LOGIC: &str = "# No control logic generated.";

/// Wire names of the design fields.
pub const FIELD_NAMES: [&str; 5] = ["name", "purpose", "specifications", "components", "controlLogic"];

/// One hardware part of a design (sensor, actuator, controller, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

impl Component {
    /// Strict shape check: an object with all three string fields. Anything else is `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            name: obj.get("name")?.as_str()?.to_string(),
            kind: obj.get("type")?.as_str()?.to_string(),
            description: obj.get("description")?.as_str()?.to_string(),
        })
    }
}

/// Generated robot specification as rendered by the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotDesign {
    pub name: String,
    pub purpose: String,
    /// Markdown body.
    pub specifications: String,
    pub components: Vec<Component>,
    /// Arduino or Python snippet for basic movement.
    pub control_logic: String,
}

impl RobotDesign {
    /// Whether `obj` carries any design field at all, regardless of its type.
    pub fn has_known_field(obj: &Map<String, Value>) -> bool {
        FIELD_NAMES.iter().any(|key| obj.contains_key(*key))
    }

    /// Build a design from a decoded JSON object, applying defaults field by field.
    ///
    /// Malformed component entries are dropped one at a time; well-formed siblings are kept.
    pub fn from_value(obj: &Map<String, Value>) -> Self {
        let components = match obj.get("components") {
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(idx, item)| {
                    let component = Component::from_value(item);
                    if component.is_none() {
                        tracing::warn!(index = idx, "dropping malformed component entry");
                    }
                    component
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            name: string_or(obj, "name", DEFAULT_NAME),
            purpose: string_or(obj, "purpose", DEFAULT_PURPOSE),
            specifications: string_or(obj, "specifications", DEFAULT_SPECIFICATIONS),
            components,
            control_logic: string_or(obj, "controlLogic", DEFAULT_CONTROL_LOGIC),
        }
    }
}

fn string_or(obj: &Map<String, Value>, key: &str, default: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default.to_string())
}

/// Outcome of one successful submission. The image is optional; the design is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub design: RobotDesign,
    pub image_url: Option<String>,
}

impl GenerationResult {
    pub fn new(design: RobotDesign, image_url: Option<String>) -> Self {
        Self { design, image_url }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn full_payload_keeps_every_field() {
        let design = RobotDesign::from_value(&obj(json!({
            "name": "LunarHex",
            "purpose": "cave exploration",
            "specifications": "# Specs\n...",
            "components": [{"name": "LiDAR Unit", "type": "sensor", "description": "360° scanning"}],
            "controlLogic": "move_forward()"
        })));
        assert_eq!(design.name, "LunarHex");
        assert_eq!(design.purpose, "cave exploration");
        assert_eq!(design.specifications, "# Specs\n...");
        assert_eq!(design.components.len(), 1);
        assert_eq!(design.components[0].kind, "sensor");
        assert_eq!(design.control_logic, "move_forward()");
    }

    #[test]
    fn empty_object_gets_all_defaults() {
        let design = RobotDesign::from_value(&Map::new());
        assert_eq!(design.name, DEFAULT_NAME);
        assert_eq!(design.purpose, DEFAULT_PURPOSE);
        assert_eq!(design.specifications, DEFAULT_SPECIFICATIONS);
        assert!(design.components.is_empty());
        assert_eq!(design.control_logic, DEFAULT_CONTROL_LOGIC);
    }

    #[test]
    fn wrong_types_and_blank_strings_fall_back() {
        let design = RobotDesign::from_value(&obj(json!({
            "name": 42,
            "purpose": "   ",
            "specifications": null,
            "components": "not a list",
            "controlLogic": ["x"]
        })));
        assert_eq!(design.name, DEFAULT_NAME);
        assert_eq!(design.purpose, DEFAULT_PURPOSE);
        assert_eq!(design.specifications, DEFAULT_SPECIFICATIONS);
        assert!(design.components.is_empty());
        assert_eq!(design.control_logic, DEFAULT_CONTROL_LOGIC);
    }

    #[test]
    fn malformed_component_is_dropped_alone() {
        let design = RobotDesign::from_value(&obj(json!({
            "components": [
                {"name": "Servo", "type": "actuator", "description": "hip joint"},
                {"name": "Broken", "type": "sensor"},
                "junk",
                {"name": "Cell", "type": 3, "description": "battery"},
                {"name": "IMU", "type": "sensor", "description": "orientation"}
            ]
        })));
        let names: Vec<_> = design.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Servo", "IMU"]);
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let design = RobotDesign::from_value(&Map::new());
        let value = serde_json::to_value(GenerationResult::new(design, None)).unwrap();
        assert!(value["design"].get("controlLogic").is_some());
        assert!(value.get("imageUrl").is_some());
    }
}
