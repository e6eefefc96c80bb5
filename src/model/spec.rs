//! Serde shapes for schema definition files.
//!
//! A definition file is a YAML mapping of schema name to [`SchemaSpec`].
//! These structs are the raw on-disk form; resolution into a usable
//! [`Model`](crate::model::Model) happens separately.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type SpecFile = BTreeMap<String, SchemaSpec>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaSpec {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub plural: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertySpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub featured: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub caption: Vec<String>,
    #[serde(skip_serializing_if = "EdgeSpec::is_empty")]
    pub edge: EdgeSpec,
    #[serde(rename = "temporalExtent", skip_serializing_if = "TemporalExtentSpec::is_empty")]
    pub temporal: TemporalExtentSpec,
    #[serde(rename = "abstract")]
    pub abstract_: Option<bool>,
    pub hidden: Option<bool>,
    pub generated: Option<bool>,
    pub matchable: Option<bool>,
    pub deprecated: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertySpec {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub type_name: String,
    pub hidden: Option<bool>,
    pub matchable: Option<bool>,
    pub deprecated: Option<bool>,
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub range: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub format: String,
    pub reverse: Option<ReverseSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverseSpec {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    pub hidden: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeSpec {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub caption: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    pub directed: Option<bool>,
}

impl EdgeSpec {
    pub fn is_empty(&self) -> bool {
        self.source.is_empty() && self.target.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalExtentSpec {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub start: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub end: Vec<String>,
}

impl TemporalExtentSpec {
    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.end.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_schema_file() {
        let yaml = r#"
Thing:
  label: Thing
  plural: Things
  caption: [name]
  properties:
    name:
      label: Name
      type: name
Ownership:
  extends: [Thing]
  edge:
    source: owner
    target: asset
  properties:
    owner:
      type: entity
      range: Thing
      reverse: {name: ownershipOwner}
    asset:
      type: entity
      range: Thing
      reverse: {name: ownershipAsset}
"#;
        let file: SpecFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.len(), 2);
        let thing = &file["Thing"];
        assert_eq!(thing.properties["name"].type_name, "name");
        let own = &file["Ownership"];
        assert_eq!(own.extends, vec!["Thing"]);
        assert!(!own.edge.is_empty());
        assert_eq!(own.properties["owner"].reverse.as_ref().unwrap().name, "ownershipOwner");
    }

    #[test]
    fn camel_case_fields_round_trip() {
        let yaml = r#"
Event:
  temporalExtent:
    start: [startDate]
    end: [endDate]
  properties:
    summary:
      maxLength: 500
"#;
        let file: SpecFile = serde_yaml::from_str(yaml).unwrap();
        let event = &file["Event"];
        assert_eq!(event.temporal.start, vec!["startDate"]);
        assert_eq!(event.properties["summary"].max_length, Some(500));
        let out = serde_yaml::to_string(&file).unwrap();
        let back: SpecFile = serde_yaml::from_str(&out).unwrap();
        assert_eq!(back["Event"].temporal.end, vec!["endDate"]);
    }
}
