//! Schema model loading and inheritance resolution.
//!
//! A model is built from YAML specification files, each a mapping of schema
//! name to definition. Resolution walks the `extends` graph parents-first,
//! copies inherited properties down, and synthesizes reverse stubs for
//! entity links that declare one.

pub mod property;
pub mod schema;
pub mod spec;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::error::{EntigraphError, ModelError, Result};
use crate::model::property::Property;
use crate::model::schema::Schema;
use crate::model::spec::{ReverseSpec, SpecFile};

const BUNDLED_SPEC: &str = include_str!("bundled.yml");

/// A fully resolved set of schemata.
#[derive(Debug, Clone)]
pub struct Model {
    schemata: BTreeMap<String, Schema>,
    /// Index of all properties by qualified name.
    properties: BTreeMap<String, Property>,
}

impl Model {
    /// Build a model from a single merged specification map.
    pub fn from_specs(specs: SpecFile) -> Result<Model> {
        Model::from_spec_files([specs])
    }

    /// Build a model from several specification files, rejecting schema
    /// names defined more than once.
    pub fn from_spec_files<I>(files: I) -> Result<Model>
    where
        I: IntoIterator<Item = SpecFile>,
    {
        let mut merged: SpecFile = BTreeMap::new();
        for file in files {
            for (name, spec) in file {
                if merged.insert(name.clone(), spec).is_some() {
                    return Err(ModelError::DuplicateSchema { name }.into());
                }
            }
        }
        Model::generate(merged)
    }

    /// Parse a YAML document holding schema specifications.
    pub fn from_yaml_str(yaml: &str) -> Result<Model> {
        let file: SpecFile = serde_yaml::from_str(yaml).map_err(|e| ModelError::SpecParse {
            message: e.to_string(),
        })?;
        Model::from_specs(file)
    }

    /// Load every `.yml`/`.yaml` file under a directory tree.
    pub fn from_dir(path: &Path) -> Result<Model> {
        let mut files = Vec::new();
        collect_spec_files(path, &mut files)?;
        files.sort();
        let mut specs = Vec::new();
        for file in &files {
            let raw = std::fs::read_to_string(file).map_err(|e| ModelError::SpecParse {
                message: format!("{}: {e}", file.display()),
            })?;
            let parsed: SpecFile =
                serde_yaml::from_str(&raw).map_err(|e| ModelError::SpecParse {
                    message: format!("{}: {e}", file.display()),
                })?;
            specs.push(parsed);
        }
        Model::from_spec_files(specs)
    }

    /// The model shipped with the crate.
    pub fn bundled() -> Model {
        // The bundled spec is compiled in and covered by tests; a parse
        // failure here is a build defect, not a runtime condition.
        Model::from_yaml_str(BUNDLED_SPEC).unwrap_or_else(|e| {
            panic!("bundled schema model is invalid: {e}");
        })
    }

    fn generate(specs: SpecFile) -> Result<Model> {
        // Parent links must resolve before anything else.
        for (name, spec) in &specs {
            for parent in &spec.extends {
                if !specs.contains_key(parent) {
                    return Err(ModelError::UnknownParent {
                        child: name.clone(),
                        parent: parent.clone(),
                    }
                    .into());
                }
            }
        }
        let order = topo_order(&specs)?;

        let mut schemata: BTreeMap<String, Schema> = BTreeMap::new();
        for name in &order {
            let spec = &specs[name];
            let mut schema = Schema::from_spec(name, spec);
            for parent_name in &spec.extends {
                let parent = schemata[parent_name].clone();
                // Temporal extents inherit when the child declares none.
                // Parents are resolved first, so this cascades.
                if schema.temporal_start.is_empty() {
                    schema.temporal_start = parent.temporal_start.clone();
                }
                if schema.temporal_end.is_empty() {
                    schema.temporal_end = parent.temporal_end.clone();
                }
                for (pname, prop) in parent.properties {
                    schema.properties.entry(pname).or_insert(prop);
                }
                for ancestor in parent.names {
                    schema.names.insert(ancestor);
                }
            }
            schemata.insert(name.clone(), schema);
        }

        // Descendant sets, from the resolved ancestry.
        let ancestry: Vec<(String, Vec<String>)> = schemata
            .values()
            .map(|s| (s.name.clone(), s.names.iter().cloned().collect()))
            .collect();
        for (name, ancestors) in ancestry {
            for ancestor in ancestors {
                if ancestor != name {
                    if let Some(a) = schemata.get_mut(&ancestor) {
                        a.descendants.insert(name.clone());
                    }
                }
            }
        }

        resolve_ranges(&specs, &mut schemata)?;
        synthesize_stubs(&specs, &mut schemata)?;

        let mut properties = BTreeMap::new();
        for schema in schemata.values() {
            for prop in schema.properties.values() {
                properties.insert(prop.qname.clone(), prop.clone());
            }
        }
        debug!(
            schemata = schemata.len(),
            properties = properties.len(),
            "model resolved"
        );
        Ok(Model {
            schemata,
            properties,
        })
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemata.get(name)
    }

    /// Like [`Model::get`], but failing with a diagnostic.
    pub fn schema(&self, name: &str) -> Result<&Schema> {
        self.get(name).ok_or_else(|| {
            ModelError::SchemaNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Look up a property by qualified name, e.g. `Person:name`.
    pub fn property(&self, qname: &str) -> Option<&Property> {
        self.properties.get(qname)
    }

    pub fn schemata(&self) -> impl Iterator<Item = &Schema> {
        self.schemata.values()
    }

    /// The more specific of two schemata, when one inherits from the other.
    pub fn common_schema<'m>(&'m self, left: &'m Schema, right: &'m Schema) -> Result<&'m Schema> {
        if left.is_a(&right.name) {
            return Ok(left);
        }
        if right.is_a(&left.name) {
            return Ok(right);
        }
        Err(EntigraphError::Model(ModelError::NoCommonSchema {
            left: left.name.clone(),
            right: right.name.clone(),
        }))
    }
}

fn collect_spec_files(path: &Path, out: &mut Vec<std::path::PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(path).map_err(|e| ModelError::SpecParse {
        message: format!("{}: {e}", path.display()),
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| ModelError::SpecParse {
            message: format!("{}: {e}", path.display()),
        })?;
        let p = entry.path();
        if p.is_dir() {
            collect_spec_files(&p, out)?;
        } else if matches!(
            p.extension().and_then(|e| e.to_str()),
            Some("yml") | Some("yaml")
        ) {
            out.push(p);
        }
    }
    Ok(())
}

/// Parents-first ordering of the schema names; fails on `extends` cycles.
fn topo_order(specs: &SpecFile) -> Result<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }
    fn visit(
        name: &str,
        specs: &SpecFile,
        marks: &mut BTreeMap<String, Mark>,
        order: &mut Vec<String>,
    ) -> Result<()> {
        match marks[name] {
            Mark::Done => return Ok(()),
            Mark::InProgress => {
                return Err(ModelError::InheritanceCycle {
                    name: name.to_string(),
                }
                .into());
            }
            Mark::Unvisited => {}
        }
        marks.insert(name.to_string(), Mark::InProgress);
        for parent in &specs[name].extends {
            visit(parent, specs, marks, order)?;
        }
        marks.insert(name.to_string(), Mark::Done);
        order.push(name.to_string());
        Ok(())
    }

    let mut marks: BTreeMap<String, Mark> =
        specs.keys().map(|n| (n.clone(), Mark::Unvisited)).collect();
    let mut order = Vec::with_capacity(specs.len());
    for name in specs.keys() {
        visit(name, specs, &mut marks, &mut order)?;
    }
    Ok(order)
}

/// Verify that every declared range names a known schema.
fn resolve_ranges(specs: &SpecFile, schemata: &mut BTreeMap<String, Schema>) -> Result<()> {
    for (sname, spec) in specs {
        for (pname, pspec) in &spec.properties {
            if pspec.range.is_empty() {
                continue;
            }
            if !schemata.contains_key(&pspec.range) {
                return Err(ModelError::UnknownRange {
                    qname: format!("{sname}:{pname}"),
                    range: pspec.range.clone(),
                }
                .into());
            }
        }
    }
    Ok(())
}

/// Create the inbound stub for each entity link declaring a reverse, on
/// the range schema and all of its descendants.
fn synthesize_stubs(specs: &SpecFile, schemata: &mut BTreeMap<String, Schema>) -> Result<()> {
    struct StubPlan {
        source: String,
        prop: String,
        target: String,
        reverse: ReverseSpec,
        hidden: bool,
    }
    let mut plans = Vec::new();
    for (sname, spec) in specs {
        for (pname, pspec) in &spec.properties {
            let Some(rs) = &pspec.reverse else { continue };
            if pspec.range.is_empty() {
                continue;
            }
            plans.push(StubPlan {
                source: sname.clone(),
                prop: pname.clone(),
                target: pspec.range.clone(),
                reverse: rs.clone(),
                hidden: rs.hidden.or(pspec.hidden).unwrap_or(false),
            });
        }
    }
    for plan in plans {
        // Record the reverse name on the forward property, on the
        // declaring schema and every schema that inherited it.
        let qname = format!("{}:{}", plan.source, plan.prop);
        let mut holders: Vec<String> = vec![plan.source.clone()];
        holders.extend(schemata[&plan.source].descendants.iter().cloned());
        for holder in holders {
            if let Some(schema) = schemata.get_mut(&holder) {
                if let Some(prop) = schema.properties.get_mut(&plan.prop) {
                    if prop.qname == qname {
                        prop.reverse = Some(plan.reverse.name.clone());
                    }
                }
            }
        }

        let label = if plan.reverse.label.is_empty() {
            plan.reverse.name.clone()
        } else {
            plan.reverse.label.clone()
        };
        let stub = Property {
            name: plan.reverse.name.clone(),
            qname: format!("{}:{}", plan.target, plan.reverse.name),
            label,
            description: String::new(),
            hidden: plan.hidden,
            matchable: false,
            deprecated: false,
            max_length: None,
            ptype: crate::types::registry::registry().get_or_string("entity"),
            range: Some(plan.source.clone()),
            format: None,
            stub: true,
            reverse: Some(plan.prop.clone()),
        };
        let mut targets: Vec<String> = vec![plan.target.clone()];
        targets.extend(schemata[&plan.target].descendants.iter().cloned());
        for target in targets {
            if let Some(schema) = schemata.get_mut(&target) {
                schema
                    .properties
                    .entry(plan.reverse.name.clone())
                    .or_insert_with(|| stub.clone());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
Thing:
  caption: [name]
  properties:
    name: {label: Name, type: name}
    country: {label: Country, type: country}
LegalEntity:
  extends: [Thing]
  properties:
    email: {label: E-Mail, type: email}
Person:
  extends: [LegalEntity]
  properties:
    birthDate: {label: Birth date, type: date}
Company:
  extends: [LegalEntity]
  properties:
    registrationNumber: {label: Registration number, type: identifier}
Ownership:
  properties:
    owner:
      type: entity
      range: LegalEntity
      reverse: {name: ownershipOwner, label: Assets owned}
    asset:
      type: entity
      range: Thing
      reverse: {name: ownershipAsset}
  edge:
    source: owner
    target: asset
"#;

    fn model() -> Model {
        Model::from_yaml_str(FIXTURE).unwrap()
    }

    #[test]
    fn inheritance_is_transitive() {
        let m = model();
        let person = m.get("Person").unwrap();
        assert!(person.is_a("Thing"));
        assert!(person.is_a("LegalEntity"));
        assert!(person.is_a("Person"));
        assert!(!person.is_a("Company"));
        assert!(person.get("name").is_some(), "inherits Thing:name");
        assert!(person.get("email").is_some(), "inherits LegalEntity:email");
    }

    #[test]
    fn inherited_properties_keep_their_declaring_qname() {
        let m = model();
        let person = m.get("Person").unwrap();
        assert_eq!(person.get("name").unwrap().qname, "Thing:name");
        assert_eq!(person.get("birthDate").unwrap().qname, "Person:birthDate");
    }

    #[test]
    fn descendants_are_tracked() {
        let m = model();
        let thing = m.get("Thing").unwrap();
        assert!(thing.descendants.contains("Person"));
        assert!(thing.descendants.contains("Company"));
        assert!(!thing.descendants.contains("Thing"));
    }

    #[test]
    fn reverse_stubs_appear_on_range_and_descendants() {
        let m = model();
        let le = m.get("LegalEntity").unwrap();
        let stub = le.get("ownershipOwner").unwrap();
        assert!(stub.stub);
        assert_eq!(stub.range.as_deref(), Some("Ownership"));
        assert_eq!(stub.label, "Assets owned");
        // Descendants of the range see the stub too.
        assert!(m.get("Person").unwrap().get("ownershipOwner").unwrap().stub);
        // The forward property knows its reverse.
        let owner = m.get("Ownership").unwrap().get("owner").unwrap();
        assert_eq!(owner.reverse.as_deref(), Some("ownershipOwner"));
        assert!(!owner.stub);
    }

    #[test]
    fn common_schema_picks_the_more_specific() {
        let m = model();
        let thing = m.get("Thing").unwrap();
        let person = m.get("Person").unwrap();
        let company = m.get("Company").unwrap();
        assert_eq!(m.common_schema(thing, person).unwrap().name, "Person");
        assert_eq!(m.common_schema(person, thing).unwrap().name, "Person");
        assert!(m.common_schema(person, company).is_err());
    }

    #[test]
    fn unknown_parent_is_fatal() {
        let err = Model::from_yaml_str("A: {extends: [Missing]}").unwrap_err();
        assert!(matches!(
            err,
            EntigraphError::Model(ModelError::UnknownParent { .. })
        ));
    }

    #[test]
    fn inheritance_cycles_are_fatal() {
        let yaml = "A: {extends: [B]}\nB: {extends: [A]}";
        let err = Model::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(
            err,
            EntigraphError::Model(ModelError::InheritanceCycle { .. })
        ));
    }

    #[test]
    fn unknown_range_is_fatal() {
        let yaml = r#"
A:
  properties:
    link: {type: entity, range: Missing}
"#;
        let err = Model::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(
            err,
            EntigraphError::Model(ModelError::UnknownRange { .. })
        ));
    }

    #[test]
    fn duplicate_schema_across_files_is_fatal() {
        let a: SpecFile = serde_yaml::from_str("Thing: {label: Thing}").unwrap();
        let b: SpecFile = serde_yaml::from_str("Thing: {label: Other}").unwrap();
        let err = Model::from_spec_files([a, b]).unwrap_err();
        assert!(matches!(
            err,
            EntigraphError::Model(ModelError::DuplicateSchema { .. })
        ));
    }

    #[test]
    fn qname_index_covers_all_properties() {
        let m = model();
        assert!(m.property("Thing:name").is_some());
        assert!(m.property("Person:birthDate").is_some());
        assert!(m.property("Person:name").is_none(), "qnames use the declaring schema");
    }

    #[test]
    fn bundled_model_loads() {
        let m = Model::bundled();
        let person = m.get("Person").unwrap();
        assert!(person.is_a("LegalEntity"));
        assert_eq!(person.caption, ["name"]);
        assert!(m.get("Ownership").unwrap().is_edge());
    }

    #[test]
    fn temporal_extent_is_inherited_when_absent() {
        let m = Model::bundled();
        // Ownership declares no extent of its own; Interval's applies,
        // two levels up through Interest.
        let ownership = m.get("Ownership").unwrap();
        let starts: Vec<&str> = ownership
            .temporal_start_props()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(starts, ["startDate", "date"]);
        let ends: Vec<&str> = ownership
            .temporal_end_props()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(ends, ["endDate"]);

        // A schema with its own extent keeps it.
        let person = m.get("Person").unwrap();
        let starts: Vec<&str> = person
            .temporal_start_props()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(starts, ["birthDate"]);
    }
}
