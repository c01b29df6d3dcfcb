use crate::error::ParseError;
use crate::model::{
    Element, ElementKind, IfcModel, PropertySets, PropertyValue, SpatialKind, SpatialNode, Storey,
};
use crate::parser::step::{StepEntity, StepFile, StepValue};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

// STEP entity name, schema spelling, structural role
const STRUCTURAL_ENTITIES: &[(&str, &str, ElementKind)] = &[
    ("IFCBEAM", "IfcBeam", ElementKind::Beam),
    ("IFCBEAMSTANDARDCASE", "IfcBeamStandardCase", ElementKind::Beam),
    ("IFCSLAB", "IfcSlab", ElementKind::Slab),
    ("IFCSLABSTANDARDCASE", "IfcSlabStandardCase", ElementKind::Slab),
    ("IFCSLABELEMENTEDCASE", "IfcSlabElementedCase", ElementKind::Slab),
    ("IFCCOLUMN", "IfcColumn", ElementKind::Column),
    ("IFCCOLUMNSTANDARDCASE", "IfcColumnStandardCase", ElementKind::Column),
    ("IFCWALL", "IfcWall", ElementKind::Wall),
    ("IFCWALLSTANDARDCASE", "IfcWallStandardCase", ElementKind::Wall),
    ("IFCWALLELEMENTEDCASE", "IfcWallElementedCase", ElementKind::Wall),
    ("IFCFOOTING", "IfcFooting", ElementKind::Footing),
];

const SPATIAL_ENTITIES: &[(&str, SpatialKind)] = &[
    ("IFCSITE", SpatialKind::Site),
    ("IFCBUILDING", SpatialKind::Building),
    ("IFCBUILDINGSTOREY", SpatialKind::Storey),
    ("IFCSPACE", SpatialKind::Space),
];

/// Parses an IFC file and extracts what the structural analyses need.
///
/// Supports both IFC2x3 and IFC4 schemas. Extracts:
/// - Project metadata (name, GlobalId, schema version, length unit)
/// - Building storeys with elevations converted to metres
/// - Beams, slabs, columns, walls and footings
/// - Spatial containment and aggregation
/// - Type names and property sets
///
/// # Errors
///
/// Returns [`ParseError::FileRead`] if the file cannot be read.
/// Returns [`ParseError::InvalidStep`] if the STEP format is malformed.
///
/// # Example
///
/// ```no_run
/// use ifc_audit::parser::parse_ifc_file;
///
/// let model = parse_ifc_file("25-08-D-STR.ifc")?;
/// for storey in &model.storeys {
///     println!("{}: {:.2} m", storey.name, storey.elevation);
/// }
/// # Ok::<(), ifc_audit::error::ParseError>(())
/// ```
pub fn parse_ifc_file<P: AsRef<Path>>(path: P) -> Result<IfcModel, ParseError> {
    let content = std::fs::read_to_string(&path).map_err(|source| ParseError::FileRead {
        path: path.as_ref().to_path_buf(),
        source,
    })?;

    let file_path = path.as_ref().to_string_lossy().to_string();
    parse_ifc_str(&content, file_path)
}

/// Same as [`parse_ifc_file`] for content already in memory.
pub fn parse_ifc_str(content: &str, file_path: String) -> Result<IfcModel, ParseError> {
    let step_file = StepFile::parse(content)?;

    let project = step_file.get_entities_by_type("IFCPROJECT").first().copied();
    let project_name = project
        .and_then(|p| p.string(2).or_else(|| p.string(5)))
        .map_or_else(|| "Unknown Project".to_string(), str::to_string);
    let project_global_id = project.and_then(|p| p.string(0)).map(str::to_string);
    let length_scale = project.map_or(1.0, |p| extract_length_scale(&step_file, p));

    let storeys = extract_storeys(&step_file, length_scale);
    let element_to_structure = extract_spatial_containment(&step_file);
    let spatial = extract_spatial_tree(&step_file, &element_to_structure);
    let type_names = extract_type_names(&step_file);
    let element_properties = extract_property_sets(&step_file);

    let elements = extract_elements(
        &step_file,
        &element_to_structure,
        &type_names,
        &element_properties,
    );

    log::info!(
        schema = step_file.schema.as_str(),
        elements = elements.len(),
        storeys = storeys.len(),
        length_scale = length_scale;
        "Parsed IFC model"
    );

    let mut model = IfcModel::new(project_name, step_file.schema, content.to_string(), file_path);
    model.project_global_id = project_global_id;
    model.length_scale = length_scale;
    model.storeys = storeys;
    model.spatial = spatial;
    model.elements = elements;

    Ok(model)
}

/// SI prefix multipliers for `IfcSIPrefix`.
fn si_prefix_multiplier(prefix: &str) -> f64 {
    match prefix {
        "MILLI" => 1e-3,
        "CENTI" => 1e-2,
        "DECI" => 1e-1,
        "DECA" => 1e1,
        "HECTO" => 1e2,
        "KILO" => 1e3,
        "MICRO" => 1e-6,
        "NANO" => 1e-9,
        _ => 1.0,
    }
}

/// Follows IFCPROJECT -> IFCUNITASSIGNMENT -> length unit and returns the
/// factor converting file lengths to metres.
fn extract_length_scale(step_file: &StepFile, project: &StepEntity) -> f64 {
    let Some(assignment) = project.reference(8).and_then(|id| step_file.get_entity(id)) else {
        return 1.0;
    };

    assignment
        .references(0)
        .into_iter()
        .filter_map(|id| step_file.get_entity(id))
        .find(|unit| unit.enumeration(1) == Some("LENGTHUNIT"))
        .map_or(1.0, |unit| unit_scale(step_file, unit, 0))
}

fn unit_scale(step_file: &StepFile, unit: &StepEntity, depth: usize) -> f64 {
    if depth > 4 {
        return 1.0;
    }
    match unit.entity_type.as_str() {
        // IFCSIUNIT(Dimensions, UnitType, Prefix, Name)
        "IFCSIUNIT" => unit.enumeration(2).map_or(1.0, si_prefix_multiplier),
        // IFCCONVERSIONBASEDUNIT(Dimensions, UnitType, Name, ConversionFactor)
        "IFCCONVERSIONBASEDUNIT" => {
            let Some(measure) = unit.reference(3).and_then(|id| step_file.get_entity(id)) else {
                return 1.0;
            };
            // IFCMEASUREWITHUNIT(ValueComponent, UnitComponent)
            let value = measure.real(0).unwrap_or(1.0);
            let base = measure
                .reference(1)
                .and_then(|id| step_file.get_entity(id))
                .map_or(1.0, |u| unit_scale(step_file, u, depth + 1));
            value * base
        }
        _ => 1.0,
    }
}

fn extract_storeys(step_file: &StepFile, length_scale: f64) -> Vec<Storey> {
    let mut storeys: Vec<Storey> = step_file
        .get_entities_by_type("IFCBUILDINGSTOREY")
        .iter()
        .map(|e| {
            let name = e
                .string(2)
                .map_or_else(|| format!("Storey #{}", e.id), str::to_string);

            Storey {
                id: e.id,
                global_id: e.string(0).unwrap_or_default().to_string(),
                name,
                elevation: e.real(9).unwrap_or(0.0) * length_scale,
            }
        })
        .collect();

    storeys.sort_by(|a, b| a.elevation.total_cmp(&b.elevation));
    storeys
}

/// Extract element → structure relationships from IFCRELCONTAINEDINSPATIALSTRUCTURE
fn extract_spatial_containment(step_file: &StepFile) -> HashMap<u64, u64> {
    let mut element_to_structure: HashMap<u64, u64> = HashMap::new();

    for rel in step_file.get_entities_by_type("IFCRELCONTAINEDINSPATIALSTRUCTURE") {
        // Index 4 = RelatedElements, index 5 = RelatingStructure
        if let Some(structure_id) = rel.reference(5) {
            for elem_id in rel.references(4) {
                element_to_structure.entry(elem_id).or_insert(structure_id);
            }
        }
    }

    element_to_structure
}

/// Builds the site/building/storey/space tree from aggregation, with
/// containment as a fallback for spaces placed directly in a storey.
fn extract_spatial_tree(
    step_file: &StepFile,
    element_to_structure: &HashMap<u64, u64>,
) -> BTreeMap<u64, SpatialNode> {
    let mut parents: HashMap<u64, u64> = HashMap::new();
    for rel in step_file.get_entities_by_type("IFCRELAGGREGATES") {
        // Index 4 = RelatingObject, index 5 = RelatedObjects
        if let Some(parent) = rel.reference(4) {
            for child in rel.references(5) {
                parents.insert(child, parent);
            }
        }
    }

    let mut tree = BTreeMap::new();
    for (entity_type, kind) in SPATIAL_ENTITIES {
        for entity in step_file.get_entities_by_type(entity_type) {
            let parent_id = parents
                .get(&entity.id)
                .or_else(|| element_to_structure.get(&entity.id))
                .copied();
            tree.insert(
                entity.id,
                SpatialNode {
                    id: entity.id,
                    kind: *kind,
                    parent_id,
                },
            );
        }
    }
    tree
}

fn extract_type_names(step_file: &StepFile) -> HashMap<u64, (u64, String)> {
    let mut element_types = HashMap::new();

    for rel in step_file.get_entities_by_type("IFCRELDEFINESBYTYPE") {
        // Index 4 = RelatedObjects, index 5 = RelatingType
        let Some(type_entity) = rel.reference(5).and_then(|id| step_file.get_entity(id)) else {
            continue;
        };
        let type_name = type_entity
            .string(2)
            .map_or_else(|| format!("Type #{}", type_entity.id), str::to_string);

        for instance in rel.references(4) {
            element_types.insert(instance, (type_entity.id, type_name.clone()));
        }
    }

    element_types
}

fn property_value(value: Option<&StepValue>) -> PropertyValue {
    match value {
        Some(StepValue::String(s) | StepValue::Enum(s)) => PropertyValue::Text(s.clone()),
        Some(StepValue::Real(f)) => PropertyValue::Real(*f),
        Some(StepValue::Integer(i)) => PropertyValue::Integer(*i),
        Some(StepValue::Boolean(b)) => PropertyValue::Boolean(*b),
        Some(StepValue::List(list)) => PropertyValue::Text(
            list.iter()
                .map(|v| property_value(Some(v)).to_string())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => PropertyValue::Empty,
    }
}

fn read_property_set(
    step_file: &StepFile,
    pset: &StepEntity,
) -> (String, BTreeMap<String, PropertyValue>) {
    let pset_name = pset
        .string(2)
        .map_or_else(|| format!("PropertySet #{}", pset.id), str::to_string);
    let mut props = BTreeMap::new();

    for prop_id in pset.references(4) {
        let Some(prop) = step_file.get_entity(prop_id) else {
            continue;
        };
        if prop.entity_type != "IFCPROPERTYSINGLEVALUE" {
            continue;
        }
        // IFCPROPERTYSINGLEVALUE(Name, Description, NominalValue, Unit)
        if let Some(name) = prop.string(0).filter(|n| !n.is_empty()) {
            props.insert(name.to_string(), property_value(prop.values.get(2)));
        }
    }

    (pset_name, props)
}

/// Property sets per object: instance psets via IFCRELDEFINESBYPROPERTIES,
/// plus type psets (IfcTypeObject.HasPropertySets) keyed by the type id.
fn extract_property_sets(step_file: &StepFile) -> HashMap<u64, PropertySets> {
    let mut object_properties: HashMap<u64, PropertySets> = HashMap::new();

    let mut pset_props: HashMap<u64, (String, BTreeMap<String, PropertyValue>)> = HashMap::new();
    for pset in step_file.get_entities_by_type("IFCPROPERTYSET") {
        pset_props.insert(pset.id, read_property_set(step_file, pset));
    }

    for rel in step_file.get_entities_by_type("IFCRELDEFINESBYPROPERTIES") {
        let Some((pset_name, props)) = rel.reference(5).and_then(|id| pset_props.get(&id)) else {
            continue;
        };
        for elem_id in rel.references(4) {
            object_properties
                .entry(elem_id)
                .or_default()
                .entry(pset_name.clone())
                .or_default()
                .extend(props.clone());
        }
    }

    // Type objects list their psets in attribute 5 (HasPropertySets).
    for entity in step_file.entities.values() {
        let is_type_object = entity.entity_type.ends_with("TYPE") || entity.entity_type.ends_with("STYLE");
        if !is_type_object || entity.entity_type.starts_with("IFCREL") {
            continue;
        }
        for pset_id in entity.references(5) {
            if let Some((pset_name, props)) = pset_props.get(&pset_id) {
                object_properties
                    .entry(entity.id)
                    .or_default()
                    .entry(pset_name.clone())
                    .or_default()
                    .extend(props.clone());
            }
        }
    }

    object_properties
}

fn extract_elements(
    step_file: &StepFile,
    element_to_structure: &HashMap<u64, u64>,
    type_names: &HashMap<u64, (u64, String)>,
    object_properties: &HashMap<u64, PropertySets>,
) -> Vec<Element> {
    let mut elements = Vec::new();

    for (entity_name, ifc_class, kind) in STRUCTURAL_ENTITIES {
        for entity in step_file.get_entities_by_type(entity_name) {
            let type_ref = type_names.get(&entity.id);

            // Type psets first, instance values override them.
            let mut property_sets = type_ref
                .and_then(|(type_id, _)| object_properties.get(type_id))
                .cloned()
                .unwrap_or_default();
            if let Some(instance_psets) = object_properties.get(&entity.id) {
                for (pset_name, props) in instance_psets {
                    property_sets
                        .entry(pset_name.clone())
                        .or_default()
                        .extend(props.clone());
                }
            }

            elements.push(Element {
                id: entity.id,
                global_id: entity.string(0).unwrap_or_default().to_string(),
                ifc_class: (*ifc_class).to_string(),
                kind: *kind,
                name: entity.string(2).map(str::to_string),
                object_type: entity.string(4).map(str::to_string),
                tag: entity.string(7).map(str::to_string),
                type_name: type_ref.map(|(_, name)| name.clone()),
                container_id: element_to_structure.get(&entity.id).copied(),
                representation_id: entity.reference(6),
                property_sets,
            });
        }
    }

    elements.sort_by_key(|e| e.id);
    elements
}
