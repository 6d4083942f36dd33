//! Reading `.xblock` level descriptors.
//!
//! A descriptor is an XML document of the form
//!
//! ```xml
//! <game>
//!   <entitySet>
//!     <entity modelName="Rock01_" name="rock_a">
//!       <property name="Position"><set value="150, 300, 0"/></property>
//!       <property name="Rotation"><set value="0, 90, 0"/></property>
//!     </entity>
//!   </entitySet>
//! </game>
//! ```

use std::{collections::HashSet, fs, path::Path};

use cgmath::Vector3;

use crate::data_structures::entity::EntityRecord;

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("failed to read descriptor {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("descriptor is not valid XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("descriptor has no <{0}> element")]
    MissingElement(&'static str),
}

/// Every `<entity>` element of a descriptor, in document order.
///
/// Elements that could not become an [`EntityRecord`] keep their slot as
/// `None`, so progress can be reported against all elements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Descriptor {
    pub entities: Vec<Option<EntityRecord>>,
}

impl Descriptor {
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        let text = fs::read_to_string(path).map_err(|source| DescriptorError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Entities without a `modelName` or `name` are skipped; properties other
    /// than `Position` and `Rotation` are ignored, as are values that don't hold
    /// three numbers.
    pub fn parse(text: &str) -> Result<Self, DescriptorError> {
        let document = roxmltree::Document::parse(text)?;
        let game = document.root_element();
        if !game.has_tag_name("game") {
            return Err(DescriptorError::MissingElement("game"));
        }
        let entity_set = child_element(game, "entitySet")
            .ok_or(DescriptorError::MissingElement("entitySet"))?;

        let mut entities = Vec::new();
        let mut seen = HashSet::new();
        for entity in entity_set
            .children()
            .filter(|node| node.has_tag_name("entity"))
        {
            let record = read_entity(entity);
            if let Some(record) = &record {
                if !seen.insert(record.name.clone()) {
                    log::warn!("Duplicate entity name '{}'", record.name);
                }
            }
            entities.push(record);
        }
        Ok(Self { entities })
    }

    /// Number of `<entity>` elements, skipped ones included.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &EntityRecord> + '_ {
        self.entities.iter().flatten()
    }

    fn into_records(self) -> Vec<EntityRecord> {
        self.entities.into_iter().flatten().collect()
    }
}

pub fn load_descriptor(path: &Path) -> Result<Vec<EntityRecord>, DescriptorError> {
    Descriptor::load(path).map(Descriptor::into_records)
}

/// Entity records in document order, see [`Descriptor::parse`].
pub fn parse_descriptor(text: &str) -> Result<Vec<EntityRecord>, DescriptorError> {
    Descriptor::parse(text).map(Descriptor::into_records)
}

fn read_entity(entity: roxmltree::Node<'_, '_>) -> Option<EntityRecord> {
    let (Some(model_name), Some(name)) = (entity.attribute("modelName"), entity.attribute("name"))
    else {
        log::warn!(
            "Skipping entity without modelName/name at byte {}",
            entity.range().start
        );
        return None;
    };

    let mut record = EntityRecord::new(model_name, name);
    let mut raw_position = Vector3::new(0.0, 0.0, 0.0);
    for property in entity
        .children()
        .filter(|node| node.has_tag_name("property"))
    {
        let Some(value) = property_value(property) else {
            continue;
        };
        match property.attribute("name") {
            Some("Position") => {
                if let Some(position) = parse_triple(value) {
                    raw_position = position;
                }
            }
            Some("Rotation") => {
                if let Some(rotation) = parse_triple(value) {
                    record.rotation = rotation;
                }
            }
            _ => {}
        }
    }
    record.position = remap_position(raw_position);
    Some(record)
}

/// Descriptor axes to scene axes: `(x, y, z) -> (x, z, -y)`.
pub fn remap_position(raw: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(raw.x, raw.z, -raw.y)
}

/// Reads `"x, y, z"` the way `scanf("%f, %f, %f")` would.
///
/// Each number may be preceded by whitespace and must be followed directly by
/// a comma (except the last). Anything after the third number is ignored.
pub fn parse_triple(value: &str) -> Option<Vector3<f32>> {
    let mut rest = value;
    let mut parts = [0.0f32; 3];
    for (i, part) in parts.iter_mut().enumerate() {
        if i > 0 {
            rest = rest.strip_prefix(',')?;
        }
        let (number, tail) = scan_float(rest)?;
        *part = number;
        rest = tail;
    }
    Some(Vector3::new(parts[0], parts[1], parts[2]))
}

fn scan_float(input: &str) -> Option<(f32, &str)> {
    let input = input.trim_start();
    let end = input
        .find(|c: char| !matches!(c, '0'..='9' | '+' | '-' | '.' | 'e' | 'E'))
        .unwrap_or(input.len());
    // longest prefix that still parses, so "1e" reads as 1
    (1..=end)
        .rev()
        .find_map(|len| input[..len].parse::<f32>().ok().map(|v| (v, &input[len..])))
}

fn child_element<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    tag: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

fn property_value<'a>(property: roxmltree::Node<'a, '_>) -> Option<&'a str> {
    property.attribute("name")?;
    child_element(property, "set")?.attribute("value")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_triples_like_scanf() {
        assert_eq!(parse_triple("1, 2, 3"), Some(Vector3::new(1.0, 2.0, 3.0)));
        assert_eq!(
            parse_triple("  -1.5,2e1,\t.25 trailing"),
            Some(Vector3::new(-1.5, 20.0, 0.25))
        );
        assert_eq!(parse_triple("1, 2"), None);
        assert_eq!(parse_triple("1 , 2, 3"), None);
        assert_eq!(parse_triple("a, b, c"), None);
        assert_eq!(parse_triple(""), None);
    }

    #[test]
    fn reads_entities_and_remaps_position() {
        let records = parse_descriptor(
            r#"<game><entitySet>
                <entity modelName="Rock01_" name="rock_a">
                  <property name="Position"><set value="150, 300, 0"/></property>
                  <property name="Rotation"><set value="0, 90, 0"/></property>
                  <property name="Scale"><set value="2, 2, 2"/></property>
                </entity>
                <entity modelName="Tree" name="tree_a"/>
            </entitySet></game>"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].model_name, "Rock01_");
        assert_eq!(records[0].name, "rock_a");
        assert_eq!(records[0].position, Vector3::new(150.0, 0.0, -300.0));
        assert_eq!(records[0].rotation, Vector3::new(0.0, 90.0, 0.0));
        assert_eq!(records[1].position, Vector3::new(0.0, 0.0, -0.0));
    }

    #[test]
    fn malformed_properties_keep_defaults() {
        let records = parse_descriptor(
            r#"<game><entitySet>
                <entity modelName="M" name="n">
                  <property name="Position"><set value="1, 2"/></property>
                  <property name="Rotation"/>
                  <property><set value="4, 5, 6"/></property>
                  <property name="Rotation"><set/></property>
                </entity>
            </entitySet></game>"#,
        )
        .unwrap();
        assert_eq!(records[0].position, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(records[0].rotation, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn skips_entities_missing_names() {
        let records = parse_descriptor(
            r#"<game><entitySet>
                <entity name="orphan"/>
                <entity modelName="M"/>
                <entity modelName="M" name="kept"/>
                <entity modelName="M" name="kept"/>
            </entitySet></game>"#,
        )
        .unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["kept", "kept"]);
    }

    #[test]
    fn descriptor_keeps_a_slot_per_entity_element() {
        let descriptor = Descriptor::parse(
            r#"<game><entitySet>
                <entity name="orphan"/>
                <entity modelName="M" name="kept"/>
                <other/>
            </entitySet></game>"#,
        )
        .unwrap();
        assert_eq!(descriptor.len(), 2);
        assert!(descriptor.entities[0].is_none());
        let names: Vec<_> = descriptor.records().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["kept"]);
    }

    #[test]
    fn missing_collections_are_reported() {
        assert!(matches!(
            parse_descriptor("<level/>"),
            Err(DescriptorError::MissingElement("game"))
        ));
        assert!(matches!(
            parse_descriptor("<game><other/></game>"),
            Err(DescriptorError::MissingElement("entitySet"))
        ));
        assert!(matches!(
            parse_descriptor("<game>"),
            Err(DescriptorError::Xml(_))
        ));
    }
}
