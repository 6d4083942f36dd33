//! Model asset container parsing.
//!
//! A model file starts with a `Gamebryo File Format` text line followed by a
//! flat, little-endian node table. Each node may carry a local transform and a
//! mesh whose vertex attributes are stored as named streams:
//!
//! ```text
//! header line   "Gamebryo File Format..." '\n'
//! version       u32
//! node_count    u32
//! node          name (u32 len + bytes), parent i32, flags u8,
//!               [transform: f32x3 translation, f32x9 row-major rotation, f32 scale]
//!               [mesh: attribute table, vertex_count u32, streams, index_count u32, u32 indices]
//! ```
//!
//! Nodes live in an arena owned by [`ParsedAsset`]; parents always precede
//! their children, so file order is also a valid traversal order.

use std::{
    fs,
    io::{Cursor, Read},
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::data_structures::instance::Instance;

pub const NIF_MAGIC: &[u8] = b"Gamebryo File Format";
/// Upper bound on the header text line, terminator included.
pub const MAX_HEADER_LINE: usize = 128;

const FLAG_TRANSFORM: u8 = 0b01;
const FLAG_MESH: u8 = 0b10;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("file is empty")]
    Empty,
    #[error("invalid magic header")]
    BadMagic,
    #[error("truncated while reading {what} at byte {offset}")]
    Truncated { what: &'static str, offset: u64 },
    #[error("malformed {what} at byte {offset}: {reason}")]
    Malformed {
        what: &'static str,
        offset: u64,
        reason: String,
    },
}

/// Reads a model file and applies the size checks that precede parsing.
///
/// Files below `min_size` bytes are only reported; the parser still gets a
/// chance since the threshold is a heuristic.
pub fn read_asset(path: &Path, min_size: u64) -> Result<Vec<u8>, AssetError> {
    let bytes = fs::read(path).map_err(|source| AssetError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(AssetError::Empty);
    }
    if (bytes.len() as u64) < min_size {
        log::warn!(
            "Model file is suspiciously small ({} bytes): {}",
            bytes.len(),
            path.display()
        );
    }
    Ok(bytes)
}

/// Component storage of one vertex attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentType {
    F32,
    U8,
}

impl ComponentType {
    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::F32),
            1 => Some(Self::U8),
            _ => None,
        }
    }

    pub fn size(self) -> usize {
        match self {
            Self::F32 => 4,
            Self::U8 => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttributeDesc {
    pub name: String,
    pub component_type: ComponentType,
    pub components: u8,
}

/// Ordered attribute table of a mesh, looked up by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexFormat {
    pub attributes: Vec<AttributeDesc>,
}

impl VertexFormat {
    pub fn attribute(&self, name: &str) -> Option<&AttributeDesc> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|attr| attr.name == name)
    }
}

/// Raw values of one attribute, `vertex_count * components` long.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeStream {
    F32(Vec<f32>),
    U8(Vec<u8>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub format: VertexFormat,
    pub streams: Vec<AttributeStream>,
    pub vertex_count: usize,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn stream(&self, name: &str) -> Option<(&AttributeDesc, &AttributeStream)> {
        let idx = self.format.attribute_index(name)?;
        Some((&self.format.attributes[idx], self.streams.get(idx)?))
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.format.attribute(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub transform: Option<Instance>,
    pub mesh: Option<MeshData>,
}

/// A decoded model file: the header text, format version and node arena.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedAsset {
    pub header: String,
    pub version: u32,
    pub nodes: Vec<Node>,
}

impl ParsedAsset {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        if bytes.is_empty() {
            return Err(AssetError::Empty);
        }
        if !bytes.starts_with(NIF_MAGIC) {
            return Err(AssetError::BadMagic);
        }
        let line_end = bytes
            .iter()
            .take(MAX_HEADER_LINE)
            .position(|&b| b == b'\n')
            .ok_or_else(|| AssetError::Malformed {
                what: "header line",
                offset: 0,
                reason: format!("no line break within {MAX_HEADER_LINE} bytes"),
            })?;
        let header = String::from_utf8_lossy(&bytes[..line_end]).trim_end().to_string();

        let mut reader = Reader::new(bytes, line_end as u64 + 1);
        let version = reader.u32("version")?;
        let node_count = reader.count("node count", 4 + 4 + 1)?;

        let mut nodes: Vec<Node> = Vec::with_capacity(node_count);
        for idx in 0..node_count {
            let node = read_node(&mut reader, idx)?;
            if let Some(parent) = node.parent {
                nodes[parent].children.push(idx);
            }
            nodes.push(node);
        }

        Ok(Self {
            header,
            version,
            nodes,
        })
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(idx, _)| idx)
    }

    /// Nodes that carry a mesh with at least one vertex, in file order.
    pub fn mesh_nodes(&self) -> impl Iterator<Item = (&Node, &MeshData)> + '_ {
        self.nodes.iter().filter_map(|node| {
            node.mesh
                .as_ref()
                .filter(|mesh| !mesh.is_empty())
                .map(|mesh| (node, mesh))
        })
    }

    /// Local transforms composed from the root down to `idx`.
    pub fn world_transform(&self, idx: usize) -> Option<Instance> {
        let node = self.nodes.get(idx)?;
        let local = node.transform.clone().unwrap_or_default();
        Some(match node.parent {
            Some(parent) => &self.world_transform(parent)? * &local,
            None => local,
        })
    }
}

fn read_node(reader: &mut Reader<'_>, idx: usize) -> Result<Node, AssetError> {
    let name = reader.string("node name")?;
    let parent_offset = reader.position();
    let parent = reader.i32("node parent")?;
    let parent = match parent {
        -1 => None,
        p if p >= 0 && (p as usize) < idx => Some(p as usize),
        p => {
            return Err(AssetError::Malformed {
                what: "node parent",
                offset: parent_offset,
                reason: format!("node {idx} references parent {p}"),
            });
        }
    };
    let flags = reader.u8("node flags")?;

    let transform = if flags & FLAG_TRANSFORM != 0 {
        let translation = reader.vec3("translation")?;
        let rotation = [
            reader.vec3("rotation")?,
            reader.vec3("rotation")?,
            reader.vec3("rotation")?,
        ];
        let scale = reader.f32("scale")?;
        Some(Instance::from_parts(translation, rotation, scale))
    } else {
        None
    };

    let mesh = if flags & FLAG_MESH != 0 {
        Some(read_mesh(reader)?)
    } else {
        None
    };

    Ok(Node {
        name,
        parent,
        children: Vec::new(),
        transform,
        mesh,
    })
}

fn read_mesh(reader: &mut Reader<'_>) -> Result<MeshData, AssetError> {
    let attribute_count = reader.count("attribute count", 4 + 1 + 1)?;
    let mut attributes = Vec::with_capacity(attribute_count);
    for _ in 0..attribute_count {
        let name = reader.string("attribute name")?;
        let type_offset = reader.position();
        let tag = reader.u8("component type")?;
        let component_type = ComponentType::from_tag(tag).ok_or_else(|| AssetError::Malformed {
            what: "component type",
            offset: type_offset,
            reason: format!("unknown tag {tag} for attribute {name:?}"),
        })?;
        let components = reader.u8("component count")?;
        if !(1..=4).contains(&components) {
            return Err(AssetError::Malformed {
                what: "component count",
                offset: type_offset + 1,
                reason: format!("{components} components for attribute {name:?}"),
            });
        }
        attributes.push(AttributeDesc {
            name,
            component_type,
            components,
        });
    }

    let vertex_count = reader.u32("vertex count")? as usize;
    let mut streams = Vec::with_capacity(attributes.len());
    for attr in &attributes {
        let values = vertex_count
            .checked_mul(attr.components as usize)
            .ok_or(AssetError::Truncated {
                what: "attribute stream",
                offset: reader.position(),
            })?;
        reader.ensure(values.saturating_mul(attr.component_type.size()), "attribute stream")?;
        let stream = match attr.component_type {
            ComponentType::F32 => {
                let mut data = vec![0f32; values];
                reader.f32_into(&mut data, "attribute stream")?;
                AttributeStream::F32(data)
            }
            ComponentType::U8 => {
                let mut data = vec![0u8; values];
                reader.bytes_into(&mut data, "attribute stream")?;
                AttributeStream::U8(data)
            }
        };
        streams.push(stream);
    }

    let index_count = reader.count("index count", 4)?;
    let mut indices = vec![0u32; index_count];
    reader.u32_into(&mut indices, "index stream")?;

    Ok(MeshData {
        format: VertexFormat { attributes },
        streams,
        vertex_count,
        indices,
    })
}

/// Cursor wrapper that turns short reads into [`AssetError::Truncated`].
struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], start: u64) -> Self {
        let mut cursor = Cursor::new(bytes);
        cursor.set_position(start);
        Self { cursor }
    }

    fn position(&self) -> u64 {
        self.cursor.position()
    }

    fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }

    fn truncated(&self, what: &'static str) -> AssetError {
        AssetError::Truncated {
            what,
            offset: self.position(),
        }
    }

    fn ensure(&self, bytes: usize, what: &'static str) -> Result<(), AssetError> {
        if bytes > self.remaining() {
            return Err(self.truncated(what));
        }
        Ok(())
    }

    /// Reads an element count and checks that `min_element_size * count`
    /// bytes could still follow, so corrupt counts never drive allocations.
    fn count(&mut self, what: &'static str, min_element_size: usize) -> Result<usize, AssetError> {
        let count = self.u32(what)? as usize;
        self.ensure(count.saturating_mul(min_element_size), what)?;
        Ok(count)
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, AssetError> {
        self.cursor.read_u8().map_err(|_| self.truncated(what))
    }

    fn u32(&mut self, what: &'static str) -> Result<u32, AssetError> {
        self.cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| self.truncated(what))
    }

    fn i32(&mut self, what: &'static str) -> Result<i32, AssetError> {
        self.cursor
            .read_i32::<LittleEndian>()
            .map_err(|_| self.truncated(what))
    }

    fn f32(&mut self, what: &'static str) -> Result<f32, AssetError> {
        self.cursor
            .read_f32::<LittleEndian>()
            .map_err(|_| self.truncated(what))
    }

    fn vec3(&mut self, what: &'static str) -> Result<[f32; 3], AssetError> {
        Ok([self.f32(what)?, self.f32(what)?, self.f32(what)?])
    }

    fn f32_into(&mut self, dst: &mut [f32], what: &'static str) -> Result<(), AssetError> {
        self.cursor
            .read_f32_into::<LittleEndian>(dst)
            .map_err(|_| self.truncated(what))
    }

    fn u32_into(&mut self, dst: &mut [u32], what: &'static str) -> Result<(), AssetError> {
        self.cursor
            .read_u32_into::<LittleEndian>(dst)
            .map_err(|_| self.truncated(what))
    }

    fn bytes_into(&mut self, dst: &mut [u8], what: &'static str) -> Result<(), AssetError> {
        self.cursor
            .read_exact(dst)
            .map_err(|_| self.truncated(what))
    }

    fn string(&mut self, what: &'static str) -> Result<String, AssetError> {
        let len = self.count(what, 1)?;
        let mut buf = vec![0u8; len];
        self.bytes_into(&mut buf, what)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}


#[cfg(test)]
mod tests {
    use super::fixture::{AssetWriter, MeshSpec};
    use super::*;

    const QUAD: [[f32; 3]; 4] = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ];
    const UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    fn quad() -> MeshSpec<'static> {
        MeshSpec {
            positions: &QUAD,
            tex_coords: Some(&UVS),
            normals: &[],
            indices: &[0, 1, 2, 0, 2, 3],
        }
    }

    #[test]
    fn parses_node_graph_with_mesh_and_transform() {
        let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let bytes = AssetWriter::new()
            .empty_node("Scene Root", None)
            .mesh_node("Rock", Some(0), Some(([0.0, 0.0, 5.0], identity, 2.0)), &quad())
            .finish();

        let asset = ParsedAsset::from_bytes(&bytes).unwrap();
        assert!(asset.header.starts_with("Gamebryo File Format"));
        assert_eq!(asset.nodes.len(), 2);
        assert_eq!(asset.roots().collect::<Vec<_>>(), vec![0]);
        assert_eq!(asset.nodes[0].children, vec![1]);

        let rock = &asset.nodes[1];
        assert_eq!(rock.parent, Some(0));
        let transform = rock.transform.as_ref().unwrap();
        assert_eq!(transform.position.z, 5.0);
        assert_eq!(transform.scale.x, 2.0);

        let mesh = rock.mesh.as_ref().unwrap();
        assert_eq!(mesh.vertex_count, 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert!(mesh.has_attribute("texcoord"));
        assert!(!mesh.has_attribute("normal"));
        let (desc, stream) = mesh.stream("position").unwrap();
        assert_eq!(desc.components, 3);
        assert_eq!(stream, &AttributeStream::F32(QUAD.iter().flatten().copied().collect()));

        assert_eq!(asset.mesh_nodes().count(), 1);
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut bytes = AssetWriter::new().mesh_node("Rock", None, None, &quad()).finish();
        bytes[0] = b'N';
        assert!(matches!(ParsedAsset::from_bytes(&bytes), Err(AssetError::BadMagic)));
        assert!(matches!(ParsedAsset::from_bytes(&[]), Err(AssetError::Empty)));
    }

    #[test]
    fn truncated_stream_is_an_error_not_a_panic() {
        let bytes = AssetWriter::new().mesh_node("Rock", None, None, &quad()).finish();
        for cut in [45, bytes.len() / 2, bytes.len() - 1] {
            let err = ParsedAsset::from_bytes(&bytes[..cut]).unwrap_err();
            assert!(matches!(err, AssetError::Truncated { .. }), "cut at {cut}: {err}");
        }
    }

    #[test]
    fn huge_counts_do_not_allocate() {
        let mut bytes = NIF_MAGIC.to_vec();
        bytes.extend_from_slice(b"\n");
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            ParsedAsset::from_bytes(&bytes),
            Err(AssetError::Truncated { what: "node count", .. })
        ));
    }

    #[test]
    fn forward_parent_reference_is_malformed() {
        let bytes = AssetWriter::new().empty_node("Orphan", Some(3)).finish();
        assert!(matches!(
            ParsedAsset::from_bytes(&bytes),
            Err(AssetError::Malformed { what: "node parent", .. })
        ));
    }

    #[test]
    fn world_transform_walks_parents() {
        let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let bytes = AssetWriter::new()
            .mesh_node("Parent", None, Some(([1.0, 0.0, 0.0], identity, 1.0)), &quad())
            .mesh_node("Child", Some(0), Some(([0.0, 2.0, 0.0], identity, 1.0)), &quad())
            .finish();
        let asset = ParsedAsset::from_bytes(&bytes).unwrap();
        let world = asset.world_transform(1).unwrap();
        assert_eq!(world.position, cgmath::Vector3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn empty_meshes_are_not_listed() {
        let empty = MeshSpec {
            positions: &[],
            tex_coords: Some(&[]),
            normals: &[],
            indices: &[],
        };
        let bytes = AssetWriter::new().mesh_node("Nothing", None, None, &empty).finish();
        let asset = ParsedAsset::from_bytes(&bytes).unwrap();
        assert!(asset.nodes[0].mesh.is_some());
        assert_eq!(asset.mesh_nodes().count(), 0);
    }
}
