//! Structural packing of JSON trees
//!
//! A schema-agnostic, lossless transform. Every distinct subtree is stored
//! once in a node table and every distinct object key list once in a shape
//! table. Parents refer to
//! children by node index, so repeated keys, enum-like strings, flag sets
//! and whole repeated records each cost one entry.
//!
//! Nodes are numbered in post-order of first visit: a child's index is
//! always lower than its parent's. [`unpack`] relies on this to decode in a
//! single forward pass and to reject cyclic or dangling references.

use crate::error::{ErrorCode, Result, ScreenpackError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A packed tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackedDocument {
    /// Interned object key lists
    pub shapes: Vec<Vec<String>>,
    pub nodes: Vec<Node>,
    pub root: u32,
}

/// One interned subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Array of child node indices
    List(Vec<u32>),
    /// Object: shape index plus one child node index per key
    Record { s: u32, v: Vec<u32> },
    /// String, number, boolean or null
    Scalar(Value),
}

#[derive(Default)]
struct Packer {
    shapes: Vec<Vec<String>>,
    shape_ids: HashMap<Vec<String>, u32>,
    nodes: Vec<Node>,
    node_ids: HashMap<String, u32>,
}

impl Packer {
    fn next_index(len: usize) -> Result<u32> {
        u32::try_from(len).map_err(|_| {
            ScreenpackError::encoding_with_code(
                ErrorCode::ENCODING_SERIALIZE,
                "packed table exceeds u32 indices",
            )
        })
    }

    fn intern_shape(&mut self, keys: Vec<String>) -> Result<u32> {
        if let Some(&id) = self.shape_ids.get(&keys) {
            return Ok(id);
        }
        let id = Self::next_index(self.shapes.len())?;
        self.shapes.push(keys.clone());
        self.shape_ids.insert(keys, id);
        Ok(id)
    }

    fn intern_node(&mut self, node: Node) -> Result<u32> {
        let key = serde_json::to_string(&node).map_err(|e| {
            ScreenpackError::encoding_with_code(ErrorCode::ENCODING_SERIALIZE, e.to_string())
                .with_source(e)
        })?;
        if let Some(&id) = self.node_ids.get(&key) {
            return Ok(id);
        }
        let id = Self::next_index(self.nodes.len())?;
        self.nodes.push(node);
        self.node_ids.insert(key, id);
        Ok(id)
    }

    fn visit(&mut self, value: &Value) -> Result<u32> {
        let node = match value {
            Value::Array(items) => Node::List(
                items
                    .iter()
                    .map(|item| self.visit(item))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Object(map) => {
                let mut keys = Vec::with_capacity(map.len());
                let mut children = Vec::with_capacity(map.len());
                for (key, child) in map {
                    keys.push(key.clone());
                    children.push(self.visit(child)?);
                }
                Node::Record {
                    s: self.intern_shape(keys)?,
                    v: children,
                }
            }
            scalar => Node::Scalar(scalar.clone()),
        };
        self.intern_node(node)
    }
}

/// Pack a JSON tree
pub fn pack(value: &Value) -> Result<PackedDocument> {
    let mut packer = Packer::default();
    let root = packer.visit(value)?;
    Ok(PackedDocument {
        shapes: packer.shapes,
        nodes: packer.nodes,
        root,
    })
}

/// Serialize a value to JSON and pack it
pub fn pack_serializable<T: Serialize>(value: &T) -> Result<PackedDocument> {
    let tree = serde_json::to_value(value).map_err(|e| {
        ScreenpackError::encoding_with_code(ErrorCode::ENCODING_SERIALIZE, e.to_string())
            .with_source(e)
    })?;
    pack(&tree)
}

fn corrupt(message: String) -> ScreenpackError {
    ScreenpackError::encoding_with_code(ErrorCode::ENCODING_CORRUPT_PACK, message)
}

/// Rebuild the tree a document was packed from
pub fn unpack(doc: &PackedDocument) -> Result<Value> {
    let mut decoded: Vec<Value> = Vec::with_capacity(doc.nodes.len());

    for (index, node) in doc.nodes.iter().enumerate() {
        let child = |decoded: &[Value], r: u32| -> Result<Value> {
            decoded.get(r as usize).cloned().ok_or_else(|| {
                corrupt(format!(
                    "node {} references node {} which is not decoded before it",
                    index, r
                ))
            })
        };
        let value = match node {
            Node::List(refs) => Value::Array(
                refs.iter()
                    .map(|&r| child(&decoded, r))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Node::Record { s, v } => {
                let keys = doc.shapes.get(*s as usize).ok_or_else(|| {
                    corrupt(format!("node {} references missing shape {}", index, s))
                })?;
                if keys.len() != v.len() {
                    return Err(corrupt(format!(
                        "node {} has {} values for a shape of {} keys",
                        index,
                        v.len(),
                        keys.len()
                    )));
                }
                let mut map = Map::with_capacity(keys.len());
                for (key, &r) in keys.iter().zip(v) {
                    map.insert(key.clone(), child(&decoded, r)?);
                }
                Value::Object(map)
            }
            Node::Scalar(Value::Array(_)) | Node::Scalar(Value::Object(_)) => {
                return Err(corrupt(format!("node {} is not a valid node", index)));
            }
            Node::Scalar(scalar) => scalar.clone(),
        };
        decoded.push(value);
    }

    decoded
        .into_iter()
        .nth(doc.root as usize)
        .ok_or_else(|| corrupt(format!("root {} is out of range", doc.root)))
}

/// Deserialize a packed document from JSON bytes and unpack it
pub fn unpack_slice(bytes: &[u8]) -> Result<Value> {
    let doc: PackedDocument = serde_json::from_slice(bytes).map_err(|e| {
        ScreenpackError::encoding_with_code(ErrorCode::ENCODING_CORRUPT_PACK, e.to_string())
            .with_source(e)
    })?;
    unpack(&doc)
}
