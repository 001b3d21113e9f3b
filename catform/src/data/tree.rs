use log::debug;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::data::path::{Path, PathSeg};

/// Errors raised by record tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The path does not exist in the record.
    #[error("no value at {path}")]
    NotFound { path: String },
    /// A path segment does not match the value it addresses.
    #[error("type mismatch at {path}: expected {expected}, found {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },
    /// An index segment lies beyond the end of its list.
    #[error("index {index} out of range at {path} (length {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
    /// The path does not end in an index segment.
    #[error("{path} does not address a repeating instance")]
    NotAnInstance { path: String },
}

pub type Result<T> = std::result::Result<T, TreeError>;

/// Short type name used in error messages.
fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Read the value at a path, if present.
pub fn get<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut slot = root;
    for seg in path.segments() {
        slot = match (seg, slot) {
            (PathSeg::Name(name), Value::Object(map)) => map.get(name)?,
            (PathSeg::Index(i), Value::Array(items)) => items.get(*i)?,
            _ => return None,
        };
    }
    Some(slot)
}

/// Write a value at a path, creating intermediate containers.
///
/// Name segments descend into objects, turning null slots into empty
/// objects on the way. Index segments descend into lists; an index equal
/// to the list length appends, a larger one is out of range.
pub fn set(root: &mut Value, path: &Path, new_value: Value) -> Result<()> {
    let slot = slot_mut_or_create(root, path)?;
    *slot = new_value;
    Ok(())
}

/// Append a new empty instance to the repeating value at a path.
///
/// A list gains a trailing null element. Any other value (including null)
/// first becomes a one-element list holding it, then gains the new
/// element. Returns the index of the added instance.
pub fn add_instance(root: &mut Value, path: &Path) -> Result<usize> {
    let slot = slot_mut_or_create(root, path)?;
    let index = match slot {
        Value::Array(items) => {
            items.push(Value::Null);
            items.len() - 1
        }
        other => {
            let first = other.take();
            *other = Value::Array(vec![first, Value::Null]);
            1
        }
    };
    debug!("record: added instance {path}.{index}");
    Ok(index)
}

/// Remove the repeating instance a path addresses, returning its value.
pub fn remove_instance(root: &mut Value, path: &Path) -> Result<Value> {
    let (parent, index) = instance_location(path)?;
    let items = list_mut(root, &parent)?;
    if index >= items.len() {
        return Err(TreeError::IndexOutOfRange {
            path: parent.to_string(),
            index,
            len: items.len(),
        });
    }
    debug!("record: removed instance {path}");
    Ok(items.remove(index))
}

/// Move the repeating instance a path addresses to a new position.
///
/// The target position is clamped to the list bounds.
pub fn move_instance(root: &mut Value, path: &Path, to_index: usize) -> Result<()> {
    let (parent, index) = instance_location(path)?;
    let items = list_mut(root, &parent)?;
    if index >= items.len() {
        return Err(TreeError::IndexOutOfRange {
            path: parent.to_string(),
            index,
            len: items.len(),
        });
    }
    let moved = items.remove(index);
    let to = to_index.min(items.len());
    items.insert(to, moved);
    debug!("record: moved instance {path} to {to}");
    Ok(())
}

/// Split an instance path into its list path and index.
fn instance_location(path: &Path) -> Result<(Path, usize)> {
    match (path.parent(), path.last()) {
        (Some(parent), Some(PathSeg::Index(index))) => Ok((parent, *index)),
        _ => Err(TreeError::NotAnInstance {
            path: path.to_string(),
        }),
    }
}

/// Walk to an existing slot without creating anything.
fn slot_mut<'a>(root: &'a mut Value, path: &Path) -> Result<&'a mut Value> {
    let mut slot = root;
    let mut walked = Path::root();
    for seg in path.segments() {
        match seg {
            PathSeg::Name(name) => {
                let map = object_slot(slot, &walked)?;
                walked.push(name.as_str());
                slot = map.get_mut(name).ok_or_else(|| TreeError::NotFound {
                    path: walked.to_string(),
                })?;
            }
            PathSeg::Index(index) => {
                let items = array_slot(slot, &walked)?;
                if *index >= items.len() {
                    return Err(TreeError::IndexOutOfRange {
                        path: walked.to_string(),
                        index: *index,
                        len: items.len(),
                    });
                }
                walked.push(*index);
                slot = &mut items[*index];
            }
        }
    }
    Ok(slot)
}

/// Walk to a slot, creating missing containers along the way.
fn slot_mut_or_create<'a>(root: &'a mut Value, path: &Path) -> Result<&'a mut Value> {
    let mut slot = root;
    let mut walked = Path::root();
    for seg in path.segments() {
        match seg {
            PathSeg::Name(name) => {
                if slot.is_null() {
                    *slot = Value::Object(Map::new());
                }
                let map = object_slot(slot, &walked)?;
                walked.push(name.as_str());
                slot = map.entry(name.clone()).or_insert(Value::Null);
            }
            PathSeg::Index(index) => {
                if slot.is_null() {
                    *slot = Value::Array(Vec::new());
                }
                let items = array_slot(slot, &walked)?;
                if *index > items.len() {
                    return Err(TreeError::IndexOutOfRange {
                        path: walked.to_string(),
                        index: *index,
                        len: items.len(),
                    });
                }
                if *index == items.len() {
                    items.push(Value::Null);
                }
                walked.push(*index);
                slot = &mut items[*index];
            }
        }
    }
    Ok(slot)
}

fn list_mut<'a>(root: &'a mut Value, path: &Path) -> Result<&'a mut Vec<Value>> {
    let slot = slot_mut(root, path)?;
    match slot {
        Value::Array(items) => Ok(items),
        other => Err(TreeError::TypeMismatch {
            path: path.to_string(),
            expected: "list".to_string(),
            actual: value_kind(other).to_string(),
        }),
    }
}

fn object_slot<'a>(value: &'a mut Value, at: &Path) -> Result<&'a mut Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(TreeError::TypeMismatch {
            path: at.to_string(),
            expected: "object".to_string(),
            actual: value_kind(other).to_string(),
        }),
    }
}

fn array_slot<'a>(value: &'a mut Value, at: &Path) -> Result<&'a mut Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(TreeError::TypeMismatch {
            path: at.to_string(),
            expected: "list".to_string(),
            actual: value_kind(other).to_string(),
        }),
    }
}
