//! Host-facing value exchange.
//!
//! [`Object`] is the owned, heap-independent mirror of [`Value`]: it can be
//! freely cloned and stored by the host, passed into
//! [`Runner::call`](crate::Runner::call) and
//! [`Runner::set`](crate::Runner::set), and read back via
//! [`Runner::get`](crate::Runner::get).

use std::fmt;

use ahash::AHashSet;

use crate::{
    function::FnId,
    heap::{Heap, HeapId},
    value::Value,
};

/// A script value that can cross the embedding boundary.
///
/// Most variants convert in both directions. `Repr` is output-only: it
/// stands in for values with no owned representation (native functions and
/// the inner occurrence of a cyclic collection) and is rejected as input.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Undefined,
    Number(f32),
    Str(String),
    /// An array, element by element.
    Array(Vec<Object>),
    /// A table, as name/value pairs in the table's insertion order.
    Table(Vec<(String, Object)>),
    /// A script function id, valid for the runner it came from.
    Function(u32),
    /// Output-only rendering fallback.
    Repr(String),
}

impl Object {
    /// Reads a runtime value out of the interpreter, walking collections
    /// through the heap. Cycles collapse to a `Repr` placeholder.
    #[must_use]
    pub fn from_value(value: &Value, heap: &Heap) -> Self {
        let mut seen = AHashSet::new();
        Self::from_value_inner(value, heap, &mut seen)
    }

    fn from_value_inner(value: &Value, heap: &Heap, seen: &mut AHashSet<HeapId>) -> Self {
        match value {
            Value::Undefined => Self::Undefined,
            Value::Number(n) => Self::Number(*n),
            Value::Str(s) => Self::Str(s.clone()),
            Value::Fn(id) => Self::Function(id.raw()),
            Value::NativeFn(id) => Self::Repr(format!("<native function {}>", id.raw())),
            Value::Table(id) => {
                if !seen.insert(*id) {
                    return Self::Repr("{...}".to_owned());
                }
                let mut members = Vec::new();
                if let Some(table) = heap.table(*id) {
                    for (name, member) in table {
                        members.push((name.clone(), Self::from_value_inner(member, heap, seen)));
                    }
                }
                seen.remove(id);
                Self::Table(members)
            }
            Value::Array(id) => {
                if !seen.insert(*id) {
                    return Self::Repr("[...]".to_owned());
                }
                let mut elements = Vec::new();
                if let Some(slots) = heap.array(*id) {
                    for element in slots {
                        elements.push(Self::from_value_inner(element, heap, seen));
                    }
                }
                seen.remove(id);
                Self::Array(elements)
            }
        }
    }

    /// Converts into a runtime value, allocating collections into the heap.
    ///
    /// # Errors
    /// Fails for `Repr`, which has no runtime counterpart.
    pub fn into_value(self, heap: &mut Heap) -> Result<Value, String> {
        match self {
            Self::Undefined => Ok(Value::Undefined),
            Self::Number(n) => Ok(Value::Number(n)),
            Self::Str(s) => Ok(Value::Str(s)),
            Self::Function(raw) => Ok(Value::Fn(FnId::from_raw(raw))),
            Self::Repr(_) => Err("a repr object cannot be passed back to the interpreter".to_owned()),
            Self::Array(elements) => {
                let id = heap.alloc_array();
                for element in elements {
                    let value = element.into_value(heap)?;
                    if let Some(slots) = heap.array_mut(id) {
                        slots.push(value);
                    }
                }
                Ok(Value::Array(id))
            }
            Self::Table(members) => {
                let id = heap.alloc_table();
                for (name, member) in members {
                    let value = member.into_value(heap)?;
                    if let Some(table) = heap.table_mut(id) {
                        table.insert(name, value);
                    }
                }
                Ok(Value::Table(id))
            }
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("<undefined>"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
            Self::Function(id) => write!(f, "<function {id}>"),
            Self::Repr(text) => f.write_str(text),
            Self::Array(elements) => {
                f.write_str("[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str("]")
            }
            Self::Table(members) => {
                f.write_str("{ ")?;
                for (i, (name, member)) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{name} = {member}")?;
                }
                f.write_str(" }")
            }
        }
    }
}

impl TryFrom<&Object> for f32 {
    type Error = String;

    fn try_from(object: &Object) -> Result<Self, Self::Error> {
        match object {
            Object::Number(n) => Ok(*n),
            other => Err(format!("expected a number, got {other:?}")),
        }
    }
}

impl TryFrom<&Object> for String {
    type Error = String;

    fn try_from(object: &Object) -> Result<Self, Self::Error> {
        match object {
            Object::Str(s) => Ok(s.clone()),
            other => Err(format!("expected a string, got {other:?}")),
        }
    }
}
