//! The runtime value model shared by the interpreter and host natives.

use std::fmt::Write;

use ahash::AHashSet;

use crate::{
    function::FnId,
    heap::{Heap, HeapId},
    natives::NativeFnId,
};

/// A runtime value.
///
/// Primitives (`Undefined`, `Number`, `Str`, `Fn`, `NativeFn`) are
/// value-typed and copied on assignment. `Table` and `Array` carry a shared
/// [`HeapId`] handle: copying one of these copies the handle, and mutation
/// through either copy observes the same underlying collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Number(f32),
    Str(String),
    Table(HeapId),
    Array(HeapId),
    /// A script function, resolved through the function table.
    Fn(FnId),
    /// A host function, resolved through the native registry.
    NativeFn(NativeFnId),
}

impl Value {
    /// Type name used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Table(_) => "table",
            Self::Array(_) => "array",
            Self::Fn(_) => "function",
            Self::NativeFn(_) => "native function",
        }
    }

    /// `if` truthiness: false iff the value is the number zero.
    pub(crate) fn is_truthy(&self) -> bool {
        !matches!(self, Self::Number(n) if *n == 0.0)
    }

    /// Loop truthiness: `while` and `for` continue only on a nonzero number.
    pub(crate) fn is_nonzero_number(&self) -> bool {
        matches!(self, Self::Number(n) if *n != 0.0)
    }

    /// Human-readable rendering, as written by `print`.
    ///
    /// Numbers use the fixed six-decimal form; strings render verbatim;
    /// collections render as multi-line bracketed blocks with members
    /// printed recursively. A collection that reaches itself renders the
    /// inner occurrence as `...`.
    #[must_use]
    pub fn render(&self, heap: &Heap) -> String {
        let mut out = String::new();
        let mut seen = AHashSet::new();
        self.render_fmt(&mut out, heap, &mut seen)
            .expect("writing to a String does not fail");
        out
    }

    fn render_fmt(
        &self,
        f: &mut impl Write,
        heap: &Heap,
        seen: &mut AHashSet<HeapId>,
    ) -> std::fmt::Result {
        match self {
            Self::Undefined => f.write_str("<undefined>"),
            Self::Number(n) => write!(f, "{n:.6}"),
            Self::Str(s) => f.write_str(s),
            Self::Fn(id) => write!(f, "<function {}>", id.raw()),
            Self::NativeFn(id) => write!(f, "<native function {}>", id.raw()),
            Self::Table(id) => {
                if !seen.insert(*id) {
                    return f.write_str("...");
                }
                f.write_str("{ \n")?;
                if let Some(table) = heap.table(*id) {
                    for (name, value) in table {
                        write!(f, "{name} = ")?;
                        value.render_fmt(f, heap, seen)?;
                        f.write_char('\n')?;
                    }
                }
                f.write_str("}")?;
                seen.remove(id);
                Ok(())
            }
            Self::Array(id) => {
                if !seen.insert(*id) {
                    return f.write_str("...");
                }
                f.write_str("[ \n")?;
                if let Some(elements) = heap.array(*id) {
                    for value in elements {
                        value.render_fmt(f, heap, seen)?;
                        f.write_char('\n')?;
                    }
                }
                f.write_str("]")?;
                seen.remove(id);
                Ok(())
            }
        }
    }
}

/// Shortest round-trip decimal rendering, used when numbers are spliced
/// into strings by `+`.
pub(crate) fn format_number_short(n: f32) -> String {
    let mut buffer = ryu::Buffer::new();
    buffer.format(n).to_owned()
}
