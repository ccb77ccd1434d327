use crate::expressions::NodeId;

/// Identifier of a script function in the AST's function table. Ids are
/// dense and assigned in registration order while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FnId(u32);

impl FnId {
    pub(crate) fn new(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw id, as shown by `<function N>` renderings.
    #[must_use]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// A function literal: parameter names in declaration order plus the body
/// block. The body's statement list has its own-scope flag forced off; the
/// function activation scope substitutes for it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Function {
    pub params: Vec<String>,
    pub body: NodeId,
}
