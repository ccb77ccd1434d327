//! The abstract syntax tree: a closed sum of node kinds stored in an arena.
//!
//! Nodes are arena-allocated and addressed by [`NodeId`]; they are never
//! freed individually and live until the owning [`Ast`] is dropped. A node's
//! id doubles as its stable identity when the interpreter synthesizes scope
//! prefixes.

use crate::{
    error::CodeLoc,
    function::{FnId, Function},
};

/// Index of a node in the [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw value used as the node's identity in scope prefixes.
    #[inline]
    pub(crate) fn raw(self) -> u32 {
        self.0
    }
}

/// Binary operators, grouped the way the precedence ladder groups them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub(crate) enum BinOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    NotEq,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = "<=")]
    LessEq,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = ">=")]
    GreaterEq,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub(crate) enum UnOp {
    #[strum(serialize = "-")]
    Neg,
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "!")]
    Not,
}

/// One AST node kind. Statements and expressions share the arena; `if` in
/// particular appears in both positions with the same representation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Number(f32),
    Str(String),
    Ident(String),
    /// `object.name` — a live handle into a table member.
    Member { object: NodeId, name: String },
    /// `{ name = expr; ... }` — members kept in source order, last duplicate
    /// wins.
    TableMaker { members: Vec<(String, NodeId)> },
    /// `array{ expr, ... }`
    ArrayMaker { elements: Vec<NodeId> },
    BinOp { op: BinOp, left: NodeId, right: NodeId },
    UnOp { op: UnOp, operand: NodeId },
    /// `callee(args...)` — the callee is any postfix-chained expression.
    Call { callee: NodeId, args: Vec<NodeId> },
    /// `array[index]` — a live handle into an array slot.
    Index { array: NodeId, index: NodeId },
    Assign { target: NodeId, value: NodeId },
    /// A block or the program root. `own_scope` is off for the program root
    /// and for function bodies.
    StatementList { statements: Vec<NodeId>, own_scope: bool },
    If {
        cond: NodeId,
        then: NodeId,
        or_else: Option<NodeId>,
    },
    While { cond: NodeId, body: NodeId },
    For {
        init: NodeId,
        cond: NodeId,
        post: NodeId,
        body: NodeId,
    },
    Print(NodeId),
    Return(Option<NodeId>),
    /// A function literal, already registered in the function table.
    FnDecl(FnId),
}

/// An AST node with its source location.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Node {
    pub location: CodeLoc,
    pub expr: Expr,
}

/// The parser's output: the node arena, the program root, and the dense
/// function table.
#[derive(Debug, PartialEq)]
pub(crate) struct Ast {
    nodes: Vec<Node>,
    functions: Vec<Function>,
    root: NodeId,
}

impl Ast {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            functions: Vec::new(),
            root: NodeId::new(0),
        }
    }

    pub(crate) fn push(&mut self, location: CodeLoc, expr: Expr) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node { location, expr });
        id
    }

    pub(crate) fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    /// Assigns the next function id. The body is patched in once parsed, so
    /// ids are handed out in pre-order: outer literals before inner ones.
    pub(crate) fn declare_function(&mut self, params: Vec<String>) -> FnId {
        let id = FnId::new(self.functions.len());
        self.functions.push(Function {
            params,
            body: NodeId::new(0),
        });
        id
    }

    pub(crate) fn set_function_body(&mut self, id: FnId, body: NodeId) {
        self.functions[id.index()].body = body;
    }

    pub(crate) fn function(&self, id: FnId) -> Option<&Function> {
        self.functions.get(id.index())
    }

    #[cfg(test)]
    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[cfg(test)]
    pub(crate) fn function_count(&self) -> usize {
        self.functions.len()
    }
}
