//! Lexical scoping on a flat name table.
//!
//! Every live variable is one entry in a single map keyed by its qualified
//! name: the concatenation of the active scope prefixes plus the bare
//! identifier. A scope prefix is synthesized from the identity of the AST
//! node that opened the scope, so re-entering the same block reuses the
//! same keys while nested activations (recursion included) accumulate
//! distinct prefixes.

use ahash::AHashMap;

use crate::{
    error::{CodeLoc, Exception, RunResult},
    expressions::NodeId,
    value::Value,
};

#[derive(Debug, Default)]
pub(crate) struct Vars {
    values: AHashMap<String, Value>,
    /// Each entry is the full prefix for that depth, already containing its
    /// parent's prefix.
    scope_stack: Vec<String>,
}

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.scope_stack.len()
    }

    /// Opens a scope keyed by `node` (plus an optional postfix, used to keep
    /// the two branches of an `if` apart).
    pub fn push_scope(&mut self, node: NodeId, postfix: Option<&str>) {
        let mut prefix = match self.scope_stack.last() {
            Some(parent) => format!("{parent} {}", node.raw()),
            None => node.raw().to_string(),
        };
        if let Some(postfix) = postfix {
            prefix.push_str(postfix);
        }
        self.scope_stack.push(prefix);
    }

    pub fn pop_scope(&mut self) -> RunResult<()> {
        if self.scope_stack.pop().is_none() {
            return Err(Exception::eval(
                CodeLoc::default(),
                "internal error: scope stack underflow",
            ));
        }
        Ok(())
    }

    /// Resolves `name` innermost-first against the scope stack, then as a
    /// bare global. Returns the qualified key of the first hit.
    pub fn resolve(&self, name: &str) -> Option<String> {
        for prefix in self.scope_stack.iter().rev() {
            let qualified = format!("{prefix} {name}");
            if self.values.contains_key(&qualified) {
                return Some(qualified);
            }
        }
        if self.values.contains_key(name) {
            return Some(name.to_owned());
        }
        None
    }

    /// The key `name` would get if materialized in the innermost scope. At
    /// depth zero this is the bare name, so unresolved top-level names
    /// become globals.
    pub fn innermost_key(&self, name: &str) -> String {
        match self.scope_stack.last() {
            Some(prefix) => format!("{prefix} {name}"),
            None => name.to_owned(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: String, value: Value) {
        self.values.insert(key, value);
    }

    /// Writes a global under its bare name, regardless of the current scope
    /// stack. Used for native registrations and host pokes.
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_owned(), value);
    }

    pub fn get_global(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn resolution_walks_inner_to_outer_then_globals() {
        let mut vars = Vars::new();
        vars.define_global("x", Value::Number(1.0));
        vars.push_scope(NodeId::new(7), None);
        assert_eq!(vars.resolve("x"), Some("x".to_owned()));

        let inner_key = vars.innermost_key("x");
        vars.insert(inner_key.clone(), Value::Number(2.0));
        assert_eq!(vars.resolve("x"), Some(inner_key));

        vars.pop_scope().unwrap();
        assert_eq!(vars.resolve("x"), Some("x".to_owned()));
    }

    #[test]
    fn nested_scopes_accumulate_prefixes() {
        let mut vars = Vars::new();
        vars.push_scope(NodeId::new(1), None);
        vars.push_scope(NodeId::new(1), None);
        // Same node pushed twice nests rather than collides.
        let key = vars.innermost_key("n");
        assert_eq!(key, "1 1 n");
    }

    #[test]
    fn branch_postfixes_keep_scopes_apart() {
        let mut vars = Vars::new();
        vars.push_scope(NodeId::new(4), Some("true"));
        let then_key = vars.innermost_key("v");
        vars.pop_scope().unwrap();
        vars.push_scope(NodeId::new(4), Some("false"));
        let else_key = vars.innermost_key("v");
        assert_ne!(then_key, else_key);
    }

    #[test]
    fn pop_on_empty_stack_is_an_error() {
        let mut vars = Vars::new();
        assert!(vars.pop_scope().is_err());
    }
}
