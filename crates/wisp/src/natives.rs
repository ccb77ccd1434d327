//! The native-function registry: the host side of the bridge.
//!
//! A native function is registered under a global name; scripts resolve it
//! like any identifier and call it with the regular calling convention. The
//! callable receives the evaluated argument values plus the heap, so it can
//! allocate results through the same machinery as the interpreter and
//! mutate tables or arrays through the shared handles in its arguments.

use std::rc::Rc;

use crate::{heap::Heap, value::Value};

/// Identifier of a registered native function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeFnId(u32);

impl NativeFnId {
    pub(crate) fn new(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw id, as shown by `<native function N>` renderings.
    #[must_use]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// A host callable. A failure message is turned into an eval error at the
/// call site.
pub type NativeCallable = Rc<dyn Fn(&mut Heap, &[Value]) -> Result<Value, String>>;

#[derive(Default)]
pub(crate) struct Natives {
    names: Vec<String>,
    callables: Vec<NativeCallable>,
}

impl std::fmt::Debug for Natives {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Natives").field("names", &self.names).finish()
    }
}

impl Natives {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: &str,
        f: impl Fn(&mut Heap, &[Value]) -> Result<Value, String> + 'static,
    ) -> NativeFnId {
        let id = NativeFnId::new(self.callables.len());
        self.names.push(name.to_owned());
        self.callables.push(Rc::new(f));
        id
    }

    /// Clones out the callable so it can be invoked while the interpreter
    /// state is borrowed mutably.
    pub fn get(&self, id: NativeFnId) -> Option<NativeCallable> {
        self.callables.get(id.index()).cloned()
    }

    pub fn name(&self, id: NativeFnId) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }
}
