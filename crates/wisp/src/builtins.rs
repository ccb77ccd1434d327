//! The array builtins every runner registers up front.

use crate::{heap::Heap, natives::Natives, scopes::Vars, value::Value};

/// Registers the standard array functions and binds them as globals.
pub(crate) fn install(natives: &mut Natives, vars: &mut Vars) {
    for (name, f) in [
        ("array_size", array_size as fn(&mut Heap, &[Value]) -> Result<Value, String>),
        ("array_push", array_push),
        ("array_pop", array_pop),
    ] {
        let id = natives.register(name, f);
        vars.define_global(name, Value::NativeFn(id));
    }
}

fn array_size(heap: &mut Heap, args: &[Value]) -> Result<Value, String> {
    let [Value::Array(id)] = args else {
        return Err("expected a single array argument".to_owned());
    };
    let len = heap.array(*id).map_or(0, Vec::len);
    Ok(Value::Number(len as f32))
}

fn array_push(heap: &mut Heap, args: &[Value]) -> Result<Value, String> {
    let [Value::Array(id), value] = args else {
        return Err("expected an array and a value".to_owned());
    };
    let Some(elements) = heap.array_mut(*id) else {
        return Err("internal error: array storage missing".to_owned());
    };
    elements.push(value.clone());
    Ok(Value::Undefined)
}

/// `array_pop(a)` removes and returns the last element (undefined when the
/// array is already empty); `array_pop(a, i)` removes and returns the
/// element at the truncated index `i`.
fn array_pop(heap: &mut Heap, args: &[Value]) -> Result<Value, String> {
    match args {
        [Value::Array(id)] => {
            let Some(elements) = heap.array_mut(*id) else {
                return Err("internal error: array storage missing".to_owned());
            };
            Ok(elements.pop().unwrap_or(Value::Undefined))
        }
        [Value::Array(id), Value::Number(index)] => {
            let Some(elements) = heap.array_mut(*id) else {
                return Err("internal error: array storage missing".to_owned());
            };
            let idx = *index as i64;
            if idx < 0 || idx as usize >= elements.len() {
                return Err(format!("index {idx} out of range (len {})", elements.len()));
            }
            Ok(elements.remove(idx as usize))
        }
        _ => Err("expected an array and an optional numeric index".to_owned()),
    }
}
