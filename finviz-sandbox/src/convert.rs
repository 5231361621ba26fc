//! Conversion between Python objects and JSON values.
//!
//! The Python→JSON direction is strict: a value outside the
//! JSON-representable subset (primitives, lists/tuples, string-keyed
//! dicts) yields [`Unrepresentable`] so the executor can fall back to the
//! value's `repr`. The JSON→Python direction is total.

use rustpython_vm::builtins::{PyDict, PyFloat, PyInt, PyList, PyStr, PyTuple};
use rustpython_vm::{AsObject, PyObjectRef, PyResult, VirtualMachine};
use serde_json::Value;
use thiserror::Error;

/// Nesting cap for the Python→JSON walk; self-referential containers
/// must not spin the converter.
const MAX_DEPTH: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("value is not JSON-representable")]
pub struct Unrepresentable;

/// Convert a Python object into a JSON value.
pub fn py_to_json(obj: &PyObjectRef, vm: &VirtualMachine) -> Result<Value, Unrepresentable> {
    py_to_json_inner(obj, vm, 0)
}

fn py_to_json_inner(
    obj: &PyObjectRef,
    vm: &VirtualMachine,
    depth: usize,
) -> Result<Value, Unrepresentable> {
    if depth > MAX_DEPTH {
        return Err(Unrepresentable);
    }

    if vm.is_none(obj) {
        return Ok(Value::Null);
    }

    // bool is a subclass of int; it must win the downcast race.
    if obj.class().is(vm.ctx.types.bool_type) {
        if let Ok(b) = obj.try_to_value::<bool>(vm) {
            return Ok(Value::Bool(b));
        }
        return Err(Unrepresentable);
    }

    if let Some(i) = obj.downcast_ref::<PyInt>() {
        return match i.try_to_primitive::<i64>(vm) {
            Ok(n) => Ok(Value::Number(n.into())),
            // Out of i64 range; JSON numbers stop here.
            Err(_) => Err(Unrepresentable),
        };
    }

    if let Some(f) = obj.downcast_ref::<PyFloat>() {
        return serde_json::Number::from_f64(f.to_f64())
            .map(Value::Number)
            .ok_or(Unrepresentable);
    }

    if let Some(s) = obj.downcast_ref::<PyStr>() {
        return Ok(Value::String(s.as_str().to_string()));
    }

    if let Some(list) = obj.downcast_ref::<PyList>() {
        let items: Result<Vec<Value>, Unrepresentable> = list
            .borrow_vec()
            .iter()
            .map(|item| py_to_json_inner(item, vm, depth + 1))
            .collect();
        return Ok(Value::Array(items?));
    }

    if let Some(tuple) = obj.downcast_ref::<PyTuple>() {
        let items: Result<Vec<Value>, Unrepresentable> = tuple
            .as_slice()
            .iter()
            .map(|item| py_to_json_inner(item, vm, depth + 1))
            .collect();
        return Ok(Value::Array(items?));
    }

    if let Some(dict) = obj.downcast_ref::<PyDict>() {
        let mut map = serde_json::Map::new();
        for (k, v) in dict {
            // Keys are coerced to strings, as a JSON encoder would.
            let key = k
                .str(vm)
                .map_err(|_| Unrepresentable)?
                .as_str()
                .to_string();
            let value = py_to_json_inner(&v, vm, depth + 1)?;
            map.insert(key, value);
        }
        return Ok(Value::Object(map));
    }

    Err(Unrepresentable)
}

/// Convert a JSON value into a Python object.
pub fn json_to_py(value: &Value, vm: &VirtualMachine) -> PyResult {
    match value {
        Value::Null => Ok(vm.ctx.none()),
        Value::Bool(b) => Ok(vm.ctx.new_bool(*b).into()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(vm.ctx.new_int(i).into())
            } else if let Some(f) = n.as_f64() {
                Ok(vm.ctx.new_float(f).into())
            } else {
                Ok(vm.ctx.none())
            }
        }
        Value::String(s) => Ok(vm.ctx.new_str(s.clone()).into()),
        Value::Array(arr) => {
            let items: Result<Vec<_>, _> = arr.iter().map(|v| json_to_py(v, vm)).collect();
            Ok(vm.ctx.new_list(items?).into())
        }
        Value::Object(obj) => {
            let dict = PyDict::new_ref(&vm.ctx);
            for (k, v) in obj {
                let value = json_to_py(v, vm)?;
                dict.set_item(k.as_str(), value, vm)?;
            }
            Ok(dict.into())
        }
    }
}
