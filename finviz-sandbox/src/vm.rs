//! RustPython interpreter lifecycle for one snippet execution.
//!
//! Each call builds a fresh interpreter: frozen stdlib plus native stdlib
//! modules plus the capability modules from the namespace. Inside
//! `enter()` the escape-hatch builtins are stripped, stdout/stderr are
//! redirected into a capture buffer, and `builtins.__import__` is
//! replaced with a native hook that enforces the module allowlist for
//! imports originating from user code. The original import function is
//! captured only by the Rust closure, so executed code has no path back
//! to it.

use std::sync::{Arc, Mutex};

use rustpython_vm::builtins::{PyBaseExceptionRef, PyModule};
use rustpython_vm::compiler::Mode;
use rustpython_vm::function::FuncArgs;
use rustpython_vm::scope::Scope;
use rustpython_vm::{
    AsObject, Interpreter, PyObjectRef, PyPayload, PyResult, Settings, VirtualMachine,
};

use crate::allowlist::ModulePolicy;
use crate::convert::py_to_json;
use crate::executor::RESULT_VAR;
use crate::namespace::CapabilityNamespace;
use crate::outcome::{CapturedValue, ExecutionError, Outcome};

/// Sentinel prefix on the ImportError raised by the allowlist hook.
const DENIED_MARKER: &str = "ModuleNotAllowed:";

/// Cap on runtime error messages surfaced to callers.
const MAX_ERROR_MESSAGE: usize = 400;

/// Cap on captured stdout/stderr kept for debug logging.
const MAX_CAPTURED_OUTPUT: usize = 64 * 1024;

/// Builtins that reach outside the evaluation scope: filesystem, process
/// interaction, scope introspection, and nested compilation.
const STRIP_BUILTINS: &str = r#"
import builtins as _b
for _name in ('open', 'input', 'breakpoint', 'exec', 'eval', 'compile',
              'vars', 'globals', 'locals', 'memoryview', 'help'):
    if hasattr(_b, _name):
        delattr(_b, _name)
"#;

/// Compile and run one snippet in a fresh, restricted interpreter.
pub(crate) fn run_snippet(
    code: &str,
    namespace: &CapabilityNamespace,
    policy: &ModulePolicy,
) -> Outcome {
    let interpreter = build_interpreter(namespace);
    let captured = Arc::new(Mutex::new(String::new()));

    let outcome = interpreter.enter(|vm| {
        if let Err(err) = strip_builtins(vm) {
            return Outcome::Failure(err);
        }
        install_output_capture(vm, Arc::clone(&captured));
        install_import_hook(vm, policy.clone());

        let scope = vm.new_scope_with_builtins();
        let _ = scope
            .globals
            .set_item("__name__", vm.ctx.new_str("__main__").into(), vm);

        // Pre-bind capability aliases so snippets can use them without an
        // explicit import, matching how the integration declares them.
        for binding in namespace.bindings() {
            let module = binding.make_module(vm);
            let _ = scope.globals.set_item(binding.alias(), module.into(), vm);
        }

        let code_obj = match vm.compile(code, Mode::Exec, "<snippet>".to_owned()) {
            Ok(c) => c,
            Err(e) => {
                return Outcome::Failure(ExecutionError::Syntax {
                    message: e.to_string(),
                })
            }
        };

        if let Err(exc) = vm.run_code_obj(code_obj, scope.clone()) {
            return Outcome::Failure(classify_exception(vm, &exc));
        }

        extract_result(vm, &scope)
    });

    if let Ok(buf) = captured.lock() {
        if !buf.is_empty() {
            tracing::debug!(output = %buf.trim_end(), "snippet wrote to stdout/stderr");
        }
    }

    outcome
}

fn build_interpreter(namespace: &CapabilityNamespace) -> Interpreter {
    let bindings = namespace.bindings().to_vec();
    Interpreter::with_init(Settings::default(), move |vm| {
        vm.add_native_modules(rustpython_stdlib::get_module_inits());
        vm.add_frozen(rustpython_pylib::FROZEN_STDLIB);
        for binding in &bindings {
            let binding = Arc::clone(binding);
            vm.add_native_module(
                binding.alias().to_owned(),
                Box::new(move |vm: &VirtualMachine| binding.make_module(vm)),
            );
        }
    })
}

fn strip_builtins(vm: &VirtualMachine) -> Result<(), ExecutionError> {
    let code = vm
        .compile(STRIP_BUILTINS, Mode::Exec, "<sandbox-setup>".to_owned())
        .map_err(|e| ExecutionError::Runtime {
            message: format!("sandbox setup failed to compile: {e}"),
        })?;
    let scope = vm.new_scope_with_builtins();
    vm.run_code_obj(code, scope)
        .map_err(|_| ExecutionError::Runtime {
            message: "sandbox setup failed".to_owned(),
        })?;
    Ok(())
}

/// Replace `builtins.__import__` with the allowlist gate.
fn install_import_hook(vm: &VirtualMachine, policy: ModulePolicy) {
    let original_import = match vm.builtins.get_attr("__import__", vm) {
        Ok(f) => f,
        Err(_) => return,
    };
    // PyObjectRef stays on the VM thread; the Arc only satisfies the
    // closure's 'static bound.
    #[allow(clippy::arc_with_non_send_sync)]
    let original_import = Arc::new(original_import);

    let hook = vm.new_function(
        "__import__",
        move |args: FuncArgs, vm: &VirtualMachine| -> PyResult<PyObjectRef> {
            let module_name: String = args
                .args
                .first()
                .and_then(|o| o.str(vm).ok())
                .map(|s| s.as_str().to_owned())
                .unwrap_or_default();

            // Only imports issued by user code are gated; allowed stdlib
            // modules may satisfy their internal imports freely.
            if is_user_code_import(&args, vm) && !policy.allows(&module_name) {
                return Err(vm.new_exception_msg(
                    vm.ctx.exceptions.import_error.to_owned(),
                    format!("{DENIED_MARKER}{module_name}"),
                ));
            }
            original_import.call(args, vm)
        },
    );
    let _ = vm.builtins.set_attr("__import__", hook, vm);
}

/// User code runs with `__name__ == "__main__"`; any real module has its
/// own name in its globals.
fn is_user_code_import(args: &FuncArgs, vm: &VirtualMachine) -> bool {
    let Some(globals) = args.args.get(1) else {
        return true;
    };
    if vm.is_none(globals) {
        return true;
    }
    if let Ok(name_val) = vm.call_method(globals, "get", (vm.ctx.new_str("__name__"),)) {
        if !vm.is_none(&name_val) {
            if let Ok(name_str) = name_val.str(vm) {
                return name_str.as_str() == "__main__";
            }
        }
    }
    true
}

/// Redirect `sys.stdout`/`sys.stderr` into a capture buffer so snippet
/// prints cannot reach the process stdout, which carries the protocol.
fn install_output_capture(vm: &VirtualMachine, buffer: Arc<Mutex<String>>) {
    let writer = capture_writer(vm, buffer);
    let _ = vm.sys_module.set_attr("stdout", writer.clone(), vm);
    let _ = vm.sys_module.set_attr("stderr", writer, vm);
}

fn capture_writer(vm: &VirtualMachine, buffer: Arc<Mutex<String>>) -> PyObjectRef {
    let write_fn = vm.new_function(
        "write",
        move |args: FuncArgs, vm: &VirtualMachine| -> PyResult<PyObjectRef> {
            let data: String = args
                .args
                .first()
                .and_then(|o| o.str(vm).ok())
                .map(|s| s.as_str().to_owned())
                .unwrap_or_default();
            if let Ok(mut buf) = buffer.lock() {
                if buf.len() < MAX_CAPTURED_OUTPUT {
                    buf.push_str(&data);
                }
            }
            Ok(vm.ctx.new_int(data.len()).into())
        },
    );
    let flush_fn = vm.new_function(
        "flush",
        move |_args: FuncArgs, vm: &VirtualMachine| -> PyResult<PyObjectRef> { Ok(vm.ctx.none()) },
    );

    let module = PyModule::new().into_ref(&vm.ctx);
    let dict = module.dict();
    let _ = dict.set_item("write", write_fn.into(), vm);
    let _ = dict.set_item("flush", flush_fn.into(), vm);
    let _ = dict.set_item("closed", vm.ctx.new_bool(false).into(), vm);
    let _ = dict.set_item("encoding", vm.ctx.new_str("utf-8").into(), vm);
    module.into()
}

fn classify_exception(vm: &VirtualMachine, exc: &PyBaseExceptionRef) -> ExecutionError {
    let message = exc
        .as_object()
        .str(vm)
        .map(|s| s.as_str().to_owned())
        .unwrap_or_else(|_| "unknown execution error".to_owned());

    if let Some(module) = message.strip_prefix(DENIED_MARKER) {
        return ExecutionError::CapabilityDenied {
            module: module.to_owned(),
        };
    }

    ExecutionError::Runtime {
        message: truncate_message(&message),
    }
}

fn extract_result(vm: &VirtualMachine, scope: &Scope) -> Outcome {
    let globals: PyObjectRef = scope.globals.as_object().to_owned();

    // Containment first: `result = None` is a legitimate binding and must
    // not read as missing.
    let bound = vm
        .call_method(&globals, "__contains__", (vm.ctx.new_str(RESULT_VAR),))
        .ok()
        .and_then(|v| v.try_to_value::<bool>(vm).ok())
        .unwrap_or(false);
    if !bound {
        return Outcome::Failure(ExecutionError::MissingResult);
    }

    let value = match vm.call_method(&globals, "get", (vm.ctx.new_str(RESULT_VAR),)) {
        Ok(v) => v,
        Err(_) => return Outcome::Failure(ExecutionError::MissingResult),
    };

    match py_to_json(&value, vm) {
        Ok(json) => Outcome::Success(CapturedValue::Json(json)),
        Err(_) => {
            let repr = value
                .repr(vm)
                .map(|s| s.as_str().to_owned())
                .unwrap_or_else(|_| "<unrepresentable result>".to_owned());
            Outcome::Success(CapturedValue::Repr(repr))
        }
    }
}

fn truncate_message(message: &str) -> String {
    if message.len() <= MAX_ERROR_MESSAGE {
        return message.to_owned();
    }
    let mut cut = MAX_ERROR_MESSAGE;
    while !message.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &message[..cut])
}
