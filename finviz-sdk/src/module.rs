//! The `finvizfinance` capability module exposed to snippets.

use std::sync::Arc;

use finviz_sandbox::{json_to_py, CapabilityModule};
use rustpython_vm::builtins::{PyDict, PyModule};
use rustpython_vm::function::FuncArgs;
use rustpython_vm::{PyObjectRef, PyPayload, PyRef, PyResult, VirtualMachine};

use crate::client::FinvizClient;

/// Binds a [`FinvizClient`] into the sandbox under the alias
/// `finvizfinance`, with three functions:
///
/// - `quote(ticker)` — snapshot fundamentals as a dict
/// - `forex_performance()` — forex performance table
/// - `crypto_performance()` — crypto performance table
///
/// SDK failures surface inside the snippet as `RuntimeError`s.
pub struct FinvizModule {
    client: Arc<FinvizClient>,
}

impl FinvizModule {
    pub fn new(client: FinvizClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl CapabilityModule for FinvizModule {
    fn alias(&self) -> &str {
        "finvizfinance"
    }

    fn make_module(&self, vm: &VirtualMachine) -> PyRef<PyModule> {
        let module = PyModule::new().into_ref(&vm.ctx);
        let dict = module.dict();

        let client = Arc::clone(&self.client);
        let quote = vm.new_function(
            "quote",
            move |args: FuncArgs, vm: &VirtualMachine| -> PyResult<PyObjectRef> {
                let ticker: String = args
                    .args
                    .first()
                    .ok_or_else(|| vm.new_type_error("quote() requires a ticker symbol".to_owned()))?
                    .try_to_value(vm)?;
                let snapshot = client
                    .quote_snapshot(&ticker)
                    .map_err(|e| vm.new_runtime_error(e.to_string()))?;
                let result = PyDict::new_ref(&vm.ctx);
                for (label, value) in snapshot {
                    result.set_item(label.as_str(), vm.ctx.new_str(value).into(), vm)?;
                }
                Ok(result.into())
            },
        );
        let _ = dict.set_item("quote", quote.into(), vm);

        let client = Arc::clone(&self.client);
        let forex = vm.new_function(
            "forex_performance",
            move |_args: FuncArgs, vm: &VirtualMachine| -> PyResult<PyObjectRef> {
                let table = client
                    .forex_performance()
                    .map_err(|e| vm.new_runtime_error(e.to_string()))?;
                json_to_py(&table, vm)
            },
        );
        let _ = dict.set_item("forex_performance", forex.into(), vm);

        let client = Arc::clone(&self.client);
        let crypto = vm.new_function(
            "crypto_performance",
            move |_args: FuncArgs, vm: &VirtualMachine| -> PyResult<PyObjectRef> {
                let table = client
                    .crypto_performance()
                    .map_err(|e| vm.new_runtime_error(e.to_string()))?;
                json_to_py(&table, vm)
            },
        );
        let _ = dict.set_item("crypto_performance", crypto.into(), vm);

        module
    }
}
