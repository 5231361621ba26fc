//! Sandboxed snippet execution for the mcp-finviz server.
//!
//! Executes caller-supplied Python code against a fixed capability
//! namespace inside an embedded RustPython interpreter. The surface the
//! code can reach is declared up front: a module allowlist gates every
//! import, escape-hatch builtins are stripped, and each execution runs in
//! a fresh interpreter on a dedicated worker thread under a wall-clock
//! budget. The snippet communicates its output by binding a variable
//! named `result`.

mod allowlist;
mod convert;
mod executor;
mod limits;
mod namespace;
mod outcome;
mod schema;
mod serialize;
mod vm;

pub use allowlist::{ModulePolicy, PolicyError, DEFAULT_ALLOWED_MODULES};
pub use convert::{json_to_py, py_to_json, Unrepresentable};
pub use executor::{CodeRunner, SnippetExecutor, RESULT_VAR};
pub use limits::ExecutionLimits;
pub use namespace::{CapabilityModule, CapabilityNamespace, NamespaceBuilder};
pub use outcome::{CapturedValue, ExecutionError, Outcome};
pub use schema::code_snippet_schema;
pub use serialize::serialize;
