//! finviz.com data access and its sandbox binding.
//!
//! [`FinvizClient`] talks to finviz.com: the quote page's snapshot table
//! for per-ticker fundamentals, and the JSON performance endpoints for
//! forex and crypto. [`FinvizModule`] wraps a client as the
//! `finvizfinance` capability injected into the snippet sandbox.

mod client;
mod module;

pub use client::{FinvizClient, SdkError, DEFAULT_BASE_URL};
pub use module::FinvizModule;
