//! Query modules, each an `impl Database` block.

pub mod entities;
pub mod extension_log;
