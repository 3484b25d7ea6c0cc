//! Library wrapper around the `pfsc` CLI implementation.
//!
//! The CLI is primarily exercised via its binary (`src/main.rs`). Compiling
//! the binary crate root as a module here lets `cargo test -p pfsc-cli --lib`
//! typecheck the CLI without building the full binary.
//!
//! `fn main()` inside `main.rs` is just another function when compiled as a
//! module.

#[allow(dead_code)]
#[path = "main.rs"]
mod main_bin;
