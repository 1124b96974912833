#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

#[path = "helpers/mod.rs"]
mod helpers;

#[path = "compile/mod.rs"]
mod compile;

#[path = "parser/mod.rs"]
mod parser;
