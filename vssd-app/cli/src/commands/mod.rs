//! Subcommands of the `vssd` tool

pub mod create;
pub mod inspect;
pub mod run;
pub mod shell;
