//! # Dynamic Command Links (`link`)
//!
//! File: cli/src/link/mod.rs
//!
//! ## Overview
//!
//! `tawa-cli lint` and `tawa-inner-cli lint` are the same command seen from
//! two sides of the container boundary. Instead of declaring each twice, both
//! are generated from one table:
//!
//! ```text
//!                 catalog::command_table()
//!                  /                     \
//!   render::inner_command          render::outer_command
//!   (typed values, runs tool)      (string values + container options)
//!                                         |
//!                                  forward::collect
//!                                         |
//!                     <inner-cli> lint --fix   (container entrypoint)
//! ```
//!
//! - **`catalog`**: the declarative command table.
//! - **`render`**: builds `clap::Command`s from it for either side.
//! - **`forward`**: turns outer matches back into inner tokens.
//!

pub mod catalog;
pub mod forward;
pub mod render;
