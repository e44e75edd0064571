//! # coursesync
//!
//! Command-line driver for the course sync pipeline.
//!
//! ```text
//! coursesync inspect --course 42
//! coursesync rewrite --course 42 --model-course 7 --approve-all --commit
//! ```
//!
//! Connection settings come from the environment (a `.env` file is read
//! first): `CANVAS_BASE_URL`, `CANVAS_API_TOKEN`, `OPENAI_API_KEY`,
//! `OPENAI_BASE_URL` and `OPENAI_MODEL`.

pub mod args;
pub mod commands;

pub use args::{Cli, Command, ItemRef, ModelSource, RewriteArgs};
pub use commands::run;
