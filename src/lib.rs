//! Threads: markdown files with YAML frontmatter, kept in `.threads/`
//! directories across a repository, each tracking a single topic.
//!
//! The library holds the core: locating the workspace and its threads,
//! resolving references, editing the structured sections of a thread file,
//! and committing the result. The `threads` binary is a thin CLI on top.

pub mod config;
pub mod error;
pub mod frontmatter;
pub mod git;
pub mod ident;
pub mod logging;
pub mod reference;
pub mod section;
pub mod thread;
pub mod workspace;

pub use error::{Error, Result};
pub use thread::Thread;
