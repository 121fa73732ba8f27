//! Process creation primitives for the Altair core library
//!
//! This module holds the platform-specific plumbing for creating child
//! processes with an explicitly constructed environment. The launcher never
//! talks to the OS directly; it goes through these primitives via the
//! adapter seam.
//!
//! ## Platform Support
//!
//! - **Unix**: supported
//! - **Windows**: not yet; the mock adapter still works there

#[cfg(unix)]
pub mod unix;

#[cfg(unix)]
pub use unix::*;
