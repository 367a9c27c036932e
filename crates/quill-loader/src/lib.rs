//! Quill Module Loader
//!
//! This crate turns an `import module` clause into loadable source text:
//! - The [`ModuleLocator`] strategy trait, with deferral to a default
//! - [`DefaultModuleLocator`]: file and HTTP(S) resolution against a base URI
//! - Content-negotiated charset detection and decoding for fetched modules
//!
//! Locating a module may block on file or network I/O; it is independent of
//! the binder's compile-time state by construction.

#![warn(missing_docs)]

pub mod charset;
pub mod locator;

pub use charset::{charset_from_content_type, decode};
pub use locator::{
    locate_with_fallback, DefaultModuleLocator, LocateError, LocatedModule, ModuleLocator,
    ModuleSource, Resolution,
};
