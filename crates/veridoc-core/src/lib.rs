//! Veridoc Core - documentation generation engine
//!
//! Consumes an already-resolved declaration tree (produced by an external
//! resolver, serialized as JSON) and renders a static HTML documentation set:
//! - one page per page-owning declaration (modules, classes, traits, and
//!   types with members),
//! - a table-of-contents page listing every module by nesting depth,
//! - a global alphabetical name index over all declarations,
//! - a stylesheet asset, rewritten on every run.
//!
//! The traversal is single-threaded and synchronous; every output file is
//! accumulated in memory and written once, and the index page is finalized
//! only after the whole tree has been walked.

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Declaration-tree model - arena of nodes keyed by qualified name
pub mod tree;

/// Run configuration
pub mod config;

/// Error and warning types
pub mod error;

/// Primitive markup builders
pub mod markup;

/// Documentation-comment shortening and summary rendering
pub mod docstring;

/// Cross-reference resolution - pages, anchors, breadcrumbs, type links
pub mod links;

/// Global name index accumulation and sorting
pub mod index;

/// Per-page summary/details assembly
pub mod compose;

/// Traversal driver and output emission
pub mod walker;

/// Static stylesheet asset
pub mod style;

/// Convenience re-export of the tree model
pub use tree::{Attribute, Decl, DeclKind, DeclTree, Formal, Modifiers, Signature, SpecClause, SpecKind, TypeRef};

/// Convenience re-export of configuration
pub use config::{DocConfig, FileRefMode};

/// Convenience re-export of error types
pub use error::{DocError, Reporter};

/// Convenience re-export of the generator entry point
pub use walker::{DocGenerator, RunSummary};

/// Convenience re-export of the composition and resolution layers
pub use compose::PageComposer;
pub use index::{IndexBuilder, IndexEntry};
pub use links::{LinkResolver, PageUrl};
