//! Context slicing for the canvas agent: which part of the tree to show, how to render it,
//! and what has already been shown in this conversation.

pub mod error;
pub mod page_index;
pub mod serialize;
pub mod source;
pub mod tree;
pub mod workspace;

pub use error::ContextError;
pub use page_index::{describe_focus, render_hierarchy, render_page_index};
pub use serialize::{serialize, serialize_with, SerializeOptions, Serialized};
pub use source::{OutlineSource, StaticSource};
pub use tree::{collect_titles, find_node, find_path, minimal_common_ancestor};
pub use workspace::{render_namespace_docs, NamespaceDoc, OpenOutcome, OpenedDocument, Workspace};
