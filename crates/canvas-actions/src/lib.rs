//! Turning streamed agent text into typed canvas mutation commands.

pub mod command;
pub mod error;
pub mod files;
pub mod normalize;
pub mod parser;
pub mod repair;
pub mod summary;

pub use command::{
    AddChildParams, CommandParams, ConfigureParams, LayoutParams, MoveParams, MoveTarget,
    MutationCommand, OperationKind, RootAlias, Size, ROOT_SELECTOR,
};
pub use error::ActionsError;
pub use files::{extract_file_blocks, find_file_block, strip_file_blocks, FileBlock};
pub use parser::{parse_line, ActionParser, LineOutcome};
pub use summary::summarize_commands;
