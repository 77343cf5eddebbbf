use canvas_actions::MutationCommand;
use canvas_context::OutlineSource;
use canvas_types::BatchStatus;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("target '{0}' not found")]
    TargetNotFound(String),

    #[error("host rejected the batch: {0}")]
    Rejected(String),
}

/// The editor hosting the canvas. Reads come through [`OutlineSource`]; writes are batches of
/// commands for one target, bracketed by `Start` and `Complete`.
pub trait CanvasHost: OutlineSource + Send + Sync {
    fn apply_mutation(
        &self,
        target_id: &str,
        commands: &[MutationCommand],
        status: BatchStatus,
    ) -> Result<(), HostError>;

    /// Removes every component of a page before it is regenerated.
    fn clear_page(&self, _page_id: &str) -> Result<(), HostError> {
        Ok(())
    }

    /// Instance id of the generated root container of a page, if it has one.
    fn root_container_id(&self, _page_id: &str) -> Option<String> {
        None
    }
}
