/// Failures of a single generation turn, one variant per pipeline stage.
///
/// Each failure terminates the turn immediately; the stage after a failed
/// one is never attempted.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The question was rejected before any network call was made.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The hosted model call failed or returned nothing usable.
    #[error("Model call failed: {0}")]
    Model(String),

    /// The session pool rejected the upload or the render did not succeed.
    #[error("Execution failed: {0}")]
    Execution(String),

    /// The rendered video could not be located or downloaded.
    #[error("Artifact fetch failed: {0}")]
    Artifact(String),
}
