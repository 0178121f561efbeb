use thiserror::Error;

/// Errors raised while building, fitting or reading a BigClam model.
#[derive(Error, Debug)]
pub enum ClamError {
    /// Malformed or inconsistent graph input: empty or unallocatable
    /// node set, out-of-range index, or asymmetric adjacency.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// Tuning parameters that make the model degenerate.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The ascent loop exhausted its sweep or time budget. The
    /// best-effort factor matrix stays readable from the optimizer.
    #[error("did not converge after {sweeps} sweeps (max |gradient| = {max_abs_gradient:.3e})")]
    NonConvergence { sweeps: usize, max_abs_gradient: f64 },

    /// A cancellation flag was raised between node updates.
    #[error("cancelled during sweep {sweeps}")]
    Cancelled { sweeps: usize },

    /// An update produced `NaN` or infinity; the matrix is left at
    /// its last finite state.
    #[error("non-finite update at node {node}, community {community} (sweep {sweep})")]
    NonFinite {
        node: usize,
        community: usize,
        sweep: usize,
    },

    /// Malformed text input.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A file could not be opened, read or written.
    #[error("file error: {0}")]
    File(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for bigclam.
pub type Result<T> = std::result::Result<T, ClamError>;
