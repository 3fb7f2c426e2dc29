// shell-client/src/error.rs
use thiserror::Error;

/// Failures raised by data calls through the network client.
/// No retries happen at this layer; callers decide what to do.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("request rejected with status {status} {status_text}")]
    Status { status: u16, status_text: String },

    /// The backend required an identity but the call went out anonymously.
    /// Recoverable; surfaced to the user with a retry affordance.
    #[error("identity required but no credentials were available")]
    AuthUnavailable,

    #[error("request body could not be serialized: {0}")]
    Encode(String),

    #[error("response body is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Phase of a view transition that failed to load its resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Markup,
    Style,
    Script,
}

/// Failures raised by view navigation
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Programming error: the navigation target was never registered.
    /// Raised synchronously, before any network activity.
    #[error("no view registered under name {0:?}")]
    ViewNotFound(String),

    /// A view resource failed to load. Markup-phase failures abort the
    /// transition cleanly; style/script phases are reported as degraded
    /// phases on an otherwise committed navigation.
    #[error("failed to load {phase:?} resource for view {view:?}: {source}")]
    Load {
        view: String,
        phase: LoadPhase,
        #[source]
        source: NetworkError,
    },
}
