// shell-client/src/context.rs
use common::{AuthConfig, ShellConfig};

/// Environment variables the demo binary reads to detect the embedding host
const HOST_INIT_DATA_VAR: &str = "APP_HOST_INIT_DATA";
const HOST_PLATFORM_VAR: &str = "APP_HOST_PLATFORM";

/// The embedding platform's injected runtime, when present.
///
/// `init_data` is the opaque, host-signed string proving the embedding
/// session's authenticity; it is passed verbatim to the backend and never
/// interpreted on this side.
#[derive(Debug, Clone)]
pub struct HostEnv {
    pub init_data: String,
    pub platform: Option<String>,
}

impl HostEnv {
    /// Detect the host runtime from the launch environment
    pub fn from_env() -> Option<Self> {
        let init_data = std::env::var(HOST_INIT_DATA_VAR).ok()?;
        let platform = std::env::var(HOST_PLATFORM_VAR).ok();
        Some(Self { init_data, platform })
    }
}

/// Explicit application context, constructed once and passed by reference
/// to the resolver and the composer. Nothing here reads ambient globals,
/// so tests fabricate arbitrary environments.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub shell: ShellConfig,
    pub auth: AuthConfig,
    pub host: Option<HostEnv>,
}

impl AppContext {
    pub fn new(shell: ShellConfig, auth: AuthConfig, host: Option<HostEnv>) -> Self {
        Self { shell, auth, host }
    }

    /// Build a context with host detection from the launch environment
    pub fn detect(shell: ShellConfig, auth: AuthConfig) -> Self {
        let host = HostEnv::from_env();
        if host.is_some() {
            tracing::info!("Host runtime detected");
        } else {
            tracing::info!("No host runtime present");
        }
        Self::new(shell, auth, host)
    }
}
