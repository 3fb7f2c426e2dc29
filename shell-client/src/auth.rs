// shell-client/src/auth.rs
use std::collections::BTreeMap;

use crate::context::AppContext;

pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Which credential set is attached to outbound calls. Exactly one mode is
/// active per resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Host runtime present with non-empty init data; the only mode the
    /// backend can verify cryptographically.
    Host,
    /// Configuration-gated substitute identity for non-production use.
    /// The backend independently gates acceptance behind its own opt-in.
    DevBypass,
    /// No identity headers; identity-requiring calls fail downstream.
    Anonymous,
}

/// Header set for the next outbound call. Created fresh on every
/// resolution, never cached, so a change in host availability shows up on
/// the very next call.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub mode: AuthMode,
    pub headers: BTreeMap<String, String>,
}

impl AuthContext {
    /// Resolve the credential headers from the current environment.
    ///
    /// Total function over its inputs: absence of signals degrades the
    /// mode, it never fails. Priority order is host, then dev bypass
    /// (which additionally requires host absence), then anonymous.
    pub fn resolve(ctx: &AppContext) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(CONTENT_TYPE_HEADER.to_string(), CONTENT_TYPE_JSON.to_string());

        if let Some(host) = &ctx.host {
            if !host.init_data.is_empty() {
                headers.insert(ctx.auth.identity_header.clone(), host.init_data.clone());
                return Self { mode: AuthMode::Host, headers };
            }
        }

        if ctx.shell.dev_mode_enabled && ctx.host.is_none() {
            headers.insert(ctx.auth.dev_auth_header.clone(), ctx.auth.dev_auth_token.clone());
            return Self { mode: AuthMode::DevBypass, headers };
        }

        Self { mode: AuthMode::Anonymous, headers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AppContext, HostEnv};
    use common::{AuthConfig, Config};

    fn context(dev_mode: bool, host: Option<HostEnv>) -> AppContext {
        let defaults = Config::default();
        let mut shell = defaults.shell;
        shell.dev_mode_enabled = dev_mode;
        AppContext::new(shell, defaults.auth, host)
    }

    fn auth_config() -> AuthConfig {
        Config::default().auth
    }

    #[test]
    fn host_mode_wins_regardless_of_dev_config() {
        let host = HostEnv {
            init_data: "query_id=abc&user=%7B%22id%22%3A1%7D".to_string(),
            platform: None,
        };
        let ctx = context(true, Some(host));
        let auth = AuthContext::resolve(&ctx);

        assert_eq!(auth.mode, AuthMode::Host);
        assert_eq!(
            auth.headers.get(&auth_config().identity_header).map(String::as_str),
            Some("query_id=abc&user=%7B%22id%22%3A1%7D")
        );
        assert!(!auth.headers.contains_key(&auth_config().dev_auth_header));
    }

    #[test]
    fn dev_bypass_requires_host_absence() {
        let ctx = context(true, None);
        let auth = AuthContext::resolve(&ctx);

        assert_eq!(auth.mode, AuthMode::DevBypass);
        assert_eq!(
            auth.headers.get(&auth_config().dev_auth_header).map(String::as_str),
            Some("dev_token")
        );
    }

    #[test]
    fn host_with_empty_init_data_does_not_count_as_present_identity() {
        // A host runtime that exposes no init data fails the host check,
        // and its presence still disqualifies the dev bypass.
        let host = HostEnv { init_data: String::new(), platform: None };
        let ctx = context(true, Some(host));
        let auth = AuthContext::resolve(&ctx);

        assert_eq!(auth.mode, AuthMode::Anonymous);
    }

    #[test]
    fn anonymous_mode_carries_only_content_type() {
        let ctx = context(false, None);
        let auth = AuthContext::resolve(&ctx);

        assert_eq!(auth.mode, AuthMode::Anonymous);
        assert_eq!(auth.headers.len(), 1);
        assert_eq!(
            auth.headers.get(CONTENT_TYPE_HEADER).map(String::as_str),
            Some(CONTENT_TYPE_JSON)
        );
    }

    #[test]
    fn resolution_is_not_cached_across_host_changes() {
        let mut ctx = context(false, None);
        assert_eq!(AuthContext::resolve(&ctx).mode, AuthMode::Anonymous);

        ctx.host = Some(HostEnv { init_data: "auth_date=1".to_string(), platform: None });
        assert_eq!(AuthContext::resolve(&ctx).mode, AuthMode::Host);
    }
}
