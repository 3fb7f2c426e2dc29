// shell-client/src/main.rs
// Headless demo shell: loads configuration, resolves the environment,
// navigates to the main view and prints the composed document.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use common::{setup_tracing, Config};
use shell_client::composer::ViewComposer;
use shell_client::context::AppContext;
use shell_client::document::{Document, Fragment};
use shell_client::net::NetworkClient;
use shell_client::user::UserApi;
use shell_client::views::ViewRegistry;

const SHELL_WELCOME: &str = "<h1>Mini-App Platform</h1><p>Loading...</p>";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Setup tracing
    setup_tracing();

    // Load configuration and detect the embedding environment
    let config = Config::from_env();
    let ctx = Arc::new(AppContext::detect(config.shell.clone(), config.auth.clone()));

    let net = Arc::new(NetworkClient::new(Arc::clone(&ctx)));
    let registry = ViewRegistry::from_config(&ctx.shell);
    let document = Rc::new(RefCell::new(Document::new(Fragment::from_html(SHELL_WELCOME))));
    let composer = ViewComposer::new(registry, Arc::clone(&net), Rc::clone(&document));

    match composer.navigate("main").await {
        Ok(navigation) => {
            tracing::info!(view = %navigation.view, degraded = navigation.degraded.len(), "shell ready")
        }
        Err(e) => tracing::error!(error = %e, "initial navigation failed"),
    }

    let users = UserApi::new(Arc::clone(&net), &ctx.shell.api_base_url);
    match users.get_user().await {
        Ok(user) => tracing::info!(user_id = user.id, "loaded user profile"),
        Err(e) => tracing::warn!(error = %e, "user data unavailable"),
    }

    println!("{}", document.borrow().render());
}
