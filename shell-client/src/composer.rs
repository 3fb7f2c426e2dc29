// shell-client/src/composer.rs
//! Fetch-and-swap orchestration for named views.
//!
//! Single-threaded and cooperative: suspension happens only at fetch
//! boundaries, and the composer is the sole mutator of the document and
//! the active-view record. `navigate` is not mutually exclusive with
//! itself; overlapping calls race independently and whichever settles
//! last wins. There is no cancellation: a superseding navigation simply
//! races the one it supersedes.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use async_trait::async_trait;

use crate::document::{extract_body, Document, VIEW_SCRIPT_ID, VIEW_STYLE_ID};
use crate::error::{ComposeError, LoadPhase};
use crate::net::NetworkClient;
use crate::views::ViewRegistry;

/// Executes a view's own script with its own error boundary. Evaluation
/// runs as a supervised task, out of band from the navigation state
/// machine; the composer never awaits it.
#[async_trait]
pub trait ScriptHost: Send + Sync {
    async fn evaluate(&self, view: &str, source: String) -> Result<(), String>;
}

/// Default host: scripts are carried in the document but not executed
pub struct NoopScriptHost;

#[async_trait]
impl ScriptHost for NoopScriptHost {
    async fn evaluate(&self, _view: &str, _source: String) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerState {
    /// No view loaded; the main container shows the shell content
    Idle,
    Loading(String),
    Active(String),
}

/// Record of the committed view and its reserved resource slots.
/// Replaced wholesale on each successful navigation, never partially.
#[derive(Debug, Clone, Default)]
pub struct ActiveView {
    pub name: Option<String>,
    pub style_slot: Option<&'static str>,
    pub script_slot: Option<&'static str>,
}

/// Outcome of a committed navigation. `degraded` lists the enhancement
/// phases whose resources could not be loaded; the markup itself is
/// always in place when this is returned.
#[derive(Debug)]
pub struct Navigation {
    pub view: String,
    pub degraded: Vec<LoadPhase>,
}

pub struct ViewComposer {
    registry: ViewRegistry,
    net: Arc<NetworkClient>,
    document: Rc<RefCell<Document>>,
    state: Rc<RefCell<ComposerState>>,
    active: Rc<RefCell<ActiveView>>,
    scripts: Arc<dyn ScriptHost>,
}

impl ViewComposer {
    pub fn new(registry: ViewRegistry, net: Arc<NetworkClient>, document: Rc<RefCell<Document>>) -> Self {
        Self {
            registry,
            net,
            document,
            state: Rc::new(RefCell::new(ComposerState::Idle)),
            active: Rc::new(RefCell::new(ActiveView::default())),
            scripts: Arc::new(NoopScriptHost),
        }
    }

    pub fn with_script_host(mut self, host: Arc<dyn ScriptHost>) -> Self {
        self.scripts = host;
        self
    }

    pub fn state(&self) -> ComposerState {
        self.state.borrow().clone()
    }

    pub fn active_view(&self) -> ActiveView {
        self.active.borrow().clone()
    }

    pub fn document(&self) -> Rc<RefCell<Document>> {
        Rc::clone(&self.document)
    }

    /// Transition to the named view.
    ///
    /// Lookup and markup failures leave the previous view fully intact.
    /// Once the markup swap lands the transition is committed; style and
    /// script failures after that point degrade the view but do not roll
    /// it back, and are reported in the returned `Navigation`.
    pub async fn navigate(&self, name: &str) -> Result<Navigation, ComposeError> {
        let descriptor = match self.registry.lookup(name) {
            Ok(descriptor) => descriptor.clone(),
            Err(e) => {
                tracing::error!(view = name, "navigation target not registered");
                return Err(e);
            }
        };

        let previous = self.state.borrow().clone();
        *self.state.borrow_mut() = ComposerState::Loading(descriptor.name.clone());
        tracing::info!(view = %descriptor.name, "loading view");

        // Markup phase: the only phase that can abort the transition
        let markup = match self.net.fetch_text(&descriptor.markup_url()).await {
            Ok(markup) => markup,
            Err(source) => {
                *self.state.borrow_mut() = previous;
                return Err(ComposeError::Load {
                    view: descriptor.name.clone(),
                    phase: LoadPhase::Markup,
                    source,
                });
            }
        };
        let fragment = extract_body(&markup);

        // Commit point: the markup swap stands even if later phases fail
        self.document.borrow_mut().replace_main(fragment);

        let mut degraded = Vec::new();

        // Style slot: remove-then-insert, never insert-then-remove
        self.document.borrow_mut().remove_style(VIEW_STYLE_ID);
        match self.net.fetch_text(&descriptor.style_url()).await {
            Ok(_) => {
                self.document.borrow_mut().insert_style(VIEW_STYLE_ID, descriptor.style_url());
            }
            Err(source) => {
                tracing::warn!(view = %descriptor.name, error = %source, "style resource unavailable, view degraded");
                degraded.push(LoadPhase::Style);
            }
        }

        // Script slot: same pattern, then supervised evaluation
        self.document.borrow_mut().remove_script(VIEW_SCRIPT_ID);
        match self.net.fetch_text(&descriptor.script_url()).await {
            Ok(source_text) => {
                self.document.borrow_mut().insert_script(VIEW_SCRIPT_ID, descriptor.script_url());
                self.supervise_script(&descriptor.name, source_text);
            }
            Err(source) => {
                tracing::warn!(view = %descriptor.name, error = %source, "script resource unavailable, view degraded");
                degraded.push(LoadPhase::Script);
            }
        }

        *self.active.borrow_mut() = ActiveView {
            name: Some(descriptor.name.clone()),
            style_slot: Some(VIEW_STYLE_ID),
            script_slot: Some(VIEW_SCRIPT_ID),
        };
        *self.state.borrow_mut() = ComposerState::Active(descriptor.name.clone());
        tracing::info!(view = %descriptor.name, degraded = degraded.len(), "view active");

        Ok(Navigation { view: descriptor.name, degraded })
    }

    fn supervise_script(&self, view: &str, source: String) {
        let host = Arc::clone(&self.scripts);
        let view = view.to_string();
        tokio::spawn(async move {
            if let Err(error) = host.evaluate(&view, source).await {
                tracing::error!(%view, %error, "view script failed");
            }
        });
    }
}
