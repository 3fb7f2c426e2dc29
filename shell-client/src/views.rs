// shell-client/src/views.rs
use std::collections::HashMap;

use common::ShellConfig;

use crate::error::ComposeError;

/// Conventional resource names under a view's base path
const MARKUP_FILE: &str = "index.html";
const STYLE_FILE: &str = "style.css";
const SCRIPT_FILE: &str = "app.js";

/// Immutable mapping from a view name to its resource base path
#[derive(Debug, Clone)]
pub struct ViewDescriptor {
    pub name: String,
    pub base_path: String,
    origin: String,
}

impl ViewDescriptor {
    fn resource_url(&self, file: &str) -> String {
        format!(
            "{}/{}/{}",
            self.origin.trim_end_matches('/'),
            self.base_path.trim_matches('/'),
            file
        )
    }

    pub fn markup_url(&self) -> String {
        self.resource_url(MARKUP_FILE)
    }

    pub fn style_url(&self) -> String {
        self.resource_url(STYLE_FILE)
    }

    pub fn script_url(&self) -> String {
        self.resource_url(SCRIPT_FILE)
    }
}

/// Static view registry, populated once at startup; pure lookup thereafter
#[derive(Debug, Clone)]
pub struct ViewRegistry {
    views: HashMap<String, ViewDescriptor>,
}

impl ViewRegistry {
    pub fn from_config(shell: &ShellConfig) -> Self {
        let views = shell
            .views
            .iter()
            .map(|(name, base_path)| {
                let descriptor = ViewDescriptor {
                    name: name.clone(),
                    base_path: base_path.clone(),
                    origin: shell.asset_base_url.clone(),
                };
                (name.clone(), descriptor)
            })
            .collect();
        Self { views }
    }

    pub fn lookup(&self, name: &str) -> Result<&ViewDescriptor, ComposeError> {
        self.views
            .get(name)
            .ok_or_else(|| ComposeError::ViewNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
