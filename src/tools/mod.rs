//! Tool trait and the name-keyed registry the agent dispatches through.
//!
//! A tool takes the raw `Action Input` text and returns the text that is
//! folded back into the transcript as an observation.

mod calculator;
mod terminal;
mod time;
mod web;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use calculator::Calculator;
pub use terminal::RunCommand;
pub use time::CurrentTime;
pub use web::{FetchUrl, WebSearch};

/// Per-invocation context handed to [`Tool::execute`].
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Directory tools resolve relative paths against
    pub workspace: PathBuf,

    /// Fired when the run is cancelled; long-running tools should stop early
    pub cancel: CancellationToken,

    /// 1-based iteration of the run that dispatched this call
    pub iteration: usize,
}

impl ToolContext {
    pub fn new(workspace: PathBuf, cancel: CancellationToken) -> Self {
        Self {
            workspace,
            cancel,
            iteration: 0,
        }
    }
}

/// A named capability the model can invoke with `Action:` / `Action Input:`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable identifier used in action directives.
    fn name(&self) -> &str;

    /// Single-line description rendered verbatim into the prompt catalog.
    fn description(&self) -> &str;

    /// Run the tool. Must be safe to call repeatedly.
    async fn execute(&self, ctx: &ToolContext, input: &str) -> anyhow::Result<String>;
}

/// Name and description of a registered tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate tool name: {0}")]
    DuplicateName(String),

    #[error("Tool name must not be empty")]
    EmptyName,
}

/// Result of resolving a tool name.
pub enum ToolLookup {
    Found(Arc<dyn Tool>),
    NotFound,
}

impl ToolLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

struct RegistryInner {
    order: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

/// Immutable set of tools, built once and shared read-only between runs.
#[derive(Clone)]
pub struct ToolRegistry {
    inner: Arc<RegistryInner>,
}

impl ToolRegistry {
    /// Build a registry from tools in catalog order.
    ///
    /// # Errors
    ///
    /// Fails with `RegistryError::DuplicateName` if two tools share a name,
    /// or `RegistryError::EmptyName` if a tool has a blank name.
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Result<Self, RegistryError> {
        let mut by_name = HashMap::with_capacity(tools.len());

        for (index, tool) in tools.iter().enumerate() {
            let name = tool.name();
            if name.trim().is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if by_name.insert(name.to_string(), index).is_some() {
                return Err(RegistryError::DuplicateName(name.to_string()));
            }
        }

        Ok(Self {
            inner: Arc::new(RegistryInner {
                order: tools,
                by_name,
            }),
        })
    }

    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                order: Vec::new(),
                by_name: HashMap::new(),
            }),
        }
    }

    /// The tools shipped with the binary. `run_command` is only included when
    /// shell access is enabled.
    pub fn with_defaults(enable_shell: bool) -> Self {
        let mut tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(Calculator),
            Arc::new(CurrentTime),
            Arc::new(WebSearch),
            Arc::new(FetchUrl),
        ];
        if enable_shell {
            tools.push(Arc::new(RunCommand::default()));
        }

        // Built-in names are distinct.
        match Self::new(tools) {
            Ok(registry) => registry,
            Err(e) => unreachable!("built-in tool names collide: {}", e),
        }
    }

    pub fn lookup(&self, name: &str) -> ToolLookup {
        match self.inner.by_name.get(name) {
            Some(&index) => ToolLookup::Found(Arc::clone(&self.inner.order[index])),
            None => ToolLookup::NotFound,
        }
    }

    /// Tools in catalog order.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.inner
            .order
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.order.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.inner.order.iter().map(|t| t.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(&'static str);

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "Echoes its input"
        }

        async fn execute(&self, _ctx: &ToolContext, input: &str) -> anyhow::Result<String> {
            Ok(input.to_string())
        }
    }

    #[test]
    fn duplicate_names_fail_construction() {
        let err = ToolRegistry::new(vec![Arc::new(Echo("echo")), Arc::new(Echo("echo"))])
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("echo".to_string()));
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = ToolRegistry::new(vec![Arc::new(Echo("  "))]).unwrap_err();
        assert_eq!(err, RegistryError::EmptyName);
    }

    #[test]
    fn list_tools_keeps_registration_order() {
        let registry = ToolRegistry::new(vec![
            Arc::new(Echo("zeta")),
            Arc::new(Echo("alpha")),
            Arc::new(Echo("mid")),
        ])
        .unwrap();

        let names: Vec<_> = registry.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        let registry = ToolRegistry::new(vec![Arc::new(Echo("search"))]).unwrap();
        assert!(registry.lookup("search").is_found());
        assert!(!registry.lookup("Search").is_found());
        assert!(!registry.lookup("search ").is_found());
    }

    #[test]
    fn found_tool_executes() {
        let registry = ToolRegistry::new(vec![Arc::new(Echo("echo"))]).unwrap();
        let ToolLookup::Found(tool) = registry.lookup("echo") else {
            panic!("echo should be registered");
        };
        let ctx = ToolContext::new(PathBuf::from("."), CancellationToken::new());
        let out = tokio_test::block_on(tool.execute(&ctx, "hi")).expect("echo");
        assert_eq!(out, "hi");
    }

    #[test]
    fn default_registry_gates_shell_tool() {
        assert!(!ToolRegistry::with_defaults(false).lookup("run_command").is_found());
        assert!(ToolRegistry::with_defaults(true).lookup("run_command").is_found());
        assert!(ToolRegistry::with_defaults(false).lookup("calculator").is_found());
    }
}
