//! In-memory control plane for tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::framework::{CommandError, FrameworkCache, FrameworkControlPlane};

/// An operation requested from the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameworkCall {
    GenerateKey,
    LinkPublicStorage,
    ClearCache(FrameworkCache),
    BuildCache(FrameworkCache),
}

/// Records every call and fails the ones it is told to.
#[derive(Debug)]
pub struct MockControlPlane {
    key: String,
    failures: HashMap<FrameworkCall, i32>,
    symlink: Option<(PathBuf, PathBuf)>,
    calls: Mutex<Vec<FrameworkCall>>,
}

impl MockControlPlane {
    pub fn new() -> Self {
        Self {
            key: "base64:bW9jay1hcHBsaWNhdGlvbi1rZXktMzItYnl0ZXM=".to_string(),
            failures: HashMap::new(),
            symlink: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Key returned by `generate_key`.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Make `call` fail with exit status 1.
    pub fn failing(self, call: FrameworkCall) -> Self {
        self.failing_with(call, 1)
    }

    /// Make `call` fail with the given exit status.
    pub fn failing_with(mut self, call: FrameworkCall, code: i32) -> Self {
        self.failures.insert(call, code);
        self
    }

    /// Create a real symlink `link -> target` when asked to link public storage.
    pub fn creating_symlink(mut self, link: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        self.symlink = Some((link.into(), target.into()));
        self
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<FrameworkCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn count(&self, call: FrameworkCall) -> usize {
        self.calls().into_iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: FrameworkCall) -> Result<(), CommandError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        match self.failures.get(&call) {
            Some(code) => Err(CommandError::Failed {
                command: format!("{:?}", call),
                code: Some(*code),
                stderr: "injected failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl Default for MockControlPlane {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameworkControlPlane for MockControlPlane {
    async fn generate_key(&self) -> Result<String, CommandError> {
        self.record(FrameworkCall::GenerateKey)?;
        Ok(self.key.clone())
    }

    async fn link_public_storage(&self) -> Result<(), CommandError> {
        self.record(FrameworkCall::LinkPublicStorage)?;
        if let Some((link, target)) = &self.symlink {
            std::os::unix::fs::symlink(target, link).map_err(|source| CommandError::Spawn {
                command: "storage:link".to_string(),
                source,
            })?;
        }
        Ok(())
    }

    async fn clear_cache(&self, cache: FrameworkCache) -> Result<(), CommandError> {
        self.record(FrameworkCall::ClearCache(cache))
    }

    async fn build_cache(&self, cache: FrameworkCache) -> Result<(), CommandError> {
        self.record(FrameworkCall::BuildCache(cache))
    }
}
