//! In-memory fakes for the hosting and advisory seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use driftwatch_core::{DriftError, HostIdentity};

use crate::github::{Comparison, HostingApi};
use crate::llm::AdvisoryService;

#[derive(Clone)]
pub(crate) struct FakeRepo {
    pub branch: String,
    pub head: String,
    pub comparison: Comparison,
    pub delay: Duration,
}

impl FakeRepo {
    pub fn at(head: &str) -> Self {
        Self {
            branch: "main".into(),
            head: head.into(),
            comparison: Comparison::default(),
            delay: Duration::ZERO,
        }
    }

    pub fn behind(head: &str, messages: &[&str], files: &[&str]) -> Self {
        Self {
            comparison: Comparison {
                ahead_by: messages.len() as u64,
                commit_messages: messages.iter().map(|s| s.to_string()).collect(),
                changed_files: files.iter().map(|s| s.to_string()).collect(),
            },
            ..Self::at(head)
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeHosting {
    repos: HashMap<String, FakeRepo>,
    pub compare_calls: AtomicUsize,
    pub calls: AtomicUsize,
}

impl FakeHosting {
    pub fn with(mut self, slug: &str, repo: FakeRepo) -> Self {
        self.repos.insert(slug.to_string(), repo);
        self
    }

    fn lookup(&self, id: &HostIdentity) -> Result<&FakeRepo, DriftError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.repos.get(&id.to_string()).ok_or(DriftError::Hosting {
            status: Some(404),
            message: "Not Found".into(),
        })
    }
}

#[async_trait]
impl HostingApi for FakeHosting {
    async fn default_branch(&self, id: &HostIdentity) -> Result<String, DriftError> {
        let repo = self.lookup(id)?;
        if !repo.delay.is_zero() {
            tokio::time::sleep(repo.delay).await;
        }
        Ok(repo.branch.clone())
    }

    async fn branch_head(&self, id: &HostIdentity, _branch: &str) -> Result<String, DriftError> {
        Ok(self.lookup(id)?.head.clone())
    }

    async fn compare(
        &self,
        id: &HostIdentity,
        _base: &str,
        _head: &str,
    ) -> Result<Comparison, DriftError> {
        self.compare_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.lookup(id)?.comparison.clone())
    }
}

pub(crate) enum Reply {
    Text(String),
    Fail(String),
}

pub(crate) struct FakeAdvisory {
    reply: Reply,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeAdvisory {
    pub fn replying(text: &str) -> Self {
        Self::new(Reply::Text(text.into()))
    }

    pub fn failing(message: &str) -> Self {
        Self::new(Reply::Fail(message.into()))
    }

    fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AdvisoryService for FakeAdvisory {
    async fn generate(&self, prompt: &str) -> Result<String, DriftError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(message) => Err(DriftError::Advisory(message.clone())),
        }
    }

    fn model(&self) -> &str {
        "fake"
    }
}
