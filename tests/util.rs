//! Shared test utilities for integration tests
//!
//! Provides an in-memory merge backend that records every call and
//! concatenates uploaded content the way a real backend would.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use anyhow::Result;
use code_merger::core::{Candidate, MergeRequest};
use code_merger::infra::MergeBackend;
use code_merger::infra::io::read_content;
use serde_json::{Value, json};

/// Stored upload: original name plus text.
#[derive(Debug, Clone)]
pub struct Stored
{
    pub name: String,
    pub content: String,
}

/// Scripted backend. Uploads get `srv-<n>` ids unless a reply was queued.
#[derive(Debug, Default)]
pub struct ScriptedBackend
{
    replies: RefCell<VecDeque<Result<Value, String>>>,
    stored: RefCell<HashMap<String, Stored>>,
    next_id: RefCell<usize>,
    pub uploads: RefCell<Vec<Vec<String>>>,
    pub fetches: RefCell<Vec<String>>,
    pub merges: RefCell<Vec<MergeRequest>>,
    pub fail_merge: RefCell<Option<String>>,
    pub fail_fetch: RefCell<Option<String>>,
}

impl ScriptedBackend
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Answer the next upload with `reply` verbatim.
    pub fn queue_reply(&self, reply: Value)
    {
        self.replies
            .borrow_mut()
            .push_back(Ok(reply));
    }

    /// Fail the next upload.
    pub fn queue_failure(&self, message: &str)
    {
        self.replies
            .borrow_mut()
            .push_back(Err(message.to_string()));
    }

    /// Pretend `id` holds `content` on the server.
    pub fn put(&self, id: &str, name: &str, content: &str)
    {
        self.stored.borrow_mut().insert(
            id.to_string(),
            Stored { name: name.to_string(), content: content.to_string() },
        );
    }
}

impl MergeBackend for ScriptedBackend
{
    fn upload(&self, files: &[Candidate]) -> Result<Value>
    {
        self.uploads
            .borrow_mut()
            .push(files.iter().map(|f| f.name.clone()).collect());

        let mut ids = Vec::new();
        for file in files
        {
            *self.next_id.borrow_mut() += 1;
            let id = format!("srv-{}", self.next_id.borrow());
            let content = String::from_utf8_lossy(&read_content(&file.content)?).into_owned();
            self.put(&id, &file.name, &content);
            ids.push(id);
        }

        match self
            .replies
            .borrow_mut()
            .pop_front()
        {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => anyhow::bail!("HTTP 500 Internal Server Error: {message}"),
            None => Ok(json!({ "message": "uploaded", "file_ids": ids })),
        }
    }

    fn fetch_content(&self, id: &str) -> Result<String>
    {
        self.fetches
            .borrow_mut()
            .push(id.to_string());
        if let Some(message) = self.fail_fetch.borrow().as_ref()
        {
            anyhow::bail!("HTTP 404 Not Found: {message}");
        }
        self.stored
            .borrow()
            .get(id)
            .map(|s| s.content.clone())
            .ok_or_else(|| anyhow::anyhow!("HTTP 404 Not Found: file {id} missing"))
    }

    fn merge(&self, request: &MergeRequest) -> Result<Vec<u8>>
    {
        self.merges
            .borrow_mut()
            .push(request.clone());
        if let Some(message) = self.fail_merge.borrow().as_ref()
        {
            anyhow::bail!("HTTP 404 Not Found: {message}");
        }

        let stored = self.stored.borrow();
        let mut out = String::new();
        for id in &request.file_ids
        {
            let file = stored
                .get(id)
                .ok_or_else(|| anyhow::anyhow!("HTTP 404 Not Found: file {id} missing"))?;
            let name = request
                .file_renames
                .get(&file.name)
                .unwrap_or(&file.name);
            out.push_str(&format!("# {name}\n{}\n", file.content));
        }
        Ok(out.into_bytes())
    }
}

/// Inline candidate with text content.
pub fn text(name: &str, content: &str) -> Candidate
{
    Candidate::inline(name, content.as_bytes().to_vec())
}

/// Fixed clock for deterministic placeholder ids.
pub fn fixed_clock() -> i64
{
    1_700_000_000_000
}
