//! In-memory stand-ins for the remote collaborators. Used by the test
//! suite and by the demo shell when no remote endpoint is configured;
//! they enforce the same token and error-kind contract a real backend
//! would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::collaborators::{AuthClient, DocumentClient};
use crate::domain::entities::RemoteSession;
use crate::shared::error::{AppError, RemoteAuthKind, Result};

#[derive(Default)]
struct Account {
    uid: String,
    password: String,
}

/// Fake auth provider. `set_reachable(false)` makes every call fail with
/// `RemoteUnavailable`, which is how tests simulate network loss.
pub struct InMemoryAuthClient {
    accounts: Mutex<HashMap<String, Account>>,
    tokens: Mutex<HashMap<String, String>>,
    reachable: AtomicBool,
}

impl Default for InMemoryAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuthClient {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            tokens: Mutex::new(HashMap::new()),
            reachable: AtomicBool::new(true),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }

    pub fn has_account(&self, email: &str) -> bool {
        self.accounts.lock().unwrap().contains_key(email)
    }

    /// Stored credential for an account, for assertions.
    pub fn password_of(&self, email: &str) -> Option<String> {
        self.accounts
            .lock()
            .unwrap()
            .get(email)
            .map(|a| a.password.clone())
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::RemoteUnavailable(
                "auth endpoint unreachable".to_string(),
            ))
        }
    }

    fn issue_token(&self, email: &str, uid: &str) -> RemoteSession {
        let token = Uuid::new_v4().to_string();
        self.tokens
            .lock()
            .unwrap()
            .insert(token.clone(), uid.to_string());
        RemoteSession {
            remote_id: uid.to_string(),
            token,
            email: email.to_string(),
        }
    }

    fn uid_for_token(&self, token: &str) -> Result<String> {
        self.tokens
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| {
                AppError::remote_auth(RemoteAuthKind::Unauthorized, "invalid or expired token")
            })
    }
}

#[async_trait]
impl AuthClient for InMemoryAuthClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<RemoteSession> {
        self.ensure_reachable()?;
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(AppError::remote_auth(
                RemoteAuthKind::AccountExists,
                format!("account {} already exists", email),
            ));
        }
        let uid = Uuid::new_v4().to_string();
        accounts.insert(
            email.to_string(),
            Account {
                uid: uid.clone(),
                password: password.to_string(),
            },
        );
        drop(accounts);
        Ok(self.issue_token(email, &uid))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<RemoteSession> {
        self.ensure_reachable()?;
        let accounts = self.accounts.lock().unwrap();
        let account = accounts.get(email).ok_or_else(|| {
            AppError::remote_auth(
                RemoteAuthKind::UnknownAccount,
                format!("no account for {}", email),
            )
        })?;
        if account.password != password {
            return Err(AppError::remote_auth(
                RemoteAuthKind::InvalidCredentials,
                "wrong password",
            ));
        }
        let uid = account.uid.clone();
        drop(accounts);
        Ok(self.issue_token(email, &uid))
    }

    async fn sign_out(&self, token: &str) -> Result<()> {
        self.ensure_reachable()?;
        self.tokens.lock().unwrap().remove(token);
        Ok(())
    }

    async fn update_password(&self, token: &str, new_password: &str) -> Result<()> {
        self.ensure_reachable()?;
        let uid = self.uid_for_token(token)?;
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .values_mut()
            .find(|a| a.uid == uid)
            .ok_or_else(|| {
                AppError::remote_auth(RemoteAuthKind::UnknownAccount, "account deleted")
            })?;
        account.password = new_password.to_string();
        Ok(())
    }

    async fn delete_account(&self, token: &str) -> Result<()> {
        self.ensure_reachable()?;
        let uid = self.uid_for_token(token)?;
        self.accounts.lock().unwrap().retain(|_, a| a.uid != uid);
        self.tokens.lock().unwrap().remove(token);
        Ok(())
    }
}

/// Fake document store keyed by path. Counts calls so read-isolation
/// tests can assert the hybrid layer never touched it.
pub struct InMemoryDocumentClient {
    documents: Mutex<HashMap<String, Value>>,
    reachable: AtomicBool,
    calls: AtomicUsize,
}

impl Default for InMemoryDocumentClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentClient {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            reachable: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn document(&self, path: &str) -> Option<Value> {
        self.documents.lock().unwrap().get(path).cloned()
    }

    pub fn document_count(&self, collection: &str) -> usize {
        let prefix = format!("{}/", collection);
        self.documents
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .count()
    }

    pub fn put_document(&self, path: &str, value: Value) {
        self.documents
            .lock()
            .unwrap()
            .insert(path.to_string(), value);
    }

    fn check(&self, token: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(AppError::RemoteUnavailable(
                "document endpoint unreachable".to_string(),
            ));
        }
        if token.is_empty() {
            return Err(AppError::remote_auth(
                RemoteAuthKind::Unauthorized,
                "missing bearer token",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentClient for InMemoryDocumentClient {
    async fn get(&self, token: &str, path: &str) -> Result<Option<Value>> {
        self.check(token)?;
        Ok(self.documents.lock().unwrap().get(path).cloned())
    }

    async fn put(&self, token: &str, path: &str, document: Value) -> Result<()> {
        self.check(token)?;
        self.documents
            .lock()
            .unwrap()
            .insert(path.to_string(), document);
        Ok(())
    }

    async fn delete(&self, token: &str, path: &str) -> Result<()> {
        self.check(token)?;
        self.documents.lock().unwrap().remove(path);
        Ok(())
    }

    async fn list(&self, token: &str, collection: &str) -> Result<Vec<(String, Value)>> {
        self.check(token)?;
        let prefix = format!("{}/", collection);
        let docs = self.documents.lock().unwrap();
        let mut entries: Vec<(String, Value)> = docs
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(k, v)| (k[prefix.len()..].to_string(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}
