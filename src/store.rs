//! Application State Store
//!
//! Session context shared by the flow controller and the transfer backend:
//! the current user, a loading/error pair for the user fetch, and the
//! transaction history. Nothing here outlives the process.
//!
//! The context is passed explicitly to whoever needs it; cloning shares the
//! same underlying state.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::models::User;
use crate::transfer::types::Transaction;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    pub user: Option<User>,
    pub loading: bool,
    pub error: Option<String>,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<SessionState>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session seeded with a known user
    pub fn with_user(user: User) -> Self {
        let ctx = Self::new();
        ctx.set_user(user);
        ctx
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ============================================================
    // USER
    // ============================================================

    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn balance(&self) -> Option<Decimal> {
        self.read().user.as_ref().map(|u| u.balance)
    }

    /// Replace the user and clear any previous fetch error
    pub fn set_user(&self, user: User) {
        let mut state = self.write();
        state.user = Some(user);
        state.error = None;
    }

    pub fn set_loading(&self, loading: bool) {
        self.write().loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    /// Record a fetch failure; also ends loading
    pub fn set_error(&self, message: impl Into<String>) {
        let mut state = self.write();
        state.error = Some(message.into());
        state.loading = false;
    }

    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    /// No-op when no user is loaded
    pub fn update_balance(&self, balance: Decimal) {
        let mut state = self.write();
        if let Some(user) = state.user.as_mut() {
            debug!(old = %user.balance, new = %balance, "Balance updated");
            user.balance = balance;
        }
    }

    // ============================================================
    // TRANSACTIONS
    // ============================================================

    pub fn add_transaction(&self, transaction: Transaction) {
        self.write().transactions.push(transaction);
    }

    /// History, oldest first
    pub fn transactions(&self) -> Vec<Transaction> {
        self.read().transactions.clone()
    }

    pub fn transaction_count(&self) -> usize {
        self.read().transactions.len()
    }

    pub fn snapshot(&self) -> SessionState {
        self.read().clone()
    }
}
