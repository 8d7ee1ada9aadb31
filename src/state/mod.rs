//! In-process bot state
//!
//! Only interaction-scoped state lives here: pending confirmations and
//! admin password prompts. Sessions and everything durable live in the
//! database.

pub mod pending;

pub use pending::{
    PendingAction, PendingAdd, PendingConfirmations, PendingRemove, PendingRequest, TakeOutcome,
    CONFIRM_TIMEOUT_SECS,
};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// How long a password prompt waits for a reply.
pub const PROMPT_TIMEOUT_SECS: u64 = 60;

/// Users currently being prompted for the admin password in a private chat.
#[derive(Clone, Default)]
pub struct PendingPrompts {
    inner: Arc<Mutex<HashMap<i64, Instant>>>,
}

impl PendingPrompts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, user_id: i64) {
        self.inner.lock().unwrap().insert(user_id, Instant::now());
    }

    /// Consume the prompt for a user if one is still open.
    pub fn take(&self, user_id: i64) -> bool {
        let mut prompts = self.inner.lock().unwrap();
        match prompts.remove(&user_id) {
            Some(started) => started.elapsed() < Duration::from_secs(PROMPT_TIMEOUT_SECS),
            None => false,
        }
    }

    pub fn is_waiting(&self, user_id: i64) -> bool {
        let prompts = self.inner.lock().unwrap();
        prompts
            .get(&user_id)
            .is_some_and(|started| started.elapsed() < Duration::from_secs(PROMPT_TIMEOUT_SECS))
    }
}

/// Shared handle handed to every bot handler.
#[derive(Clone, Default)]
pub struct BotState {
    pub confirmations: PendingConfirmations,
    pub prompts: PendingPrompts,
}

impl BotState {
    pub fn new() -> Self {
        Self::default()
    }
}
