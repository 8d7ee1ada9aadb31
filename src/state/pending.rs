//! Pending confirmation tracking
//!
//! Destructive chat commands park their prepared request here, keyed by a
//! random token carried in the confirm/cancel buttons. A slot is removed
//! exactly once across the confirm, cancel and timeout paths, and taking a
//! slot cancels its timeout task.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use teloxide::types::{ChatId, MessageId};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::services::roblox::RobloxProfile;

/// How long a confirmation prompt stays valid.
pub const CONFIRM_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct PendingAdd {
    pub profile: RobloxProfile,
    pub reason: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_permanent: bool,
}

#[derive(Debug, Clone)]
pub struct PendingRemove {
    pub roblox_user_id: String,
    pub roblox_username: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub enum PendingAction {
    Add(PendingAdd),
    Remove(PendingRemove),
}

/// A parked request plus where its prompt message lives.
#[derive(Debug)]
pub struct PendingRequest {
    pub invoker_id: i64,
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub action: PendingAction,
}

struct PendingSlot {
    request: PendingRequest,
    timeout: Option<JoinHandle<()>>,
}

/// Outcome of a confirm/cancel button press.
#[derive(Debug)]
pub enum TakeOutcome {
    Taken(PendingRequest),
    /// Someone other than the invoker pressed the button; slot stays.
    WrongUser,
    /// Already confirmed, cancelled or timed out.
    Missing,
}

#[derive(Clone, Default)]
pub struct PendingConfirmations {
    inner: Arc<Mutex<HashMap<Uuid, PendingSlot>>>,
}

impl PendingConfirmations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, token: Uuid, request: PendingRequest, timeout: Option<JoinHandle<()>>) {
        let mut slots = self.inner.lock().unwrap();
        slots.insert(token, PendingSlot { request, timeout });
    }

    /// Remove the slot for a confirm/cancel press by its invoker.
    ///
    /// Cancels the timeout task so the prompt is not edited twice.
    pub fn take_for(&self, token: &Uuid, invoker_id: i64) -> TakeOutcome {
        let mut slots = self.inner.lock().unwrap();

        match slots.get(token) {
            None => TakeOutcome::Missing,
            Some(slot) if slot.request.invoker_id != invoker_id => TakeOutcome::WrongUser,
            Some(_) => {
                let slot = slots.remove(token).expect("slot present under lock");
                if let Some(timeout) = slot.timeout {
                    timeout.abort();
                }
                TakeOutcome::Taken(slot.request)
            }
        }
    }

    /// Remove the slot from the timeout path. Does not abort the timeout
    /// task (it is the caller).
    pub fn expire(&self, token: &Uuid) -> Option<PendingRequest> {
        let mut slots = self.inner.lock().unwrap();
        slots.remove(token).map(|slot| slot.request)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request(invoker_id: i64) -> PendingRequest {
        PendingRequest {
            invoker_id,
            chat_id: ChatId(100),
            message_id: MessageId(1),
            action: PendingAction::Remove(PendingRemove {
                roblox_user_id: "123".to_string(),
                roblox_username: "builderman".to_string(),
                reason: "resolved".to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn take_is_exactly_once() {
        let pending = PendingConfirmations::new();
        let token = Uuid::new_v4();
        pending.insert(token, request(42), None);

        assert_matches!(pending.take_for(&token, 42), TakeOutcome::Taken(_));
        assert_matches!(pending.take_for(&token, 42), TakeOutcome::Missing);
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn wrong_user_leaves_slot_pending() {
        let pending = PendingConfirmations::new();
        let token = Uuid::new_v4();
        pending.insert(token, request(42), None);

        assert_matches!(pending.take_for(&token, 99), TakeOutcome::WrongUser);
        assert_eq!(pending.len(), 1);
        assert_matches!(pending.take_for(&token, 42), TakeOutcome::Taken(_));
    }

    #[tokio::test]
    async fn expire_and_take_cannot_both_win() {
        let pending = PendingConfirmations::new();
        let token = Uuid::new_v4();
        pending.insert(token, request(42), None);

        assert!(pending.expire(&token).is_some());
        assert!(pending.expire(&token).is_none());
        assert_matches!(pending.take_for(&token, 42), TakeOutcome::Missing);
    }

    #[tokio::test]
    async fn take_aborts_timeout_task() {
        let pending = PendingConfirmations::new();
        let token = Uuid::new_v4();
        let timeout = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        });
        pending.insert(token, request(42), Some(timeout));

        let outcome = pending.take_for(&token, 42);
        assert_matches!(outcome, TakeOutcome::Taken(_));
        // The parked timeout task is cancelled with the slot.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
