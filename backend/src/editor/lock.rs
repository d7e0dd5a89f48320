//! Single-writer edit locks.
//!
//! Each transition is one conditional write against the email row; the state
//! is only read afterwards, to explain a write that did not apply.

use crate::errors::EditorError;
use crate::storage::{EmailStore, LockCondition, UserDirectory};
use common::model::email::{LockState, LockStatus};
use log::{info, warn};

pub struct LockManager<'a, S> {
    store: &'a S,
}

impl<'a, S> LockManager<'a, S>
where
    S: EmailStore + UserDirectory,
{
    pub fn new(store: &'a S) -> Self {
        LockManager { store }
    }

    /// Takes the lock for `user_id`. Re-acquiring one's own lock succeeds
    /// without change.
    pub fn acquire(&self, uuid: &str, user_id: i64) -> Result<(), EditorError> {
        let took = self.store.update_lock(
            uuid,
            LockCondition::FreeOrHeldBy(user_id),
            LockState::LockedBy(user_id),
        )?;
        if took {
            info!("Email {} locked by user {}", uuid, user_id);
            return Ok(());
        }

        let holder = self.current_state(uuid)?.holder();
        warn!(
            "Lock conflict on email {}: user {} blocked by {:?}",
            uuid, user_id, holder
        );
        Err(self.conflict(holder)?)
    }

    /// Gives the lock back. Only the holder may release; releasing a free
    /// lock is a no-op.
    pub fn release(&self, uuid: &str, user_id: i64) -> Result<(), EditorError> {
        let released =
            self.store
                .update_lock(uuid, LockCondition::HeldBy(user_id), LockState::Unlocked)?;
        if released {
            info!("Email {} unlocked by user {}", uuid, user_id);
            return Ok(());
        }

        match self.current_state(uuid)? {
            LockState::Unlocked => Ok(()),
            LockState::LockedBy(_) => Err(EditorError::forbidden(
                "No tienes permiso para desbloquear este correo.",
            )),
        }
    }

    /// Clears the lock whoever holds it. Authorization is the caller's job.
    pub fn force_release(&self, uuid: &str) -> Result<(), EditorError> {
        let cleared = self
            .store
            .update_lock(uuid, LockCondition::Any, LockState::Unlocked)?;
        if !cleared {
            return Err(not_found());
        }
        info!("Email {} force-unlocked", uuid);
        Ok(())
    }

    pub fn check_lock(&self, uuid: &str) -> Result<LockState, EditorError> {
        self.current_state(uuid)
    }

    /// Lock state with the holder's display name resolved.
    pub fn status(&self, uuid: &str) -> Result<LockStatus, EditorError> {
        let state = self.current_state(uuid)?;
        let locked_by_username = match state.holder() {
            Some(holder) => self.store.display_name(holder)?,
            None => None,
        };
        Ok(LockStatus {
            is_locked: state != LockState::Unlocked,
            locked_by_user_id: state.holder(),
            locked_by_username,
        })
    }

    /// Builds the conflict error for `holder`, resolving the display name.
    pub fn conflict(&self, holder: Option<i64>) -> Result<EditorError, EditorError> {
        let holder_name = match holder {
            Some(holder) => self.store.display_name(holder)?,
            None => None,
        };
        Ok(EditorError::LockConflict {
            holder_id: holder,
            holder_name,
        })
    }

    fn current_state(&self, uuid: &str) -> Result<LockState, EditorError> {
        self.store.get_lock_state(uuid)?.ok_or_else(not_found)
    }
}

fn not_found() -> EditorError {
    EditorError::not_found("Correo no encontrado.")
}
