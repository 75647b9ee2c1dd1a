//! Optimistic link selection for pickers
//!
//! A picker shows the user's toggle immediately and reconciles once the server
//! answers. `LinkSelection` keeps the committed set as the single source of
//! truth and layers pending mutations on top of it. Each mutation moves
//! `Pending -> Committed` or `Pending -> RolledBack` exactly once.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::registry::EntityRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Link,
    Unlink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPhase {
    Pending,
    Committed,
    RolledBack,
}

/// Handle for one in-flight mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MutationTicket(u64);

/// Dismissible error left behind by a rolled-back mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationFailure {
    pub target: EntityRef,
    pub kind: MutationKind,
    pub message: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Ticket {0:?} is not pending")]
    UnknownTicket(MutationTicket),

    #[error("A change to {0} is already in flight")]
    MutationInFlight(EntityRef),
}

#[derive(Debug, Clone, Copy)]
struct PendingMutation {
    target: EntityRef,
    kind: MutationKind,
}

#[derive(Debug, Clone, Default)]
pub struct LinkSelection {
    committed: BTreeSet<EntityRef>,
    pending: BTreeMap<MutationTicket, PendingMutation>,
    next_ticket: u64,
    last_error: Option<MutationFailure>,
}

impl LinkSelection {
    /// Start from the links the server reported
    pub fn from_committed(linked: impl IntoIterator<Item = EntityRef>) -> Self {
        Self {
            committed: linked.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Flip `target` optimistically
    ///
    /// Returns the ticket to resolve once the server call finishes, plus the
    /// kind of call the caller must make.
    pub fn toggle(&mut self, target: EntityRef) -> Result<(MutationTicket, MutationKind), SelectionError> {
        if self.is_pending(&target) {
            return Err(SelectionError::MutationInFlight(target));
        }

        let kind = if self.committed.contains(&target) {
            MutationKind::Unlink
        } else {
            MutationKind::Link
        };

        let ticket = MutationTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending.insert(ticket, PendingMutation { target, kind });

        Ok((ticket, kind))
    }

    /// Settle a pending mutation with the server's answer
    pub fn resolve(
        &mut self,
        ticket: MutationTicket,
        outcome: Result<(), String>,
    ) -> Result<MutationPhase, SelectionError> {
        let mutation = self
            .pending
            .remove(&ticket)
            .ok_or(SelectionError::UnknownTicket(ticket))?;

        match outcome {
            Ok(()) => {
                match mutation.kind {
                    MutationKind::Link => self.committed.insert(mutation.target),
                    MutationKind::Unlink => self.committed.remove(&mutation.target),
                };
                Ok(MutationPhase::Committed)
            }
            Err(message) => {
                self.last_error = Some(MutationFailure {
                    target: mutation.target,
                    kind: mutation.kind,
                    message,
                });
                Ok(MutationPhase::RolledBack)
            }
        }
    }

    /// Optimistic view: pending mutations applied over the committed set
    pub fn is_linked(&self, target: &EntityRef) -> bool {
        match self.pending_for(target) {
            Some(mutation) => mutation.kind == MutationKind::Link,
            None => self.committed.contains(target),
        }
    }

    pub fn is_pending(&self, target: &EntityRef) -> bool {
        self.pending_for(target).is_some()
    }

    /// Every ref the picker should show as linked right now
    pub fn visible(&self) -> BTreeSet<EntityRef> {
        let mut visible = self.committed.clone();
        for mutation in self.pending.values() {
            match mutation.kind {
                MutationKind::Link => visible.insert(mutation.target),
                MutationKind::Unlink => visible.remove(&mutation.target),
            };
        }
        visible
    }

    pub fn committed(&self) -> &BTreeSet<EntityRef> {
        &self.committed
    }

    /// Take the last failure, clearing it
    pub fn dismiss_error(&mut self) -> Option<MutationFailure> {
        self.last_error.take()
    }

    pub fn last_error(&self) -> Option<&MutationFailure> {
        self.last_error.as_ref()
    }

    fn pending_for(&self, target: &EntityRef) -> Option<&PendingMutation> {
        self.pending.values().find(|m| &m.target == target)
    }
}
