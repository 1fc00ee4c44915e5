//! Ledger event log.
//!
//! - Append-only; records are never edited or removed
//! - Sequence numbers are dense and start at 0
//! - Appended inside the call that caused them, so a failed call leaves no
//!   trace (the log is part of the restored instance state)
//! - Observers are notified only after the call commits

use crate::types::{Address, ProposalId, Support, Timestamp};
use serde::{Deserialize, Serialize};

/// State change worth indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    UserRegistered {
        user: Address,
        deposit: u128,
        voting_power: u128,
    },
    ProposalCreated {
        proposal_id: ProposalId,
        proposer: Address,
        recipient: Address,
        description: String,
    },
    ProposalCanceled {
        proposal_id: ProposalId,
        proposer: Address,
    },
    VotesCast {
        voter: Address,
        proposal_id: ProposalId,
        support: Support,
        weight: u128,
    },
    VoteForwardFailed {
        voter: Address,
        proposal_id: ProposalId,
        weight: u128,
        reason: String,
    },
    TallyFinalized,
    ProposalQueued {
        proposal_id: ProposalId,
        recipient: Address,
        shares: u128,
        earliest_redeemable_time: Timestamp,
    },
    Transfer {
        from: Address,
        to: Address,
        amount: u128,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: u128,
    },
    Redeemed {
        caller: Address,
        receiver: Address,
        owner: Address,
        assets: u128,
        shares: u128,
    },
    Swept {
        token: Address,
        receiver: Address,
        amount: u128,
    },
}

/// Event discriminant, for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    UserRegistered,
    ProposalCreated,
    ProposalCanceled,
    VotesCast,
    VoteForwardFailed,
    TallyFinalized,
    ProposalQueued,
    Transfer,
    Approval,
    Redeemed,
    Swept,
}

impl LedgerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LedgerEvent::UserRegistered { .. } => EventKind::UserRegistered,
            LedgerEvent::ProposalCreated { .. } => EventKind::ProposalCreated,
            LedgerEvent::ProposalCanceled { .. } => EventKind::ProposalCanceled,
            LedgerEvent::VotesCast { .. } => EventKind::VotesCast,
            LedgerEvent::VoteForwardFailed { .. } => EventKind::VoteForwardFailed,
            LedgerEvent::TallyFinalized => EventKind::TallyFinalized,
            LedgerEvent::ProposalQueued { .. } => EventKind::ProposalQueued,
            LedgerEvent::Transfer { .. } => EventKind::Transfer,
            LedgerEvent::Approval { .. } => EventKind::Approval,
            LedgerEvent::Redeemed { .. } => EventKind::Redeemed,
            LedgerEvent::Swept { .. } => EventKind::Swept,
        }
    }

    /// Proposal this event is about, if any.
    pub fn proposal_id(&self) -> Option<ProposalId> {
        match self {
            LedgerEvent::ProposalCreated { proposal_id, .. }
            | LedgerEvent::ProposalCanceled { proposal_id, .. }
            | LedgerEvent::VotesCast { proposal_id, .. }
            | LedgerEvent::VoteForwardFailed { proposal_id, .. }
            | LedgerEvent::ProposalQueued { proposal_id, .. } => Some(*proposal_id),
            _ => None,
        }
    }

    /// One-line human-readable summary.
    pub fn describe(&self) -> String {
        match self {
            LedgerEvent::UserRegistered {
                user,
                deposit,
                voting_power,
            } => format!(
                "{} registered (deposit {}, power {})",
                user, deposit, voting_power
            ),
            LedgerEvent::ProposalCreated {
                proposal_id,
                proposer,
                recipient,
                ..
            } => format!(
                "proposal {} created by {} for {}",
                proposal_id, proposer, recipient
            ),
            LedgerEvent::ProposalCanceled { proposal_id, .. } => {
                format!("proposal {} canceled", proposal_id)
            }
            LedgerEvent::VotesCast {
                voter,
                proposal_id,
                support,
                weight,
            } => format!(
                "{} voted {} on proposal {} with weight {}",
                voter, support, proposal_id, weight
            ),
            LedgerEvent::VoteForwardFailed {
                voter,
                proposal_id,
                reason,
                ..
            } => format!(
                "vote by {} on proposal {} reverted: {}",
                voter, proposal_id, reason
            ),
            LedgerEvent::TallyFinalized => "vote tally finalized".to_string(),
            LedgerEvent::ProposalQueued {
                proposal_id,
                shares,
                earliest_redeemable_time,
                ..
            } => format!(
                "proposal {} queued: {} shares, redeemable at {}",
                proposal_id, shares, earliest_redeemable_time
            ),
            LedgerEvent::Transfer { from, to, amount } => {
                format!("transfer {} shares {} -> {}", amount, from, to)
            }
            LedgerEvent::Approval {
                owner,
                spender,
                amount,
            } => format!("{} approved {} for {} shares", owner, spender, amount),
            LedgerEvent::Redeemed {
                owner,
                receiver,
                assets,
                shares,
                ..
            } => format!(
                "{} redeemed {} shares for {} assets to {}",
                owner, shares, assets, receiver
            ),
            LedgerEvent::Swept {
                token,
                receiver,
                amount,
            } => format!("swept {} of {} to {}", amount, token, receiver),
        }
    }
}

/// Single log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub sequence: u64,
    pub timestamp: Timestamp,
    pub event: LedgerEvent,
}

/// Append-only event log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event stamped with the call's clock reading.
    pub fn record(&mut self, timestamp: Timestamp, event: LedgerEvent) {
        self.records.push(EventRecord {
            sequence: self.records.len() as u64,
            timestamp,
            event,
        });
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Drop every record from `len` on. Used to discard a failed call's events.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Receives committed events.
pub trait EventObserver {
    fn on_event(&self, record: &EventRecord);
}

impl<F> EventObserver for F
where
    F: Fn(&EventRecord),
{
    fn on_event(&self, record: &EventRecord) {
        self(record)
    }
}

/// Query options for the event log.
#[derive(Debug, Clone)]
pub struct EventQuery {
    /// Filter by event kind.
    pub kind: Option<EventKind>,
    /// Filter by proposal.
    pub proposal_id: Option<ProposalId>,
    /// Limit number of results (most recent first).
    pub limit: Option<usize>,
    /// Only show entries after this timestamp.
    pub after_timestamp: Option<Timestamp>,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            kind: None,
            proposal_id: None,
            limit: Some(50),
            after_timestamp: None,
        }
    }
}

/// Query the event log with filters.
///
/// Returns records in reverse order (most recent first).
pub fn query_events(log: &EventLog, query: &EventQuery) -> Vec<EventRecord> {
    let mut filtered: Vec<EventRecord> = log
        .records()
        .iter()
        .filter(|record| {
            if let Some(kind) = query.kind {
                if record.event.kind() != kind {
                    return false;
                }
            }

            if let Some(id) = query.proposal_id {
                if record.event.proposal_id() != Some(id) {
                    return false;
                }
            }

            if let Some(after_ts) = query.after_timestamp {
                if record.timestamp <= after_ts {
                    return false;
                }
            }

            true
        })
        .cloned()
        .collect();

    filtered.sort_by(|a, b| b.sequence.cmp(&a.sequence));

    if let Some(limit) = query.limit {
        filtered.truncate(limit);
    }

    filtered
}

/// Format records for terminal display.
pub fn format_event_log(records: &[EventRecord]) -> String {
    if records.is_empty() {
        return "No events recorded.".to_string();
    }

    let mut output = String::from("Ledger events\n\n");
    for record in records {
        output.push_str(&format!(
            "#{:<5} t={:<12} {}\n",
            record.sequence,
            record.timestamp,
            record.event.describe()
        ));
    }

    output.trim_end().to_string()
}
