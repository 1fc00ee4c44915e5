//! Per-instance state.
//!
//! One `MechanismState` is one allocation round. The service in
//! [`super::AllocationMechanism`] holds no instance data of its own; every
//! operation receives the state it acts on.

use crate::conversion::DecimalConverter;
use crate::error::{AllocationError, AllocationResult};
use crate::events::EventLog;
use crate::forwarding::ForwardingPolicy;
use crate::types::{Address, ProposalId, Support, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Instance configuration. Fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MechanismConfig {
    /// Underlying asset token.
    pub asset: Address,
    /// Native precision of the asset.
    pub asset_decimals: u8,
    pub share_name: String,
    pub share_symbol: String,
    /// Offset from `start_time` to the opening of the voting window.
    pub voting_delay: u64,
    /// Length of the voting window.
    pub voting_period: u64,
    /// Minimum net votes (18-decimal shares) for a proposal to pass.
    pub quorum_shares: u128,
    /// Wait between queuing and redeemability.
    pub timelock_delay: u64,
    /// Protection window after redemption opens, before sweeping.
    pub grace_period: u64,
    /// Controlling party (finalize, sweep).
    pub controller: Address,
    /// Account holding the pooled asset at the asset boundary.
    pub mechanism: Address,
    /// Instance creation time.
    pub start_time: Timestamp,
    #[serde(default)]
    pub forwarding_policy: ForwardingPolicy,
}

impl MechanismConfig {
    pub fn validate(&self) -> AllocationResult<()> {
        DecimalConverter::new(self.asset_decimals)?;

        if self.controller.is_zero() {
            return Err(AllocationError::InvalidConfig(
                "controller must be non-zero".to_string(),
            ));
        }
        if self.mechanism.is_zero() {
            return Err(AllocationError::InvalidConfig(
                "mechanism account must be non-zero".to_string(),
            ));
        }
        if self.voting_period == 0 {
            return Err(AllocationError::InvalidConfig(
                "voting period must be positive".to_string(),
            ));
        }
        if self.share_name.is_empty() || self.share_symbol.is_empty() {
            return Err(AllocationError::InvalidConfig(
                "share name and symbol must be set".to_string(),
            ));
        }

        Ok(())
    }

    /// First instant of the voting window (exclusive).
    pub fn voting_start(&self) -> Timestamp {
        self.start_time.saturating_add(self.voting_delay)
    }

    /// End of the voting window (exclusive).
    pub fn voting_end(&self) -> Timestamp {
        self.voting_start().saturating_add(self.voting_period)
    }

    pub fn converter(&self) -> AllocationResult<DecimalConverter> {
        DecimalConverter::new(self.asset_decimals)
    }
}

/// Registered participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    pub registered: bool,
    /// Remaining spendable weight.
    pub voting_power: u128,
    /// Total power ever granted (remaining + spent).
    pub power_granted: u128,
}

impl VoterRecord {
    pub fn power_spent(&self) -> u128 {
        self.power_granted - self.voting_power
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposer: Address,
    pub recipient: Address,
    pub description: String,
    pub canceled: bool,
    /// Set when queued, not when redeemed.
    pub claimed: bool,
    /// 0 until queued.
    pub earliest_redeemable_time: Timestamp,
    pub created_at: Timestamp,
}

impl Proposal {
    pub fn is_queued(&self) -> bool {
        self.earliest_redeemable_time != 0
    }
}

/// Weighted vote sums for one proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub shares_for: u128,
    pub shares_against: u128,
    pub shares_abstain: u128,
}

impl VoteTally {
    /// `for - against`, floored at zero.
    pub fn net_votes(&self) -> u128 {
        self.shares_for.saturating_sub(self.shares_against)
    }

    pub(crate) fn bucket_mut(&mut self, support: Support) -> &mut u128 {
        match support {
            Support::For => &mut self.shares_for,
            Support::Against => &mut self.shares_against,
            Support::Abstain => &mut self.shares_abstain,
        }
    }
}

/// Proposal lifecycle as seen at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalState {
    /// Voting window not yet open.
    Pending,
    /// Inside the voting window.
    Active,
    /// Withdrawn by the proposer.
    Canceled,
    /// Window closed, tally not finalized.
    Tallying,
    /// Finalized below quorum.
    Defeated,
    /// Finalized at or above quorum, not yet queued.
    Succeeded,
    /// Shares minted, timelock running.
    Queued,
    /// Timelock elapsed, within the grace period.
    Redeemable,
    /// Grace period over.
    Expired,
}

impl std::fmt::Display for ProposalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// ERC20-like share ledger plus the pool backing it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLedger {
    pub total_supply: u128,
    pub balances: BTreeMap<Address, u128>,
    /// `(owner, spender) -> remaining allowance`
    pub allowances: BTreeMap<(Address, Address), u128>,
    pub total_assets_held: u128,
    /// 0 until the first proposal is queued; set once.
    pub global_redemption_start: Timestamp,
    /// Shares minted per queued proposal.
    pub proposal_shares: BTreeMap<ProposalId, u128>,
}

impl ShareLedger {
    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn mint(&mut self, to: &Address, amount: u128) -> AllocationResult<()> {
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(AllocationError::ArithmeticOverflow)?;
        *self.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }

    pub(crate) fn burn(&mut self, from: &Address, amount: u128) -> AllocationResult<()> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(AllocationError::InsufficientShares {
                requested: amount,
                available,
            });
        }
        self.balances.insert(*from, available - amount);
        self.total_supply -= amount;
        Ok(())
    }

    pub(crate) fn move_shares(
        &mut self,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> AllocationResult<()> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(AllocationError::InsufficientShares {
                requested: amount,
                available,
            });
        }
        self.balances.insert(*from, available - amount);
        *self.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }

    pub(crate) fn spend_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: u128,
    ) -> AllocationResult<()> {
        let available = self.allowance(owner, spender);
        if available == u128::MAX {
            return Ok(());
        }
        if available < amount {
            return Err(AllocationError::InsufficientAllowance {
                requested: amount,
                available,
            });
        }
        self.allowances
            .insert((*owner, *spender), available - amount);
        Ok(())
    }
}

/// Complete state of one allocation instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MechanismState {
    pub(crate) config: MechanismConfig,
    pub(crate) voters: BTreeMap<Address, VoterRecord>,
    pub(crate) proposals: BTreeMap<ProposalId, Proposal>,
    pub(crate) tallies: BTreeMap<ProposalId, VoteTally>,
    /// Recipient -> id of the non-canceled proposal using it.
    pub(crate) recipients: BTreeMap<Address, ProposalId>,
    pub(crate) next_proposal_id: ProposalId,
    pub(crate) tally_finalized: bool,
    pub(crate) ledger: ShareLedger,
    pub(crate) last_seen_time: Timestamp,
    pub(crate) events: EventLog,
}

impl MechanismState {
    /// Create a fresh instance after validating its config.
    pub fn new(config: MechanismConfig) -> AllocationResult<Self> {
        config.validate()?;
        let last_seen_time = config.start_time;
        Ok(Self {
            config,
            voters: BTreeMap::new(),
            proposals: BTreeMap::new(),
            tallies: BTreeMap::new(),
            recipients: BTreeMap::new(),
            next_proposal_id: 1,
            tally_finalized: false,
            ledger: ShareLedger::default(),
            last_seen_time,
            events: EventLog::new(),
        })
    }

    pub fn config(&self) -> &MechanismConfig {
        &self.config
    }

    pub fn voter(&self, who: &Address) -> Option<&VoterRecord> {
        self.voters.get(who)
    }

    pub fn voters(&self) -> impl Iterator<Item = (&Address, &VoterRecord)> {
        self.voters.iter()
    }

    pub fn is_registered(&self, who: &Address) -> bool {
        self.voters.get(who).map(|v| v.registered).unwrap_or(false)
    }

    pub fn voting_power(&self, who: &Address) -> u128 {
        self.voters.get(who).map(|v| v.voting_power).unwrap_or(0)
    }

    pub fn proposal(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    /// Number of proposals ever created.
    pub fn proposal_count(&self) -> u64 {
        self.next_proposal_id.saturating_sub(1)
    }

    pub fn tally(&self, id: ProposalId) -> Option<&VoteTally> {
        self.tallies.get(&id)
    }

    /// Proposal currently holding `recipient`, if any.
    pub fn proposal_for_recipient(&self, recipient: &Address) -> Option<ProposalId> {
        self.recipients.get(recipient).copied()
    }

    pub fn tally_finalized(&self) -> bool {
        self.tally_finalized
    }

    pub fn ledger(&self) -> &ShareLedger {
        &self.ledger
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn last_seen_time(&self) -> Timestamp {
        self.last_seen_time
    }

    /// `[opens, closes)` for redemption, once the first proposal is queued.
    /// Sweeping becomes possible at `closes`.
    pub fn redemption_window(&self) -> Option<(Timestamp, Timestamp)> {
        let start = self.ledger.global_redemption_start;
        if start == 0 {
            return None;
        }
        Some((start, start.saturating_add(self.config.grace_period)))
    }

    /// Structural checks for a state that did not come from `new`, such as
    /// one decoded from a snapshot.
    pub fn check_integrity(&self) -> AllocationResult<()> {
        self.config.validate()?;

        let inconsistent = |reason: String| -> AllocationResult<()> {
            Err(AllocationError::InconsistentState(reason))
        };

        if self.next_proposal_id == 0 {
            return inconsistent("next proposal id is 0".to_string());
        }
        for (id, proposal) in &self.proposals {
            if proposal.id != *id || *id >= self.next_proposal_id {
                return inconsistent(format!("proposal {} is out of sequence", id));
            }
        }
        for (recipient, id) in &self.recipients {
            match self.proposals.get(id) {
                Some(p) if !p.canceled && p.recipient == *recipient => {}
                _ => {
                    return inconsistent(format!(
                        "recipient {} maps to proposal {}",
                        recipient, id
                    ))
                }
            }
        }
        for id in self.ledger.proposal_shares.keys() {
            if !self.proposals.get(id).map(Proposal::is_queued).unwrap_or(false) {
                return inconsistent(format!("shares minted for unqueued proposal {}", id));
            }
        }

        let held = self
            .ledger
            .balances
            .values()
            .try_fold(0u128, |sum, balance| sum.checked_add(*balance))
            .ok_or(AllocationError::ArithmeticOverflow)?;
        if held != self.ledger.total_supply {
            return inconsistent(format!(
                "balances sum to {}, total supply is {}",
                held, self.ledger.total_supply
            ));
        }
        if self.last_seen_time < self.config.start_time {
            return inconsistent("clock is before the instance start".to_string());
        }
        Ok(())
    }

    pub(crate) fn proposal_or_err(&self, id: ProposalId) -> AllocationResult<&Proposal> {
        self.proposals
            .get(&id)
            .ok_or(AllocationError::InvalidProposal(id))
    }
}
