//! Mock downstream forwarder.

use super::{ForwardError, ForwardedVote, VoteForwarder};
use crate::types::ProposalId;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

/// Records forwarded votes; fails for configured proposal ids.
///
/// Clones share the same record so a test can keep a handle after moving the
/// forwarder into the engine.
#[derive(Clone, Default)]
pub struct MockVoteForwarder {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    forwarded: Vec<ForwardedVote>,
    revoked: Vec<ForwardedVote>,
    failing: BTreeSet<ProposalId>,
}

impl MockVoteForwarder {
    /// Create new mock forwarder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every vote for `proposal_id` fail downstream.
    pub fn fail_for(&self, proposal_id: ProposalId) {
        let mut s = self.state.lock().unwrap();
        s.failing.insert(proposal_id);
    }

    /// Votes that reached the downstream collaborator.
    pub fn forwarded(&self) -> Vec<ForwardedVote> {
        let s = self.state.lock().unwrap();
        s.forwarded.clone()
    }

    /// Votes withdrawn after an aborted batch.
    pub fn revoked(&self) -> Vec<ForwardedVote> {
        let s = self.state.lock().unwrap();
        s.revoked.clone()
    }
}

impl VoteForwarder for MockVoteForwarder {
    fn forward_vote(&mut self, vote: &ForwardedVote) -> Result<(), ForwardError> {
        let mut s = self.state.lock().unwrap();
        if s.failing.contains(&vote.proposal_id) {
            return Err(ForwardError::Rejected(format!(
                "proposal {} not accepted downstream",
                vote.proposal_id
            )));
        }
        s.forwarded.push(vote.clone());
        Ok(())
    }

    fn revoke_vote(&mut self, vote: &ForwardedVote) -> Result<(), ForwardError> {
        let mut s = self.state.lock().unwrap();
        let position = s
            .forwarded
            .iter()
            .rposition(|v| v == vote)
            .ok_or_else(|| ForwardError::Rejected("vote was never forwarded".to_string()))?;
        let removed = s.forwarded.remove(position);
        s.revoked.push(removed);
        Ok(())
    }
}
