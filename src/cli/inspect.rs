use allocator::asset::MockAssetLedger;
use allocator::events::{format_event_log, query_events, EventQuery};
use allocator::mechanism::{AllocationMechanism, MechanismState};
use allocator::serialization::load_snapshot;
use allocator::strategy::LinearStrategy;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub evaluated_at: u64,
    pub last_seen_time: u64,
    pub voting_start: u64,
    pub voting_end: u64,
    pub tally_finalized: bool,
    pub quorum_shares: String,
    pub total_supply: String,
    pub total_assets_held: String,
    pub global_redemption_start: u64,
    pub registered_voters: usize,
    pub event_count: usize,
    pub proposals: Vec<ProposalReport>,
}

#[derive(Debug, Serialize)]
pub struct ProposalReport {
    pub id: u64,
    pub proposer: String,
    pub recipient: String,
    pub description: String,
    pub state: String,
    pub shares_for: String,
    pub shares_against: String,
    pub shares_abstain: String,
    pub shares_minted: String,
    pub earliest_redeemable_time: u64,
}

/// Decode a snapshot and report its state
///
/// Proposal states are evaluated with the default quorum rule.
pub fn execute(
    snapshot: String,
    now: Option<u64>,
    events: usize,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = load_snapshot(Path::new(&snapshot))?;
    let report = build_report(&state, now.unwrap_or(state.last_seen_time()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print!("{}", render_text(&report));
    if events > 0 {
        let query = EventQuery {
            limit: Some(events),
            ..Default::default()
        };
        println!();
        print!("{}", format_event_log(&query_events(state.events(), &query)));
    }
    Ok(())
}

pub fn build_report(
    state: &MechanismState,
    now: u64,
) -> Result<InspectReport, Box<dyn std::error::Error>> {
    let service = AllocationMechanism::new(LinearStrategy, MockAssetLedger::new());
    let config = state.config();
    let ledger = state.ledger();

    let mut proposals = Vec::new();
    for proposal in state.proposals() {
        let tally = state.tally(proposal.id).copied().unwrap_or_default();
        let minted = ledger.proposal_shares.get(&proposal.id).copied().unwrap_or(0);
        proposals.push(ProposalReport {
            id: proposal.id,
            proposer: proposal.proposer.to_string(),
            recipient: proposal.recipient.to_string(),
            description: proposal.description.clone(),
            state: service.proposal_state(state, proposal.id, now)?.to_string(),
            shares_for: tally.shares_for.to_string(),
            shares_against: tally.shares_against.to_string(),
            shares_abstain: tally.shares_abstain.to_string(),
            shares_minted: minted.to_string(),
            earliest_redeemable_time: proposal.earliest_redeemable_time,
        });
    }

    Ok(InspectReport {
        evaluated_at: now,
        last_seen_time: state.last_seen_time(),
        voting_start: config.voting_start(),
        voting_end: config.voting_end(),
        tally_finalized: state.tally_finalized(),
        quorum_shares: config.quorum_shares.to_string(),
        total_supply: ledger.total_supply.to_string(),
        total_assets_held: ledger.total_assets_held.to_string(),
        global_redemption_start: ledger.global_redemption_start,
        registered_voters: state.voters().count(),
        event_count: state.events().len(),
        proposals,
    })
}

pub fn render_text(report: &InspectReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("📊 Allocation instance at t={}\n\n", report.evaluated_at));
    out.push_str(&format!(
        "  Voting window:     ({}, {})\n",
        report.voting_start, report.voting_end
    ));
    out.push_str(&format!(
        "  Tally finalized:   {}\n",
        if report.tally_finalized { "yes" } else { "no" }
    ));
    out.push_str(&format!("  Voters:            {}\n", report.registered_voters));
    out.push_str(&format!("  Share supply:      {}\n", report.total_supply));
    out.push_str(&format!("  Pooled assets:     {}\n", report.total_assets_held));
    if report.global_redemption_start > 0 {
        out.push_str(&format!(
            "  Redemption opens:  {}\n",
            report.global_redemption_start
        ));
    }

    out.push('\n');
    if report.proposals.is_empty() {
        out.push_str("No proposals.\n");
        return out;
    }
    for p in &report.proposals {
        out.push_str(&format!(
            "  #{} {} -> {} [{}]\n      for {} / against {} / abstain {}, minted {}\n",
            p.id,
            p.description,
            p.recipient,
            p.state,
            p.shares_for,
            p.shares_against,
            p.shares_abstain,
            p.shares_minted
        ));
    }
    out
}
