//! Typed readers over runtime storage, shared by the enricher and the storage fetcher.
//! Record shapes differ between runtime versions; each reader accepts the variants seen
//! on supported chains.

use serde_json::Value as JsonValue;

use super::api::{KeyArg, SubstrateApi};
use super::block::{self, amount, get, int, is_none, list, text, utf8, variant, BlockHash};
use super::{CallInfo, IdentityJudgement};
use crate::error::{ChainEventsError, Result};

/// A democracy proposal in `PublicProps`.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicProposal {
    pub index: u64,
    pub hash: String,
    pub proposer: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OngoingReferendum {
    pub index: u64,
    pub hash: String,
    pub threshold: String,
    pub end: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Preimage {
    pub call: Option<CallInfo>,
    pub provider: String,
    pub deposit: String,
    pub since: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreasuryProposal {
    pub proposer: String,
    pub value: String,
    pub beneficiary: String,
    pub bond: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BountyStatus {
    Proposed,
    Approved,
    Funded,
    CuratorProposed { curator: String },
    Active { curator: String, update_due: u64 },
    PendingPayout { curator: String, beneficiary: String, unlock_at: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bounty {
    pub proposer: String,
    pub value: String,
    pub fee: String,
    pub curator_deposit: String,
    pub bond: String,
    pub status: BountyStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenTip {
    pub reason: String,
    pub who: String,
    pub finder: String,
    pub deposit: String,
    pub closes: Option<u64>,
    pub tips: Vec<(String, String)>,
    pub finders_fee: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectiveVotes {
    pub index: u64,
    pub threshold: u64,
    pub ayes: Vec<String>,
    pub nays: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub display_name: String,
    /// `(registrar index, judgement)`
    pub judgements: Vec<(u64, IdentityJudgement)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalingProposal {
    pub author: String,
    pub stage: String,
    pub transition_time: u64,
    pub title: String,
    pub contents: String,
    pub vote_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoteRecord {
    pub tally_type: String,
    pub vote_type: String,
    pub outcomes: Vec<String>,
}

/// Proposal hash of a plain hash or a `Bounded` call (`{"Legacy": {"hash": ..}}`, `{"Lookup": ..}`).
fn proposal_hash(value: &JsonValue) -> Result<String> {
    if let Ok(hash) = text(value) {
        return Ok(hash);
    }
    let (_, fields) = variant(value)?;
    text(get(fields, "hash")?)
}

/// Accepts either a snake_case or camelCase key.
fn either<'a>(value: &'a JsonValue, snake: &str, camel: &str) -> Result<&'a JsonValue> {
    get(value, snake).or_else(|_| get(value, camel))
}

pub async fn public_props(api: &dyn SubstrateApi) -> Result<Vec<PublicProposal>> {
    let Some(props) = api.storage(None, "Democracy", "PublicProps", vec![]).await? else {
        return Ok(vec![]);
    };
    list(&props)?
        .iter()
        .map(|prop| {
            let fields = list(prop)?;
            Ok(PublicProposal {
                index: int(block::field(fields, 0, "index")?)?,
                hash: proposal_hash(block::field(fields, 1, "proposal")?)?,
                proposer: text(block::field(fields, 2, "proposer")?)?,
            })
        })
        .collect()
}

/// The deposit locked by a proposal. Older runtimes store `(balance, seconders)`, newer
/// ones `(seconders, balance)`.
pub async fn proposal_deposit(api: &dyn SubstrateApi, index: u64) -> Result<Option<String>> {
    let Some(deposit) = api
        .storage(None, "Democracy", "DepositOf", vec![KeyArg::Int(index.into())])
        .await?
    else {
        return Ok(None);
    };
    Ok(list(&deposit)?
        .iter()
        .find(|part| !part.is_array())
        .map(amount)
        .transpose()?)
}

/// `None` for finished referenda.
pub fn ongoing_referendum(index: u64, info: &JsonValue) -> Result<Option<OngoingReferendum>> {
    let status = match variant(info) {
        Ok(("Ongoing", status)) => status,
        Ok(("Finished", _)) => return Ok(None),
        _ => info,
    };
    let hash = match either(status, "proposal_hash", "proposalHash") {
        Ok(hash) => text(hash)?,
        Err(_) => proposal_hash(get(status, "proposal")?)?,
    };
    let (threshold, _) = variant(get(status, "threshold")?)?;
    Ok(Some(OngoingReferendum {
        index,
        hash,
        threshold: threshold.to_string(),
        end: int(get(status, "end")?)?,
    }))
}

pub async fn referendum(api: &dyn SubstrateApi, index: u64) -> Result<Option<OngoingReferendum>> {
    match api
        .storage(None, "Democracy", "ReferendumInfoOf", vec![KeyArg::Int(index.into())])
        .await?
    {
        Some(info) => ongoing_referendum(index, &info),
        None => Ok(None),
    }
}

pub async fn ongoing_referenda(api: &dyn SubstrateApi) -> Result<Vec<OngoingReferendum>> {
    let mut out = Vec::new();
    for (keys, info) in api
        .storage_entries(None, "Democracy", "ReferendumInfoOf", vec![])
        .await?
    {
        let index = int(block::field(&keys, 0, "referendum index")?)?;
        if let Some(referendum) = ongoing_referendum(index, &info)? {
            out.push(referendum);
        }
    }
    out.sort_by_key(|r| r.index);
    Ok(out)
}

/// `(dispatch block, proposal hash, referendum index)` entries of the democracy dispatch
/// queue. Runtimes that moved dispatch to the scheduler have none.
pub async fn dispatch_queue(api: &dyn SubstrateApi) -> Result<Vec<(u64, String, u64)>> {
    if !api.has_storage("Democracy", "DispatchQueue") {
        return Ok(vec![]);
    }
    let Some(queue) = api.storage(None, "Democracy", "DispatchQueue", vec![]).await? else {
        return Ok(vec![]);
    };
    list(&queue)?
        .iter()
        .map(|entry| {
            let fields = list(entry)?;
            Ok((
                int(block::field(fields, 0, "at")?)?,
                proposal_hash(block::field(fields, 1, "hash")?)?,
                int(block::field(fields, 2, "referendum index")?)?,
            ))
        })
        .collect()
}

pub async fn preimage(api: &dyn SubstrateApi, hash: &str) -> Result<Option<Preimage>> {
    if !api.has_storage("Democracy", "Preimages") {
        return Ok(None);
    }
    let Some(record) = api
        .storage(None, "Democracy", "Preimages", vec![KeyArg::hash(hash)?])
        .await?
    else {
        return Ok(None);
    };
    let (data, provider, deposit, since) = match variant(&record) {
        Ok(("Available", fields)) => (
            get(fields, "data")?,
            get(fields, "provider")?,
            get(fields, "deposit")?,
            get(fields, "since").ok(),
        ),
        Ok(("Missing", _)) => return Ok(None),
        _ => {
            let fields = list(&record)?;
            (
                block::field(fields, 0, "data")?,
                block::field(fields, 1, "provider")?,
                block::field(fields, 2, "deposit")?,
                fields.get(3),
            )
        }
    };
    let call = text(data)
        .ok()
        .and_then(|hex| hex::decode(hex.trim_start_matches("0x")).ok())
        .and_then(|bytes| api.decode_call(&bytes).ok())
        .and_then(|call| block::call_info(&call).ok());
    Ok(Some(Preimage {
        call,
        provider: text(provider)?,
        deposit: amount(deposit)?,
        since: since.map(int).transpose()?,
    }))
}

fn treasury_proposal_from(value: &JsonValue) -> Result<TreasuryProposal> {
    Ok(TreasuryProposal {
        proposer: text(get(value, "proposer")?)?,
        value: amount(get(value, "value")?)?,
        beneficiary: text(get(value, "beneficiary")?)?,
        bond: amount(get(value, "bond")?)?,
    })
}

pub async fn treasury_proposal(api: &dyn SubstrateApi, index: u64) -> Result<Option<TreasuryProposal>> {
    api.storage(None, "Treasury", "Proposals", vec![KeyArg::Int(index.into())])
        .await?
        .map(|p| treasury_proposal_from(&p))
        .transpose()
}

/// Proposals still awaiting a decision: `0..ProposalCount` minus approved ones.
pub async fn open_treasury_proposals(api: &dyn SubstrateApi) -> Result<Vec<(u64, TreasuryProposal)>> {
    let Some(count) = api.storage(None, "Treasury", "ProposalCount", vec![]).await? else {
        return Ok(vec![]);
    };
    let approvals = match api.storage(None, "Treasury", "Approvals", vec![]).await? {
        Some(approvals) => list(&approvals)?.iter().map(int).collect::<Result<Vec<_>>>()?,
        None => vec![],
    };
    let mut out = Vec::new();
    for index in 0..int(&count)? {
        if approvals.contains(&index) {
            continue;
        }
        if let Some(proposal) = treasury_proposal(api, index).await? {
            out.push((index, proposal));
        }
    }
    Ok(out)
}

fn bounty_status(value: &JsonValue) -> Result<BountyStatus> {
    let (name, fields) = variant(value)?;
    Ok(match name {
        "Proposed" => BountyStatus::Proposed,
        "Approved" => BountyStatus::Approved,
        "Funded" => BountyStatus::Funded,
        "CuratorProposed" => BountyStatus::CuratorProposed {
            curator: text(get(fields, "curator")?)?,
        },
        "Active" => BountyStatus::Active {
            curator: text(get(fields, "curator")?)?,
            update_due: int(get(fields, "update_due")?)?,
        },
        "PendingPayout" => BountyStatus::PendingPayout {
            curator: text(get(fields, "curator")?)?,
            beneficiary: text(get(fields, "beneficiary")?)?,
            unlock_at: int(get(fields, "unlock_at")?)?,
        },
        other => return Err(ChainEventsError::decode(format!("unknown bounty status {other}"))),
    })
}

fn bounty_from(value: &JsonValue) -> Result<Bounty> {
    Ok(Bounty {
        proposer: text(get(value, "proposer")?)?,
        value: amount(get(value, "value")?)?,
        fee: amount(get(value, "fee")?)?,
        curator_deposit: amount(get(value, "curator_deposit")?)?,
        bond: amount(get(value, "bond")?)?,
        status: bounty_status(get(value, "status")?)?,
    })
}

pub async fn bounty(api: &dyn SubstrateApi, pallet: &str, index: u64) -> Result<Option<Bounty>> {
    api.storage(None, pallet, "Bounties", vec![KeyArg::Int(index.into())])
        .await?
        .map(|b| bounty_from(&b))
        .transpose()
}

pub async fn bounties(api: &dyn SubstrateApi, pallet: &str) -> Result<Vec<(u64, Bounty)>> {
    if !api.has_storage(pallet, "Bounties") {
        return Ok(vec![]);
    }
    let mut out = Vec::new();
    for (keys, value) in api.storage_entries(None, pallet, "Bounties", vec![]).await? {
        out.push((int(block::field(&keys, 0, "bounty index")?)?, bounty_from(&value)?));
    }
    out.sort_by_key(|(index, _)| *index);
    Ok(out)
}

pub async fn bounty_description(
    api: &dyn SubstrateApi,
    pallet: &str,
    index: u64,
) -> Result<Option<String>> {
    api.storage(None, pallet, "BountyDescriptions", vec![KeyArg::Int(index.into())])
        .await?
        .map(|d| utf8(&d))
        .transpose()
}

async fn tip_from(api: &dyn SubstrateApi, pallet: &str, value: &JsonValue) -> Result<OpenTip> {
    let reason_hash = text(get(value, "reason")?)?;
    let reason = api
        .storage(None, pallet, "Reasons", vec![KeyArg::hash(&reason_hash)?])
        .await?
        .ok_or_else(|| ChainEventsError::missing(format!("no reason for tip ({reason_hash})")))?;
    let tips = list(get(value, "tips")?)?
        .iter()
        .map(|tip| {
            let pair = list(tip)?;
            Ok((
                text(block::field(pair, 0, "tipper")?)?,
                amount(block::field(pair, 1, "tip")?)?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    let closes = get(value, "closes")?;
    Ok(OpenTip {
        reason: utf8(&reason)?,
        who: text(get(value, "who")?)?,
        finder: text(get(value, "finder")?)?,
        deposit: amount(get(value, "deposit")?)?,
        closes: if is_none(closes) { None } else { Some(int(closes)?) },
        tips,
        finders_fee: block::boolean(get(value, "finders_fee")?)?,
    })
}

pub async fn tip(api: &dyn SubstrateApi, pallet: &str, hash: &str) -> Result<Option<OpenTip>> {
    match api.storage(None, pallet, "Tips", vec![KeyArg::hash(hash)?]).await? {
        Some(value) => Ok(Some(tip_from(api, pallet, &value).await?)),
        None => Ok(None),
    }
}

pub async fn tips(api: &dyn SubstrateApi, pallet: &str) -> Result<Vec<(String, OpenTip)>> {
    if !api.has_storage(pallet, "Tips") {
        return Ok(vec![]);
    }
    let mut out = Vec::new();
    for (keys, value) in api.storage_entries(None, pallet, "Tips", vec![]).await? {
        let hash = text(block::field(&keys, 0, "tip hash")?)?;
        out.push((hash, tip_from(api, pallet, &value).await?));
    }
    Ok(out)
}

/// Members of the elections pallet. Seat holders are `{ who, stake, deposit }` on newer
/// runtimes and `(who, stake)` on older ones.
pub async fn election_members(api: &dyn SubstrateApi, pallet: &str) -> Result<Vec<String>> {
    let Some(members) = api.storage(None, pallet, "Members", vec![]).await? else {
        return Ok(vec![]);
    };
    list(&members)?
        .iter()
        .map(|member| match get(member, "who") {
            Ok(who) => text(who),
            Err(_) => text(block::field(list(member)?, 0, "who")?),
        })
        .collect()
}

pub async fn election_round(api: &dyn SubstrateApi, pallet: &str) -> Result<u64> {
    match api.storage(None, pallet, "ElectionRounds", vec![]).await? {
        Some(round) => int(&round),
        None => Ok(0),
    }
}

pub async fn collective_call(
    api: &dyn SubstrateApi,
    pallet: &str,
    hash: &str,
) -> Result<Option<CallInfo>> {
    api.storage(None, pallet, "ProposalOf", vec![KeyArg::hash(hash)?])
        .await?
        .map(|call| block::call_info(&call))
        .transpose()
}

pub async fn collective_votes(
    api: &dyn SubstrateApi,
    pallet: &str,
    hash: &str,
) -> Result<Option<CollectiveVotes>> {
    let Some(voting) = api
        .storage(None, pallet, "Voting", vec![KeyArg::hash(hash)?])
        .await?
    else {
        return Ok(None);
    };
    Ok(Some(CollectiveVotes {
        index: int(get(&voting, "index")?)?,
        threshold: int(get(&voting, "threshold")?)?,
        ayes: block::texts(get(&voting, "ayes")?)?,
        nays: block::texts(get(&voting, "nays")?)?,
    }))
}

pub async fn collective_proposals(api: &dyn SubstrateApi, pallet: &str) -> Result<Vec<String>> {
    if !api.has_pallet(pallet) {
        return Ok(vec![]);
    }
    match api.storage(None, pallet, "Proposals", vec![]).await? {
        Some(hashes) => block::texts(&hashes),
        None => Ok(vec![]),
    }
}

pub async fn registrars(api: &dyn SubstrateApi) -> Result<Vec<Option<String>>> {
    let Some(registrars) = api.storage(None, "Identity", "Registrars", vec![]).await? else {
        return Ok(vec![]);
    };
    list(&registrars)?
        .iter()
        .map(|r| {
            if is_none(r) {
                Ok(None)
            } else {
                text(get(r, "account")?).map(Some)
            }
        })
        .collect()
}

/// Display name of identity info: `{"Raw": "0x.."}` data, or empty for anything else.
fn display_name(info: &JsonValue) -> Result<String> {
    let display = get(info, "display")?;
    match variant(display) {
        Ok((name, data)) if name.starts_with("Raw") => utf8(data),
        _ => Ok(String::new()),
    }
}

pub async fn identity(api: &dyn SubstrateApi, who: &str) -> Result<Option<Identity>> {
    let Some(record) = api
        .storage(None, "Identity", "IdentityOf", vec![KeyArg::Account(who.to_string())])
        .await?
    else {
        return Ok(None);
    };
    // newer runtimes store (registration, username)
    let registration = match &record {
        JsonValue::Array(parts) => block::field(parts, 0, "registration")?,
        other => other,
    };
    let judgements = list(get(registration, "judgements")?)?
        .iter()
        .map(|j| {
            let pair = list(j)?;
            let (name, _) = variant(block::field(pair, 1, "judgement")?)?;
            Ok((
                int(block::field(pair, 0, "registrar")?)?,
                IdentityJudgement::from_variant(name),
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(Identity {
        display_name: display_name(get(registration, "info")?)?,
        judgements,
    }))
}

pub async fn signaling_proposal(api: &dyn SubstrateApi, hash: &str) -> Result<Option<SignalingProposal>> {
    let Some(record) = api
        .storage(None, "Signaling", "ProposalOf", vec![KeyArg::hash(hash)?])
        .await?
    else {
        return Ok(None);
    };
    let (stage, _) = variant(get(&record, "stage")?)?;
    Ok(Some(SignalingProposal {
        author: text(get(&record, "author")?)?,
        stage: stage.to_string(),
        transition_time: int(get(&record, "transition_time")?)?,
        title: utf8(get(&record, "title")?)?,
        contents: utf8(get(&record, "contents")?)?,
        vote_id: text(get(&record, "vote_id")?)?,
    }))
}

pub async fn vote_record(api: &dyn SubstrateApi, vote_id: &str) -> Result<Option<VoteRecord>> {
    let id: u128 = vote_id
        .parse()
        .map_err(|_| ChainEventsError::decode(format!("invalid vote id '{vote_id}'")))?;
    let Some(record) = api
        .storage(None, "Voting", "VoteRecords", vec![KeyArg::Int(id)])
        .await?
    else {
        return Ok(None);
    };
    let data = get(&record, "data")?;
    let (tally_type, _) = variant(get(data, "tally_type")?)?;
    let (vote_type, _) = variant(get(data, "vote_type")?)?;
    Ok(Some(VoteRecord {
        tally_type: tally_type.to_string(),
        vote_type: vote_type.to_string(),
        outcomes: block::texts(get(&record, "outcomes")?)?,
    }))
}

/// Hashes of signaling proposals in every list the pallet keeps.
pub async fn signaling_hashes(api: &dyn SubstrateApi) -> Result<Vec<String>> {
    if !api.has_pallet("Signaling") {
        return Ok(vec![]);
    }
    let mut hashes = Vec::new();
    for entry in ["InactiveProposals", "ActiveProposals", "CompletedProposals"] {
        if let Some(items) = api.storage(None, "Signaling", entry, vec![]).await? {
            for item in list(&items)? {
                // (hash, block) pairs
                let hash = match item {
                    JsonValue::Array(pair) => text(block::field(pair, 0, "hash")?)?,
                    other => text(other)?,
                };
                hashes.push(hash);
            }
        }
    }
    Ok(hashes)
}

pub async fn session_validators(api: &dyn SubstrateApi) -> Result<Vec<String>> {
    match api.storage(None, "Session", "Validators", vec![]).await? {
        Some(validators) => block::texts(&validators),
        None => Ok(vec![]),
    }
}

pub async fn session_index(api: &dyn SubstrateApi) -> Result<u64> {
    let index = api
        .storage(None, "Session", "CurrentIndex", vec![])
        .await?
        .ok_or_else(|| ChainEventsError::missing("no current session index"))?;
    int(&index)
}

pub async fn active_era(api: &dyn SubstrateApi) -> Result<u64> {
    if let Some(era) = api.storage(None, "Staking", "ActiveEra", vec![]).await? {
        if !is_none(&era) {
            return int(get(&era, "index")?);
        }
    }
    let era = api
        .storage(None, "Staking", "CurrentEra", vec![])
        .await?
        .ok_or_else(|| ChainEventsError::missing("no active era"))?;
    int(&era)
}

pub async fn controller(api: &dyn SubstrateApi, at: Option<BlockHash>, stash: &str) -> Result<Option<String>> {
    api.storage(at, "Staking", "Bonded", vec![KeyArg::Account(stash.to_string())])
        .await?
        .map(|c| text(&c))
        .transpose()
}
