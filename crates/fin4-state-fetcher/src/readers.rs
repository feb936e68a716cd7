//! Single-shot reads: balances, parameters, curation state and per-token
//! detail. Each either publishes its updates directly or returns a record
//! for the caller.

use std::collections::BTreeMap;

use alloy_primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use fin4_core::{CoreError, Session};
use fin4_types::{
    listing_key_to_address, DetailedTokenInfo, Fin4Token, Message, ParameterizerParam,
    StateUpdate, SystemParameter,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::contracts::{MESSAGING, PARAMETERIZER, PLCR_VOTING, REGISTRY, SYSTEM_PARAMETERS, TOKEN_MANAGEMENT};
use crate::error::Result;
use crate::plans::message_record;
use crate::returns::{MessageInfo, NonzeroBalances, PollInfo, SystemParameters, TokenDetails};

/// Balances of every token the user holds a nonzero amount of.
///
/// Publishes `UPDATE_MULTIPLE_BALANCES` unless the user holds nothing.
pub async fn fetch_users_nonzero_token_balances(session: &Session) -> Result<NonzeroBalances> {
    let balances: NonzeroBalances = session
        .read(TOKEN_MANAGEMENT, "getMyNonzeroTokenBalances", ())
        .await?;
    if balances.tokens.is_empty() {
        debug!("no nonzero token balances");
        return Ok(balances);
    }
    session.dispatch(StateUpdate::UpdateMultipleBalances {
        token_addresses: balances.tokens.clone(),
        balances: balances.balances.clone(),
    });
    Ok(balances)
}

/// `balanceOf(defaultAccount)` on a governance token (`GOV` or `REP`).
pub async fn fetch_users_governance_balance(session: &Session, contract: &str) -> Result<U256> {
    let handle = session.contract(contract)?;
    let balance: U256 = session
        .read(contract, "balanceOf", session.default_account())
        .await?;
    session.dispatch(StateUpdate::UpdateGovernanceBalance {
        token_address: handle.address,
        balance,
    });
    Ok(balance)
}

pub async fn fetch_system_parameters(session: &Session) -> Result<SystemParameters> {
    let params: SystemParameters = session
        .read(SYSTEM_PARAMETERS, "getSystemParameters", ())
        .await?;
    for (name, value) in [
        ("REPforTokenCreation", params.rep_for_token_creation),
        ("REPforTokenClaim", params.rep_for_token_claim),
    ] {
        session.dispatch(StateUpdate::SetSystemParameter {
            parameter: SystemParameter {
                name: name.to_string(),
                value,
            },
        });
    }
    Ok(params)
}

/// Names and descriptions of `Parameterizer.getAll()`, in return order.
pub const PARAMETERIZER_PARAMS: &[(&str, &str)] = &[
    ("minDeposit", "Minimum deposit for a listing application"),
    ("pMinDeposit", "Minimum deposit for a parameter proposal"),
    ("applyStageLen", "Length of the listing application stage in seconds"),
    ("pApplyStageLen", "Length of the parameter proposal stage in seconds"),
    ("commitStageLen", "Length of the commit period for listing votes in seconds"),
    ("pCommitStageLen", "Length of the commit period for parameter votes in seconds"),
    ("revealStageLen", "Length of the reveal period for listing votes in seconds"),
    ("pRevealStageLen", "Length of the reveal period for parameter votes in seconds"),
    ("dispensationPct", "Percentage of a losing listing deposit paid to the winning party"),
    ("pDispensationPct", "Percentage of a losing proposal deposit paid to the winning party"),
    ("voteQuorum", "Percentage of votes needed for a listing challenge to succeed"),
    ("pVoteQuorum", "Percentage of votes needed for a parameter challenge to succeed"),
    ("exitTimeDelay", "Seconds a listing must wait after initiating an exit"),
    ("exitPeriodLen", "Seconds a listing has to complete an exit once it may"),
];

/// Publishes `SET_PARAMETERIZER_PARAMS` keyed by parameter name.
pub async fn fetch_parameterizer_params(
    session: &Session,
) -> Result<BTreeMap<String, ParameterizerParam>> {
    let values: Vec<U256> = session.read(PARAMETERIZER, "getAll", ()).await?;
    if values.len() > PARAMETERIZER_PARAMS.len() {
        warn!(
            values = values.len(),
            known = PARAMETERIZER_PARAMS.len(),
            "ignoring unnamed parameterizer values"
        );
    }
    let params_obj: BTreeMap<_, _> = PARAMETERIZER_PARAMS
        .iter()
        .zip(values)
        .map(|((name, description), value)| {
            (
                name.to_string(),
                ParameterizerParam {
                    name: name.to_string(),
                    description: description.to_string(),
                    value,
                },
            )
        })
        .collect();

    session.dispatch(StateUpdate::SetParameterizerParams {
        params_obj: params_obj.clone(),
    });
    Ok(params_obj)
}

/// Marks every whitelisted curation-registry listing as an OPAT. Returns the
/// lower-case token addresses.
pub async fn fetch_opats(session: &Session) -> Result<Vec<String>> {
    let keys: Vec<B256> = session
        .read(REGISTRY, "getWhitelistedListingKeys", ())
        .await?;
    let addresses: Vec<String> = keys.iter().map(listing_key_to_address).collect();
    for address in &addresses {
        session.dispatch(StateUpdate::MarkFin4TokenAsOpat {
            lower_case_token_address: address.clone(),
        });
    }
    Ok(addresses)
}

/// Voting period a curation poll is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PollPeriod {
    #[serde(rename = "Commit Vote")]
    Commit,
    #[serde(rename = "Reveal")]
    Reveal,
    #[serde(rename = "-")]
    PastReveal,
}

impl PollPeriod {
    pub fn label(&self) -> &'static str {
        match self {
            PollPeriod::Commit => "Commit Vote",
            PollPeriod::Reveal => "Reveal",
            PollPeriod::PastReveal => "-",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollStatus {
    pub in_period: PollPeriod,
    /// End of the current period as `dd.mm.yyyy, HH:MM:SS` (UTC); empty once
    /// the reveal period is over.
    pub due_date: String,
}

/// `pollMap(poll_id)` on the voting contract, classified against `now`.
/// Poll ids are the registry's challenge ids.
pub async fn get_poll_status(session: &Session, poll_id: U256, now: DateTime<Utc>) -> Result<PollStatus> {
    let poll: PollInfo = session.read(PLCR_VOTING, "pollMap", poll_id).await?;
    Ok(classify_poll(&poll, now))
}

fn classify_poll(poll: &PollInfo, now: DateTime<Utc>) -> PollStatus {
    let now_ms = now.timestamp_millis();
    let commit_end = unix_seconds(poll.commit_end_date);
    let reveal_end = unix_seconds(poll.reveal_end_date);

    if commit_end.saturating_mul(1000) > now_ms {
        return PollStatus {
            in_period: PollPeriod::Commit,
            due_date: format_due_date(commit_end),
        };
    }
    if reveal_end.saturating_mul(1000) > now_ms {
        return PollStatus {
            in_period: PollPeriod::Reveal,
            due_date: format_due_date(reveal_end),
        };
    }
    PollStatus {
        in_period: PollPeriod::PastReveal,
        due_date: String::new(),
    }
}

fn unix_seconds(value: U256) -> i64 {
    u64::try_from(value)
        .ok()
        .and_then(|secs| i64::try_from(secs).ok())
        .unwrap_or(i64::MAX)
}

fn format_due_date(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|at| at.format("%d.%m.%Y, %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// `getDetailedTokenInfo()` on an already registered token contract.
pub async fn fetch_token_details(session: &Session, token_contract: &str) -> Result<DetailedTokenInfo> {
    let details: TokenDetails = session
        .read(token_contract, "getDetailedTokenInfo", ())
        .await?;
    Ok(detailed_token_info(token_contract, details)?)
}

fn detailed_token_info(
    token_contract: &str,
    details: TokenDetails,
) -> std::result::Result<DetailedTokenInfo, CoreError> {
    let malformed = |reason: String| CoreError::ReturnDecoding {
        contract: token_contract.to_string(),
        method: "getDetailedTokenInfo".to_string(),
        reason,
    };
    let [is_transferable, is_mintable, is_burnable, is_capped] =
        <[bool; 4]>::try_from(details.bool_properties.as_slice())
            .map_err(|_| malformed(format!("{} bool properties", details.bool_properties.len())))?;
    let [cap, decimals, fixed_amount, initial_supply] =
        <[U256; 4]>::try_from(details.uint_values.as_slice())
            .map_err(|_| malformed(format!("{} uint values", details.uint_values.len())))?;
    let (initial_supply_owner, token_creator, minters) = match details.roles.as_slice() {
        [owner, creator, minters @ ..] => (*owner, *creator, minters.to_vec()),
        _ => return Err(malformed(format!("{} role addresses", details.roles.len()))),
    };

    let token_creation_time =
        DateTime::<Utc>::from_timestamp(unix_seconds(details.token_creation_time), 0)
            .map(|at| at.to_rfc3339())
            .unwrap_or_default();

    Ok(DetailedTokenInfo {
        required_verifier_types: details.required_verifier_types,
        claims_count: details.claims_count,
        users_balance: details.users_balance,
        total_supply: details.total_supply,
        token_creation_time,
        is_transferable,
        is_mintable,
        is_burnable,
        is_capped,
        cap,
        decimals,
        fixed_amount,
        initial_supply,
        actions_text: details.actions_text,
        initial_supply_owner,
        token_creator,
        addresses_with_minter_roles: minters,
    })
}

pub async fn fetch_message(session: &Session, message_id: u64) -> Result<Message> {
    let info: MessageInfo = session.read(MESSAGING, "getMyMessage", message_id).await?;
    Ok(message_record(info))
}

/// Token whose symbol equals `symbol` upper-cased.
pub fn find_token_by_symbol<'a>(
    tokens: &'a BTreeMap<Address, Fin4Token>,
    symbol: &str,
) -> Option<&'a Fin4Token> {
    let symbol = symbol.to_uppercase();
    tokens.values().find(|token| token.symbol == symbol)
}

/// 40 hex digits, with or without `0x`. Mixed case is not checksum-verified.
pub fn is_valid_public_address(candidate: &str) -> bool {
    candidate.parse::<Address>().is_ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: Address,
    pub label: String,
    pub symbol: String,
}

/// Tokens as `{value, label, symbol}` entries for a picker.
pub fn token_select_options(tokens: &BTreeMap<Address, Fin4Token>) -> Vec<SelectOption> {
    tokens
        .values()
        .map(|token| SelectOption {
            value: token.address,
            label: token.name.clone(),
            symbol: token.symbol.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn poll(commit_end: u64, reveal_end: u64) -> PollInfo {
        PollInfo {
            commit_end_date: U256::from(commit_end),
            reveal_end_date: U256::from(reveal_end),
            vote_quorum: U256::from(50),
            votes_for: U256::ZERO,
            votes_against: U256::ZERO,
        }
    }

    #[test]
    fn test_poll_periods() {
        let now = Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap();
        let ts = now.timestamp() as u64;

        let status = classify_poll(&poll(ts + 60, ts + 120), now);
        assert_eq!(status.in_period, PollPeriod::Commit);
        assert_eq!(status.due_date, "01.01.2020, 12:01:00");

        let status = classify_poll(&poll(ts - 60, ts + 120), now);
        assert_eq!(status.in_period, PollPeriod::Reveal);
        assert_eq!(status.due_date, "01.01.2020, 12:02:00");

        let status = classify_poll(&poll(ts - 120, ts), now);
        assert_eq!(status.in_period.label(), "-");
        assert!(status.due_date.is_empty());
    }

    #[test]
    fn test_poll_status_serializes_labels() {
        let status = PollStatus {
            in_period: PollPeriod::Commit,
            due_date: "x".into(),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["inPeriod"], "Commit Vote");
        assert_eq!(json["dueDate"], "x");
    }

    fn details(roles: Vec<Address>) -> TokenDetails {
        TokenDetails {
            required_verifier_types: vec![],
            claims_count: U256::from(2),
            users_balance: U256::from(5),
            total_supply: U256::from(10),
            token_creation_time: U256::from(0),
            bool_properties: vec![true, false, true, false],
            uint_values: vec![U256::from(100), U256::from(18), U256::from(1), U256::from(0)],
            actions_text: "plant trees".into(),
            roles,
        }
    }

    #[test]
    fn test_detailed_token_info_splits_roles() {
        let roles = vec![
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            Address::repeat_byte(3),
            Address::repeat_byte(4),
        ];
        let info = detailed_token_info("TREE", details(roles)).unwrap();
        assert_eq!(info.initial_supply_owner, Address::repeat_byte(1));
        assert_eq!(info.token_creator, Address::repeat_byte(2));
        assert_eq!(info.addresses_with_minter_roles.len(), 2);
        assert!(info.is_transferable && !info.is_mintable);
        assert_eq!(info.decimals, U256::from(18));
        assert_eq!(info.token_creation_time, "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_detailed_token_info_rejects_short_roles() {
        assert!(detailed_token_info("TREE", details(vec![Address::ZERO])).is_err());
    }

    fn token(address: Address, symbol: &str) -> Fin4Token {
        Fin4Token {
            address,
            user_is_creator: false,
            name: format!("{symbol} token"),
            symbol: symbol.into(),
            description: String::new(),
            unit: String::new(),
            total_supply: U256::ZERO,
            creation_time: U256::ZERO,
            has_fixed_minting_quantity: false,
            is_opat: None,
            underlyings: None,
        }
    }

    #[test]
    fn test_find_token_by_symbol_upper_cases_input() {
        let mut tokens = BTreeMap::new();
        tokens.insert(Address::repeat_byte(1), token(Address::repeat_byte(1), "TREE"));
        tokens.insert(Address::repeat_byte(2), token(Address::repeat_byte(2), "BIKE"));

        assert_eq!(
            find_token_by_symbol(&tokens, "bike").map(|t| t.address),
            Some(Address::repeat_byte(2))
        );
        assert!(find_token_by_symbol(&tokens, "CAR").is_none());

        let options = token_select_options(&tokens);
        assert_eq!(options[0].label, "TREE token");
        assert_eq!(options[1].symbol, "BIKE");
    }

    #[test]
    fn test_is_valid_public_address() {
        assert!(is_valid_public_address(&format!("0x{}", "ab".repeat(20))));
        assert!(is_valid_public_address(&"AB".repeat(20)));
        assert!(!is_valid_public_address("0x1234"));
        assert!(!is_valid_public_address(&format!("0x{}", "zz".repeat(20))));
    }
}
