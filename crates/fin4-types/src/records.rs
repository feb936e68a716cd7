//! Assembled application-state records.
//!
//! These are the shapes the state store receives. Field names serialize in
//! camelCase because the store's reducers key on them.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::encoding::decimal;

/// A Fin4 token as listed by the token management contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fin4Token {
    pub address: Address,
    pub user_is_creator: bool,
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub unit: String,
    #[serde(with = "decimal")]
    pub total_supply: U256,
    /// Unix seconds.
    #[serde(with = "decimal")]
    pub creation_time: U256,
    pub has_fixed_minting_quantity: bool,
    /// Unknown until the curation registry has been consulted.
    #[serde(rename = "isOPAT")]
    pub is_opat: Option<bool>,
    /// Names of underlyings registered on this token. `None` when the
    /// underlyings satellite is inactive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlyings: Option<Vec<String>>,
}

/// Full per-token detail, fetched on demand for a token page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedTokenInfo {
    pub required_verifier_types: Vec<Address>,
    #[serde(with = "decimal")]
    pub claims_count: U256,
    #[serde(with = "decimal")]
    pub users_balance: U256,
    #[serde(with = "decimal")]
    pub total_supply: U256,
    /// RFC 3339 rendering of the on-chain creation timestamp.
    pub token_creation_time: String,
    pub is_transferable: bool,
    pub is_mintable: bool,
    pub is_burnable: bool,
    pub is_capped: bool,
    #[serde(with = "decimal")]
    pub cap: U256,
    #[serde(with = "decimal")]
    pub decimals: U256,
    #[serde(with = "decimal")]
    pub fixed_amount: U256,
    #[serde(with = "decimal")]
    pub initial_supply: U256,
    pub actions_text: String,
    pub initial_supply_owner: Address,
    pub token_creator: Address,
    pub addresses_with_minter_roles: Vec<Address>,
}

/// Status of one verifier on one claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierStatus {
    pub status: u8,
    pub message: String,
}

/// A claim on a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    /// Composite id `<token>_<claimId>`; claim ids are only unique per token.
    pub id: String,
    pub token: Address,
    #[serde(with = "decimal")]
    pub claim_id: U256,
    pub claimer: Address,
    pub is_approved: bool,
    pub got_rejected: bool,
    #[serde(with = "decimal")]
    pub quantity: U256,
    #[serde(with = "decimal")]
    pub claim_creation_time: U256,
    #[serde(with = "decimal")]
    pub claim_approval_or_rejection_time: U256,
    pub comment: String,
    pub verifier_statuses: BTreeMap<Address, VerifierStatus>,
    pub verifiers_with_messages: Vec<Address>,
}

impl Claim {
    pub fn composite_id(token: &Address, claim_id: &U256) -> String {
        format!("{token}_{claim_id}")
    }
}

/// A claim as it appears in a cross-collection export: tagged with the
/// token symbol, without the composite id or per-verifier detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimExportRow {
    pub token_symbol: String,
    pub token: Address,
    #[serde(with = "decimal")]
    pub claim_id: U256,
    pub claimer: Address,
    pub is_approved: bool,
    pub got_rejected: bool,
    #[serde(with = "decimal")]
    pub quantity: U256,
    #[serde(with = "decimal")]
    pub claim_creation_time: U256,
    #[serde(with = "decimal")]
    pub claim_approval_or_rejection_time: U256,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub collection_id: u64,
    pub user_is_creator: bool,
    pub user_is_admin: bool,
    pub admin_group_is_set: bool,
    #[serde(with = "decimal")]
    pub admin_group_id: U256,
    pub tokens: Vec<Address>,
    pub name: String,
    pub identifier: String,
    pub description: String,
}

/// A verifier type offered for token creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifierType {
    pub contract_name: String,
    /// Address of the verifier contract.
    pub value: Address,
    /// Translation key of the display name.
    pub label: String,
    /// Translation key of the description.
    pub description: String,
    pub params_encoded: String,
    pub is_noninteractive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(with = "decimal")]
    pub submission_id: U256,
    pub verifier_type: Address,
    pub token: Address,
    pub user: Address,
    #[serde(with = "decimal")]
    pub timestamp: U256,
    /// 0 = text, 1 = picture, 2 = vote.
    pub content_type: u64,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_id: String,
    pub message_type: String,
    pub sender: Address,
    pub verifier_contract_name: String,
    pub message: String,
    pub has_been_acted_upon: bool,
    pub attachment: String,
    #[serde(with = "decimal")]
    pub pending_request_id: U256,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Underlying {
    pub name: String,
    pub is_sourcerer: bool,
    pub contract_address: Address,
    pub attachment: String,
    /// Empty unless this underlying is a sourcerer.
    pub params_encoded: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcererPair {
    pub sourcerer_name: String,
    pub pat: Address,
    pub collateral: Address,
    pub beneficiary: Address,
    #[serde(with = "decimal")]
    pub exchange_ratio: U256,
    #[serde(with = "decimal")]
    pub total_collateral_balance: U256,
    #[serde(with = "decimal")]
    pub total_exchanged_pat_amount: U256,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterizerParam {
    pub name: String,
    pub description: String,
    #[serde(with = "decimal")]
    pub value: U256,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemParameter {
    pub name: String,
    #[serde(with = "decimal")]
    pub value: U256,
}
