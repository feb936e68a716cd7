//! Named return records of the Fin4 read methods.
//!
//! Each struct mirrors one method's positional return tuple and is decoded
//! once at the call boundary; nothing downstream indexes by position.

use alloy_primitives::{Address, B256, U256};
use fin4_core::{FromReturn, ReturnValues};

type Result<T> = fin4_core::Result<T>;

/// `Fin4TokenManagement.getTokenInfo(address)`
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub user_is_creator: bool,
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub unit: String,
    pub total_supply: U256,
    pub creation_time: U256,
    pub has_fixed_minting_quantity: bool,
}

impl FromReturn for TokenInfo {
    fn from_return(out: &mut ReturnValues) -> Result<Self> {
        Ok(Self {
            user_is_creator: out.boolean()?,
            name: out.string()?,
            symbol: out.string()?,
            description: out.string()?,
            unit: out.string()?,
            total_supply: out.uint()?,
            creation_time: out.uint()?,
            has_fixed_minting_quantity: out.boolean()?,
        })
    }
}

/// `Fin4Claiming.getClaimOnThisToken(address, uint256)`
#[derive(Debug, Clone)]
pub struct ClaimOnToken {
    pub claimer: Address,
    pub is_approved: bool,
    pub got_rejected: bool,
    pub quantity: U256,
    pub claim_creation_time: U256,
    pub claim_approval_or_rejection_time: U256,
    pub comment: String,
    pub required_verifier_types: Vec<Address>,
    pub verifier_statuses: Vec<U256>,
    pub verifiers_with_messages: Vec<Address>,
}

impl FromReturn for ClaimOnToken {
    fn from_return(out: &mut ReturnValues) -> Result<Self> {
        Ok(Self {
            claimer: out.address()?,
            is_approved: out.boolean()?,
            got_rejected: out.boolean()?,
            quantity: out.uint()?,
            claim_creation_time: out.uint()?,
            claim_approval_or_rejection_time: out.uint()?,
            comment: out.string()?,
            required_verifier_types: out.addresses()?,
            verifier_statuses: out.uints()?,
            verifiers_with_messages: out.addresses()?,
        })
    }
}

/// `Fin4Collections.getCollection(uint256)`; color and logo are not read.
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub user_is_creator: bool,
    pub user_is_admin: bool,
    pub admin_group_is_set: bool,
    pub admin_group_id: U256,
    pub tokens: Vec<Address>,
    pub name: String,
    pub identifier: String,
    pub description: String,
}

impl FromReturn for CollectionInfo {
    fn from_return(out: &mut ReturnValues) -> Result<Self> {
        Ok(Self {
            user_is_creator: out.boolean()?,
            user_is_admin: out.boolean()?,
            admin_group_is_set: out.boolean()?,
            admin_group_id: out.uint()?,
            tokens: out.addresses()?,
            name: out.string()?,
            identifier: out.string()?,
            description: out.string()?,
        })
    }
}

/// `Fin4Verifying.submissions(uint256)`
#[derive(Debug, Clone)]
pub struct SubmissionInfo {
    pub submission_id: U256,
    pub verifier_type: Address,
    pub token: Address,
    pub user: Address,
    pub timestamp: U256,
    pub content_type: u64,
    pub content: String,
}

impl FromReturn for SubmissionInfo {
    fn from_return(out: &mut ReturnValues) -> Result<Self> {
        Ok(Self {
            submission_id: out.uint()?,
            verifier_type: out.address()?,
            token: out.address()?,
            user: out.address()?,
            timestamp: out.uint()?,
            content_type: out.u64()?,
            content: out.string()?,
        })
    }
}

/// `Fin4Verifying.getVerifierTypeInfo(address)`
#[derive(Debug, Clone)]
pub struct VerifierTypeInfo {
    pub contract_name: String,
    pub name_trans_key: String,
    pub description_trans_key: String,
    pub params_encoded: String,
    pub is_noninteractive: bool,
}

impl FromReturn for VerifierTypeInfo {
    fn from_return(out: &mut ReturnValues) -> Result<Self> {
        Ok(Self {
            contract_name: out.string()?,
            name_trans_key: out.string()?,
            description_trans_key: out.string()?,
            params_encoded: out.string()?,
            is_noninteractive: out.boolean()?,
        })
    }
}

/// `Fin4Messaging.getMyMessage(uint256)`
#[derive(Debug, Clone)]
pub struct MessageInfo {
    pub message_id: U256,
    pub message_type: U256,
    pub sender: Address,
    pub sender_str: String,
    pub message: String,
    pub has_been_acted_upon: bool,
    pub attachment: String,
    pub pending_request_id: U256,
}

impl FromReturn for MessageInfo {
    fn from_return(out: &mut ReturnValues) -> Result<Self> {
        Ok(Self {
            message_id: out.uint()?,
            message_type: out.uint()?,
            sender: out.address()?,
            sender_str: out.string()?,
            message: out.string()?,
            has_been_acted_upon: out.boolean()?,
            attachment: out.string()?,
            pending_request_id: out.uint()?,
        })
    }
}

/// `Fin4Underlyings.getUnderlyings()`: four parallel lists.
#[derive(Debug, Clone)]
pub struct UnderlyingsListing {
    pub names: Vec<B256>,
    pub is_sourcerers: Vec<bool>,
    pub contract_addresses: Vec<Address>,
    pub attachments: Vec<B256>,
}

impl FromReturn for UnderlyingsListing {
    fn from_return(out: &mut ReturnValues) -> Result<Self> {
        Ok(Self {
            names: out.bytes32s()?,
            is_sourcerers: out.bools()?,
            contract_addresses: out.addresses()?,
            attachments: out.bytes32s()?,
        })
    }
}

/// `Fin4Underlyings.getSourcererPairs(address)`: six parallel lists.
#[derive(Debug, Clone)]
pub struct SourcererPairsListing {
    pub pats: Vec<Address>,
    pub collaterals: Vec<Address>,
    pub beneficiaries: Vec<Address>,
    pub exchange_ratios: Vec<U256>,
    pub total_collateral_balances: Vec<U256>,
    pub total_exchanged_pat_amounts: Vec<U256>,
}

impl FromReturn for SourcererPairsListing {
    fn from_return(out: &mut ReturnValues) -> Result<Self> {
        Ok(Self {
            pats: out.addresses()?,
            collaterals: out.addresses()?,
            beneficiaries: out.addresses()?,
            exchange_ratios: out.uints()?,
            total_collateral_balances: out.uints()?,
            total_exchanged_pat_amounts: out.uints()?,
        })
    }
}

/// `Fin4TokenManagement.getMyNonzeroTokenBalances()`
#[derive(Debug, Clone)]
pub struct NonzeroBalances {
    pub tokens: Vec<Address>,
    pub balances: Vec<U256>,
}

impl FromReturn for NonzeroBalances {
    fn from_return(out: &mut ReturnValues) -> Result<Self> {
        Ok(Self {
            tokens: out.addresses()?,
            balances: out.uints()?,
        })
    }
}

/// `Fin4SystemParameters.getSystemParameters()`
#[derive(Debug, Clone, Copy)]
pub struct SystemParameters {
    pub rep_for_token_creation: U256,
    pub rep_for_token_claim: U256,
}

impl FromReturn for SystemParameters {
    fn from_return(out: &mut ReturnValues) -> Result<Self> {
        Ok(Self {
            rep_for_token_creation: out.uint()?,
            rep_for_token_claim: out.uint()?,
        })
    }
}

/// `PLCRVoting.pollMap(uint256)`
#[derive(Debug, Clone, Copy)]
pub struct PollInfo {
    /// Unix seconds.
    pub commit_end_date: U256,
    /// Unix seconds.
    pub reveal_end_date: U256,
    pub vote_quorum: U256,
    pub votes_for: U256,
    pub votes_against: U256,
}

impl FromReturn for PollInfo {
    fn from_return(out: &mut ReturnValues) -> Result<Self> {
        Ok(Self {
            commit_end_date: out.uint()?,
            reveal_end_date: out.uint()?,
            vote_quorum: out.uint()?,
            votes_for: out.uint()?,
            votes_against: out.uint()?,
        })
    }
}

/// `<token>.getDetailedTokenInfo()`
#[derive(Debug, Clone)]
pub struct TokenDetails {
    pub required_verifier_types: Vec<Address>,
    pub claims_count: U256,
    pub users_balance: U256,
    pub total_supply: U256,
    pub token_creation_time: U256,
    /// transferable, mintable, burnable, capped
    pub bool_properties: Vec<bool>,
    /// cap, decimals, fixed amount, initial supply
    pub uint_values: Vec<U256>,
    pub actions_text: String,
    /// Initial supply owner, token creator, then every minter.
    pub roles: Vec<Address>,
}

impl FromReturn for TokenDetails {
    fn from_return(out: &mut ReturnValues) -> Result<Self> {
        Ok(Self {
            required_verifier_types: out.addresses()?,
            claims_count: out.uint()?,
            users_balance: out.uint()?,
            total_supply: out.uint()?,
            token_creation_time: out.uint()?,
            bool_properties: out.bools()?,
            uint_values: out.uints()?,
            actions_text: out.string()?,
            roles: out.addresses()?,
        })
    }
}
