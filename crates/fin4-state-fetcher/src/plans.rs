//! One [`FetchPlan`] per application-state collection.

use std::collections::BTreeMap;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use fin4_core::{CoreError, Session};
use fin4_types::{
    bytes32_to_string, Claim, ClaimExportRow, Collection, Fin4Token, Message, SourcererPair,
    StateUpdate, Submission, Underlying, VerifierStatus, VerifierType,
};
use futures::future::try_join_all;

use crate::aggregator::{indices, AggregateResult, EntityKey, FetchPlan};
use crate::contracts::{CLAIMING, COLLECTIONS, MESSAGING, TOKEN_MANAGEMENT, UNDERLYINGS, VERIFYING};
use crate::returns::{
    ClaimOnToken, CollectionInfo, MessageInfo, SourcererPairsListing, SubmissionInfo, TokenInfo,
    UnderlyingsListing, VerifierTypeInfo,
};

type CoreResult<T> = fin4_core::Result<T>;

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// All Fin4 tokens, each joined with its registered underlyings when the
/// underlyings satellite is active.
#[derive(Debug, Clone, Copy)]
pub struct TokensPlan {
    pub underlyings_active: bool,
}

#[async_trait]
impl FetchPlan for TokensPlan {
    type Key = Address;
    type Record = Fin4Token;
    const NAME: &'static str = "tokens";

    async fn list(&self, session: &Session) -> CoreResult<Vec<Address>> {
        session.read(TOKEN_MANAGEMENT, "getAllFin4Tokens", ()).await
    }

    async fn expand(&self, session: &Session, token: &Address) -> CoreResult<Vec<(EntityKey, Fin4Token)>> {
        let info = session.read::<TokenInfo>(TOKEN_MANAGEMENT, "getTokenInfo", *token);
        let (info, underlyings) = if self.underlyings_active {
            let names =
                session.read::<Vec<B256>>(UNDERLYINGS, "getUnderlyingsRegisteredOnToken", *token);
            let (info, names) = futures::try_join!(info, names)?;
            (info, Some(names.iter().map(bytes32_to_string).collect()))
        } else {
            (info.await?, None)
        };

        let record = Fin4Token {
            address: *token,
            user_is_creator: info.user_is_creator,
            name: info.name,
            symbol: info.symbol,
            description: info.description,
            unit: info.unit,
            total_supply: info.total_supply,
            creation_time: info.creation_time,
            has_fixed_minting_quantity: info.has_fixed_minting_quantity,
            is_opat: None,
            underlyings,
        };
        Ok(vec![(EntityKey::Address(*token), record)])
    }

    fn publish(&self, result: &AggregateResult<Fin4Token>) -> Vec<StateUpdate> {
        vec![StateUpdate::AddMultipleFin4Tokens {
            tokens_obj: token_map(result),
        }]
    }
}

/// Tokens keyed by address.
pub fn token_map(result: &AggregateResult<Fin4Token>) -> BTreeMap<Address, Fin4Token> {
    result
        .records()
        .map(|token| (token.address, token.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// The current user's claims on every token they have claimed on.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimsPlan;

#[async_trait]
impl FetchPlan for ClaimsPlan {
    type Key = Address;
    type Record = Claim;
    const NAME: &'static str = "claims";

    async fn list(&self, session: &Session) -> CoreResult<Vec<Address>> {
        session.read(CLAIMING, "getTokensWhereUserHasClaims", ()).await
    }

    async fn expand(&self, session: &Session, token: &Address) -> CoreResult<Vec<(EntityKey, Claim)>> {
        let claim_ids: Vec<U256> = session
            .read(CLAIMING, "getMyClaimIdsOnThisToken", *token)
            .await?;
        let raw = try_join_all(
            claim_ids
                .iter()
                .map(|claim_id| read_claim(session, *token, *claim_id)),
        )
        .await?;

        raw.into_iter()
            .zip(claim_ids)
            .map(|(raw, claim_id)| {
                let claim = claim_record(*token, claim_id, raw)?;
                Ok((EntityKey::Composite(claim.id.clone()), claim))
            })
            .collect()
    }

    fn publish(&self, result: &AggregateResult<Claim>) -> Vec<StateUpdate> {
        vec![StateUpdate::AddMultipleClaims {
            claim_arr: result.records().cloned().collect(),
        }]
    }
}

pub async fn read_claim(session: &Session, token: Address, claim_id: U256) -> CoreResult<ClaimOnToken> {
    session
        .read(
            CLAIMING,
            "getClaimOnThisToken",
            vec![token.into(), claim_id.into()],
        )
        .await
}

/// Full claim record: composite id, per-verifier statuses, and only the
/// non-zero verifiers that left a message.
pub fn claim_record(token: Address, claim_id: U256, raw: ClaimOnToken) -> CoreResult<Claim> {
    if raw.required_verifier_types.len() != raw.verifier_statuses.len() {
        return Err(CoreError::ReturnDecoding {
            contract: CLAIMING.to_string(),
            method: "getClaimOnThisToken".to_string(),
            reason: format!(
                "{} verifier types but {} statuses",
                raw.required_verifier_types.len(),
                raw.verifier_statuses.len()
            ),
        });
    }
    let verifier_statuses = raw
        .required_verifier_types
        .iter()
        .zip(&raw.verifier_statuses)
        .map(|(verifier, status)| {
            let status = u8::try_from(*status).map_err(|_| CoreError::ReturnDecoding {
                contract: CLAIMING.to_string(),
                method: "getClaimOnThisToken".to_string(),
                reason: format!("verifier status {status} out of range"),
            })?;
            Ok((
                *verifier,
                VerifierStatus {
                    status,
                    message: String::new(),
                },
            ))
        })
        .collect::<CoreResult<BTreeMap<_, _>>>()?;

    Ok(Claim {
        id: Claim::composite_id(&token, &claim_id),
        token,
        claim_id,
        claimer: raw.claimer,
        is_approved: raw.is_approved,
        got_rejected: raw.got_rejected,
        quantity: raw.quantity,
        claim_creation_time: raw.claim_creation_time,
        claim_approval_or_rejection_time: raw.claim_approval_or_rejection_time,
        comment: raw.comment,
        verifier_statuses,
        verifiers_with_messages: raw
            .verifiers_with_messages
            .into_iter()
            .filter(|verifier| !verifier.is_zero())
            .collect(),
    })
}

/// Claim as a cross-collection export row.
pub fn claim_export_row(
    token_symbol: &str,
    token: Address,
    claim_id: U256,
    raw: ClaimOnToken,
) -> ClaimExportRow {
    ClaimExportRow {
        token_symbol: token_symbol.to_string(),
        token,
        claim_id,
        claimer: raw.claimer,
        is_approved: raw.is_approved,
        got_rejected: raw.got_rejected,
        quantity: raw.quantity,
        claim_creation_time: raw.claim_creation_time,
        claim_approval_or_rejection_time: raw.claim_approval_or_rejection_time,
        comment: raw.comment,
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionsPlan;

#[async_trait]
impl FetchPlan for CollectionsPlan {
    type Key = u64;
    type Record = Collection;
    const NAME: &'static str = "collections";

    async fn list(&self, session: &Session) -> CoreResult<Vec<u64>> {
        let count: u64 = session.read(COLLECTIONS, "getCollectionsCount", ()).await?;
        Ok(indices(count))
    }

    async fn expand(&self, session: &Session, id: &u64) -> CoreResult<Vec<(EntityKey, Collection)>> {
        let info: CollectionInfo = session.read(COLLECTIONS, "getCollection", *id).await?;
        let record = Collection {
            collection_id: *id,
            user_is_creator: info.user_is_creator,
            user_is_admin: info.user_is_admin,
            admin_group_is_set: info.admin_group_is_set,
            admin_group_id: info.admin_group_id,
            tokens: info.tokens,
            name: info.name,
            identifier: info.identifier,
            description: info.description,
        };
        Ok(vec![(EntityKey::Id(U256::from(*id)), record)])
    }

    fn publish(&self, result: &AggregateResult<Collection>) -> Vec<StateUpdate> {
        vec![StateUpdate::AddMultipleCollections {
            collections_arr: result.records().cloned().collect(),
        }]
    }
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct SubmissionsPlan;

#[async_trait]
impl FetchPlan for SubmissionsPlan {
    type Key = u64;
    type Record = Submission;
    const NAME: &'static str = "submissions";

    async fn list(&self, session: &Session) -> CoreResult<Vec<u64>> {
        let count: u64 = session.read(VERIFYING, "getSubmissionsCount", ()).await?;
        Ok(indices(count))
    }

    async fn expand(&self, session: &Session, index: &u64) -> CoreResult<Vec<(EntityKey, Submission)>> {
        let info: SubmissionInfo = session.read(VERIFYING, "submissions", *index).await?;
        let record = Submission {
            submission_id: info.submission_id,
            verifier_type: info.verifier_type,
            token: info.token,
            user: info.user,
            timestamp: info.timestamp,
            content_type: info.content_type,
            content: info.content,
        };
        Ok(vec![(EntityKey::Id(record.submission_id), record)])
    }

    fn publish(&self, result: &AggregateResult<Submission>) -> Vec<StateUpdate> {
        vec![StateUpdate::AddMultipleSubmissions {
            submissions_arr: result.records().cloned().collect(),
        }]
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct MessagesPlan;

#[async_trait]
impl FetchPlan for MessagesPlan {
    type Key = u64;
    type Record = Message;
    const NAME: &'static str = "messages";

    async fn list(&self, session: &Session) -> CoreResult<Vec<u64>> {
        let count: u64 = session.read(MESSAGING, "getMyMessagesCount", ()).await?;
        Ok(indices(count))
    }

    async fn expand(&self, session: &Session, index: &u64) -> CoreResult<Vec<(EntityKey, Message)>> {
        let info: MessageInfo = session.read(MESSAGING, "getMyMessage", *index).await?;
        Ok(vec![(EntityKey::Id(U256::from(*index)), message_record(info))])
    }

    fn publish(&self, result: &AggregateResult<Message>) -> Vec<StateUpdate> {
        vec![StateUpdate::AddMultipleMessages {
            messages_arr: result.records().cloned().collect(),
        }]
    }
}

pub(crate) fn message_record(info: MessageInfo) -> Message {
    Message {
        message_id: info.message_id.to_string(),
        message_type: info.message_type.to_string(),
        sender: info.sender,
        verifier_contract_name: info.sender_str,
        message: info.message,
        has_been_acted_upon: info.has_been_acted_upon,
        attachment: info.attachment,
        pending_request_id: info.pending_request_id,
    }
}

// ---------------------------------------------------------------------------
// Verifier types
// ---------------------------------------------------------------------------

/// Every verifier type, registering each verifier contract by its on-chain
/// contract name as it goes.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifierTypesPlan;

#[async_trait]
impl FetchPlan for VerifierTypesPlan {
    type Key = Address;
    type Record = VerifierType;
    const NAME: &'static str = "verifier_types";

    async fn list(&self, session: &Session) -> CoreResult<Vec<Address>> {
        session.read(VERIFYING, "getVerifierTypes", ()).await
    }

    async fn expand(
        &self,
        session: &Session,
        verifier: &Address,
    ) -> CoreResult<Vec<(EntityKey, VerifierType)>> {
        let info: VerifierTypeInfo = session
            .read(VERIFYING, "getVerifierTypeInfo", *verifier)
            .await?;
        session.add_contract(&info.contract_name, &info.contract_name, *verifier, Vec::new())?;

        let record = VerifierType {
            contract_name: info.contract_name,
            value: *verifier,
            label: info.name_trans_key,
            description: info.description_trans_key,
            params_encoded: info.params_encoded,
            is_noninteractive: info.is_noninteractive,
        };
        Ok(vec![(EntityKey::Address(*verifier), record)])
    }

    fn publish(&self, result: &AggregateResult<VerifierType>) -> Vec<StateUpdate> {
        vec![StateUpdate::AddMultipleVerifierTypes {
            verifier_types_arr: result.records().cloned().collect(),
        }]
    }
}

// ---------------------------------------------------------------------------
// Underlyings
// ---------------------------------------------------------------------------

/// One row of the underlyings listing.
#[derive(Debug, Clone)]
pub struct UnderlyingRow {
    pub name: String,
    pub is_sourcerer: bool,
    pub contract_address: Address,
    pub attachment: String,
}

/// An underlying with the exchange pairs of its sourcerer (empty otherwise).
#[derive(Debug, Clone, PartialEq)]
pub struct UnderlyingRecord {
    pub underlying: Underlying,
    pub pairs: Vec<SourcererPair>,
}

/// All underlyings; sourcerers additionally get registered and have their
/// parameters and pairs read.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnderlyingsPlan;

#[async_trait]
impl FetchPlan for UnderlyingsPlan {
    type Key = UnderlyingRow;
    type Record = UnderlyingRecord;
    const NAME: &'static str = "underlyings";

    async fn list(&self, session: &Session) -> CoreResult<Vec<UnderlyingRow>> {
        let listing: UnderlyingsListing = session.read(UNDERLYINGS, "getUnderlyings", ()).await?;
        let count = listing.names.len();
        if listing.is_sourcerers.len() != count
            || listing.contract_addresses.len() != count
            || listing.attachments.len() != count
        {
            return Err(CoreError::ReturnDecoding {
                contract: UNDERLYINGS.to_string(),
                method: "getUnderlyings".to_string(),
                reason: "listing columns differ in length".to_string(),
            });
        }

        Ok(listing
            .names
            .iter()
            .zip(listing.is_sourcerers)
            .zip(listing.contract_addresses)
            .zip(&listing.attachments)
            .map(|(((name, is_sourcerer), contract_address), attachment)| UnderlyingRow {
                name: bytes32_to_string(name),
                is_sourcerer,
                contract_address,
                attachment: bytes32_to_string(attachment),
            })
            .collect())
    }

    async fn expand(
        &self,
        session: &Session,
        row: &UnderlyingRow,
    ) -> CoreResult<Vec<(EntityKey, UnderlyingRecord)>> {
        let mut underlying = Underlying {
            name: row.name.clone(),
            is_sourcerer: row.is_sourcerer,
            contract_address: row.contract_address,
            attachment: row.attachment.clone(),
            params_encoded: String::new(),
        };
        let mut pairs = Vec::new();

        if row.is_sourcerer {
            session.add_contract(&row.name, &row.name, row.contract_address, Vec::new())?;
            let (params, listing) = futures::try_join!(
                session.read::<String>(UNDERLYINGS, "getSourcererParams", row.contract_address),
                session.read::<SourcererPairsListing>(
                    UNDERLYINGS,
                    "getSourcererPairs",
                    row.contract_address
                ),
            )?;
            underlying.params_encoded = params;
            pairs = sourcerer_pairs(&row.name, listing);
        }

        Ok(vec![(
            EntityKey::Name(row.name.clone()),
            UnderlyingRecord { underlying, pairs },
        )])
    }

    fn publish(&self, result: &AggregateResult<UnderlyingRecord>) -> Vec<StateUpdate> {
        let all_underlyings = result
            .records()
            .map(|r| (r.underlying.name.clone(), r.underlying.clone()))
            .collect();
        let sourcerer_pairs = result
            .records()
            .flat_map(|r| r.pairs.iter().cloned())
            .collect();
        vec![
            StateUpdate::SetUnderlyings { all_underlyings },
            StateUpdate::SetSourcererPairs { sourcerer_pairs },
        ]
    }
}

fn sourcerer_pairs(name: &str, listing: SourcererPairsListing) -> Vec<SourcererPair> {
    listing
        .pats
        .iter()
        .enumerate()
        .map(|(i, pat)| SourcererPair {
            sourcerer_name: name.to_string(),
            pat: *pat,
            collateral: listing.collaterals.get(i).copied().unwrap_or_default(),
            beneficiary: listing.beneficiaries.get(i).copied().unwrap_or_default(),
            exchange_ratio: listing.exchange_ratios.get(i).copied().unwrap_or_default(),
            total_collateral_balance: listing
                .total_collateral_balances
                .get(i)
                .copied()
                .unwrap_or_default(),
            total_exchanged_pat_amount: listing
                .total_exchanged_pat_amounts
                .get(i)
                .copied()
                .unwrap_or_default(),
        })
        .collect()
}
