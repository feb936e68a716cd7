//! [`StateFetcher`]: one entry point over every plan, reader and export,
//! with the last fetched token table cached for symbol lookups.

use std::collections::BTreeMap;
use std::path::PathBuf;

use alloy_primitives::{Address, U256};
use chrono::Utc;
use fin4_core::Session;
use fin4_types::{
    Claim, Collection, DetailedTokenInfo, Fin4Token, Message, ParameterizerParam, Submission,
    VerifierType,
};
use parking_lot::RwLock;
use tracing::info;

use crate::aggregator::{execute, run_plan, AggregateResult};
use crate::contracts::{GOV, REP};
use crate::error::{FetchError, Result};
use crate::export::{self, ExportFormatter};
use crate::plans::{
    token_map, ClaimsPlan, CollectionsPlan, MessagesPlan, SubmissionsPlan, TokensPlan,
    UnderlyingRecord, UnderlyingsPlan, VerifierTypesPlan,
};
use crate::readers::{self, PollStatus};
use crate::returns::{NonzeroBalances, SystemParameters};

pub struct StateFetcher<'a> {
    session: &'a Session,
    underlyings_active: bool,
    tokens: RwLock<BTreeMap<Address, Fin4Token>>,
}

impl<'a> StateFetcher<'a> {
    pub fn new(session: &'a Session, underlyings_active: bool) -> Self {
        Self {
            session,
            underlyings_active,
            tokens: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn session(&self) -> &Session {
        self.session
    }

    /// Tokens from the last successful [`fetch_tokens`](Self::fetch_tokens).
    pub fn tokens(&self) -> BTreeMap<Address, Fin4Token> {
        self.tokens.read().clone()
    }

    pub async fn fetch_tokens(&self) -> Result<BTreeMap<Address, Fin4Token>> {
        let plan = TokensPlan {
            underlyings_active: self.underlyings_active,
        };
        let tokens = token_map(&run_plan(self.session, &plan).await?);
        *self.tokens.write() = tokens.clone();
        Ok(tokens)
    }

    pub async fn fetch_claims(&self) -> Result<AggregateResult<Claim>> {
        run_plan(self.session, &ClaimsPlan).await
    }

    pub async fn fetch_collections(&self) -> Result<AggregateResult<Collection>> {
        run_plan(self.session, &CollectionsPlan).await
    }

    pub async fn fetch_submissions(&self) -> Result<AggregateResult<Submission>> {
        run_plan(self.session, &SubmissionsPlan).await
    }

    pub async fn fetch_messages(&self) -> Result<AggregateResult<Message>> {
        run_plan(self.session, &MessagesPlan).await
    }

    pub async fn fetch_verifier_types(&self) -> Result<AggregateResult<VerifierType>> {
        run_plan(self.session, &VerifierTypesPlan).await
    }

    /// Empty without any reads when the underlyings satellite is inactive.
    pub async fn fetch_underlyings(&self) -> Result<AggregateResult<UnderlyingRecord>> {
        if !self.underlyings_active {
            info!("underlyings inactive; skipping");
            return Ok(AggregateResult::new());
        }
        run_plan(self.session, &UnderlyingsPlan).await
    }

    pub async fn fetch_balances(&self) -> Result<NonzeroBalances> {
        readers::fetch_users_nonzero_token_balances(self.session).await
    }

    /// GOV then REP balance of the default account.
    pub async fn fetch_governance_balances(&self) -> Result<(U256, U256)> {
        futures::try_join!(
            readers::fetch_users_governance_balance(self.session, GOV),
            readers::fetch_users_governance_balance(self.session, REP),
        )
    }

    pub async fn fetch_system_parameters(&self) -> Result<SystemParameters> {
        readers::fetch_system_parameters(self.session).await
    }

    pub async fn fetch_parameterizer_params(&self) -> Result<BTreeMap<String, ParameterizerParam>> {
        readers::fetch_parameterizer_params(self.session).await
    }

    pub async fn fetch_opats(&self) -> Result<Vec<String>> {
        readers::fetch_opats(self.session).await
    }

    pub async fn poll_status(&self, poll_id: U256) -> Result<PollStatus> {
        readers::get_poll_status(self.session, poll_id, Utc::now()).await
    }

    pub async fn token_details(&self, token_contract: &str) -> Result<DetailedTokenInfo> {
        readers::fetch_token_details(self.session, token_contract).await
    }

    pub async fn export_token(&self, symbol: &str, formatter: &dyn ExportFormatter) -> Result<PathBuf> {
        let tokens = self.tokens();
        export::download_claims_on_token(self.session, &tokens, symbol, formatter).await
    }

    /// Export every claim in the collection with `identifier`. The collection
    /// listing is read without publishing.
    pub async fn export_collection(
        &self,
        identifier: &str,
        formatter: &dyn ExportFormatter,
    ) -> Result<Option<PathBuf>> {
        let collections = execute(self.session, &CollectionsPlan).await?;
        let collection = collections
            .records()
            .find(|c| c.identifier == identifier)
            .ok_or_else(|| FetchError::UnknownCollection(identifier.to_string()))?;

        let tokens = self.tokens();
        let symbols = export::collection_symbols(collection, &tokens);
        export::download_claims_on_collection(self.session, &tokens, identifier, &symbols, formatter)
            .await
    }
}
