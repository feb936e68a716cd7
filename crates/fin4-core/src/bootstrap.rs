//! Registry bootstrap.
//!
//! The root `Fin4Main` contract knows the addresses of every satellite and
//! token-curation contract. Two independent read sequences pull those
//! addresses and register each contract by name; they run concurrently and
//! [`bootstrap`] returns only after both have registered everything.

use alloy_primitives::Address;
use serde::Serialize;
use tracing::info;

use crate::decode::{FromReturn, ReturnValues};
use crate::error::Result;
use crate::session::Session;

pub const MAIN_CONTRACT: &str = "Fin4Main";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SatelliteAddresses {
    pub uncapped_token_creator: Address,
    pub capped_token_creator: Address,
    pub token_management: Address,
    pub claiming: Address,
    pub collections: Address,
    pub messaging: Address,
    pub verifying: Address,
    pub groups: Address,
    pub system_parameters: Address,
    pub underlyings: Address,
}

impl FromReturn for SatelliteAddresses {
    fn from_return(out: &mut ReturnValues) -> Result<Self> {
        Ok(Self {
            uncapped_token_creator: out.address()?,
            capped_token_creator: out.address()?,
            token_management: out.address()?,
            claiming: out.address()?,
            collections: out.address()?,
            messaging: out.address()?,
            verifying: out.address()?,
            groups: out.address()?,
            system_parameters: out.address()?,
            underlyings: out.address()?,
        })
    }
}

const NO_EVENTS: &[&str] = &[];
const TOKEN_MANAGEMENT_EVENTS: &[&str] = &["Fin4TokenCreated"];
const MESSAGING_EVENTS: &[&str] = &["NewMessage", "MessageMarkedAsRead"];
const CLAIMING_EVENTS: &[&str] = &[
    "ClaimSubmitted",
    "ClaimApproved",
    "ClaimRejected",
    "VerifierPending",
    "VerifierApproved",
    "VerifierRejected",
    "UpdatedTotalSupply",
];
const VERIFYING_EVENTS: &[&str] = &["SubmissionAdded"];

impl SatelliteAddresses {
    /// `(contract name, address, watched events)` in registration order.
    pub fn contracts(&self) -> Vec<(&'static str, Address, &'static [&'static str])> {
        vec![
            ("Fin4UncappedTokenCreator", self.uncapped_token_creator, NO_EVENTS),
            ("Fin4CappedTokenCreator", self.capped_token_creator, NO_EVENTS),
            ("Fin4TokenManagement", self.token_management, TOKEN_MANAGEMENT_EVENTS),
            ("Fin4Messaging", self.messaging, MESSAGING_EVENTS),
            ("Fin4Claiming", self.claiming, CLAIMING_EVENTS),
            ("Fin4Collections", self.collections, NO_EVENTS),
            ("Fin4Verifying", self.verifying, VERIFYING_EVENTS),
            ("Fin4Groups", self.groups, NO_EVENTS),
            ("Fin4SystemParameters", self.system_parameters, NO_EVENTS),
            ("Fin4Underlyings", self.underlyings, NO_EVENTS),
        ]
    }
}

/// Token-curation registry contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TcrAddresses {
    pub rep: Address,
    pub gov: Address,
    pub registry: Address,
    pub plcr_voting: Address,
    pub parameterizer: Address,
}

impl FromReturn for TcrAddresses {
    fn from_return(out: &mut ReturnValues) -> Result<Self> {
        Ok(Self {
            rep: out.address()?,
            gov: out.address()?,
            registry: out.address()?,
            plcr_voting: out.address()?,
            parameterizer: out.address()?,
        })
    }
}

impl TcrAddresses {
    pub fn contracts(&self) -> Vec<(&'static str, Address)> {
        vec![
            ("REP", self.rep),
            ("GOV", self.gov),
            ("Registry", self.registry),
            ("PLCRVoting", self.plcr_voting),
            ("Parameterizer", self.parameterizer),
        ]
    }
}

fn events(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Register the root contract every bootstrap read goes through.
pub fn add_main_contract(session: &Session, address: Address) -> Result<()> {
    session.add_contract(MAIN_CONTRACT, MAIN_CONTRACT, address, Vec::new())?;
    Ok(())
}

pub async fn add_satellite_contracts(session: &Session) -> Result<SatelliteAddresses> {
    let addresses: SatelliteAddresses = session
        .read(MAIN_CONTRACT, "getSatelliteAddresses", ())
        .await?;
    for (name, address, watched) in addresses.contracts() {
        session.add_contract(name, name, address, events(watched))?;
    }
    info!(contracts = 10, "satellite contracts registered");
    Ok(addresses)
}

pub async fn add_tcr_contracts(session: &Session) -> Result<TcrAddresses> {
    let addresses: TcrAddresses = session.read(MAIN_CONTRACT, "getTCRaddresses", ()).await?;
    for (name, address) in addresses.contracts() {
        session.add_contract(name, name, address, Vec::new())?;
    }
    info!(contracts = 5, "token curation contracts registered");
    Ok(addresses)
}

/// Register `Fin4Main` at `main_address`, then both contract families.
pub async fn bootstrap(
    session: &Session,
    main_address: Address,
) -> Result<(SatelliteAddresses, TcrAddresses)> {
    add_main_contract(session, main_address)?;
    futures::try_join!(add_satellite_contracts(session), add_tcr_contracts(session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::InterfaceDescription;
    use crate::artifacts::ArtifactStore;
    use alloy_dyn_abi::DynSolValue;
    use fin4_transport::test_utils::MockLedger;
    use fin4_types::{RecordingDispatcher, StateUpdate};
    use std::sync::Arc;

    fn artifacts() -> ArtifactStore {
        let store = ArtifactStore::in_memory();
        store.insert(
            MAIN_CONTRACT,
            InterfaceDescription::parse(
                MAIN_CONTRACT,
                &[
                    "function getSatelliteAddresses() view returns (address,address,address,address,address,address,address,address,address,address)",
                    "function getTCRaddresses() view returns (address,address,address,address,address)",
                ],
            )
            .unwrap(),
        );
        let names = [
            "Fin4UncappedTokenCreator",
            "Fin4CappedTokenCreator",
            "Fin4TokenManagement",
            "Fin4Claiming",
            "Fin4Collections",
            "Fin4Messaging",
            "Fin4Verifying",
            "Fin4Groups",
            "Fin4SystemParameters",
            "Fin4Underlyings",
            "REP",
            "GOV",
            "Registry",
            "PLCRVoting",
            "Parameterizer",
        ];
        for name in names {
            store.insert(name, InterfaceDescription::default());
        }
        store
    }

    fn encoded_addresses(first: u8, count: u8) -> Vec<u8> {
        DynSolValue::Tuple(
            (first..first + count)
                .map(|b| DynSolValue::Address(Address::repeat_byte(b)))
                .collect(),
        )
        .abi_encode_params()
    }

    #[tokio::test]
    async fn test_bootstrap_registers_both_families() {
        let ledger = Arc::new(MockLedger::new());
        let recorder = Arc::new(RecordingDispatcher::new());
        let session = Session::new(ledger.clone(), artifacts(), recorder.clone(), Address::ZERO);
        let main = Address::repeat_byte(0xf0);
        add_main_contract(&session, main).unwrap();

        let satellites = session.prepare(MAIN_CONTRACT, "getSatelliteAddresses", ()).unwrap();
        let tcr = session.prepare(MAIN_CONTRACT, "getTCRaddresses", ()).unwrap();
        ledger.respond(main, satellites.encoded.data, encoded_addresses(1, 10));
        ledger.respond(main, tcr.encoded.data, encoded_addresses(0x21, 5));

        let (sat, tcr) = bootstrap(&session, main).await.unwrap();
        assert_eq!(sat.claiming, Address::repeat_byte(4));
        assert_eq!(tcr.plcr_voting, Address::repeat_byte(0x24));

        let registry = session.registry();
        assert_eq!(registry.len(), 16);
        assert_eq!(
            registry.lookup("Fin4Underlyings").unwrap().address,
            Address::repeat_byte(10)
        );
        assert_eq!(
            registry.lookup("Fin4Claiming").unwrap().events.len(),
            7
        );
        assert_eq!(registry.lookup("GOV").unwrap().address, Address::repeat_byte(0x22));

        // Fin4Main once per registration, then every satellite and TCR contract.
        let added = recorder.of_kind("ADD_CONTRACT");
        assert_eq!(added.len(), 17);
        assert!(added.iter().any(|u| matches!(
            u,
            StateUpdate::AddContract { contract_name, events, .. }
                if contract_name == "Fin4Verifying" && events == &vec!["SubmissionAdded".to_string()]
        )));
    }

    #[tokio::test]
    async fn test_bootstrap_fails_without_main_answers() {
        let ledger = Arc::new(MockLedger::new());
        let session = Session::new(
            ledger,
            artifacts(),
            Arc::new(RecordingDispatcher::new()),
            Address::ZERO,
        );
        assert!(bootstrap(&session, Address::repeat_byte(0xf0)).await.is_err());
    }
}
