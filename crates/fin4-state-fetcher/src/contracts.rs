//! Registered names of the contracts the fetchers read from.

pub const TOKEN_MANAGEMENT: &str = "Fin4TokenManagement";
pub const CLAIMING: &str = "Fin4Claiming";
pub const COLLECTIONS: &str = "Fin4Collections";
pub const MESSAGING: &str = "Fin4Messaging";
pub const VERIFYING: &str = "Fin4Verifying";
pub const SYSTEM_PARAMETERS: &str = "Fin4SystemParameters";
pub const UNDERLYINGS: &str = "Fin4Underlyings";
pub const REP: &str = "REP";
pub const GOV: &str = "GOV";
pub const REGISTRY: &str = "Registry";
pub const PLCR_VOTING: &str = "PLCRVoting";
pub const PARAMETERIZER: &str = "Parameterizer";
