//! Claim history export.
//!
//! Two shapes: every claim on one token (concurrent reads, rows keep the
//! composite id and verifier status map), and every claim on every token of
//! a collection, read one token at a time in input order with rows tagged by
//! token symbol.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use alloy_primitives::{Address, U256};
use chrono::Utc;
use fin4_core::Session;
use fin4_types::{Claim, ClaimExportRow, Collection, Fin4Token};
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::aggregator::indices;
use crate::contracts::CLAIMING;
use crate::error::{FetchError, Result};
use crate::plans::{claim_export_row, claim_record, read_claim};
use crate::readers::find_token_by_symbol;

async fn claims_count(session: &Session, token: Address) -> Result<u64> {
    Ok(session
        .read(CLAIMING, "getClaimsCountOnThisToken", token)
        .await?)
}

fn lookup<'a>(tokens: &'a BTreeMap<Address, Fin4Token>, symbol: &str) -> Result<&'a Fin4Token> {
    find_token_by_symbol(tokens, symbol).ok_or_else(|| FetchError::UnknownToken(symbol.to_string()))
}

/// Every claim on the token with `symbol`, read concurrently.
pub async fn fetch_all_claims_on_token(
    session: &Session,
    tokens: &BTreeMap<Address, Fin4Token>,
    symbol: &str,
) -> Result<Vec<Claim>> {
    let token = lookup(tokens, symbol)?.address;
    let ids: Vec<U256> = indices(claims_count(session, token).await?)
        .into_iter()
        .map(U256::from)
        .collect();
    let raw = try_join_all(ids.iter().map(|id| read_claim(session, token, *id))).await?;

    let claims = raw
        .into_iter()
        .zip(ids)
        .map(|(raw, id)| claim_record(token, id, raw))
        .collect::<fin4_core::Result<Vec<_>>>()?;
    debug!(%token, claims = claims.len(), "claims on token fetched");
    Ok(claims)
}

/// Claims of each token in `symbols`, one token after another, concatenated
/// in input order. Rows carry the symbol as given in `symbols`.
pub async fn fetch_claims_sequentially(
    session: &Session,
    tokens: &BTreeMap<Address, Fin4Token>,
    symbols: &[String],
) -> Result<Vec<ClaimExportRow>> {
    let mut rows = Vec::new();
    for symbol in symbols {
        let token = lookup(tokens, symbol)?;
        let count = claims_count(session, token.address).await?;
        for id in indices(count).into_iter().map(U256::from) {
            let raw = read_claim(session, token.address, id).await?;
            rows.push(claim_export_row(symbol, token.address, id, raw));
        }
        debug!(%symbol, claims = count, "collection token exported");
    }
    Ok(rows)
}

/// Symbols of the collection's tokens that are known locally, in collection
/// order.
pub fn collection_symbols(collection: &Collection, tokens: &BTreeMap<Address, Fin4Token>) -> Vec<String> {
    collection
        .tokens
        .iter()
        .filter_map(|address| tokens.get(address))
        .map(|token| token.symbol.clone())
        .collect()
}

/// Destination of exported rows.
pub trait ExportFormatter {
    /// Write `rows` under a name derived from `file_stem`; returns where.
    fn export(&self, file_stem: &str, rows: &[Value]) -> Result<PathBuf>;
}

/// Serialize records into the JSON objects an [`ExportFormatter`] takes.
pub fn to_rows<T: Serialize>(records: &[T]) -> Result<Vec<Value>> {
    records
        .iter()
        .map(|record| serde_json::to_value(record).map_err(|e| FetchError::Export(e.to_string())))
        .collect()
}

/// Writes `<stem>_<unix millis>.csv` into a directory.
///
/// Nested objects become dotted columns and lists are joined with `;`. The
/// header is the union of all row keys in first-seen order.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    dir: PathBuf,
}

impl CsvExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportFormatter for CsvExporter {
    fn export(&self, file_stem: &str, rows: &[Value]) -> Result<PathBuf> {
        let path = self
            .dir
            .join(format!("{file_stem}_{}.csv", Utc::now().timestamp_millis()));

        let flat: Vec<Vec<(String, String)>> = rows
            .iter()
            .map(|row| {
                let mut cells = Vec::new();
                flatten("", row, &mut cells);
                cells
            })
            .collect();
        let mut header: Vec<String> = Vec::new();
        for cells in &flat {
            for (column, _) in cells {
                if !header.contains(column) {
                    header.push(column.clone());
                }
            }
        }

        let mut writer = csv::Writer::from_path(&path)?;
        if !header.is_empty() {
            writer.write_record(&header)?;
        }
        for cells in &flat {
            let lookup: BTreeMap<&str, &str> = cells
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            writer.write_record(header.iter().map(|column| lookup.get(column.as_str()).copied().unwrap_or("")))?;
        }
        writer.flush()?;

        info!(path = %path.display(), rows = rows.len(), "export written");
        Ok(path)
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => flatten_object(prefix, map, out),
        other => out.push((prefix.to_string(), cell(other))),
    }
}

fn flatten_object(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, value) in map {
        let column = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        flatten(&column, value, out);
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(";"),
        other => other.to_string(),
    }
}

/// Export every claim on one token as `AllClaimsOnToken_<symbol>_<millis>`.
pub async fn download_claims_on_token(
    session: &Session,
    tokens: &BTreeMap<Address, Fin4Token>,
    symbol: &str,
    formatter: &dyn ExportFormatter,
) -> Result<PathBuf> {
    let claims = fetch_all_claims_on_token(session, tokens, symbol).await?;
    formatter.export(&format!("AllClaimsOnToken_{symbol}"), &to_rows(&claims)?)
}

/// Export the claims on every token of a collection as
/// `AllClaimsOnAllTokensInCollection_<identifier>_<millis>`. Nothing is
/// written when `symbols` is empty.
pub async fn download_claims_on_collection(
    session: &Session,
    tokens: &BTreeMap<Address, Fin4Token>,
    identifier: &str,
    symbols: &[String],
    formatter: &dyn ExportFormatter,
) -> Result<Option<PathBuf>> {
    if symbols.is_empty() {
        info!(collection = identifier, "no tokens in collection; nothing exported");
        return Ok(None);
    }
    let rows = fetch_claims_sequentially(session, tokens, symbols).await?;
    let path = formatter.export(
        &format!("AllClaimsOnAllTokensInCollection_{identifier}"),
        &to_rows(&rows)?,
    )?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_csv_flattens_nested_columns() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path());
        let rows = vec![
            json!({"id": "a_0", "verifierStatuses": {"0x01": {"status": 1, "message": ""}}, "tags": ["x", "y"]}),
            json!({"id": "a_1", "extra": null}),
        ];

        let path = exporter.export("AllClaimsOnToken_TREE", &rows).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("AllClaimsOnToken_TREE_") && name.ends_with(".csv"));

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "id,verifierStatuses.0x01.status,verifierStatuses.0x01.message,tags,extra"
        );
        assert_eq!(lines[1], "a_0,1,,x;y,");
        assert_eq!(lines[2], "a_1,,,,");
    }

    #[test]
    fn test_collection_symbols_keeps_collection_order() {
        let token = |byte: u8, symbol: &str| Fin4Token {
            address: Address::repeat_byte(byte),
            user_is_creator: false,
            name: String::new(),
            symbol: symbol.into(),
            description: String::new(),
            unit: String::new(),
            total_supply: U256::ZERO,
            creation_time: U256::ZERO,
            has_fixed_minting_quantity: false,
            is_opat: None,
            underlyings: None,
        };
        let tokens: BTreeMap<_, _> = [token(1, "A"), token(2, "B")]
            .into_iter()
            .map(|t| (t.address, t))
            .collect();
        let collection = Collection {
            collection_id: 0,
            user_is_creator: false,
            user_is_admin: false,
            admin_group_is_set: false,
            admin_group_id: U256::ZERO,
            tokens: vec![Address::repeat_byte(2), Address::repeat_byte(9), Address::repeat_byte(1)],
            name: "Green".into(),
            identifier: "GRN".into(),
            description: String::new(),
        };
        assert_eq!(collection_symbols(&collection, &tokens), vec!["B", "A"]);
    }
}
