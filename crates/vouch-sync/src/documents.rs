//! Shapes of the documents written to the remote collection.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use vouch_core::supplier::{Envelope, Supplier};

use crate::Result;

/// Written last; describes the chunk set that precedes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
  pub total_chunks:    usize,
  pub total_suppliers: usize,
  #[serde(default)]
  pub last_saved:      Option<DateTime<Utc>>,
  #[serde(default)]
  pub last_backup:     Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChunkRef<'a> {
  pub chunk_index: usize,
  pub suppliers:   &'a [Supplier],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Chunk {
  #[serde(default)]
  pub suppliers: Vec<Supplier>,
}

/// The single-document layout: either a full envelope or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum LegacyDocument {
  Suppliers(Vec<Supplier>),
  Envelope(Envelope),
}

impl From<LegacyDocument> for Envelope {
  fn from(doc: LegacyDocument) -> Self {
    match doc {
      LegacyDocument::Suppliers(suppliers) => Envelope { suppliers, ..Envelope::default() },
      LegacyDocument::Envelope(envelope) => envelope,
    }
  }
}

/// SHA-256 over the persisted content of a collection, hex encoded. Save
/// timestamps are excluded so identical content always fingerprints equal.
pub fn fingerprint(suppliers: &[Supplier], last_backup: Option<NaiveDate>) -> Result<String> {
  let bytes = serde_json::to_vec(&(suppliers, last_backup))?;
  Ok(hex::encode(Sha256::digest(&bytes)))
}
