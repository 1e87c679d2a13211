//! CSV codec for Vouch backups and supplier-list imports.
//!
//! Pure synchronous conversion between CSV text and [`vouch_core`] supplier
//! records. Decoding never yields a partial collection: any malformed row
//! fails the whole file.
//!
//! # Quick start
//!
//! ```no_run
//! use chrono::Utc;
//!
//! let text = "\"Supplier Name\",\"Contact Info\"\n\"Acme\",\"acme@example.com\"\n";
//! let suppliers = vouch_csv::decode(text, Utc::now()).unwrap();
//! println!("{}", vouch_csv::encode(&suppliers).unwrap());
//! ```

mod columns;
pub mod error;
mod parse;
mod serialize;

use chrono::{DateTime, Utc};
pub use columns::Column;
pub use error::{Error, Result};
use vouch_core::supplier::Supplier;

/// Render `suppliers` as a full backup: one header row and one row per
/// supplier, fifteen always-quoted columns.
pub fn encode(suppliers: &[Supplier]) -> Result<String> {
  serialize::write_all(suppliers)
}

/// Decode a full backup.
///
/// Columns are located by header name; a header naming no known column is
/// read in export order instead. Supplier ids are `now` in milliseconds plus
/// the row index, note ids are fresh, and `completed` is re-derived.
///
/// Cells and note segments are trimmed, so leading and trailing whitespace
/// in any field does not survive an export and re-import. A Last Modified
/// Time that cannot be read is replaced by `now`.
pub fn decode(text: &str, now: DateTime<Utc>) -> Result<Vec<Supplier>> {
  parse::read_backup(text, now)
}

/// Decode a supplier list: name and contact, plus any classification and
/// document columns the header names. Rows with a blank name are skipped and
/// every other field takes its default.
pub fn decode_supplier_list(text: &str, now: DateTime<Utc>) -> Result<Vec<Supplier>> {
  parse::read_list(text, now)
}
