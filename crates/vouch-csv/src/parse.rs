//! Backup and supplier-list CSV readers.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord};
use vouch_core::{
  compliance::evaluate_completed,
  supplier::{Note, Supplier, SupplierId, SupplierType, YesNo},
};

use crate::{
  columns::{Column, ColumnMap},
  error::{Error, Result},
  serialize::{NOTE_SEPARATOR, NOTE_TIME_FORMAT},
};

/// Columns a supplier-list import reads positionally when its header is not
/// recognised.
const LIST_POSITIONAL: [Column; 2] = [Column::SupplierName, Column::ContactInfo];

/// Author recorded for notes whose user cannot be recovered.
const UNKNOWN_USER: &str = "Unknown";

// ─── Rows ────────────────────────────────────────────────────────────────────

/// One data row with its resolved column layout.
struct Row<'a> {
  record: &'a StringRecord,
  map:    &'a ColumnMap,
  /// 1-based data row number for error messages.
  number: usize,
}

impl Row<'_> {
  fn text(&self, column: Column) -> &str {
    self
      .map
      .position(column)
      .and_then(|i| self.record.get(i))
      .map(str::trim)
      .unwrap_or("")
  }

  fn invalid(&self, column: Column) -> Error {
    Error::InvalidValue {
      row:    self.number,
      column: column.header(),
      value:  self.text(column).to_owned(),
    }
  }

  fn yes_no(&self, column: Column, default: YesNo) -> Result<YesNo> {
    let raw = self.text(column);
    if raw.is_empty() {
      return Ok(default);
    }
    if let Ok(value) = YesNo::from_str(raw) {
      return Ok(value);
    }
    match raw.to_ascii_lowercase().as_str() {
      "true" | "y" | "1" => Ok(YesNo::Yes),
      "false" | "n" | "0" => Ok(YesNo::No),
      "new" if column == Column::NewSupplier => Ok(YesNo::Yes),
      "existing" if column == Column::NewSupplier => Ok(YesNo::No),
      _ => Err(self.invalid(column)),
    }
  }

  fn supplier_type(&self) -> Result<SupplierType> {
    let raw = self.text(Column::SupplierType);
    if raw.is_empty() {
      return Ok(SupplierType::default());
    }
    SupplierType::from_str(raw).map_err(|_| self.invalid(Column::SupplierType))
  }

  fn timestamp(&self, column: Column) -> Result<Option<DateTime<Utc>>> {
    let raw = self.text(column);
    if raw.is_empty() {
      return Ok(None);
    }
    parse_timestamp(raw)
      .map(Some)
      .ok_or_else(|| self.invalid(column))
  }
}

/// `Date.toLocaleString()` in the en-US locale, as older browser backups
/// wrote the modification time.
const LOCALE_TIME_FORMAT: &str = "%m/%d/%Y, %I:%M:%S %p";

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
    return Some(at.with_timezone(&Utc));
  }
  if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
    return Some(at.and_utc());
  }
  if let Ok(at) = NaiveDateTime::parse_from_str(raw, NOTE_TIME_FORMAT) {
    return Some(at.and_utc());
  }
  if let Ok(at) = NaiveDateTime::parse_from_str(raw, LOCALE_TIME_FORMAT) {
    return Some(at.and_utc());
  }
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|at| at.and_utc())
}

// ─── Notes ───────────────────────────────────────────────────────────────────

/// Split a flattened notes cell back into notes. Ids are always fresh.
pub(crate) fn notes(raw: &str, now: DateTime<Utc>) -> Vec<Note> {
  raw
    .split(NOTE_SEPARATOR)
    .map(str::trim)
    .filter(|segment| !segment.is_empty())
    .map(|segment| note(segment, now))
    .collect()
}

fn note(segment: &str, now: DateTime<Utc>) -> Note {
  let parsed = segment
    .strip_prefix('[')
    .and_then(|rest| rest.split_once("] "))
    .and_then(|(stamp, rest)| {
      let (user, text) = rest.split_once(": ")?;
      let user = user.trim();
      (!user.is_empty()).then(|| (stamp, user, text))
    });

  match parsed {
    Some((stamp, user, text)) => {
      let at = NaiveDateTime::parse_from_str(stamp, NOTE_TIME_FORMAT)
        .map(|at| at.and_utc())
        .ok()
        .or_else(|| parse_timestamp(stamp))
        .unwrap_or(now);
      Note::new(text, user, at)
    }
    None => Note::new(segment, UNKNOWN_USER, now),
  }
}

// ─── Readers ─────────────────────────────────────────────────────────────────

/// Read all records, returning the header and the non-blank data rows.
fn records(text: &str) -> Result<(StringRecord, Vec<StringRecord>)> {
  let mut reader = ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .from_reader(text.as_bytes());

  let mut rows = Vec::new();
  for record in reader.records() {
    let record = record?;
    if record.iter().all(|field| field.trim().is_empty()) {
      continue;
    }
    rows.push(record);
  }

  if rows.is_empty() {
    return Err(Error::MissingHeader);
  }
  let header = rows.remove(0);
  Ok((header, rows))
}

fn id_for(now: DateTime<Utc>, index: usize) -> SupplierId {
  SupplierId(now.timestamp_millis() + index as i64)
}

pub(crate) fn read_backup(text: &str, now: DateTime<Utc>) -> Result<Vec<Supplier>> {
  let (header, records) = records(text)?;
  let map = ColumnMap::from_headers(header.iter())
    .unwrap_or_else(|| ColumnMap::positional(&Column::ALL));

  records
    .iter()
    .enumerate()
    .map(|(index, record)| {
      let row = Row { record, map: &map, number: index + 1 };
      backup_row(&row, id_for(now, index), now)
    })
    .collect()
}

fn backup_row(row: &Row<'_>, id: SupplierId, now: DateTime<Utc>) -> Result<Supplier> {
  let mut supplier = Supplier {
    id,
    supplier_name:         row.text(Column::SupplierName).to_owned(),
    contact_info:          row.text(Column::ContactInfo).to_owned(),
    supplier_type:         row.supplier_type()?,
    is_new_supplier:       row.yes_no(Column::NewSupplier, YesNo::Yes)?,
    labour_involved:       row.yes_no(Column::LabourInvolved, YesNo::Yes)?,
    setup_in_qflow:        row.yes_no(Column::SetupInQflow, YesNo::No)?,
    insurance_liability:   row.text(Column::InsuranceLiability).to_owned(),
    gst_number:            row.text(Column::GstNumber).to_owned(),
    wcb_clearance:         row.text(Column::WcbClearance).to_owned(),
    last_compliance_check: row.timestamp(Column::LastComplianceCheck)?,
    priority:              row.yes_no(Column::Priority, YesNo::No)?.is_yes(),
    notes:                 notes(row.text(Column::Notes), now),
    completed:             false,
    // Written in whatever locale the exporting browser used; unreadable means now.
    last_modified_time:    parse_timestamp(row.text(Column::LastModifiedTime)).unwrap_or(now),
    last_modified_user:    row.text(Column::LastModifiedUser).to_owned(),
  };
  supplier.completed = evaluate_completed(&supplier);
  Ok(supplier)
}

pub(crate) fn read_list(text: &str, now: DateTime<Utc>) -> Result<Vec<Supplier>> {
  let (header, records) = records(text)?;
  let (map, skip_header) = match ColumnMap::from_headers(header.iter()) {
    Some(map) => (map, true),
    None => (ColumnMap::positional(&LIST_POSITIONAL), false),
  };

  let records: Vec<&StringRecord> = if skip_header {
    records.iter().collect()
  } else {
    std::iter::once(&header).chain(records.iter()).collect()
  };

  let mut suppliers = Vec::new();
  for (index, record) in records.into_iter().enumerate() {
    let row = Row { record, map: &map, number: index + 1 };
    if row.text(Column::SupplierName).is_empty() {
      continue;
    }
    let id = id_for(now, suppliers.len());
    suppliers.push(list_row(&row, id, now)?);
  }
  Ok(suppliers)
}

fn list_row(row: &Row<'_>, id: SupplierId, now: DateTime<Utc>) -> Result<Supplier> {
  let mut supplier = Supplier {
    id,
    supplier_name:       row.text(Column::SupplierName).to_owned(),
    contact_info:        row.text(Column::ContactInfo).to_owned(),
    supplier_type:       row.supplier_type()?,
    is_new_supplier:     row.yes_no(Column::NewSupplier, YesNo::Yes)?,
    labour_involved:     row.yes_no(Column::LabourInvolved, YesNo::Yes)?,
    setup_in_qflow:      row.yes_no(Column::SetupInQflow, YesNo::No)?,
    insurance_liability: row.text(Column::InsuranceLiability).to_owned(),
    gst_number:          row.text(Column::GstNumber).to_owned(),
    wcb_clearance:       row.text(Column::WcbClearance).to_owned(),
    priority:            row.yes_no(Column::Priority, YesNo::No)?.is_yes(),
    last_modified_time:  now,
    ..Supplier::default()
  };
  supplier.completed = evaluate_completed(&supplier);
  Ok(supplier)
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() }

  #[test]
  fn note_with_user_and_stamp() {
    let parsed = notes("[2024-01-02 03:04] sam: called: no answer | [2024-01-03 10:00] jo: ok", now());
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].user, "sam");
    assert_eq!(parsed[0].text, "called: no answer");
    assert_eq!(
      parsed[0].timestamp,
      Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 0).unwrap()
    );
    assert_eq!(parsed[1].user, "jo");
  }

  #[test]
  fn malformed_note_falls_back_to_unknown() {
    let parsed = notes("just some text", now());
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].user, UNKNOWN_USER);
    assert_eq!(parsed[0].text, "just some text");
    assert_eq!(parsed[0].timestamp, now());
  }

  #[test]
  fn unparseable_note_stamp_uses_now() {
    let parsed = notes("[yesterday] sam: hi", now());
    assert_eq!(parsed[0].user, "sam");
    assert_eq!(parsed[0].timestamp, now());
  }

  #[test]
  fn empty_notes_cell() {
    assert!(notes("", now()).is_empty());
  }

  #[test]
  fn timestamp_formats() {
    let expected = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
    assert_eq!(parse_timestamp("2024-05-06T07:08:09.000Z"), Some(expected));
    assert_eq!(parse_timestamp("2024-05-06T09:08:09+02:00"), Some(expected));
    assert_eq!(parse_timestamp("2024-05-06 07:08:09"), Some(expected));
    assert_eq!(
      parse_timestamp("2024-05-06"),
      Some(Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap())
    );
    assert_eq!(parse_timestamp("5/6/2024, 7:08:09 AM"), Some(expected));
    assert_eq!(
      parse_timestamp("12/31/2024, 11:59:00 PM"),
      Some(Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 0).unwrap())
    );
    assert_eq!(parse_timestamp("last week"), None);
  }
}
