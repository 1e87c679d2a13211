//! Backup CSV writer.
//!
//! Every field is quoted; rows end in `\n`.

use chrono::{DateTime, SecondsFormat, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use vouch_core::supplier::{Note, Supplier, YesNo};

use crate::{
  columns::Column,
  error::{Error, Result},
};

/// Separator between flattened notes.
pub(crate) const NOTE_SEPARATOR: &str = " | ";
/// Minute-precision stamp written inside a note's brackets.
pub(crate) const NOTE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
  at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn note(note: &Note) -> String {
  format!(
    "[{}] {}: {}",
    note.timestamp.format(NOTE_TIME_FORMAT),
    note.user,
    note.text
  )
}

pub(crate) fn notes(notes: &[Note]) -> String {
  notes.iter().map(note).collect::<Vec<_>>().join(NOTE_SEPARATOR)
}

fn cell(supplier: &Supplier, column: Column) -> String {
  match column {
    Column::SupplierName        => supplier.supplier_name.clone(),
    Column::ContactInfo         => supplier.contact_info.clone(),
    Column::SupplierType        => supplier.supplier_type.to_string(),
    Column::NewSupplier         => supplier.is_new_supplier.to_string(),
    Column::LabourInvolved      => supplier.labour_involved.to_string(),
    Column::SetupInQflow        => supplier.setup_in_qflow.to_string(),
    Column::InsuranceLiability  => supplier.insurance_liability.clone(),
    Column::GstNumber           => supplier.gst_number.clone(),
    Column::WcbClearance        => supplier.wcb_clearance.clone(),
    Column::LastComplianceCheck => {
      supplier.last_compliance_check.map(timestamp).unwrap_or_default()
    }
    Column::Priority            => YesNo::from(supplier.priority).to_string(),
    Column::Notes               => notes(&supplier.notes),
    Column::LastModifiedTime    => timestamp(supplier.last_modified_time),
    Column::LastModifiedUser    => supplier.last_modified_user.clone(),
    Column::Completed           => YesNo::from(supplier.completed).to_string(),
  }
}

pub(crate) fn write_all(suppliers: &[Supplier]) -> Result<String> {
  let mut writer = WriterBuilder::new()
    .quote_style(QuoteStyle::Always)
    .terminator(Terminator::Any(b'\n'))
    .from_writer(Vec::new());

  writer.write_record(Column::ALL.iter().map(|c| c.header()))?;
  for supplier in suppliers {
    writer.write_record(Column::ALL.iter().map(|c| cell(supplier, *c)))?;
  }

  let bytes = writer
    .into_inner()
    .map_err(|e| Error::Finish(e.error().to_string()))?;
  String::from_utf8(bytes).map_err(|e| Error::Finish(e.to_string()))
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use vouch_core::supplier::{SupplierDraft, SupplierId};

  use super::*;

  #[test]
  fn header_and_quoting() {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    let mut s = Supplier::from_draft(
      SupplierId(1),
      SupplierDraft {
        supplier_name: "Acme, \"The\" Co".into(),
        ..SupplierDraft::default()
      },
      "sam",
      at,
    );
    s.notes.push(Note::new("called", "sam", at));

    let out = write_all(&[s]).unwrap();
    let mut lines = out.lines();
    assert_eq!(
      lines.next().unwrap(),
      "\"Supplier Name\",\"Contact Info\",\"Supplier Type\",\"New Supplier\",\
       \"Labour Involved\",\"Setup in QFlow\",\"Insurance Liability\",\
       \"GST Number\",\"WCB Clearance Letter\",\"Last Compliance Check\",\
       \"Priority\",\"Notes\",\"Last Modified Time\",\"Last Modified User\",\
       \"Completed\""
    );
    let row = lines.next().unwrap();
    assert!(row.starts_with("\"Acme, \"\"The\"\" Co\",\"\",\"Company\",\"Yes\""));
    assert!(row.contains("\"[2024-03-01 09:30] sam: called\""));
    assert!(row.contains("\"2024-03-01T09:30:00.000Z\""));
    assert!(out.ends_with('\n'));
    assert!(!out.contains('\r'));
  }

  #[test]
  fn empty_collection_is_header_only() {
    let out = write_all(&[]).unwrap();
    assert_eq!(out.lines().count(), 1);
  }
}
