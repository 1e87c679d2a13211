//! Supplier records: the single entity tracked by Vouch.
//!
//! Field names serialise in camelCase, the format the browser front-end and
//! older saved collections use.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{
  Deserialize, Deserializer, Serialize,
  de::{self, Unexpected, Visitor},
};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Millisecond creation timestamp used as a supplier's identity.
///
/// Collections written by the browser front-end may carry fractional ids
/// from bulk imports. Those are floored on load, and [`Controller::new`]
/// bumps any that then collide.
///
/// [`Controller::new`]: crate::controller::Controller::new
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize,
)]
#[serde(transparent)]
pub struct SupplierId(pub i64);

impl SupplierId {
  /// Id derived from the instant `at`.
  pub fn from_timestamp(at: DateTime<Utc>) -> Self { Self(at.timestamp_millis()) }

  /// The following id value; used to step around collisions.
  pub fn next(self) -> Self { Self(self.0 + 1) }
}

impl<'de> Deserialize<'de> for SupplierId {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_any(SupplierIdVisitor)
  }
}

struct SupplierIdVisitor;

impl<'de> Visitor<'de> for SupplierIdVisitor {
  type Value = SupplierId;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("a numeric supplier id")
  }

  fn visit_i64<E: de::Error>(self, v: i64) -> Result<SupplierId, E> { Ok(SupplierId(v)) }

  fn visit_u64<E: de::Error>(self, v: u64) -> Result<SupplierId, E> {
    i64::try_from(v)
      .map(SupplierId)
      .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
  }

  fn visit_f64<E: de::Error>(self, v: f64) -> Result<SupplierId, E> {
    if !v.is_finite() || v < i64::MIN as f64 || v >= i64::MAX as f64 {
      return Err(E::invalid_value(Unexpected::Float(v), &self));
    }
    Ok(SupplierId(v.floor() as i64))
  }

  fn visit_str<E: de::Error>(self, v: &str) -> Result<SupplierId, E> {
    let v = v.trim();
    if let Ok(n) = v.parse::<i64>() {
      return Ok(SupplierId(n));
    }
    match v.parse::<f64>() {
      Ok(n) => self.visit_f64(n),
      Err(_) => Err(E::invalid_value(Unexpected::Str(v), &self)),
    }
  }
}

impl fmt::Display for SupplierId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── Classification ──────────────────────────────────────────────────────────

/// Whether the supplier is a registered business or a sole individual.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum SupplierType {
  #[default]
  Company,
  Individual,
}

/// A two-valued answer, stored verbatim as `"Yes"` / `"No"`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum YesNo {
  Yes,
  #[default]
  No,
}

impl YesNo {
  pub fn is_yes(self) -> bool { matches!(self, Self::Yes) }
}

impl From<bool> for YesNo {
  fn from(b: bool) -> Self { if b { Self::Yes } else { Self::No } }
}

// ─── Notes ───────────────────────────────────────────────────────────────────

/// A free-text remark attached to a supplier. Notes are never edited or
/// removed once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
  pub id:        Uuid,
  pub text:      String,
  pub user:      String,
  pub timestamp: DateTime<Utc>,
}

impl Note {
  pub fn new(text: impl Into<String>, user: impl Into<String>, at: DateTime<Utc>) -> Self {
    Self {
      id:        Uuid::new_v4(),
      text:      text.into(),
      user:      user.into(),
      timestamp: at,
    }
  }
}

// ─── Supplier ────────────────────────────────────────────────────────────────

/// One compliance-tracked supplier.
///
/// Missing fields default on deserialisation; collections saved by earlier
/// revisions of the tracker carry only the name, contact and document fields,
/// and those suppliers always required all three documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Supplier {
  pub id:                    SupplierId,
  pub supplier_name:         String,
  pub contact_info:          String,
  pub supplier_type:         SupplierType,
  pub is_new_supplier:       YesNo,
  pub labour_involved:       YesNo,
  pub setup_in_qflow:        YesNo,
  pub insurance_liability:   String,
  pub gst_number:            String,
  pub wcb_clearance:         String,
  /// Set once, when the supplier first becomes completed while set up in
  /// QFlow. Never advanced afterwards.
  pub last_compliance_check: Option<DateTime<Utc>>,
  pub priority:              bool,
  pub notes:                 Vec<Note>,
  /// Derived by [`crate::compliance::evaluate_completed`]; never set directly.
  pub completed:             bool,
  pub last_modified_time:    DateTime<Utc>,
  pub last_modified_user:    String,
}

impl Default for Supplier {
  fn default() -> Self {
    let mut supplier = Self {
      id:                    SupplierId::default(),
      supplier_name:         String::new(),
      contact_info:          String::new(),
      supplier_type:         SupplierType::default(),
      is_new_supplier:       YesNo::default(),
      labour_involved:       YesNo::default(),
      setup_in_qflow:        YesNo::default(),
      insurance_liability:   String::new(),
      gst_number:            String::new(),
      wcb_clearance:         String::new(),
      last_compliance_check: None,
      priority:              false,
      notes:                 Vec::new(),
      completed:             false,
      last_modified_time:    DateTime::<Utc>::UNIX_EPOCH,
      last_modified_user:    String::new(),
    };
    SupplierDraft::default().apply_to(&mut supplier);
    supplier
  }
}

impl Supplier {
  /// Build a fresh record from a draft. `completed` is left for
  /// [`crate::compliance::on_save`] to derive.
  pub fn from_draft(
    id: SupplierId,
    draft: SupplierDraft,
    user: &str,
    now: DateTime<Utc>,
  ) -> Self {
    let mut supplier = Self {
      id,
      last_modified_time: now,
      last_modified_user: user.to_owned(),
      ..Self::default()
    };
    draft.apply_to(&mut supplier);
    supplier
  }

  /// The editable subset of this record.
  pub fn draft(&self) -> SupplierDraft {
    SupplierDraft {
      supplier_name:       self.supplier_name.clone(),
      contact_info:        self.contact_info.clone(),
      supplier_type:       self.supplier_type,
      is_new_supplier:     self.is_new_supplier,
      labour_involved:     self.labour_involved,
      setup_in_qflow:      self.setup_in_qflow,
      insurance_liability: self.insurance_liability.clone(),
      gst_number:          self.gst_number.clone(),
      wcb_clearance:       self.wcb_clearance.clone(),
      priority:            self.priority,
    }
  }
}

// ─── Draft ───────────────────────────────────────────────────────────────────

/// The fields a user may edit directly. Identity, derived state, notes and
/// modification stamps are owned by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupplierDraft {
  pub supplier_name:       String,
  pub contact_info:        String,
  pub supplier_type:       SupplierType,
  pub is_new_supplier:     YesNo,
  pub labour_involved:     YesNo,
  pub setup_in_qflow:      YesNo,
  pub insurance_liability: String,
  pub gst_number:          String,
  pub wcb_clearance:       String,
  pub priority:            bool,
}

impl Default for SupplierDraft {
  fn default() -> Self {
    Self {
      supplier_name:       String::new(),
      contact_info:        String::new(),
      supplier_type:       SupplierType::Company,
      is_new_supplier:     YesNo::Yes,
      labour_involved:     YesNo::Yes,
      setup_in_qflow:      YesNo::No,
      insurance_liability: String::new(),
      gst_number:          String::new(),
      wcb_clearance:       String::new(),
      priority:            false,
    }
  }
}

impl SupplierDraft {
  /// Overwrite the editable fields of `supplier` with this draft.
  pub fn apply_to(self, supplier: &mut Supplier) {
    supplier.supplier_name = self.supplier_name;
    supplier.contact_info = self.contact_info;
    supplier.supplier_type = self.supplier_type;
    supplier.is_new_supplier = self.is_new_supplier;
    supplier.labour_involved = self.labour_involved;
    supplier.setup_in_qflow = self.setup_in_qflow;
    supplier.insurance_liability = self.insurance_liability;
    supplier.gst_number = self.gst_number;
    supplier.wcb_clearance = self.wcb_clearance;
    supplier.priority = self.priority;
  }
}

// ─── Envelope ────────────────────────────────────────────────────────────────

/// The unit of persistence: the whole collection plus bookkeeping stamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Envelope {
  pub suppliers:   Vec<Supplier>,
  /// Calendar day on which the daily backup last ran. Also accepts the
  /// `"Mon Jun 10 2024"` form; unreadable values load as `None`.
  #[serde(deserialize_with = "lenient_date")]
  pub last_backup: Option<NaiveDate>,
  pub last_saved:  Option<DateTime<Utc>>,
}

impl Envelope {
  pub fn to_json(&self) -> crate::Result<String> { Ok(serde_json::to_string(self)?) }

  pub fn from_json(s: &str) -> crate::Result<Self> { Ok(serde_json::from_str(s)?) }
}

fn lenient_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
  let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
  Ok(raw.as_ref().and_then(serde_json::Value::as_str).and_then(|s| {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
      .or_else(|_| NaiveDate::parse_from_str(s, "%a %b %d %Y"))
      .ok()
  }))
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn legacy_record_deserialises_with_defaults() {
    let json = r#"{
      "id": 1718000000000,
      "supplierName": "Acme",
      "contactInfo": "acme@example.com",
      "insuranceLiability": "",
      "gstNumber": "",
      "wcbClearance": "",
      "lastModifiedTime": "2024-06-10T12:00:00Z",
      "lastModifiedUser": "sam",
      "completed": false
    }"#;
    let s: Supplier = serde_json::from_str(json).unwrap();
    assert_eq!(s.id, SupplierId(1_718_000_000_000));
    assert_eq!(s.supplier_name, "Acme");
    assert_eq!(s.supplier_type, SupplierType::Company);
    assert_eq!(s.labour_involved, YesNo::Yes);
    assert!(s.notes.is_empty());
    assert!(s.last_compliance_check.is_none());
  }

  #[test]
  fn fractional_ids_are_floored() {
    let json = r#"{"suppliers":[
      {"id":1718000000000.37,"supplierName":"Acme"},
      {"id":1718000000000.81,"supplierName":"Birch"},
      {"id":"1718000000005","supplierName":"Cedar"}
    ]}"#;
    let envelope = Envelope::from_json(json).unwrap();
    let ids: Vec<_> = envelope.suppliers.iter().map(|s| s.id).collect();
    assert_eq!(ids, [
      SupplierId(1_718_000_000_000),
      SupplierId(1_718_000_000_000),
      SupplierId(1_718_000_000_005),
    ]);
    assert!(Envelope::from_json(r#"{"suppliers":[{"id":"abc"}]}"#).is_err());
  }

  #[test]
  fn last_backup_accepts_browser_date_strings() {
    let iso = Envelope::from_json(r#"{"suppliers":[],"lastBackup":"2024-06-10"}"#).unwrap();
    assert_eq!(iso.last_backup, NaiveDate::from_ymd_opt(2024, 6, 10));

    let browser = Envelope::from_json(r#"{"suppliers":[],"lastBackup":"Mon Jun 10 2024"}"#).unwrap();
    assert_eq!(browser.last_backup, NaiveDate::from_ymd_opt(2024, 6, 10));

    let junk = Envelope::from_json(r#"{"suppliers":[],"lastBackup":"yesterday"}"#).unwrap();
    assert_eq!(junk.last_backup, None);

    let null = Envelope::from_json(r#"{"lastBackup":null}"#).unwrap();
    assert_eq!(null.last_backup, None);

    let back = Envelope::from_json(&browser.to_json().unwrap()).unwrap();
    assert_eq!(back.last_backup, browser.last_backup);
  }

  #[test]
  fn camel_case_field_names() {
    let s = Supplier::from_draft(
      SupplierId(7),
      SupplierDraft::default(),
      "sam",
      DateTime::<Utc>::UNIX_EPOCH,
    );
    let v = serde_json::to_value(&s).unwrap();
    assert!(v.get("supplierName").is_some());
    assert!(v.get("setupInQflow").is_some());
    assert_eq!(v["labourInvolved"], "Yes");
    assert_eq!(v["id"], 7);
  }

  #[test]
  fn enum_strings_parse_case_insensitively() {
    assert_eq!(YesNo::from_str("yes").unwrap(), YesNo::Yes);
    assert_eq!(SupplierType::from_str("INDIVIDUAL").unwrap(), SupplierType::Individual);
    assert!(YesNo::from_str("maybe").is_err());
    assert_eq!(YesNo::No.to_string(), "No");
  }
}
