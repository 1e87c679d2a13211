//! Compliance rules: completeness and recheck staleness.
//!
//! Every function here is pure. The current instant is always passed in by the
//! caller so the rules can be evaluated against a fixed clock.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::supplier::{Supplier, YesNo};

/// Days counted as one month for recheck timing.
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Elapsed months at which a recheck becomes due.
pub const DUE_SOON_MONTHS: f64 = 11.0;

/// Elapsed months at which a compliance check has lapsed.
pub const EXPIRED_MONTHS: f64 = 12.0;

// ─── Recheck status ──────────────────────────────────────────────────────────

/// How stale a completed supplier's last compliance check is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecheckStatus {
  Expired,
  DueSoon,
  Ok,
  /// Not tracked: incomplete, not set up in QFlow, or never stamped.
  None,
}

impl RecheckStatus {
  /// Sort rank: `Expired < DueSoon < Ok < None`.
  pub fn rank(self) -> u8 {
    match self {
      Self::Expired => 0,
      Self::DueSoon => 1,
      Self::Ok => 2,
      Self::None => 3,
    }
  }
}

impl PartialOrd for RecheckStatus {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for RecheckStatus {
  fn cmp(&self, other: &Self) -> Ordering { self.rank().cmp(&other.rank()) }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// A supplier is complete when no labour is involved, or when all three
/// compliance documents are on file.
pub fn evaluate_completed(record: &Supplier) -> bool {
  if record.labour_involved == YesNo::No {
    return true;
  }
  [
    &record.insurance_liability,
    &record.gst_number,
    &record.wcb_clearance,
  ]
  .iter()
  .all(|doc| !doc.trim().is_empty())
}

/// Fractional months elapsed between `since` and `now`, using 30-day months.
pub fn elapsed_months(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
  let days = (now - since).num_milliseconds() as f64 / 86_400_000.0;
  days / DAYS_PER_MONTH
}

/// Classify the age of a supplier's last compliance check.
pub fn evaluate_recheck_status(record: &Supplier, now: DateTime<Utc>) -> RecheckStatus {
  if !record.completed || !record.setup_in_qflow.is_yes() {
    return RecheckStatus::None;
  }
  let Some(last_check) = record.last_compliance_check else {
    return RecheckStatus::None;
  };

  let months = elapsed_months(last_check, now);
  if months >= EXPIRED_MONTHS {
    RecheckStatus::Expired
  } else if months >= DUE_SOON_MONTHS {
    RecheckStatus::DueSoon
  } else {
    RecheckStatus::Ok
  }
}

/// Derive the computed fields of `record` before it is stored.
///
/// `previous` is the stored version being replaced, if any. Its
/// `last_compliance_check` is authoritative: once stamped the date never moves,
/// and it is not cleared when the supplier later regresses to incomplete.
pub fn on_save(
  mut record: Supplier,
  previous: Option<&Supplier>,
  now: DateTime<Utc>,
) -> Supplier {
  if let Some(prev) = previous {
    record.last_compliance_check = prev.last_compliance_check;
  }

  record.completed = evaluate_completed(&record);

  if record.completed
    && record.setup_in_qflow.is_yes()
    && record.last_compliance_check.is_none()
  {
    record.last_compliance_check = Some(now);
  }

  record
}
