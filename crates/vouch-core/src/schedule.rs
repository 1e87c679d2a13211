//! The daily backup trigger.
//!
//! The server polls once a minute and asks [`BackupSchedule::should_trigger`]
//! whether the backup is due. The same-day guard keeps it to at most one run
//! per calendar day even if the poll fires twice within the trigger minute.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSchedule {
  /// Local hour of day, `0..24`.
  pub hour:   u32,
  /// Local minute, `0..60`.
  pub minute: u32,
}

impl Default for BackupSchedule {
  fn default() -> Self { Self { hour: 17, minute: 0 } }
}

impl BackupSchedule {
  /// `true` when `now_local` falls in the trigger minute and no backup has
  /// run today yet.
  pub fn should_trigger(&self, now_local: NaiveDateTime, last_backup: Option<NaiveDate>) -> bool {
    now_local.hour() == self.hour
      && now_local.minute() == self.minute
      && last_backup != Some(now_local.date())
  }

  /// Download name for the CSV written on `day`.
  pub fn file_name(day: NaiveDate) -> String {
    format!("supplier_backup_{}.csv", day.format("%Y-%m-%d"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 4, 2).unwrap().and_hms_opt(h, m, 30).unwrap()
  }

  #[test]
  fn triggers_only_in_the_trigger_minute() {
    let s = BackupSchedule::default();
    assert!(s.should_trigger(at(17, 0), None));
    assert!(!s.should_trigger(at(17, 1), None));
    assert!(!s.should_trigger(at(16, 59), None));
    assert!(!s.should_trigger(at(5, 0), None));
  }

  #[test]
  fn same_day_guard() {
    let s = BackupSchedule::default();
    let today = at(17, 0).date();
    assert!(!s.should_trigger(at(17, 0), Some(today)));
    assert!(s.should_trigger(at(17, 0), today.pred_opt()));
  }

  #[test]
  fn file_name_uses_iso_day() {
    assert_eq!(
      BackupSchedule::file_name(NaiveDate::from_ymd_opt(2025, 4, 2).unwrap()),
      "supplier_backup_2025-04-02.csv"
    );
  }
}
