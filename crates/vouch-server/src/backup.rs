//! The daily backup job: CSV file, report email, `lastBackup` stamp.

use std::{path::PathBuf, sync::Arc, time::Duration};

use chrono::{DateTime, Local, Utc};
use tracing::{info, warn};
use vouch_api::Tracker;
use vouch_core::{
  report::ComplianceReport,
  schedule::BackupSchedule,
  store::{DocumentStore, LocalStore},
};

use crate::{error::Error, mailer::ReportMailer};

/// How often the schedule is checked.
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

pub struct BackupJob<R, L> {
  pub tracker:  Arc<Tracker<R, L>>,
  pub schedule: BackupSchedule,
  pub dir:      PathBuf,
  pub mailer:   Option<ReportMailer>,
}

impl<R, L> BackupJob<R, L>
where
  R: DocumentStore + 'static,
  L: LocalStore + 'static,
{
  /// Run the backup if it is due at `now`. Returns the file written, if any.
  ///
  /// A failed email does not prevent the backup from being recorded.
  pub async fn run_once(&self, now: DateTime<Local>) -> Result<Option<PathBuf>, Error> {
    let snapshot = self.tracker.snapshot()?;
    if !self.schedule.should_trigger(now.naive_local(), snapshot.last_backup) {
      return Ok(None);
    }

    let today = now.date_naive();
    let csv = vouch_csv::encode(&snapshot.suppliers)?;
    tokio::fs::create_dir_all(&self.dir).await?;
    let path = self.dir.join(BackupSchedule::file_name(today));
    tokio::fs::write(&path, csv).await?;

    if let Some(mailer) = &self.mailer {
      let report = ComplianceReport::build(&snapshot.suppliers, now.with_timezone(&Utc));
      if let Err(e) = mailer.send(&report).await {
        warn!(error = %e, recipient = mailer.recipient(), "failed to email daily report");
      }
    }

    self.tracker.mark_backup(today)?;
    info!(path = %path.display(), suppliers = snapshot.suppliers.len(), "daily backup written");
    Ok(Some(path))
  }

  /// Poll the schedule forever.
  pub async fn run(self) {
    let mut interval = tokio::time::interval(POLL_INTERVAL);
    loop {
      interval.tick().await;
      if let Err(e) = self.run_once(Local::now()).await {
        warn!(error = %e, "daily backup failed");
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, TimeZone};
  use vouch_core::controller::{Actor, Command, Controller};
  use vouch_core::supplier::SupplierDraft;
  use vouch_store_sqlite::{SqliteDocumentStore, SqliteLocalStore};
  use vouch_sync::{Reconciler, SyncConfig};

  use super::*;

  async fn job(dir: PathBuf) -> BackupJob<SqliteDocumentStore, SqliteLocalStore> {
    let remote = SqliteDocumentStore::open_in_memory().await.unwrap();
    let local = SqliteLocalStore::open_in_memory().unwrap();
    let sync = Arc::new(Reconciler::new(remote, local, SyncConfig::default()));
    let loaded = sync.load().await;
    let tracker = Arc::new(Tracker::new(Controller::new(loaded.envelope), sync, 50));
    let draft = SupplierDraft { supplier_name: "Acme".into(), ..SupplierDraft::default() };
    tracker
      .apply(Command::Add(draft), &Actor::new("sam").unwrap(), Utc::now())
      .unwrap();
    BackupJob { tracker, schedule: BackupSchedule::default(), dir, mailer: None }
  }

  fn at(h: u32, m: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 4, 2, h, m, 5).single().unwrap()
  }

  #[tokio::test]
  async fn writes_once_per_day_at_the_scheduled_minute() {
    let dir = std::env::temp_dir().join(format!("vouch-backup-{}", std::process::id()));
    let job = job(dir.clone()).await;

    assert_eq!(job.run_once(at(16, 59)).await.unwrap(), None);

    let path = job.run_once(at(17, 0)).await.unwrap().unwrap();
    assert_eq!(path, dir.join("supplier_backup_2025-04-02.csv"));
    let csv = tokio::fs::read_to_string(&path).await.unwrap();
    assert!(csv.starts_with("\"Supplier Name\""));
    assert!(csv.contains("\"Acme\""));
    assert_eq!(
      job.tracker.snapshot().unwrap().last_backup,
      NaiveDate::from_ymd_opt(2025, 4, 2)
    );

    assert_eq!(job.run_once(at(17, 0)).await.unwrap(), None);
    tokio::fs::remove_dir_all(&dir).await.unwrap();
  }
}
