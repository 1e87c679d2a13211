//! Aggregate compliance report, used for the dashboard and the daily email.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  compliance::{RecheckStatus, evaluate_recheck_status},
  supplier::Supplier,
};

/// Counts and attention lists over the whole collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
  pub generated_at:     DateTime<Utc>,
  pub total:            usize,
  pub completed:        usize,
  pub incomplete:       usize,
  /// Share of completed suppliers, rounded to one decimal place.
  pub progress_percent: f64,
  pub new_suppliers:    usize,
  pub existing:         usize,
  pub setup_in_qflow:   usize,
  pub not_in_qflow:     usize,
  pub priority:         usize,
  /// Names of suppliers whose compliance check has lapsed.
  pub expired:          Vec<String>,
  /// Names of suppliers whose recheck falls due within a month.
  pub due_soon:         Vec<String>,
}

impl ComplianceReport {
  pub fn build(suppliers: &[Supplier], now: DateTime<Utc>) -> Self {
    let total = suppliers.len();
    let completed = suppliers.iter().filter(|s| s.completed).count();
    let new_suppliers = suppliers.iter().filter(|s| s.is_new_supplier.is_yes()).count();
    let setup_in_qflow = suppliers.iter().filter(|s| s.setup_in_qflow.is_yes()).count();

    let mut expired = Vec::new();
    let mut due_soon = Vec::new();
    for s in suppliers {
      match evaluate_recheck_status(s, now) {
        RecheckStatus::Expired => expired.push(s.supplier_name.clone()),
        RecheckStatus::DueSoon => due_soon.push(s.supplier_name.clone()),
        RecheckStatus::Ok | RecheckStatus::None => {}
      }
    }

    let progress_percent = if total == 0 {
      0.0
    } else {
      (completed as f64 / total as f64 * 1000.0).round() / 10.0
    };

    Self {
      generated_at: now,
      total,
      completed,
      incomplete: total - completed,
      progress_percent,
      new_suppliers,
      existing: total - new_suppliers,
      setup_in_qflow,
      not_in_qflow: total - setup_in_qflow,
      priority: suppliers.iter().filter(|s| s.priority).count(),
      expired,
      due_soon,
    }
  }

  pub fn subject(&self) -> String {
    format!(
      "Supplier compliance report {}",
      self.generated_at.format("%Y-%m-%d")
    )
  }

  /// Plain-text body for the email report.
  pub fn render_text(&self) -> String { self.to_string() }
}

impl fmt::Display for ComplianceReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", self.subject())?;
    writeln!(f)?;
    writeln!(f, "Total suppliers:     {}", self.total)?;
    writeln!(f, "Completed:           {} ({:.1}%)", self.completed, self.progress_percent)?;
    writeln!(f, "Incomplete:          {}", self.incomplete)?;
    writeln!(f, "New / existing:      {} / {}", self.new_suppliers, self.existing)?;
    writeln!(
      f,
      "Set up in QFlow:     {} (not set up: {})",
      self.setup_in_qflow, self.not_in_qflow
    )?;
    writeln!(f, "Priority:            {}", self.priority)?;

    for (title, names) in [("Expired", &self.expired), ("Due soon", &self.due_soon)] {
      writeln!(f)?;
      writeln!(f, "{title} ({}):", names.len())?;
      if names.is_empty() {
        writeln!(f, "  none")?;
      }
      for name in names {
        writeln!(f, "  - {name}")?;
      }
    }
    Ok(())
  }
}
