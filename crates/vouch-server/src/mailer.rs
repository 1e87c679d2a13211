//! Report delivery through a transactional-email HTTP endpoint.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;
use vouch_core::report::ComplianceReport;

use crate::error::Error;

/// Where and to whom the compliance report is sent.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
  /// URL accepting a JSON `POST` of [`OutgoingMail`].
  pub endpoint:  String,
  /// Sent as a bearer token when present.
  #[serde(default)]
  pub api_key:   Option<String>,
  pub from:      String,
  pub recipient: String,
}

#[derive(Debug, Serialize)]
pub struct OutgoingMail<'a> {
  pub from:    &'a str,
  pub to:      [&'a str; 1],
  pub subject: String,
  pub text:    String,
  pub report:  &'a ComplianceReport,
}

/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ReportMailer {
  client: Client,
  config: MailConfig,
}

impl ReportMailer {
  pub fn new(config: MailConfig) -> Result<Self, Error> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  pub fn recipient(&self) -> &str { &self.config.recipient }

  /// Post `report` to the configured endpoint. Non-2xx responses are errors.
  pub async fn send(&self, report: &ComplianceReport) -> Result<(), Error> {
    let mail = OutgoingMail {
      from: &self.config.from,
      to: [&self.config.recipient],
      subject: report.subject(),
      text: report.render_text(),
      report,
    };

    let mut req = self.client.post(&self.config.endpoint).json(&mail);
    if let Some(key) = &self.config.api_key {
      req = req.bearer_auth(key);
    }
    req.send().await?.error_for_status()?;

    info!(recipient = %self.config.recipient, "sent compliance report");
    Ok(())
  }
}
