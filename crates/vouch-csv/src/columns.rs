//! Column layout of the backup CSV and header-name resolution.

/// The fifteen columns of a full backup, in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
  SupplierName,
  ContactInfo,
  SupplierType,
  NewSupplier,
  LabourInvolved,
  SetupInQflow,
  InsuranceLiability,
  GstNumber,
  WcbClearance,
  LastComplianceCheck,
  Priority,
  Notes,
  LastModifiedTime,
  LastModifiedUser,
  Completed,
}

impl Column {
  pub const ALL: [Column; 15] = [
    Column::SupplierName,
    Column::ContactInfo,
    Column::SupplierType,
    Column::NewSupplier,
    Column::LabourInvolved,
    Column::SetupInQflow,
    Column::InsuranceLiability,
    Column::GstNumber,
    Column::WcbClearance,
    Column::LastComplianceCheck,
    Column::Priority,
    Column::Notes,
    Column::LastModifiedTime,
    Column::LastModifiedUser,
    Column::Completed,
  ];

  /// Header text written on export.
  pub fn header(self) -> &'static str {
    match self {
      Column::SupplierName        => "Supplier Name",
      Column::ContactInfo         => "Contact Info",
      Column::SupplierType        => "Supplier Type",
      Column::NewSupplier         => "New Supplier",
      Column::LabourInvolved      => "Labour Involved",
      Column::SetupInQflow        => "Setup in QFlow",
      Column::InsuranceLiability  => "Insurance Liability",
      Column::GstNumber           => "GST Number",
      Column::WcbClearance        => "WCB Clearance Letter",
      Column::LastComplianceCheck => "Last Compliance Check",
      Column::Priority            => "Priority",
      Column::Notes               => "Notes",
      Column::LastModifiedTime    => "Last Modified Time",
      Column::LastModifiedUser    => "Last Modified User",
      Column::Completed           => "Completed",
    }
  }

  /// Other spellings accepted on import, already normalised.
  fn aliases(self) -> &'static [&'static str] {
    match self {
      Column::SupplierName        => &["name", "supplier"],
      Column::ContactInfo         => &["contact", "contact information"],
      Column::SupplierType        => &["type"],
      Column::NewSupplier         => &["new/existing", "new or existing", "is new supplier"],
      Column::LabourInvolved      => &["labor involved", "labour"],
      Column::SetupInQflow        => &["in qflow", "qflow", "setup in qflow?"],
      Column::InsuranceLiability  => &["insurance"],
      Column::GstNumber           => &["gst"],
      Column::WcbClearance        => &["wcb clearance", "wcb"],
      Column::LastComplianceCheck => &["last check", "compliance check"],
      Column::Priority            => &[],
      Column::Notes               => &[],
      Column::LastModifiedTime    => &["modified", "last modified"],
      Column::LastModifiedUser    => &["modified by"],
      Column::Completed           => &["status"],
    }
  }

  fn from_header(raw: &str) -> Option<Column> {
    let name = normalise(raw);
    Column::ALL
      .into_iter()
      .find(|c| normalise(c.header()) == name || c.aliases().contains(&name.as_str()))
  }
}

fn normalise(raw: &str) -> String {
  raw
    .trim_matches('\u{feff}')
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

// ─── Column map ──────────────────────────────────────────────────────────────

/// Where each known column sits in an imported file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
  positions: [Option<usize>; 15],
}

impl ColumnMap {
  /// Columns at their export positions, for files whose header is not
  /// recognised.
  pub fn positional(columns: &[Column]) -> Self {
    let mut positions = [None; 15];
    for (index, column) in columns.iter().enumerate() {
      positions[*column as usize] = Some(index);
    }
    Self { positions }
  }

  /// Resolve columns by header name. Returns `None` when no header cell names
  /// a known column. The first occurrence of a duplicated header wins.
  pub fn from_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Option<Self> {
    let mut positions = [None; 15];
    let mut any = false;
    for (index, raw) in headers.into_iter().enumerate() {
      if let Some(column) = Column::from_header(raw) {
        let slot = &mut positions[column as usize];
        if slot.is_none() {
          *slot = Some(index);
          any = true;
        }
      }
    }
    any.then_some(Self { positions })
  }

  pub fn position(&self, column: Column) -> Option<usize> { self.positions[column as usize] }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn export_headers_resolve_to_themselves() {
    let map = ColumnMap::from_headers(Column::ALL.iter().map(|c| c.header())).unwrap();
    assert_eq!(map, ColumnMap::positional(&Column::ALL));
  }

  #[test]
  fn reordered_and_aliased_headers() {
    let map = ColumnMap::from_headers(["\u{feff}GST", " contact  info ", "Supplier Name"]).unwrap();
    assert_eq!(map.position(Column::GstNumber), Some(0));
    assert_eq!(map.position(Column::ContactInfo), Some(1));
    assert_eq!(map.position(Column::SupplierName), Some(2));
    assert_eq!(map.position(Column::Notes), None);
  }

  #[test]
  fn unknown_headers_resolve_to_none() {
    assert!(ColumnMap::from_headers(["foo", "bar"]).is_none());
  }
}
