//! Filter / sort / paginate over the in-memory supplier collection.
//!
//! Pipeline:
//!   &[Supplier]
//!     └─ search text        → substring match on name/contact/documents
//!          └─ filters       → ANDed exact-match predicates
//!               └─ sort     → stable, direction flips the comparator
//!                    └─ page → 1-based fixed-size window
//!
//! [`run`] is a pure function of its inputs. [`ViewState`] carries criteria
//! between requests and owns the page-reset rule.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  compliance::{RecheckStatus, evaluate_recheck_status},
  supplier::{Supplier, SupplierType, YesNo},
};

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 50;

// ─── Criteria ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionFilter {
  Completed,
  Incomplete,
}

/// Categorical filters. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
  pub status:        Option<CompletionFilter>,
  pub supplier_type: Option<SupplierType>,
  pub new_supplier:  Option<YesNo>,
  pub priority:      Option<bool>,
  pub recheck:       Option<RecheckStatus>,
}

impl Filters {
  fn matches(&self, supplier: &Supplier, recheck: RecheckStatus) -> bool {
    let status_ok = match self.status {
      Some(CompletionFilter::Completed) => supplier.completed,
      Some(CompletionFilter::Incomplete) => !supplier.completed,
      None => true,
    };
    status_ok
      && self.supplier_type.is_none_or(|t| supplier.supplier_type == t)
      && self.new_supplier.is_none_or(|n| supplier.is_new_supplier == n)
      && self.priority.is_none_or(|p| supplier.priority == p)
      && self.recheck.is_none_or(|r| recheck == r)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
  #[default]
  Name,
  Completion,
  Type,
  NewSupplier,
  Priority,
  Recheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  #[default]
  Asc,
  Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortSpec {
  pub key:       SortKey,
  pub direction: Direction,
}

/// A 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
  pub index: usize,
  pub size:  usize,
}

impl Default for PageRequest {
  fn default() -> Self { Self { index: 1, size: DEFAULT_PAGE_SIZE } }
}

/// Everything needed to derive the visible subset of suppliers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierQuery {
  pub search:  String,
  pub filters: Filters,
  /// `None` keeps collection order.
  pub sort:    Option<SortSpec>,
  pub page:    PageRequest,
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// A supplier together with its recheck status as of the query instant.
#[derive(Debug, Clone, Serialize)]
pub struct Row<'a> {
  #[serde(flatten)]
  pub supplier: &'a Supplier,
  pub recheck:  RecheckStatus,
}

/// One window of the filtered and sorted collection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<'a> {
  pub items:         Vec<Row<'a>>,
  /// The page actually returned, after clamping.
  pub page:          usize,
  pub page_size:     usize,
  pub page_count:    usize,
  pub total_matches: usize,
}

// ─── Stages ──────────────────────────────────────────────────────────────────

/// Case-insensitive substring match over the searchable text fields.
pub fn matches_search(supplier: &Supplier, needle_lower: &str) -> bool {
  if needle_lower.is_empty() {
    return true;
  }
  [
    &supplier.supplier_name,
    &supplier.contact_info,
    &supplier.insurance_liability,
    &supplier.gst_number,
    &supplier.wcb_clearance,
  ]
  .iter()
  .any(|field| field.to_lowercase().contains(needle_lower))
}

/// Apply search and filters, preserving collection order.
pub fn filter<'a>(
  suppliers: &'a [Supplier],
  search: &str,
  filters: &Filters,
  now: DateTime<Utc>,
) -> Vec<Row<'a>> {
  let needle = search.trim().to_lowercase();
  suppliers
    .iter()
    .filter(|s| matches_search(s, &needle))
    .map(|s| Row { supplier: s, recheck: evaluate_recheck_status(s, now) })
    .filter(|row| filters.matches(row.supplier, row.recheck))
    .collect()
}

fn compare_names(a: &str, b: &str) -> Ordering {
  a.to_lowercase()
    .cmp(&b.to_lowercase())
    .then_with(|| a.cmp(b))
}

fn label<T: AsRef<str>>(value: &T) -> &str { value.as_ref() }

fn compare(key: SortKey, a: &Row<'_>, b: &Row<'_>) -> Ordering {
  let (x, y) = (a.supplier, b.supplier);
  match key {
    SortKey::Name => compare_names(&x.supplier_name, &y.supplier_name),
    // `true` first when ascending.
    SortKey::Completion => y.completed.cmp(&x.completed),
    SortKey::Type => label(&x.supplier_type).cmp(label(&y.supplier_type)),
    SortKey::NewSupplier => label(&x.is_new_supplier).cmp(label(&y.is_new_supplier)),
    SortKey::Priority => y.priority.cmp(&x.priority),
    SortKey::Recheck => a.recheck.cmp(&b.recheck),
  }
}

/// Stable sort; equal keys keep their prior relative order in both
/// directions.
pub fn sort(rows: &mut [Row<'_>], spec: SortSpec) {
  rows.sort_by(|a, b| {
    let ord = compare(spec.key, a, b);
    match spec.direction {
      Direction::Asc => ord,
      Direction::Desc => ord.reverse(),
    }
  });
}

/// Number of pages needed for `total` rows; at least one.
pub fn page_count(total: usize, size: usize) -> usize { total.div_ceil(size.max(1)).max(1) }

/// Evaluate `query` against `suppliers` as of `now`.
pub fn run<'a>(
  suppliers: &'a [Supplier],
  query: &SupplierQuery,
  now: DateTime<Utc>,
) -> Page<'a> {
  let mut rows = filter(suppliers, &query.search, &query.filters, now);
  if let Some(spec) = query.sort {
    sort(&mut rows, spec);
  }

  let size = query.page.size.max(1);
  let total = rows.len();
  let pages = page_count(total, size);
  let page = query.page.index.clamp(1, pages);
  let start = (page - 1) * size;

  let items = rows.into_iter().skip(start).take(size).collect();

  Page {
    items,
    page,
    page_size: size,
    page_count: pages,
    total_matches: total,
  }
}

// ─── View state ──────────────────────────────────────────────────────────────

/// Query criteria retained between renders.
///
/// Changing the search text or any filter returns to page 1; changing the
/// sort keeps the current page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
  query: SupplierQuery,
}

impl ViewState {
  pub fn new(page_size: usize) -> Self {
    Self {
      query: SupplierQuery {
        page: PageRequest { index: 1, size: page_size.max(1) },
        ..SupplierQuery::default()
      },
    }
  }

  pub fn query(&self) -> &SupplierQuery { &self.query }

  pub fn set_search(&mut self, search: impl Into<String>) {
    let search = search.into();
    if search != self.query.search {
      self.query.search = search;
      self.query.page.index = 1;
    }
  }

  pub fn set_filters(&mut self, filters: Filters) {
    if filters != self.query.filters {
      self.query.filters = filters;
      self.query.page.index = 1;
    }
  }

  pub fn set_sort(&mut self, sort: Option<SortSpec>) { self.query.sort = sort; }

  pub fn set_page(&mut self, index: usize) { self.query.page.index = index.max(1); }
}
