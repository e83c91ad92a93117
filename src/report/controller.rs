//! Report table state machine
//!
//! The state that the report's embedded script keeps in the browser, as an
//! explicit value. Every transition is `TableState::apply(event, rows)`;
//! [`TableController`] adds the browser-side persistence of column layout on
//! top. The script in [`super::script`] implements the same transitions.

use crate::error::{Inv365Error, Result};
use crate::report::columns::{COLUMN_COUNT, COLUMNS, Column, ENROLLED_TEXT, NOT_ENROLLED_TEXT};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const ORDER_STORAGE_KEY: &str = "inv365.columnOrder";
pub const VISIBILITY_STORAGE_KEY: &str = "inv365.columnVisibility";

/// Displayed text of one row, indexed by [`Column::index`]
pub type RowCells = [String; COLUMN_COUNT];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: Column,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnrollmentFilter {
    #[default]
    All,
    Enrolled,
    NotEnrolled,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filters {
    /// Substring searched across every visible cell
    pub global: String,
    /// Per-column substring filters
    pub columns: BTreeMap<Column, String>,
    pub enrollment: EnrollmentFilter,
    /// Accepted group tags; empty means no restriction
    pub group_tags: BTreeSet<String>,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl Filters {
    pub fn matches(&self, cells: &RowCells, visible_columns: &[Column]) -> bool {
        let global = self.global.trim();
        if !global.is_empty()
            && !visible_columns
                .iter()
                .any(|c| contains_ci(&cells[c.index()], global))
        {
            return false;
        }

        for (column, needle) in &self.columns {
            let needle = needle.trim();
            if !needle.is_empty() && !contains_ci(&cells[column.index()], needle) {
                return false;
            }
        }

        let status = cells[Column::EnrollmentStatus.index()].as_str();
        let enrollment_ok = match self.enrollment {
            EnrollmentFilter::All => true,
            EnrollmentFilter::Enrolled => status == ENROLLED_TEXT,
            EnrollmentFilter::NotEnrolled => status == NOT_ENROLLED_TEXT,
        };
        if !enrollment_ok {
            return false;
        }

        self.group_tags.is_empty() || self.group_tags.contains(&cells[Column::GroupTag.index()])
    }
}

/// User input the table reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    SetGlobalFilter(String),
    SetColumnFilter(Column, String),
    SetEnrollmentFilter(EnrollmentFilter),
    SetGroupTags(BTreeSet<String>),
    ClearFilters,
    Sort(Column),
    /// Show or hide the column at a display position
    ToggleColumn { position: usize, show: bool },
    /// Drag the column at display position `from` onto position `to`
    MoveColumn { from: usize, to: usize },
    SelectAll,
    DeselectAll,
    Reset,
}

impl TableEvent {
    fn changes_layout(&self) -> bool {
        matches!(
            self,
            TableEvent::ToggleColumn { .. }
                | TableEvent::MoveColumn { .. }
                | TableEvent::SelectAll
                | TableEvent::DeselectAll
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    /// Display order of the columns
    pub column_order: Vec<Column>,
    /// Visibility, indexed by [`Column::index`]
    pub column_visible: [bool; COLUMN_COUNT],
    pub filters: Filters,
    pub sort: Option<SortState>,
    /// Display order of all rows, filtered ones included
    pub row_order: Vec<usize>,
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

impl TableState {
    pub fn new(row_count: usize) -> Self {
        Self {
            column_order: COLUMNS.to_vec(),
            column_visible: [true; COLUMN_COUNT],
            filters: Filters::default(),
            sort: None,
            row_order: (0..row_count).collect(),
        }
    }

    pub fn is_column_visible(&self, column: Column) -> bool {
        self.column_visible[column.index()]
    }

    /// Visible columns in display order
    pub fn visible_columns(&self) -> Vec<Column> {
        self.column_order
            .iter()
            .copied()
            .filter(|c| self.is_column_visible(*c))
            .collect()
    }

    /// Indices of rows passing the filters, in display order
    pub fn visible_rows(&self, rows: &[RowCells]) -> Vec<usize> {
        let columns = self.visible_columns();
        self.row_order
            .iter()
            .copied()
            .filter(|&i| self.filters.matches(&rows[i], &columns))
            .collect()
    }

    pub fn apply(mut self, event: &TableEvent, rows: &[RowCells]) -> Self {
        match event {
            TableEvent::SetGlobalFilter(text) => self.filters.global = text.clone(),
            TableEvent::SetColumnFilter(column, text) => {
                if text.trim().is_empty() {
                    self.filters.columns.remove(column);
                } else {
                    self.filters.columns.insert(*column, text.clone());
                }
            }
            TableEvent::SetEnrollmentFilter(filter) => self.filters.enrollment = *filter,
            TableEvent::SetGroupTags(tags) => self.filters.group_tags = tags.clone(),
            TableEvent::ClearFilters => self.filters = Filters::default(),
            TableEvent::Sort(column) => {
                let direction = match self.sort {
                    Some(s) if s.column == *column => s.direction.flipped(),
                    _ => SortDirection::Ascending,
                };
                let idx = column.index();
                self.row_order
                    .sort_by(|&a, &b| compare_text(&rows[a][idx], &rows[b][idx]));
                // Descending is the exact mirror of ascending, ties included
                if direction == SortDirection::Descending {
                    self.row_order.reverse();
                }
                self.sort = Some(SortState {
                    column: *column,
                    direction,
                });
            }
            TableEvent::ToggleColumn { position, show } => {
                if let Some(column) = self.column_order.get(*position) {
                    self.column_visible[column.index()] = *show;
                }
            }
            TableEvent::MoveColumn { from, to } => {
                if *from < self.column_order.len() && *to < self.column_order.len() {
                    let column = self.column_order.remove(*from);
                    self.column_order.insert(*to, column);
                }
            }
            TableEvent::SelectAll => self.column_visible = [true; COLUMN_COUNT],
            TableEvent::DeselectAll => self.column_visible = [false; COLUMN_COUNT],
            TableEvent::Reset => return TableState::new(rows.len()),
        }
        self
    }

    /// Column ids in display order, as persisted under [`ORDER_STORAGE_KEY`]
    pub fn persisted_order(&self) -> Vec<&'static str> {
        self.column_order.iter().map(|c| c.id()).collect()
    }

    /// Visibility aligned with the current display order
    pub fn persisted_visibility(&self) -> Vec<bool> {
        self.column_order
            .iter()
            .map(|c| self.is_column_visible(*c))
            .collect()
    }

    /// Apply a stored column order; anything but a permutation of all ids is ignored
    pub fn restore_order(&mut self, ids: &[String]) -> bool {
        if ids.len() != COLUMN_COUNT {
            return false;
        }
        let order: Option<Vec<Column>> = ids.iter().map(|id| Column::from_id(id)).collect();
        let Some(order) = order else {
            return false;
        };
        let distinct: BTreeSet<_> = order.iter().collect();
        if distinct.len() != COLUMN_COUNT {
            return false;
        }
        self.column_order = order;
        true
    }

    /// Apply stored visibility positionally against the current display order
    pub fn restore_visibility(&mut self, visible: &[bool]) -> bool {
        if visible.len() != COLUMN_COUNT {
            return false;
        }
        for (column, shown) in self.column_order.iter().zip(visible) {
            self.column_visible[column.index()] = *shown;
        }
        true
    }

    /// Visible rows × visible columns as CSV, header line first.
    ///
    /// Every field is quoted and embedded quotes are doubled.
    pub fn export_csv(&self, rows: &[RowCells]) -> Result<String> {
        let columns = self.visible_columns();
        if columns.is_empty() {
            return Ok(String::new());
        }

        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(Vec::new());

        writer.write_record(columns.iter().map(|c| c.label()))?;
        for i in self.visible_rows(rows) {
            writer.write_record(columns.iter().map(|c| rows[i][c.index()].as_str()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Inv365Error::IoError(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| {
            Inv365Error::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}

/// Origin-local key/value storage, as offered by the browser
pub trait LayoutStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl LayoutStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Table state plus persisted column layout
pub struct TableController<S: LayoutStore> {
    rows: Vec<RowCells>,
    state: TableState,
    store: S,
}

impl<S: LayoutStore> TableController<S> {
    /// Build the initial state and apply any stored layout: order first, then visibility
    pub fn load(rows: Vec<RowCells>, store: S) -> Self {
        let mut state = TableState::new(rows.len());

        if let Some(ids) = store
            .get(ORDER_STORAGE_KEY)
            .and_then(|raw| serde_json::from_str::<Vec<String>>(&raw).ok())
        {
            if !state.restore_order(&ids) {
                tracing::debug!("ignoring stored column order with unexpected shape");
            }
        }

        if let Some(visible) = store
            .get(VISIBILITY_STORAGE_KEY)
            .and_then(|raw| serde_json::from_str::<Vec<bool>>(&raw).ok())
        {
            if !state.restore_visibility(&visible) {
                tracing::debug!("ignoring stored column visibility with unexpected length");
            }
        }

        Self { rows, state, store }
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn rows(&self) -> &[RowCells] {
        &self.rows
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn dispatch(&mut self, event: TableEvent) {
        let state = std::mem::replace(&mut self.state, TableState::new(0));
        self.state = state.apply(&event, &self.rows);

        if event == TableEvent::Reset {
            self.store.remove(ORDER_STORAGE_KEY);
            self.store.remove(VISIBILITY_STORAGE_KEY);
        } else if event.changes_layout() {
            self.persist();
        }
    }

    fn persist(&mut self) {
        // Serializing Vec<&str> / Vec<bool> cannot fail
        if let Ok(order) = serde_json::to_string(&self.state.persisted_order()) {
            self.store.set(ORDER_STORAGE_KEY, order);
        }
        if let Ok(visible) = serde_json::to_string(&self.state.persisted_visibility()) {
            self.store.set(VISIBILITY_STORAGE_KEY, visible);
        }
    }

    pub fn visible_row_count(&self) -> usize {
        self.state.visible_rows(&self.rows).len()
    }

    pub fn export_csv(&self) -> Result<String> {
        self.state.export_csv(&self.rows)
    }
}
