//! Projection/filter builder state.
//!
//! Holds the columns a user picked, the ordered filter list and the row
//! limit. Every edit goes through `&mut self`; rendering happens separately
//! through [`ToSql`](crate::render::ToSql).

use serde::Serialize;
use tracing::debug;

use crate::error::{ForgeError, ForgeResult};
use crate::filter::{FilterCondition, FilterEdit, FilterId, Operator};
use crate::schema::{InputSchema, OutputSchema};

/// Default row limit.
pub const DEFAULT_LIMIT: &str = "100";

/// Field state of the projection builder.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectionQuery {
    #[serde(skip)]
    input: InputSchema,
    #[serde(skip)]
    output: OutputSchema,
    selected: Vec<String>,
    filters: Vec<FilterCondition>,
    /// Kept as typed; not validated.
    limit: String,
    #[serde(skip)]
    next_id: u64,
}

impl ProjectionQuery {
    /// Create an empty builder: required columns selected, no filters.
    pub fn new(input: InputSchema, output: OutputSchema) -> Self {
        let selected = output.required_columns.clone();
        Self {
            input,
            output,
            selected,
            filters: Vec::new(),
            limit: DEFAULT_LIMIT.to_string(),
            next_id: 1,
        }
    }

    pub fn input_schema(&self) -> &InputSchema {
        &self.input
    }

    pub fn output_schema(&self) -> &OutputSchema {
        &self.output
    }

    /// Selected columns in selection order.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Filters in insertion order.
    pub fn filters(&self) -> &[FilterCondition] {
        &self.filters
    }

    pub fn limit(&self) -> &str {
        &self.limit
    }

    pub fn is_selected(&self, column: &str) -> bool {
        self.selected.iter().any(|c| c == column)
    }

    /// Toggle an output column and return whether it is selected afterwards.
    ///
    /// Required columns cannot be removed: toggling one leaves the selection
    /// untouched. Optional columns are appended or removed.
    pub fn toggle_column(&mut self, column: &str) -> ForgeResult<bool> {
        if self.output.is_required(column) {
            debug!(column, "ignoring toggle of required column");
            return Ok(true);
        }
        if !self.output.is_optional(column) {
            return Err(ForgeError::ColumnNotSelectable(column.to_string()));
        }

        if let Some(pos) = self.selected.iter().position(|c| c == column) {
            self.selected.remove(pos);
            debug!(column, "deselected column");
            Ok(false)
        } else {
            self.selected.push(column.to_string());
            debug!(column, "selected column");
            Ok(true)
        }
    }

    /// Select an optional column if it is not selected yet.
    pub fn select_column(&mut self, column: &str) -> ForgeResult<()> {
        if !self.is_selected(column) {
            self.toggle_column(column)?;
        }
        Ok(())
    }

    /// Append a filter with default fields (`user_id = ''`) and return its id.
    pub fn add_filter(&mut self) -> FilterId {
        let id = self.fresh_id();
        self.filters.push(FilterCondition {
            id: id.clone(),
            column: "user_id".to_string(),
            operator: Operator::Eq,
            value: String::new(),
        });
        debug!(%id, count = self.filters.len(), "added filter");
        id
    }

    /// Append a fully specified filter and return its id.
    pub fn push_filter(
        &mut self,
        column: &str,
        operator: Operator,
        value: impl Into<String>,
    ) -> ForgeResult<FilterId> {
        self.input.require_column(column)?;
        let id = self.fresh_id();
        self.filters.push(FilterCondition {
            id: id.clone(),
            column: column.to_string(),
            operator,
            value: value.into(),
        });
        debug!(%id, column, %operator, "pushed filter");
        Ok(id)
    }

    /// Remove the filter with the given id, keeping the order of the rest.
    pub fn remove_filter(&mut self, id: &FilterId) -> Option<FilterCondition> {
        let pos = self.filters.iter().position(|f| &f.id == id)?;
        debug!(%id, "removed filter");
        Some(self.filters.remove(pos))
    }

    /// Drop every filter.
    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    /// Edit one field of an existing filter in place.
    pub fn update_filter(&mut self, id: &FilterId, edit: FilterEdit) -> ForgeResult<()> {
        if let FilterEdit::Column(column) = &edit {
            self.input.require_column(column)?;
        }
        let filter = self
            .filters
            .iter_mut()
            .find(|f| &f.id == id)
            .ok_or_else(|| ForgeError::UnknownFilter(id.to_string()))?;

        match edit {
            FilterEdit::Column(column) => filter.column = column,
            FilterEdit::Operator(operator) => filter.operator = operator,
            FilterEdit::Value(value) => filter.value = value,
        }
        debug!(%id, "updated filter");
        Ok(())
    }

    /// Point the query at a differently named source table with the same columns.
    pub fn set_table(&mut self, table: impl Into<String>) {
        self.input.table_name = table.into();
    }

    /// Set the row limit as typed.
    pub fn set_limit(&mut self, limit: impl ToString) {
        self.limit = limit.to_string();
    }

    fn fresh_id(&mut self) -> FilterId {
        loop {
            let candidate = FilterId(self.next_id.to_string());
            self.next_id += 1;
            if !self.filters.iter().any(|f| f.id == candidate) {
                return candidate;
            }
        }
    }
}

impl Default for ProjectionQuery {
    /// The builder as first opened: required columns selected, one
    /// `event_type = 'purchase'` filter and a limit of 100.
    fn default() -> Self {
        let mut query = Self::new(InputSchema::user_events(), OutputSchema::reporting_standard());
        query.filters.push(FilterCondition {
            id: FilterId::from("1"),
            column: "event_type".to_string(),
            operator: Operator::Eq,
            value: "purchase".to_string(),
        });
        query.next_id = 2;
        query
    }
}
