//! Table query description shared by every [`TableStore`](crate::TableStore).
//!
//! Mirrors the gateway's REST surface: `select(columns)`, `order(field, direction)`
//! and `eq(field, value)` filters. Writes reuse the same filters to scope rows.
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    pub table: String,
    pub columns: String,
    pub filters: Vec<(String, Value)>,
    pub order: Option<(String, Direction)>,
}

impl TableQuery {
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn order(mut self, field: &str, direction: Direction) -> Self {
        self.order = Some((field.to_string(), direction));
        self
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    /// Query-string pairs understood by the REST table endpoint.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.columns.clone())];

        if let Some((field, direction)) = &self.order {
            params.push(("order".to_string(), format!("{field}.{}", direction.as_str())));
        }

        params.extend(self.filter_params());
        params
    }

    /// Filters only, for writes where `select`/`order` carry no meaning.
    pub fn filter_params(&self) -> Vec<(String, String)> {
        self.filters
            .iter()
            .map(|(field, value)| (field.clone(), format!("eq.{}", literal(value))))
            .collect()
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.filters
            .iter()
            .all(|(field, value)| row.get(field).is_some_and(|cell| loosely_equal(cell, value)))
    }
}

pub fn literal(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

// `eq.42` matches both a numeric 42 and a text "42" column on the gateway side.
fn loosely_equal(cell: &Value, value: &Value) -> bool {
    cell == value || literal(cell) == literal(value)
}
