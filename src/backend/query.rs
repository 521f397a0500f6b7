//! Minimal PostgREST query builder.

use url::Url;

use super::BackendError;

/// Sort direction for `order=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn as_str(self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

/// A `select=*` query against one table.
#[derive(Debug, Clone)]
pub struct TableQuery {
    table: String,
    filters: Vec<(String, String)>,
    order: Option<(String, Order)>,
    limit: Option<u32>,
}

impl TableQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Add an equality filter (`column=eq.value`).
    pub fn eq(mut self, column: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.filters
            .push((column.into(), format!("eq.{}", value.as_ref())));
        self
    }

    pub fn order(mut self, column: impl Into<String>, order: Order) -> Self {
        self.order = Some((column.into(), order));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Resolve this query against the `rest/v1/` base URL.
    pub fn to_url(&self, rest_base: &Url) -> Result<Url, BackendError> {
        let mut url = rest_base
            .join(&self.table)
            .map_err(|e| BackendError::Request(format!("invalid table `{}`: {}", self.table, e)))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");
            for (column, filter) in &self.filters {
                pairs.append_pair(column, filter);
            }
            if let Some((column, order)) = &self.order {
                pairs.append_pair("order", &format!("{}.{}", column, order.as_str()));
            }
            if let Some(limit) = self.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }

        Ok(url)
    }
}
