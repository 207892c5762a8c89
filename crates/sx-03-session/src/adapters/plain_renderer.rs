//! Plain Statement Renderer Adapter
//!
//! Renders a readable pseudo-SQL description with the statement's bound
//! equality values as parameters. Stands in for a real dialect.

use shared_types::{ShardIndex, SqlBatch, SqlCommand, Value};
use sx_01_routing::{BatchStatement, Predicate, Statement, SubQuery, TableItem};

use crate::domain::SessionError;
use crate::ports::outbound::StatementRenderer;

/// Placeholder renderer.
#[derive(Debug, Clone, Default)]
pub struct PlainRenderer {
    /// Fields bound per batch row. Empty means the table's route fields.
    batch_fields: Vec<String>,
}

impl PlainRenderer {
    /// Renderer binding the table's route fields for batch rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `fields`, in order, for every batch row.
    pub fn with_batch_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.batch_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    fn batch_fields_for(&self, batch: &BatchStatement) -> Vec<String> {
        if !self.batch_fields.is_empty() {
            return self.batch_fields.clone();
        }
        let meta = &batch.table.meta;
        meta.route_fields
            .iter()
            .chain(meta.table_route_fields.iter())
            .cloned()
            .collect()
    }
}

fn equality_values(predicates: &[Predicate], out: &mut Vec<Value>) {
    for predicate in predicates {
        if let Predicate::Equal { value, .. } = predicate {
            out.push(value.clone());
        }
    }
}

fn sub_query_values(sub_query: &SubQuery, out: &mut Vec<Value>) {
    for item in &sub_query.tables {
        if let TableItem::SubQuery(inner) = item {
            sub_query_values(inner, out);
        }
    }
    equality_values(&sub_query.predicates, out);
}

impl StatementRenderer for PlainRenderer {
    fn render(&self, statement: &Statement, shard: ShardIndex) -> Result<SqlCommand, SessionError> {
        let mut params = Vec::new();
        match statement {
            Statement::Single(s) => equality_values(&s.predicates, &mut params),
            Statement::Multi(s) => {
                for item in &s.tables {
                    if let TableItem::SubQuery(sub_query) = item {
                        sub_query_values(sub_query, &mut params);
                    }
                }
                equality_values(&s.predicates, &mut params);
            }
            Statement::SubQueryInsert(s) => sub_query_values(&s.sub_query, &mut params),
            Statement::Batch(b) => {
                return Err(SessionError::Render(format!(
                    "batch on {} must be rendered per sub-batch",
                    b.table.name()
                )))
            }
        }
        Ok(SqlCommand::new(
            format!("{} /* shard {} */", statement, shard),
            params,
        ))
    }

    fn render_batch(
        &self,
        batch: &BatchStatement,
        shard: ShardIndex,
        rows: &[usize],
    ) -> Result<SqlBatch, SessionError> {
        let fields = self.batch_fields_for(batch);
        let mut bound = Vec::with_capacity(rows.len());
        for &row in rows {
            let carrier = batch.rows.get(row).ok_or_else(|| {
                SessionError::Render(format!("batch row {} out of range", row))
            })?;
            bound.push(
                fields
                    .iter()
                    .map(|field| carrier.param(field).unwrap_or_default())
                    .collect(),
            );
        }
        Ok(SqlBatch {
            sql: format!(
                "{:?} {} ({}) /* shard {} */",
                batch.kind,
                batch.table.name(),
                fields.join(", "),
                shard
            ),
            rows: bound,
        })
    }
}
