//! # Domain Entities
//!
//! Parsed statement shapes as seen by the router.
//!
//! Statements are a tagged union: each variant carries only what its own
//! routing algorithm reads. Richer SQL structure (projections, ordering,
//! non-equality predicates) stays with the dialect layer.

use shared_types::{ParamRow, ShardIndex, Value};
use std::fmt;
use std::sync::Arc;

use super::value_objects::RouteLevel;

/// Schema configuration of one logical table.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct TableMeta {
    /// Logical table name.
    pub name: String,
    /// Fields that select the shard (data-source level).
    pub route_fields: Vec<String>,
    /// Fields that select the physical table inside a shard.
    pub table_route_fields: Vec<String>,
}

impl TableMeta {
    /// Create a table with no route fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the data-source level route fields.
    pub fn with_route_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.route_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the table level route fields.
    pub fn with_table_route_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.table_route_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Route fields configured for `level`, in configuration order.
    pub fn route_fields_for(&self, level: RouteLevel) -> &[String] {
        match level {
            RouteLevel::DataSource => &self.route_fields,
            RouteLevel::Table => &self.table_route_fields,
        }
    }

    /// Check if `field` is a route field at `level`.
    pub fn is_route_field(&self, level: RouteLevel, field: &str) -> bool {
        self.route_fields_for(level).iter().any(|f| f == field)
    }
}

/// A table occurrence in a statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRef {
    /// Shared schema configuration.
    pub meta: Arc<TableMeta>,
    /// Alias used by qualified predicates.
    pub alias: Option<String>,
    /// Index attached to the statement itself (literal table reference).
    pub explicit_index: Option<ShardIndex>,
}

impl TableRef {
    /// Reference `meta` without alias or explicit index.
    pub fn new(meta: Arc<TableMeta>) -> Self {
        Self {
            meta,
            alias: None,
            explicit_index: None,
        }
    }

    /// Set the alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Attach an explicit shard/table index.
    pub fn with_explicit_index(mut self, index: ShardIndex) -> Self {
        self.explicit_index = Some(index);
        self
    }

    /// Logical table name.
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Check if a column qualifier refers to this occurrence.
    ///
    /// Unqualified columns match any table; the dialect layer has already
    /// rejected ambiguous ones.
    pub fn is_referenced_by(&self, qualifier: Option<&str>) -> bool {
        match qualifier {
            None => true,
            Some(q) => self.alias.as_deref() == Some(q) || self.meta.name == q,
        }
    }
}

/// A column reference in a predicate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnRef {
    /// Table name or alias qualifier.
    pub table: Option<String>,
    /// Field name.
    pub field: String,
}

impl ColumnRef {
    /// Unqualified column.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            table: None,
            field: field.into(),
        }
    }

    /// Column qualified by table name or alias.
    pub fn qualified(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            field: field.into(),
        }
    }
}

/// A predicate from the statement's flattened WHERE / ON list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    /// `column = value` with a bound value.
    Equal {
        /// Left-hand column.
        column: ColumnRef,
        /// Bound right-hand value.
        value: Value,
    },
    /// Any other predicate shape; invisible to routing.
    Other,
}

impl Predicate {
    /// Build `field = value` on an unqualified column.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equal {
            column: ColumnRef::new(field),
            value: value.into(),
        }
    }

    /// Build `table.field = value`.
    pub fn qualified_eq(
        table: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self::Equal {
            column: ColumnRef::qualified(table, field),
            value: value.into(),
        }
    }
}

/// DML / query kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// SELECT.
    Select,
    /// INSERT.
    Insert,
    /// UPDATE.
    Update,
    /// DELETE.
    Delete,
}

impl StatementKind {
    /// Check if the statement only reads.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Select)
    }
}

/// An item in a multi-table statement's table list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableItem {
    /// A plain table occurrence.
    Table(TableRef),
    /// A derived table (sub-query in FROM / USING).
    SubQuery(SubQuery),
}

/// A sub-query with its own table and predicate lists.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SubQuery {
    /// Alias of the derived table.
    pub alias: Option<String>,
    /// Tables in statement order.
    pub tables: Vec<TableItem>,
    /// Flattened predicates.
    pub predicates: Vec<Predicate>,
}

/// SELECT / UPDATE / DELETE against exactly one table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SingleTableStatement {
    /// Statement kind.
    pub kind: StatementKind,
    /// Target table.
    pub table: TableRef,
    /// Flattened predicates.
    pub predicates: Vec<Predicate>,
}

/// Joins and multi-table deletes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiTableStatement {
    /// Statement kind.
    pub kind: StatementKind,
    /// Tables and derived tables in statement order.
    pub tables: Vec<TableItem>,
    /// Flattened predicates.
    pub predicates: Vec<Predicate>,
}

/// Named-parameter batch (inserts, or updates/deletes with per-row binds).
#[derive(Clone, Debug)]
pub struct BatchStatement {
    /// Statement kind.
    pub kind: StatementKind,
    /// Target table.
    pub table: TableRef,
    /// One parameter carrier per row, in caller order.
    pub rows: Vec<ParamRow>,
}

/// INSERT ... SELECT.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubQueryInsertStatement {
    /// Insert target.
    pub table: TableRef,
    /// Source query.
    pub sub_query: SubQuery,
}

/// A statement as handed over by the dialect layer.
#[derive(Clone, Debug)]
pub enum Statement {
    /// Single-table statement.
    Single(SingleTableStatement),
    /// Multi-table statement.
    Multi(MultiTableStatement),
    /// Batch statement.
    Batch(BatchStatement),
    /// Insert from a sub-query.
    SubQueryInsert(SubQueryInsertStatement),
}

impl Statement {
    /// Statement kind.
    pub fn kind(&self) -> StatementKind {
        match self {
            Self::Single(s) => s.kind,
            Self::Multi(s) => s.kind,
            Self::Batch(s) => s.kind,
            Self::SubQueryInsert(_) => StatementKind::Insert,
        }
    }

    /// Shape label used in errors and logs.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Single(_) => "single-table",
            Self::Multi(_) => "multi-table",
            Self::Batch(_) => "batch",
            Self::SubQueryInsert(_) => "sub-query-insert",
        }
    }

    /// Check if this is a batch statement.
    pub fn is_batch(&self) -> bool {
        matches!(self, Self::Batch(_))
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(s) => write!(f, "{:?} {}", s.kind, s.table.name()),
            Self::Multi(s) => write!(f, "{:?} over {} tables", s.kind, s.tables.len()),
            Self::Batch(s) => write!(f, "{:?} batch {} x{}", s.kind, s.table.name(), s.rows.len()),
            Self::SubQueryInsert(s) => write!(f, "Insert {} from sub-query", s.table.name()),
        }
    }
}
