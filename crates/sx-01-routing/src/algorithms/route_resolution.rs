//! # Route Resolution Algorithm
//!
//! Finds the route key of a single-table, multi-table or insert-from-query
//! statement.
//!
//! Priority, highest first:
//! 1. an equality predicate on a route field (table order outranks predicate
//!    order in multi-table statements);
//! 2. an explicit index attached to a table reference;
//! 3. the same rules applied to derived tables (sub-queries), in table order.
//!
//! When several sibling sub-queries could supply a route the first one wins.

use crate::domain::{
    Predicate, RouteError, RouteKey, RouteLevel, Statement, SubQuery, TableItem, TableRef,
};

/// Resolve the route key of a non-batch statement.
pub fn resolve_route(statement: &Statement, level: RouteLevel) -> Result<RouteKey, RouteError> {
    let found = match statement {
        Statement::Single(s) => route_single(&s.table, &s.predicates, level),
        Statement::Multi(s) => route_tables(&s.tables, &s.predicates, level),
        Statement::SubQueryInsert(s) => route_sub_query(&s.sub_query, level)
            .or_else(|| s.table.explicit_index.map(RouteKey::Index)),
        Statement::Batch(b) => return Err(RouteError::BatchStatement(b.table.name().to_string())),
    };

    found.ok_or(RouteError::NotFound {
        statement: statement.shape(),
        level,
    })
}

/// First equality predicate on one of `table`'s route fields, in predicate
/// order. NULL operands never route.
pub fn find_predicate_route(
    table: &TableRef,
    predicates: &[Predicate],
    level: RouteLevel,
) -> Option<RouteKey> {
    predicates.iter().find_map(|predicate| match predicate {
        Predicate::Equal { column, value }
            if !value.is_null()
                && table.is_referenced_by(column.table.as_deref())
                && table.meta.is_route_field(level, &column.field) =>
        {
            Some(RouteKey::Value {
                level,
                table: table.name().to_string(),
                field: column.field.clone(),
                value: value.clone(),
            })
        }
        _ => None,
    })
}

fn route_single(table: &TableRef, predicates: &[Predicate], level: RouteLevel) -> Option<RouteKey> {
    find_predicate_route(table, predicates, level).or_else(|| table.explicit_index.map(RouteKey::Index))
}

fn route_tables(tables: &[TableItem], predicates: &[Predicate], level: RouteLevel) -> Option<RouteKey> {
    let plain = || {
        tables.iter().filter_map(|item| match item {
            TableItem::Table(table) => Some(table),
            TableItem::SubQuery(_) => None,
        })
    };

    if let Some(key) = plain().find_map(|table| find_predicate_route(table, predicates, level)) {
        return Some(key);
    }

    if let Some(index) = plain().find_map(|table| table.explicit_index) {
        return Some(RouteKey::Index(index));
    }

    tables.iter().find_map(|item| match item {
        TableItem::SubQuery(sub_query) => route_sub_query(sub_query, level),
        TableItem::Table(_) => None,
    })
}

fn route_sub_query(sub_query: &SubQuery, level: RouteLevel) -> Option<RouteKey> {
    route_tables(&sub_query.tables, &sub_query.predicates, level)
}
