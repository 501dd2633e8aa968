//! Lowers the SELECT subset of [`crate::ast`] onto the operator tree (§4.15).
//!
//! This is a demonstration of the consumption contract, not a query
//! planner: it handles a single base table, a WHERE clause that is a
//! conjunction of column-vs-literal comparisons, ORDER BY, and LIMIT/OFFSET.
//! Joins, subqueries, GROUP BY/HAVING, set operations, and anything under a
//! `WithStatement` are rejected with [`EngineError::Usage`] rather than
//! silently dropped — an upstream planner that needs more than this should
//! walk the operator builders on [`Table`] directly instead of going
//! through `compile_select`.

use crate::ast::{BinaryOp, Expr, Literal, OrderByItem, SelectStatement, Statement, TableRef};
use crate::error::{EngineError, Result};
use crate::order::OrderDef;
use crate::table::Table;
use crate::value::Scalar;

/// Resolves a named table reference to its in-memory handle. Real
/// deployments would back this with a catalog; this crate's scope ends at
/// the operator tree, so the caller supplies the mapping.
pub trait TableCatalog {
    fn resolve(&self, name: &str) -> Option<Table>;
}

/// Compiles a top-level [`Statement`] into a [`Table`], provided it is a
/// bare `Select` (optionally wrapped in a non-recursive single-CTE `With`
/// whose body is itself a bare `Select`). Anything else — set operations,
/// DML, DDL — is out of scope for this lowering and returns
/// [`EngineError::Usage`].
pub fn compile_statement(statement: &Statement, catalog: &dyn TableCatalog) -> Result<Table> {
    match statement {
        Statement::Select(select) => compile_select(select, catalog),
        Statement::With(with) if with.ctes.is_empty() => {
            compile_statement(&with.body, catalog)
        }
        _ => Err(EngineError::unsupported_statement()),
    }
}

/// Compiles a single SELECT onto the operator tree. See the module doc for
/// exactly which shapes are accepted.
pub fn compile_select(select: &SelectStatement, catalog: &dyn TableCatalog) -> Result<Table> {
    if !select.joins.is_empty() {
        return Err(EngineError::unsupported_statement());
    }
    if !select.group_by.is_empty() || select.having.is_some() {
        return Err(EngineError::unsupported_statement());
    }

    let TableRef::Named { name, .. } = &select.from else {
        return Err(EngineError::unsupported_statement());
    };
    let base = catalog
        .resolve(name)
        .ok_or_else(|| EngineError::unknown_column(name))?;

    let mut table = match &select.selection {
        Some(expr) => compile_where(&base, expr)?,
        None => base,
    };

    if !select.order_by.is_empty() {
        let keys = select
            .order_by
            .iter()
            .map(compile_order_item)
            .collect::<Result<Vec<_>>>()?;
        table = table.order(keys);
    }

    if let Some(limit_expr) = &select.limit {
        table = table.limit(compile_usize_literal(limit_expr)?);
    }
    if let Some(offset_expr) = &select.offset {
        table = table.offset(compile_usize_literal(offset_expr)?);
    }

    if select.distinct {
        table = table.distinct();
    }

    if !is_select_star(select) {
        let owned: Vec<String> = select
            .columns
            .iter()
            .map(column_name_of)
            .collect::<Result<Vec<_>>>()?;
        let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
        table = table.columns(&refs)?;
    }

    Ok(table)
}

fn is_select_star(select: &SelectStatement) -> bool {
    matches!(
        select.columns.as_slice(),
        [crate::ast::SelectItem::Wildcard]
    )
}

fn column_name_of(item: &crate::ast::SelectItem) -> Result<String> {
    match item {
        crate::ast::SelectItem::Expr {
            expr: Expr::Column(parts),
            ..
        } => Ok(parts.last().cloned().unwrap_or_default()),
        _ => Err(EngineError::unsupported_statement()),
    }
}

/// Lowers a WHERE expression that is a conjunction (nested `AND`) of
/// `column <op> literal` comparisons into successive filter calls.
/// Anything richer (`OR`, subqueries, function calls) is rejected — an
/// upstream caller who needs an `OR` should build it with
/// [`Table::or`] directly instead of going through this lowering.
fn compile_where(base: &Table, expr: &Expr) -> Result<Table> {
    match expr {
        Expr::Binary(lhs, BinaryOp::And, rhs) => {
            let left = compile_where(base, lhs)?;
            compile_where(&left, rhs)
        }
        Expr::Binary(lhs, op, rhs) => compile_comparison(base, lhs, *op, rhs),
        _ => Err(EngineError::unsupported_statement()),
    }
}

fn compile_comparison(base: &Table, lhs: &Expr, op: BinaryOp, rhs: &Expr) -> Result<Table> {
    let Expr::Column(parts) = lhs else {
        return Err(EngineError::unsupported_statement());
    };
    let column = parts.last().cloned().unwrap_or_default();
    let value = compile_literal(rhs)?;
    match op {
        BinaryOp::Eq => base.eq(&column, value),
        BinaryOp::Lt => base.lt(&column, value),
        BinaryOp::Lte => base.lte(&column, value),
        BinaryOp::Gt => base.gt(&column, value),
        BinaryOp::Gte => base.gte(&column, value),
        BinaryOp::Like => match value {
            Scalar::Text(pattern) => base.like(&column, pattern),
            _ => Err(EngineError::unsupported_statement()),
        },
        _ => Err(EngineError::unsupported_statement()),
    }
}

fn compile_literal(expr: &Expr) -> Result<Scalar> {
    match expr {
        Expr::Literal(Literal::Null) => Ok(Scalar::Null),
        Expr::Literal(Literal::Int(i)) => Ok(Scalar::Int(*i)),
        Expr::Literal(Literal::Float(f)) => Ok(Scalar::Float(*f)),
        Expr::Literal(Literal::Text(s)) => Ok(Scalar::Text(s.clone())),
        Expr::Literal(Literal::Bool(b)) => Ok(Scalar::Int(i64::from(*b))),
        _ => Err(EngineError::unsupported_statement()),
    }
}

fn compile_usize_literal(expr: &Expr) -> Result<usize> {
    match compile_literal(expr)? {
        Scalar::Int(i) if i >= 0 => Ok(i as usize),
        _ => Err(EngineError::malformed_literal("expected a non-negative integer")),
    }
}

fn compile_order_item(item: &OrderByItem) -> Result<OrderDef> {
    let Expr::Column(parts) = &item.expr else {
        return Err(EngineError::unsupported_statement());
    };
    let column = parts.last().cloned().unwrap_or_default();
    Ok(OrderDef {
        column: column.into(),
        direction: item.direction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{SelectItem, SelectStatement};
    use crate::row::Row;
    use crate::schema::{ColumnDescriptor, ColumnType, IndexHint, Schema};

    struct SingleTableCatalog(Table);

    impl TableCatalog for SingleTableCatalog {
        fn resolve(&self, name: &str) -> Option<Table> {
            (name == "users").then(|| self.0.clone())
        }
    }

    fn users() -> Table {
        let schema = Schema::new(vec![
            ColumnDescriptor::new("id", ColumnType::Int).with_index_hint(IndexHint::Primary),
            ColumnDescriptor::new("dept", ColumnType::Text),
            ColumnDescriptor::new("age", ColumnType::Int),
        ]);
        Table::base_with_rows(
            schema,
            vec![
                Row::new()
                    .with("id", Scalar::Int(1))
                    .with("dept", Scalar::Text("Eng".into()))
                    .with("age", Scalar::Int(30)),
                Row::new()
                    .with("id", Scalar::Int(2))
                    .with("dept", Scalar::Text("Sales".into()))
                    .with("age", Scalar::Int(45)),
                Row::new()
                    .with("id", Scalar::Int(3))
                    .with("dept", Scalar::Text("Eng".into()))
                    .with("age", Scalar::Int(22)),
            ],
        )
        .unwrap()
    }

    fn select_all(from: &str) -> SelectStatement {
        SelectStatement {
            distinct: false,
            columns: vec![SelectItem::Wildcard],
            from: TableRef::Named {
                name: from.into(),
                alias: None,
            },
            joins: vec![],
            selection: None,
            group_by: vec![],
            having: None,
            order_by: vec![],
            limit: None,
            offset: None,
        }
    }

    #[test]
    fn compiles_where_and_order_and_limit() {
        let catalog = SingleTableCatalog(users());
        let mut select = select_all("users");
        select.selection = Some(Expr::Binary(
            Box::new(Expr::Column(vec!["dept".into()])),
            BinaryOp::Eq,
            Box::new(Expr::Literal(Literal::Text("Eng".into()))),
        ));
        select.order_by = vec![OrderByItem {
            expr: Expr::Column(vec!["age".into()]),
            direction: crate::order::OrderDirection::Asc,
        }];
        select.limit = Some(Expr::Literal(Literal::Int(1)));

        let table = compile_select(&select, &catalog).unwrap();
        let rows: Vec<_> = table.iterate().unwrap().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1.get("age"), Some(&Scalar::Int(22)));
    }

    #[test]
    fn rejects_join() {
        let catalog = SingleTableCatalog(users());
        let mut select = select_all("users");
        select.joins.push(crate::ast::JoinClause {
            kind: crate::ast::JoinKind::Inner,
            source: TableRef::Named {
                name: "orders".into(),
                alias: None,
            },
            on: None,
        });
        assert!(compile_select(&select, &catalog).is_err());
    }

    #[test]
    fn unknown_table_errors() {
        let catalog = SingleTableCatalog(users());
        let select = select_all("missing");
        assert!(compile_select(&select, &catalog).is_err());
    }
}
