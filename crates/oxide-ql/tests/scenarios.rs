//! End-to-end scenarios over a ten-row `users` table (§8).
//!
//! These exercise the operator tree the way a consumer actually would:
//! build a pipeline of builder calls, iterate it, and check the resulting
//! rows — rather than poking at individual node internals.

use oxide_ql::row::Row;
use oxide_ql::schema::{ColumnDescriptor, ColumnType, IndexHint, Schema};
use oxide_ql::table::Table;
use oxide_ql::value::Scalar;

fn users() -> Table {
    let schema = Schema::new(vec![
        ColumnDescriptor::new("id", ColumnType::Int).with_index_hint(IndexHint::Primary),
        ColumnDescriptor::new("dept", ColumnType::Text).with_index_hint(IndexHint::Index),
        ColumnDescriptor::new("age", ColumnType::Int),
    ]);
    let depts = [
        "Eng", "Sales", "Eng", "Mkt", "Sales", "Eng", "Mkt", "Sales", "Eng", "Mkt",
    ];
    let ages = [30, 45, 22, 38, 29, 51, 26, 33, 40, 19];
    let rows = (1..=10)
        .map(|id| {
            Row::new()
                .with("id", Scalar::Int(id))
                .with("dept", Scalar::Text(depts[(id - 1) as usize].into()))
                .with("age", Scalar::Int(ages[(id - 1) as usize]))
        })
        .collect();
    Table::base_with_rows(schema, rows).unwrap()
}

fn orders() -> Table {
    let schema = Schema::new(vec![
        ColumnDescriptor::new("id", ColumnType::Int).with_index_hint(IndexHint::Primary),
        ColumnDescriptor::new("user_id", ColumnType::Int).with_index_hint(IndexHint::Index),
        ColumnDescriptor::new("total", ColumnType::Int),
    ]);
    let rows = vec![
        Row::new()
            .with("id", Scalar::Int(100))
            .with("user_id", Scalar::Int(2))
            .with("total", Scalar::Int(50)),
        Row::new()
            .with("id", Scalar::Int(101))
            .with("user_id", Scalar::Int(5))
            .with("total", Scalar::Int(75)),
        Row::new()
            .with("id", Scalar::Int(102))
            .with("user_id", Scalar::Int(2))
            .with("total", Scalar::Int(20)),
    ];
    Table::base_with_rows(schema, rows).unwrap()
}

fn ids(table: &Table) -> Vec<i64> {
    table
        .iterate()
        .unwrap()
        .map(|(_, row)| match row.get("id") {
            Some(Scalar::Int(i)) => *i,
            _ => panic!("row missing id"),
        })
        .collect()
}

// filter-then-paginate sees only the matching rows; paginate-then-filter
// freezes the first-five window before a filter narrows it, with no
// explicit `.barrier()` needed — a filter built on an already-paginated
// table wraps rather than pushes through (§4.6).
#[test]
fn filter_before_limit_vs_limit_before_barrier() {
    let filter_first = users().eq("dept", "Sales").unwrap().limit(5);
    assert_eq!(ids(&filter_first), vec![2, 5, 8]);

    let window_first = users().limit(5).eq("dept", "Sales").unwrap();
    assert_eq!(ids(&window_first), vec![2, 5]);
}

#[test]
fn order_desc_then_limit_takes_top_k() {
    let top3 = users().order(vec![oxide_ql::order::OrderDef::desc("age")]).limit(3);
    assert_eq!(ids(&top3), vec![6, 2, 9]);
}

#[test]
fn except_then_filter_excludes_then_narrows() {
    let excluded = users().in_("id", vec![Scalar::Int(2), Scalar::Int(4)]).unwrap();
    let remaining = users()
        .except(&excluded)
        .unwrap()
        .eq("dept", "Eng")
        .unwrap();
    assert_eq!(ids(&remaining), vec![1, 3, 6, 9]);
}

#[test]
fn inner_equi_join_on_user_id() {
    let u = users().with_alias(Some("u"), Default::default());
    let o = orders().with_alias(Some("o"), Default::default());
    let joined = u
        .join_inner(&o, vec![("u.id".into(), "o.user_id".into())])
        .unwrap();
    let mut totals: Vec<i64> = joined
        .iterate()
        .unwrap()
        .map(|(_, row)| match row.get("o.total") {
            Some(Scalar::Int(i)) => *i,
            _ => panic!("row missing o.total"),
        })
        .collect();
    totals.sort_unstable();
    assert_eq!(totals, vec![20, 50, 75]);
}

#[test]
fn concat_unions_two_disjoint_slices_positionally() {
    let sales_first_two = users().eq("dept", "Sales").unwrap().limit(2);
    let mkt = users().eq("dept", "Mkt").unwrap();
    let combined = sales_first_two.concat(&mkt).unwrap();
    assert_eq!(ids(&combined), vec![2, 5, 4, 7, 10]);
}

#[test]
fn contradictory_range_filters_prove_empty() {
    let impossible = users().gt("age", 40).unwrap().lt("age", 20).unwrap();
    assert_eq!(ids(&impossible), Vec::<i64>::new());
    assert_eq!(impossible.count().unwrap(), 0);
}

#[test]
fn exists_finds_users_with_orders() {
    let with_orders = users().exists(&orders(), vec![("id".into(), "user_id".into())]);
    assert_eq!(ids(&with_orders), vec![2, 5]);
}

#[test]
fn not_exists_finds_users_without_orders() {
    let without_orders = users().not_exists(&orders(), vec![("id".into(), "user_id".into())]);
    assert_eq!(ids(&without_orders), vec![1, 3, 4, 6, 7, 8, 9, 10]);
}

#[test]
fn distinct_after_projection_collapses_duplicate_departments() {
    let depts = users().columns(&["dept"]).unwrap().distinct();
    let mut seen: Vec<String> = depts
        .iterate()
        .unwrap()
        .map(|(_, row)| match row.get("dept") {
            Some(Scalar::Text(s)) => s.clone(),
            _ => panic!("row missing dept"),
        })
        .collect();
    seen.sort();
    assert_eq!(seen, vec!["Eng", "Mkt", "Sales"]);
}
