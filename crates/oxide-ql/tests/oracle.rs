//! Randomized oracle test (§8): compares the operator tree against a small,
//! obviously-correct in-process reference evaluator over the same
//! `filter`/`order`/paginate vocabulary, rather than against an external
//! SQL engine.

use oxide_ql::order::OrderDef;
use oxide_ql::row::Row;
use oxide_ql::schema::{ColumnDescriptor, ColumnType, IndexHint, Schema};
use oxide_ql::table::Table;
use oxide_ql::value::Scalar;
use proptest::prelude::*;

const ROW_COUNT: i64 = 11;

fn base_table() -> Table {
    let schema = Schema::new(vec![
        ColumnDescriptor::new("id", ColumnType::Int).with_index_hint(IndexHint::Primary),
        ColumnDescriptor::new("val", ColumnType::Int),
    ]);
    // val = (id * 7) % 11 is a bijection on 0..11 (7 and 11 are coprime),
    // so every row has a distinct val and ORDER BY val never needs a
    // tie-break rule to produce a deterministic order.
    let rows = (0..ROW_COUNT)
        .map(|id| {
            Row::new()
                .with("id", Scalar::Int(id))
                .with("val", Scalar::Int((id * 7) % ROW_COUNT))
        })
        .collect();
    Table::base_with_rows(schema, rows).unwrap()
}

#[derive(Debug, Clone)]
enum Op {
    FilterGt(i64),
    FilterLt(i64),
    OrderAsc,
    OrderDesc,
    /// Skip `offset` then take `limit`, immediately frozen with a barrier
    /// so a later op in the sequence can't widen it back out.
    Paginate(usize, usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0i64..ROW_COUNT).prop_map(Op::FilterGt),
        (0i64..ROW_COUNT).prop_map(Op::FilterLt),
        Just(Op::OrderAsc),
        Just(Op::OrderDesc),
        (0usize..4, 1usize..9).prop_map(|(o, l)| Op::Paginate(o, l)),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 1..6).prop_filter(
        "two Paginate ops may not be adjacent: the second would edit the \
         first's barrier window in place rather than stacking on top of it",
        |ops| {
            !ops.windows(2)
                .any(|w| matches!((&w[0], &w[1]), (Op::Paginate(..), Op::Paginate(..))))
        },
    )
}

fn apply_table(table: Table, op: &Op) -> Table {
    match op {
        Op::FilterGt(t) => table.gt("val", *t).unwrap(),
        Op::FilterLt(t) => table.lt("val", *t).unwrap(),
        Op::OrderAsc => table.order(vec![OrderDef::asc("val")]),
        Op::OrderDesc => table.order(vec![OrderDef::desc("val")]),
        Op::Paginate(offset, limit) => table.offset(*offset).limit(*limit).barrier(),
    }
}

fn apply_oracle(rows: &mut Vec<(i64, i64)>, op: &Op) {
    match op {
        Op::FilterGt(t) => rows.retain(|(_, v)| v > t),
        Op::FilterLt(t) => rows.retain(|(_, v)| v < t),
        Op::OrderAsc => rows.sort_by_key(|(_, v)| *v),
        Op::OrderDesc => rows.sort_by_key(|(_, v)| std::cmp::Reverse(*v)),
        Op::Paginate(offset, limit) => {
            let start = (*offset).min(rows.len());
            let end = (offset.saturating_add(*limit)).min(rows.len());
            *rows = rows[start..end].to_vec();
        }
    }
}

proptest! {
    #[test]
    fn operator_tree_matches_naive_oracle(ops in ops_strategy()) {
        let mut table = base_table();
        let mut oracle: Vec<(i64, i64)> = (0..ROW_COUNT).map(|id| (id, (id * 7) % ROW_COUNT)).collect();

        for op in &ops {
            table = apply_table(table, op);
            apply_oracle(&mut oracle, op);
        }

        let got: Vec<i64> = table
            .iterate()
            .unwrap()
            .map(|(_, row)| match row.get("id") {
                Some(Scalar::Int(i)) => *i,
                other => panic!("expected an int id, got {other:?}"),
            })
            .collect();
        let want: Vec<i64> = oracle.iter().map(|(id, _)| *id).collect();

        prop_assert_eq!(got, want);
    }
}
