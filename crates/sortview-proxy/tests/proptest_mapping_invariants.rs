//! Property-based invariant tests for the sorting proxy.
//!
//! 1. Every mapping is a permutation and its two tables are inverses
//! 2. Unsorted proxies are the identity
//! 3. Sorted rows are ordered by the comparator, reversed for descending
//! 4. `map_to_source(map_to_proxy(h)) == h` at every depth
//! 5. Source-order tie-break keeps equal keys in source order
//! 6. After any source edit the proxy shows the edited rows, freshly sorted

use std::rc::Rc;

use proptest::prelude::*;
use sortview_model::{Model, ModelIndex, Role, TreeModel, TreeRow, Variant};
use sortview_proxy::{
    CaseInsensitive, ProxyConfig, SortComparator, SortOrder, SortingProxyModel, TieBreak,
};

// ── Strategies ──────────────────────────────────────────────────────────

fn cell_strategy() -> impl Strategy<Value = (String, i64)> {
    ("[a-cA-C]{0,3}", -4i64..4)
}

fn row_strategy() -> impl Strategy<Value = TreeRow> {
    let leaf = cell_strategy()
        .prop_map(|(s, n)| TreeRow::new([Variant::from(s), Variant::from(n)]));
    leaf.prop_recursive(2, 30, 6, |inner| {
        (cell_strategy(), prop::collection::vec(inner, 0..6)).prop_map(|((s, n), children)| {
            TreeRow::new([Variant::from(s), Variant::from(n)]).with_children(children)
        })
    })
}

fn forest_strategy() -> impl Strategy<Value = Vec<TreeRow>> {
    prop::collection::vec(row_strategy(), 0..12)
}

#[derive(Debug, Clone)]
enum Edit {
    Append(String),
    Remove(usize),
    Rename(usize, String),
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        "[a-dA-D]{1,3}".prop_map(Edit::Append),
        (0usize..16).prop_map(Edit::Remove),
        (0usize..16, "[a-dA-D]{1,3}").prop_map(|(row, s)| Edit::Rename(row, s)),
    ]
}

fn order_strategy() -> impl Strategy<Value = SortOrder> {
    prop_oneof![Just(SortOrder::Ascending), Just(SortOrder::Descending)]
}

fn build(rows: &[TreeRow]) -> Rc<TreeModel> {
    let model = Rc::new(TreeModel::new(["label", "n"]));
    for row in rows {
        model
            .append_row(&ModelIndex::invalid(), row.clone())
            .expect("append to root");
    }
    model
}

/// Every valid source parent in the tree, root first.
fn parents(model: &TreeModel) -> Vec<ModelIndex> {
    let mut out = vec![ModelIndex::invalid()];
    let mut cursor = 0;
    while cursor < out.len() {
        let parent = out[cursor];
        for row in 0..model.row_count(&parent) {
            out.push(model.index(row, 0, &parent));
        }
        cursor += 1;
    }
    out
}

fn sorted(source: &Rc<TreeModel>, column: usize, order: SortOrder, tie_break: TieBreak) -> SortingProxyModel {
    let config = ProxyConfig::default()
        .with_tie_break(tie_break)
        .with_initial_sort(column, order);
    SortingProxyModel::with_config(source.clone() as Rc<dyn Model>, config).expect("valid sort")
}

proptest! {
    #[test]
    fn mappings_are_bijections(
        rows in forest_strategy(),
        column in 0usize..2,
        order in order_strategy(),
    ) {
        let source = build(&rows);
        let proxy = sorted(&source, column, order, TieBreak::Unspecified);
        for parent in parents(&source) {
            let id = proxy.build_mapping(&parent);
            let mapping = proxy.mapping(id).expect("live mapping");
            let n = source.row_count(&parent);
            prop_assert_eq!(mapping.len(), n);

            let mut seen = mapping.source_rows().to_vec();
            seen.sort_unstable();
            prop_assert_eq!(seen, (0..n).collect::<Vec<_>>());
            for proxy_row in 0..n {
                let source_row = mapping.source_rows()[proxy_row];
                prop_assert_eq!(mapping.proxy_rows()[source_row], proxy_row);
            }
        }
    }

    #[test]
    fn unsorted_proxy_is_identity(rows in forest_strategy()) {
        let source = build(&rows);
        let proxy = SortingProxyModel::new(source.clone() as Rc<dyn Model>);
        for parent in parents(&source) {
            let proxy_parent = proxy.map_to_proxy(&parent);
            for row in 0..proxy.row_count(&proxy_parent) {
                let mapped = proxy.map_to_source(&proxy.index(row, 1, &proxy_parent));
                prop_assert_eq!(mapped.row(), row);
                prop_assert_eq!(mapped, source.index(row, 1, &parent));
            }
        }
    }

    #[test]
    fn rows_follow_comparator(
        rows in forest_strategy(),
        column in 0usize..2,
        order in order_strategy(),
    ) {
        let source = build(&rows);
        let proxy = sorted(&source, column, order, TieBreak::Unspecified);
        for parent in parents(&source) {
            let proxy_parent = proxy.map_to_proxy(&parent);
            let keys: Vec<Variant> = (0..proxy.row_count(&proxy_parent))
                .map(|row| proxy.data(&proxy.index(row, column, &proxy_parent), Role::Sort))
                .collect();
            for pair in keys.windows(2) {
                let ordering = CaseInsensitive.compare(&pair[0], &pair[1]);
                match order {
                    SortOrder::Ascending => prop_assert!(ordering.is_le(), "{:?} after {:?}", pair[1], pair[0]),
                    SortOrder::Descending => prop_assert!(ordering.is_ge(), "{:?} before {:?}", pair[0], pair[1]),
                }
            }
        }
    }

    #[test]
    fn translation_round_trips(
        rows in forest_strategy(),
        column in 0usize..2,
        order in order_strategy(),
    ) {
        let source = build(&rows);
        let proxy = sorted(&source, column, order, TieBreak::Unspecified);
        for parent in parents(&source) {
            for row in 0..source.row_count(&parent) {
                for c in 0..2 {
                    let cell = source.index(row, c, &parent);
                    let proxied = proxy.map_to_proxy(&cell);
                    prop_assert!(proxied.is_valid());
                    prop_assert_eq!(proxy.map_to_source(&proxied), cell);
                    prop_assert_eq!(proxy.map_to_proxy(&proxy.map_to_source(&proxied)), proxied);
                    prop_assert_eq!(proxy.parent_index(&proxied), proxy.map_to_proxy(&parent));
                }
            }
        }
    }

    #[test]
    fn parents_addressed_through_any_column_round_trip(
        rows in forest_strategy(),
        column in 0usize..2,
        parent_column in 0usize..2,
        order in order_strategy(),
    ) {
        let source = build(&rows);
        let proxy = sorted(&source, column, order, TieBreak::Unspecified);
        let parent_count = parents(&source).len();
        for parent in parents(&source) {
            let addressed = if parent.is_valid() {
                let sibling = source.index(parent.row(), parent_column, &source.parent_index(&parent));
                proxy.map_to_proxy(&sibling)
            } else {
                parent
            };
            for row in 0..proxy.row_count(&addressed) {
                for c in 0..2 {
                    let handle = proxy.index(row, c, &addressed);
                    prop_assert!(handle.is_valid());
                    prop_assert_eq!(proxy.map_to_proxy(&proxy.map_to_source(&handle)), handle);
                    prop_assert_eq!(proxy.parent_index(&handle), proxy.map_to_proxy(&parent));
                }
            }
        }
        prop_assert!(proxy.mapping_count() <= parent_count);
    }

    #[test]
    fn source_order_breaks_ties(
        rows in forest_strategy(),
        order in order_strategy(),
    ) {
        let source = build(&rows);
        let proxy = sorted(&source, 0, order, TieBreak::SourceOrder);
        for parent in parents(&source) {
            let id = proxy.build_mapping(&parent);
            let mapping = proxy.mapping(id).expect("live mapping");
            let key = |row: usize| source.data(&source.index(row, 0, &parent), Role::Sort);
            for pair in mapping.source_rows().windows(2) {
                if CaseInsensitive.compare(&key(pair[0]), &key(pair[1])).is_eq() {
                    prop_assert!(pair[0] < pair[1]);
                }
            }
        }
    }

    #[test]
    fn edits_are_reflected_after_invalidation(
        edits in prop::collection::vec(edit_strategy(), 1..24),
        order in order_strategy(),
    ) {
        let source = Rc::new(TreeModel::new(["label"]));
        let proxy = sorted(&source, 0, order, TieBreak::SourceOrder);
        let root = ModelIndex::invalid();
        let mut shadow: Vec<String> = Vec::new();
        for edit in edits {
            match edit {
                Edit::Append(name) => {
                    source.append_row(&root, TreeRow::new([name.as_str()])).unwrap();
                    shadow.push(name);
                }
                Edit::Remove(row) if row < shadow.len() => {
                    source.remove_row(&root, row).unwrap();
                    shadow.remove(row);
                }
                Edit::Rename(row, name) if row < shadow.len() => {
                    source.set_data(&source.index(row, 0, &root), name.as_str()).unwrap();
                    shadow[row] = name;
                }
                Edit::Remove(_) | Edit::Rename(..) => continue,
            }
            prop_assert_eq!(proxy.mapping_count(), 0);

            let mut expected = shadow.clone();
            expected.sort_by(|a, b| {
                let ordering = CaseInsensitive.compare(&Variant::from(a.as_str()), &Variant::from(b.as_str()));
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
            let shown: Vec<String> = (0..proxy.row_count(&root))
                .map(|row| proxy.data(&proxy.index(row, 0, &root), Role::Display).to_string())
                .collect();
            prop_assert_eq!(shown, expected);
        }
    }
}
