//! The facade surface: prelude, unified errors, env-configured proxies.

use std::rc::Rc;

use sortview::prelude::*;
use sortview::{ModelError, ProxyError};

fn fruit() -> Rc<TreeModel> {
    let model = Rc::new(TreeModel::new(["name"]));
    for name in ["cherry", "Apple", "banana"] {
        model
            .append_row(&ModelIndex::invalid(), TreeRow::new([name]))
            .unwrap();
    }
    model
}

fn first_name(proxy: &SortingProxyModel) -> String {
    let index = proxy.index(0, 0, &ModelIndex::invalid());
    proxy.data(&index, Role::Display).to_string()
}

fn sort_by_name(source: Rc<TreeModel>) -> Result<SortingProxyModel> {
    let proxy = SortingProxyModel::new(source as Rc<dyn Model>);
    proxy.set_key_column_and_sort_order(0, SortOrder::Ascending)?;
    Ok(proxy)
}

#[test]
fn prelude_covers_common_flow() {
    let proxy = sort_by_name(fruit()).unwrap();
    assert_eq!(first_name(&proxy), "Apple");
}

#[test]
fn proxy_errors_convert() {
    let source = fruit();
    let proxy = SortingProxyModel::new(source as Rc<dyn Model>);
    let result: Result<()> = proxy
        .set_key_column_and_sort_order(4, SortOrder::Ascending)
        .map_err(Error::from);
    let err = result.unwrap_err();
    assert!(matches!(
        err,
        Error::Proxy(ProxyError::KeyColumnOutOfRange { column: 4, .. })
    ));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn model_errors_convert() {
    let source = fruit();
    let edit = || -> Result<()> {
        source.remove_row(&ModelIndex::invalid(), 10)?;
        Ok(())
    };
    assert!(matches!(
        edit(),
        Err(Error::Model(ModelError::RowOutOfRange { row: 10, .. }))
    ));
}

#[test]
fn env_proxy_defaults_to_source_order() {
    let proxy = sortview::proxy_from_env(fruit() as Rc<dyn Model>).unwrap();
    assert_eq!(proxy.key_column(), None);
    assert_eq!(first_name(&proxy), "cherry");
}

#[test]
fn crate_aliases_reach_submodules() {
    let stats: sortview::proxy::MappingStats = sortview::SortingProxyModel::new(
        fruit() as Rc<dyn Model>,
    )
    .stats();
    assert_eq!(stats.builds, 0);
    let _: sortview::model::ModelIndex = ModelIndex::invalid();
}
