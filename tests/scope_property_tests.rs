//! Property-based tests for scope resolution.
//!
//! These tests use proptest to check that names typed by a user resolve to
//! IDs and back to the same names, whatever their case.

use proptest::prelude::*;

use octopus_cli::core::scope::{
    resolve_inbound, resolve_outbound, ProcessReferenceItem, ReferenceItem, ScopeCategory,
    ScopeError, ScopeInput, ScopeValues,
};

const PROJECT_ID: &str = "Projects-1";

/// Catalog names: lowercase letters plus the index, so every name is unique
/// within its category and never looks like an ID or `deployment`.
fn catalog_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{2,10}", 1..8).prop_map(|words| {
        words
            .into_iter()
            .enumerate()
            .map(|(i, word)| format!("{}{}", word, i))
            .collect()
    })
}

fn id_for(category: ScopeCategory, index: usize) -> String {
    format!("{}-{}", category.label(), index)
}

/// The same names in every category, with category-specific IDs.
fn catalog(names: &[String]) -> ScopeValues {
    let items = |category: ScopeCategory| -> Vec<ReferenceItem> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| ReferenceItem::new(id_for(category, i), name.clone()))
            .collect()
    };

    ScopeValues {
        environments: items(ScopeCategory::Environment),
        channels: items(ScopeCategory::Channel),
        machines: items(ScopeCategory::Target),
        actions: items(ScopeCategory::Step),
        roles: items(ScopeCategory::Role),
        tenant_tags: items(ScopeCategory::Tag),
        processes: names
            .iter()
            .enumerate()
            .map(|(i, name)| ProcessReferenceItem::runbook(id_for(ScopeCategory::Process, i), name.clone()))
            .collect(),
    }
}

/// Flip the case of some characters according to `mask`.
fn recase(value: &str, mask: &[bool]) -> String {
    value
        .chars()
        .zip(mask.iter().cycle())
        .map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c })
        .collect()
}

proptest! {
    #[test]
    fn names_round_trip_through_ids(
        names in catalog_names(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..5),
        mask in prop::collection::vec(any::<bool>(), 1..6),
        category_index in 0..ScopeCategory::ALL.len(),
    ) {
        let category = ScopeCategory::ALL[category_index];
        let catalog = catalog(&names);
        let chosen: Vec<String> = picks.iter().map(|p| names[p.index(names.len())].clone()).collect();
        let typed: Vec<String> = chosen.iter().map(|n| recase(n, &mask)).collect();

        let input = ScopeInput::new().with(category, typed);
        let resolved = resolve_outbound(&input, &catalog, PROJECT_ID).unwrap();
        prop_assert_eq!(resolved.ids(category).len(), chosen.len());
        prop_assert_eq!(resolved.is_empty(), chosen.is_empty());

        let displayed = resolve_inbound(&resolved, &catalog).unwrap();
        let round_tripped: Vec<String> = displayed
            .items(category)
            .iter()
            .map(|item| item.name.clone())
            .collect();
        prop_assert_eq!(round_tripped, chosen);
    }

    #[test]
    fn ids_resolve_to_themselves(
        names in catalog_names(),
        pick in any::<prop::sample::Index>(),
    ) {
        let catalog = catalog(&names);
        let index = pick.index(names.len());
        let id = id_for(ScopeCategory::Environment, index);

        let input = ScopeInput::new().with(ScopeCategory::Environment, [id.to_uppercase()]);
        let resolved = resolve_outbound(&input, &catalog, PROJECT_ID).unwrap();
        prop_assert_eq!(resolved.ids(ScopeCategory::Environment), [id]);
    }

    #[test]
    fn unknown_value_fails_whole_resolution(
        names in catalog_names(),
        unknown in "[A-Z]{3,8}-unknown",
    ) {
        let catalog = catalog(&names);
        let input = ScopeInput::new()
            .with(ScopeCategory::Environment, [names[0].clone()])
            .with(ScopeCategory::Role, [unknown.clone()]);

        let err = resolve_outbound(&input, &catalog, PROJECT_ID).unwrap_err();
        prop_assert_eq!(
            err,
            ScopeError::UnknownValue { category: ScopeCategory::Role, value: unknown }
        );
    }
}

#[test]
fn deployment_process_resolves_to_project() {
    let catalog = catalog(&["restart0".to_string()]);
    let input = ScopeInput::new().with(ScopeCategory::Process, ["Deployment", "restart0"]);

    let resolved = resolve_outbound(&input, &catalog, PROJECT_ID).unwrap();

    assert_eq!(
        resolved.ids(ScopeCategory::Process),
        [PROJECT_ID.to_string(), id_for(ScopeCategory::Process, 0)]
    );
}

#[test]
fn empty_input_is_unscoped() {
    let resolved = resolve_outbound(&ScopeInput::new(), &catalog(&["a0".into()]), PROJECT_ID).unwrap();
    assert!(resolved.is_empty());
}
