use modhub_core::{
    attribute_message, enter_extension, enter_host, get_calling_mod, CallFrames, CodeOrigin,
    ExplicitCaller, ModRecord, ModRegistry,
};
use semver::Version;

fn registry_with(origin: CodeOrigin) -> ModRegistry {
    let registry = ModRegistry::new();
    registry
        .load(vec![
            ModRecord::new("weather", "Weather Sim", "w", Version::new(3, 0, 0), true)
                .with_origin(origin),
            ModRecord::new("unloaded", "Unloaded", "u", Version::new(1, 0, 0), false),
        ])
        .unwrap();
    registry
}

/// Generic helper a mod might route notifications through.
fn notify_via_helper(registry: &ModRegistry, text: &str) -> String {
    attribute_message(registry, &CallFrames, text).to_string()
}

#[test]
fn explicit_token_resolves_calling_mod() {
    let origin = CodeOrigin::new();
    let registry = registry_with(origin);
    let record = get_calling_mod(&registry, &ExplicitCaller::new(origin)).unwrap();
    assert_eq!(record.id, "weather");
}

#[test]
fn frame_chain_resolves_through_indirection() {
    let origin = CodeOrigin::new();
    let registry = registry_with(origin);

    let _frame = enter_extension(origin);
    assert_eq!(
        notify_via_helper(&registry, "storm incoming"),
        "[Weather Sim] storm incoming"
    );
}

#[test]
fn host_code_resolves_to_no_caller() {
    let origin = CodeOrigin::new();
    let registry = registry_with(origin);

    assert!(get_calling_mod(&registry, &CallFrames).is_none());
    let _ext = enter_extension(origin);
    let _host = enter_host();
    assert!(get_calling_mod(&registry, &CallFrames).is_none());
    assert_eq!(notify_via_helper(&registry, "tick"), "tick");
}

#[test]
fn unknown_origin_resolves_to_no_caller() {
    let registry = registry_with(CodeOrigin::new());
    assert!(get_calling_mod(&registry, &ExplicitCaller::new(CodeOrigin::new())).is_none());
}

#[test]
fn host_supplied_closure_resolver_is_accepted() {
    let origin = CodeOrigin::new();
    let registry = registry_with(origin);
    let resolver = move || Some(origin);
    assert_eq!(get_calling_mod(&registry, &resolver).unwrap().id, "weather");
}
