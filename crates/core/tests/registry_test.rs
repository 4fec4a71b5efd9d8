use sqlit_core::{
    Adapter, AdapterRegistry, ConnectionConfig, DriverMissing, Error, descriptor::builtin,
};

#[path = "support/fake_adapter.rs"]
mod fake_adapter;

use fake_adapter::{FAKE_DB_TYPE, FakeAdapter};

fn registry() -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    registry
        .register(Box::new(FakeAdapter::with_rows(1)))
        .register_unavailable(&builtin::ATHENA);
    registry
}

#[test]
fn lookup_by_db_type_resolves_the_registered_adapter() {
    let registry = registry();
    let adapter = registry.get(FAKE_DB_TYPE).expect("fake adapter registered");
    assert_eq!(adapter.descriptor().display_name, "Fake");
    assert_eq!(
        registry.db_types().collect::<Vec<_>>(),
        vec!["athena", FAKE_DB_TYPE]
    );
}

#[test]
fn unknown_db_type_lists_the_known_ones() {
    let error = registry().get("oracle").err().expect("oracle is not registered");

    match &error {
        Error::UnknownBackend { db_type, known } => {
            assert_eq!(db_type, "oracle");
            assert_eq!(known, &vec!["athena", FAKE_DB_TYPE]);
        }
        other => panic!("expected UnknownBackend, got {other:?}"),
    }
    assert!(error.to_string().contains("athena, fake"));
}

#[test]
fn unavailable_backend_keeps_its_descriptor_but_fails_connect() {
    let registry = registry();
    let athena = registry.get("athena").expect("placeholder registered");

    assert_eq!(athena.descriptor().badge_label, "ATH");
    assert!(athena.descriptor().supports_multiple_databases());

    let error = athena
        .connect(&ConnectionConfig::new("lake", "athena"))
        .expect_err("driver is not compiled in");
    let Error::DriverMissing(missing) = &error else {
        panic!("expected DriverMissing, got {error:?}");
    };
    assert_eq!(missing, &DriverMissing::for_descriptor(&builtin::ATHENA));
    assert_eq!(missing.extra, "athena");
    assert_eq!(missing.package, "sqlit-adapter-athena");

    let message = error.to_string();
    assert!(message.contains("cargo install sqlit-cli --features athena"));
    assert!(message.contains("aws-sdk-athena"));
}

#[test]
fn registry_connect_returns_adapter_and_handle() {
    let registry = registry();
    let (adapter, mut connection) = registry
        .connect(&ConnectionConfig::new("local", FAKE_DB_TYPE))
        .expect("connect through registry");

    assert_eq!(connection.db_type(), FAKE_DB_TYPE);
    let result = adapter
        .execute_query(&mut connection, "SELECT n", None)
        .expect("query");
    assert_eq!(result.rows.len(), 1);
}

#[test]
fn builtin_descriptors_are_unique_and_consistent() {
    let mut db_types = builtin::ALL.iter().map(|d| d.db_type).collect::<Vec<_>>();
    db_types.sort_unstable();
    db_types.dedup();
    assert_eq!(db_types.len(), builtin::ALL.len());

    for descriptor in builtin::ALL {
        assert!(!descriptor.badge_label.is_empty());
        assert_eq!(descriptor.driver.extra, descriptor.db_type);
        assert!(descriptor.driver.package.starts_with("sqlit-adapter-"));
        assert!(!descriptor.driver.crates.is_empty());
        assert_eq!(
            descriptor.capabilities.multiple_databases,
            descriptor.supports_multiple_databases()
        );
    }
}
