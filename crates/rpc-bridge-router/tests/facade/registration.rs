use std::{collections::HashSet, sync::Arc};

use futures::executor::block_on;
use rpc_bridge_core::legacy::{RpcProviderService as _, RpcService as _};
use rpc_bridge_router::{DefaultRpcRouter, LegacyRpcRouter};

use crate::support::{CountingProvider, Echo, global, schema_path, scoped};

fn counted_facade() -> (LegacyRpcRouter, Arc<CountingProvider>) {
    let provider = CountingProvider::new();
    let facade =
        LegacyRpcRouter::with_delegates(Arc::new(DefaultRpcRouter::new()), provider.clone());
    (facade, provider)
}

#[test]
fn close_unregisters_exactly_once() {
    let (facade, provider) = counted_facade();
    let registration = facade.register_rpc_implementations(Echo::new("a"), &[global("/net:ping")]);
    assert_eq!(provider.registrations(), 1);

    registration.close();
    registration.close();
    assert!(registration.is_closed());
    assert_eq!(provider.unregistrations(), 1);

    drop(registration);
    assert_eq!(provider.unregistrations(), 1);
}

#[test]
fn dropping_the_handle_unregisters() {
    let (facade, provider) = counted_facade();
    {
        let _registration =
            facade.register_rpc_implementations(Echo::new("a"), &[global("/net:ping")]);
        assert_eq!(provider.unregistrations(), 0);
    }
    assert_eq!(provider.unregistrations(), 1);
    assert_eq!(facade.mapped_implementations(), 0);
}

#[test]
fn handle_returns_the_original_instance() {
    let facade = LegacyRpcRouter::new();
    let echo = Echo::new("a");
    let registration = facade.register_rpc_implementations(echo.clone(), &[global("/net:ping")]);
    assert!(Arc::ptr_eq(registration.instance(), &echo));
}

#[test]
fn close_releases_every_reference_to_the_implementation() {
    let facade = LegacyRpcRouter::new();
    let echo = Echo::new("a");
    let registration = facade.register_rpc_implementations(
        echo.clone(),
        &[global("/net:ping"), scoped("/net:ping", "/net:hosts/net:host[net:name=h1]")],
    );
    assert_eq!(facade.mapped_implementations(), 1);
    assert!(Arc::strong_count(&echo) > 2);

    registration.close();
    assert_eq!(facade.mapped_implementations(), 0);
    assert_eq!(Arc::strong_count(&echo), 2);

    drop(registration);
    assert_eq!(Arc::strong_count(&echo), 1);
}

#[test]
fn identifiers_are_converted_and_deduplicated() {
    let (facade, provider) = counted_facade();
    let edge = scoped("/inv:reset", "/inv:nodes/inv:node[inv:id=edge]");
    let _registration = facade.register_rpc_implementations(
        Echo::new("a"),
        &[global("/inv:reset"), edge.clone(), global("/inv:reset")],
    );

    let live = provider.live();
    assert_eq!(live.len(), 1);
    let expected: HashSet<_> = [global("/inv:reset").to_current(), edge.to_current()]
        .into_iter()
        .collect();
    assert_eq!(live[0].1, expected);
}

#[test]
fn router_close_releases_outstanding_registrations_once() {
    let (facade, provider) = counted_facade();
    let first = facade.register_rpc_implementations(Echo::new("a"), &[global("/net:ping")]);
    let second = facade.register_rpc_implementations(Echo::new("b"), &[global("/net:trace")]);
    first.close();
    assert_eq!(provider.unregistrations(), 1);

    facade.close();
    assert_eq!(provider.unregistrations(), 2);
    assert_eq!(facade.mapped_implementations(), 0);
    assert!(provider.live().is_empty());

    second.close();
    facade.close();
    assert_eq!(provider.unregistrations(), 2);
}

#[test]
fn facade_remains_usable_after_close() {
    let facade = LegacyRpcRouter::new();
    let _before = facade.register_rpc_implementations(Echo::new("a"), &[global("/net:ping")]);
    facade.close();

    let _after = facade.register_rpc_implementations(Echo::new("b"), &[global("/net:ping")]);
    let result = block_on(facade.invoke_rpc(&schema_path("/net:ping"), None)).expect("served");
    assert_eq!(
        result.value().and_then(|value| value.get("handled_by")),
        Some(&serde_json::json!("b"))
    );
}

#[test]
fn empty_identifier_set_is_passed_through() {
    let (facade, provider) = counted_facade();
    let registration = facade.register_rpc_implementation(Echo::new("a"), HashSet::new());
    assert_eq!(provider.registrations(), 1);
    assert!(provider.live()[0].1.is_empty());

    registration.close();
    assert_eq!(provider.unregistrations(), 1);
}
