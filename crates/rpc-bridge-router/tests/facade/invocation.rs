use std::{error::Error, io};

use futures::executor::block_on;
use rpc_bridge_core::{
    ErrorType, RpcDiagnostic, current,
    future::{BoxFuture, ready},
    legacy::{self, RpcProviderService as _, RpcService as _},
    BoxError, DataNode,
};
use rpc_bridge_router::LegacyRpcRouter;
use serde_json::json;

use crate::support::{CountingProvider, Echo, Failing, global, schema_path, scoped};

#[test]
fn register_invoke_close_then_not_available() {
    let facade = LegacyRpcRouter::new();
    let echo = Echo::new("edge");
    let registration = facade.register_rpc_implementations(echo.clone(), &[global("/net:ping")]);

    let result = block_on(facade.invoke_rpc(&schema_path("/net:ping"), Some(json!({ "ttl": 3 }))))
        .expect("ping is served");
    assert_eq!(
        result.value(),
        Some(&json!({ "handled_by": "edge", "input": { "ttl": 3 } }))
    );
    assert!(result.errors().is_empty());
    assert_eq!(echo.seen(), vec![global("/net:ping")]);

    registration.close();

    let error = block_on(facade.invoke_rpc(&schema_path("/net:ping"), None))
        .expect_err("ping is gone");
    assert!(error.is_not_available());
    assert_eq!(error.message(), "No implementation of RPC /net:ping available");
}

#[test]
fn unknown_rpc_maps_to_legacy_not_available() {
    let facade = LegacyRpcRouter::new();
    let error = block_on(facade.invoke_rpc(&schema_path("/net:trace"), None))
        .expect_err("nothing registered");
    assert!(matches!(error, legacy::RpcError::ImplementationNotAvailable { .. }));
}

/// 每个契约边界各包一层：旧版 `Failed` 包着当前契约的 `Failed`，后者再包着原始 `io::Error`。
#[test]
fn arbitrary_implementation_failure_is_wrapped_once_per_boundary() {
    let facade = LegacyRpcRouter::new();
    let _registration = facade
        .register_rpc_implementations(Failing::new(Failing::disk_full), &[global("/disk:sync")]);

    let error = block_on(facade.invoke_rpc(&schema_path("/disk:sync"), None))
        .expect_err("implementation fails");
    assert!(matches!(error, legacy::RpcError::Failed { .. }));
    assert_eq!(error.message(), "RPC failed");

    let current_cause = error
        .source()
        .and_then(|cause| cause.downcast_ref::<current::RpcError>())
        .expect("cause is the current-shaped failure");
    assert_eq!(current_cause.message(), "RPC failed");
    let root = current_cause.source().expect("root cause");
    assert_eq!(root.to_string(), "disk full");
    assert!(root.is::<io::Error>());
}

#[test]
fn legacy_failure_reaches_the_caller_unchanged() {
    let facade = LegacyRpcRouter::new();
    let _registration = facade.register_rpc_implementations(
        Failing::new(Failing::quota_exceeded),
        &[global("/quota:check")],
    );

    let error = block_on(facade.invoke_rpc(&schema_path("/quota:check"), None))
        .expect_err("implementation fails");
    assert!(matches!(error, legacy::RpcError::Failed { .. }));
    assert_eq!(error.message(), "quota exceeded");
    assert!(error.source().is_none());
}

#[test]
fn legacy_not_available_keeps_its_message() {
    let facade = LegacyRpcRouter::new();
    let _registration = facade.register_rpc_implementations(
        Failing::new(Failing::device_offline),
        &[global("/dev:reboot")],
    );

    let error = block_on(facade.invoke_rpc(&schema_path("/dev:reboot"), None))
        .expect_err("device is offline");
    assert!(error.is_not_available());
    assert_eq!(error.message(), "device offline");
}

struct Diagnosing;

impl legacy::RpcImplementation for Diagnosing {
    fn invoke_rpc(
        &self,
        _rpc: &legacy::RpcIdentifier,
        _input: Option<DataNode>,
    ) -> BoxFuture<'static, Result<legacy::RpcResult, BoxError>> {
        ready(Ok(legacy::RpcResult::with_errors(
            Some(json!({ "applied": 2 })),
            vec![RpcDiagnostic::warning(
                ErrorType::Application,
                "partial-operation",
                "one entry skipped",
            )],
        )))
    }
}

#[test]
fn diagnostics_survive_both_conversions() {
    let facade = LegacyRpcRouter::new();
    let _registration =
        facade.register_rpc_implementations(std::sync::Arc::new(Diagnosing), &[global("/cfg:apply")]);

    let result = block_on(facade.invoke_rpc(&schema_path("/cfg:apply"), None)).expect("applied");
    let (value, errors) = result.into_parts();
    assert_eq!(value, Some(json!({ "applied": 2 })));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].tag, "partial-operation");
}

#[test]
fn adapter_forwards_cost_and_converts_identifiers() {
    let provider = CountingProvider::new();
    let facade = LegacyRpcRouter::with_delegates(
        std::sync::Arc::new(rpc_bridge_router::DefaultRpcRouter::new()),
        provider.clone(),
    );
    let echo = Echo::with_cost("costly", 42);
    let edge = scoped("/inv:reset", "/inv:nodes/inv:node[inv:id=edge]");
    let _registration = facade.register_rpc_implementations(echo.clone(), &[edge.clone()]);

    let live = provider.live();
    assert_eq!(live.len(), 1);
    let (adapter, rpcs) = &live[0];
    assert_eq!(adapter.invocation_cost(), 42);
    assert_eq!(rpcs.len(), 1);
    assert!(rpcs.contains(&edge.to_current()));

    let result = block_on(adapter.invoke_rpc(&edge.to_current(), None)).expect("adapter invokes");
    assert_eq!(result.value(), Some(&json!({ "handled_by": "costly", "input": null })));
    assert_eq!(echo.seen(), vec![edge]);
}
