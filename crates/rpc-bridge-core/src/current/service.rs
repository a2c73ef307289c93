use std::{collections::HashSet, sync::Arc};

use crate::{
    DEFAULT_INVOCATION_COST,
    future::BoxFuture,
    path::SchemaPath,
    registration::{ImplementationRegistration, ListenerRegistration},
    result::DataNode,
    schema::SchemaContextListener,
};

use super::{RpcError, RpcIdentifier, RpcResult};

/// 当前契约的 RPC 实现。
///
/// 与旧版不同，失败必须已归入 [`RpcError`]。
pub trait RpcImplementation: Send + Sync + 'static {
    fn invoke_rpc(
        &self,
        rpc: &RpcIdentifier,
        input: Option<DataNode>,
    ) -> BoxFuture<'static, Result<RpcResult, RpcError>>;

    fn invocation_cost(&self) -> u64 {
        DEFAULT_INVOCATION_COST
    }
}

/// 当前契约的可用性监听器。
pub trait RpcAvailabilityListener: Send + Sync + 'static {
    fn on_rpc_available(&self, rpcs: &[RpcIdentifier]);

    fn on_rpc_unavailable(&self, rpcs: &[RpcIdentifier]);

    /// 监听器是否关心某个实现；默认全部接受。
    ///
    /// 在路由器内部锁内调用，必须是无副作用的判定。
    fn accepts_implementation(&self, implementation: &dyn RpcImplementation) -> bool {
        let _ = implementation;
        true
    }
}

/// 当前契约的调用入口。
pub trait RpcService: Send + Sync + 'static {
    fn invoke_rpc(
        &self,
        rpc_type: &SchemaPath,
        input: Option<DataNode>,
    ) -> BoxFuture<'static, Result<RpcResult, RpcError>>;

    fn register_rpc_listener(
        &self,
        listener: Arc<dyn RpcAvailabilityListener>,
    ) -> ListenerRegistration<dyn RpcAvailabilityListener>;

    /// 可选能力：是否参与全局 Schema 上下文变更通知。
    ///
    /// 默认不参与；门面只在返回 `Some` 时转发通知。
    fn schema_context_listener(&self) -> Option<&dyn SchemaContextListener> {
        None
    }
}

/// 当前契约的实现注册入口。
pub trait RpcProviderService: Send + Sync + 'static {
    fn register_rpc_implementation(
        &self,
        implementation: Arc<dyn RpcImplementation>,
        rpcs: HashSet<RpcIdentifier>,
    ) -> ImplementationRegistration<dyn RpcImplementation>;
}
