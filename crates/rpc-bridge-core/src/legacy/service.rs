use std::{collections::HashSet, sync::Arc};

use crate::{
    DEFAULT_INVOCATION_COST,
    future::{BoxError, BoxFuture},
    path::SchemaPath,
    registration::{ImplementationRegistration, ListenerRegistration},
    result::DataNode,
};

use super::{RpcError, RpcIdentifier, RpcResult};

/// 旧版 RPC 实现。
///
/// # 契约说明（What）
/// - `invoke_rpc` 可以以任意错误失败，路由层在边界处统一归类；
/// - `invocation_cost` 越小越优先被选中。
pub trait RpcImplementation: Send + Sync + 'static {
    fn invoke_rpc(
        &self,
        rpc: &RpcIdentifier,
        input: Option<DataNode>,
    ) -> BoxFuture<'static, Result<RpcResult, BoxError>>;

    fn invocation_cost(&self) -> u64 {
        DEFAULT_INVOCATION_COST
    }
}

/// 旧版可用性监听器。
pub trait RpcAvailabilityListener: Send + Sync + 'static {
    /// 一批标识符变为可用。
    fn on_rpc_available(&self, rpcs: &[RpcIdentifier]);

    /// 一批标识符变为不可用。
    fn on_rpc_unavailable(&self, rpcs: &[RpcIdentifier]);

    /// 监听器是否关心某个实现带来的可用性变化；默认全部接受。
    ///
    /// 该方法在路由器内部锁内被调用，实现必须是无副作用的判定，不得回调路由器。
    fn accepts_implementation(&self, implementation: &dyn RpcImplementation) -> bool {
        let _ = implementation;
        true
    }
}

/// 旧版调用入口。
pub trait RpcService: Send + Sync {
    /// 按 RPC 类型发起调用。
    fn invoke_rpc(
        &self,
        rpc_type: &SchemaPath,
        input: Option<DataNode>,
    ) -> BoxFuture<'static, Result<RpcResult, RpcError>>;

    /// 注册可用性监听器；返回的句柄原样持有监听器。
    fn register_rpc_listener<T>(&self, listener: Arc<T>) -> ListenerRegistration<T>
    where
        T: RpcAvailabilityListener;
}

/// 旧版实现注册入口。
pub trait RpcProviderService: Send + Sync {
    /// 为一组标识符注册实现。
    ///
    /// 标识符集合的非空约束由底层提供者负责，本层只透传。
    fn register_rpc_implementation<T>(
        &self,
        implementation: Arc<T>,
        rpcs: HashSet<RpcIdentifier>,
    ) -> ImplementationRegistration<T>
    where
        T: RpcImplementation;

    /// 以切片形式传入标识符的便捷入口。
    fn register_rpc_implementations<T>(
        &self,
        implementation: Arc<T>,
        rpcs: &[RpcIdentifier],
    ) -> ImplementationRegistration<T>
    where
        T: RpcImplementation,
    {
        self.register_rpc_implementation(implementation, rpcs.iter().cloned().collect())
    }
}
