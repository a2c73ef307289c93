//! 旧版契约门面。
//!
//! # 设计概览（Why）
//! - 旧版调用方与实现方继续使用旧版契约，实际派发由任意一对当前契约的委托完成；
//! - 门面只做形态转换：标识符、结果与错误在边界处转换，语义由委托决定。
//!
//! # 行为契约（What）
//! - `invoke_rpc`：成功结果按字段移动转换；失败经 [`TO_LEGACY`] 归类；
//! - `register_rpc_implementation`：每次注册构造一个 [`LegacyImplementationAdapter`]，
//!   登记映射后向委托注册，句柄关闭时恰好注销一次并同步删除映射；
//! - `register_rpc_listener`：包装监听器，可用性事件按原顺序转换标识符；
//! - `on_global_context_updated`：仅当委托声明了 Schema 监听能力时转发。

use std::{collections::HashSet, fmt, sync::Arc};

use futures::FutureExt;
use rpc_bridge_core::{
    DataNode, SchemaContext, SchemaContextListener, SchemaPath,
    current,
    future::BoxFuture,
    legacy,
    registration::{ImplementationRegistration, ListenerRegistration, Registration},
    translate::TO_LEGACY,
};
use tracing::debug;

use crate::{
    DefaultRpcRouter,
    adapter::{LegacyImplementationAdapter, LegacyListenerAdapter},
    mapping::ImplementationMapping,
};

/// 面向旧版契约的 RPC 路由门面。
pub struct LegacyRpcRouter {
    rpc_service: Arc<dyn current::RpcService>,
    provider: Arc<dyn current::RpcProviderService>,
    mapping: Arc<ImplementationMapping>,
}

impl LegacyRpcRouter {
    /// 以一个新的 [`DefaultRpcRouter`] 作为两个委托构造门面。
    pub fn new() -> Self {
        Self::with_default_router(DefaultRpcRouter::new())
    }

    pub fn with_default_router(router: DefaultRpcRouter) -> Self {
        let router = Arc::new(router);
        Self::with_delegates(Arc::clone(&router) as Arc<dyn current::RpcService>, router)
    }

    /// 以任意一对当前契约的委托构造门面。
    pub fn with_delegates(
        rpc_service: Arc<dyn current::RpcService>,
        provider: Arc<dyn current::RpcProviderService>,
    ) -> Self {
        Self {
            rpc_service,
            provider,
            mapping: Arc::new(ImplementationMapping::new()),
        }
    }

    /// 映射中尚未注销的实现注册数。
    pub fn mapped_implementations(&self) -> usize {
        self.mapping.implementation_count()
    }

    /// 尚未注销的监听器注册数。
    pub fn mapped_listeners(&self) -> usize {
        self.mapping.listener_count()
    }

    /// 注销经本门面建立、仍未关闭的全部注册。
    ///
    /// 之后关闭对应句柄不会再次注销。门面本身仍可继续使用。
    pub fn close(&self) {
        debug!(
            implementations = self.mapping.implementation_count(),
            listeners = self.mapping.listener_count(),
            "closing legacy RPC router"
        );
        self.mapping.release_all();
    }
}

impl Default for LegacyRpcRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LegacyRpcRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyRpcRouter")
            .field("implementations", &self.mapping.implementation_count())
            .field("listeners", &self.mapping.listener_count())
            .finish_non_exhaustive()
    }
}

impl legacy::RpcService for LegacyRpcRouter {
    fn invoke_rpc(
        &self,
        rpc_type: &SchemaPath,
        input: Option<DataNode>,
    ) -> BoxFuture<'static, Result<legacy::RpcResult, legacy::RpcError>> {
        self.rpc_service
            .invoke_rpc(rpc_type, input)
            .map(|outcome| {
                outcome
                    .map(legacy::RpcResult::from)
                    .map_err(|error| TO_LEGACY.translate_source(error))
            })
            .boxed()
    }

    fn register_rpc_listener<T>(&self, listener: Arc<T>) -> ListenerRegistration<T>
    where
        T: legacy::RpcAvailabilityListener,
    {
        let _serialized = self.mapping.lock();
        let id = self.mapping.next_id();
        let wrapper: Arc<dyn current::RpcAvailabilityListener> = Arc::new(
            LegacyListenerAdapter::new(Arc::clone(&listener), Arc::downgrade(&self.mapping)),
        );
        let underlying = self.rpc_service.register_rpc_listener(wrapper);
        self.mapping.insert_listener(id, underlying);
        debug!(registration = %id, "legacy RPC listener registered");

        let mapping = Arc::downgrade(&self.mapping);
        Registration::new(listener, move || {
            if let Some(mapping) = mapping.upgrade() {
                mapping.release_listener(id);
            }
        })
    }
}

impl legacy::RpcProviderService for LegacyRpcRouter {
    fn register_rpc_implementation<T>(
        &self,
        implementation: Arc<T>,
        rpcs: HashSet<legacy::RpcIdentifier>,
    ) -> ImplementationRegistration<T>
    where
        T: legacy::RpcImplementation,
    {
        let _serialized = self.mapping.lock();
        let id = self.mapping.next_id();
        let original: Arc<dyn legacy::RpcImplementation> = implementation.clone();
        let adapter: Arc<dyn current::RpcImplementation> =
            Arc::new(LegacyImplementationAdapter::new(id, Arc::clone(&original)));
        self.mapping.insert(id, original, Arc::clone(&adapter));

        let converted: HashSet<current::RpcIdentifier> =
            rpcs.iter().map(legacy::RpcIdentifier::to_current).collect();
        debug!(registration = %id, rpcs = converted.len(), "registering legacy RPC implementation");
        let underlying = self.provider.register_rpc_implementation(adapter, converted);
        self.mapping.attach(id, underlying);

        let mapping = Arc::downgrade(&self.mapping);
        Registration::new(implementation, move || {
            if let Some(mapping) = mapping.upgrade() {
                mapping.release(id);
            }
        })
    }
}

impl SchemaContextListener for LegacyRpcRouter {
    fn on_global_context_updated(&self, context: Arc<SchemaContext>) {
        match self.rpc_service.schema_context_listener() {
            Some(listener) => listener.on_global_context_updated(context),
            None => debug!("delegate RPC service does not track schema context; update ignored"),
        }
    }
}
