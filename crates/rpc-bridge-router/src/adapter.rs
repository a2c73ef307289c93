//! 旧版实现与监听器到当前契约的适配器。

use std::sync::{Arc, Weak};

use futures::FutureExt;
use rpc_bridge_core::{
    DataNode,
    current,
    future::BoxFuture,
    legacy,
    translate::TO_CURRENT,
};
use tracing::trace;

use crate::mapping::{ImplementationMapping, RegistrationId};

/// 以当前契约暴露一个旧版实现。
///
/// 每次注册各自构造一个适配器，映射依据适配器身份反查原始实现。
pub(crate) struct LegacyImplementationAdapter {
    registration: RegistrationId,
    implementation: Arc<dyn legacy::RpcImplementation>,
}

impl LegacyImplementationAdapter {
    pub(crate) fn new(
        registration: RegistrationId,
        implementation: Arc<dyn legacy::RpcImplementation>,
    ) -> Self {
        Self {
            registration,
            implementation,
        }
    }
}

impl current::RpcImplementation for LegacyImplementationAdapter {
    fn invoke_rpc(
        &self,
        rpc: &current::RpcIdentifier,
        input: Option<DataNode>,
    ) -> BoxFuture<'static, Result<current::RpcResult, current::RpcError>> {
        let legacy_rpc = legacy::RpcIdentifier::from_current(rpc);
        trace!(registration = %self.registration, rpc = %legacy_rpc, "invoking legacy implementation");
        self.implementation
            .invoke_rpc(&legacy_rpc, input)
            .map(|outcome| {
                outcome
                    .map(current::RpcResult::from)
                    .map_err(|error| TO_CURRENT.translate(error))
            })
            .boxed()
    }

    fn invocation_cost(&self) -> u64 {
        self.implementation.invocation_cost()
    }
}

/// 以当前契约暴露一个旧版可用性监听器。
///
/// 映射以弱引用持有：门面释放后，包装不再延长映射的生命周期。
pub(crate) struct LegacyListenerAdapter<T> {
    listener: Arc<T>,
    mapping: Weak<ImplementationMapping>,
}

impl<T> LegacyListenerAdapter<T> {
    pub(crate) fn new(listener: Arc<T>, mapping: Weak<ImplementationMapping>) -> Self {
        Self { listener, mapping }
    }
}

fn to_legacy(rpcs: &[current::RpcIdentifier]) -> Vec<legacy::RpcIdentifier> {
    rpcs.iter().map(legacy::RpcIdentifier::from_current).collect()
}

impl<T> current::RpcAvailabilityListener for LegacyListenerAdapter<T>
where
    T: legacy::RpcAvailabilityListener,
{
    fn on_rpc_available(&self, rpcs: &[current::RpcIdentifier]) {
        self.listener.on_rpc_available(&to_legacy(rpcs));
    }

    fn on_rpc_unavailable(&self, rpcs: &[current::RpcIdentifier]) {
        self.listener.on_rpc_unavailable(&to_legacy(rpcs));
    }

    /// 未经本门面注册的实现一律接受，且不询问旧版监听器。
    fn accepts_implementation(&self, implementation: &dyn current::RpcImplementation) -> bool {
        match self
            .mapping
            .upgrade()
            .and_then(|mapping| mapping.lookup(implementation))
        {
            Some(original) => self.listener.accepts_implementation(&*original),
            None => {
                trace!("implementation not registered through the facade; accepting");
                true
            }
        }
    }
}
