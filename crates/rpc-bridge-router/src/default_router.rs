//! 当前契约的默认内存路由器。
//!
//! # 设计概览（Why）
//! - 调用路径只读 `ArcSwap` 快照，不与注册、注销竞争锁；
//! - 写路径（注册、注销、监听器变更）串行化后整表重建，监听器按差异收到可用/不可用通知；
//! - 通知在状态锁内按变更顺序入队，由单个投递者在不持有任何路由器锁的情况下依次派发；
//!   回调中可以再次注册或注销，也可以调用持有自身锁的上层门面。
//!
//! # 行为契约（What）
//! - 全局 RPC：选择成本最低的实现，成本相同按注册先后；
//! - 带路由上下文的 RPC：Schema 声明了上下文字段时，从输入载荷读取该字段并解析为实例路径，
//!   精确匹配优先，否则按配置退回全局实现；
//! - 没有可用实现时返回 `ImplementationNotAvailable`。

use std::{
    collections::{HashSet, VecDeque},
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use rpc_bridge_core::{
    DataNode, InstancePath, PathParseError, SchemaContext, SchemaContextListener, SchemaPath,
    current::{
        RpcAvailabilityListener, RpcError, RpcIdentifier, RpcImplementation, RpcProviderService,
        RpcResult, RpcService,
    },
    future::{BoxFuture, ready},
    registration::{ImplementationRegistration, ListenerRegistration, Registration},
};
use tracing::{debug, trace, warn};

use crate::{
    config::RouterConfig,
    table::{ImplementationEntry, RoutingTable},
};

/// 当前契约的默认 RPC 路由器。
///
/// 克隆得到的是同一个路由器的另一个引用。
#[derive(Clone)]
pub struct DefaultRpcRouter {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    config: RouterConfig,
    table: ArcSwap<RoutingTable>,
    schema: ArcSwap<SchemaContext>,
    schema_generation: AtomicU64,
    next_registration: AtomicU64,
    state: Mutex<RouterState>,
    notifications: Mutex<NotificationQueue>,
}

/// 待投递的通知，以及当前是否已有线程在投递。
#[derive(Default)]
struct NotificationQueue {
    pending: VecDeque<Delivery>,
    draining: bool,
}

/// 投递者退出时（包括回调 panic）交还投递权。
struct DrainGuard<'a> {
    notifications: &'a Mutex<NotificationQueue>,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.notifications.lock().draining = false;
    }
}

#[derive(Default)]
struct RouterState {
    implementations: Vec<ImplementationEntry>,
    listeners: Vec<ListenerEntry>,
}

struct ListenerEntry {
    registration: u64,
    listener: Arc<dyn RpcAvailabilityListener>,
    /// 已通知为可用、尚未撤回的标识符，按通知顺序排列。
    announced: Vec<RpcIdentifier>,
}

/// 一次待投递的可用性变化。
struct Delivery {
    listener: Arc<dyn RpcAvailabilityListener>,
    added: Vec<RpcIdentifier>,
    removed: Vec<RpcIdentifier>,
}

impl DefaultRpcRouter {
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// 以给定配置构造；配置中的 RPC 定义成为初始 Schema 上下文。
    pub fn with_config(config: RouterConfig) -> Self {
        let schema = config.initial_schema();
        Self {
            inner: Arc::new(RouterInner {
                config,
                table: ArcSwap::from_pointee(RoutingTable::default()),
                schema: ArcSwap::from_pointee(schema),
                schema_generation: AtomicU64::new(0),
                next_registration: AtomicU64::new(1),
                state: Mutex::new(RouterState::default()),
                notifications: Mutex::new(NotificationQueue::default()),
            }),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.inner.config
    }

    /// 当前 Schema 上下文快照。
    pub fn schema_context(&self) -> Arc<SchemaContext> {
        self.inner.schema.load_full()
    }

    /// Schema 更新次数。
    pub fn schema_generation(&self) -> u64 {
        self.inner.schema_generation.load(Ordering::Acquire)
    }

    /// 标识符当前是否至少有一个实现。
    pub fn is_available(&self, rpc: &RpcIdentifier) -> bool {
        self.inner.table.load().is_available(rpc)
    }

    /// 当前可用的全部标识符，顺序不作保证。
    pub fn available_rpcs(&self) -> Vec<RpcIdentifier> {
        self.inner.table.load().available()
    }

    /// 选出处理本次调用的实现及其对应的标识符。
    fn select(
        &self,
        rpc_type: &SchemaPath,
        input: Option<&DataNode>,
    ) -> Result<Option<(Arc<dyn RpcImplementation>, RpcIdentifier)>, PathParseError> {
        let context = {
            let schema = self.inner.schema.load();
            match schema
                .rpc(rpc_type)
                .and_then(|definition| definition.context_field.as_deref())
            {
                Some(field) => context_from_input(input, field)?,
                None => None,
            }
        };

        let table = self.inner.table.load();
        let Some(entry) = table.entry(rpc_type) else {
            return Ok(None);
        };

        let selected = match context {
            Some(context) => match entry.routed(&context) {
                Some(candidate) => Some((
                    Arc::clone(&candidate.implementation),
                    RpcIdentifier::create(rpc_type.clone(), Some(context)),
                )),
                None if self.inner.config.routing_fallback_to_global => {
                    trace!(rpc = %rpc_type, %context, "no routed implementation; falling back to global");
                    entry.global().map(|candidate| {
                        (
                            Arc::clone(&candidate.implementation),
                            RpcIdentifier::global(rpc_type.clone()),
                        )
                    })
                }
                None => None,
            },
            None => entry.global().map(|candidate| {
                (
                    Arc::clone(&candidate.implementation),
                    RpcIdentifier::global(rpc_type.clone()),
                )
            }),
        };
        Ok(selected)
    }
}

impl Default for DefaultRpcRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DefaultRpcRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultRpcRouter")
            .field("config", &self.inner.config)
            .field("schema_generation", &self.schema_generation())
            .finish_non_exhaustive()
    }
}

/// 从输入载荷读取上下文引用；字段缺失或为根路径时视为无上下文。
fn context_from_input(
    input: Option<&DataNode>,
    field: &str,
) -> Result<Option<InstancePath>, PathParseError> {
    let Some(raw) = input
        .and_then(|value| value.get(field))
        .and_then(DataNode::as_str)
    else {
        return Ok(None);
    };
    let path: InstancePath = raw.parse()?;
    Ok((!path.is_empty()).then_some(path))
}

fn not_available(rpc_type: &SchemaPath) -> RpcError {
    RpcError::not_available(format!("No implementation of RPC {rpc_type} available"))
}

impl RouterInner {
    fn next_registration(&self) -> u64 {
        self.next_registration.fetch_add(1, Ordering::Relaxed)
    }

    /// 写路径：修改状态、重建快照、计算各监听器的差异并入队，释放状态锁后投递通知。
    fn mutate<R>(&self, change: impl FnOnce(&mut RouterState) -> R) -> R {
        let result = {
            let mut state = self.state.lock();
            let result = change(&mut state);
            self.table
                .store(Arc::new(RoutingTable::build(&state.implementations)));
            let deliveries = state.refresh_listeners();
            self.notifications.lock().pending.extend(deliveries);
            result
        };
        self.drain_notifications();
        result
    }

    /// 依次派发队列中的通知。
    ///
    /// 已有投递者（可能是本线程外层的回调）时直接返回，由它接着派发新入队的通知。
    /// 单线程下注册返回时，本次变更引起的通知都已送达。
    fn drain_notifications(&self) {
        {
            let mut queue = self.notifications.lock();
            if queue.draining || queue.pending.is_empty() {
                return;
            }
            queue.draining = true;
        }
        let _guard = DrainGuard {
            notifications: &self.notifications,
        };
        loop {
            let next = self.notifications.lock().pending.pop_front();
            match next {
                Some(delivery) => delivery.deliver(),
                None => break,
            }
        }
    }

    fn remove_implementation(&self, registration: u64) {
        self.mutate(|state| {
            let before = state.implementations.len();
            state
                .implementations
                .retain(|entry| entry.registration != registration);
            if state.implementations.len() != before {
                debug!(registration, "RPC implementation unregistered");
            }
        });
    }

    fn remove_listener(&self, registration: u64) {
        self.mutate(|state| {
            state
                .listeners
                .retain(|entry| entry.registration != registration);
            debug!(registration, "RPC availability listener unregistered");
        });
    }
}

impl RouterState {
    /// 某个监听器此刻应当看到的可用标识符，按注册顺序去重。
    fn view_for(&self, listener: &dyn RpcAvailabilityListener) -> Vec<RpcIdentifier> {
        let mut seen = HashSet::new();
        let mut view = Vec::new();
        for entry in &self.implementations {
            if !listener.accepts_implementation(&*entry.implementation) {
                continue;
            }
            for rpc in &entry.rpcs {
                if seen.insert(rpc.clone()) {
                    view.push(rpc.clone());
                }
            }
        }
        view
    }

    fn refresh_listeners(&mut self) -> Vec<Delivery> {
        let views: Vec<Vec<RpcIdentifier>> = self
            .listeners
            .iter()
            .map(|entry| self.view_for(&*entry.listener))
            .collect();

        let mut deliveries = Vec::new();
        for (entry, view) in self.listeners.iter_mut().zip(views) {
            let visible: HashSet<&RpcIdentifier> = view.iter().collect();
            let announced: HashSet<&RpcIdentifier> = entry.announced.iter().collect();
            let removed: Vec<RpcIdentifier> = entry
                .announced
                .iter()
                .filter(|rpc| !visible.contains(rpc))
                .cloned()
                .collect();
            let added: Vec<RpcIdentifier> = view
                .iter()
                .filter(|rpc| !announced.contains(rpc))
                .cloned()
                .collect();
            if added.is_empty() && removed.is_empty() {
                continue;
            }
            deliveries.push(Delivery {
                listener: Arc::clone(&entry.listener),
                added,
                removed,
            });
            entry.announced = view;
        }
        deliveries
    }
}

impl Delivery {
    fn deliver(self) {
        if !self.removed.is_empty() {
            self.listener.on_rpc_unavailable(&self.removed);
        }
        if !self.added.is_empty() {
            self.listener.on_rpc_available(&self.added);
        }
    }
}

impl RpcService for DefaultRpcRouter {
    fn invoke_rpc(
        &self,
        rpc_type: &SchemaPath,
        input: Option<DataNode>,
    ) -> BoxFuture<'static, Result<RpcResult, RpcError>> {
        match self.select(rpc_type, input.as_ref()) {
            Ok(Some((implementation, rpc))) => {
                trace!(rpc = %rpc, "dispatching RPC");
                implementation.invoke_rpc(&rpc, input)
            }
            Ok(None) => {
                debug!(rpc = %rpc_type, "no implementation available");
                ready(Err(not_available(rpc_type)))
            }
            Err(error) => {
                warn!(rpc = %rpc_type, %error, "malformed context reference in RPC input");
                ready(Err(RpcError::failed(
                    format!("Invalid context reference for RPC {rpc_type}"),
                    error,
                )))
            }
        }
    }

    fn register_rpc_listener(
        &self,
        listener: Arc<dyn RpcAvailabilityListener>,
    ) -> ListenerRegistration<dyn RpcAvailabilityListener> {
        let registration = self.inner.next_registration();
        let replay = self.inner.config.replay_on_listen;
        let entry_listener = Arc::clone(&listener);
        self.inner.mutate(move |state| {
            let announced = if replay {
                Vec::new()
            } else {
                state.view_for(&*entry_listener)
            };
            state.listeners.push(ListenerEntry {
                registration,
                listener: entry_listener,
                announced,
            });
            debug!(registration, replay, "RPC availability listener registered");
        });

        let inner = Arc::downgrade(&self.inner);
        Registration::new(listener, move || {
            if let Some(inner) = Weak::upgrade(&inner) {
                inner.remove_listener(registration);
            }
        })
    }

    fn schema_context_listener(&self) -> Option<&dyn SchemaContextListener> {
        Some(self)
    }
}

impl RpcProviderService for DefaultRpcRouter {
    fn register_rpc_implementation(
        &self,
        implementation: Arc<dyn RpcImplementation>,
        rpcs: HashSet<RpcIdentifier>,
    ) -> ImplementationRegistration<dyn RpcImplementation> {
        if rpcs.is_empty() {
            warn!("ignoring RPC implementation registered without any RPC identifiers");
            return Registration::inert(implementation);
        }

        let registration = self.inner.next_registration();
        let cost = implementation.invocation_cost();
        let entry = ImplementationEntry {
            registration,
            cost,
            implementation: Arc::clone(&implementation),
            rpcs: rpcs.into_iter().collect(),
        };
        self.inner.mutate(move |state| {
            debug!(registration, cost, rpcs = entry.rpcs.len(), "RPC implementation registered");
            state.implementations.push(entry);
        });

        let inner = Arc::downgrade(&self.inner);
        Registration::new(implementation, move || {
            if let Some(inner) = Weak::upgrade(&inner) {
                inner.remove_implementation(registration);
            }
        })
    }
}

impl SchemaContextListener for DefaultRpcRouter {
    fn on_global_context_updated(&self, context: Arc<SchemaContext>) {
        let rpcs = context.len();
        self.inner.schema.store(context);
        let generation = self.inner.schema_generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(generation, rpcs, "schema context updated");
    }
}
