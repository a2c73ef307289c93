#![allow(dead_code)]

//! 门面测试共用的实现、监听器与提供者桩。

use std::{
    collections::HashSet,
    io,
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;
use rpc_bridge_core::{
    BoxError, DataNode, ImplementationRegistration, InstancePath, Registration, SchemaPath,
    current,
    future::{BoxFuture, ready},
    legacy,
};
use serde_json::json;

pub fn schema_path(raw: &str) -> SchemaPath {
    raw.parse().expect("schema path")
}

pub fn instance_path(raw: &str) -> InstancePath {
    raw.parse().expect("instance path")
}

pub fn global(raw: &str) -> legacy::RpcIdentifier {
    legacy::RpcIdentifier::global(schema_path(raw))
}

pub fn scoped(raw: &str, context: &str) -> legacy::RpcIdentifier {
    legacy::RpcIdentifier::create(schema_path(raw), Some(instance_path(context)))
}

/// 回显输入并记录调用的旧版实现。
pub struct Echo {
    name: &'static str,
    cost: u64,
    seen: Mutex<Vec<legacy::RpcIdentifier>>,
}

impl Echo {
    pub fn new(name: &'static str) -> Arc<Self> {
        Self::with_cost(name, 0)
    }

    pub fn with_cost(name: &'static str, cost: u64) -> Arc<Self> {
        Arc::new(Self {
            name,
            cost,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn seen(&self) -> Vec<legacy::RpcIdentifier> {
        self.seen.lock().clone()
    }
}

impl legacy::RpcImplementation for Echo {
    fn invoke_rpc(
        &self,
        rpc: &legacy::RpcIdentifier,
        input: Option<DataNode>,
    ) -> BoxFuture<'static, Result<legacy::RpcResult, BoxError>> {
        self.seen.lock().push(rpc.clone());
        ready(Ok(legacy::RpcResult::new(Some(json!({
            "handled_by": self.name,
            "input": input,
        })))))
    }

    fn invocation_cost(&self) -> u64 {
        self.cost
    }
}

/// 以固定错误失败的旧版实现。
pub struct Failing {
    error: fn() -> BoxError,
}

impl Failing {
    pub fn new(error: fn() -> BoxError) -> Arc<Self> {
        Arc::new(Self { error })
    }

    pub fn disk_full() -> BoxError {
        Box::new(io::Error::other("disk full"))
    }

    pub fn quota_exceeded() -> BoxError {
        Box::new(legacy::RpcError::failed("quota exceeded"))
    }

    pub fn device_offline() -> BoxError {
        Box::new(legacy::RpcError::not_available("device offline"))
    }
}

impl legacy::RpcImplementation for Failing {
    fn invoke_rpc(
        &self,
        _rpc: &legacy::RpcIdentifier,
        _input: Option<DataNode>,
    ) -> BoxFuture<'static, Result<legacy::RpcResult, BoxError>> {
        ready(Err((self.error)()))
    }
}

/// 直接以当前契约编写、未经门面注册的实现。
pub struct NativeImplementation;

impl current::RpcImplementation for NativeImplementation {
    fn invoke_rpc(
        &self,
        _rpc: &current::RpcIdentifier,
        _input: Option<DataNode>,
    ) -> BoxFuture<'static, Result<current::RpcResult, current::RpcError>> {
        ready(Ok(current::RpcResult::new(Some(json!("native")))))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Available(Vec<legacy::RpcIdentifier>),
    Unavailable(Vec<legacy::RpcIdentifier>),
}

/// 记录可用性事件的旧版监听器。
///
/// `reject_cost` 为 `Some(cost)` 时拒绝该成本的实现，用于区分不同实现。
#[derive(Default)]
pub struct RecordingListener {
    reject_cost: Option<u64>,
    events: Mutex<Vec<Event>>,
    accepts_calls: AtomicUsize,
}

impl RecordingListener {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rejecting_cost(cost: u64) -> Arc<Self> {
        Arc::new(Self {
            reject_cost: Some(cost),
            ..Self::default()
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn accepts_calls(&self) -> usize {
        self.accepts_calls.load(Ordering::SeqCst)
    }

    /// 按事件顺序折叠出当前可见的标识符集合。
    pub fn visible(&self) -> HashSet<legacy::RpcIdentifier> {
        let mut visible = HashSet::new();
        for event in self.events.lock().iter() {
            match event {
                Event::Available(rpcs) => visible.extend(rpcs.iter().cloned()),
                Event::Unavailable(rpcs) => {
                    for rpc in rpcs {
                        visible.remove(rpc);
                    }
                }
            }
        }
        visible
    }
}

impl legacy::RpcAvailabilityListener for RecordingListener {
    fn on_rpc_available(&self, rpcs: &[legacy::RpcIdentifier]) {
        self.events.lock().push(Event::Available(rpcs.to_vec()));
    }

    fn on_rpc_unavailable(&self, rpcs: &[legacy::RpcIdentifier]) {
        self.events.lock().push(Event::Unavailable(rpcs.to_vec()));
    }

    fn accepts_implementation(&self, implementation: &dyn legacy::RpcImplementation) -> bool {
        self.accepts_calls.fetch_add(1, Ordering::SeqCst);
        self.reject_cost != Some(implementation.invocation_cost())
    }
}

type Registered = (
    u64,
    Arc<dyn current::RpcImplementation>,
    HashSet<current::RpcIdentifier>,
);

/// 统计注册与注销次数的当前契约提供者。
#[derive(Default)]
pub struct CountingProvider {
    next: AtomicU64,
    registrations: AtomicUsize,
    unregistrations: Arc<AtomicUsize>,
    live: Arc<Mutex<Vec<Registered>>>,
}

impl CountingProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    pub fn unregistrations(&self) -> usize {
        self.unregistrations.load(Ordering::SeqCst)
    }

    /// 当前仍处于注册状态的适配器及其标识符。
    pub fn live(&self) -> Vec<(Arc<dyn current::RpcImplementation>, HashSet<current::RpcIdentifier>)> {
        self.live
            .lock()
            .iter()
            .map(|(_, implementation, rpcs)| (Arc::clone(implementation), rpcs.clone()))
            .collect()
    }
}

impl current::RpcProviderService for CountingProvider {
    fn register_rpc_implementation(
        &self,
        implementation: Arc<dyn current::RpcImplementation>,
        rpcs: HashSet<current::RpcIdentifier>,
    ) -> ImplementationRegistration<dyn current::RpcImplementation> {
        let sequence = self.next.fetch_add(1, Ordering::SeqCst);
        self.registrations.fetch_add(1, Ordering::SeqCst);
        self.live
            .lock()
            .push((sequence, Arc::clone(&implementation), rpcs));

        let unregistrations = Arc::clone(&self.unregistrations);
        let live = Arc::clone(&self.live);
        Registration::new(implementation, move || {
            unregistrations.fetch_add(1, Ordering::SeqCst);
            live.lock().retain(|(entry, _, _)| *entry != sequence);
        })
    }
}
