//! 门面的实现映射：旧版实现与其适配器之间的对应关系。
//!
//! # 设计概览（Why）
//! - 监听器包装需要从“当前契约的实现”反查“旧版原始实现”，才能调用旧版的
//!   `accepts_implementation` 判定；
//! - 记录以 [`RegistrationId`] 为键，并以适配器地址建立二级索引；
//! - 注销时同步删除记录，映射从不在注销后继续持有实现。
//!
//! # 并发（How）
//! - 注册与注销由可重入锁串行化，底层提供者在注册期间回调查询不会自锁；
//! - 查询只读 `DashMap`，不获取注册锁；
//! - 调用底层 `close` 之前释放全部分片守卫。

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use dashmap::DashMap;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use rpc_bridge_core::{
    ImplementationRegistration, ListenerRegistration, current, legacy,
};
use tracing::trace;

/// 门面内部的注册编号。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(u64);

impl RegistrationId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reg-{}", self.0)
    }
}

/// 以数据指针地址标识一个当前契约的实现。
///
/// 记录持有适配器的 `Arc`，地址在记录删除前不会被复用。
pub(crate) fn adapter_key(implementation: &dyn current::RpcImplementation) -> usize {
    (implementation as *const dyn current::RpcImplementation).cast::<()>() as usize
}

struct RegistrationRecord {
    original: Arc<dyn legacy::RpcImplementation>,
    adapter: Arc<dyn current::RpcImplementation>,
    underlying: Option<ImplementationRegistration<dyn current::RpcImplementation>>,
}

pub(crate) struct ImplementationMapping {
    lock: ReentrantMutex<()>,
    next_id: AtomicU64,
    records: DashMap<RegistrationId, RegistrationRecord>,
    by_adapter: DashMap<usize, RegistrationId>,
    listeners: DashMap<RegistrationId, ListenerRegistration<dyn current::RpcAvailabilityListener>>,
}

impl ImplementationMapping {
    pub(crate) fn new() -> Self {
        Self {
            lock: ReentrantMutex::new(()),
            next_id: AtomicU64::new(1),
            records: DashMap::new(),
            by_adapter: DashMap::new(),
            listeners: DashMap::new(),
        }
    }

    /// 获取注册/注销的串行化锁。
    pub(crate) fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.lock.lock()
    }

    pub(crate) fn next_id(&self) -> RegistrationId {
        RegistrationId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// 在向底层注册之前登记映射，底层注册期间的回调即可查到原始实现。
    pub(crate) fn insert(
        &self,
        id: RegistrationId,
        original: Arc<dyn legacy::RpcImplementation>,
        adapter: Arc<dyn current::RpcImplementation>,
    ) {
        let key = adapter_key(&*adapter);
        self.by_adapter.insert(key, id);
        self.records.insert(
            id,
            RegistrationRecord {
                original,
                adapter,
                underlying: None,
            },
        );
    }

    /// 挂上底层注册句柄；记录已被并发注销时立即关闭该句柄。
    pub(crate) fn attach(
        &self,
        id: RegistrationId,
        underlying: ImplementationRegistration<dyn current::RpcImplementation>,
    ) {
        let orphan = match self.records.get_mut(&id) {
            Some(mut record) => {
                record.underlying = Some(underlying);
                None
            }
            None => Some(underlying),
        };
        if let Some(orphan) = orphan {
            trace!(registration = %id, "closing registration detached before attach");
            orphan.close();
        }
    }

    /// 由适配器反查旧版原始实现。
    pub(crate) fn lookup(
        &self,
        implementation: &dyn current::RpcImplementation,
    ) -> Option<Arc<dyn legacy::RpcImplementation>> {
        let id = *self.by_adapter.get(&adapter_key(implementation))?;
        let record = self.records.get(&id)?;
        Some(Arc::clone(&record.original))
    }

    /// 注销一条实现注册：先关闭底层注册，再删除索引与记录。重复调用无副作用。
    pub(crate) fn release(&self, id: RegistrationId) {
        let _serialized = self.lock();
        let underlying = match self.records.get_mut(&id) {
            Some(mut record) => record.underlying.take(),
            None => return,
        };
        if let Some(underlying) = underlying {
            underlying.close();
        }
        let removed = self.records.remove(&id);
        if let Some((_, record)) = &removed {
            self.by_adapter.remove(&adapter_key(&*record.adapter));
        }
        trace!(registration = %id, "implementation mapping released");
        drop(removed);
    }

    pub(crate) fn insert_listener(
        &self,
        id: RegistrationId,
        underlying: ListenerRegistration<dyn current::RpcAvailabilityListener>,
    ) {
        self.listeners.insert(id, underlying);
    }

    pub(crate) fn release_listener(&self, id: RegistrationId) {
        let _serialized = self.lock();
        let removed = self.listeners.remove(&id);
        if let Some((_, underlying)) = removed {
            underlying.close();
            trace!(registration = %id, "listener mapping released");
        }
    }

    /// 注销全部尚未关闭的注册。
    pub(crate) fn release_all(&self) {
        let _serialized = self.lock();
        let implementations: Vec<RegistrationId> =
            self.records.iter().map(|record| *record.key()).collect();
        for id in implementations {
            self.release(id);
        }
        let listeners: Vec<RegistrationId> =
            self.listeners.iter().map(|listener| *listener.key()).collect();
        for id in listeners {
            self.release_listener(id);
        }
    }

    pub(crate) fn implementation_count(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
