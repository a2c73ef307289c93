//! 注册句柄：实现注册与监听器注册共用的幂等释放令牌。
//!
//! # 行为契约（What）
//! - 句柄持有调用方注册的原始对象，[`Registration::instance`] 原样返还；
//! - [`Registration::close`] 至多执行一次释放动作，重复调用无副作用；
//! - 句柄被丢弃时自动释放，调用方需持有句柄直到希望注销为止。
//!
//! # 并发
//! - 释放动作在取出后、于锁外执行，释放过程中回调重入同一句柄的 `close` 只会看到“已关闭”。

use std::{fmt, sync::Arc};

use parking_lot::Mutex;

type ReleaseAction = Box<dyn FnOnce() + Send + 'static>;

/// 活跃注册的令牌。
#[must_use = "dropping a registration closes it immediately"]
pub struct Registration<T: ?Sized> {
    instance: Arc<T>,
    release: Mutex<Option<ReleaseAction>>,
}

/// 实现注册句柄。
pub type ImplementationRegistration<T> = Registration<T>;

/// 可用性监听器注册句柄。
pub type ListenerRegistration<T> = Registration<T>;

impl<T: ?Sized> Registration<T> {
    /// 以给定的释放动作构造句柄。
    pub fn new(instance: Arc<T>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            instance,
            release: Mutex::new(Some(Box::new(release))),
        }
    }

    /// 构造一个无需释放任何资源的句柄，例如底层拒绝了空的标识符集合。
    pub fn inert(instance: Arc<T>) -> Self {
        Self {
            instance,
            release: Mutex::new(None),
        }
    }

    /// 注册时提交的原始对象。
    pub fn instance(&self) -> &Arc<T> {
        &self.instance
    }

    /// 是否已释放。
    pub fn is_closed(&self) -> bool {
        self.release.lock().is_none()
    }

    /// 释放注册；幂等。
    pub fn close(&self) {
        let release = self.release.lock().take();
        if let Some(release) = release {
            release();
        }
    }
}

impl<T: ?Sized> Drop for Registration<T> {
    fn drop(&mut self) {
        if let Some(release) = self.release.get_mut().take() {
            release();
        }
    }
}

impl<T: ?Sized> fmt::Debug for Registration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
