//! 当前 RPC 派发契约。
//!
//! 新组件与默认路由器都基于这一代接口；服务 Trait 全部对象安全，
//! 便于门面以 `Arc<dyn RpcService>` 的形式持有任意实现。

mod error;
mod identifier;
mod result;
mod service;

pub use error::RpcError;
pub use identifier::RpcIdentifier;
pub use result::RpcResult;
pub use service::{RpcAvailabilityListener, RpcImplementation, RpcProviderService, RpcService};
