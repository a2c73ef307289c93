//! 旧版 RPC 派发契约。
//!
//! 平台迁移期间，仍有组件只认识这一代接口：标识符以“类型 + 规范化上下文路径”表达，
//! 服务与提供者 Trait 以泛型返回调用方注册的原始对象。
//! 本模块只定义契约；桥接到当前契约的门面位于 `rpc-bridge-router`。

mod error;
mod identifier;
mod result;
mod service;

pub use error::RpcError;
pub use identifier::RpcIdentifier;
pub use result::RpcResult;
pub use service::{RpcAvailabilityListener, RpcImplementation, RpcProviderService, RpcService};
