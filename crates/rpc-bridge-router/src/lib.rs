#![deny(unsafe_code)]
#![doc = "rpc-bridge-router: 当前契约的默认路由器与旧版契约门面。"]
#![doc = ""]
#![doc = "== 组成 =="]
#![doc = "1. [`DefaultRpcRouter`]：内存中的当前契约实现，按成本与路由上下文挑选实现，向监听器广播可用性；"]
#![doc = "2. [`LegacyRpcRouter`]：在任意一对当前契约委托之上提供旧版契约；"]
#![doc = "3. [`RouterConfig`]：默认路由器的行为开关与初始 RPC 定义，可由 TOML 加载。"]
#![doc = ""]
#![doc = "库本身不安装任何 tracing subscriber。"]

mod adapter;
pub mod config;
mod default_router;
mod facade;
mod mapping;
mod table;

pub use config::{ConfigError, RouterConfig};
pub use default_router::DefaultRpcRouter;
pub use facade::LegacyRpcRouter;
pub use mapping::RegistrationId;
