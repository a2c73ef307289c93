//! 路由器配置。
//!
//! 配置以 TOML 描述，全部字段可省略：
//!
//! ```toml
//! replay_on_listen = true
//! routing_fallback_to_global = true
//!
//! [[rpc]]
//! path = "/inventory:reset-node"
//! context_field = "node"
//! ```
//!
//! `[[rpc]]` 条目构成路由器的初始 Schema 上下文，之后可被全局 Schema 变更覆盖。

use rpc_bridge_core::{RpcDefinition, SchemaContext};
use serde::Deserialize;
use thiserror::Error;

/// 配置加载失败。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid router configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// [`crate::DefaultRpcRouter`] 的行为开关。
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// 新注册的监听器是否立即收到当前已可用的标识符。
    pub replay_on_listen: bool,
    /// 带路由上下文的调用找不到精确匹配时，是否退回全局实现。
    pub routing_fallback_to_global: bool,
    /// 初始 RPC 定义。
    pub rpc: Vec<RpcDefinition>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            replay_on_listen: true,
            routing_fallback_to_global: true,
            rpc: Vec::new(),
        }
    }
}

impl RouterConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// 由 `[[rpc]]` 条目构造初始 Schema 上下文。
    pub fn initial_schema(&self) -> SchemaContext {
        SchemaContext::from_definitions(self.rpc.iter().cloned())
    }
}
