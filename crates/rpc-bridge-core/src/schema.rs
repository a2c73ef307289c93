//! Schema 上下文：路由器需要了解的 RPC 定义集合。
//!
//! 路由器只关心一件事：某个 RPC 是否为“带路由上下文”的 RPC，
//! 以及上下文引用在输入载荷中的字段名。

use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::path::SchemaPath;

/// 单个 RPC 的定义。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcDefinition {
    pub path: SchemaPath,
    /// 输入载荷中承载上下文引用的字段；`None` 表示全局 RPC。
    #[serde(default)]
    pub context_field: Option<String>,
}

impl RpcDefinition {
    pub fn global(path: SchemaPath) -> Self {
        Self {
            path,
            context_field: None,
        }
    }

    pub fn routed(path: SchemaPath, context_field: impl Into<String>) -> Self {
        Self {
            path,
            context_field: Some(context_field.into()),
        }
    }

    pub fn is_routed(&self) -> bool {
        self.context_field.is_some()
    }
}

/// 一次全局 Schema 快照。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaContext {
    rpcs: HashMap<SchemaPath, RpcDefinition>,
}

impl SchemaContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(definitions: impl IntoIterator<Item = RpcDefinition>) -> Self {
        Self {
            rpcs: definitions
                .into_iter()
                .map(|definition| (definition.path.clone(), definition))
                .collect(),
        }
    }

    pub fn with_rpc(mut self, definition: RpcDefinition) -> Self {
        self.rpcs.insert(definition.path.clone(), definition);
        self
    }

    pub fn rpc(&self, path: &SchemaPath) -> Option<&RpcDefinition> {
        self.rpcs.get(path)
    }

    pub fn len(&self) -> usize {
        self.rpcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rpcs.is_empty()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &RpcDefinition> {
        self.rpcs.values()
    }
}

/// 全局 Schema 变更的接收方。
///
/// 这是一个可选能力：服务通过 [`crate::current::RpcService::schema_context_listener`]
/// 声明自己是否参与通知。
pub trait SchemaContextListener: Send + Sync {
    fn on_global_context_updated(&self, context: Arc<SchemaContext>);
}
