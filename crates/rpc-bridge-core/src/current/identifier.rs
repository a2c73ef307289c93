use std::fmt;

use crate::{
    legacy,
    path::{InstancePath, SchemaPath},
};

#[derive(Clone, PartialEq, Eq, Hash)]
enum Scope {
    Global,
    Local(InstancePath),
}

/// 当前契约的 RPC 标识符。
///
/// # 契约说明（What）
/// - 内部区分全局与局部两种作用域；局部作用域的上下文路径保证非空；
/// - [`RpcIdentifier::create`] 把 `None` 与空路径都归一为全局作用域；
/// - [`RpcIdentifier::context_reference`] 对全局标识符返回共享的空路径，对外永不缺席。
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RpcIdentifier {
    rpc_type: SchemaPath,
    scope: Scope,
}

impl RpcIdentifier {
    pub fn global(rpc_type: SchemaPath) -> Self {
        Self {
            rpc_type,
            scope: Scope::Global,
        }
    }

    pub fn create(rpc_type: SchemaPath, context_reference: Option<InstancePath>) -> Self {
        match context_reference {
            Some(context) if !context.is_empty() => Self {
                rpc_type,
                scope: Scope::Local(context),
            },
            _ => Self::global(rpc_type),
        }
    }

    pub fn rpc_type(&self) -> &SchemaPath {
        &self.rpc_type
    }

    pub fn context_reference(&self) -> &InstancePath {
        match &self.scope {
            Scope::Global => InstancePath::empty_ref(),
            Scope::Local(context) => context,
        }
    }

    /// 局部作用域的上下文；全局标识符返回 `None`。
    pub fn context(&self) -> Option<&InstancePath> {
        match &self.scope {
            Scope::Global => None,
            Scope::Local(context) => Some(context),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self.scope, Scope::Global)
    }
}

impl From<&legacy::RpcIdentifier> for RpcIdentifier {
    fn from(value: &legacy::RpcIdentifier) -> Self {
        value.to_current()
    }
}

impl From<legacy::RpcIdentifier> for RpcIdentifier {
    fn from(value: legacy::RpcIdentifier) -> Self {
        value.to_current()
    }
}

impl fmt::Debug for RpcIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Scope::Global => f
                .debug_struct("Global")
                .field("type", &format_args!("{}", self.rpc_type))
                .finish(),
            Scope::Local(context) => f
                .debug_struct("Local")
                .field("type", &format_args!("{}", self.rpc_type))
                .field("contextReference", &format_args!("{context}"))
                .finish(),
        }
    }
}

impl fmt::Display for RpcIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Scope::Global => write!(f, "{}", self.rpc_type),
            Scope::Local(context) => write!(f, "{}@{}", self.rpc_type, context),
        }
    }
}
