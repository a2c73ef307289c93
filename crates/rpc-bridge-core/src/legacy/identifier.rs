use std::fmt;

use crate::{
    current,
    path::{InstancePath, SchemaPath},
};

/// 旧版 RPC 标识符：RPC 类型加上下文引用。
///
/// # 契约说明（What）
/// - 上下文引用对外永不缺席：未提供或为空时统一规范化为全局上下文（空路径）；
/// - 因此 `create(t, None)`、`create(t, Some(空路径))` 与 `global(t)` 相等且哈希一致；
/// - 相等性与哈希由类型与上下文两个字段共同决定。
///
/// # 转换
/// - [`RpcIdentifier::to_current`]/[`RpcIdentifier::from_current`] 互为逆运算，
///   只克隆路径的 `Arc`，不复制路径内容。
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RpcIdentifier {
    rpc_type: SchemaPath,
    context_reference: InstancePath,
}

impl RpcIdentifier {
    /// 全局标识符。
    pub fn global(rpc_type: SchemaPath) -> Self {
        Self {
            rpc_type,
            context_reference: InstancePath::empty(),
        }
    }

    /// 带上下文的标识符；`None` 或空路径均得到全局标识符。
    pub fn create(rpc_type: SchemaPath, context_reference: Option<InstancePath>) -> Self {
        match context_reference {
            Some(context_reference) => Self {
                rpc_type,
                context_reference,
            },
            None => Self::global(rpc_type),
        }
    }

    pub fn rpc_type(&self) -> &SchemaPath {
        &self.rpc_type
    }

    /// 上下文引用；全局标识符返回空路径。
    pub fn context_reference(&self) -> &InstancePath {
        &self.context_reference
    }

    pub fn is_global(&self) -> bool {
        self.context_reference.is_empty()
    }

    /// 转换为当前契约的标识符。
    pub fn to_current(&self) -> current::RpcIdentifier {
        current::RpcIdentifier::create(
            self.rpc_type.clone(),
            Some(self.context_reference.clone()),
        )
    }

    /// 由当前契约的标识符构造。
    pub fn from_current(from: &current::RpcIdentifier) -> Self {
        Self::create(from.rpc_type().clone(), Some(from.context_reference().clone()))
    }
}

impl From<&current::RpcIdentifier> for RpcIdentifier {
    fn from(value: &current::RpcIdentifier) -> Self {
        Self::from_current(value)
    }
}

impl From<current::RpcIdentifier> for RpcIdentifier {
    fn from(value: current::RpcIdentifier) -> Self {
        Self::from_current(&value)
    }
}

impl fmt::Debug for RpcIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcIdentifier")
            .field("type", &format_args!("{}", self.rpc_type))
            .field("contextReference", &format_args!("{}", self.context_reference))
            .finish()
    }
}

impl fmt::Display for RpcIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_global() {
            write!(f, "{}", self.rpc_type)
        } else {
            write!(f, "{}@{}", self.rpc_type, self.context_reference)
        }
    }
}
