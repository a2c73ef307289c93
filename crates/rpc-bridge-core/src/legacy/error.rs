use thiserror::Error;

use crate::{
    future::BoxError,
    translate::{RpcErrorKind, RpcErrorTaxonomy},
};

/// 旧版契约的 RPC 错误分类。
///
/// 旧版调用方无论底层由哪一代实现产生失败，观察到的都是本类型。
#[derive(Debug, Error)]
pub enum RpcError {
    /// 调用时没有已注册的实现。
    #[error("{message}")]
    ImplementationNotAvailable {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
    /// 实现或底层提供者报告的其他失败。
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl RpcError {
    /// 无原因的“实现不可用”错误。
    pub fn not_available(message: impl Into<String>) -> Self {
        Self::ImplementationNotAvailable {
            message: message.into(),
            source: None,
        }
    }

    /// 无原因的通用失败。
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            source: None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::ImplementationNotAvailable { message, .. } | Self::Failed { message, .. } => {
                message
            }
        }
    }

    pub fn is_not_available(&self) -> bool {
        matches!(self, Self::ImplementationNotAvailable { .. })
    }
}

impl RpcErrorTaxonomy for RpcError {
    fn not_available(message: String, source: Option<BoxError>) -> Self {
        Self::ImplementationNotAvailable { message, source }
    }

    fn failed(message: String, source: Option<BoxError>) -> Self {
        Self::Failed { message, source }
    }

    fn kind(&self) -> RpcErrorKind {
        match self {
            Self::ImplementationNotAvailable { .. } => RpcErrorKind::ImplementationNotAvailable,
            Self::Failed { .. } => RpcErrorKind::Failed,
        }
    }

    fn into_parts(self) -> (String, Option<BoxError>) {
        match self {
            Self::ImplementationNotAvailable { message, source }
            | Self::Failed { message, source } => (message, source),
        }
    }
}
