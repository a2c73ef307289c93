use thiserror::Error;

use crate::{
    future::BoxError,
    translate::{RpcErrorKind, RpcErrorTaxonomy},
};

/// 当前契约的 RPC 错误分类。
#[derive(Debug, Error)]
pub enum RpcError {
    /// 没有可处理该调用的实现。
    #[error("{message}")]
    ImplementationNotAvailable {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
    /// 其他失败，原始错误保存在 `source` 中。
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl RpcError {
    pub fn not_available(message: impl Into<String>) -> Self {
        Self::ImplementationNotAvailable {
            message: message.into(),
            source: None,
        }
    }

    pub fn failed(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Failed {
            message: message.into(),
            source: Some(source.into()),
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
