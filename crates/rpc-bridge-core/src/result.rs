//! 两代契约共享的结果载荷与诊断条目。

use std::fmt;

use serde::{Deserialize, Serialize};

/// RPC 输入/输出载荷。
///
/// 数据树以 JSON 值表达；本层只搬运载荷，不解释其结构（路由上下文字段除外）。
pub type DataNode = serde_json::Value;

/// 诊断条目的严重级别。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorSeverity {
    Error,
    Warning,
}

/// 诊断条目所属的层次。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorType {
    Transport,
    Rpc,
    Protocol,
    Application,
}

/// RPC 结果中附带的一条诊断信息。
///
/// # 契约说明（What）
/// - 诊断不等于调用失败：RPC 可以成功返回，同时附带若干 `Warning`；
/// - `tag` 采用稳定的机器可读标签（如 `operation-failed`），`message` 面向人类。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcDiagnostic {
    pub severity: ErrorSeverity,
    pub error_type: ErrorType,
    pub tag: String,
    pub message: String,
}

impl RpcDiagnostic {
    pub fn error(error_type: ErrorType, tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ErrorSeverity::Error,
            error_type,
            tag: tag.into(),
            message: message.into(),
        }
    }

    pub fn warning(
        error_type: ErrorType,
        tag: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: ErrorSeverity::Warning,
            error_type,
            tag: tag.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RpcDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}/{:?} {}: {}",
            self.severity, self.error_type, self.tag, self.message
        )
    }
}
