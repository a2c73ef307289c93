use crate::{
    current,
    result::{DataNode, RpcDiagnostic},
};

/// 旧版契约的 RPC 结果。
///
/// 与当前契约的结果字段一致；两者互转只移动字段，不复制载荷。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RpcResult {
    value: Option<DataNode>,
    errors: Vec<RpcDiagnostic>,
}

impl RpcResult {
    pub fn new(value: Option<DataNode>) -> Self {
        Self {
            value,
            errors: Vec::new(),
        }
    }

    pub fn with_errors(value: Option<DataNode>, errors: Vec<RpcDiagnostic>) -> Self {
        Self { value, errors }
    }

    pub fn value(&self) -> Option<&DataNode> {
        self.value.as_ref()
    }

    pub fn errors(&self) -> &[RpcDiagnostic] {
        &self.errors
    }

    pub fn into_parts(self) -> (Option<DataNode>, Vec<RpcDiagnostic>) {
        (self.value, self.errors)
    }
}

impl From<current::RpcResult> for RpcResult {
    fn from(value: current::RpcResult) -> Self {
        let (value, errors) = value.into_parts();
        Self { value, errors }
    }
}
