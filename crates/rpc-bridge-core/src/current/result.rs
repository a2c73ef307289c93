use crate::{
    legacy,
    result::{DataNode, RpcDiagnostic},
};

/// 当前契约的 RPC 结果。
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

impl From<legacy::RpcResult> for RpcResult {
    fn from(value: legacy::RpcResult) -> Self {
        let (value, errors) = value.into_parts();
        Self { value, errors }
    }
}
