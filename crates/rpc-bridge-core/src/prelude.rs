//! 常用类型的一站式导入。
//!
//! 两代契约的同名类型（`RpcIdentifier`、`RpcResult`……）不在此展开，
//! 调用方仍通过 `legacy::`/`current::` 前缀区分，避免混淆版本。

pub use crate::{
    DEFAULT_INVOCATION_COST,
    current, legacy,
    future::{BoxError, BoxFuture},
    path::{InstancePath, PathArgument, QName, SchemaPath},
    registration::{ImplementationRegistration, ListenerRegistration, Registration},
    result::{DataNode, ErrorSeverity, ErrorType, RpcDiagnostic},
    schema::{RpcDefinition, SchemaContext, SchemaContextListener},
    translate::{ErrorTranslator, RpcErrorTaxonomy, TO_CURRENT, TO_LEGACY},
};
