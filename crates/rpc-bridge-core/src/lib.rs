#![deny(unsafe_code)]
#![doc = "rpc-bridge-core: 新旧两代 RPC 派发契约的共享模型。"]
#![doc = ""]
#![doc = "== 模块分层 =="]
#![doc = "1. `path`/`schema`：RPC 类型路径、实例路径与 Schema 上下文，两代契约共用；"]
#![doc = "2. `legacy`/`current`：两代契约各自的标识符、结果、错误分类与服务 Trait；"]
#![doc = "3. `translate`：单一的错误翻译机制，按目标分类实例化两次；"]
#![doc = "4. `registration`：实现注册与监听器注册的幂等句柄。"]
#![doc = ""]
#![doc = "本 crate 不包含任何路由或派发逻辑，默认实现位于 `rpc-bridge-router`。"]

pub mod current;
pub mod future;
pub mod legacy;
pub mod path;
pub mod prelude;
pub mod registration;
pub mod result;
pub mod schema;
pub mod translate;

pub use future::{BoxError, BoxFuture};
pub use path::{InstancePath, PathArgument, PathParseError, QName, SchemaPath};
pub use registration::{ImplementationRegistration, ListenerRegistration, Registration};
pub use result::{DataNode, ErrorSeverity, ErrorType, RpcDiagnostic};
pub use schema::{RpcDefinition, SchemaContext, SchemaContextListener};
pub use translate::{ErrorTranslator, RpcErrorKind, RpcErrorTaxonomy, WrapPolicy};

/// 实现未显式声明调用成本时使用的默认值。
///
/// 路由器按成本升序挑选实现，成本相同则按注册顺序。
pub const DEFAULT_INVOCATION_COST: u64 = 0;
