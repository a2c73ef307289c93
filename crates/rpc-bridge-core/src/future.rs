use std::{error::Error, future::Future, pin::Pin};

/// `BoxFuture` 是两代 RPC 契约共用的异步结果包装。
///
/// # 契约说明（What）
/// - 约束 Future 为 `Send + 'a`，可安全跨线程；
/// - 所有调用结果均以 `BoxFuture<'static, _>` 返回，调用方无需持有服务借用即可等待结果。
///
/// # 执行语义
/// - 结果转换以组合子（`map`）的形式挂在底层 Future 之后，
///   由完成底层 Future 的执行器内联执行，不额外引入调度跳转。
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 任意来源的失败原因。
///
/// 实现方（尤其是旧版契约的实现）允许以任何错误失败，
/// 由 [`crate::translate::ErrorTranslator`] 在边界处统一归类。
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// 构造一个已就绪的 `BoxFuture`。
pub fn ready<T>(value: T) -> BoxFuture<'static, T>
where
    T: Send + 'static,
{
    Box::pin(std::future::ready(value))
}
