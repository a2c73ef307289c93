//! 旧版契约门面的集成测试入口。
//!
//! - `invocation`：调用转发、结果转换与三类错误映射；
//! - `registration`：注册句柄的幂等关闭、映射清理与门面关闭；
//! - `listeners`：监听器包装、默认接受与可用性事件转换；
//! - `concurrency`：多线程并发注册与注销。

mod concurrency;
mod invocation;
mod registration;
mod support;
