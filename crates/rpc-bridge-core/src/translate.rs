//! 错误翻译器：把任意失败原因归入某一代契约的错误分类。
//!
//! # 模型（What）
//! - 两代契约各有一套错误分类（[`crate::legacy::RpcError`] 与 [`crate::current::RpcError`]），
//!   二者都实现 [`RpcErrorTaxonomy`]；
//! - [`ErrorTranslator<S, T>`] 以“来源分类 `S`、目标分类 `T`、包装策略 [`WrapPolicy`]”参数化，
//!   同一套逻辑实例化两次：[`TO_LEGACY`] 与 [`TO_CURRENT`]。
//!
//! # 翻译规则（How）
//! 1. 失败原因本身已是目标分类：原样透传，不再包装；
//! 2. 失败原因是来源分类的“实现不可用”：改写为目标分类的“实现不可用”，保留消息与原因链；
//! 3. 失败原因是来源分类的通用失败，且其原因已是目标分类：取出该原因透传，避免双重包装；
//! 4. 其余情况：包装为目标分类的通用失败，原错误作为 `source`。

use std::{error::Error, fmt, marker::PhantomData};

use crate::{current, future::BoxError, legacy};

/// 错误分类中的两种形态。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RpcErrorKind {
    /// 调用时没有可用的实现。
    ImplementationNotAvailable,
    /// 其余任何失败。
    Failed,
}

/// 一代契约的错误分类需要提供的构造与拆解能力。
pub trait RpcErrorTaxonomy: Error + Send + Sync + Sized + 'static {
    /// 构造“实现不可用”错误。
    fn not_available(message: String, source: Option<BoxError>) -> Self;

    /// 构造通用失败，`source` 为被包装的原始错误。
    fn failed(message: String, source: Option<BoxError>) -> Self;

    fn kind(&self) -> RpcErrorKind;

    /// 拆出消息与原因，供跨分类重建使用。
    fn into_parts(self) -> (String, Option<BoxError>);
}

/// 翻译器的包装策略。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WrapPolicy {
    /// 包装通用失败时使用的消息。
    pub failure_message: &'static str,
    /// 是否把来源分类的“实现不可用”改写为目标分类的同类错误。
    pub rewrap_not_available: bool,
    /// 来源分类的通用失败若只是目标分类错误的外壳，是否直接取出内部错误。
    pub unwrap_target_cause: bool,
}

impl WrapPolicy {
    pub const DEFAULT: Self = Self {
        failure_message: "RPC failed",
        rewrap_not_available: true,
        unwrap_target_cause: true,
    };
}

impl Default for WrapPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// 单一的错误翻译机制。
pub struct ErrorTranslator<S, T> {
    policy: WrapPolicy,
    _taxonomies: PhantomData<fn(S) -> T>,
}

/// 产出旧版分类错误的翻译器：供门面在旧版调用方边界使用。
pub const TO_LEGACY: ErrorTranslator<current::RpcError, legacy::RpcError> =
    ErrorTranslator::new(WrapPolicy::DEFAULT);

/// 产出当前分类错误的翻译器：供适配器在旧版实现的返回路径上使用。
pub const TO_CURRENT: ErrorTranslator<legacy::RpcError, current::RpcError> =
    ErrorTranslator::new(WrapPolicy::DEFAULT);

impl<S, T> ErrorTranslator<S, T>
where
    S: RpcErrorTaxonomy,
    T: RpcErrorTaxonomy,
{
    pub const fn new(policy: WrapPolicy) -> Self {
        Self {
            policy,
            _taxonomies: PhantomData,
        }
    }

    pub fn policy(&self) -> &WrapPolicy {
        &self.policy
    }

    /// 翻译任意失败原因。
    pub fn translate(&self, error: BoxError) -> T {
        let error = match error.downcast::<T>() {
            Ok(already_target) => return *already_target,
            Err(other) => other,
        };
        match error.downcast::<S>() {
            Ok(source) => self.translate_source(*source),
            Err(other) => T::failed(self.policy.failure_message.to_owned(), Some(other)),
        }
    }

    /// 翻译一个来源分类错误。
    pub fn translate_source(&self, error: S) -> T {
        match error.kind() {
            RpcErrorKind::ImplementationNotAvailable if self.policy.rewrap_not_available => {
                let (message, cause) = error.into_parts();
                T::not_available(message, cause)
            }
            RpcErrorKind::Failed
                if self.policy.unwrap_target_cause && error.source().is_some_and(|c| c.is::<T>()) =>
            {
                let (message, cause) = error.into_parts();
                match cause.map(|cause| cause.downcast::<T>()) {
                    Some(Ok(target)) => *target,
                    Some(Err(cause)) => T::failed(message, Some(cause)),
                    None => T::failed(message, None),
                }
            }
            _ => T::failed(
                self.policy.failure_message.to_owned(),
                Some(Box::new(error)),
            ),
        }
    }
}

impl<S, T> Clone for ErrorTranslator<S, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, T> Copy for ErrorTranslator<S, T> {}

impl<S, T> fmt::Debug for ErrorTranslator<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorTranslator")
            .field("source", &std::any::type_name::<S>())
            .field("target", &std::any::type_name::<T>())
            .field("policy", &self.policy)
            .finish()
    }
}
