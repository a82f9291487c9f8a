//! AOP 错误类型

use thiserror::Error;
use vernal_core::ContainerError;

pub type AopResult<T> = Result<T, AopError>;

/// AOP 错误
#[derive(Debug, Error)]
pub enum AopError {
    /// 代理配置已冻结，不再接受 advisor 变更
    #[error("proxy configuration is frozen: no advice changes are accepted")]
    ConfigurationFrozen,

    /// 代理的接口表中没有这个方法
    #[error("no method '{method}' declared on the proxied interfaces of '{target}'")]
    UnknownMethod { target: String, method: String },

    /// advisor 下标越界
    #[error("advisor index {index} out of bounds: {count} advisor(s) registered")]
    AdvisorIndexOutOfBounds { index: usize, count: usize },

    /// 对象池在超时时间内没有可用目标
    #[error("no pooled target of '{type_name}' became available within {timeout_ms}ms")]
    PoolExhausted { type_name: String, timeout_ms: u64 },

    /// 目标来自容器时的容器错误
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// 目标方法或通知抛出的业务错误
    #[error(transparent)]
    Invocation(#[from] anyhow::Error),
}

// 工厂 Bean 等容器侧接口返回 ContainerResult；把 AOP 侧错误换装
impl From<AopError> for ContainerError {
    fn from(err: AopError) -> Self {
        match err {
            AopError::Container(inner) => inner,
            other => ContainerError::Other(anyhow::anyhow!(other)),
        }
    }
}
