//! 通知（Advice）定义
//!
//! 四种通知形态最终都被转换为统一的 [`MethodInterceptor`]：环绕通知
//! 本身就是拦截器，前置/返回后/异常通知通过适配器换装。

use std::sync::Arc;

use vernal_core::BeanHandle;

use crate::error::{AopError, AopResult};
use crate::invocation::MethodInvocation;

/// 统一的拦截器接口
///
/// 拦截器负责调用 `invocation.proceed()` 零次、一次或多次，从而实现
/// 短路、常规环绕与重试语义。
pub trait MethodInterceptor: Send + Sync {
    fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> AopResult<BeanHandle>;
}

/// 前置通知：在目标方法执行前调用
pub trait BeforeAdvice: Send + Sync {
    fn before(&self, method_name: &str, args: &[BeanHandle]) -> AopResult<()>;
}

/// 返回后通知：目标方法正常返回后调用，可以观察但不能替换返回值
pub trait AfterReturningAdvice: Send + Sync {
    fn after_returning(
        &self,
        value: &BeanHandle,
        method_name: &str,
        args: &[BeanHandle],
    ) -> AopResult<()>;
}

/// 异常通知：目标方法出错时调用
pub trait AfterThrowingAdvice: Send + Sync {
    fn after_throwing(&self, error: &AopError, method_name: &str, args: &[BeanHandle]);
}

/// 通知
#[derive(Clone)]
pub enum Advice {
    Before(Arc<dyn BeforeAdvice>),
    AfterReturning(Arc<dyn AfterReturningAdvice>),
    AfterThrowing(Arc<dyn AfterThrowingAdvice>),
    Around(Arc<dyn MethodInterceptor>),
}

impl Advice {
    /// 基于闭包的环绕通知
    pub fn around_fn<F>(func: F) -> Self
    where
        F: Fn(&mut MethodInvocation<'_>) -> AopResult<BeanHandle> + Send + Sync + 'static,
    {
        struct FnInterceptor<F>(F);
        impl<F> MethodInterceptor for FnInterceptor<F>
        where
            F: Fn(&mut MethodInvocation<'_>) -> AopResult<BeanHandle> + Send + Sync,
        {
            fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> AopResult<BeanHandle> {
                (self.0)(invocation)
            }
        }
        Advice::Around(Arc::new(FnInterceptor(func)))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Advice::Before(_) => "before",
            Advice::AfterReturning(_) => "after-returning",
            Advice::AfterThrowing(_) => "after-throwing",
            Advice::Around(_) => "around",
        }
    }
}

impl std::fmt::Debug for Advice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Advice({})", self.kind())
    }
}

/// 表驱动的通知 -> 拦截器转换
pub(crate) fn to_interceptor(advice: &Advice) -> Arc<dyn MethodInterceptor> {
    match advice {
        Advice::Around(interceptor) => interceptor.clone(),
        Advice::Before(advice) => Arc::new(BeforeAdviceInterceptor(advice.clone())),
        Advice::AfterReturning(advice) => Arc::new(AfterReturningInterceptor(advice.clone())),
        Advice::AfterThrowing(advice) => Arc::new(AfterThrowingInterceptor(advice.clone())),
    }
}

struct BeforeAdviceInterceptor(Arc<dyn BeforeAdvice>);

impl MethodInterceptor for BeforeAdviceInterceptor {
    fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> AopResult<BeanHandle> {
        self.0.before(invocation.method_name(), invocation.args())?;
        invocation.proceed()
    }
}

struct AfterReturningInterceptor(Arc<dyn AfterReturningAdvice>);

impl MethodInterceptor for AfterReturningInterceptor {
    fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> AopResult<BeanHandle> {
        let value = invocation.proceed()?;
        let method_name = invocation.method_name().to_string();
        self.0
            .after_returning(&value, &method_name, invocation.args())?;
        Ok(value)
    }
}

struct AfterThrowingInterceptor(Arc<dyn AfterThrowingAdvice>);

impl MethodInterceptor for AfterThrowingInterceptor {
    fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> AopResult<BeanHandle> {
        match invocation.proceed() {
            Ok(value) => Ok(value),
            Err(error) => {
                let method_name = invocation.method_name().to_string();
                self.0.after_throwing(&error, &method_name, invocation.args());
                Err(error)
            }
        }
    }
}
