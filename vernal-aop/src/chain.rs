//! 拦截器链计算
//!
//! 给定 advisor 列表与 (目标类型, 方法)，按声明顺序求值每个 advisor
//! 的切点：类过滤器不匹配或方法静态匹配失败的跳过；动态匹配器在通知
//! 外再包一层按调用求值的拦截器。

use std::sync::Arc;

use vernal_core::BeanHandle;

use crate::advice::{to_interceptor, MethodInterceptor};
use crate::advisor::Advisor;
use crate::error::AopResult;
use crate::invocation::MethodInvocation;
use crate::pointcut::MethodMatcher;

/// 计算一个 (方法, 目标类型) 的拦截器列表
pub(crate) fn interceptors_for(
    advisors: &[Arc<dyn Advisor>],
    target_class: &str,
    method_name: &str,
) -> Vec<Arc<dyn MethodInterceptor>> {
    let mut chain = Vec::new();

    for advisor in advisors {
        let interceptor = match advisor.pointcut() {
            Some(pointcut) => {
                if !pointcut.class_filter.matches(target_class) {
                    continue;
                }
                if !pointcut.method_matcher.matches(method_name) {
                    continue;
                }
                let interceptor = to_interceptor(advisor.advice());
                if pointcut.method_matcher.is_runtime() {
                    Arc::new(DynamicMatchInterceptor {
                        matcher: pointcut.method_matcher.clone(),
                        inner: interceptor,
                    }) as Arc<dyn MethodInterceptor>
                } else {
                    interceptor
                }
            }
            None => to_interceptor(advisor.advice()),
        };
        chain.push(interceptor);
    }

    chain
}

/// 动态匹配包装：每次调用先用实际参数求值，不匹配则直接放行
struct DynamicMatchInterceptor {
    matcher: MethodMatcher,
    inner: Arc<dyn MethodInterceptor>,
}

impl MethodInterceptor for DynamicMatchInterceptor {
    fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> AopResult<BeanHandle> {
        let method_name = invocation.method_name().to_string();
        if self.matcher.matches_args(&method_name, invocation.args()) {
            self.inner.invoke(invocation)
        } else {
            invocation.proceed()
        }
    }
}
