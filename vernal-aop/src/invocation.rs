//! 方法调用对象
//!
//! 每次被代理的调用构造一个 [`MethodInvocation`]，携带目标、方法、
//! 参数与拦截器链。`proceed()` 沿链前进；链走完之后反射调用目标方法。

use std::sync::Arc;

use vernal_core::BeanHandle;

use crate::advice::MethodInterceptor;
use crate::error::AopResult;
use crate::method::MethodDescriptor;

/// 一次代理方法调用
pub struct MethodInvocation<'a> {
    proxy: &'a BeanHandle,
    target: BeanHandle,
    method: Arc<MethodDescriptor>,
    args: Vec<BeanHandle>,
    chain: Arc<Vec<Arc<dyn MethodInterceptor>>>,
    index: usize,
}

impl<'a> MethodInvocation<'a> {
    pub(crate) fn new(
        proxy: &'a BeanHandle,
        target: BeanHandle,
        method: Arc<MethodDescriptor>,
        args: Vec<BeanHandle>,
        chain: Arc<Vec<Arc<dyn MethodInterceptor>>>,
    ) -> Self {
        Self {
            proxy,
            target,
            method,
            args,
            chain,
            index: 0,
        }
    }

    /// 当前代理对象
    pub fn proxy(&self) -> &BeanHandle {
        self.proxy
    }

    /// 当前目标实例
    pub fn target(&self) -> &BeanHandle {
        &self.target
    }

    pub fn method_name(&self) -> &str {
        self.method.name()
    }

    pub fn args(&self) -> &[BeanHandle] {
        &self.args
    }

    /// 沿拦截器链前进
    ///
    /// 链上每个拦截器可以调用 `proceed()` 零次（短路）、一次（常规）或
    /// 多次（重试）；返回后链索引恢复，重复调用总是从同一位置继续。
    /// 链耗尽时反射调用目标方法。
    pub fn proceed(&mut self) -> AopResult<BeanHandle> {
        if self.index == self.chain.len() {
            return self.method.invoke_on(&self.target, &self.args);
        }

        let current = self.index;
        self.index += 1;
        let interceptor = self.chain[current].clone();
        let result = interceptor.invoke(self);
        self.index = current;
        result
    }
}

impl std::fmt::Debug for MethodInvocation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodInvocation")
            .field("method", &self.method.name())
            .field("args", &self.args.len())
            .field("chain", &self.chain.len())
            .field("index", &self.index)
            .finish()
    }
}
