// vernal-aop: 面向切面编程支持
//
// 提供方法拦截代理，支持：
// - 切点表达式（类过滤器 + 静态/动态方法匹配器）
// - 四种通知形态统一为拦截器链
// - 按 (目标类型, 方法) 缓存的 advisor 链求值
// - 多种目标源（单例、原型、线程绑定、对象池、热替换）
// - 通过 BeanPostProcessor 与容器集成的自动代理

pub mod advice;
pub mod advised;
pub mod advisor;
mod chain;
pub mod context;
pub mod error;
pub mod invocation;
pub mod method;
pub mod pointcut;
pub mod processor;
pub mod proxy;
pub mod proxy_factory;
pub mod target;

// 重新导出核心类型
pub use advice::{
    Advice, AfterReturningAdvice, AfterThrowingAdvice, BeforeAdvice, MethodInterceptor,
};
pub use advised::{AdvisedSupport, ProxyConfig};
pub use advisor::{Advisor, DefaultPointcutAdvisor};
pub use context::AopContext;
pub use error::{AopError, AopResult};
pub use invocation::MethodInvocation;
pub use method::{MethodDescriptor, MethodInvoker, ProxyInterface};
pub use pointcut::{ClassFilter, MethodMatcher, Pointcut};
pub use processor::AutoProxyProcessor;
pub use proxy::AopProxy;
pub use proxy_factory::{ProxyFactory, ProxyFactoryBean};
pub use target::{
    HotSwappableTargetSource, PooledTargetSource, PrototypeTargetSource, SingletonTargetSource,
    TargetSource, ThreadBoundTargetSource,
};

/// 预导入模块
pub mod prelude {
    pub use crate::advice::{
        Advice, AfterReturningAdvice, AfterThrowingAdvice, BeforeAdvice, MethodInterceptor,
    };
    pub use crate::advisor::{Advisor, DefaultPointcutAdvisor};
    pub use crate::error::{AopError, AopResult};
    pub use crate::invocation::MethodInvocation;
    pub use crate::method::ProxyInterface;
    pub use crate::pointcut::{ClassFilter, MethodMatcher, Pointcut};
    pub use crate::proxy::AopProxy;
    pub use crate::proxy_factory::ProxyFactory;
    pub use crate::target::{SingletonTargetSource, TargetSource};
}
