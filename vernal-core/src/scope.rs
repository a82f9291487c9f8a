use crate::definition::BeanHandle;
use crate::error::ContainerResult;

/// Bean 的作用域
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// 单例模式 - 容器中只有一个实例
    Singleton,

    /// 原型模式 - 每次请求都创建新实例
    Prototype,

    /// 自定义作用域 - 由注册的 [`CustomScope`] 实现决定实例的缓存策略
    Custom(String),
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Singleton
    }
}

/// 自定义作用域实现
///
/// 容器将作用域名称映射到一个实现，由实现自己维护 get/put 缓存。
/// 典型例子：请求作用域、会话作用域。
pub trait CustomScope: Send + Sync {
    /// 作用域名称
    fn name(&self) -> &str;

    /// 返回作用域内缓存的实例，必要时通过 `producer` 创建
    fn get(
        &self,
        bean_name: &str,
        producer: &mut dyn FnMut() -> ContainerResult<BeanHandle>,
    ) -> ContainerResult<BeanHandle>;

    /// 从作用域中移除实例，返回被移除的对象
    fn remove(&self, bean_name: &str) -> Option<BeanHandle>;
}
