//! Bean 生命周期扩展点
//!
//! [`BeanPostProcessor`] 在 Bean 初始化前后提供钩子，允许替换实例
//! （典型用途是创建 AOP 代理）。[`ContainerContext`] 是传给感知回调的
//! 上下文句柄：Bean 通过它得知自己的名字并拿到所属工厂的引用。

use std::sync::{Arc, Weak};

use crate::constants;
use crate::definition::BeanHandle;
use crate::error::ContainerResult;
use crate::factory::StandardBeanFactory;

/// BeanPostProcessor trait
///
/// 在 Bean 初始化的不同阶段提供钩子，允许自定义修改 Bean 实例。
///
/// 使用场景：
/// - AOP 代理创建
/// - Bean 包装
/// - 验证等
pub trait BeanPostProcessor: Send + Sync {
    /// 在初始化回调（init-method）之前调用
    ///
    /// 返回处理后的 Bean 实例（可以是原始 Bean，也可以是包装后的 Bean）
    fn before_initialization(
        &self,
        bean: BeanHandle,
        _bean_name: &str,
    ) -> ContainerResult<BeanHandle> {
        Ok(bean)
    }

    /// 在初始化回调（init-method）之后调用
    ///
    /// # 典型用途
    /// - 创建 AOP 代理
    /// - 包装 Bean
    fn after_initialization(
        &self,
        bean: BeanHandle,
        _bean_name: &str,
    ) -> ContainerResult<BeanHandle> {
        Ok(bean)
    }

    /// 循环引用提前暴露时调用
    ///
    /// 当另一个 Bean 在本 Bean 初始化完成之前就需要引用它时，容器会
    /// 通过此钩子取得要暴露的对象。需要安装代理的处理器应在这里返回
    /// 代理并缓存它，保证最终对象与提前暴露的对象身份一致。
    fn early_bean_reference(&self, bean: BeanHandle, _bean_name: &str) -> BeanHandle {
        bean
    }

    /// 处理器名称（用于日志和调试）
    fn name(&self) -> &str {
        "BeanPostProcessor"
    }

    /// 处理器优先级（数字越小优先级越高）
    fn order(&self) -> i32 {
        constants::DEFAULT_PROCESSOR_ORDER
    }
}

/// 传给感知回调的上下文句柄
///
/// 持有工厂的弱引用：感知回调把它存进 Bean 不会造成引用环。
pub struct ContainerContext {
    bean_name: String,
    factory: Weak<StandardBeanFactory>,
}

impl ContainerContext {
    pub(crate) fn new(bean_name: impl Into<String>, factory: Weak<StandardBeanFactory>) -> Self {
        Self {
            bean_name: bean_name.into(),
            factory,
        }
    }

    /// 当前 Bean 在容器中的名称
    pub fn bean_name(&self) -> &str {
        &self.bean_name
    }

    /// 所属工厂；容器已销毁时返回 None
    pub fn factory(&self) -> Option<Arc<StandardBeanFactory>> {
        self.factory.upgrade()
    }
}
