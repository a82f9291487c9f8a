// vernal-core: 类似 Spring 的 IoC 容器核心
//
// 提供声明式的 Bean 定义与解析能力，支持：
// - 别名注册与规范名解析
// - 单例与原型作用域、自定义作用域
// - 单例循环引用的提前暴露解析
// - 构造函数/工厂方法选择与自动装配
// - 生命周期管理（init/destroy 回调、BeanPostProcessor）
// - `${...}` 占位符展开

pub mod alias;
pub mod constants;
pub mod definition;
pub mod error;
pub mod factory;
pub mod lifecycle;
pub mod placeholder;
pub mod registry;
pub mod scope;
pub mod singleton;
pub mod utils;

// 重新导出常用类型
pub use alias::AliasRegistry;
pub use definition::{
    same_instance, AnnotationAttributes, BeanClass, BeanClassBuilder, BeanDefinition, BeanHandle,
    BeanRole, BeanTypeInfo, ConfigValue, FactoryBean, FactoryMethodRef, ParameterSpec, ValueSpec,
};
pub use error::{ContainerError, ContainerResult};
pub use factory::{BeanFactory, PlaceholderLookup, ShutdownHook, StandardBeanFactory};
pub use lifecycle::{BeanPostProcessor, ContainerContext};
pub use placeholder::PlaceholderHelper;
pub use registry::{DefinitionRegistry, OverridePolicy};
pub use scope::{CustomScope, Scope};
pub use singleton::{DisposeCallback, ObjectFactory, SingletonRegistry};

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::definition::{
        same_instance, BeanClass, BeanDefinition, BeanHandle, BeanTypeInfo, ConfigValue,
        FactoryBean, ParameterSpec, ValueSpec,
    };
    pub use crate::error::{ContainerError, ContainerResult};
    pub use crate::factory::{BeanFactory, StandardBeanFactory};
    pub use crate::lifecycle::{BeanPostProcessor, ContainerContext};
    pub use crate::placeholder::PlaceholderHelper;
    pub use crate::scope::Scope;
    // Re-export anyhow for convenience
    pub use anyhow::{anyhow, Context};
}
