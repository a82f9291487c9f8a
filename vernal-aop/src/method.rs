//! 代理接口的方法表建模
//!
//! Rust 没有运行时类合成，代理的"接口"是显式声明的方法表：每个方法
//! 携带一个反射式的调用闭包，负责把目标句柄向下转换并执行真实逻辑。

use std::collections::HashMap;
use std::sync::Arc;

use vernal_core::BeanHandle;

use crate::error::{AopError, AopResult};

/// 方法调用闭包：目标实例 + 参数 -> 返回值
pub type MethodInvoker =
    Arc<dyn Fn(&BeanHandle, &[BeanHandle]) -> AopResult<BeanHandle> + Send + Sync>;

/// 方法描述符
#[derive(Clone)]
pub struct MethodDescriptor {
    name: String,
    invoke: MethodInvoker,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, invoke: MethodInvoker) -> Self {
        Self {
            name: name.into(),
            invoke,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 反射式地在目标上调用真实方法
    pub fn invoke_on(&self, target: &BeanHandle, args: &[BeanHandle]) -> AopResult<BeanHandle> {
        (self.invoke)(target, args)
    }
}

impl std::fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .finish()
    }
}

/// 一个被代理的接口：名称 + 方法表
pub struct ProxyInterface {
    name: String,
    methods: HashMap<String, Arc<MethodDescriptor>>,
}

impl ProxyInterface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 注册方法；调用闭包自己负责向下转换目标类型
    pub fn method(mut self, name: impl Into<String>, invoke: MethodInvoker) -> Self {
        let name = name.into();
        self.methods
            .insert(name.clone(), Arc::new(MethodDescriptor::new(name, invoke)));
        self
    }

    /// 带类型转换的注册便捷方法
    pub fn method_of<T, F>(self, name: impl Into<String>, invoke: F) -> Self
    where
        T: std::any::Any + Send + Sync,
        F: Fn(&T, &[BeanHandle]) -> AopResult<BeanHandle> + Send + Sync + 'static,
    {
        self.method(
            name,
            Arc::new(move |target: &BeanHandle, args: &[BeanHandle]| {
                let concrete = target.downcast_ref::<T>().ok_or_else(|| {
                    AopError::Invocation(anyhow::anyhow!(
                        "target is not a '{}'",
                        std::any::type_name::<T>()
                    ))
                })?;
                invoke(concrete, args)
            }),
        )
    }

    pub fn find(&self, name: &str) -> Option<Arc<MethodDescriptor>> {
        self.methods.get(name).cloned()
    }

    pub fn method_names(&self) -> Vec<String> {
        self.methods.keys().cloned().collect()
    }
}

impl std::fmt::Debug for ProxyInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyInterface")
            .field("name", &self.name)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}
