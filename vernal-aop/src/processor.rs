//! 自动代理 - 容器集成
//!
//! 一个 BeanPostProcessor：Bean 初始化完成后，检查是否有 advisor 的
//! 切点命中它，命中则包上代理返回。参与循环引用的 Bean 通过提前暴露
//! 钩子拿到的也是同一个代理，保证最终对象与提前暴露对象身份一致。

use parking_lot::{Mutex, RwLock};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use vernal_core::{BeanHandle, BeanPostProcessor, ContainerResult};

use crate::advisor::Advisor;
use crate::method::ProxyInterface;
use crate::proxy_factory::ProxyFactory;

/// 每个可代理类型的登记信息
struct ProxyableType {
    type_name: String,
    interfaces: Vec<Arc<ProxyInterface>>,
}

/// 自动代理处理器
///
/// 只有登记过接口表的类型才可能被代理；没有任何 advisor 命中的 Bean
/// 原样返回。
pub struct AutoProxyProcessor {
    advisors: RwLock<Vec<Arc<dyn Advisor>>>,
    types: RwLock<HashMap<TypeId, ProxyableType>>,

    /// 已经通过提前暴露流出的代理；初始化完成后必须复用
    early_proxies: Mutex<HashMap<String, BeanHandle>>,

    expose_proxy: bool,
}

impl AutoProxyProcessor {
    pub fn new() -> Self {
        Self {
            advisors: RwLock::new(Vec::new()),
            types: RwLock::new(HashMap::new()),
            early_proxies: Mutex::new(HashMap::new()),
            expose_proxy: false,
        }
    }

    pub fn with_expose_proxy(mut self) -> Self {
        self.expose_proxy = true;
        self
    }

    pub fn add_advisor(&self, advisor: Arc<dyn Advisor>) {
        self.advisors.write().push(advisor);
    }

    /// 登记一个可代理的类型及其接口表
    pub fn register_interface<T: std::any::Any>(&self, interface: Arc<ProxyInterface>) {
        let mut types = self.types.write();
        let entry = types.entry(TypeId::of::<T>()).or_insert_with(|| ProxyableType {
            type_name: std::any::type_name::<T>().to_string(),
            interfaces: Vec::new(),
        });
        entry.interfaces.push(interface);
    }

    /// 是否有 advisor 的切点命中该类型的任何方法
    fn advised_methods_exist(&self, entry: &ProxyableType) -> bool {
        let advisors = self.advisors.read();
        advisors.iter().any(|advisor| match advisor.pointcut() {
            None => true,
            Some(pointcut) => {
                pointcut.class_filter.matches(&entry.type_name)
                    && entry.interfaces.iter().any(|interface| {
                        interface
                            .method_names()
                            .iter()
                            .any(|method| pointcut.method_matcher.matches(method))
                    })
            }
        })
    }

    /// 必要时包装为代理
    fn wrap_if_necessary(&self, bean: BeanHandle, bean_name: &str) -> ContainerResult<BeanHandle> {
        let type_id = bean.as_ref().type_id();
        let types = self.types.read();
        let Some(entry) = types.get(&type_id) else {
            return Ok(bean);
        };
        if !self.advised_methods_exist(entry) {
            tracing::trace!(
                "Bean '{}' matches no advisor pointcut, skipping proxy creation",
                bean_name
            );
            return Ok(bean);
        }

        tracing::debug!("Creating proxy for bean '{}'", bean_name);
        let factory = ProxyFactory::for_target(bean, entry.type_name.clone());
        for interface in &entry.interfaces {
            factory.add_interface(interface.clone())?;
        }
        for advisor in self.advisors.read().iter() {
            factory.add_advisor(advisor.clone())?;
        }
        if self.expose_proxy {
            factory.set_expose_proxy(true)?;
        }

        let proxy: BeanHandle = factory.proxy();
        Ok(proxy)
    }
}

impl Default for AutoProxyProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl BeanPostProcessor for AutoProxyProcessor {
    fn name(&self) -> &str {
        "AutoProxyProcessor"
    }

    fn order(&self) -> i32 {
        // 在其他处理器之后执行，保证 Bean 已经完全初始化
        2000
    }

    fn early_bean_reference(&self, bean: BeanHandle, bean_name: &str) -> BeanHandle {
        match self.wrap_if_necessary(bean.clone(), bean_name) {
            Ok(wrapped) => {
                self.early_proxies
                    .lock()
                    .insert(bean_name.to_string(), wrapped.clone());
                wrapped
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to create early proxy for bean '{}': {}",
                    bean_name,
                    e
                );
                bean
            }
        }
    }

    fn after_initialization(
        &self,
        bean: BeanHandle,
        bean_name: &str,
    ) -> ContainerResult<BeanHandle> {
        // 提前暴露过的代理必须复用：依赖方已经持有它
        if let Some(early) = self.early_proxies.lock().remove(bean_name) {
            return Ok(early);
        }
        self.wrap_if_necessary(bean, bean_name)
    }
}
