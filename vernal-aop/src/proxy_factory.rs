//! 代理工厂
//!
//! [`ProxyFactory`] 是程序化装配代理的入口；[`ProxyFactoryBean`] 把
//! 同样的能力包装成容器里的工厂 Bean，产物即代理。

use parking_lot::Mutex;
use std::sync::Arc;

use vernal_core::{BeanHandle, BeanTypeInfo, ContainerResult, FactoryBean};

use crate::advised::AdvisedSupport;
use crate::advisor::Advisor;
use crate::error::AopResult;
use crate::method::ProxyInterface;
use crate::proxy::AopProxy;
use crate::target::{SingletonTargetSource, TargetSource};

/// 代理工厂
pub struct ProxyFactory {
    advised: Arc<AdvisedSupport>,
}

impl ProxyFactory {
    pub fn new(target_source: Arc<dyn TargetSource>) -> Self {
        Self {
            advised: Arc::new(AdvisedSupport::new(target_source)),
        }
    }

    /// 以固定实例为目标
    pub fn for_target(target: BeanHandle, type_name: impl Into<String>) -> Self {
        Self::new(Arc::new(SingletonTargetSource::new(target, type_name)))
    }

    pub fn advised(&self) -> &AdvisedSupport {
        &self.advised
    }

    pub fn add_interface(&self, interface: Arc<ProxyInterface>) -> AopResult<()> {
        self.advised.add_interface(interface)
    }

    pub fn add_advisor(&self, advisor: Arc<dyn Advisor>) -> AopResult<()> {
        self.advised.add_advisor(advisor)
    }

    pub fn set_target_source(&self, target_source: Arc<dyn TargetSource>) -> AopResult<()> {
        self.advised.set_target_source(target_source)
    }

    pub fn set_expose_proxy(&self, value: bool) -> AopResult<()> {
        self.advised.set_expose_proxy(value)
    }

    pub fn set_opaque(&self, value: bool) -> AopResult<()> {
        self.advised.set_opaque(value)
    }

    pub fn set_proxy_target_class(&self, value: bool) -> AopResult<()> {
        self.advised.set_proxy_target_class(value)
    }

    pub fn set_optimize(&self, value: bool) -> AopResult<()> {
        self.advised.set_optimize(value)
    }

    /// 取得代理；第一次调用冻结配置
    pub fn proxy(&self) -> Arc<AopProxy> {
        self.advised.freeze();
        tracing::debug!(
            "Creating proxy: target source is '{}'",
            self.advised.target_source().target_type_name()
        );
        AopProxy::new(self.advised.clone())
    }
}

/// 生产代理的工厂 Bean
///
/// 在容器里注册后，消费方按名称拿到的就是代理对象本身。
pub struct ProxyFactoryBean {
    factory: ProxyFactory,
    singleton: bool,
    cache: Mutex<Option<Arc<AopProxy>>>,
}

impl ProxyFactoryBean {
    pub fn new(factory: ProxyFactory) -> Self {
        Self {
            factory,
            singleton: true,
            cache: Mutex::new(None),
        }
    }

    /// 产物是否单例；false 时每次请求都构造新的代理
    pub fn with_singleton(mut self, singleton: bool) -> Self {
        self.singleton = singleton;
        self
    }
}

impl FactoryBean for ProxyFactoryBean {
    fn object(&self) -> ContainerResult<BeanHandle> {
        if self.singleton {
            let mut cache = self.cache.lock();
            if let Some(proxy) = cache.as_ref() {
                return Ok(proxy.clone() as BeanHandle);
            }
            let proxy = self.factory.proxy();
            *cache = Some(proxy.clone());
            return Ok(proxy as BeanHandle);
        }
        Ok(self.factory.proxy() as BeanHandle)
    }

    fn object_type(&self) -> Option<BeanTypeInfo> {
        Some(BeanTypeInfo::of::<AopProxy>())
    }

    fn is_singleton(&self) -> bool {
        self.singleton
    }
}
