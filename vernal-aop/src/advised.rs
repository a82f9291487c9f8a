//! 代理配置
//!
//! [`ProxyConfig`] 是创建代理时的开关集合；[`AdvisedSupport`] 在其上
//! 聚合目标源、接口表与 advisor 列表，并维护按 (目标类型, 方法) 键控
//! 的拦截器链缓存。配置在第一次取得代理时冻结。

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

use crate::advice::MethodInterceptor;
use crate::advisor::{sort_advisors, Advisor};
use crate::chain;
use crate::context::AopContext;
use crate::error::{AopError, AopResult};
use crate::method::{MethodDescriptor, ProxyInterface};
use crate::target::TargetSource;

/// 代理开关
///
/// - `proxy_target_class`：直接按目标类型分发，而不是按声明的接口表
/// - `optimize`：允许实现方做激进优化
/// - `opaque`：禁止通过代理回查配置
/// - `expose_proxy`：调用期间把代理发布到线程槽位
/// - `frozen`：配置冻结，不再接受 advisor 变更
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    pub proxy_target_class: bool,
    pub optimize: bool,
    pub opaque: bool,
    pub expose_proxy: bool,
    pub frozen: bool,
}

/// 代理配置的聚合
pub struct AdvisedSupport {
    config: RwLock<ProxyConfig>,
    target_source: RwLock<Arc<dyn TargetSource>>,
    interfaces: RwLock<Vec<Arc<ProxyInterface>>>,
    advisors: RwLock<Vec<Arc<dyn Advisor>>>,

    /// (目标类型, 方法名) -> 拦截器链
    chain_cache: Mutex<HashMap<(String, String), Arc<Vec<Arc<dyn MethodInterceptor>>>>>,

    context: AopContext,
}

impl AdvisedSupport {
    pub fn new(target_source: Arc<dyn TargetSource>) -> Self {
        Self {
            config: RwLock::new(ProxyConfig::default()),
            target_source: RwLock::new(target_source),
            interfaces: RwLock::new(Vec::new()),
            advisors: RwLock::new(Vec::new()),
            chain_cache: Mutex::new(HashMap::new()),
            context: AopContext::new(),
        }
    }

    pub fn config(&self) -> ProxyConfig {
        *self.config.read()
    }

    pub(crate) fn context(&self) -> &AopContext {
        &self.context
    }

    fn check_mutable(&self) -> AopResult<()> {
        if self.config.read().frozen {
            return Err(AopError::ConfigurationFrozen);
        }
        Ok(())
    }

    pub fn set_proxy_target_class(&self, value: bool) -> AopResult<()> {
        self.check_mutable()?;
        self.config.write().proxy_target_class = value;
        Ok(())
    }

    pub fn set_optimize(&self, value: bool) -> AopResult<()> {
        self.check_mutable()?;
        self.config.write().optimize = value;
        Ok(())
    }

    pub fn set_opaque(&self, value: bool) -> AopResult<()> {
        self.check_mutable()?;
        self.config.write().opaque = value;
        Ok(())
    }

    pub fn set_expose_proxy(&self, value: bool) -> AopResult<()> {
        self.check_mutable()?;
        self.config.write().expose_proxy = value;
        Ok(())
    }

    /// 冻结是单向的
    pub(crate) fn freeze(&self) {
        self.config.write().frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.config.read().frozen
    }

    pub fn set_target_source(&self, target_source: Arc<dyn TargetSource>) -> AopResult<()> {
        self.check_mutable()?;
        *self.target_source.write() = target_source;
        self.advice_changed();
        Ok(())
    }

    pub fn target_source(&self) -> Arc<dyn TargetSource> {
        self.target_source.read().clone()
    }

    pub fn add_interface(&self, interface: Arc<ProxyInterface>) -> AopResult<()> {
        self.check_mutable()?;
        self.interfaces.write().push(interface);
        Ok(())
    }

    pub fn interfaces(&self) -> Vec<Arc<ProxyInterface>> {
        self.interfaces.read().clone()
    }

    pub fn add_advisor(&self, advisor: Arc<dyn Advisor>) -> AopResult<()> {
        self.check_mutable()?;
        tracing::debug!("Adding advisor '{}'", advisor.name());
        self.advisors.write().push(advisor);
        self.advice_changed();
        Ok(())
    }

    pub fn remove_advisor(&self, index: usize) -> AopResult<()> {
        self.check_mutable()?;
        let mut advisors = self.advisors.write();
        if index >= advisors.len() {
            return Err(AopError::AdvisorIndexOutOfBounds {
                index,
                count: advisors.len(),
            });
        }
        advisors.remove(index);
        drop(advisors);
        self.advice_changed();
        Ok(())
    }

    pub fn advisor_count(&self) -> usize {
        self.advisors.read().len()
    }

    pub(crate) fn advisors(&self) -> Vec<Arc<dyn Advisor>> {
        self.advisors.read().clone()
    }

    /// advisor 列表变化时拦截器链缓存整体失效
    fn advice_changed(&self) {
        self.chain_cache.lock().clear();
    }

    /// 在接口表中查找方法
    pub(crate) fn find_method(&self, method_name: &str) -> Option<Arc<MethodDescriptor>> {
        for interface in self.interfaces.read().iter() {
            if let Some(method) = interface.find(method_name) {
                return Some(method);
            }
        }
        None
    }

    /// 取得 (目标类型, 方法) 的拦截器链，结果缓存
    pub(crate) fn interceptor_chain(
        &self,
        target_class: &str,
        method_name: &str,
    ) -> Arc<Vec<Arc<dyn MethodInterceptor>>> {
        let key = (target_class.to_string(), method_name.to_string());
        if let Some(cached) = self.chain_cache.lock().get(&key) {
            return cached.clone();
        }

        let mut advisors = self.advisors();
        sort_advisors(&mut advisors);
        let chain = Arc::new(chain::interceptors_for(&advisors, target_class, method_name));

        self.chain_cache.lock().insert(key, chain.clone());
        chain
    }

    /// 结构化相等：开关、接口名、advisor 与目标源逐项比较
    pub(crate) fn same_configuration(&self, other: &AdvisedSupport) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.config() != other.config() {
            return false;
        }
        if !Arc::ptr_eq(&self.target_source(), &other.target_source()) {
            return false;
        }

        let ours = self.interfaces();
        let theirs = other.interfaces();
        if ours.len() != theirs.len()
            || ours
                .iter()
                .zip(theirs.iter())
                .any(|(a, b)| a.name() != b.name())
        {
            return false;
        }

        let ours = self.advisors();
        let theirs = other.advisors();
        ours.len() == theirs.len()
            && ours
                .iter()
                .zip(theirs.iter())
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }
}
