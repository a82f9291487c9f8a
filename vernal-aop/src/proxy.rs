//! 代理分发核心
//!
//! [`AopProxy`] 是"代理对象"本身：`call(method, args)` 是每次被代理
//! 调用的入口。分发步骤：
//!
//! 1. `expose_proxy` 打开时把代理发布到线程槽位（守卫恢复）
//! 2. 向目标源取目标；非固定目标源保证在所有退出路径上归还
//! 3. 查 (目标类型, 方法) 的拦截器链
//! 4. 链为空则直接反射调用目标；否则构造调用对象沿链 proceed
//! 5. 返回值是目标自身时替换为代理，保持流式接口语义

use std::sync::Arc;

use vernal_core::{same_instance, BeanHandle};

use crate::advised::AdvisedSupport;
use crate::context::AopContext;
use crate::error::{AopError, AopResult};
use crate::invocation::MethodInvocation;
use crate::target::TargetSource;

/// 代理对象
pub struct AopProxy {
    advised: Arc<AdvisedSupport>,
}

impl AopProxy {
    pub(crate) fn new(advised: Arc<AdvisedSupport>) -> Arc<Self> {
        Arc::new(Self { advised })
    }

    /// 代理配置；`opaque` 打开时不可回查
    pub fn advised(&self) -> Option<&AdvisedSupport> {
        if self.advised.config().opaque {
            None
        } else {
            Some(&self.advised)
        }
    }

    /// 当前代理的线程槽位
    pub fn context(&self) -> &AopContext {
        self.advised.context()
    }

    /// 被代理的方法调用入口
    pub fn call(self: &Arc<Self>, method_name: &str, args: Vec<BeanHandle>) -> AopResult<BeanHandle> {
        let advised = &self.advised;
        let config = advised.config();

        // 将代理发布到线程槽位；守卫在所有退出路径上恢复旧值
        let self_handle: BeanHandle = self.clone();
        let _exposed = if config.expose_proxy {
            Some(advised.context().expose(self_handle.clone()))
        } else {
            None
        };

        let target_source = advised.target_source();
        let target = target_source.get_target()?;

        // 非固定目标源保证归还，包括异常退出
        struct ReleaseGuard {
            target_source: Arc<dyn TargetSource>,
            target: Option<BeanHandle>,
        }
        impl Drop for ReleaseGuard {
            fn drop(&mut self) {
                if let Some(target) = self.target.take() {
                    self.target_source.release_target(target);
                }
            }
        }
        let _release = ReleaseGuard {
            target: (!target_source.is_static()).then(|| target.clone()),
            target_source: target_source.clone(),
        };

        let target_class = target_source.target_type_name().to_string();

        let method = advised.find_method(method_name).ok_or_else(|| {
            AopError::UnknownMethod {
                target: target_class.clone(),
                method: method_name.to_string(),
            }
        })?;

        let chain = advised.interceptor_chain(&target_class, method_name);

        let return_value = if chain.is_empty() {
            // 没有配置任何拦截器：跳过调用对象，直接反射调用目标
            method.invoke_on(&target, &args)?
        } else {
            let mut invocation =
                MethodInvocation::new(&self_handle, target.clone(), method, args, chain);
            invocation.proceed()?
        };

        // 目标返回了自身：把返回值换成代理
        if same_instance(&return_value, &target) {
            return Ok(self_handle);
        }
        Ok(return_value)
    }
}

/// 代理相等性：比较配置而不是实例身份
///
/// 两个代理的接口表、advisor 列表与目标源一致时视为相等。
impl PartialEq for AopProxy {
    fn eq(&self, other: &Self) -> bool {
        self.advised.same_configuration(&other.advised)
    }
}

impl Eq for AopProxy {}

impl std::hash::Hash for AopProxy {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // 与相等性一致：使用目标源指针
        let target_source = self.advised.target_source();
        (Arc::as_ptr(&target_source) as *const () as usize).hash(state);
    }
}

impl std::fmt::Debug for AopProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AopProxy")
            .field("advisors", &self.advised.advisor_count())
            .field("frozen", &self.advised.is_frozen())
            .finish()
    }
}
