//! 目标源（TargetSource）
//!
//! 抽象"每次调用从哪里拿目标实例"：固定单例、容器原型、线程绑定、
//! 有界对象池与可热替换引用。

use parking_lot::{Condvar, Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::ThreadId;
use std::time::Duration;

use vernal_core::{BeanFactory, BeanHandle};

use crate::error::{AopError, AopResult};

/// 目标源 trait
pub trait TargetSource: Send + Sync {
    /// 目标类型名（类过滤器据此求值）
    fn target_type_name(&self) -> &str;

    /// 目标是否固定不变；固定目标不需要逐调用释放
    fn is_static(&self) -> bool {
        false
    }

    /// 取得本次调用的目标实例
    fn get_target(&self) -> AopResult<BeanHandle>;

    /// 归还目标实例
    fn release_target(&self, _target: BeanHandle) {}
}

/// 固定单例目标源
pub struct SingletonTargetSource {
    target: BeanHandle,
    type_name: String,
}

impl SingletonTargetSource {
    pub fn new(target: BeanHandle, type_name: impl Into<String>) -> Self {
        Self {
            target,
            type_name: type_name.into(),
        }
    }

    /// 从具体类型实例创建，类型名自动取得
    pub fn for_instance<T: std::any::Any + Send + Sync>(instance: Arc<T>) -> Self {
        Self {
            target: instance,
            type_name: std::any::type_name::<T>().to_string(),
        }
    }
}

impl TargetSource for SingletonTargetSource {
    fn target_type_name(&self) -> &str {
        &self.type_name
    }

    fn is_static(&self) -> bool {
        true
    }

    fn get_target(&self) -> AopResult<BeanHandle> {
        Ok(self.target.clone())
    }
}

/// 原型目标源：每次调用都向容器要一个新实例
pub struct PrototypeTargetSource {
    factory: Arc<dyn BeanFactory>,
    bean_name: String,
    type_name: String,
}

impl PrototypeTargetSource {
    pub fn new(
        factory: Arc<dyn BeanFactory>,
        bean_name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            factory,
            bean_name: bean_name.into(),
            type_name: type_name.into(),
        }
    }
}

impl TargetSource for PrototypeTargetSource {
    fn target_type_name(&self) -> &str {
        &self.type_name
    }

    fn get_target(&self) -> AopResult<BeanHandle> {
        Ok(self.factory.get_bean(&self.bean_name)?)
    }
}

/// 线程绑定目标源
///
/// 每个线程持有自己的目标实例，第一次触达时创建。目标 Bean 必须是
/// 原型作用域，且自身应当是无状态的。
pub struct ThreadBoundTargetSource {
    factory: Arc<dyn BeanFactory>,
    bean_name: String,
    type_name: String,
    instances: Mutex<HashMap<ThreadId, BeanHandle>>,
    invocation_count: AtomicUsize,
    hit_count: AtomicUsize,
}

impl ThreadBoundTargetSource {
    pub fn new(
        factory: Arc<dyn BeanFactory>,
        bean_name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            factory,
            bean_name: bean_name.into(),
            type_name: type_name.into(),
            instances: Mutex::new(HashMap::new()),
            invocation_count: AtomicUsize::new(0),
            hit_count: AtomicUsize::new(0),
        }
    }

    /// 总调用次数
    pub fn invocation_count(&self) -> usize {
        self.invocation_count.load(Ordering::Relaxed)
    }

    /// 命中已绑定实例的次数
    pub fn hit_count(&self) -> usize {
        self.hit_count.load(Ordering::Relaxed)
    }

    /// 当前绑定的实例数量
    pub fn bound_count(&self) -> usize {
        self.instances.lock().len()
    }

    /// 丢弃所有线程绑定的实例；容器关闭时调用
    pub fn destroy(&self) {
        let mut instances = self.instances.lock();
        tracing::debug!(
            "Destroying {} thread-bound instance(s) of '{}'",
            instances.len(),
            self.bean_name
        );
        instances.clear();
    }
}

impl TargetSource for ThreadBoundTargetSource {
    fn target_type_name(&self) -> &str {
        &self.type_name
    }

    fn get_target(&self) -> AopResult<BeanHandle> {
        self.invocation_count.fetch_add(1, Ordering::Relaxed);
        let id = std::thread::current().id();

        if let Some(existing) = self.instances.lock().get(&id) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Ok(existing.clone());
        }

        tracing::debug!(
            "No target for '{}' bound to the current thread: creating one",
            self.bean_name
        );
        let instance = self.factory.get_bean(&self.bean_name)?;
        self.instances.lock().insert(id, instance.clone());
        Ok(instance)
    }
}

/// 有界对象池目标源
///
/// `get_target` 借出实例，池空且未达上限时新建，耗尽时阻塞等待归还，
/// 超时返回 PoolExhausted。
pub struct PooledTargetSource {
    factory: Arc<dyn BeanFactory>,
    bean_name: String,
    type_name: String,
    max_size: usize,
    timeout: Duration,
    pool: Mutex<PoolState>,
    returned: Condvar,
}

struct PoolState {
    idle: VecDeque<BeanHandle>,
    created: usize,
}

impl PooledTargetSource {
    pub fn new(
        factory: Arc<dyn BeanFactory>,
        bean_name: impl Into<String>,
        type_name: impl Into<String>,
        max_size: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            factory,
            bean_name: bean_name.into(),
            type_name: type_name.into(),
            max_size,
            timeout,
            pool: Mutex::new(PoolState {
                idle: VecDeque::new(),
                created: 0,
            }),
            returned: Condvar::new(),
        }
    }

    /// 当前空闲实例数
    pub fn idle_count(&self) -> usize {
        self.pool.lock().idle.len()
    }

    /// 已创建的实例总数
    pub fn created_count(&self) -> usize {
        self.pool.lock().created
    }
}

impl TargetSource for PooledTargetSource {
    fn target_type_name(&self) -> &str {
        &self.type_name
    }

    fn get_target(&self) -> AopResult<BeanHandle> {
        let mut pool = self.pool.lock();
        loop {
            if let Some(instance) = pool.idle.pop_front() {
                return Ok(instance);
            }
            if pool.created < self.max_size {
                pool.created += 1;
                drop(pool);
                // 创建失败时把名额还回去
                return match self.factory.get_bean(&self.bean_name) {
                    Ok(instance) => Ok(instance),
                    Err(e) => {
                        self.pool.lock().created -= 1;
                        Err(AopError::Container(e))
                    }
                };
            }
            let timed_out = self.returned.wait_for(&mut pool, self.timeout).timed_out();
            if timed_out && pool.idle.is_empty() {
                return Err(AopError::PoolExhausted {
                    type_name: self.type_name.clone(),
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
        }
    }

    fn release_target(&self, target: BeanHandle) {
        let mut pool = self.pool.lock();
        pool.idle.push_back(target);
        drop(pool);
        self.returned.notify_one();
    }
}

/// 可热替换目标源
///
/// 持有一个可以在运行时原子替换的引用；读方总是看到一个一致的指针。
pub struct HotSwappableTargetSource {
    target: RwLock<BeanHandle>,
    type_name: String,
}

impl HotSwappableTargetSource {
    pub fn new(initial: BeanHandle, type_name: impl Into<String>) -> Self {
        Self {
            target: RwLock::new(initial),
            type_name: type_name.into(),
        }
    }

    /// 替换目标，返回旧目标
    pub fn swap(&self, new_target: BeanHandle) -> BeanHandle {
        let mut target = self.target.write();
        std::mem::replace(&mut *target, new_target)
    }
}

impl TargetSource for HotSwappableTargetSource {
    fn target_type_name(&self) -> &str {
        &self.type_name
    }

    fn get_target(&self) -> AopResult<BeanHandle> {
        Ok(self.target.read().clone())
    }
}
