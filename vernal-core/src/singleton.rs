//! 单例注册表
//!
//! 共享实例的权威缓存：三级缓存（完成品、提前暴露对象、提前暴露工厂）
//! 解决单例之间的循环引用；依赖、从属与包含关系的边集决定销毁顺序。
//! 注册表不知道实例如何构建，构建逻辑由调用方以 producer 回调传入。

use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::definition::{same_instance, BeanHandle};
use crate::error::{ContainerError, ContainerResult};
use crate::utils::thread::ThreadLocalSet;

/// 提前暴露工厂：在实例属性填充完成之前生产可供注入的引用
pub type ObjectFactory = Box<dyn FnOnce() -> BeanHandle + Send>;

/// 销毁回调；回调自身负责记录失败，绝不向外抛错
pub type DisposeCallback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct SingletonCaches {
    /// 提前暴露的半成品实例
    early: HashMap<String, BeanHandle>,

    /// 提前暴露工厂；与 early 互斥，工厂被调用后结果进入 early
    factories: HashMap<String, ObjectFactory>,

    /// 注册顺序
    registration_order: Vec<String>,
}

#[derive(Default)]
struct Disposables {
    callbacks: HashMap<String, DisposeCallback>,
    order: Vec<String>,
}

/// 单例注册表
pub struct SingletonRegistry {
    /// 完成品缓存；就绪读取路径只碰这把读写锁
    ready: RwLock<HashMap<String, BeanHandle>>,

    /// 其余缓存共用一把互斥锁
    caches: Mutex<SingletonCaches>,

    /// 任意线程上正在创建的名称
    creating: Mutex<HashSet<String>>,

    /// 当前线程正在创建的名称
    creating_here: ThreadLocalSet,

    /// 逐名称的创建锁：不同名称可以并行创建，同一名称同时只有一个
    /// 线程在创建
    creation_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,

    /// 创建过程中被抑制的次要原因
    suppressed: Mutex<HashMap<String, Vec<String>>>,

    disposables: Mutex<Disposables>,

    /// 被依赖方 -> 依赖方集合（销毁依赖方先行）
    dependents: Mutex<HashMap<String, Vec<String>>>,

    /// 依赖方 -> 被依赖方集合
    dependencies: Mutex<HashMap<String, Vec<String>>>,

    /// 外层 Bean -> 内部 Bean 集合
    containment: Mutex<HashMap<String, Vec<String>>>,

    /// 关闭是单向迁移：开始销毁之后所有创建请求失败
    closed: AtomicBool,
}

impl SingletonRegistry {
    pub fn new() -> Self {
        Self {
            ready: RwLock::new(HashMap::new()),
            caches: Mutex::new(SingletonCaches::default()),
            creating: Mutex::new(HashSet::new()),
            creating_here: ThreadLocalSet::new(),
            creation_locks: Mutex::new(HashMap::new()),
            suppressed: Mutex::new(HashMap::new()),
            disposables: Mutex::new(Disposables::default()),
            dependents: Mutex::new(HashMap::new()),
            dependencies: Mutex::new(HashMap::new()),
            containment: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// 外部注入一个预先构建好的实例
    pub fn register_singleton(&self, name: &str, instance: BeanHandle) -> ContainerResult<()> {
        if self.ready.read().contains_key(name) {
            return Err(ContainerError::NameConflict(format!(
                "could not register singleton '{name}': there is already an instance bound"
            )));
        }
        self.add_singleton(name, instance);
        Ok(())
    }

    /// 将实例放入完成品缓存，清除同名的提前暴露状态
    fn add_singleton(&self, name: &str, instance: BeanHandle) {
        let mut caches = self.caches.lock();
        self.ready.write().insert(name.to_string(), instance);
        caches.factories.remove(name);
        caches.early.remove(name);
        if !caches.registration_order.iter().any(|n| n == name) {
            caches.registration_order.push(name.to_string());
        }
    }

    /// 注册提前暴露工厂
    ///
    /// 只在名称处于创建过程中有效；完成品已存在时忽略。
    pub fn add_singleton_factory(&self, name: &str, factory: ObjectFactory) {
        let mut caches = self.caches.lock();
        if self.ready.read().contains_key(name) {
            return;
        }
        caches.early.remove(name);
        caches.factories.insert(name.to_string(), factory);
        if !caches.registration_order.iter().any(|n| n == name) {
            caches.registration_order.push(name.to_string());
        }
    }

    /// 获取已注册的实例
    ///
    /// 完成品直接返回；名称在任意线程上处于创建过程时返回提前暴露的
    /// 对象（必要时调用提前暴露工厂生成）。
    pub fn get_singleton(&self, name: &str) -> Option<BeanHandle> {
        self.get_singleton_allowing_early(name, true)
    }

    /// `allow_early` 为 false 时只查完成品与既有的提前暴露对象，不会
    /// 触发提前暴露工厂
    pub fn get_singleton_allowing_early(&self, name: &str, allow_early: bool) -> Option<BeanHandle> {
        // 就绪快路径：只持有读锁
        if let Some(instance) = self.ready.read().get(name) {
            return Some(instance.clone());
        }
        if !self.is_in_creation(name) {
            return None;
        }

        let mut caches = self.caches.lock();
        // 拿到锁之后重查，避免与刚完成的创建竞争
        if let Some(instance) = self.ready.read().get(name) {
            return Some(instance.clone());
        }
        if let Some(early) = caches.early.get(name) {
            return Some(early.clone());
        }
        if allow_early {
            if let Some(factory) = caches.factories.remove(name) {
                let instance = factory();
                caches.early.insert(name.to_string(), instance.clone());
                return Some(instance);
            }
        }
        None
    }

    /// 名称是否在任意线程上处于创建过程
    pub fn is_in_creation(&self, name: &str) -> bool {
        self.creating.lock().contains(name)
    }

    /// 名称是否在当前线程上处于创建过程
    pub fn is_in_creation_here(&self, name: &str) -> bool {
        self.creating_here.contains(name)
    }

    /// 记录一条创建过程中被抑制的次要原因
    pub fn on_suppressed(&self, message: impl Into<String>) {
        let message = message.into();
        let mut suppressed = self.suppressed.lock();
        for name in self.creating_here.snapshot() {
            suppressed
                .entry(name)
                .or_default()
                .push(message.clone());
        }
    }

    /// 获取或创建单例
    ///
    /// 同一名称的创建在逐名称锁上串行：另一个线程请求同名单例会阻塞到
    /// 创建完成；同一线程的重入（循环引用且未被提前暴露解决）返回
    /// CircularCreation。
    pub fn get_or_create(
        &self,
        name: &str,
        producer: impl FnOnce() -> ContainerResult<BeanHandle>,
    ) -> ContainerResult<BeanHandle> {
        if let Some(instance) = self.ready.read().get(name) {
            return Ok(instance.clone());
        }

        if self.creating_here.contains(name) {
            let mut chain = self.creating_here.snapshot();
            chain.sort();
            return Err(ContainerError::CircularCreation(format!(
                "{} -> {}",
                chain.join(" -> "),
                name
            )));
        }

        let creation_lock = self
            .creation_locks
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _creation_guard = creation_lock.lock();

        // 其他线程可能已经完成创建
        if let Some(instance) = self.ready.read().get(name) {
            return Ok(instance.clone());
        }

        if self.closed.load(Ordering::Acquire) {
            return Err(ContainerError::ContainerClosed);
        }

        tracing::debug!("Creating shared instance of singleton bean '{}'", name);
        self.before_creation(name);

        struct CreationGuard<'a> {
            registry: &'a SingletonRegistry,
            name: &'a str,
        }

        impl Drop for CreationGuard<'_> {
            fn drop(&mut self) {
                self.registry.after_creation(self.name);
            }
        }

        let _guard = CreationGuard {
            registry: self,
            name,
        };

        let result = producer();
        let suppressed = self.suppressed.lock().remove(name).unwrap_or_default();

        match result {
            Ok(instance) => {
                // 提前暴露的对象已经被其他 Bean 注入；最终对象必须与它
                // 身份一致，否则这些 Bean 持有的是过期引用
                let early = self.caches.lock().early.get(name).cloned();
                if let Some(early) = early {
                    if !same_instance(&early, &instance) {
                        self.purge_creation_state(name);
                        return Err(ContainerError::InconsistentEarlyReference(
                            name.to_string(),
                        ));
                    }
                }
                self.add_singleton(name, instance.clone());
                tracing::debug!("Singleton bean '{}' created and cached", name);
                Ok(instance)
            }
            Err(mut err) => {
                self.purge_creation_state(name);
                if let ContainerError::BeanCreation {
                    suppressed: causes, ..
                } = &mut err
                {
                    causes.extend(suppressed);
                }
                Err(err)
            }
        }
    }

    fn before_creation(&self, name: &str) {
        self.creating.lock().insert(name.to_string());
        self.creating_here.insert(name);
    }

    fn after_creation(&self, name: &str) {
        self.creating.lock().remove(name);
        self.creating_here.remove(name);
    }

    /// 创建失败时清除提前暴露状态
    fn purge_creation_state(&self, name: &str) {
        let mut caches = self.caches.lock();
        caches.factories.remove(name);
        caches.early.remove(name);
        caches.registration_order.retain(|n| n != name);
    }

    pub fn contains_singleton(&self, name: &str) -> bool {
        self.ready.read().contains_key(name)
    }

    pub fn singleton_names(&self) -> Vec<String> {
        self.caches.lock().registration_order.clone()
    }

    pub fn singleton_count(&self) -> usize {
        self.ready.read().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // ========== 边集维护 ==========

    /// 记录依赖关系：`dependent` 依赖 `depended_on`
    ///
    /// 双向登记：销毁 `depended_on` 之前必须先销毁 `dependent`。
    pub fn register_dependency(&self, dependent: &str, depended_on: &str) {
        {
            let mut dependents = self.dependents.lock();
            let entry = dependents.entry(depended_on.to_string()).or_default();
            if entry.iter().any(|n| n == dependent) {
                return;
            }
            entry.push(dependent.to_string());
        }
        let mut dependencies = self.dependencies.lock();
        let entry = dependencies.entry(dependent.to_string()).or_default();
        if !entry.iter().any(|n| n == depended_on) {
            entry.push(depended_on.to_string());
        }
    }

    /// 记录包含关系：`inner` 是 `outer` 的内部 Bean
    ///
    /// 同时把 `outer` 登记为依赖 `inner`，保证销毁顺序正确。
    pub fn register_containment(&self, outer: &str, inner: &str) {
        {
            let mut containment = self.containment.lock();
            let entry = containment.entry(outer.to_string()).or_default();
            if entry.iter().any(|n| n == inner) {
                return;
            }
            entry.push(inner.to_string());
        }
        self.register_dependency(outer, inner);
    }

    /// `dependent` 是否（传递地）依赖 `name`
    pub fn is_dependent(&self, name: &str, dependent: &str) -> bool {
        let dependents = self.dependents.lock();
        let mut seen = HashSet::new();
        Self::is_dependent_inner(&dependents, name, dependent, &mut seen)
    }

    fn is_dependent_inner(
        dependents: &HashMap<String, Vec<String>>,
        name: &str,
        dependent: &str,
        seen: &mut HashSet<String>,
    ) -> bool {
        if !seen.insert(name.to_string()) {
            return false;
        }
        let Some(directs) = dependents.get(name) else {
            return false;
        };
        if directs.iter().any(|n| n == dependent) {
            return true;
        }
        directs
            .iter()
            .any(|next| Self::is_dependent_inner(dependents, next, dependent, seen))
    }

    /// 依赖 `name` 的所有直接依赖方
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.dependents.lock().get(name).cloned().unwrap_or_default()
    }

    /// `name` 直接依赖的所有名称
    pub fn dependencies_of(&self, name: &str) -> Vec<String> {
        self.dependencies
            .lock()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_dependents(&self, name: &str) -> bool {
        self.dependents
            .lock()
            .get(name)
            .map(|d| !d.is_empty())
            .unwrap_or(false)
    }

    // ========== 销毁 ==========

    /// 登记销毁回调
    pub fn register_disposable(&self, name: &str, callback: DisposeCallback) {
        let mut disposables = self.disposables.lock();
        if !disposables.callbacks.contains_key(name) {
            disposables.order.push(name.to_string());
        }
        disposables.callbacks.insert(name.to_string(), callback);
    }

    /// 销毁全部单例
    ///
    /// 注册顺序的逆序遍历，每个名称先递归销毁其依赖方。开始销毁即进入
    /// 关闭状态，此后的创建请求全部失败。
    pub fn destroy_singletons(&self) {
        tracing::info!("Destroying singletons in registry");
        self.closed.store(true, Ordering::Release);

        let names: Vec<String> = {
            let disposables = self.disposables.lock();
            disposables.order.clone()
        };
        for name in names.iter().rev() {
            self.destroy_singleton(name);
        }

        self.containment.lock().clear();
        self.dependents.lock().clear();
        self.dependencies.lock().clear();

        let mut caches = self.caches.lock();
        self.ready.write().clear();
        caches.factories.clear();
        caches.early.clear();
        caches.registration_order.clear();
    }

    /// 销毁单个单例及其依赖方
    pub fn destroy_singleton(&self, name: &str) {
        // 从缓存移除
        {
            let mut caches = self.caches.lock();
            self.ready.write().remove(name);
            caches.factories.remove(name);
            caches.early.remove(name);
            caches.registration_order.retain(|n| n != name);
        }

        let callback = {
            let mut disposables = self.disposables.lock();
            disposables.order.retain(|n| n != name);
            disposables.callbacks.remove(name)
        };
        self.destroy_bean(name, callback);
    }

    fn destroy_bean(&self, name: &str, callback: Option<DisposeCallback>) {
        // 先销毁依赖方
        let dependents = self.dependents.lock().remove(name);
        if let Some(dependents) = dependents {
            tracing::debug!(
                "Retrieved dependent beans for bean '{}': {:?}",
                name,
                dependents
            );
            for dependent in dependents {
                self.destroy_singleton(&dependent);
            }
        }

        // 再销毁自身
        if let Some(callback) = callback {
            tracing::debug!("Invoking destroy callback on bean '{}'", name);
            callback();
        }

        // 然后销毁内部 Bean
        let contained = self.containment.lock().remove(name);
        if let Some(contained) = contained {
            for inner in contained {
                self.destroy_singleton(&inner);
            }
        }

        // 清理残留的边
        {
            let mut dependents = self.dependents.lock();
            dependents.retain(|_, deps| {
                deps.retain(|n| n != name);
                !deps.is_empty()
            });
        }
        self.dependencies.lock().remove(name);
    }
}

impl Default for SingletonRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;

    fn handle_of(value: i64) -> BeanHandle {
        Arc::new(value)
    }

    #[test]
    fn test_get_or_create_caches_instance() {
        let registry = SingletonRegistry::new();

        let first = registry
            .get_or_create("a", || Ok(handle_of(1)))
            .unwrap();
        let second = registry
            .get_or_create("a", || panic!("producer must not run twice"))
            .unwrap();
        assert!(same_instance(&first, &second));
        assert!(registry.contains_singleton("a"));
        assert_eq!(registry.singleton_count(), 1);
    }

    #[test]
    fn test_register_singleton_conflict() {
        let registry = SingletonRegistry::new();
        registry.register_singleton("a", handle_of(1)).unwrap();
        let err = registry.register_singleton("a", handle_of(2)).unwrap_err();
        assert!(matches!(err, ContainerError::NameConflict(_)));
    }

    #[test]
    fn test_early_exposure_resolves_reentrant_lookup() {
        let registry = Arc::new(SingletonRegistry::new());

        let result = {
            let registry = registry.clone();
            registry.clone().get_or_create("a", move || {
                let raw = handle_of(42);
                let exposed = raw.clone();
                registry.add_singleton_factory("a", Box::new(move || exposed));

                // 循环引用：构建过程中再次请求自身
                let early = registry.get_singleton("a").expect("early object");
                assert!(same_instance(&early, &raw));
                Ok(raw)
            })
        };
        let instance = result.unwrap();
        assert!(same_instance(
            &instance,
            &registry.get_singleton("a").unwrap()
        ));
    }

    #[test]
    fn test_same_thread_reentry_without_early_exposure_fails() {
        let registry = Arc::new(SingletonRegistry::new());
        let inner = registry.clone();
        let err = registry
            .get_or_create("a", move || inner.get_or_create("a", || Ok(handle_of(1))))
            .unwrap_err();
        assert!(matches!(err, ContainerError::CircularCreation(_)));
        // 失败后状态被清除，可以重试
        assert!(!registry.is_in_creation("a"));
        registry.get_or_create("a", || Ok(handle_of(1))).unwrap();
    }

    #[test]
    fn test_inconsistent_early_reference_is_detected() {
        let registry = Arc::new(SingletonRegistry::new());
        let inner = registry.clone();

        let err = registry
            .get_or_create("a", move || {
                let raw = handle_of(1);
                let exposed = raw.clone();
                inner.add_singleton_factory("a", Box::new(move || exposed));
                // 有人消费了提前暴露的引用
                inner.get_singleton("a").unwrap();
                // 但 producer 返回了一个不同身份的对象（例如初始化后
                // 安装的包装器）
                Ok(handle_of(2))
            })
            .unwrap_err();
        assert!(matches!(
            err,
            ContainerError::InconsistentEarlyReference(_)
        ));
        assert!(!registry.contains_singleton("a"));
    }

    #[test]
    fn test_unconsumed_factory_allows_replacement() {
        let registry = Arc::new(SingletonRegistry::new());
        let inner = registry.clone();

        // 工厂注册了但没有任何 Bean 消费它：producer 可以返回包装器
        let instance = registry
            .get_or_create("a", move || {
                let raw = handle_of(1);
                let exposed = raw.clone();
                inner.add_singleton_factory("a", Box::new(move || exposed));
                Ok(handle_of(2))
            })
            .unwrap();
        assert_eq!(*instance.downcast::<i64>().unwrap(), 2);
    }

    #[test]
    fn test_creation_failure_purges_state() {
        let registry = Arc::new(SingletonRegistry::new());
        let inner = registry.clone();
        let err = registry
            .get_or_create("a", move || {
                let raw = handle_of(1);
                let exposed = raw.clone();
                inner.add_singleton_factory("a", Box::new(move || exposed));
                Err(ContainerError::creation_message("a", "boom"))
            })
            .unwrap_err();
        assert!(matches!(err, ContainerError::BeanCreation { .. }));
        assert!(registry.get_singleton("a").is_none());
        assert!(registry.singleton_names().is_empty());
    }

    #[test]
    fn test_suppressed_causes_attach_to_creation_error() {
        let registry = Arc::new(SingletonRegistry::new());
        let inner = registry.clone();
        let err = registry
            .get_or_create("a", move || {
                inner.on_suppressed("first candidate failed");
                Err(ContainerError::creation_message("a", "boom"))
            })
            .unwrap_err();
        match err {
            ContainerError::BeanCreation { suppressed, .. } => {
                assert_eq!(suppressed, vec!["first candidate failed".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_dependency_edges() {
        let registry = SingletonRegistry::new();
        registry.register_dependency("b", "a");
        registry.register_dependency("c", "b");

        assert!(registry.is_dependent("a", "b"));
        assert!(registry.is_dependent("a", "c")); // 传递
        assert!(!registry.is_dependent("c", "a"));
        assert_eq!(registry.dependents_of("a"), vec!["b".to_string()]);
        assert_eq!(registry.dependencies_of("b"), vec!["a".to_string()]);
    }

    #[test]
    fn test_destruction_order_respects_dependencies() {
        let registry = SingletonRegistry::new();
        let log = Arc::new(PlMutex::new(Vec::<String>::new()));

        let record = |name: &str| {
            let log = log.clone();
            let name = name.to_string();
            Box::new(move || log.lock().push(name)) as DisposeCallback
        };

        registry.register_singleton("b", handle_of(2)).unwrap();
        registry.register_singleton("a", handle_of(1)).unwrap();
        registry.register_disposable("b", record("close(B)"));
        registry.register_disposable("a", record("close(A)"));
        // A 依赖 B：销毁 B 之前必须先销毁 A
        registry.register_dependency("a", "b");

        registry.destroy_singletons();

        assert_eq!(
            *log.lock(),
            vec!["close(A)".to_string(), "close(B)".to_string()]
        );
        assert_eq!(registry.singleton_count(), 0);
    }

    #[test]
    fn test_containment_drives_destruction() {
        let registry = SingletonRegistry::new();
        let log = Arc::new(PlMutex::new(Vec::<String>::new()));

        let record = |name: &str| {
            let log = log.clone();
            let name = name.to_string();
            Box::new(move || log.lock().push(name)) as DisposeCallback
        };

        registry.register_singleton("inner", handle_of(1)).unwrap();
        registry.register_singleton("outer", handle_of(2)).unwrap();
        registry.register_disposable("inner", record("inner"));
        registry.register_disposable("outer", record("outer"));
        registry.register_containment("outer", "inner");

        registry.destroy_singleton("inner");

        // 销毁 inner 必须先销毁依赖它的 outer
        assert_eq!(*log.lock(), vec!["outer".to_string(), "inner".to_string()]);
    }

    #[test]
    fn test_closed_after_destruction() {
        let registry = SingletonRegistry::new();
        registry.register_singleton("a", handle_of(1)).unwrap();
        registry.destroy_singletons();

        assert!(registry.is_closed());
        let err = registry
            .get_or_create("b", || Ok(handle_of(2)))
            .unwrap_err();
        assert!(matches!(err, ContainerError::ContainerClosed));
    }

    #[test]
    fn test_parallel_creation_of_distinct_names() {
        let registry = Arc::new(SingletonRegistry::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let registry = registry.clone();
            handles.push(std::thread::spawn(move || {
                let name = format!("bean-{}", i % 4);
                registry.get_or_create(&name, || Ok(handle_of(i))).unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.singleton_count(), 4);
    }
}
