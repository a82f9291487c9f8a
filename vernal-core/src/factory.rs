//! Bean 工厂 - 容器核心
//!
//! [`StandardBeanFactory`] 把别名注册表、定义注册表、单例注册表、作用
//! 域与后置处理器聚合为一个服务值，对外提供查找、类型查找、枚举、
//! 配置与冻结能力。
//!
//! # Bean 生命周期顺序
//! 1. 实例化（构造函数或工厂方法）
//! 2. 单例且允许循环引用时注册提前暴露工厂
//! 3. 属性填充（引用解析、字面量占位符展开与类型转换）
//! 4. 上下文感知回调
//! 5. BeanPostProcessor before-initialization
//! 6. 自定义 init-method
//! 7. BeanPostProcessor after-initialization

use parking_lot::{Mutex, RwLock};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use crate::alias::AliasRegistry;
use crate::constants;
use crate::definition::{
    AnnotationAttributes, BeanClass, BeanDefinition, BeanHandle, BeanTypeInfo, CallbackFn,
    ConfigValue, ConstructorSpec, ParameterSpec, ValueSpec,
};
use crate::error::{ContainerError, ContainerResult};
use crate::lifecycle::{BeanPostProcessor, ContainerContext};
use crate::placeholder::PlaceholderHelper;
use crate::registry::{DefinitionRegistry, OverridePolicy};
use crate::scope::{CustomScope, Scope};
use crate::singleton::SingletonRegistry;
use crate::utils::dependency::{topological_sort, validate_dependency_graph};
use crate::utils::thread::ThreadLocalSet;

/// 最基础的容器接口
///
/// 不包含泛型方法，可以作为 trait object 使用（例如代理的目标源通过
/// 它按名称取目标实例）。
pub trait BeanFactory: Send + Sync {
    /// 通过名称获取 Bean
    fn get_bean(&self, name: &str) -> ContainerResult<BeanHandle>;

    /// 检查是否包含指定名称的 Bean（包括别名与外部注册的单例）
    fn contains_bean(&self, name: &str) -> bool;
}

/// 关闭钩子类型
pub type ShutdownHook = Box<dyn Fn() -> ContainerResult<()> + Send + Sync>;

/// 占位符取值能力
///
/// 占位符的值从哪里来由外部协作方决定（配置加载器、环境变量等），
/// 容器只持有调用方注册的查找闭包。
pub type PlaceholderLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// StandardBeanFactory - 容器的标准实现
pub struct StandardBeanFactory {
    aliases: AliasRegistry,
    definitions: DefinitionRegistry,
    singletons: SingletonRegistry,

    /// 自定义作用域：作用域名 -> 实现
    scopes: RwLock<HashMap<String, Arc<dyn CustomScope>>>,

    /// Bean 后置处理器（按 order 排序）
    post_processors: RwLock<Vec<Arc<dyn BeanPostProcessor>>>,

    /// 当前线程正在创建的原型名称
    prototypes_in_creation: ThreadLocalSet,

    /// 工厂 Bean 单例产物缓存
    factory_products: Mutex<HashMap<String, BeanHandle>>,

    /// 外部注册单例的类型信息
    external_types: Mutex<HashMap<String, BeanTypeInfo>>,

    /// 字面量占位符的取值闭包；None 时字符串字面量原样使用
    placeholder_lookup: RwLock<Option<PlaceholderLookup>>,
    placeholders: PlaceholderHelper,

    parent: Option<Arc<StandardBeanFactory>>,

    allow_circular_references: AtomicBool,

    shutdown_hooks: Mutex<Vec<ShutdownHook>>,

    inner_bean_counter: AtomicUsize,

    self_ref: Weak<StandardBeanFactory>,
}

impl StandardBeanFactory {
    /// 创建新的工厂
    pub fn new() -> Arc<Self> {
        Self::build(None, None)
    }

    /// 创建带父容器的工厂：本地找不到定义时委托给父容器
    pub fn with_parent(parent: Arc<StandardBeanFactory>) -> Arc<Self> {
        let lookup = parent.placeholder_lookup.read().clone();
        Self::build(lookup, Some(parent))
    }

    fn build(
        placeholder_lookup: Option<PlaceholderLookup>,
        parent: Option<Arc<StandardBeanFactory>>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            aliases: AliasRegistry::new(),
            definitions: DefinitionRegistry::new(),
            singletons: SingletonRegistry::new(),
            scopes: RwLock::new(HashMap::new()),
            post_processors: RwLock::new(Vec::new()),
            prototypes_in_creation: ThreadLocalSet::new(),
            factory_products: Mutex::new(HashMap::new()),
            external_types: Mutex::new(HashMap::new()),
            placeholder_lookup: RwLock::new(placeholder_lookup),
            placeholders: PlaceholderHelper::default(),
            parent,
            allow_circular_references: AtomicBool::new(true),
            shutdown_hooks: Mutex::new(Vec::new()),
            inner_bean_counter: AtomicUsize::new(0),
            self_ref: weak.clone(),
        })
    }

    /// 注册字面量占位符的取值闭包
    ///
    /// 值从哪里来由外部协作方决定；未注册时字符串字面量不做占位符
    /// 处理。
    pub fn set_placeholder_lookup<F>(&self, lookup: F)
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        *self.placeholder_lookup.write() = Some(Arc::new(lookup));
    }

    /// 是否允许单例之间的循环引用（通过提前暴露解决）
    pub fn set_allow_circular_references(&self, allow: bool) {
        self.allow_circular_references.store(allow, Ordering::Release);
    }

    pub fn set_override_policy(&self, policy: OverridePolicy) {
        self.definitions.set_override_policy(policy);
    }

    // ========== 配置接口（加载方契约） ==========

    /// 注册 Bean 定义
    pub fn register_definition(
        &self,
        name: impl Into<String>,
        definition: BeanDefinition,
    ) -> ContainerResult<()> {
        let name = name.into();
        if self.aliases.is_alias(&name) {
            return Err(ContainerError::NameConflict(format!(
                "cannot register bean definition '{name}': the name is bound as an alias"
            )));
        }
        self.definitions.register(&name, definition)
    }

    /// 按类型描述符的默认名称注册定义，返回使用的名称
    pub fn register_component(&self, class: Arc<BeanClass>) -> ContainerResult<String> {
        let name = class.default_bean_name();
        self.register_definition(&name, BeanDefinition::for_class(class))?;
        Ok(name)
    }

    /// 注册别名
    pub fn register_alias(&self, name: &str, alias: &str) -> ContainerResult<()> {
        if self.definitions.is_frozen() {
            return Err(ContainerError::ConfigurationFrozen);
        }
        if self.definitions.contains(alias) {
            return Err(ContainerError::NameConflict(format!(
                "cannot register alias '{alias}': a bean definition with the same name exists"
            )));
        }
        self.aliases.register_alias(name, alias)
    }

    pub fn remove_alias(&self, alias: &str) -> ContainerResult<()> {
        self.aliases.remove_alias(alias)
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.is_alias(name)
    }

    /// 冻结配置：不再接受定义与别名的修改
    pub fn freeze_configuration(&self) {
        self.definitions.freeze();
    }

    pub fn is_configuration_frozen(&self) -> bool {
        self.definitions.is_frozen()
    }

    /// 外部注入一个预构建实例
    pub fn register_singleton(
        &self,
        name: impl Into<String>,
        instance: BeanHandle,
    ) -> ContainerResult<()> {
        self.singletons.register_singleton(&name.into(), instance)
    }

    /// 外部注入一个带类型信息的预构建实例
    pub fn register_singleton_of<T: Any + Send + Sync>(
        &self,
        name: impl Into<String>,
        instance: Arc<T>,
    ) -> ContainerResult<()> {
        let name = name.into();
        self.singletons
            .register_singleton(&name, instance as BeanHandle)?;
        self.external_types
            .lock()
            .insert(name, BeanTypeInfo::of::<T>());
        Ok(())
    }

    /// 添加 Bean 后置处理器
    pub fn add_bean_post_processor(&self, processor: Arc<dyn BeanPostProcessor>) {
        let mut processors = self.post_processors.write();
        tracing::debug!("Registering bean post processor '{}'", processor.name());
        processors.push(processor);
        // 按优先级排序（order 值越小优先级越高）
        processors.sort_by_key(|p| p.order());
    }

    /// 注册自定义作用域
    pub fn register_scope(&self, scope: Arc<dyn CustomScope>) {
        let name = scope.name().to_string();
        self.scopes.write().insert(name, scope);
    }

    /// 注册关闭钩子，关闭开始时按注册顺序执行
    pub fn register_shutdown_hook<F>(&self, hook: F)
    where
        F: Fn() -> ContainerResult<()> + Send + Sync + 'static,
    {
        let mut hooks = self.shutdown_hooks.lock();
        hooks.push(Box::new(hook));
        tracing::debug!("Registered shutdown hook, total: {}", hooks.len());
    }

    // ========== 消费方接口 ==========

    /// 通过名称获取 Bean
    pub fn get_bean(&self, name: &str) -> ContainerResult<BeanHandle> {
        self.do_get_bean(name, None)
    }

    /// 通过名称获取 Bean 并转换为具体类型
    pub fn get_bean_as<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Arc<T>> {
        let bean = self.do_get_bean(name, None)?;
        bean.downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                found: "unknown".to_string(),
            })
    }

    /// 带显式构造参数的获取，只对原型定义有意义
    pub fn get_bean_with_args(
        &self,
        name: &str,
        args: Vec<BeanHandle>,
    ) -> ContainerResult<BeanHandle> {
        self.do_get_bean(name, Some(args))
    }

    /// 按类型获取唯一的 Bean
    pub fn get_bean_by_type<T: Any + Send + Sync>(&self) -> ContainerResult<Arc<T>> {
        let name = self.unique_name_for_type::<T>()?;
        self.get_bean_as::<T>(&name)
    }

    /// 按类型获取唯一的原型 Bean，带显式构造参数
    pub fn get_bean_by_type_with_args<T: Any + Send + Sync>(
        &self,
        args: Vec<BeanHandle>,
    ) -> ContainerResult<Arc<T>> {
        let name = self.unique_name_for_type::<T>()?;
        let bean = self.get_bean_with_args(&name, args)?;
        bean.downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                found: "unknown".to_string(),
            })
    }

    /// 检查是否包含指定名称的 Bean（包含别名与外部注册的单例）
    pub fn contains_bean(&self, name: &str) -> bool {
        let (canonical, _) = self.transformed_name(name);
        if self.definitions.contains(&canonical) || self.singletons.contains_singleton(&canonical) {
            return true;
        }
        self.parent
            .as_ref()
            .map(|p| p.contains_bean(name))
            .unwrap_or(false)
    }

    pub fn is_singleton(&self, name: &str) -> ContainerResult<bool> {
        let (canonical, _) = self.transformed_name(name);
        if let Ok(merged) = self.definitions.merged(&canonical) {
            return Ok(merged.is_singleton());
        }
        if self.singletons.contains_singleton(&canonical) {
            return Ok(true);
        }
        match &self.parent {
            Some(parent) => parent.is_singleton(name),
            None => Err(ContainerError::NoSuchBean(canonical)),
        }
    }

    pub fn is_prototype(&self, name: &str) -> ContainerResult<bool> {
        let (canonical, _) = self.transformed_name(name);
        if let Ok(merged) = self.definitions.merged(&canonical) {
            return Ok(merged.is_prototype());
        }
        if self.singletons.contains_singleton(&canonical) {
            return Ok(false);
        }
        match &self.parent {
            Some(parent) => parent.is_prototype(name),
            None => Err(ContainerError::NoSuchBean(canonical)),
        }
    }

    /// Bean 的类型信息；无法在不实例化的前提下确定时返回 None
    ///
    /// 查询不触发任何实例创建。
    pub fn get_type(&self, name: &str) -> ContainerResult<Option<BeanTypeInfo>> {
        let (canonical, wants_factory) = self.transformed_name(name);

        if let Ok(merged) = self.definitions.merged(&canonical) {
            if let Some(class) = &merged.class {
                if class.is_factory_bean() && !wants_factory {
                    return Ok(class.factory_object_type().cloned());
                }
                return Ok(Some(class.type_info().clone()));
            }
            // 工厂方法产物：类型未知
            return Ok(None);
        }
        if self.singletons.contains_singleton(&canonical) {
            return Ok(self.external_types.lock().get(&canonical).cloned());
        }
        match &self.parent {
            Some(parent) => parent.get_type(name),
            None => Err(ContainerError::NoSuchBean(canonical)),
        }
    }

    /// 名称对应的 Bean 是否与给定类型匹配
    pub fn is_type_match<T: Any>(&self, name: &str) -> ContainerResult<bool> {
        Ok(self
            .get_type(name)?
            .map(|info| info.type_id == TypeId::of::<T>())
            .unwrap_or(false))
    }

    /// 指向给定名称的所有别名
    ///
    /// 输入本身是别名时，结果包含规范名但不包含输入自身。
    pub fn aliases_of(&self, name: &str) -> Vec<String> {
        let canonical = self.aliases.canonical_name(name);
        let mut result: Vec<String> = self
            .aliases
            .aliases_of(&canonical)
            .into_iter()
            .filter(|alias| alias != name)
            .collect();
        if canonical != name {
            result.push(canonical);
        }
        result
    }

    // ========== 枚举接口 ==========

    /// 所有定义名称（注册顺序，不含别名）
    pub fn bean_definition_names(&self) -> Vec<String> {
        self.definitions.names().as_ref().clone()
    }

    pub fn bean_definition_count(&self) -> usize {
        self.definitions.count()
    }

    /// 按类型查找定义名称
    ///
    /// 每个候选要考虑两个事实：声明的类型，以及工厂 Bean 定义的产物
    /// 类型。产物类型未知且 `allow_eager_init` 为 false 时跳过该候选。
    pub fn bean_names_for_type_id(
        &self,
        type_id: TypeId,
        include_non_singletons: bool,
        allow_eager_init: bool,
    ) -> Vec<String> {
        let mut result = Vec::new();

        for name in self.definitions.names().iter() {
            let Ok(merged) = self.definitions.merged(name) else {
                eprintln!("DEBUG merged() failed for {}", name);
                continue;
            };
            eprintln!("DEBUG checking {} class_type_id={:?} target={:?} has_class={}", name, merged.class.as_ref().map(|c| c.type_id()), type_id, merged.class.is_some());
            if !include_non_singletons && !merged.is_singleton() {
                continue;
            }

            if let Some(class) = &merged.class {
                if class.is_factory_bean() {
                    if self.factory_product_matches(name, class, type_id, allow_eager_init) {
                        result.push(name.clone());
                    }
                    // 工厂本身通过解引用前缀匹配
                    if class.type_id() == type_id {
                        result.push(format!("{}{}", constants::FACTORY_BEAN_PREFIX, name));
                    }
                } else if class.type_id() == type_id {
                    result.push(name.clone());
                }
            } else if merged.factory.is_some() && allow_eager_init && merged.is_singleton() {
                // 工厂方法产物类型只能实例化后得知
                if let Ok(instance) = self.get_bean(name) {
                    if instance.as_ref().type_id() == type_id {
                        result.push(name.clone());
                    }
                }
            }
        }

        // 外部注册、没有定义的单例
        for name in self.singletons.singleton_names() {
            if self.definitions.contains(&name) || result.contains(&name) {
                continue;
            }
            if let Some(instance) = self.singletons.get_singleton_allowing_early(&name, false) {
                if instance.as_ref().type_id() == type_id {
                    result.push(name);
                }
            }
        }

        result
    }

    pub fn bean_names_for_type<T: Any>(
        &self,
        include_non_singletons: bool,
        allow_eager_init: bool,
    ) -> Vec<String> {
        self.bean_names_for_type_id(TypeId::of::<T>(), include_non_singletons, allow_eager_init)
    }

    /// 按类型实例化并返回所有匹配的 Bean
    pub fn beans_of_type<T: Any + Send + Sync>(
        &self,
        include_non_singletons: bool,
        allow_eager_init: bool,
    ) -> ContainerResult<HashMap<String, Arc<T>>> {
        let mut result = HashMap::new();
        for name in self.bean_names_for_type::<T>(include_non_singletons, allow_eager_init) {
            let bean = self.get_bean_as::<T>(&name)?;
            result.insert(name, bean);
        }
        Ok(result)
    }

    /// 携带指定注解标记的定义名称
    pub fn bean_names_for_annotation(&self, annotation: &str) -> Vec<String> {
        self.definitions
            .names()
            .iter()
            .filter(|name| {
                self.definitions
                    .merged(name)
                    .map(|def| def.annotations.contains_key(annotation))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// 实例化并返回所有携带指定注解标记的 Bean
    pub fn beans_with_annotation(
        &self,
        annotation: &str,
    ) -> ContainerResult<HashMap<String, BeanHandle>> {
        let mut result = HashMap::new();
        for name in self.bean_names_for_annotation(annotation) {
            result.insert(name.clone(), self.get_bean(&name)?);
        }
        Ok(result)
    }

    /// 查找 Bean 定义上的注解属性
    pub fn find_annotation_on_bean(
        &self,
        name: &str,
        annotation: &str,
    ) -> Option<AnnotationAttributes> {
        let (canonical, _) = self.transformed_name(name);
        self.definitions
            .merged(&canonical)
            .ok()
            .and_then(|def| def.annotations.get(annotation).cloned())
    }

    // ========== 生命周期 ==========

    /// 预实例化所有非延迟加载的单例，按 depends-on 的拓扑顺序进行
    pub fn preinstantiate_singletons(&self) -> ContainerResult<()> {
        let mut dependency_map: HashMap<String, Vec<String>> = HashMap::new();
        for name in self.definitions.names().iter() {
            let Ok(merged) = self.definitions.merged(name) else {
                continue;
            };
            if merged.is_singleton() && !merged.lazy_init {
                dependency_map.insert(name.clone(), merged.depends_on.clone());
            }
        }

        if dependency_map.is_empty() {
            return Ok(());
        }

        let sorted = topological_sort(&dependency_map)
            .map_err(|e| ContainerError::Other(anyhow::anyhow!(e)))?;

        tracing::debug!("Pre-instantiating {} singleton beans", dependency_map.len());
        for name in sorted {
            if dependency_map.contains_key(&name) {
                self.get_bean(&name)?;
            }
        }
        Ok(())
    }

    /// 验证依赖图：缺失的引用与静态环在实例化之前报告
    pub fn validate_dependencies(&self) -> ContainerResult<()> {
        let mut dependency_map: HashMap<String, Vec<String>> = HashMap::new();
        for name in self.definitions.names().iter() {
            let Ok(merged) = self.definitions.merged(name) else {
                continue;
            };
            let mut deps = merged.depends_on.clone();
            let mut collect = |spec: &ValueSpec| {
                if let ValueSpec::Ref(target) = spec {
                    let stripped = target
                        .strip_prefix(constants::FACTORY_BEAN_PREFIX)
                        .unwrap_or(target);
                    deps.push(self.aliases.canonical_name(stripped));
                }
            };
            merged.constructor_args.iter().for_each(&mut collect);
            merged
                .property_values
                .iter()
                .for_each(|(_, spec)| collect(spec));
            dependency_map.insert(name.clone(), deps);
        }

        validate_dependency_graph(&dependency_map, |name| self.contains_bean(name))
            .map_err(|e| ContainerError::Other(anyhow::anyhow!("{e}")))?;

        tracing::info!(
            "Dependency validation passed for {} bean definition(s)",
            dependency_map.len()
        );
        Ok(())
    }

    /// 销毁所有单例并关闭容器
    ///
    /// 先执行关闭钩子，再按依赖感知的逆序销毁单例。关闭是单向迁移，
    /// 此后所有获取请求都会失败。
    pub fn destroy_singletons(&self) {
        tracing::info!("Starting container shutdown");

        let hooks = std::mem::take(&mut *self.shutdown_hooks.lock());
        tracing::info!("Executing {} shutdown hook(s)", hooks.len());
        for (idx, hook) in hooks.iter().enumerate() {
            match hook() {
                Ok(_) => tracing::debug!("Shutdown hook {} executed successfully", idx + 1),
                Err(e) => tracing::warn!("Shutdown hook {} failed: {}", idx + 1, e),
            }
        }

        self.factory_products.lock().clear();
        self.singletons.destroy_singletons();
        tracing::info!("Container shutdown complete");
    }

    /// 单例注册表（供集成层注册依赖边等）
    pub fn singleton_registry(&self) -> &SingletonRegistry {
        &self.singletons
    }

    // ========== 内部实现 ==========

    /// 剥离工厂解引用前缀并解析别名链
    fn transformed_name(&self, name: &str) -> (String, bool) {
        let wants_factory = name.starts_with(constants::FACTORY_BEAN_PREFIX);
        let mut bare = name;
        while let Some(stripped) = bare.strip_prefix(constants::FACTORY_BEAN_PREFIX) {
            bare = stripped;
        }
        (self.aliases.canonical_name(bare), wants_factory)
    }

    fn do_get_bean(&self, name: &str, args: Option<Vec<BeanHandle>>) -> ContainerResult<BeanHandle> {
        if self.singletons.is_closed() {
            return Err(ContainerError::ContainerClosed);
        }

        let (canonical, wants_factory) = self.transformed_name(name);
        tracing::trace!("Requesting bean '{}'", canonical);

        // 就绪单例的快路径
        if args.is_none() {
            if let Some(shared) = self.singletons.get_singleton(&canonical) {
                if self.singletons.is_in_creation(&canonical) {
                    tracing::trace!(
                        "Returning eagerly cached instance of singleton bean '{}' \
                         that is not fully initialized yet",
                        canonical
                    );
                } else {
                    tracing::trace!(
                        "Returning cached instance of singleton bean '{}'",
                        canonical
                    );
                }
                return self.resolve_factory_product(&canonical, shared, wants_factory);
            }
        }

        let merged = match self.definitions.merged(&canonical) {
            Ok(merged) => merged,
            Err(ContainerError::NoSuchBean(_)) => {
                if let Some(parent) = &self.parent {
                    return parent.do_get_bean(name, args);
                }
                return Err(ContainerError::NoSuchBean(canonical));
            }
            Err(e) => return Err(e),
        };

        // depends-on 的名称必须先完成初始化
        for dep in &merged.depends_on {
            let dep = self.aliases.canonical_name(dep);
            if self.singletons.is_dependent(&canonical, &dep) {
                return Err(ContainerError::creation_message(
                    &canonical,
                    format!("circular depends-on relationship between '{canonical}' and '{dep}'"),
                ));
            }
            self.singletons.register_dependency(&canonical, &dep);
            self.get_bean(&dep)?;
        }

        let scope = merged.effective_scope();
        if args.is_some() && scope != Scope::Prototype {
            return Err(ContainerError::creation_message(
                &canonical,
                "explicit arguments are only supported for prototype definitions",
            ));
        }

        let instance = match scope {
            Scope::Singleton => self.singletons.get_or_create(&canonical, || {
                tracing::info!("Creating shared instance of singleton bean '{}'", canonical);
                self.create_bean(&canonical, &merged, None)
            })?,
            Scope::Prototype => {
                tracing::debug!("Creating new instance of prototype bean '{}'", canonical);
                if !self.prototypes_in_creation.insert(&canonical) {
                    return Err(ContainerError::CircularPrototype(canonical));
                }
                struct PrototypeGuard<'a> {
                    set: &'a ThreadLocalSet,
                    name: &'a str,
                }
                impl Drop for PrototypeGuard<'_> {
                    fn drop(&mut self) {
                        self.set.remove(self.name);
                    }
                }
                let _guard = PrototypeGuard {
                    set: &self.prototypes_in_creation,
                    name: &canonical,
                };
                self.create_bean(&canonical, &merged, args)?
            }
            Scope::Custom(scope_name) => {
                let scope_impl = self
                    .scopes
                    .read()
                    .get(&scope_name)
                    .cloned()
                    .ok_or_else(|| ContainerError::UnknownScope(scope_name.clone()))?;
                scope_impl.get(&canonical, &mut || self.create_bean(&canonical, &merged, None))?
            }
        };

        self.resolve_factory_product(&canonical, instance, wants_factory)
    }

    /// 创建 Bean 实例并完成属性填充与初始化
    fn create_bean(
        &self,
        name: &str,
        definition: &BeanDefinition,
        args: Option<Vec<BeanHandle>>,
    ) -> ContainerResult<BeanHandle> {
        // 1. 实例化
        let instance = self
            .instantiate(name, definition, args)
            .map_err(|e| ContainerError::creation(name, e))?;

        // 2. 提前暴露：单例在属性填充之前即可被循环引用消费
        if definition.is_singleton()
            && self.singletons.is_in_creation_here(name)
            && self.allow_circular_references.load(Ordering::Acquire)
        {
            let processors: Vec<Arc<dyn BeanPostProcessor>> =
                self.post_processors.read().clone();
            let raw = instance.clone();
            let bean_name = name.to_string();
            self.singletons.add_singleton_factory(
                name,
                Box::new(move || {
                    let mut exposed = raw;
                    for processor in &processors {
                        exposed = processor.early_bean_reference(exposed, &bean_name);
                    }
                    exposed
                }),
            );
        }

        // 3. 属性填充
        self.populate(name, definition, &instance)
            .map_err(|e| ContainerError::creation(name, e))?;

        // 4-7. 初始化序列；后置处理器可以替换实例
        let exposed = self
            .initialize(name, definition, instance.clone())
            .map_err(|e| ContainerError::creation(name, e))?;

        // 销毁回调登记；包装器安装与否不影响真实对象的销毁
        if definition.is_singleton() {
            self.maybe_register_disposable(name, definition, &instance)?;
        }

        Ok(exposed)
    }

    /// 选择构造方式并实例化
    fn instantiate(
        &self,
        name: &str,
        definition: &BeanDefinition,
        args: Option<Vec<BeanHandle>>,
    ) -> ContainerResult<BeanHandle> {
        if let Some(factory_ref) = &definition.factory {
            let factory_canonical = self.aliases.canonical_name(&factory_ref.factory_bean);
            self.singletons.register_dependency(name, &factory_canonical);
            let factory_instance = self.get_bean(&factory_ref.factory_bean)?;

            let factory_def = self.definitions.merged(&factory_canonical)?;
            let factory_class = factory_def.class.as_ref().ok_or_else(|| {
                ContainerError::creation_message(
                    name,
                    format!("factory bean '{factory_canonical}' has no class descriptor"),
                )
            })?;
            let method = factory_class
                .factory_method(&factory_ref.method)
                .ok_or_else(|| {
                    ContainerError::creation_message(
                        name,
                        format!(
                            "no factory method '{}' on type '{}'",
                            factory_ref.method,
                            factory_class.type_name()
                        ),
                    )
                })?;

            let values =
                self.resolve_parameters(name, &method.params, &definition.constructor_args)?;
            return (method.invoke)(&factory_instance, values);
        }

        let class = definition.class.as_ref().ok_or_else(|| {
            ContainerError::creation_message(
                name,
                "definition declares neither a class nor a factory method",
            )
        })?;

        let constructor = self.select_constructor(name, class, definition, args.as_deref())?;
        let values = match args {
            Some(explicit) => explicit,
            None => self.resolve_parameters(name, &constructor.params, &definition.constructor_args)?,
        };
        (constructor.invoke)(values)
    }

    /// 构造函数选择
    ///
    /// 顺序：显式参数个数匹配优先，其次贪心地按参数最多、声明顺序靠前
    /// 尝试自动装配。同一参数个数存在多个候选即为歧义。
    fn select_constructor<'a>(
        &self,
        name: &str,
        class: &'a BeanClass,
        definition: &BeanDefinition,
        explicit_args: Option<&[BeanHandle]>,
    ) -> ContainerResult<&'a ConstructorSpec> {
        let constructors = class.constructors();
        if constructors.is_empty() {
            return Err(ContainerError::creation_message(
                name,
                format!("type '{}' declares no constructor", class.type_name()),
            ));
        }

        let arity_hint = match explicit_args {
            Some(args) => Some(args.len()),
            None if !definition.constructor_args.is_empty() => {
                Some(definition.constructor_args.len())
            }
            None => None,
        };

        if let Some(arity) = arity_hint {
            let matching: Vec<&ConstructorSpec> = constructors
                .iter()
                .filter(|c| c.params.len() == arity)
                .collect();
            return match matching.len() {
                0 => Err(ContainerError::creation_message(
                    name,
                    format!(
                        "no constructor of '{}' accepts {} argument(s)",
                        class.type_name(),
                        arity
                    ),
                )),
                1 => Ok(matching[0]),
                n => Err(ContainerError::AmbiguousConstructor {
                    bean: name.to_string(),
                    arity,
                    candidates: n,
                }),
            };
        }

        // 贪心：参数最多优先，平局按声明顺序
        let mut order: Vec<usize> = (0..constructors.len()).collect();
        order.sort_by(|a, b| {
            constructors[*b]
                .params
                .len()
                .cmp(&constructors[*a].params.len())
                .then(a.cmp(b))
        });

        let mut last_error = None;
        for idx in order {
            let candidate = &constructors[idx];
            match self.check_autowirable(name, &candidate.params) {
                Ok(()) => return Ok(candidate),
                Err(e) => {
                    self.singletons.on_suppressed(format!(
                        "constructor with {} parameter(s) not satisfiable: {}",
                        candidate.params.len(),
                        e
                    ));
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            ContainerError::AmbiguousConstructor {
                bean: name.to_string(),
                arity: 0,
                candidates: constructors.len(),
            }
        }))
    }

    /// 检查构造函数的所有参数是否可以自动装配（不触发实例化）
    fn check_autowirable(&self, bean_name: &str, params: &[ParameterSpec]) -> ContainerResult<()> {
        for param in params {
            self.autowire_candidate(bean_name, param)?;
        }
        Ok(())
    }

    /// 解析参数列表；位置上缺失的取值方式按自动装配处理
    fn resolve_parameters(
        &self,
        bean_name: &str,
        params: &[ParameterSpec],
        positional: &[ValueSpec],
    ) -> ContainerResult<Vec<BeanHandle>> {
        if positional.len() > params.len() {
            return Err(ContainerError::creation_message(
                bean_name,
                format!(
                    "{} constructor argument(s) declared but the selected constructor \
                     only accepts {}",
                    positional.len(),
                    params.len()
                ),
            ));
        }
        let autowired = ValueSpec::Autowired;
        let mut values = Vec::with_capacity(params.len());
        for (idx, param) in params.iter().enumerate() {
            let spec = positional.get(idx).unwrap_or(&autowired);
            values.push(self.resolve_value(bean_name, param, spec)?);
        }
        Ok(values)
    }

    /// 解析单个取值
    fn resolve_value(
        &self,
        bean_name: &str,
        param: &ParameterSpec,
        spec: &ValueSpec,
    ) -> ContainerResult<BeanHandle> {
        match spec {
            ValueSpec::Ref(target) => {
                let stripped = target
                    .strip_prefix(constants::FACTORY_BEAN_PREFIX)
                    .unwrap_or(target);
                let canonical = self.aliases.canonical_name(stripped);
                self.singletons.register_dependency(bean_name, &canonical);
                self.get_bean(target)
            }
            ValueSpec::Value(literal) => self.convert_literal(param, literal),
            ValueSpec::Definition(inner) => {
                let merged = self.definitions.merge_standalone(inner)?;
                let id = self.inner_bean_counter.fetch_add(1, Ordering::Relaxed);
                let inner_name = format!("{}{}", constants::INNER_BEAN_PREFIX, id);
                self.singletons.register_containment(bean_name, &inner_name);
                let instance = self.create_bean(&inner_name, &merged, None)?;
                self.maybe_register_disposable(&inner_name, &merged, &instance)?;
                Ok(instance)
            }
            ValueSpec::Autowired => {
                let chosen = self.autowire_candidate(bean_name, param)?;
                self.singletons.register_dependency(bean_name, &chosen);
                self.get_bean(&chosen)
            }
        }
    }

    /// 字面量转换：字符串先做占位符展开，再按注入点类型转换
    fn convert_literal(
        &self,
        param: &ParameterSpec,
        literal: &ConfigValue,
    ) -> ContainerResult<BeanHandle> {
        let literal = match literal {
            ConfigValue::String(s) => {
                let expanded = match self.placeholder_lookup.read().clone() {
                    Some(lookup) => self.placeholders.replace(s, &move |key| lookup(key))?,
                    None => s.clone(),
                };
                ConfigValue::String(expanded)
            }
            other => other.clone(),
        };

        let mismatch = || ContainerError::TypeMismatch {
            expected: param.type_name.clone(),
            found: literal.kind().to_string(),
        };

        if param.type_id == TypeId::of::<String>() {
            Ok(Arc::new(literal.as_string().ok_or_else(mismatch)?))
        } else if param.type_id == TypeId::of::<i64>() {
            Ok(Arc::new(literal.as_i64().ok_or_else(mismatch)?))
        } else if param.type_id == TypeId::of::<f64>() {
            Ok(Arc::new(literal.as_f64().ok_or_else(mismatch)?))
        } else if param.type_id == TypeId::of::<bool>() {
            Ok(Arc::new(literal.as_bool().ok_or_else(mismatch)?))
        } else if param.type_id == TypeId::of::<ConfigValue>() {
            Ok(Arc::new(literal))
        } else {
            Err(mismatch())
        }
    }

    /// 自动装配决断：类型候选 -> autowire-candidate 过滤 -> primary ->
    /// 注入点名称，仍无法决断则失败
    fn autowire_candidate(
        &self,
        bean_name: &str,
        param: &ParameterSpec,
    ) -> ContainerResult<String> {
        let raw = self.bean_names_for_type_id(param.type_id, true, false);
        eprintln!("DEBUG autowire_candidate bean={} param={} type_id={:?} raw={:?}", bean_name, param.name, param.type_id, raw);
        let mut candidates: Vec<String> = raw
            .into_iter()
            .filter(|candidate| candidate != bean_name)
            .filter(|candidate| {
                self.definitions
                    .merged(candidate)
                    .map(|def| def.autowire_candidate)
                    .unwrap_or(true)
            })
            .collect();

        if candidates.is_empty() {
            return Err(ContainerError::UnresolvableDependency {
                bean: bean_name.to_string(),
                injection_point: param.name.clone(),
                reason: format!("no candidate of type '{}' available", param.type_name),
            });
        }
        if candidates.len() == 1 {
            return Ok(candidates.remove(0));
        }

        let primaries: Vec<&String> = candidates
            .iter()
            .filter(|candidate| {
                self.definitions
                    .merged(candidate)
                    .map(|def| def.primary)
                    .unwrap_or(false)
            })
            .collect();
        if primaries.len() == 1 {
            return Ok(primaries[0].clone());
        }
        if primaries.len() > 1 {
            return Err(ContainerError::UnresolvableDependency {
                bean: bean_name.to_string(),
                injection_point: param.name.clone(),
                reason: format!(
                    "more than one 'primary' candidate of type '{}' found",
                    param.type_name
                ),
            });
        }

        if candidates.iter().any(|candidate| *candidate == param.name) {
            return Ok(param.name.clone());
        }

        Err(ContainerError::UnresolvableDependency {
            bean: bean_name.to_string(),
            injection_point: param.name.clone(),
            reason: format!(
                "{} candidates of type '{}' found and none is primary: {}",
                candidates.len(),
                param.type_name,
                candidates.join(", ")
            ),
        })
    }

    /// 属性填充
    fn populate(
        &self,
        name: &str,
        definition: &BeanDefinition,
        instance: &BeanHandle,
    ) -> ContainerResult<()> {
        if definition.property_values.is_empty() {
            return Ok(());
        }
        let class = definition.class.as_ref().ok_or_else(|| {
            ContainerError::creation_message(
                name,
                "property values declared but the definition has no class descriptor",
            )
        })?;

        for (property_name, spec) in &definition.property_values {
            let property = class.property(property_name).ok_or_else(|| {
                ContainerError::creation_message(
                    name,
                    format!(
                        "unknown property '{}' on type '{}'",
                        property_name,
                        class.type_name()
                    ),
                )
            })?;
            let value = self.resolve_value(name, &property.param, spec)?;
            (property.set)(instance, value)?;
        }
        Ok(())
    }

    /// 初始化序列
    fn initialize(
        &self,
        name: &str,
        definition: &BeanDefinition,
        instance: BeanHandle,
    ) -> ContainerResult<BeanHandle> {
        // 上下文感知回调
        if let Some(class) = &definition.class {
            if let Some(aware) = class.aware_callback() {
                let context = ContainerContext::new(name, self.self_ref.clone());
                aware(&instance, &context)?;
            }
        }

        let processors: Vec<Arc<dyn BeanPostProcessor>> = self.post_processors.read().clone();

        let mut bean = instance;
        for processor in &processors {
            bean = processor.before_initialization(bean, name)?;
        }

        if let Some(init_method) = &definition.init_method {
            let class = definition.class.as_ref().ok_or_else(|| {
                ContainerError::creation_message(
                    name,
                    "init-method declared but the definition has no class descriptor",
                )
            })?;
            let callback = class.callback(init_method).ok_or_else(|| {
                ContainerError::creation_message(
                    name,
                    format!(
                        "no init method '{}' on type '{}'",
                        init_method,
                        class.type_name()
                    ),
                )
            })?;
            callback(&bean).map_err(|e| {
                ContainerError::creation_message(name, format!("init method failed: {e}"))
            })?;
        }

        for processor in &processors {
            bean = processor.after_initialization(bean, name)?;
        }

        Ok(bean)
    }

    /// 销毁回调登记
    ///
    /// 回调捕获的是原始实例：即使后置处理器安装了包装器，销毁动作也
    /// 作用在真实对象上。
    fn maybe_register_disposable(
        &self,
        name: &str,
        definition: &BeanDefinition,
        instance: &BeanHandle,
    ) -> ContainerResult<()> {
        let Some(class) = &definition.class else {
            return Ok(());
        };

        let callback: Option<CallbackFn> = match &definition.destroy_method {
            Some(method) => Some(
                class
                    .callback(method)
                    .ok_or_else(|| {
                        ContainerError::creation_message(
                            name,
                            format!(
                                "no destroy method '{}' on type '{}'",
                                method,
                                class.type_name()
                            ),
                        )
                    })?
                    .clone(),
            ),
            None => class.dispose_callback().cloned(),
        };

        if let Some(callback) = callback {
            let handle = instance.clone();
            let bean_name = name.to_string();
            self.singletons.register_disposable(
                name,
                Box::new(move || {
                    if let Err(e) = callback(&handle) {
                        tracing::warn!(
                            "Destroy method on bean with name '{}' threw an error: {}",
                            bean_name,
                            e
                        );
                    }
                }),
            );
        }
        Ok(())
    }

    /// 工厂 Bean 解引用
    ///
    /// 实例是工厂 Bean 且调用方没有请求工厂本身时，返回产物；单例产物
    /// 会被缓存。
    fn resolve_factory_product(
        &self,
        name: &str,
        instance: BeanHandle,
        wants_factory: bool,
    ) -> ContainerResult<BeanHandle> {
        let factory = self
            .definitions
            .merged(name)
            .ok()
            .and_then(|def| def.class.clone())
            .and_then(|class| class.as_factory_bean(&instance));

        match factory {
            Some(factory) => {
                if wants_factory {
                    return Ok(instance);
                }
                if factory.is_singleton() {
                    if let Some(cached) = self.factory_products.lock().get(name) {
                        return Ok(cached.clone());
                    }
                    let product = factory.object()?;
                    self.factory_products
                        .lock()
                        .insert(name.to_string(), product.clone());
                    Ok(product)
                } else {
                    factory.object()
                }
            }
            None => {
                if wants_factory {
                    return Err(ContainerError::TypeMismatch {
                        expected: "factory bean".to_string(),
                        found: format!("bean '{name}' does not produce other objects"),
                    });
                }
                Ok(instance)
            }
        }
    }

    fn factory_product_matches(
        &self,
        name: &str,
        class: &BeanClass,
        type_id: TypeId,
        allow_eager_init: bool,
    ) -> bool {
        if let Some(hint) = class.factory_object_type() {
            return hint.type_id == type_id;
        }
        if !allow_eager_init {
            // 产物类型未知且不允许实例化，跳过该候选
            return false;
        }
        let factory_name = format!("{}{}", constants::FACTORY_BEAN_PREFIX, name);
        match self.do_get_bean(&factory_name, None) {
            Ok(instance) => match class.as_factory_bean(&instance) {
                Some(factory) => match factory.object_type() {
                    Some(info) => info.type_id == type_id,
                    None => self
                        .get_bean(name)
                        .map(|product| product.as_ref().type_id() == type_id)
                        .unwrap_or(false),
                },
                None => false,
            },
            Err(_) => false,
        }
    }

    fn unique_name_for_type<T: Any>(&self) -> ContainerResult<String> {
        let type_name = std::any::type_name::<T>();
        let mut candidates = self.bean_names_for_type_id(TypeId::of::<T>(), true, true);
        match candidates.len() {
            0 => Err(ContainerError::NoSuchBean(format!(
                "no bean of type '{type_name}'"
            ))),
            1 => Ok(candidates.remove(0)),
            _ => {
                let mut primaries: Vec<String> = candidates
                    .iter()
                    .filter(|candidate| {
                        self.definitions
                            .merged(candidate)
                            .map(|def| def.primary)
                            .unwrap_or(false)
                    })
                    .cloned()
                    .collect();
                if primaries.len() == 1 {
                    Ok(primaries.remove(0))
                } else {
                    Err(ContainerError::NoUniqueBean {
                        type_name: type_name.to_string(),
                        candidates,
                    })
                }
            }
        }
    }
}

impl BeanFactory for StandardBeanFactory {
    fn get_bean(&self, name: &str) -> ContainerResult<BeanHandle> {
        StandardBeanFactory::get_bean(self, name)
    }

    fn contains_bean(&self, name: &str) -> bool {
        StandardBeanFactory::contains_bean(self, name)
    }
}

impl std::fmt::Debug for StandardBeanFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardBeanFactory")
            .field("definitions", &self.definitions.count())
            .field("frozen", &self.definitions.is_frozen())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::RwLock as PlRwLock;

    struct Repository {
        label: String,
    }

    struct Service {
        repository: PlRwLock<Option<Arc<Repository>>>,
    }

    fn repository_class() -> Arc<BeanClass> {
        BeanClass::builder::<Repository>()
            .constructor::<Repository, _>(
                vec![ParameterSpec::of::<String>("label")],
                |mut args| {
                    let label = args
                        .remove(0)
                        .downcast::<String>()
                        .map_err(|_| ContainerError::TypeMismatch {
                            expected: "String".into(),
                            found: "other".into(),
                        })?;
                    Ok(Repository {
                        label: (*label).clone(),
                    })
                },
            )
            .build()
    }

    fn service_class() -> Arc<BeanClass> {
        BeanClass::builder::<Service>()
            .constructor::<Service, _>(vec![], |_| {
                Ok(Service {
                    repository: PlRwLock::new(None),
                })
            })
            .property::<Service, Repository, _>("repository", |service, repository| {
                *service.repository.write() = Some(repository);
                Ok(())
            })
            .build()
    }

    #[test]
    fn test_constructor_literal_with_conversion() {
        let factory = StandardBeanFactory::new();
        factory
            .register_definition(
                "repository",
                BeanDefinition::for_class(repository_class())
                    .with_constructor_arg(ValueSpec::Value(ConfigValue::String("main".into()))),
            )
            .unwrap();

        let repository = factory.get_bean_as::<Repository>("repository").unwrap();
        assert_eq!(repository.label, "main");
    }

    #[test]
    fn test_property_reference_and_autowire() {
        eprintln!("DEBUG direct repo={:?} service={:?} rc={:?} sc={:?}", TypeId::of::<Repository>(), TypeId::of::<Service>(), repository_class().type_id(), service_class().type_id());
        let factory = StandardBeanFactory::new();
        factory
            .register_definition(
                "repository",
                BeanDefinition::for_class(repository_class())
                    .with_constructor_arg(ValueSpec::Value(ConfigValue::String("main".into()))),
            )
            .unwrap();
        factory
            .register_definition(
                "explicit",
                BeanDefinition::for_class(service_class())
                    .with_property("repository", ValueSpec::Ref("repository".into())),
            )
            .unwrap();
        factory
            .register_definition(
                "wired",
                BeanDefinition::for_class(service_class())
                    .with_property("repository", ValueSpec::Autowired),
            )
            .unwrap();

        let explicit = factory.get_bean_as::<Service>("explicit").unwrap();
        let wired = factory.get_bean_as::<Service>("wired").unwrap();
        let repository = factory.get_bean_as::<Repository>("repository").unwrap();

        assert!(Arc::ptr_eq(
            explicit.repository.read().as_ref().unwrap(),
            &repository
        ));
        assert!(Arc::ptr_eq(
            wired.repository.read().as_ref().unwrap(),
            &repository
        ));
        // 依赖边已记录
        assert!(factory
            .singleton_registry()
            .is_dependent("repository", "explicit"));
    }

    #[test]
    fn test_autowire_prefers_primary() {
        let factory = StandardBeanFactory::new();
        for (name, primary) in [("first", false), ("second", true)] {
            factory
                .register_definition(
                    name,
                    BeanDefinition::for_class(repository_class())
                        .with_constructor_arg(ValueSpec::Value(ConfigValue::String(name.into())))
                        .with_primary(primary),
                )
                .unwrap();
        }
        factory
            .register_definition(
                "service",
                BeanDefinition::for_class(service_class())
                    .with_property("repository", ValueSpec::Autowired),
            )
            .unwrap();

        let service = factory.get_bean_as::<Service>("service").unwrap();
        assert_eq!(
            service.repository.read().as_ref().unwrap().label,
            "second"
        );
    }

    #[test]
    fn test_autowire_falls_back_to_injection_point_name() {
        let factory = StandardBeanFactory::new();
        for name in ["repository", "other"] {
            factory
                .register_definition(
                    name,
                    BeanDefinition::for_class(repository_class())
                        .with_constructor_arg(ValueSpec::Value(ConfigValue::String(name.into()))),
                )
                .unwrap();
        }
        factory
            .register_definition(
                "service",
                BeanDefinition::for_class(service_class())
                    .with_property("repository", ValueSpec::Autowired),
            )
            .unwrap();

        // 注入点名为 "repository"：按名称决断
        let service = factory.get_bean_as::<Service>("service").unwrap();
        assert_eq!(
            service.repository.read().as_ref().unwrap().label,
            "repository"
        );
    }

    #[test]
    fn test_autowire_failure_reports_candidates() {
        let factory = StandardBeanFactory::new();
        for name in ["first", "second"] {
            factory
                .register_definition(
                    name,
                    BeanDefinition::for_class(repository_class())
                        .with_constructor_arg(ValueSpec::Value(ConfigValue::String(name.into()))),
                )
                .unwrap();
        }
        factory
            .register_definition(
                "service",
                BeanDefinition::for_class(service_class())
                    .with_property("repository", ValueSpec::Autowired),
            )
            .unwrap();

        let err = factory.get_bean("service").unwrap_err();
        match err {
            ContainerError::BeanCreation { source, .. } => {
                assert!(matches!(
                    source.as_deref(),
                    Some(ContainerError::UnresolvableDependency { .. })
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ambiguous_constructor() {
        struct Twins;
        let class = BeanClass::builder::<Twins>()
            .constructor::<Twins, _>(vec![ParameterSpec::of::<String>("a")], |_| Ok(Twins))
            .constructor::<Twins, _>(vec![ParameterSpec::of::<i64>("b")], |_| Ok(Twins))
            .build();

        let factory = StandardBeanFactory::new();
        factory
            .register_definition(
                "twins",
                BeanDefinition::for_class(class)
                    .with_constructor_arg(ValueSpec::Value(ConfigValue::String("x".into()))),
            )
            .unwrap();

        let err = factory.get_bean("twins").unwrap_err();
        match err {
            ContainerError::BeanCreation { source, .. } => {
                assert!(matches!(
                    source.as_deref(),
                    Some(ContainerError::AmbiguousConstructor { .. })
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_greedy_constructor_selection() {
        // 两个构造函数：无参的和带 Repository 的；容器应优先选择参数
        // 更多且可满足的那个
        struct Greedy {
            wired: bool,
        }
        let class = BeanClass::builder::<Greedy>()
            .constructor::<Greedy, _>(vec![], |_| Ok(Greedy { wired: false }))
            .constructor::<Greedy, _>(
                vec![ParameterSpec::of::<Repository>("repository")],
                |_| Ok(Greedy { wired: true }),
            )
            .build();

        let factory = StandardBeanFactory::new();
        factory
            .register_definition(
                "repository",
                BeanDefinition::for_class(repository_class())
                    .with_constructor_arg(ValueSpec::Value(ConfigValue::String("main".into()))),
            )
            .unwrap();
        factory
            .register_definition("greedy", BeanDefinition::for_class(class))
            .unwrap();

        let greedy = factory.get_bean_as::<Greedy>("greedy").unwrap();
        assert!(greedy.wired);
    }

    #[test]
    fn test_inner_bean_containment() {
        let factory = StandardBeanFactory::new();
        let inner = BeanDefinition::for_class(repository_class())
            .with_constructor_arg(ValueSpec::Value(ConfigValue::String("inner".into())));
        factory
            .register_definition(
                "service",
                BeanDefinition::for_class(service_class())
                    .with_property("repository", ValueSpec::Definition(Arc::new(inner))),
            )
            .unwrap();

        let service = factory.get_bean_as::<Service>("service").unwrap();
        assert_eq!(service.repository.read().as_ref().unwrap().label, "inner");

        // 包含关系隐含销毁顺序边：service 依赖内部 Bean
        let registry = factory.singleton_registry();
        let inner_names = registry.dependencies_of("service");
        assert!(inner_names
            .iter()
            .any(|n| n.starts_with(constants::INNER_BEAN_PREFIX)));
    }

    #[test]
    fn test_unknown_property_fails() {
        let factory = StandardBeanFactory::new();
        factory
            .register_definition(
                "service",
                BeanDefinition::for_class(service_class()).with_property(
                    "missing",
                    ValueSpec::Value(ConfigValue::String("x".into())),
                ),
            )
            .unwrap();

        let err = factory.get_bean("service").unwrap_err();
        assert!(err.to_string().contains("unknown property"));
    }

    #[test]
    fn test_literal_placeholder_expansion() {
        let properties: HashMap<String, String> =
            [("repo.label".to_string(), "from-config".to_string())].into();

        let factory = StandardBeanFactory::new();
        // 取值能力由调用方提供
        factory.set_placeholder_lookup(move |key| properties.get(key).cloned());
        factory
            .register_definition(
                "repository",
                BeanDefinition::for_class(repository_class()).with_constructor_arg(
                    ValueSpec::Value(ConfigValue::String("${repo.label}".into())),
                ),
            )
            .unwrap();

        let repository = factory.get_bean_as::<Repository>("repository").unwrap();
        assert_eq!(repository.label, "from-config");
    }

    #[test]
    fn test_literal_without_lookup_is_used_verbatim() {
        let factory = StandardBeanFactory::new();
        factory
            .register_definition(
                "repository",
                BeanDefinition::for_class(repository_class()).with_constructor_arg(
                    ValueSpec::Value(ConfigValue::String("plain label".into())),
                ),
            )
            .unwrap();

        let repository = factory.get_bean_as::<Repository>("repository").unwrap();
        assert_eq!(repository.label, "plain label");
    }
}
