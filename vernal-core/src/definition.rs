//! Bean 定义与类型描述符
//!
//! [`BeanDefinition`] 是声明式的组件描述：用哪个类型描述符（或哪个
//! 工厂方法）生产实例、构造参数和属性如何取值、作用域与生命周期回调
//! 是什么。[`BeanClass`] 是 Rust 侧对"类"的建模：构造函数、属性
//! setter、命名回调等都以闭包表的形式注册，容器通过它完成实例化与
//! 属性填充。

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ContainerError, ContainerResult};
use crate::lifecycle::ContainerContext;
use crate::scope::Scope;
use crate::utils::naming;

/// 字面量值
///
/// 定义中的构造参数与属性字面量用它承载；字符串字面量在解析时先做
/// 占位符展开，再按注入点类型转换。
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<ConfigValue>),
    Object(HashMap<String, ConfigValue>),
}

impl ConfigValue {
    /// 转换为字符串引用
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// 将标量值渲染为字符串
    pub fn as_string(&self) -> Option<String> {
        match self {
            ConfigValue::String(s) => Some(s.clone()),
            ConfigValue::Int(i) => Some(i.to_string()),
            ConfigValue::Float(f) => Some(f.to_string()),
            ConfigValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// 转换为整数
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            ConfigValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// 转换为浮点数
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(f) => Some(*f),
            ConfigValue::Int(i) => Some(*i as f64),
            ConfigValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// 转换为布尔值
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            ConfigValue::String(s) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// 值的种类名称，用于类型不匹配时的错误消息
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::String(_) => "string",
            ConfigValue::Int(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::Bool(_) => "boolean",
            ConfigValue::Array(_) => "array",
            ConfigValue::Object(_) => "object",
        }
    }
}

/// 容器管理的实例句柄
pub type BeanHandle = Arc<dyn Any + Send + Sync>;

/// 判断两个句柄是否指向同一个对象
///
/// 只比较数据指针。同一对象的不同 trait object 胖指针可能携带不同的
/// vtable 指针，因此不能直接用 `Arc::ptr_eq`。
pub fn same_instance(a: &BeanHandle, b: &BeanHandle) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// 构造函数调用闭包
pub type ConstructorFn =
    Arc<dyn Fn(Vec<BeanHandle>) -> ContainerResult<BeanHandle> + Send + Sync>;

/// 属性 setter 闭包
///
/// setter 接收共享引用：参与循环引用的 Bean 在提前暴露之后仍要继续
/// 填充属性，字段必须使用内部可变性。
pub type SetterFn = Arc<dyn Fn(&BeanHandle, BeanHandle) -> ContainerResult<()> + Send + Sync>;

/// 生命周期回调闭包（init-method / destroy-method）
pub type CallbackFn = Arc<dyn Fn(&BeanHandle) -> ContainerResult<()> + Send + Sync>;

/// 上下文感知回调闭包
pub type AwareFn =
    Arc<dyn Fn(&BeanHandle, &ContainerContext) -> ContainerResult<()> + Send + Sync>;

/// 工厂方法调用闭包：第一个参数是工厂 Bean 实例
pub type FactoryMethodFn =
    Arc<dyn Fn(&BeanHandle, Vec<BeanHandle>) -> ContainerResult<BeanHandle> + Send + Sync>;

/// 将实例转换为 FactoryBean 视图的闭包
pub type FactoryBeanCast =
    Arc<dyn Fn(&BeanHandle) -> Option<Arc<dyn FactoryBean>> + Send + Sync>;

/// FactoryBean - 以生产其他对象为目的的 Bean
///
/// 消费者默认拿到的是 `object()` 的产物；请求 `&name` 才能拿到工厂
/// 本身。
pub trait FactoryBean: Send + Sync {
    /// 生产对象
    fn object(&self) -> ContainerResult<BeanHandle>;

    /// 产物的类型（可能无法在实例化产物之前确定）
    fn object_type(&self) -> Option<BeanTypeInfo> {
        None
    }

    /// 产物是否是单例（单例产物会被容器缓存）
    fn is_singleton(&self) -> bool {
        true
    }
}

/// 类型标识信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeanTypeInfo {
    pub type_id: TypeId,
    pub type_name: String,
}

impl BeanTypeInfo {
    pub fn of<T: Any>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>().to_string(),
        }
    }
}

/// 注入点参数描述
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    /// 参数名（自动装配按名称决断时使用）
    pub name: String,
    pub type_id: TypeId,
    pub type_name: String,
}

impl ParameterSpec {
    pub fn of<T: Any>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>().to_string(),
        }
    }
}

/// 一个构造函数候选
#[derive(Clone)]
pub struct ConstructorSpec {
    pub params: Vec<ParameterSpec>,
    pub invoke: ConstructorFn,
}

/// 一个工厂方法
#[derive(Clone)]
pub struct FactoryMethodSpec {
    pub params: Vec<ParameterSpec>,
    pub invoke: FactoryMethodFn,
}

/// 一个可填充的属性
#[derive(Clone)]
pub struct PropertySpec {
    pub param: ParameterSpec,
    pub set: SetterFn,
}

/// BeanClass - 类型描述符
///
/// Rust 没有运行时反射，容器对"类"的所有认知都来自这里注册的闭包表。
/// 由配置加载方（或应用代码）通过 [`BeanClassBuilder`] 构建。
pub struct BeanClass {
    type_info: BeanTypeInfo,
    constructors: Vec<ConstructorSpec>,
    properties: HashMap<String, PropertySpec>,
    callbacks: HashMap<String, CallbackFn>,
    dispose: Option<CallbackFn>,
    aware: Option<AwareFn>,
    factory_methods: HashMap<String, FactoryMethodSpec>,
    factory_bean: Option<FactoryBeanCast>,
    /// 工厂 Bean 产物类型的静态提示；None 表示必须实例化工厂才能得知
    factory_object_type: Option<BeanTypeInfo>,
}

impl BeanClass {
    pub fn builder<T: Any + Send + Sync>() -> BeanClassBuilder {
        BeanClassBuilder::new(BeanTypeInfo::of::<T>())
    }

    pub fn type_info(&self) -> &BeanTypeInfo {
        &self.type_info
    }

    pub fn type_id(&self) -> TypeId {
        self.type_info.type_id
    }

    pub fn type_name(&self) -> &str {
        &self.type_info.type_name
    }

    /// 默认 Bean 名称：类型短名的 camelCase 形式
    pub fn default_bean_name(&self) -> String {
        naming::to_camel_case(naming::short_type_name(&self.type_info.type_name))
    }

    pub fn constructors(&self) -> &[ConstructorSpec] {
        &self.constructors
    }

    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.get(name)
    }

    pub fn callback(&self, name: &str) -> Option<&CallbackFn> {
        self.callbacks.get(name)
    }

    pub fn dispose_callback(&self) -> Option<&CallbackFn> {
        self.dispose.as_ref()
    }

    pub fn aware_callback(&self) -> Option<&AwareFn> {
        self.aware.as_ref()
    }

    pub fn factory_method(&self, name: &str) -> Option<&FactoryMethodSpec> {
        self.factory_methods.get(name)
    }

    /// 此类型是否是 FactoryBean
    pub fn is_factory_bean(&self) -> bool {
        self.factory_bean.is_some()
    }

    /// 将实例转换为 FactoryBean 视图
    pub fn as_factory_bean(&self, instance: &BeanHandle) -> Option<Arc<dyn FactoryBean>> {
        self.factory_bean.as_ref().and_then(|cast| cast(instance))
    }

    pub fn factory_object_type(&self) -> Option<&BeanTypeInfo> {
        self.factory_object_type.as_ref()
    }
}

impl fmt::Debug for BeanClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanClass")
            .field("type_name", &self.type_info.type_name)
            .field("constructors", &self.constructors.len())
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .field("factory_bean", &self.factory_bean.is_some())
            .finish()
    }
}

/// BeanClass 构建器
pub struct BeanClassBuilder {
    type_info: BeanTypeInfo,
    constructors: Vec<ConstructorSpec>,
    properties: HashMap<String, PropertySpec>,
    callbacks: HashMap<String, CallbackFn>,
    dispose: Option<CallbackFn>,
    aware: Option<AwareFn>,
    factory_methods: HashMap<String, FactoryMethodSpec>,
    factory_bean: Option<FactoryBeanCast>,
    factory_object_type: Option<BeanTypeInfo>,
}

impl BeanClassBuilder {
    fn new(type_info: BeanTypeInfo) -> Self {
        Self {
            type_info,
            constructors: Vec::new(),
            properties: HashMap::new(),
            callbacks: HashMap::new(),
            dispose: None,
            aware: None,
            factory_methods: HashMap::new(),
            factory_bean: None,
            factory_object_type: None,
        }
    }

    /// 注册一个构造函数候选，参数以解析后的句柄传入
    pub fn constructor<T, F>(mut self, params: Vec<ParameterSpec>, construct: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(Vec<BeanHandle>) -> ContainerResult<T> + Send + Sync + 'static,
    {
        self.constructors.push(ConstructorSpec {
            params,
            invoke: Arc::new(move |args| {
                let instance = construct(args)?;
                Ok(Arc::new(instance) as BeanHandle)
            }),
        });
        self
    }

    /// 注册属性 setter
    ///
    /// 值句柄会被向下转换为 `Arc<V>`；V 既可以是另一个 Bean 的类型，
    /// 也可以是字面量转换出的标量类型。
    pub fn property<T, V, F>(mut self, name: impl Into<String>, set: F) -> Self
    where
        T: Any + Send + Sync,
        V: Any + Send + Sync,
        F: Fn(&T, Arc<V>) -> ContainerResult<()> + Send + Sync + 'static,
    {
        let name = name.into();
        let param = ParameterSpec::of::<V>(name.clone());
        let spec = PropertySpec {
            param,
            set: Arc::new(move |bean: &BeanHandle, value: BeanHandle| {
                let target = downcast_ref_of::<T>(bean)?;
                let value = value.downcast::<V>().map_err(|_| ContainerError::TypeMismatch {
                    expected: std::any::type_name::<V>().to_string(),
                    found: "incompatible value".to_string(),
                })?;
                set(target, value)
            }),
        };
        self.properties.insert(name, spec);
        self
    }

    /// 注册命名回调（init-method / destroy-method 按名称引用）
    pub fn callback<T, F>(mut self, name: impl Into<String>, callback: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> ContainerResult<()> + Send + Sync + 'static,
    {
        self.callbacks.insert(
            name.into(),
            Arc::new(move |bean: &BeanHandle| callback(downcast_ref_of::<T>(bean)?)),
        );
        self
    }

    /// 注册标准销毁能力（等价于实现 DisposableBean）
    pub fn dispose<T, F>(mut self, dispose: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> ContainerResult<()> + Send + Sync + 'static,
    {
        self.dispose = Some(Arc::new(move |bean: &BeanHandle| {
            dispose(downcast_ref_of::<T>(bean)?)
        }));
        self
    }

    /// 注册上下文感知回调：实例化完成后第一个被调用的初始化步骤
    pub fn aware<T, F>(mut self, aware: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, &ContainerContext) -> ContainerResult<()> + Send + Sync + 'static,
    {
        self.aware = Some(Arc::new(move |bean: &BeanHandle, ctx: &ContainerContext| {
            aware(downcast_ref_of::<T>(bean)?, ctx)
        }));
        self
    }

    /// 注册工厂方法
    pub fn factory_method<T, F>(
        mut self,
        name: impl Into<String>,
        params: Vec<ParameterSpec>,
        invoke: F,
    ) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, Vec<BeanHandle>) -> ContainerResult<BeanHandle> + Send + Sync + 'static,
    {
        self.factory_methods.insert(
            name.into(),
            FactoryMethodSpec {
                params,
                invoke: Arc::new(move |bean: &BeanHandle, args| {
                    invoke(downcast_ref_of::<T>(bean)?, args)
                }),
            },
        );
        self
    }

    /// 声明此类型实现了 [`FactoryBean`]
    pub fn factory_bean<T>(mut self) -> Self
    where
        T: FactoryBean + Any + Send + Sync,
    {
        self.factory_bean = Some(Arc::new(|bean: &BeanHandle| {
            bean.clone()
                .downcast::<T>()
                .ok()
                .map(|fb| fb as Arc<dyn FactoryBean>)
        }));
        self
    }

    /// 为工厂 Bean 声明静态的产物类型提示
    pub fn factory_object_type<P: Any>(mut self) -> Self {
        self.factory_object_type = Some(BeanTypeInfo::of::<P>());
        self
    }

    pub fn build(self) -> Arc<BeanClass> {
        Arc::new(BeanClass {
            type_info: self.type_info,
            constructors: self.constructors,
            properties: self.properties,
            callbacks: self.callbacks,
            dispose: self.dispose,
            aware: self.aware,
            factory_methods: self.factory_methods,
            factory_bean: self.factory_bean,
            factory_object_type: self.factory_object_type,
        })
    }
}

fn downcast_ref_of<T: Any>(bean: &BeanHandle) -> ContainerResult<&T> {
    bean.downcast_ref::<T>()
        .ok_or_else(|| ContainerError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            found: "incompatible bean instance".to_string(),
        })
}

/// 构造参数或属性的取值方式
#[derive(Clone)]
pub enum ValueSpec {
    /// 字面量；字符串字面量会先做占位符展开再做类型转换
    Value(ConfigValue),

    /// 按名称引用另一个 Bean
    Ref(String),

    /// 嵌套定义（内部 Bean）
    Definition(Arc<BeanDefinition>),

    /// 按注入点类型自动装配
    Autowired,
}

impl fmt::Debug for ValueSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSpec::Value(v) => write!(f, "Value({:?})", v),
            ValueSpec::Ref(name) => write!(f, "Ref({})", name),
            ValueSpec::Definition(def) => write!(f, "Definition({:?})", def.class_name()),
            ValueSpec::Autowired => write!(f, "Autowired"),
        }
    }
}

/// Bean 的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BeanRole {
    /// 应用级组件
    #[default]
    Application,
    /// 框架基础设施组件
    Infrastructure,
}

/// 注解属性表
pub type AnnotationAttributes = HashMap<String, ConfigValue>;

/// 工厂方法引用：factory-bean 名称 + 方法名
#[derive(Debug, Clone)]
pub struct FactoryMethodRef {
    pub factory_bean: String,
    pub method: String,
}

/// Bean 定义 - 描述如何创建和管理 Bean
#[derive(Clone)]
pub struct BeanDefinition {
    /// 类型描述符；与 factory 二选一（工厂方法产物可以没有描述符）
    pub class: Option<Arc<BeanClass>>,

    /// 工厂 Bean + 工厂方法
    pub factory: Option<FactoryMethodRef>,

    /// 作用域；None 表示继承 parent 或取默认值（单例）
    pub scope: Option<Scope>,

    /// 是否延迟初始化（仅对单例有效）
    pub lazy_init: bool,

    /// 类型查找的首选标记
    pub primary: bool,

    /// 是否可作为自动装配候选
    pub autowire_candidate: bool,

    /// 按位置排列的构造参数
    pub constructor_args: Vec<ValueSpec>,

    /// 命名属性值（保持声明顺序）
    pub property_values: Vec<(String, ValueSpec)>,

    /// 初始化方法名（对应 BeanClass 中注册的回调）
    pub init_method: Option<String>,

    /// 销毁方法名
    pub destroy_method: Option<String>,

    /// 父定义名称
    pub parent: Option<String>,

    /// 必须先于此 Bean 完成初始化的名称列表
    pub depends_on: Vec<String>,

    /// Bean 角色
    pub role: BeanRole,

    /// 注解标记
    pub annotations: HashMap<String, AnnotationAttributes>,
}

impl BeanDefinition {
    /// 基于类型描述符创建定义
    pub fn for_class(class: Arc<BeanClass>) -> Self {
        Self {
            class: Some(class),
            factory: None,
            scope: None,
            lazy_init: false,
            primary: false,
            autowire_candidate: true,
            constructor_args: Vec::new(),
            property_values: Vec::new(),
            init_method: None,
            destroy_method: None,
            parent: None,
            depends_on: Vec::new(),
            role: BeanRole::default(),
            annotations: HashMap::new(),
        }
    }

    /// 基于工厂方法创建定义
    pub fn for_factory_method(factory_bean: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            class: None,
            factory: Some(FactoryMethodRef {
                factory_bean: factory_bean.into(),
                method: method.into(),
            }),
            scope: None,
            lazy_init: false,
            primary: false,
            autowire_candidate: true,
            constructor_args: Vec::new(),
            property_values: Vec::new(),
            init_method: None,
            destroy_method: None,
            parent: None,
            depends_on: Vec::new(),
            role: BeanRole::default(),
            annotations: HashMap::new(),
        }
    }

    /// 只有 parent 的子定义，其余属性在合并时继承
    pub fn child_of(parent: impl Into<String>) -> Self {
        Self {
            class: None,
            factory: None,
            scope: None,
            lazy_init: false,
            primary: false,
            autowire_candidate: true,
            constructor_args: Vec::new(),
            property_values: Vec::new(),
            init_method: None,
            destroy_method: None,
            parent: Some(parent.into()),
            depends_on: Vec::new(),
            role: BeanRole::default(),
            annotations: HashMap::new(),
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy_init = lazy;
        self
    }

    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    pub fn with_autowire_candidate(mut self, candidate: bool) -> Self {
        self.autowire_candidate = candidate;
        self
    }

    pub fn with_constructor_arg(mut self, value: ValueSpec) -> Self {
        self.constructor_args.push(value);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: ValueSpec) -> Self {
        let name = name.into();
        self.property_values.retain(|(existing, _)| *existing != name);
        self.property_values.push((name, value));
        self
    }

    pub fn with_init_method(mut self, name: impl Into<String>) -> Self {
        self.init_method = Some(name.into());
        self
    }

    pub fn with_destroy_method(mut self, name: impl Into<String>) -> Self {
        self.destroy_method = Some(name.into());
        self
    }

    pub fn with_depends_on(mut self, names: Vec<String>) -> Self {
        self.depends_on = names;
        self
    }

    pub fn with_role(mut self, role: BeanRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_annotation(
        mut self,
        name: impl Into<String>,
        attributes: AnnotationAttributes,
    ) -> Self {
        self.annotations.insert(name.into(), attributes);
        self
    }

    /// 生效的作用域
    pub fn effective_scope(&self) -> Scope {
        self.scope.clone().unwrap_or_default()
    }

    pub fn is_singleton(&self) -> bool {
        self.effective_scope() == Scope::Singleton
    }

    pub fn is_prototype(&self) -> bool {
        self.effective_scope() == Scope::Prototype
    }

    fn class_name(&self) -> Option<&str> {
        self.class.as_deref().map(BeanClass::type_name)
    }

    /// 以 parent 为底合并出完整定义
    ///
    /// 子定义显式设置的属性覆盖父定义；构造参数整体替换，属性值按名称
    /// 覆盖并保留父定义中未被覆盖的项。
    pub fn merged_with_parent(&self, parent: &BeanDefinition) -> BeanDefinition {
        let mut merged = parent.clone();

        if self.class.is_some() {
            merged.class = self.class.clone();
        }
        if self.factory.is_some() {
            merged.factory = self.factory.clone();
        }
        if self.scope.is_some() {
            merged.scope = self.scope.clone();
        }
        merged.lazy_init = self.lazy_init;
        merged.primary = self.primary;
        merged.autowire_candidate = self.autowire_candidate;
        if !self.constructor_args.is_empty() {
            merged.constructor_args = self.constructor_args.clone();
        }
        for (name, value) in &self.property_values {
            merged
                .property_values
                .retain(|(existing, _)| existing != name);
            merged.property_values.push((name.clone(), value.clone()));
        }
        if self.init_method.is_some() {
            merged.init_method = self.init_method.clone();
        }
        if self.destroy_method.is_some() {
            merged.destroy_method = self.destroy_method.clone();
        }
        if !self.depends_on.is_empty() {
            merged.depends_on = self.depends_on.clone();
        }
        merged.role = self.role;
        for (name, attrs) in &self.annotations {
            merged.annotations.insert(name.clone(), attrs.clone());
        }
        merged.parent = None;
        merged
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("class", &self.class_name())
            .field("factory", &self.factory)
            .field("scope", &self.scope)
            .field("lazy_init", &self.lazy_init)
            .field("primary", &self.primary)
            .field("depends_on", &self.depends_on)
            .field("parent", &self.parent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Holder;

    #[test]
    fn test_default_bean_name() {
        let class = BeanClass::builder::<Holder>().build();
        assert_eq!(class.default_bean_name(), "holder");
    }

    #[test]
    fn test_same_instance_compares_data_pointers() {
        let a: BeanHandle = Arc::new(Holder);
        let b = a.clone();
        let c: BeanHandle = Arc::new(Holder);
        assert!(same_instance(&a, &b));
        assert!(!same_instance(&a, &c));
    }

    #[test]
    fn test_parent_merge() {
        let class = BeanClass::builder::<Holder>().build();
        let parent = BeanDefinition::for_class(class)
            .with_property("name", ValueSpec::Value(ConfigValue::String("base".into())))
            .with_property("size", ValueSpec::Value(ConfigValue::Int(1)))
            .with_destroy_method("close");

        let child = BeanDefinition::child_of("parent")
            .with_scope(Scope::Prototype)
            .with_property("name", ValueSpec::Value(ConfigValue::String("child".into())));

        let merged = child.merged_with_parent(&parent);
        assert_eq!(merged.effective_scope(), Scope::Prototype);
        assert_eq!(merged.destroy_method.as_deref(), Some("close"));
        assert!(merged.class.is_some());
        assert!(merged.parent.is_none());

        let name_value = merged
            .property_values
            .iter()
            .find(|(n, _)| n == "name")
            .map(|(_, v)| v.clone())
            .unwrap();
        match name_value {
            ValueSpec::Value(ConfigValue::String(s)) => assert_eq!(s, "child"),
            other => panic!("unexpected value: {other:?}"),
        }
        assert!(merged.property_values.iter().any(|(n, _)| n == "size"));
    }
}
