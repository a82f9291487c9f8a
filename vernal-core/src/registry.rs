//! Bean 定义注册表
//!
//! 按规范名存储 [`BeanDefinition`]，维护注册顺序快照，负责父子定义的
//! 合并与合并结果缓存。冻结之后所有写操作失败。

use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::definition::{BeanDefinition, BeanRole};
use crate::error::{ContainerError, ContainerResult};

/// 同名重复注册的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverridePolicy {
    /// 按已有定义的角色决定：应用级允许替换，基础设施级拒绝
    #[default]
    RoleBased,
    /// 一律拒绝
    Reject,
    /// 一律替换
    Replace,
    /// 保留最先注册的定义
    KeepFirst,
}

/// Bean 定义注册表
pub struct DefinitionRegistry {
    /// 规范名 -> 定义
    definitions: RwLock<HashMap<String, Arc<BeanDefinition>>>,

    /// 注册顺序快照（copy-on-write，枚举期间的并发修改不影响快照）
    names: RwLock<Arc<Vec<String>>>,

    /// 合并定义缓存，随任何结构性修改失效
    merged: Mutex<HashMap<String, Arc<BeanDefinition>>>,

    frozen: AtomicBool,

    policy: RwLock<OverridePolicy>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self {
            definitions: RwLock::new(HashMap::new()),
            names: RwLock::new(Arc::new(Vec::new())),
            merged: Mutex::new(HashMap::new()),
            frozen: AtomicBool::new(false),
            policy: RwLock::new(OverridePolicy::default()),
        }
    }

    /// 设置重复注册策略
    pub fn set_override_policy(&self, policy: OverridePolicy) {
        *self.policy.write() = policy;
    }

    /// 注册定义
    pub fn register(&self, name: &str, definition: BeanDefinition) -> ContainerResult<()> {
        if self.is_frozen() {
            return Err(ContainerError::ConfigurationFrozen);
        }

        let mut definitions = self.definitions.write();

        if let Some(existing) = definitions.get(name) {
            let policy = *self.policy.read();
            let replace = match policy {
                OverridePolicy::Reject => false,
                OverridePolicy::Replace => true,
                OverridePolicy::KeepFirst => {
                    tracing::debug!(
                        "Keeping first definition for '{}': duplicate registration ignored",
                        name
                    );
                    return Ok(());
                }
                OverridePolicy::RoleBased => existing.role == BeanRole::Application,
            };
            if !replace {
                return Err(ContainerError::NameConflict(format!(
                    "a bean definition named '{name}' is already registered \
                     and may not be overridden"
                )));
            }
            tracing::info!("Overriding bean definition for '{}'", name);
            definitions.insert(name.to_string(), Arc::new(definition));
            self.invalidate_merged();
            return Ok(());
        }

        definitions.insert(name.to_string(), Arc::new(definition));
        drop(definitions);

        {
            let mut names = self.names.write();
            let mut updated = Vec::with_capacity(names.len() + 1);
            updated.extend(names.iter().cloned());
            updated.push(name.to_string());
            *names = Arc::new(updated);
        }
        self.invalidate_merged();

        tracing::debug!("Bean definition registered: '{}'", name);
        Ok(())
    }

    /// 删除定义
    pub fn remove(&self, name: &str) -> ContainerResult<()> {
        if self.is_frozen() {
            return Err(ContainerError::ConfigurationFrozen);
        }

        self.definitions
            .write()
            .remove(name)
            .ok_or_else(|| ContainerError::NoSuchBean(name.to_string()))?;

        {
            let mut names = self.names.write();
            let updated: Vec<String> = names.iter().filter(|n| *n != name).cloned().collect();
            *names = Arc::new(updated);
        }
        self.invalidate_merged();

        tracing::debug!("Bean definition removed: '{}'", name);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<BeanDefinition>> {
        self.definitions.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.read().contains_key(name)
    }

    /// 注册顺序的名称快照；绝不包含别名
    pub fn names(&self) -> Arc<Vec<String>> {
        self.names.read().clone()
    }

    pub fn count(&self) -> usize {
        self.definitions.read().len()
    }

    /// 冻结配置，此后所有写操作失败
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
        tracing::debug!("Definition registry configuration frozen");
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// 取合并后的完整定义（父定义链已展开）
    ///
    /// 合并结果会被缓存，注册表被修改时缓存整体失效。
    pub fn merged(&self, name: &str) -> ContainerResult<Arc<BeanDefinition>> {
        if let Some(cached) = self.merged.lock().get(name) {
            return Ok(cached.clone());
        }

        let definition = self
            .get(name)
            .ok_or_else(|| ContainerError::NoSuchBean(name.to_string()))?;

        let mut visited = HashSet::new();
        visited.insert(name.to_string());
        let merged = Arc::new(self.merge_definition(name, &definition, &mut visited)?);

        self.merged
            .lock()
            .insert(name.to_string(), merged.clone());
        Ok(merged)
    }

    /// 展开任意（可能未注册的）定义的父链，内部 Bean 定义使用
    pub fn merge_standalone(&self, definition: &BeanDefinition) -> ContainerResult<BeanDefinition> {
        let mut visited = HashSet::new();
        self.merge_definition("(inner bean)", definition, &mut visited)
    }

    fn merge_definition(
        &self,
        name: &str,
        definition: &BeanDefinition,
        visited: &mut HashSet<String>,
    ) -> ContainerResult<BeanDefinition> {
        let Some(parent_name) = &definition.parent else {
            return Ok(definition.clone());
        };

        if !visited.insert(parent_name.clone()) {
            return Err(ContainerError::creation_message(
                name,
                format!("definition parent chain contains a cycle at '{parent_name}'"),
            ));
        }

        let parent = self.get(parent_name).ok_or_else(|| {
            ContainerError::creation_message(
                name,
                format!("parent definition '{parent_name}' is not registered"),
            )
        })?;
        let parent = self.merge_definition(parent_name, &parent, visited)?;
        Ok(definition.merged_with_parent(&parent))
    }

    fn invalidate_merged(&self) {
        self.merged.lock().clear();
    }
}

impl Default for DefinitionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{BeanClass, ConfigValue, ValueSpec};
    use crate::scope::Scope;

    struct Holder;

    fn holder_definition() -> BeanDefinition {
        BeanDefinition::for_class(BeanClass::builder::<Holder>().build())
    }

    #[test]
    fn test_registration_order_snapshot() {
        let registry = DefinitionRegistry::new();
        registry.register("a", holder_definition()).unwrap();
        registry.register("b", holder_definition()).unwrap();

        let snapshot = registry.names();
        registry.register("c", holder_definition()).unwrap();

        // 已有快照不受后续修改影响
        assert_eq!(*snapshot, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            *registry.names(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert_eq!(registry.count(), 3);
    }

    #[test]
    fn test_role_based_override_policy() {
        let registry = DefinitionRegistry::new();

        registry.register("app", holder_definition()).unwrap();
        // 应用级定义允许替换
        registry.register("app", holder_definition()).unwrap();

        registry
            .register(
                "infra",
                holder_definition().with_role(BeanRole::Infrastructure),
            )
            .unwrap();
        let err = registry.register("infra", holder_definition()).unwrap_err();
        assert!(matches!(err, ContainerError::NameConflict(_)));
    }

    #[test]
    fn test_keep_first_policy() {
        let registry = DefinitionRegistry::new();
        registry.set_override_policy(OverridePolicy::KeepFirst);

        registry
            .register("a", holder_definition().with_lazy(true))
            .unwrap();
        registry.register("a", holder_definition()).unwrap();

        assert!(registry.get("a").unwrap().lazy_init);
    }

    #[test]
    fn test_freeze_rejects_mutation() {
        let registry = DefinitionRegistry::new();
        registry.register("a", holder_definition()).unwrap();
        registry.freeze();

        assert!(matches!(
            registry.register("b", holder_definition()),
            Err(ContainerError::ConfigurationFrozen)
        ));
        assert!(matches!(
            registry.remove("a"),
            Err(ContainerError::ConfigurationFrozen)
        ));
        assert!(registry.contains("a"));
    }

    #[test]
    fn test_merged_definition_and_cache_invalidation() {
        let registry = DefinitionRegistry::new();
        registry
            .register(
                "parent",
                holder_definition()
                    .with_property("name", ValueSpec::Value(ConfigValue::String("base".into())))
                    .with_destroy_method("close"),
            )
            .unwrap();
        registry
            .register(
                "child",
                BeanDefinition::child_of("parent").with_scope(Scope::Prototype),
            )
            .unwrap();

        let merged = registry.merged("child").unwrap();
        assert_eq!(merged.effective_scope(), Scope::Prototype);
        assert_eq!(merged.destroy_method.as_deref(), Some("close"));

        // 重新注册父定义之后，合并缓存必须失效
        registry.register("parent", holder_definition()).unwrap();
        let merged = registry.merged("child").unwrap();
        assert_eq!(merged.destroy_method, None);
    }

    #[test]
    fn test_parent_cycle_is_detected() {
        let registry = DefinitionRegistry::new();
        registry
            .register("a", BeanDefinition::child_of("b"))
            .unwrap();
        registry
            .register("b", BeanDefinition::child_of("a"))
            .unwrap();

        let err = registry.merged("a").unwrap_err();
        assert!(matches!(err, ContainerError::BeanCreation { .. }));
    }
}
