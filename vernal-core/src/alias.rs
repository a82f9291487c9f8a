//! 别名注册表
//!
//! 维护别名到规范名的多对一映射。别名可以链式指向其他别名，但链必须
//! 无环；同一个字符串不允许同时作为别名指向不同的规范名（除非允许
//! 覆盖）。

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use crate::error::{ContainerError, ContainerResult};

/// 别名注册表
///
/// 内部是一个 alias -> canonical 的映射。所有写操作在同一把锁上串行，
/// 读操作只持有读锁。
pub struct AliasRegistry {
    /// alias -> canonical name
    aliases: RwLock<HashMap<String, String>>,

    /// 是否允许用新的规范名覆盖已有别名
    allow_overriding: RwLock<bool>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self {
            aliases: RwLock::new(HashMap::new()),
            allow_overriding: RwLock::new(true),
        }
    }

    /// 设置是否允许别名覆盖
    pub fn set_allow_overriding(&self, allow: bool) {
        *self.allow_overriding.write() = allow;
    }

    /// 注册别名
    ///
    /// 同名自我别名直接按 CircularAlias 拒绝；别名已指向其他规范名且
    /// 不允许覆盖时返回 NameConflict；沿着既有别名链从 `name` 出发能够
    /// 走到 `alias` 时说明注册会成环，返回 CircularAlias。
    pub fn register_alias(&self, name: &str, alias: &str) -> ContainerResult<()> {
        if name == alias {
            return Err(ContainerError::CircularAlias(format!(
                "cannot alias '{alias}' to itself"
            )));
        }

        let mut aliases = self.aliases.write();

        if let Some(existing) = aliases.get(alias) {
            if existing == name {
                // 重复注册同一条映射，不需要做任何事
                return Ok(());
            }
            if !*self.allow_overriding.read() {
                return Err(ContainerError::NameConflict(format!(
                    "cannot define alias '{alias}' for name '{name}': \
                     it is already registered for name '{existing}'"
                )));
            }
            tracing::debug!(
                "Overriding alias '{}': previous target '{}', new target '{}'",
                alias,
                existing,
                name
            );
        }

        // 环检测：从 name 沿链前进，如果能到达 alias 则注册会形成环
        let mut visited = HashSet::new();
        let mut current = name;
        while let Some(next) = aliases.get(current) {
            if next == alias {
                return Err(ContainerError::CircularAlias(format!(
                    "'{alias}' -> '{name}' would form a cycle"
                )));
            }
            if !visited.insert(next.clone()) {
                break;
            }
            current = next;
        }

        aliases.insert(alias.to_string(), name.to_string());
        tracing::trace!("Alias '{}' registered for name '{}'", alias, name);
        Ok(())
    }

    /// 删除别名
    pub fn remove_alias(&self, alias: &str) -> ContainerResult<()> {
        self.aliases
            .write()
            .remove(alias)
            .map(|_| ())
            .ok_or_else(|| ContainerError::UnknownAlias(alias.to_string()))
    }

    /// 判断名称是否是已注册的别名
    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.read().contains_key(name)
    }

    /// 解析别名链，返回规范名
    ///
    /// 输入不是别名时原样返回。链长受注册表大小约束，注册阶段的环
    /// 检测保证这里的遍历一定会停机。
    pub fn canonical_name(&self, name: &str) -> String {
        let aliases = self.aliases.read();
        let mut canonical = name;
        let mut visited = HashSet::new();
        while let Some(next) = aliases.get(canonical) {
            if !visited.insert(canonical.to_string()) {
                break;
            }
            canonical = next;
        }
        canonical.to_string()
    }

    /// 返回直接或间接指向 `name` 的所有别名
    pub fn aliases_of(&self, name: &str) -> Vec<String> {
        let aliases = self.aliases.read();
        let mut result = Vec::new();
        Self::collect_aliases(&aliases, name, &mut result);
        result
    }

    fn collect_aliases(aliases: &HashMap<String, String>, name: &str, result: &mut Vec<String>) {
        for (alias, target) in aliases {
            if target == name {
                result.push(alias.clone());
                Self::collect_aliases(aliases, alias, result);
            }
        }
    }
}

impl Default for AliasRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let registry = AliasRegistry::new();
        registry.register_alias("userService", "users").unwrap();

        assert!(registry.is_alias("users"));
        assert!(!registry.is_alias("userService"));
        assert_eq!(registry.canonical_name("users"), "userService");
        assert_eq!(registry.canonical_name("userService"), "userService");
        assert_eq!(registry.canonical_name("unrelated"), "unrelated");
    }

    #[test]
    fn test_alias_chain_resolves_to_fixed_point() {
        let registry = AliasRegistry::new();
        registry.register_alias("userService", "users").unwrap();
        registry.register_alias("users", "u").unwrap();

        assert_eq!(registry.canonical_name("u"), "userService");

        let mut aliases = registry.aliases_of("userService");
        aliases.sort();
        assert_eq!(aliases, vec!["u".to_string(), "users".to_string()]);
    }

    #[test]
    fn test_self_alias_is_rejected() {
        let registry = AliasRegistry::new();
        let err = registry.register_alias("a", "a").unwrap_err();
        assert!(matches!(err, ContainerError::CircularAlias(_)));
    }

    #[test]
    fn test_circular_chain_is_rejected() {
        let registry = AliasRegistry::new();
        registry.register_alias("b", "a").unwrap();
        // a -> b 已存在，注册 b 的别名 a... 即 a -> b -> a
        let err = registry.register_alias("a", "b").unwrap_err();
        assert!(matches!(err, ContainerError::CircularAlias(_)));
    }

    #[test]
    fn test_conflict_without_overriding() {
        let registry = AliasRegistry::new();
        registry.set_allow_overriding(false);
        registry.register_alias("first", "shared").unwrap();
        // 重复注册同一条映射是幂等的
        registry.register_alias("first", "shared").unwrap();

        let err = registry.register_alias("second", "shared").unwrap_err();
        assert!(matches!(err, ContainerError::NameConflict(_)));
    }

    #[test]
    fn test_remove_alias() {
        let registry = AliasRegistry::new();
        registry.register_alias("a", "b").unwrap();
        registry.remove_alias("b").unwrap();
        assert!(!registry.is_alias("b"));

        let err = registry.remove_alias("b").unwrap_err();
        assert!(matches!(err, ContainerError::UnknownAlias(_)));
    }
}
