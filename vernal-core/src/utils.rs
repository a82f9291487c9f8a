//! 容器内部工具
//!
//! Bean 名称的派生规则、按 ThreadId 键控的逐线程状态，以及依赖图的
//! 缺失/成环校验与拓扑排序。

/// Bean 名称派生规则
pub mod naming {
    /// 将 PascalCase 类型名转为 camelCase
    ///
    /// 默认的 Bean 命名策略，类似 Spring 把 `UserService` 命名为
    /// `userService` 的行为：只小写第一个字符，其余原样保留。
    ///
    /// # 示例
    ///
    /// ```
    /// use vernal_core::utils::naming::to_camel_case;
    ///
    /// assert_eq!(to_camel_case("UserService"), "userService");
    /// assert_eq!(to_camel_case("DatabaseConnectionPool"), "databaseConnectionPool");
    /// assert_eq!(to_camel_case("A"), "a");
    /// assert_eq!(to_camel_case(""), "");
    /// ```
    pub fn to_camel_case(s: &str) -> String {
        let mut chars = s.chars();
        match chars.next() {
            None => String::new(),
            Some(first) => {
                let mut result = String::with_capacity(s.len());
                result.extend(first.to_lowercase());
                result.push_str(chars.as_str());
                result
            }
        }
    }

    /// 去掉完整类型路径中的模块前缀
    ///
    /// `my_crate::service::UserService` 变为 `UserService`；泛型参数
    /// 原样保留。
    pub fn short_type_name(s: &str) -> &str {
        match s.rfind("::") {
            Some(idx) => &s[idx + 2..],
            None => s,
        }
    }
}

/// 按 [`std::thread::ThreadId`] 键控的逐线程状态
///
/// 容器按调用线程跟踪"正在创建中"的名称集合。状态属于注册表实例而
/// 不是 `thread_local!` 静态量，互相独立的容器在并行测试下不会彼此
/// 干扰。
pub mod thread {
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};
    use std::thread::ThreadId;

    /// 当前线程可见的字符串集合
    #[derive(Debug, Default)]
    pub struct ThreadLocalSet {
        slots: Mutex<HashMap<ThreadId, HashSet<String>>>,
    }

    impl ThreadLocalSet {
        pub fn new() -> Self {
            Self::default()
        }

        /// 当前线程的集合是否包含 `name`
        pub fn contains(&self, name: &str) -> bool {
            self.slots
                .lock()
                .get(&std::thread::current().id())
                .map(|set| set.contains(name))
                .unwrap_or(false)
        }

        /// 将 `name` 插入当前线程的集合
        ///
        /// 已存在时返回 `false`。
        pub fn insert(&self, name: &str) -> bool {
            self.slots
                .lock()
                .entry(std::thread::current().id())
                .or_default()
                .insert(name.to_string())
        }

        /// 从当前线程的集合移除 `name`
        ///
        /// 空的线程槽位随手删除，映射不会随触达过注册表的线程数量
        /// 增长。
        pub fn remove(&self, name: &str) {
            let mut slots = self.slots.lock();
            let id = std::thread::current().id();
            if let Some(set) = slots.get_mut(&id) {
                set.remove(name);
                if set.is_empty() {
                    slots.remove(&id);
                }
            }
        }

        /// 当前线程集合的快照，用于错误消息
        pub fn snapshot(&self) -> Vec<String> {
            self.slots
                .lock()
                .get(&std::thread::current().id())
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default()
        }
    }
}

/// 依赖图分析
pub mod dependency {
    use std::collections::{HashMap, HashSet};

    /// 依赖图校验结果
    #[derive(Debug)]
    pub enum DependencyValidationError {
        /// 检测到循环依赖
        CircularDependency {
            /// 构成环的依赖链
            cycle: Vec<String>,
        },
        /// 检测到缺失的依赖
        MissingDependency {
            /// 声明依赖的 Bean
            bean: String,
            /// 缺失的依赖名
            missing: String,
        },
    }

    impl std::fmt::Display for DependencyValidationError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::CircularDependency { cycle } => {
                    write!(f, "Circular dependency detected: {}", cycle.join(" -> "))
                }
                Self::MissingDependency { bean, missing } => {
                    write!(
                        f,
                        "Bean '{}' depends on '{}' which is not registered",
                        bean, missing
                    )
                }
            }
        }
    }

    /// 校验依赖图中的循环依赖与缺失依赖
    ///
    /// `is_known` 判断被引用的名称是否存在，调用方可以借此接受图外
    /// 满足的名称（例如外部注册的单例）。
    pub fn validate_dependency_graph(
        dependencies: &HashMap<String, Vec<String>>,
        is_known: impl Fn(&str) -> bool,
    ) -> Result<(), DependencyValidationError> {
        for (bean_name, deps) in dependencies {
            for dep in deps {
                if !dependencies.contains_key(dep) && !is_known(dep) {
                    return Err(DependencyValidationError::MissingDependency {
                        bean: bean_name.clone(),
                        missing: dep.clone(),
                    });
                }
            }
        }

        let mut visited = HashSet::new();
        let mut rec_stack = Vec::new();

        for bean_name in dependencies.keys() {
            if !visited.contains(bean_name) {
                if let Some(cycle) =
                    detect_cycle_dfs(bean_name, dependencies, &mut visited, &mut rec_stack)
                {
                    return Err(DependencyValidationError::CircularDependency { cycle });
                }
            }
        }

        Ok(())
    }

    /// 基于 DFS 的环检测
    ///
    /// 检测到环时返回 Some(cycle)，否则返回 None
    fn detect_cycle_dfs(
        node: &str,
        graph: &HashMap<String, Vec<String>>,
        visited: &mut HashSet<String>,
        rec_stack: &mut Vec<String>,
    ) -> Option<Vec<String>> {
        visited.insert(node.to_string());
        rec_stack.push(node.to_string());

        if let Some(deps) = graph.get(node) {
            for dep in deps {
                if !visited.contains(dep) {
                    if let Some(cycle) = detect_cycle_dfs(dep, graph, visited, rec_stack) {
                        return Some(cycle);
                    }
                } else if rec_stack.contains(dep) {
                    let start_idx = rec_stack.iter().position(|x| x == dep).unwrap();
                    let mut cycle = rec_stack[start_idx..].to_vec();
                    cycle.push(dep.to_string());
                    return Some(cycle);
                }
            }
        }

        rec_stack.pop();
        None
    }

    /// 对依赖图做拓扑排序
    ///
    /// 返回按依赖顺序排列的名称（被依赖方在前），图成环时返回错误
    /// 消息。
    pub fn topological_sort(
        dependencies: &HashMap<String, Vec<String>>,
    ) -> Result<Vec<String>, String> {
        let mut in_degree: HashMap<String, usize> = HashMap::new();
        let mut graph: HashMap<String, Vec<String>> = HashMap::new();

        for (bean, deps) in dependencies {
            in_degree.entry(bean.clone()).or_insert(0);
            for dep in deps {
                if !dependencies.contains_key(dep) {
                    // 图外满足的名称，不构成排序约束
                    continue;
                }
                *in_degree.get_mut(bean).unwrap() += 1;
                graph.entry(dep.clone()).or_default().push(bean.clone());
            }
        }

        let mut queue: Vec<String> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(bean, _)| bean.clone())
            .collect();
        queue.sort();

        let mut result = Vec::new();

        while let Some(node) = queue.pop() {
            result.push(node.clone());

            if let Some(dependents) = graph.get(&node) {
                for dependent in dependents {
                    if let Some(degree) = in_degree.get_mut(dependent) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push(dependent.clone());
                        }
                    }
                }
            }
        }

        if result.len() != in_degree.len() {
            return Err("Circular dependency detected during topological sort".to_string());
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    mod naming_tests {
        use super::super::naming::*;

        #[test]
        fn test_to_camel_case() {
            assert_eq!(to_camel_case("UserService"), "userService");
            assert_eq!(to_camel_case("DatabaseService"), "databaseService");
            assert_eq!(to_camel_case("A"), "a");
            assert_eq!(to_camel_case("AB"), "aB");
            assert_eq!(to_camel_case(""), "");
            assert_eq!(to_camel_case("lowerCase"), "lowerCase");
        }

        #[test]
        fn test_short_type_name() {
            assert_eq!(short_type_name("my_crate::service::UserService"), "UserService");
            assert_eq!(short_type_name("UserService"), "UserService");
        }
    }

    mod thread_tests {
        use super::super::thread::ThreadLocalSet;

        #[test]
        fn test_insert_and_remove() {
            let set = ThreadLocalSet::new();
            assert!(!set.contains("a"));
            assert!(set.insert("a"));
            assert!(!set.insert("a"));
            assert!(set.contains("a"));
            set.remove("a");
            assert!(!set.contains("a"));
        }

        #[test]
        fn test_threads_do_not_observe_each_other() {
            let set = std::sync::Arc::new(ThreadLocalSet::new());
            set.insert("a");

            let cloned = std::sync::Arc::clone(&set);
            let seen = std::thread::spawn(move || cloned.contains("a"))
                .join()
                .unwrap();
            assert!(!seen);
            assert!(set.contains("a"));
        }
    }

    mod dependency_tests {
        use super::super::dependency::*;
        use std::collections::HashMap;

        #[test]
        fn test_validate_missing_dependency() {
            let mut deps = HashMap::new();
            deps.insert("serviceA".to_string(), vec!["serviceB".to_string()]);
            // serviceB is not registered

            let result = validate_dependency_graph(&deps, |_| false);
            assert!(result.is_err());

            if let Err(DependencyValidationError::MissingDependency { bean, missing }) = result {
                assert_eq!(bean, "serviceA");
                assert_eq!(missing, "serviceB");
            } else {
                panic!("Expected MissingDependency error");
            }
        }

        #[test]
        fn test_externally_known_dependency_is_accepted() {
            let mut deps = HashMap::new();
            deps.insert("serviceA".to_string(), vec!["external".to_string()]);

            let result = validate_dependency_graph(&deps, |name| name == "external");
            assert!(result.is_ok());
        }

        #[test]
        fn test_validate_circular_dependency() {
            let mut deps = HashMap::new();
            deps.insert("serviceA".to_string(), vec!["serviceB".to_string()]);
            deps.insert("serviceB".to_string(), vec!["serviceC".to_string()]);
            deps.insert("serviceC".to_string(), vec!["serviceA".to_string()]);

            let result = validate_dependency_graph(&deps, |_| false);
            assert!(result.is_err());

            if let Err(DependencyValidationError::CircularDependency { cycle }) = result {
                assert!(cycle.len() >= 3);
                let cycle_str = cycle.join(" -> ");
                assert!(cycle_str.contains("serviceA"));
                assert!(cycle_str.contains("serviceB"));
                assert!(cycle_str.contains("serviceC"));
            } else {
                panic!("Expected CircularDependency error");
            }
        }

        #[test]
        fn test_validate_self_dependency() {
            let mut deps = HashMap::new();
            deps.insert("serviceA".to_string(), vec!["serviceA".to_string()]);

            let result = validate_dependency_graph(&deps, |_| false);
            assert!(result.is_err());
        }

        #[test]
        fn test_topological_sort() {
            let mut deps = HashMap::new();
            deps.insert("config".to_string(), vec![]);
            deps.insert("database".to_string(), vec!["config".to_string()]);
            deps.insert(
                "userService".to_string(),
                vec!["database".to_string(), "config".to_string()],
            );

            let sorted = topological_sort(&deps).unwrap();
            let pos = |name: &str| sorted.iter().position(|n| n == name).unwrap();
            assert!(pos("config") < pos("database"));
            assert!(pos("database") < pos("userService"));
        }
    }
}
