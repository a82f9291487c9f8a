//! 切点（Pointcut）表达式系统
//!
//! 切点 = 类过滤器 + 方法匹配器。方法匹配器分静态与动态两种：静态
//! 匹配只依赖方法与目标类型，结果可以缓存；动态匹配还要看每次调用的
//! 实际参数，按调用求值。

use regex::Regex;
use std::sync::Arc;

use vernal_core::BeanHandle;

/// 简单的模式匹配（支持 * 通配符）
///
/// 支持的模式：
/// - `*` - 匹配任意字符串
/// - `User*` - 以 User 开头
/// - `*Service` - 以 Service 结尾
/// - `*Service*` - 包含 Service
fn pattern_matches(pattern: &str, target: &str) -> bool {
    if pattern == "*" {
        return true;
    }

    if !pattern.contains('*') {
        return pattern == target;
    }

    let regex_pattern = regex::escape(pattern).replace("\\*", ".*");
    let regex_pattern = format!("^{}$", regex_pattern);

    if let Ok(regex) = Regex::new(&regex_pattern) {
        regex.is_match(target)
    } else {
        false
    }
}

/// 类过滤器
#[derive(Clone)]
pub enum ClassFilter {
    /// 匹配所有类型
    All,

    /// 通配符模式，例如 `*Service`
    Pattern(String),

    /// 正则匹配
    Regex(Arc<Regex>),

    /// 自定义匹配函数
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl ClassFilter {
    pub fn matches(&self, class_name: &str) -> bool {
        match self {
            ClassFilter::All => true,
            ClassFilter::Pattern(pattern) => pattern_matches(pattern, class_name),
            ClassFilter::Regex(regex) => regex.is_match(class_name),
            ClassFilter::Custom(func) => func(class_name),
        }
    }
}

impl std::fmt::Debug for ClassFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassFilter::All => write!(f, "All"),
            ClassFilter::Pattern(p) => write!(f, "Pattern({})", p),
            ClassFilter::Regex(_) => write!(f, "Regex(...)"),
            ClassFilter::Custom(_) => write!(f, "Custom(...)"),
        }
    }
}

/// 方法名的静态匹配部分
#[derive(Clone)]
pub enum MethodPattern {
    All,
    Pattern(String),
    Regex(Arc<Regex>),
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl MethodPattern {
    fn matches(&self, method_name: &str) -> bool {
        match self {
            MethodPattern::All => true,
            MethodPattern::Pattern(pattern) => pattern_matches(pattern, method_name),
            MethodPattern::Regex(regex) => regex.is_match(method_name),
            MethodPattern::Custom(func) => func(method_name),
        }
    }
}

/// 运行时参数匹配函数
pub type RuntimeMatcher = Arc<dyn Fn(&str, &[BeanHandle]) -> bool + Send + Sync>;

/// 方法匹配器
#[derive(Clone)]
pub struct MethodMatcher {
    pattern: MethodPattern,
    runtime: Option<RuntimeMatcher>,
}

impl MethodMatcher {
    pub fn all() -> Self {
        Self {
            pattern: MethodPattern::All,
            runtime: None,
        }
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self {
            pattern: MethodPattern::Pattern(pattern.into()),
            runtime: None,
        }
    }

    pub fn regex(regex: Regex) -> Self {
        Self {
            pattern: MethodPattern::Regex(Arc::new(regex)),
            runtime: None,
        }
    }

    pub fn custom(func: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            pattern: MethodPattern::Custom(Arc::new(func)),
            runtime: None,
        }
    }

    /// 附加运行时参数判定，匹配器变为动态
    pub fn with_runtime(
        mut self,
        runtime: impl Fn(&str, &[BeanHandle]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.runtime = Some(Arc::new(runtime));
        self
    }

    /// 静态部分：只看方法名与目标类型
    pub fn matches(&self, method_name: &str) -> bool {
        self.pattern.matches(method_name)
    }

    /// 是否需要按调用求值
    pub fn is_runtime(&self) -> bool {
        self.runtime.is_some()
    }

    /// 动态部分：附加实际参数
    pub fn matches_args(&self, method_name: &str, args: &[BeanHandle]) -> bool {
        match &self.runtime {
            Some(runtime) => runtime(method_name, args),
            None => true,
        }
    }
}

impl std::fmt::Debug for MethodMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodMatcher")
            .field("runtime", &self.runtime.is_some())
            .finish()
    }
}

/// 切点：类过滤器 + 方法匹配器
#[derive(Clone, Debug)]
pub struct Pointcut {
    pub class_filter: ClassFilter,
    pub method_matcher: MethodMatcher,
}

impl Pointcut {
    /// 匹配一切的切点
    pub fn all() -> Self {
        Self {
            class_filter: ClassFilter::All,
            method_matcher: MethodMatcher::all(),
        }
    }

    pub fn new(class_filter: ClassFilter, method_matcher: MethodMatcher) -> Self {
        Self {
            class_filter,
            method_matcher,
        }
    }

    /// 解析 execution 风格的表达式
    ///
    /// 例如：`execution("* UserService.get_user(..)")`。
    /// 简化版本，只支持类型和方法名匹配。
    pub fn execution(expression: &str) -> Self {
        let parts: Vec<&str> = expression.split_whitespace().collect();

        if parts.len() < 2 {
            return Pointcut::all();
        }

        let method_part = parts[1];
        if let Some((type_pattern, method_pattern)) = method_part.split_once('.') {
            // 移除参数部分 "(..)"
            let method_pattern = method_pattern.trim_end_matches("(..)");

            Pointcut::new(
                ClassFilter::Pattern(type_pattern.to_string()),
                MethodMatcher::pattern(method_pattern),
            )
        } else {
            Pointcut::new(
                ClassFilter::All,
                MethodMatcher::pattern(method_part.trim_end_matches("(..)")),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_matching() {
        assert!(pattern_matches("*", "anything"));
        assert!(pattern_matches("User*", "UserService"));
        assert!(pattern_matches("*Service", "UserService"));
        assert!(pattern_matches("*Service*", "MyServiceImpl"));
        assert!(!pattern_matches("User*", "AccountService"));
        assert!(pattern_matches("exact", "exact"));
        assert!(!pattern_matches("exact", "exactly"));
    }

    #[test]
    fn test_class_filter() {
        assert!(ClassFilter::All.matches("Whatever"));
        assert!(ClassFilter::Pattern("*Service".into()).matches("UserService"));
        assert!(!ClassFilter::Pattern("*Service".into()).matches("UserController"));
    }

    #[test]
    fn test_execution_expression() {
        let pointcut = Pointcut::execution("* UserService.get_user(..)");
        assert!(pointcut.class_filter.matches("UserService"));
        assert!(pointcut.method_matcher.matches("get_user"));
        assert!(!pointcut.method_matcher.matches("save_user"));

        let pointcut = Pointcut::execution("* *Service.find_*(..)");
        assert!(pointcut.class_filter.matches("OrderService"));
        assert!(pointcut.method_matcher.matches("find_by_id"));
        assert!(!pointcut.method_matcher.matches("save"));
    }

    #[test]
    fn test_dynamic_matcher() {
        let matcher =
            MethodMatcher::pattern("transfer").with_runtime(|_, args| args.len() == 2);
        assert!(matcher.is_runtime());
        assert!(matcher.matches("transfer"));
        let args: Vec<BeanHandle> = vec![Arc::new(1i64), Arc::new(2i64)];
        assert!(matcher.matches_args("transfer", &args));
        assert!(!matcher.matches_args("transfer", &[]));
    }
}
