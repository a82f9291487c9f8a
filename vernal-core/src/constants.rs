//! 框架内部常量

/// 工厂 Bean 解引用前缀
///
/// `getBean("&name")` 返回工厂 Bean 本身而不是它生产的对象
pub const FACTORY_BEAN_PREFIX: &str = "&";

/// 占位符前缀
pub const PLACEHOLDER_PREFIX: &str = "${";

/// 占位符后缀
pub const PLACEHOLDER_SUFFIX: &str = "}";

/// 占位符默认值分隔符
pub const VALUE_SEPARATOR: &str = ":";

/// 内部 Bean 的名称前缀
pub const INNER_BEAN_PREFIX: &str = "(inner bean)#";

/// BeanPostProcessor 的默认执行顺序
pub const DEFAULT_PROCESSOR_ORDER: i32 = 1000;
