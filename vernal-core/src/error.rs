//! 容器统一错误类型
//!
//! 每一种可恢复的容器故障都有独立的错误变体；创建阶段的失败会携带
//! 因果链以及被抑制的次要原因（例如循环引用解析过程中先失败后成功
//! 的尝试）。销毁阶段的错误不会通过此类型向外传播，只记录日志。

use thiserror::Error;

/// 容器操作的统一 Result 别名
pub type ContainerResult<T> = Result<T, ContainerError>;

/// 容器错误
#[derive(Debug, Error)]
pub enum ContainerError {
    /// 请求的名称或类型没有注册
    #[error("no bean named '{0}' is defined")]
    NoSuchBean(String),

    /// 类型查询命中多个候选且无法通过 primary 决断
    #[error("no unique bean of type '{type_name}': {} candidates found ({})", .candidates.len(), .candidates.join(", "))]
    NoUniqueBean {
        type_name: String,
        candidates: Vec<String>,
    },

    /// 实例化、属性填充或初始化过程中的任何失败
    #[error("error creating bean '{bean}': {message}{}", suppressed_summary(.suppressed))]
    BeanCreation {
        bean: String,
        message: String,
        #[source]
        source: Option<Box<ContainerError>>,
        /// 被抑制的次要原因摘要
        suppressed: Vec<String>,
    },

    /// 单例循环引用无法通过提前暴露解决
    #[error("circular reference while creating singleton bean: {0}")]
    CircularCreation(String),

    /// 原型 Bean 在自身构造过程中被再次请求
    #[error("prototype bean '{0}' is currently in creation: unresolvable circular reference")]
    CircularPrototype(String),

    /// 提前暴露的对象与最终对象身份不一致，而早期引用已被其他 Bean 持有
    #[error(
        "bean '{0}' has been injected into other beans in its raw form, \
         but was subsequently wrapped: early reference is inconsistent with the final instance"
    )]
    InconsistentEarlyReference(String),

    /// 构造函数选择无法决断
    #[error("ambiguous constructor for bean '{bean}': {candidates} candidates accept {arity} argument(s)")]
    AmbiguousConstructor {
        bean: String,
        arity: usize,
        candidates: usize,
    },

    /// 自动装配无法选出唯一候选
    #[error("unsatisfied dependency '{injection_point}' of bean '{bean}': {reason}")]
    UnresolvableDependency {
        bean: String,
        injection_point: String,
        reason: String,
    },

    /// 冻结之后尝试修改配置
    #[error("configuration is frozen: no further definition or alias changes are accepted")]
    ConfigurationFrozen,

    /// 容器已经开始关闭
    #[error("container has been closed: no further bean requests are accepted")]
    ContainerClosed,

    /// 别名与规范名冲突，或拒绝策略下的重复注册
    #[error("name conflict: {0}")]
    NameConflict(String),

    /// 别名链成环
    #[error("circular alias chain: {0}")]
    CircularAlias(String),

    /// 删除不存在的别名
    #[error("no alias '{0}' is registered")]
    UnknownAlias(String),

    /// 占位符无法解析
    #[error("could not resolve placeholder '{0}'")]
    UnresolvedPlaceholder(String),

    /// 占位符引用成环
    #[error("circular placeholder reference '{0}' in property definitions")]
    CircularPlaceholder(String),

    /// 类型不匹配
    #[error("type mismatch: expected '{expected}', found '{found}'")]
    TypeMismatch { expected: String, found: String },

    /// 引用了未注册的自定义作用域
    #[error("no scope registered for scope name '{0}'")]
    UnknownScope(String),

    /// 其他错误
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ContainerError {
    /// 将下游错误包装为 Bean 创建失败
    ///
    /// 循环依赖与容器关闭错误保持原样，不做包装，调用方才能按种类
    /// 做出区分处理。
    pub fn creation(bean: &str, err: ContainerError) -> ContainerError {
        match err {
            e @ (ContainerError::CircularCreation(_)
            | ContainerError::CircularPrototype(_)
            | ContainerError::InconsistentEarlyReference(_)
            | ContainerError::ContainerClosed
            | ContainerError::BeanCreation { .. }) => e,
            e => ContainerError::BeanCreation {
                bean: bean.to_string(),
                message: e.to_string(),
                source: Some(Box::new(e)),
                suppressed: Vec::new(),
            },
        }
    }

    /// 创建一条不带底层原因的 Bean 创建错误
    pub fn creation_message(bean: &str, message: impl Into<String>) -> ContainerError {
        ContainerError::BeanCreation {
            bean: bean.to_string(),
            message: message.into(),
            source: None,
            suppressed: Vec::new(),
        }
    }
}

fn suppressed_summary(suppressed: &[String]) -> String {
    if suppressed.is_empty() {
        String::new()
    } else {
        format!(" ({} suppressed cause(s))", suppressed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_preserves_circular_errors() {
        let err = ContainerError::creation("a", ContainerError::CircularCreation("a".into()));
        assert!(matches!(err, ContainerError::CircularCreation(_)));

        let err = ContainerError::creation("a", ContainerError::NoSuchBean("b".into()));
        match err {
            ContainerError::BeanCreation { bean, source, .. } => {
                assert_eq!(bean, "a");
                assert!(source.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn suppressed_causes_show_up_in_message() {
        let err = ContainerError::BeanCreation {
            bean: "a".into(),
            message: "boom".into(),
            source: None,
            suppressed: vec!["first attempt failed".into()],
        };
        assert!(err.to_string().contains("1 suppressed cause(s)"));
    }
}
