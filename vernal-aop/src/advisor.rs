//! Advisor - 切点与通知的配对

use std::sync::Arc;

use crate::advice::Advice;
use crate::pointcut::Pointcut;

/// Advisor trait
///
/// 不携带切点的 advisor 对所有方法生效。显式的 order 优先于注册顺序。
pub trait Advisor: Send + Sync {
    fn advice(&self) -> &Advice;

    fn pointcut(&self) -> Option<&Pointcut> {
        None
    }

    /// 显式排序值；None 表示跟随注册顺序
    fn order(&self) -> Option<i32> {
        None
    }

    fn name(&self) -> &str {
        "Advisor"
    }
}

/// 默认的切点 advisor 实现
pub struct DefaultPointcutAdvisor {
    name: String,
    pointcut: Pointcut,
    advice: Advice,
    order: Option<i32>,
}

impl DefaultPointcutAdvisor {
    /// 对所有方法生效的 advisor
    pub fn new(advice: Advice) -> Self {
        Self {
            name: "DefaultPointcutAdvisor".to_string(),
            pointcut: Pointcut::all(),
            advice,
            order: None,
        }
    }

    pub fn with_pointcut(mut self, pointcut: Pointcut) -> Self {
        self.pointcut = pointcut;
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Advisor for DefaultPointcutAdvisor {
    fn advice(&self) -> &Advice {
        &self.advice
    }

    fn pointcut(&self) -> Option<&Pointcut> {
        Some(&self.pointcut)
    }

    fn order(&self) -> Option<i32> {
        self.order
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 按显式 order 稳定排序；没有 order 的 advisor 保持注册顺序排在其后
pub(crate) fn sort_advisors(advisors: &mut [Arc<dyn Advisor>]) {
    advisors.sort_by_key(|advisor| advisor.order().unwrap_or(i32::MAX));
}
