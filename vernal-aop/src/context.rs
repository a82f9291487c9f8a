//! 当前代理的线程槽位
//!
//! 槽位按 `AopContext` 实例、按线程划分，不是进程级静态量，互相独立
//! 的代理配置不会彼此可见。发布基于守卫：所有退出路径（包括出错与
//! panic）都会恢复之前的值。

use parking_lot::Mutex;
use std::collections::HashMap;
use std::thread::ThreadId;

use vernal_core::BeanHandle;

/// 当前代理槽位
#[derive(Default)]
pub struct AopContext {
    slots: Mutex<HashMap<ThreadId, Vec<BeanHandle>>>,
}

impl AopContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前线程上正在执行的代理；只有 `expose_proxy` 打开时才有值
    pub fn current_proxy(&self) -> Option<BeanHandle> {
        self.slots
            .lock()
            .get(&std::thread::current().id())
            .and_then(|stack| stack.last().cloned())
    }

    /// 将代理压入当前线程的槽位，返回负责恢复的守卫
    pub(crate) fn expose<'a>(&'a self, proxy: BeanHandle) -> ExposedProxyGuard<'a> {
        let id = std::thread::current().id();
        self.slots.lock().entry(id).or_default().push(proxy);
        ExposedProxyGuard { context: self, id }
    }
}

pub(crate) struct ExposedProxyGuard<'a> {
    context: &'a AopContext,
    id: ThreadId,
}

impl Drop for ExposedProxyGuard<'_> {
    fn drop(&mut self) {
        let mut slots = self.context.slots.lock();
        if let Some(stack) = slots.get_mut(&self.id) {
            stack.pop();
            if stack.is_empty() {
                slots.remove(&self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_expose_and_restore() {
        let context = AopContext::new();
        assert!(context.current_proxy().is_none());

        let first: BeanHandle = Arc::new(1i64);
        let second: BeanHandle = Arc::new(2i64);
        {
            let _outer = context.expose(first);
            {
                let _inner = context.expose(second.clone());
                let current = context.current_proxy().unwrap();
                assert!(vernal_core::same_instance(&current, &second));
            }
            // 内层退出后恢复外层代理
            assert!(context.current_proxy().is_some());
        }
        assert!(context.current_proxy().is_none());
    }
}
