//! Single Flight - 并发相同请求合并
//!
//! 同一 key 的并发调用共享一次进行中的操作，而不是各自调用外部服务

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// 进行中操作表
///
/// key -> 共享的 OnceCell；操作完成后条目被移除，之后的调用重新执行
pub struct SingleFlight<T> {
    calls: DashMap<String, Arc<OnceCell<T>>>,
}

impl<T: Clone> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            calls: DashMap::new(),
        }
    }

    /// 执行或加入 key 对应的操作
    ///
    /// 返回 (结果, 是否由本调用执行)。执行者被取消时，
    /// 其余等待者中的一个会接手执行。
    pub async fn run<F, Fut>(&self, key: &str, operation: F) -> (T, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let cell = self
            .calls
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();
        let guard = FlightGuard {
            calls: &self.calls,
            key,
            cell,
        };

        let mut leader = false;
        let value = guard
            .cell
            .get_or_init(|| {
                leader = true;
                operation()
            })
            .await
            .clone();

        (value, leader)
    }

    /// 当前进行中的 key 数量
    pub fn in_flight(&self) -> usize {
        self.calls.len()
    }
}

/// 调用结束或被取消时清理表项
///
/// 结果已产生，或表和本调用之外没有其它持有者时才移除；
/// 仍有等待者时保留，由接手的等待者完成
struct FlightGuard<'a, T> {
    calls: &'a DashMap<String, Arc<OnceCell<T>>>,
    key: &'a str,
    cell: Arc<OnceCell<T>>,
}

impl<T> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        self.calls.remove_if(self.key, |_, current| {
            Arc::ptr_eq(current, &self.cell)
                && (current.initialized() || Arc::strong_count(current) <= 2)
        });
    }
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}
