//! 事件系统模块 - 数据层变更通知
//!
//! 功能包括：
//! - 批量提交完成事件（携带受影响的实体类型）
//! - 事件广播和订阅机制
//! - 事件统计

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::storage::entities::EntityKind;

/// SDK 事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SDKEvent {
    /// 批量提交完成
    ///
    /// 每次提交恰好发一次，无论提交是空的还是有批次失败。
    /// `changed_kinds` 按提交批次的遍历顺序排列，同类只出现一次。
    DatabaseSaved {
        changed_kinds: Vec<EntityKind>,
        timestamp: u64,
    },
    /// 本地数据整体重置（登出、清库）
    LocalDataReset { timestamp: u64 },
}

impl SDKEvent {
    /// 获取事件类型字符串
    pub fn event_type(&self) -> &'static str {
        match self {
            SDKEvent::DatabaseSaved { .. } => "database_saved",
            SDKEvent::LocalDataReset { .. } => "local_data_reset",
        }
    }

    /// 获取事件时间戳
    pub fn timestamp(&self) -> u64 {
        match self {
            SDKEvent::DatabaseSaved { timestamp, .. } => *timestamp,
            SDKEvent::LocalDataReset { timestamp } => *timestamp,
        }
    }

    /// 本次提交是否真的改动了数据
    pub fn did_change(&self) -> bool {
        match self {
            SDKEvent::DatabaseSaved { changed_kinds, .. } => !changed_kinds.is_empty(),
            SDKEvent::LocalDataReset { .. } => true,
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// 创建批量提交完成事件
pub fn database_saved(changed_kinds: Vec<EntityKind>) -> SDKEvent {
    SDKEvent::DatabaseSaved {
        changed_kinds,
        timestamp: now_secs(),
    }
}

/// 创建本地数据重置事件
pub fn local_data_reset() -> SDKEvent {
    SDKEvent::LocalDataReset {
        timestamp: now_secs(),
    }
}

/// 事件监听器类型
pub type EventListener = Box<dyn Fn(&SDKEvent) + Send + Sync>;

/// 事件统计信息
#[derive(Debug, Clone, Default)]
pub struct EventStats {
    /// 总事件数
    pub total_events: u64,
    /// 按类型分组的事件数
    pub events_by_type: HashMap<String, u64>,
    /// 监听器数量
    pub listener_count: usize,
    /// 最后事件时间
    pub last_event_time: Option<u64>,
}

/// 事件管理器
///
/// 提交路径是同步的，所以 `emit` 也是同步的；异步侧通过
/// `subscribe` 拿 broadcast 接收端消费。
pub struct EventManager {
    /// 广播发送器
    sender: broadcast::Sender<SDKEvent>,
    /// 事件监听器映射，键为事件类型，"*" 表示全部
    listeners: Arc<RwLock<HashMap<String, Vec<EventListener>>>>,
    /// 事件统计
    stats: Arc<RwLock<EventStats>>,
}

impl EventManager {
    /// 创建新的事件管理器
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);

        Self {
            sender,
            listeners: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(RwLock::new(EventStats::default())),
        }
    }

    /// 发布事件
    pub fn emit(&self, event: SDKEvent) {
        debug!("发布事件: {}", event.event_type());

        {
            let mut stats = self.stats.write();
            stats.total_events += 1;
            *stats
                .events_by_type
                .entry(event.event_type().to_string())
                .or_insert(0) += 1;
            stats.last_event_time = Some(event.timestamp());
        }

        // 无订阅者时 send 会失败，属正常场景（无 UI 消费端），仅打 debug
        if let Err(e) = self.sender.send(event.clone()) {
            debug!("广播事件无接收端: {}", e);
        }

        let listeners = self.listeners.read();
        if let Some(event_listeners) = listeners.get(event.event_type()) {
            for listener in event_listeners {
                listener(&event);
            }
        }
        if let Some(general_listeners) = listeners.get("*") {
            for listener in general_listeners {
                listener(&event);
            }
        }
    }

    /// 订阅事件
    pub fn subscribe(&self) -> broadcast::Receiver<SDKEvent> {
        self.sender.subscribe()
    }

    /// 添加事件监听器
    pub fn add_listener<F>(&self, event_type: &str, listener: F)
    where
        F: Fn(&SDKEvent) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.write();
        listeners
            .entry(event_type.to_string())
            .or_insert_with(Vec::new)
            .push(Box::new(listener));

        let mut stats = self.stats.write();
        stats.listener_count = listeners.values().map(|v| v.len()).sum();

        info!("已添加事件监听器: {}", event_type);
    }

    /// 移除所有监听器
    pub fn clear_listeners(&self) {
        self.listeners.write().clear();
        self.stats.write().listener_count = 0;
    }

    /// 获取事件统计
    pub fn get_stats(&self) -> EventStats {
        self.stats.read().clone()
    }

    /// 获取活跃订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_event_manager_basic_functionality() {
        let manager = EventManager::new(100);

        let mut receiver = manager.subscribe();

        let event = database_saved(vec![EntityKind::Tag, EntityKind::Transaction]);
        manager.emit(event);

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.event_type(), "database_saved");
        assert!(received.did_change());

        let stats = manager.get_stats();
        assert_eq!(stats.total_events, 1);
        assert_eq!(stats.events_by_type.get("database_saved"), Some(&1));
    }

    #[test]
    fn test_empty_commit_did_not_change() {
        let event = database_saved(vec![]);
        assert!(!event.did_change());
        assert!(event.timestamp() > 0);
    }

    #[test]
    fn test_event_listeners() {
        let manager = EventManager::new(100);
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        manager.add_listener("database_saved", move |_event| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        for _ in 0..3 {
            manager.emit(database_saved(vec![EntityKind::Bank]));
        }

        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let manager = EventManager::new(100);

        let mut receiver1 = manager.subscribe();
        let mut receiver2 = manager.subscribe();
        assert_eq!(manager.subscriber_count(), 2);

        manager.emit(local_data_reset());

        assert_eq!(receiver1.recv().await.unwrap().event_type(), "local_data_reset");
        assert_eq!(receiver2.recv().await.unwrap().event_type(), "local_data_reset");
    }

    #[test]
    fn test_wildcard_listener() {
        let manager = EventManager::new(100);
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        manager.add_listener("*", move |_event| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        manager.emit(database_saved(vec![]));
        manager.emit(local_data_reset());

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
