//! 批量提交引擎
//!
//! 把暂存区按「操作类型 × 提交顺序表」展开成批次，每批一个
//! 事务落库。单批失败记录在报告里并继续后续批次；含删除批次
//! 的周期结束时重建数据库会话；每个周期恰好发一次
//! `DatabaseSaved` 事件。

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::error::{MoneySyncSDKError, Result};
use crate::events::{database_saved, EventManager};
use crate::storage::entities::{Entity, EntityKind, SharedEntity, TxType, COMMIT_ORDER};
use crate::storage::{shared, DataState, EntityStore};
use crate::sync::pending::PendingChangeSet;

/// 批次的处理顺序：先插入、再更新、最后删除
const TX_ORDER: [TxType; 3] = [TxType::Insert, TxType::Update, TxType::Delete];

/// 单个批次的失败记录
#[derive(Debug)]
pub struct BatchFailure {
    pub kind: EntityKind,
    pub tx_type: TxType,
    pub error: MoneySyncSDKError,
}

/// 一次提交周期的结果
#[derive(Debug, Default)]
pub struct CommitReport {
    /// 受影响的实体类型，按批次遍历顺序，同类只出现一次
    pub changed: Vec<EntityKind>,
    /// 失败批次（失败批次的类型仍计入 `changed`）
    pub failures: Vec<BatchFailure>,
}

impl CommitReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 批量提交引擎
pub struct BatchCommitEngine {
    store: Arc<dyn EntityStore>,
    pending: Arc<PendingChangeSet>,
    events: Arc<EventManager>,
    /// 同一时刻只允许一个提交周期
    commit_lock: Mutex<()>,
}

impl BatchCommitEngine {
    pub fn new(store: Arc<dyn EntityStore>, events: Arc<EventManager>) -> Self {
        Self {
            store,
            pending: Arc::new(PendingChangeSet::new()),
            events,
            commit_lock: Mutex::new(()),
        }
    }

    /// 暂存区
    pub fn pending(&self) -> &Arc<PendingChangeSet> {
        &self.pending
    }

    /// 底层存储
    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// 事件总线
    pub fn events(&self) -> &Arc<EventManager> {
        &self.events
    }

    /// 暂存一条本地新建记录，external_id 为空时自动补齐
    pub fn insert(&self, entity: Entity, guid_hint: Option<&str>) -> SharedEntity {
        let handle = shared(entity);
        handle.write().set_data_state(DataState::Pending);
        self.pending
            .stage(TxType::Insert, handle.clone(), guid_hint);
        handle
    }

    /// 暂存一条本地修改
    pub fn update(&self, entity: &SharedEntity) {
        entity.write().set_data_state(DataState::Pending);
        self.pending.stage(TxType::Update, entity.clone(), None);
    }

    /// 软删除：置删除标记并暂存为更新，行保留
    pub fn soft_delete(&self, entity: &SharedEntity) {
        {
            let mut guard = entity.write();
            guard.set_deleted(true);
            guard.set_data_state(DataState::Pending);
        }
        self.pending.stage(TxType::Update, entity.clone(), None);
    }

    /// 物理删除：先置删除标记，再暂存删除批次
    pub fn delete(&self, entity: &SharedEntity) {
        {
            let mut guard = entity.write();
            guard.set_deleted(true);
            guard.set_data_state(DataState::Pending);
        }
        self.pending.stage(TxType::Delete, entity.clone(), None);
    }

    /// 执行一个提交周期
    ///
    /// 存储不可用时整体失败：暂存区原样保留，不发事件。
    pub fn commit(&self) -> Result<CommitReport> {
        let _guard = self.commit_lock.lock();

        self.store.ensure_ready()?;

        let snapshot = self.pending.drain();
        let mut report = CommitReport::default();

        for tx_type in TX_ORDER {
            for kind in COMMIT_ORDER {
                let batch = snapshot.batch(tx_type, kind);
                if batch.is_empty() {
                    continue;
                }

                if !report.changed.contains(&kind) {
                    report.changed.push(kind);
                }

                for entity in batch {
                    entity.write().on_before_save(tx_type == TxType::Delete);
                }

                debug!(
                    "提交批次: {} {} x{}",
                    tx_type.as_str(),
                    kind,
                    batch.len()
                );
                if let Err(e) = self.store.apply_batch(kind, tx_type, batch) {
                    error!("批次失败，继续后续批次: {} {} - {}", tx_type.as_str(), kind, e);
                    report.failures.push(BatchFailure {
                        kind,
                        tx_type,
                        error: e,
                    });
                }
            }
        }

        // 物理删除后重建会话，丢弃连接层缓存
        if snapshot.has_deletes() {
            if let Err(e) = self.store.begin_new_session() {
                error!("重建数据库会话失败: {}", e);
            }
        }

        self.events.emit(database_saved(report.changed.clone()));

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::entities::{Bank, BusinessObjectBase, Category, Tag, Transaction};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 记录批次调用顺序的存储桩
    #[derive(Default)]
    struct RecordingStore {
        log: Mutex<Vec<(TxType, EntityKind)>>,
        fail_on: Option<(TxType, EntityKind)>,
        sessions: AtomicUsize,
        unavailable: bool,
    }

    impl EntityStore for RecordingStore {
        fn ensure_ready(&self) -> Result<()> {
            if self.unavailable {
                return Err(MoneySyncSDKError::NotInitialized(
                    "数据库会话已关闭".to_string(),
                ));
            }
            Ok(())
        }

        fn apply_batch(
            &self,
            kind: EntityKind,
            tx_type: TxType,
            _entities: &[SharedEntity],
        ) -> Result<()> {
            self.log.lock().push((tx_type, kind));
            if self.fail_on == Some((tx_type, kind)) {
                return Err(MoneySyncSDKError::Database("约束冲突".to_string()));
            }
            Ok(())
        }

        fn begin_new_session(&self) -> Result<()> {
            self.sessions.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn find_by_external_id(
            &self,
            _kind: EntityKind,
            _external_id: &str,
        ) -> Result<Option<Entity>> {
            Ok(None)
        }

        fn local_id_in_use(&self, _kind: EntityKind, _id: i64) -> Result<bool> {
            Ok(false)
        }
    }

    fn engine_with(store: Arc<RecordingStore>) -> BatchCommitEngine {
        BatchCommitEngine::new(store, Arc::new(EventManager::new(16)))
    }

    fn tag(external_id: &str) -> Entity {
        Entity::Tag(Tag {
            base: BusinessObjectBase::new(external_id),
            name: "t".to_string(),
        })
    }

    fn bank(external_id: &str) -> Entity {
        Entity::Bank(Bank {
            base: BusinessObjectBase::new(external_id),
            name: "b".to_string(),
            institution_external_id: None,
            status: 0,
            last_refreshed_at: None,
        })
    }

    fn category(external_id: &str) -> Entity {
        Entity::Category(Category {
            base: BusinessObjectBase::new(external_id),
            name: "c".to_string(),
            parent_external_id: None,
            category_type_external_id: None,
        })
    }

    fn transaction(external_id: &str) -> Entity {
        Entity::Transaction(Transaction {
            base: BusinessObjectBase::new(external_id),
            description: "COFFEE  SHOP".to_string(),
            normalized_description: String::new(),
            amount: -3.2,
            date: 1,
            category_external_id: None,
            bank_account_external_id: "ACC".to_string(),
            is_processed: false,
        })
    }

    #[test]
    fn batches_follow_canonical_order() {
        let store = Arc::new(RecordingStore::default());
        let engine = engine_with(store.clone());

        // 暂存顺序故意与提交顺序相反
        engine.insert(transaction("TX1"), None);
        engine.insert(bank("B1"), None);
        let staged_tag = shared(tag("T1"));
        engine.update(&staged_tag);
        let staged_cat = shared(category("C1"));
        engine.delete(&staged_cat);

        let report = engine.commit().unwrap();

        let log = store.log.lock().clone();
        assert_eq!(
            log,
            vec![
                (TxType::Insert, EntityKind::Bank),
                (TxType::Insert, EntityKind::Transaction),
                (TxType::Update, EntityKind::Tag),
                (TxType::Delete, EntityKind::Category),
            ]
        );
        assert_eq!(
            report.changed,
            vec![
                EntityKind::Bank,
                EntityKind::Transaction,
                EntityKind::Tag,
                EntityKind::Category,
            ]
        );
        assert!(report.is_clean());
    }

    #[test]
    fn failed_batch_does_not_block_siblings() {
        let store = Arc::new(RecordingStore {
            fail_on: Some((TxType::Insert, EntityKind::Bank)),
            ..Default::default()
        });
        let engine = engine_with(store.clone());

        engine.insert(bank("B1"), None);
        engine.insert(tag("T1"), None);

        let report = engine.commit().unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, EntityKind::Bank);
        assert_eq!(report.failures[0].tx_type, TxType::Insert);
        // 失败类型仍计入变更，后续批次照常执行
        assert!(report.changed.contains(&EntityKind::Bank));
        assert!(store.log.lock().contains(&(TxType::Insert, EntityKind::Tag)));
    }

    #[test]
    fn session_rebuilt_only_after_deletes() {
        let store = Arc::new(RecordingStore::default());
        let engine = engine_with(store.clone());

        engine.insert(tag("T1"), None);
        engine.commit().unwrap();
        assert_eq!(store.sessions.load(Ordering::SeqCst), 0);

        let staged = shared(tag("T2"));
        engine.delete(&staged);
        engine.commit().unwrap();
        assert_eq!(store.sessions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn every_commit_emits_exactly_one_event() {
        let store = Arc::new(RecordingStore::default());
        let events = Arc::new(EventManager::new(16));
        let engine = BatchCommitEngine::new(store, events.clone());

        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();
        events.add_listener("database_saved", move |event| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            // 空提交也发事件，但 did_change 区分
            assert!(!event.did_change());
        });

        engine.commit().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unavailable_store_fails_whole_cycle() {
        let store = Arc::new(RecordingStore {
            unavailable: true,
            ..Default::default()
        });
        let events = Arc::new(EventManager::new(16));
        let engine = BatchCommitEngine::new(store, events.clone());

        engine.insert(tag("T1"), None);
        assert!(engine.commit().is_err());

        // 暂存区原样保留，未发事件
        assert!(!engine.pending().is_empty());
        assert_eq!(events.get_stats().total_events, 0);
    }

    #[test]
    fn soft_delete_stages_an_update() {
        let store = Arc::new(RecordingStore::default());
        let engine = engine_with(store.clone());

        let staged = shared(tag("T1"));
        engine.soft_delete(&staged);
        engine.commit().unwrap();

        assert!(staged.read().is_deleted());
        assert_eq!(
            store.log.lock().clone(),
            vec![(TxType::Update, EntityKind::Tag)]
        );
        // 软删除不触发会话重建
        assert_eq!(store.sessions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn on_before_save_runs_once_per_cycle() {
        let store = Arc::new(RecordingStore::default());
        let engine = engine_with(store);

        let handle = engine.insert(transaction("TX1"), None);
        engine.commit().unwrap();

        match &*handle.read() {
            Entity::Transaction(tx) => {
                assert_eq!(tx.normalized_description, "coffee shop");
            }
            _ => unreachable!(),
        };
    }

    #[test]
    fn insert_without_guid_is_assigned_one() {
        let store = Arc::new(RecordingStore::default());
        let engine = engine_with(store);

        let handle = engine.insert(
            Entity::Tag(Tag {
                base: BusinessObjectBase::new(""),
                name: "t".to_string(),
            }),
            None,
        );
        let guid = handle.read().external_id().to_string();
        assert!(!guid.is_empty());
        assert!(engine
            .pending()
            .lookup(EntityKind::Tag, &guid)
            .is_some());
    }
}
