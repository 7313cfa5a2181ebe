//! 待提交变更集 - 批量提交前的内存暂存区
//!
//! 三张操作表（插入/更新/删除）按实体类型分桶，外加一个
//! 去重缓存：同一周期内重复出现的 guid 必须解析到同一个
//! 内存对象，靠 `Arc::ptr_eq` 判定身份。

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::storage::entities::{EntityKind, SharedEntity, TxType};
use crate::utils::guid;

/// 去重缓存键
fn cache_key(kind: EntityKind, external_id: &str) -> String {
    format!("{}:{}", kind, external_id)
}

#[derive(Default)]
struct Inner {
    inserts: HashMap<EntityKind, Vec<SharedEntity>>,
    updates: HashMap<EntityKind, Vec<SharedEntity>>,
    deletes: HashMap<EntityKind, Vec<SharedEntity>>,
    /// `"{kind}:{external_id}"` -> 共享实体（Base 类型不入缓存）
    cache: HashMap<String, SharedEntity>,
}

impl Inner {
    fn list_mut(&mut self, tx_type: TxType, kind: EntityKind) -> &mut Vec<SharedEntity> {
        let map = match tx_type {
            TxType::Insert => &mut self.inserts,
            TxType::Update => &mut self.updates,
            TxType::Delete => &mut self.deletes,
        };
        map.entry(kind).or_default()
    }
}

/// 待提交变更集
///
/// 所有状态收在一把锁后面；暂存只持锁片刻，提交端用
/// [`drain`](Self::drain) 原子地取走快照。
#[derive(Default)]
pub struct PendingChangeSet {
    inner: Mutex<Inner>,
}

impl PendingChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 暂存一个实体
    ///
    /// 去重缓存键优先取 `guid_hint`，否则取实体自身的 external_id；
    /// 插入且 external_id 为空时还会先补一个（hint 或随机 guid）。
    /// 同一对象已在目标列表中则不重复加入。
    pub fn stage(&self, tx_type: TxType, entity: SharedEntity, guid_hint: Option<&str>) {
        let hint = guid_hint.filter(|h| !h.is_empty());
        let (kind, cache_id) = {
            let mut guard = entity.write();
            if tx_type == TxType::Insert && guard.external_id().is_empty() {
                let external_id = match hint {
                    Some(h) => h.to_string(),
                    None => guid::create_random_external_id(),
                };
                guard.base_mut().external_id = external_id;
            }
            let cache_id = match hint {
                Some(h) => h.to_string(),
                None => guard.external_id().to_string(),
            };
            (guard.kind(), cache_id)
        };

        let mut inner = self.inner.lock();

        let list = inner.list_mut(tx_type, kind);
        if list.iter().any(|staged| SharedEntity::ptr_eq(staged, &entity)) {
            debug!("重复暂存，忽略: {} {}", tx_type.as_str(), kind);
            return;
        }
        list.push(entity.clone());

        // Base 是兜底类型，guid 无唯一性保证，不入去重缓存
        if kind != EntityKind::Base {
            inner.cache.insert(cache_key(kind, &cache_id), entity);
        }
    }

    /// 把已暂存为删除的实体从删除批次撤回
    ///
    /// 同一负载里同 guid 先删后建时，后到的创建/更新让记录复活。
    /// 返回是否真的撤回了一条。
    pub fn unstage_delete(&self, entity: &SharedEntity) -> bool {
        let kind = entity.read().kind();
        let mut inner = self.inner.lock();
        if let Some(list) = inner.deletes.get_mut(&kind) {
            if let Some(pos) = list
                .iter()
                .position(|staged| SharedEntity::ptr_eq(staged, entity))
            {
                list.remove(pos);
                debug!("撤回删除批次: {}", kind);
                return true;
            }
        }
        false
    }

    /// 按类型与外部 ID 查找本周期已暂存的实体
    pub fn lookup(&self, kind: EntityKind, external_id: &str) -> Option<SharedEntity> {
        self.inner
            .lock()
            .cache
            .get(&cache_key(kind, external_id))
            .cloned()
    }

    /// 是否没有任何待提交变更
    pub fn is_empty(&self) -> bool {
        let inner = self.inner.lock();
        inner.inserts.values().all(|v| v.is_empty())
            && inner.updates.values().all(|v| v.is_empty())
            && inner.deletes.values().all(|v| v.is_empty())
    }

    /// 丢弃全部暂存状态
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        *inner = Inner::default();
    }

    /// 原子地取走暂存状态
    ///
    /// 提交期间新暂存的实体落入下一个周期，不会被静默丢弃。
    pub fn drain(&self) -> PendingSnapshot {
        let mut inner = self.inner.lock();
        let taken = std::mem::take(&mut *inner);
        PendingSnapshot {
            inserts: taken.inserts,
            updates: taken.updates,
            deletes: taken.deletes,
        }
    }
}

/// 一次提交周期的变更快照
pub struct PendingSnapshot {
    inserts: HashMap<EntityKind, Vec<SharedEntity>>,
    updates: HashMap<EntityKind, Vec<SharedEntity>>,
    deletes: HashMap<EntityKind, Vec<SharedEntity>>,
}

impl PendingSnapshot {
    /// 指定操作与类型的批次，无则为空切片
    pub fn batch(&self, tx_type: TxType, kind: EntityKind) -> &[SharedEntity] {
        let map = match tx_type {
            TxType::Insert => &self.inserts,
            TxType::Update => &self.updates,
            TxType::Delete => &self.deletes,
        };
        map.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 快照内是否含删除批次
    pub fn has_deletes(&self) -> bool {
        self.deletes.values().any(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.inserts.values().all(|v| v.is_empty())
            && self.updates.values().all(|v| v.is_empty())
            && self.deletes.values().all(|v| v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::entities::{shared, BusinessObjectBase, Entity, Tag};

    fn new_tag(external_id: &str) -> SharedEntity {
        shared(Entity::Tag(Tag {
            base: BusinessObjectBase::new(external_id),
            name: "test".to_string(),
        }))
    }

    #[test]
    fn stage_registers_in_cache() {
        let pending = PendingChangeSet::new();
        let tag = new_tag("TAG1");
        pending.stage(TxType::Insert, tag.clone(), None);

        let found = pending.lookup(EntityKind::Tag, "TAG1").unwrap();
        assert!(SharedEntity::ptr_eq(&found, &tag));
        assert!(pending.lookup(EntityKind::Tag, "TAG2").is_none());
    }

    #[test]
    fn staging_same_object_twice_is_idempotent() {
        let pending = PendingChangeSet::new();
        let tag = new_tag("TAG1");
        pending.stage(TxType::Insert, tag.clone(), None);
        pending.stage(TxType::Insert, tag.clone(), None);

        let snapshot = pending.drain();
        assert_eq!(snapshot.batch(TxType::Insert, EntityKind::Tag).len(), 1);
    }

    #[test]
    fn insert_without_guid_gets_one() {
        let pending = PendingChangeSet::new();
        let tag = new_tag("");
        pending.stage(TxType::Insert, tag.clone(), None);
        assert!(!tag.read().external_id().is_empty());

        let hinted = new_tag("");
        pending.stage(TxType::Insert, hinted.clone(), Some("HINTED"));
        assert_eq!(hinted.read().external_id(), "HINTED");
    }

    #[test]
    fn hint_overrides_cache_key() {
        let pending = PendingChangeSet::new();
        let tag = new_tag("REAL");
        pending.stage(TxType::Update, tag.clone(), Some("ALIAS"));

        // 带提示暂存时去重缓存以提示为键，实体自身 guid 不入缓存
        let found = pending.lookup(EntityKind::Tag, "ALIAS").unwrap();
        assert!(SharedEntity::ptr_eq(&found, &tag));
        assert!(pending.lookup(EntityKind::Tag, "REAL").is_none());
        assert_eq!(tag.read().external_id(), "REAL");
    }

    #[test]
    fn unstage_delete_revives_staged_entity() {
        let pending = PendingChangeSet::new();
        let tag = new_tag("TAG1");
        pending.stage(TxType::Delete, tag.clone(), None);
        assert!(pending.unstage_delete(&tag));

        let snapshot = pending.drain();
        assert!(!snapshot.has_deletes());
        // 不在删除批次里的实体撤回是空操作
        assert!(!pending.unstage_delete(&new_tag("TAG2")));
    }

    #[test]
    fn drain_takes_everything() {
        let pending = PendingChangeSet::new();
        pending.stage(TxType::Insert, new_tag("TAG1"), None);
        pending.stage(TxType::Delete, new_tag("TAG2"), None);
        assert!(!pending.is_empty());

        let snapshot = pending.drain();
        assert!(snapshot.has_deletes());
        assert_eq!(snapshot.batch(TxType::Insert, EntityKind::Tag).len(), 1);

        // 取走后暂存区与缓存都应为空
        assert!(pending.is_empty());
        assert!(pending.lookup(EntityKind::Tag, "TAG1").is_none());
    }

    #[test]
    fn clear_empties_cache() {
        let pending = PendingChangeSet::new();
        pending.stage(TxType::Update, new_tag("TAG1"), None);
        pending.clear();
        assert!(pending.is_empty());
        assert!(pending.lookup(EntityKind::Tag, "TAG1").is_none());
    }
}
