//! 随机 ID 生成
//!
//! 外部 ID 是 130 位随机数的 base-32 大写表示（26 个字符），
//! 离线创建的记录先用它占位，上行后由服务端确认。

use rand::Rng;

use crate::error::Result;
use crate::storage::{EntityKind, EntityStore};

const GUID_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHIJKLMNOPQRSTUV";
const GUID_LEN: usize = 26;

/// 生成随机外部 ID
pub fn create_random_external_id() -> String {
    let mut rng = rand::thread_rng();
    (0..GUID_LEN)
        .map(|_| GUID_ALPHABET[rng.gen_range(0..GUID_ALPHABET.len())] as char)
        .collect()
}

/// 生成未被占用的本地代理主键
///
/// 先试 `hint`，被占用则随机重掷直到空闲。
pub fn create_random_local_id(
    store: &dyn EntityStore,
    kind: EntityKind,
    hint: Option<i64>,
) -> Result<i64> {
    if let Some(id) = hint {
        if id > 0 && !store.local_id_in_use(kind, id)? {
            return Ok(id);
        }
    }

    let mut rng = rand::thread_rng();
    loop {
        let candidate: i64 = rng.gen_range(1..i64::MAX);
        if !store.local_id_in_use(kind, candidate)? {
            return Ok(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_id_shape() {
        let id = create_random_external_id();
        assert_eq!(id.len(), GUID_LEN);
        assert!(id.bytes().all(|b| GUID_ALPHABET.contains(&b)));
    }

    #[test]
    fn external_ids_are_distinct() {
        let a = create_random_external_id();
        let b = create_random_external_id();
        assert_ne!(a, b);
    }

    #[test]
    fn local_id_rerolls_on_collision() {
        use crate::storage::entities::{shared, BusinessObjectBase, Entity, Tag, TxType};
        use crate::storage::StorageManager;
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let store = StorageManager::open(temp_dir.path()).unwrap();

        let tag = shared(Entity::Tag(Tag {
            base: BusinessObjectBase::new("TAG1"),
            name: "a".to_string(),
        }));
        store
            .apply_batch(EntityKind::Tag, TxType::Insert, &[tag.clone()])
            .unwrap();
        let taken = tag.read().local_id().unwrap();

        let rolled = create_random_local_id(&store, EntityKind::Tag, Some(taken)).unwrap();
        assert_ne!(rolled, taken);

        let free = taken + 1;
        let kept = create_random_local_id(&store, EntityKind::Tag, Some(free)).unwrap();
        assert_eq!(kept, free);
    }
}
