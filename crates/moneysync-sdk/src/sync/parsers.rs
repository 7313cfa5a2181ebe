//! 同步记录解析 - 原始 JSON 到暂存实体
//!
//! 每类实体一个字段映射；解析端只做「存在即覆盖」的部分更新，
//! 缺失字段保留本地值。guid 解析顺序：本周期暂存缓存优先
//! （保证对象身份），其次数据库，都没有则新建。

use serde_json::Value;
use tracing::debug;

use crate::error::{MoneySyncSDKError, Result};
use crate::storage::entities::{
    shared, Bank, BankAccount, BudgetItem, BusinessObjectBase, Category, DataState, Entity,
    EntityKind, Tag, Transaction, TxType,
};
use crate::storage::EntityStore;
use crate::sync::pending::PendingChangeSet;

/// 解析与暂存的依赖环境
pub struct StageContext<'a> {
    pub store: &'a dyn EntityStore,
    pub pending: &'a PendingChangeSet,
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn f64_field(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(|v| v.as_f64())
}

fn i64_field(value: &Value, key: &str) -> Option<i64> {
    value.get(key).and_then(|v| v.as_i64())
}

fn bool_field(value: &Value, key: &str) -> Option<bool> {
    value.get(key).and_then(|v| v.as_bool())
}

/// 把一条原始同步记录解析并暂存
///
/// `deleted` 为真时置删除标记并暂存到删除批次（物理删除，
/// 提交后触发会话重建）。本地不存在的删除记录是空操作。
pub fn parse_and_stage(
    ctx: &StageContext<'_>,
    kind: EntityKind,
    value: &Value,
    deleted: bool,
) -> Result<()> {
    let guid = value
        .get("guid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| MoneySyncSDKError::InvalidData(format!("同步记录缺少 guid: {}", kind)))?;

    let (handle, is_new) = match ctx.pending.lookup(kind, guid) {
        Some(handle) => (handle, false),
        None => match ctx.store.find_by_external_id(kind, guid)? {
            Some(entity) => (shared(entity), false),
            None => {
                if deleted {
                    debug!("删除记录本地不存在，跳过: {} {}", kind, guid);
                    return Ok(());
                }
                (shared(new_entity(kind, guid)?), true)
            }
        },
    };

    {
        let mut guard = handle.write();
        apply_fields(&mut guard, value)?;
        guard.set_data_state(DataState::Synced);
        if deleted {
            guard.set_deleted(true);
        } else {
            // 远端声明该记录存活；若本周期内已暂存过删除则撤回
            guard.set_deleted(false);
        }
    }

    let tx_type = if deleted {
        TxType::Delete
    } else if is_new {
        TxType::Insert
    } else {
        TxType::Update
    };
    if !deleted && ctx.pending.unstage_delete(&handle) {
        debug!("删除后复活: {} {}", kind, guid);
    }
    ctx.pending.stage(tx_type, handle, None);
    Ok(())
}

/// 新建指定类型的空白实体，仅线路词汇表的六类可见于负载
fn new_entity(kind: EntityKind, guid: &str) -> Result<Entity> {
    let base = BusinessObjectBase::new(guid);
    let entity = match kind {
        EntityKind::Tag => Entity::Tag(Tag {
            base,
            name: String::new(),
        }),
        EntityKind::Category => Entity::Category(Category {
            base,
            name: String::new(),
            parent_external_id: None,
            category_type_external_id: None,
        }),
        EntityKind::Bank => Entity::Bank(Bank {
            base,
            name: String::new(),
            institution_external_id: None,
            status: 0,
            last_refreshed_at: None,
        }),
        EntityKind::BankAccount => Entity::BankAccount(BankAccount {
            base,
            name: String::new(),
            account_number: String::new(),
            balance: 0.0,
            bank_external_id: String::new(),
            account_type_external_id: None,
        }),
        EntityKind::Transaction => Entity::Transaction(Transaction {
            base,
            description: String::new(),
            normalized_description: String::new(),
            amount: 0.0,
            date: 0,
            category_external_id: None,
            bank_account_external_id: String::new(),
            is_processed: false,
        }),
        EntityKind::BudgetItem => Entity::BudgetItem(BudgetItem {
            base,
            category_external_id: String::new(),
            amount: 0.0,
            period_date: 0,
        }),
        other => {
            return Err(MoneySyncSDKError::InvalidData(format!(
                "该类型不参与同步负载: {}",
                other
            )))
        }
    };
    Ok(entity)
}

/// 存在即覆盖的字段映射
fn apply_fields(entity: &mut Entity, value: &Value) -> Result<()> {
    match entity {
        Entity::Tag(tag) => {
            if let Some(name) = str_field(value, "name") {
                tag.name = name;
            }
        }
        Entity::Category(category) => {
            if let Some(name) = str_field(value, "name") {
                category.name = name;
            }
            if let Some(parent) = str_field(value, "parent_guid") {
                category.parent_external_id = Some(parent);
            }
            if let Some(ct) = str_field(value, "category_type_guid") {
                category.category_type_external_id = Some(ct);
            }
        }
        Entity::Bank(bank) => {
            if let Some(name) = str_field(value, "name") {
                bank.name = name;
            }
            if let Some(institution) = str_field(value, "institution_guid") {
                bank.institution_external_id = Some(institution);
            }
            if let Some(status) = i64_field(value, "status") {
                bank.status = status as i32;
            }
            if let Some(refreshed) = i64_field(value, "last_refreshed_at") {
                bank.last_refreshed_at = Some(refreshed);
            }
        }
        Entity::BankAccount(account) => {
            if let Some(name) = str_field(value, "name") {
                account.name = name;
            }
            if let Some(number) = str_field(value, "account_number") {
                account.account_number = number;
            }
            if let Some(balance) = f64_field(value, "balance") {
                account.balance = balance;
            }
            if let Some(bank) = str_field(value, "bank_guid") {
                account.bank_external_id = bank;
            }
            if let Some(account_type) = str_field(value, "account_type_guid") {
                account.account_type_external_id = Some(account_type);
            }
        }
        Entity::Transaction(tx) => {
            if let Some(description) = str_field(value, "description") {
                tx.description = description;
            }
            if let Some(amount) = f64_field(value, "amount") {
                tx.amount = amount;
            }
            if let Some(date) = i64_field(value, "date") {
                tx.date = date;
            }
            if let Some(category) = str_field(value, "category_guid") {
                tx.category_external_id = Some(category);
            }
            if let Some(account) = str_field(value, "bank_account_guid") {
                tx.bank_account_external_id = account;
            }
            if let Some(processed) = bool_field(value, "is_processed") {
                tx.is_processed = processed;
            }
        }
        Entity::BudgetItem(item) => {
            if let Some(category) = str_field(value, "category_guid") {
                item.category_external_id = category;
            }
            if let Some(amount) = f64_field(value, "amount") {
                item.amount = amount;
            }
            if let Some(period) = i64_field(value, "period_date") {
                item.period_date = period;
            }
        }
        other => {
            return Err(MoneySyncSDKError::InvalidData(format!(
                "该类型不参与同步负载: {}",
                other.kind()
            )))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageManager;
    use serde_json::json;
    use tempfile::TempDir;

    fn ctx<'a>(
        store: &'a StorageManager,
        pending: &'a PendingChangeSet,
    ) -> StageContext<'a> {
        StageContext { store, pending }
    }

    #[test]
    fn new_record_is_staged_as_insert() {
        let temp_dir = TempDir::new().unwrap();
        let store = StorageManager::open(temp_dir.path()).unwrap();
        let pending = PendingChangeSet::new();

        let record = json!({ "guid": "TAG1", "name": "餐饮" });
        parse_and_stage(&ctx(&store, &pending), EntityKind::Tag, &record, false).unwrap();

        let staged = pending.lookup(EntityKind::Tag, "TAG1").unwrap();
        let guard = staged.read();
        assert_eq!(guard.data_state(), DataState::Synced);
        match &*guard {
            Entity::Tag(tag) => assert_eq!(tag.name, "餐饮"),
            _ => unreachable!(),
        }
        drop(guard);

        let snapshot = pending.drain();
        assert_eq!(snapshot.batch(TxType::Insert, EntityKind::Tag).len(), 1);
    }

    #[test]
    fn record_without_guid_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = StorageManager::open(temp_dir.path()).unwrap();
        let pending = PendingChangeSet::new();

        let record = json!({ "name": "无主记录" });
        let result = parse_and_stage(&ctx(&store, &pending), EntityKind::Tag, &record, false);
        assert!(matches!(result, Err(MoneySyncSDKError::InvalidData(_))));
        assert!(pending.is_empty());
    }

    #[test]
    fn deleting_unknown_record_is_a_noop() {
        let temp_dir = TempDir::new().unwrap();
        let store = StorageManager::open(temp_dir.path()).unwrap();
        let pending = PendingChangeSet::new();

        let record = json!({ "guid": "GONE" });
        parse_and_stage(&ctx(&store, &pending), EntityKind::Tag, &record, true).unwrap();
        assert!(pending.is_empty());
    }

    #[test]
    fn updated_record_resolves_to_staged_identity() {
        let temp_dir = TempDir::new().unwrap();
        let store = StorageManager::open(temp_dir.path()).unwrap();
        let pending = PendingChangeSet::new();
        let context = ctx(&store, &pending);

        let created = json!({ "guid": "TAG1", "name": "旧名" });
        parse_and_stage(&context, EntityKind::Tag, &created, false).unwrap();
        let first = pending.lookup(EntityKind::Tag, "TAG1").unwrap();

        let updated = json!({ "guid": "TAG1", "name": "新名" });
        parse_and_stage(&context, EntityKind::Tag, &updated, false).unwrap();
        let second = pending.lookup(EntityKind::Tag, "TAG1").unwrap();

        // 同周期同 guid 必须是同一个内存对象
        assert!(crate::storage::SharedEntity::ptr_eq(&first, &second));
        match &*first.read() {
            Entity::Tag(tag) => assert_eq!(tag.name, "新名"),
            _ => unreachable!(),
        };
    }

    #[test]
    fn partial_update_keeps_existing_fields() {
        let temp_dir = TempDir::new().unwrap();
        let store = StorageManager::open(temp_dir.path()).unwrap();
        let pending = PendingChangeSet::new();
        let context = ctx(&store, &pending);

        let full = json!({
            "guid": "ACC1",
            "name": "工资卡",
            "balance": 1000.0,
            "bank_guid": "B1"
        });
        parse_and_stage(&context, EntityKind::BankAccount, &full, false).unwrap();

        let partial = json!({ "guid": "ACC1", "balance": 900.5 });
        parse_and_stage(&context, EntityKind::BankAccount, &partial, false).unwrap();

        let staged = pending.lookup(EntityKind::BankAccount, "ACC1").unwrap();
        match &*staged.read() {
            Entity::BankAccount(account) => {
                assert_eq!(account.balance, 900.5);
                assert_eq!(account.name, "工资卡");
                assert_eq!(account.bank_external_id, "B1");
            }
            _ => unreachable!(),
        };
    }
}
