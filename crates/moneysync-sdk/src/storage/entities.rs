//! 数据实体定义 - 类型安全的业务对象
//!
//! 每个实体内嵌一份业务对象基础字段（external_id / data_state / 软删除标记），
//! 外键引用统一使用远端外部 ID（guid），与同步线路格式一致。

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// 数据处理状态（入库列为 i32）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataState {
    /// 本地变更，尚未上行
    Pending,
    /// 与远端一致
    Synced,
    /// 已挂起（整类清除前的标记）
    Suspended,
}

impl DataState {
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Pending => 0,
            Self::Synced => 1,
            Self::Suspended => 2,
        }
    }

    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => Self::Synced,
            2 => Self::Suspended,
            _ => Self::Pending,
        }
    }
}

/// 批量事务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxType {
    Insert,
    Update,
    Delete,
}

impl TxType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// 实体类型 - 受控枚举，新增需与服务端同步升级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    AccountType,
    AccountTypeGroup,
    Bank,
    BankAccount,
    BankAccountBalance,
    BudgetItem,
    Category,
    CategoryType,
    Institution,
    Location,
    Tag,
    TagInstance,
    Transaction,
    /// 兜底的业务对象基础类型，只参与提交，不进入去重缓存
    Base,
}

/// 提交顺序表 - 依赖少者在前，满足外键约束（BankAccount 引用 Bank，须后提交）
pub const COMMIT_ORDER: [EntityKind; 14] = [
    EntityKind::AccountType,
    EntityKind::AccountTypeGroup,
    EntityKind::Bank,
    EntityKind::BankAccount,
    EntityKind::BankAccountBalance,
    EntityKind::BudgetItem,
    EntityKind::Category,
    EntityKind::CategoryType,
    EntityKind::Institution,
    EntityKind::Location,
    EntityKind::Tag,
    EntityKind::TagInstance,
    EntityKind::Transaction,
    EntityKind::Base,
];

/// 同步负载内的实体解析顺序（线路词汇表的六类）
pub const PAYLOAD_ORDER: [EntityKind; 6] = [
    EntityKind::Tag,
    EntityKind::Category,
    EntityKind::Bank,
    EntityKind::BankAccount,
    EntityKind::Transaction,
    EntityKind::BudgetItem,
];

impl EntityKind {
    /// 线路格式中的类型名（与服务端约定，不可改动）
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AccountType => "account_type",
            Self::AccountTypeGroup => "account_type_group",
            Self::Bank => "bank",
            Self::BankAccount => "bank_account",
            Self::BankAccountBalance => "bank_account_balance",
            Self::BudgetItem => "budget_item",
            Self::Category => "category",
            Self::CategoryType => "category_type",
            Self::Institution => "institution",
            Self::Location => "location",
            Self::Tag => "tag",
            Self::TagInstance => "tag_instance",
            Self::Transaction => "transaction",
            Self::Base => "business_object_base",
        }
    }

    /// 对应的 SQLite 表名
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Transaction => "transactions",
            other => other.as_str(),
        }
    }
}

impl FromStr for EntityKind {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "account_type" => Ok(Self::AccountType),
            "account_type_group" => Ok(Self::AccountTypeGroup),
            "bank" => Ok(Self::Bank),
            "bank_account" => Ok(Self::BankAccount),
            "bank_account_balance" => Ok(Self::BankAccountBalance),
            "budget_item" => Ok(Self::BudgetItem),
            "category" => Ok(Self::Category),
            "category_type" => Ok(Self::CategoryType),
            "institution" => Ok(Self::Institution),
            "location" => Ok(Self::Location),
            "tag" => Ok(Self::Tag),
            "tag_instance" => Ok(Self::TagInstance),
            "transaction" => Ok(Self::Transaction),
            "business_object_base" => Ok(Self::Base),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 业务对象基础字段
///
/// - `id`：本地代理主键，首次入库前为 None
/// - `external_id`：远端分配（或离线创建时本地生成）的全局 ID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessObjectBase {
    pub id: Option<i64>,
    pub external_id: String,
    pub data_state: DataState,
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl BusinessObjectBase {
    pub fn new(external_id: impl Into<String>) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            id: None,
            external_id: external_id.into(),
            data_state: DataState::Pending,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountType {
    pub base: BusinessObjectBase,
    pub name: String,
    pub group_external_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountTypeGroup {
    pub base: BusinessObjectBase,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bank {
    pub base: BusinessObjectBase,
    pub name: String,
    pub institution_external_id: Option<String>,
    /// 聚合端连接状态码
    pub status: i32,
    pub last_refreshed_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub base: BusinessObjectBase,
    pub name: String,
    /// 脱敏后的账号尾号
    pub account_number: String,
    pub balance: f64,
    pub bank_external_id: String,
    pub account_type_external_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccountBalance {
    pub base: BusinessObjectBase,
    pub bank_account_external_id: String,
    pub balance: f64,
    pub date: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetItem {
    pub base: BusinessObjectBase,
    pub category_external_id: String,
    pub amount: f64,
    /// 预算所属周期（当月一日，毫秒时间戳）
    pub period_date: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub base: BusinessObjectBase,
    pub name: String,
    pub parent_external_id: Option<String>,
    pub category_type_external_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryType {
    pub base: BusinessObjectBase,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Institution {
    pub base: BusinessObjectBase,
    pub name: String,
    pub status: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub base: BusinessObjectBase,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub base: BusinessObjectBase,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagInstance {
    pub base: BusinessObjectBase,
    pub tag_external_id: String,
    pub transaction_external_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub base: BusinessObjectBase,
    pub description: String,
    /// 由 description 派生，入库前重算（见 `on_before_save`）
    pub normalized_description: String,
    pub amount: f64,
    pub date: i64,
    pub category_external_id: Option<String>,
    pub bank_account_external_id: String,
    pub is_processed: bool,
}

/// 全实体枚举 - 暂存区与批量提交统一以它流转
#[derive(Debug, Clone)]
pub enum Entity {
    AccountType(AccountType),
    AccountTypeGroup(AccountTypeGroup),
    Bank(Bank),
    BankAccount(BankAccount),
    BankAccountBalance(BankAccountBalance),
    BudgetItem(BudgetItem),
    Category(Category),
    CategoryType(CategoryType),
    Institution(Institution),
    Location(Location),
    Tag(Tag),
    TagInstance(TagInstance),
    Transaction(Transaction),
    Base(BusinessObjectBase),
}

/// 共享实体句柄
///
/// 去重缓存必须把同一周期内重复出现的 guid 解析到同一个内存对象，
/// 因此暂存的是 `Arc<RwLock<Entity>>`，身份判定用 `Arc::ptr_eq`。
pub type SharedEntity = Arc<RwLock<Entity>>;

/// 包装为共享实体句柄
pub fn shared(entity: Entity) -> SharedEntity {
    Arc::new(RwLock::new(entity))
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::AccountType(_) => EntityKind::AccountType,
            Entity::AccountTypeGroup(_) => EntityKind::AccountTypeGroup,
            Entity::Bank(_) => EntityKind::Bank,
            Entity::BankAccount(_) => EntityKind::BankAccount,
            Entity::BankAccountBalance(_) => EntityKind::BankAccountBalance,
            Entity::BudgetItem(_) => EntityKind::BudgetItem,
            Entity::Category(_) => EntityKind::Category,
            Entity::CategoryType(_) => EntityKind::CategoryType,
            Entity::Institution(_) => EntityKind::Institution,
            Entity::Location(_) => EntityKind::Location,
            Entity::Tag(_) => EntityKind::Tag,
            Entity::TagInstance(_) => EntityKind::TagInstance,
            Entity::Transaction(_) => EntityKind::Transaction,
            Entity::Base(_) => EntityKind::Base,
        }
    }

    pub fn base(&self) -> &BusinessObjectBase {
        match self {
            Entity::AccountType(e) => &e.base,
            Entity::AccountTypeGroup(e) => &e.base,
            Entity::Bank(e) => &e.base,
            Entity::BankAccount(e) => &e.base,
            Entity::BankAccountBalance(e) => &e.base,
            Entity::BudgetItem(e) => &e.base,
            Entity::Category(e) => &e.base,
            Entity::CategoryType(e) => &e.base,
            Entity::Institution(e) => &e.base,
            Entity::Location(e) => &e.base,
            Entity::Tag(e) => &e.base,
            Entity::TagInstance(e) => &e.base,
            Entity::Transaction(e) => &e.base,
            Entity::Base(e) => e,
        }
    }

    pub fn base_mut(&mut self) -> &mut BusinessObjectBase {
        match self {
            Entity::AccountType(e) => &mut e.base,
            Entity::AccountTypeGroup(e) => &mut e.base,
            Entity::Bank(e) => &mut e.base,
            Entity::BankAccount(e) => &mut e.base,
            Entity::BankAccountBalance(e) => &mut e.base,
            Entity::BudgetItem(e) => &mut e.base,
            Entity::Category(e) => &mut e.base,
            Entity::CategoryType(e) => &mut e.base,
            Entity::Institution(e) => &mut e.base,
            Entity::Location(e) => &mut e.base,
            Entity::Tag(e) => &mut e.base,
            Entity::TagInstance(e) => &mut e.base,
            Entity::Transaction(e) => &mut e.base,
            Entity::Base(e) => e,
        }
    }

    pub fn external_id(&self) -> &str {
        &self.base().external_id
    }

    pub fn local_id(&self) -> Option<i64> {
        self.base().id
    }

    pub fn set_local_id(&mut self, id: i64) {
        self.base_mut().id = Some(id);
    }

    pub fn is_deleted(&self) -> bool {
        self.base().is_deleted
    }

    pub fn set_deleted(&mut self, deleted: bool) {
        self.base_mut().is_deleted = deleted;
    }

    pub fn data_state(&self) -> DataState {
        self.base().data_state
    }

    pub fn set_data_state(&mut self, state: DataState) {
        self.base_mut().data_state = state;
    }

    /// 整类清除前的挂起标记（见 `StorageManager::delete_data`）
    pub fn suspend_data_state(&mut self) {
        self.base_mut().data_state = DataState::Suspended;
    }

    /// 入库前钩子 - 每个实体在参与批量事务前恰好调用一次
    ///
    /// 统一刷新 `updated_at`；Transaction 额外重算派生的规范化描述。
    pub fn on_before_save(&mut self, _is_delete: bool) {
        self.base_mut().updated_at = Utc::now().timestamp_millis();

        if let Entity::Transaction(tx) = self {
            tx.normalized_description = normalize_description(&tx.description);
        }
    }
}

/// 交易描述规范化：小写、折叠空白
pub fn normalize_description(description: &str) -> String {
    description
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_as_str_and_from_str() {
        assert_eq!(EntityKind::Bank.as_str(), "bank");
        assert_eq!(EntityKind::BankAccount.as_str(), "bank_account");
        assert_eq!(EntityKind::from_str("tag").unwrap(), EntityKind::Tag);
        assert_eq!(
            EntityKind::from_str("budget_item").unwrap(),
            EntityKind::BudgetItem
        );
        assert!(EntityKind::from_str("unknown").is_err());
    }

    #[test]
    fn commit_order_puts_base_last_and_bank_before_account() {
        assert_eq!(COMMIT_ORDER.last(), Some(&EntityKind::Base));
        let bank = COMMIT_ORDER.iter().position(|k| *k == EntityKind::Bank);
        let account = COMMIT_ORDER
            .iter()
            .position(|k| *k == EntityKind::BankAccount);
        assert!(bank < account);
    }

    #[test]
    fn table_name_diverges_only_for_transactions() {
        // transaction 是 SQLite 关键字，表名用复数
        assert_eq!(EntityKind::Transaction.table_name(), "transactions");
        assert_eq!(EntityKind::Bank.table_name(), "bank");
    }

    #[test]
    fn on_before_save_refreshes_derived_fields() {
        let mut tx = Entity::Transaction(Transaction {
            base: BusinessObjectBase::new("TX1"),
            description: "  STARBUCKS   #1234  ".to_string(),
            normalized_description: String::new(),
            amount: -4.55,
            date: 0,
            category_external_id: None,
            bank_account_external_id: "ACC1".to_string(),
            is_processed: false,
        });
        tx.on_before_save(false);
        match &tx {
            Entity::Transaction(t) => {
                assert_eq!(t.normalized_description, "starbucks #1234");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn new_entity_has_no_surrogate_key() {
        let base = BusinessObjectBase::new("G1");
        assert!(base.id.is_none());
        assert_eq!(base.data_state, DataState::Pending);
        assert!(!base.is_deleted);
    }
}
