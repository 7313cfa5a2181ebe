//! 数据访问层 (DAO) - 每张表一个专门的操作模块
//!
//! `KindDao` 是每类实体的持久化适配器接口，`dao_for` 是
//! 实体类型到适配器的注册表；通用的查询（按外部 ID、按数据状态）
//! 基于表名加 `from_row` 统一实现，各 DAO 只负责自己的列。

pub mod account_type;
pub mod account_type_group;
pub mod bank;
pub mod bank_account;
pub mod bank_account_balance;
pub mod budget_item;
pub mod business_object_base;
pub mod category;
pub mod category_type;
pub mod institution;
pub mod location;
pub mod tag;
pub mod tag_instance;
pub mod transaction;

pub use account_type::AccountTypeDao;
pub use account_type_group::AccountTypeGroupDao;
pub use bank::BankDao;
pub use bank_account::BankAccountDao;
pub use bank_account_balance::BankAccountBalanceDao;
pub use budget_item::BudgetItemDao;
pub use business_object_base::BusinessObjectBaseDao;
pub use category::CategoryDao;
pub use category_type::CategoryTypeDao;
pub use institution::InstitutionDao;
pub use location::LocationDao;
pub use tag::TagDao;
pub use tag_instance::TagInstanceDao;
pub use transaction::TransactionDao;

use crate::error::{MoneySyncSDKError, Result};
use crate::storage::entities::{
    BusinessObjectBase, DataState, Entity, EntityKind, SharedEntity, TxType,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// 每类实体的持久化适配器
pub trait KindDao {
    /// 行映射（列名访问，`SELECT *` 语义）
    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<Entity>;

    /// 插入一行，返回库分配的代理主键
    fn insert(&self, entity: &Entity) -> Result<i64>;

    /// 按代理主键更新，未入库的记录退回按外部 ID 更新
    fn update(&self, entity: &Entity) -> Result<()>;

    /// 物理删除
    fn delete(&self, entity: &Entity) -> Result<()>;
}

/// 注册表：实体类型 -> 持久化适配器
pub fn dao_for<'a>(kind: EntityKind, conn: &'a Connection) -> Box<dyn KindDao + 'a> {
    match kind {
        EntityKind::AccountType => Box::new(AccountTypeDao::new(conn)),
        EntityKind::AccountTypeGroup => Box::new(AccountTypeGroupDao::new(conn)),
        EntityKind::Bank => Box::new(BankDao::new(conn)),
        EntityKind::BankAccount => Box::new(BankAccountDao::new(conn)),
        EntityKind::BankAccountBalance => Box::new(BankAccountBalanceDao::new(conn)),
        EntityKind::BudgetItem => Box::new(BudgetItemDao::new(conn)),
        EntityKind::Category => Box::new(CategoryDao::new(conn)),
        EntityKind::CategoryType => Box::new(CategoryTypeDao::new(conn)),
        EntityKind::Institution => Box::new(InstitutionDao::new(conn)),
        EntityKind::Location => Box::new(LocationDao::new(conn)),
        EntityKind::Tag => Box::new(TagDao::new(conn)),
        EntityKind::TagInstance => Box::new(TagInstanceDao::new(conn)),
        EntityKind::Transaction => Box::new(TransactionDao::new(conn)),
        EntityKind::Base => Box::new(BusinessObjectBaseDao::new(conn)),
    }
}

/// 公共列的行映射
pub(crate) fn base_from_row(row: &Row<'_>) -> rusqlite::Result<BusinessObjectBase> {
    Ok(BusinessObjectBase {
        id: row.get("id")?,
        external_id: row.get("external_id")?,
        data_state: DataState::from_i32(row.get("data_state")?),
        is_deleted: row.get("is_deleted")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// 物理删除：优先按代理主键，未入库的记录按外部 ID
pub(crate) fn delete_by_base(conn: &Connection, table: &str, entity: &Entity) -> Result<()> {
    match entity.local_id() {
        Some(id) => {
            conn.execute(&format!("DELETE FROM {} WHERE id = ?1", table), params![id])?;
        }
        None => {
            conn.execute(
                &format!("DELETE FROM {} WHERE external_id = ?1", table),
                params![entity.external_id()],
            )?;
        }
    }
    Ok(())
}

/// 类型不匹配的兜底错误（注册表路由错误属编程错误，但不 panic）
pub(crate) fn kind_mismatch(expected: EntityKind, got: &Entity) -> MoneySyncSDKError {
    MoneySyncSDKError::InvalidData(format!(
        "DAO 类型不匹配: 期望 {}, 实际 {}",
        expected,
        got.kind()
    ))
}

/// 把同类同操作的一批实体作为单个事务应用
///
/// 插入成功后把库分配的 rowid 写回共享实体（首次提交才有代理主键）。
/// 任一条失败即整批回滚，由提交引擎记录并继续后续批次。
pub fn apply_batch(
    conn: &Connection,
    kind: EntityKind,
    tx_type: TxType,
    entities: &[SharedEntity],
) -> Result<()> {
    let dao = dao_for(kind, conn);
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| MoneySyncSDKError::Database(format!("开始事务失败: {}", e)))?;

    for shared in entities {
        match tx_type {
            TxType::Insert => {
                let rowid = {
                    let guard = shared.read();
                    dao.insert(&guard)?
                };
                shared.write().set_local_id(rowid);
            }
            TxType::Update => {
                let guard = shared.read();
                dao.update(&guard)?;
            }
            TxType::Delete => {
                let guard = shared.read();
                dao.delete(&guard)?;
            }
        }
    }

    tx.commit()
        .map_err(|e| MoneySyncSDKError::Database(format!("提交事务失败: {}", e)))?;

    Ok(())
}

/// 按外部 ID 点查
pub fn find_by_external_id(
    conn: &Connection,
    kind: EntityKind,
    external_id: &str,
) -> Result<Option<Entity>> {
    let dao = dao_for(kind, conn);
    let sql = format!(
        "SELECT * FROM {} WHERE external_id = ?1",
        kind.table_name()
    );
    let entity = conn
        .query_row(&sql, params![external_id], |row| dao.from_row(row))
        .optional()
        .map_err(|e| MoneySyncSDKError::Database(format!("按外部 ID 查询失败: {}", e)))?;
    Ok(entity)
}

/// 按代理主键点查
pub fn find_by_id(conn: &Connection, kind: EntityKind, id: i64) -> Result<Option<Entity>> {
    let dao = dao_for(kind, conn);
    let sql = format!("SELECT * FROM {} WHERE id = ?1", kind.table_name());
    let entity = conn
        .query_row(&sql, params![id], |row| dao.from_row(row))
        .optional()
        .map_err(|e| MoneySyncSDKError::Database(format!("按主键查询失败: {}", e)))?;
    Ok(entity)
}

/// 全表加载
pub fn load_all(conn: &Connection, kind: EntityKind) -> Result<Vec<Entity>> {
    let dao = dao_for(kind, conn);
    let sql = format!("SELECT * FROM {}", kind.table_name());
    let mut stmt = conn.prepare(&sql)?;
    let entities = stmt
        .query_map([], |row| dao.from_row(row))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entities)
}

/// 按数据处理状态过滤
pub fn query_by_data_state(
    conn: &Connection,
    kind: EntityKind,
    state: DataState,
) -> Result<Vec<Entity>> {
    let dao = dao_for(kind, conn);
    let sql = format!(
        "SELECT * FROM {} WHERE data_state = ?1",
        kind.table_name()
    );
    let mut stmt = conn.prepare(&sql)?;
    let entities = stmt
        .query_map(params![state.as_i32()], |row| dao.from_row(row))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entities)
}

/// 代理主键是否已被占用（随机主键生成时查重）
pub fn local_id_in_use(conn: &Connection, kind: EntityKind, id: i64) -> Result<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)",
        kind.table_name()
    );
    let in_use: bool = conn.query_row(&sql, params![id], |row| row.get(0))?;
    Ok(in_use)
}
