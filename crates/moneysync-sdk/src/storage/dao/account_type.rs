//! 账户类型数据访问层

use super::{base_from_row, delete_by_base, kind_mismatch, KindDao};
use crate::error::Result;
use crate::storage::entities::{AccountType, Entity, EntityKind};
use rusqlite::{params, Connection, Row};

pub struct AccountTypeDao<'a> {
    conn: &'a Connection,
}

impl<'a> AccountTypeDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_account_type(row: &Row<'_>) -> rusqlite::Result<AccountType> {
        Ok(AccountType {
            base: base_from_row(row)?,
            name: row.get("name")?,
            group_external_id: row.get("group_external_id")?,
        })
    }
}

impl KindDao for AccountTypeDao<'_> {
    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<Entity> {
        Ok(Entity::AccountType(Self::row_to_account_type(row)?))
    }

    fn insert(&self, entity: &Entity) -> Result<i64> {
        let Entity::AccountType(account_type) = entity else {
            return Err(kind_mismatch(EntityKind::AccountType, entity));
        };
        self.conn.execute(
            "INSERT INTO account_type (external_id, data_state, is_deleted, created_at, \
             updated_at, name, group_external_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                account_type.base.external_id,
                account_type.base.data_state.as_i32(),
                account_type.base.is_deleted,
                account_type.base.created_at,
                account_type.base.updated_at,
                account_type.name,
                account_type.group_external_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, entity: &Entity) -> Result<()> {
        let Entity::AccountType(account_type) = entity else {
            return Err(kind_mismatch(EntityKind::AccountType, entity));
        };
        self.conn.execute(
            "UPDATE account_type SET data_state = ?1, is_deleted = ?2, updated_at = ?3, \
             name = ?4, group_external_id = ?5 WHERE external_id = ?6",
            params![
                account_type.base.data_state.as_i32(),
                account_type.base.is_deleted,
                account_type.base.updated_at,
                account_type.name,
                account_type.group_external_id,
                account_type.base.external_id,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, entity: &Entity) -> Result<()> {
        delete_by_base(self.conn, "account_type", entity)
    }
}
