//! 账户类型分组数据访问层

use super::{base_from_row, delete_by_base, kind_mismatch, KindDao};
use crate::error::Result;
use crate::storage::entities::{AccountTypeGroup, Entity, EntityKind};
use rusqlite::{params, Connection, Row};

pub struct AccountTypeGroupDao<'a> {
    conn: &'a Connection,
}

impl<'a> AccountTypeGroupDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_group(row: &Row<'_>) -> rusqlite::Result<AccountTypeGroup> {
        Ok(AccountTypeGroup {
            base: base_from_row(row)?,
            name: row.get("name")?,
        })
    }
}

impl KindDao for AccountTypeGroupDao<'_> {
    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<Entity> {
        Ok(Entity::AccountTypeGroup(Self::row_to_group(row)?))
    }

    fn insert(&self, entity: &Entity) -> Result<i64> {
        let Entity::AccountTypeGroup(group) = entity else {
            return Err(kind_mismatch(EntityKind::AccountTypeGroup, entity));
        };
        self.conn.execute(
            "INSERT INTO account_type_group (external_id, data_state, is_deleted, created_at, \
             updated_at, name) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                group.base.external_id,
                group.base.data_state.as_i32(),
                group.base.is_deleted,
                group.base.created_at,
                group.base.updated_at,
                group.name,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, entity: &Entity) -> Result<()> {
        let Entity::AccountTypeGroup(group) = entity else {
            return Err(kind_mismatch(EntityKind::AccountTypeGroup, entity));
        };
        self.conn.execute(
            "UPDATE account_type_group SET data_state = ?1, is_deleted = ?2, updated_at = ?3, \
             name = ?4 WHERE external_id = ?5",
            params![
                group.base.data_state.as_i32(),
                group.base.is_deleted,
                group.base.updated_at,
                group.name,
                group.base.external_id,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, entity: &Entity) -> Result<()> {
        delete_by_base(self.conn, "account_type_group", entity)
    }
}
