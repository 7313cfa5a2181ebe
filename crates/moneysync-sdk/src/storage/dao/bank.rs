//! 银行数据访问层 - 聚合端的银行连接记录

use super::{base_from_row, delete_by_base, kind_mismatch, KindDao};
use crate::error::Result;
use crate::storage::entities::{Bank, Entity, EntityKind};
use rusqlite::{params, Connection, Row};

pub struct BankDao<'a> {
    conn: &'a Connection,
}

impl<'a> BankDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_bank(row: &Row<'_>) -> rusqlite::Result<Bank> {
        Ok(Bank {
            base: base_from_row(row)?,
            name: row.get("name")?,
            institution_external_id: row.get("institution_external_id")?,
            status: row.get("status")?,
            last_refreshed_at: row.get("last_refreshed_at")?,
        })
    }
}

impl KindDao for BankDao<'_> {
    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<Entity> {
        Ok(Entity::Bank(Self::row_to_bank(row)?))
    }

    fn insert(&self, entity: &Entity) -> Result<i64> {
        let Entity::Bank(bank) = entity else {
            return Err(kind_mismatch(EntityKind::Bank, entity));
        };
        self.conn.execute(
            "INSERT INTO bank (external_id, data_state, is_deleted, created_at, updated_at, \
             name, institution_external_id, status, last_refreshed_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                bank.base.external_id,
                bank.base.data_state.as_i32(),
                bank.base.is_deleted,
                bank.base.created_at,
                bank.base.updated_at,
                bank.name,
                bank.institution_external_id,
                bank.status,
                bank.last_refreshed_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, entity: &Entity) -> Result<()> {
        let Entity::Bank(bank) = entity else {
            return Err(kind_mismatch(EntityKind::Bank, entity));
        };
        self.conn.execute(
            "UPDATE bank SET data_state = ?1, is_deleted = ?2, updated_at = ?3, name = ?4, \
             institution_external_id = ?5, status = ?6, last_refreshed_at = ?7 \
             WHERE external_id = ?8",
            params![
                bank.base.data_state.as_i32(),
                bank.base.is_deleted,
                bank.base.updated_at,
                bank.name,
                bank.institution_external_id,
                bank.status,
                bank.last_refreshed_at,
                bank.base.external_id,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, entity: &Entity) -> Result<()> {
        delete_by_base(self.conn, "bank", entity)
    }
}
