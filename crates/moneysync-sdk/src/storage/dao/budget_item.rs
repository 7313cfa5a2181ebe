//! 预算项数据访问层

use super::{base_from_row, delete_by_base, kind_mismatch, KindDao};
use crate::error::Result;
use crate::storage::entities::{BudgetItem, Entity, EntityKind};
use rusqlite::{params, Connection, Row};

pub struct BudgetItemDao<'a> {
    conn: &'a Connection,
}

impl<'a> BudgetItemDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_item(row: &Row<'_>) -> rusqlite::Result<BudgetItem> {
        Ok(BudgetItem {
            base: base_from_row(row)?,
            category_external_id: row.get("category_external_id")?,
            amount: row.get("amount")?,
            period_date: row.get("period_date")?,
        })
    }
}

impl KindDao for BudgetItemDao<'_> {
    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<Entity> {
        Ok(Entity::BudgetItem(Self::row_to_item(row)?))
    }

    fn insert(&self, entity: &Entity) -> Result<i64> {
        let Entity::BudgetItem(item) = entity else {
            return Err(kind_mismatch(EntityKind::BudgetItem, entity));
        };
        self.conn.execute(
            "INSERT INTO budget_item (external_id, data_state, is_deleted, created_at, \
             updated_at, category_external_id, amount, period_date) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                item.base.external_id,
                item.base.data_state.as_i32(),
                item.base.is_deleted,
                item.base.created_at,
                item.base.updated_at,
                item.category_external_id,
                item.amount,
                item.period_date,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, entity: &Entity) -> Result<()> {
        let Entity::BudgetItem(item) = entity else {
            return Err(kind_mismatch(EntityKind::BudgetItem, entity));
        };
        self.conn.execute(
            "UPDATE budget_item SET data_state = ?1, is_deleted = ?2, updated_at = ?3, \
             category_external_id = ?4, amount = ?5, period_date = ?6 WHERE external_id = ?7",
            params![
                item.base.data_state.as_i32(),
                item.base.is_deleted,
                item.base.updated_at,
                item.category_external_id,
                item.amount,
                item.period_date,
                item.base.external_id,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, entity: &Entity) -> Result<()> {
        delete_by_base(self.conn, "budget_item", entity)
    }
}
