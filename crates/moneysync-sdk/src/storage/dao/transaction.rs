//! 交易数据访问层
//!
//! 表名为 transactions（transaction 是 SQLite 关键字）。

use super::{base_from_row, delete_by_base, kind_mismatch, KindDao};
use crate::error::Result;
use crate::storage::entities::{Entity, EntityKind, Transaction};
use rusqlite::{params, Connection, Row};

pub struct TransactionDao<'a> {
    conn: &'a Connection,
}

impl<'a> TransactionDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
        Ok(Transaction {
            base: base_from_row(row)?,
            description: row.get("description")?,
            normalized_description: row.get("normalized_description")?,
            amount: row.get("amount")?,
            date: row.get("date")?,
            category_external_id: row.get("category_external_id")?,
            bank_account_external_id: row.get("bank_account_external_id")?,
            is_processed: row.get("is_processed")?,
        })
    }
}

impl KindDao for TransactionDao<'_> {
    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<Entity> {
        Ok(Entity::Transaction(Self::row_to_transaction(row)?))
    }

    fn insert(&self, entity: &Entity) -> Result<i64> {
        let Entity::Transaction(tx) = entity else {
            return Err(kind_mismatch(EntityKind::Transaction, entity));
        };
        self.conn.execute(
            "INSERT INTO transactions (external_id, data_state, is_deleted, created_at, \
             updated_at, description, normalized_description, amount, date, \
             category_external_id, bank_account_external_id, is_processed) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                tx.base.external_id,
                tx.base.data_state.as_i32(),
                tx.base.is_deleted,
                tx.base.created_at,
                tx.base.updated_at,
                tx.description,
                tx.normalized_description,
                tx.amount,
                tx.date,
                tx.category_external_id,
                tx.bank_account_external_id,
                tx.is_processed,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, entity: &Entity) -> Result<()> {
        let Entity::Transaction(tx) = entity else {
            return Err(kind_mismatch(EntityKind::Transaction, entity));
        };
        self.conn.execute(
            "UPDATE transactions SET data_state = ?1, is_deleted = ?2, updated_at = ?3, \
             description = ?4, normalized_description = ?5, amount = ?6, date = ?7, \
             category_external_id = ?8, bank_account_external_id = ?9, is_processed = ?10 \
             WHERE external_id = ?11",
            params![
                tx.base.data_state.as_i32(),
                tx.base.is_deleted,
                tx.base.updated_at,
                tx.description,
                tx.normalized_description,
                tx.amount,
                tx.date,
                tx.category_external_id,
                tx.bank_account_external_id,
                tx.is_processed,
                tx.base.external_id,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, entity: &Entity) -> Result<()> {
        delete_by_base(self.conn, "transactions", entity)
    }
}
