//! 账户余额快照数据访问层

use super::{base_from_row, delete_by_base, kind_mismatch, KindDao};
use crate::error::Result;
use crate::storage::entities::{BankAccountBalance, Entity, EntityKind};
use rusqlite::{params, Connection, Row};

pub struct BankAccountBalanceDao<'a> {
    conn: &'a Connection,
}

impl<'a> BankAccountBalanceDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_balance(row: &Row<'_>) -> rusqlite::Result<BankAccountBalance> {
        Ok(BankAccountBalance {
            base: base_from_row(row)?,
            bank_account_external_id: row.get("bank_account_external_id")?,
            balance: row.get("balance")?,
            date: row.get("date")?,
        })
    }
}

impl KindDao for BankAccountBalanceDao<'_> {
    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<Entity> {
        Ok(Entity::BankAccountBalance(Self::row_to_balance(row)?))
    }

    fn insert(&self, entity: &Entity) -> Result<i64> {
        let Entity::BankAccountBalance(balance) = entity else {
            return Err(kind_mismatch(EntityKind::BankAccountBalance, entity));
        };
        self.conn.execute(
            "INSERT INTO bank_account_balance (external_id, data_state, is_deleted, created_at, \
             updated_at, bank_account_external_id, balance, date) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                balance.base.external_id,
                balance.base.data_state.as_i32(),
                balance.base.is_deleted,
                balance.base.created_at,
                balance.base.updated_at,
                balance.bank_account_external_id,
                balance.balance,
                balance.date,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, entity: &Entity) -> Result<()> {
        let Entity::BankAccountBalance(balance) = entity else {
            return Err(kind_mismatch(EntityKind::BankAccountBalance, entity));
        };
        self.conn.execute(
            "UPDATE bank_account_balance SET data_state = ?1, is_deleted = ?2, updated_at = ?3, \
             bank_account_external_id = ?4, balance = ?5, date = ?6 WHERE external_id = ?7",
            params![
                balance.base.data_state.as_i32(),
                balance.base.is_deleted,
                balance.base.updated_at,
                balance.bank_account_external_id,
                balance.balance,
                balance.date,
                balance.base.external_id,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, entity: &Entity) -> Result<()> {
        delete_by_base(self.conn, "bank_account_balance", entity)
    }
}
