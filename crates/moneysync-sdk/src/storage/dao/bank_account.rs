//! 银行账户数据访问层
//!
//! `bank_external_id` 引用所属银行的外部 ID，提交顺序保证银行先落库。

use super::{base_from_row, delete_by_base, kind_mismatch, KindDao};
use crate::error::Result;
use crate::storage::entities::{BankAccount, Entity, EntityKind};
use rusqlite::{params, Connection, Row};

pub struct BankAccountDao<'a> {
    conn: &'a Connection,
}

impl<'a> BankAccountDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_account(row: &Row<'_>) -> rusqlite::Result<BankAccount> {
        Ok(BankAccount {
            base: base_from_row(row)?,
            name: row.get("name")?,
            account_number: row.get("account_number")?,
            balance: row.get("balance")?,
            bank_external_id: row.get("bank_external_id")?,
            account_type_external_id: row.get("account_type_external_id")?,
        })
    }
}

impl KindDao for BankAccountDao<'_> {
    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<Entity> {
        Ok(Entity::BankAccount(Self::row_to_account(row)?))
    }

    fn insert(&self, entity: &Entity) -> Result<i64> {
        let Entity::BankAccount(account) = entity else {
            return Err(kind_mismatch(EntityKind::BankAccount, entity));
        };
        self.conn.execute(
            "INSERT INTO bank_account (external_id, data_state, is_deleted, created_at, \
             updated_at, name, account_number, balance, bank_external_id, \
             account_type_external_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                account.base.external_id,
                account.base.data_state.as_i32(),
                account.base.is_deleted,
                account.base.created_at,
                account.base.updated_at,
                account.name,
                account.account_number,
                account.balance,
                account.bank_external_id,
                account.account_type_external_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, entity: &Entity) -> Result<()> {
        let Entity::BankAccount(account) = entity else {
            return Err(kind_mismatch(EntityKind::BankAccount, entity));
        };
        self.conn.execute(
            "UPDATE bank_account SET data_state = ?1, is_deleted = ?2, updated_at = ?3, \
             name = ?4, account_number = ?5, balance = ?6, bank_external_id = ?7, \
             account_type_external_id = ?8 WHERE external_id = ?9",
            params![
                account.base.data_state.as_i32(),
                account.base.is_deleted,
                account.base.updated_at,
                account.name,
                account.account_number,
                account.balance,
                account.bank_external_id,
                account.account_type_external_id,
                account.base.external_id,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, entity: &Entity) -> Result<()> {
        delete_by_base(self.conn, "bank_account", entity)
    }
}
