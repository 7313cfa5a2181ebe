//! 数据库表结构 - 会话打开时执行
//!
//! 每类实体一张表，公共列与 `BusinessObjectBase` 对应；
//! 外键引用列存外部 ID（guid），与同步线路一致。

use crate::error::{MoneySyncSDKError, Result};
use rusqlite::Connection;

/// 公共列片段
const BASE_COLUMNS: &str = "\
    id INTEGER PRIMARY KEY,\n\
    external_id TEXT NOT NULL UNIQUE,\n\
    data_state INTEGER NOT NULL DEFAULT 0,\n\
    is_deleted INTEGER NOT NULL DEFAULT 0,\n\
    created_at INTEGER NOT NULL,\n\
    updated_at INTEGER NOT NULL";

/// 初始化连接：WAL + 建表
pub fn initialize(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(|e| MoneySyncSDKError::Database(format!("设置 WAL 模式失败: {}", e)))?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .map_err(|e| MoneySyncSDKError::Database(format!("设置同步模式失败: {}", e)))?;

    create_tables(conn)
}

pub fn create_tables(conn: &Connection) -> Result<()> {
    let tables: [(&str, &str); 14] = [
        ("account_type", "name TEXT NOT NULL, group_external_id TEXT"),
        ("account_type_group", "name TEXT NOT NULL"),
        (
            "bank",
            "name TEXT NOT NULL, institution_external_id TEXT, status INTEGER NOT NULL DEFAULT 0, \
             last_refreshed_at INTEGER",
        ),
        (
            "bank_account",
            "name TEXT NOT NULL, account_number TEXT NOT NULL DEFAULT '', \
             balance REAL NOT NULL DEFAULT 0, bank_external_id TEXT NOT NULL, \
             account_type_external_id TEXT",
        ),
        (
            "bank_account_balance",
            "bank_account_external_id TEXT NOT NULL, balance REAL NOT NULL DEFAULT 0, \
             date INTEGER NOT NULL DEFAULT 0",
        ),
        (
            "budget_item",
            "category_external_id TEXT NOT NULL, amount REAL NOT NULL DEFAULT 0, \
             period_date INTEGER NOT NULL DEFAULT 0",
        ),
        (
            "category",
            "name TEXT NOT NULL, parent_external_id TEXT, category_type_external_id TEXT",
        ),
        ("category_type", "name TEXT NOT NULL"),
        ("institution", "name TEXT NOT NULL, status INTEGER NOT NULL DEFAULT 0"),
        (
            "location",
            "latitude REAL NOT NULL DEFAULT 0, longitude REAL NOT NULL DEFAULT 0, address TEXT",
        ),
        ("tag", "name TEXT NOT NULL"),
        (
            "tag_instance",
            "tag_external_id TEXT NOT NULL, transaction_external_id TEXT NOT NULL",
        ),
        (
            "transactions",
            "description TEXT NOT NULL DEFAULT '', normalized_description TEXT NOT NULL DEFAULT '', \
             amount REAL NOT NULL DEFAULT 0, date INTEGER NOT NULL DEFAULT 0, \
             category_external_id TEXT, bank_account_external_id TEXT NOT NULL, \
             is_processed INTEGER NOT NULL DEFAULT 0",
        ),
        ("business_object_base", ""),
    ];

    for (table, extra) in tables {
        let sql = if extra.is_empty() {
            format!("CREATE TABLE IF NOT EXISTS {} ({})", table, BASE_COLUMNS)
        } else {
            format!(
                "CREATE TABLE IF NOT EXISTS {} ({},\n    {})",
                table, BASE_COLUMNS, extra
            )
        };
        conn.execute(&sql, [])
            .map_err(|e| MoneySyncSDKError::Database(format!("建表 {} 失败: {}", table, e)))?;
    }

    // 常用查询路径的索引
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_account \
         ON transactions(bank_account_external_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_bank_account_bank ON bank_account(bank_external_id)",
        [],
    )?;

    Ok(())
}

/// 删除全部表（本地数据重置用）
pub fn drop_tables(conn: &Connection) -> Result<()> {
    for kind in crate::storage::entities::COMMIT_ORDER {
        conn.execute(&format!("DROP TABLE IF EXISTS {}", kind.table_name()), [])
            .map_err(|e| {
                MoneySyncSDKError::Database(format!("删表 {} 失败: {}", kind.table_name(), e))
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 14);
    }

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
    }
}
