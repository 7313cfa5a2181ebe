//! 业务对象基础数据访问层 - 兜底类型，仅有公共列

use super::{base_from_row, delete_by_base, kind_mismatch, KindDao};
use crate::error::Result;
use crate::storage::entities::{Entity, EntityKind};
use rusqlite::{params, Connection, Row};

pub struct BusinessObjectBaseDao<'a> {
    conn: &'a Connection,
}

impl<'a> BusinessObjectBaseDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl KindDao for BusinessObjectBaseDao<'_> {
    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<Entity> {
        Ok(Entity::Base(base_from_row(row)?))
    }

    fn insert(&self, entity: &Entity) -> Result<i64> {
        let Entity::Base(base) = entity else {
            return Err(kind_mismatch(EntityKind::Base, entity));
        };
        self.conn.execute(
            "INSERT INTO business_object_base (external_id, data_state, is_deleted, created_at, \
             updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                base.external_id,
                base.data_state.as_i32(),
                base.is_deleted,
                base.created_at,
                base.updated_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, entity: &Entity) -> Result<()> {
        let Entity::Base(base) = entity else {
            return Err(kind_mismatch(EntityKind::Base, entity));
        };
        self.conn.execute(
            "UPDATE business_object_base SET data_state = ?1, is_deleted = ?2, updated_at = ?3 \
             WHERE external_id = ?4",
            params![
                base.data_state.as_i32(),
                base.is_deleted,
                base.updated_at,
                base.external_id,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, entity: &Entity) -> Result<()> {
        delete_by_base(self.conn, "business_object_base", entity)
    }
}
