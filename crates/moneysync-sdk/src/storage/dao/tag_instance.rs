//! 标签实例数据访问层 - 标签与交易的关联记录

use super::{base_from_row, delete_by_base, kind_mismatch, KindDao};
use crate::error::Result;
use crate::storage::entities::{Entity, EntityKind, TagInstance};
use rusqlite::{params, Connection, Row};

pub struct TagInstanceDao<'a> {
    conn: &'a Connection,
}

impl<'a> TagInstanceDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_instance(row: &Row<'_>) -> rusqlite::Result<TagInstance> {
        Ok(TagInstance {
            base: base_from_row(row)?,
            tag_external_id: row.get("tag_external_id")?,
            transaction_external_id: row.get("transaction_external_id")?,
        })
    }
}

impl KindDao for TagInstanceDao<'_> {
    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<Entity> {
        Ok(Entity::TagInstance(Self::row_to_instance(row)?))
    }

    fn insert(&self, entity: &Entity) -> Result<i64> {
        let Entity::TagInstance(instance) = entity else {
            return Err(kind_mismatch(EntityKind::TagInstance, entity));
        };
        self.conn.execute(
            "INSERT INTO tag_instance (external_id, data_state, is_deleted, created_at, \
             updated_at, tag_external_id, transaction_external_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                instance.base.external_id,
                instance.base.data_state.as_i32(),
                instance.base.is_deleted,
                instance.base.created_at,
                instance.base.updated_at,
                instance.tag_external_id,
                instance.transaction_external_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, entity: &Entity) -> Result<()> {
        let Entity::TagInstance(instance) = entity else {
            return Err(kind_mismatch(EntityKind::TagInstance, entity));
        };
        self.conn.execute(
            "UPDATE tag_instance SET data_state = ?1, is_deleted = ?2, updated_at = ?3, \
             tag_external_id = ?4, transaction_external_id = ?5 WHERE external_id = ?6",
            params![
                instance.base.data_state.as_i32(),
                instance.base.is_deleted,
                instance.base.updated_at,
                instance.tag_external_id,
                instance.transaction_external_id,
                instance.base.external_id,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, entity: &Entity) -> Result<()> {
        delete_by_base(self.conn, "tag_instance", entity)
    }
}
