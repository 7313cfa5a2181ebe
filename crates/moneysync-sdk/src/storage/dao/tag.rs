//! 标签数据访问层

use super::{base_from_row, delete_by_base, kind_mismatch, KindDao};
use crate::error::Result;
use crate::storage::entities::{Entity, EntityKind, Tag};
use rusqlite::{params, Connection, Row};

pub struct TagDao<'a> {
    conn: &'a Connection,
}

impl<'a> TagDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_tag(row: &Row<'_>) -> rusqlite::Result<Tag> {
        Ok(Tag {
            base: base_from_row(row)?,
            name: row.get("name")?,
        })
    }
}

impl KindDao for TagDao<'_> {
    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<Entity> {
        Ok(Entity::Tag(Self::row_to_tag(row)?))
    }

    fn insert(&self, entity: &Entity) -> Result<i64> {
        let Entity::Tag(tag) = entity else {
            return Err(kind_mismatch(EntityKind::Tag, entity));
        };
        self.conn.execute(
            "INSERT INTO tag (external_id, data_state, is_deleted, created_at, updated_at, name) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                tag.base.external_id,
                tag.base.data_state.as_i32(),
                tag.base.is_deleted,
                tag.base.created_at,
                tag.base.updated_at,
                tag.name,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, entity: &Entity) -> Result<()> {
        let Entity::Tag(tag) = entity else {
            return Err(kind_mismatch(EntityKind::Tag, entity));
        };
        self.conn.execute(
            "UPDATE tag SET data_state = ?1, is_deleted = ?2, updated_at = ?3, name = ?4 \
             WHERE external_id = ?5",
            params![
                tag.base.data_state.as_i32(),
                tag.base.is_deleted,
                tag.base.updated_at,
                tag.name,
                tag.base.external_id,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, entity: &Entity) -> Result<()> {
        delete_by_base(self.conn, "tag", entity)
    }
}
