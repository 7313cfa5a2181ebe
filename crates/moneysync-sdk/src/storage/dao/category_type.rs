//! 分类类型数据访问层

use super::{base_from_row, delete_by_base, kind_mismatch, KindDao};
use crate::error::Result;
use crate::storage::entities::{CategoryType, Entity, EntityKind};
use rusqlite::{params, Connection, Row};

pub struct CategoryTypeDao<'a> {
    conn: &'a Connection,
}

impl<'a> CategoryTypeDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_category_type(row: &Row<'_>) -> rusqlite::Result<CategoryType> {
        Ok(CategoryType {
            base: base_from_row(row)?,
            name: row.get("name")?,
        })
    }
}

impl KindDao for CategoryTypeDao<'_> {
    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<Entity> {
        Ok(Entity::CategoryType(Self::row_to_category_type(row)?))
    }

    fn insert(&self, entity: &Entity) -> Result<i64> {
        let Entity::CategoryType(category_type) = entity else {
            return Err(kind_mismatch(EntityKind::CategoryType, entity));
        };
        self.conn.execute(
            "INSERT INTO category_type (external_id, data_state, is_deleted, created_at, \
             updated_at, name) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                category_type.base.external_id,
                category_type.base.data_state.as_i32(),
                category_type.base.is_deleted,
                category_type.base.created_at,
                category_type.base.updated_at,
                category_type.name,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, entity: &Entity) -> Result<()> {
        let Entity::CategoryType(category_type) = entity else {
            return Err(kind_mismatch(EntityKind::CategoryType, entity));
        };
        self.conn.execute(
            "UPDATE category_type SET data_state = ?1, is_deleted = ?2, updated_at = ?3, \
             name = ?4 WHERE external_id = ?5",
            params![
                category_type.base.data_state.as_i32(),
                category_type.base.is_deleted,
                category_type.base.updated_at,
                category_type.name,
                category_type.base.external_id,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, entity: &Entity) -> Result<()> {
        delete_by_base(self.conn, "category_type", entity)
    }
}
