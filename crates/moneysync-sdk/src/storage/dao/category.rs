//! 分类数据访问层

use super::{base_from_row, delete_by_base, kind_mismatch, KindDao};
use crate::error::Result;
use crate::storage::entities::{Category, Entity, EntityKind};
use rusqlite::{params, Connection, Row};

pub struct CategoryDao<'a> {
    conn: &'a Connection,
}

impl<'a> CategoryDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_category(row: &Row<'_>) -> rusqlite::Result<Category> {
        Ok(Category {
            base: base_from_row(row)?,
            name: row.get("name")?,
            parent_external_id: row.get("parent_external_id")?,
            category_type_external_id: row.get("category_type_external_id")?,
        })
    }
}

impl KindDao for CategoryDao<'_> {
    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<Entity> {
        Ok(Entity::Category(Self::row_to_category(row)?))
    }

    fn insert(&self, entity: &Entity) -> Result<i64> {
        let Entity::Category(category) = entity else {
            return Err(kind_mismatch(EntityKind::Category, entity));
        };
        self.conn.execute(
            "INSERT INTO category (external_id, data_state, is_deleted, created_at, updated_at, \
             name, parent_external_id, category_type_external_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                category.base.external_id,
                category.base.data_state.as_i32(),
                category.base.is_deleted,
                category.base.created_at,
                category.base.updated_at,
                category.name,
                category.parent_external_id,
                category.category_type_external_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, entity: &Entity) -> Result<()> {
        let Entity::Category(category) = entity else {
            return Err(kind_mismatch(EntityKind::Category, entity));
        };
        self.conn.execute(
            "UPDATE category SET data_state = ?1, is_deleted = ?2, updated_at = ?3, name = ?4, \
             parent_external_id = ?5, category_type_external_id = ?6 WHERE external_id = ?7",
            params![
                category.base.data_state.as_i32(),
                category.base.is_deleted,
                category.base.updated_at,
                category.name,
                category.parent_external_id,
                category.category_type_external_id,
                category.base.external_id,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, entity: &Entity) -> Result<()> {
        delete_by_base(self.conn, "category", entity)
    }
}
