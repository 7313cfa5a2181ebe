//! 金融机构数据访问层

use super::{base_from_row, delete_by_base, kind_mismatch, KindDao};
use crate::error::Result;
use crate::storage::entities::{Entity, EntityKind, Institution};
use rusqlite::{params, Connection, Row};

pub struct InstitutionDao<'a> {
    conn: &'a Connection,
}

impl<'a> InstitutionDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_institution(row: &Row<'_>) -> rusqlite::Result<Institution> {
        Ok(Institution {
            base: base_from_row(row)?,
            name: row.get("name")?,
            status: row.get("status")?,
        })
    }
}

impl KindDao for InstitutionDao<'_> {
    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<Entity> {
        Ok(Entity::Institution(Self::row_to_institution(row)?))
    }

    fn insert(&self, entity: &Entity) -> Result<i64> {
        let Entity::Institution(institution) = entity else {
            return Err(kind_mismatch(EntityKind::Institution, entity));
        };
        self.conn.execute(
            "INSERT INTO institution (external_id, data_state, is_deleted, created_at, \
             updated_at, name, status) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                institution.base.external_id,
                institution.base.data_state.as_i32(),
                institution.base.is_deleted,
                institution.base.created_at,
                institution.base.updated_at,
                institution.name,
                institution.status,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, entity: &Entity) -> Result<()> {
        let Entity::Institution(institution) = entity else {
            return Err(kind_mismatch(EntityKind::Institution, entity));
        };
        self.conn.execute(
            "UPDATE institution SET data_state = ?1, is_deleted = ?2, updated_at = ?3, \
             name = ?4, status = ?5 WHERE external_id = ?6",
            params![
                institution.base.data_state.as_i32(),
                institution.base.is_deleted,
                institution.base.updated_at,
                institution.name,
                institution.status,
                institution.base.external_id,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, entity: &Entity) -> Result<()> {
        delete_by_base(self.conn, "institution", entity)
    }
}
