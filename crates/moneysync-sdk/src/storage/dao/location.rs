//! 地理位置数据访问层

use super::{base_from_row, delete_by_base, kind_mismatch, KindDao};
use crate::error::Result;
use crate::storage::entities::{Entity, EntityKind, Location};
use rusqlite::{params, Connection, Row};

pub struct LocationDao<'a> {
    conn: &'a Connection,
}

impl<'a> LocationDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_location(row: &Row<'_>) -> rusqlite::Result<Location> {
        Ok(Location {
            base: base_from_row(row)?,
            latitude: row.get("latitude")?,
            longitude: row.get("longitude")?,
            address: row.get("address")?,
        })
    }
}

impl KindDao for LocationDao<'_> {
    fn from_row(&self, row: &Row<'_>) -> rusqlite::Result<Entity> {
        Ok(Entity::Location(Self::row_to_location(row)?))
    }

    fn insert(&self, entity: &Entity) -> Result<i64> {
        let Entity::Location(location) = entity else {
            return Err(kind_mismatch(EntityKind::Location, entity));
        };
        self.conn.execute(
            "INSERT INTO location (external_id, data_state, is_deleted, created_at, \
             updated_at, latitude, longitude, address) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                location.base.external_id,
                location.base.data_state.as_i32(),
                location.base.is_deleted,
                location.base.created_at,
                location.base.updated_at,
                location.latitude,
                location.longitude,
                location.address,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, entity: &Entity) -> Result<()> {
        let Entity::Location(location) = entity else {
            return Err(kind_mismatch(EntityKind::Location, entity));
        };
        self.conn.execute(
            "UPDATE location SET data_state = ?1, is_deleted = ?2, updated_at = ?3, \
             latitude = ?4, longitude = ?5, address = ?6 WHERE external_id = ?7",
            params![
                location.base.data_state.as_i32(),
                location.base.is_deleted,
                location.base.updated_at,
                location.latitude,
                location.longitude,
                location.address,
                location.base.external_id,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, entity: &Entity) -> Result<()> {
        delete_by_base(self.conn, "location", entity)
    }
}
