//! 存储管理模块 - SQLite 主库 + sled 偏好库
//!
//! 本模块提供：
//! - 数据库会话的打开、关闭与重建
//! - 按实体类型路由的批量写入（单批单事务）
//! - 外部 ID 点查、数据状态过滤等通用查询
//! - 本地数据重置

pub mod dao;
pub mod entities;
pub mod kv;
pub mod schema;

pub use entities::{
    shared, BusinessObjectBase, DataState, Entity, EntityKind, SharedEntity, TxType,
    COMMIT_ORDER, PAYLOAD_ORDER,
};
pub use kv::Preferences;

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection};

use crate::error::{MoneySyncSDKError, Result};

/// 提交引擎依赖的存储接口
///
/// 拆出接口是为了让提交顺序、失败隔离这类行为可以脱离真实
/// SQLite 会话验证。
pub trait EntityStore: Send + Sync {
    /// 会话是否可写，不可写时提交应整体中止
    fn ensure_ready(&self) -> Result<()>;

    /// 同类同操作一批实体在单个事务内落库
    fn apply_batch(&self, kind: EntityKind, tx_type: TxType, entities: &[SharedEntity])
        -> Result<()>;

    /// 重建数据库会话（物理删除发生后调用，丢弃连接层缓存）
    fn begin_new_session(&self) -> Result<()>;

    /// 按外部 ID 点查
    fn find_by_external_id(&self, kind: EntityKind, external_id: &str) -> Result<Option<Entity>>;

    /// 代理主键是否已被占用
    fn local_id_in_use(&self, kind: EntityKind, id: i64) -> Result<bool>;
}

/// 存储管理器
///
/// 持有 SQLite 连接与偏好库。连接包在 `Mutex<Option<_>>` 里，
/// `None` 表示会话已关闭，所有操作返回 `NotInitialized`。
pub struct StorageManager {
    base_path: PathBuf,
    db_path: PathBuf,
    conn: Mutex<Option<Connection>>,
    prefs: Preferences,
}

impl StorageManager {
    /// 打开（或创建）指定目录下的存储
    pub fn open(base_path: &Path) -> Result<Self> {
        std::fs::create_dir_all(base_path)
            .map_err(|e| MoneySyncSDKError::IO(format!("创建存储目录失败: {}", e)))?;

        let db_path = base_path.join("moneysync.db");
        let conn = Connection::open(&db_path)
            .map_err(|e| MoneySyncSDKError::Database(format!("打开数据库失败: {}", e)))?;
        schema::initialize(&conn)?;

        let prefs = Preferences::open(base_path)?;

        tracing::info!("存储初始化完成: {:?}", db_path);

        Ok(Self {
            base_path: base_path.to_path_buf(),
            db_path,
            conn: Mutex::new(Some(conn)),
            prefs,
        })
    }

    /// 存储根目录
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// 偏好库
    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    /// 关闭会话，之后的操作返回 `NotInitialized`
    pub fn close(&self) {
        let mut guard = self.conn.lock();
        *guard = None;
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.conn.lock();
        let conn = guard
            .as_ref()
            .ok_or_else(|| MoneySyncSDKError::NotInitialized("数据库会话已关闭".to_string()))?;
        f(conn)
    }

    /// 按代理主键点查
    pub fn find_by_id(&self, kind: EntityKind, id: i64) -> Result<Option<Entity>> {
        self.with_conn(|conn| dao::find_by_id(conn, kind, id))
    }

    /// 全表加载
    pub fn load_all(&self, kind: EntityKind) -> Result<Vec<Entity>> {
        self.with_conn(|conn| dao::load_all(conn, kind))
    }

    /// 按数据处理状态过滤
    pub fn query_by_data_state(&self, kind: EntityKind, state: DataState) -> Result<Vec<Entity>> {
        self.with_conn(|conn| dao::query_by_data_state(conn, kind, state))
    }

    /// 清空某类实体的全部本地数据
    ///
    /// 先把所有行置为挂起态再删除，两步在同一事务内，
    /// 保证中途失败不会留下半清空的表。
    pub fn delete_data(&self, kind: EntityKind) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| MoneySyncSDKError::Database(format!("开始事务失败: {}", e)))?;
            tx.execute(
                &format!("UPDATE {} SET data_state = ?1", kind.table_name()),
                params![DataState::Suspended.as_i32()],
            )?;
            tx.execute(&format!("DELETE FROM {}", kind.table_name()), [])?;
            tx.commit()
                .map_err(|e| MoneySyncSDKError::Database(format!("提交事务失败: {}", e)))?;
            tracing::info!("已清空本地数据: {}", kind);
            Ok(())
        })
    }

    /// 删表重建，保留偏好
    pub fn reset_database(&self) -> Result<()> {
        self.with_conn(|conn| {
            schema::drop_tables(conn)?;
            schema::create_tables(conn)
        })
    }

    /// 账号登出：清空偏好并重建数据库
    pub fn delete_all_local_data(&self) -> Result<()> {
        self.prefs.clear()?;
        self.reset_database()
    }
}

impl EntityStore for StorageManager {
    fn ensure_ready(&self) -> Result<()> {
        self.with_conn(|_| Ok(()))
    }

    fn apply_batch(
        &self,
        kind: EntityKind,
        tx_type: TxType,
        entities: &[SharedEntity],
    ) -> Result<()> {
        self.with_conn(|conn| dao::apply_batch(conn, kind, tx_type, entities))
    }

    fn begin_new_session(&self) -> Result<()> {
        let mut guard = self.conn.lock();
        if guard.is_none() {
            return Err(MoneySyncSDKError::NotInitialized(
                "数据库会话已关闭".to_string(),
            ));
        }
        // 先放下旧连接再打开新连接，避免 WAL 下的写锁冲突
        *guard = None;
        let conn = Connection::open(&self.db_path)
            .map_err(|e| MoneySyncSDKError::Database(format!("重建数据库会话失败: {}", e)))?;
        schema::initialize(&conn)?;
        *guard = Some(conn);
        tracing::debug!("数据库会话已重建");
        Ok(())
    }

    fn find_by_external_id(&self, kind: EntityKind, external_id: &str) -> Result<Option<Entity>> {
        self.with_conn(|conn| dao::find_by_external_id(conn, kind, external_id))
    }

    fn local_id_in_use(&self, kind: EntityKind, id: i64) -> Result<bool> {
        self.with_conn(|conn| dao::local_id_in_use(conn, kind, id))
    }
}
