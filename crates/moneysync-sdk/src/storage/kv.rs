//! 偏好存储模块 - 基于 sled 的键值存储
//!
//! 保存同步游标等轻量状态（上次同步时间、上次机构刷新时间），
//! 与 SQLite 主库分离，重置主库时可选择性保留或一并清空。

use std::path::Path;

use sled::Db;

use crate::error::{MoneySyncSDKError, Result};

/// 常用键
pub mod keys {
    /// 上次全量同步完成时间（Unix 毫秒）
    pub const LAST_SYNC: &str = "last_sync";
    /// 上次机构数据刷新时间（Unix 毫秒）
    pub const LAST_INSTITUTION_SYNC: &str = "last_institution_sync";
}

/// 偏好存储组件
#[derive(Debug)]
pub struct Preferences {
    db: Db,
}

impl Preferences {
    /// 打开偏好库，目录不存在时由 sled 创建
    pub fn open(base_path: &Path) -> Result<Self> {
        let kv_path = base_path.join("prefs");
        let db = sled::open(&kv_path)
            .map_err(|e| MoneySyncSDKError::KvStore(format!("打开 sled 数据库失败: {}", e)))?;
        Ok(Self { db })
    }

    /// 写入整型值
    pub fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.db
            .insert(key, &value.to_be_bytes())
            .map_err(|e| MoneySyncSDKError::KvStore(format!("写入键值对失败: {}", e)))?;
        Ok(())
    }

    /// 读取整型值，不存在返回 None
    pub fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        let value = self
            .db
            .get(key)
            .map_err(|e| MoneySyncSDKError::KvStore(format!("读取键值对失败: {}", e)))?;
        match value {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_ref().try_into().map_err(|_| {
                    MoneySyncSDKError::KvStore(format!("键 {} 的值不是 8 字节整型", key))
                })?;
                Ok(Some(i64::from_be_bytes(raw)))
            }
            None => Ok(None),
        }
    }

    /// 删除单个键
    pub fn remove(&self, key: &str) -> Result<()> {
        self.db
            .remove(key)
            .map_err(|e| MoneySyncSDKError::KvStore(format!("删除键值对失败: {}", e)))?;
        Ok(())
    }

    /// 清空全部偏好（账号登出、本地数据重置时调用）
    pub fn clear(&self) -> Result<()> {
        self.db
            .clear()
            .map_err(|e| MoneySyncSDKError::KvStore(format!("清空偏好失败: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| MoneySyncSDKError::KvStore(format!("落盘失败: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let prefs = Preferences::open(temp_dir.path()).unwrap();

        prefs.set_i64(keys::LAST_SYNC, 1_700_000_000_000).unwrap();
        assert_eq!(
            prefs.get_i64(keys::LAST_SYNC).unwrap(),
            Some(1_700_000_000_000)
        );
        assert_eq!(prefs.get_i64(keys::LAST_INSTITUTION_SYNC).unwrap(), None);
    }

    #[test]
    fn test_remove_and_clear() {
        let temp_dir = TempDir::new().unwrap();
        let prefs = Preferences::open(temp_dir.path()).unwrap();

        prefs.set_i64(keys::LAST_SYNC, 1).unwrap();
        prefs.set_i64(keys::LAST_INSTITUTION_SYNC, 2).unwrap();

        prefs.remove(keys::LAST_SYNC).unwrap();
        assert_eq!(prefs.get_i64(keys::LAST_SYNC).unwrap(), None);
        assert_eq!(prefs.get_i64(keys::LAST_INSTITUTION_SYNC).unwrap(), Some(2));

        prefs.clear().unwrap();
        assert_eq!(prefs.get_i64(keys::LAST_INSTITUTION_SYNC).unwrap(), None);
    }
}
