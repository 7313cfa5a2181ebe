//! MoneySync SDK - 移动端财务数据本地存储与同步层
//!
//! 本 SDK 提供了客户端与远端财务数据服务之间的数据层，包括：
//! - 📦 内存暂存区：按实体类型分桶的插入/更新/删除变更集
//! - 🧾 批量提交引擎：固定提交顺序、单批单事务、失败隔离
//! - 🔄 同步负载归约：远端 JSON 负载解析、去重、落库
//! - ⚙️ 事件系统：提交完成广播与监听器回调
//! - 🗄️ 存储管理：SQLite 主库（WAL）+ sled 偏好库
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use moneysync_sdk::events::EventManager;
//! use moneysync_sdk::storage::StorageManager;
//! use moneysync_sdk::sync::{BatchCommitEngine, SyncPayload, SyncPayloadReducer};
//!
//! fn main() -> moneysync_sdk::Result<()> {
//!     let store = Arc::new(StorageManager::open(Path::new("/path/to/data"))?);
//!     let events = Arc::new(EventManager::new(100));
//!     let engine = Arc::new(BatchCommitEngine::new(store.clone(), events.clone()));
//!
//!     // 订阅数据变更
//!     events.add_listener("database_saved", |event| {
//!         println!("数据已保存，是否有变更: {}", event.did_change());
//!     });
//!
//!     // 归约一个远端同步负载
//!     let payload = SyncPayload::from_json(r#"{ "records": {} }"#)?;
//!     let reducer = SyncPayloadReducer::new(engine.clone());
//!     let report = reducer.process_sync_payload(&payload)?;
//!     println!("变更类型: {:?}", report.changed);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod events;
pub mod storage;
pub mod sync;
pub mod utils;

pub use error::{MoneySyncSDKError, Result};
pub use events::{EventManager, SDKEvent};
pub use storage::{
    shared, BusinessObjectBase, DataState, Entity, EntityKind, EntityStore, Preferences,
    SharedEntity, StorageManager, TxType, COMMIT_ORDER, PAYLOAD_ORDER,
};
pub use sync::{
    BatchCommitEngine, BatchFailure, CommitReport, PendingChangeSet, SyncPayload,
    SyncPayloadReducer,
};
