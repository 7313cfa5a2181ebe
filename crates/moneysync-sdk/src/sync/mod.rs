//! 同步模块 - 暂存、批量提交与负载归约

pub mod commit;
pub mod parsers;
pub mod payload;
pub mod pending;

pub use commit::{BatchCommitEngine, BatchFailure, CommitReport};
pub use payload::{SyncPayload, SyncPayloadReducer, SyncRecords};
pub use pending::{PendingChangeSet, PendingSnapshot};
