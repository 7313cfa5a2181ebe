//! 同步负载处理 - 线路格式与归约器
//!
//! 负载结构：`records` 下按操作分组（deleted / created / updated），
//! 组内按实体类型名映射到原始记录数组。操作按固定顺序处理
//! （先删除、再新建、最后更新），类型按 `PAYLOAD_ORDER` 遍历，
//! 全部暂存后恰好提交一次。

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::error::Result;
use crate::storage::entities::PAYLOAD_ORDER;
use crate::sync::commit::{BatchCommitEngine, CommitReport};
use crate::sync::parsers::{parse_and_stage, StageContext};

/// 类型名 -> 原始记录数组
pub type RecordGroup = HashMap<String, Vec<Value>>;

/// 同步负载顶层结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncPayload {
    #[serde(default)]
    pub records: SyncRecords,
}

/// 按操作分组的记录集合
///
/// 线路兼容：`"inserted"` 是 `"created"` 的别名。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncRecords {
    #[serde(default)]
    pub deleted: RecordGroup,
    #[serde(default, alias = "inserted")]
    pub created: RecordGroup,
    #[serde(default)]
    pub updated: RecordGroup,
}

impl SyncPayload {
    /// 从 JSON 文本解析
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// 负载内的记录总数
    pub fn record_count(&self) -> usize {
        [
            &self.records.deleted,
            &self.records.created,
            &self.records.updated,
        ]
        .iter()
        .flat_map(|group| group.values())
        .map(Vec::len)
        .sum()
    }
}

/// 同步负载归约器
pub struct SyncPayloadReducer {
    engine: Arc<BatchCommitEngine>,
}

impl SyncPayloadReducer {
    pub fn new(engine: Arc<BatchCommitEngine>) -> Self {
        Self { engine }
    }

    /// 把一个负载整体归约进本地库
    ///
    /// 单条记录解析失败记日志后跳过，不影响兄弟记录；
    /// 全部暂存完成后提交一次并返回提交报告。
    pub fn process_sync_payload(&self, payload: &SyncPayload) -> Result<CommitReport> {
        info!("处理同步负载: {} 条记录", payload.record_count());

        let ctx = StageContext {
            store: self.engine.store().as_ref(),
            pending: self.engine.pending().as_ref(),
        };

        let groups: [(&RecordGroup, bool); 3] = [
            (&payload.records.deleted, true),
            (&payload.records.created, false),
            (&payload.records.updated, false),
        ];

        for (group, deleted) in groups {
            for kind in PAYLOAD_ORDER {
                let Some(records) = group.get(kind.as_str()) else {
                    continue;
                };
                for record in records {
                    if let Err(e) = parse_and_stage(&ctx, kind, record, deleted) {
                        error!("解析同步记录失败，跳过: {} - {}", kind, e);
                    }
                }
            }
        }

        self.engine.commit()
    }
}
