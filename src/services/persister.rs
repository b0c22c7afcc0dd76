//! 批量入库服务 - 业务能力层
//!
//! 先校验整批，再一次性交给存储层写入；任何一条失败，整批都不会落库。

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ImportResult;
use crate::infrastructure::QuestionStore;
use crate::models::{PersistedQuestion, QuestionRecord};
use crate::services::normalizer;

/// 批量入库服务
pub struct BulkPersister {
    store: Arc<dyn QuestionStore>,
}

impl BulkPersister {
    pub fn new(store: Arc<dyn QuestionStore>) -> Self {
        Self { store }
    }

    /// 整批写入，返回带存储层 id 的记录（顺序与输入一致）
    ///
    /// 空批次不会访问存储层
    pub fn persist(&self, records: &[QuestionRecord]) -> ImportResult<Vec<PersistedQuestion>> {
        if records.is_empty() {
            debug!("空批次，跳过入库");
            return Ok(Vec::new());
        }

        if let Err(e) = normalizer::validate_batch(records) {
            warn!("⚠️ 批次校验失败，整批放弃入库: {}", e);
            return Err(e);
        }

        let persisted = self.store.insert_many(records)?;
        debug!("✓ 已入库 {} 道题目", persisted.len());
        Ok(persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImportError;
    use crate::infrastructure::{QuestionFilter, SqliteQuestionStore};
    use crate::models::{Metadata, QuestionDraft};

    fn record(text: &str, options: usize) -> QuestionRecord {
        QuestionRecord::from_draft(
            QuestionDraft {
                question_text: text.to_string(),
                options: (0..options).map(|n| format!("opt {}", n)).collect(),
                correct_index: 0,
                explanation: String::new(),
            },
            &Metadata::new("CV", "2023", None),
        )
    }

    #[test]
    fn test_batch_with_short_record_persists_nothing() {
        let store = Arc::new(SqliteQuestionStore::in_memory().unwrap());
        let persister = BulkPersister::new(store.clone());

        let err = persister
            .persist(&[record("a", 4), record("b", 3), record("c", 4)])
            .unwrap_err();

        assert!(matches!(err, ImportError::Validation { index: 1, .. }));
        assert_eq!(store.count(&QuestionFilter::default()).unwrap(), 0);
    }

    #[test]
    fn test_bare_question_number_fails_the_batch() {
        let store = Arc::new(SqliteQuestionStore::in_memory().unwrap());
        let persister = BulkPersister::new(store.clone());
        let parser = crate::services::QuestionParser::new().unwrap();
        let lines: Vec<String> = ["1. Real question", "A. yes", "12.", "A. x", "B. y"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let records = parser.parse(&lines, &Metadata::new("CV", "2023", None));
        assert_eq!(records[1].question_text, "");

        let err = persister.persist(&records).unwrap_err();

        assert!(matches!(err, ImportError::Validation { index: 1, .. }));
        assert_eq!(store.count(&QuestionFilter::default()).unwrap(), 0);
    }

    #[test]
    fn test_successful_batch_preserves_order() {
        let store = Arc::new(SqliteQuestionStore::in_memory().unwrap());
        let persister = BulkPersister::new(store.clone());

        let persisted = persister.persist(&[record("a", 4), record("b", 4)]).unwrap();

        let texts: Vec<_> = persisted.iter().map(|p| p.record.question_text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
        assert_eq!(store.count(&QuestionFilter::default()).unwrap(), 2);
    }

    #[test]
    fn test_empty_batch_is_a_no_op() {
        let store = Arc::new(SqliteQuestionStore::in_memory().unwrap());
        let persister = BulkPersister::new(store);

        assert!(persister.persist(&[]).unwrap().is_empty());
    }
}
