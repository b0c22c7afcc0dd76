//! 题目存储 - 基础设施层
//!
//! 持有数据库连接，只暴露"整批写入"和"查询"能力。
//! 连接的打开和关闭由调用方负责，流水线只接收已连接的句柄。

use crate::error::{StorageError, StorageResult};
use crate::models::{Difficulty, PersistedQuestion, QuestionRecord, OPTION_COUNT};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// 题目查询条件
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    pub exam: Option<String>,
    pub year: Option<String>,
    pub topic: Option<String>,
}

/// 分页查询结果
#[derive(Debug, Clone)]
pub struct QuestionListing {
    /// 满足条件的总数
    pub total: usize,
    /// 当前页（按创建时间倒序）
    pub items: Vec<PersistedQuestion>,
}

/// 题目存储能力
pub trait QuestionStore: Send + Sync {
    /// 整批写入，任一记录失败则整批回滚
    ///
    /// 返回顺序与输入一致
    fn insert_many(&self, records: &[QuestionRecord]) -> StorageResult<Vec<PersistedQuestion>>;

    /// 分页查询，`page` 从 1 开始
    fn find(&self, filter: &QuestionFilter, page: usize, limit: usize) -> StorageResult<QuestionListing>;

    /// 统计满足条件的题目数量
    fn count(&self, filter: &QuestionFilter) -> StorageResult<usize>;
}

/// SQLite 题目存储
pub struct SqliteQuestionStore {
    conn: Mutex<Connection>,
    path: String,
}

impl SqliteQuestionStore {
    /// 打开（或创建）数据库文件
    pub fn connect<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let conn = Connection::open(&path)?;
        let store = Self {
            conn: Mutex::new(conn),
            path: path_str,
        };
        store.init()?;
        debug!("数据库已连接: {}", store.path);
        Ok(store)
    }

    /// 内存数据库
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
            path: ":memory:".to_string(),
        };
        store.init()?;
        Ok(store)
    }

    /// 关闭连接
    pub fn close(self) -> StorageResult<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| StorageError::LockPoisoned)?;
        conn.close().map_err(|(_, e)| StorageError::Database(e))?;
        debug!("数据库连接已关闭: {}", self.path);
        Ok(())
    }

    fn init(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS questions (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                exam TEXT NOT NULL,
                year TEXT NOT NULL,
                question TEXT NOT NULL CHECK (length(trim(question)) > 0),
                options TEXT NOT NULL CHECK (json_array_length(options) = 4),
                correct INTEGER NOT NULL CHECK (correct BETWEEN 0 AND 3),
                explanation TEXT NOT NULL DEFAULT '',
                difficulty TEXT NOT NULL DEFAULT 'medium'
                    CHECK (difficulty IN ('easy', 'medium', 'hard')),
                topic TEXT NOT NULL DEFAULT 'General',
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_questions_exam_year ON questions(exam, year);
            CREATE INDEX IF NOT EXISTS idx_questions_created_at ON questions(created_at);
            ",
        )?;
        Ok(())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

/// 存储层自身的格式约束，与流水线的校验互相独立
fn check_record(index: usize, record: &QuestionRecord) -> StorageResult<()> {
    if record.question_text.trim().is_empty() {
        return Err(StorageError::SchemaViolation {
            index,
            reason: "question text is required".to_string(),
        });
    }
    if record.options.len() != OPTION_COUNT {
        return Err(StorageError::SchemaViolation {
            index,
            reason: "Each question must have exactly 4 options".to_string(),
        });
    }
    if record.correct_index >= OPTION_COUNT {
        return Err(StorageError::SchemaViolation {
            index,
            reason: format!("correct index {} is outside [0, 3]", record.correct_index),
        });
    }
    if record.exam.is_empty() || record.year.is_empty() {
        return Err(StorageError::SchemaViolation {
            index,
            reason: "exam and year are required".to_string(),
        });
    }
    Ok(())
}

/// 拼接 WHERE 子句和参数
fn where_clause(filter: &QuestionFilter) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    for (column, value) in [
        ("exam", &filter.exam),
        ("year", &filter.year),
        ("topic", &filter.topic),
    ] {
        if let Some(value) = value {
            values.push(value.clone());
            conditions.push(format!("{} = ?{}", column, values.len()));
        }
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), values)
    }
}

/// 数据库中的一行
struct QuestionRow {
    id: String,
    created_at: DateTime<Utc>,
    exam: String,
    year: String,
    question: String,
    options: String,
    correct: i64,
    explanation: String,
    difficulty: String,
    topic: String,
}

impl QuestionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            created_at: row.get("created_at")?,
            exam: row.get("exam")?,
            year: row.get("year")?,
            question: row.get("question")?,
            options: row.get("options")?,
            correct: row.get("correct")?,
            explanation: row.get("explanation")?,
            difficulty: row.get("difficulty")?,
            topic: row.get("topic")?,
        })
    }

    fn into_persisted(self) -> StorageResult<PersistedQuestion> {
        Ok(PersistedQuestion {
            id: self.id,
            created_at: self.created_at,
            record: QuestionRecord {
                question_text: self.question,
                options: serde_json::from_str(&self.options)?,
                correct_index: self.correct as usize,
                explanation: self.explanation,
                difficulty: Difficulty::from_str(&self.difficulty).unwrap_or_default(),
                exam: self.exam,
                year: self.year,
                topic: self.topic,
            },
        })
    }
}

impl QuestionStore for SqliteQuestionStore {
    fn insert_many(&self, records: &[QuestionRecord]) -> StorageResult<Vec<PersistedQuestion>> {
        for (index, record) in records.iter().enumerate() {
            check_record(index, record)?;
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut persisted = Vec::with_capacity(records.len());

        {
            let mut stmt = tx.prepare(
                "INSERT INTO questions
                    (id, exam, year, question, options, correct, explanation, difficulty, topic, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;

            for record in records {
                let id = uuid::Uuid::new_v4().to_string();
                let created_at = Utc::now();
                let options = serde_json::to_string(&record.options)?;

                stmt.execute(params![
                    id,
                    record.exam,
                    record.year,
                    record.question_text,
                    options,
                    record.correct_index as i64,
                    record.explanation,
                    record.difficulty.as_str(),
                    record.topic,
                    created_at,
                ])?;

                persisted.push(PersistedQuestion {
                    id,
                    created_at,
                    record: record.clone(),
                });
            }
        }

        // 出错时 tx 被 drop，自动回滚
        tx.commit()?;
        debug!("已写入 {} 道题目", persisted.len());

        Ok(persisted)
    }

    fn find(&self, filter: &QuestionFilter, page: usize, limit: usize) -> StorageResult<QuestionListing> {
        let total = self.count(filter)?;
        let (clause, values) = where_clause(filter);
        let offset = page.saturating_sub(1) * limit;

        let sql = format!(
            "SELECT id, exam, year, question, options, correct, explanation, difficulty, topic, created_at
             FROM questions{} ORDER BY created_at DESC, seq DESC LIMIT {} OFFSET {}",
            clause, limit, offset
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(values.iter()), QuestionRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let items = rows
            .into_iter()
            .map(QuestionRow::into_persisted)
            .collect::<StorageResult<Vec<_>>>()?;

        Ok(QuestionListing { total, items })
    }

    fn count(&self, filter: &QuestionFilter) -> StorageResult<usize> {
        let (clause, values) = where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM questions{}", clause);

        let conn = self.lock()?;
        let total: i64 = conn.query_row(&sql, rusqlite::params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(total as usize)
    }
}
