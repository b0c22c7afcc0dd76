use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 每道题固定的选项数量
pub const OPTION_COUNT: usize = 4;

/// 未指定主题时的默认值
pub const DEFAULT_TOPIC: &str = "General";

/// 调用方提供的批次元数据，合并进该批次的每一道题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub exam: String,
    #[serde(deserialize_with = "deserialize_year")]
    pub year: String,
    #[serde(default = "default_topic")]
    pub topic: String,
}

impl Metadata {
    /// 创建元数据，`topic` 为空时使用 "General"
    pub fn new(exam: impl Into<String>, year: impl Into<String>, topic: Option<String>) -> Self {
        Self {
            exam: exam.into(),
            year: year.into(),
            topic: topic
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(default_topic),
        }
    }
}

pub(crate) fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

/// 题目难度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// 解析过程中的题目草稿
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionDraft {
    pub question_text: String,
    /// 下标 0-3 对应 A-D / 1-4
    pub options: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
}

impl QuestionDraft {
    pub fn new(question_text: impl Into<String>) -> Self {
        Self {
            question_text: question_text.into(),
            ..Default::default()
        }
    }
}

/// 定稿后的题目记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(rename = "question")]
    pub question_text: String,
    pub options: Vec<String>,
    #[serde(rename = "correct")]
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub exam: String,
    pub year: String,
    #[serde(default = "default_topic")]
    pub topic: String,
}

impl QuestionRecord {
    /// 由草稿和元数据构建记录（不做补齐，补齐由 normalizer 负责）
    pub fn from_draft(draft: QuestionDraft, metadata: &Metadata) -> Self {
        Self {
            question_text: draft.question_text,
            options: draft.options,
            correct_index: draft.correct_index,
            explanation: draft.explanation,
            difficulty: Difficulty::default(),
            exam: metadata.exam.clone(),
            year: metadata.year.clone(),
            topic: metadata.topic.clone(),
        }
    }

    /// 用新的元数据覆盖本记录的 exam / year / topic
    pub fn with_metadata(mut self, metadata: &Metadata) -> Self {
        self.exam = metadata.exam.clone();
        self.year = metadata.year.clone();
        self.topic = metadata.topic.clone();
        self
    }
}

/// 已入库的题目（存储层分配 id 和创建时间）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedQuestion {
    pub id: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: QuestionRecord,
}

// 年份既可以写成字符串也可以写成整数
pub(crate) fn deserialize_year<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct YearVisitor;

    impl<'de> Visitor<'de> for YearVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer representing a year")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(YearVisitor)
}
