use serde::{Deserialize, Serialize};

use crate::models::question::{default_topic, deserialize_year, Metadata, QuestionRecord};

/// 一份试卷的解析结果，用于导出 TOML 供人工复核
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamPaper {
    pub exam: String,
    #[serde(deserialize_with = "deserialize_year")]
    pub year: String,
    #[serde(default = "default_topic")]
    pub topic: String,
    /// 来源文件名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
}

impl ExamPaper {
    pub fn new(metadata: &Metadata, source: Option<String>, questions: Vec<QuestionRecord>) -> Self {
        Self {
            exam: metadata.exam.clone(),
            year: metadata.year.clone(),
            topic: metadata.topic.clone(),
            source,
            questions,
        }
    }

    pub fn metadata(&self) -> Metadata {
        Metadata::new(&self.exam, &self.year, Some(self.topic.clone()))
    }
}
