//! 基础设施层：持有稀缺资源（数据库连接、文件字节），只暴露能力

pub mod question_store;
pub mod text_extractor;

pub use question_store::{QuestionFilter, QuestionListing, QuestionStore, SqliteQuestionStore};
pub use text_extractor::{extractor_for, split_lines, PdfTextExtractor, PlainTextExtractor, TextExtractor};
