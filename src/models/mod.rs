pub mod loaders;
pub mod paper;
pub mod question;

pub use loaders::{load_paper_toml, save_paper_toml};
pub use paper::ExamPaper;
pub use question::{
    Difficulty, Metadata, PersistedQuestion, QuestionDraft, QuestionRecord, DEFAULT_TOPIC,
    OPTION_COUNT,
};
