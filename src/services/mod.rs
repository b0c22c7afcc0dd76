pub mod normalizer;
pub mod persister;
pub mod question_parser;
pub mod warn_writer;

pub use persister::BulkPersister;
pub use question_parser::{DroppedBlock, LineKind, ParseReport, QuestionParser};
pub use warn_writer::WarnWriter;
