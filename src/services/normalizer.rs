//! 题目定稿与校验 - 业务能力层
//!
//! 负责把草稿补齐为恰好 4 个选项的记录，并在入库前再次校验不变量

use crate::error::{ImportError, ImportResult};
use crate::models::{Metadata, QuestionDraft, QuestionRecord, OPTION_COUNT};

/// 定稿草稿
///
/// - 没有任何选项的草稿返回 `None`（整块丢弃）
/// - 不足 4 个选项时用 `"Option {n}"` 补齐，n 为补齐时的长度 + 1
/// - 超过 4 个时截断
pub fn finalize(mut draft: QuestionDraft, metadata: &Metadata) -> Option<QuestionRecord> {
    if draft.options.is_empty() {
        return None;
    }

    pad_options(&mut draft.options);
    Some(QuestionRecord::from_draft(draft, metadata))
}

/// 补齐或截断到 4 个选项
pub fn pad_options(options: &mut Vec<String>) {
    while options.len() < OPTION_COUNT {
        options.push(format!("Option {}", options.len() + 1));
    }
    options.truncate(OPTION_COUNT);
}

/// 校验单条记录：题干非空，恰好 4 个选项，正确答案下标在 [0, 3]
pub fn validate(record: &QuestionRecord, index: usize) -> ImportResult<()> {
    if record.question_text.trim().is_empty() {
        return Err(ImportError::validation(index, "question text is empty"));
    }
    if record.options.len() != OPTION_COUNT {
        return Err(ImportError::validation(
            index,
            format!("expected {} options, found {}", OPTION_COUNT, record.options.len()),
        ));
    }
    if record.correct_index >= OPTION_COUNT {
        return Err(ImportError::validation(
            index,
            format!("correct index {} is outside [0, 3]", record.correct_index),
        ));
    }
    Ok(())
}

/// 校验整批记录，返回第一个错误
pub fn validate_batch(records: &[QuestionRecord]) -> ImportResult<()> {
    records
        .iter()
        .enumerate()
        .try_for_each(|(index, record)| validate(record, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(options: &[&str]) -> QuestionDraft {
        QuestionDraft {
            question_text: "Q".into(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_index: 0,
            explanation: String::new(),
        }
    }

    fn metadata() -> Metadata {
        Metadata::new("CV", "2023", None)
    }

    #[test]
    fn test_draft_without_options_is_dropped() {
        assert!(finalize(draft(&[]), &metadata()).is_none());
    }

    #[test]
    fn test_short_option_list_is_padded_positionally() {
        let record = finalize(draft(&["X", "Y"]), &metadata()).unwrap();
        assert_eq!(record.options, vec!["X", "Y", "Option 3", "Option 4"]);
        assert_eq!(record.topic, "General");
    }

    #[test]
    fn test_gaps_stay_empty_and_tail_is_padded() {
        let record = finalize(draft(&["a", "", "c"]), &metadata()).unwrap();
        assert_eq!(record.options, vec!["a", "", "c", "Option 4"]);
    }

    #[test]
    fn test_long_option_list_is_truncated() {
        let record = finalize(draft(&["a", "b", "c", "d", "e"]), &metadata()).unwrap();
        assert_eq!(record.options, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_validate_batch_reports_first_bad_record() {
        let good = finalize(draft(&["a"]), &metadata()).unwrap();
        let mut short = good.clone();
        short.options.pop();
        let mut bad_index = good.clone();
        bad_index.correct_index = 4;

        let err = validate_batch(&[good.clone(), short, bad_index]).unwrap_err();
        assert!(matches!(err, ImportError::Validation { index: 1, .. }));

        let mut out_of_range = good.clone();
        out_of_range.correct_index = 7;
        let err = validate_batch(&[good, out_of_range]).unwrap_err();
        assert!(matches!(err, ImportError::Validation { index: 1, .. }));
    }

    #[test]
    fn test_blank_question_text_is_rejected() {
        let mut blank = finalize(draft(&["a", "b"]), &metadata()).unwrap();
        blank.question_text = "   ".into();

        let err = validate(&blank, 3).unwrap_err();
        assert!(matches!(err, ImportError::Validation { index: 3, .. }));
        assert!(err.to_string().starts_with("Invalid question format at index 3"));
    }
}
