//! 题目块解析器 - 业务能力层
//!
//! 单遍状态机：逐行分类，按固定优先级匹配规则，第一条命中的规则独占该行。
//!
//! | 优先级 | 规则                   | 条件                                               |
//! |--------|------------------------|----------------------------------------------------|
//! | 1      | `NewQuestion`          | `^\d+\.`，或不是第一行且以 `?` 结尾               |
//! | 2      | `Option`               | `A.`–`D.` / `1)`–`4)` 且有当前题目                |
//! | 3      | `AnswerKey`            | 含 `answer:` 且有当前题目                          |
//! | 4      | `OptionContinuation`   | 当前选项非空，且本行不是选项行                     |
//! | 5      | `QuestionContinuation` | 还没有选项，且不以 `answer:` / `explanation:` 开头 |
//! | 6      | `Explanation`          | 以 `explanation:` 开头且有当前题目                 |
//! | -      | `Ignored`              | 以上都不匹配                                       |
//!
//! 解析是尽力而为的：格式不规范的题目会降级（补齐选项、默认答案 0），从不报错。
//! 不符合 `N.` / `A.`–`D.` / `Answer:` 约定的文档视为不受支持。
//! 行内标记 `(correct)` 与 `Answer:` 行同时出现时，后解析的那个生效。

use anyhow::{Context, Result};
use regex::Regex;

use crate::models::{Metadata, QuestionDraft, QuestionRecord};
use crate::services::normalizer;

/// 一行被哪条规则消费
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    NewQuestion,
    Option,
    AnswerKey,
    OptionContinuation,
    QuestionContinuation,
    Explanation,
    Ignored,
}

/// 因没有选项而被丢弃的题目块
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedBlock {
    /// 题目起始行（从 1 开始）
    pub line_number: usize,
    pub text: String,
}

/// 一次解析的完整结果
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    pub records: Vec<QuestionRecord>,
    /// 与输入行一一对应
    pub line_kinds: Vec<LineKind>,
    pub dropped: Vec<DroppedBlock>,
}

struct Patterns {
    question_number: Regex,
    numeral_prefix: Regex,
    option: Regex,
    answer_key: Regex,
    marker_prefix: Regex,
    explanation_prefix: Regex,
}

/// 选项行的匹配结果
struct OptionMatch<'a> {
    /// 大写后的标签字符
    label: char,
    index: usize,
    text: &'a str,
}

struct LineCtx<'a> {
    index: usize,
    line: &'a str,
    next: Option<&'a str>,
    option: Option<OptionMatch<'a>>,
    patterns: &'a Patterns,
}

struct ParserState<'m> {
    metadata: &'m Metadata,
    draft: Option<QuestionDraft>,
    draft_line: usize,
    active_option: Option<usize>,
    records: Vec<QuestionRecord>,
    dropped: Vec<DroppedBlock>,
}

impl ParserState<'_> {
    /// 定稿当前草稿（没有选项的草稿被丢弃并记录）
    fn flush(&mut self) {
        if let Some(draft) = self.draft.take() {
            let text = draft.question_text.clone();
            match normalizer::finalize(draft, self.metadata) {
                Some(record) => self.records.push(record),
                None => self.dropped.push(DroppedBlock {
                    line_number: self.draft_line,
                    text,
                }),
            }
        }
        self.active_option = None;
    }
}

struct Rule {
    kind: LineKind,
    applies: fn(&ParserState<'_>, &LineCtx<'_>) -> bool,
    apply: fn(&mut ParserState<'_>, &LineCtx<'_>),
}

/// 规则表，顺序即优先级
const RULES: [Rule; 6] = [
    Rule {
        kind: LineKind::NewQuestion,
        applies: is_new_question,
        apply: start_question,
    },
    Rule {
        kind: LineKind::Option,
        applies: is_option,
        apply: record_option,
    },
    Rule {
        kind: LineKind::AnswerKey,
        applies: is_answer_key,
        apply: record_answer_key,
    },
    Rule {
        kind: LineKind::OptionContinuation,
        applies: is_option_continuation,
        apply: append_to_option,
    },
    Rule {
        kind: LineKind::QuestionContinuation,
        applies: is_question_continuation,
        apply: append_to_question,
    },
    Rule {
        kind: LineKind::Explanation,
        applies: is_explanation,
        apply: record_explanation,
    },
];

fn is_new_question(_: &ParserState<'_>, ctx: &LineCtx<'_>) -> bool {
    ctx.patterns.question_number.is_match(ctx.line) || (ctx.index > 0 && ctx.line.ends_with('?'))
}

fn start_question(state: &mut ParserState<'_>, ctx: &LineCtx<'_>) {
    state.flush();
    let text = ctx.patterns.numeral_prefix.replace(ctx.line, "");
    state.draft = Some(QuestionDraft::new(text.into_owned()));
    state.draft_line = ctx.index + 1;
}

fn is_option(state: &ParserState<'_>, ctx: &LineCtx<'_>) -> bool {
    ctx.option.is_some() && state.draft.is_some()
}

fn record_option(state: &mut ParserState<'_>, ctx: &LineCtx<'_>) {
    let (Some(option), Some(draft)) = (ctx.option.as_ref(), state.draft.as_mut()) else {
        return;
    };

    while draft.options.len() <= option.index {
        draft.options.push(String::new());
    }
    draft.options[option.index] = option.text.to_string();
    state.active_option = Some(option.index);

    let lowered = option.text.to_lowercase();
    let inline_marker = lowered.contains("(correct)") || lowered.contains("(answer)");
    let next_line_marker = ctx
        .next
        .is_some_and(|next| next.to_lowercase().contains("answer") && next.contains(option.label));

    if inline_marker || next_line_marker {
        draft.correct_index = option.index;
    }
}

fn is_answer_key(state: &ParserState<'_>, ctx: &LineCtx<'_>) -> bool {
    state.draft.is_some() && ctx.line.to_lowercase().contains("answer:")
}

fn record_answer_key(state: &mut ParserState<'_>, ctx: &LineCtx<'_>) {
    let Some(draft) = state.draft.as_mut() else {
        return;
    };

    let index = ctx
        .patterns
        .answer_key
        .captures(ctx.line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().chars().next())
        .and_then(label_index);

    if let Some(index) = index {
        draft.correct_index = index;
    }
}

fn is_option_continuation(state: &ParserState<'_>, ctx: &LineCtx<'_>) -> bool {
    if ctx.option.is_some() {
        return false;
    }
    match (state.active_option, state.draft.as_ref()) {
        (Some(index), Some(draft)) => draft.options.get(index).is_some_and(|text| !text.is_empty()),
        _ => false,
    }
}

fn append_to_option(state: &mut ParserState<'_>, ctx: &LineCtx<'_>) {
    if let (Some(index), Some(draft)) = (state.active_option, state.draft.as_mut()) {
        if let Some(text) = draft.options.get_mut(index) {
            text.push(' ');
            text.push_str(ctx.line);
        }
    }
}

fn is_question_continuation(state: &ParserState<'_>, ctx: &LineCtx<'_>) -> bool {
    state
        .draft
        .as_ref()
        .is_some_and(|draft| draft.options.is_empty())
        && !ctx.patterns.marker_prefix.is_match(ctx.line)
}

fn append_to_question(state: &mut ParserState<'_>, ctx: &LineCtx<'_>) {
    if let Some(draft) = state.draft.as_mut() {
        draft.question_text.push(' ');
        draft.question_text.push_str(ctx.line);
    }
}

fn is_explanation(state: &ParserState<'_>, ctx: &LineCtx<'_>) -> bool {
    state.draft.is_some() && ctx.line.to_lowercase().starts_with("explanation:")
}

fn record_explanation(state: &mut ParserState<'_>, ctx: &LineCtx<'_>) {
    if let Some(draft) = state.draft.as_mut() {
        draft.explanation = ctx
            .patterns
            .explanation_prefix
            .replace(ctx.line, "")
            .trim()
            .to_string();
    }
}

/// 标签转下标：A-D → 0-3，1-4 → 0-3
pub fn label_index(label: char) -> Option<usize> {
    match label.to_ascii_uppercase() {
        c @ 'A'..='D' => Some(c as usize - 'A' as usize),
        c @ '1'..='4' => Some(c as usize - '1' as usize),
        _ => None,
    }
}

/// 题目块解析器
pub struct QuestionParser {
    patterns: Patterns,
}

impl QuestionParser {
    pub fn new() -> Result<Self> {
        let patterns = Patterns {
            question_number: Regex::new(r"^\d+\.").context("无法编译题号正则")?,
            numeral_prefix: Regex::new(r"^\d+\.\s*").context("无法编译题号前缀正则")?,
            option: Regex::new(r"(?i)^([A-D]|[1-4])[.)]\s*(.+)$").context("无法编译选项正则")?,
            answer_key: Regex::new(r"(?i)answer:\s*([A-D]|[1-4])").context("无法编译答案正则")?,
            marker_prefix: Regex::new(r"(?i)^(answer|explanation):").context("无法编译标记正则")?,
            explanation_prefix: Regex::new(r"(?i)^explanation:\s*").context("无法编译解析正则")?,
        };
        Ok(Self { patterns })
    }

    /// 规则的优先级顺序
    pub fn rule_order() -> [LineKind; 6] {
        RULES.map(|rule| rule.kind)
    }

    /// 解析行序列，输出顺序与题目在文档中出现的顺序一致
    pub fn parse(&self, lines: &[String], metadata: &Metadata) -> Vec<QuestionRecord> {
        self.parse_with_report(lines, metadata).records
    }

    /// 返回每一行被哪条规则消费
    pub fn classify_lines(&self, lines: &[String]) -> Vec<LineKind> {
        let metadata = Metadata::new("", "", None);
        self.parse_with_report(lines, &metadata).line_kinds
    }

    pub fn parse_with_report(&self, lines: &[String], metadata: &Metadata) -> ParseReport {
        let mut state = ParserState {
            metadata,
            draft: None,
            draft_line: 0,
            active_option: None,
            records: Vec::new(),
            dropped: Vec::new(),
        };
        let mut line_kinds = Vec::with_capacity(lines.len());

        for (index, line) in lines.iter().enumerate() {
            let ctx = LineCtx {
                index,
                line,
                next: lines.get(index + 1).map(String::as_str),
                option: self.match_option(line),
                patterns: &self.patterns,
            };

            let kind = match RULES.iter().find(|rule| (rule.applies)(&state, &ctx)) {
                Some(rule) => {
                    (rule.apply)(&mut state, &ctx);
                    rule.kind
                }
                None => LineKind::Ignored,
            };
            line_kinds.push(kind);
        }

        state.flush();

        ParseReport {
            records: state.records,
            line_kinds,
            dropped: state.dropped,
        }
    }

    fn match_option<'a>(&self, line: &'a str) -> Option<OptionMatch<'a>> {
        let caps = self.patterns.option.captures(line)?;
        let label = caps.get(1)?.as_str().chars().next()?.to_ascii_uppercase();
        let text = caps.get(2)?.as_str().trim();
        Some(OptionMatch {
            label,
            index: label_index(label)?,
            text,
        })
    }
}
