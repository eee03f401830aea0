//! Answer extraction and grading
//!
//! Everything here is deterministic and side-effect-free so grading is
//! reproducible: same inputs, same verdict.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Message;

static FINAL_SOLUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)final answer:\s*<solution>(.*?)</solution>").unwrap());
static SOLUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)answer:\s*<solution>(.*?)</solution>").unwrap());
static FINAL_BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)final answer:\s*\*{2,5}(.*?)\*{2,5}").unwrap());
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)answer:\s*\*{2,5}(.*?)\*{2,5}").unwrap());
static FINAL_PLAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)final answer:\s*([^\n]+)").unwrap());
static PLAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\banswer:\s*([\w\d][\w\d\s,.;/-]*)").unwrap());
static LETTER_FINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)final answer:\s*\*{0,2}([A-F])\*{0,2}").unwrap());
static LETTER_IS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)the answer is\s*\*{0,2}([A-F])\*{0,2}").unwrap());
static LETTER_OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[Oo]ption|[Aa]nswer|:)\s*\*{0,2}([A-F])\*{0,2}[.\s]").unwrap());
static LETTER_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\*{0,2}([A-F])\*{0,2}\b").unwrap());
static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+").unwrap());

fn last_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures_iter(text)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extract the explicit "Final Answer:" conclusion from a turn's text.
///
/// Tolerates `<solution>` tags and markdown bold around the answer; the
/// last occurrence wins. Returns `None` when no marker is present.
pub fn extract_final_answer(text: &str) -> Option<String> {
    last_capture(&FINAL_SOLUTION, text)
        .or_else(|| last_capture(&FINAL_BOLD, text))
        .or_else(|| last_capture(&FINAL_PLAIN, text))
}

/// Extract any stated answer from a turn, for per-turn evolution tracking.
///
/// Falls back from "Final Answer:" to intermediate "Answer:" forms; a
/// plain "Answer:" is only accepted when it looks like an answer rather
/// than prose mentioning one.
pub fn extract_answer(text: &str) -> Option<String> {
    if let Some(answer) = extract_final_answer(text) {
        return Some(answer);
    }
    if let Some(answer) = last_capture(&SOLUTION, text).or_else(|| last_capture(&BOLD, text)) {
        return Some(answer);
    }
    last_capture(&PLAIN, text).filter(|a| a.split_whitespace().count() <= 15)
}

/// Final answer of a whole conversation: the newest agent turn with a
/// "Final Answer:" marker, falling back to the full text of the last
/// agent turn when no marker was produced.
pub fn conversation_answer(messages: &[Message]) -> String {
    for message in messages.iter().rev() {
        if !message.role.is_agent() {
            continue;
        }
        if let Some(answer) = extract_final_answer(&message.content) {
            return answer;
        }
    }
    messages
        .iter()
        .rev()
        .find(|m| m.role.is_agent())
        .map(|m| m.content.trim().to_string())
        .unwrap_or_default()
}

/// How a benchmark's ground truth should be compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerFormat {
    /// Multiple-choice letter A-F
    Letter,
    /// Integer answer (competition math)
    Integer,
    /// Free text, normalized before comparison
    Text,
}

/// Extract a multiple-choice letter (A-F) from a response
pub fn extract_letter(text: &str) -> Option<String> {
    for re in [&*LETTER_FINAL, &*LETTER_IS, &*LETTER_OPTION, &*LETTER_BARE] {
        if let Some(c) = re.captures(text).and_then(|c| c.get(1)) {
            return Some(c.as_str().to_uppercase());
        }
    }
    None
}

fn first_integer(text: &str) -> Option<i64> {
    INTEGER.find(text).and_then(|m| m.as_str().parse().ok())
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Compare an extracted answer against the ground truth under a
/// benchmark's answer format.
pub fn score(answer: &str, ground_truth: &str, format: AnswerFormat) -> bool {
    match format {
        AnswerFormat::Letter => match extract_letter(answer) {
            Some(letter) => letter == ground_truth.trim().to_uppercase(),
            None => false,
        },
        AnswerFormat::Integer => match (first_integer(answer), first_integer(ground_truth)) {
            (Some(a), Some(b)) => a == b,
            _ => answer.trim() == ground_truth.trim(),
        },
        AnswerFormat::Text => {
            let (a, b) = (normalize(answer), normalize(ground_truth));
            if a == b && !a.is_empty() {
                return true;
            }
            // Numeric-tolerant comparison for answers like "0.50" vs ".5"
            match (a.parse::<f64>(), b.parse::<f64>()) {
                (Ok(x), Ok(y)) => (x - y).abs() <= 1e-6 * y.abs().max(1.0),
                _ => false,
            }
        }
    }
}
