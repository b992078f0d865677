use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::fingerprint;

// 固定的营销话术清单：命中计数，每条短语最多记一次
const MARKETING_PHRASES: &[&str] = &[
    "unlock the power",
    "take your skills to the next level",
    "game-changer",
    "best-in-class",
    "world-class",
    "cutting-edge",
    "seamlessly integrates",
    "supercharge your",
    "revolutionize the way",
    "in today's fast-paced world",
    "effortlessly boost",
    "the ultimate solution",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySignals {
    pub char_count: usize,
    pub word_count: usize,
    pub unique_word_ratio: f64,
    pub heading_count: usize,
    pub bullet_count: usize,
    pub marketing_phrase_hits: usize,
    pub generic_summary: bool,
    pub fingerprint: String,
}

pub fn extract(document: &str) -> QualitySignals {
    // 测量前必须剥离头部元数据块
    let body = strip_frontmatter(document);

    let words = tokenize(body);
    let word_count = words.len();
    let unique_word_ratio = if word_count == 0 {
        0.0
    } else {
        let distinct: HashSet<&str> = words.iter().map(|w| w.as_str()).collect();
        distinct.len() as f64 / word_count as f64
    };

    let mut heading_count = 0;
    let mut bullet_count = 0;
    let mut generic_summary = false;
    for raw in body.lines() {
        let line = raw.trim();
        if heading_level(line).is_some() {
            heading_count += 1;
        }
        if is_bullet(line) {
            bullet_count += 1;
        }
        if is_generic_summary(line) {
            generic_summary = true;
        }
    }

    let lower = body.to_lowercase();
    let marketing_phrase_hits = MARKETING_PHRASES
        .iter()
        .filter(|p| lower.contains(*p))
        .count();

    QualitySignals {
        char_count: body.chars().filter(|c| !c.is_whitespace()).count(),
        word_count,
        unique_word_ratio,
        heading_count,
        bullet_count,
        marketing_phrase_hits,
        generic_summary,
        fingerprint: fingerprint::fingerprint(document),
    }
}

// 剥离文档开头的 `---` 元数据块（若存在）
pub(crate) fn strip_frontmatter(document: &str) -> &str {
    let trimmed = document.trim_start_matches('\u{feff}');
    let mut lines = trimmed.split_inclusive('\n');
    match lines.next() {
        Some(first) if first.trim_end() == "---" => {}
        _ => return trimmed,
    }
    let mut offset = trimmed.find('\n').map(|i| i + 1).unwrap_or(trimmed.len());
    for line in lines {
        offset += line.len();
        if line.trim_end() == "---" {
            return &trimmed[offset..];
        }
    }
    // 块未闭合时视为没有元数据
    trimmed
}

// 词元：小写字母数字串，允许内部连字符/撇号，长度需大于 1
fn tokenize(body: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for c in body.chars().flat_map(|c| c.to_lowercase()) {
        if c.is_alphanumeric() {
            current.push(c);
        } else if (c == '-' || c == '\'') && !current.is_empty() {
            current.push(c);
        } else {
            flush_word(&mut current, &mut words);
        }
    }
    flush_word(&mut current, &mut words);
    words
}

fn flush_word(current: &mut String, words: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    let word = current.trim_matches(|c| c == '-' || c == '\'');
    if word.chars().count() > 1 {
        words.push(word.to_string());
    }
    current.clear();
}

pub(crate) fn heading_level(line: &str) -> Option<usize> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if (1..=3).contains(&hashes) && line[hashes..].starts_with(' ') {
        Some(hashes)
    } else {
        None
    }
}

pub(crate) fn is_bullet(line: &str) -> bool {
    line.starts_with("- ") || line.starts_with("* ") || line.starts_with("+ ")
}

// "expert guidance for <slug>." 形状的自动摘要，结构精确匹配
fn is_generic_summary(line: &str) -> bool {
    let lower = line.to_lowercase();
    let Some(rest) = lower.strip_prefix("expert guidance for ") else {
        return false;
    };
    let Some(slug) = rest.strip_suffix('.') else {
        return false;
    };
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
}
