use crate::signals::{heading_level, is_bullet, strip_frontmatter};

// 取前多少个非空行参与指纹
const FINGERPRINT_LINES: usize = 80;

/// 结构指纹：只看行的"形状"(标题/列表/段落 × 字数桶)，不看措辞。
/// 指纹相同即视为结构重复——对模板化灌水精确，对逐字抄袭不敏感，
/// 这是刻意的取舍。
pub fn fingerprint(document: &str) -> String {
    strip_frontmatter(document)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(FINGERPRINT_LINES)
        .map(line_token)
        .collect::<Vec<_>>()
        .join("|")
}

fn line_token(line: &str) -> String {
    let (class, content) = classify(line);
    let words = content.split_whitespace().count();
    let bucket = match words {
        0..=2 => "s",
        3..=6 => "m",
        _ => "l",
    };
    format!("{}:{}", class, bucket)
}

fn classify(line: &str) -> (&'static str, &str) {
    if let Some(level) = heading_level(line) {
        let class = match level {
            1 => "h1",
            2 => "h2",
            _ => "h3",
        };
        return (class, line[level..].trim_start());
    }
    if is_bullet(line) {
        return ("b", line[2..].trim_start());
    }
    if let Some(rest) = numbered_rest(line) {
        return ("n", rest);
    }
    ("p", line)
}

// "1. " / "1) " 形式的有序列表项
fn numbered_rest(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    rest.strip_prefix(". ")
        .or_else(|| rest.strip_prefix(") "))
        .map(str::trim_start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let doc = "# Title\n\nSome paragraph with a few words here.\n\n- one two\n- alpha beta gamma delta\n1. step with several words inside it\n";
        assert_eq!(fingerprint(doc), fingerprint(doc));
        assert_eq!(fingerprint(doc), "h1:s|p:l|b:s|b:m|n:m");
    }

    #[test]
    fn wording_does_not_matter() {
        let a = "## Install\n- cargo add\n- done quickly now\nA paragraph of at least seven distinct words total.";
        let b = "## Remove\n- cargo rm\n- gone very fast\nAnother sentence containing more than six different tokens easily.";
        assert_eq!(fingerprint(a), fingerprint(b));
    }

    #[test]
    fn bucket_boundary() {
        // 2 词 -> s，3 词跨过边界 -> m
        assert_eq!(fingerprint("- one two"), "b:s");
        assert_eq!(fingerprint("- one two three"), "b:m");
        // 6 词 -> m，7 词 -> l
        assert_eq!(fingerprint("- a b c d e f"), "b:m");
        assert_eq!(fingerprint("- a b c d e f g"), "b:l");
    }

    #[test]
    fn frontmatter_excluded() {
        let with = "---\nname: x\n---\n# Title\nbody text here\n";
        let without = "# Title\nbody text here\n";
        assert_eq!(fingerprint(with), fingerprint(without));
    }

    #[test]
    fn caps_at_eighty_lines() {
        let long: String = (0..200).map(|i| format!("line number {}\n", i)).collect();
        let fp = fingerprint(&long);
        assert_eq!(fp.split('|').count(), 80);
    }
}
