//! Text utilities: topic normalization, readability scoring, and the
//! cleanup passes applied to generated post content.

use std::sync::LazyLock;

use regex::Regex;

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\w+").expect("hashtag regex is valid"));

static BLANK_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank-lines regex is valid"));

/// Maximum post length accepted by the platform.
pub const MAX_POST_CHARS: usize = 3_000;

/// Maximum stored topic length.
pub const MAX_TOPIC_CHARS: usize = 200;

/// Normalize a topic title into the merge-by-name key: lowercased, with
/// runs of whitespace collapsed to single spaces, truncated to the stored
/// column width. Two detections of "the same" topic must normalize equal.
#[must_use]
pub fn normalize_topic(topic: &str) -> String {
    let collapsed = topic
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    collapsed.chars().take(MAX_TOPIC_CHARS).collect()
}

/// Flesch reading-ease score, clamped to `[0, 100]`. Higher is easier to
/// read. Empty or degenerate input scores a neutral 50.
#[must_use]
pub fn flesch_reading_ease(text: &str) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    let sentences = count_sentences(text);

    if words.is_empty() || sentences == 0 {
        return 50.0;
    }

    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();

    #[allow(clippy::cast_precision_loss)]
    let words_per_sentence = words.len() as f64 / sentences as f64;
    #[allow(clippy::cast_precision_loss)]
    let syllables_per_word = syllables as f64 / words.len() as f64;

    let score = 206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word;
    score.clamp(0.0, 100.0)
}

fn count_sentences(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
}

/// Count syllables in a word by counting vowel groups, discounting a
/// trailing silent 'e'. Always at least 1 for a word containing letters.
fn count_syllables(word: &str) -> usize {
    let lower = word.to_lowercase();
    let letters: Vec<char> = lower.chars().filter(char::is_ascii_alphabetic).collect();
    if letters.is_empty() {
        return 0;
    }

    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');

    let mut groups = 0usize;
    let mut prev_was_vowel = false;
    for &c in &letters {
        let vowel = is_vowel(c);
        if vowel && !prev_was_vowel {
            groups += 1;
        }
        prev_was_vowel = vowel;
    }

    // Silent trailing 'e' ("code", "share") does not add a syllable, except
    // for the consonant + "le" ending ("table", "sample"), which does.
    if groups > 1 && letters.last() == Some(&'e') && letters.len() >= 2 {
        let before_last = letters[letters.len() - 2];
        let consonant_le = before_last == 'l'
            && letters.len() >= 3
            && !is_vowel(letters[letters.len() - 3]);
        if !is_vowel(before_last) && !consonant_le {
            groups -= 1;
        }
    }

    groups.max(1)
}

/// Remove inline `#hashtag` tokens from generated content; hashtags are
/// stored on their own column and appended at publish time.
#[must_use]
pub fn strip_hashtags(content: &str) -> String {
    HASHTAG_RE.replace_all(content, "").to_string()
}

/// Collapse runs of three or more newlines down to a single blank line.
#[must_use]
pub fn squeeze_blank_lines(content: &str) -> String {
    BLANK_LINES_RE.replace_all(content, "\n\n").to_string()
}

/// Truncate content to `max_chars` characters, ending with an ellipsis when
/// anything was cut. Operates on characters, not bytes.
#[must_use]
pub fn truncate_post(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let kept: String = content.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

/// Full cleanup pass for LLM-generated post content: strip inline hashtags,
/// squeeze blank lines, trim, and enforce the platform length limit.
#[must_use]
pub fn clean_generated_content(content: &str) -> String {
    let stripped = strip_hashtags(content);
    let squeezed = squeeze_blank_lines(&stripped);
    truncate_post(squeezed.trim(), MAX_POST_CHARS)
}
