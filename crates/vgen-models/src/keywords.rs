//! Search-tag extraction from seed metadata or prompt text.

use crate::seed::SeedMetadata;

/// Tags returned when the prompt fallback yields nothing usable; downstream
/// image search requires at least one non-empty query.
const GENERIC_TAGS: &[&str] = &["creative", "aesthetic"];

/// Common words dropped from prompt-derived tags.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "are", "was", "were", "have", "has",
    "had", "will", "would", "could", "should", "about", "into", "over", "under", "very", "more",
    "most", "some", "any", "all", "its", "his", "her", "their", "our", "your", "out", "not",
    "but", "you", "they", "them", "then", "than", "when", "where", "what", "which", "while",
    "video", "make", "style", "like",
];

/// Result-count caps for each extraction tier.
///
/// Different callers use different limits (the variation flow keeps metadata
/// tags to 3; the generic flow allows 10), so these are knobs rather than
/// constants.
#[derive(Debug, Clone, Copy)]
pub struct KeywordCaps {
    /// Max tracked trend keywords taken
    pub trend: usize,
    /// Max tags taken from seed metadata
    pub metadata: usize,
    /// Max tokens taken from the prompt fallback
    pub fallback: usize,
}

impl Default for KeywordCaps {
    fn default() -> Self {
        Self {
            trend: 10,
            metadata: 10,
            fallback: 10,
        }
    }
}

impl KeywordCaps {
    /// Caps used by the variation-generation caller.
    pub fn variation() -> Self {
        Self {
            metadata: 3,
            ..Self::default()
        }
    }
}

/// Derive search tags for image sourcing.
///
/// Priority order:
/// 1. Explicit tracked trend keywords, when present.
/// 2. Fast-cut metadata search keywords.
/// 3. Compose/quick-compose metadata keywords (search keywords preferred).
/// 4. Prompt fallback: lowercase, strip everything outside
///    `[a-z0-9]`/Hangul/whitespace, drop stopwords and short tokens, dedupe,
///    longest-first. Never returns an empty list.
pub fn extract_keywords(
    metadata: Option<&SeedMetadata>,
    prompt: &str,
    trend_keywords: Option<&[String]>,
    caps: KeywordCaps,
) -> Vec<String> {
    if let Some(trends) = trend_keywords {
        let tags: Vec<String> = trends
            .iter()
            .filter(|t| !t.trim().is_empty())
            .take(caps.trend)
            .map(|t| t.trim().to_string())
            .collect();
        if !tags.is_empty() {
            return tags;
        }
    }

    if let Some(meta) = metadata {
        let tags = metadata_keywords(meta, caps.metadata);
        if !tags.is_empty() {
            return tags;
        }
    }

    let tags = prompt_fallback(prompt, caps.fallback);
    if tags.is_empty() {
        GENERIC_TAGS.iter().map(|t| t.to_string()).collect()
    } else {
        tags
    }
}

fn metadata_keywords(meta: &SeedMetadata, cap: usize) -> Vec<String> {
    let source: &[String] = match meta {
        SeedMetadata::FastCut {
            search_keywords, ..
        } => search_keywords,
        SeedMetadata::Compose {
            keywords,
            search_keywords,
            ..
        } => {
            if !search_keywords.is_empty() {
                search_keywords
            } else {
                keywords
            }
        }
        SeedMetadata::QuickCompose { keywords, .. } => keywords,
    };

    source
        .iter()
        .filter(|k| !k.trim().is_empty())
        .take(cap)
        .map(|k| k.trim().to_string())
        .collect()
}

fn prompt_fallback(prompt: &str, cap: usize) -> Vec<String> {
    let cleaned: String = prompt
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || is_hangul(c) || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut seen = std::collections::HashSet::new();
    let mut tokens: Vec<String> = cleaned
        .split_whitespace()
        .filter(|t| t.chars().count() > 2)
        .filter(|t| !STOPWORDS.contains(t))
        .filter(|t| seen.insert(t.to_string()))
        .map(|t| t.to_string())
        .collect();

    // Stable sort keeps first-seen order among equal-length tokens
    tokens.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    tokens.truncate(cap);
    tokens
}

fn is_hangul(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}
