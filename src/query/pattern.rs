use crate::core::{ListError, Result};
use lru::LruCache;
use regex::{Regex, RegexBuilder};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

const PATTERN_CACHE_SIZE: usize = 128;

lazy_static::lazy_static! {
    static ref PATTERN_CACHE: Mutex<LruCache<(String, bool), Arc<Regex>>> =
        Mutex::new(LruCache::new(NonZeroUsize::new(PATTERN_CACHE_SIZE).unwrap()));
}

/// Translates a LIKE pattern (`%` any run, `_` one char, `\` escape) into an
/// anchored regex.
fn like_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 2);
    regex.push('^');

    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            '\\' => match chars.next() {
                Some(escaped) => regex.push_str(&regex::escape(&escaped.to_string())),
                None => regex.push_str(r"\\"),
            },
            c => regex.push_str(&regex::escape(&c.to_string())),
        }
    }

    regex.push('$');
    regex
}

fn compiled(pattern: &str, case_insensitive: bool) -> Result<Arc<Regex>> {
    let key = (pattern.to_string(), case_insensitive);
    let mut cache = PATTERN_CACHE.lock()?;
    if let Some(regex) = cache.get(&key) {
        return Ok(Arc::clone(regex));
    }

    let regex = RegexBuilder::new(&like_to_regex(pattern))
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
        .map(Arc::new)
        .map_err(|err| ListError::Query(format!("Invalid LIKE pattern '{}': {}", pattern, err)))?;
    cache.put(key, Arc::clone(&regex));
    Ok(regex)
}

pub fn like_match(text: &str, pattern: &str, case_insensitive: bool) -> Result<bool> {
    if !pattern.contains(['%', '_', '\\']) {
        return Ok(if case_insensitive {
            text.to_lowercase() == pattern.to_lowercase()
        } else {
            text == pattern
        });
    }
    Ok(compiled(pattern, case_insensitive)?.is_match(text))
}
