use rand::Rng;
use tracing::debug;

use crate::types::ApiError;

const SUFFIX_LEN: usize = 6;
const RADIX: u32 = 36;

fn random_suffix() -> String {
    let upper = RADIX.pow(SUFFIX_LEN as u32);
    to_base36(rand::rng().random_range(0..upper))
}

/// Zero padded, `SUFFIX_LEN` digits wide.
fn to_base36(mut value: u32) -> String {
    let mut digits = vec!['0'; SUFFIX_LEN];
    for slot in digits.iter_mut().rev() {
        *slot = std::char::from_digit(value % RADIX, RADIX).unwrap_or('0');
        value /= RADIX;
    }
    digits.into_iter().collect()
}

/// Lowercase hyphenated title followed by a random base36 suffix, e.g.
/// `hello-world-0k3x9a`. Collisions are possible; see [`unique`].
pub fn generate(title: &str) -> String {
    let base = ::slug::slugify(title);
    let suffix = random_suffix();
    if base.is_empty() {
        suffix
    } else {
        format!("{}-{}", base, suffix)
    }
}

/// Generates slugs and hands each to `claim` until it stores something
/// under one, giving up after `retry_limit` attempts. `claim` returns `None`
/// when the candidate is already taken.
pub fn unique<T, F>(title: &str, retry_limit: u32, mut claim: F) -> Result<T, ApiError>
where
    F: FnMut(&str) -> Result<Option<T>, ApiError>,
{
    for attempt in 1..=retry_limit {
        let candidate = generate(title);
        if let Some(stored) = claim(&candidate)? {
            return Ok(stored);
        }
        debug!(%candidate, attempt, "slug already taken");
    }
    Err(ApiError::SlugExhausted {
        attempts: retry_limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn hello_world_gets_six_char_suffix() {
        let re = Regex::new(r"^hello-world-[0-9a-z]{6}$").unwrap();
        for _ in 0..50 {
            let slug = generate("Hello World");
            assert!(re.is_match(&slug), "unexpected slug {}", slug);
        }
    }

    #[test]
    fn punctuation_only_title_is_just_the_suffix() {
        let re = Regex::new(r"^[0-9a-z]{6}$").unwrap();
        assert!(re.is_match(&generate("!!!")));
    }

    #[test]
    fn base36_is_zero_padded() {
        assert_eq!(to_base36(0), "000000");
        assert_eq!(to_base36(35), "00000z");
        assert_eq!(to_base36(36), "000010");
        assert_eq!(to_base36(36u32.pow(6) - 1), "zzzzzz");
    }

    #[test]
    fn unique_retries_until_free() {
        let mut calls = 0;
        let slug = unique("Hello World", 5, |candidate| {
            calls += 1;
            Ok(if calls < 3 { None } else { Some(candidate.to_string()) })
        })
        .unwrap();
        assert_eq!(calls, 3);
        assert!(slug.starts_with("hello-world-"));
    }

    #[test]
    fn unique_gives_up_after_retry_limit() {
        let mut calls = 0;
        let result = unique("Hello World", 4, |_| {
            calls += 1;
            Ok(None::<String>)
        });
        assert_eq!(calls, 4);
        match result {
            Err(ApiError::SlugExhausted { attempts }) => assert_eq!(attempts, 4),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn lookup_errors_propagate() {
        let result = unique::<String, _>("Hello World", 3, |_| Err(ApiError::Internal));
        assert!(matches!(result, Err(ApiError::Internal)));
    }
}
