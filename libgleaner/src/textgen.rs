//! Comment and direct-message text generation.
//!
//! Output is deliberately a small closed set: one phrase from the pool,
//! one punctuation run, one of three case treatments. Contest hosts read
//! these, so they stay short and plausible.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::CommentConfig;

#[derive(Debug, Clone)]
pub struct TextGenerator {
    phrases: Vec<String>,
    punctuation: Vec<String>,
}

impl TextGenerator {
    pub fn new(config: &CommentConfig) -> Self {
        TextGenerator {
            phrases: config.phrases.clone(),
            punctuation: config.punctuation.clone(),
        }
    }

    /// Produce one candidate: phrase + punctuation, then leave the casing
    /// alone, uppercase it, or lowercase it.
    ///
    /// Empty pools yield an empty string; config validation keeps that from
    /// happening when the text features are enabled.
    pub fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        let phrase = self
            .phrases
            .choose(&mut rng)
            .map(String::as_str)
            .unwrap_or("");
        let punctuation = self
            .punctuation
            .choose(&mut rng)
            .map(String::as_str)
            .unwrap_or("");
        let text = format!("{}{}", phrase, punctuation);
        match rng.gen_range(0..3) {
            0 => text,
            1 => text.to_uppercase(),
            _ => text.to_lowercase(),
        }
    }
}

/// Every `#`-prefixed token in the text, in order of appearance.
pub fn hashtags(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .filter(|word| word.starts_with('#') && word.len() > 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(phrases: &[&str], punctuation: &[&str]) -> TextGenerator {
        TextGenerator {
            phrases: phrases.iter().map(|s| s.to_string()).collect(),
            punctuation: punctuation.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_generate_stays_within_candidate_set() {
        let gen = generator(&["Pick me", "Done"], &["", "!"]);
        let mut candidates = Vec::new();
        for phrase in ["Pick me", "Done"] {
            for punct in ["", "!"] {
                let text = format!("{}{}", phrase, punct);
                candidates.push(text.clone());
                candidates.push(text.to_uppercase());
                candidates.push(text.to_lowercase());
            }
        }
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let text = gen.generate();
            assert!(candidates.contains(&text), "unexpected output: {}", text);
            seen.insert(text);
        }
        assert!(seen.len() > 1, "generator never varied");
    }

    #[test]
    fn test_generate_produces_all_three_case_treatments() {
        let gen = generator(&["Pick me"], &[""]);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..300 {
            seen.insert(gen.generate());
        }
        assert!(seen.contains("Pick me"));
        assert!(seen.contains("PICK ME"));
        assert!(seen.contains("pick me"));
    }

    #[test]
    fn test_generate_with_empty_pools_is_empty() {
        let gen = generator(&[], &[]);
        assert_eq!(gen.generate(), "");
    }

    #[test]
    fn test_new_copies_config_pools() {
        let config = CommentConfig::default();
        let gen = TextGenerator::new(&config);
        let text = gen.generate();
        assert!(!text.is_empty());
    }

    #[test]
    fn test_hashtags_extracted_in_order() {
        let tags = hashtags("win big #giveaway today #contest #freebie");
        assert_eq!(tags, vec!["#giveaway", "#contest", "#freebie"]);
    }

    #[test]
    fn test_hashtags_ignores_bare_hash() {
        let tags = hashtags("nothing here # just a stray hash");
        assert!(tags.is_empty());
    }

    #[test]
    fn test_hashtags_empty_when_none_present() {
        assert!(hashtags("no tags at all").is_empty());
    }
}
