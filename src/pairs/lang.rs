// src/pairs/lang.rs
// =============================================================================
// Vietnamese vs English classification for article paragraphs.
//
// Detection is done by whatlang (trigram + alphabet statistics), restricted
// to the two languages we pair. Anything whatlang can't place among them
// (digits only, Cyrillic, CJK...) comes back as None.
//
// Results are memoized in an LRU cache because the same boilerplate
// paragraphs (footers, captions) show up on many pages.
//
// Rust concepts:
// - Mutex<LruCache>: a bounded memo shared by concurrent page tasks
// - Enum mapping: whatlang's Lang is translated into our own two-variant Lang
// =============================================================================

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use whatlang::{Detector, Script};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    Vietnamese,
    English,
}

const DEFAULT_CACHE_SIZE: usize = 1000;

// Classifier with a bounded memo
pub struct LanguageDetector {
    detector: Detector,
    cache: Mutex<LruCache<String, Option<Lang>>>,
}

impl LanguageDetector {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            detector: Detector::with_allowlist(vec![whatlang::Lang::Vie, whatlang::Lang::Eng]),
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn detect(&self, text: &str) -> Option<Lang> {
        // A poisoned cache is still a valid cache
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(lang) = cache.get(text) {
            return *lang;
        }

        let lang = self.classify(text);
        cache.put(text.to_string(), lang);
        lang
    }

    // Uncached detection
    fn classify(&self, text: &str) -> Option<Lang> {
        // Both languages are written in Latin script
        if whatlang::detect_script(text) != Some(Script::Latin) {
            return None;
        }

        match self.detector.detect_lang(text)? {
            whatlang::Lang::Vie => Some(Lang::Vietnamese),
            whatlang::Lang::Eng => Some(Lang::English),
            _ => None,
        }
    }
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_vietnamese() {
        let detector = LanguageDetector::default();
        assert_eq!(
            detector.detect("Xin chào, tôi là sinh viên năm nhất."),
            Some(Lang::Vietnamese)
        );
        assert_eq!(
            detector.detect("Hôm nay trời đẹp quá, chúng ta đi dạo nhé."),
            Some(Lang::Vietnamese)
        );
    }

    #[test]
    fn test_detect_english() {
        let detector = LanguageDetector::default();
        assert_eq!(
            detector.detect("Hello, I am a first year student."),
            Some(Lang::English)
        );
        assert_eq!(
            detector.detect("The weather is lovely today, let's go for a walk."),
            Some(Lang::English)
        );
    }

    #[test]
    fn test_english_with_vietnamese_loanwords() {
        let detector = LanguageDetector::default();
        // Accented letters alone must not make a sentence Vietnamese
        assert_eq!(
            detector.detect("After lunch we ate phở at the café."),
            Some(Lang::English)
        );
    }

    #[test]
    fn test_detect_unknown() {
        let detector = LanguageDetector::default();
        assert_eq!(detector.detect(""), None);
        assert_eq!(detector.detect("12345 !!!"), None);
        assert_eq!(detector.detect("Привет, как дела?"), None);
    }

    #[test]
    fn test_detector_caches_results() {
        let detector = LanguageDetector::default();
        let text = "Hello there, how are you doing today?";
        assert_eq!(detector.detect(text), Some(Lang::English));
        assert_eq!(detector.detect(text), Some(Lang::English));
        assert_eq!(detector.cache.lock().unwrap().len(), 1);
    }
}
