use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{N}']+").expect("valid regex");
}

/// Split text into lowercase tokens.
///
/// Text is NFKC-normalized and case-folded before matching runs of letters,
/// digits and apostrophes. Apostrophes at either end of a run are trimmed and
/// runs that end up empty are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    RE.find_iter(&normalized)
        .map(|m| m.as_str().trim_matches('\''))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Running, runner's run!");
        assert_eq!(t, vec!["running", "runner's", "run"]);
    }

    #[test]
    fn drops_punctuation_only_runs() {
        assert!(tokenize("''  -- !!").is_empty());
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn trims_quotes() {
        assert_eq!(tokenize("'hello' world'"), vec!["hello", "world"]);
    }
}
