use ircore::stopwords::{StopwordFilter, StopwordList};
use ircore::tokenizer::tokenize;
use ircore::{Normalizer, Pipeline};

#[test]
fn it_normalizes_and_stems() {
    let n = Normalizer::default();
    let words = n.normalize("Running Runners RUN! The café's menu.", Pipeline::Stemmed);
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    assert!(words.contains(&"runner".to_string()));
    // Non-ASCII words pass through the stemmer untouched
    assert!(words.contains(&"café's".to_string()));
}

#[test]
fn it_folds_compatibility_forms() {
    // NFKC folds the "ﬁ" ligature and full-width letters
    assert_eq!(tokenize("ﬁsh ＡＢＣ"), vec!["fish", "abc"]);
}

#[test]
fn it_filters_stopwords() {
    let n = Normalizer::new(StopwordFilter::List(StopwordList::english()));
    let words = n.normalize("The quick brown fox and the lazy dog", Pipeline::Filtered);
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert_eq!(words, vec!["quick", "brown", "fox", "lazy", "dog"]);
}
