use ircore::evaluation::{evaluate_queries, evaluate_ranked, evaluate_set, GroundTruth};
use ircore::stopwords::{StopwordList, StopwordStrategy};
use ircore::vector::VectorSpaceConfig;
use ircore::{Collection, DocId, Document, Error, Pipeline};
use std::collections::BTreeSet;

fn collection() -> Collection {
    let docs = vec![
        Document::new(1, "the cat sat"),
        Document::new(2, "the dog ran"),
        Document::new(3, "cats and dogs"),
    ];
    Collection::from_documents(docs)
        .unwrap()
        .with_stopwords(StopwordStrategy::List(StopwordList::new(["the", "and"])))
}

fn ids(v: &[DocId]) -> BTreeSet<DocId> {
    v.iter().copied().collect()
}

#[test]
fn boolean_scenario_across_pipelines() {
    let c = collection();
    assert_eq!(c.boolean_search("cat AND sat", Pipeline::Raw).unwrap(), ids(&[1]));
    assert_eq!(c.boolean_search("cat", Pipeline::Raw).unwrap(), ids(&[1]));
    assert_eq!(c.boolean_search("cat", Pipeline::Stemmed).unwrap(), ids(&[1, 3]));
    assert_eq!(c.boolean_search("cat", Pipeline::FilteredStemmed).unwrap(), ids(&[1, 3]));
    assert_eq!(c.boolean_search("the", Pipeline::Raw).unwrap(), ids(&[1, 2]));
    assert!(c.boolean_search("the", Pipeline::Filtered).unwrap().is_empty());
}

#[test]
fn malformed_boolean_query_is_recoverable() {
    let c = collection();
    let err = c.boolean_search("(cat OR dog", Pipeline::Raw).unwrap_err();
    assert!(matches!(err, Error::MalformedQuery { .. }));
    // the collection is still usable afterwards
    assert_eq!(c.boolean_search("dog", Pipeline::Raw).unwrap(), ids(&[2]));
}

#[test]
fn vector_scenario_ranks_stemmed_matches() {
    let c = collection();
    let hits = c.vector_search("cats", Pipeline::Stemmed, None, VectorSpaceConfig::default()).unwrap();
    let ranked: Vec<DocId> = hits.iter().map(|h| h.0).collect();
    assert_eq!(ranked.len(), 2);
    assert!(ranked.contains(&1) && ranked.contains(&3));
    for (_, score) in &hits {
        assert!(*score > 0.0 && *score <= 1.0);
    }
    assert!(c.vector_search("unicorn", Pipeline::Raw, None, VectorSpaceConfig::default()).unwrap().is_empty());
}

#[test]
fn evaluation_arithmetic() {
    let eval = evaluate_set(&ids(&[1, 2, 3]), &ids(&[2, 3, 4])).unwrap();
    assert!((eval.precision - 2.0 / 3.0).abs() < 1e-12);
    assert!((eval.recall - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(evaluate_set(&ids(&[1]), &ids(&[])), Err(Error::UndefinedRecall));
    assert_eq!(evaluate_set(&ids(&[]), &ids(&[1])).unwrap().precision, 0.0);
}

#[test]
fn evaluates_searches_against_ground_truth() {
    let c = collection();
    let entries: Vec<(&str, Vec<DocId>)> = vec![("cat", vec![1, 3]), ("dog", vec![2, 3])];
    let gt: GroundTruth = entries.into_iter().collect();

    let boolean = evaluate_queries(&gt, None, |q| {
        Ok(c.boolean_search(q, Pipeline::Raw)?.into_iter().collect())
    })
    .unwrap();
    assert!((boolean.mean_precision - 1.0).abs() < 1e-12);
    assert!((boolean.mean_recall - 0.5).abs() < 1e-12);

    let stemmed = evaluate_queries(&gt, None, |q| {
        Ok(c.boolean_search(q, Pipeline::Stemmed)?.into_iter().collect())
    })
    .unwrap();
    assert!((stemmed.mean_recall - 1.0).abs() < 1e-12);

    let ranked: Vec<DocId> = c
        .vector_search("dog", Pipeline::Stemmed, Some(1), VectorSpaceConfig::default())
        .unwrap()
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    let eval = evaluate_ranked(&ranked, gt.relevant("dog").unwrap(), Some(1)).unwrap();
    assert_eq!(eval.precision_at_k, vec![1.0]);
}
