//! Corpus frequency aggregation.
//!
//! The corpus table is a pure fold over the document tables:
//! `tables.fold(empty, merge_into)`. Addition is commutative, and the table
//! is ordered by term, so the result is independent of document order.

use tracing::debug;

use keyness_shared::{CorpusFrequency, DocumentId, KeynessError, Result, TermFrequency};

/// Add every count of `table` into `acc` and return it.
pub fn merge_into(mut acc: CorpusFrequency, table: &TermFrequency) -> CorpusFrequency {
    for (term, count) in table.iter() {
        acc.accumulate(term, count);
    }
    acc
}

/// Sum all document tables into one corpus table.
pub fn aggregate<'a, I>(tables: I) -> CorpusFrequency
where
    I: IntoIterator<Item = &'a TermFrequency>,
{
    let corpus = tables.into_iter().fold(CorpusFrequency::new(), merge_into);
    debug!(
        vocabulary = corpus.len(),
        total = corpus.total(),
        "corpus frequency table built"
    );
    corpus
}

/// Every term of every document must be present in the corpus table.
///
/// A miss means the corpus was not built from these documents; such terms
/// would silently go unscored.
pub fn check_coverage<'a, I>(corpus: &CorpusFrequency, documents: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a DocumentId, &'a TermFrequency)>,
{
    for (doc_id, table) in documents {
        if let Some((term, _)) = table.iter().find(|(term, _)| !corpus.contains(term)) {
            return Err(KeynessError::Coverage {
                doc_id: doc_id.clone(),
                term: term.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, u64)]) -> TermFrequency {
        entries.iter().map(|&(t, c)| (t, c)).collect()
    }

    fn sample_tables() -> Vec<TermFrequency> {
        vec![
            table(&[("climate", 4), ("coalition", 2)]),
            table(&[("climate", 1), ("energy", 3)]),
            table(&[("energy", 2), ("summit", 5), ("coalition", 1)]),
        ]
    }

    #[test]
    fn aggregate_sums_counts_per_term() {
        let corpus = aggregate(&sample_tables());
        assert_eq!(corpus.get("climate"), Some(5));
        assert_eq!(corpus.get("coalition"), Some(3));
        assert_eq!(corpus.get("energy"), Some(5));
        assert_eq!(corpus.get("summit"), Some(5));
        assert_eq!(corpus.total(), 18);
    }

    #[test]
    fn aggregate_is_the_union_of_terms() {
        let tables = sample_tables();
        let corpus = aggregate(&tables);
        let union: std::collections::BTreeSet<&str> = tables
            .iter()
            .flat_map(|t| t.iter().map(|(term, _)| term))
            .collect();
        let corpus_terms: std::collections::BTreeSet<&str> =
            corpus.iter().map(|(term, _)| term).collect();
        assert_eq!(union, corpus_terms);
    }

    #[test]
    fn aggregate_is_order_independent() {
        let tables = sample_tables();
        let expected = aggregate(&tables);
        let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for order in orders {
            let permuted = order.iter().map(|&i| &tables[i]);
            assert_eq!(aggregate(permuted), expected, "order {order:?}");
        }
    }

    #[test]
    fn merge_into_does_not_touch_the_table() {
        let tf = table(&[("network", 2)]);
        let acc = merge_into(CorpusFrequency::new(), &tf);
        let acc = merge_into(acc, &tf);
        assert_eq!(acc.get("network"), Some(4));
        assert_eq!(tf.get("network"), Some(2));
    }

    #[test]
    fn aggregate_of_nothing_is_empty() {
        let corpus = aggregate(std::iter::empty());
        assert!(corpus.is_empty());
    }

    #[test]
    fn coverage_holds_for_aggregated_corpus() {
        let tables = sample_tables();
        let ids: Vec<DocumentId> = (0..tables.len())
            .map(|i| DocumentId::new(format!("doc-{i}")).unwrap())
            .collect();
        let corpus = aggregate(&tables);
        assert!(check_coverage(&corpus, ids.iter().zip(&tables)).is_ok());
    }

    #[test]
    fn coverage_violation_names_document_and_term() {
        let tables = sample_tables();
        let partial = aggregate(&tables[..2]);
        let id = DocumentId::new("late-doc").unwrap();

        let err = check_coverage(&partial, [(&id, &tables[2])]).unwrap_err();
        match err {
            KeynessError::Coverage { doc_id, term } => {
                assert_eq!(doc_id, id);
                assert_eq!(term, "summit");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
