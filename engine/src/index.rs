use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::corpus::Document;
use crate::tokenizer::tokenize;

pub type TermId = u32;
pub type DocId = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: DocId,
    /// Raw occurrence count of the term in the document, always > 0.
    pub tf: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DocEntry {
    source: PathBuf,
}

/// A single ranked hit: the document's source path and its
/// cosine-like similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub doc_id: DocId,
    pub source: PathBuf,
    pub score: f64,
}

/// An immutable TF-IDF inverted index over a document corpus.
///
/// Built once from a corpus, then shared read-only; any corpus change
/// requires building a fresh `Index` and swapping the reference.
#[derive(Debug, Default, PartialEq)]
pub struct Index {
    dictionary: HashMap<String, TermId>,
    /// Document frequency per term, indexed by `TermId`.
    df: Vec<u32>,
    /// Posting lists indexed by `TermId`, each sorted by doc id. A
    /// (term, doc) pair is present only when its frequency is > 0.
    postings: Vec<Vec<Posting>>,
    docs: Vec<DocEntry>,
    /// Euclidean norm of each document's raw term-frequency vector.
    lengths: Vec<f64>,
}

impl Index {
    /// Build the index from an already-loaded corpus: tokenize every
    /// document, intern terms, accumulate postings, then derive document
    /// frequencies and vector lengths. O(total tokens).
    pub fn build(corpus: Vec<Document>) -> Index {
        let mut dictionary: HashMap<String, TermId> = HashMap::new();
        let mut df: Vec<u32> = Vec::new();
        let mut postings: Vec<Vec<Posting>> = Vec::new();
        let mut docs: Vec<DocEntry> = Vec::with_capacity(corpus.len());

        for doc in corpus {
            let doc_id = docs.len() as DocId;
            debug_assert_eq!(doc.id, doc_id, "loader must assign contiguous ids");

            let mut counts: HashMap<TermId, u32> = HashMap::new();
            for term in tokenize(&doc.text) {
                let next_id = dictionary.len() as TermId;
                let tid = *dictionary.entry(term).or_insert(next_id);
                if tid == next_id {
                    df.push(0);
                    postings.push(Vec::new());
                }
                *counts.entry(tid).or_insert(0) += 1;
            }
            for (tid, tf) in counts {
                df[tid as usize] += 1;
                postings[tid as usize].push(Posting { doc_id, tf });
            }
            docs.push(DocEntry { source: doc.source });
        }

        for plist in &mut postings {
            plist.sort_by_key(|p| p.doc_id);
        }

        let mut lengths = vec![0.0f64; docs.len()];
        for plist in &postings {
            for p in plist {
                lengths[p.doc_id as usize] += f64::from(p.tf) * f64::from(p.tf);
            }
        }
        for l in &mut lengths {
            *l = l.sqrt();
        }

        tracing::info!(
            num_docs = docs.len(),
            num_terms = dictionary.len(),
            "index built"
        );

        Index {
            dictionary,
            df,
            postings,
            docs,
            lengths,
        }
    }

    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.dictionary.len()
    }

    /// Raw frequency of `term` in `doc`, 0 when the pair is absent.
    pub fn term_frequency(&self, term: &str, doc: DocId) -> u32 {
        let Some(&tid) = self.dictionary.get(term) else {
            return 0;
        };
        let plist = &self.postings[tid as usize];
        match plist.binary_search_by_key(&doc, |p| p.doc_id) {
            Ok(i) => plist[i].tf,
            Err(_) => 0,
        }
    }

    /// Number of documents containing `term`, 0 for unknown terms.
    pub fn document_frequency(&self, term: &str) -> u32 {
        match self.dictionary.get(term) {
            Some(&tid) => self.df[tid as usize],
            None => 0,
        }
    }

    /// Euclidean length of the document's raw term-frequency vector.
    /// 0.0 exactly when the document has no indexed terms.
    pub fn length(&self, doc: DocId) -> f64 {
        self.lengths.get(doc as usize).copied().unwrap_or(0.0)
    }

    /// Source path for a document id, `None` when the id is unknown.
    pub fn source(&self, doc: DocId) -> Option<&Path> {
        self.docs.get(doc as usize).map(|d| d.source.as_path())
    }

    fn idf(&self, tid: TermId) -> f64 {
        (self.docs.len() as f64 / f64::from(self.df[tid as usize])).log2()
    }

    /// Rank all documents against a free-text query.
    ///
    /// Query terms go through the same normalizer as documents and are
    /// deliberately not deduplicated, so a repeated query term contributes
    /// once per occurrence. Per document the score accumulates
    /// tf(t, d) * log2(N / df(t)) over query terms known to the
    /// vocabulary, and is then divided by the document's vector length
    /// when that length is positive. Results are sorted by score
    /// descending with ties broken by ascending doc id, and only strictly
    /// positive scores are returned.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        let n = self.docs.len();
        if n == 0 {
            return Vec::new();
        }

        let mut scores = vec![0.0f64; n];
        for term in tokenize(query) {
            let Some(&tid) = self.dictionary.get(&term) else {
                continue;
            };
            let idf = self.idf(tid);
            for p in &self.postings[tid as usize] {
                scores[p.doc_id as usize] += f64::from(p.tf) * idf;
            }
        }

        for (doc, score) in scores.iter_mut().enumerate() {
            if self.lengths[doc] > 0.0 {
                *score /= self.lengths[doc];
            }
        }

        let mut ranked: Vec<(DocId, f64)> = scores
            .into_iter()
            .enumerate()
            .map(|(doc, score)| (doc as DocId, score))
            .collect();
        // Stable sort: equal scores keep ascending doc id order.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        ranked
            .into_iter()
            .filter(|&(_, score)| score > 0.0)
            .map(|(doc_id, score)| SearchResult {
                doc_id,
                source: self.docs[doc_id as usize].source.clone(),
                score,
            })
            .collect()
    }
}
