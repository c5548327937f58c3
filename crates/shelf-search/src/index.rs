//! Process-wide search index.
//!
//! [`SearchIndex`] owns the current [`Snapshot`] (documents plus an in-RAM
//! tantivy index over them). Readers clone the snapshot `Arc` and query it
//! without holding any lock, so a rebuild never exposes a half-populated
//! index: the new snapshot is built off to the side and swapped in whole.
//!
//! # Thread Safety
//!
//! - `search()` / `documents()` build lazily on first use with double-checked
//!   locking on `build_lock`
//! - `rebuild()` serializes with other builds, then swaps the snapshot
//! - `invalidate()` drops the snapshot; the next query rebuilds

use std::cmp::Ordering;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use serde::Serialize;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, FuzzyTermQuery, Occur, Query};
use tantivy::schema::{Field, STORED, Schema, TEXT, Value};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

use crate::document::{DocumentKind, DocumentSource, SearchDocument};
use crate::error::SearchError;
use crate::excerpt::excerpt;

/// Boost applied to title matches relative to content matches.
const TITLE_BOOST: f32 = 3.0;

/// Writer memory budget.
const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Tokens longer than this are dropped by tantivy's default analyzer.
const MAX_TOKEN_LEN: usize = 40;

/// One ranked search result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    pub score: f32,
    pub excerpt: String,
}

#[derive(Clone, Copy)]
struct Fields {
    ord: Field,
    title: Field,
    content: Field,
}

/// Immutable documents and the index built over them.
pub struct Snapshot {
    documents: Vec<SearchDocument>,
    reader: IndexReader,
    fields: Fields,
}

impl Snapshot {
    /// Index `documents`, in order, into a fresh in-RAM index.
    pub fn build(documents: Vec<SearchDocument>) -> Result<Self, SearchError> {
        let mut schema_builder = Schema::builder();
        let fields = Fields {
            ord: schema_builder.add_u64_field("ord", STORED),
            title: schema_builder.add_text_field("title", TEXT),
            content: schema_builder.add_text_field("content", TEXT),
        };
        let index = Index::create_in_ram(schema_builder.build());

        // One thread keeps doc ids in insertion order.
        let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_HEAP_BYTES)?;
        for (ord, document) in (0u64..).zip(&documents) {
            let mut doc = TantivyDocument::new();
            doc.add_u64(fields.ord, ord);
            doc.add_text(fields.title, &document.title);
            doc.add_text(fields.content, &document.content);
            writer.add_document(doc)?;
        }
        writer.commit()?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            documents,
            reader,
            fields,
        })
    }

    pub fn documents(&self) -> &[SearchDocument] {
        &self.documents
    }

    /// Ranked hits for `query`, best first; ties keep document order.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Err(SearchError::Query(format!(
                "no searchable terms in {query:?}"
            )));
        }
        if limit == 0 || self.documents.is_empty() {
            return Ok(Vec::new());
        }

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::with_capacity(terms.len() * 2);
        for term in &terms {
            let distance = fuzzy_distance(term);
            let title = FuzzyTermQuery::new_prefix(
                Term::from_field_text(self.fields.title, term),
                distance,
                true,
            );
            let content = FuzzyTermQuery::new_prefix(
                Term::from_field_text(self.fields.content, term),
                distance,
                true,
            );
            clauses.push((
                Occur::Should,
                Box::new(BoostQuery::new(Box::new(title), TITLE_BOOST)),
            ));
            clauses.push((Occur::Should, Box::new(content)));
        }
        let query_tree = BooleanQuery::new(clauses);

        // Collect everything so ties can be ordered by document position.
        let searcher = self.reader.searcher();
        let top_docs = searcher.search(&query_tree, &TopDocs::with_limit(self.documents.len()))?;

        let mut scored = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            let ord = doc
                .get_first(self.fields.ord)
                .and_then(|v| v.as_u64())
                .and_then(|v| usize::try_from(v).ok());
            if let Some(ord) = ord.filter(|ord| *ord < self.documents.len()) {
                scored.push((score, ord));
            }
        }
        scored.sort_by(|(a_score, a_ord), (b_score, b_ord)| {
            b_score
                .partial_cmp(a_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a_ord.cmp(b_ord))
        });
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(score, ord)| {
                let document = &self.documents[ord];
                SearchHit {
                    id: document.id.clone(),
                    title: document.title.clone(),
                    slug: document.slug.clone(),
                    kind: document.kind,
                    score,
                    excerpt: excerpt(&document.content, query),
                }
            })
            .collect())
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Lowercased alphanumeric runs, as the default tantivy tokenizer sees them.
fn query_terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && t.len() <= MAX_TOKEN_LEN)
        .map(str::to_lowercase)
        .collect()
}

/// Edit distance allowed for a query term.
fn fuzzy_distance(term: &str) -> u8 {
    match term.chars().count() {
        0..=3 => 0,
        4..=7 => 1,
        _ => 2,
    }
}

/// Lazily built, atomically swapped search index over a document source.
pub struct SearchIndex {
    source: Arc<dyn DocumentSource>,
    /// Serializes builds.
    build_lock: Mutex<()>,
    /// Current snapshot; `None` until built or after invalidation.
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl SearchIndex {
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self {
            source,
            build_lock: Mutex::new(()),
            current: RwLock::new(None),
        }
    }

    pub fn is_built(&self) -> bool {
        self.current.read().unwrap().is_some()
    }

    /// Current snapshot, building it first if needed.
    pub fn snapshot(&self) -> Result<Arc<Snapshot>, SearchError> {
        if let Some(snapshot) = self.current.read().unwrap().as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let _guard = self.build_lock.lock().unwrap();
        // Another thread may have built it while we waited.
        if let Some(snapshot) = self.current.read().unwrap().as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let snapshot = Arc::new(self.build_snapshot()?);
        *self.current.write().unwrap() = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Rebuild from the source and swap the result in.
    ///
    /// Queries keep using the previous snapshot until the swap.
    pub fn rebuild(&self) -> Result<Arc<Snapshot>, SearchError> {
        let _guard = self.build_lock.lock().unwrap();
        let snapshot = Arc::new(self.build_snapshot()?);
        *self.current.write().unwrap() = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Drop the current snapshot; the next query rebuilds.
    pub fn invalidate(&self) {
        *self.current.write().unwrap() = None;
    }

    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        self.snapshot()?.search(query, limit)
    }

    pub fn documents(&self) -> Result<Vec<SearchDocument>, SearchError> {
        Ok(self.snapshot()?.documents().to_vec())
    }

    fn build_snapshot(&self) -> Result<Snapshot, SearchError> {
        let start = Instant::now();
        let documents = self.source.documents();
        let count = documents.len();
        let snapshot = Snapshot::build(documents)?;
        tracing::info!(
            documents = count,
            elapsed_ms = elapsed_ms(start),
            "Search index built"
        );
        Ok(snapshot)
    }
}
