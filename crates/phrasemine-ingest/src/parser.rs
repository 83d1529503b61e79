//! Document parsing: pull the text of one structural tag out of each record,
//! fanned out over a fixed worker pool.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use rayon::prelude::*;
use rayon::ThreadPool;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use walkdir::WalkDir;

use phrasemine_core::{Error, Result};
use phrasemine_store::{DocumentId, ShardTexts};

/// XML empty-element tags (`<name attrs/>`). The HTML5 tree builder would
/// otherwise leave them open over their following siblings.
static EMPTY_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([A-Za-z][\w:.-]*)((?:\s[^<>]*?)?)\s*/>").expect("empty-element regex"));

/// Result of parsing every document in one shard directory.
#[derive(Debug, Default)]
pub struct ParsedShard {
    pub docs: ShardTexts,
    /// Documents that could not be read; present in `docs` with empty text.
    pub read_failures: usize,
    /// Documents whose id collided with an earlier file in the same shard.
    pub duplicate_ids: usize,
}

/// Extracts the concatenated text of every occurrence of one tag.
///
/// Markup is parsed with an error-tolerant HTML5 tree builder, so patent XML
/// with DTD headers still yields its text. Empty-element tags are expanded to
/// open/close pairs first.
pub struct DocumentParser {
    tag: String,
    selector: Selector,
}

impl DocumentParser {
    pub fn new(tag: &str) -> Result<Self> {
        let tag = tag.trim().to_ascii_lowercase();
        let selector = Selector::parse(&tag)
            .map_err(|e| Error::Config(format!("invalid content tag '{}': {:?}", tag, e)))?;
        Ok(Self { tag, selector })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Text of all tag occurrences in document order. Empty when the tag is absent.
    pub fn extract(&self, markup: &str) -> String {
        let markup = EMPTY_ELEMENT.replace_all(markup, "<$1$2></$1>");
        let document = Html::parse_document(&markup);
        document
            .select(&self.selector)
            .flat_map(|el| el.text())
            .collect()
    }

    /// Parse one document file into its (document-id, text) pair.
    pub fn parse_file(&self, path: &Path) -> Result<(DocumentId, String)> {
        let id = document_id(path);
        let bytes = std::fs::read(path)
            .map_err(|e| Error::Parse(format!("{}: {}", path.display(), e)))?;
        let markup = String::from_utf8_lossy(&bytes);
        Ok((id, self.extract(&markup)))
    }

    /// Parse one document; a read failure is reported and yields empty text.
    pub fn parse_document(&self, path: &Path) -> (DocumentId, String) {
        match self.parse_file(path) {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Unreadable document, recording empty text: {}", e);
                (document_id(path), String::new())
            }
        }
    }

    /// Parse every document under `dir` on `pool` and join the results by id.
    ///
    /// Workers share nothing but the parser itself; completion order does not
    /// matter because results are keyed, not sequenced.
    pub fn parse_shard(&self, dir: &Path, pool: &ThreadPool) -> Result<ParsedShard> {
        let files = collect_documents(dir)?;
        debug!("Parsing {} documents under {}", files.len(), dir.display());

        let results: Vec<(DocumentId, Option<String>)> = pool.install(|| {
            files
                .par_iter()
                .map(|path| match self.parse_file(path) {
                    Ok((id, text)) => (id, Some(text)),
                    Err(e) => {
                        warn!("Unreadable document, recording empty text: {}", e);
                        (document_id(path), None)
                    }
                })
                .collect()
        });

        let mut shard = ParsedShard::default();
        for (id, text) in results {
            if text.is_none() {
                shard.read_failures += 1;
            }
            if shard.docs.contains_key(&id) {
                warn!("Duplicate document id {} in {}", id, dir.display());
                shard.duplicate_ids += 1;
                continue;
            }
            shard.docs.insert(id, text.unwrap_or_default());
        }
        Ok(shard)
    }
}

/// Document id: the file name of the record.
pub fn document_id(path: &Path) -> DocumentId {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// All regular files below a shard directory, in a stable order.
pub fn collect_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Parse(format!("walk {}: {}", dir.display(), e)))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Fixed-size worker pool for document fan-out.
pub fn build_pool(workers: usize) -> Result<ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("phrasemine-parse-{}", i))
        .build()
        .map_err(|e| Error::Config(format!("failed to build worker pool: {}", e)))
}
