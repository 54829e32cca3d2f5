//! `blox ls`: key normalization, entry lookup and column rendering.

use std::io::{self, Write};

use anyhow::{anyhow, Context};
use async_stream::try_stream;
use blox_store::BlockStore;
use blox_types::{ContentId, TextBase};
use futures::stream::{BoxStream, StreamExt};
use serde::Serialize;

const NAMESPACE: &str = "/blox/";

/// A listing key after normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListKey {
    pub path: String,
    /// Path components of the key, used to indent deeper entries.
    pub depth: usize,
    segments: Vec<String>,
}

impl ListKey {
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Collapse repeated slashes, drop trailing ones and strip the `/blox/`
/// namespace prefix.
pub fn normalize_key(key: &str) -> ListKey {
    let mut path = String::with_capacity(key.len());
    for c in key.chars() {
        if c == '/' && path.ends_with('/') {
            continue;
        }
        path.push(c);
    }
    while path.ends_with('/') {
        path.pop();
    }

    let mut parts: Vec<&str> = path.split('/').collect();
    if path.starts_with(NAMESPACE) {
        parts.drain(..2);
    }
    let segments = parts
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string())
        .collect();
    ListKey {
        depth: parts.len(),
        path,
        segments,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    pub id: ContentId,
    pub name: String,
    pub size: Option<u64>,
    pub kind: EntryKind,
    pub depth: usize,
}

/// Lists the block store as a flat namespace.
///
/// The root key lists every block; a block identifier lists that block.
pub struct StoreLister<'a> {
    store: &'a dyn BlockStore,
}

impl<'a> StoreLister<'a> {
    pub fn new(store: &'a dyn BlockStore) -> Self {
        Self { store }
    }

    /// Entries under `key`, looked up one at a time as the stream is polled.
    pub fn list(&self, key: &ListKey) -> BoxStream<'a, anyhow::Result<ListEntry>> {
        let store = self.store;
        let key = key.clone();
        let entries = try_stream! {
            let ids = match key.segments.as_slice() {
                [] => {
                    let mut ids = store.list().await?;
                    ids.sort();
                    ids
                }
                [single] => {
                    let id = single
                        .parse::<ContentId>()
                        .with_context(|| format!("invalid key {}", key.path))?;
                    vec![id]
                }
                _ => Err(anyhow!("{}: blocks have no named links", key.path))?,
            };

            for id in ids {
                let block = store
                    .get(&id)
                    .await?
                    .ok_or_else(|| anyhow!("block not found: {id}"))?;
                yield ListEntry {
                    id,
                    name: id.short(),
                    size: Some(block.size()),
                    kind: EntryKind::File,
                    depth: key.depth,
                };
            }
        };
        entries.boxed()
    }
}

/// Writes entries as aligned columns, one line per entry as it arrives.
///
/// Column widths only grow, so earlier lines are never rewritten.
pub struct ListingPrinter<W> {
    out: W,
    key_depth: usize,
    headers: bool,
    base: TextBase,
    first: bool,
    id_width: usize,
    size_width: usize,
}

impl<W: Write> ListingPrinter<W> {
    pub fn new(out: W, key_depth: usize, headers: bool) -> Self {
        Self {
            out,
            key_depth,
            headers,
            base: TextBase::default(),
            first: true,
            id_width: 0,
            size_width: 0,
        }
    }

    /// Render identifiers in `base` instead of base16.
    pub fn with_base(mut self, base: TextBase) -> Self {
        self.base = base;
        self
    }

    pub fn print(&mut self, entry: &ListEntry) -> io::Result<()> {
        let id = entry.id.to_text_in(self.base);
        let size = entry
            .size
            .map_or_else(|| "-".to_string(), |s| s.to_string());
        self.id_width = self.id_width.max(id.len());
        self.size_width = self.size_width.max(size.len());

        if self.first {
            self.first = false;
            if self.headers {
                self.id_width = self.id_width.max("Hash".len());
                self.size_width = self.size_width.max("Size".len());
                self.line("Hash", "Size", "Name", 0)?;
            }
        }

        let name = match entry.kind {
            EntryKind::Dir => format!("{}/", entry.name),
            EntryKind::File => entry.name.clone(),
        };
        self.line(&id, &size, &name, entry.depth)
    }

    fn line(&mut self, id: &str, size: &str, name: &str, depth: usize) -> io::Result<()> {
        let indent = "  ".repeat(depth.saturating_sub(self.key_depth));
        writeln!(
            self.out,
            "{id:<iw$}{size:<sw$}{indent}{name}",
            iw = self.id_width + 1,
            sw = self.size_width + 1,
        )
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blox_store::{Block, InMemoryBlockStore};
    use blox_types::BlockFormat;
    use futures::TryStreamExt;

    fn entry(seed: &str, size: Option<u64>, kind: EntryKind, depth: usize) -> ListEntry {
        ListEntry {
            id: ContentId::compute(BlockFormat::Raw, seed.as_bytes()),
            name: seed.to_string(),
            size,
            kind,
            depth,
        }
    }

    fn render(key_depth: usize, headers: bool, entries: &[ListEntry]) -> Vec<String> {
        render_in(TextBase::Base16, key_depth, headers, entries)
    }

    fn render_in(
        base: TextBase,
        key_depth: usize,
        headers: bool,
        entries: &[ListEntry],
    ) -> Vec<String> {
        let mut printer = ListingPrinter::new(Vec::new(), key_depth, headers).with_base(base);
        for e in entries {
            printer.print(e).unwrap();
        }
        String::from_utf8(printer.into_inner())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn key_normalization() {
        let key = normalize_key("//blox///abc//");
        assert_eq!(key.path, "/blox/abc");
        assert_eq!(key.depth, 1);
        assert!(!key.is_root());

        assert_eq!(normalize_key("a//b/").path, "a/b");
        assert_eq!(normalize_key("a//b/").depth, 2);
        assert!(normalize_key("/").is_root());
        assert!(normalize_key("").is_root());
    }

    #[test]
    fn headers_come_first_and_widen_columns() {
        let e = entry("x", Some(5), EntryKind::File, 1);
        let id = e.id.to_string();
        let lines = render(1, true, &[e]);
        assert_eq!(lines[0], format!("{:<w$}Size Name", "Hash", w = id.len() + 1));
        assert_eq!(lines[1], format!("{id} 5    x"));
    }

    #[test]
    fn directories_get_a_slash_and_depth_indents() {
        let dir = entry("sub", None, EntryKind::Dir, 1);
        let file = entry("leaf", Some(3), EntryKind::File, 3);
        let lines = render(1, false, &[dir.clone(), file.clone()]);
        assert_eq!(lines[0], format!("{} - sub/", dir.id));
        assert_eq!(lines[1], format!("{} 3     leaf", file.id));
    }

    #[test]
    fn widths_only_grow() {
        let small = entry("a", Some(1), EntryKind::File, 0);
        let big = entry("b", Some(12345), EntryKind::File, 0);
        let lines = render(0, false, &[small.clone(), big.clone(), small.clone()]);
        assert_eq!(lines[0], format!("{} 1 a", small.id));
        assert_eq!(lines[1], format!("{} 12345 b", big.id));
        assert_eq!(lines[2], format!("{} 1     a", small.id));
    }

    #[test]
    fn identifiers_render_in_the_chosen_base() {
        let e = entry("based", Some(7), EntryKind::File, 0);
        let hex = render_in(TextBase::Base16, 0, false, &[e.clone()]);
        assert_eq!(hex[0], format!("{} 7 based", e.id));

        let b32 = e.id.to_text_in(TextBase::Base32);
        assert!(b32.starts_with('b'));
        let lines = render_in(TextBase::Base32, 0, true, &[e.clone()]);
        assert_eq!(lines[0], format!("{:<w$}Size Name", "Hash", w = b32.len() + 1));
        assert_eq!(lines[1], format!("{b32} 7    based"));
        assert_eq!(b32.parse::<ContentId>().unwrap(), e.id);
    }

    #[tokio::test]
    async fn lists_store_as_flat_namespace() {
        let store = InMemoryBlockStore::new();
        let a = store
            .put(Block::new(BlockFormat::Raw, b"aa".to_vec()))
            .await
            .unwrap();
        let b = store
            .put(Block::new(BlockFormat::Raw, b"bbbb".to_vec()))
            .await
            .unwrap();
        let lister = StoreLister::new(&store);

        let all: Vec<ListEntry> = lister.list(&normalize_key("/")).try_collect().await.unwrap();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(all.iter().map(|e| e.id).collect::<Vec<_>>(), expected);

        let one: Vec<ListEntry> = lister
            .list(&normalize_key(&format!("/blox/{b}/")))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].size, Some(4));

        let missing = ContentId::compute(BlockFormat::Raw, b"nope");
        let missing = lister
            .list(&normalize_key(&missing.to_string()))
            .try_collect::<Vec<_>>()
            .await;
        assert!(missing.is_err());
        let nested = lister
            .list(&normalize_key("/blox/x/y"))
            .try_collect::<Vec<_>>()
            .await;
        assert!(nested.is_err());
    }

    #[tokio::test]
    async fn listing_is_lazy_and_stops_at_the_first_error() {
        let store = InMemoryBlockStore::new();
        let lister = StoreLister::new(&store);
        let mut entries = lister.list(&normalize_key("/"));
        // Blocks added before the first poll are still seen.
        let id = store
            .put(Block::new(BlockFormat::Raw, b"late".to_vec()))
            .await
            .unwrap();
        assert_eq!(entries.next().await.unwrap().unwrap().id, id);
        assert!(entries.next().await.is_none());

        let mut bad = lister.list(&normalize_key("not-an-id"));
        assert!(bad.next().await.unwrap().is_err());
        assert!(bad.next().await.is_none());
    }
}
