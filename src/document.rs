use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::{Bookmark, Dictionary, Error, Object, ObjectId, Result, Stream};
use crate::encodings::{self, Encoding};
use crate::encryption::crypt_filters::{Aes128CryptFilter, Aes256CryptFilter, CryptFilter, IdentityCryptFilter, Rc4CryptFilter};
use crate::encryption::{decrypt_object, encrypt_object, EncryptionState};
use crate::xref::{Xref, XrefType};

/// In-memory PDF document: every indirect object the reader produced, keyed
/// by object id, plus the trailer and cross-reference table used to resolve
/// them. Objects are not necessarily reachable from the catalog — malformed
/// or edited documents may carry orphans until `prune_objects` runs.
#[derive(Debug, Clone)]
pub struct Document {
    /// The version of the PDF specification this document conforms to, e.g. "1.5".
    pub version: String,
    /// Trailer dictionary of the last loaded (or constructed) document.
    pub trailer: Dictionary,
    /// Cross-reference table used to locate an object's bytes while loading.
    pub reference_table: Xref,
    /// All indirect objects, keyed by object id.
    pub objects: BTreeMap<ObjectId, Object>,
    /// Highest object number assigned so far.
    pub max_id: u32,
    pub bookmarks: Vec<u32>,
    pub bookmark_table: BTreeMap<u32, Bookmark>,
    pub max_bookmark_id: u32,
    /// Reverse page-number map, keyed by the object count it was built
    /// against. Rebuilt lazily whenever that count no longer matches.
    page_number_cache: RefCell<Option<(usize, BTreeMap<ObjectId, u32>)>>,
    /// Set once `decrypt` or `encrypt` has run; `trailer`'s `Encrypt` entry
    /// is the source of truth for whether the document is *currently*
    /// encrypted, this just records that the state was resolved at some
    /// point (kept around after `decrypt` for callers inspecting history).
    pub encryption_state: Option<EncryptionState>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty PDF document.
    pub fn new() -> Document {
        Document {
            version: "1.4".to_string(),
            trailer: Dictionary::new(),
            reference_table: Xref::new(0, XrefType::CrossReferenceTable),
            objects: BTreeMap::new(),
            max_id: 0,
            bookmarks: Vec::new(),
            bookmark_table: BTreeMap::new(),
            max_bookmark_id: 0,
            page_number_cache: RefCell::new(None),
            encryption_state: None,
        }
    }

    /// Start the "new" half of an incremental update: an otherwise empty
    /// document that continues `prev`'s object numbering and shares its
    /// trailer and outline state, so ids minted from it never collide with
    /// the ones already on disk.
    pub fn new_from_prev(prev: &Document) -> Document {
        Document {
            version: prev.version.clone(),
            trailer: prev.trailer.clone(),
            reference_table: Xref::new(prev.max_id + 1, XrefType::CrossReferenceTable),
            objects: BTreeMap::new(),
            max_id: prev.max_id,
            bookmarks: prev.bookmarks.clone(),
            bookmark_table: prev.bookmark_table.clone(),
            max_bookmark_id: prev.max_bookmark_id,
            page_number_cache: RefCell::new(None),
            encryption_state: prev.encryption_state.clone(),
        }
    }

    pub fn has_object(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn get_object(&self, id: ObjectId) -> Result<&Object> {
        self.objects.get(&id).ok_or(Error::ObjectNotFound)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Result<&mut Object> {
        self.objects.get_mut(&id).ok_or(Error::ObjectNotFound)
    }

    pub fn get_dictionary(&self, id: ObjectId) -> Result<&Dictionary> {
        self.get_object(id).and_then(Object::as_dict)
    }

    /// Follow `object` through however many `/Reference`s it takes to reach
    /// a direct object. Returns the id it was last found at (`None` if
    /// `object` was already direct) alongside the resolved object.
    pub fn dereference<'a>(&'a self, object: &'a Object) -> Result<(Option<ObjectId>, &'a Object)> {
        let mut id = None;
        let mut object = object;
        while let Object::Reference(ref_id) = *object {
            id = Some(ref_id);
            object = self.get_object(ref_id)?;
        }
        Ok((id, object))
    }

    /// The document catalog (`/Root` of the trailer).
    pub fn catalog(&self) -> Result<&Dictionary> {
        self.trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .and_then(|id| self.get_dictionary(id))
    }

    /// Look up `key` in `dict`, dereferencing it and requiring a dictionary.
    pub fn get_dict_in_dict<'a>(&'a self, dict: &'a Dictionary, key: &[u8]) -> Result<&'a Dictionary> {
        dict.get(key)
            .and_then(|value| self.dereference(value))
            .and_then(|(_, object)| object.as_dict())
    }

    fn collect_pages(&self, node: ObjectId, visited: &mut BTreeSet<ObjectId>, pages: &mut Vec<ObjectId>) {
        if !visited.insert(node) {
            return;
        }
        let Ok(dict) = self.get_dictionary(node) else {
            return;
        };
        match dict.get(b"Kids").and_then(Object::as_array) {
            Ok(kids) => {
                for kid in kids {
                    if let Ok(kid_id) = kid.as_reference() {
                        self.collect_pages(kid_id, visited, pages);
                    }
                }
            }
            Err(_) => pages.push(node),
        }
    }

    /// Page object ids in document order, following `Kids` from the root
    /// page tree node and skipping already-visited nodes so a cyclic
    /// `/Parent`/`/Kids` graph can't loop forever.
    pub fn page_iter(&self) -> impl Iterator<Item = ObjectId> + '_ {
        let mut pages = Vec::new();
        if let Ok(catalog) = self.catalog() {
            if let Ok(pages_id) = catalog.get(b"Pages").and_then(Object::as_reference) {
                let mut visited = BTreeSet::new();
                self.collect_pages(pages_id, &mut visited, &mut pages);
            }
        }
        pages.into_iter()
    }

    /// 1-based page number -> page object id.
    pub fn get_pages(&self) -> BTreeMap<u32, ObjectId> {
        self.page_iter().enumerate().map(|(i, id)| ((i + 1) as u32, id)).collect()
    }

    /// Number of pages reachable under a `Pages` node, per its `/Count`
    /// entry. A leaf `Page` node (no `/Kids`) always counts as one, even
    /// without a `/Count` entry of its own. Already-visited nodes (cyclic
    /// `/Parent`/`/Kids` graphs) count as zero so descent can't loop.
    fn subtree_count(&self, node: ObjectId, visited: &BTreeSet<ObjectId>) -> u32 {
        if visited.contains(&node) {
            return 0;
        }
        let Ok(dict) = self.get_dictionary(node) else {
            return 0;
        };
        if dict.has(b"Kids") {
            dict.get(b"Count").and_then(Object::as_i64).map(|n| n.max(0) as u32).unwrap_or(0)
        } else {
            1
        }
    }

    /// Descend the page tree to the `index`-th page (0-based) by skipping
    /// whole sibling subtrees using their `/Count`, rather than visiting
    /// every leaf — O(depth * fan-out) instead of O(page count).
    fn nth_page_in(&self, node: ObjectId, mut index: u32, visited: &mut BTreeSet<ObjectId>) -> Option<ObjectId> {
        if !visited.insert(node) {
            return None;
        }
        let dict = self.get_dictionary(node).ok()?;
        match dict.get(b"Kids").and_then(Object::as_array) {
            Ok(kids) => {
                for kid in kids {
                    let kid_id = kid.as_reference().ok()?;
                    let count = self.subtree_count(kid_id, visited);
                    if index < count {
                        return self.nth_page_in(kid_id, index, visited);
                    }
                    index -= count;
                }
                None
            }
            Err(_) => (index == 0).then_some(node),
        }
    }

    /// The `index`-th page (0-based) without enumerating every page before
    /// it, using `/Count` to skip whole sibling subtrees at each level.
    pub fn nth_page(&self, index: u32) -> Option<ObjectId> {
        let catalog = self.catalog().ok()?;
        let pages_id = catalog.get(b"Pages").and_then(Object::as_reference).ok()?;
        let mut visited = BTreeSet::new();
        self.nth_page_in(pages_id, index, &mut visited)
    }

    /// The 1-based page number a page object lives at, the inverse of
    /// `get_pages`. Lazily builds a reverse `ObjectId -> page number` map
    /// the first time it's called (or after the object count changes) so
    /// repeated lookups are a `BTreeMap` probe rather than a fresh walk.
    pub fn lookup_page_number(&self, page_id: ObjectId) -> Option<u32> {
        let mut cache = self.page_number_cache.borrow_mut();
        let stale = match &*cache {
            Some((built_at, _)) => *built_at != self.objects.len(),
            None => true,
        };
        if stale {
            let map = self.page_iter().enumerate().map(|(i, id)| (id, (i + 1) as u32)).collect();
            *cache = Some((self.objects.len(), map));
        }
        cache.as_ref().and_then(|(_, map)| map.get(&page_id).copied())
    }

    /// Look up an attribute on a page dictionary, walking `/Parent` links
    /// when the page itself doesn't carry it. `Resources`, `MediaBox`,
    /// `CropBox` and `Rotate` are inheritable per PDF32000-1 §7.7.3.4; the
    /// value returned is never written back into the page's own dict.
    pub fn get_page_attribute(&self, page_id: ObjectId, key: &[u8]) -> Result<&Object> {
        const MAX_ANCESTORS: usize = 64;
        let mut node = self.get_dictionary(page_id)?;
        for _ in 0..MAX_ANCESTORS {
            match node.get(key) {
                Ok(value) => return Ok(value),
                Err(_) => {
                    let parent_id = node.get(b"Parent").and_then(Object::as_reference)?;
                    node = self.get_dictionary(parent_id)?;
                }
            }
        }
        Err(Error::DictKey(String::from_utf8_lossy(key).to_string()))
    }

    fn collect_fonts_from_resources<'a>(
        &'a self, resources: &'a Dictionary, fonts: &mut BTreeMap<Vec<u8>, &'a Dictionary>,
    ) {
        let Ok(font_dict) = resources
            .get(b"Font")
            .and_then(|value| self.dereference(value))
            .and_then(|(_, object)| object.as_dict())
        else {
            return;
        };
        for (name, value) in font_dict.iter() {
            if let Ok((_, object)) = self.dereference(value) {
                if let Ok(font) = object.as_dict() {
                    fonts.insert(name.clone(), font);
                }
            }
        }
    }

    /// Fonts named in a page's (possibly inherited) resource dictionary,
    /// keyed by the resource name used to invoke them with `Tf`.
    pub fn get_page_fonts(&self, page_id: ObjectId) -> BTreeMap<Vec<u8>, &Dictionary> {
        let mut fonts = BTreeMap::new();
        if let Ok((_, resources)) = self
            .get_page_attribute(page_id, b"Resources")
            .and_then(|value| self.dereference(value))
        {
            if let Ok(resources) = resources.as_dict() {
                self.collect_fonts_from_resources(resources, &mut fonts);
            }
        }
        fonts
    }

    /// Concatenated, filter-decoded content of a page's `/Contents` stream(s).
    pub fn get_page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page = self.get_dictionary(page_id)?;
        let contents = page.get(b"Contents")?;
        let mut content = Vec::new();
        match contents {
            Object::Reference(id) => {
                content.extend(self.get_object(*id).and_then(Object::as_stream)?.get_plain_content()?);
            }
            Object::Array(streams) => {
                for stream in streams {
                    let id = stream.as_reference()?;
                    content.extend(self.get_object(id).and_then(Object::as_stream)?.get_plain_content()?);
                    content.push(b'\n');
                }
            }
            _ => {
                return Err(Error::ObjectType {
                    expected: "Reference or Array",
                    found: contents.enum_variant(),
                })
            }
        }
        Ok(content)
    }

    /// Append content to a page, leaving any content already there intact.
    /// A single content stream is extended in place; a multi-stream page
    /// gets a new stream appended to its `/Contents` array.
    pub fn add_page_contents(&mut self, page_id: ObjectId, content: Vec<u8>) -> Result<()> {
        let contents = self.get_dictionary(page_id).and_then(|page| page.get(b"Contents")).cloned()?;
        match contents {
            Object::Reference(id) => {
                if let Ok(Object::Stream(stream)) = self.get_object_mut(id) {
                    let mut existing = stream.get_plain_content().unwrap_or_default();
                    existing.push(b'\n');
                    existing.extend(content);
                    stream.set_plain_content(existing);
                    let _ = stream.compress();
                }
            }
            Object::Array(mut streams) => {
                let new_stream = self.add_object(Stream::new(Dictionary::new(), content));
                streams.push(Object::Reference(new_stream));
                if let Ok(Object::Dictionary(dict)) = self.get_object_mut(page_id) {
                    dict.set("Contents", streams);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Decode a string operand's bytes with a font's resolved encoding,
    /// falling back to PDFDocEncoding when no font is known (e.g. the
    /// string comes from outside a `BT`/`ET` text object).
    pub fn decode_text(encoding: Option<&Encoding>, bytes: &[u8]) -> String {
        match encoding {
            Some(encoding) => encoding.bytes_to_string(bytes),
            None => encodings::bytes_to_string(&encodings::PDF_DOC_ENCODING, bytes),
        }
    }

    /// Inverse of `decode_text`.
    pub fn encode_text(encoding: Option<&Encoding>, text: &str) -> Vec<u8> {
        match encoding {
            Some(encoding) => encoding.string_to_bytes(text),
            None => encodings::string_to_bytes(&encodings::PDF_DOC_ENCODING, text),
        }
    }

    fn traverse_object<A: Fn(&mut Object)>(action: &A, object: &mut Object, refs: &mut BTreeSet<ObjectId>) {
        action(object);
        match object {
            Object::Array(array) => {
                for item in array.iter_mut() {
                    if let Object::Reference(id) = item {
                        refs.insert(*id);
                    }
                    Self::traverse_object(action, item, refs);
                }
            }
            Object::Dictionary(dict) => {
                for (_, item) in dict.iter_mut() {
                    if let Object::Reference(id) = item {
                        refs.insert(*id);
                    }
                    Self::traverse_object(action, item, refs);
                }
            }
            Object::Stream(stream) => {
                for (_, item) in stream.dict.iter_mut() {
                    if let Object::Reference(id) = item {
                        refs.insert(*id);
                    }
                    Self::traverse_object(action, item, refs);
                }
            }
            _ => {}
        }
    }

    /// Run `action` over every object in the arena and the trailer,
    /// recursing into arrays/dictionaries/stream dicts, and return every
    /// object id referenced from anywhere. Used to find unreachable
    /// objects (`prune_objects`) and to rewrite references in bulk
    /// (`renumber_objects_with`).
    pub fn traverse_objects<A: Fn(&mut Object)>(&mut self, action: A) -> BTreeSet<ObjectId> {
        let mut refs = BTreeSet::new();
        for object in self.objects.values_mut() {
            Self::traverse_object(&action, object, &mut refs);
        }
        let mut trailer = std::mem::take(&mut self.trailer);
        for (_, item) in trailer.iter_mut() {
            if let Object::Reference(id) = item {
                refs.insert(*id);
            }
            Self::traverse_object(&action, item, &mut refs);
        }
        self.trailer = trailer;
        refs
    }

    /// Whether the trailer still carries an `/Encrypt` entry. Becomes
    /// `false` once `decrypt` succeeds, since `decrypt` removes it.
    pub fn is_encrypted(&self) -> bool {
        self.trailer.has(b"Encrypt")
    }

    /// Whether `encrypt` or a successful `decrypt` has run against this
    /// document, regardless of its current `is_encrypted` state.
    pub fn was_encrypted(&self) -> bool {
        self.encryption_state.is_some()
    }

    /// Resolve the trailer's `/Encrypt` entry to its dictionary, following
    /// an indirect reference if it is one.
    pub fn get_encrypted(&self) -> Result<&Dictionary> {
        match self.trailer.get(b"Encrypt")? {
            Object::Reference(id) => self.get_dictionary(*id),
            Object::Dictionary(dict) => Ok(dict),
            _ => Err(Error::DictKey("Encrypt".to_string())),
        }
    }

    /// Crypt filters named in `/Encrypt`'s `/CF` sub-dictionary, keyed by
    /// filter name (e.g. `StdCF`), plus the built-in `Identity` filter
    /// every document can reference even without declaring it.
    pub fn get_crypt_filters(&self) -> BTreeMap<Vec<u8>, Arc<dyn CryptFilter>> {
        let mut filters: BTreeMap<Vec<u8>, Arc<dyn CryptFilter>> = BTreeMap::new();
        filters.insert(b"Identity".to_vec(), Arc::new(IdentityCryptFilter));

        let Ok(encrypted) = self.get_encrypted() else {
            return filters;
        };
        let Ok(cf) = encrypted.get(b"CF").and_then(Object::as_dict) else {
            return filters;
        };

        for (name, filter_obj) in cf.iter() {
            let Ok(filter_dict) = filter_obj.as_dict() else { continue };
            let cfm = filter_dict.get(b"CFM").and_then(Object::as_name).unwrap_or(&b"Identity"[..]);
            let filter: Arc<dyn CryptFilter> = match cfm {
                b"V2" => Arc::new(Rc4CryptFilter),
                b"AESV2" => Arc::new(Aes128CryptFilter),
                b"AESV3" => Arc::new(Aes256CryptFilter),
                _ => Arc::new(IdentityCryptFilter),
            };
            filters.insert(name.clone(), filter);
        }

        filters
    }

    /// Encrypt every string and stream in the document with `state` and
    /// record `/Encrypt` in the trailer. Cross-reference streams and, when
    /// `EncryptMetadata` is false, the `Metadata` stream are left alone
    /// per PDF 32000-1 ("Crypt" module).
    pub fn encrypt(&mut self, state: &EncryptionState) -> Result<()> {
        let ids: Vec<ObjectId> = self.objects.keys().cloned().collect();
        for id in ids {
            if let Some(object) = self.objects.get_mut(&id) {
                encrypt_object(state, id, object)?;
            }
        }
        self.trailer.set("Encrypt", Object::Dictionary(state.encode()?));
        self.encryption_state = Some(state.clone());
        Ok(())
    }

    /// Validate `password` against the document's `/Encrypt` dictionary,
    /// decrypt every string and stream in place, and drop `/Encrypt` from
    /// the trailer. No-op success if the document isn't encrypted.
    pub fn decrypt<P: AsRef<[u8]>>(&mut self, password: P) -> Result<()> {
        if !self.is_encrypted() {
            return Ok(());
        }

        let state = EncryptionState::decode(self, password)?;

        let ids: Vec<ObjectId> = self.objects.keys().cloned().collect();
        for id in ids {
            if let Some(object) = self.objects.get_mut(&id) {
                decrypt_object(&state, id, object)?;
            }
        }

        self.trailer.remove(b"Encrypt");
        self.encryption_state = Some(state);
        Ok(())
    }
}
