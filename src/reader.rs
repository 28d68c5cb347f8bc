use log::{error, warn};
use std::cmp;
use std::convert::TryInto;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Mutex;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use std::collections::{BTreeMap, HashSet};

use super::parser;
use super::parser::ParserInput;
use super::{Dictionary, Document, Object, ObjectId};
use crate::error::XrefError;
use crate::object_stream::ObjectStream;
use crate::xref::{Xref, XrefEntry, XrefType};
use crate::{Error, Result};

impl Document {
    /// Load a PDF document from a specified file path.
    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Document> {
        let file = File::open(path)?;
        let capacity = Some(file.metadata()?.len() as usize);
        Self::load_internal(file, capacity)
    }

    /// Load a PDF document from an arbitrary source.
    #[inline]
    pub fn load_from<R: Read>(source: R) -> Result<Document> {
        Self::load_internal(source, None)
    }

    /// Load a PDF document from a file path, decrypting it with `password`
    /// if it's encrypted. A no-op decrypt (and no error) if it isn't.
    pub fn load_with_password<P: AsRef<Path>>(path: P, password: &str) -> Result<Document> {
        let mut doc = Self::load(path)?;
        doc.decrypt(password)?;
        Ok(doc)
    }

    fn load_internal<R: Read>(mut source: R, capacity: Option<usize>) -> Result<Document> {
        let mut buffer = capacity.map(Vec::with_capacity).unwrap_or_else(Vec::new);
        source.read_to_end(&mut buffer)?;

        Reader {
            buffer: &buffer,
            document: Document::new(),
        }
        .read()
    }

    /// Load a PDF document from a memory slice.
    pub fn load_mem(buffer: &[u8]) -> Result<Document> {
        buffer.try_into()
    }
}

impl TryInto<Document> for &[u8] {
    type Error = Error;

    fn try_into(self) -> Result<Document> {
        Reader {
            buffer: self,
            document: Document::new(),
        }
        .read()
    }
}

pub struct Reader<'a> {
    buffer: &'a [u8],
    document: Document,
}

/// Maximum allowed embedding of literal strings.
pub const MAX_BRACKET: usize = 100;

impl<'a> Reader<'a> {
    /// Read whole document.
    fn read(mut self) -> Result<Document> {
        // The document structure can be expressed in PEG as:
        //   document <- header indirect_object* xref trailer xref_start
        let version = parser::header(ParserInput::new_extra(self.buffer, "")).ok_or(Error::Header)?;

        let (mut xref, mut trailer) = match self.read_xref_chain() {
            Ok(result) => result,
            Err(err) => {
                warn!("xref parse failure at open ({err}), entering repair mode");
                self.repair()?
            }
        };

        // Read previous Xrefs of linearized or incremental updated document.
        let mut prev_xref_start = trailer.remove(b"Prev");
        while let Some(prev) = prev_xref_start.and_then(|offset| offset.as_i64().ok()) {
            let prev = prev as usize;
            if prev > self.buffer.len() {
                return Err(Error::Xref(XrefError::PrevStart));
            }
            let (prev_xref, mut prev_trailer) =
                parser::xref_and_trailer(ParserInput::new_extra(&self.buffer[prev..], ""), &self)?;
            xref.extend(prev_xref);

            // Read xref stream in hybrid-reference file
            let prev_xref_stream_start = trailer.remove(b"XRefStm");
            if let Some(prev) = prev_xref_stream_start.and_then(|offset| offset.as_i64().ok()) {
                let prev = prev as usize;
                if prev > self.buffer.len() {
                    return Err(Error::Xref(XrefError::StreamStart));
                }
                let (prev_xref, _) =
                    parser::xref_and_trailer(ParserInput::new_extra(&self.buffer[prev..], ""), &self)?;
                xref.extend(prev_xref);
            }

            prev_xref_start = prev_trailer.remove(b"Prev");
        }

        let xref_entry_count = xref.max_id() + 1;
        if xref.size != xref_entry_count {
            warn!(
                "Size entry of trailer dictionary is {}, correct value is {}.",
                xref.size, xref_entry_count
            );
            xref.size = xref_entry_count;
        }

        self.document.version = version;
        self.document.max_id = xref.size - 1;
        self.document.trailer = trailer;
        self.document.reference_table = xref;

        let zero_length_streams = Mutex::new(vec![]);
        let object_streams = Mutex::new(vec![]);

        let entries_filter_map = |(_, entry): (&_, &_)| {
            if let XrefEntry::Normal { offset, .. } = *entry {
                let (object_id, mut object) = self
                    .read_object(offset as usize, None)
                    .map_err(|e| error!("Object load error: {:?}", e))
                    .ok()?;
                if let Ok(ref mut stream) = object.as_stream_mut() {
                    if stream.dict.has_type(b"ObjStm") {
                        let obj_stream = ObjectStream::new(stream).ok()?;
                        let mut object_streams = object_streams.lock().unwrap();
                        object_streams.extend(obj_stream.objects);
                    } else if stream.content.is_empty() {
                        let mut zero_length_streams = zero_length_streams.lock().unwrap();
                        zero_length_streams.push(object_id);
                    }
                }
                Some((object_id, object))
            } else {
                None
            }
        };
        #[cfg(feature = "rayon")]
        {
            self.document.objects = self
                .document
                .reference_table
                .entries
                .par_iter()
                .filter_map(entries_filter_map)
                .collect();
        }
        #[cfg(not(feature = "rayon"))]
        {
            self.document.objects = self
                .document
                .reference_table
                .entries
                .iter()
                .filter_map(entries_filter_map)
                .collect();
        }
        self.document.objects.extend(object_streams.into_inner().unwrap());

        for object_id in zero_length_streams.into_inner().unwrap() {
            let _ = self.set_stream_content(object_id);
        }

        Ok(self.document)
    }

    /// Locate and parse the document's xref/trailer via the declared
    /// `startxref` offset, without falling back to repair. Split out of
    /// `read` so the caller can catch any failure here and retry via
    /// `repair` instead of aborting the load.
    fn read_xref_chain(&self) -> Result<(Xref, Dictionary)> {
        let xref_start = Self::get_xref_start(self.buffer)?;
        if xref_start > self.buffer.len() {
            return Err(Error::Xref(XrefError::Start));
        }
        parser::xref_and_trailer(ParserInput::new_extra(&self.buffer[xref_start..], ""), self)
    }

    /// Rebuild a cross-reference table by a linear scan of the buffer, used
    /// when the declared xref section is missing, truncated, or does not
    /// parse. Every `N G obj` header in the file is indexed; later
    /// occurrences of the same object number win, matching how an
    /// incrementally updated file's later xref section would have overridden
    /// the earlier one.
    fn repair(&self) -> Result<(Xref, Dictionary)> {
        let mut entries: BTreeMap<u32, (u16, usize)> = BTreeMap::new();
        let mut pos = 0;
        while let Some(obj_pos) = Self::search_substring(self.buffer, b"obj", pos) {
            if let Some((id, generation, start)) = Self::parse_obj_header_before(self.buffer, obj_pos) {
                entries.insert(id, (generation, start));
            }
            pos = obj_pos + 3;
        }

        if entries.is_empty() {
            return Err(Error::Xref(XrefError::Parse));
        }

        let size = entries.keys().copied().max().unwrap_or(0) + 1;
        let mut xref = Xref::new(size, XrefType::CrossReferenceTable);
        for (&id, &(generation, offset)) in &entries {
            xref.insert(id, XrefEntry::Normal { offset: offset as u32, generation });
        }

        let trailer = self.recover_trailer(&entries, size)?;
        Ok((xref, trailer))
    }

    /// Given the position of the `obj` keyword, scan backward over `N G obj`
    /// to recover the object number, generation, and the start offset of the
    /// object (the position of `N`).
    fn parse_obj_header_before(buffer: &[u8], obj_pos: usize) -> Option<(u32, u16, usize)> {
        let mut i = obj_pos;
        while i > 0 && buffer[i - 1].is_ascii_whitespace() {
            i -= 1;
        }
        let gen_end = i;
        while i > 0 && buffer[i - 1].is_ascii_digit() {
            i -= 1;
        }
        let gen_start = i;
        if gen_start == gen_end {
            return None;
        }
        while i > 0 && buffer[i - 1].is_ascii_whitespace() {
            i -= 1;
        }
        let id_end = i;
        while i > 0 && buffer[i - 1].is_ascii_digit() {
            i -= 1;
        }
        let id_start = i;
        if id_start == id_end {
            return None;
        }
        let id: u32 = std::str::from_utf8(&buffer[id_start..id_end]).ok()?.parse().ok()?;
        let generation: u16 = std::str::from_utf8(&buffer[gen_start..gen_end]).ok()?.parse().ok()?;
        Some((id, generation, id_start))
    }

    /// Recover a trailer dictionary after a repair scan: prefer a literal
    /// `trailer` keyword if the file still has one (common even when the
    /// xref table itself is corrupt), otherwise fall back to locating an
    /// object whose dictionary is `/Type /Catalog` and synthesizing the
    /// minimal `<< /Root /Size >>` trailer a classic reader would need.
    fn recover_trailer(&self, entries: &BTreeMap<u32, (u16, usize)>, size: u32) -> Result<Dictionary> {
        if let Some(pos) = Self::search_substring(self.buffer, b"trailer", 0) {
            if let Ok((_, dict)) = parser::trailer(ParserInput::new_extra(&self.buffer[pos..], "")) {
                return Ok(dict);
            }
        }

        for (&id, &(generation, offset)) in entries {
            let object_id = (id, generation);
            if let Ok((_, object)) = self.read_object(offset, Some(object_id)) {
                if let Ok(dict) = object.as_dict() {
                    if dict.has_type(b"Catalog") {
                        let mut trailer = Dictionary::new();
                        trailer.set("Root", Object::Reference(object_id));
                        trailer.set("Size", size as i64);
                        return Ok(trailer);
                    }
                }
            }
        }
        Err(Error::Trailer)
    }

    fn set_stream_content(&mut self, object_id: ObjectId) -> Result<()> {
        let length = self.get_stream_length(object_id)?;
        let stream = self
            .document
            .get_object_mut(object_id)
            .and_then(Object::as_stream_mut)?;
        let start = stream.start_position.ok_or(Error::ObjectNotFound)?;

        if length < 0 {
            return Err(Error::Syntax("Negative stream length.".to_string()));
        }

        let end = start + length as usize;

        if end > self.buffer.len() {
            return Err(Error::Syntax("Stream extends after document end.".to_string()));
        }

        stream.set_content(self.buffer[start..end].to_vec());
        Ok(())
    }

    fn get_stream_length(&self, object_id: ObjectId) -> Result<i64> {
        let object = self.document.get_object(object_id)?;
        let stream = object.as_stream()?;

        stream.dict.get(b"Length").and_then(|value| {
            if let Ok(id) = value.as_reference() {
                return self.document.get_object(id).and_then(Object::as_i64);
            }
            value.as_i64()
        })
    }

    /// Get object offset by object id.
    fn get_offset(&self, id: ObjectId) -> Result<u32> {
        let entry = self.document.reference_table.get(id.0).ok_or(Error::ObjectNotFound)?;
        match *entry {
            XrefEntry::Normal { offset, generation } => {
                if id.1 == generation {
                    Ok(offset)
                } else {
                    Err(Error::ObjectNotFound)
                }
            }
            _ => Err(Error::ObjectNotFound),
        }
    }

    pub fn get_object(&self, id: ObjectId) -> Result<Object> {
        let offset = self.get_offset(id)?;
        let (_, obj) = self.read_object(offset as usize, Some(id))?;

        Ok(obj)
    }

    fn read_object(&self, offset: usize, expected_id: Option<ObjectId>) -> Result<(ObjectId, Object)> {
        if offset > self.buffer.len() {
            return Err(Error::Offset(offset));
        }

        parser::indirect_object(
            ParserInput::new_extra(self.buffer, ""),
            offset,
            expected_id,
            self,
            &mut HashSet::new(),
        )
    }

    fn get_xref_start(buffer: &[u8]) -> Result<usize> {
        let seek_pos = buffer.len() - cmp::min(buffer.len(), 1024);
        Self::search_substring(buffer, b"%%EOF", seek_pos)
            .and_then(|eof_pos| if eof_pos > 25 { Some(eof_pos) } else { None })
            .and_then(|eof_pos| Self::search_substring(buffer, b"startxref", eof_pos - 25))
            .ok_or(Error::Xref(XrefError::Start))
            .and_then(|xref_pos| {
                if xref_pos <= buffer.len() {
                    match parser::xref_start(ParserInput::new_extra(&buffer[xref_pos..], "")) {
                        Some(startxref) => Ok(startxref as usize),
                        None => Err(Error::Xref(XrefError::Start)),
                    }
                } else {
                    Err(Error::Xref(XrefError::Start))
                }
            })
    }

    fn search_substring(buffer: &[u8], pattern: &[u8], start_pos: usize) -> Option<usize> {
        let mut seek_pos = start_pos;
        let mut index = 0;

        while seek_pos < buffer.len() && index < pattern.len() {
            if buffer[seek_pos] == pattern[index] {
                index += 1;
            } else if index > 0 {
                seek_pos -= index;
                index = 0;
            }
            seek_pos += 1;

            if index == pattern.len() {
                let res = seek_pos - index;
                return Self::search_substring(buffer, pattern, res + 1).or(Some(res));
            }
        }

        None
    }
}

/// Cursor over a possibly-incomplete buffer, for progressively loading a
/// document as bytes arrive (e.g. while streaming a linearized file off the
/// network). Each `poll` attempts a full parse of whatever has arrived so
/// far; while the buffer is short of the file's known total length and the
/// failure looks like truncation rather than corruption, `Error::TryLater`
/// is returned so the caller can buffer more bytes and retry, instead of
/// giving up on a real syntax error.
pub struct LoadProgress {
    total_len: Option<usize>,
}

impl LoadProgress {
    /// `total_len` is the file's full size if known in advance (e.g. from a
    /// `Content-Length` header); `None` means truncation can only be
    /// detected from the errors `poll` sees, never from a length mismatch.
    pub fn new(total_len: Option<usize>) -> LoadProgress {
        LoadProgress { total_len }
    }

    pub fn poll(&self, buffer: &[u8]) -> Result<Document> {
        match Document::load_mem(buffer) {
            Ok(doc) => Ok(doc),
            Err(err) if self.looks_truncated(buffer, &err) => Err(Error::TryLater),
            Err(err) => Err(err),
        }
    }

    fn looks_truncated(&self, buffer: &[u8], err: &Error) -> bool {
        let short_of_total = self.total_len.is_some_and(|total| buffer.len() < total);
        if !short_of_total {
            return false;
        }
        matches!(
            err,
            Error::Xref(_) | Error::Offset(_) | Error::IndirectObject { .. } | Error::Header
        )
    }
}

/// A minimal one-page document, deliberately carrying a broken xref section
/// so loading it always goes through repair mode (see
/// `repair_recovers_document_with_corrupt_xref`), independent of exact
/// byte offsets.
pub(crate) fn sample_pdf_bytes() -> Vec<u8> {
    let stream_content = "BT /F1 24 Tf 72 712 Td (Hello, World!) Tj ET\n";
    let body = format!(
        "%PDF-1.5\n\
1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n\
2 0 obj<</Type/Pages/Kids[3 0 R]/Count 1>>endobj\n\
3 0 obj<</Type/Page/Parent 2 0 R/MediaBox[0 0 612 792]/Contents 4 0 R/Resources<</Font<</F1 5 0 R>>>>>>endobj\n\
4 0 obj<</Length {}>>stream\n{}endstream endobj\n\
5 0 obj<</Type/Font/Subtype/Type1/BaseFont/Helvetica>>endobj\n",
        stream_content.len(),
        stream_content
    );
    format!("{body}xref\nnot a valid xref table\nstartxref\n999999\n%%EOF").into_bytes()
}

#[test]
fn load_document() {
    let mut doc = Document::load_mem(&sample_pdf_bytes()).unwrap();
    assert_eq!(doc.version, "1.5");
    doc.save("test_2_load.pdf").unwrap();
}

#[test]
#[should_panic(expected = "Xref(Parse)")]
fn load_short_document() {
    // No startxref at all: falls through to repair mode, which then also
    // fails since the buffer has no "N G obj" headers to index either.
    let _doc = Document::load_mem(b"%PDF-1.5\n%%EOF\n").unwrap();
}

#[test]
fn repair_recovers_document_with_corrupt_xref() {
    let doc_body = "%PDF-1.5\n\
1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n\
2 0 obj<</Type/Pages/Kids[3 0 R]/Count 1>>endobj\n\
3 0 obj<</Type/Page/Parent 2 0 R/MediaBox[0 0 612 792]>>endobj\n";
    // A deliberately broken xref/startxref section: repair mode must ignore
    // it and rebuild the table by scanning for object headers instead.
    let broken = format!("{doc_body}xref\nnot a valid xref table\nstartxref\n999999\n%%EOF");
    let doc = Document::load_mem(broken.as_bytes()).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}

#[test]
fn load_many_shallow_brackets() {
    let content: String = std::iter::repeat("()")
        .take(MAX_BRACKET * 10)
        .map(|x| x.chars())
        .flatten()
        .collect();
    const STREAM_CRUFT: usize = 33;
    let doc = format!(
        "%PDF-1.5
1 0 obj<</Type/Pages/Kids[5 0 R]/Count 1/Resources 3 0 R/MediaBox[0 0 595 842]>>endobj
2 0 obj<</Type/Font/Subtype/Type1/BaseFont/Courier>>endobj
3 0 obj<</Font<</F1 2 0 R>>>>endobj
5 0 obj<</Type/Page/Parent 1 0 R/Contents[4 0 R]>>endobj
6 0 obj<</Type/Catalog/Pages 1 0 R>>endobj
4 0 obj<</Length {}>>stream
BT
/F1 48 Tf
100 600 Td
({}) Tj
ET
endstream endobj\n",
        content.len() + STREAM_CRUFT,
        content
    );
    let doc = format!(
        "{}xref
0 7
0000000000 65535 f 
0000000009 00000 n 
0000000096 00000 n 
0000000155 00000 n 
0000000291 00000 n 
0000000191 00000 n 
0000000248 00000 n 
trailer
<</Root 6 0 R/Size 7>>
startxref
{}
%%EOF",
        doc,
        doc.len()
    );

    let _doc = Document::load_mem(doc.as_bytes()).unwrap();
}

#[test]
fn load_too_deep_brackets() {
    let content: Vec<u8> = std::iter::repeat(b'(')
        .take(MAX_BRACKET + 1)
        .chain(std::iter::repeat(b')').take(MAX_BRACKET + 1))
        .collect();
    let content = String::from_utf8(content).unwrap();
    const STREAM_CRUFT: usize = 33;
    let doc = format!(
        "%PDF-1.5
1 0 obj<</Type/Pages/Kids[5 0 R]/Count 1/Resources 3 0 R/MediaBox[0 0 595 842]>>endobj
2 0 obj<</Type/Font/Subtype/Type1/BaseFont/Courier>>endobj
3 0 obj<</Font<</F1 2 0 R>>>>endobj
5 0 obj<</Type/Page/Parent 1 0 R/Contents[7 0 R 4 0 R]>>endobj
6 0 obj<</Type/Catalog/Pages 1 0 R>>endobj
7 0 obj<</Length 45>>stream
BT /F1 48 Tf 100 600 Td (Hello World!) Tj ET
endstream
endobj
4 0 obj<</Length {}>>stream
BT
/F1 48 Tf
100 600 Td
({}) Tj
ET
endstream endobj\n",
        content.len() + STREAM_CRUFT,
        content
    );
    let doc = format!(
        "{}xref
0 7
0000000000 65535 f 
0000000009 00000 n 
0000000096 00000 n 
0000000155 00000 n 
0000000387 00000 n 
0000000191 00000 n 
0000000254 00000 n 
0000000297 00000 n 
trailer
<</Root 6 0 R/Size 7>>
startxref
{}
%%EOF",
        doc,
        doc.len()
    );

    let doc = Document::load_mem(doc.as_bytes()).unwrap();
    let pages = doc.get_pages().keys().map(|r| *r).collect::<Vec<_>>();
    assert_eq!("Hello World!\n", doc.extract_text(&pages).unwrap());
}

#[test]
fn load_progress_reports_try_later_on_truncated_buffer() {
    let full = sample_pdf_bytes();
    let progress = LoadProgress::new(Some(full.len()));
    // Too short for the header combinator to even find an end-of-line, so
    // the failure is unambiguous regardless of how repair mode would have
    // handled a longer but still incomplete buffer.
    let partial = &full[..4];
    match progress.poll(partial) {
        Err(Error::TryLater) => {}
        other => panic!("expected TryLater on a truncated buffer, got {other:?}"),
    }
}

#[test]
fn load_progress_succeeds_once_complete() {
    let full = sample_pdf_bytes();
    let progress = LoadProgress::new(Some(full.len()));
    assert!(progress.poll(&full).is_ok());
}
