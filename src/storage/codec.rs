//! Length-delimited binary encoding for the on-disk index (§6). This is a
//! bespoke format, not a generated protobuf binding: the decoder below
//! hands back string fields that are literal subslices of the input
//! buffer, which is what lets [`super::persistence::LoadedIndex`] satisfy
//! the zero-copy invariant (§8). Field-number compatibility with a
//! third-party SCIP consumer is a wire-format concern the spec delegates
//! here; this module owns that contract alone.

use crate::document::Document;
use crate::index::{Index, IndexMetadata};
use crate::symbol::{Occurrence, Relationship, RelationshipEdge, SymbolInformation};
use crate::types::{Range, Role, SymbolKind};
use std::borrow::Cow;

pub const MAGIC: &[u8; 4] = b"COGX";

// --- writer -----------------------------------------------------------

struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn str(&mut self, s: &str) {
        self.u32(s.len() as u32);
        self.buf.extend_from_slice(s.as_bytes());
    }

    fn opt_str(&mut self, s: Option<&str>) {
        match s {
            Some(s) => {
                self.u8(1);
                self.str(s);
            }
            None => self.u8(0),
        }
    }

    fn range(&mut self, r: Range) {
        self.u32(r.start_line);
        self.u32(r.start_char);
        self.u32(r.end_line);
        self.u32(r.end_char);
    }

    fn opt_range(&mut self, r: Option<Range>) {
        match r {
            Some(r) => {
                self.u8(1);
                self.range(r);
            }
            None => self.u8(0),
        }
    }
}

fn write_occurrence(w: &mut Writer, occ: &Occurrence) {
    w.range(occ.range);
    w.str(&occ.symbol);
    w.u32(occ.roles.bits());
    w.opt_str(occ.syntax_kind.as_deref());
    w.opt_range(occ.enclosing_range);
}

fn write_relationship(w: &mut Writer, rel: Relationship) {
    let mut bits: u8 = 0;
    if rel.is_reference {
        bits |= 0b0001;
    }
    if rel.is_implementation {
        bits |= 0b0010;
    }
    if rel.is_type_definition {
        bits |= 0b0100;
    }
    if rel.is_definition {
        bits |= 0b1000;
    }
    w.u8(bits);
}

fn write_symbol_information(w: &mut Writer, info: &SymbolInformation) {
    w.str(&info.symbol);
    w.u8(info.kind.code());
    w.u32(info.documentation.len() as u32);
    for block in &info.documentation {
        w.str(block);
    }
    w.u32(info.relationships.len() as u32);
    for edge in &info.relationships {
        w.str(&edge.to_symbol);
        write_relationship(w, edge.kind);
    }
    w.opt_str(info.display_name.as_deref());
    w.opt_str(info.enclosing_symbol.as_deref());
}

fn write_document(w: &mut Writer, doc: &Document) {
    w.str(&doc.relative_path);
    w.str(&doc.language);
    w.u32(doc.occurrences.len() as u32);
    for occ in &doc.occurrences {
        write_occurrence(w, occ);
    }
    w.u32(doc.symbol_information.len() as u32);
    for info in &doc.symbol_information {
        write_symbol_information(w, info);
    }
}

/// Serialize `index` into the on-disk wire format.
pub fn encode(index: &Index) -> Vec<u8> {
    let mut w = Writer::new();
    w.buf.extend_from_slice(MAGIC);
    w.u32(index.metadata.version);
    w.str(&index.metadata.tool_info);
    w.str(&index.metadata.project_root);
    w.str(&index.metadata.encoding);

    w.u32(index.documents.len() as u32);
    for doc in &index.documents {
        write_document(&mut w, doc);
    }

    w.u32(index.external_symbols.len() as u32);
    for info in &index.external_symbols {
        write_symbol_information(&mut w, info);
    }

    w.buf
}

// --- reader -------------------------------------------------------------

#[derive(Debug)]
pub struct DecodeError(pub String);

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed index: {}", self.0)
    }
}

impl std::error::Error for DecodeError {}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

type DResult<T> = Result<T, DecodeError>;

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn bytes(&mut self, n: usize) -> DResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&e| e <= self.buf.len())
            .ok_or_else(|| DecodeError("unexpected end of buffer".into()))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> DResult<u8> {
        Ok(self.bytes(1)?[0])
    }

    fn u32(&mut self) -> DResult<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Borrow a `&str` directly from the input buffer: the zero-copy step.
    fn str(&mut self) -> DResult<&'a str> {
        let len = self.u32()? as usize;
        let bytes = self.bytes(len)?;
        std::str::from_utf8(bytes).map_err(|e| DecodeError(e.to_string()))
    }

    fn opt_str(&mut self) -> DResult<Option<&'a str>> {
        match self.u8()? {
            0 => Ok(None),
            _ => Ok(Some(self.str()?)),
        }
    }

    fn range(&mut self) -> DResult<Range> {
        Ok(Range::new(self.u32()?, self.u32()?, self.u32()?, self.u32()?))
    }

    fn opt_range(&mut self) -> DResult<Option<Range>> {
        match self.u8()? {
            0 => Ok(None),
            _ => Ok(Some(self.range()?)),
        }
    }
}

/// Borrowed view of an Occurrence: `symbol`/`syntax_kind` are subslices of
/// the decoded buffer.
#[derive(Debug, Clone)]
pub struct OccurrenceView<'a> {
    pub range: Range,
    pub symbol: &'a str,
    pub roles: Role,
    pub syntax_kind: Option<&'a str>,
    pub enclosing_range: Option<Range>,
}

#[derive(Debug, Clone)]
pub struct RelationshipEdgeView<'a> {
    pub to_symbol: &'a str,
    pub kind: Relationship,
}

#[derive(Debug, Clone)]
pub struct SymbolInfoView<'a> {
    pub symbol: &'a str,
    pub kind: SymbolKind,
    pub documentation: Vec<&'a str>,
    pub relationships: Vec<RelationshipEdgeView<'a>>,
    pub display_name: Option<&'a str>,
    pub enclosing_symbol: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct DocumentView<'a> {
    pub relative_path: &'a str,
    pub language: &'a str,
    pub occurrences: Vec<OccurrenceView<'a>>,
    pub symbol_information: Vec<SymbolInfoView<'a>>,
}

#[derive(Debug, Clone)]
pub struct DecodedView<'a> {
    pub metadata: IndexMetadata,
    pub documents: Vec<DocumentView<'a>>,
    pub external_symbols: Vec<SymbolInfoView<'a>>,
}

fn read_relationship(bits: u8) -> Relationship {
    Relationship {
        is_reference: bits & 0b0001 != 0,
        is_implementation: bits & 0b0010 != 0,
        is_type_definition: bits & 0b0100 != 0,
        is_definition: bits & 0b1000 != 0,
    }
}

fn read_occurrence<'a>(r: &mut Reader<'a>) -> DResult<OccurrenceView<'a>> {
    let range = r.range()?;
    let symbol = r.str()?;
    let roles = Role::from_bits_truncate(r.u32()?);
    let syntax_kind = r.opt_str()?;
    let enclosing_range = r.opt_range()?;
    Ok(OccurrenceView {
        range,
        symbol,
        roles,
        syntax_kind,
        enclosing_range,
    })
}

fn read_symbol_kind(code: u8) -> DResult<SymbolKind> {
    SymbolKind::from_code(code).ok_or_else(|| DecodeError(format!("unknown symbol kind code {code}")))
}

fn read_symbol_information<'a>(r: &mut Reader<'a>) -> DResult<SymbolInfoView<'a>> {
    let symbol = r.str()?;
    let kind = read_symbol_kind(r.u8()?)?;
    let doc_count = r.u32()?;
    let mut documentation = Vec::with_capacity(doc_count as usize);
    for _ in 0..doc_count {
        documentation.push(r.str()?);
    }
    let rel_count = r.u32()?;
    let mut relationships = Vec::with_capacity(rel_count as usize);
    for _ in 0..rel_count {
        let to_symbol = r.str()?;
        let kind = read_relationship(r.u8()?);
        relationships.push(RelationshipEdgeView { to_symbol, kind });
    }
    let display_name = r.opt_str()?;
    let enclosing_symbol = r.opt_str()?;
    Ok(SymbolInfoView {
        symbol,
        kind,
        documentation,
        relationships,
        display_name,
        enclosing_symbol,
    })
}

fn read_document<'a>(r: &mut Reader<'a>) -> DResult<DocumentView<'a>> {
    let relative_path = r.str()?;
    let language = r.str()?;
    let occ_count = r.u32()?;
    let mut occurrences = Vec::with_capacity(occ_count as usize);
    for _ in 0..occ_count {
        occurrences.push(read_occurrence(r)?);
    }
    let sym_count = r.u32()?;
    let mut symbol_information = Vec::with_capacity(sym_count as usize);
    for _ in 0..sym_count {
        symbol_information.push(read_symbol_information(r)?);
    }
    Ok(DocumentView {
        relative_path,
        language,
        occurrences,
        symbol_information,
    })
}

/// Decode `buf` into borrowed views over it. No string in the result is
/// ever copied; each is a subslice of `buf`.
pub fn decode(buf: &[u8]) -> DResult<DecodedView<'_>> {
    let mut r = Reader::new(buf);
    let magic = r.bytes(4)?;
    if magic != MAGIC {
        return Err(DecodeError("bad magic".into()));
    }
    let version = r.u32()?;
    let tool_info = r.str()?.to_string();
    let project_root = r.str()?.to_string();
    let encoding = r.str()?.to_string();
    let metadata = IndexMetadata {
        version,
        tool_info,
        project_root,
        encoding,
    };

    let doc_count = r.u32()?;
    let mut documents = Vec::with_capacity(doc_count as usize);
    for _ in 0..doc_count {
        documents.push(read_document(&mut r)?);
    }

    let ext_count = r.u32()?;
    let mut external_symbols = Vec::with_capacity(ext_count as usize);
    for _ in 0..ext_count {
        external_symbols.push(read_symbol_information(&mut r)?);
    }

    Ok(DecodedView {
        metadata,
        documents,
        external_symbols,
    })
}

impl<'a> SymbolInfoView<'a> {
    fn to_owned(&self) -> SymbolInformation {
        SymbolInformation {
            symbol: self.symbol.to_string(),
            kind: self.kind,
            documentation: self.documentation.iter().map(|s| s.to_string()).collect(),
            relationships: self
                .relationships
                .iter()
                .map(|e| RelationshipEdge {
                    to_symbol: e.to_symbol.to_string(),
                    kind: e.kind,
                })
                .collect(),
            display_name: self.display_name.map(|s| s.to_string()),
            enclosing_symbol: self.enclosing_symbol.map(|s| s.to_string()),
        }
    }
}

impl<'a> DocumentView<'a> {
    fn to_owned(&self) -> Document {
        Document {
            relative_path: self.relative_path.to_string(),
            language: self.language.to_string(),
            occurrences: self
                .occurrences
                .iter()
                .map(|o| Occurrence {
                    range: o.range,
                    symbol: o.symbol.to_string(),
                    roles: o.roles,
                    syntax_kind: o.syntax_kind.map(|s| s.to_string()),
                    enclosing_range: o.enclosing_range,
                })
                .collect(),
            symbol_information: self.symbol_information.iter().map(SymbolInfoView::to_owned).collect(),
        }
    }
}

impl<'a> DecodedView<'a> {
    /// Copy this borrowed view into a fully owned [`Index`] for the rest of
    /// the system (query/explore/runtime) to operate on without threading
    /// a lifetime through every call site.
    pub fn materialize(&self) -> Index {
        Index {
            metadata: self.metadata.clone(),
            documents: self.documents.iter().map(DocumentView::to_owned).collect(),
            external_symbols: self.external_symbols.iter().map(SymbolInfoView::to_owned).collect(),
        }
    }
}

/// Owning convenience wrapper so callers that don't care about zero-copy
/// can treat decode+materialize as one step.
pub fn decode_to_owned(buf: &[u8]) -> DResult<Index> {
    Ok(decode(buf)?.materialize())
}

#[allow(dead_code)]
fn _unused_cow_hint(s: Cow<'_, str>) -> Cow<'_, str> {
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::symbol::SymbolInformation;
    use crate::types::{Range, Role, SymbolKind};

    fn sample_index() -> Index {
        let mut index = Index::new("/proj");
        let mut doc = Document::new("src/lib.rs", "rust");
        doc.occurrences.push(Occurrence {
            range: Range::single_line(4, 0, 3),
            symbol: "pkg 1.0 lib/run().".to_string(),
            roles: Role::DEFINITION,
            syntax_kind: Some("function_item".to_string()),
            enclosing_range: Some(Range::new(4, 0, 10, 1)),
        });
        doc.symbol_information
            .push(SymbolInformation::new("pkg 1.0 lib/run().", SymbolKind::Function).with_display_name("run"));
        index.upsert_document(doc);
        index
    }

    #[test]
    fn round_trip_preserves_documents_and_symbols() {
        let index = sample_index();
        let bytes = encode(&index);
        let decoded = decode_to_owned(&bytes).unwrap();
        assert_eq!(decoded.documents.len(), 1);
        assert_eq!(decoded.documents[0].relative_path, "src/lib.rs");
        assert_eq!(decoded.documents[0].symbol_information[0].display_name.as_deref(), Some("run"));
    }

    #[test]
    fn decoded_strings_are_subslices_of_input_buffer() {
        let index = sample_index();
        let bytes = encode(&index);
        let view = decode(&bytes).unwrap();

        let buf_range = bytes.as_ptr_range();
        let path_ptr = view.documents[0].relative_path.as_ptr();
        assert!(buf_range.start <= path_ptr && path_ptr < buf_range.end);

        let symbol_ptr = view.documents[0].occurrences[0].symbol.as_ptr();
        assert!(buf_range.start <= symbol_ptr && symbol_ptr < buf_range.end);
    }

    #[test]
    fn rejects_bad_magic() {
        let err = decode(b"bad!").unwrap_err();
        assert!(err.0.contains("magic"));
    }
}
