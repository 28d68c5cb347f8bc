use thiserror::Error as ThisError;

/// Errors that can occur while parsing the cross-reference table/stream.
#[derive(Debug, Copy, Clone, ThisError)]
pub enum XrefError {
    #[error("invalid cross-reference table")]
    Parse,
    #[error("invalid startxref value")]
    Start,
    #[error("invalid trailer /Prev value")]
    PrevStart,
    #[error("invalid trailer /XRefStm value")]
    StreamStart,
}

/// Errors that can occur while decoding a stream filter.
#[derive(Debug, Copy, Clone, ThisError)]
pub enum DecompressError {
    #[error("ASCII85 decode error: {0}")]
    Ascii85(&'static str),
}

/// Errors raised deep inside the combinator grammar, kept distinct from
/// `Error` so parser code can name the failure before it is folded into
/// the crate-wide error type at the `?` boundary.
#[derive(Debug, Copy, Clone, ThisError)]
pub enum ParseError {
    #[error("invalid trailer dictionary")]
    InvalidTrailer,
    #[error("invalid cross-reference stream")]
    InvalidXref,
    #[error("unexpected end of input")]
    EndOfInput,
}

/// Broad error kinds: out-of-memory, syntax, try-later, or generic.
/// `TryLater` must never be collapsed into any other kind; callers match it
/// specifically to retry once more bytes are available.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error("invalid file header")]
    Header,

    #[error("invalid file trailer")]
    Trailer,

    #[error(transparent)]
    Xref(#[from] XrefError),

    #[error(transparent)]
    ParseError(#[from] ParseError),

    #[error("invalid object offset: {0}")]
    Offset(usize),

    #[error("syntax error at offset {offset}")]
    Parse { offset: usize },

    #[error("malformed indirect object at offset {offset}")]
    IndirectObject { offset: usize },

    #[error("invalid inline image: {0}")]
    InvalidInlineImage(String),

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("could not parse object: {0}")]
    Invalid(String),

    /// Data required to satisfy this request has not arrived yet (progressive
    /// load). Distinct from every other kind; never downgraded to a warning.
    #[error("requested data is not yet available")]
    TryLater,

    #[error("object id mismatch")]
    ObjectIdMismatch,

    #[error("object not found")]
    ObjectNotFound,

    #[error("page {0} could not be found")]
    PageNumberNotFound(u32),

    #[error("expected type {expected}, found {found}")]
    ObjectType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("expected dictionary type {expected}, found {found}")]
    DictType { expected: &'static str, found: String },

    #[error("dictionary key {0} was not found")]
    DictKey(String),

    #[error("document does not use encryption")]
    NotEncrypted,

    #[error("no outline present in this document")]
    NoOutline,

    #[error("unsupported security handler: {0:?}")]
    UnsupportedSecurityHandler(Vec<u8>),

    #[error("invalid key length")]
    InvalidKeyLength,

    #[error("{0} is not implemented")]
    Unimplemented(&'static str),

    #[error("could not decode content stream")]
    ContentDecode,

    #[error(transparent)]
    Decompress(#[from] DecompressError),

    #[error("could not decode bytes as valid UTF-8")]
    Ascii(#[from] std::str::Utf8Error),

    #[error("could not decode text string")]
    TextStringDecode,

    #[error(transparent)]
    Decryption(#[from] crate::encryption::DecryptionError),

    #[error("could not parse ToUnicode CMap: {0}")]
    Cmap(String),
}

impl From<crate::encodings::cmap::UnicodeCMapError> for Error {
    fn from(err: crate::encodings::cmap::UnicodeCMapError) -> Self {
        Error::Cmap(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
