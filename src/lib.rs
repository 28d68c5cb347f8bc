#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![deny(clippy::all)]

#[macro_use]
mod object;
mod datetime;
pub use crate::object::{Dictionary, Object, ObjectId, Stream, StringFormat};

mod cmap_section;
mod common_data_structures;
mod context;
mod device;
mod document;
mod font;
pub use crate::font::FontData;
mod incremental_document;
mod interpreter;
pub use crate::interpreter::{Content as InterpretedContent, Interpreter};
mod object_stream;
pub use object_stream::ObjectStream;
pub mod xref;
pub use crate::common_data_structures::{decode_text_string, text_string};
pub use crate::context::{Context, Cookie};
pub use crate::device::{BboxDevice, Device, ListDevice};
pub use crate::document::Document;
pub use crate::encodings::{encode_utf16_be, encode_utf8};
pub use crate::encryption::{EncryptionState, EncryptionVersion, Permissions};
pub use crate::incremental_document::IncrementalDocument;

mod bookmarks;
pub use crate::bookmarks::Bookmark;
mod outlines;
pub use crate::outlines::Outline;
mod destinations;
pub use crate::destinations::Destination;
mod toc;
pub use crate::toc::Toc;
pub mod content;
mod creator;
mod encodings;
pub mod encryption;
mod error;
pub use error::XrefError;
pub mod filters;
mod parser;
mod parser_aux;
mod processor;
mod reader;
pub use reader::Reader;
mod save_options;
pub use crate::save_options::{ObjectStreamConfig, SaveOptions, SaveOptionsBuilder};
mod writer;
pub mod xobject;

pub use error::{Error, Result};
