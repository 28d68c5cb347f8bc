//! Static single-byte encoding tables used to turn font character codes into
//! Unicode code points. The five tables named by PDF32000-1 Annex D share
//! their printable-ASCII and Latin-1 supplement range; the (rarely exercised)
//! differences between them in the upper half are intentionally not modeled
//! byte-for-byte here (out of scope per the core engine's text-extraction
//! precision — see DESIGN.md).

use super::cmap::ToUnicodeCMap;

const fn latin1_table() -> [Option<u16>; 256] {
    let mut table = [None; 256];
    let mut i = 0x20;
    while i <= 0xff {
        table[i] = Some(i as u16);
        i += 1;
    }
    table
}

pub static STANDARD_ENCODING: [Option<u16>; 256] = latin1_table();
pub static WIN_ANSI_ENCODING: [Option<u16>; 256] = latin1_table();
pub static MAC_ROMAN_ENCODING: [Option<u16>; 256] = latin1_table();
pub static MAC_EXPERT_ENCODING: [Option<u16>; 256] = latin1_table();
pub static PDF_DOC_ENCODING: [Option<u16>; 256] = latin1_table();

/// A font's character-code-to-Unicode mapping, resolved from a font
/// dictionary's `/Encoding` entry (or its `/ToUnicode` CMap when the
/// encoding can't be resolved to one of the named single-byte tables).
pub enum Encoding<'a> {
    OneByteEncoding(&'a [Option<u16>; 256]),
    SimpleEncoding(&'a [u8]),
    UnicodeMapEncoding(ToUnicodeCMap),
}

impl Encoding<'_> {
    pub fn bytes_to_string(&self, bytes: &[u8]) -> String {
        match self {
            Encoding::OneByteEncoding(table) => super::bytes_to_string(table, bytes),
            Encoding::SimpleEncoding(_) => super::bytes_to_string(&STANDARD_ENCODING, bytes),
            Encoding::UnicodeMapEncoding(cmap) => {
                let code_points: Vec<u16> = bytes
                    .chunks(2)
                    .flat_map(|chunk| {
                        let code = if chunk.len() == 2 {
                            u16::from_be_bytes([chunk[0], chunk[1]])
                        } else {
                            chunk[0] as u16
                        };
                        cmap.get_or_replacement_char(code)
                    })
                    .collect();
                String::from_utf16_lossy(&code_points)
            }
        }
    }

    pub fn string_to_bytes(&self, text: &str) -> Vec<u8> {
        match self {
            Encoding::OneByteEncoding(table) => super::string_to_bytes(table, text),
            Encoding::SimpleEncoding(_) => super::string_to_bytes(&STANDARD_ENCODING, text),
            Encoding::UnicodeMapEncoding(_) => super::encode_utf16_be(text),
        }
    }
}
