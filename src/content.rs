use std::io::{self, Write};

use super::Object;
use crate::writer::Writer;

/// A single content-stream operator together with its operands, e.g.
/// `72.5 712 Td` or `/F1 12 Tf`.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operator: String,
    pub operands: Vec<Object>,
}

impl Operation {
    pub fn new(operator: &str, operands: Vec<Object>) -> Operation {
        Operation {
            operator: operator.to_string(),
            operands,
        }
    }
}

/// A page's content stream, decoded to a sequence of operations. Generic
/// over the operation container so callers that only need the raw bytes
/// can use `Content<Vec<u8>>` without paying for a parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Content<Operations = Vec<Operation>> {
    pub operations: Operations,
}

impl Content {
    /// Encode content operations back into stream bytes.
    pub fn encode(&self) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        for operation in &self.operations {
            for operand in &operation.operands {
                Writer::write_object(&mut buffer, operand)?;
                buffer.write_all(b" ")?;
            }
            buffer.write_all(operation.operator.as_bytes())?;
            buffer.write_all(b"\n")?;
        }
        Ok(buffer)
    }
}
