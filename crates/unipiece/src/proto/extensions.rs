//! # Extension Field Preservation
//!
//! Tags ``>= 200`` are reserved for forward-compatible extensions.
//! ``prost`` drops unknown fields on decode; this module scans the raw
//! wire bytes, captures extension fields per message, and re-emits them
//! verbatim when a model is saved again.

use prost::{
    Message,
    bytes::Buf,
    encoding::{WireType, decode_key, decode_varint, encode_key, encode_varint},
};

use crate::{
    errors::{UPResult, UnipieceError},
    proto::messages::ModelProto,
};

/// The first tag of the reserved extension range.
pub const EXTENSION_TAG_START: u32 = 200;

const MODEL_PIECES_TAG: u32 = 1;
const MODEL_TRAINER_SPEC_TAG: u32 = 2;
const MODEL_NORMALIZER_SPEC_TAG: u32 = 3;

/// One top-level field of an encoded message.
#[derive(Debug, Clone, Copy)]
pub struct WireField<'a> {
    /// The field tag.
    pub tag: u32,

    /// The complete encoded field, key included.
    pub raw: &'a [u8],

    /// The length-delimited payload; empty for other wire types.
    pub payload: &'a [u8],
}

fn take<'a>(
    cursor: &mut &'a [u8],
    len: usize,
) -> UPResult<&'a [u8]> {
    if cursor.len() < len {
        return Err(UnipieceError::Parse(format!(
            "truncated field: need {len} bytes, have {}",
            cursor.len()
        )));
    }
    let (head, tail) = cursor.split_at(len);
    *cursor = tail;
    Ok(head)
}

/// Advance past one field value.
///
/// ## Returns
/// The length-delimited payload; empty for other wire types.
fn skip_value<'a>(
    cursor: &mut &'a [u8],
    tag: u32,
    wire_type: WireType,
) -> UPResult<&'a [u8]> {
    match wire_type {
        WireType::Varint => {
            decode_varint(cursor)?;
        }
        WireType::SixtyFourBit => {
            take(cursor, 8)?;
        }
        WireType::ThirtyTwoBit => {
            take(cursor, 4)?;
        }
        WireType::LengthDelimited => {
            let len = decode_varint(cursor)?;
            let len = usize::try_from(len)
                .map_err(|_| UnipieceError::Parse(format!("field length {len} overflows")))?;
            return take(cursor, len);
        }
        WireType::StartGroup => loop {
            if cursor.is_empty() {
                return Err(UnipieceError::Parse(format!("unterminated group (tag {tag})")));
            }
            let (inner_tag, inner_type) = decode_key(cursor)?;
            if inner_type == WireType::EndGroup {
                if inner_tag != tag {
                    return Err(UnipieceError::Parse(format!(
                        "group {tag} closed by end-group tag {inner_tag}"
                    )));
                }
                break;
            }
            skip_value(cursor, inner_tag, inner_type)?;
        },
        WireType::EndGroup => {
            return Err(UnipieceError::Parse(format!("unexpected end-group (tag {tag})")));
        }
    }
    Ok(&[])
}

/// Split an encoded message into its top-level fields.
pub fn scan_fields(buf: &[u8]) -> UPResult<Vec<WireField<'_>>> {
    let mut fields = Vec::new();
    let mut cursor: &[u8] = buf;

    while cursor.has_remaining() {
        let start = buf.len() - cursor.len();
        let (tag, wire_type) = decode_key(&mut cursor)?;

        let payload = skip_value(&mut cursor, tag, wire_type)?;

        let end = buf.len() - cursor.len();
        fields.push(WireField {
            tag,
            raw: &buf[start..end],
            payload,
        });
    }

    Ok(fields)
}

/// Raw extension fields captured from one message.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtensionBytes {
    bytes: Vec<u8>,
}

impl ExtensionBytes {
    /// Capture the extension fields of an encoded message.
    pub fn capture(buf: &[u8]) -> UPResult<Self> {
        let mut ext = Self::default();
        for field in scan_fields(buf)? {
            ext.absorb(&field);
        }
        Ok(ext)
    }

    fn absorb(
        &mut self,
        field: &WireField,
    ) {
        if field.tag >= EXTENSION_TAG_START {
            self.bytes.extend_from_slice(field.raw);
        }
    }

    /// The captured wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Are there no captured fields?
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Extension fields captured from a [`ModelProto`] and its sub-messages.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModelExtensions {
    /// Extensions on the top-level model message.
    pub model: ExtensionBytes,

    /// Extensions on the trainer spec.
    pub trainer_spec: ExtensionBytes,

    /// Extensions on the normalizer spec.
    pub normalizer_spec: ExtensionBytes,

    /// Extensions per piece, in piece order.
    pub pieces: Vec<ExtensionBytes>,
}

impl ModelExtensions {
    /// Scan an encoded [`ModelProto`] for extension fields.
    pub fn scan(buf: &[u8]) -> UPResult<Self> {
        let mut ext = Self::default();
        for field in scan_fields(buf)? {
            match field.tag {
                MODEL_PIECES_TAG => ext.pieces.push(ExtensionBytes::capture(field.payload)?),
                MODEL_TRAINER_SPEC_TAG => {
                    for sub in scan_fields(field.payload)? {
                        ext.trainer_spec.absorb(&sub);
                    }
                }
                MODEL_NORMALIZER_SPEC_TAG => {
                    for sub in scan_fields(field.payload)? {
                        ext.normalizer_spec.absorb(&sub);
                    }
                }
                _ => ext.model.absorb(&field),
            }
        }
        Ok(ext)
    }

    /// Are there no captured fields anywhere?
    pub fn is_empty(&self) -> bool {
        self.model.is_empty()
            && self.trainer_spec.is_empty()
            && self.normalizer_spec.is_empty()
            && self.pieces.iter().all(ExtensionBytes::is_empty)
    }

    /// Encode a model, re-emitting the captured extension fields.
    ///
    /// Piece extensions are matched by position; pieces beyond the captured
    /// list are written without extensions.
    pub fn encode_model(
        &self,
        proto: &ModelProto,
    ) -> Vec<u8> {
        if self.is_empty() {
            return proto.encode_to_vec();
        }

        let mut buf = Vec::with_capacity(proto.encoded_len() + self.model.as_bytes().len());

        for (idx, piece) in proto.pieces.iter().enumerate() {
            let mut body = piece.encode_to_vec();
            if let Some(ext) = self.pieces.get(idx) {
                body.extend_from_slice(ext.as_bytes());
            }
            encode_length_delimited(MODEL_PIECES_TAG, &body, &mut buf);
        }

        if let Some(spec) = &proto.trainer_spec {
            let mut body = spec.encode_to_vec();
            body.extend_from_slice(self.trainer_spec.as_bytes());
            encode_length_delimited(MODEL_TRAINER_SPEC_TAG, &body, &mut buf);
        }

        if let Some(spec) = &proto.normalizer_spec {
            let mut body = spec.encode_to_vec();
            body.extend_from_slice(self.normalizer_spec.as_bytes());
            encode_length_delimited(MODEL_NORMALIZER_SPEC_TAG, &body, &mut buf);
        }

        buf.extend_from_slice(self.model.as_bytes());
        buf
    }
}

fn encode_length_delimited(
    tag: u32,
    body: &[u8],
    buf: &mut Vec<u8>,
) {
    encode_key(tag, WireType::LengthDelimited, buf);
    encode_varint(body.len() as u64, buf);
    buf.extend_from_slice(body);
}
