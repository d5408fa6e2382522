//! # Piece Decoder
//!
//! Concatenates piece surfaces, unescapes whitespace markers, and removes
//! the dummy prefix space.

use std::sync::Arc;

use crate::{
    decoders::TokenDecoder,
    errors::{UPResult, UnipieceError},
    model::Model,
    normalizer::META_SPACE,
    proto::PieceType,
    types::{TokenType, index_from_token},
};

/// A [`TokenDecoder`] over a [`Model`].
#[derive(Debug, Clone)]
pub struct PieceDecoder {
    model: Arc<Model>,
}

impl PieceDecoder {
    /// Create a decoder over a model.
    pub fn new(model: Arc<Model>) -> Self {
        Self { model }
    }

    /// The attached model.
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Decode piece strings.
    ///
    /// Known CONTROL pieces emit nothing, the UNKNOWN piece emits the unknown
    /// surface; any other string is emitted verbatim.
    pub fn decode_pieces<S: AsRef<str>>(
        &self,
        pieces: &[S],
    ) -> String {
        let mut out = PieceWriter::new(&self.model);
        for piece in pieces {
            let piece = piece.as_ref();
            let kind = self
                .model
                .piece_to_id(piece)
                .and_then(|id| self.model.piece(id))
                .map_or(PieceType::Normal, |p| p.kind);
            out.push(piece, kind);
        }
        out.finish()
    }
}

impl TokenDecoder for PieceDecoder {
    fn try_decode_to_string<T: TokenType>(
        &self,
        tokens: &[T],
    ) -> UPResult<String> {
        let mut out = PieceWriter::new(&self.model);
        for &token in tokens {
            let id = index_from_token(token)?;
            let piece = u32::try_from(id)
                .ok()
                .and_then(|id| self.model.piece(id))
                .ok_or(UnipieceError::UnknownPieceId {
                    id,
                    size: self.model.vocab_size(),
                })?;
            out.push(&piece.text, piece.kind);
        }
        Ok(out.finish())
    }
}

/// Accumulates decoded text.
struct PieceWriter<'a> {
    model: &'a Model,
    strip_prefix: bool,
    buf: String,
}

impl<'a> PieceWriter<'a> {
    fn new(model: &'a Model) -> Self {
        Self {
            model,
            strip_prefix: model.normalizer().add_dummy_prefix(),
            buf: String::new(),
        }
    }

    fn push(
        &mut self,
        piece: &str,
        kind: PieceType,
    ) {
        match kind {
            PieceType::Control => {}
            PieceType::Unknown => {
                self.buf.push_str(self.model.unk_surface());
                self.strip_prefix = false;
            }
            PieceType::Normal | PieceType::UserDefined => {
                let piece = if self.strip_prefix {
                    piece
                        .strip_prefix(META_SPACE)
                        .or_else(|| piece.strip_prefix(' '))
                        .unwrap_or(piece)
                } else {
                    piece
                };
                self.strip_prefix = false;
                self.buf.extend(
                    piece
                        .chars()
                        .map(|c| if c == META_SPACE { ' ' } else { c }),
                );
            }
        }
    }

    fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        encoders::{TokenEncoder, UnigramEncoder},
        model::testing::{build_model_proto, hello_world_proto, sample_model_proto},
        proto::{ModelType, NormalizerSpec},
        types::{check_is_send, check_is_sync},
    };

    fn decoder(proto: &crate::proto::ModelProto) -> PieceDecoder {
        PieceDecoder::new(Arc::new(Model::from_proto(proto).unwrap()))
    }

    #[test]
    fn test_decode() {
        let decoder = decoder(&hello_world_proto());
        check_is_send(&decoder);
        check_is_sync(&decoder);

        assert_eq!(
            decoder.try_decode_to_string(&[3u32, 4]).unwrap(),
            "hello world"
        );
        // CONTROL pieces emit nothing.
        assert_eq!(
            decoder.try_decode_to_string(&[1u32, 3, 4, 2]).unwrap(),
            "hello world"
        );
        // UNKNOWN emits its surface.
        assert_eq!(
            decoder.try_decode_to_string(&[3u16, 0]).unwrap(),
            "hello \u{2047} "
        );
        assert_eq!(decoder.try_decode_to_string::<u32>(&[]).unwrap(), "");
    }

    #[test]
    fn test_unknown_piece_id() {
        let decoder = decoder(&hello_world_proto());
        assert!(matches!(
            decoder.try_decode_to_string(&[3u32, 6]),
            Err(UnipieceError::UnknownPieceId { id: 6, size: 6 })
        ));
    }

    #[test]
    fn test_decode_pieces() {
        let decoder = decoder(&hello_world_proto());
        assert_eq!(
            decoder.decode_pieces(&["<s>", "▁hello", "▁world", "</s>"]),
            "hello world"
        );
        assert_eq!(decoder.decode_pieces(&["▁new", "▁thing"]), "new thing");
    }

    #[test]
    fn test_unescaped_dummy_prefix() {
        let proto = build_model_proto(
            ModelType::Unigram,
            NormalizerSpec {
                escape_whitespaces: Some(false),
                ..Default::default()
            },
            &[
                (" hello", -1.0, PieceType::Normal),
                (" world", -1.2, PieceType::Normal),
                (" ", -3.0, PieceType::Normal),
            ],
        );
        let model = Arc::new(Model::from_proto(&proto).unwrap());
        let encoder = UnigramEncoder::new(model.clone());
        let decoder = PieceDecoder::new(model);

        let tokens: Vec<u32> = encoder.try_encode("hello world").unwrap();
        assert_eq!(tokens, vec![3, 4]);
        assert_eq!(
            decoder.try_decode_to_string(&tokens).unwrap(),
            "hello world"
        );
        assert_eq!(decoder.decode_pieces(&[" hello", " world"]), "hello world");
    }

    #[test]
    fn test_round_trip() {
        let model = Arc::new(Model::from_proto(&sample_model_proto()).unwrap());
        let encoder = UnigramEncoder::new(model.clone());
        let decoder = PieceDecoder::new(model);
        for text in ["ab ba", "a<sep>b", "cab abc"] {
            let tokens: Vec<u32> = encoder.try_encode(text).unwrap();
            assert_eq!(decoder.try_decode_to_string(&tokens).unwrap(), text);
        }
        let batch: Vec<Vec<u32>> = encoder
            .try_encode_batch(&["ab".to_string(), "ba".to_string()])
            .unwrap();
        let refs: Vec<&[u32]> = batch.iter().map(|v| v.as_slice()).collect();
        assert_eq!(
            decoder.try_decode_batch_to_strings(&refs).unwrap(),
            vec!["ab", "ba"]
        );
    }
}
