//! # Model Wire Format
//!
//! The three persisted messages ([`ModelProto`], [`TrainerSpec`],
//! [`NormalizerSpec`]) plus [`SentencePiece`] entries, and support for
//! preserving extension fields across a load / save cycle.

pub mod extensions;
pub mod messages;

#[doc(inline)]
pub use extensions::{ExtensionBytes, ModelExtensions};
#[doc(inline)]
pub use messages::{
    DEFAULT_UNK_SURFACE,
    ModelProto,
    ModelType,
    NormalizerSpec,
    PieceType,
    SentencePiece,
    TrainerSpec,
};
