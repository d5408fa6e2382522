//! # Trainer Implementation Utilities

mod pair_span_index;
#[doc(inline)]
pub use pair_span_index::{PairCountMap, PairIndexMap, PairSpanIndex};

mod symbol_span_buffer;
#[doc(inline)]
pub use symbol_span_buffer::SymbolSpanBuf;

mod word_counter;
#[doc(inline)]
pub use word_counter::WordCounter;
