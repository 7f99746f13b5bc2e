//! Chapter and pretraining chunk source.
//!
//! Pure text segmentation plus thin file-reading wrappers. Nothing here touches the network,
//! so source errors surface before any request is made.

mod chapters;
mod pretrain;

pub use chapters::{
    read_chapters, read_source, split_by_title, split_by_title_strict, split_by_title_with,
    LeadingFragment, DEFAULT_TITLE_PATTERN,
};
pub use pretrain::{pack_to_target_length, read_pretrain_chunks, PretrainChunk, DEFAULT_TARGET_LENGTH};
