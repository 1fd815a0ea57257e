pub mod lexicon;
pub mod linguistics;
pub mod segmenter;
pub mod speaker_turns;

pub use lexicon::*;
pub use linguistics::*;
pub use segmenter::*;
pub use speaker_turns::*;
