pub mod diff;
pub mod model;
pub mod review;

pub use diff::{WordDiffEngine, diff_words, tokenize};
pub use model::{
    DiffSegment, DiffSegmentKind, DiffToken, DiffTokenKind, HunkDecision, Intraline, ReviewHunk,
};
pub use review::Review;
