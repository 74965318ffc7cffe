mod attrs;
mod buffer;
mod commands;
mod editor;
mod formatting;
mod ops;
mod paint;
mod runs;
mod snapshot;
mod transform;
mod trigger;

pub use crate::attrs::*;
pub use crate::buffer::*;
pub use crate::commands::*;
pub use crate::editor::*;
pub use crate::formatting::*;
pub use crate::ops::*;
pub use crate::paint::StylePainter;
pub use crate::runs::Run;
pub use crate::snapshot::*;
pub use crate::transform::*;
pub use crate::trigger::*;
