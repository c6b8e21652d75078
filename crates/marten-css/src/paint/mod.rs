//! Painting
//!
//! Converts a layout tree into a display list of drawing commands. The
//! display list can then be executed on any [`Canvas`], directly or through
//! a compositor.
//!
//! ```text
//! Style → Layout → Paint → Composite → Raster
//!                    ↓
//!              DisplayList
//! ```

mod canvas;
mod display_list;
mod painter;

pub use canvas::Canvas;
pub use display_list::{CmdId, DisplayItem, DisplayList, PaintCommand};
pub use painter::{CARET_WIDTH, Painter};
