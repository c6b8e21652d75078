//! Frame-stepped property animations.
//!
//! An [`Animation`] is a plain state object. Nothing schedules it: the owner
//! calls [`Animation::step`] once per frame and stops when it returns `None`.

use crate::style::{Translation, format_number};

/// Properties that can be animated by a transition.
pub const ANIMATABLE_PROPERTIES: &[&str] = &["opacity", "transform"];

/// What is being interpolated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationKind {
    /// A plain number, such as `opacity`.
    Numeric {
        /// Value at frame 0.
        from: f32,
        /// Value at the last frame.
        to: f32,
    },
    /// A `translate(Xpx, Ypx)` transform, interpolated per axis.
    Translate {
        /// Translation at frame 0.
        from: Translation,
        /// Translation at the last frame.
        to: Translation,
    },
}

/// Linear interpolation between two values of one property.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    kind: AnimationKind,
    frame: u32,
    total_frames: u32,
}

impl Animation {
    /// Build the animation for `property` going from `old` to `new` over
    /// `frames` frames.
    ///
    /// Returns `None` when the property is not animatable or either value
    /// cannot be interpolated (for example a non-translate transform).
    #[must_use]
    pub fn for_property(property: &str, old: &str, new: &str, frames: u32) -> Option<Self> {
        let kind = match property {
            "opacity" => AnimationKind::Numeric {
                from: old.trim().parse().ok()?,
                to: new.trim().parse().ok()?,
            },
            "transform" => AnimationKind::Translate {
                from: Translation::parse(old)?,
                to: Translation::parse(new)?,
            },
            _ => return None,
        };
        Some(Self::new(kind, frames))
    }

    /// Create an animation directly from its endpoints.
    #[must_use]
    pub fn new(kind: AnimationKind, frames: u32) -> Self {
        Self {
            kind,
            frame: 0,
            total_frames: frames.max(1),
        }
    }

    /// Advance one frame.
    ///
    /// Returns the interpolated value in the textual form the style map
    /// uses, or `None` once the frame counter reaches the total.
    pub fn step(&mut self) -> Option<String> {
        self.frame = self.frame.saturating_add(1);
        if self.frame >= self.total_frames {
            return None;
        }
        Some(self.value_at(self.frame as f32 / self.total_frames as f32))
    }

    /// The value at the end of the animation.
    #[must_use]
    pub fn end_value(&self) -> String {
        self.value_at(1.0)
    }

    /// Whether every frame has been produced.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.frame >= self.total_frames
    }

    /// Frames stepped so far.
    #[must_use]
    pub const fn frame(&self) -> u32 {
        self.frame
    }

    /// Total frames in the animation.
    #[must_use]
    pub const fn total_frames(&self) -> u32 {
        self.total_frames
    }

    /// The interpolated quantity.
    #[must_use]
    pub const fn kind(&self) -> AnimationKind {
        self.kind
    }

    fn value_at(&self, t: f32) -> String {
        match self.kind {
            AnimationKind::Numeric { from, to } => format_number(lerp(from, to, t), 3),
            AnimationKind::Translate { from, to } => {
                Translation::new(lerp(from.x, to.x, t), lerp(from.y, to.y, t)).to_string()
            }
        }
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    (to - from).mul_add(t, from)
}
