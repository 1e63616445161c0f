use crate::foundation::core::{FrameSize, Point, TimeMs};
use crate::script::tags::Tag;
use crate::transform::path::PathSegment;
use std::collections::HashMap;

/// `#META` section values.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Meta {
    /// Script title.
    pub title: String,
    /// Script author.
    pub author: String,
    /// Free-form description.
    pub description: String,
    /// Script version string.
    pub version: String,
}

/// Drawable content of an event.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Geometry {
    /// Individual dots.
    Points(Vec<Point>),
    /// A vector path.
    Path(Vec<PathSegment>),
    /// Text drawn with the current font.
    Text(String),
}

/// One element of an event: a tag or a piece of geometry governed by the tags before it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Object {
    /// A state change.
    Tag(Tag),
    /// Geometry to draw with the current state.
    Geometry(Geometry),
}

/// A timed subtitle cue.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Event {
    /// Inclusive start time.
    pub start_ms: TimeMs,
    /// Exclusive end time.
    pub end_ms: TimeMs,
    /// Tags and geometry in script order.
    pub objects: Vec<Object>,
    /// `false` when any tag depends on the query time.
    pub static_tags: bool,
}

impl Event {
    /// Whether the event is visible at `t`.
    pub fn is_active(&self, t: TimeMs) -> bool {
        self.start_ms <= t && t < self.end_ms
    }

    /// Event length in ms.
    pub fn duration(&self) -> TimeMs {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// A parsed script.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Document {
    /// Metadata.
    pub meta: Meta,
    /// Script coordinate space; zero dimensions mean "use the target size".
    pub frame: FrameSize,
    /// Named tag-string macros.
    pub styles: HashMap<String, String>,
    /// Events in script order.
    pub events: Vec<Event>,
}
