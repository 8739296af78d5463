//! Script segments and validation

use uuid::Uuid;

/// One (text, voice) unit of a script.
///
/// The id is assigned at creation and stays stable across edits; it exists
/// for callers that need to key widgets or clips to a segment, not for any
/// business decision.
#[derive(Debug, Clone)]
pub struct Segment {
    id: String,
    pub text: String,
    voice_id: Option<String>,
    voice_label: String,
}

impl Segment {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            text: String::new(),
            voice_id: None,
            voice_label: String::new(),
        }
    }

    /// Build a segment with text and voice already assigned.
    pub fn with_content(text: impl Into<String>, voice_id: impl Into<String>, voice_label: impl Into<String>) -> Self {
        let mut segment = Self::new();
        segment.text = text.into();
        segment.set_voice(voice_id.into(), voice_label.into());
        segment
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn voice_id(&self) -> Option<&str> {
        self.voice_id.as_deref()
    }

    /// Display name of the assigned voice; empty when no voice is set.
    pub fn voice_label(&self) -> &str {
        &self.voice_label
    }

    /// Assign a voice. Label and id always change together so the display
    /// name can never drift from the identifier.
    pub fn set_voice(&mut self, voice_id: String, voice_label: String) {
        self.voice_id = Some(voice_id);
        self.voice_label = voice_label;
    }

    pub fn clear_voice(&mut self) {
        self.voice_id = None;
        self.voice_label.clear();
    }

    /// A segment can be synthesized iff it has non-blank text and a voice.
    pub fn is_valid(&self) -> bool {
        !self.text.trim().is_empty() && self.voice_id.is_some()
    }
}

impl Default for Segment {
    fn default() -> Self {
        Self::new()
    }
}

/// An ordered script. Order is generation order and, for merged output,
/// playback order. One editing session owns a script; there are no
/// concurrent writers.
#[derive(Debug, Clone)]
pub struct Script {
    segments: Vec<Segment>,
}

impl Script {
    /// A new script starts with a single empty segment, ready to edit.
    pub fn new() -> Self {
        Self {
            segments: vec![Segment::new()],
        }
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a fresh empty segment and return a handle to it.
    pub fn append(&mut self) -> &mut Segment {
        self.segments.push(Segment::new());
        self.segments.last_mut().unwrap()
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Remove the segment at `index`, if it exists.
    pub fn remove(&mut self, index: usize) -> Option<Segment> {
        if index < self.segments.len() {
            Some(self.segments.remove(index))
        } else {
            None
        }
    }

    /// Drop everything and start over with a single empty segment.
    pub fn clear(&mut self) {
        self.segments = vec![Segment::new()];
    }

    /// Validate every segment and return the 1-based positions of the ones
    /// that cannot be synthesized. All segments are checked; nothing
    /// short-circuits, so the caller can report every problem at once.
    /// An empty result means the whole script is ready.
    pub fn validate(&self) -> Vec<usize> {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| !segment.is_valid())
            .map(|(i, _)| i + 1)
            .collect()
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::new()
    }
}
