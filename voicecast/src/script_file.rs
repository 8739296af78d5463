// Script file loading and voice resolution

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use tts_pipeline::{Script, Segment, Session};

/// On-disk script format: an ordered list of `[[segment]]` tables.
///
/// ```toml
/// [[segment]]
/// text = "Welcome to the show."
/// voice = "Rachel"
///
/// [[segment]]
/// text = "Thanks for having me."
/// voice_id = "EXAVITQu4vr4xnSDxMaL"
/// ```
#[derive(Debug, Deserialize)]
pub struct ScriptFile {
    #[serde(default, rename = "segment")]
    pub segments: Vec<SegmentEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SegmentEntry {
    pub text: String,
    /// Voice display name, resolved against the provider catalog
    #[serde(default)]
    pub voice: Option<String>,
    /// Explicit voice identifier; takes precedence over `voice`
    #[serde(default)]
    pub voice_id: Option<String>,
}

impl ScriptFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script file: {}", path.display()))?;
        let file: ScriptFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse script file: {}", path.display()))?;
        Ok(file)
    }

    /// Whether any segment needs the voice catalog to resolve a name.
    pub fn needs_catalog(&self) -> bool {
        self.segments
            .iter()
            .any(|s| s.voice_id.is_none() && s.voice.is_some())
    }

    /// Turn the file into a pipeline script, resolving voice names through
    /// the session's cached catalog. A name that isn't in the catalog is an
    /// error; a segment with no voice at all is left unassigned so
    /// validation can report it alongside any other problems.
    pub fn into_script(self, session: &Session) -> Result<Script> {
        let mut segments = Vec::with_capacity(self.segments.len());

        for (index, entry) in self.segments.into_iter().enumerate() {
            let segment = match (entry.voice_id, entry.voice) {
                (Some(id), label) => {
                    let label = label.unwrap_or_else(|| id.clone());
                    Segment::with_content(entry.text, id, label)
                }
                (None, Some(name)) => {
                    let voice = session.voice_by_name(&name).with_context(|| {
                        format!(
                            "Segment {}: voice {:?} not found in the provider catalog",
                            index + 1,
                            name
                        )
                    })?;
                    Segment::with_content(entry.text, voice.id.clone(), voice.name.clone())
                }
                (None, None) => {
                    let mut segment = Segment::new();
                    segment.text = entry.text;
                    segment
                }
            };
            segments.push(segment);
        }

        Ok(Script::from_segments(segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segments_in_order() {
        let toml_str = r#"
[[segment]]
text = "one"
voice_id = "v1"

[[segment]]
text = "two"
voice = "Rachel"
"#;
        let file: ScriptFile = toml::from_str(toml_str).unwrap();
        assert_eq!(file.segments.len(), 2);
        assert_eq!(file.segments[0].text, "one");
        assert_eq!(file.segments[0].voice_id.as_deref(), Some("v1"));
        assert_eq!(file.segments[1].voice.as_deref(), Some("Rachel"));
        assert!(file.needs_catalog());
    }

    #[test]
    fn test_ids_only_needs_no_catalog() {
        let toml_str = r#"
[[segment]]
text = "one"
voice_id = "v1"
"#;
        let file: ScriptFile = toml::from_str(toml_str).unwrap();
        assert!(!file.needs_catalog());
    }

    #[test]
    fn test_unassigned_segment_left_for_validation() {
        let toml_str = r#"
[[segment]]
text = "no voice here"
"#;
        let file: ScriptFile = toml::from_str(toml_str).unwrap();
        let session = Session::new("test");
        let script = file.into_script(&session).unwrap();
        assert_eq!(script.validate(), vec![1]);
    }

    #[test]
    fn test_unknown_voice_name_is_an_error() {
        let toml_str = r#"
[[segment]]
text = "hello"
voice = "Nobody"
"#;
        let file: ScriptFile = toml::from_str(toml_str).unwrap();
        let session = Session::new("test");
        let err = file.into_script(&session).unwrap_err();
        assert!(err.to_string().contains("Nobody"));
    }
}
