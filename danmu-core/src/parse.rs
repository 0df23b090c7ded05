//! Danmaku source file parsing
//!
//! Two source formats are recognized, selected by file extension: a JSON
//! array of records, and the ASS/SSA subtitle format from which only
//! `Dialogue:` lines are taken. Records that fail validation are skipped and
//! reported as [`ParseWarning`]s; only a payload that is structurally broken
//! as a whole fails the parse.

use crate::event::{DanmakuEvent, DEFAULT_ALPHA, DEFAULT_COLOR};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Recognized danmaku source formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// JSON array of `{text, time_stamp, color, alpha}` records
    Json,
    /// ASS/SSA subtitle dialogue lines
    Ass,
}

impl SourceFormat {
    /// Classifies a danmaku file by its extension (case-insensitive).
    ///
    /// `.json` is the record format, `.ass` and `.ssa` are the subtitle
    /// dialogue format. Anything else is [`Error::UnsupportedFormat`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match ext.as_str() {
            "json" => Ok(Self::Json),
            "ass" | "ssa" => Ok(Self::Ass),
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// A single record of the JSON danmaku format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRecord {
    pub text: String,
    pub time_stamp: f64,
    pub color: [u8; 3],
    pub alpha: u8,
}

impl From<&DanmakuEvent> for JsonRecord {
    fn from(event: &DanmakuEvent) -> Self {
        Self {
            text: event.text.clone(),
            time_stamp: event.start_secs,
            color: event.color,
            alpha: event.alpha,
        }
    }
}

/// A record or line that failed validation and was skipped
#[derive(Debug, Clone)]
pub struct ParseWarning {
    /// 1-based record index (JSON) or line number (ASS/SSA)
    pub line: usize,
    /// What was wrong with it
    pub reason: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

/// Outcome of parsing a danmaku file
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    /// Valid events, in input order
    pub events: Vec<DanmakuEvent>,
    /// One warning per skipped record or line
    pub warnings: Vec<ParseWarning>,
}

impl Parsed {
    fn skip(&mut self, line: usize, reason: impl Into<String>) {
        self.warnings.push(ParseWarning {
            line,
            reason: reason.into(),
        });
    }
}

/// Parses a danmaku payload in the given format
pub fn parse_str(format: SourceFormat, payload: &str) -> Result<Parsed> {
    match format {
        SourceFormat::Json => parse_json(payload),
        SourceFormat::Ass => parse_ass(payload),
    }
}

/// Classifies a danmaku file by extension, reads it and parses it
pub fn parse_file(path: &Path) -> Result<Parsed> {
    let format = SourceFormat::from_path(path)?;
    let payload = std::fs::read_to_string(path)?;
    parse_str(format, &payload)
}

fn parse_json(payload: &str) -> Result<Parsed> {
    // The payload must be an array; individual records may still be bad.
    let records: Vec<serde_json::Value> =
        serde_json::from_str(payload).map_err(|e| Error::Malformed {
            line: e.line(),
            reason: e.to_string(),
        })?;

    let mut parsed = Parsed::default();
    for (index, value) in records.into_iter().enumerate() {
        let record: JsonRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                parsed.skip(index + 1, e.to_string());
                continue;
            }
        };

        if record.text.is_empty() {
            parsed.skip(index + 1, "empty text");
            continue;
        }
        if !record.time_stamp.is_finite() || record.time_stamp < 0.0 {
            parsed.skip(index + 1, format!("invalid time_stamp {}", record.time_stamp));
            continue;
        }

        parsed.events.push(DanmakuEvent::new(
            record.text,
            record.time_stamp,
            record.color,
            record.alpha,
        ));
    }

    Ok(parsed)
}

fn parse_ass(payload: &str) -> Result<Parsed> {
    let mut parsed = Parsed::default();

    for (index, line) in payload.lines().enumerate() {
        let line_no = index + 1;
        let Some(rest) = line.strip_prefix("Dialogue:") else {
            continue;
        };

        // Field 1 is the start timestamp, the final field is the text.
        let fields: Vec<&str> = rest.split(',').collect();
        if fields.len() < 3 {
            parsed.skip(line_no, "dialogue line has too few fields");
            continue;
        }

        let start_secs = match parse_ass_timestamp(fields[1].trim()) {
            Ok(secs) => secs,
            Err(reason) => {
                parsed.skip(line_no, reason);
                continue;
            }
        };

        let text = fields.last().copied().unwrap_or_default().trim();
        if text.is_empty() {
            parsed.skip(line_no, "dialogue line has empty text");
            continue;
        }

        // The format's styling fields are not interpreted; dialogue text is
        // rendered opaque white.
        parsed
            .events
            .push(DanmakuEvent::new(text, start_secs, DEFAULT_COLOR, DEFAULT_ALPHA));
    }

    Ok(parsed)
}

/// Parses an ASS/SSA `H:MM:SS.CC` timestamp into seconds
fn parse_ass_timestamp(value: &str) -> std::result::Result<f64, String> {
    let parts: Vec<&str> = value.split([':', '.']).collect();
    if parts.len() != 4 {
        return Err(format!("expected H:MM:SS.CC timestamp, got {value:?}"));
    }

    let mut components = [0.0f64; 4];
    for (component, part) in components.iter_mut().zip(&parts) {
        *component = part
            .parse()
            .map_err(|_| format!("non-numeric timestamp component {part:?}"))?;
    }

    let [hours, minutes, seconds, centis] = components;
    Ok(hours * 3600.0 + minutes * 60.0 + seconds + centis / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("dm.json")).unwrap(),
            SourceFormat::Json
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("dm.ass")).unwrap(),
            SourceFormat::Ass
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("dm.SSA")).unwrap(),
            SourceFormat::Ass
        );
        assert!(matches!(
            SourceFormat::from_path(Path::new("dm.srt")),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(matches!(
            SourceFormat::from_path(Path::new("dm")),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_json_records_copied_in_order() {
        let payload = r#"[
            {"text": "hi", "time_stamp": 0.0, "color": [255, 0, 0], "alpha": 255},
            {"text": "there", "time_stamp": 2.5, "color": [0, 255, 0], "alpha": 128}
        ]"#;

        let parsed = parse_str(SourceFormat::Json, payload).unwrap();
        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.events.len(), 2);

        assert_eq!(parsed.events[0].text, "hi");
        assert_eq!(parsed.events[0].start_secs, 0.0);
        assert_eq!(parsed.events[0].color, [255, 0, 0]);
        assert_eq!(parsed.events[0].alpha, 255);

        assert_eq!(parsed.events[1].text, "there");
        assert_eq!(parsed.events[1].start_secs, 2.5);
        assert_eq!(parsed.events[1].color, [0, 255, 0]);
        assert_eq!(parsed.events[1].alpha, 128);
    }

    #[test]
    fn test_json_record_roundtrip() {
        let payload = r#"[{"text": "hi", "time_stamp": 1.25, "color": [1, 2, 3], "alpha": 200}]"#;
        let parsed = parse_str(SourceFormat::Json, payload).unwrap();

        let records: Vec<JsonRecord> = parsed.events.iter().map(JsonRecord::from).collect();
        let serialized = serde_json::to_string(&records).unwrap();
        let reparsed: Vec<JsonRecord> = serde_json::from_str(&serialized).unwrap();

        assert_eq!(reparsed[0].text, "hi");
        assert_eq!(reparsed[0].time_stamp, 1.25);
        assert_eq!(reparsed[0].color, [1, 2, 3]);
        assert_eq!(reparsed[0].alpha, 200);
    }

    #[test]
    fn test_json_bad_records_skipped_with_warnings() {
        let payload = r#"[
            {"text": "ok", "time_stamp": 1.0, "color": [0, 0, 0], "alpha": 255},
            {"text": "no timestamp", "color": [0, 0, 0], "alpha": 255},
            {"text": "bad color", "time_stamp": 1.0, "color": [300, 0, 0], "alpha": 255},
            {"text": "", "time_stamp": 1.0, "color": [0, 0, 0], "alpha": 255},
            {"text": "negative", "time_stamp": -4.0, "color": [0, 0, 0], "alpha": 255}
        ]"#;

        let parsed = parse_str(SourceFormat::Json, payload).unwrap();
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.events[0].text, "ok");
        assert_eq!(parsed.warnings.len(), 4);
        assert_eq!(parsed.warnings[0].line, 2);
    }

    #[test]
    fn test_json_non_array_fails_whole_payload() {
        let result = parse_str(SourceFormat::Json, r#"{"text": "hi"}"#);
        assert!(matches!(result, Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_ass_dialogue_line() {
        let payload = "Dialogue: 0,0:00:05.50,0:00:10.00,Default,,0,0,0,,Hello";
        let parsed = parse_str(SourceFormat::Ass, payload).unwrap();

        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.events[0].text, "Hello");
        assert_eq!(parsed.events[0].start_secs, 5.5);
        assert_eq!(parsed.events[0].color, DEFAULT_COLOR);
        assert_eq!(parsed.events[0].alpha, DEFAULT_ALPHA);
    }

    #[test]
    fn test_ass_non_dialogue_lines_ignored() {
        let payload = "\
[Script Info]
Title: test

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:01:00.00,0:01:05.00,Default,,0,0,0,,first
Dialogue: 0,1:02:03.04,1:02:08.00,Default,,0,0,0,,second
";

        let parsed = parse_str(SourceFormat::Ass, payload).unwrap();
        assert_eq!(parsed.events.len(), 2);
        assert_eq!(parsed.events[0].start_secs, 60.0);
        assert_eq!(parsed.events[1].start_secs, 3723.04);
        assert_eq!(parsed.events[1].text, "second");
    }

    #[test]
    fn test_ass_malformed_timestamp_skipped() {
        let payload = "\
Dialogue: 0,0:00:xx.00,0:00:05.00,Default,,0,0,0,,broken
Dialogue: 0,0:00:01,0:00:05.00,Default,,0,0,0,,short
Dialogue: 0,0:00:02.00,0:00:05.00,Default,,0,0,0,,fine
";

        let parsed = parse_str(SourceFormat::Ass, payload).unwrap();
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.events[0].text, "fine");
        assert_eq!(parsed.warnings.len(), 2);
        assert_eq!(parsed.warnings[0].line, 1);
        assert_eq!(parsed.warnings[1].line, 2);
    }

    #[test]
    fn test_ass_timestamp_components() {
        assert_eq!(parse_ass_timestamp("0:00:05.50").unwrap(), 5.5);
        assert_eq!(parse_ass_timestamp("1:02:03.04").unwrap(), 3723.04);
        assert!(parse_ass_timestamp("00:05.50").is_err());
        assert!(parse_ass_timestamp("0:00:05").is_err());
        assert!(parse_ass_timestamp("a:b:c.d").is_err());
    }
}
