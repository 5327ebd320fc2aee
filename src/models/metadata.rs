//! Typed views over the `metadataJson` strings
//!
//! Parsing is lenient: malformed JSON or a field of the wrong type falls back
//! to that field's default without touching the others. Keys this module does
//! not know about are carried through `to_json` unchanged.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use super::cursor::Cursor;
use super::elements::ConnectorType;
use super::ids::VoiceId;
use crate::config::EditorConfig;

pub const DEFAULT_ALPHA: &str = "ff";

static HEX_ALPHA: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{2}$").unwrap());

fn parse_object(json: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn get_bool(object: &Map<String, Value>, key: &str) -> Option<bool> {
    object.get(key).and_then(Value::as_bool)
}

fn write_object(object: Map<String, Value>) -> String {
    Value::Object(object).to_string()
}

/// Measure count split into rows of `row_length`, the last one shorter
pub fn default_row_lengths(measure_count: usize, row_length: usize) -> Vec<usize> {
    let row_length = row_length.max(1);
    (0..measure_count)
        .step_by(row_length)
        .map(|start| row_length.min(measure_count - start))
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct StaffSystemMetadata {
    pub connector_type: ConnectorType,
    pub gap: i32,
    pub row_lengths: Vec<usize>,
    pub cursor_id: Option<Cursor>,
    pub name: Option<String>,
    extra: Map<String, Value>,
}

impl StaffSystemMetadata {
    pub fn parse(json: &str, measure_count: usize, config: &EditorConfig) -> Self {
        let mut object = parse_object(json);

        let connector_type = object
            .get("connectorType")
            .and_then(Value::as_str)
            .and_then(|name| name.parse().ok())
            .unwrap_or_default();

        let gap = object
            .get("gap")
            .and_then(Value::as_i64)
            .filter(|gap| *gap >= 0)
            .map(|gap| {
                gap.clamp(
                    i64::from(config.min_staff_system_gap),
                    i64::from(config.max_staff_system_gap),
                ) as i32
            })
            .unwrap_or(config.default_staff_system_gap);

        let row_lengths = object
            .get("rowLengths")
            .and_then(Value::as_array)
            .and_then(|rows| {
                rows.iter()
                    .map(|row| row.as_u64().map(|n| n as usize))
                    .collect::<Option<Vec<_>>>()
            })
            .unwrap_or_else(|| default_row_lengths(measure_count, config.default_row_length));

        let cursor_id = object
            .get("cursorId")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok());

        let name = object
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);

        for key in ["connectorType", "gap", "rowLengths", "cursorId", "name"] {
            object.remove(key);
        }

        Self {
            connector_type,
            gap,
            row_lengths,
            cursor_id,
            name,
            extra: object,
        }
    }

    /// Make the row lengths cover exactly `measure_count` measures
    pub fn normalize_rows(&mut self, measure_count: usize) {
        self.row_lengths.retain(|len| *len > 0);
        let mut covered = 0;
        let mut rows = Vec::with_capacity(self.row_lengths.len());
        for len in &self.row_lengths {
            if covered >= measure_count {
                break;
            }
            let len = (*len).min(measure_count - covered);
            rows.push(len);
            covered += len;
        }
        if covered < measure_count {
            match rows.last_mut() {
                Some(last) => *last += measure_count - covered,
                None => rows.push(measure_count),
            }
        }
        self.row_lengths = rows;
    }

    /// Index of the row containing the measure at `measure_index`
    pub fn row_of(&self, measure_index: usize) -> usize {
        let mut end: usize = 0;
        for (row, len) in self.row_lengths.iter().enumerate() {
            end = end.saturating_add(*len);
            if measure_index < end {
                return row;
            }
        }
        self.row_lengths.len().saturating_sub(1)
    }

    pub fn to_json(&self) -> String {
        let mut object = self.extra.clone();
        object.insert("connectorType".into(), self.connector_type.name().into());
        object.insert("gap".into(), self.gap.into());
        object.insert("rowLengths".into(), self.row_lengths.clone().into());
        if let Some(cursor) = &self.cursor_id {
            if let Ok(value) = serde_json::to_value(cursor) {
                object.insert("cursorId".into(), value);
            }
        }
        if let Some(name) = &self.name {
            object.insert("name".into(), name.clone().into());
        }
        write_object(object)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StaffMetadata {
    pub width: f64,
    extra: Map<String, Value>,
}

impl StaffMetadata {
    pub fn parse(json: &str, config: &EditorConfig) -> Self {
        let mut object = parse_object(json);
        let width = object
            .remove("width")
            .and_then(|value| value.as_f64())
            .unwrap_or(config.default_staff_width as f64);
        Self { width, extra: object }
    }

    pub fn to_json(&self) -> String {
        let mut object = self.extra.clone();
        object.insert("width".into(), self.width.into());
        write_object(object)
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct MeasureMetadata {
    pub draw_clef: bool,
    pub draw_key_signature: bool,
    pub draw_time_signature: bool,
    extra: Map<String, Value>,
}

impl MeasureMetadata {
    pub fn parse(json: &str) -> Self {
        let mut object = parse_object(json);
        let draw_clef = get_bool(&object, "drawClef").unwrap_or(false);
        let draw_key_signature = get_bool(&object, "drawKeySignature").unwrap_or(false);
        let draw_time_signature = get_bool(&object, "drawTimeSignature").unwrap_or(false);
        for key in ["drawClef", "drawKeySignature", "drawTimeSignature"] {
            object.remove(key);
        }
        Self {
            draw_clef,
            draw_key_signature,
            draw_time_signature,
            extra: object,
        }
    }

    pub fn to_json(&self) -> String {
        let mut object = self.extra.clone();
        object.insert("drawClef".into(), self.draw_clef.into());
        object.insert("drawKeySignature".into(), self.draw_key_signature.into());
        object.insert("drawTimeSignature".into(), self.draw_time_signature.into());
        write_object(object)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupingMetadata {
    pub stem_up: bool,
    extra: Map<String, Value>,
}

impl GroupingMetadata {
    /// Stems point up by default in even voices and down in odd ones
    pub fn parse(json: &str, voice_id: &VoiceId) -> Self {
        let mut object = parse_object(json);
        let stem_up = get_bool(&object, "stemUp").unwrap_or(voice_id.voices_order % 2 == 0);
        object.remove("stemUp");
        Self {
            stem_up,
            extra: object,
        }
    }

    pub fn to_json(&self) -> String {
        let mut object = self.extra.clone();
        object.insert("stemUp".into(), self.stem_up.into());
        write_object(object)
    }
}

/// Display state of a note or rest
#[derive(Clone, Debug, PartialEq)]
pub struct HighlightMetadata {
    pub highlight: bool,
    pub alpha: String,
    extra: Map<String, Value>,
}

pub type NoteMetadata = HighlightMetadata;
pub type RestMetadata = HighlightMetadata;

impl HighlightMetadata {
    pub fn parse(json: &str) -> Self {
        let mut object = parse_object(json);
        let highlight = get_bool(&object, "highlight").unwrap_or(false);
        let alpha = object
            .get("alpha")
            .and_then(Value::as_str)
            .filter(|alpha| HEX_ALPHA.is_match(alpha))
            .map(str::to_lowercase)
            .unwrap_or_else(|| DEFAULT_ALPHA.to_string());
        object.remove("highlight");
        object.remove("alpha");
        Self {
            highlight,
            alpha,
            extra: object,
        }
    }

    /// Set the alpha if it is a valid two digit hex value
    pub fn set_alpha(&mut self, alpha: &str) {
        if HEX_ALPHA.is_match(alpha) {
            self.alpha = alpha.to_lowercase();
        }
    }

    pub fn to_json(&self) -> String {
        let mut object = self.extra.clone();
        object.insert("highlight".into(), self.highlight.into());
        object.insert("alpha".into(), self.alpha.clone().into());
        write_object(object)
    }
}
