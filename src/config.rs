//! Editor limits and defaults
//!
//! Loaded from YAML; every field is optional and falls back to the value
//! in `EditorConfig::default()`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    pub max_chord_notes: usize,
    pub max_voices: usize,
    pub max_staves: usize,
    pub min_staff_system_gap: i32,
    pub max_staff_system_gap: i32,
    pub default_staff_system_gap: i32,
    /// Lowest staff position a note or rest may take
    pub min_position: i32,
    pub max_position: i32,
    pub max_grouping_entries_in_voice: usize,
    /// Measures per row when a staff system has no stored row lengths
    pub default_row_length: usize,
    pub default_staff_width: u32,
    /// Alpha of the note or rest under the cursor
    pub cursor_alpha: String,
    /// Alpha of the other entries in the cursor's grouping
    pub grouping_alpha: String,
    /// Number of edits kept for undo
    pub undo_history: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_chord_notes: 10,
            max_voices: 4,
            max_staves: 4,
            min_staff_system_gap: 4,
            max_staff_system_gap: 32,
            default_staff_system_gap: 12,
            min_position: -20,
            max_position: 50,
            max_grouping_entries_in_voice: 32,
            default_row_length: 3,
            default_staff_width: 300,
            cursor_alpha: "ff".to_string(),
            grouping_alpha: "32".to_string(),
            undo_history: 100,
        }
    }
}

impl EditorConfig {
    /// Parse a YAML document; an empty document yields the defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: EditorConfig = serde_yaml::from_str(yaml)?;
        config.check()?;
        Ok(config)
    }

    /// Read and parse a YAML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ScoreError::Parse(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn position_in_range(&self, position: i32) -> bool {
        (self.min_position..=self.max_position).contains(&position)
    }

    fn check(&self) -> Result<()> {
        if self.min_position > self.max_position {
            return Err(ScoreError::Parse(format!(
                "min_position {} is above max_position {}",
                self.min_position, self.max_position
            )));
        }
        if self.min_staff_system_gap > self.max_staff_system_gap {
            return Err(ScoreError::Parse(format!(
                "min_staff_system_gap {} is above max_staff_system_gap {}",
                self.min_staff_system_gap, self.max_staff_system_gap
            )));
        }
        if self.max_staves == 0 || self.max_voices == 0 || self.max_chord_notes == 0 {
            return Err(ScoreError::Parse(
                "max_staves, max_voices and max_chord_notes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = EditorConfig::from_yaml("max_staves: 2\ngrouping_alpha: \"40\"\n").unwrap();
        assert_eq!(config.max_staves, 2);
        assert_eq!(config.grouping_alpha, "40");
        assert_eq!(config.max_voices, 4);
        assert_eq!(config.default_staff_system_gap, 12);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(EditorConfig::from_yaml("  \n").unwrap(), EditorConfig::default());
    }

    #[test]
    fn test_inverted_ranges_are_rejected() {
        assert!(EditorConfig::from_yaml("min_position: 10\nmax_position: 0\n").is_err());
        assert!(EditorConfig::from_yaml("max_staves: 0\n").is_err());
        assert!(EditorConfig::from_yaml("max_staves: [1]\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "undo_history: 5").unwrap();
        let config = EditorConfig::load(file.path()).unwrap();
        assert_eq!(config.undo_history, 5);
        assert!(EditorConfig::load(Path::new("/nonexistent/editor.yaml")).is_err());
    }
}
