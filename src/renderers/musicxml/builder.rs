// MusicXML builder state machine

use quick_xml::escape::escape;

use crate::renderers::pitch::Pitch;

/// One `<note>` element, pitched or rest
#[derive(Clone, Debug, PartialEq)]
pub struct NoteSpec {
    /// `None` writes a rest
    pub pitch: Option<Pitch>,
    /// Second and later notes of a chord
    pub chord: bool,
    pub duration: u32,
    pub voice: usize,
    pub note_type: &'static str,
    pub dots: u8,
    /// Written accidental, only for explicit ones
    pub accidental: Option<&'static str>,
    pub stem: Option<&'static str>,
    pub beam: Option<&'static str>,
}

/// Measure attributes; `None` fields are left out
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attributes {
    pub divisions: Option<u32>,
    /// Circle of fifths position
    pub fifths: Option<i8>,
    /// Beats, beat type and whether to use the common time symbol
    pub time: Option<(u32, u32, bool)>,
    pub clef: Option<(&'static str, u8)>,
}

impl Attributes {
    pub fn is_empty(&self) -> bool {
        *self == Attributes::default()
    }
}

/// State machine for building partwise MusicXML documents
pub struct MusicXmlBuilder {
    buffer: String,
    part_names: Vec<String>,
    title: Option<String>,
    part_open: bool,
    measure_open: bool,
}

impl MusicXmlBuilder {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            part_names: Vec::new(),
            title: None,
            part_open: false,
            measure_open: false,
        }
    }

    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    /// Open the next part; ids run `P1`, `P2`, ...
    pub fn start_part(&mut self, name: &str) {
        self.end_part();
        self.part_names.push(name.to_string());
        self.buffer
            .push_str(&format!("  <part id=\"P{}\">\n", self.part_names.len()));
        self.part_open = true;
    }

    pub fn end_part(&mut self) {
        self.end_measure();
        if self.part_open {
            self.buffer.push_str("  </part>\n");
            self.part_open = false;
        }
    }

    /// Open a measure; `print` markers go before the attributes
    pub fn start_measure(&mut self, number: usize, new_system: bool) {
        self.end_measure();
        self.buffer
            .push_str(&format!("    <measure number=\"{}\">\n", number));
        if new_system {
            self.buffer.push_str("      <print new-system=\"yes\"/>\n");
        }
        self.measure_open = true;
    }

    pub fn end_measure(&mut self) {
        if self.measure_open {
            self.buffer.push_str("    </measure>\n");
            self.measure_open = false;
        }
    }

    pub fn write_attributes(&mut self, attributes: &Attributes) {
        if attributes.is_empty() {
            return;
        }
        self.buffer.push_str("      <attributes>\n");
        if let Some(divisions) = attributes.divisions {
            self.buffer
                .push_str(&format!("        <divisions>{}</divisions>\n", divisions));
        }
        if let Some(fifths) = attributes.fifths {
            self.buffer
                .push_str(&format!("        <key><fifths>{}</fifths></key>\n", fifths));
        }
        if let Some((beats, beat_type, common)) = attributes.time {
            let symbol = if common { " symbol=\"common\"" } else { "" };
            self.buffer.push_str(&format!(
                "        <time{}><beats>{}</beats><beat-type>{}</beat-type></time>\n",
                symbol, beats, beat_type
            ));
        }
        if let Some((sign, line)) = attributes.clef {
            self.buffer.push_str(&format!(
                "        <clef><sign>{}</sign><line>{}</line></clef>\n",
                sign, line
            ));
        }
        self.buffer.push_str("      </attributes>\n");
    }

    pub fn write_note(&mut self, note: &NoteSpec) {
        self.buffer.push_str("      <note>\n");
        if note.chord {
            self.buffer.push_str("        <chord/>\n");
        }
        match &note.pitch {
            Some(pitch) => {
                self.buffer.push_str("        <pitch>\n");
                self.buffer
                    .push_str(&format!("          <step>{}</step>\n", pitch.step()));
                if pitch.alter != 0 {
                    self.buffer
                        .push_str(&format!("          <alter>{}</alter>\n", pitch.alter));
                }
                self.buffer
                    .push_str(&format!("          <octave>{}</octave>\n", pitch.octave));
                self.buffer.push_str("        </pitch>\n");
            }
            None => self.buffer.push_str("        <rest/>\n"),
        }
        self.buffer
            .push_str(&format!("        <duration>{}</duration>\n", note.duration));
        self.buffer
            .push_str(&format!("        <voice>{}</voice>\n", note.voice));
        self.buffer
            .push_str(&format!("        <type>{}</type>\n", note.note_type));
        for _ in 0..note.dots {
            self.buffer.push_str("        <dot/>\n");
        }
        if let Some(accidental) = note.accidental {
            self.buffer
                .push_str(&format!("        <accidental>{}</accidental>\n", accidental));
        }
        if let Some(stem) = note.stem {
            self.buffer
                .push_str(&format!("        <stem>{}</stem>\n", stem));
        }
        if let Some(beam) = note.beam {
            self.buffer
                .push_str(&format!("        <beam number=\"1\">{}</beam>\n", beam));
        }
        self.buffer.push_str("      </note>\n");
    }

    /// Rewind the measure clock before the next voice
    pub fn write_backup(&mut self, duration: u32) {
        if duration == 0 {
            return;
        }
        self.buffer.push_str(&format!(
            "      <backup><duration>{}</duration></backup>\n",
            duration
        ));
    }

    /// Advance the voice without sounding anything
    pub fn write_forward(&mut self, duration: u32, voice: usize) {
        if duration == 0 {
            return;
        }
        self.buffer.push_str(&format!(
            "      <forward><duration>{}</duration><voice>{}</voice></forward>\n",
            duration, voice
        ));
    }

    pub fn write_final_barline(&mut self) {
        self.buffer.push_str(
            "      <barline location=\"right\"><bar-style>light-heavy</bar-style></barline>\n",
        );
    }

    /// Close everything and return the complete document
    pub fn finalize(mut self) -> String {
        self.end_part();

        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<!DOCTYPE score-partwise PUBLIC \"-//Recordare//DTD MusicXML 3.1 Partwise//EN\" \"http://www.musicxml.org/dtds/partwise.dtd\">\n");
        xml.push_str("<score-partwise version=\"3.1\">\n");

        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            xml.push_str("  <movement-title>");
            xml.push_str(&escape(title));
            xml.push_str("</movement-title>\n");
        }

        xml.push_str("  <part-list>\n");
        for (index, name) in self.part_names.iter().enumerate() {
            xml.push_str(&format!("    <score-part id=\"P{}\">\n", index + 1));
            xml.push_str(&format!("      <part-name>{}</part-name>\n", escape(name)));
            xml.push_str("    </score-part>\n");
        }
        xml.push_str("  </part-list>\n");
        xml.push_str(&self.buffer);
        xml.push_str("</score-partwise>\n");
        xml
    }
}

impl Default for MusicXmlBuilder {
    fn default() -> Self {
        Self::new()
    }
}
