//! PDF text line mapping.

use std::str::Lines;

use regex::Regex;
use tracing::trace;

use super::FieldMap;
use crate::error::ProcessingError;
use crate::models::template::{Field, PdfTemplate};

/// A PDF template with its patterns compiled.
#[derive(Debug, Clone)]
pub struct CompiledPdfTemplate {
    start_marker: String,
    end_marker: String,
    patterns: Vec<(Field, Regex)>,
}

impl CompiledPdfTemplate {
    /// Compile every pattern, failing on the first invalid one.
    pub fn compile(template: &PdfTemplate) -> Result<Self, ProcessingError> {
        let patterns = template
            .patterns
            .iter()
            .map(|(&field, pattern)| {
                Regex::new(pattern)
                    .map(|re| (field, re))
                    .map_err(|source| ProcessingError::Pattern {
                        field: field.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            start_marker: template.items_start_marker.clone(),
            end_marker: template.items_end_marker.clone(),
            patterns,
        })
    }

    /// Match every pattern independently against one line.
    ///
    /// Capture group 1 is the value; a pattern without groups yields the whole
    /// match. Unmatched patterns leave their field unset.
    pub fn match_line(&self, line: &str) -> FieldMap {
        let mut fields = FieldMap::new();
        for (field, re) in &self.patterns {
            let Some(caps) = re.captures(line) else {
                continue;
            };
            let value = if re.captures_len() > 1 { caps.get(1) } else { caps.get(0) };
            if let Some(value) = value {
                fields.insert(*field, value.as_str().trim());
            }
        }
        fields
    }
}

/// Iterator over the candidate items of the marked section of a text.
///
/// The section opens on a line containing the start marker and closes on a line
/// containing the end marker. Marker lines are consumed, lines outside the
/// section and blank lines inside it are ignored. A later start marker opens
/// the section again. An empty start marker means the section is open from the
/// first line; an empty end marker never closes it.
pub struct LineMapper<'a> {
    lines: Lines<'a>,
    template: CompiledPdfTemplate,
    in_section: bool,
}

impl<'a> LineMapper<'a> {
    pub fn new(text: &'a str, template: CompiledPdfTemplate) -> Self {
        let in_section = template.start_marker.is_empty();
        Self {
            lines: text.lines(),
            template,
            in_section,
        }
    }

    fn is_start(&self, line: &str) -> bool {
        !self.template.start_marker.is_empty() && line.contains(&self.template.start_marker)
    }

    fn is_end(&self, line: &str) -> bool {
        !self.template.end_marker.is_empty() && line.contains(&self.template.end_marker)
    }
}

impl Iterator for LineMapper<'_> {
    type Item = FieldMap;

    fn next(&mut self) -> Option<FieldMap> {
        while let Some(line) = self.lines.next() {
            if !self.in_section {
                if self.is_start(line) {
                    trace!("Items section opened");
                    self.in_section = true;
                }
                continue;
            }
            if self.is_end(line) {
                trace!("Items section closed");
                self.in_section = false;
                continue;
            }
            if self.is_start(line) || line.trim().is_empty() {
                continue;
            }
            return Some(self.template.match_line(line));
        }
        None
    }
}

/// Compile a PDF template and map the lines of a text.
pub fn map_lines<'a>(text: &'a str, template: &PdfTemplate) -> Result<LineMapper<'a>, ProcessingError> {
    Ok(LineMapper::new(text, CompiledPdfTemplate::compile(template)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn template(start: &str, end: &str) -> PdfTemplate {
        PdfTemplate {
            items_start_marker: start.to_string(),
            items_end_marker: end.to_string(),
            patterns: BTreeMap::from([
                (Field::ProductCode, r"^\s*(\S+)".to_string()),
                (Field::Quantity, r"qty\s*(\d+)".to_string()),
                (Field::Unit, r"\b(?:pcs|ctn)\b".to_string()),
            ]),
        }
    }

    #[test]
    fn test_only_section_lines_are_mapped() {
        let text = "A0 qty 9\n--- ITEMS START ---\nA1 qty 1 pcs\n\n   \nA2 ctn\n--- ITEMS END ---\nA3 qty 3";
        let mapped: Vec<FieldMap> = map_lines(text, &template("ITEMS START", "ITEMS END"))
            .unwrap()
            .collect();

        assert_eq!(
            mapped,
            vec![
                FieldMap::from([(Field::ProductCode, "A1"), (Field::Quantity, "1"), (Field::Unit, "pcs")]),
                FieldMap::from([(Field::ProductCode, "A2"), (Field::Unit, "ctn")]),
            ]
        );
    }

    #[test]
    fn test_section_can_reopen() {
        let text = "START\nA1 qty 1\nEND\nfooter\nSTART\nB1 qty 2\nEND";
        let codes: Vec<String> = map_lines(text, &template("START", "END"))
            .unwrap()
            .map(|f| f.get(Field::ProductCode).unwrap().to_string())
            .collect();

        assert_eq!(codes, vec!["A1", "B1"]);
    }

    #[test]
    fn test_unterminated_section_runs_to_end() {
        let text = "START\nA1 qty 1\nA2 qty 2";
        assert_eq!(map_lines(text, &template("START", "END")).unwrap().count(), 2);
    }

    #[test]
    fn test_no_start_marker_no_items() {
        let text = "A1 qty 1\nA2 qty 2\nEND";
        assert_eq!(map_lines(text, &template("START", "END")).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_start_marker_opens_immediately() {
        let text = "A1 qty 1\nTOTAL\nA2 qty 2";
        assert_eq!(map_lines(text, &template("", "TOTAL")).unwrap().count(), 1);
    }

    #[test]
    fn test_unmatched_line_yields_empty_candidate() {
        let mut t = template("START", "END");
        t.patterns = BTreeMap::from([(Field::Quantity, r"qty\s*(\d+)".to_string())]);

        let mapped: Vec<FieldMap> = map_lines("START\nno numbers here\nEND", &t).unwrap().collect();
        assert_eq!(mapped, vec![FieldMap::new()]);
    }
}
