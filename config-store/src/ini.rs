//! Line-preserving reader and writer for the pipeline's INI file.
//!
//! Only values that are explicitly set change on render; comments, blank
//! lines, key order and the file's line ending survive a round trip.

use redditlens_core::ConfigError;

#[derive(Debug, Clone, PartialEq)]
enum Line {
    /// Blank line or comment, kept verbatim.
    Other(String),
    Section(String),
    Entry {
        key: String,
        value: String,
        /// Original text, dropped once the value is changed.
        raw: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IniDocument {
    lines: Vec<Line>,
    /// `\r\n` when the parsed text used it, `\n` otherwise.
    newline: &'static str,
}

impl IniDocument {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut lines = Vec::new();
        let mut sections: Vec<String> = Vec::new();
        let mut keys_in_section: Vec<String> = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = raw.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                lines.push(Line::Other(raw.to_string()));
                continue;
            }

            if let Some(header) = trimmed.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| ConfigError::Syntax {
                        line: line_no,
                        details: format!("bad section header '{}'", trimmed),
                    })?;
                if sections.iter().any(|existing| existing == name) {
                    return Err(ConfigError::Syntax {
                        line: line_no,
                        details: format!("duplicate section [{}]", name),
                    });
                }
                sections.push(name.to_string());
                keys_in_section.clear();
                lines.push(Line::Section(name.to_string()));
                continue;
            }

            if sections.is_empty() {
                return Err(ConfigError::Syntax {
                    line: line_no,
                    details: "key outside of any section".to_string(),
                });
            }

            let separator = trimmed.find(['=', ':']).ok_or_else(|| ConfigError::Syntax {
                line: line_no,
                details: format!("expected 'key = value', found '{}'", trimmed),
            })?;
            let key = normalize_key(&trimmed[..separator]);
            let value = trimmed[separator + 1..].trim().to_string();

            if key.is_empty() {
                return Err(ConfigError::Syntax {
                    line: line_no,
                    details: "empty key".to_string(),
                });
            }
            if keys_in_section.contains(&key) {
                return Err(ConfigError::Syntax {
                    line: line_no,
                    details: format!("duplicate key '{}'", key),
                });
            }
            keys_in_section.push(key.clone());

            lines.push(Line::Entry {
                key,
                value,
                raw: Some(raw.to_string()),
            });
        }

        let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
        Ok(Self { lines, newline })
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.section_span(section).is_some()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let (start, end) = self.section_span(section)?;
        let key = normalize_key(key);
        self.lines[start + 1..end].iter().find_map(|line| match line {
            Line::Entry { key: k, value, .. } if *k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Sets a value, adding the key (and the section) when absent.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        let key = normalize_key(key);
        let value = value.trim().to_string();

        let Some((start, end)) = self.section_span(section) else {
            if !self.lines.is_empty() {
                self.lines.push(Line::Other(String::new()));
            }
            self.lines.push(Line::Section(section.to_string()));
            self.lines.push(Line::Entry {
                key,
                value,
                raw: None,
            });
            return;
        };

        let mut insert_at = start + 1;
        for index in start + 1..end {
            if let Line::Entry {
                key: existing,
                value: current,
                raw,
            } = &mut self.lines[index]
            {
                if *existing == key {
                    if *current != value {
                        *current = value;
                        *raw = None;
                    }
                    return;
                }
                insert_at = index + 1;
            }
        }

        self.lines.insert(
            insert_at,
            Line::Entry {
                key,
                value,
                raw: None,
            },
        );
    }

    /// Rewrites every value whose key satisfies `predicate` with `mask`.
    pub fn mask_values(&mut self, predicate: impl Fn(&str) -> bool, mask: &str) {
        for line in &mut self.lines {
            if let Line::Entry { key, value, raw } = line {
                if predicate(key) && !value.is_empty() {
                    *value = mask.to_string();
                    *raw = None;
                }
            }
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Other(text) => out.push_str(text),
                Line::Section(name) => {
                    out.push('[');
                    out.push_str(name);
                    out.push(']');
                }
                Line::Entry {
                    raw: Some(text), ..
                } => out.push_str(text),
                Line::Entry { key, value, .. } => {
                    out.push_str(key);
                    out.push_str(" = ");
                    out.push_str(value);
                }
            }
            out.push_str(self.newline);
        }
        out
    }

    /// Header index and exclusive end of the lines belonging to `section`.
    fn section_span(&self, section: &str) -> Option<(usize, usize)> {
        let start = self
            .lines
            .iter()
            .position(|line| matches!(line, Line::Section(name) if name == section))?;
        let end = self.lines[start + 1..]
            .iter()
            .position(|line| matches!(line, Line::Section(_)))
            .map_or(self.lines.len(), |offset| start + 1 + offset);
        Some((start, end))
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}
