use crate::Result;
use ohno::IntoAppError;
use serde_yaml::Mapping;

/// Serialization style used when writing records.
///
/// `serde_yaml` emits block sequences flush with their parent key (`key:\n- item`). Hand-edited
/// data repositories usually indent them (`key:\n  - item`), so by default the emitted text is
/// re-indented to keep diffs limited to the fields that actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YamlStyle {
    /// Indent block sequences nested under a mapping key by two spaces
    pub indent_sequences: bool,

    /// Start every document with an explicit `---` marker
    pub document_start: bool,
}

impl Default for YamlStyle {
    fn default() -> Self {
        Self {
            indent_sequences: true,
            document_start: false,
        }
    }
}

impl YamlStyle {
    /// Render a record mapping as a YAML document in this style.
    pub fn render(&self, mapping: &Mapping) -> Result<String> {
        let text = serde_yaml::to_string(mapping).into_app_err("serializing record to YAML")?;
        let text = if self.indent_sequences { indent_block_sequences(&text) } else { text };

        Ok(if self.document_start { format!("---\n{text}") } else { text })
    }
}

/// An open block sequence found in the emitted text.
#[derive(Debug, Clone, Copy)]
struct OpenSequence {
    /// Column of the `-` indicator in the emitted text
    column: usize,

    /// Flush sequences sit at their parent key's column and get shifted; compact
    /// sequences (`- - item`) are already placed relative to their parent item.
    flush: bool,
}

fn indent_block_sequences(text: &str) -> String {
    const STEP: usize = 2;

    let mut out = String::with_capacity(text.len() + text.len() / 4);
    let mut open: Vec<OpenSequence> = Vec::new();

    // (column of the header line, shift applied to the header) while inside a block scalar
    let mut block_scalar: Option<(usize, usize)> = None;

    for line in text.lines() {
        let content = line.trim_start_matches(' ');
        let column = line.len() - content.len();

        if let Some((header_column, shift)) = block_scalar {
            if content.is_empty() {
                out.push('\n');
                continue;
            }
            if column > header_column {
                push_shifted(&mut out, line, shift);
                continue;
            }
            block_scalar = None;
        }

        if content.is_empty() {
            out.push('\n');
            continue;
        }

        let is_item = is_sequence_item(content);
        while let Some(top) = open.last() {
            if top.column > column || (top.column == column && !is_item) {
                let _ = open.pop();
            } else {
                break;
            }
        }

        if is_item && open.last().is_none_or(|top| top.column != column) {
            open.push(OpenSequence { column, flush: true });
        }

        let shift = STEP * open.iter().filter(|s| s.flush).count();
        push_shifted(&mut out, line, shift);

        // compact nested sequences on the same line, e.g. `- - item`
        if is_item {
            let mut rest = content;
            let mut nested_column = column;
            while let Some(inner) = rest.strip_prefix("- ") {
                if !is_sequence_item(inner) {
                    break;
                }
                nested_column += STEP;
                open.push(OpenSequence {
                    column: nested_column,
                    flush: false,
                });
                rest = inner;
            }
        }

        if starts_block_scalar(content) {
            block_scalar = Some((column, shift));
        }
    }

    out
}

fn push_shifted(out: &mut String, line: &str, shift: usize) {
    out.extend(core::iter::repeat_n(' ', shift));
    out.push_str(line);
    out.push('\n');
}

fn is_sequence_item(content: &str) -> bool {
    content == "-" || content.starts_with("- ")
}

/// Whether a line ends with a literal or folded block scalar header (`|`, `|-`, `>+`, `|2-`, ...).
fn starts_block_scalar(content: &str) -> bool {
    let Some(last) = content.rsplit(' ').next() else {
        return false;
    };

    let mut chars = last.chars();
    matches!(chars.next(), Some('|' | '>')) && chars.all(|c| c.is_ascii_digit() || c == '-' || c == '+')
}
