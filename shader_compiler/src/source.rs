/// A named piece of JSL program text, used to turn [`crate::span::Span`]s back into
/// human readable positions.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    code: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self { name: name.into(), code: code.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// 1-based line and column of a byte offset. Offsets past the end clamp to the end.
    pub fn line_col_at_offset(&self, offset: usize) -> (usize, usize) {
        let mut line = 1;
        let mut col = 1;
        for (index, ch) in self.code.char_indices() {
            if index >= offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    pub fn name_line_col_at_offset(&self, offset: usize) -> String {
        let (line, col) = self.line_col_at_offset(offset);
        format!("{}:{}:{}", self.name, line, col)
    }

    /// The full line containing `offset`, without its newline.
    pub fn line_at_offset(&self, offset: usize) -> &str {
        let offset = offset.min(self.code.len());
        let start = self.code[..offset].rfind('\n').map_or(0, |index| index + 1);
        let end = self.code[offset..].find('\n').map_or(self.code.len(), |index| offset + index);
        &self.code[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_at_offset() {
        let source = SourceFile::new("Blend.jsl", "void main() {\n    color = 1.0;\n}\n");
        assert_eq!(source.line_col_at_offset(0), (1, 1));
        assert_eq!(source.line_col_at_offset(18), (2, 5));
        assert_eq!(source.name_line_col_at_offset(18), "Blend.jsl:2:5");
        assert_eq!(source.line_at_offset(18), "    color = 1.0;");
    }
}
