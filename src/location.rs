use arcstr::ArcStr;
use miette::LabeledSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Point {
    // 0-based
    pub offset: u32,
    // 0-based
    pub row: u32,
    // 0-based
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Span {
    #[default]
    None,
    At {
        start: Point,
        end: Point,
        file: FileName,
    },
}

pub trait Spanning {
    fn span(&self) -> Span;
}

impl Point {
    /// Locates a byte offset in `source`. Offsets past the end are clamped,
    /// offsets inside a character move back to its first byte.
    pub fn locate(source: &str, offset: usize) -> Self {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &source[..offset];
        let row = before.matches('\n').count();
        let column = match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count(),
            None => before.chars().count(),
        };
        Point {
            offset: offset as u32,
            row: row as u32,
            column: column as u32,
        }
    }
}

impl Span {
    pub fn from_offsets(source: &str, start: usize, end: usize, file: FileName) -> Self {
        Self::At {
            start: Point::locate(source, start),
            end: Point::locate(source, end.max(start)),
            file,
        }
    }

    pub fn points(&self) -> Option<(Point, Point)> {
        match self {
            Self::None => None,
            Self::At { start, end, .. } => Some((*start, *end)),
        }
    }

    pub fn start(&self) -> Option<Point> {
        self.points().map(|(s, _)| s)
    }

    pub fn labels(&self, label: impl Into<Option<String>>) -> Vec<LabeledSpan> {
        match self {
            Self::None => vec![],
            Self::At { start, end, .. } => {
                // zero-width labels still need one column to be drawn
                let len = (end.offset - start.offset).max(1) as usize;
                vec![LabeledSpan::new(label.into(), start.offset as usize, len)]
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileName(pub ArcStr);

impl FileName {
    pub const INLINE: Self = FileName(arcstr::literal!("bigraph:inline"));
}

impl From<&str> for FileName {
    fn from(path: &str) -> Self {
        FileName(path.into())
    }
}

impl From<String> for FileName {
    fn from(path: String) -> Self {
        FileName(path.into())
    }
}
