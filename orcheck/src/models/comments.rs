use super::observation::ObsId;

/// Key of a comment block: the week-level sentinel or a specific obsid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommentKey {
    General,
    Obsid(ObsId),
}

impl std::fmt::Display for CommentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommentKey::General => write!(f, "GENERAL"),
            CommentKey::Obsid(id) => write!(f, "{}", id),
        }
    }
}

/// A comment block: week-level notice or an observation remark.
#[derive(Debug, Clone, PartialEq)]
pub enum CommentBlock {
    General { lines: Vec<String> },
    Remark { obsid: ObsId, lines: Vec<String> },
}

impl CommentBlock {
    pub fn key(&self) -> CommentKey {
        match self {
            CommentBlock::General { .. } => CommentKey::General,
            CommentBlock::Remark { obsid, .. } => CommentKey::Obsid(*obsid),
        }
    }

    pub fn lines(&self) -> &[String] {
        match self {
            CommentBlock::General { lines } => lines,
            CommentBlock::Remark { lines, .. } => lines,
        }
    }
}
