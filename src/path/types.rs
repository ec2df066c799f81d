//! Path types

use std::fmt;

/// One level of a structural address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// The `index`-th element child, expected to be a `tag`
    Element { tag: String, index: usize },
    /// The `index`-th text node child
    Text { index: usize },
}

/// Steps from `body` down to a node; empty means `body`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodePath {
    pub steps: Vec<PathStep>,
}

impl PathStep {
    pub fn element(tag: impl Into<String>, index: usize) -> Self {
        Self::Element {
            tag: tag.into(),
            index,
        }
    }

    pub fn text(index: usize) -> Self {
        Self::Text { index }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Element { index, .. } | Self::Text { index } => *index,
        }
    }
}

impl NodePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_steps(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    pub fn push(&mut self, step: PathStep) {
        self.steps.push(step);
    }

    /// Whether this addresses `body` itself
    pub fn is_body(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element { tag, index } => write!(f, "{}[{}]", tag, index),
            Self::Text { index } => write!(f, "text[{}]", index),
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for NodePath {
    type Err = super::PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        super::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let path = NodePath::with_steps(vec![
            PathStep::element("div", 1),
            PathStep::element("p", 0),
            PathStep::text(2),
        ]);
        assert_eq!(path.to_string(), "div[1]/p[0]/text[2]");
        assert_eq!(NodePath::new().to_string(), "");
    }
}
