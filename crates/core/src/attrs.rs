use serde::{Deserialize, Serialize};

const ENTITY_HREF_PREFIX: &str = "entity:";

pub type HeadingLevel = u8;

pub const MAX_HEADING_LEVEL: HeadingLevel = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Quote,
    CodeBlock,
    Callout,
    Divider,
    ListItem,
    Checkbox,
}

/// Where a link run points. Decoded once from an href at the boundary so the
/// rest of the core never has to probe strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum LinkTarget {
    Entity {
        entity_type: String,
        entity_id: String,
    },
    Url {
        url: String,
    },
}

impl LinkTarget {
    pub fn entity(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        LinkTarget::Entity {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        LinkTarget::Url { url: url.into() }
    }

    pub fn from_href(href: &str) -> Self {
        if let Some(rest) = href.strip_prefix(ENTITY_HREF_PREFIX) {
            if let Some((entity_type, entity_id)) = rest.split_once('/') {
                if !entity_type.is_empty() && !entity_id.is_empty() {
                    return LinkTarget::entity(entity_type, entity_id);
                }
            }
        }
        LinkTarget::url(href)
    }

    pub fn to_href(&self) -> String {
        match self {
            LinkTarget::Entity {
                entity_type,
                entity_id,
            } => format!("{ENTITY_HREF_PREFIX}{entity_type}/{entity_id}"),
            LinkTarget::Url { url } => url.clone(),
        }
    }

    pub fn entity_ref(&self) -> Option<(&str, &str)> {
        match self {
            LinkTarget::Entity {
                entity_type,
                entity_id,
            } => Some((entity_type.as_str(), entity_id.as_str())),
            LinkTarget::Url { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Attributes {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub code: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<HeadingLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkTarget>,
}

impl Attributes {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn is_plain(&self) -> bool {
        self == &Self::default()
    }

    pub fn with_link(mut self, link: LinkTarget) -> Self {
        self.link = Some(link);
        self
    }

    pub fn with_heading(mut self, level: HeadingLevel) -> Self {
        self.heading = Some(level);
        self
    }

    pub fn with_block(mut self, block: BlockKind) -> Self {
        self.block = Some(block);
        self
    }

    /// Attributes a character typed right after this one inherits.
    pub fn continuation(&self) -> Self {
        let mut next = self.clone();
        next.link = None;
        next
    }

    /// Overlays `self` (explicit styling) on a derived layer. Flags are OR-ed,
    /// explicit values win over painted ones.
    pub fn merged_over(&self, painted: &Attributes) -> Attributes {
        Attributes {
            bold: self.bold || painted.bold,
            italic: self.italic || painted.italic,
            strikethrough: self.strikethrough || painted.strikethrough,
            code: self.code || painted.code,
            heading: self.heading.or(painted.heading),
            block: self.block.or(painted.block),
            text_color: self.text_color.clone().or_else(|| painted.text_color.clone()),
            link: self.link.clone().or_else(|| painted.link.clone()),
        }
    }
}

/// A partial update applied to every run in a range. `None` leaves the field
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttrPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<Option<HeadingLevel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Option<BlockKind>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Option<LinkTarget>>,
}

impl AttrPatch {
    pub fn bold(value: bool) -> Self {
        Self {
            bold: Some(value),
            ..Default::default()
        }
    }

    pub fn italic(value: bool) -> Self {
        Self {
            italic: Some(value),
            ..Default::default()
        }
    }

    pub fn strikethrough(value: bool) -> Self {
        Self {
            strikethrough: Some(value),
            ..Default::default()
        }
    }

    pub fn heading(level: Option<HeadingLevel>) -> Self {
        Self {
            heading: Some(level),
            ..Default::default()
        }
    }

    pub fn block(block: Option<BlockKind>) -> Self {
        Self {
            block: Some(block),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply_to(&self, attrs: &mut Attributes) {
        if let Some(bold) = self.bold {
            attrs.bold = bold;
        }
        if let Some(italic) = self.italic {
            attrs.italic = italic;
        }
        if let Some(strikethrough) = self.strikethrough {
            attrs.strikethrough = strikethrough;
        }
        if let Some(code) = self.code {
            attrs.code = code;
        }
        if let Some(heading) = self.heading {
            attrs.heading = heading;
        }
        if let Some(block) = self.block {
            attrs.block = block;
        }
        if let Some(link) = &self.link {
            attrs.link = link.clone();
        }
    }
}
