//! Scene-mutation commands and the batches that carry them to a renderer.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Attribute or style map as sent on the wire. Keeps insertion order.
pub type AttrMap = serde_json::Map<String, serde_json::Value>;

/// SVG tag of an element
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Line,
    Circle,
    Rect,
    Polygon,
}

impl ElementKind {
    pub fn tag(self) -> &'static str {
        match self {
            ElementKind::Text => "text",
            ElementKind::Line => "line",
            ElementKind::Circle => "circle",
            ElementKind::Rect => "rect",
            ElementKind::Polygon => "polygon",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One scene mutation, tagged by `"command"` on the wire
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum PendingCommand {
    AddElement {
        name: String,
        #[serde(rename = "tag")]
        kind: ElementKind,
        #[serde(rename = "atts")]
        attrs: AttrMap,
        style: AttrMap,
        text: Option<String>,
    },
    ChangeElement {
        name: String,
        #[serde(rename = "atts")]
        attrs: AttrMap,
        style: AttrMap,
        text: Option<String>,
    },
    Empty,
    #[serde(rename = "delete")]
    DeleteNames { names: Vec<String> },
    Fit {
        #[serde(rename = "changeView")]
        change_view: bool,
    },
}

impl PendingCommand {
    /// Wire name of the command
    pub fn label(&self) -> &'static str {
        match self {
            PendingCommand::AddElement { .. } => "add_element",
            PendingCommand::ChangeElement { .. } => "change_element",
            PendingCommand::Empty => "empty",
            PendingCommand::DeleteNames { .. } => "delete",
            PendingCommand::Fit { .. } => "fit",
        }
    }
}

/// Commands accumulated since the last flush, in call order.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<PendingCommand>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: PendingCommand) {
        self.commands.push(command);
    }

    pub fn extend(&mut self, commands: impl IntoIterator<Item = PendingCommand>) {
        self.commands.extend(commands);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PendingCommand> {
        self.commands.iter()
    }

    /// Drain everything, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<PendingCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Put back commands a sink refused, ahead of anything buffered since.
    pub(crate) fn restore(&mut self, mut commands: Vec<PendingCommand>) {
        commands.append(&mut self.commands);
        self.commands = commands;
    }
}

/// One flushed unit. Serialized as `[sequence, [command, ...]]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    pub sequence: u64,
    pub commands: Vec<PendingCommand>,
}

impl Serialize for Batch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.sequence, &self.commands).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Batch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (sequence, commands) = <(u64, Vec<PendingCommand>)>::deserialize(deserializer)?;
        Ok(Batch { sequence, commands })
    }
}
