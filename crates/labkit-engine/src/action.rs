//! Action classifier
//!
//! Turns raw bench interactions into typed [`Action`]s. Classification is
//! pure and total over supported events. Unsupported events are a caller
//! contract violation: callers check [`RawEvent::is_supported`] first.

use labkit_model::{ResourceId, ToolId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw interaction coming from the lab bench UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RawEvent {
    /// A tool on the bench was clicked
    ToolClicked {
        /// Clicked tool
        tool_id: ToolId,
    },
    /// A shelf item was dropped into the vessel
    ItemDropped {
        /// Dropped item
        resource_id: ResourceId,
    },
    /// The burner switch was flipped
    BurnerToggled {
        /// New burner state
        lit: bool,
    },
    /// The "I observed it" button was pressed
    ObservedClicked,
    /// Freehand drawing on the notes canvas
    CanvasStroke,
    /// Pointer hovering over a bench element
    Hover {
        /// Hovered element
        target: String,
    },
}

impl RawEvent {
    /// Whether the classifier handles this event
    ///
    /// Turning a burner off is not a procedure action.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        match self {
            Self::ToolClicked { .. } | Self::ItemDropped { .. } | Self::ObservedClicked => true,
            Self::BurnerToggled { lit } => *lit,
            Self::CanvasStroke | Self::Hover { .. } => false,
        }
    }
}

/// A normalized user action
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Picked up a tool
    SelectTool {
        /// Selected tool
        tool_id: ToolId,
    },
    /// Added a resource to the vessel
    AddResource {
        /// Added resource
        resource_id: ResourceId,
    },
    /// Acknowledged an observation
    Observe,
    /// Turned on the heat
    ApplyHeat,
}

impl Action {
    /// Select `tool`
    #[must_use]
    pub fn select_tool(tool: impl Into<ToolId>) -> Self {
        Self::SelectTool {
            tool_id: tool.into(),
        }
    }

    /// Add `resource`
    #[must_use]
    pub fn add_resource(resource: impl Into<ResourceId>) -> Self {
        Self::AddResource {
            resource_id: resource.into(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectTool { tool_id } => write!(f, "select_tool({tool_id})"),
            Self::AddResource { resource_id } => write!(f, "add_resource({resource_id})"),
            Self::Observe => f.write_str("observe"),
            Self::ApplyHeat => f.write_str("apply_heat"),
        }
    }
}

/// Classify a raw event
///
/// Returns `None` for unsupported events, which callers must filter out
/// beforehand. Panics instead under the `strict-debug` feature.
#[must_use]
pub fn classify(event: &RawEvent) -> Option<Action> {
    let action = match event {
        RawEvent::ToolClicked { tool_id } => Action::SelectTool {
            tool_id: tool_id.clone(),
        },
        RawEvent::ItemDropped { resource_id } => Action::AddResource {
            resource_id: resource_id.clone(),
        },
        RawEvent::BurnerToggled { lit: true } => Action::ApplyHeat,
        RawEvent::ObservedClicked => Action::Observe,
        RawEvent::BurnerToggled { lit: false }
        | RawEvent::CanvasStroke
        | RawEvent::Hover { .. } => {
            #[cfg(feature = "strict-debug")]
            panic!("classify called with unsupported event {event:?}");

            #[cfg(not(feature = "strict-debug"))]
            return None;
        }
    };
    tracing::trace!(%action, "Classified event");
    Some(action)
}
