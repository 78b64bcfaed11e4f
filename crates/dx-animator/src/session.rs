//! Per-client operator context: the selected resource and incident mode.

use dx_core::{GeoPoint, ResourceId};

/// What a click on the map asks the client to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickAction {
    /// Place a new incident titled `title` at `position`.
    OpenIncident { title: String, position: GeoPoint },
    /// Send `resource` to `destination`.
    Dispatch { resource: ResourceId, destination: GeoPoint },
    /// Nothing to do.
    Ignored,
}

/// Selection and mode of one operator.  Never shared between clients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSession {
    selected:      Option<ResourceId>,
    incident_mode: bool,
}

impl ClientSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, resource: Option<ResourceId>) {
        self.selected = resource;
    }

    pub fn selected(&self) -> Option<&ResourceId> {
        self.selected.as_ref()
    }

    pub fn set_incident_mode(&mut self, on: bool) {
        self.incident_mode = on;
    }

    pub fn incident_mode(&self) -> bool {
        self.incident_mode
    }

    /// Interpret a map click at `point`.
    ///
    /// In incident mode a non-blank `title` opens an incident and leaves
    /// incident mode; a blank one does nothing and stays in the mode.
    /// Otherwise a selected resource is dispatched and the selection cleared.
    pub fn map_click(&mut self, point: GeoPoint, title: Option<&str>) -> ClickAction {
        if self.incident_mode {
            let title = title.map(str::trim).unwrap_or_default();
            if title.is_empty() {
                return ClickAction::Ignored;
            }
            self.incident_mode = false;
            return ClickAction::OpenIncident { title: title.to_string(), position: point };
        }
        match self.selected.take() {
            Some(resource) => ClickAction::Dispatch { resource, destination: point },
            None => ClickAction::Ignored,
        }
    }

    /// A recall clears the selection.
    pub fn on_recall(&mut self) {
        self.selected = None;
    }

    /// A session reset clears the selection and incident mode.
    pub fn on_reset(&mut self) {
        *self = Self::default();
    }
}
