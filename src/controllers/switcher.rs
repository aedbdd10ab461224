// src/controllers/switcher.rs - Pick one of several controllers from the dashboard
use super::{ControlError, Controller, Cycle};
use crate::dashboard::Dashboard;

pub const CONTROLLER_LABEL: &str = "(CONTROLLER) <<";

/// Runs exactly one child per cycle, chosen by the index typed into the
/// `(CONTROLLER) <<` dashboard field.
pub struct ControllerSwitcher {
    children: Vec<Box<dyn Controller>>,
    current: Option<usize>,
}

impl ControllerSwitcher {
    pub fn new(dashboard: &mut Dashboard, children: Vec<Box<dyn Controller>>) -> Self {
        dashboard.put_string(CONTROLLER_LABEL, "0");
        Self {
            children,
            current: None,
        }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Controller for ControllerSwitcher {
    fn name(&self) -> &str {
        "controller switcher"
    }

    fn run(&mut self, cycle: &mut Cycle<'_>) -> Result<(), ControlError> {
        let index = cycle.dashboard.integer(CONTROLLER_LABEL, 0);
        let count = self.children.len();
        let child = usize::try_from(index)
            .ok()
            .filter(|i| *i < count)
            .ok_or(ControlError::NoSuchController { index, count })?;
        if self.current != Some(child) {
            tracing::info!("Switching to controller {}: {}", child, self.children[child].name());
            self.current = Some(child);
        }
        self.children[child].run(cycle)
    }
}
