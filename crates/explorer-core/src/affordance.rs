//! Navigation affordances surfaced on the host page.

use std::io::Write;

use serde::Serialize;

use crate::models::EntryId;

/// A navigation target to a selected entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Affordance {
    pub entry_id: EntryId,
    pub label: String,
    pub href: String,
}

impl Affordance {
    /// `href` is `<origin>/app/<id>`.
    pub fn new(origin: &str, entry_id: EntryId, label: impl Into<String>) -> Self {
        Self {
            entry_id,
            label: label.into(),
            href: format!("{}/app/{}", origin.trim_end_matches('/'), entry_id),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("Navigation container not found on page")]
    ContainerMissing,

    #[error("Failed to write affordance: {0}")]
    Io(#[from] std::io::Error),
}

/// The page container affordances are attached to.
pub trait AffordanceSurface {
    fn attach(&mut self, affordance: &Affordance) -> Result<(), SurfaceError>;
}

/// Writes `label: href` lines, one per attached affordance.
pub struct ConsoleSurface<W: Write> {
    out: W,
}

impl<W: Write> ConsoleSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> AffordanceSurface for ConsoleSurface<W> {
    fn attach(&mut self, affordance: &Affordance) -> Result<(), SurfaceError> {
        writeln!(self.out, "{}: {}", affordance.label, affordance.href)?;
        Ok(())
    }
}

/// Attach an affordance for `selected`, or nothing when there is no selection.
///
/// Failures are logged and not retried; the affordance is simply absent.
pub fn inject(
    surface: &mut dyn AffordanceSurface,
    origin: &str,
    selected: Option<EntryId>,
    label: &str,
) -> Option<Affordance> {
    let entry_id = selected?;
    let affordance = Affordance::new(origin, entry_id, label);

    match surface.attach(&affordance) {
        Ok(()) => Some(affordance),
        Err(e) => {
            tracing::warn!("Failed to attach {} affordance: {}", label, e);
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records attachments, or fails every one when `missing_container` is set.
    #[derive(Default)]
    pub(crate) struct RecordingSurface {
        pub(crate) attached: Vec<Affordance>,
        pub(crate) missing_container: bool,
    }

    impl AffordanceSurface for RecordingSurface {
        fn attach(&mut self, affordance: &Affordance) -> Result<(), SurfaceError> {
            if self.missing_container {
                return Err(SurfaceError::ContainerMissing);
            }
            self.attached.push(affordance.clone());
            Ok(())
        }
    }
}
