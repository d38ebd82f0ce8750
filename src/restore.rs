use crate::desktop::Desktop;
use crate::error::DesktopError;
use crate::geometry::{fit_point, fit_rect, MonitorArea};
use crate::model::{LayoutRecord, WindowEntry, WindowHandle, WindowPlacement};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementResult {
    Applied(WindowPlacement),
    Failed(String),
}

impl std::fmt::Display for PlacementResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementResult::Applied(_) => write!(f, "applied"),
            PlacementResult::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RestoreSummaryEntry {
    pub handle: WindowHandle,
    pub title: String,
    pub result: PlacementResult,
}

#[derive(Debug, Clone, Default)]
pub struct RestoreSummary {
    pub entries: Vec<RestoreSummaryEntry>,
    pub applied_windows: usize,
    pub failed_windows: usize,
    pub restacked_windows: usize,
    pub restack_error: Option<String>,
}

impl RestoreSummary {
    pub fn is_complete(&self) -> bool {
        self.failed_windows == 0 && self.restack_error.is_none()
    }
}

/// Reapplies a [`LayoutRecord`] to the live desktop.
pub struct LayoutRestorer<'a, D: Desktop + ?Sized> {
    desktop: &'a D,
}

impl<'a, D: Desktop + ?Sized> LayoutRestorer<'a, D> {
    pub fn new(desktop: &'a D) -> Self {
        Self { desktop }
    }

    /// Restores placements first and stacking second. Windows that fail are
    /// reported in the summary and do not stop the rest.
    pub fn restore(&self, record: &LayoutRecord) -> RestoreSummary {
        let mut summary = RestoreSummary::default();

        for entry in record.windows() {
            let result = match self.restore_placement(entry) {
                Ok(applied) => {
                    summary.applied_windows += 1;
                    PlacementResult::Applied(applied)
                }
                Err(err) => {
                    tracing::warn!(handle = %entry.handle, title = %entry.title, "skipping window: {err}");
                    summary.failed_windows += 1;
                    PlacementResult::Failed(err.to_string())
                }
            };
            summary.entries.push(RestoreSummaryEntry {
                handle: entry.handle,
                title: entry.title.clone(),
                result,
            });
        }

        let order = self.stacking_order(record);
        match self.desktop.restack(&order) {
            Ok(()) => summary.restacked_windows = order.len(),
            Err(err) => {
                tracing::warn!("failed to restore z-order: {err}");
                summary.restack_error = Some(err.to_string());
            }
        }

        tracing::info!(
            id = %record.id(),
            applied = summary.applied_windows,
            failed = summary.failed_windows,
            restacked = summary.restacked_windows,
            "restored layout"
        );
        summary
    }

    /// Runs [`Self::restore`] without letting it steal the foreground: the
    /// window that was in front beforehand is put back, then `after_restore`
    /// runs (e.g. to keep a menu on screen).
    pub fn restore_preserving_foreground<F>(
        &self,
        record: &LayoutRecord,
        after_restore: F,
    ) -> RestoreSummary
    where
        F: FnOnce(),
    {
        let foreground = self.desktop.foreground_window();
        let summary = self.restore(record);
        if let Some(handle) = foreground {
            if !self.desktop.set_foreground_window(handle) {
                tracing::debug!(handle = %handle, "could not return foreground window");
            }
        }
        after_restore();
        summary
    }

    /// Placement the window would receive, clamped to the current monitors.
    pub fn corrected_placement(&self, entry: &WindowEntry) -> WindowPlacement {
        let area = MonitorArea::for_style(self.desktop.extended_style(entry.handle));
        let stored = entry.placement;
        WindowPlacement {
            min_point: fit_point(
                stored.min_point,
                self.desktop.monitor_area_at_point(stored.min_point, area),
            ),
            max_point: fit_point(
                stored.max_point,
                self.desktop.monitor_area_at_point(stored.max_point, area),
            ),
            normal_rect: fit_rect(
                stored.normal_rect,
                self.desktop.monitor_area_for_rect(stored.normal_rect, area),
            ),
            ..stored
        }
    }

    /// Visible windows of `record`, back to front.
    pub fn stacking_order(&self, record: &LayoutRecord) -> Vec<WindowHandle> {
        record
            .windows()
            .iter()
            .map(|entry| entry.handle)
            .filter(|handle| self.desktop.is_visible(*handle))
            .collect()
    }

    fn restore_placement(&self, entry: &WindowEntry) -> Result<WindowPlacement, DesktopError> {
        if !self.desktop.is_window(entry.handle) {
            return Err(DesktopError::WindowGone(entry.handle));
        }
        let placement = self.corrected_placement(entry);
        self.desktop.set_placement(entry.handle, &placement)?;
        tracing::debug!(handle = %entry.handle, state = %placement.state(), "restored placement");
        Ok(placement)
    }
}
