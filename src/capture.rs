use crate::desktop::Desktop;
use crate::error::CaptureError;
use crate::model::{LayoutRecord, WindowEntry, WindowHandle};
use chrono::Utc;

/// Builds [`LayoutRecord`]s from the live desktop.
pub struct WindowSurveyor<'a, D: Desktop + ?Sized> {
    desktop: &'a D,
}

impl<'a, D: Desktop + ?Sized> WindowSurveyor<'a, D> {
    pub fn new(desktop: &'a D) -> Self {
        Self { desktop }
    }

    /// Captures every alt-tab window in back-to-front order. A window whose
    /// placement cannot be read aborts the capture.
    pub fn capture(&self, user_initiated: bool) -> Result<LayoutRecord, CaptureError> {
        let mut windows = Vec::new();
        let mut z_order = 0u32;

        for handle in self.desktop.top_level_windows() {
            if !is_alt_tab_window(self.desktop, handle) {
                continue;
            }
            let placement = self
                .desktop
                .placement(handle)
                .map_err(|source| CaptureError::PlacementUnavailable { handle, source })?;
            let entry = WindowEntry {
                handle,
                process_path: self.desktop.process_path(handle).unwrap_or_default(),
                title: self.desktop.title(handle).unwrap_or_default(),
                z_order,
                placement,
            };
            tracing::debug!(
                handle = %handle,
                z_order,
                state = %placement.state(),
                title = %entry.title,
                "captured window"
            );
            windows.push(entry);
            z_order += 1;
        }

        let display_areas = self
            .desktop
            .display_bounds()
            .iter()
            .map(|rect| rect.area())
            .collect();

        let record = LayoutRecord::new(Utc::now(), user_initiated, display_areas, windows);
        tracing::info!(
            id = %record.id(),
            windows = record.windows().len(),
            displays = record.display_count(),
            user_initiated,
            "captured layout"
        );
        Ok(record)
    }
}

/// Whether `handle` would show up in the application switcher.
pub fn is_alt_tab_window<D: Desktop + ?Sized>(desktop: &D, handle: WindowHandle) -> bool {
    if !desktop.is_visible(handle) {
        return false;
    }

    let style = desktop.extended_style(handle);
    if style.is_app_window() {
        return true;
    }
    if style.is_tool_window() {
        return false;
    }

    let mut next = desktop.root_owner(handle);
    let mut walk = WindowHandle::NULL;
    while next != walk {
        walk = next;
        next = desktop.last_active_popup(walk);
        if desktop.is_visible(next) {
            break;
        }
    }
    walk == handle
}
