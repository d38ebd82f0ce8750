//! Capability surface of the windowing subsystem.
//!
//! The capture and restore logic only talks to the desktop through
//! [`Desktop`]. On Windows [`Win32Desktop`] provides it; tests script their
//! own implementation.

use crate::error::DesktopError;
use crate::geometry::MonitorArea;
use crate::model::{Point, Rect, WindowHandle, WindowPlacement};

#[cfg(windows)]
mod win32;
#[cfg(windows)]
pub use win32::Win32Desktop;

/// Extended window style bits (`GWL_EXSTYLE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtendedStyle(pub u32);

impl ExtendedStyle {
    pub const TOOL_WINDOW: u32 = 0x0000_0080;
    pub const APP_WINDOW: u32 = 0x0004_0000;

    pub fn is_app_window(self) -> bool {
        self.0 & Self::APP_WINDOW != 0
    }

    pub fn is_tool_window(self) -> bool {
        self.0 & Self::TOOL_WINDOW != 0
    }
}

pub trait Desktop {
    /// All top-level windows, back to front.
    fn top_level_windows(&self) -> Vec<WindowHandle>;

    fn is_window(&self, handle: WindowHandle) -> bool;

    fn is_visible(&self, handle: WindowHandle) -> bool;

    fn extended_style(&self, handle: WindowHandle) -> ExtendedStyle;

    fn root_owner(&self, handle: WindowHandle) -> WindowHandle;

    fn last_active_popup(&self, handle: WindowHandle) -> WindowHandle;

    fn placement(&self, handle: WindowHandle) -> Result<WindowPlacement, DesktopError>;

    fn set_placement(
        &self,
        handle: WindowHandle,
        placement: &WindowPlacement,
    ) -> Result<(), DesktopError>;

    fn process_path(&self, handle: WindowHandle) -> Option<String>;

    fn title(&self, handle: WindowHandle) -> Option<String>;

    /// Bounds of every active display.
    fn display_bounds(&self) -> Vec<Rect>;

    /// Area of the monitor nearest to `point`.
    fn monitor_area_at_point(&self, point: Point, area: MonitorArea) -> Rect;

    /// Area of the monitor nearest to `rect`.
    fn monitor_area_for_rect(&self, rect: Rect, area: MonitorArea) -> Rect;

    /// Reorders `back_to_front` in one batched pass so that every window
    /// sits directly above the one before it. Only z-order changes: no
    /// move, resize or activation.
    fn restack(&self, back_to_front: &[WindowHandle]) -> Result<(), DesktopError>;

    fn foreground_window(&self) -> Option<WindowHandle>;

    fn set_foreground_window(&self, handle: WindowHandle) -> bool;
}
