use crate::desktop::ExtendedStyle;
use crate::model::{Point, Rect};

/// Which region of a monitor a restored window has to fit into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorArea {
    /// Full monitor rectangle, including space reserved by the taskbar.
    Bounds,
    /// Usable work area.
    WorkArea,
}

impl MonitorArea {
    /// Tool windows are laid out against the full monitor, everything else
    /// against the work area.
    pub fn for_style(style: ExtendedStyle) -> Self {
        if style.is_tool_window() {
            MonitorArea::Bounds
        } else {
            MonitorArea::WorkArea
        }
    }
}

/// Moves `rect` inside `monitor`, keeping its size where it fits and
/// shrinking it to the monitor size where it does not.
pub fn fit_rect(rect: Rect, monitor: Rect) -> Rect {
    let width = rect.width();
    let height = rect.height();
    let left = monitor.left.max(monitor.right.saturating_sub(width).min(rect.left));
    let top = monitor.top.max(monitor.bottom.saturating_sub(height).min(rect.top));
    Rect {
        left,
        top,
        right: left.saturating_add(monitor.width().min(width)),
        bottom: top.saturating_add(monitor.height().min(height)),
    }
}

/// Minimized and maximized anchors resolve to the monitor's top-left corner.
pub fn fit_point(_point: Point, monitor: Rect) -> Point {
    monitor.origin()
}
