use super::{Desktop, ExtendedStyle};
use crate::error::DesktopError;
use crate::geometry::MonitorArea;
use crate::model::{Point, Rect, WindowHandle, WindowPlacement};

use std::ffi::{c_void, OsString};
use std::os::windows::ffi::OsStringExt;

use windows::core::PWSTR;
use windows::Win32::Foundation::{CloseHandle, BOOL, HWND, LPARAM, POINT, RECT};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, MonitorFromPoint, MonitorFromRect, HDC, HMONITOR,
    MONITORINFO, MONITOR_DEFAULTTONEAREST,
};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_FORMAT,
    PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::WindowsAndMessaging::{
    BeginDeferWindowPos, DeferWindowPos, EndDeferWindowPos, EnumWindows, GetAncestor,
    GetForegroundWindow, GetLastActivePopup, GetWindowLongPtrW, GetWindowPlacement,
    GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId, IsWindow, IsWindowVisible,
    SetForegroundWindow, SetWindowPlacement, GA_ROOTOWNER, GWL_EXSTYLE, HWND_TOP,
    SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, WINDOWPLACEMENT, WINDOWPLACEMENT_FLAGS,
};

/// [`Desktop`] backed by user32/gdi32.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Desktop;

impl Win32Desktop {
    pub fn new() -> Self {
        Self
    }
}

fn to_hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.0 as *mut c_void)
}

fn from_hwnd(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd.0 as isize)
}

fn from_rect(rect: RECT) -> Rect {
    Rect::new(rect.left, rect.top, rect.right, rect.bottom)
}

fn to_rect(rect: Rect) -> RECT {
    RECT {
        left: rect.left,
        top: rect.top,
        right: rect.right,
        bottom: rect.bottom,
    }
}

fn os_error(call: &'static str, handle: WindowHandle, err: windows::core::Error) -> DesktopError {
    DesktopError::Os {
        call,
        handle,
        message: err.to_string(),
    }
}

fn monitor_rect(monitor: HMONITOR, area: MonitorArea) -> Option<Rect> {
    if monitor.0.is_null() {
        return None;
    }
    let mut info = MONITORINFO {
        cbSize: std::mem::size_of::<MONITORINFO>() as u32,
        ..Default::default()
    };
    if !unsafe { GetMonitorInfoW(monitor, &mut info) }.as_bool() {
        return None;
    }
    Some(match area {
        MonitorArea::Bounds => from_rect(info.rcMonitor),
        MonitorArea::WorkArea => from_rect(info.rcWork),
    })
}

impl Desktop for Win32Desktop {
    fn top_level_windows(&self) -> Vec<WindowHandle> {
        unsafe extern "system" fn enum_cb(hwnd: HWND, lparam: LPARAM) -> BOOL {
            let windows = &mut *(lparam.0 as *mut Vec<WindowHandle>);
            windows.push(from_hwnd(hwnd));
            BOOL(1)
        }

        let mut windows: Vec<WindowHandle> = Vec::new();
        unsafe {
            let windows_ptr = &mut windows as *mut Vec<WindowHandle>;
            if let Err(err) = EnumWindows(Some(enum_cb), LPARAM(windows_ptr as isize)) {
                tracing::warn!("EnumWindows stopped early: {err}");
            }
        }
        // EnumWindows walks from the top of the z-order down.
        windows.reverse();
        windows
    }

    fn is_window(&self, handle: WindowHandle) -> bool {
        unsafe { IsWindow(to_hwnd(handle)) }.as_bool()
    }

    fn is_visible(&self, handle: WindowHandle) -> bool {
        unsafe { IsWindowVisible(to_hwnd(handle)) }.as_bool()
    }

    fn extended_style(&self, handle: WindowHandle) -> ExtendedStyle {
        let style = unsafe { GetWindowLongPtrW(to_hwnd(handle), GWL_EXSTYLE) };
        ExtendedStyle(style as u32)
    }

    fn root_owner(&self, handle: WindowHandle) -> WindowHandle {
        from_hwnd(unsafe { GetAncestor(to_hwnd(handle), GA_ROOTOWNER) })
    }

    fn last_active_popup(&self, handle: WindowHandle) -> WindowHandle {
        from_hwnd(unsafe { GetLastActivePopup(to_hwnd(handle)) })
    }

    fn placement(&self, handle: WindowHandle) -> Result<WindowPlacement, DesktopError> {
        let mut placement = WINDOWPLACEMENT {
            length: std::mem::size_of::<WINDOWPLACEMENT>() as u32,
            ..Default::default()
        };
        unsafe { GetWindowPlacement(to_hwnd(handle), &mut placement) }
            .map_err(|err| os_error("GetWindowPlacement", handle, err))?;
        Ok(WindowPlacement {
            length: placement.length,
            flags: placement.flags.0,
            show_state: placement.showCmd,
            min_point: Point::new(placement.ptMinPosition.x, placement.ptMinPosition.y),
            max_point: Point::new(placement.ptMaxPosition.x, placement.ptMaxPosition.y),
            normal_rect: from_rect(placement.rcNormalPosition),
        })
    }

    fn set_placement(
        &self,
        handle: WindowHandle,
        placement: &WindowPlacement,
    ) -> Result<(), DesktopError> {
        if !self.is_window(handle) {
            return Err(DesktopError::WindowGone(handle));
        }
        let raw = WINDOWPLACEMENT {
            length: std::mem::size_of::<WINDOWPLACEMENT>() as u32,
            flags: WINDOWPLACEMENT_FLAGS(placement.flags),
            showCmd: placement.show_state,
            ptMinPosition: POINT {
                x: placement.min_point.x,
                y: placement.min_point.y,
            },
            ptMaxPosition: POINT {
                x: placement.max_point.x,
                y: placement.max_point.y,
            },
            rcNormalPosition: to_rect(placement.normal_rect),
        };
        unsafe { SetWindowPlacement(to_hwnd(handle), &raw) }
            .map_err(|err| os_error("SetWindowPlacement", handle, err))
    }

    fn process_path(&self, handle: WindowHandle) -> Option<String> {
        unsafe {
            let mut pid = 0u32;
            let _ = GetWindowThreadProcessId(to_hwnd(handle), Some(&mut pid));
            if pid == 0 {
                return None;
            }
            let process = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid).ok()?;
            let mut buffer = vec![0u16; 1024];
            let mut size = buffer.len() as u32;
            let success = QueryFullProcessImageNameW(
                process,
                PROCESS_NAME_FORMAT(0),
                PWSTR(buffer.as_mut_ptr()),
                &mut size,
            )
            .is_ok();
            let _ = CloseHandle(process);
            if !success || size == 0 {
                return None;
            }
            Some(
                OsString::from_wide(&buffer[..size as usize])
                    .to_string_lossy()
                    .to_string(),
            )
        }
    }

    fn title(&self, handle: WindowHandle) -> Option<String> {
        unsafe {
            let hwnd = to_hwnd(handle);
            let len = GetWindowTextLengthW(hwnd);
            if len <= 0 {
                return None;
            }
            let mut buffer = vec![0u16; len as usize + 1];
            let read = GetWindowTextW(hwnd, &mut buffer);
            if read <= 0 {
                return None;
            }
            Some(String::from_utf16_lossy(&buffer[..read as usize]))
        }
    }

    fn display_bounds(&self) -> Vec<Rect> {
        unsafe extern "system" fn enum_monitor_cb(
            monitor: HMONITOR,
            _hdc: HDC,
            _rect: *mut RECT,
            lparam: LPARAM,
        ) -> BOOL {
            let monitors = &mut *(lparam.0 as *mut Vec<Rect>);
            if let Some(rect) = monitor_rect(monitor, MonitorArea::Bounds) {
                monitors.push(rect);
            }
            BOOL(1)
        }

        let mut monitors: Vec<Rect> = Vec::new();
        unsafe {
            let monitors_ptr = &mut monitors as *mut Vec<Rect>;
            let _ = EnumDisplayMonitors(
                HDC::default(),
                None,
                Some(enum_monitor_cb),
                LPARAM(monitors_ptr as isize),
            );
        }
        monitors
    }

    fn monitor_area_at_point(&self, point: Point, area: MonitorArea) -> Rect {
        let monitor = unsafe {
            MonitorFromPoint(
                POINT {
                    x: point.x,
                    y: point.y,
                },
                MONITOR_DEFAULTTONEAREST,
            )
        };
        monitor_rect(monitor, area).unwrap_or_else(|| Rect::new(point.x, point.y, point.x, point.y))
    }

    fn monitor_area_for_rect(&self, rect: Rect, area: MonitorArea) -> Rect {
        let raw = to_rect(rect);
        let monitor = unsafe { MonitorFromRect(&raw, MONITOR_DEFAULTTONEAREST) };
        monitor_rect(monitor, area).unwrap_or(rect)
    }

    fn restack(&self, back_to_front: &[WindowHandle]) -> Result<(), DesktopError> {
        if back_to_front.is_empty() {
            return Ok(());
        }
        unsafe {
            let mut batch = BeginDeferWindowPos(back_to_front.len() as i32)
                .map_err(|err| os_error("BeginDeferWindowPos", WindowHandle::NULL, err))?;
            // DeferWindowPos places a window below its insert-after target,
            // so walk front to back starting from HWND_TOP.
            let mut insert_after = HWND_TOP;
            for handle in back_to_front.iter().rev() {
                let hwnd = to_hwnd(*handle);
                batch = DeferWindowPos(
                    batch,
                    hwnd,
                    insert_after,
                    0,
                    0,
                    0,
                    0,
                    SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
                )
                .map_err(|err| os_error("DeferWindowPos", *handle, err))?;
                insert_after = hwnd;
            }
            EndDeferWindowPos(batch)
                .map_err(|err| os_error("EndDeferWindowPos", WindowHandle::NULL, err))
        }
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.0.is_null() {
            None
        } else {
            Some(from_hwnd(hwnd))
        }
    }

    fn set_foreground_window(&self, handle: WindowHandle) -> bool {
        unsafe { SetForegroundWindow(to_hwnd(handle)) }.as_bool()
    }
}
