use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Opaque OS window identifier. Only meaningful while the window it named at
/// capture time is still alive.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(transparent)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub const NULL: WindowHandle = WindowHandle(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }
}

/// Coarse reading of the raw `showCmd` code stored in a placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShowState {
    Normal,
    Minimized,
    Maximized,
    Other(u32),
}

impl ShowState {
    pub const SW_SHOWNORMAL: u32 = 1;
    pub const SW_SHOWMINIMIZED: u32 = 2;
    pub const SW_SHOWMAXIMIZED: u32 = 3;
    pub const SW_MINIMIZE: u32 = 6;
    pub const SW_RESTORE: u32 = 9;

    pub fn from_code(code: u32) -> Self {
        match code {
            Self::SW_SHOWNORMAL | Self::SW_RESTORE => ShowState::Normal,
            Self::SW_SHOWMINIMIZED | Self::SW_MINIMIZE => ShowState::Minimized,
            Self::SW_SHOWMAXIMIZED => ShowState::Maximized,
            other => ShowState::Other(other),
        }
    }
}

impl std::fmt::Display for ShowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShowState::Normal => write!(f, "normal"),
            ShowState::Minimized => write!(f, "minimized"),
            ShowState::Maximized => write!(f, "maximized"),
            ShowState::Other(code) => write!(f, "show-cmd {code}"),
        }
    }
}

/// Position, size and show state of one window, mirroring `WINDOWPLACEMENT`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WindowPlacement {
    pub length: u32,
    pub flags: u32,
    pub show_state: u32,
    pub min_point: Point,
    pub max_point: Point,
    pub normal_rect: Rect,
}

impl WindowPlacement {
    pub fn state(&self) -> ShowState {
        ShowState::from_code(self.show_state)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WindowEntry {
    pub handle: WindowHandle,
    #[serde(default)]
    pub process_path: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub z_order: u32,
    pub placement: WindowPlacement,
}

/// One capture of the desktop. Built once and never mutated; equality and
/// hashing go through `id` only.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRecord {
    id: Uuid,
    captured_at: DateTime<Utc>,
    user_initiated: bool,
    #[serde(default)]
    display_areas: Vec<i64>,
    #[serde(default)]
    windows: Vec<WindowEntry>,
}

impl LayoutRecord {
    /// Creates a record with a fresh id. `windows` must already be in
    /// back-to-front order.
    pub fn new(
        captured_at: DateTime<Utc>,
        user_initiated: bool,
        display_areas: Vec<i64>,
        windows: Vec<WindowEntry>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            captured_at,
            user_initiated,
            display_areas,
            windows,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn user_initiated(&self) -> bool {
        self.user_initiated
    }

    pub fn display_areas(&self) -> &[i64] {
        &self.display_areas
    }

    pub fn display_count(&self) -> usize {
        self.display_areas.len()
    }

    pub fn windows(&self) -> &[WindowEntry] {
        &self.windows
    }

    pub fn window(&self, handle: WindowHandle) -> Option<&WindowEntry> {
        self.windows.iter().find(|entry| entry.handle == handle)
    }

    pub fn age(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.captured_at)
    }
}

impl PartialEq for LayoutRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for LayoutRecord {}

impl Hash for LayoutRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(handle: isize, z_order: u32) -> WindowEntry {
        WindowEntry {
            handle: WindowHandle(handle),
            process_path: r"C:\Windows\notepad.exe".into(),
            title: "Untitled - Notepad".into(),
            z_order,
            placement: WindowPlacement {
                length: 44,
                flags: 0,
                show_state: ShowState::SW_SHOWMAXIMIZED,
                min_point: Point::new(-1, -1),
                max_point: Point::new(-8, -8),
                normal_rect: Rect::new(10, 20, 810, 620),
            },
        }
    }

    #[test]
    fn identical_content_with_different_ids_is_distinct() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let a = LayoutRecord::new(at, true, vec![1327104], vec![entry(4464, 0)]);
        let b = LayoutRecord::new(at, true, vec![1327104], vec![entry(4464, 0)]);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let record = LayoutRecord::new(at, false, vec![1327104, 804864], vec![entry(113, 0)]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["userInitiated"], false);
        assert_eq!(json["displayAreas"][1], 804864);
        let window = &json["windows"][0];
        assert_eq!(window["handle"], 113);
        assert_eq!(window["processPath"], r"C:\Windows\notepad.exe");
        assert_eq!(window["placement"]["showState"], 3);
        assert_eq!(window["placement"]["normalRect"]["right"], 810);
        assert_eq!(window["placement"]["maxPoint"]["x"], -8);
    }

    #[test]
    fn decoded_record_keeps_shape() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let record = LayoutRecord::new(at, true, vec![100], vec![entry(1, 0), entry(2, 1)]);
        let json = serde_json::to_string(&record).unwrap();
        let decoded: LayoutRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.id(), record.id());
        assert_eq!(decoded.captured_at(), at);
        assert_eq!(decoded.windows(), record.windows());
        assert_eq!(decoded.display_areas().to_vec(), vec![100]);
    }

    #[test]
    fn show_state_classification() {
        assert_eq!(ShowState::from_code(1), ShowState::Normal);
        assert_eq!(ShowState::from_code(2), ShowState::Minimized);
        assert_eq!(ShowState::from_code(3), ShowState::Maximized);
        assert_eq!(ShowState::from_code(0), ShowState::Other(0));
    }
}
