
use layout_snapshot::capture::is_alt_tab_window;
use layout_snapshot::desktop::ExtendedStyle;
use layout_snapshot::model::{Point, Rect, WindowHandle};
use layout_snapshot::restore::PlacementResult;
use layout_snapshot::{CaptureError, LayoutRestorer, WindowSurveyor};
use mock_desktop::{MockDesktop, MockWindow};
use std::cell::Cell;

fn handles(desktop: &MockDesktop) -> Vec<isize> {
    let record = WindowSurveyor::new(desktop).capture(true).expect("capture");
    record.windows().iter().map(|w| w.handle.0).collect()
}

#[test]
fn hidden_window_is_never_captured() {
    let desktop = MockDesktop::dual_monitor()
        .with_window(MockWindow::app(1, Rect::new(0, 0, 100, 100)).hidden())
        .with_window(
            MockWindow::app(2, Rect::new(0, 0, 100, 100))
                .hidden()
                .style(ExtendedStyle::APP_WINDOW),
        );
    assert!(handles(&desktop).is_empty());
}

#[test]
fn tool_window_is_never_captured() {
    let desktop = MockDesktop::dual_monitor().with_window(
        MockWindow::app(7, Rect::new(0, 0, 100, 100)).style(ExtendedStyle::TOOL_WINDOW),
    );
    assert!(handles(&desktop).is_empty());
}

#[test]
fn visible_app_window_is_always_captured() {
    let desktop = MockDesktop::dual_monitor()
        .with_window(
            MockWindow::app(3, Rect::new(0, 0, 100, 100))
                .style(ExtendedStyle::APP_WINDOW | ExtendedStyle::TOOL_WINDOW)
                .owned_by(99),
        )
        .with_window(MockWindow::app(4, Rect::new(0, 0, 100, 100)));
    assert_eq!(handles(&desktop), vec![3, 4]);
}

#[test]
fn owned_windows_defer_to_their_owner() {
    let desktop = MockDesktop::dual_monitor()
        .with_window(MockWindow::app(10, Rect::new(0, 0, 800, 600)))
        .with_window(MockWindow::app(11, Rect::new(100, 100, 300, 200)).owned_by(10));
    assert!(is_alt_tab_window(&desktop, WindowHandle(10)));
    assert!(!is_alt_tab_window(&desktop, WindowHandle(11)));
    assert_eq!(handles(&desktop), vec![10]);
}

#[test]
fn visible_popup_stands_in_for_its_owner() {
    let desktop = MockDesktop::dual_monitor()
        .with_window(MockWindow::app(20, Rect::new(0, 0, 800, 600)).with_popup(21))
        .with_window(MockWindow::app(21, Rect::new(200, 200, 400, 300)).owned_by(20));
    // The walk from the owner stops at the visible popup and settles on the owner.
    assert!(is_alt_tab_window(&desktop, WindowHandle(20)));
    assert!(!is_alt_tab_window(&desktop, WindowHandle(21)));
    assert_eq!(handles(&desktop), vec![20]);
}

#[test]
fn walk_through_hidden_popup_rejects_the_window() {
    let desktop = MockDesktop::dual_monitor()
        .with_window(MockWindow::app(30, Rect::new(0, 0, 800, 600)).with_popup(31))
        .with_window(MockWindow::app(31, Rect::new(100, 100, 300, 200)).hidden());
    // 30 -> 31 (hidden) -> 31: the walk settles on 31, not on 30.
    assert!(!is_alt_tab_window(&desktop, WindowHandle(30)));
    assert!(handles(&desktop).is_empty());
}

#[test]
fn capture_keeps_stacking_order_and_metadata() {
    let desktop = MockDesktop::dual_monitor()
        .with_window(MockWindow::app(30, Rect::new(0, 0, 500, 500)))
        .with_window(MockWindow::app(31, Rect::new(0, 0, 100, 100)).hidden())
        .with_window(MockWindow::app(32, Rect::new(2000, 10, 2600, 500)).anonymous())
        .with_window(MockWindow::app(33, Rect::new(10, 10, 900, 700)));

    let record = WindowSurveyor::new(&desktop).capture(false).expect("capture");

    assert!(!record.user_initiated());
    assert_eq!(record.display_areas().to_vec(), vec![1920 * 1080, 1280 * 1024]);
    let windows = record.windows();
    assert_eq!(
        windows.iter().map(|w| (w.handle.0, w.z_order)).collect::<Vec<_>>(),
        vec![(30, 0), (32, 1), (33, 2)]
    );
    assert_eq!(windows[0].title, "Window 30");
    assert_eq!(windows[0].process_path, r"C:\Apps\app30.exe");
    assert_eq!(windows[1].title, "");
    assert_eq!(windows[1].process_path, "");
    assert_eq!(windows[2].placement.normal_rect, Rect::new(10, 10, 900, 700));
}

#[test]
fn unreadable_placement_aborts_capture() {
    let desktop = MockDesktop::dual_monitor()
        .with_window(MockWindow::app(1, Rect::new(0, 0, 100, 100)))
        .with_window(MockWindow::app(2, Rect::new(0, 0, 100, 100)).unreadable());

    let err = WindowSurveyor::new(&desktop).capture(true).unwrap_err();
    match err {
        CaptureError::PlacementUnavailable { handle, .. } => assert_eq!(handle, WindowHandle(2)),
    }
}

#[test]
fn restore_clamps_into_nearest_work_area() {
    let desktop = MockDesktop::dual_monitor()
        .with_window(MockWindow::app(1, Rect::new(1700, 900, 2100, 1200)))
        .with_window(MockWindow::app(2, Rect::new(3000, 800, 3400, 1100)))
        .with_window(MockWindow::app(3, Rect::new(-300, -100, 2500, 1400)));
    let record = WindowSurveyor::new(&desktop).capture(true).expect("capture");

    let summary = LayoutRestorer::new(&desktop).restore(&record);
    assert!(summary.is_complete());
    assert_eq!(summary.applied_windows, 3);

    // Mostly on the primary: pushed inside its work area, size kept.
    assert_eq!(
        desktop.applied_to(1).unwrap().normal_rect,
        Rect::new(1520, 740, 1920, 1040)
    );
    // On the secondary: kept inside the secondary's work area.
    assert_eq!(
        desktop.applied_to(2).unwrap().normal_rect,
        Rect::new(2800, 684, 3200, 984)
    );
    // Larger than the monitor it mostly covers: exactly that work area.
    assert_eq!(
        desktop.applied_to(3).unwrap().normal_rect,
        Rect::new(0, 0, 1920, 1040)
    );
    assert_eq!(desktop.applied_to(3).unwrap().min_point, Point::new(0, 0));
}

#[test]
fn restore_uses_full_bounds_for_tool_windows() {
    let desktop = MockDesktop::dual_monitor()
        .with_window(MockWindow::app(1, Rect::new(100, 900, 500, 1100)));
    let record = WindowSurveyor::new(&desktop).capture(true).expect("capture");

    // The window turned into a tool window since the capture.
    desktop.windows.lock().unwrap()[0].style = ExtendedStyle::TOOL_WINDOW;
    LayoutRestorer::new(&desktop).restore(&record);

    assert_eq!(
        desktop.applied_to(1).unwrap().normal_rect,
        Rect::new(100, 880, 500, 1080)
    );
}

#[test]
fn restore_continues_past_vanished_windows() {
    let desktop = MockDesktop::dual_monitor()
        .with_window(MockWindow::app(1, Rect::new(0, 0, 100, 100)))
        .with_window(MockWindow::app(2, Rect::new(0, 0, 100, 100)))
        .with_window(MockWindow::app(3, Rect::new(0, 0, 100, 100)));
    let record = WindowSurveyor::new(&desktop).capture(true).expect("capture");

    desktop.close_window(2);
    let summary = LayoutRestorer::new(&desktop).restore(&record);

    assert_eq!(summary.applied_windows, 2);
    assert_eq!(summary.failed_windows, 1);
    assert!(!summary.is_complete());
    assert!(matches!(summary.entries[1].result, PlacementResult::Failed(_)));
    assert!(desktop.applied_to(1).is_some());
    assert!(desktop.applied_to(2).is_none());
    assert!(desktop.applied_to(3).is_some());
    assert_eq!(
        desktop.restacks.lock().unwrap().as_slice(),
        &[vec![WindowHandle(1), WindowHandle(3)]]
    );
}

#[test]
fn restack_skips_windows_hidden_since_capture() {
    let desktop = MockDesktop::dual_monitor()
        .with_window(MockWindow::app(5, Rect::new(0, 0, 100, 100)))
        .with_window(MockWindow::app(6, Rect::new(0, 0, 100, 100)))
        .with_window(MockWindow::app(7, Rect::new(0, 0, 100, 100)));
    let record = WindowSurveyor::new(&desktop).capture(true).expect("capture");

    desktop.set_visible(6, false);
    let summary = LayoutRestorer::new(&desktop).restore(&record);

    assert_eq!(summary.applied_windows, 3);
    assert_eq!(summary.restacked_windows, 2);
    assert_eq!(
        desktop.restacks.lock().unwrap().as_slice(),
        &[vec![WindowHandle(5), WindowHandle(7)]]
    );
}

#[test]
fn foreground_is_returned_and_hook_runs() {
    let desktop = MockDesktop::dual_monitor()
        .with_window(MockWindow::app(1, Rect::new(0, 0, 100, 100)))
        .with_window(MockWindow::app(2, Rect::new(0, 0, 100, 100)));
    let record = WindowSurveyor::new(&desktop).capture(true).expect("capture");
    *desktop.foreground.lock().unwrap() = Some(WindowHandle(42));

    let hook_ran = Cell::new(false);
    LayoutRestorer::new(&desktop).restore_preserving_foreground(&record, || hook_ran.set(true));

    assert!(hook_ran.get());
    assert_eq!(*desktop.foreground.lock().unwrap(), Some(WindowHandle(42)));
}

#[test]
fn plain_restore_leaves_foreground_to_the_caller() {
    let desktop = MockDesktop::dual_monitor()
        .with_window(MockWindow::app(1, Rect::new(0, 0, 100, 100)));
    let record = WindowSurveyor::new(&desktop).capture(true).expect("capture");
    *desktop.foreground.lock().unwrap() = Some(WindowHandle(42));

    LayoutRestorer::new(&desktop).restore(&record);

    assert_eq!(*desktop.foreground.lock().unwrap(), Some(WindowHandle(1)));
}
