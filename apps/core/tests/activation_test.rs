use std::sync::{Arc, Mutex};

use quickhop_core::activation::{ActivationDispatcher, TabControl, WindowControl};
use quickhop_core::discovery::ProviderError;
use quickhop_core::model::{Item, ItemKind, OwnerInfo, WindowRecord};

#[derive(Default)]
struct FakeWindows {
    windows: Vec<Item>,
    refuse: bool,
    activated: Mutex<Vec<String>>,
}

impl WindowControl for FakeWindows {
    fn list_windows(&self) -> Vec<Item> {
        self.windows.clone()
    }

    fn activate_window(&self, id: &str) -> bool {
        self.activated.lock().unwrap().push(id.to_string());
        !self.refuse
    }
}

#[derive(Default)]
struct FakeTabs {
    fail: bool,
    activated: Mutex<Vec<String>>,
    closed: Mutex<Vec<String>>,
}

impl TabControl for FakeTabs {
    fn activate_tab(&self, native_id: &str) -> Result<(), ProviderError> {
        self.activated.lock().unwrap().push(native_id.to_string());
        if self.fail {
            Err(ProviderError::unavailable("debugging port closed"))
        } else {
            Ok(())
        }
    }

    fn close_tab(&self, native_id: &str) -> Result<(), ProviderError> {
        self.closed.lock().unwrap().push(native_id.to_string());
        if self.fail {
            Err(ProviderError::new("no such target"))
        } else {
            Ok(())
        }
    }
}

fn window(id: &str, title: &str, owner: &str) -> Item {
    Item::from_window(WindowRecord {
        id: id.to_string(),
        title: title.to_string(),
        visible: true,
        owner: OwnerInfo {
            name: owner.to_string(),
            pid: 1,
        },
        ..Default::default()
    })
}

fn desktop_windows() -> Vec<Item> {
    vec![
        window("0x10", "notes.md - Obsidian", "Obsidian"),
        window("0x20", "Inbox - Google Chrome", "Google Chrome"),
    ]
}

fn dispatcher(windows: &Arc<FakeWindows>, tabs: &Arc<FakeTabs>) -> ActivationDispatcher {
    ActivationDispatcher::new(windows.clone(), tabs.clone(), "Chrome")
}

#[test]
fn window_items_go_straight_to_window_control() {
    let windows = Arc::new(FakeWindows {
        windows: desktop_windows(),
        ..Default::default()
    });
    let tabs = Arc::new(FakeTabs::default());

    assert!(dispatcher(&windows, &tabs).activate(ItemKind::Window, "0x10"));
    assert_eq!(*windows.activated.lock().unwrap(), vec!["0x10"]);
    assert!(tabs.activated.lock().unwrap().is_empty());
}

#[test]
fn tab_activation_raises_browser_then_switches_tab() {
    let windows = Arc::new(FakeWindows {
        windows: desktop_windows(),
        ..Default::default()
    });
    let tabs = Arc::new(FakeTabs::default());

    assert!(dispatcher(&windows, &tabs).activate(ItemKind::Tab, "tab-42"));
    assert_eq!(*windows.activated.lock().unwrap(), vec!["0x20"]);
    assert_eq!(*tabs.activated.lock().unwrap(), vec!["42"]);
}

#[test]
fn raised_browser_counts_as_success_when_tab_switch_fails() {
    let windows = Arc::new(FakeWindows {
        windows: desktop_windows(),
        ..Default::default()
    });
    let tabs = Arc::new(FakeTabs {
        fail: true,
        ..Default::default()
    });

    assert!(dispatcher(&windows, &tabs).activate(ItemKind::Tab, "tab-42"));
}

#[test]
fn tab_activation_fails_when_nothing_works() {
    let windows = Arc::new(FakeWindows {
        windows: vec![window("0x10", "notes.md - Obsidian", "Obsidian")],
        ..Default::default()
    });
    let tabs = Arc::new(FakeTabs {
        fail: true,
        ..Default::default()
    });

    assert!(!dispatcher(&windows, &tabs).activate(ItemKind::Tab, "tab-42"));
    assert!(windows.activated.lock().unwrap().is_empty());
    assert_eq!(*tabs.activated.lock().unwrap(), vec!["42"]);
}

#[test]
fn tab_switch_alone_is_enough() {
    let windows = Arc::new(FakeWindows::default());
    let tabs = Arc::new(FakeTabs::default());

    assert!(dispatcher(&windows, &tabs).activate(ItemKind::Tab, "tab-7"));
}

#[test]
fn browser_window_is_matched_by_owner_name() {
    let windows = Arc::new(FakeWindows {
        windows: vec![window("0x30", "New Tab", "chrome")],
        refuse: true,
        ..Default::default()
    });
    let tabs = Arc::new(FakeTabs {
        fail: true,
        ..Default::default()
    });

    assert!(!dispatcher(&windows, &tabs).activate(ItemKind::Tab, "tab-1"));
    assert_eq!(*windows.activated.lock().unwrap(), vec!["0x30"]);
}

#[test]
fn empty_ids_are_rejected() {
    let windows = Arc::new(FakeWindows::default());
    let tabs = Arc::new(FakeTabs::default());
    let dispatcher = dispatcher(&windows, &tabs);

    assert!(!dispatcher.activate(ItemKind::Window, ""));
    assert!(!dispatcher.activate(ItemKind::Tab, "  "));
    assert!(windows.activated.lock().unwrap().is_empty());
    assert!(tabs.activated.lock().unwrap().is_empty());
}

#[test]
fn close_tab_strips_prefix_and_reports_outcome() {
    let windows = Arc::new(FakeWindows::default());
    let tabs = Arc::new(FakeTabs::default());
    assert!(dispatcher(&windows, &tabs).close_tab("tab-9"));
    assert_eq!(*tabs.closed.lock().unwrap(), vec!["9"]);

    let failing = Arc::new(FakeTabs {
        fail: true,
        ..Default::default()
    });
    assert!(!dispatcher(&windows, &failing).close_tab("tab-9"));
}
