use serde::{Deserialize, Serialize};

pub const UNTITLED: &str = "Untitled";
pub const TAB_ID_PREFIX: &str = "tab-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    #[serde(rename = "window")]
    Window,
    #[serde(rename = "chrome_tab", alias = "tab")]
    Tab,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Window => "window",
            Self::Tab => "chrome_tab",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "window" => Some(Self::Window),
            "tab" | "chrome_tab" => Some(Self::Tab),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerInfo {
    pub name: String,
    pub pid: u32,
}

/// A window as reported by one of the window strategies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub id: String,
    pub title: String,
    pub bounds: Bounds,
    pub visible: bool,
    pub minimized: bool,
    pub owner: OwnerInfo,
    /// Virtual desktop index when the source knows it.
    pub desktop: Option<i32>,
}

/// A browser tab as reported by the remote-debugging endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    pub favicon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRecord {
    Window(WindowRecord),
    Tab(TabRecord),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub kind: ItemKind,
    pub title: String,
    pub subtitle: String,
    pub raw: RawRecord,
}

impl Item {
    pub fn from_window(record: WindowRecord) -> Self {
        Self {
            id: record.id.clone(),
            kind: ItemKind::Window,
            title: display_title(&record.title),
            subtitle: format!("{} - PID: {}", record.owner.name, record.owner.pid),
            raw: RawRecord::Window(record),
        }
    }

    pub fn from_tab(record: TabRecord) -> Self {
        Self {
            id: format!("{TAB_ID_PREFIX}{}", record.id),
            kind: ItemKind::Tab,
            title: display_title(&record.title),
            subtitle: record.url.clone(),
            raw: RawRecord::Tab(record),
        }
    }

    pub fn window(&self) -> Option<&WindowRecord> {
        match &self.raw {
            RawRecord::Window(record) => Some(record),
            RawRecord::Tab(_) => None,
        }
    }

    pub fn tab(&self) -> Option<&TabRecord> {
        match &self.raw {
            RawRecord::Tab(record) => Some(record),
            RawRecord::Window(_) => None,
        }
    }
}

/// Recovers the provider-native tab id from a type-qualified item id.
pub fn native_tab_id(item_id: &str) -> &str {
    item_id.strip_prefix(TAB_ID_PREFIX).unwrap_or(item_id)
}

fn display_title(title: &str) -> String {
    if title.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        title.to_string()
    }
}

/// Immutable view of every activatable item at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub windows: Vec<Item>,
    pub tabs: Vec<Item>,
    /// `None` until the first refresh completes.
    pub captured_at_ms: Option<u64>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(windows: Vec<Item>, tabs: Vec<Item>, captured_at_ms: u64) -> Self {
        Self {
            windows,
            tabs,
            captured_at_ms: Some(captured_at_ms),
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.windows.iter().chain(self.tabs.iter())
    }

    pub fn len(&self) -> usize {
        self.windows.len() + self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn was_refreshed(&self) -> bool {
        self.captured_at_ms.is_some()
    }
}
