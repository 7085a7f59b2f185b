use std::fmt::{Display, Formatter};
use std::time::Duration;

use crate::config::{Config, KnownApp};
use crate::discovery::{DiscoveryProvider, ProviderError};
use crate::logging;
use crate::model::{Bounds, Item, OwnerInfo, WindowRecord};
use crate::process::{self, CommandError};

const TITLE_SEPARATOR: &str = " - ";
/// Listing-command windows carry no geometry; give them a nominal size.
const NOMINAL_BOUNDS: Bounds = Bounds {
    x: 0,
    y: 0,
    width: 800,
    height: 600,
};

/// One way of enumerating and raising OS windows.
pub trait WindowStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn list(&self) -> Result<Vec<WindowRecord>, ProviderError>;
    fn activate(&self, id: &str) -> Result<(), ProviderError>;
}

/// Title rules shared by every strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleFilter {
    pub reserved_titles: Vec<String>,
    pub panel_prefix: String,
    pub known_apps: Vec<KnownApp>,
}

impl Default for TitleFilter {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl TitleFilter {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            reserved_titles: cfg.reserved_titles.clone(),
            panel_prefix: cfg.panel_title_prefix.clone(),
            known_apps: cfg.known_apps.clone(),
        }
    }

    pub fn accepts_title(&self, title: &str) -> bool {
        !title.trim().is_empty() && !self.reserved_titles.iter().any(|name| name == title)
    }

    fn is_panel_element(&self, title: &str) -> bool {
        !self.panel_prefix.is_empty() && title.starts_with(&self.panel_prefix)
    }
}

/// Whether a natively enumerated window should be offered to the user.
pub fn accept_native(record: &WindowRecord, filter: &TitleFilter) -> bool {
    filter.accepts_title(&record.title) && record.visible && !record.bounds.is_empty()
}

/// Derives an owning-application name from a window title such as `"notes.md - Obsidian"`.
pub fn infer_app_name(title: &str, known_apps: &[KnownApp]) -> String {
    if !title.contains(TITLE_SEPARATOR) {
        return title.to_string();
    }
    let last = title.rsplit(TITLE_SEPARATOR).next().unwrap_or(title);

    known_apps
        .iter()
        .find(|app| last.contains(&app.pattern))
        .map(|app| app.name.clone())
        .unwrap_or_else(|| last.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineParseError {
    TooFewFields(usize),
    BadDesktop(String),
}

impl Display for LineParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewFields(count) => write!(f, "expected at least 4 fields, got {count}"),
            Self::BadDesktop(raw) => write!(f, "desktop index is not an integer: '{raw}'"),
        }
    }
}

impl std::error::Error for LineParseError {}

/// Parses one `wmctrl -l` style line: `<id> <desktop> <host> <title...>`.
///
/// `Ok(None)` means the line was well formed but names a window that is never shown
/// (sticky/system windows, panel elements, reserved or empty titles).
pub fn parse_listing_line(
    line: &str,
    filter: &TitleFilter,
) -> Result<Option<WindowRecord>, LineParseError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(LineParseError::TooFewFields(parts.len()));
    }

    let desktop: i32 = parts[1]
        .parse()
        .map_err(|_| LineParseError::BadDesktop(parts[1].to_string()))?;
    let title = parts[3..].join(" ");

    if desktop < 0 || !filter.accepts_title(&title) || filter.is_panel_element(&title) {
        return Ok(None);
    }

    Ok(Some(WindowRecord {
        id: parts[0].to_string(),
        owner: OwnerInfo {
            name: infer_app_name(&title, &filter.known_apps),
            pid: 0,
        },
        title,
        bounds: NOMINAL_BOUNDS,
        visible: true,
        minimized: false,
        desktop: Some(desktop),
    }))
}

/// Parses full listing output, skipping blank and malformed lines.
pub fn parse_listing_output(output: &str, filter: &TitleFilter) -> Vec<WindowRecord> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match parse_listing_line(line, filter) {
            Ok(record) => record,
            Err(error) => {
                logging::debug(&format!("skipping window listing line '{line}': {error}"));
                None
            }
        })
        .collect()
}

impl From<CommandError> for ProviderError {
    fn from(value: CommandError) -> Self {
        if value.is_not_found() {
            return ProviderError::unavailable(value.to_string());
        }
        match value {
            CommandError::TimedOut { .. } => ProviderError::timeout(value.to_string()),
            other => ProviderError::new(other.to_string()),
        }
    }
}

/// Shells out to a window-listing tool and parses its text output.
pub struct CommandWindowStrategy {
    list_command: Vec<String>,
    activate_command: Vec<String>,
    timeout: Duration,
    filter: TitleFilter,
}

impl CommandWindowStrategy {
    pub fn new(
        list_command: Vec<String>,
        activate_command: Vec<String>,
        timeout: Duration,
        filter: TitleFilter,
    ) -> Self {
        Self {
            list_command,
            activate_command,
            timeout,
            filter,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.window_list_command.clone(),
            cfg.window_activate_command.clone(),
            cfg.command_timeout(),
            TitleFilter::from_config(cfg),
        )
    }
}

impl WindowStrategy for CommandWindowStrategy {
    fn name(&self) -> &'static str {
        "command"
    }

    fn list(&self) -> Result<Vec<WindowRecord>, ProviderError> {
        let output = process::run_with_timeout(&self.list_command, self.timeout)?;
        Ok(parse_listing_output(&output, &self.filter))
    }

    fn activate(&self, id: &str) -> Result<(), ProviderError> {
        if id.trim().is_empty() {
            return Err(ProviderError::new("empty window id"));
        }
        let mut argv = self.activate_command.clone();
        argv.push(id.to_string());
        process::run_with_timeout(&argv, self.timeout)?;
        Ok(())
    }
}

/// Queries the platform window manager directly.
pub struct NativeWindowStrategy {
    filter: TitleFilter,
}

impl NativeWindowStrategy {
    pub fn new(filter: TitleFilter) -> Self {
        Self { filter }
    }
}

impl WindowStrategy for NativeWindowStrategy {
    fn name(&self) -> &'static str {
        "native"
    }

    #[cfg(target_os = "windows")]
    fn list(&self) -> Result<Vec<WindowRecord>, ProviderError> {
        let records = native::enumerate()?
            .into_iter()
            .filter(|record| accept_native(record, &self.filter))
            .map(|mut record| {
                if record.owner.name.is_empty() {
                    record.owner.name = infer_app_name(&record.title, &self.filter.known_apps);
                }
                record
            })
            .collect();
        Ok(records)
    }

    #[cfg(not(target_os = "windows"))]
    fn list(&self) -> Result<Vec<WindowRecord>, ProviderError> {
        let _ = &self.filter;
        Err(ProviderError::unavailable(
            "native window API unavailable on this platform",
        ))
    }

    #[cfg(target_os = "windows")]
    fn activate(&self, id: &str) -> Result<(), ProviderError> {
        native::activate(id)
    }

    #[cfg(not(target_os = "windows"))]
    fn activate(&self, _id: &str) -> Result<(), ProviderError> {
        Err(ProviderError::unavailable(
            "native window API unavailable on this platform",
        ))
    }
}

#[cfg(target_os = "windows")]
mod native {
    use std::path::Path;

    use windows_sys::Win32::Foundation::{CloseHandle, BOOL, HWND, LPARAM, RECT};
    use windows_sys::Win32::System::Threading::{
        OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
        PROCESS_QUERY_LIMITED_INFORMATION,
    };
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        BringWindowToTop, EnumWindows, GetWindowRect, GetWindowTextLengthW, GetWindowTextW,
        GetWindowThreadProcessId, IsIconic, IsWindow, IsWindowVisible, SetForegroundWindow,
        ShowWindow, SW_RESTORE, SW_SHOW,
    };

    use crate::discovery::ProviderError;
    use crate::model::{Bounds, OwnerInfo, WindowRecord};

    unsafe extern "system" fn collect_handle(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let handles = unsafe { &mut *(lparam as *mut Vec<usize>) };
        handles.push(hwnd as usize);
        1
    }

    pub(super) fn enumerate() -> Result<Vec<WindowRecord>, ProviderError> {
        let mut handles: Vec<usize> = Vec::new();
        let ok = unsafe { EnumWindows(Some(collect_handle), &mut handles as *mut _ as LPARAM) };
        if ok == 0 {
            return Err(ProviderError::new("EnumWindows failed"));
        }

        Ok(handles
            .into_iter()
            .map(|raw| describe(raw as HWND))
            .collect())
    }

    fn describe(hwnd: HWND) -> WindowRecord {
        let title = window_title(hwnd);
        let mut rect: RECT = unsafe { std::mem::zeroed() };
        let bounds = if unsafe { GetWindowRect(hwnd, &mut rect) } != 0 {
            Bounds {
                x: rect.left,
                y: rect.top,
                width: rect.right - rect.left,
                height: rect.bottom - rect.top,
            }
        } else {
            Bounds::default()
        };

        let mut pid = 0_u32;
        unsafe {
            GetWindowThreadProcessId(hwnd, &mut pid);
        }

        WindowRecord {
            id: (hwnd as usize).to_string(),
            title,
            bounds,
            visible: unsafe { IsWindowVisible(hwnd) } != 0,
            minimized: unsafe { IsIconic(hwnd) } != 0,
            owner: OwnerInfo {
                name: process_name(pid).unwrap_or_default(),
                pid,
            },
            desktop: None,
        }
    }

    fn window_title(hwnd: HWND) -> String {
        let length = unsafe { GetWindowTextLengthW(hwnd) };
        if length <= 0 {
            return String::new();
        }
        let mut buffer = vec![0u16; (length + 1) as usize];
        let copied = unsafe { GetWindowTextW(hwnd, buffer.as_mut_ptr(), buffer.len() as i32) };
        if copied <= 0 {
            return String::new();
        }
        String::from_utf16_lossy(&buffer[..copied as usize])
    }

    fn process_name(pid: u32) -> Option<String> {
        if pid == 0 {
            return None;
        }
        let handle = unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid) };
        if handle.is_null() {
            return None;
        }

        let mut buffer = vec![0u16; 1024];
        let mut size = buffer.len() as u32;
        let ok = unsafe {
            QueryFullProcessImageNameW(handle, PROCESS_NAME_WIN32, buffer.as_mut_ptr(), &mut size)
        };
        unsafe {
            CloseHandle(handle);
        }
        if ok == 0 {
            return None;
        }

        let path = String::from_utf16_lossy(&buffer[..size as usize]);
        Path::new(&path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
    }

    pub(super) fn activate(id: &str) -> Result<(), ProviderError> {
        let raw: usize = id
            .trim()
            .parse()
            .map_err(|_| ProviderError::new(format!("not a native window handle: '{id}'")))?;
        let hwnd = raw as HWND;

        if unsafe { IsWindow(hwnd) } == 0 {
            return Err(ProviderError::new(format!("window {id} no longer exists")));
        }

        unsafe {
            if IsIconic(hwnd) != 0 {
                ShowWindow(hwnd, SW_RESTORE);
            }
            let raised = BringWindowToTop(hwnd) != 0;
            ShowWindow(hwnd, SW_SHOW);
            let focused = SetForegroundWindow(hwnd) != 0;
            if !raised && !focused {
                return Err(ProviderError::new(format!("window {id} refused focus")));
            }
        }
        Ok(())
    }
}

/// Ordered fallback over window strategies.
pub struct WindowProvider {
    strategies: Vec<Box<dyn WindowStrategy>>,
}

impl WindowProvider {
    pub fn new(strategies: Vec<Box<dyn WindowStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(vec![
            Box::new(NativeWindowStrategy::new(TitleFilter::from_config(cfg))),
            Box::new(CommandWindowStrategy::from_config(cfg)),
        ])
    }

    /// First non-empty strategy result wins. Errors only when no strategy produced a list.
    pub fn list_records(&self) -> Result<Vec<WindowRecord>, ProviderError> {
        let mut any_succeeded = false;
        let mut last_error = None;

        for strategy in &self.strategies {
            match strategy.list() {
                Ok(records) if !records.is_empty() => return Ok(records),
                Ok(_) => {
                    any_succeeded = true;
                    logging::debug(&format!(
                        "window strategy '{}' returned no windows",
                        strategy.name()
                    ));
                }
                Err(error) => {
                    logging::info(&format!(
                        "window strategy '{}' failed: {error}",
                        strategy.name()
                    ));
                    last_error = Some(error);
                }
            }
        }

        if any_succeeded {
            return Ok(Vec::new());
        }
        Err(last_error.unwrap_or_else(|| ProviderError::unavailable("no window strategies")))
    }

    pub fn list_windows(&self) -> Vec<Item> {
        match self.list_records() {
            Ok(records) => records.into_iter().map(Item::from_window).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn activate_window(&self, id: &str) -> bool {
        for strategy in &self.strategies {
            match strategy.activate(id) {
                Ok(()) => return true,
                Err(error) => logging::info(&format!(
                    "window strategy '{}' could not activate {id}: {error}",
                    strategy.name()
                )),
            }
        }
        logging::warn(&format!("window {id} could not be activated"));
        false
    }
}

impl DiscoveryProvider for WindowProvider {
    fn provider_name(&self) -> &'static str {
        "windows"
    }

    fn discover(&self) -> Result<Vec<Item>, ProviderError> {
        self.list_records()
            .map(|records| records.into_iter().map(Item::from_window).collect())
    }
}
