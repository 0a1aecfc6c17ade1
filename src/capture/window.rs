//! Window lookup under a screen point.
//!
//! Setup clicks only count when they land on the game window, so clicks on the
//! console, other apps, or this tool's own windows do not get captured.

use anyhow::Result;

use super::Point;

/// Exact title of the game window.
pub const GAME_WINDOW_TITLE: &str = "Revolution Idle";

const DISCORD_OVERLAY_TITLE: &str = "discord overlay";
const BROWSER_KEYWORDS: [&str; 5] = ["chrome", "firefox", "edge", "browser", "webkit"];
/// Titles of our own windows that may contain the game title.
const OWN_WINDOW_MARKERS: [&str; 2] = ["Revolution Idle Sacrifice Automation", "Setup Instructions"];

/// What a click landed on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickTarget {
    /// The game window itself
    Game,
    /// The game window beneath the Discord overlay
    GameBehindOverlay,
    /// A browser tab running the web version of the game
    GameInBrowser(String),
    /// Discord overlay with no game window beneath
    OverlayOnly,
    /// Some other window
    Other(String),
    /// No window at that point
    Nothing,
}

impl ClickTarget {
    pub fn is_game(&self) -> bool {
        matches!(
            self,
            Self::Game | Self::GameBehindOverlay | Self::GameInBrowser(_)
        )
    }
}

/// Classifies a click from the titles of the windows under it, topmost first.
pub fn classify_click_target(titles: &[String]) -> ClickTarget {
    let Some(top) = titles.first().map(|t| t.trim()) else {
        return ClickTarget::Nothing;
    };

    if top == GAME_WINDOW_TITLE {
        return ClickTarget::Game;
    }

    if top.to_lowercase() == DISCORD_OVERLAY_TITLE {
        return if titles[1..].iter().any(|t| t.trim() == GAME_WINDOW_TITLE) {
            ClickTarget::GameBehindOverlay
        } else {
            ClickTarget::OverlayOnly
        };
    }

    let lower = top.to_lowercase();
    if BROWSER_KEYWORDS.iter().any(|k| lower.contains(k))
        && top.contains(GAME_WINDOW_TITLE)
        && !OWN_WINDOW_MARKERS.iter().any(|m| top.contains(m))
    {
        return ClickTarget::GameInBrowser(top.to_string());
    }

    ClickTarget::Other(top.to_string())
}

/// Returns true if a click at `point` is on the game window.
///
/// If the window lookup itself fails the click is accepted, so setup still
/// works on systems where enumeration is restricted.
pub fn is_game_window_at(point: Point) -> bool {
    let titles = match window_titles_at(point) {
        Ok(titles) => titles,
        Err(e) => {
            crate::debug(&format!(
                "Window detection failed: {}. Processing click anyway.",
                e
            ));
            return true;
        }
    };

    let target = classify_click_target(&titles);
    match &target {
        ClickTarget::Game => crate::debug("Click registered on the game window"),
        ClickTarget::GameBehindOverlay => {
            crate::debug("Click registered on the game window (beneath Discord overlay)")
        }
        ClickTarget::GameInBrowser(title) => {
            crate::debug(&format!("Click registered on browser window: {}", title))
        }
        ClickTarget::OverlayOnly => crate::log(
            "Click ignored - Discord overlay detected but no game window found beneath it",
        ),
        ClickTarget::Other(title) => crate::log(&format!(
            "Click ignored - not on the {} window. Clicked on: '{}'",
            GAME_WINDOW_TITLE, title
        )),
        ClickTarget::Nothing => crate::log("Click ignored - no window at that position"),
    }
    target.is_game()
}

#[cfg(windows)]
pub use self::win32::window_titles_at;

#[cfg(not(windows))]
pub fn window_titles_at(_point: Point) -> Result<Vec<String>> {
    Err(anyhow::anyhow!("Window enumeration is only supported on Windows"))
}

#[cfg(windows)]
mod win32 {
    use super::*;

    use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT, TRUE};
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetWindowRect, GetWindowTextLengthW, GetWindowTextW, IsIconic,
        IsWindowVisible,
    };

    /// Titles of visible top-level windows containing `point`, topmost first.
    pub fn window_titles_at(point: Point) -> Result<Vec<String>> {
        struct EnumData {
            point: Point,
            titles: Vec<String>,
        }

        unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
            unsafe {
                let data = &mut *(lparam.0 as *mut EnumData);

                if !IsWindowVisible(hwnd).as_bool() || IsIconic(hwnd).as_bool() {
                    return TRUE;
                }

                let mut rect = RECT::default();
                if GetWindowRect(hwnd, &mut rect).is_err() {
                    return TRUE;
                }
                let p = data.point;
                if p.x < rect.left || p.x >= rect.right || p.y < rect.top || p.y >= rect.bottom {
                    return TRUE;
                }

                let title_len = GetWindowTextLengthW(hwnd);
                if title_len <= 0 {
                    return TRUE;
                }
                let mut title_buf: Vec<u16> = vec![0; (title_len + 1) as usize];
                let copied = GetWindowTextW(hwnd, &mut title_buf);
                if copied > 0 {
                    data.titles
                        .push(String::from_utf16_lossy(&title_buf[..copied as usize]));
                }

                TRUE
            }
        }

        let mut data = EnumData {
            point,
            titles: Vec::new(),
        };
        // EnumWindows walks top-level windows in Z order, topmost first
        unsafe {
            EnumWindows(Some(enum_callback), LPARAM(&mut data as *mut _ as isize))?;
        }
        Ok(data.titles)
    }
}
