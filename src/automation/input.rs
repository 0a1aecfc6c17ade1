//! Mouse input simulation.
//!
//! Uses SendInput, which the game processes like hardware input. Every event
//! carries an absolute position on the virtual desktop so the cursor lands on
//! the same pixel across multi-monitor layouts.

use anyhow::Result;

use crate::capture::Point;

/// Converts a screen coordinate to the 0-65535 range SendInput expects for
/// `MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_VIRTUALDESK`.
///
/// Aims at the center of the pixel, so Windows scaling the value back by
/// `extent / 65536` lands on `value` whichever way it rounds.
pub fn normalize(value: i32, origin: i32, extent: i32) -> i32 {
    if extent <= 0 {
        return 0;
    }
    let offset = (value - origin) as i64;
    ((offset * 65536 + 32768) / extent as i64).clamp(0, 65535) as i32
}

#[cfg(windows)]
pub use self::win32::{left_down, left_up, move_cursor};

#[cfg(not(windows))]
pub fn move_cursor(_to: Point) -> Result<()> {
    Err(anyhow::anyhow!("Mouse input is only supported on Windows"))
}

#[cfg(not(windows))]
pub fn left_down(_at: Point) -> Result<()> {
    Err(anyhow::anyhow!("Mouse input is only supported on Windows"))
}

#[cfg(not(windows))]
pub fn left_up(_at: Point) -> Result<()> {
    Err(anyhow::anyhow!("Mouse input is only supported on Windows"))
}

#[cfg(windows)]
mod win32 {
    use super::*;
    use anyhow::anyhow;

    use windows::Win32::UI::Input::KeyboardAndMouse::{
        SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_ABSOLUTE, MOUSEEVENTF_LEFTDOWN,
        MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MOVE, MOUSEEVENTF_VIRTUALDESK, MOUSEINPUT,
        MOUSE_EVENT_FLAGS,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
        SM_YVIRTUALSCREEN,
    };

    fn send_mouse(at: Point, flags: MOUSE_EVENT_FLAGS) -> Result<()> {
        let (left, top, width, height) = unsafe {
            (
                GetSystemMetrics(SM_XVIRTUALSCREEN),
                GetSystemMetrics(SM_YVIRTUALSCREEN),
                GetSystemMetrics(SM_CXVIRTUALSCREEN),
                GetSystemMetrics(SM_CYVIRTUALSCREEN),
            )
        };

        let input = INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx: normalize(at.x, left, width),
                    dy: normalize(at.y, top, height),
                    dwFlags: flags | MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_VIRTUALDESK,
                    ..Default::default()
                },
            },
        };

        let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
        if sent != 1 {
            return Err(anyhow!("SendInput was blocked (sent {} of 1 events)", sent));
        }
        Ok(())
    }

    /// Moves the cursor to `to`.
    pub fn move_cursor(to: Point) -> Result<()> {
        send_mouse(to, MOUSE_EVENT_FLAGS(0))
    }

    /// Presses the left button at `at`.
    pub fn left_down(at: Point) -> Result<()> {
        send_mouse(at, MOUSEEVENTF_LEFTDOWN)
    }

    /// Releases the left button at `at`.
    pub fn left_up(at: Point) -> Result<()> {
        send_mouse(at, MOUSEEVENTF_LEFTUP)
    }
}
