//! Stop key parsing and the background listener that watches for it.
//!
//! The listener watches key presses through a low-level keyboard hook on its
//! own thread and raises a shared flag. Key presses are never swallowed. The
//! automation loop and setup sessions poll the flag between steps.

use anyhow::{anyhow, Result};
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::JoinHandle;

/// A key that can stop automation, resolved to a Windows virtual-key code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StopKey {
    name: String,
    vk: u32,
}

impl Default for StopKey {
    fn default() -> Self {
        Self {
            name: "q".to_string(),
            vk: 0x51,
        }
    }
}

impl fmt::Display for StopKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl StopKey {
    /// Parses a single character or a special key name, case-insensitively.
    pub fn parse(input: &str) -> Option<Self> {
        let name = input.trim().to_lowercase();
        let vk = vk_for_name(&name)?;
        Some(Self { name, vk })
    }

    /// Windows virtual-key code.
    pub fn vk(&self) -> u32 {
        self.vk
    }
}

fn vk_for_name(name: &str) -> Option<u32> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return match c {
            'a'..='z' => Some(c.to_ascii_uppercase() as u32),
            '0'..='9' => Some(c as u32),
            ' ' => Some(0x20),
            _ => None,
        };
    }

    if let Some(n) = name.strip_prefix('f').and_then(|n| n.parse::<u32>().ok()) {
        return (1..=12).contains(&n).then(|| 0x6F + n); // VK_F1 = 0x70
    }

    let vk = match name {
        "esc" | "escape" => 0x1B,
        "space" => 0x20,
        "enter" | "return" => 0x0D,
        "tab" => 0x09,
        "backspace" => 0x08,
        "delete" => 0x2E,
        "insert" => 0x2D,
        "home" => 0x24,
        "end" => 0x23,
        "page_up" => 0x21,
        "page_down" => 0x22,
        "left" => 0x25,
        "up" => 0x26,
        "right" => 0x27,
        "down" => 0x28,
        "shift" => 0x10,
        "ctrl" => 0x11,
        "alt" => 0x12,
        "pause" => 0x13,
        _ => return None,
    };
    Some(vk)
}

/// Watches for the stop key on a background thread.
///
/// Raises `flag` when the key goes down. Dropping the listener removes the
/// hook and joins the thread.
pub struct StopListener {
    thread_id: u32,
    handle: Option<JoinHandle<()>>,
}

impl StopListener {
    /// Starts watching for `key`. Only one listener can run at a time.
    pub fn start(key: &StopKey, flag: Arc<AtomicBool>) -> Result<Self> {
        let (thread_id, handle) = platform::spawn_listener_thread(key.vk(), flag)?;
        crate::debug(&format!("Stop key listener started for '{}'", key));
        Ok(Self {
            thread_id,
            handle: Some(handle),
        })
    }
}

impl Drop for StopListener {
    fn drop(&mut self) {
        platform::stop_listener_thread(self.thread_id);
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.join() {
                crate::log(&format!("Stop key thread panicked: {:?}", e));
            }
        }
    }
}

/// True if a key reported by the keyboard hook is the stop key.
///
/// The hook reports left/right modifier codes, the stop key uses the generic
/// ones.
#[cfg_attr(not(windows), allow(dead_code))]
pub fn is_stop_key(stop_vk: u32, pressed_vk: u32) -> bool {
    let pressed = match pressed_vk {
        0xA0 | 0xA1 => 0x10, // VK_LSHIFT, VK_RSHIFT
        0xA2 | 0xA3 => 0x11, // VK_LCONTROL, VK_RCONTROL
        0xA4 | 0xA5 => 0x12, // VK_LMENU, VK_RMENU
        vk => vk,
    };
    pressed == stop_vk
}

#[cfg(windows)]
mod platform {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::mpsc;
    use std::sync::Mutex;

    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::System::Threading::GetCurrentThreadId;
    use windows::Win32::UI::WindowsAndMessaging::{
        CallNextHookEx, GetMessageW, PostThreadMessageW, SetWindowsHookExW,
        UnhookWindowsHookEx, HC_ACTION, HHOOK, KBDLLHOOKSTRUCT, MSG, WH_KEYBOARD_LL,
        WM_KEYDOWN, WM_QUIT, WM_SYSKEYDOWN,
    };

    /// Key and flag the hook callback checks against.
    static WATCHED: Mutex<Option<(u32, Arc<AtomicBool>)>> = Mutex::new(None);

    // Observes only: every event is passed on, so the key still reaches
    // whatever window has focus.
    unsafe extern "system" fn keyboard_hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
        if code == HC_ACTION as i32 && matches!(wparam.0 as u32, WM_KEYDOWN | WM_SYSKEYDOWN) {
            let info = unsafe { &*(lparam.0 as *const KBDLLHOOKSTRUCT) };
            if let Ok(guard) = WATCHED.lock() {
                if let Some((vk, flag)) = guard.as_ref() {
                    if is_stop_key(*vk, info.vkCode) {
                        flag.store(true, Ordering::SeqCst);
                    }
                }
            }
        }
        unsafe { CallNextHookEx(HHOOK::default(), code, wparam, lparam) }
    }

    pub fn spawn_listener_thread(vk: u32, flag: Arc<AtomicBool>) -> Result<(u32, JoinHandle<()>)> {
        {
            let mut guard = WATCHED
                .lock()
                .map_err(|_| anyhow!("Stop key state is poisoned"))?;
            if guard.is_some() {
                return Err(anyhow!("A stop key listener is already running"));
            }
            *guard = Some((vk, flag));
        }

        let (ready_tx, ready_rx) = mpsc::channel::<std::result::Result<u32, String>>();
        let handle = std::thread::spawn(move || {
            let thread_id = unsafe { GetCurrentThreadId() };
            let hook = unsafe {
                GetModuleHandleW(PCWSTR::null()).and_then(|module| {
                    SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), HINSTANCE::from(module), 0)
                })
            };
            let hook = match hook {
                Ok(hook) => hook,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(thread_id));

            let mut msg = MSG::default();
            unsafe {
                while GetMessageW(&mut msg, HWND::default(), 0, 0).as_bool() {}
                let _ = UnhookWindowsHookEx(hook);
            }
        });

        let result = match ready_rx.recv() {
            Ok(Ok(thread_id)) => return Ok((thread_id, handle)),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(anyhow!("Failed to start stop key listener: {}", e))
            }
            Err(_) => Err(anyhow!("Stop key thread exited before starting")),
        };
        clear_watched();
        result
    }

    fn clear_watched() {
        if let Ok(mut guard) = WATCHED.lock() {
            *guard = None;
        }
    }

    pub fn stop_listener_thread(thread_id: u32) {
        unsafe {
            let _ = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
        }
        clear_watched();
    }
}

#[cfg(not(windows))]
mod platform {
    use super::*;

    pub fn spawn_listener_thread(_vk: u32, _flag: Arc<AtomicBool>) -> Result<(u32, JoinHandle<()>)> {
        Err(anyhow!("The stop key listener is only supported on Windows"))
    }

    pub fn stop_listener_thread(_thread_id: u32) {}
}
