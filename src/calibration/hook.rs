//! Global mouse click capture for setup.
//!
//! A low-level mouse hook runs on its own thread with a message loop. The hook
//! callback only forwards button presses over a channel, all setup logic runs
//! on the thread that owns the `MouseHook`.

use anyhow::Result;
use std::sync::mpsc::Receiver;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::calibration::state::MouseButton;
use crate::capture::Point;

/// A mouse button press anywhere on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClickEvent {
    pub position: Point,
    pub button: MouseButton,
}

/// Installed mouse hook. Dropping it removes the hook and joins the thread.
pub struct MouseHook {
    receiver: Receiver<ClickEvent>,
    thread_id: u32,
    handle: Option<JoinHandle<()>>,
}

impl MouseHook {
    pub fn install() -> Result<Self> {
        let (receiver, thread_id, handle) = platform::spawn_hook_thread()?;
        crate::debug("Mouse hook installed");
        Ok(Self {
            receiver,
            thread_id,
            handle: Some(handle),
        })
    }

    /// Waits up to `timeout` for the next click.
    pub fn next_click(&self, timeout: Duration) -> Option<ClickEvent> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Discards clicks that arrived while nobody was listening.
    pub fn drain(&self) {
        while self.receiver.try_recv().is_ok() {}
    }
}

impl Drop for MouseHook {
    fn drop(&mut self) {
        platform::stop_hook_thread(self.thread_id);
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.join() {
                crate::log(&format!("Mouse hook thread panicked: {:?}", e));
            }
        }
        crate::debug("Mouse hook removed");
    }
}

#[cfg(windows)]
mod platform {
    use super::*;
    use anyhow::anyhow;
    use std::sync::mpsc::{self, Sender};
    use std::sync::Mutex;

    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::System::Threading::GetCurrentThreadId;
    use windows::Win32::UI::WindowsAndMessaging::{
        CallNextHookEx, GetMessageW, PostThreadMessageW, SetWindowsHookExW,
        UnhookWindowsHookEx, HC_ACTION, HHOOK, MSG, MSLLHOOKSTRUCT, WH_MOUSE_LL,
        WM_LBUTTONDOWN, WM_QUIT, WM_RBUTTONDOWN,
    };

    /// Channel the hook callback writes into. The callback has no user data
    /// pointer, so it lives in a static.
    static CLICK_SENDER: Mutex<Option<Sender<ClickEvent>>> = Mutex::new(None);

    unsafe extern "system" fn mouse_hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
        if code == HC_ACTION as i32 {
            let button = match wparam.0 as u32 {
                WM_LBUTTONDOWN => Some(MouseButton::Left),
                WM_RBUTTONDOWN => Some(MouseButton::Right),
                _ => None,
            };
            if let Some(button) = button {
                let info = unsafe { &*(lparam.0 as *const MSLLHOOKSTRUCT) };
                let event = ClickEvent {
                    position: Point::new(info.pt.x, info.pt.y),
                    button,
                };
                if let Ok(guard) = CLICK_SENDER.lock() {
                    if let Some(sender) = guard.as_ref() {
                        let _ = sender.send(event);
                    }
                }
            }
        }
        unsafe { CallNextHookEx(HHOOK::default(), code, wparam, lparam) }
    }

    pub fn spawn_hook_thread() -> Result<(Receiver<ClickEvent>, u32, JoinHandle<()>)> {
        let (click_tx, click_rx) = mpsc::channel();
        {
            let mut guard = CLICK_SENDER
                .lock()
                .map_err(|_| anyhow!("Mouse hook state is poisoned"))?;
            if guard.is_some() {
                return Err(anyhow!("A mouse hook is already installed"));
            }
            *guard = Some(click_tx);
        }

        let (ready_tx, ready_rx) = mpsc::channel::<std::result::Result<u32, String>>();
        let handle = std::thread::spawn(move || {
            let thread_id = unsafe { GetCurrentThreadId() };
            let hook = unsafe {
                GetModuleHandleW(PCWSTR::null()).and_then(|module| {
                    SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook_proc), HINSTANCE::from(module), 0)
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

            // Low-level hooks are called through this thread's message loop
            let mut msg = MSG::default();
            unsafe {
                while GetMessageW(&mut msg, HWND::default(), 0, 0).as_bool() {}
                let _ = UnhookWindowsHookEx(hook);
            }
        });

        let result = match ready_rx.recv() {
            Ok(Ok(thread_id)) => return Ok((click_rx, thread_id, handle)),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(anyhow!("Failed to install mouse hook: {}", e))
            }
            Err(_) => Err(anyhow!("Mouse hook thread exited before installing")),
        };
        clear_sender();
        result
    }

    fn clear_sender() {
        if let Ok(mut guard) = CLICK_SENDER.lock() {
            *guard = None;
        }
    }

    pub fn stop_hook_thread(thread_id: u32) {
        unsafe {
            let _ = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
        }
        clear_sender();
    }
}

#[cfg(not(windows))]
mod platform {
    use super::*;

    pub fn spawn_hook_thread() -> Result<(Receiver<ClickEvent>, u32, JoinHandle<()>)> {
        Err(anyhow::anyhow!("Mouse hooks are only supported on Windows"))
    }

    pub fn stop_hook_thread(_thread_id: u32) {}
}
