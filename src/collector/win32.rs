//! Windows capture and injection.
//!
//! A message-only window receives raw mouse input (`WM_INPUT`) even while
//! the application is in the background. A low-level mouse hook blocks the
//! OS's own cursor motion so only the engine's adjusted output moves the
//! cursor. Output is injected with `SendInput`, tagged with
//! [`SYNTHETIC_ORIGIN`] so both the hook and the raw input path recognise it.

use crate::collector::inject::{InjectionError, MotionInjector};
use crate::collector::types::{decode_raw_mouse, InputDecodeError, ScratchBuffer, SYNTHETIC_ORIGIN};
use crate::collector::CollectorError;
use crate::core::MotionEngine;
use crossbeam_channel::bounded;
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{
    ERROR_CLASS_ALREADY_EXISTS, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_MOVE, MOUSEINPUT,
};
use windows::Win32::UI::Input::{
    GetRawInputData, RegisterRawInputDevices, HRAWINPUT, RAWINPUTDEVICE, RAWINPUTHEADER,
    RIDEV_INPUTSINK, RID_INPUT,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
    PostThreadMessageW, RegisterClassExW, SetWindowsHookExW, UnhookWindowsHookEx, UnregisterClassW,
    HHOOK, HMENU,
    HWND_MESSAGE, MSG, MSLLHOOKSTRUCT, WH_MOUSE_LL, WINDOW_EX_STYLE, WINDOW_STYLE, WM_INPUT,
    WM_MOUSEMOVE, WM_QUIT, WNDCLASSEXW,
};

const HID_USAGE_PAGE_GENERIC: u16 = 0x01;
const HID_USAGE_GENERIC_MOUSE: u16 = 0x02;
const CLASS_NAME: PCWSTR = w!("GyroGravityCapture");

/// Injects relative moves with `SendInput`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SendInputInjector;

impl MotionInjector for SendInputInjector {
    fn inject(&mut self, dx: i32, dy: i32, origin: u64) -> Result<(), InjectionError> {
        let input = INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx,
                    dy,
                    mouseData: 0,
                    dwFlags: MOUSEEVENTF_MOVE,
                    time: 0,
                    dwExtraInfo: origin as usize,
                },
            },
        };
        let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
        if sent == 1 {
            Ok(())
        } else {
            Err(InjectionError::Rejected(
                windows::core::Error::from_win32().to_string(),
            ))
        }
    }
}

/// Per-thread capture state, reachable from the window procedure.
struct CaptureState {
    engine: MotionEngine,
    scratch: ScratchBuffer,
}

thread_local! {
    static CAPTURE: RefCell<Option<CaptureState>> = const { RefCell::new(None) };
}

/// The Windows collector using raw input and a low-level mouse hook.
pub struct WindowsCollector {
    running: Arc<AtomicBool>,
    thread_id: Option<u32>,
    thread_handle: Option<JoinHandle<()>>,
}

impl WindowsCollector {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            thread_id: None,
            thread_handle: None,
        }
    }

    /// Move `engine` onto a capture thread and start the message loop.
    ///
    /// Blocks until the thread has registered for raw input, so setup
    /// failures are returned here.
    pub fn start(&mut self, engine: MotionEngine) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }

        let (ready_tx, ready_rx) = bounded::<Result<u32, CollectorError>>(1);
        let running = self.running.clone();
        running.store(true, Ordering::SeqCst);

        let handle = thread::Builder::new()
            .name("gyrogravity-capture".into())
            .spawn(move || {
                if let Err(e) = run_capture_loop(engine, &ready_tx) {
                    tracing::error!("Capture loop error: {e}");
                    let _ = ready_tx.try_send(Err(e));
                }
                running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                CollectorError::Thread(e.to_string())
            })?;

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => {
                self.thread_id = Some(thread_id);
                self.thread_handle = Some(handle);
                tracing::info!("Raw input capture started");
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(CollectorError::Thread("capture thread exited during setup".into()))
            }
        }
    }

    /// Quit the message loop and wait for the capture thread to exit.
    pub fn stop(&mut self) {
        if let Some(thread_id) = self.thread_id.take() {
            if let Err(e) = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) } {
                tracing::warn!("Failed to post quit to capture thread: {e}");
            }
        }
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                tracing::error!("Capture thread panicked");
            }
            tracing::info!("Raw input capture stopped");
        }
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for WindowsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WindowsCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Low-level mouse hook: swallow cursor moves that we did not inject.
unsafe extern "system" fn mouse_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code >= 0 && w_param.0 as u32 == WM_MOUSEMOVE {
        let info = &*(l_param.0 as *const MSLLHOOKSTRUCT);
        if info.dwExtraInfo as u64 != SYNTHETIC_ORIGIN {
            return LRESULT(1);
        }
    }
    CallNextHookEx(HHOOK::default(), n_code, w_param, l_param)
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if msg == WM_INPUT {
        CAPTURE.with(|state| {
            if let Some(state) = state.borrow_mut().as_mut() {
                handle_raw_input(state, HRAWINPUT(l_param.0 as _));
            }
        });
    }
    DefWindowProcW(hwnd, msg, w_param, l_param)
}

fn handle_raw_input(state: &mut CaptureState, handle: HRAWINPUT) {
    match read_raw_input(&mut state.scratch, handle) {
        Ok(event) if event.is_synthetic() => state.engine.stats().record_echo_filtered(),
        Ok(event) => {
            state.engine.handle(event);
        }
        Err(InputDecodeError::NotMouse) => {}
        Err(e) => {
            tracing::debug!("Dropping raw input message: {e}");
            state.engine.stats().record_decode_failure();
        }
    }
}

fn read_raw_input(
    scratch: &mut ScratchBuffer,
    handle: HRAWINPUT,
) -> Result<crate::collector::RawMotionEvent, InputDecodeError> {
    let header_size = std::mem::size_of::<RAWINPUTHEADER>() as u32;
    let mut size = 0u32;
    unsafe { GetRawInputData(handle, RID_INPUT, None, &mut size, header_size) };
    scratch.check_capacity(size as usize)?;

    let buf = scratch.as_mut_slice();
    let copied = unsafe {
        GetRawInputData(
            handle,
            RID_INPUT,
            Some(buf.as_mut_ptr().cast()),
            &mut size,
            header_size,
        )
    };
    if copied == u32::MAX || copied as usize > buf.len() {
        return Err(InputDecodeError::ShortRead);
    }
    decode_raw_mouse(&buf[..copied as usize])
}

fn setup_error(what: &str, e: windows::core::Error) -> CollectorError {
    CollectorError::Setup(format!("{what}: {e}"))
}

/// Register the capture window class. A class left registered by an earlier
/// capture thread in this process is reused.
fn register_window_class(instance: HINSTANCE) -> Result<(), CollectorError> {
    let class = WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        lpfnWndProc: Some(window_proc),
        hInstance: instance,
        lpszClassName: CLASS_NAME,
        ..Default::default()
    };
    if unsafe { RegisterClassExW(&class) } == 0 {
        let e = windows::core::Error::from_win32();
        if e.code() != ERROR_CLASS_ALREADY_EXISTS.to_hresult() {
            return Err(setup_error("RegisterClassExW", e));
        }
    }
    Ok(())
}

fn unregister_window_class(instance: HINSTANCE) {
    if let Err(e) = unsafe { UnregisterClassW(CLASS_NAME, instance) } {
        tracing::debug!("UnregisterClassW failed: {e}");
    }
}

fn run_capture_loop(
    engine: MotionEngine,
    ready: &crossbeam_channel::Sender<Result<u32, CollectorError>>,
) -> Result<(), CollectorError> {
    unsafe {
        let instance: HINSTANCE = GetModuleHandleW(None)
            .map_err(|e| setup_error("GetModuleHandleW", e))?
            .into();
        register_window_class(instance)?;

        let hwnd = match CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            CLASS_NAME,
            w!("GyroGravity"),
            WINDOW_STYLE::default(),
            0,
            0,
            0,
            0,
            HWND_MESSAGE,
            HMENU::default(),
            instance,
            None,
        ) {
            Ok(hwnd) => hwnd,
            Err(e) => {
                unregister_window_class(instance);
                return Err(setup_error("CreateWindowExW", e));
            }
        };

        let device = RAWINPUTDEVICE {
            usUsagePage: HID_USAGE_PAGE_GENERIC,
            usUsage: HID_USAGE_GENERIC_MOUSE,
            dwFlags: RIDEV_INPUTSINK,
            hwndTarget: hwnd,
        };
        if let Err(e) =
            RegisterRawInputDevices(&[device], std::mem::size_of::<RAWINPUTDEVICE>() as u32)
        {
            let _ = DestroyWindow(hwnd);
            unregister_window_class(instance);
            return Err(setup_error("RegisterRawInputDevices", e));
        }

        let hook = match SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook_proc), None, 0) {
            Ok(hook) => hook,
            Err(e) => {
                let _ = DestroyWindow(hwnd);
                unregister_window_class(instance);
                return Err(CollectorError::HookInstallationFailed(e.to_string()));
            }
        };

        CAPTURE.with(|state| {
            *state.borrow_mut() = Some(CaptureState {
                engine,
                scratch: ScratchBuffer::new(),
            });
        });
        let _ = ready.try_send(Ok(GetCurrentThreadId()));

        let mut msg = MSG::default();
        loop {
            let result = GetMessageW(&mut msg, HWND::default(), 0, 0);
            if result.0 <= 0 {
                // WM_QUIT or error
                break;
            }
            DispatchMessageW(&msg);
        }

        let _ = UnhookWindowsHookEx(hook);
        let _ = DestroyWindow(hwnd);
        unregister_window_class(instance);
    }

    // Dropping the state releases the engine and the scratch buffer
    CAPTURE.with(|state| {
        if let Some(mut state) = state.borrow_mut().take() {
            state.engine.shutdown();
        }
    });
    Ok(())
}
