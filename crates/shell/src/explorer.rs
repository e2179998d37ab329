//! Windows Explorer automation backed by `IShellWindows` and Win32
//! placement calls.
//!
//! `open_path` spawns `explorer.exe` and returns no handle; Explorer gives
//! the new window to an existing process, so the caller discovers it by
//! polling [`list_open_windows`]. COM is entered per call with an
//! apartment-threaded guard; run this backend on a current-thread runtime.
//!
//! [`list_open_windows`]: crate::ShellWindows::list_open_windows

use std::mem;
use std::path::Path;
use std::process::Command;
use std::ptr;

use winapi::Interface;
use winapi::shared::basetsd::SHANDLE_PTR;
use winapi::shared::guiddef::GUID;
use winapi::shared::windef::{HWND, RECT};
use winapi::shared::winerror::{RPC_E_CHANGED_MODE, SUCCEEDED};
use winapi::shared::wtypes::{BSTR, VT_I4};
use winapi::um::combaseapi::{CLSCTX_ALL, CoCreateInstance, CoInitializeEx, CoUninitialize};
use winapi::um::exdisp::{IShellWindows, IWebBrowser2};
use winapi::um::oaidl::{IDispatch, VARIANT};
use winapi::um::objbase::COINIT_APARTMENTTHREADED;
use winapi::um::oleauto::{SysFreeString, SysStringLen};
use winapi::um::unknwnbase::IUnknown;
use winapi::um::winuser::{
	GetClassNameW, GetWindowPlacement, GetWindowRect, IsWindow, MoveWindow, SW_MAXIMIZE,
	SW_MINIMIZE, SW_RESTORE, SW_SHOWMAXIMIZED, SW_SHOWMINIMIZED, ShowWindow, WINDOWPLACEMENT,
};

use crate::{
	Rect, ShellError, ShellWindows, WindowHandle, WindowPlacement, WindowState,
};

// Shell.Application window collection, {9BA05972-F6A8-11CF-A442-00A0C90A8F39}.
const CLSID_SHELL_WINDOWS: GUID = GUID {
	Data1: 0x9ba0_5972,
	Data2: 0xf6a8,
	Data3: 0x11cf,
	Data4: [0xa4, 0x42, 0x00, 0xa0, 0xc9, 0x0a, 0x8f, 0x39],
};

/// Live Explorer backend for [`ShellWindows`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplorerShell;

impl ExplorerShell {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait::async_trait]
impl ShellWindows for ExplorerShell {
	async fn list_open_windows(&self) -> Result<Vec<WindowHandle>, ShellError> {
		let windows = snapshot()?;
		Ok(windows.into_iter().map(|w| WindowHandle::new(w.hwnd)).collect())
	}

	async fn read_path(&self, handle: WindowHandle) -> Result<String, ShellError> {
		let windows = snapshot()?;
		let window = windows
			.into_iter()
			.find(|w| w.hwnd == handle.raw())
			.ok_or_else(|| ShellError::Inaccessible(format!("window {handle} not in shell enumeration")))?;
		window
			.location
			.ok_or_else(|| ShellError::Inaccessible(format!("window {handle} has no filesystem path")))
	}

	async fn read_geometry(&self, handle: WindowHandle) -> Result<WindowPlacement, ShellError> {
		let hwnd = handle.raw() as usize as HWND;
		if unsafe { IsWindow(hwnd) } == 0 {
			return Err(ShellError::Inaccessible(format!("window {handle} is gone")));
		}

		let mut placement: WINDOWPLACEMENT = unsafe { mem::zeroed() };
		placement.length = mem::size_of::<WINDOWPLACEMENT>() as u32;
		if unsafe { GetWindowPlacement(hwnd, &mut placement) } != 0 {
			let rc = placement.rcNormalPosition;
			let state = match placement.showCmd as i32 {
				SW_SHOWMAXIMIZED => WindowState::Maximized,
				SW_SHOWMINIMIZED | SW_MINIMIZE => WindowState::Minimized,
				_ => WindowState::Normal,
			};
			return Ok(WindowPlacement::new(rect_from(rc), state));
		}

		// Placement can be denied across integrity levels; the live rect
		// still describes a normal window.
		let mut rc: RECT = unsafe { mem::zeroed() };
		if unsafe { GetWindowRect(hwnd, &mut rc) } == 0 {
			return Err(ShellError::Inaccessible(format!("placement unreadable for {handle}")));
		}
		Ok(WindowPlacement::new(rect_from(rc), WindowState::Normal))
	}

	async fn open_path(&self, path: &str) -> Result<Option<WindowHandle>, ShellError> {
		if !Path::new(path).exists() {
			return Err(ShellError::OpenFailed(format!("no such folder: {path}")));
		}
		Command::new("explorer.exe")
			.arg(path)
			.spawn()
			.map_err(|err| ShellError::OpenFailed(format!("explorer.exe failed for '{path}': {err}")))?;
		Ok(None)
	}

	async fn set_geometry(
		&self,
		handle: WindowHandle,
		rect: Rect,
		state: WindowState,
	) -> Result<(), ShellError> {
		let hwnd = handle.raw() as usize as HWND;
		if unsafe { IsWindow(hwnd) } == 0 {
			return Err(ShellError::ApplyFailed(format!("window {handle} closed before placement")));
		}

		if unsafe { MoveWindow(hwnd, rect.left, rect.top, rect.width, rect.height, 1) } == 0 {
			return Err(ShellError::ApplyFailed(format!("MoveWindow rejected for {handle}")));
		}
		let show = match state {
			WindowState::Maximized => SW_MAXIMIZE,
			WindowState::Minimized => SW_MINIMIZE,
			WindowState::Normal => SW_RESTORE,
		};
		unsafe { ShowWindow(hwnd, show) };
		Ok(())
	}
}

struct LiveWindow {
	hwnd: u64,
	location: Option<String>,
}

/// Owned COM pointer, released on drop.
struct ComPtr<T: Interface>(*mut T);

impl<T: Interface> ComPtr<T> {
	/// Caller must pass a non-null pointer with an ownership reference.
	unsafe fn from_raw(ptr: *mut T) -> Self {
		Self(ptr)
	}

	fn as_ptr(&self) -> *mut T {
		self.0
	}
}

impl<T: Interface> Drop for ComPtr<T> {
	fn drop(&mut self) {
		unsafe {
			(*(self.0 as *mut IUnknown)).Release();
		}
	}
}

/// Per-call apartment guard. `CoInitializeEx` is balanced on drop unless the
/// thread was already initialized under a different model.
struct ComApartment {
	initialized: bool,
}

impl ComApartment {
	fn enter() -> Result<Self, ShellError> {
		let hr = unsafe { CoInitializeEx(ptr::null_mut(), COINIT_APARTMENTTHREADED) };
		if SUCCEEDED(hr) {
			Ok(Self { initialized: true })
		} else if hr == RPC_E_CHANGED_MODE {
			Ok(Self { initialized: false })
		} else {
			Err(ShellError::Inaccessible(format!("CoInitializeEx failed: 0x{hr:08x}")))
		}
	}
}

impl Drop for ComApartment {
	fn drop(&mut self) {
		if self.initialized {
			unsafe { CoUninitialize() };
		}
	}
}

/// Walks `IShellWindows` and collects every Explorer window with whatever
/// location it reports. Non-Explorer shell windows (Internet Explorer
/// frames) are filtered by window class.
fn snapshot() -> Result<Vec<LiveWindow>, ShellError> {
	let _apartment = ComApartment::enter()?;

	let mut raw: *mut IShellWindows = ptr::null_mut();
	let hr = unsafe {
		CoCreateInstance(
			&CLSID_SHELL_WINDOWS,
			ptr::null_mut(),
			CLSCTX_ALL,
			&IShellWindows::uuidof(),
			&mut raw as *mut _ as *mut _,
		)
	};
	if !SUCCEEDED(hr) || raw.is_null() {
		return Err(ShellError::Inaccessible(format!("ShellWindows unavailable: 0x{hr:08x}")));
	}
	let shell = unsafe { ComPtr::from_raw(raw) };

	let mut count = 0i32;
	let hr = unsafe { (*shell.as_ptr()).get_Count(&mut count) };
	if !SUCCEEDED(hr) {
		return Err(ShellError::Inaccessible(format!("ShellWindows count failed: 0x{hr:08x}")));
	}

	let mut windows = Vec::new();
	for i in 0..count {
		// Individual items can vanish between Count and Item; skip gaps.
		let Some(browser) = item_at(&shell, i) else {
			continue;
		};

		let mut hwnd: SHANDLE_PTR = 0;
		if !SUCCEEDED(unsafe { (*browser.as_ptr()).get_HWND(&mut hwnd) }) || hwnd == 0 {
			continue;
		}
		let hwnd = hwnd as u64;
		if !is_explorer_window(hwnd as usize as HWND) {
			continue;
		}

		let mut url: BSTR = ptr::null_mut();
		let location = if SUCCEEDED(unsafe { (*browser.as_ptr()).get_LocationURL(&mut url) })
			&& !url.is_null()
		{
			let raw_url = unsafe { bstr_to_string(url) };
			unsafe { SysFreeString(url) };
			file_url_to_path(&raw_url)
		} else {
			None
		};

		windows.push(LiveWindow { hwnd, location });
	}

	Ok(windows)
}

fn item_at(shell: &ComPtr<IShellWindows>, i: i32) -> Option<ComPtr<IWebBrowser2>> {
	let mut index: VARIANT = unsafe { mem::zeroed() };
	unsafe {
		let variant = index.n1.n2_mut();
		variant.vt = VT_I4 as u16;
		*variant.n3.lVal_mut() = i;
	}

	let mut disp: *mut IDispatch = ptr::null_mut();
	let hr = unsafe { (*shell.as_ptr()).Item(index, &mut disp) };
	if !SUCCEEDED(hr) || disp.is_null() {
		return None;
	}
	let disp = unsafe { ComPtr::from_raw(disp) };

	let mut browser: *mut IWebBrowser2 = ptr::null_mut();
	let hr = unsafe {
		(*disp.as_ptr()).QueryInterface(&IWebBrowser2::uuidof(), &mut browser as *mut _ as *mut _)
	};
	if !SUCCEEDED(hr) || browser.is_null() {
		return None;
	}
	Some(unsafe { ComPtr::from_raw(browser) })
}

fn is_explorer_window(hwnd: HWND) -> bool {
	let mut class = [0u16; 64];
	let len = unsafe { GetClassNameW(hwnd, class.as_mut_ptr(), class.len() as i32) };
	if len <= 0 {
		return false;
	}
	let class = String::from_utf16_lossy(&class[..len as usize]);
	class == "CabinetWClass" || class == "ExploreWClass"
}

unsafe fn bstr_to_string(bstr: BSTR) -> String {
	let len = unsafe { SysStringLen(bstr) } as usize;
	let slice = unsafe { std::slice::from_raw_parts(bstr, len) };
	String::from_utf16_lossy(slice)
}

fn rect_from(rc: RECT) -> Rect {
	Rect::new(rc.left, rc.top, rc.right - rc.left, rc.bottom - rc.top)
}

/// Maps `file:///C:/Users/...` to `C:\Users\...`. Virtual containers report
/// non-file URLs (or none) and map to `None`.
fn file_url_to_path(url: &str) -> Option<String> {
	let rest = url.strip_prefix("file:///")?;
	if rest.is_empty() {
		return None;
	}
	Some(percent_decode(rest).replace('/', "\\"))
}

fn percent_decode(s: &str) -> String {
	let bytes = s.as_bytes();
	let mut out = Vec::with_capacity(bytes.len());
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] == b'%' {
			if let (Some(hi), Some(lo)) = (
				bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16)),
				bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16)),
			) {
				out.push((hi * 16 + lo) as u8);
				i += 3;
				continue;
			}
		}
		out.push(bytes[i]);
		i += 1;
	}
	String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn file_urls_map_to_windows_paths() {
		assert_eq!(
			file_url_to_path("file:///C:/Users/demo/My%20Documents").as_deref(),
			Some(r"C:\Users\demo\My Documents")
		);
		assert_eq!(file_url_to_path("file:///"), None);
		assert_eq!(file_url_to_path("::{26EE0668-A00A-44D7-9371-BEB064C98683}"), None);
	}
}
