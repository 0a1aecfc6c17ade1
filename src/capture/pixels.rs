//! Pixel sampling from the desktop.
//!
//! All points of interest are read from one screenshot of their bounding
//! region, which is far cheaper than one capture per point.

use anyhow::{anyhow, Result};
use image::{ImageBuffer, Rgba};

use super::{Point, Region};
use crate::automation::detection::Rgb;

/// Padding around the bounding box of sampled points.
const SAMPLE_PADDING: i32 = 5;

/// Reads the colors at `points` from a single capture.
///
/// Fails if any point lies outside the virtual screen or the capture fails.
pub fn sample_colors(points: &[Point]) -> Result<Vec<Rgb>> {
    if points.is_empty() {
        return Ok(Vec::new());
    }

    let screen = screen_bounds()?;
    if let Some(p) = points.iter().find(|p| !screen.contains(**p)) {
        return Err(anyhow!("Point {} is outside the screen bounds", p));
    }

    let wanted = Region::bounding(points, SAMPLE_PADDING)
        .ok_or_else(|| anyhow!("No points to sample"))?;
    let region = wanted
        .intersect(&screen)
        .ok_or_else(|| anyhow!("Sample region is off screen"))?;

    let img = capture_region(&region)?;
    colors_from_image(&img, &region, points)
}

/// Looks up `points` (screen coordinates) in an image of `region`.
pub fn colors_from_image(
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    region: &Region,
    points: &[Point],
) -> Result<Vec<Rgb>> {
    if img.width() != region.width() || img.height() != region.height() {
        return Err(anyhow!(
            "Captured {}x{} image for a {}x{} region",
            img.width(),
            img.height(),
            region.width(),
            region.height()
        ));
    }
    points
        .iter()
        .map(|p| {
            let x = p.x - region.left;
            let y = p.y - region.top;
            if x < 0 || y < 0 || x as u32 >= img.width() || y as u32 >= img.height() {
                return Err(anyhow!("Point {} is outside the captured region", p));
            }
            let px = img.get_pixel(x as u32, y as u32);
            Ok(Rgb::new(px[0], px[1], px[2]))
        })
        .collect()
}

#[cfg(windows)]
pub use self::win32::{capture_region, screen_bounds};

#[cfg(not(windows))]
pub fn capture_region(_region: &Region) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
    Err(anyhow!("Screen capture is only supported on Windows"))
}

#[cfg(not(windows))]
pub fn screen_bounds() -> Result<Region> {
    Err(anyhow!("Screen capture is only supported on Windows"))
}

#[cfg(windows)]
mod win32 {
    use super::*;

    use windows::Win32::Foundation::HWND;
    use windows::Win32::Graphics::Gdi::{
        BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC,
        GetDIBits, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB,
        DIB_RGB_COLORS, HGDIOBJ, SRCCOPY,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
        SM_YVIRTUALSCREEN,
    };

    /// Bounds of the virtual screen spanning all monitors.
    pub fn screen_bounds() -> Result<Region> {
        let (left, top, width, height) = unsafe {
            (
                GetSystemMetrics(SM_XVIRTUALSCREEN),
                GetSystemMetrics(SM_YVIRTUALSCREEN),
                GetSystemMetrics(SM_CXVIRTUALSCREEN),
                GetSystemMetrics(SM_CYVIRTUALSCREEN),
            )
        };
        if width <= 0 || height <= 0 {
            return Err(anyhow!("Could not query the virtual screen size"));
        }
        Ok(Region {
            left,
            top,
            right: left + width,
            bottom: top + height,
        })
    }

    /// Copies a screen region into an RGBA image using GDI.
    pub fn capture_region(region: &Region) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
        let width = region.width() as i32;
        let height = region.height() as i32;
        if width == 0 || height == 0 {
            return Err(anyhow!("Cannot capture an empty region"));
        }

        let mut bgra = vec![0u8; (width * height * 4) as usize];

        unsafe {
            let screen_dc = GetDC(HWND::default());
            if screen_dc.is_invalid() {
                return Err(anyhow!("GetDC failed"));
            }
            let mem_dc = CreateCompatibleDC(screen_dc);
            let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
            let previous = SelectObject(mem_dc, HGDIOBJ(bitmap.0));

            let blit = BitBlt(
                mem_dc,
                0,
                0,
                width,
                height,
                screen_dc,
                region.left,
                region.top,
                SRCCOPY,
            );

            // Negative height requests a top-down DIB
            let mut info = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    biHeight: -height,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };
            let lines = GetDIBits(
                mem_dc,
                bitmap,
                0,
                height as u32,
                Some(bgra.as_mut_ptr() as *mut std::ffi::c_void),
                &mut info,
                DIB_RGB_COLORS,
            );

            let _ = SelectObject(mem_dc, previous);
            let _ = DeleteObject(HGDIOBJ(bitmap.0));
            let _ = DeleteDC(mem_dc);
            let _ = ReleaseDC(HWND::default(), screen_dc);

            blit.map_err(|e| anyhow!("BitBlt failed: {}", e))?;
            if lines == 0 {
                return Err(anyhow!("GetDIBits returned no scan lines"));
            }
        }

        // BGRA -> RGBA
        let mut img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::new(width as u32, height as u32);
        for (i, pixel) in img.pixels_mut().enumerate() {
            let offset = i * 4;
            *pixel = Rgba([bgra[offset + 2], bgra[offset + 1], bgra[offset], 255]);
        }
        Ok(img)
    }
}
