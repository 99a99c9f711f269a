//! C ABI for the pcdconv codec.
//!
//! The exported names match the `pcd_convert` library loaded by scripting
//! hosts through `ctypes`:
//!
//! ```c
//! int export_pcd(const char* path, int num_points, const double* points, const int* intensities);
//! int export_color_pcd(const char* path, int num_points, const double* points, const uint8_t* colors);
//! int import_pcd(const char* path, double** points, int** intensities);
//! int import_color_pcd(const char* path, double** points, uint8_t** colors);
//! void pcd_free_points(double* points, int num_points);
//! void pcd_free_intensities(int* intensities, int num_points);
//! void pcd_free_colors(uint8_t* colors, int num_points);
//! ```
//!
//! Exports return `PCD_OK`, imports return the point count. Failures return
//! one of the negative `PCD_ERR_*` codes. Buffers handed out by an import
//! belong to the caller and must be released with the matching
//! `pcd_free_*` function and the same point count.

use pcdconv_data::{
    AttributeKind, CodecError, ErrorKind, export_color_pointcloud, export_pointcloud, read_cloud,
};
use std::ffi::{CStr, c_char, c_int};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error};

pub const PCD_OK: c_int = 0;
pub const PCD_ERR_FORMAT: c_int = -1;
pub const PCD_ERR_NOT_FOUND: c_int = -2;
pub const PCD_ERR_IO: c_int = -3;
pub const PCD_ERR_INVALID_ARGUMENT: c_int = -4;
pub const PCD_ERR_PANIC: c_int = -5;

/// Errors raised at the ABI boundary.
#[derive(Debug, Error)]
enum FfiError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl FfiError {
    fn status(&self) -> c_int {
        match self {
            FfiError::InvalidArgument(_) => PCD_ERR_INVALID_ARGUMENT,
            FfiError::Codec(e) => match e.kind() {
                ErrorKind::Format => PCD_ERR_FORMAT,
                ErrorKind::NotFound => PCD_ERR_NOT_FOUND,
                ErrorKind::Io => PCD_ERR_IO,
            },
        }
    }
}

/// Runs `body`, logging and translating failures into status codes.
fn guard(op: &'static str, body: impl FnOnce() -> Result<c_int, FfiError>) -> c_int {
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(code)) => code,
        Ok(Err(e)) => {
            error!(op = op, "{}", e);
            e.status()
        }
        Err(_) => {
            error!(op = op, "panic while handling call");
            PCD_ERR_PANIC
        }
    }
}

/// # Safety
/// `path` must be null or a NUL-terminated string valid for `'a`.
unsafe fn path_arg<'a>(path: *const c_char) -> Result<&'a Path, FfiError> {
    if path.is_null() {
        return Err(FfiError::InvalidArgument("null path"));
    }
    let path = unsafe { CStr::from_ptr(path) };
    path.to_str()
        .map(Path::new)
        .map_err(|_| FfiError::InvalidArgument("path is not valid UTF-8"))
}

/// # Safety
/// `ptr` must be null or point to `len` initialized values valid for `'a`.
unsafe fn slice_arg<'a, T>(ptr: *const T, len: usize) -> Result<&'a [T], FfiError> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(FfiError::InvalidArgument("null input buffer"));
    }
    Ok(unsafe { std::slice::from_raw_parts(ptr, len) })
}

fn count_arg(num_points: c_int) -> Result<usize, FfiError> {
    usize::try_from(num_points).map_err(|_| FfiError::InvalidArgument("negative point count"))
}

/// Hands a buffer to the caller. Empty buffers become null.
fn into_raw<T>(values: Vec<T>) -> *mut T {
    if values.is_empty() {
        return std::ptr::null_mut();
    }
    Box::into_raw(values.into_boxed_slice()) as *mut T
}

/// # Safety
/// `ptr` must be null or come from [`into_raw`] with exactly `len` values.
unsafe fn free_raw<T>(ptr: *mut T, len: usize) {
    if ptr.is_null() || len == 0 {
        return;
    }
    drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)) });
}

fn point_count(n: usize) -> Result<c_int, FfiError> {
    c_int::try_from(n).map_err(|_| FfiError::Codec(CodecError::Format(format!("{} points", n))))
}

/// Writes an intensity cloud.
///
/// # Safety
/// `points` must hold `3 * num_points` doubles and `intensities`
/// `num_points` ints; neither may be mutated during the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn export_pcd(
    path: *const c_char,
    num_points: c_int,
    points: *const f64,
    intensities: *const c_int,
) -> c_int {
    guard("export_pcd", || {
        let path = unsafe { path_arg(path)? };
        let n = count_arg(num_points)?;
        let points = unsafe { slice_arg(points, 3 * n)? };
        let intensities = unsafe { slice_arg(intensities, n)? };
        export_pointcloud(path, points, intensities)?;
        Ok(PCD_OK)
    })
}

/// Writes a color cloud.
///
/// # Safety
/// `points` must hold `3 * num_points` doubles and `colors`
/// `3 * num_points` bytes; neither may be mutated during the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn export_color_pcd(
    path: *const c_char,
    num_points: c_int,
    points: *const f64,
    colors: *const u8,
) -> c_int {
    guard("export_color_pcd", || {
        let path = unsafe { path_arg(path)? };
        let n = count_arg(num_points)?;
        let points = unsafe { slice_arg(points, 3 * n)? };
        let colors = unsafe { slice_arg(colors, 3 * n)? };
        export_color_pointcloud(path, points, colors)?;
        Ok(PCD_OK)
    })
}

/// Reads an intensity cloud. On success `*out_points` receives `3 * N`
/// doubles and `*out_intensities` `N` ints, and `N` is returned.
///
/// # Safety
/// Both output pointers must be valid for a single pointer write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn import_pcd(
    path: *const c_char,
    out_points: *mut *mut f64,
    out_intensities: *mut *mut c_int,
) -> c_int {
    guard("import_pcd", || {
        if out_points.is_null() || out_intensities.is_null() {
            return Err(FfiError::InvalidArgument("null output pointer"));
        }
        let path = unsafe { path_arg(path)? };
        let cloud = read_cloud(path, AttributeKind::Intensity)?;
        let n = point_count(cloud.len())?;

        let intensities = cloud.intensities().unwrap_or_default().to_vec();
        unsafe {
            *out_points = into_raw(cloud.flat_positions());
            *out_intensities = into_raw(intensities);
        }
        debug!("import_pcd handed out {} points", n);
        Ok(n)
    })
}

/// Reads a color cloud. On success `*out_points` receives `3 * N` doubles
/// and `*out_colors` `3 * N` bytes, and `N` is returned.
///
/// # Safety
/// Both output pointers must be valid for a single pointer write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn import_color_pcd(
    path: *const c_char,
    out_points: *mut *mut f64,
    out_colors: *mut *mut u8,
) -> c_int {
    guard("import_color_pcd", || {
        if out_points.is_null() || out_colors.is_null() {
            return Err(FfiError::InvalidArgument("null output pointer"));
        }
        let path = unsafe { path_arg(path)? };
        let cloud = read_cloud(path, AttributeKind::Color)?;
        let n = point_count(cloud.len())?;

        let colors = cloud.flat_colors().unwrap_or_default();
        unsafe {
            *out_points = into_raw(cloud.flat_positions());
            *out_colors = into_raw(colors);
        }
        debug!("import_color_pcd handed out {} points", n);
        Ok(n)
    })
}

/// # Safety
/// `points` must be null or a buffer returned by an import together with
/// `num_points`. It must not be used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pcd_free_points(points: *mut f64, num_points: c_int) {
    if let Ok(n) = usize::try_from(num_points) {
        unsafe { free_raw(points, 3 * n) }
    }
}

/// # Safety
/// `intensities` must be null or a buffer returned by [`import_pcd`]
/// together with `num_points`. It must not be used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pcd_free_intensities(intensities: *mut c_int, num_points: c_int) {
    if let Ok(n) = usize::try_from(num_points) {
        unsafe { free_raw(intensities, n) }
    }
}

/// # Safety
/// `colors` must be null or a buffer returned by [`import_color_pcd`]
/// together with `num_points`. It must not be used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pcd_free_colors(colors: *mut u8, num_points: c_int) {
    if let Ok(n) = usize::try_from(num_points) {
        unsafe { free_raw(colors, 3 * n) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::path::PathBuf;
    use std::ptr;

    fn scratch_path(name: &str) -> (PathBuf, CString) {
        let dir = std::env::temp_dir().join(format!("pcdconv_ffi_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("cloud.pcd");
        let c_path = CString::new(file.to_str().unwrap()).unwrap();
        (dir, c_path)
    }

    #[test]
    fn test_intensity_roundtrip_through_abi() {
        let (dir, path) = scratch_path("intensity");
        let points = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        let intensities: [c_int; 4] = [255, 128, 200, 255];

        let status =
            unsafe { export_pcd(path.as_ptr(), 4, points.as_ptr(), intensities.as_ptr()) };
        assert_eq!(status, PCD_OK);

        let mut out_points: *mut f64 = ptr::null_mut();
        let mut out_intensities: *mut c_int = ptr::null_mut();
        let n = unsafe { import_pcd(path.as_ptr(), &mut out_points, &mut out_intensities) };
        assert_eq!(n, 4);

        unsafe {
            assert_eq!(std::slice::from_raw_parts(out_points, 12), &points);
            assert_eq!(std::slice::from_raw_parts(out_intensities, 4), &intensities);
            pcd_free_points(out_points, n);
            pcd_free_intensities(out_intensities, n);
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_color_roundtrip_through_abi() {
        let (dir, path) = scratch_path("color");
        let points = [1.5, -2.5, 3.25, 4.0, 5.0, 6.0];
        let colors = [10u8, 20, 30, 200, 210, 220];

        let status =
            unsafe { export_color_pcd(path.as_ptr(), 2, points.as_ptr(), colors.as_ptr()) };
        assert_eq!(status, PCD_OK);

        let mut out_points: *mut f64 = ptr::null_mut();
        let mut out_colors: *mut u8 = ptr::null_mut();
        let n = unsafe { import_color_pcd(path.as_ptr(), &mut out_points, &mut out_colors) };
        assert_eq!(n, 2);

        unsafe {
            assert_eq!(std::slice::from_raw_parts(out_points, 6), &points);
            assert_eq!(std::slice::from_raw_parts(out_colors, 6), &colors);
            pcd_free_points(out_points, n);
            pcd_free_colors(out_colors, n);
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_empty_cloud_yields_null_buffers() {
        let (dir, path) = scratch_path("empty");
        let status = unsafe { export_pcd(path.as_ptr(), 0, ptr::null(), ptr::null()) };
        assert_eq!(status, PCD_OK);

        let mut out_points: *mut f64 = ptr::null_mut();
        let mut out_intensities: *mut c_int = ptr::null_mut();
        let n = unsafe { import_pcd(path.as_ptr(), &mut out_points, &mut out_intensities) };
        assert_eq!(n, 0);
        assert!(out_points.is_null());
        assert!(out_intensities.is_null());
        unsafe {
            pcd_free_points(out_points, n);
            pcd_free_intensities(out_intensities, n);
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_status_codes() {
        let missing = CString::new("/nonexistent/path.pcd").unwrap();
        let mut out_points: *mut f64 = ptr::null_mut();
        let mut out_intensities: *mut c_int = ptr::null_mut();
        let status =
            unsafe { import_pcd(missing.as_ptr(), &mut out_points, &mut out_intensities) };
        assert_eq!(status, PCD_ERR_NOT_FOUND);

        let status = unsafe { import_pcd(ptr::null(), &mut out_points, &mut out_intensities) };
        assert_eq!(status, PCD_ERR_INVALID_ARGUMENT);

        let status =
            unsafe { import_pcd(missing.as_ptr(), ptr::null_mut(), &mut out_intensities) };
        assert_eq!(status, PCD_ERR_INVALID_ARGUMENT);

        let status = unsafe { export_pcd(missing.as_ptr(), -1, ptr::null(), ptr::null()) };
        assert_eq!(status, PCD_ERR_INVALID_ARGUMENT);

        let status = unsafe { export_pcd(missing.as_ptr(), 2, ptr::null(), ptr::null()) };
        assert_eq!(status, PCD_ERR_INVALID_ARGUMENT);
    }

    #[test]
    fn test_truncated_file_is_format_error() {
        let (dir, path) = scratch_path("truncated");
        let file = dir.join("cloud.pcd");
        std::fs::write(&file, 3i32.to_le_bytes()).unwrap();

        let mut out_points: *mut f64 = ptr::null_mut();
        let mut out_colors: *mut u8 = ptr::null_mut();
        let status = unsafe { import_color_pcd(path.as_ptr(), &mut out_points, &mut out_colors) };
        assert_eq!(status, PCD_ERR_FORMAT);
        assert!(out_points.is_null());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
