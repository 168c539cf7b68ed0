//! C FFI bindings for dc-core
//!
//! This crate provides a C-compatible API for embedding the comparison in a
//! desktop or web front end. Every function returning a handle or string
//! returns null on failure; `dc_last_error` then describes what went wrong.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::PathBuf;
use std::ptr;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(message: impl Into<String>) {
    let message = CString::new(message.into()).unwrap_or_default();
    LAST_ERROR.with(|e| *e.borrow_mut() = Some(message));
}

fn clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}

fn into_c_string(s: &str) -> *mut c_char {
    CString::new(s)
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}

unsafe fn str_arg<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        None
    } else {
        CStr::from_ptr(s).to_str().ok()
    }
}

/// Opaque handle to a loaded table
pub struct FfiTable {
    inner: dc_core::Table,
}

/// Opaque handle to a comparison result
pub struct FfiComparison {
    inner: dc_core::Comparison,
}

/// Load a CSV, TSV or spreadsheet file
///
/// # Safety
/// - `path` must be a valid C string
/// - `sheet` must be a valid C string or null (first sheet)
/// - Returns null on error, including a sheet name that is not valid UTF-8
#[no_mangle]
pub unsafe extern "C" fn dc_load_table(path: *const c_char, sheet: *const c_char) -> *mut FfiTable {
    clear_last_error();

    let Some(path) = str_arg(path) else {
        set_last_error("path is null or not valid UTF-8");
        return ptr::null_mut();
    };

    let sheet = if sheet.is_null() {
        None
    } else {
        let Some(name) = str_arg(sheet) else {
            set_last_error("sheet is not valid UTF-8");
            return ptr::null_mut();
        };
        Some(name.to_string())
    };

    let options = dc_core::LoadOptions {
        sheet,
        delimiter: None,
    };

    match dc_core::load_table(PathBuf::from(path), &options) {
        Ok(table) => Box::into_raw(Box::new(FfiTable { inner: table })),
        Err(e) => {
            set_last_error(e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a table
///
/// # Safety
/// - `table` must be a valid pointer returned by `dc_load_table` or null
#[no_mangle]
pub unsafe extern "C" fn dc_free_table(table: *mut FfiTable) {
    if !table.is_null() {
        drop(Box::from_raw(table));
    }
}

/// Get the row count of a table
///
/// # Safety
/// - `table` must be a valid pointer returned by `dc_load_table`
#[no_mangle]
pub unsafe extern "C" fn dc_table_row_count(table: *const FfiTable) -> usize {
    if table.is_null() {
        return 0;
    }
    (*table).inner.row_count()
}

/// Get the column count of a table
///
/// # Safety
/// - `table` must be a valid pointer returned by `dc_load_table`
#[no_mangle]
pub unsafe extern "C" fn dc_table_col_count(table: *const FfiTable) -> usize {
    if table.is_null() {
        return 0;
    }
    (*table).inner.column_count()
}

/// Get a column name by index
///
/// # Safety
/// - `table` must be a valid pointer returned by `dc_load_table`
/// - Returns null if index is out of bounds
/// - Caller must free the returned string with `dc_free_string`
#[no_mangle]
pub unsafe extern "C" fn dc_table_col_name(table: *const FfiTable, index: usize) -> *mut c_char {
    if table.is_null() {
        return ptr::null_mut();
    }

    (&(*table)
        .inner
        .columns)
        .get(index)
        .map(|c| into_c_string(&c.name))
        .unwrap_or(ptr::null_mut())
}

/// Compare two tables on a key column
///
/// # Safety
/// - `file1` and `file2` must be valid pointers returned by `dc_load_table`
/// - `key` must be a valid C string
/// - `columns` must point to `count` valid C strings
/// - Returns null on error, including schema errors and any column name that
///   is null or not valid UTF-8
#[no_mangle]
pub unsafe extern "C" fn dc_compare(
    file1: *const FfiTable,
    file2: *const FfiTable,
    key: *const c_char,
    columns: *const *const c_char,
    count: usize,
    filter_empty_keys: bool,
) -> *mut FfiComparison {
    clear_last_error();

    if file1.is_null() || file2.is_null() {
        set_last_error("table handle is null");
        return ptr::null_mut();
    }

    let Some(key) = str_arg(key) else {
        set_last_error("key is null or not valid UTF-8");
        return ptr::null_mut();
    };

    let columns: Vec<String> = if columns.is_null() {
        if count > 0 {
            set_last_error("columns is null");
            return ptr::null_mut();
        }
        Vec::new()
    } else {
        let parsed: Option<Vec<String>> = (0..count)
            .map(|i| str_arg(*columns.add(i)).map(str::to_string))
            .collect();
        let Some(parsed) = parsed else {
            set_last_error("a comparison column is null or not valid UTF-8");
            return ptr::null_mut();
        };
        parsed
    };

    let key_validity = if filter_empty_keys {
        dc_core::KeyValidity::On
    } else {
        dc_core::KeyValidity::Off
    };
    let options = dc_core::CompareOptions::new(key, columns).with_key_validity(key_validity);

    match dc_core::compare(&(*file1).inner, &(*file2).inner, &options) {
        Ok(comparison) => Box::into_raw(Box::new(FfiComparison { inner: comparison })),
        Err(e) => {
            set_last_error(e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a comparison result
///
/// # Safety
/// - `comparison` must be a valid pointer returned by `dc_compare` or null
#[no_mangle]
pub unsafe extern "C" fn dc_free_comparison(comparison: *mut FfiComparison) {
    if !comparison.is_null() {
        drop(Box::from_raw(comparison));
    }
}

/// Get the number of mismatching rows in the report
///
/// # Safety
/// - `comparison` must be a valid pointer returned by `dc_compare`
#[no_mangle]
pub unsafe extern "C" fn dc_report_row_count(comparison: *const FfiComparison) -> usize {
    if comparison.is_null() {
        return 0;
    }
    (*comparison).inner.report.row_count()
}

/// Get the number of report columns
///
/// # Safety
/// - `comparison` must be a valid pointer returned by `dc_compare`
#[no_mangle]
pub unsafe extern "C" fn dc_report_col_count(comparison: *const FfiComparison) -> usize {
    if comparison.is_null() {
        return 0;
    }
    (*comparison).inner.report.header().len()
}

/// Get a report column name by index
///
/// # Safety
/// - `comparison` must be a valid pointer returned by `dc_compare`
/// - Returns null if index is out of bounds
/// - Caller must free the returned string with `dc_free_string`
#[no_mangle]
pub unsafe extern "C" fn dc_report_col_name(comparison: *const FfiComparison, index: usize) -> *mut c_char {
    if comparison.is_null() {
        return ptr::null_mut();
    }

    (*comparison)
        .inner
        .report
        .header()
        .get(index)
        .map(|name| into_c_string(name))
        .unwrap_or(ptr::null_mut())
}

/// Get a report cell as a string
///
/// # Safety
/// - `comparison` must be a valid pointer returned by `dc_compare`
/// - Returns null if row or col is out of bounds
/// - Caller must free the returned string with `dc_free_string`
#[no_mangle]
pub unsafe extern "C" fn dc_report_cell(
    comparison: *const FfiComparison,
    row: usize,
    col: usize,
) -> *mut c_char {
    if comparison.is_null() {
        return ptr::null_mut();
    }

    (&(*comparison)
        .inner
        .report
        .rows)
        .get(row)
        .and_then(|r| r.cells().get(col).map(|c| into_c_string(c)))
        .unwrap_or(ptr::null_mut())
}

/// Get the number of mismatching rows
///
/// # Safety
/// - `comparison` must be a valid pointer returned by `dc_compare`
#[no_mangle]
pub unsafe extern "C" fn dc_mismatch_count(comparison: *const FfiComparison) -> usize {
    if comparison.is_null() {
        return 0;
    }
    (*comparison).inner.stats.mismatch_count
}

/// Get the mismatch percentage (0-100, may exceed 100 with duplicate keys)
///
/// # Safety
/// - `comparison` must be a valid pointer returned by `dc_compare`
#[no_mangle]
pub unsafe extern "C" fn dc_mismatch_percentage(comparison: *const FfiComparison) -> f64 {
    if comparison.is_null() {
        return 0.0;
    }
    (*comparison).inner.stats.mismatch_percentage
}

/// Get the number of rows set aside for having an empty key
///
/// # Safety
/// - `comparison` must be a valid pointer returned by `dc_compare`
#[no_mangle]
pub unsafe extern "C" fn dc_empty_key_row_count(comparison: *const FfiComparison) -> usize {
    if comparison.is_null() {
        return 0;
    }
    (*comparison)
        .inner
        .empty_keys
        .as_ref()
        .map(|e| e.row_count())
        .unwrap_or(0)
}

/// Serialize the whole comparison as JSON
///
/// # Safety
/// - `comparison` must be a valid pointer returned by `dc_compare`
/// - Caller must free the returned string with `dc_free_string`
#[no_mangle]
pub unsafe extern "C" fn dc_comparison_json(comparison: *const FfiComparison) -> *mut c_char {
    if comparison.is_null() {
        return ptr::null_mut();
    }

    match serde_json::to_string(&(*comparison).inner) {
        Ok(json) => into_c_string(&json),
        Err(e) => {
            set_last_error(e.to_string());
            ptr::null_mut()
        }
    }
}

/// Get the message of the last error on this thread
///
/// Returns null if the last call succeeded.
/// Caller must free the returned string with `dc_free_string`.
#[no_mangle]
pub extern "C" fn dc_last_error() -> *mut c_char {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|s| s.clone().into_raw())
            .unwrap_or(ptr::null_mut())
    })
}

/// Free a string returned by other FFI functions
///
/// # Safety
/// - `s` must be a valid pointer returned by a dc_* function or null
#[no_mangle]
pub unsafe extern "C" fn dc_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
