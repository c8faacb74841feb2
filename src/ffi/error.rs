//! Thread-local last error message for C callers.

use super::types::QcStatus;
use crate::error::QcError;
use std::cell::RefCell;
use std::ffi::c_char;

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

pub(crate) fn set_last_error(message: impl Into<String>) {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(message.into()));
}

pub(crate) fn clear_last_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

/// Record `err` and return its status code.
pub(crate) fn report(err: &QcError) -> QcStatus {
    set_last_error(err.to_string());
    QcStatus::from(err)
}

/// Copy the calling thread's last error message into a buffer.
///
/// The copy is truncated to fit and always NUL-terminated. `out_len`
/// receives the full message length (0 when there is no error).
///
/// # Safety
/// buffer must have room for `buffer_len` bytes; out_len must be valid.
#[no_mangle]
pub unsafe extern "C" fn qc_last_error_message(
    buffer: *mut c_char,
    buffer_len: usize,
    out_len: *mut usize,
) -> QcStatus {
    if buffer.is_null() || out_len.is_null() || buffer_len == 0 {
        return QcStatus::NullPointer;
    }

    LAST_ERROR.with(|slot| {
        let slot = slot.borrow();
        let message = slot.as_deref().unwrap_or("");
        let bytes = message.as_bytes();
        let copy_len = bytes.len().min(buffer_len - 1);

        std::ptr::copy_nonoverlapping(bytes.as_ptr(), buffer as *mut u8, copy_len);
        *buffer.add(copy_len) = 0;
        *out_len = bytes.len();
    });

    QcStatus::Ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_truncated_copy() {
        set_last_error("index 12 out of bounds");
        let mut buf = [0 as c_char; 6];
        let mut len = 0usize;
        unsafe {
            assert_eq!(qc_last_error_message(buf.as_mut_ptr(), buf.len(), &mut len), QcStatus::Ok);
            assert_eq!(CStr::from_ptr(buf.as_ptr()).to_str().unwrap(), "index");
        }
        assert_eq!(len, 22);

        clear_last_error();
        unsafe {
            qc_last_error_message(buf.as_mut_ptr(), buf.len(), &mut len);
        }
        assert_eq!(len, 0);
    }
}
