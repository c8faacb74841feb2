//! FFI functions for module loading and routine calls.

use super::error::{clear_last_error, report, set_last_error};
use super::types::{CQcConfig, QcStatus};
use super::value::ValueHandle;
use crate::data::Value;
use crate::runtime::{init_with_config, module, QcConfig};
use std::ffi::{c_char, c_int, CStr};

/// Load the module: register routines, disable dynamic lookup and install
/// the lazy vector class. Later calls are no-ops.
///
/// # Safety
/// config must be valid or null (null selects defaults).
#[no_mangle]
pub unsafe extern "C" fn qc_module_init(config: *const CQcConfig) -> QcStatus {
    let cfg = if config.is_null() {
        QcConfig::default()
    } else {
        (*config).clone().into()
    };
    init_with_config(cfg);
    QcStatus::Ok
}

/// Call a registered routine.
///
/// On success `out_handle` receives a new value the caller must free. On
/// failure the message is available from `qc_last_error_message`.
///
/// # Safety
/// name must be a NUL-terminated string; args must hold `nargs` valid handles.
#[no_mangle]
pub unsafe extern "C" fn qc_call(
    name: *const c_char,
    args: *const ValueHandle,
    nargs: usize,
    out_handle: *mut ValueHandle,
) -> QcStatus {
    if name.is_null() || out_handle.is_null() || (args.is_null() && nargs > 0) {
        set_last_error("null pointer passed to qc_call");
        return QcStatus::NullPointer;
    }
    let name = match CStr::from_ptr(name).to_str() {
        Ok(s) => s,
        Err(_) => {
            set_last_error("routine name is not valid UTF-8");
            return QcStatus::InvalidUtf8;
        }
    };

    let handles = if nargs == 0 {
        &[][..]
    } else {
        std::slice::from_raw_parts(args, nargs)
    };
    if handles.iter().any(|h| h.is_null()) {
        set_last_error("null argument handle");
        return QcStatus::NullPointer;
    }
    let values: Vec<Value> = handles.iter().map(|&h| (*h).clone()).collect();

    match module().call(name, &values) {
        Ok(value) => {
            clear_last_error();
            *out_handle = Box::into_raw(Box::new(value));
            QcStatus::Ok
        }
        Err(e) => report(&e),
    }
}

/// Number of registered routines.
#[no_mangle]
pub extern "C" fn qc_routine_count() -> usize {
    module().info().routines().len()
}

/// Declared arity of a registered routine, or -1 if it does not resolve.
///
/// # Safety
/// name must be a NUL-terminated string or null.
#[no_mangle]
pub unsafe extern "C" fn qc_routine_arity(name: *const c_char) -> c_int {
    if name.is_null() {
        return -1;
    }
    let name = match CStr::from_ptr(name).to_str() {
        Ok(s) => s,
        Err(_) => return -1,
    };
    match module().resolve(name) {
        Ok(def) => def.arity as c_int,
        Err(_) => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::value::{qc_value_dense_matrix, qc_value_free, qc_value_integer, qc_value_matrix_copy};
    use crate::ffi::qc_last_error_message;
    use std::ptr;

    fn cstr(s: &str) -> std::ffi::CString {
        std::ffi::CString::new(s).unwrap()
    }

    #[test]
    fn test_table_introspection() {
        unsafe {
            assert_eq!(qc_module_init(ptr::null()), QcStatus::Ok);
            assert_eq!(qc_routine_count(), 5);
            assert_eq!(qc_routine_arity(cstr("_scaterrs_create_lazy_vector").as_ptr()), 6);
            assert_eq!(qc_routine_arity(cstr("_scaterrs_per_cell_qc").as_ptr()), 4);
            assert_eq!(qc_routine_arity(cstr("per_cell_qc").as_ptr()), -1);
        }
    }

    #[test]
    fn test_sum_row_counts_over_c_abi() {
        // 3 x 2, column-major
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let genes = [0, 2, 1];
        let runs = [2, 1];
        unsafe {
            let mut args: [ValueHandle; 3] = [ptr::null_mut(); 3];
            assert_eq!(qc_value_dense_matrix(data.as_ptr(), 3, 2, &mut args[0]), QcStatus::Ok);
            assert_eq!(qc_value_integer(genes.as_ptr(), 3, &mut args[1]), QcStatus::Ok);
            assert_eq!(qc_value_integer(runs.as_ptr(), 2, &mut args[2]), QcStatus::Ok);

            let mut out: ValueHandle = ptr::null_mut();
            let name = cstr("_scaterrs_sum_row_counts");
            assert_eq!(qc_call(name.as_ptr(), args.as_ptr(), 3, &mut out), QcStatus::Ok);

            let mut sums = [0.0; 4];
            assert_eq!(qc_value_matrix_copy(out, sums.as_mut_ptr(), 4), QcStatus::Ok);
            assert_eq!(sums, [4.0, 2.0, 10.0, 5.0]);
            qc_value_free(out);

            // Too few arguments.
            assert_eq!(qc_call(name.as_ptr(), args.as_ptr(), 2, &mut out), QcStatus::ArityMismatch);

            for h in args {
                qc_value_free(h);
            }
        }
    }

    #[test]
    fn test_errors_reported_not_raised() {
        let bad_genes = [0, 7];
        let runs = [2];
        let data = [1.0, 2.0];
        unsafe {
            let mut args: [ValueHandle; 3] = [ptr::null_mut(); 3];
            qc_value_dense_matrix(data.as_ptr(), 2, 1, &mut args[0]);
            qc_value_integer(bad_genes.as_ptr(), 2, &mut args[1]);
            qc_value_integer(runs.as_ptr(), 1, &mut args[2]);

            let mut out: ValueHandle = ptr::null_mut();
            let status = qc_call(cstr("_scaterrs_sum_row_counts").as_ptr(), args.as_ptr(), 3, &mut out);
            assert_eq!(status, QcStatus::IndexOutOfBounds);
            assert!(out.is_null());

            let mut buf = [0 as c_char; 128];
            let mut len = 0;
            qc_last_error_message(buf.as_mut_ptr(), buf.len(), &mut len);
            let msg = CStr::from_ptr(buf.as_ptr()).to_str().unwrap();
            assert!(msg.contains("index 7"), "{}", msg);

            let status = qc_call(cstr("sum_row_counts").as_ptr(), args.as_ptr(), 3, &mut out);
            assert_eq!(status, QcStatus::UnknownRoutine);

            for h in args {
                qc_value_free(h);
            }
        }
    }
}
