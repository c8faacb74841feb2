//! FFI functions for building and reading values.

use super::error::set_last_error;
use super::types::{CArrayView, CIntArrayView, QcStatus, QcValueKind};
use crate::data::{CscMatrix, Value};
use ndarray::{Array2, ShapeBuilder};
use std::ffi::{c_char, CStr};

/// Opaque handle to a Value.
pub type ValueHandle = *mut Value;

unsafe fn store(value: Value, out_handle: *mut ValueHandle) -> QcStatus {
    *out_handle = Box::into_raw(Box::new(value));
    QcStatus::Ok
}

unsafe fn slice_or_empty<'a, T>(data: *const T, len: usize) -> Option<&'a [T]> {
    if len == 0 {
        Some(&[])
    } else if data.is_null() {
        None
    } else {
        Some(std::slice::from_raw_parts(data, len))
    }
}

/// Create a NULL value.
///
/// # Safety
/// out_handle must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn qc_value_null(out_handle: *mut ValueHandle) -> QcStatus {
    if out_handle.is_null() {
        return QcStatus::NullPointer;
    }
    store(Value::Null, out_handle)
}

/// Create a logical vector.
///
/// # Safety
/// data must hold `len` elements (may be null when `len` is 0).
#[no_mangle]
pub unsafe extern "C" fn qc_value_logical(
    data: *const bool,
    len: usize,
    out_handle: *mut ValueHandle,
) -> QcStatus {
    if out_handle.is_null() {
        return QcStatus::NullPointer;
    }
    match slice_or_empty(data, len) {
        Some(s) => store(Value::Logical(s.to_vec()), out_handle),
        None => QcStatus::NullPointer,
    }
}

/// Create an integer vector.
///
/// # Safety
/// data must hold `len` elements (may be null when `len` is 0).
#[no_mangle]
pub unsafe extern "C" fn qc_value_integer(
    data: *const i32,
    len: usize,
    out_handle: *mut ValueHandle,
) -> QcStatus {
    if out_handle.is_null() {
        return QcStatus::NullPointer;
    }
    match slice_or_empty(data, len) {
        Some(s) => store(Value::Integer(s.to_vec()), out_handle),
        None => QcStatus::NullPointer,
    }
}

/// Create a double vector.
///
/// # Safety
/// data must hold `len` elements (may be null when `len` is 0).
#[no_mangle]
pub unsafe extern "C" fn qc_value_real(
    data: *const f64,
    len: usize,
    out_handle: *mut ValueHandle,
) -> QcStatus {
    if out_handle.is_null() {
        return QcStatus::NullPointer;
    }
    match slice_or_empty(data, len) {
        Some(s) => store(Value::Real(s.to_vec()), out_handle),
        None => QcStatus::NullPointer,
    }
}

/// Create a dense count matrix from column-major data.
///
/// # Safety
/// data must hold `nrow * ncol` elements.
#[no_mangle]
pub unsafe extern "C" fn qc_value_dense_matrix(
    data: *const f64,
    nrow: usize,
    ncol: usize,
    out_handle: *mut ValueHandle,
) -> QcStatus {
    if out_handle.is_null() {
        return QcStatus::NullPointer;
    }
    let len = match nrow.checked_mul(ncol) {
        Some(len) => len,
        None => return QcStatus::InvalidArgument,
    };
    let values = match slice_or_empty(data, len) {
        Some(s) => s.to_vec(),
        None => return QcStatus::NullPointer,
    };
    match Array2::from_shape_vec((nrow, ncol).f(), values) {
        Ok(m) => store(Value::matrix(m), out_handle),
        Err(e) => {
            set_last_error(format!("invalid matrix shape: {}", e));
            QcStatus::LengthMismatch
        }
    }
}

/// Create a sparse (CSC) count matrix.
///
/// # Safety
/// col_ptrs must hold `ncol + 1` elements; row_indices and values `nnz`.
#[no_mangle]
pub unsafe extern "C" fn qc_value_sparse_matrix(
    nrow: usize,
    ncol: usize,
    col_ptrs: *const usize,
    row_indices: *const usize,
    values: *const f64,
    nnz: usize,
    out_handle: *mut ValueHandle,
) -> QcStatus {
    if out_handle.is_null() || col_ptrs.is_null() {
        return QcStatus::NullPointer;
    }
    let (rows, vals) = match (slice_or_empty(row_indices, nnz), slice_or_empty(values, nnz)) {
        (Some(r), Some(v)) => (r.to_vec(), v.to_vec()),
        _ => return QcStatus::NullPointer,
    };
    let ptr_len = match ncol.checked_add(1) {
        Some(n) => n,
        None => return QcStatus::InvalidArgument,
    };
    let ptrs = std::slice::from_raw_parts(col_ptrs, ptr_len).to_vec();

    match CscMatrix::new(nrow, ncol, ptrs, rows, vals) {
        Ok(m) => store(Value::matrix(m), out_handle),
        Err(e) => {
            let status = QcStatus::from(&e);
            set_last_error(e.to_string());
            status
        }
    }
}

/// Create an unnamed list from copies of the given values.
///
/// # Safety
/// items must hold `len` valid handles. The items remain owned by the caller.
#[no_mangle]
pub unsafe extern "C" fn qc_value_list(
    items: *const ValueHandle,
    len: usize,
    out_handle: *mut ValueHandle,
) -> QcStatus {
    if out_handle.is_null() {
        return QcStatus::NullPointer;
    }
    let handles = match slice_or_empty(items, len) {
        Some(h) => h,
        None => return QcStatus::NullPointer,
    };
    if handles.iter().any(|h| h.is_null()) {
        return QcStatus::NullPointer;
    }
    let list = handles.iter().map(|&h| (None, (*h).clone())).collect();
    store(Value::List(list), out_handle)
}

/// Free a value handle.
///
/// # Safety
/// Handle must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn qc_value_free(handle: ValueHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Kind of the value behind a handle.
///
/// # Safety
/// Handle must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn qc_value_kind(handle: ValueHandle) -> QcValueKind {
    if handle.is_null() {
        return QcValueKind::Null;
    }
    QcValueKind::from(&*handle)
}

/// Number of elements (list items, vector elements, matrix cells).
///
/// # Safety
/// Handle must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn qc_value_length(handle: ValueHandle) -> usize {
    if handle.is_null() {
        return 0;
    }
    (*handle).len()
}

/// View of a double vector.
///
/// # Safety
/// Handle must be valid. Returned view is valid until the value is freed.
#[no_mangle]
pub unsafe extern "C" fn qc_value_real_view(handle: ValueHandle) -> CArrayView {
    if handle.is_null() {
        return CArrayView::empty();
    }
    match &*handle {
        Value::Real(v) => CArrayView {
            data: v.as_ptr(),
            len: v.len(),
        },
        _ => CArrayView::empty(),
    }
}

/// View of an integer vector.
///
/// # Safety
/// Handle must be valid. Returned view is valid until the value is freed.
#[no_mangle]
pub unsafe extern "C" fn qc_value_integer_view(handle: ValueHandle) -> CIntArrayView {
    if handle.is_null() {
        return CIntArrayView::empty();
    }
    match &*handle {
        Value::Integer(v) => CIntArrayView {
            data: v.as_ptr(),
            len: v.len(),
        },
        _ => CIntArrayView::empty(),
    }
}

/// Dimensions of a matrix value.
///
/// # Safety
/// All pointers must be valid.
#[no_mangle]
pub unsafe extern "C" fn qc_value_matrix_dims(
    handle: ValueHandle,
    out_nrow: *mut usize,
    out_ncol: *mut usize,
) -> QcStatus {
    if handle.is_null() || out_nrow.is_null() || out_ncol.is_null() {
        return QcStatus::NullPointer;
    }
    let (nrow, ncol) = match &*handle {
        Value::Matrix(m) => (m.nrows(), m.ncols()),
        Value::NumericMatrix(m) => m.dim(),
        _ => return QcStatus::TypeMismatch,
    };
    *out_nrow = nrow;
    *out_ncol = ncol;
    QcStatus::Ok
}

/// Copy a numeric result matrix in column-major order.
///
/// # Safety
/// out must have room for `out_len` elements.
#[no_mangle]
pub unsafe extern "C" fn qc_value_matrix_copy(
    handle: ValueHandle,
    out: *mut f64,
    out_len: usize,
) -> QcStatus {
    if handle.is_null() || out.is_null() {
        return QcStatus::NullPointer;
    }
    let m = match &*handle {
        Value::NumericMatrix(m) => m,
        _ => return QcStatus::TypeMismatch,
    };
    if out_len < m.len() {
        return QcStatus::LengthMismatch;
    }
    let dst = std::slice::from_raw_parts_mut(out, m.len());
    for (slot, v) in dst.iter_mut().zip(m.t().iter()) {
        *slot = *v;
    }
    QcStatus::Ok
}

/// Copy of the `index`-th list element.
///
/// # Safety
/// Handle and out_handle must be valid.
#[no_mangle]
pub unsafe extern "C" fn qc_value_list_get(
    handle: ValueHandle,
    index: usize,
    out_handle: *mut ValueHandle,
) -> QcStatus {
    if handle.is_null() || out_handle.is_null() {
        return QcStatus::NullPointer;
    }
    match (*handle).item(index) {
        Some(v) => store(v.clone(), out_handle),
        None if matches!(&*handle, Value::List(_)) => QcStatus::IndexOutOfBounds,
        None => QcStatus::TypeMismatch,
    }
}

/// Copy of the list element named `name`.
///
/// # Safety
/// Handle, name and out_handle must be valid.
#[no_mangle]
pub unsafe extern "C" fn qc_value_list_get_named(
    handle: ValueHandle,
    name: *const c_char,
    out_handle: *mut ValueHandle,
) -> QcStatus {
    if handle.is_null() || name.is_null() || out_handle.is_null() {
        return QcStatus::NullPointer;
    }
    let name = match CStr::from_ptr(name).to_str() {
        Ok(s) => s,
        Err(_) => return QcStatus::InvalidUtf8,
    };
    match (*handle).field(name) {
        Some(v) => store(v.clone(), out_handle),
        None => QcStatus::InvalidArgument,
    }
}

/// Materialize a lazy vector into a plain vector value.
///
/// # Safety
/// Handle and out_handle must be valid.
#[no_mangle]
pub unsafe extern "C" fn qc_value_materialize(
    handle: ValueHandle,
    out_handle: *mut ValueHandle,
) -> QcStatus {
    if handle.is_null() || out_handle.is_null() {
        return QcStatus::NullPointer;
    }
    match &*handle {
        Value::LazyVector(v) => store(v.materialize(), out_handle),
        _ => QcStatus::TypeMismatch,
    }
}

/// Read a region of a lazy vector as doubles.
///
/// # Safety
/// out must have room for `out_len` elements.
#[no_mangle]
pub unsafe extern "C" fn qc_lazy_vector_get_region(
    handle: ValueHandle,
    start: usize,
    out: *mut f64,
    out_len: usize,
    out_count: *mut usize,
) -> QcStatus {
    if handle.is_null() || out.is_null() || out_count.is_null() {
        return QcStatus::NullPointer;
    }
    match &*handle {
        Value::LazyVector(v) => {
            let buf = std::slice::from_raw_parts_mut(out, out_len);
            *out_count = v.get_region(start, buf);
            QcStatus::Ok
        }
        _ => QcStatus::TypeMismatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn test_dense_matrix_is_column_major() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut h: ValueHandle = ptr::null_mut();
        unsafe {
            assert_eq!(qc_value_dense_matrix(data.as_ptr(), 2, 3, &mut h), QcStatus::Ok);
            assert_eq!(qc_value_kind(h), QcValueKind::Matrix);
            match &*h {
                Value::Matrix(m) => {
                    assert_eq!(m.get(1, 0), 2.0);
                    assert_eq!(m.get(0, 2), 5.0);
                }
                other => panic!("unexpected {:?}", other),
            }
            let (mut r, mut c) = (0, 0);
            assert_eq!(qc_value_matrix_dims(h, &mut r, &mut c), QcStatus::Ok);
            assert_eq!((r, c), (2, 3));
            qc_value_free(h);
        }
    }

    #[test]
    fn test_sparse_matrix_validation() {
        let ptrs = [0usize, 1, 1];
        let rows = [5usize];
        let vals = [1.0];
        let mut h: ValueHandle = ptr::null_mut();
        unsafe {
            let status =
                qc_value_sparse_matrix(2, 2, ptrs.as_ptr(), rows.as_ptr(), vals.as_ptr(), 1, &mut h);
            assert_eq!(status, QcStatus::IndexOutOfBounds);
            assert!(h.is_null());
        }
    }

    #[test]
    fn test_sparse_matrix_bad_pointers_return_status() {
        let ptrs = [0usize, 5, 1];
        let rows = [0usize];
        let vals = [1.0];
        let mut h: ValueHandle = ptr::null_mut();
        unsafe {
            let status =
                qc_value_sparse_matrix(3, 2, ptrs.as_ptr(), rows.as_ptr(), vals.as_ptr(), 1, &mut h);
            assert_eq!(status, QcStatus::InvalidArgument);
            assert!(h.is_null());

            let status = qc_value_sparse_matrix(
                3,
                usize::MAX,
                ptrs.as_ptr(),
                rows.as_ptr(),
                vals.as_ptr(),
                1,
                &mut h,
            );
            assert_eq!(status, QcStatus::InvalidArgument);
            assert!(h.is_null());
        }
    }

    #[test]
    fn test_list_copies_items() {
        let ints = [1, 2, 3];
        unsafe {
            let mut a: ValueHandle = ptr::null_mut();
            let mut list: ValueHandle = ptr::null_mut();
            assert_eq!(qc_value_integer(ints.as_ptr(), 3, &mut a), QcStatus::Ok);
            assert_eq!(qc_value_list(&a, 1, &mut list), QcStatus::Ok);
            qc_value_free(a);

            assert_eq!(qc_value_length(list), 1);
            let mut item: ValueHandle = ptr::null_mut();
            assert_eq!(qc_value_list_get(list, 0, &mut item), QcStatus::Ok);
            let view = qc_value_integer_view(item);
            assert_eq!(std::slice::from_raw_parts(view.data, view.len), &ints);
            assert_eq!(qc_value_list_get(list, 4, &mut item), QcStatus::IndexOutOfBounds);

            qc_value_free(item);
            qc_value_free(list);
        }
    }

    #[test]
    fn test_null_pointers() {
        unsafe {
            assert_eq!(qc_value_null(ptr::null_mut()), QcStatus::NullPointer);
            let mut h: ValueHandle = ptr::null_mut();
            assert_eq!(qc_value_real(ptr::null(), 3, &mut h), QcStatus::NullPointer);
            assert_eq!(qc_value_real(ptr::null(), 0, &mut h), QcStatus::Ok);
            assert_eq!(qc_value_length(h), 0);
            qc_value_free(h);
            assert_eq!(qc_value_kind(ptr::null_mut()), QcValueKind::Null);
        }
    }
}
