//! Forwarding entry points registered in the routine table.
//!
//! Each entry point unwraps its arguments, calls the matching kernel and
//! wraps the result. Arity has already been checked by the dispatcher.

use super::module::{Module, PACKAGE};
use super::registry::{ModuleInfo, RoutineDef};
use crate::data::{ElementType, ExpressionMatrix, FromValue, IntoValue, LazyVectorClass, MatrixClass, Value};
use crate::error::QcResult;
use crate::kernel;
use std::convert::TryFrom;
use std::sync::Arc;
use tracing::debug;

/// The routine table installed at module load.
pub static CALL_ENTRIES: [RoutineDef; 5] = [
    RoutineDef {
        name: "_scaterrs_create_lazy_vector",
        func: create_lazy_vector,
        arity: 6,
    },
    RoutineDef {
        name: "_scaterrs_per_cell_qc",
        func: per_cell_qc,
        arity: 4,
    },
    RoutineDef {
        name: "_scaterrs_per_feature_qc",
        func: per_feature_qc,
        arity: 3,
    },
    RoutineDef {
        name: "_scaterrs_top_cumprop",
        func: top_cumprop,
        arity: 2,
    },
    RoutineDef {
        name: "_scaterrs_sum_row_counts",
        func: sum_row_counts,
        arity: 3,
    },
];

/// Install the lazy vector class into a loading module.
pub fn init_lazy_vector(info: &mut ModuleInfo) {
    let class = LazyVectorClass::new(PACKAGE);
    debug!(class = class.name, package = class.package, "lazy vector class installed");
    info.install_lazy_class(class);
}

fn create_lazy_vector(module: &Module, args: &[Value]) -> QcResult<Value> {
    let matrix = Arc::<ExpressionMatrix>::from_value(&args[0], "mat")?;
    let dims = Vec::<i32>::from_value(&args[1], "dim")?;
    let index = i32::from_value(&args[2], "idx")?;
    let get_column = bool::from_value(&args[3], "getcol")?;
    let class = MatrixClass::try_from(i32::from_value(&args[4], "matclass")?)?;
    let element_type = ElementType::try_from(i32::from_value(&args[5], "type")?)?;

    let vector = module
        .lazy_class()?
        .create(matrix, &dims, index, get_column, class, element_type)?;
    Ok(vector.into_value())
}

fn per_cell_qc(module: &Module, args: &[Value]) -> QcResult<Value> {
    let matrix = Arc::<ExpressionMatrix>::from_value(&args[0], "matrix")?;
    let subsets = Vec::<Vec<i32>>::from_value(&args[1], "featcon")?;
    let top = Vec::<i32>::from_value(&args[2], "top")?;
    let limit = Option::<f64>::from_value(&args[3], "limit")?;

    let qc = kernel::per_cell_qc(&matrix, &subsets, &top, limit, module.config())?;
    Ok(qc.into_value())
}

fn per_feature_qc(module: &Module, args: &[Value]) -> QcResult<Value> {
    let matrix = Arc::<ExpressionMatrix>::from_value(&args[0], "matrix")?;
    let subsets = Vec::<Vec<i32>>::from_value(&args[1], "cellcon")?;
    let limit = Option::<f64>::from_value(&args[2], "limit")?;

    let qc = kernel::per_feature_qc(&matrix, &subsets, limit, module.config())?;
    Ok(qc.into_value())
}

fn top_cumprop(module: &Module, args: &[Value]) -> QcResult<Value> {
    let matrix = Arc::<ExpressionMatrix>::from_value(&args[0], "matrix")?;
    let top = Vec::<i32>::from_value(&args[1], "top")?;

    Ok(kernel::top_cumprop(&matrix, &top, module.config())?.into_value())
}

fn sum_row_counts(module: &Module, args: &[Value]) -> QcResult<Value> {
    let counts = Arc::<ExpressionMatrix>::from_value(&args[0], "counts")?;
    let genes = Vec::<i32>::from_value(&args[1], "genes")?;
    let runs = Vec::<i32>::from_value(&args[2], "runs")?;

    Ok(kernel::sum_row_counts(&counts, &genes, &runs, module.config())?.into_value())
}
