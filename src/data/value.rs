//! Opaque values exchanged with the host and their typed conversions.

use super::lazy::LazyVector;
use super::matrix::ExpressionMatrix;
use crate::error::{QcError, QcResult};
use ndarray::Array2;
use std::convert::TryFrom;
use std::sync::Arc;

/// Element type tag for vector-like values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C)]
pub enum ElementType {
    Logical = 0,
    Integer = 1,
    Double = 2,
}

impl TryFrom<i32> for ElementType {
    type Error = QcError;

    fn try_from(tag: i32) -> QcResult<Self> {
        match tag {
            0 => Ok(ElementType::Logical),
            1 => Ok(ElementType::Integer),
            2 => Ok(ElementType::Double),
            other => Err(QcError::invalid(format!("unknown element type tag {}", other))),
        }
    }
}

/// A single typed element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Logical(bool),
    Integer(i32),
    Double(f64),
}

impl Scalar {
    /// Coerce a stored count into the requested element type.
    pub fn coerce(value: f64, ty: ElementType) -> Self {
        match ty {
            ElementType::Logical => Scalar::Logical(value != 0.0),
            ElementType::Integer => Scalar::Integer(value.trunc() as i32),
            ElementType::Double => Scalar::Double(value),
        }
    }
}

/// Generic boxed value handed across the routine boundary.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Logical(Vec<bool>),
    Integer(Vec<i32>),
    Real(Vec<f64>),
    /// Input count matrix, shared so lazy vectors can hold on to it.
    Matrix(Arc<ExpressionMatrix>),
    /// Dense numeric result matrix.
    NumericMatrix(Array2<f64>),
    List(Vec<(Option<String>, Value)>),
    LazyVector(LazyVector),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Logical(_) => "logical",
            Value::Integer(_) => "integer",
            Value::Real(_) => "double",
            Value::Matrix(_) => "matrix",
            Value::NumericMatrix(_) => "numeric matrix",
            Value::List(_) => "list",
            Value::LazyVector(_) => "lazy vector",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Value::Null => 0,
            Value::Logical(v) => v.len(),
            Value::Integer(v) => v.len(),
            Value::Real(v) => v.len(),
            Value::Matrix(m) => m.nrows() * m.ncols(),
            Value::NumericMatrix(m) => m.len(),
            Value::List(items) => items.len(),
            Value::LazyVector(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn matrix(m: impl Into<ExpressionMatrix>) -> Self {
        Value::Matrix(Arc::new(m.into()))
    }

    /// Build a named list.
    pub fn named_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Value::List(
            items
                .into_iter()
                .map(|(name, v)| (Some(name.into()), v))
                .collect(),
        )
    }

    /// Look up a list element by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::List(items) => items
                .iter()
                .find(|(n, _)| n.as_deref() == Some(name))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Positional list element.
    pub fn item(&self, index: usize) -> Option<&Value> {
        match self {
            Value::List(items) => items.get(index).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Unwrap a typed argument from an opaque value.
pub trait FromValue: Sized {
    fn from_value(value: &Value, arg: &'static str) -> QcResult<Self>;
}

/// Wrap a typed result back into an opaque value.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

fn mismatch(arg: &'static str, expected: &'static str, value: &Value) -> QcError {
    QcError::TypeMismatch {
        arg,
        expected,
        got: value.kind(),
    }
}

impl FromValue for Value {
    fn from_value(value: &Value, _arg: &'static str) -> QcResult<Self> {
        Ok(value.clone())
    }
}

impl FromValue for Arc<ExpressionMatrix> {
    fn from_value(value: &Value, arg: &'static str) -> QcResult<Self> {
        match value {
            Value::Matrix(m) => Ok(Arc::clone(m)),
            Value::NumericMatrix(m) => Ok(Arc::new(ExpressionMatrix::Dense(m.clone()))),
            other => Err(mismatch(arg, "matrix", other)),
        }
    }
}

impl FromValue for Vec<i32> {
    fn from_value(value: &Value, arg: &'static str) -> QcResult<Self> {
        match value {
            Value::Integer(v) => Ok(v.clone()),
            Value::Logical(v) => Ok(v.iter().map(|&b| b as i32).collect()),
            other => Err(mismatch(arg, "integer vector", other)),
        }
    }
}

impl FromValue for Vec<f64> {
    fn from_value(value: &Value, arg: &'static str) -> QcResult<Self> {
        match value {
            Value::Real(v) => Ok(v.clone()),
            Value::Integer(v) => Ok(v.iter().map(|&x| x as f64).collect()),
            other => Err(mismatch(arg, "numeric vector", other)),
        }
    }
}

fn single<T: Copy>(v: &[T], arg: &'static str) -> QcResult<T> {
    match v {
        [x] => Ok(*x),
        _ => Err(QcError::LengthMismatch {
            what: arg,
            expected: 1,
            got: v.len(),
        }),
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value, arg: &'static str) -> QcResult<Self> {
        match value {
            Value::Integer(v) => single(v, arg),
            Value::Logical(v) => single(v, arg).map(i32::from),
            Value::Real(v) => {
                let x = single(v, arg)?;
                // Whole numbers only; no silent truncation.
                if x.fract() != 0.0 || x < i32::MIN as f64 || x > i32::MAX as f64 {
                    return Err(QcError::invalid(format!("{} must be a whole number, got {}", arg, x)));
                }
                Ok(x as i32)
            }
            other => Err(mismatch(arg, "integer scalar", other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value, arg: &'static str) -> QcResult<Self> {
        match value {
            Value::Logical(v) => single(v, arg),
            Value::Integer(v) => single(v, arg).map(|x| x != 0),
            other => Err(mismatch(arg, "logical scalar", other)),
        }
    }
}

impl FromValue for Option<f64> {
    fn from_value(value: &Value, arg: &'static str) -> QcResult<Self> {
        match value {
            Value::Null => Ok(None),
            Value::Real(v) if v.len() == 1 => Ok(Some(v[0])),
            Value::Integer(v) if v.len() == 1 => Ok(Some(v[0] as f64)),
            Value::Real(v) => Err(QcError::LengthMismatch {
                what: arg,
                expected: 1,
                got: v.len(),
            }),
            Value::Integer(v) => Err(QcError::LengthMismatch {
                what: arg,
                expected: 1,
                got: v.len(),
            }),
            other => Err(mismatch(arg, "NULL or numeric scalar", other)),
        }
    }
}

/// Unnamed list whose elements are integer vectors.
impl FromValue for Vec<Vec<i32>> {
    fn from_value(value: &Value, arg: &'static str) -> QcResult<Self> {
        match value {
            Value::List(items) => items
                .iter()
                .map(|(_, v)| Vec::<i32>::from_value(v, arg))
                .collect(),
            Value::Null => Ok(Vec::new()),
            other => Err(mismatch(arg, "list of integer vectors", other)),
        }
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for Vec<f64> {
    fn into_value(self) -> Value {
        Value::Real(self)
    }
}

impl IntoValue for Vec<i32> {
    fn into_value(self) -> Value {
        Value::Integer(self)
    }
}

impl IntoValue for Vec<bool> {
    fn into_value(self) -> Value {
        Value::Logical(self)
    }
}

impl IntoValue for Array2<f64> {
    fn into_value(self) -> Value {
        Value::NumericMatrix(self)
    }
}

impl IntoValue for LazyVector {
    fn into_value(self) -> Value {
        Value::LazyVector(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_scalar_coercion() {
        assert_eq!(Scalar::coerce(2.7, ElementType::Integer), Scalar::Integer(2));
        assert_eq!(Scalar::coerce(-2.7, ElementType::Integer), Scalar::Integer(-2));
        assert_eq!(Scalar::coerce(0.0, ElementType::Logical), Scalar::Logical(false));
        assert_eq!(Scalar::coerce(0.5, ElementType::Logical), Scalar::Logical(true));
    }

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(i32::from_value(&Value::Integer(vec![4]), "idx").unwrap(), 4);
        assert_eq!(i32::from_value(&Value::Real(vec![3.0]), "idx").unwrap(), 3);

        let long = i32::from_value(&Value::Integer(vec![1, 99, 42]), "idx");
        assert!(matches!(
            long,
            Err(QcError::LengthMismatch { what: "idx", expected: 1, got: 3 })
        ));
        let long = bool::from_value(&Value::Logical(vec![true, false]), "getcol");
        assert!(matches!(long, Err(QcError::LengthMismatch { got: 2, .. })));

        for bad in [2.9, f64::NAN, f64::INFINITY, 1e12] {
            let r = i32::from_value(&Value::Real(vec![bad]), "type");
            assert!(matches!(r, Err(QcError::InvalidArgument(_))), "{} accepted", bad);
        }
        assert!(bool::from_value(&Value::Logical(vec![true]), "getcol").unwrap());

        let empty = i32::from_value(&Value::Integer(vec![]), "idx");
        assert!(matches!(empty, Err(QcError::LengthMismatch { what: "idx", .. })));

        let wrong = bool::from_value(&Value::Real(vec![1.0]), "getcol");
        assert!(matches!(
            wrong,
            Err(QcError::TypeMismatch { arg: "getcol", got: "double", .. })
        ));
    }

    #[test]
    fn test_limit_conversion() {
        assert_eq!(Option::<f64>::from_value(&Value::Null, "limit").unwrap(), None);
        assert_eq!(
            Option::<f64>::from_value(&Value::Real(vec![1.5]), "limit").unwrap(),
            Some(1.5)
        );
        assert!(Option::<f64>::from_value(&Value::Real(vec![1.0, 2.0]), "limit").is_err());
    }

    #[test]
    fn test_matrix_conversion() {
        let v = Value::matrix(array![[1.0, 2.0]]);
        let m = Arc::<ExpressionMatrix>::from_value(&v, "matrix").unwrap();
        assert_eq!((m.nrows(), m.ncols()), (1, 2));

        assert!(Arc::<ExpressionMatrix>::from_value(&Value::Null, "matrix").is_err());
    }

    #[test]
    fn test_list_access() {
        let list = Value::named_list([("sum", Value::Real(vec![1.0])), ("detected", Value::Integer(vec![1]))]);
        assert_eq!(list.len(), 2);
        assert!(matches!(list.field("detected"), Some(Value::Integer(_))));
        assert!(list.field("missing").is_none());
        assert!(matches!(list.item(0), Some(Value::Real(_))));

        let subsets = Value::List(vec![(None, Value::Integer(vec![0, 1])), (None, Value::Integer(vec![2]))]);
        let parsed = Vec::<Vec<i32>>::from_value(&subsets, "subsets").unwrap();
        assert_eq!(parsed, vec![vec![0, 1], vec![2]]);
    }
}
