//! Scalar coercion: converting an input scalar to a node's target kind.

use shapecast_core::{html_escape, ScalarKind, Value};

/// Why a scalar could not be coerced. Only surfaced in debug logs; callers
/// report it as an invalid-type error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Mismatch {
    pub target: &'static str,
    pub found: &'static str,
}

impl Mismatch {
    fn new(target: ScalarKind, found: &Value) -> Self {
        Self {
            target: target.name(),
            found: found.kind_name(),
        }
    }
}

/// Coerces `input` to `target`.
///
/// Numbers convert between kinds when the value fits, floats to integers only
/// when integral. Strings parse to numbers, to `true` / `false` (any case), or
/// to a single character. Scalars convert to strings through their textual
/// form, HTML-escaped when `escape` is set. `Any` passes the input through.
pub(crate) fn coerce(input: &Value, target: ScalarKind, escape: bool) -> Result<Value, Mismatch> {
    match target {
        ScalarKind::Any => Ok(input.clone()),
        ScalarKind::Bool => to_bool(input).map(Value::Bool),
        ScalarKind::String => {
            let text = input.to_text().ok_or_else(|| Mismatch::new(target, input))?;
            Ok(Value::String(if escape { html_escape(&text) } else { text }))
        }
        ScalarKind::Char => match input {
            Value::String(s) if s.chars().count() == 1 => Ok(input.clone()),
            _ => Err(Mismatch::new(target, input)),
        },
        ScalarKind::F32 | ScalarKind::F64 => to_float(input, target).map(Value::Float),
        _ => to_int(input, target).map(Value::Int),
    }
}

fn to_bool(input: &Value) -> Result<bool, Mismatch> {
    match input {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(Mismatch::new(ScalarKind::Bool, input)),
    }
}

fn to_int(input: &Value, target: ScalarKind) -> Result<i64, Mismatch> {
    let mismatch = || Mismatch::new(target, input);
    let (lo, hi) = target.int_range().ok_or_else(mismatch)?;

    let n = match input {
        Value::Int(n) => *n,
        Value::Float(f) => integral(*f).ok_or_else(mismatch)?,
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(n) => n,
                Err(_) => s
                    .parse::<f64>()
                    .ok()
                    .and_then(integral)
                    .ok_or_else(mismatch)?,
            }
        }
        _ => return Err(mismatch()),
    };

    if (lo..=hi).contains(&n) {
        Ok(n)
    } else {
        Err(mismatch())
    }
}

fn integral(f: f64) -> Option<i64> {
    // 2^63 as f64; anything at or above it does not fit.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (f.is_finite() && f.fract() == 0.0 && f >= -LIMIT && f < LIMIT).then(|| f as i64)
}

fn to_float(input: &Value, target: ScalarKind) -> Result<f64, Mismatch> {
    let f = match input {
        Value::Int(n) => *n as f64,
        Value::Float(f) => *f,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| Mismatch::new(target, input))?,
        _ => return Err(Mismatch::new(target, input)),
    };

    if target == ScalarKind::F32 && f.is_finite() && f.abs() > f64::from(f32::MAX) {
        return Err(Mismatch::new(target, input));
    }
    Ok(f)
}
