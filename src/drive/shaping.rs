// src/drive/shaping.rs - Joystick response curves
//! Response curves mapping a raw axis reading in `[-1, 1]` onto a drive
//! command in `[-1, 1]`.
//!
//! Gentle curves give the driver finer control near centre stick without
//! giving up full speed at the end of travel.
use crate::dashboard::Dashboard;
use crate::tools::{limit, sign};

/// Curvature used by the double-exponential curve.
pub const DOUBLE_EXPONENTIAL_A: f64 = 0.607;

const EPSILON: f64 = 0.00001;

pub const SHAPING_LABEL: &str = "(SHAPING FUNCTION) <<";
pub const BEZIER_A_LABEL: &str = "(BEZIER A) <<";
pub const BEZIER_B_LABEL: &str = "(BEZIER B) <<";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Curve {
    Square,
    PiecewiseLinear,
    /// Seat-shaped curve with curvature `a` in (0, 1).
    DoubleExponential { a: f64 },
    /// Quadratic Bezier through (0, 0) and (1, 1) with control point (a, b).
    Bezier { a: f64, b: f64 },
}

impl Curve {
    /// Curve for a dashboard mode number: 0 square, 1 piecewise linear,
    /// 2 double exponential, 3 bezier. Anything else has no curve.
    pub fn from_mode(mode: i64, bezier_a: f64, bezier_b: f64) -> Option<Curve> {
        match mode {
            0 => Some(Curve::Square),
            1 => Some(Curve::PiecewiseLinear),
            2 => Some(Curve::DoubleExponential { a: DOUBLE_EXPONENTIAL_A }),
            3 => Some(Curve::Bezier { a: bezier_a, b: bezier_b }),
            _ => None,
        }
    }

    pub fn apply(&self, x: f64) -> f64 {
        let x = limit(x, -1.0, 1.0);
        let y = match *self {
            Curve::Square => square(x),
            Curve::PiecewiseLinear => piecewise_linear(x),
            Curve::DoubleExponential { a } => double_exponential(x, a),
            Curve::Bezier { a, b } => sign(x) * bezier(x.abs(), a, b),
        };
        limit(y, -1.0, 1.0)
    }
}

pub fn square(x: f64) -> f64 {
    sign(x) * x * x
}

/// Eight straight segments, mirrored about the origin.
pub fn piecewise_linear(x: f64) -> f64 {
    let magnitude = x.abs();
    let y = if magnitude <= 0.32 {
        0.375 * magnitude
    } else if magnitude <= 0.6 {
        0.679 * magnitude - 0.097
    } else if magnitude <= 0.86 {
        1.269 * magnitude - 0.45
    } else {
        2.571 * magnitude - 1.57
    };
    sign(x) * y
}

pub fn double_exponential(x: f64, a: f64) -> f64 {
    let a = limit(a, EPSILON, 1.0 - EPSILON);
    let exponent = 1.0 - a;
    if x == 0.0 {
        0.0
    } else if x > 0.0 && x <= 0.5 {
        (2.0 * x).powf(exponent) / 2.0
    } else if x < 0.0 && x > -0.5 {
        -((2.0 * -x).powf(exponent) / 2.0)
    } else if x <= -0.5 {
        -(1.0 - (2.0 * (1.0 + x)).powf(exponent) / 2.0)
    } else {
        1.0 - (2.0 * (1.0 - x)).powf(exponent) / 2.0
    }
}

/// Solves the curve parameter for `x` in `[0, 1]`, then evaluates `y`.
pub fn bezier(x: f64, a: f64, b: f64) -> f64 {
    let mut a = limit(a, 0.0, 1.0);
    let b = limit(b, 0.0, 1.0);
    if a == 0.5 {
        a += EPSILON;
    }
    let one_minus_2a = 1.0 - 2.0 * a;
    let discriminant = (a * a + one_minus_2a * x).max(0.0);
    let t = (discriminant.sqrt() - a) / one_minus_2a;
    (1.0 - 2.0 * b) * t * t + 2.0 * b * t
}

/// Dashboard-selected shaping shared by the joystick controllers.
#[derive(Debug, Clone, Copy)]
pub struct Shaper;

impl Shaper {
    /// Publishes the operator-editable shaping fields.
    pub fn register(dashboard: &mut Dashboard, mode: i64, bezier_a: f64, bezier_b: f64) {
        dashboard.put_string(SHAPING_LABEL, &mode.to_string());
        dashboard.put_string(BEZIER_A_LABEL, &format!("{:.3}", bezier_a));
        dashboard.put_string(BEZIER_B_LABEL, &format!("{:.3}", bezier_b));
    }

    /// The curve currently selected on the dashboard.
    pub fn current(dashboard: &mut Dashboard) -> Option<Curve> {
        let mode = dashboard.integer(SHAPING_LABEL, 0);
        let a = dashboard.number(BEZIER_A_LABEL, 0.94);
        let b = dashboard.number(BEZIER_B_LABEL, 0.28);
        Curve::from_mode(mode, a, b)
    }

    /// Shapes `x` with the selected curve; 0.0 when the mode is unknown.
    pub fn shape(dashboard: &mut Dashboard, x: f64) -> f64 {
        match Self::current(dashboard) {
            Some(curve) => curve.apply(x),
            None => 0.0,
        }
    }
}
