//! Numeric helpers shared by the grid builders and the solar geometry model.

/// Assert that the percentage deviation between two values stays below a threshold
///
/// Handy for model outputs that are only known to a published tolerance.
#[macro_export]
macro_rules! assert_deviation {
    ($actual:expr, $expected:expr, $max_deviation:expr) => {
        {
            let actual_val = $actual;
            let expected_val = $expected;
            let max_dev = $max_deviation;
            let actual_deviation = $crate::math_utils::deviation(actual_val, expected_val);

            if actual_deviation >= max_dev {
                panic!(
                    "assertion failed: deviation {:.2}% >= {:.2}%\n  actual: {:?},\n  expected: {:?}",
                    actual_deviation, max_dev, actual_val, expected_val
                );
            }
        }
    };
    ($actual:expr, $expected:expr, $max_deviation:expr, $($arg:tt)+) => {
        {
            let actual_val = $actual;
            let expected_val = $expected;
            let max_dev = $max_deviation;
            let actual_deviation = $crate::math_utils::deviation(actual_val, expected_val);

            if actual_deviation >= max_dev {
                panic!(
                    "assertion failed: deviation {:.2}% >= {:.2}%: {}\n  actual: {:?},\n  expected: {:?}",
                    actual_deviation, max_dev, format_args!($($arg)+), actual_val, expected_val
                );
            }
        }
    };
}

/// Linear interpolation between two values
///
/// # Examples
/// ```
/// use sid_grid::math_utils::lerp;
///
/// assert_eq!(lerp(50.0, 150.0, 0.5), 100.0);
/// ```
pub fn lerp(a: f64, b: f64, ratio: f64) -> f64 {
    a + (b - a) * ratio
}

/// `count` evenly spaced samples from `start` to `end`, both inclusive
///
/// The last sample is pinned to `end` so rounding never drifts past the
/// range. A single sample is `start`.
///
/// # Examples
/// ```
/// use sid_grid::math_utils::linspace;
///
/// assert_eq!(linspace(50.0, 150.0, 3), vec![50.0, 100.0, 150.0]);
/// assert_eq!(linspace(45.0, 45.0, 1), vec![45.0]);
/// ```
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let last = count - 1;
            (0..count)
                .map(|i| {
                    if i == last {
                        end
                    } else {
                        lerp(start, end, i as f64 / last as f64)
                    }
                })
                .collect()
        }
    }
}

/// Wrap an angle in degrees into [0, 360)
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Percentage deviation of `actual` from `expected`
///
/// # Examples
/// ```
/// use sid_grid::math_utils::deviation;
///
/// assert_eq!(deviation(105.0, 100.0), 5.0);
/// ```
pub fn deviation(actual: f64, expected: f64) -> f64 {
    if expected.abs() < f64::EPSILON {
        if actual.abs() < f64::EPSILON {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        ((actual - expected).abs() / expected.abs()) * 100.0
    }
}
