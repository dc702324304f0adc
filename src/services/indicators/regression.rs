//! Least-squares fits used by the trendline and pattern detectors.

/// Straight-line fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation of x and y. Exactly 1.0 when every y is equal,
    /// since a horizontal line then fits perfectly.
    pub r: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a line through `(xs[i], ys[i])`. `None` with fewer than two points or
/// when every x is the same.
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }

    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r = if syy <= f64::EPSILON * mean_y.abs().max(1.0) {
        1.0
    } else {
        sxy / (sxx * syy).sqrt()
    };

    Some(LinearFit {
        slope,
        intercept,
        r,
    })
}

/// Fit a line against the bar index `0..ys.len()`.
pub fn linear_regression_indexed(ys: &[f64]) -> Option<LinearFit> {
    let xs: Vec<f64> = (0..ys.len()).map(|i| i as f64).collect();
    linear_regression(&xs, ys)
}

/// Fit a line through `(index, value)` pairs.
pub fn fit_points(points: &[(usize, f64)]) -> Option<LinearFit> {
    let xs: Vec<f64> = points.iter().map(|(i, _)| *i as f64).collect();
    let ys: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    linear_regression(&xs, &ys)
}

/// Degree-2 fit `y = a*x^2 + b*x + c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticFit {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub r_squared: f64,
}

impl QuadraticFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.a * x * x + self.b * x + self.c
    }

    /// x coordinate of the turning point, if the curve has one.
    pub fn vertex(&self) -> Option<f64> {
        if self.a == 0.0 {
            None
        } else {
            Some(-self.b / (2.0 * self.a))
        }
    }
}

/// Least-squares parabola against the bar index `0..ys.len()`.
///
/// `None` with fewer than three points, a singular system, or a constant series.
pub fn quadratic_regression(ys: &[f64]) -> Option<QuadraticFit> {
    let n = ys.len();
    if n < 3 {
        return None;
    }

    // Normal equations over power sums of x.
    let (mut s0, mut s1, mut s2, mut s3, mut s4) = (0.0, 0.0, 0.0, 0.0, 0.0);
    let (mut t0, mut t1, mut t2) = (0.0, 0.0, 0.0);
    for (i, y) in ys.iter().enumerate() {
        let x = i as f64;
        let x2 = x * x;
        s0 += 1.0;
        s1 += x;
        s2 += x2;
        s3 += x2 * x;
        s4 += x2 * x2;
        t0 += y;
        t1 += x * y;
        t2 += x2 * y;
    }

    let matrix = [[s4, s3, s2], [s3, s2, s1], [s2, s1, s0]];
    let rhs = [t2, t1, t0];
    let [a, b, c] = solve3(matrix, rhs)?;

    let mean_y = t0 / s0;
    let ss_tot: f64 = ys.iter().map(|y| (y - mean_y).powi(2)).sum();
    if ss_tot == 0.0 {
        return None;
    }
    let ss_res: f64 = ys
        .iter()
        .enumerate()
        .map(|(i, y)| {
            let x = i as f64;
            (y - (a * x * x + b * x + c)).powi(2)
        })
        .sum();

    Some(QuadraticFit {
        a,
        b,
        c,
        r_squared: 1.0 - ss_res / ss_tot,
    })
}

/// Cramer's rule for a 3x3 system.
fn solve3(m: [[f64; 3]; 3], rhs: [f64; 3]) -> Option<[f64; 3]> {
    let det = |m: &[[f64; 3]; 3]| {
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    };

    let d = det(&m);
    if d.abs() < 1e-12 {
        return None;
    }

    let mut out = [0.0; 3];
    for (col, slot) in out.iter_mut().enumerate() {
        let mut replaced = m;
        for row in 0..3 {
            replaced[row][col] = rhs[row];
        }
        *slot = det(&replaced) / d;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_regression_exact_line() {
        let ys: Vec<f64> = (0..10).map(|i| 3.0 + 2.0 * i as f64).collect();
        let fit = linear_regression_indexed(&ys).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-10);
        assert!((fit.intercept - 3.0).abs() < 1e-10);
        assert!((fit.r - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_linear_regression_negative_correlation() {
        let ys: Vec<f64> = (0..10).map(|i| 50.0 - i as f64).collect();
        let fit = linear_regression_indexed(&ys).unwrap();
        assert!((fit.r + 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_linear_regression_flat_series_is_perfect_fit() {
        let fit = linear_regression_indexed(&[5.0; 8]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r, 1.0);
    }

    #[test]
    fn test_linear_regression_degenerate_inputs() {
        assert!(linear_regression(&[1.0], &[1.0]).is_none());
        assert!(linear_regression(&[2.0, 2.0], &[1.0, 3.0]).is_none());
    }

    #[test]
    fn test_fit_points() {
        let fit = fit_points(&[(10, 100.0), (20, 110.0)]).unwrap();
        assert!((fit.slope - 1.0).abs() < 1e-12);
        assert!((fit.predict(30.0) - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_quadratic_regression_recovers_parabola() {
        let ys: Vec<f64> = (0..30)
            .map(|i| {
                let x = i as f64;
                0.5 * x * x - 10.0 * x + 80.0
            })
            .collect();
        let fit = quadratic_regression(&ys).unwrap();
        assert!((fit.a - 0.5).abs() < 1e-4);
        assert!((fit.b + 10.0).abs() < 1e-3);
        assert!((fit.c - 80.0).abs() < 1e-2);
        assert!(fit.r_squared > 0.999);
        assert!((fit.vertex().unwrap() - 10.0).abs() < 1e-2);
    }

    #[test]
    fn test_quadratic_regression_constant_series() {
        assert!(quadratic_regression(&[3.0; 10]).is_none());
    }
}
