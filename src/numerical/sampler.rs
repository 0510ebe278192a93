//! Grid sampling of a bivariate function.
//!
//! Axes are inclusive `linspace`s, the grid is the "xy" meshgrid (rows follow `y`,
//! columns follow `x`) and the whole grid is evaluated in one array call. NaN and Inf
//! values are kept as they are; renderers decide what to do with them.
use crate::symbolic::symbolic_lambdify::BivariateFunction;
use csv::Writer;
use log::{info, warn};
use ndarray::{Array1, Array2, Zip};
use std::error::Error;
use std::path::Path;

pub const DEFAULT_RESOLUTION: usize = 400;

#[derive(Debug, Clone)]
pub struct SampledField {
    pub x: Array1<f64>,  // nx points
    pub y: Array1<f64>,  // ny points
    pub xx: Array2<f64>, // (ny, nx)
    pub yy: Array2<f64>, // (ny, nx)
    pub z: Array2<f64>,  // f(xx, yy)
}

/// numpy-style `meshgrid(x, y)`: both outputs have shape `(y.len(), x.len())`.
pub fn meshgrid(x: &Array1<f64>, y: &Array1<f64>) -> (Array2<f64>, Array2<f64>) {
    let shape = (y.len(), x.len());
    let xx = Array2::from_shape_fn(shape, |(_, j)| x[j]);
    let yy = Array2::from_shape_fn(shape, |(i, _)| y[i]);
    (xx, yy)
}

/// Samples `f` on `resolution` x `resolution` points covering both ranges, ends included.
pub fn sample(
    f: &BivariateFunction,
    x_range: (f64, f64),
    y_range: (f64, f64),
    resolution: usize,
) -> SampledField {
    let x = Array1::linspace(x_range.0, x_range.1, resolution);
    let y = Array1::linspace(y_range.0, y_range.1, resolution);
    let (xx, yy) = meshgrid(&x, &y);
    let z = match f.call_grid(&xx, &yy) {
        Ok(z) => z,
        Err(e) => {
            // meshgrid outputs always share a shape
            warn!("grid evaluation failed: {}", e);
            Array2::from_elem(xx.dim(), f64::NAN)
        }
    };
    let field = SampledField { x, y, xx, yy, z };
    info!(
        "sampled {} on a {}x{} grid, {} non-finite value(s)",
        f.expr(),
        field.x.len(),
        field.y.len(),
        field.non_finite_count()
    );
    field
}

impl SampledField {
    pub fn shape(&self) -> (usize, usize) {
        self.z.dim()
    }

    pub fn non_finite_count(&self) -> usize {
        self.z.iter().filter(|v| !v.is_finite()).count()
    }

    /// Smallest and largest finite sample with their `(x, y)` positions, `None` when
    /// nothing is finite.
    pub fn finite_extrema(&self) -> Option<((f64, f64, f64), (f64, f64, f64))> {
        let mut min: Option<(f64, f64, f64)> = None;
        let mut max: Option<(f64, f64, f64)> = None;
        for ((i, j), &v) in self.z.indexed_iter() {
            if !v.is_finite() {
                continue;
            }
            let here = (self.xx[[i, j]], self.yy[[i, j]], v);
            if min.is_none_or(|m| v < m.2) {
                min = Some(here);
            }
            if max.is_none_or(|m| v > m.2) {
                max = Some(here);
            }
        }
        min.zip(max)
    }

    /// Writes one `x,y,z` row per grid node.
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        let mut wtr = Writer::from_path(path.as_ref())?;
        wtr.write_record(["x", "y", "z"])?;
        for ((i, j), v) in self.z.indexed_iter() {
            wtr.write_record(&[
                self.xx[[i, j]].to_string(),
                self.yy[[i, j]].to_string(),
                v.to_string(),
            ])?;
        }
        wtr.flush()?;
        info!("grid saved to {}", path.as_ref().display());
        Ok(())
    }
}

/// `|grad f|` on the nodes of `field`.
pub fn gradient_magnitude(
    fx: &BivariateFunction,
    fy: &BivariateFunction,
    field: &SampledField,
) -> Array2<f64> {
    let nan = || Array2::from_elem(field.xx.dim(), f64::NAN);
    let gx = fx.call_grid(&field.xx, &field.yy).unwrap_or_else(|_| nan());
    let gy = fy.call_grid(&field.xx, &field.yy).unwrap_or_else(|_| nan());
    Zip::from(&gx).and(&gy).map_collect(|a, b| a.hypot(*b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::parse_expr::parse_expression;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    fn function(raw: &str) -> BivariateFunction {
        BivariateFunction::new(parse_expression(raw).unwrap()).unwrap()
    }

    #[test]
    fn test_meshgrid_layout() {
        let x = Array1::from(vec![1.0, 2.0, 3.0]);
        let y = Array1::from(vec![10.0, 20.0]);
        let (xx, yy) = meshgrid(&x, &y);
        assert_eq!(xx.dim(), (2, 3));
        assert_eq!(xx.row(1).to_vec(), vec![1.0, 2.0, 3.0]);
        assert_eq!(yy.column(2).to_vec(), vec![10.0, 20.0]);
    }

    #[test]
    fn test_sample_axes_are_inclusive() {
        let field = sample(&function("x + y"), (0.0, 10.0), (-5.0, 5.0), DEFAULT_RESOLUTION);
        assert_eq!(field.shape(), (400, 400));
        assert_eq!(field.x[0], 0.0);
        assert_relative_eq!(field.x[399], 10.0, epsilon = 1e-12);
        assert_eq!(field.y[0], -5.0);
        assert_relative_eq!(field.y[399], 5.0, epsilon = 1e-12);
        assert_relative_eq!(field.z[[399, 399]], 15.0, epsilon = 1e-12);
    }

    #[test]
    fn test_grid_matches_scalar_evaluation() {
        let f = function("sin(x)*y + exp(-x**2)");
        let field = sample(&f, (-2.0, 2.0), (-1.0, 3.0), 7);
        for ((i, j), z) in field.z.indexed_iter() {
            assert_relative_eq!(*z, f.eval(field.x[j], field.y[i]));
        }
    }

    #[test]
    fn test_non_finite_values_pass_through() {
        let field = sample(&function("1/x"), (-1.0, 1.0), (0.0, 1.0), 5);
        // x = 0 is the middle column
        assert!(field.z.column(2).iter().all(|v| v.is_infinite()));
        assert_eq!(field.non_finite_count(), 5);
        let (min, max) = field.finite_extrema().unwrap();
        assert_eq!(min.2, -2.0);
        assert_eq!(max.2, 2.0);
    }

    #[test]
    fn test_extrema_of_an_undefined_function() {
        let field = sample(&function("log(-1 - x**2)"), (0.0, 1.0), (0.0, 1.0), 3);
        assert_eq!(field.finite_extrema(), None);
    }

    #[test]
    fn test_gradient_magnitude() {
        let field = sample(&function("x**2 + y**2"), (0.0, 3.0), (0.0, 4.0), 2);
        let g = gradient_magnitude(&function("2*x"), &function("2*y"), &field);
        assert_relative_eq!(g[[1, 1]], 10.0);
        assert_eq!(g[[0, 0]], 0.0);
    }

    #[test]
    fn test_save_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grid.csv");
        let field = sample(&function("x*y"), (0.0, 1.0), (0.0, 2.0), 2);
        field.save_csv(&path).unwrap();
        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<Vec<f64>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(|v| v.parse().unwrap()).collect())
            .collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3], vec![1.0, 2.0, 2.0]);
    }
}
