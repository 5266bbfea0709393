//! Implements [`LinearInterpolator`], the one-dimensional interpolant used to
//! resample spectra and to evaluate theory predictions at arbitrary angles.

use crate::Error;

/// Piecewise-linear interpolant through a set of knots.
///
/// Evaluation outside of `[x[0], x[n-1]]` is an error (we never extrapolate).
/// Evaluating exactly at a knot returns the knot's value unmodified.
#[derive(Clone, Debug)]
pub struct LinearInterpolator {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl LinearInterpolator {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, Error> {
        if x.len() != y.len() {
            return Err(Error::interpolant_knots(
                "the abscissae and ordinates must have the same length",
            ));
        } else if x.len() < 2 {
            return Err(Error::interpolant_knots(
                "a minimum of two knots are required",
            ));
        } else if x.iter().any(|v| !v.is_finite()) {
            return Err(Error::interpolant_knots("the abscissae must be finite"));
        }

        for i in 1..x.len() {
            if x[i] <= x[i - 1] {
                return Err(Error::interpolant_knots(
                    "the abscissae must be in strictly increasing order",
                ));
            }
        }

        Ok(LinearInterpolator { x, y })
    }

    pub fn x_min(&self) -> f64 {
        self.x[0]
    }

    pub fn x_max(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    /// Evaluate the interpolant at `x`.
    pub fn eval(&self, x: f64) -> Result<f64, Error> {
        // written so that NaN falls into the error branch
        if !(x >= self.x_min() && x <= self.x_max()) {
            return Err(Error::interpolation_domain(x, self.x_min(), self.x_max()));
        }

        match self.x.binary_search_by(|knot| knot.total_cmp(&x)) {
            Ok(i) => Ok(self.y[i]),
            // x lies strictly between knots i-1 and i (the range check
            // guarantees 0 < i < len)
            Err(i) => {
                let (x0, x1) = (self.x[i - 1], self.x[i]);
                let (y0, y1) = (self.y[i - 1], self.y[i]);
                let slope = (y1 - y0) / (x1 - x0);
                Ok(y0 + slope * (x - x0))
            }
        }
    }

    /// Evaluate the interpolant at every element of `xs`.
    pub fn eval_many(&self, xs: &[f64]) -> Result<Vec<f64>, Error> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }
}
