//! GRU layer with hand-derived backpropagation through time
//!
//! Gate layout in the packed kernels is `[z | r | n]`:
//! ```text
//! z = σ(x·Wz + h·Uz + bz)
//! r = σ(x·Wr + h·Ur + br)
//! n = tanh(x·Wn + (r ⊙ h)·Un + bn)
//! h' = z ⊙ h + (1 - z) ⊙ n
//! ```

use ndarray::{s, Array1, Array2, ArrayView2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::math::{glorot_uniform, outer, sigmoid};

/// Packed GRU parameters for one direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GruWeights {
    /// Input kernel (F × 3H)
    pub w: Array2<f64>,
    /// Recurrent kernel (H × 3H)
    pub u: Array2<f64>,
    /// Bias (3H)
    pub b: Array1<f64>,
}

/// Per-step activations kept for the backward pass
#[derive(Debug, Clone)]
pub struct GruCache {
    h_prev: Vec<Array1<f64>>,
    z: Vec<Array1<f64>>,
    r: Vec<Array1<f64>>,
    n: Vec<Array1<f64>>,
}

impl GruWeights {
    pub fn new<R: Rng>(input_dim: usize, hidden: usize, rng: &mut R) -> Self {
        Self {
            w: glorot_uniform(input_dim, 3 * hidden, rng),
            u: glorot_uniform(hidden, 3 * hidden, rng),
            b: Array1::zeros(3 * hidden),
        }
    }

    pub fn zeros_like(other: &Self) -> Self {
        Self {
            w: Array2::zeros(other.w.raw_dim()),
            u: Array2::zeros(other.u.raw_dim()),
            b: Array1::zeros(other.b.raw_dim()),
        }
    }

    pub fn hidden(&self) -> usize {
        self.u.nrows()
    }

    pub fn input_dim(&self) -> usize {
        self.w.nrows()
    }

    /// Run over the sequence in row order. Returns T×H hidden states.
    pub fn forward(&self, x: ArrayView2<'_, f64>) -> (Array2<f64>, GruCache) {
        let steps = x.nrows();
        let h = self.hidden();

        let mut out = Array2::zeros((steps, h));
        let mut cache = GruCache {
            h_prev: Vec::with_capacity(steps),
            z: Vec::with_capacity(steps),
            r: Vec::with_capacity(steps),
            n: Vec::with_capacity(steps),
        };

        // Input projections for every step at once
        let gx = x.dot(&self.w) + &self.b;
        let u_zr = self.u.slice(s![.., 0..2 * h]);
        let u_n = self.u.slice(s![.., 2 * h..]);

        let mut h_prev = Array1::<f64>::zeros(h);
        for t in 0..steps {
            let gx_t = gx.row(t);
            let gh = h_prev.dot(&u_zr);

            let z = (&gx_t.slice(s![0..h]) + &gh.slice(s![0..h])).mapv(sigmoid);
            let r = (&gx_t.slice(s![h..2 * h]) + &gh.slice(s![h..2 * h])).mapv(sigmoid);
            let n = (&gx_t.slice(s![2 * h..]) + &(&r * &h_prev).dot(&u_n)).mapv(f64::tanh);

            let h_t = &z * &h_prev + &(1.0 - &z) * &n;
            out.row_mut(t).assign(&h_t);

            cache.h_prev.push(std::mem::replace(&mut h_prev, h_t));
            cache.z.push(z);
            cache.r.push(r);
            cache.n.push(n);
        }

        (out, cache)
    }

    /// Backpropagate `d_out` (T×H) into `grads`. Returns dL/dx (T×F).
    pub fn backward(
        &self,
        x: ArrayView2<'_, f64>,
        cache: &GruCache,
        d_out: ArrayView2<'_, f64>,
        grads: &mut GruWeights,
    ) -> Array2<f64> {
        let steps = x.nrows();
        let h = self.hidden();

        let u_z = self.u.slice(s![.., 0..h]);
        let u_r = self.u.slice(s![.., h..2 * h]);
        let u_n = self.u.slice(s![.., 2 * h..]);

        let mut dx = Array2::zeros(x.raw_dim());
        let mut dh_next = Array1::<f64>::zeros(h);

        for t in (0..steps).rev() {
            let h_prev = &cache.h_prev[t];
            let z = &cache.z[t];
            let r = &cache.r[t];
            let n = &cache.n[t];
            let x_t = x.row(t);

            let dh = &d_out.row(t) + &dh_next;

            let dz = &dh * &(h_prev - n);
            let dn = &dh * &(1.0 - z);
            let mut dh_prev = &dh * z;

            // Candidate
            let da_n = dn * &n.mapv(|v| 1.0 - v * v);
            let rh = r * h_prev;
            let d_rh = da_n.dot(&u_n.t());
            let dr = &d_rh * h_prev;
            dh_prev += &(&d_rh * r);

            // Gates
            let da_z = dz * &z.mapv(|v| v * (1.0 - v));
            let da_r = dr * &r.mapv(|v| v * (1.0 - v));
            dh_prev += &da_z.dot(&u_z.t());
            dh_prev += &da_r.dot(&u_r.t());

            let mut da = Array1::zeros(3 * h);
            da.slice_mut(s![0..h]).assign(&da_z);
            da.slice_mut(s![h..2 * h]).assign(&da_r);
            da.slice_mut(s![2 * h..]).assign(&da_n);

            grads.w += &outer(x_t, da.view());
            grads.b += &da;
            grads.u.slice_mut(s![.., 0..h]).scaled_add(1.0, &outer(h_prev.view(), da_z.view()));
            grads.u.slice_mut(s![.., h..2 * h]).scaled_add(1.0, &outer(h_prev.view(), da_r.view()));
            grads.u.slice_mut(s![.., 2 * h..]).scaled_add(1.0, &outer(rh.view(), da_n.view()));

            dx.row_mut(t).assign(&self.w.dot(&da));
            dh_next = dh_prev;
        }

        dx
    }
}

/// Reverse the row order of a matrix
pub fn reverse_rows(x: ArrayView2<'_, f64>) -> Array2<f64> {
    x.slice(s![..;-1, ..]).to_owned()
}

/// Stack forward and time-reversed backward states side by side (T×2H)
pub fn concat_directions(forward: &Array2<f64>, backward_reversed: &Array2<f64>) -> Array2<f64> {
    let h = forward.ncols();
    let mut out = Array2::zeros((forward.nrows(), h + backward_reversed.ncols()));
    out.slice_mut(s![.., ..h]).assign(forward);
    out.slice_mut(s![.., h..]).assign(&backward_reversed.slice(s![..;-1, ..]));
    out
}
