use crate::traits::{DynamicalSystem, EmbeddedStepper, Scalar};

fn lit<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}

/// Dormand–Prince 5(4) Solver
///
/// Advances with the 5th-order solution and estimates the local error against
/// the embedded 4th-order solution (the same pair as the classic RK45).
pub struct Dopri5<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    k5: Vec<T>,
    k6: Vec<T>,
    k7: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> Dopri5<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            k5: vec![z; dim],
            k6: vec![z; dim],
            k7: vec![z; dim],
            tmp: vec![z; dim],
        }
    }
}

impl<T: Scalar> EmbeddedStepper<T> for Dopri5<T> {
    fn error_order(&self) -> u32 {
        4
    }

    fn try_step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t0: T,
        state: &[T],
        dt: T,
        out: &mut [T],
        err: &mut [T],
    ) {
        let c2 = lit::<T>(1.0 / 5.0);
        let c3 = lit::<T>(3.0 / 10.0);
        let c4 = lit::<T>(4.0 / 5.0);
        let c5 = lit::<T>(8.0 / 9.0);

        let a21 = lit::<T>(1.0 / 5.0);

        let a31 = lit::<T>(3.0 / 40.0);
        let a32 = lit::<T>(9.0 / 40.0);

        let a41 = lit::<T>(44.0 / 45.0);
        let a42 = lit::<T>(-56.0 / 15.0);
        let a43 = lit::<T>(32.0 / 9.0);

        let a51 = lit::<T>(19372.0 / 6561.0);
        let a52 = lit::<T>(-25360.0 / 2187.0);
        let a53 = lit::<T>(64448.0 / 6561.0);
        let a54 = lit::<T>(-212.0 / 729.0);

        let a61 = lit::<T>(9017.0 / 3168.0);
        let a62 = lit::<T>(-355.0 / 33.0);
        let a63 = lit::<T>(46732.0 / 5247.0);
        let a64 = lit::<T>(49.0 / 176.0);
        let a65 = lit::<T>(-5103.0 / 18656.0);

        // b coefficients (5th order), also row 7 of the tableau
        let b1 = lit::<T>(35.0 / 384.0);
        let b3 = lit::<T>(500.0 / 1113.0);
        let b4 = lit::<T>(125.0 / 192.0);
        let b5 = lit::<T>(-2187.0 / 6784.0);
        let b6 = lit::<T>(11.0 / 84.0);

        // e = b - b_hat (5th minus embedded 4th order)
        let e1 = lit::<T>(35.0 / 384.0 - 5179.0 / 57600.0);
        let e3 = lit::<T>(500.0 / 1113.0 - 7571.0 / 16695.0);
        let e4 = lit::<T>(125.0 / 192.0 - 393.0 / 640.0);
        let e5 = lit::<T>(-2187.0 / 6784.0 + 92097.0 / 339200.0);
        let e6 = lit::<T>(11.0 / 84.0 - 187.0 / 2100.0);
        let e7 = lit::<T>(-1.0 / 40.0);

        let n = state.len();

        // k1
        system.apply(t0, state, &mut self.k1);

        // k2
        for i in 0..n {
            self.tmp[i] = state[i] + dt * (a21 * self.k1[i]);
        }
        system.apply(t0 + c2 * dt, &self.tmp, &mut self.k2);

        // k3
        for i in 0..n {
            self.tmp[i] = state[i] + dt * (a31 * self.k1[i] + a32 * self.k2[i]);
        }
        system.apply(t0 + c3 * dt, &self.tmp, &mut self.k3);

        // k4
        for i in 0..n {
            self.tmp[i] = state[i] + dt * (a41 * self.k1[i] + a42 * self.k2[i] + a43 * self.k3[i]);
        }
        system.apply(t0 + c4 * dt, &self.tmp, &mut self.k4);

        // k5
        for i in 0..n {
            self.tmp[i] = state[i]
                + dt * (a51 * self.k1[i] + a52 * self.k2[i] + a53 * self.k3[i] + a54 * self.k4[i]);
        }
        system.apply(t0 + c5 * dt, &self.tmp, &mut self.k5);

        // k6
        for i in 0..n {
            self.tmp[i] = state[i]
                + dt * (a61 * self.k1[i]
                    + a62 * self.k2[i]
                    + a63 * self.k3[i]
                    + a64 * self.k4[i]
                    + a65 * self.k5[i]);
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k6);

        // Candidate solution
        for i in 0..n {
            out[i] = state[i]
                + dt * (b1 * self.k1[i]
                    + b3 * self.k3[i]
                    + b4 * self.k4[i]
                    + b5 * self.k5[i]
                    + b6 * self.k6[i]);
        }

        // k7 at the candidate point, needed for the embedded estimate
        system.apply(t0 + dt, out, &mut self.k7);

        for i in 0..n {
            err[i] = dt
                * (e1 * self.k1[i]
                    + e3 * self.k3[i]
                    + e4 * self.k4[i]
                    + e5 * self.k5[i]
                    + e6 * self.k6[i]
                    + e7 * self.k7[i]);
        }
    }
}
