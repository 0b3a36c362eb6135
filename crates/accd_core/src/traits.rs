use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars by the steppers.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// An autonomous or time-dependent ODE right-hand side `dx/dt = f(t, x)`.
pub trait DynamicalSystem<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// t: current time
    /// x: current state
    /// out: buffer to write dx/dt into
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}

/// A solver with an embedded lower-order solution, used for adaptive step control.
pub trait EmbeddedStepper<T: Scalar> {
    /// Order of the error estimate's leading term, used by the step-size controller.
    fn error_order(&self) -> u32;

    /// Attempts a step of size dt from (t, state) without committing it.
    /// The candidate solution is written to `out`, the local error estimate to `err`.
    fn try_step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: T,
        state: &[T],
        dt: T,
        out: &mut [T],
        err: &mut [T],
    );
}
