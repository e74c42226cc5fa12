/// Present / last-time-step storage for evolving model state
///
/// Every quantity that the time integrator needs at the previous accepted
/// step (concentration profile, current densities, film thickness, applied
/// current, terminal voltage) is held in a `StepHistory`. Trial evaluations
/// within one time step write only `present` and read only `last_step`, so
/// they can be repeated (CV current search) without side effects. Accepting
/// the step is a single `commit_step()`.
#[derive(Debug, Clone, PartialEq)]
pub struct StepHistory<T> {
    present: T,
    last_step: T,
}

impl<T: Clone> StepHistory<T> {
    /// Create a history whose present and last-step values are both `initial`
    pub fn new(initial: T) -> Self {
        Self {
            present: initial.clone(),
            last_step: initial,
        }
    }

    /// Value of the current (possibly trial) evaluation
    pub fn present(&self) -> &T {
        &self.present
    }

    /// Value at the last accepted time step
    pub fn last_step(&self) -> &T {
        &self.last_step
    }

    pub fn set(&mut self, value: T) {
        self.present = value;
    }

    pub fn present_mut(&mut self) -> &mut T {
        &mut self.present
    }

    /// Accept the present value as the new last-step snapshot
    pub fn commit_step(&mut self) {
        self.last_step = self.present.clone();
    }

    /// Overwrite both snapshots
    pub fn reset(&mut self, value: T) {
        self.present = value.clone();
        self.last_step = value;
    }
}

impl StepHistory<f64> {
    /// Change between the present value and the last accepted one
    pub fn change(&self) -> f64 {
        self.present - self.last_step
    }
}
