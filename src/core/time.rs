//! Simulation time tracking

/// Fixed-step simulation clock
///
/// The driver chooses the step size and calls [`Time::advance`] exactly once
/// per frame. Wall-clock time never enters the loop, so runs with the same
/// scenario and seeds are reproducible.
#[derive(Debug, Clone)]
pub struct Time {
    /// Duration of the most recent step, in seconds
    delta: f32,
    /// Total simulated time, in seconds
    elapsed: f64,
    /// Number of completed steps
    frame: u64,
}

impl Time {
    /// Create a clock at t = 0
    pub fn new() -> Self {
        Self {
            delta: 0.0,
            elapsed: 0.0,
            frame: 0,
        }
    }

    /// Advance the clock by one step of `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        self.delta = dt;
        self.elapsed += dt as f64;
        self.frame += 1;
    }

    /// Get the duration of the current step in seconds
    pub fn delta_seconds(&self) -> f32 {
        self.delta
    }

    /// Get the total simulated time in seconds
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed
    }

    /// Get the number of completed steps
    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
