use chrono::{Duration, Local, NaiveDateTime};

/// Source of the wall-clock time passed to the Load Control tick.
pub trait WallClock {
    fn now(&self) -> NaiveDateTime;
}

/// Local time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone, Copy)]
pub struct ManualClock {
    now: NaiveDateTime,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    pub fn set(&mut self, now: NaiveDateTime) {
        self.now = now;
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        self.now
    }
}

/// A simulation clock that walks a fixed number of equal steps from a start
/// time.
///
/// # Examples
///
/// ```
/// use bacnet_shed::sim::clock::{SimClock, WallClock};
/// use chrono::{Duration, NaiveDate};
///
/// let start = NaiveDate::from_ymd_opt(2007, 2, 27)
///     .and_then(|d| d.and_hms_opt(14, 0, 0))
///     .unwrap();
/// let mut clock = SimClock::new(start, Duration::minutes(15), 3);
/// let mut steps = Vec::new();
///
/// clock.run(|step, now| steps.push((step, now)));
/// assert_eq!(steps.len(), 3);
/// assert_eq!(steps[2].1, start + Duration::minutes(30));
/// assert_eq!(clock.now(), start + Duration::minutes(45));
/// ```
#[derive(Debug, Clone)]
pub struct SimClock {
    start: NaiveDateTime,
    step: Duration,
    /// Current step of the simulation
    current: usize,
    /// Total steps to run in the simulation
    total: usize,
}

impl SimClock {
    /// Creates a clock.
    ///
    /// # Arguments
    ///
    /// * `start` - Wall-clock time of step 0
    /// * `step` - Wall-clock time between steps
    /// * `total` - The total number of steps the clock will run
    pub fn new(start: NaiveDateTime, step: Duration, total: usize) -> Self {
        Self {
            start,
            step,
            current: 0,
            total,
        }
    }

    /// Wall-clock time of `step`.
    pub fn time_of(&self, step: usize) -> NaiveDateTime {
        self.start + self.step * step as i32
    }

    /// Advances the clock by one step.
    ///
    /// # Returns
    ///
    /// * `Some((step, time))` - The step number (from 0) and its wall-clock
    ///   time, before advancing
    /// * `None` - If the clock has reached its total steps
    pub fn tick(&mut self) -> Option<(usize, NaiveDateTime)> {
        if self.current < self.total {
            let step = self.current;
            self.current += 1;
            Some((step, self.time_of(step)))
        } else {
            None
        }
    }

    /// Runs a function for each remaining step.
    pub fn run(&mut self, mut f: impl FnMut(usize, NaiveDateTime)) {
        while let Some((step, now)) = self.tick() {
            f(step, now);
        }
    }
}

impl WallClock for SimClock {
    /// Time of the next step to be ticked.
    fn now(&self) -> NaiveDateTime {
        self.time_of(self.current)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2007, 2, 27)
            .and_then(|d| d.and_hms_opt(5, 0, 0))
            .expect("valid")
    }

    #[test]
    fn tick_reports_step_times() {
        let mut clock = SimClock::new(start(), Duration::minutes(30), 2);
        assert_eq!(clock.tick(), Some((0, start())));
        assert_eq!(clock.tick(), Some((1, start() + Duration::minutes(30))));
        assert_eq!(clock.tick(), None);
    }

    #[test]
    fn empty_clock_never_runs() {
        let mut clock = SimClock::new(start(), Duration::minutes(1), 0);
        let mut was_called = false;
        clock.run(|_, _| was_called = true);
        assert!(!was_called);
    }

    #[test]
    fn manual_clock_moves_only_on_request() {
        let mut clock = ManualClock::new(start());
        assert_eq!(clock.now(), start());
        clock.advance(Duration::hours(10));
        assert_eq!(clock.now(), start() + Duration::hours(10));
        clock.set(start());
        assert_eq!(clock.now(), start());
    }
}
