//! Pass/fail accounting for one suite run.

use std::fmt;

/// Identifies one expectation: `<scenario>.<index>` plus its position in the whole suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectationId {
    pub scenario: usize,
    /// 1-based within the scenario.
    pub index: usize,
    /// 1-based across the suite, regardless of scenario boundaries.
    pub global: usize,
}

impl fmt::Display for ExpectationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.scenario, self.index)
    }
}

/// Additive counters. Nothing is ever decremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub scenario_total: usize,
    pub scenario_passed: usize,
    pub expectation_total: usize,
    pub expectation_passed: usize,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next recorded scenario will get.
    pub fn next_scenario_id(&self) -> usize {
        self.scenario_total + 1
    }

    /// Id for the `index`-th (1-based) expectation of the scenario about to be recorded.
    ///
    /// Expectations must be recorded in order for the global part to line up.
    pub fn next_expectation_id(&self, index: usize) -> ExpectationId {
        ExpectationId {
            scenario: self.next_scenario_id(),
            index,
            global: self.expectation_total + 1,
        }
    }

    pub fn record_expectation(&mut self, passed: bool) {
        self.expectation_total += 1;
        if passed {
            self.expectation_passed += 1;
        }
    }

    pub fn record_scenario(&mut self, passed: bool) {
        self.scenario_total += 1;
        if passed {
            self.scenario_passed += 1;
        }
    }

    pub fn scenario_failed(&self) -> usize {
        self.scenario_total - self.scenario_passed
    }

    pub fn expectation_failed(&self) -> usize {
        self.expectation_total - self.expectation_passed
    }

    pub fn all_passed(&self) -> bool {
        self.scenario_failed() == 0 && self.expectation_failed() == 0
    }

    /// Adds another suite's counters to these.
    pub fn absorb(&mut self, other: &RunCounters) {
        self.scenario_total += other.scenario_total;
        self.scenario_passed += other.scenario_passed;
        self.expectation_total += other.expectation_total;
        self.expectation_passed += other.expectation_passed;
    }
}
