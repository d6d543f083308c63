// Copyright 2022 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Frequency table support shared by the driver and the governor
//! framework's table-driven helpers.

use crate::CpufreqError;
use crate::CpufreqPolicy;
use crate::FreqKhz;
use serde::{Deserialize, Serialize};

/// Number of slots in a frequency table, terminator included.
pub const FREQ_TABLE_SLOTS: usize = 3;

/// Terminator marking the end of the populated entries.
pub const FREQ_TABLE_END: FreqKhz = FreqKhz::MAX;

/// Ordered, terminator-delimited table of selectable operating points,
/// in kHz. Entries are non-decreasing by index; consumers stop at the
/// terminator.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct FreqTable {
    slots: [FreqKhz; FREQ_TABLE_SLOTS],
}
impl FreqTable {
    pub const fn empty() -> Self {
        FreqTable {
            slots: [FREQ_TABLE_END; FREQ_TABLE_SLOTS],
        }
    }

    /// Builds the table for a discovered [min, max] range. Equal bounds
    /// collapse to a single operating point.
    pub fn build(min: FreqKhz, max: FreqKhz) -> Self {
        let mut slots = [FREQ_TABLE_END; FREQ_TABLE_SLOTS];
        slots[0] = min;
        if min != max {
            slots[1] = max;
        }
        FreqTable { slots }
    }

    /// Populated entries in table order, stopping at the terminator.
    pub fn entries(&self) -> impl Iterator<Item = FreqKhz> + '_ {
        self.slots
            .iter()
            .copied()
            .take_while(|&freq| freq != FREQ_TABLE_END)
    }

    pub fn len(&self) -> usize { self.entries().count() }
    pub fn is_empty(&self) -> bool { self.slots[0] == FREQ_TABLE_END }

    /// Lowest populated entry.
    pub fn first(&self) -> Option<FreqKhz> { self.entries().next() }

    /// Highest populated entry.
    pub fn last(&self) -> Option<FreqKhz> { self.entries().last() }
}

/// Installs |table| and |transition_latency_ns| into |policy| and sets
/// the policy limits from the table's span. The standard init path for
/// table-based drivers.
pub fn generic_init(policy: &mut CpufreqPolicy, table: FreqTable, transition_latency_ns: u32) {
    policy.freq_table = table;
    policy.transition_latency_ns = transition_latency_ns;
    policy.min = table.first().unwrap_or(0);
    policy.max = table.last().unwrap_or(0);
}

/// Standard table-driven verify: clamps the policy limits to the table's
/// populated span and keeps them ordered.
pub fn generic_table_verify(policy: &mut CpufreqPolicy) -> Result<(), CpufreqError> {
    let lowest = match policy.freq_table.first() {
        Some(freq) => freq,
        None => return Err(CpufreqError::InvalidTarget),
    };
    let highest = policy.freq_table.last().unwrap_or(lowest);
    policy.min = policy.min.clamp(lowest, highest);
    policy.max = policy.max.clamp(lowest, highest);
    if policy.min > policy.max {
        policy.min = policy.max;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_two_points() {
        let table = FreqTable::build(200, 800);
        let mut entries = table.entries();
        assert_eq!(entries.next(), Some(200));
        assert_eq!(entries.next(), Some(800));
        assert_eq!(entries.next(), None);
        assert_eq!(table.len(), 2);
        assert_eq!(table.first(), Some(200));
        assert_eq!(table.last(), Some(800));
    }

    #[test]
    fn test_build_degenerate_range() {
        // Equal bounds yield a single operating point with the
        // terminator immediately after it.
        let table = FreqTable::build(600, 600);
        let mut entries = table.entries();
        assert_eq!(entries.next(), Some(600));
        assert_eq!(entries.next(), None);
        assert_eq!(table.len(), 1);
        assert_eq!(table.first(), Some(600));
        assert_eq!(table.last(), Some(600));
    }

    #[test]
    fn test_build_zero_bounds() {
        // Failed range discovery degrades to a single zero entry, it
        // does not fail table construction.
        let table = FreqTable::build(0, 0);
        assert_eq!(table.len(), 1);
        assert_eq!(table.first(), Some(0));
    }

    #[test]
    fn test_entries_monotonic() {
        let table = FreqTable::build(200, 800);
        let mut prev = 0;
        for freq in table.entries() {
            assert!(freq >= prev);
            prev = freq;
        }
    }

    #[test]
    fn test_empty_table() {
        let table = FreqTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.entries().next(), None);
        assert_eq!(table.first(), None);
        assert_eq!(table.last(), None);
    }

    #[test]
    fn test_generic_init() {
        let mut policy = CpufreqPolicy::new(0);
        generic_init(&mut policy, FreqTable::build(200, 800), 355000);
        assert_eq!(policy.min, 200);
        assert_eq!(policy.max, 800);
        assert_eq!(policy.transition_latency_ns, 355000);
        assert_eq!(policy.freq_table, FreqTable::build(200, 800));
    }

    #[test]
    fn test_verify_clamps_limits() {
        let mut policy = CpufreqPolicy::new(0);
        generic_init(&mut policy, FreqTable::build(200, 800), 355000);

        policy.min = 100;
        policy.max = 900;
        assert!(generic_table_verify(&mut policy).is_ok());
        assert_eq!(policy.min, 200);
        assert_eq!(policy.max, 800);

        // Limits inside the span are left alone.
        policy.min = 200;
        policy.max = 200;
        assert!(generic_table_verify(&mut policy).is_ok());
        assert_eq!(policy.min, 200);
        assert_eq!(policy.max, 200);
    }

    #[test]
    fn test_verify_empty_table() {
        let mut policy = CpufreqPolicy::new(0);
        assert_eq!(
            generic_table_verify(&mut policy).err(),
            Some(CpufreqError::InvalidTarget)
        );
    }
}
