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

//! Frequency driver state machine: operating-point discovery at init and
//! the get/target_index operations driven by the governor framework.

use cpufreq_interface::generic_init;
use cpufreq_interface::generic_table_verify;
use cpufreq_interface::CpufreqError;
use cpufreq_interface::CpufreqInterface;
use cpufreq_interface::CpufreqPolicy;
use cpufreq_interface::CpuId;
use cpufreq_interface::FreqKhz;
use cpufreq_interface::FreqTable;
use cpufreq_interface::PropertyTag;
use firmware_clock::ClockPropertyChannel;
use log::{error, info, trace};

/// Measured worst-case firmware turnaround for a clock change, reported
/// to the governor framework as the transition latency (ns).
pub const TRANSITION_LATENCY_NS: u32 = 355_000;

/// Driver-owned state: the discovered operating points and the table
/// handed to the governor framework. Populated by init; the echoed rate
/// of a set is never cached, get re-queries the firmware.
pub struct FreqManager {
    channel: ClockPropertyChannel,
    min_frequency: FreqKhz,
    max_frequency: FreqKhz,
    table: FreqTable,
}
impl FreqManager {
    pub fn new(channel: ClockPropertyChannel) -> Self {
        FreqManager {
            channel,
            min_frequency: 0,
            max_frequency: 0,
            table: FreqTable::empty(),
        }
    }

    pub fn min_frequency(&self) -> FreqKhz { self.min_frequency }
    pub fn max_frequency(&self) -> FreqKhz { self.max_frequency }
    pub fn table(&self) -> &FreqTable { &self.table }

    // Only two operating points are modeled; any index past 0 selects
    // the maximum.
    fn target_freq(&self, index: u32) -> FreqKhz {
        if index == 0 {
            self.min_frequency
        } else {
            self.max_frequency
        }
    }
}
impl CpufreqInterface for FreqManager {
    fn init(&mut self, policy: &mut CpufreqPolicy) -> Result<(), CpufreqError> {
        if !self.channel.is_available() {
            error!("Firmware is not available");
            return Err(CpufreqError::DeviceUnavailable);
        }

        self.min_frequency = self.channel.get_clock(PropertyTag::GetMinClockRate);
        self.max_frequency = self.channel.get_clock(PropertyTag::GetMaxClockRate);
        self.table = FreqTable::build(self.min_frequency, self.max_frequency);

        info!("min={} max={}", self.min_frequency, self.max_frequency);
        generic_init(policy, self.table, TRANSITION_LATENCY_NS);
        Ok(())
    }

    fn target_index(
        &mut self,
        policy: &mut CpufreqPolicy,
        index: u32,
    ) -> Result<(), CpufreqError> {
        let target_freq = self.target_freq(index);
        let cur = self.channel.set_clock(policy.cur, target_freq);
        if cur == 0 {
            error!("Error occurred setting a new frequency ({})", target_freq);
            return Err(CpufreqError::InvalidTarget);
        }
        trace!("{}: freq {} -> {}", index, policy.cur, cur);
        Ok(())
    }

    fn get(&self, cpu: CpuId) -> FreqKhz {
        let actual_rate = self.channel.get_clock(PropertyTag::GetClockRate);
        trace!("cpu{}: freq={}", cpu, actual_rate);
        if actual_rate <= self.min_frequency {
            self.min_frequency
        } else {
            self.max_frequency
        }
    }

    fn verify(&self, policy: &mut CpufreqPolicy) -> Result<(), CpufreqError> {
        generic_table_verify(policy)
    }
}
