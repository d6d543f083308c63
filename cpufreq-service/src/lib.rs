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

//! The cpufreq service translates governor framework decisions into
//! clock property requests to the firmware core.

#![no_std]

use cpufreq_interface::CpufreqError;
use cpufreq_interface::CpufreqInterface;
use cpufreq_interface::CpufreqPolicy;
use cpufreq_interface::CpuId;
use cpufreq_interface::FreqKhz;
use firmware_clock::ClockPropertyChannel;
use spin::Mutex;
use spin::MutexGuard;

mod dispatch;
mod freq_manager;
pub use dispatch::cpufreq_request;
pub use freq_manager::FreqManager;
pub use freq_manager::TRANSITION_LATENCY_NS;

/// Wrapper for the single driver instance. The driver is registered at
/// module load with register() and unregistered at unload with
/// unregister(); nothing survives unload.
pub struct CpufreqService {
    manager: Mutex<Option<FreqManager>>,
}
impl CpufreqService {
    pub const fn empty() -> CpufreqService {
        CpufreqService {
            manager: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Guard {
        Guard {
            manager: self.manager.lock(),
        }
    }
}

pub struct Guard<'a> {
    manager: MutexGuard<'a, Option<FreqManager>>,
}
impl<'a> Guard<'a> {
    pub fn is_empty(&self) -> bool { self.manager.is_none() }

    /// Registers the driver with the governor framework.
    pub fn register(&mut self, channel: ClockPropertyChannel) {
        assert!(self.manager.is_none());
        *self.manager = Some(FreqManager::new(channel));
    }

    /// Unregisters the driver; the next register() starts from scratch.
    pub fn unregister(&mut self) { *self.manager = None; }
}
impl<'a> CpufreqInterface for Guard<'a> {
    fn init(&mut self, policy: &mut CpufreqPolicy) -> Result<(), CpufreqError> {
        self.manager.as_mut().unwrap().init(policy)
    }
    fn target_index(
        &mut self,
        policy: &mut CpufreqPolicy,
        index: u32,
    ) -> Result<(), CpufreqError> {
        self.manager.as_mut().unwrap().target_index(policy, index)
    }
    fn get(&self, cpu: CpuId) -> FreqKhz { self.manager.as_ref().unwrap().get(cpu) }
    fn verify(&self, policy: &mut CpufreqPolicy) -> Result<(), CpufreqError> {
        self.manager.as_ref().unwrap().verify(policy)
    }
}
