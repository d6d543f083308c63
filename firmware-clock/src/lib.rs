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

//! Typed clock property channel to the firmware core that owns the
//! clock-generation hardware. Requests cross the firmware transport in
//! Hz; the kHz helpers match the units of the frequency table.

#![no_std]

extern crate alloc;

use alloc::boxed::Box;
use cpufreq_interface::AccessGate;
use cpufreq_interface::ClockPacket;
use cpufreq_interface::FirmwareTransport;
use cpufreq_interface::FreqHz;
use cpufreq_interface::FreqKhz;
use cpufreq_interface::PropertyTag;
use cpufreq_interface::TransportError;
use cpufreq_interface::Unblocked;
use cpufreq_interface::CLOCK_ID_ARM;
use log::error;
use log::trace;

/// A property call that failed, carrying the tag and the transport's
/// error code.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PropertyError {
    pub tag: PropertyTag,
    pub code: TransportError,
}

/// Request/response adapter for clock property calls. Owns the transport
/// and gate handles; no per-call state is retained.
pub struct ClockPropertyChannel {
    transport: Box<dyn FirmwareTransport + Sync>,
    gate: Box<dyn AccessGate + Sync>,
}
impl ClockPropertyChannel {
    pub fn new(transport: impl FirmwareTransport + Sync + 'static) -> Self {
        Self::with_gate(transport, Unblocked)
    }

    pub fn with_gate(
        transport: impl FirmwareTransport + Sync + 'static,
        gate: impl AccessGate + Sync + 'static,
    ) -> Self {
        ClockPropertyChannel {
            transport: Box::new(transport),
            gate: Box::new(gate),
        }
    }

    /// True if the firmware transport answers the existence probe.
    pub fn is_available(&self) -> bool { self.transport.is_available() }

    /// Issues |tag| for the ARM clock. |val| is the rate in Hz: input
    /// for a set, output for a get. While the gate is blocked the
    /// request is skipped and |val| is left unchanged.
    pub fn clock_property(&self, tag: PropertyTag, val: &mut FreqHz) -> Result<(), PropertyError> {
        if self.gate.is_blocked() {
            return Ok(());
        }
        let mut packet = ClockPacket {
            id: CLOCK_ID_ARM,
            val: *val,
        };
        self.transport
            .property_call(tag, &mut packet)
            .map_err(|code| PropertyError { tag, code })?;
        *val = packet.val;
        Ok(())
    }

    /// Reads a clock rate and returns it in kHz; 0 when the call failed.
    pub fn get_clock(&self, tag: PropertyTag) -> FreqKhz {
        let mut rate: FreqHz = 0;
        if let Err(e) = self.clock_property(tag, &mut rate) {
            error!("Failed to get clock ({:?})", e.code);
            return 0;
        }
        let rate = rate / 1000;
        trace!(
            "{} frequency = {}",
            match tag {
                PropertyTag::GetClockRate => "Current",
                PropertyTag::GetMinClockRate => "Min",
                PropertyTag::GetMaxClockRate => "Max",
                _ => "Unexpected",
            },
            rate
        );
        rate
    }

    /// Requests a switch to |new_rate| (kHz) and returns the rate the
    /// firmware actually applied, in kHz; 0 when the call failed.
    pub fn set_clock(&self, cur_rate: FreqKhz, new_rate: FreqKhz) -> FreqKhz {
        let mut rate: FreqHz = new_rate * 1000;
        if let Err(e) = self.clock_property(PropertyTag::SetClockRate, &mut rate) {
            error!("Failed to set clock: {} ({:?})", new_rate, e.code);
            return 0;
        }
        let rate = rate / 1000;
        trace!(
            "Setting new frequency = {} -> {} (actual {})",
            cur_rate,
            new_rate,
            rate
        );
        rate
    }
}
