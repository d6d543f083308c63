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

//! Interface shared by the cpufreq service, the firmware clock channel,
//! and governor framework clients.

#![no_std]

extern crate alloc;

use alloc::sync::Arc;
use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;

mod freq_table;
pub use freq_table::generic_init;
pub use freq_table::generic_table_verify;
pub use freq_table::FreqTable;
pub use freq_table::FREQ_TABLE_END;
pub use freq_table::FREQ_TABLE_SLOTS;

/// Clock rate in kHz, the unit of the frequency table and everything
/// reported to the governor framework.
pub type FreqKhz = u32;
/// Clock rate in Hz, the unit on the firmware side of the channel.
pub type FreqHz = u32;
pub type CpuId = u32;

/// Clock identifier selecting the ARM core clock.
pub const CLOCK_ID_ARM: u32 = 0x0000_0003;

/// Property tags understood by the firmware's clock interface.
#[repr(u32)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, IntoPrimitive)]
pub enum PropertyTag {
    GetClockRate = 0x0003_0002,
    GetMaxClockRate = 0x0003_0004,
    GetMinClockRate = 0x0003_0007,
    SetClockRate = 0x0003_8002,
}

/// Payload of a clock property request: a fixed 8-byte record of the
/// clock identifier and the rate in Hz. The firmware updates |val| in
/// its reply.
#[repr(C)]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ClockPacket {
    pub id: u32,
    pub val: u32,
}
const_assert_eq!(core::mem::size_of::<ClockPacket>(), 8);

/// Error codes surfaced by the firmware transport. The codes are carried
/// back to the caller unchanged; the driver never interprets them.
#[repr(usize)]
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, FromPrimitive, IntoPrimitive)]
pub enum TransportError {
    Success = 0,
    Timeout,
    ChannelClosed,
    InvalidResponse,
    #[default]
    UnknownError,
}

/// Property-request channel to the firmware core that owns the clock
/// hardware. Calls block until the firmware replies.
pub trait FirmwareTransport {
    /// Issues |tag| with |packet| and blocks for the reply. On success
    /// |packet.val| holds the value echoed or updated by the firmware.
    fn property_call(
        &self,
        tag: PropertyTag,
        packet: &mut ClockPacket,
    ) -> Result<(), TransportError>;

    /// Lightweight existence probe, checked once at driver init.
    fn is_available(&self) -> bool { true }
}

/// Lets a shared transport handle stand in for the transport itself.
impl<T: FirmwareTransport + ?Sized> FirmwareTransport for Arc<T> {
    fn property_call(
        &self,
        tag: PropertyTag,
        packet: &mut ClockPacket,
    ) -> Result<(), TransportError> {
        (**self).property_call(tag, packet)
    }

    fn is_available(&self) -> bool { (**self).is_available() }
}

/// Predicate consulted immediately before each property call. While
/// blocked the channel skips the firmware request and echoes the input
/// value back as if unchanged.
pub trait AccessGate {
    fn is_blocked(&self) -> bool;
}

/// Lets a shared gate handle stand in for the gate itself.
impl<T: AccessGate + ?Sized> AccessGate for Arc<T> {
    fn is_blocked(&self) -> bool { (**self).is_blocked() }
}

/// Gate for configurations with no privileged-access policy.
pub struct Unblocked;
impl AccessGate for Unblocked {
    fn is_blocked(&self) -> bool { false }
}

/// Return codes from the cpufreq service api's.
#[repr(usize)]
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, FromPrimitive, IntoPrimitive)]
pub enum CpufreqError {
    Success = 0,
    DeviceUnavailable,
    InvalidTarget,
    DeserializeFailed,
    SerializeFailed,
    #[default]
    UnknownError,
}
impl From<CpufreqError> for Result<(), CpufreqError> {
    fn from(err: CpufreqError) -> Result<(), CpufreqError> {
        if err == CpufreqError::Success {
            Ok(())
        } else {
            Err(err)
        }
    }
}

/// Per-policy state supplied by the governor framework. The driver
/// populates the table and limits at init; the governor framework owns
/// the object and maintains |cur| thereafter.
#[derive(Debug, Clone)]
pub struct CpufreqPolicy {
    pub cpu: CpuId,
    /// Current frequency in kHz, as last observed by the governor.
    pub cur: FreqKhz,
    pub min: FreqKhz,
    pub max: FreqKhz,
    pub freq_table: FreqTable,
    pub transition_latency_ns: u32,
}
impl CpufreqPolicy {
    pub const fn new(cpu: CpuId) -> Self {
        CpufreqPolicy {
            cpu,
            cur: 0,
            min: 0,
            max: 0,
            freq_table: FreqTable::empty(),
            transition_latency_ns: 0,
        }
    }
}

/// Driver entry points called by the governor framework. The framework
/// serializes calls per policy; implementations do no locking.
pub trait CpufreqInterface {
    fn init(&mut self, policy: &mut CpufreqPolicy) -> Result<(), CpufreqError>;
    fn target_index(
        &mut self,
        policy: &mut CpufreqPolicy,
        index: u32,
    ) -> Result<(), CpufreqError>;
    fn get(&self, cpu: CpuId) -> FreqKhz;
    fn verify(&self, policy: &mut CpufreqPolicy) -> Result<(), CpufreqError>;
}

/// Requests accepted from governor framework clients.
#[derive(Debug, Serialize, Deserialize)]
pub enum CpufreqRequest {
    /// Discovers the operating points and installs the frequency table.
    Init, // -> InitResponse

    /// Reads the current frequency for |cpu|, snapped to an operating
    /// point.
    GetFrequency { cpu: CpuId }, // -> GetFrequencyResponse

    /// Switches to the operating point at |index| in the table.
    TargetIndex { index: u32 },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InitResponse {
    pub min_freq: FreqKhz,
    pub max_freq: FreqKhz,
    pub transition_latency_ns: u32,
    pub table: FreqTable,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetFrequencyResponse {
    pub freq: FreqKhz,
}

/// Size of the data buffer used to pass a serialized CpufreqRequest.
pub const CPUFREQ_REQUEST_DATA_SIZE: usize = 128;
