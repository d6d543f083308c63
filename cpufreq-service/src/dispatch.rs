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

//! Serialized request dispatch for governor framework clients.

use cpufreq_interface::CpufreqError;
use cpufreq_interface::CpufreqInterface;
use cpufreq_interface::CpufreqPolicy;
use cpufreq_interface::CpufreqRequest;
use cpufreq_interface::GetFrequencyResponse;
use cpufreq_interface::InitResponse;
use log::trace;

/// Decodes one governor request from |request_buffer|, applies it to
/// |driver| against |policy|, and encodes the reply into |reply_buffer|.
/// Returns the encoded reply length.
pub fn cpufreq_request(
    driver: &mut impl CpufreqInterface,
    policy: &mut CpufreqPolicy,
    request_buffer: &[u8],
    reply_buffer: &mut [u8],
) -> Result<usize, CpufreqError> {
    let request = match postcard::from_bytes::<CpufreqRequest>(request_buffer) {
        Ok(request) => request,
        Err(_) => return Err(CpufreqError::DeserializeFailed),
    };
    trace!("cpufreq_request {:?}", request);
    match request {
        CpufreqRequest::Init => {
            driver.init(policy)?;
            let reply = postcard::to_slice(
                &InitResponse {
                    min_freq: policy.min,
                    max_freq: policy.max,
                    transition_latency_ns: policy.transition_latency_ns,
                    table: policy.freq_table,
                },
                reply_buffer,
            )
            .or(Err(CpufreqError::SerializeFailed))?;
            Ok(reply.len())
        }
        CpufreqRequest::GetFrequency { cpu } => {
            let freq = driver.get(cpu);
            let reply = postcard::to_slice(&GetFrequencyResponse { freq }, reply_buffer)
                .or(Err(CpufreqError::SerializeFailed))?;
            Ok(reply.len())
        }
        CpufreqRequest::TargetIndex { index } => {
            driver.target_index(policy, index)?;
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use crate::FreqManager;
    use crate::TRANSITION_LATENCY_NS;
    use alloc::sync::Arc;
    use cpufreq_interface::ClockPacket;
    use cpufreq_interface::FirmwareTransport;
    use cpufreq_interface::FreqTable;
    use cpufreq_interface::PropertyTag;
    use cpufreq_interface::TransportError;
    use cpufreq_interface::CPUFREQ_REQUEST_DATA_SIZE;
    use firmware_clock::ClockPropertyChannel;

    // Transport double reporting a 200-800 MHz range, currently at the
    // top of it.
    struct FakeTransport;
    impl FirmwareTransport for FakeTransport {
        fn property_call(
            &self,
            tag: PropertyTag,
            packet: &mut ClockPacket,
        ) -> Result<(), TransportError> {
            packet.val = match tag {
                PropertyTag::GetClockRate => 750_000,
                PropertyTag::GetMinClockRate => 200_000,
                PropertyTag::GetMaxClockRate => 800_000,
                PropertyTag::SetClockRate => packet.val,
            };
            Ok(())
        }
    }

    fn dispatch(
        driver: &mut FreqManager,
        policy: &mut CpufreqPolicy,
        request: &CpufreqRequest,
    ) -> Result<(usize, [u8; CPUFREQ_REQUEST_DATA_SIZE]), CpufreqError> {
        let mut request_buffer = [0u8; CPUFREQ_REQUEST_DATA_SIZE];
        let request_slice = postcard::to_slice(request, &mut request_buffer).unwrap();
        let mut reply_buffer = [0u8; CPUFREQ_REQUEST_DATA_SIZE];
        let len = cpufreq_request(driver, policy, request_slice, &mut reply_buffer)?;
        Ok((len, reply_buffer))
    }

    #[test]
    fn test_init_reply() {
        let mut driver = FreqManager::new(ClockPropertyChannel::new(Arc::new(FakeTransport)));
        let mut policy = CpufreqPolicy::new(0);

        let (len, reply) = dispatch(&mut driver, &mut policy, &CpufreqRequest::Init).unwrap();
        let response: InitResponse = postcard::from_bytes(&reply[..len]).unwrap();
        assert_eq!(response.min_freq, 200);
        assert_eq!(response.max_freq, 800);
        assert_eq!(response.transition_latency_ns, TRANSITION_LATENCY_NS);
        assert_eq!(response.table, FreqTable::build(200, 800));
    }

    #[test]
    fn test_get_frequency_reply() {
        let mut driver = FreqManager::new(ClockPropertyChannel::new(Arc::new(FakeTransport)));
        let mut policy = CpufreqPolicy::new(0);
        dispatch(&mut driver, &mut policy, &CpufreqRequest::Init).unwrap();

        let (len, reply) =
            dispatch(&mut driver, &mut policy, &CpufreqRequest::GetFrequency { cpu: 0 }).unwrap();
        let response: GetFrequencyResponse = postcard::from_bytes(&reply[..len]).unwrap();
        assert_eq!(response.freq, 800);
    }

    #[test]
    fn test_target_index_no_reply_data() {
        let mut driver = FreqManager::new(ClockPropertyChannel::new(Arc::new(FakeTransport)));
        let mut policy = CpufreqPolicy::new(0);
        dispatch(&mut driver, &mut policy, &CpufreqRequest::Init).unwrap();

        let (len, _reply) =
            dispatch(&mut driver, &mut policy, &CpufreqRequest::TargetIndex { index: 1 }).unwrap();
        assert_eq!(len, 0);
    }

    #[test]
    fn test_garbage_request() {
        let mut driver = FreqManager::new(ClockPropertyChannel::new(Arc::new(FakeTransport)));
        let mut policy = CpufreqPolicy::new(0);

        let mut reply_buffer = [0u8; CPUFREQ_REQUEST_DATA_SIZE];
        assert_eq!(
            cpufreq_request(&mut driver, &mut policy, &[0xff, 0xff], &mut reply_buffer).err(),
            Some(CpufreqError::DeserializeFailed)
        );
    }
}
