//! Audio interface
//!
//! Raw waveform playback and recording, stored sample management, tone
//! sequencing and mixer level control. The richest interface in the
//! protocol: four data shapes and six request/reply pairs.

use bytes::Bytes;

use crate::client::{Latch, Sender};
use crate::protocol::{
    BodyReader, DeviceAddress, MessageHeader, Result, XdrDecoder, XdrEncoder,
};

use super::{Device, DeviceCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DATA_WAV_REC: u32 = 1;
const DATA_SEQ: u32 = 2;
const DATA_MIXER_CHANNEL: u32 = 3;
const DATA_STATE: u32 = 4;

const CMD_WAV_PLAY: u32 = 1;
const CMD_WAV_STREAM_REC: u32 = 2;
const CMD_SAMPLE_PLAY: u32 = 3;
const CMD_SEQ_PLAY: u32 = 4;
const CMD_MIXER_CHANNEL: u32 = 5;

const REQ_WAV_REC: u32 = 1;
const REQ_SAMPLE_LOAD: u32 = 2;
const REQ_SAMPLE_RETRIEVE: u32 = 3;
const REQ_SAMPLE_REC: u32 = 4;
const REQ_MIXER_CHANNEL_LIST: u32 = 5;
const REQ_MIXER_CHANNEL_LEVEL: u32 = 6;

/// A digitized waveform
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AudioWav {
    /// Raw sample bytes
    #[cfg_attr(feature = "serde", serde(skip))]
    pub data: Bytes,
    /// Format code (bit depth, channels, rate)
    pub format: i32,
}

/// One tone in a sequence
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AudioSeqItem {
    /// Frequency [Hz]
    pub frequency: f32,
    /// Duration [s]
    pub duration: f32,
    /// Amplitude [dB]
    pub amplitude: f32,
    /// Whether the tone links seamlessly to the next one
    pub link: bool,
}

impl AudioSeqItem {
    /// Wire stride per tone
    pub const WIRE_SIZE: usize = 16;

    fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        Ok(Self {
            frequency: dec.f32()?,
            duration: dec.f32()?,
            amplitude: dec.f32()?,
            link: dec.boolean()?,
        })
    }

    fn encode(&self, enc: &mut XdrEncoder) {
        enc.f32(self.frequency);
        enc.f32(self.duration);
        enc.f32(self.amplitude);
        enc.boolean(self.link);
    }
}

/// Level and state of one mixer channel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AudioMixerChannel {
    /// Level [0.0 .. 1.0]
    pub amplitude: f32,
    /// Whether the channel is active
    pub active: bool,
    /// Channel index
    pub index: i32,
}

impl AudioMixerChannel {
    /// Wire stride per channel
    pub const WIRE_SIZE: usize = 12;

    fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        Ok(Self {
            amplitude: dec.f32()?,
            active: dec.boolean()?,
            index: dec.i32()?,
        })
    }

    fn encode(&self, enc: &mut XdrEncoder) {
        enc.f32(self.amplitude);
        enc.boolean(self.active);
        enc.i32(self.index);
    }
}

/// Capabilities of one mixer channel
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AudioMixerChannelDetail {
    /// Channel name
    pub name: String,
    /// Capability bits (input, output)
    pub caps: u8,
}

/// Mixer channel listing with the default routing
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AudioMixerDetails {
    /// Per-channel details
    pub channels: Vec<AudioMixerChannelDetail>,
    /// Default output channel index
    pub default_output: i32,
    /// Default input channel index
    pub default_input: i32,
}

/// A stored sample slot paired with its waveform
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AudioSample {
    /// The waveform
    pub sample: AudioWav,
    /// Storage index on the device
    pub index: i32,
}

/// Audio device interface
pub struct Audio {
    core: DeviceCore,
    wav: Latch<AudioWav>,
    sample: Latch<AudioSample>,
    seq: Latch<Vec<AudioSeqItem>>,
    channels: Latch<Vec<AudioMixerChannel>>,
    details: Latch<AudioMixerDetails>,
    state: Latch<i32>,
}

impl Audio {
    /// Interface code
    pub const CODE: u16 = 9;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("audio", address, sender),
            wav: Latch::new(),
            sample: Latch::new(),
            seq: Latch::new(),
            channels: Latch::new(),
            details: Latch::new(),
            state: Latch::new(),
        }
    }

    fn decode_wav(body: &mut BodyReader<'_>) -> Result<AudioWav> {
        let count = body.read_array_prefix()? as usize;
        let data = body.read_buf(count)?;
        body.skip_padding(count)?;
        let buf = body.read_buf(4)?;
        let format = XdrDecoder::new(&buf).i32()?;
        Ok(AudioWav { data, format })
    }

    fn decode_channels(body: &mut BodyReader<'_>) -> Result<Vec<AudioMixerChannel>> {
        let count = body.read_array_prefix()? as usize;
        body.read_elements(count, AudioMixerChannel::WIRE_SIZE, AudioMixerChannel::decode)
    }

    fn encode_wav(wav: &AudioWav) -> Bytes {
        let mut enc = XdrEncoder::with_capacity(12 + wav.data.len());
        enc.array_len(wav.data.len() as u32);
        enc.opaque(&wav.data);
        enc.i32(wav.format);
        enc.into_bytes()
    }

    /// Play a raw waveform
    pub fn play_waveform(&self, wav: &AudioWav) -> Result<()> {
        self.core.command(CMD_WAV_PLAY, &Self::encode_wav(wav))
    }

    /// Start or stop stream recording; recorded blocks arrive as
    /// `WAV_REC` data messages.
    pub fn record_wav_stream(&self, state: i32) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(4);
        enc.i32(state);
        self.core.command(CMD_WAV_STREAM_REC, &enc.into_bytes())
    }

    /// Play a pre-stored sample by index
    pub fn play_sample(&self, index: i32) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(4);
        enc.i32(index);
        self.core.command(CMD_SAMPLE_PLAY, &enc.into_bytes())
    }

    /// Play a sequence of tones
    pub fn play_sequence(&self, tones: &[AudioSeqItem]) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(8 + tones.len() * AudioSeqItem::WIRE_SIZE);
        enc.array_len(tones.len() as u32);
        for tone in tones {
            tone.encode(&mut enc);
        }
        self.core.command(CMD_SEQ_PLAY, &enc.into_bytes())
    }

    /// Set the level of a single mixer channel
    pub fn set_mixer_channel(&self, channel: AudioMixerChannel) -> Result<()> {
        self.set_mixer_channels(&[channel])
    }

    /// Set levels for several mixer channels at once
    pub fn set_mixer_channels(&self, channels: &[AudioMixerChannel]) -> Result<()> {
        let mut enc =
            XdrEncoder::with_capacity(8 + channels.len() * AudioMixerChannel::WIRE_SIZE);
        enc.array_len(channels.len() as u32);
        for channel in channels {
            channel.encode(&mut enc);
        }
        self.core.command(CMD_MIXER_CHANNEL, &enc.into_bytes())
    }

    /// Record one fixed-size waveform; the reply lands in [`Audio::waveform`]
    pub fn record_waveform(&self) -> Result<()> {
        self.core.request(REQ_WAV_REC, &[])
    }

    /// Store a sample on the device. Null response.
    pub fn load_sample(&self, index: i32, wav: &AudioWav) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(16 + wav.data.len());
        enc.array_len(wav.data.len() as u32);
        enc.opaque(&wav.data);
        enc.i32(wav.format);
        enc.i32(index);
        self.core.request(REQ_SAMPLE_LOAD, &enc.into_bytes())
    }

    /// Fetch a stored sample; the reply lands in [`Audio::sample`]
    pub fn retrieve_sample(&self, index: i32) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(4);
        enc.i32(index);
        self.core.request(REQ_SAMPLE_RETRIEVE, &enc.into_bytes())
    }

    /// Record into a stored sample slot. Null response.
    pub fn record_sample(&self, index: i32, length: i32) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(8);
        enc.i32(index);
        enc.i32(length);
        self.core.request(REQ_SAMPLE_REC, &enc.into_bytes())
    }

    /// Request the mixer channel listing; the reply lands in
    /// [`Audio::mixer_details`]
    pub fn query_mixer_details(&self) -> Result<()> {
        self.core.request(REQ_MIXER_CHANNEL_LIST, &[])
    }

    /// Request the current mixer levels; the reply lands in
    /// [`Audio::mixer_channels`]
    pub fn query_mixer_levels(&self) -> Result<()> {
        self.core.request(REQ_MIXER_CHANNEL_LEVEL, &[])
    }

    /// Most recent recorded waveform
    #[must_use]
    pub fn waveform(&self) -> Option<AudioWav> {
        self.wav.get()
    }

    /// Edge-triggered readiness for the waveform slot
    #[must_use]
    pub fn is_waveform_ready(&self) -> bool {
        self.wav.take_ready()
    }

    /// Most recent retrieved sample
    #[must_use]
    pub fn sample(&self) -> Option<AudioSample> {
        self.sample.get()
    }

    /// Edge-triggered readiness for the sample slot
    #[must_use]
    pub fn is_sample_ready(&self) -> bool {
        self.sample.take_ready()
    }

    /// Most recent tone sequence
    #[must_use]
    pub fn sequence(&self) -> Option<Vec<AudioSeqItem>> {
        self.seq.get()
    }

    /// Edge-triggered readiness for the sequence slot
    #[must_use]
    pub fn is_sequence_ready(&self) -> bool {
        self.seq.take_ready()
    }

    /// Most recent mixer levels
    #[must_use]
    pub fn mixer_channels(&self) -> Option<Vec<AudioMixerChannel>> {
        self.channels.get()
    }

    /// Edge-triggered readiness for the mixer level slot
    #[must_use]
    pub fn is_mixer_channels_ready(&self) -> bool {
        self.channels.take_ready()
    }

    /// Most recent mixer channel listing
    #[must_use]
    pub fn mixer_details(&self) -> Option<AudioMixerDetails> {
        self.details.get()
    }

    /// Edge-triggered readiness for the mixer listing slot
    #[must_use]
    pub fn is_mixer_details_ready(&self) -> bool {
        self.details.take_ready()
    }

    /// Most recent device state word
    #[must_use]
    pub fn state(&self) -> Option<i32> {
        self.state.get()
    }

    /// Edge-triggered readiness for the state slot
    #[must_use]
    pub fn is_state_ready(&self) -> bool {
        self.state.take_ready()
    }

    /// Server timestamp of the most recent message [s]
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        self.core.timestamp()
    }
}

impl Device for Audio {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_WAV_REC => {
                self.core.touch(header);
                let wav = Self::decode_wav(body)?;
                self.wav.publish(wav);
                Ok(())
            }
            DATA_SEQ => {
                self.core.touch(header);
                let count = body.read_array_prefix()? as usize;
                let tones =
                    body.read_elements(count, AudioSeqItem::WIRE_SIZE, AudioSeqItem::decode)?;
                self.seq.publish(tones);
                Ok(())
            }
            DATA_MIXER_CHANNEL => {
                self.core.touch(header);
                let channels = Self::decode_channels(body)?;
                self.channels.publish(channels);
                Ok(())
            }
            DATA_STATE => {
                self.core.touch(header);
                let buf = body.read_buf(4)?;
                self.state.publish(XdrDecoder::new(&buf).i32()?);
                Ok(())
            }
            _ => self.core.skip_unknown(header, body),
        }
    }

    fn on_response(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            REQ_WAV_REC => {
                self.core.touch(header);
                let wav = Self::decode_wav(body)?;
                self.wav.publish(wav);
                Ok(())
            }
            REQ_SAMPLE_RETRIEVE => {
                self.core.touch(header);
                let sample = Self::decode_wav(body)?;
                let buf = body.read_buf(4)?;
                let index = XdrDecoder::new(&buf).i32()?;
                self.sample.publish(AudioSample {
                    sample,
                    index,
                });
                Ok(())
            }
            REQ_MIXER_CHANNEL_LEVEL => {
                self.core.touch(header);
                let channels = Self::decode_channels(body)?;
                self.channels.publish(channels);
                Ok(())
            }
            REQ_MIXER_CHANNEL_LIST => {
                self.core.touch(header);
                let count = body.read_array_prefix()? as usize;

                let mut channels = Vec::with_capacity(count);
                for _ in 0..count {
                    // each detail: name_count, then string prefix + bytes
                    // + padding, then caps
                    let buf = body.read_buf(4)?;
                    let name_count = XdrDecoder::new(&buf).u32()? as usize;

                    let rest = body.read_buf(
                        4 + name_count + crate::protocol::xdr_padding(name_count) + 4,
                    )?;
                    let mut dec = XdrDecoder::new(&rest);
                    let _prefix = dec.u32()?;
                    let raw = dec.opaque(name_count)?;
                    dec.skip(crate::protocol::xdr_padding(name_count))?;
                    let caps = dec.byte()?;

                    channels.push(AudioMixerChannelDetail {
                        name: String::from_utf8(raw.to_vec())?,
                        caps,
                    });
                }

                let buf = body.read_buf(8)?;
                let mut dec = XdrDecoder::new(&buf);
                let default_output = dec.i32()?;
                let default_input = dec.i32()?;

                self.details.publish(AudioMixerDetails {
                    channels,
                    default_output,
                    default_input,
                });
                Ok(())
            }
            REQ_SAMPLE_LOAD | REQ_SAMPLE_REC => Ok(()),
            _ => self.core.skip_unknown(header, body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::test_support::{capture_sender, data_header, feed, null_sender, response_header, take_sent};
    use crate::protocol::{MessageType, xdr_padding};

    #[test]
    fn waveform_with_odd_length_roundtrips() {
        let (sender, rx) = capture_sender();
        let tx = Audio::new(DeviceAddress::new(Audio::CODE, 0), sender);

        let wav = AudioWav {
            data: Bytes::from_static(&[1, 2, 3, 4, 5]),
            format: 7,
        };
        tx.play_waveform(&wav).unwrap();

        let (header, body) = take_sent(&rx);
        assert_eq!(header.msg_type(), MessageType::Command);
        assert_eq!(header.subtype(), CMD_WAV_PLAY);
        assert_eq!(body.len(), 8 + 5 + xdr_padding(5) + 4);

        let rx_iface = Audio::new(DeviceAddress::new(Audio::CODE, 0), null_sender());
        feed(
            &rx_iface,
            &data_header(Audio::CODE, DATA_WAV_REC, body.len()),
            &body,
        )
        .unwrap();

        assert!(rx_iface.is_waveform_ready());
        let decoded = rx_iface.waveform().unwrap();
        assert_eq!(decoded.data.as_ref(), wav.data.as_ref());
        assert_eq!(decoded.format, 7);
    }

    #[test]
    fn tone_sequence_roundtrips() {
        let (sender, rx) = capture_sender();
        let tx = Audio::new(DeviceAddress::new(Audio::CODE, 0), sender);

        let tones = [
            AudioSeqItem {
                frequency: 440.0,
                duration: 0.5,
                amplitude: -6.0,
                link: true,
            },
            AudioSeqItem {
                frequency: 880.0,
                duration: 0.25,
                amplitude: -3.0,
                link: false,
            },
        ];
        tx.play_sequence(&tones).unwrap();

        let (_, body) = take_sent(&rx);
        assert_eq!(body.len(), 8 + 2 * AudioSeqItem::WIRE_SIZE);

        let rx_iface = Audio::new(DeviceAddress::new(Audio::CODE, 0), null_sender());
        feed(
            &rx_iface,
            &data_header(Audio::CODE, DATA_SEQ, body.len()),
            &body,
        )
        .unwrap();

        assert_eq!(rx_iface.sequence().unwrap().as_slice(), &tones);
    }

    #[test]
    fn mixer_levels_via_data_and_response() {
        let iface = Audio::new(DeviceAddress::new(Audio::CODE, 0), null_sender());

        let mut enc = XdrEncoder::new();
        enc.array_len(1);
        AudioMixerChannel {
            amplitude: 0.8,
            active: true,
            index: 2,
        }
        .encode(&mut enc);
        let payload = enc.into_bytes();

        feed(
            &iface,
            &data_header(Audio::CODE, DATA_MIXER_CHANNEL, payload.len()),
            &payload,
        )
        .unwrap();
        assert!(iface.is_mixer_channels_ready());

        feed(
            &iface,
            &response_header(Audio::CODE, REQ_MIXER_CHANNEL_LEVEL, payload.len()),
            &payload,
        )
        .unwrap();
        let channels = iface.mixer_channels().unwrap();
        assert_eq!(channels[0].index, 2);
        assert!(channels[0].active);
    }

    #[test]
    fn mixer_detail_listing_decode() {
        let iface = Audio::new(DeviceAddress::new(Audio::CODE, 0), null_sender());

        let mut enc = XdrEncoder::new();
        enc.array_len(2);
        for (name, caps) in [("pcm", 1u8), ("mic boost", 2)] {
            enc.u32(name.len() as u32);
            enc.u32(name.len() as u32);
            enc.opaque(name.as_bytes());
            enc.byte(caps);
        }
        enc.i32(0);
        enc.i32(1);
        let payload = enc.into_bytes();

        feed(
            &iface,
            &response_header(Audio::CODE, REQ_MIXER_CHANNEL_LIST, payload.len()),
            &payload,
        )
        .unwrap();

        let details = iface.mixer_details().unwrap();
        assert_eq!(details.channels.len(), 2);
        assert_eq!(details.channels[1].name, "mic boost");
        assert_eq!(details.channels[1].caps, 2);
        assert_eq!(details.default_input, 1);
    }

    #[test]
    fn retrieved_sample_carries_index() {
        let iface = Audio::new(DeviceAddress::new(Audio::CODE, 0), null_sender());

        let mut enc = XdrEncoder::new();
        enc.array_len(4);
        enc.opaque(&[9, 9, 9, 9]);
        enc.i32(3);
        enc.i32(5);
        let payload = enc.into_bytes();

        feed(
            &iface,
            &response_header(Audio::CODE, REQ_SAMPLE_RETRIEVE, payload.len()),
            &payload,
        )
        .unwrap();

        let sample = iface.sample().unwrap();
        assert_eq!(sample.index, 5);
        assert_eq!(sample.sample.format, 3);
    }
}
