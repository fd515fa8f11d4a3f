//! Voice Rack
//!
//! A host-side owner for several voices. Voices live by value in a slot
//! map and are ticked one after another; none share mutable state. The
//! rack also knows how to save itself as JSON.
//!
//! New voices get their seed from the rack's own generator, so every voice
//! runs an independent stream while the whole rack stays reproducible.

use crate::mapper::Parameters;
use crate::rng::Rng;
use crate::voice::{ChannelInputs, Frame, Voice, VoiceConfig, CHANNELS};
use alloc::string::String;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a voice in a [`Rack`]
    pub struct VoiceId;
}

/// Current rack file format.
pub const RACK_VERSION: u32 = 1;

/// Error types for rack operations
#[derive(Debug)]
pub enum RackError {
    UnknownVoice,
    UnsupportedVersion(u32),
    Json(serde_json::Error),
}

impl core::fmt::Display for RackError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RackError::UnknownVoice => write!(f, "Unknown voice"),
            RackError::UnsupportedVersion(v) => write!(f, "Unsupported rack version: {}", v),
            RackError::Json(e) => write!(f, "Invalid rack JSON: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RackError {}

impl From<serde_json::Error> for RackError {
    fn from(e: serde_json::Error) -> Self {
        RackError::Json(e)
    }
}

struct Slot {
    name: String,
    voice: Voice,
    inputs: [ChannelInputs; CHANNELS],
}

pub struct Rack {
    voices: SlotMap<VoiceId, Slot>,
    sample_rate: u32,
    seeds: Rng,
}

impl Rack {
    /// An empty rack. `seed` drives the seeds handed to voices from [`add`](Self::add).
    pub fn new(sample_rate: u32, seed: u64) -> Self {
        Self {
            voices: SlotMap::with_key(),
            sample_rate: sample_rate.max(1),
            seeds: Rng::from_seed(seed),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Add a voice at the rack's sample rate with a fresh seed.
    pub fn add(&mut self, name: impl Into<String>) -> VoiceId {
        let config = VoiceConfig::default()
            .with_sample_rate(self.sample_rate)
            .with_seed(self.seeds.next_u64());
        self.add_voice(name, Voice::new(config))
    }

    /// Add an already configured voice.
    pub fn add_voice(&mut self, name: impl Into<String>, voice: Voice) -> VoiceId {
        self.voices.insert(Slot {
            name: name.into(),
            voice,
            inputs: [ChannelInputs::IDLE; CHANNELS],
        })
    }

    /// Take a voice out of the rack.
    pub fn remove(&mut self, id: VoiceId) -> Result<Voice, RackError> {
        self.voices
            .remove(id)
            .map(|slot| slot.voice)
            .ok_or(RackError::UnknownVoice)
    }

    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.get(id).map(|slot| &slot.voice)
    }

    pub fn voice_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.voices.get_mut(id).map(|slot| &mut slot.voice)
    }

    /// First voice with the given name.
    pub fn find(&self, name: &str) -> Option<VoiceId> {
        self.voices
            .iter()
            .find(|(_, slot)| slot.name == name)
            .map(|(id, _)| id)
    }

    /// Handles of every voice, in slot order.
    pub fn ids(&self) -> impl Iterator<Item = VoiceId> + '_ {
        self.voices.keys()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Set the gate/line inputs a voice sees from the next tick on.
    pub fn set_inputs(
        &mut self,
        id: VoiceId,
        inputs: [ChannelInputs; CHANNELS],
    ) -> Result<(), RackError> {
        let slot = self.voices.get_mut(id).ok_or(RackError::UnknownVoice)?;
        slot.inputs = inputs;
        Ok(())
    }

    /// Tick every voice once and mix, saturating.
    pub fn tick(&mut self) -> Frame {
        self.voices
            .values_mut()
            .fold(Frame::default(), |mix, slot| {
                mix.saturating_add(slot.voice.tick(&slot.inputs))
            })
    }

    /// Reset every voice. Parameters are kept.
    pub fn reset(&mut self) {
        for slot in self.voices.values_mut() {
            slot.voice.reset();
        }
    }

    /// Snapshot the rack as a serializable definition.
    pub fn to_def(&self) -> RackDef {
        RackDef {
            version: RACK_VERSION,
            sample_rate: self.sample_rate,
            voices: self
                .voices
                .values()
                .map(|slot| VoiceDef {
                    name: slot.name.clone(),
                    config: *slot.voice.config(),
                    params: *slot.voice.parameters(),
                })
                .collect(),
        }
    }

    /// Rebuild a rack. Voices keep their saved seeds; `seed` only drives
    /// voices added afterwards.
    pub fn from_def(def: &RackDef, seed: u64) -> Result<Self, RackError> {
        if def.version != RACK_VERSION {
            return Err(RackError::UnsupportedVersion(def.version));
        }
        let mut rack = Rack::new(def.sample_rate, seed);
        for voice_def in &def.voices {
            let mut voice = Voice::new(voice_def.config);
            voice.set_parameters(voice_def.params);
            rack.add_voice(voice_def.name.clone(), voice);
        }
        Ok(rack)
    }

    /// Serialize the rack as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, RackError> {
        Ok(self.to_def().to_json()?)
    }

    /// Parse and rebuild a rack. See [`from_def`](Self::from_def).
    pub fn from_json(json: &str, seed: u64) -> Result<Self, RackError> {
        Self::from_def(&RackDef::from_json(json)?, seed)
    }
}

/// Serializable rack definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RackDef {
    /// Schema version for forward compatibility
    pub version: u32,
    pub sample_rate: u32,
    pub voices: Vec<VoiceDef>,
}

impl RackDef {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Serializable voice definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceDef {
    pub name: String,
    pub config: VoiceConfig,
    pub params: Parameters,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::ParamId;
    use crate::noise::{CrackleConfig, NoiseMode};

    #[test]
    fn test_add_and_remove() {
        let mut rack = Rack::new(48_000, 1);
        let a = rack.add("a");
        let b = rack.add("b");
        assert_eq!(rack.len(), 2);
        assert_eq!(rack.find("b"), Some(b));
        assert_ne!(
            rack.voice(a).unwrap().config().seed,
            rack.voice(b).unwrap().config().seed
        );

        assert!(rack.remove(a).is_ok());
        assert!(matches!(rack.remove(a), Err(RackError::UnknownVoice)));
        assert!(rack.voice(a).is_none());
        assert_eq!(rack.ids().count(), 1);
    }

    #[test]
    fn test_empty_rack_is_silent() {
        let mut rack = Rack::new(48_000, 1);
        assert!(rack.is_empty());
        assert_eq!(rack.tick(), Frame::default());
    }

    #[test]
    fn test_mix_is_sum_of_voices() {
        let mut rack = Rack::new(48_000, 2);
        let a = rack.add("a");
        let b = rack.add("b");
        for id in [a, b] {
            let voice = rack.voice_mut(id).unwrap();
            voice.set_parameter(ParamId::Rate, 63);
            voice.set_parameter(ParamId::FilterMode, 0);
        }

        let mut solo_a = rack.voice(a).unwrap().clone();
        let mut solo_b = rack.voice(b).unwrap().clone();
        let idle = [ChannelInputs::IDLE; CHANNELS];
        for _ in 0..200 {
            let expected = solo_a.tick(&idle).saturating_add(solo_b.tick(&idle));
            assert_eq!(rack.tick(), expected);
        }
    }

    #[test]
    fn test_set_inputs() {
        let mut rack = Rack::new(48_000, 3);
        let id = rack.add("line");
        {
            let voice = rack.voice_mut(id).unwrap();
            voice.set_parameter(ParamId::Rate, 63);
            voice.set_parameter(ParamId::NoiseMode, 3);
            voice.set_parameter(ParamId::FilterMode, 0);
        }
        let inputs = [ChannelInputs::IDLE.with_line_in(16384); CHANNELS];
        rack.set_inputs(id, inputs).unwrap();
        assert_eq!(rack.tick(), Frame { left: 512, right: 512 });

        assert!(rack.remove(id).is_ok());
        assert!(rack.set_inputs(id, inputs).is_err());
    }

    #[test]
    fn test_json_roundtrip_reproduces_audio() {
        let mut rack = Rack::new(44_100, 4);
        let id = rack.add("crackle");
        rack.voice_mut(id)
            .unwrap()
            .set_parameter(ParamId::NoiseMode, 2);
        rack.add("white");

        let json = rack.to_json().unwrap();
        let mut loaded = Rack::from_json(&json, 0).unwrap();
        assert_eq!(loaded.to_def(), rack.to_def());
        assert_eq!(loaded.sample_rate(), 44_100);

        for _ in 0..500 {
            assert_eq!(loaded.tick(), rack.tick());
        }
    }

    #[test]
    fn test_rejects_unknown_version() {
        use alloc::string::ToString;

        let mut def = Rack::new(48_000, 5).to_def();
        def.version = 99;
        let err = Rack::from_def(&def, 0).err().unwrap();
        assert!(matches!(err, RackError::UnsupportedVersion(99)));
        assert_eq!(err.to_string(), "Unsupported rack version: 99");
    }

    #[test]
    fn test_loaded_crackle_config_is_clamped() {
        let mut def = Rack::new(48_000, 6).to_def();
        let mut config = VoiceConfig::default().with_seed(6);
        config.crackle = CrackleConfig {
            ceiling: u32::MAX,
            decay_num: 2_000_000_000,
            decay_den: 4,
        };
        def.voices.push(VoiceDef {
            name: "wild".into(),
            config,
            params: Parameters::new()
                .with(ParamId::NoiseMode, NoiseMode::Crackle.to_param())
                .with(ParamId::Rate, 0),
        });

        let json = def.to_json().unwrap();
        let mut rack = Rack::from_json(&json, 0).unwrap();
        let id = rack.find("wild").unwrap();
        assert_eq!(
            rack.voice(id).unwrap().config().crackle,
            CrackleConfig {
                ceiling: 2048,
                decay_num: 4,
                decay_den: 4,
            }
        );

        let mut fired = false;
        for _ in 0..48_000 {
            rack.tick();
            fired |= rack.voice(id).unwrap().last_noise(0) != 0;
        }
        assert!(fired);
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            Rack::from_json("{ not json", 0),
            Err(RackError::Json(_))
        ));
    }
}
