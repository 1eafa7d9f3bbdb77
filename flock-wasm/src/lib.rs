use flock_core::{Flock, FlockConfig};
use flock_shared::{FlockSettings, FrameSnapshot, SettingsError, MAX_AGENTS};
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

#[cfg(not(target_arch = "wasm32"))]
fn log(s: &str) {
    eprintln!("{}", s);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

/// Flock driven by the page's render loop: call `step()` once per frame,
/// then copy `positions()` and `rotations()` into the instance transforms.
#[wasm_bindgen]
pub struct FlockSimulation {
    flock: Flock,
    frame: u64,
}

#[wasm_bindgen]
impl FlockSimulation {
    #[wasm_bindgen(constructor)]
    pub fn new(count: usize, seed: u32) -> FlockSimulation {
        if count > MAX_AGENTS {
            console_log!("Requested {} agents, capping at {}", count, MAX_AGENTS);
        }
        let count = count.min(MAX_AGENTS);
        let config = FlockConfig {
            count,
            ..FlockConfig::default()
        };
        console_log!("Initializing flock with {} agents (seed {})", count, seed);

        FlockSimulation {
            flock: Flock::with_seed(config, seed as u64),
            frame: 0,
        }
    }

    #[wasm_bindgen(js_name = fromSettingsJson)]
    pub fn from_settings_json(json: &str) -> Result<FlockSimulation, JsValue> {
        let settings =
            FlockSettings::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Self::from_settings(&settings).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn step(&mut self) {
        self.flock.step();
        self.frame += 1;
    }

    #[wasm_bindgen(js_name = agentCount)]
    pub fn agent_count(&self) -> usize {
        self.flock.len()
    }

    pub fn phase(&self) -> f64 {
        self.flock.phase()
    }

    /// Packed `x, y, z` per agent.
    pub fn positions(&self) -> Vec<f32> {
        self.flock
            .agents()
            .iter()
            .flat_map(|a| [a.position.x, a.position.y, a.position.z])
            .collect()
    }

    /// Packed quaternion `x, y, z, w` per agent.
    pub fn rotations(&self) -> Vec<f32> {
        self.flock
            .agents()
            .iter()
            .flat_map(|a| a.orientation.quaternion())
            .collect()
    }

    #[wasm_bindgen(js_name = snapshotJson)]
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.snapshot()).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl FlockSimulation {
    pub fn from_settings(settings: &FlockSettings) -> Result<FlockSimulation, SettingsError> {
        let config = settings.to_config()?;
        let flock = match settings.seed {
            Some(seed) => Flock::with_seed(config, seed),
            None => Flock::new(config),
        };
        console_log!(
            "Initializing flock with {} agents from settings",
            flock.len()
        );

        Ok(FlockSimulation { flock, frame: 0 })
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::capture(self.frame, self.flock.phase(), self.flock.agents())
    }
}
