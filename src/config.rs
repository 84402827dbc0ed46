use serde::{Deserialize, Serialize};

use crate::circuit_sim::Steps;
use crate::error::EngineError;

pub const DEFAULT_MAX_STEPS: Steps = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Events processed by one drain before it gives up with an oscillation status.
    pub max_steps: Steps,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl EngineConfig {
    pub fn with_max_steps(max_steps: Steps) -> Result<Self, EngineError> {
        Self { max_steps }.validated()
    }

    /// Parses a JSON document such as `{"maxSteps": 5000}`. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|err| EngineError::Config(err.to_string()))?;
        config.validated()
    }

    pub fn validated(self) -> Result<Self, EngineError> {
        if self.max_steps == 0 {
            return Err(EngineError::Config("maxSteps must be at least 1".to_string()));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        assert_eq!(EngineConfig::default().max_steps, 1000);
        assert_eq!(EngineConfig::from_json("{}").unwrap().max_steps, 1000);
    }

    #[test]
    fn json_overrides() {
        let config = EngineConfig::from_json(r#"{"maxSteps": 64}"#).unwrap();
        assert_eq!(config.max_steps, 64);
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"maxSteps": 0}"#),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json("max_steps = 3"),
            Err(EngineError::Config(_))
        ));
        assert!(EngineConfig::with_max_steps(0).is_err());
    }
}
