use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Distance (m) over which the slope must stay below β to fix the runout point.
pub const PERSISTENCE_DISTANCE_M: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpMethod {
    Nearest,
    #[default]
    Bilinear,
}

/// Parameters of one batch analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Full width (m) of the sampling domain around the path.
    pub domain_width: f64,
    /// Peak pressure (kPa) above which a cell counts as affected.
    pub pressure_limit: f64,
    pub interp_method: InterpMethod,
    /// Slope angle β (degrees) defining the start of the runout zone.
    pub runout_angle_deg: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            domain_width: 600.0,
            pressure_limit: 1.0,
            interp_method: InterpMethod::Bilinear,
            runout_angle_deg: 20.0,
        }
    }
}

impl AnalysisParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.domain_width.is_finite() && self.domain_width > 0.0) {
            return Err(AnalysisError::InvalidParameter {
                name: "domain_width",
                value: self.domain_width,
            });
        }
        if !self.pressure_limit.is_finite() {
            return Err(AnalysisError::InvalidParameter {
                name: "pressure_limit",
                value: self.pressure_limit,
            });
        }
        if !(self.runout_angle_deg > 0.0 && self.runout_angle_deg < 90.0) {
            return Err(AnalysisError::InvalidParameter {
                name: "runout_angle_deg",
                value: self.runout_angle_deg,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let p: AnalysisParams =
            serde_json::from_str(r#"{"pressure_limit": 3.0, "interp_method": "nearest"}"#).unwrap();
        assert_eq!(p.pressure_limit, 3.0);
        assert_eq!(p.interp_method, InterpMethod::Nearest);
        assert_eq!(p.domain_width, 600.0);
        assert_eq!(p.runout_angle_deg, 20.0);
    }

    #[test]
    fn validate_rejects_bad_width_and_angle() {
        let mut p = AnalysisParams::default();
        assert!(p.validate().is_ok());
        p.domain_width = 0.0;
        assert!(matches!(
            p.validate(),
            Err(AnalysisError::InvalidParameter { name: "domain_width", .. })
        ));
        p.domain_width = 20.0;
        p.runout_angle_deg = 95.0;
        assert!(matches!(
            p.validate(),
            Err(AnalysisError::InvalidParameter { name: "runout_angle_deg", .. })
        ));
    }
}
