use crate::state::StateVector;

// Release angles in degrees, measured from the downward vertical.
// Both arms start at rest.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct InitialConditions {
    pub angle1_deg: f64,
    pub angle2_deg: f64,
}

impl Default for InitialConditions {
    fn default() -> Self {
        InitialConditions {
            angle1_deg: 128.4,
            angle2_deg: 133.4,
        }
    }
}

impl InitialConditions {
    pub fn new(angle1_deg: f64, angle2_deg: f64) -> Self {
        InitialConditions {
            angle1_deg,
            angle2_deg,
        }
    }

    pub fn state(&self) -> StateVector {
        StateVector::from_degrees(self.angle1_deg, self.angle2_deg)
    }
}
