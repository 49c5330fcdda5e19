use nalgebra::{Point2, Vector4};

/// Angles and angular velocities of both arms. Angles are in radians,
/// measured from the downward vertical.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct StateVector {
    pub theta1: f64,
    pub omega1: f64,
    pub theta2: f64,
    pub omega2: f64,
}

impl StateVector {
    pub fn new(theta1: f64, omega1: f64, theta2: f64, omega2: f64) -> Self {
        StateVector {
            theta1,
            omega1,
            theta2,
            omega2,
        }
    }

    /// Both arms released from rest.
    pub fn at_rest(theta1: f64, theta2: f64) -> Self {
        Self::new(theta1, 0.0, theta2, 0.0)
    }

    pub fn from_degrees(angle1_deg: f64, angle2_deg: f64) -> Self {
        Self::at_rest(angle1_deg.to_radians(), angle2_deg.to_radians())
    }

    pub fn as_vector(&self) -> Vector4<f64> {
        Vector4::new(self.theta1, self.omega1, self.theta2, self.omega2)
    }

    pub fn is_finite(&self) -> bool {
        self.as_vector().iter().all(|x| x.is_finite())
    }
}

impl From<Vector4<f64>> for StateVector {
    fn from(v: Vector4<f64>) -> Self {
        StateVector::new(v[0], v[1], v[2], v[3])
    }
}

impl From<StateVector> for Vector4<f64> {
    fn from(s: StateVector) -> Self {
        s.as_vector()
    }
}

/// Cartesian positions of the pivot and both masses.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Joints {
    pub pivot: Point2<f64>,
    pub joint1: Point2<f64>,
    pub joint2: Point2<f64>,
}

// One sampled instant of a run, ready for drawing.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub t: f64,
    pub state: StateVector,
    pub joints: Joints,
}

impl Frame {
    pub fn pivot(&self) -> Point2<f64> {
        self.joints.pivot
    }

    pub fn joint1(&self) -> Point2<f64> {
        self.joints.joint1
    }

    pub fn joint2(&self) -> Point2<f64> {
        self.joints.joint2
    }
}
