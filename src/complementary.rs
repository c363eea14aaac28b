//! The complementary filter.
//!
//! The filter blends a short-term estimate, obtained by integrating the
//! gyroscope rate onto the previous output, with the long-term accelerometer
//! angle:
//!
//! $$\theta_{k+1} = \alpha (\theta_k + \dot\theta_{gyro} \Delta t) + (1 - \alpha) \theta_{acc}$$

use crate::{
    error::{check_alpha, check_time_step, FusionError},
    simulator::SensorReading,
};

/// State of a complementary filter.
///
/// The fused angle is only ever changed by [`FusionState::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawFusionState"))]
pub struct FusionState {
    /// Weight of the gyro-integrated estimate, in `[0, 1]`.
    ///
    /// Values close to `1.0` trust the gyroscope, values close to `0.0` trust
    /// the accelerometer.
    alpha: f32,
    /// The latest filter output, in degrees.
    fused_angle: f32,
}

/// Unchecked wire form of [`FusionState`], validated on conversion.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawFusionState {
    alpha: f32,
    fused_angle: f32,
}

#[cfg(feature = "serde")]
impl TryFrom<RawFusionState> for FusionState {
    type Error = FusionError;

    fn try_from(raw: RawFusionState) -> Result<Self, Self::Error> {
        Self::new(raw.alpha, raw.fused_angle)
    }
}

impl FusionState {
    /// Initialize the filter with the weight `alpha` and the angle the
    /// estimate starts from.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidAlpha`] if `alpha` is outside `[0, 1]`.
    ///
    /// # Example
    ///
    /// ```
    /// use complementary_fusion::{FusionState, SensorReading};
    ///
    /// let mut state = FusionState::new(0.5, 0.0)?;
    /// let reading = SensorReading { accel_angle: 10.0, gyro_rate: 0.0 };
    ///
    /// assert_eq!(state.update(reading, 1.0)?, 5.0);
    /// assert_eq!(state.fused_angle(), 5.0);
    /// # Ok::<(), complementary_fusion::FusionError>(())
    /// ```
    pub fn new(alpha: f32, starting_angle: f32) -> Result<Self, FusionError> {
        check_alpha(alpha)?;
        Ok(Self {
            alpha,
            fused_angle: starting_angle,
        })
    }

    /// The filter weight.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// The current angle estimate in degrees.
    #[must_use]
    pub fn fused_angle(&self) -> f32 {
        self.fused_angle
    }

    /// The estimate obtained by integrating only the gyroscope rate over `dt`.
    #[inline]
    #[must_use]
    pub fn gyro_integrated(&self, reading: SensorReading, dt: f32) -> f32 {
        self.fused_angle + reading.gyro_rate * dt
    }

    /// Fuse one reading taken `dt` seconds after the previous one, store and
    /// return the new estimate.
    ///
    /// The result always lies between the gyro-integrated estimate and the
    /// accelerometer angle.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidTimeStep`] if `dt` is not strictly
    /// positive, in which case the state is left unchanged.
    pub fn update(&mut self, reading: SensorReading, dt: f32) -> Result<f32, FusionError> {
        check_time_step(dt)?;

        let gyro_angle = self.gyro_integrated(reading, dt);
        self.fused_angle = self.alpha * gyro_angle + (1.0 - self.alpha) * reading.accel_angle;
        Ok(self.fused_angle)
    }
}

/// Create a new [`FusionState`].
///
/// # Errors
///
/// See [`FusionState::new`].
pub fn init_fusion(alpha: f32, starting_angle: f32) -> Result<FusionState, FusionError> {
    FusionState::new(alpha, starting_angle)
}

/// Run one filter update on `state`.
///
/// # Errors
///
/// See [`FusionState::update`].
pub fn update_fusion(
    state: &mut FusionState,
    reading: SensorReading,
    dt: f32,
) -> Result<f32, FusionError> {
    state.update(reading, dt)
}
