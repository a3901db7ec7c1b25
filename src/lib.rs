//! # Trade Volume
//!
//! Umbrella crate for monthly trade-volume forecasting.
//!
//! - [`math`]: scaling, kernels, differencing and dense solves
//! - [`forecast`]: windowing, model selection, training and forecasting
//!
//! ## Example
//!
//! ```
//! use trade_volume::forecast::{MethodKind, WindowGeometry};
//!
//! let geometry = WindowGeometry::default();
//! assert_eq!(geometry.row_count(48), 3);
//! assert_eq!(MethodKind::from_method_name("exports_hybrid").unwrap(), MethodKind::Hybrid);
//! ```

pub use trade_math as math;
pub use volume_forecast as forecast;

/// Methods trained for every dataset, in training order
pub fn methods() -> [forecast::MethodKind; 4] {
    forecast::MethodKind::ALL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_methods_in_training_order() {
        let names: Vec<&str> = methods().iter().map(|m| m.as_str()).collect();
        assert_eq!(names, vec!["autoregressive", "regression", "sequence", "hybrid"]);
    }

    #[test]
    fn test_reexports() {
        let scaler = math::MinMaxScaler::unit(&[0.0, 10.0]).unwrap();
        assert_eq!(math::Scaler::scale(&scaler, 5.0), 0.5);
    }
}
