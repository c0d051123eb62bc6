//! Viewer configuration.

use crate::render::OverlayStyle;
use crate::threshold::ThresholdConfig;

/// Base address of the map service used by default.
pub const DEFAULT_API_BASE: &str = "http://localhost:5000";
/// Location of the template volume, relative to the API base.
pub const DEFAULT_BACKGROUND: &str = "static/mni_2mm.nii.gz";

/// Parameters of the map computed for an overlay query. They are passed
/// along with the query and do not affect rendering.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SamplingParams {
    /// Resampled voxel size, in millimeters
    pub voxel: f32,
    /// Smoothing kernel width at half maximum, in millimeters
    pub fwhm: f32,
    /// Smoothing kernel name
    pub kernel: String,
    /// Correlation radius, in millimeters
    pub radius: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        SamplingParams {
            voxel: 2.,
            fwhm: 10.,
            kernel: "gauss".to_string(),
            radius: 6.,
        }
    }
}

impl SamplingParams {
    /// The parameters as request query pairs, in the order the service
    /// expects them.
    pub fn query_pairs(&self) -> [(&'static str, String); 4] {
        [
            ("voxel", self.voxel.to_string()),
            ("fwhm", self.fwhm.to_string()),
            ("kernel", self.kernel.clone()),
            ("r", self.radius.to_string()),
        ]
    }
}

/// Initial settings of a viewer session.
///
/// # Example
///
/// ```
/// use niiview::{ThresholdConfig, ViewerOptions};
///
/// let options = ViewerOptions::new()
///     .api_base("https://maps.example.org/api")
///     .query("amygdala")
///     .threshold(ThresholdConfig::value(2.3));
/// assert_eq!(options.get_query(), Some("amygdala"));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ViewerOptions {
    api_base: String,
    background: String,
    query: Option<String>,
    sampling: SamplingParams,
    threshold: ThresholdConfig,
    style: OverlayStyle,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        ViewerOptions {
            api_base: DEFAULT_API_BASE.to_string(),
            background: DEFAULT_BACKGROUND.to_string(),
            query: None,
            sampling: SamplingParams::default(),
            threshold: ThresholdConfig::default(),
            style: OverlayStyle::default(),
        }
    }
}

impl ViewerOptions {
    /// Options with every default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Base address of the map service.
    pub fn api_base<S: Into<String>>(mut self, api_base: S) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Location of the background volume, absolute or relative to the API
    /// base.
    pub fn background<S: Into<String>>(mut self, background: S) -> Self {
        self.background = background.into();
        self
    }

    /// Overlay query to load at start.
    pub fn query<S: Into<String>>(mut self, query: S) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Sampling parameters of the overlay.
    pub fn sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    /// Initial overlay threshold.
    pub fn threshold(mut self, threshold: ThresholdConfig) -> Self {
        self.threshold = threshold;
        self
    }

    /// Initial overlay style.
    pub fn style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    /// Base address of the map service.
    pub fn get_api_base(&self) -> &str {
        &self.api_base
    }

    /// Location of the background volume.
    pub fn get_background(&self) -> &str {
        &self.background
    }

    /// Overlay query to load at start, if any.
    pub fn get_query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Sampling parameters of the overlay.
    pub fn get_sampling(&self) -> &SamplingParams {
        &self.sampling
    }

    /// Initial overlay threshold.
    pub fn get_threshold(&self) -> ThresholdConfig {
        self.threshold
    }

    /// Initial overlay style.
    pub fn get_style(&self) -> OverlayStyle {
        self.style
    }
}

#[cfg(test)]
mod tests {
    use super::{SamplingParams, ViewerOptions, DEFAULT_BACKGROUND};
    use crate::threshold::ThresholdMode;

    #[test]
    fn defaults() {
        let options = ViewerOptions::new();
        assert_eq!(options.get_background(), DEFAULT_BACKGROUND);
        assert_eq!(options.get_query(), None);
        assert_eq!(options.get_threshold().mode, ThresholdMode::Percentile);
        assert_eq!(options.get_threshold().percentile, 95.);
        assert_eq!(options.get_style().alpha, 0.5);
        assert!(options.get_style().pos_only);
        assert!(!options.get_style().use_abs);
    }

    #[test]
    fn numbers_are_written_short() {
        let pairs = SamplingParams::default().query_pairs();
        assert_eq!(pairs[0], ("voxel", "2".to_string()));
        assert_eq!(pairs[1], ("fwhm", "10".to_string()));
        assert_eq!(pairs[2], ("kernel", "gauss".to_string()));
        assert_eq!(pairs[3], ("r", "6".to_string()));

        let sampling = SamplingParams {
            fwhm: 7.5,
            radius: 0.1,
            ..SamplingParams::default()
        };
        let pairs = sampling.query_pairs();
        assert_eq!(pairs[1].1, "7.5");
        assert_eq!(pairs[3].1, "0.1");
    }
}
