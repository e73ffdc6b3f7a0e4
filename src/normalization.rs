use serde::{Serialize, Deserialize};
use color_eyre::eyre::{Result, bail};

use crate::augmentation::{Transform, state::SampleRandomState};
use crate::data::Data;
use crate::image::Image;
use crate::Float;

#[derive(Debug,Copy,Clone,PartialEq,Serialize,Deserialize)]
pub struct ValueRange {
    pub min: Float,
    pub max: Float
}

impl ValueRange {
    pub fn new(min: Float, max: Float) -> Result<ValueRange> {
        if !min.is_finite() || !max.is_finite() || min > max {
            bail!("invalid value range [{}, {}]", min, max);
        }
        Ok(ValueRange{min,max})
    }

    pub fn contains(&self, value: Float) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn span(&self) -> Float {
        self.max - self.min
    }
}

/**
 * Linear map of depth from its declared range onto [0,1]. Out of range values are clipped,
 * invalid (zero or non finite) depth stays zero.
 */
#[derive(Debug,Copy,Clone,PartialEq)]
pub struct DepthNormalization {
    pub range: ValueRange
}

impl DepthNormalization {
    pub fn new(range: ValueRange) -> Result<DepthNormalization> {
        if !(range.span() > 0.0) {
            bail!("depth normalization needs a non empty range, got {:?}", range);
        }
        Ok(DepthNormalization{range})
    }

    pub fn normalize_value(&self, depth: Float) -> Float {
        match depth {
            d if !d.is_finite() || d == 0.0 => 0.0,
            d => ((d - self.range.min)/self.range.span()).clamp(0.0,1.0)
        }
    }

    pub fn normalize(&self, image: &Image) -> Image {
        image.map(|d| self.normalize_value(d))
    }
}

impl Transform for DepthNormalization {
    fn apply(&self, _state: &SampleRandomState, src: Data) -> Result<Data> {
        match src {
            Data::Depth(image) => Ok(Data::Depth(self.normalize(&image))),
            other => bail!("depth normalization applied to {:?}", other.data_type())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm() -> DepthNormalization {
        DepthNormalization::new(ValueRange::new(0.0,80.0).unwrap()).unwrap()
    }

    #[test]
    fn maps_range_linearly() {
        let n = norm();
        assert_eq!(n.normalize_value(40.0),0.5);
        assert_eq!(n.normalize_value(80.0),1.0);
        assert!((n.normalize_value(12.5)-12.5/80.0).abs() < 1e-12);
    }

    #[test]
    fn clips_out_of_range_values() {
        let n = norm();
        assert_eq!(n.normalize_value(250.0),1.0);
        assert_eq!(n.normalize_value(-3.0),0.0);
        assert_eq!(n.normalize_value(Float::INFINITY),0.0);
        assert_eq!(n.normalize_value(Float::NAN),0.0);
    }

    #[test]
    fn output_always_in_unit_interval() {
        let n = norm();
        let image = Image::from_row_slice(4,2,&[0.0,1e-3,5.0,79.99,80.0,80.01,1000.0,-1.0]);
        let normalized = n.normalize(&image);
        assert!(normalized.buffer.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn rejects_non_depth_data() {
        let state = SampleRandomState::identity();
        let src = Data::Gray(Image::zeros(2,2));
        assert!(norm().apply(&state,src).is_err());
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        assert!(ValueRange::new(5.0,1.0).is_err());
        assert!(DepthNormalization::new(ValueRange::new(3.0,3.0).unwrap()).is_err());
    }
}
