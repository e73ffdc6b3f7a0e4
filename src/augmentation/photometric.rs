extern crate rand;

use rand::Rng;
use color_eyre::eyre::{Result, bail};

use crate::augmentation::{Transform, state::SampleRandomState};
use crate::data::Data;
use crate::image::color::ColorImage;
use crate::normalization::ValueRange;
use crate::Float;

fn factor_range(jitter: Float) -> ValueRange {
    let jitter = jitter.abs();
    ValueRange{min: (1.0 - jitter).max(0.0), max: 1.0 + jitter}
}

fn draw_factor<R: Rng + ?Sized>(rng: &mut R, range: &ValueRange) -> Float {
    match range.span() {
        span if span > 0.0 => rng.gen_range(range.min..=range.max),
        _ => range.min
    }
}

fn color_input(name: &str, src: Data) -> Result<ColorImage> {
    match src {
        Data::Color(image) => Ok(image),
        other => bail!("{} expects color data, got {:?}", name, other.data_type())
    }
}

/**
 * out = factor * in
 */
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct AdjustBrightness {
    pub factor_range: ValueRange
}

impl Transform for AdjustBrightness {
    fn apply(&self, state: &SampleRandomState, src: Data) -> Result<Data> {
        let image = color_input("brightness",src)?;
        let factor = state.brightness;
        if factor == 1.0 {
            return Ok(Data::Color(image));
        }
        Ok(Data::Color(image.map_channels(|c| c*factor).clamp_intensity()))
    }
}

/**
 * Blend with the mean gray level of the whole image.
 */
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct AdjustContrast {
    pub factor_range: ValueRange
}

impl Transform for AdjustContrast {
    fn apply(&self, state: &SampleRandomState, src: Data) -> Result<Data> {
        let image = color_input("contrast",src)?;
        let factor = state.contrast;
        if factor == 1.0 {
            return Ok(Data::Color(image));
        }
        let mean = image.luma().mean();
        Ok(Data::Color(image.map_channels(|c| c.map(|v| factor*v + (1.0-factor)*mean)).clamp_intensity()))
    }
}

/**
 * Blend each pixel with its own gray value.
 */
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct AdjustSaturation {
    pub factor_range: ValueRange
}

impl Transform for AdjustSaturation {
    fn apply(&self, state: &SampleRandomState, src: Data) -> Result<Data> {
        let image = color_input("saturation",src)?;
        let factor = state.saturation;
        if factor == 1.0 {
            return Ok(Data::Color(image));
        }
        let gray = image.luma();
        Ok(Data::Color(image.map_channels(|c| c.zip_map(&gray,|v,g| factor*v + (1.0-factor)*g)).clamp_intensity()))
    }
}

/**
 * Brightness, contrast and saturation jitter, applied in that order.
 * Every factor is drawn from [max(0, 1 - jitter), 1 + jitter].
 */
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct ColorJitter {
    pub brightness: AdjustBrightness,
    pub contrast: AdjustContrast,
    pub saturation: AdjustSaturation
}

impl ColorJitter {
    pub fn new(jitter: Float) -> ColorJitter {
        let factor_range = factor_range(jitter);
        ColorJitter {
            brightness: AdjustBrightness{factor_range},
            contrast: AdjustContrast{factor_range},
            saturation: AdjustSaturation{factor_range}
        }
    }

    pub fn disabled() -> ColorJitter {
        ColorJitter::new(0.0)
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> (Float,Float,Float) {
        let b = draw_factor(rng,&self.brightness.factor_range);
        let c = draw_factor(rng,&self.contrast.factor_range);
        let s = draw_factor(rng,&self.saturation.factor_range);
        (b,c,s)
    }
}

impl Transform for ColorJitter {
    fn apply(&self, state: &SampleRandomState, src: Data) -> Result<Data> {
        let adjusted_b = self.brightness.apply(state,src)?;
        let adjusted_c = self.contrast.apply(state,adjusted_b)?;
        self.saturation.apply(state,adjusted_c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Image;
    use crate::augmentation::{geometric::Flip2d, random_pose::PoseRandomizer, state::seed_for};

    fn gradient() -> ColorImage {
        let data = (0..4*3*3).map(|i| (i*7 % 256) as u8).collect::<Vec<u8>>();
        ColorImage::from_interleaved(&data,4,3,crate::image::color::ChannelOrder::Rgb).unwrap()
    }

    #[test]
    fn zero_jitter_is_identity() {
        let jitter = ColorJitter::new(0.0);
        let flip = Flip2d::disabled();
        let state = SampleRandomState::from_seed(seed_for(1,0,5),&jitter,&flip,&PoseRandomizer::Disabled);
        let src = Data::Color(gradient());
        assert_eq!(jitter.apply(&state,src.clone()).unwrap(),src);
    }

    #[test]
    fn zero_saturation_yields_gray() {
        let mut state = SampleRandomState::identity();
        state.saturation = 0.0;
        let out = ColorJitter::new(1.0).apply(&state,Data::Color(gradient())).unwrap().into_color().unwrap();
        for r in 0..out.height() {
            for c in 0..out.width() {
                assert!((out.red()[(r,c)]-out.blue()[(r,c)]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn brightness_clamps_to_intensity_range() {
        let mut state = SampleRandomState::identity();
        state.brightness = 3.0;
        let out = ColorJitter::new(2.0).apply(&state,Data::Color(gradient())).unwrap().into_color().unwrap();
        assert!(out.channels.iter().all(|c| c.iter().all(|&v| (0.0..=255.0).contains(&v))));
        assert!(out.channels.iter().any(|c| c.iter().any(|&v| v == 255.0)));
    }

    #[test]
    fn rejects_non_color_input() {
        let state = SampleRandomState::identity();
        assert!(ColorJitter::new(0.1).apply(&state,Data::Depth(Image::zeros(1,1))).is_err());
    }

    #[test]
    fn factor_range_never_negative() {
        let range = factor_range(1.7);
        assert_eq!(range.min,0.0);
        assert_eq!(range.max,2.7);
    }
}
