extern crate rand;

use rand::Rng;
use color_eyre::eyre::{Result, bail};

use crate::augmentation::{Transform, state::SampleRandomState};
use crate::data::Data;
use crate::image::resize::{Interpolation, resize_color, resize_gray};
use crate::Float;

/**
 * Resamples an image to a fixed (height, width), whatever the input shape.
 */
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct Resize {
    pub height: usize,
    pub width: usize,
    pub interpolation: Interpolation
}

impl Resize {
    pub fn new(height: usize, width: usize, interpolation: Interpolation) -> Result<Resize> {
        if height == 0 || width == 0 {
            bail!("resize target must be non empty, got {}x{}", height, width);
        }
        Ok(Resize{height,width,interpolation})
    }
}

impl Transform for Resize {
    fn apply(&self, _state: &SampleRandomState, src: Data) -> Result<Data> {
        match src {
            Data::Color(image) => Ok(Data::Color(resize_color(&image,self.height,self.width,self.interpolation))),
            Data::Gray(image) => Ok(Data::Gray(resize_gray(&image,self.height,self.width,self.interpolation))),
            Data::Depth(image) => Ok(Data::Depth(resize_gray(&image,self.height,self.width,self.interpolation))),
            Data::Pose(_) => bail!("resize applied to pose data")
        }
    }
}

/**
 * Horizontal and vertical mirroring. The decision is drawn once per sample and shared by
 * every modality in the same pixel space.
 */
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct Flip2d {
    pub hflip_rate: Float,
    pub vflip_rate: Float
}

impl Flip2d {
    pub fn new(hflip_rate: Float, vflip_rate: Float) -> Result<Flip2d> {
        for rate in [hflip_rate,vflip_rate] {
            if !(0.0..=1.0).contains(&rate) {
                bail!("flip rate must lie in [0,1], got {}", rate);
            }
        }
        Ok(Flip2d{hflip_rate,vflip_rate})
    }

    pub fn disabled() -> Flip2d {
        Flip2d{hflip_rate: 0.0, vflip_rate: 0.0}
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> (bool,bool) {
        (rng.gen_bool(self.hflip_rate),rng.gen_bool(self.vflip_rate))
    }
}

impl Transform for Flip2d {
    fn apply(&self, state: &SampleRandomState, src: Data) -> Result<Data> {
        let (h, v) = (state.flip_horizontal, state.flip_vertical);
        let flipped = match src {
            Data::Color(image) => {
                let image = if h {image.flip_horizontal()} else {image};
                Data::Color(if v {image.flip_vertical()} else {image})
            },
            Data::Gray(image) => {
                let image = if h {image.flip_horizontal()} else {image};
                Data::Gray(if v {image.flip_vertical()} else {image})
            },
            Data::Depth(image) => {
                let image = if h {image.flip_horizontal()} else {image};
                Data::Depth(if v {image.flip_vertical()} else {image})
            },
            Data::Pose(_) => bail!("flip applied to pose data")
        };
        Ok(flipped)
    }
}
