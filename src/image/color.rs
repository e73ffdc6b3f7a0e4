extern crate image as image_rs;
extern crate nalgebra as na;

use image_rs::{ImageBuffer, Rgb};
use na::DMatrix;
use serde::{Serialize, Deserialize};
use color_eyre::eyre::{Result, bail};

use crate::image::Image;
use crate::Float;

pub const MAX_INTENSITY: Float = 255.0;

// ITU-R BT.601 luma
const LUMA_R: Float = 0.299;
const LUMA_G: Float = 0.587;
const LUMA_B: Float = 0.114;

#[derive(Debug,Copy,Clone,PartialEq,Eq,Serialize,Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    Rgb,
    Bgr
}

/**
 * Three channel image in RGB order with intensities on the 8 bit scale [0,255].
 */
#[derive(Debug,Clone,PartialEq)]
pub struct ColorImage {
    pub channels: [DMatrix<Float>; 3]
}

impl ColorImage {

    pub fn from_element(width: usize, height: usize, rgb: [Float;3]) -> ColorImage {
        ColorImage{channels: [
            DMatrix::<Float>::from_element(height,width,rgb[0]),
            DMatrix::<Float>::from_element(height,width,rgb[1]),
            DMatrix::<Float>::from_element(height,width,rgb[2])
        ]}
    }

    /**
     * Decodes an interleaved HxWx3 8 bit buffer.
     */
    pub fn from_interleaved(data: &[u8], width: usize, height: usize, order: ChannelOrder) -> Result<ColorImage> {
        if data.len() != width*height*3 {
            bail!("color buffer has {} bytes, expected {}x{}x3", data.len(), height, width);
        }
        let (r_off, b_off) = match order {
            ChannelOrder::Rgb => (0,2),
            ChannelOrder::Bgr => (2,0)
        };
        let channel = |offset: usize| DMatrix::<Float>::from_fn(height,width,|r,c| data[(r*width+c)*3+offset] as Float);
        Ok(ColorImage{channels: [channel(r_off),channel(1),channel(b_off)]})
    }

    pub fn width(&self) -> usize {
        self.channels[0].ncols()
    }

    pub fn height(&self) -> usize {
        self.channels[0].nrows()
    }

    pub fn red(&self) -> &DMatrix<Float> {
        &self.channels[0]
    }

    pub fn green(&self) -> &DMatrix<Float> {
        &self.channels[1]
    }

    pub fn blue(&self) -> &DMatrix<Float> {
        &self.channels[2]
    }

    pub fn luma(&self) -> DMatrix<Float> {
        self.red()*LUMA_R + self.green()*LUMA_G + self.blue()*LUMA_B
    }

    pub fn to_gray(&self) -> Image {
        Image::from_matrix(self.luma())
    }

    pub fn map_channels<G: Fn(&DMatrix<Float>) -> DMatrix<Float>>(&self, f: G) -> ColorImage {
        ColorImage{channels: [f(&self.channels[0]),f(&self.channels[1]),f(&self.channels[2])]}
    }

    pub fn clamp_intensity(&self) -> ColorImage {
        self.map_channels(|c| c.map(|v| v.clamp(0.0,MAX_INTENSITY)))
    }

    pub fn flip_horizontal(&self) -> ColorImage {
        let width = self.width();
        self.map_channels(|c| DMatrix::<Float>::from_fn(c.nrows(),width,|r,col| c[(r,width-1-col)]))
    }

    pub fn flip_vertical(&self) -> ColorImage {
        let height = self.height();
        self.map_channels(|c| DMatrix::<Float>::from_fn(height,c.ncols(),|r,col| c[(height-1-r,col)]))
    }

    pub(crate) fn to_rgb32f(&self) -> ImageBuffer<Rgb<f32>,Vec<f32>> {
        ImageBuffer::from_fn(self.width() as u32,self.height() as u32,|x,y| {
            let (r,c) = (y as usize, x as usize);
            Rgb([self.channels[0][(r,c)] as f32,self.channels[1][(r,c)] as f32,self.channels[2][(r,c)] as f32])
        })
    }

    pub(crate) fn from_rgb32f(image: &ImageBuffer<Rgb<f32>,Vec<f32>>) -> ColorImage {
        let (width, height) = image.dimensions();
        let channel = |i: usize| DMatrix::<Float>::from_fn(height as usize,width as usize,|r,c| image.get_pixel(c as u32,r as u32)[i] as Float);
        ColorImage{channels: [channel(0),channel(1),channel(2)]}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgr_buffers_are_reordered() {
        let data = [10u8,20,30, 40,50,60];
        let image = ColorImage::from_interleaved(&data,2,1,ChannelOrder::Bgr).unwrap();
        assert_eq!(image.red()[(0,0)],30.0);
        assert_eq!(image.blue()[(0,1)],40.0);
        assert_eq!(image.green()[(0,1)],50.0);
    }

    #[test]
    fn buffer_length_is_checked() {
        assert!(ColorImage::from_interleaved(&[0u8;5],1,2,ChannelOrder::Rgb).is_err());
    }

    #[test]
    fn gray_of_white_is_white() {
        let image = ColorImage::from_element(4,2,[255.0,255.0,255.0]);
        let gray = image.to_gray();
        assert!(gray.buffer.iter().all(|v| (v-255.0).abs() < 1e-9));
    }
}
