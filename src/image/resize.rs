extern crate image as image_rs;

use image_rs::imageops::{self, FilterType};
use serde::{Serialize, Deserialize};

use crate::image::{Image, color::ColorImage};

#[derive(Debug,Copy,Clone,PartialEq,Eq,Serialize,Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    Bilinear,
    Nearest
}

impl Interpolation {
    fn filter(&self) -> FilterType {
        match self {
            Interpolation::Bilinear => FilterType::Triangle,
            Interpolation::Nearest => FilterType::Nearest
        }
    }
}

pub fn resize_gray(image: &Image, height: usize, width: usize, interpolation: Interpolation) -> Image {
    if image.height() == height && image.width() == width {
        return image.clone();
    }
    let resized = imageops::resize(&image.to_luma32f(),width as u32,height as u32,interpolation.filter());
    Image::from_luma32f(&resized)
}

pub fn resize_color(image: &ColorImage, height: usize, width: usize, interpolation: Interpolation) -> ColorImage {
    if image.height() == height && image.width() == width {
        return image.clone();
    }
    let resized = imageops::resize(&image.to_rgb32f(),width as u32,height as u32,interpolation.filter());
    ColorImage::from_rgb32f(&resized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_shape_is_exact() {
        let image = ColorImage::from_element(37,11,[12.0,50.0,200.0]);
        for &(h,w) in &[(256,512),(5,3),(11,37),(1,1)] {
            let resized = resize_color(&image,h,w,Interpolation::Bilinear);
            assert_eq!((resized.height(),resized.width()),(h,w));
            let gray = resize_gray(&image.to_gray(),h,w,Interpolation::Nearest);
            assert_eq!((gray.height(),gray.width()),(h,w));
        }
    }

    #[test]
    fn nearest_keeps_label_values() {
        let image = Image::from_row_slice(2,2,&[1.0,2.0,3.0,4.0]);
        let resized = resize_gray(&image,4,4,Interpolation::Nearest);
        assert!(resized.buffer.iter().all(|v| [1.0,2.0,3.0,4.0].contains(v)));
    }
}
