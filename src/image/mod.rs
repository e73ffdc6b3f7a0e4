extern crate image as image_rs;
extern crate nalgebra as na;

use image_rs::{ImageBuffer, Luma};
use na::DMatrix;

use crate::Float;

pub mod color;
pub mod resize;

/**
 * Single channel image. Rows are image rows, columns are image columns.
 */
#[derive(Debug,Clone,PartialEq)]
pub struct Image {
    pub buffer: DMatrix<Float>
}

impl Image {

    pub fn width(&self) -> usize {
        self.buffer.ncols()
    }

    pub fn height(&self) -> usize {
        self.buffer.nrows()
    }

    pub fn zeros(width: usize, height: usize) -> Image {
        Image{buffer: DMatrix::<Float>::zeros(height,width)}
    }

    pub fn from_matrix(matrix: DMatrix<Float>) -> Image {
        Image{buffer: matrix}
    }

    /**
     * Row-major interleaved samples, as laid out in stored arrays.
     */
    pub fn from_row_slice(width: usize, height: usize, data: &[Float]) -> Image {
        Image{buffer: DMatrix::<Float>::from_row_slice(height,width,data)}
    }

    pub fn flip_horizontal(&self) -> Image {
        let width = self.width();
        Image{buffer: DMatrix::<Float>::from_fn(self.height(),width,|r,c| self.buffer[(r,width-1-c)])}
    }

    pub fn flip_vertical(&self) -> Image {
        let height = self.height();
        Image{buffer: DMatrix::<Float>::from_fn(height,self.width(),|r,c| self.buffer[(height-1-r,c)])}
    }

    pub fn map<G: Fn(Float) -> Float>(&self, f: G) -> Image {
        Image{buffer: self.buffer.map(f)}
    }

    pub fn count_nonzero(&self) -> usize {
        self.buffer.iter().filter(|&&v| v != 0.0).count()
    }

    pub(crate) fn to_luma32f(&self) -> ImageBuffer<Luma<f32>,Vec<f32>> {
        ImageBuffer::from_fn(self.width() as u32,self.height() as u32,|x,y| Luma([self.buffer[(y as usize,x as usize)] as f32]))
    }

    pub(crate) fn from_luma32f(image: &ImageBuffer<Luma<f32>,Vec<f32>>) -> Image {
        let (width, height) = image.dimensions();
        Image{buffer: DMatrix::<Float>::from_fn(height as usize,width as usize,|r,c| image.get_pixel(c as u32,r as u32)[0] as Float)}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_flip_mirrors_columns() {
        let image = Image::from_row_slice(3,2,&[1.0,2.0,3.0,4.0,5.0,6.0]);
        let flipped = image.flip_horizontal();
        assert_eq!(flipped.buffer,DMatrix::from_row_slice(2,3,&[3.0,2.0,1.0,6.0,5.0,4.0]));
        assert_eq!(flipped.flip_horizontal(),image);
    }

    #[test]
    fn vertical_flip_mirrors_rows() {
        let image = Image::from_row_slice(2,2,&[1.0,2.0,3.0,4.0]);
        assert_eq!(image.flip_vertical().buffer,DMatrix::from_row_slice(2,2,&[3.0,4.0,1.0,2.0]));
    }
}
