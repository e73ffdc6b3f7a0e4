extern crate nalgebra as na;

use na::DMatrix;
use color_eyre::eyre::{Result, bail};

use crate::dataset::{config::ElementType, tensor::Tensor};
use crate::Float;

fn normalized(idx: usize, extent: usize) -> Float {
    match extent {
        1 => 0.0,
        e => 2.0*(idx as Float)/((e - 1) as Float) - 1.0
    }
}

/**
 * Per pixel coordinates scaled to [-1,1]: channel 0 is x (column), channel 1 is y (row).
 * Depends on the output size only, so it is built once and cloned per sample.
 */
#[derive(Debug,Clone,PartialEq)]
pub struct CoordinateEncoder {
    tensor: Tensor
}

impl CoordinateEncoder {
    pub fn new(height: usize, width: usize) -> Result<CoordinateEncoder> {
        if height == 0 || width == 0 {
            bail!("coordinate encoding needs a non empty size, got {}x{}", height, width);
        }
        let xx = DMatrix::<Float>::from_fn(height,width,|_,c| normalized(c,width));
        let yy = DMatrix::<Float>::from_fn(height,width,|r,_| normalized(r,height));
        let tensor = Tensor::from_channels(&[&xx,&yy],ElementType::F32)?;
        Ok(CoordinateEncoder{tensor})
    }

    pub fn encode(&self) -> Tensor {
        self.tensor.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_is_pure_function_of_size() {
        let a = CoordinateEncoder::new(4,6).unwrap();
        let b = CoordinateEncoder::new(4,6).unwrap();
        assert_eq!(a.encode(),b.encode());
        assert_eq!(a.encode(),a.encode());
        let c = CoordinateEncoder::new(6,4).unwrap();
        assert_ne!(a.encode().shape,c.encode().shape);
    }

    #[test]
    fn corners_span_unit_square() {
        let tensor = CoordinateEncoder::new(3,5).unwrap().encode();
        assert_eq!(tensor.shape,[2,3,5]);
        assert_eq!(tensor.get(0,0,0),Some(-1.0));
        assert_eq!(tensor.get(0,2,4),Some(1.0));
        assert_eq!(tensor.get(1,0,3),Some(-1.0));
        assert_eq!(tensor.get(1,2,1),Some(1.0));
        assert_eq!(tensor.get(0,1,2),Some(0.0));
    }

    #[test]
    fn single_pixel_is_centered() {
        let tensor = CoordinateEncoder::new(1,1).unwrap().encode();
        assert_eq!(tensor.values(),vec![0.0,0.0]);
        assert!(CoordinateEncoder::new(0,3).is_err());
    }
}
