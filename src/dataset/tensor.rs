extern crate nalgebra as na;

use na::DMatrix;
use color_eyre::eyre::{Result, bail};

use crate::dataset::config::ElementType;
use crate::Float;

#[derive(Debug,Clone,PartialEq)]
pub enum TensorData {
    U8(Vec<u8>),
    F32(Vec<f32>)
}

/**
 * Channel first (C, H, W) array, row major within each channel.
 */
#[derive(Debug,Clone,PartialEq)]
pub struct Tensor {
    pub shape: [usize;3],
    pub data: TensorData
}

impl Tensor {

    pub fn from_channels(channels: &[&DMatrix<Float>], element_type: ElementType) -> Result<Tensor> {
        let (height, width) = match channels.first() {
            Some(c) => c.shape(),
            None => bail!("tensor needs at least one channel")
        };
        if channels.iter().any(|c| c.shape() != (height,width)) {
            bail!("tensor channels differ in shape");
        }
        let values = channels.iter().flat_map(|c| (0..height).flat_map(move |r| (0..width).map(move |col| c[(r,col)])));
        let data = match element_type {
            ElementType::U8 => TensorData::U8(values.map(|v| v.round().clamp(0.0,255.0) as u8).collect()),
            ElementType::F32 => TensorData::F32(values.map(|v| v as f32).collect())
        };
        Ok(Tensor{shape: [channels.len(),height,width], data})
    }

    pub fn channels(&self) -> usize {
        self.shape[0]
    }

    pub fn height(&self) -> usize {
        self.shape[1]
    }

    pub fn width(&self) -> usize {
        self.shape[2]
    }

    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_type(&self) -> ElementType {
        match self.data {
            TensorData::U8(_) => ElementType::U8,
            TensorData::F32(_) => ElementType::F32
        }
    }

    pub fn get(&self, channel: usize, row: usize, col: usize) -> Option<Float> {
        if channel >= self.channels() || row >= self.height() || col >= self.width() {
            return None;
        }
        let idx = (channel*self.height() + row)*self.width() + col;
        match &self.data {
            TensorData::U8(v) => Some(v[idx] as Float),
            TensorData::F32(v) => Some(v[idx] as Float)
        }
    }

    pub fn values(&self) -> Vec<Float> {
        match &self.data {
            TensorData::U8(v) => v.iter().map(|&x| x as Float).collect(),
            TensorData::F32(v) => v.iter().map(|&x| x as Float).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_channel_first() {
        let a = DMatrix::<Float>::from_row_slice(2,3,&[0.0,1.0,2.0,3.0,4.0,5.0]);
        let b = a.map(|v| v+10.0);
        let tensor = Tensor::from_channels(&[&a,&b],ElementType::F32).unwrap();
        assert_eq!(tensor.shape,[2,2,3]);
        assert_eq!(tensor.get(0,1,0),Some(3.0));
        assert_eq!(tensor.get(1,0,2),Some(12.0));
        assert_eq!(tensor.get(2,0,0),None);
    }

    #[test]
    fn u8_casts_round_and_clamp() {
        let a = DMatrix::<Float>::from_row_slice(1,3,&[-4.0,127.6,300.0]);
        let tensor = Tensor::from_channels(&[&a],ElementType::U8).unwrap();
        assert_eq!(tensor.data,TensorData::U8(vec![0,128,255]));
    }
}
