extern crate nalgebra as na;
extern crate num_traits;

use std::path::Path;
use color_eyre::eyre::{Result, WrapErr};

pub mod image;
pub mod data;
pub mod sensors;
pub mod numerics;
pub mod augmentation;
pub mod normalization;
pub mod coords;
pub mod geometry;
pub mod synthesis;
pub mod io;
pub mod dataset;

pub use dataset::{DepthCompletionDataset, Mode, SampleSource, Sample};
pub use dataset::config::{DatasetParameters, MinibatchConfig, Modality, ElementType, GtPosePolicy};
pub use dataset::tensor::{Tensor, TensorData};

macro_rules! define_float {
    ($f:tt) => {
        pub use std::$f as float;
        pub type Float = $f;
    }
}

define_float!(f64);

pub trait GenericFloat: na::Scalar + na::RealField + num_traits::float::Float + num_traits::NumAssign + Copy {}
impl<T> GenericFloat for T where T: na::Scalar + na::RealField + num_traits::float::Float + num_traits::NumAssign + Copy {}

/**
 * Reads dataset parameters (augmentation, filtering and minibatch layout) from a yaml file.
 */
pub fn load_parameters(path: &Path) -> Result<DatasetParameters> {
    let contents = std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read parameters from {}", path.display()))?;
    DatasetParameters::from_yaml_str(&contents).wrap_err_with(|| format!("failed to parse parameters in {}", path.display()))
}
