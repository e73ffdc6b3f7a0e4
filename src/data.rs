use color_eyre::eyre::{Result, bail};

use crate::image::{Image, color::ColorImage};
use crate::numerics::pose::Pose;

#[derive(Debug,Copy,Clone,PartialEq,Eq,Hash)]
pub enum DataType {
    Color,
    Gray,
    Depth,
    Pose
}

/**
 * A payload together with its semantic tag. Pipeline stages consume one value and return a new one.
 */
#[derive(Debug,Clone,PartialEq)]
pub enum Data {
    Color(ColorImage),
    Gray(Image),
    Depth(Image),
    Pose(Pose)
}

impl Data {
    pub fn data_type(&self) -> DataType {
        match self {
            Data::Color(_) => DataType::Color,
            Data::Gray(_) => DataType::Gray,
            Data::Depth(_) => DataType::Depth,
            Data::Pose(_) => DataType::Pose
        }
    }

    pub fn into_color(self) -> Result<ColorImage> {
        match self {
            Data::Color(image) => Ok(image),
            other => bail!("expected color data, got {:?}", other.data_type())
        }
    }

    /**
     * Gray or depth payload.
     */
    pub fn into_image(self) -> Result<Image> {
        match self {
            Data::Gray(image) | Data::Depth(image) => Ok(image),
            other => bail!("expected single channel data, got {:?}", other.data_type())
        }
    }

    pub fn into_pose(self) -> Result<Pose> {
        match self {
            Data::Pose(pose) => Ok(pose),
            other => bail!("expected pose data, got {:?}", other.data_type())
        }
    }

    /**
     * Converts color to gray using BT.601 luma. Gray input passes through.
     */
    pub fn to_mono(self) -> Result<Data> {
        match self {
            Data::Color(image) => Ok(Data::Gray(image.to_gray())),
            Data::Gray(image) => Ok(Data::Gray(image)),
            other => bail!("cannot convert {:?} to gray", other.data_type())
        }
    }
}
