use std::fmt;
use serde::{Serialize, Deserialize};
use color_eyre::eyre::{Result, bail};

use crate::image::color::ChannelOrder;
use crate::normalization::ValueRange;
use crate::Float;

pub mod record;
pub mod memory_store;

/**
 * Which dataset of a sample a key addresses.
 */
#[derive(Debug,Copy,Clone,PartialEq,Eq,PartialOrd,Ord,Hash,Serialize,Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Color,
    Points,
    Voxels,
    VoxelIndices,
    Intrinsic,
    Pose
}

/**
 * Type tag stored with a record. Checked against the kind it is read as.
 */
#[derive(Debug,Copy,Clone,PartialEq,Eq,Hash,Serialize,Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Bgr8,
    Rgb8,
    Points,
    VoxelSemantic3d,
    VoxelIndices,
    Intrinsic,
    Pose
}

impl RecordType {
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordType::Bgr8 | RecordType::Rgb8 => RecordKind::Color,
            RecordType::Points => RecordKind::Points,
            RecordType::VoxelSemantic3d => RecordKind::Voxels,
            RecordType::VoxelIndices => RecordKind::VoxelIndices,
            RecordType::Intrinsic => RecordKind::Intrinsic,
            RecordType::Pose => RecordKind::Pose
        }
    }

    pub fn channel_order(&self) -> Option<ChannelOrder> {
        match self {
            RecordType::Bgr8 => Some(ChannelOrder::Bgr),
            RecordType::Rgb8 => Some(ChannelOrder::Rgb),
            _ => None
        }
    }
}

#[derive(Debug,Copy,Clone,PartialEq,Eq,PartialOrd,Ord,Hash)]
pub struct RecordKey {
    pub kind: RecordKind,
    pub sample: usize,
    pub link: usize
}

impl RecordKey {
    pub fn new(kind: RecordKind, sample: usize, link: usize) -> RecordKey {
        RecordKey{kind,sample,link}
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}/{:?}", self.sample, self.link, self.kind)
    }
}

/**
 * Metadata stored next to a payload. Voxel geometry fields are only present on voxel records,
 * `source_size` only on intrinsics.
 */
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct Attributes {
    pub record_type: RecordType,
    pub shape: Vec<usize>,
    #[serde(default)]
    pub depth_range: Option<ValueRange>,
    #[serde(default)]
    pub voxel_grid: Option<[usize;3]>,
    #[serde(default)]
    pub voxel_size: Option<Float>,
    #[serde(default)]
    pub voxel_min: Option<[Float;3]>,
    #[serde(default)]
    pub voxel_max: Option<[Float;3]>,
    #[serde(default)]
    pub voxel_center: Option<[Float;3]>,
    #[serde(default)]
    pub voxel_origin: Option<[Float;3]>,
    /// (height, width) of the image the intrinsics were calibrated for.
    #[serde(default)]
    pub source_size: Option<(usize,usize)>
}

impl Attributes {
    pub fn new(record_type: RecordType, shape: Vec<usize>) -> Attributes {
        Attributes {
            record_type,
            shape,
            depth_range: None,
            voxel_grid: None,
            voxel_size: None,
            voxel_min: None,
            voxel_max: None,
            voxel_center: None,
            voxel_origin: None,
            source_size: None
        }
    }

    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /**
     * Number of values per leading index, i.e. the product of all but the first dimension.
     */
    pub fn row_width(&self) -> usize {
        self.shape.iter().skip(1).product()
    }
}

#[derive(Debug,Clone,PartialEq)]
pub enum Payload {
    U8(Vec<u8>),
    F64(Vec<Float>)
}

impl Payload {
    pub fn len(&self) -> usize {
        match self {
            Payload::U8(v) => v.len(),
            Payload::F64(v) => v.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_floats(&self) -> Vec<Float> {
        match self {
            Payload::U8(v) => v.iter().map(|&x| x as Float).collect(),
            Payload::F64(v) => v.clone()
        }
    }
}

#[derive(Debug,Clone,PartialEq)]
pub struct Record {
    pub payload: Payload,
    pub attributes: Attributes
}

impl Record {
    pub fn new(payload: Payload, attributes: Attributes) -> Result<Record> {
        if payload.len() != attributes.element_count() {
            bail!("payload holds {} values but shape {:?} declares {}", payload.len(), attributes.shape, attributes.element_count());
        }
        Ok(Record{payload,attributes})
    }
}

/**
 * Resolves sample keys to stored arrays. Reads are synchronous; any error aborts the sample.
 */
pub trait RecordStore {
    /// Number of samples in the store.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn attributes(&self, key: &RecordKey) -> Result<Attributes>;

    fn fetch(&self, key: &RecordKey) -> Result<Record>;

    /**
     * Reads only the given leading indices of a record, row after row.
     */
    fn fetch_rows(&self, key: &RecordKey, rows: &[usize]) -> Result<Vec<Float>>;
}
