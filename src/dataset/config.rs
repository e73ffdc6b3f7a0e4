use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};
use color_eyre::eyre::{Result, WrapErr, bail};

use crate::normalization::ValueRange;
use crate::Float;

pub const IMG_HEIGHT: usize = 256;
pub const IMG_WIDTH: usize = 512;
pub const MAX_DEPTH: Float = 80.0;

#[derive(Debug,Copy,Clone,PartialEq,Eq,PartialOrd,Ord,Hash,Serialize,Deserialize)]
pub enum Modality {
    #[serde(rename = "rgb")]
    Rgb,
    #[serde(rename = "g")]
    Gray,
    #[serde(rename = "d")]
    SparseDepth,
    #[serde(rename = "gt")]
    GtDepth,
    #[serde(rename = "position")]
    Position
}

impl Modality {
    /// Key of the modality in an assembled sample.
    pub fn name(&self) -> &'static str {
        match self {
            Modality::Rgb => "rgb",
            Modality::Gray => "g",
            Modality::SparseDepth => "d",
            Modality::GtDepth => "gt",
            Modality::Position => "position"
        }
    }

    pub fn is_depth(&self) -> bool {
        matches!(self, Modality::SparseDepth | Modality::GtDepth)
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug,Copy,Clone,PartialEq,Eq,Serialize,Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    U8,
    F32
}

/**
 * Pose used to render the ground truth depth in training.
 * `Stored` keeps the recorded pose; `MirrorSparse` reuses the perturbed pose of the sparse input
 * so input and target stay geometrically consistent.
 */
#[derive(Debug,Copy,Clone,PartialEq,Eq,Serialize,Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GtPosePolicy {
    Stored,
    MirrorSparse
}

/**
 * Declarative description of one output modality.
 */
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct MinibatchConfig {
    /// (height, width)
    pub shape: (usize,usize),
    #[serde(default)]
    pub range: Option<ValueRange>,
    #[serde(default = "default_element_type")]
    pub element_type: ElementType,
    /// Sensor link the modality reads from.
    #[serde(default)]
    pub link: usize
}

fn default_element_type() -> ElementType {
    ElementType::F32
}

impl MinibatchConfig {
    pub fn image(height: usize, width: usize) -> MinibatchConfig {
        MinibatchConfig{shape: (height,width), range: None, element_type: ElementType::F32, link: 0}
    }

    pub fn depth(height: usize, width: usize, range: ValueRange) -> MinibatchConfig {
        MinibatchConfig{shape: (height,width), range: Some(range), element_type: ElementType::F32, link: 0}
    }

    pub fn height(&self) -> usize {
        self.shape.0
    }

    pub fn width(&self) -> usize {
        self.shape.1
    }

    /**
     * Configured depth range, falling back to the range recorded with the source data.
     */
    pub fn depth_range(&self, recorded: Option<ValueRange>) -> Result<ValueRange> {
        match self.range.or(recorded) {
            Some(range) => Ok(range),
            None => bail!("depth range neither configured nor recorded with the data")
        }
    }
}

fn default_jitter() -> Float { 0.1 }
fn default_filter_threshold() -> Float { 3.0 }
fn default_hflip_rate() -> Float { 0.5 }
fn default_pose_translation_range() -> [Float;3] { [0.6,1.3,0.7] }
fn default_pose_rotation_range() -> Float { 3.0 }
fn default_gt_pose_policy() -> GtPosePolicy { GtPosePolicy::Stored }
fn default_minibatch() -> BTreeMap<Modality,MinibatchConfig> { DatasetParameters::standard_minibatch() }

#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct DatasetParameters {
    #[serde(default = "default_jitter")]
    pub jitter: Float,
    #[serde(default)]
    pub visibility_filter_radius: usize,
    #[serde(default = "default_filter_threshold")]
    pub visibility_filter_threshold: Float,
    #[serde(default = "default_hflip_rate")]
    pub hflip_rate: Float,
    #[serde(default)]
    pub vflip_rate: Float,
    #[serde(default = "default_pose_translation_range")]
    pub pose_translation_range: [Float;3],
    /// Degrees.
    #[serde(default = "default_pose_rotation_range")]
    pub pose_rotation_range: Float,
    #[serde(default = "default_gt_pose_policy")]
    pub gt_pose_policy: GtPosePolicy,
    #[serde(default)]
    pub seed: u64,
    /// (remainder, modulus): keep store local indices with i % modulus == remainder.
    #[serde(default)]
    pub use_mods: Option<(usize,usize)>,
    #[serde(default = "default_minibatch")]
    pub minibatch: BTreeMap<Modality,MinibatchConfig>
}

impl Default for DatasetParameters {
    fn default() -> DatasetParameters {
        DatasetParameters {
            jitter: default_jitter(),
            visibility_filter_radius: 0,
            visibility_filter_threshold: default_filter_threshold(),
            hflip_rate: default_hflip_rate(),
            vflip_rate: 0.0,
            pose_translation_range: default_pose_translation_range(),
            pose_rotation_range: default_pose_rotation_range(),
            gt_pose_policy: default_gt_pose_policy(),
            seed: 0,
            use_mods: None,
            minibatch: default_minibatch()
        }
    }
}

impl DatasetParameters {

    /**
     * rgb, g, d, gt and position at 256x512; depth normalized over [0,80].
     */
    pub fn standard_minibatch() -> BTreeMap<Modality,MinibatchConfig> {
        let range = ValueRange{min: 0.0, max: MAX_DEPTH};
        let mut minibatch = BTreeMap::new();
        minibatch.insert(Modality::Rgb, MinibatchConfig::image(IMG_HEIGHT,IMG_WIDTH));
        minibatch.insert(Modality::Gray, MinibatchConfig::image(IMG_HEIGHT,IMG_WIDTH));
        minibatch.insert(Modality::SparseDepth, MinibatchConfig::depth(IMG_HEIGHT,IMG_WIDTH,range));
        minibatch.insert(Modality::GtDepth, MinibatchConfig::depth(IMG_HEIGHT,IMG_WIDTH,range));
        minibatch.insert(Modality::Position, MinibatchConfig::image(IMG_HEIGHT,IMG_WIDTH));
        minibatch
    }

    /**
     * Adds the coordinate encoding at the rgb shape when the minibatch does not list it.
     * Every sample carries one.
     */
    pub fn with_position(mut self) -> Result<DatasetParameters> {
        let (height, width) = self.output_size()?;
        self.minibatch.entry(Modality::Position).or_insert_with(|| MinibatchConfig::image(height,width));
        Ok(self)
    }

    pub fn from_yaml_str(contents: &str) -> Result<DatasetParameters> {
        let parameters: DatasetParameters = serde_yaml::from_str(contents).wrap_err("malformed dataset parameters")?;
        parameters.validate()?;
        Ok(parameters)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).wrap_err("failed to serialize dataset parameters")
    }

    /**
     * Size every image modality and the coordinate encoding is produced at.
     */
    pub fn output_size(&self) -> Result<(usize,usize)> {
        match self.minibatch.get(&Modality::Rgb) {
            Some(config) => Ok(config.shape),
            None => bail!("minibatch has no rgb entry to take the output size from")
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.jitter.is_finite() || self.jitter < 0.0 {
            bail!("jitter must be finite and non negative, got {}", self.jitter);
        }
        if !self.visibility_filter_threshold.is_finite() || self.visibility_filter_threshold < 0.0 {
            bail!("visibility filter threshold must be finite and non negative, got {}", self.visibility_filter_threshold);
        }
        if self.pose_translation_range.iter().chain(std::iter::once(&self.pose_rotation_range)).any(|v| !v.is_finite()) {
            bail!("pose ranges must be finite");
        }
        if let Some((remainder, modulus)) = self.use_mods {
            if modulus == 0 || remainder >= modulus {
                bail!("use_mods ({}, {}) needs remainder < modulus", remainder, modulus);
            }
        }
        let (height, width) = self.output_size()?;
        for (modality, config) in &self.minibatch {
            if config.height() == 0 || config.width() == 0 {
                bail!("minibatch entry {} has an empty shape", modality);
            }
            if let Some(range) = config.range {
                if !modality.is_depth() {
                    bail!("minibatch entry {} does not take a depth range", modality);
                }
                if !range.max.is_finite() || !(range.span() > 0.0) || range.min < 0.0 {
                    bail!("minibatch entry {} has invalid depth range {:?}", modality, range);
                }
            }
            if config.shape != (height,width) {
                bail!("minibatch entry {} has shape {:?}, expected {:?} to stay pixel aligned with rgb", modality, config.shape, (height,width));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_standard_setup() {
        let parameters = DatasetParameters::default();
        assert_eq!(parameters.output_size().unwrap(),(256,512));
        assert_eq!(parameters.jitter,0.1);
        assert_eq!(parameters.pose_translation_range,[0.6,1.3,0.7]);
        assert_eq!(parameters.gt_pose_policy,GtPosePolicy::Stored);
        assert_eq!(parameters.minibatch[&Modality::Position].shape,(256,512));
        assert!(parameters.validate().is_ok());
    }

    #[test]
    fn position_is_added_at_rgb_shape() {
        let yaml = "
minibatch:
  rgb:
    shape: [8, 16]
  gt:
    shape: [8, 16]
    range: {min: 0.0, max: 80.0}
";
        let parameters = DatasetParameters::from_yaml_str(yaml).unwrap();
        assert!(!parameters.minibatch.contains_key(&Modality::Position));
        let parameters = parameters.with_position().unwrap();
        assert_eq!(parameters.minibatch[&Modality::Position],MinibatchConfig::image(8,16));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(DatasetParameters::from_yaml_str("jitter: .inf\n").is_err());
        assert!(DatasetParameters::from_yaml_str("jitter: .nan\n").is_err());
        assert!(DatasetParameters::from_yaml_str("visibility_filter_threshold: .inf\n").is_err());
        assert!(DatasetParameters::from_yaml_str("jitter: 0.5\n").is_ok());
    }

    #[test]
    fn yaml_overrides_and_defaults() {
        let yaml = "
jitter: 0.0
gt_pose_policy: mirror_sparse
use_mods: [1, 4]
minibatch:
  rgb:
    shape: [8, 16]
    element_type: u8
  d:
    shape: [8, 16]
    range: {min: 0.0, max: 40.0}
    link: 1
";
        let parameters = DatasetParameters::from_yaml_str(yaml).unwrap();
        assert_eq!(parameters.jitter,0.0);
        assert_eq!(parameters.gt_pose_policy,GtPosePolicy::MirrorSparse);
        assert_eq!(parameters.use_mods,Some((1,4)));
        assert_eq!(parameters.visibility_filter_threshold,3.0);
        assert_eq!(parameters.minibatch[&Modality::Rgb].element_type,ElementType::U8);
        assert_eq!(parameters.minibatch[&Modality::SparseDepth].link,1);
        assert!(!parameters.minibatch.contains_key(&Modality::GtDepth));
    }

    #[test]
    fn yaml_round_trip() {
        let parameters = DatasetParameters::default();
        let yaml = parameters.to_yaml_string().unwrap();
        assert_eq!(DatasetParameters::from_yaml_str(&yaml).unwrap(),parameters);
    }

    #[test]
    fn depth_ranges_are_checked() {
        let yaml = "
minibatch:
  rgb:
    shape: [8, 16]
  gt:
    shape: [8, 16]
    range: {min: 10.0, max: 10.0}
";
        assert!(DatasetParameters::from_yaml_str(yaml).is_err());

        let yaml = "
minibatch:
  rgb:
    shape: [8, 16]
  gt:
    shape: [8, 16]
";
        let parameters = DatasetParameters::from_yaml_str(yaml).unwrap();
        let gt = &parameters.minibatch[&Modality::GtDepth];
        assert!(gt.depth_range(None).is_err());
        assert_eq!(gt.depth_range(Some(ValueRange{min: 0.0, max: 20.0})).unwrap().max,20.0);
    }

    #[test]
    fn misaligned_shapes_are_rejected() {
        let mut parameters = DatasetParameters::default();
        parameters.minibatch.get_mut(&Modality::Gray).unwrap().shape = (128,256);
        assert!(parameters.validate().is_err());
        parameters = DatasetParameters::default();
        parameters.use_mods = Some((4,4));
        assert!(parameters.validate().is_err());
    }
}
