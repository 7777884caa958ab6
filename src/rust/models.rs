use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

const MODEL_ZOO: &str = "https://github.com/onnx/models/raw/main/validated/vision/classification";

/// The CNN architectures that can be evaluated out of the box.
///
/// All three are ImageNet classifiers from the ONNX model zoo and share the
/// same 1000-entry synset label file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinModel {
    /// ResNet-18 (v1)
    ///
    /// Characteristics:
    /// - Input: 224x224 RGB, ImageNet mean/std normalisation
    /// - Size: ~45MB
    #[value(name = "resnet")]
    ResNet,
    /// BVLC AlexNet
    ///
    /// Characteristics:
    /// - Input: 224x224 BGR, Caffe mean subtraction
    /// - Size: ~233MB
    #[value(name = "alexnet")]
    AlexNet,
    /// VGG-16
    ///
    /// Characteristics:
    /// - Input: 224x224 RGB, ImageNet mean/std normalisation
    /// - Size: ~528MB
    /// - Slowest but usually the most accurate of the three
    #[default]
    #[value(name = "vgg")]
    Vgg,
}

/// How raw pixels are turned into model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Preprocessing {
    /// RGB scaled to [0, 1], then normalised with the ImageNet mean and std.
    ImageNet,
    /// BGR in [0, 255] with the Caffe per-channel mean subtracted.
    CaffeBgr,
}

/// Characteristics of a model including its input requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelCharacteristics {
    /// Side length of the square input image
    pub input_size: u32,
    /// Number of classes the model scores
    pub num_classes: usize,
    /// Pixel preprocessing expected by the model
    pub preprocessing: Preprocessing,
    /// Approximate size of the model file
    pub model_size_mb: usize,
}

/// Where a builtin model's files come from and what they must look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub model_url: String,
    pub labels_url: String,
    /// Expected SHA-256 of the model file. When set, a download must match it.
    pub model_hash: Option<String>,
    /// Expected SHA-256 of the label file.
    pub labels_hash: Option<String>,
    /// Smallest plausible model download. Anything shorter is a truncated
    /// transfer or a Git LFS pointer rather than the weights.
    pub min_model_bytes: u64,
}

impl BuiltinModel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ResNet => "resnet",
            Self::AlexNet => "alexnet",
            Self::Vgg => "vgg",
        }
    }

    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            Self::ResNet => ModelCharacteristics {
                input_size: 224,
                num_classes: 1000,
                preprocessing: Preprocessing::ImageNet,
                model_size_mb: 45,
            },
            Self::AlexNet => ModelCharacteristics {
                input_size: 224,
                num_classes: 1000,
                preprocessing: Preprocessing::CaffeBgr,
                model_size_mb: 233,
            },
            Self::Vgg => ModelCharacteristics {
                input_size: 224,
                num_classes: 1000,
                preprocessing: Preprocessing::ImageNet,
                model_size_mb: 528,
            },
        }
    }

    pub fn get_model_info(&self) -> ModelInfo {
        let model_file = match self {
            Self::ResNet => "resnet/model/resnet18-v1-7.onnx",
            Self::AlexNet => "alexnet/model/bvlcalexnet-12.onnx",
            Self::Vgg => "vgg/model/vgg16-7.onnx",
        };
        // TODO: pin model_hash / labels_hash to the zoo's published LFS object ids.
        ModelInfo {
            name: self.name().to_string(),
            model_url: format!("{}/{}", MODEL_ZOO, model_file),
            labels_url: format!("{}/synset.txt", MODEL_ZOO),
            model_hash: None,
            labels_hash: None,
            min_model_bytes: self.characteristics().model_size_mb as u64 * 1024 * 1024 / 2,
        }
    }
}

impl fmt::Display for BuiltinModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_from_cli_names() {
        assert_eq!(BuiltinModel::from_str("resnet", true), Ok(BuiltinModel::ResNet));
        assert_eq!(BuiltinModel::from_str("AlexNet", true), Ok(BuiltinModel::AlexNet));
        assert_eq!(BuiltinModel::from_str("vgg", false), Ok(BuiltinModel::Vgg));
        assert!(BuiltinModel::from_str("inception", true).is_err());
    }

    #[test]
    fn test_default_is_vgg() {
        assert_eq!(BuiltinModel::default(), BuiltinModel::Vgg);
        assert_eq!(BuiltinModel::default().to_string(), "vgg");
    }

    #[test]
    fn test_model_info_urls() {
        for model in BuiltinModel::value_variants() {
            let info = model.get_model_info();
            assert_eq!(info.name, model.name());
            assert!(info.model_url.ends_with(".onnx"));
            assert!(info.labels_url.ends_with("synset.txt"));
            assert_eq!(model.characteristics().num_classes, 1000);
            assert!(info.min_model_bytes > 10 * 1024 * 1024);
        }
    }

    #[test]
    fn test_alexnet_uses_caffe_preprocessing() {
        assert_eq!(BuiltinModel::AlexNet.characteristics().preprocessing, Preprocessing::CaffeBgr);
        assert_eq!(BuiltinModel::ResNet.characteristics().preprocessing, Preprocessing::ImageNet);
    }
}
