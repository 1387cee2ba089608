//! Fully-connected architecture
//!
//! Flattens the 64×64 grayscale input to 4096 features, then runs three
//! hidden layers (4096 → 4096 → 2000) with relu activations and a 29-way
//! output head.

use burn::{
    config::Config,
    module::Module,
    nn::{Linear, LinearConfig, Relu},
    tensor::{backend::Backend, Tensor},
};

use super::{Classifier, LayerSummary};

/// Configuration for [`SignDenseNet`]
#[derive(Config, Debug)]
pub struct SignDenseNetConfig {
    /// Number of output classes
    #[config(default = "29")]
    pub num_classes: usize,

    /// Input image size (assumes square, single-channel images)
    #[config(default = "64")]
    pub input_size: usize,

    /// Width of the first hidden layer
    #[config(default = "4096")]
    pub hidden1: usize,

    /// Width of the second hidden layer
    #[config(default = "4096")]
    pub hidden2: usize,

    /// Width of the third hidden layer
    #[config(default = "2000")]
    pub hidden3: usize,
}

/// ASL alphabet fully-connected classifier
#[derive(Module, Debug)]
pub struct SignDenseNet<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    fc3: Linear<B>,
    out: Linear<B>,
    relu: Relu,

    num_classes: usize,
    input_features: usize,
}

impl<B: Backend> SignDenseNet<B> {
    /// Create a new network from configuration
    pub fn new(config: &SignDenseNetConfig, device: &B::Device) -> Self {
        let input_features = config.input_size * config.input_size;

        let fc1 = LinearConfig::new(input_features, config.hidden1).init(device);
        let fc2 = LinearConfig::new(config.hidden1, config.hidden2).init(device);
        let fc3 = LinearConfig::new(config.hidden2, config.hidden3).init(device);
        let out = LinearConfig::new(config.hidden3, config.num_classes).init(device);

        Self {
            fc1,
            fc2,
            fc3,
            out,
            relu: Relu::new(),
            num_classes: config.num_classes,
            input_features,
        }
    }
}

impl<B: Backend> Classifier<B> for SignDenseNet<B> {
    /// Forward pass: `[N, 1, H, W]` images to `[N, num_classes]` logits
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = images.flatten::<2>(1, 3);

        let x = self.relu.forward(self.fc1.forward(x));
        let x = self.relu.forward(self.fc2.forward(x));
        let x = self.relu.forward(self.fc3.forward(x));
        self.out.forward(x)
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn describe(&self) -> Vec<LayerSummary> {
        let n = self.input_features;
        // Linear weights are [d_input, d_output]
        let widths = [&self.fc1, &self.fc2, &self.fc3].map(|fc| fc.weight.dims()[1]);

        let mut layers = vec![LayerSummary {
            name: "flatten".to_string(),
            output_shape: format!("{n}"),
            params: 0,
        }];

        let mut prev = n;
        for (i, width) in widths.into_iter().enumerate() {
            layers.push(LayerSummary {
                name: format!("dense_{}", i + 1),
                output_shape: format!("{width}"),
                params: prev * width + width,
            });
            prev = width;
        }

        layers.push(LayerSummary {
            name: format!("dense_{}", self.num_classes),
            output_shape: format!("{}", self.num_classes),
            params: prev * self.num_classes + self.num_classes,
        });

        layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn small_config() -> SignDenseNetConfig {
        SignDenseNetConfig::new()
            .with_input_size(8)
            .with_hidden1(32)
            .with_hidden2(32)
            .with_hidden3(16)
    }

    #[test]
    fn test_output_shape() {
        let device = Default::default();
        let model = SignDenseNet::<TestBackend>::new(&small_config(), &device);

        let input = Tensor::<TestBackend, 4>::zeros([2, 1, 8, 8], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 29]);
    }

    #[test]
    fn test_default_config_is_the_fixed_architecture() {
        let config = SignDenseNetConfig::new();
        assert_eq!(config.input_size, 64);
        assert_eq!(
            (config.hidden1, config.hidden2, config.hidden3),
            (4096, 4096, 2000)
        );
        assert_eq!(config.num_classes, 29);
    }

    #[test]
    fn test_describe_layer_sizes() {
        let device = Default::default();
        let model = SignDenseNet::<TestBackend>::new(&small_config(), &device);

        let layers = model.describe();
        assert_eq!(layers.len(), 5);
        assert_eq!(layers[0].output_shape, "64");
        assert_eq!(layers[1].params, 64 * 32 + 32);
        assert_eq!(layers.last().unwrap().output_shape, "29");
    }
}
