//! Convolutional architecture
//!
//! Three blocks of [conv(k4, s1) → conv(k4, s2) → dropout] with channel
//! widths 64 → 128 → 256 (no dropout after the last block), followed by
//! batch normalization, flatten, dropout, a 512-unit dense layer, and the
//! 29-way output head. Convolutions are unpadded, so a 64×64 input shrinks
//! to 3×3 spatial resolution before the head.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, Relu,
    },
    tensor::{backend::Backend, Tensor},
};

use super::{conv_out, Classifier, LayerSummary};

/// Configuration for [`SignConvNet`]
#[derive(Config, Debug)]
pub struct SignConvNetConfig {
    /// Number of output classes
    #[config(default = "29")]
    pub num_classes: usize,

    /// Input image size (assumes square images)
    #[config(default = "64")]
    pub input_size: usize,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Dropout rate after each downsampling block and before the head
    #[config(default = "0.5")]
    pub dropout_rate: f64,
}

/// A pair of convolutions, the second strided for downsampling, with an
/// optional trailing dropout
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv_a: Conv2d<B>,
    conv_b: Conv2d<B>,
    relu: Relu,
    dropout: Option<Dropout>,
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        dropout_rate: Option<f64>,
        device: &B::Device,
    ) -> Self {
        let conv_a = Conv2dConfig::new([in_channels, out_channels], [4, 4]).init(device);
        let conv_b = Conv2dConfig::new([out_channels, out_channels], [4, 4])
            .with_stride([2, 2])
            .init(device);
        let dropout = dropout_rate.map(|rate| DropoutConfig::new(rate).init());

        Self {
            conv_a,
            conv_b,
            relu: Relu::new(),
            dropout,
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.relu.forward(self.conv_a.forward(x));
        let x = self.relu.forward(self.conv_b.forward(x));

        match &self.dropout {
            Some(dropout) => dropout.forward(x),
            None => x,
        }
    }
}

/// ASL alphabet convolutional classifier
#[derive(Module, Debug)]
pub struct SignConvNet<B: Backend> {
    block1: ConvBlock<B>,
    block2: ConvBlock<B>,
    block3: ConvBlock<B>,
    norm: BatchNorm<B, 2>,
    dropout: Dropout,
    fc1: Linear<B>,
    relu: Relu,
    fc2: Linear<B>,

    num_classes: usize,
    in_channels: usize,
    input_size: usize,
    feature_side: usize,
}

impl<B: Backend> SignConvNet<B> {
    /// Create a new network from configuration
    pub fn new(config: &SignConvNetConfig, device: &B::Device) -> Self {
        let block1 = ConvBlock::new(config.in_channels, 64, Some(config.dropout_rate), device);
        let block2 = ConvBlock::new(64, 128, Some(config.dropout_rate), device);
        let block3 = ConvBlock::new(128, 256, None, device);

        let norm = BatchNormConfig::new(256).init(device);

        let feature_side = Self::spatial_out(config.input_size);
        let flat_features = 256 * feature_side * feature_side;

        let dropout = DropoutConfig::new(config.dropout_rate).init();
        let fc1 = LinearConfig::new(flat_features, 512).init(device);
        let fc2 = LinearConfig::new(512, config.num_classes).init(device);

        Self {
            block1,
            block2,
            block3,
            norm,
            dropout,
            fc1,
            relu: Relu::new(),
            fc2,
            num_classes: config.num_classes,
            in_channels: config.in_channels,
            input_size: config.input_size,
            feature_side,
        }
    }

    /// Spatial side length after the three unpadded blocks
    fn spatial_out(input_size: usize) -> usize {
        let mut size = input_size;
        for _ in 0..3 {
            size = conv_out(size, 4, 1);
            size = conv_out(size, 4, 2);
        }
        size
    }
}

impl<B: Backend> Classifier<B> for SignConvNet<B> {
    /// Forward pass: `[N, 3, H, W]` images to `[N, num_classes]` logits
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.block1.forward(images);
        let x = self.block2.forward(x);
        let x = self.block3.forward(x);

        let x = self.norm.forward(x);

        let x = x.flatten::<2>(1, 3);
        let x = self.dropout.forward(x);

        let x = self.relu.forward(self.fc1.forward(x));
        self.fc2.forward(x)
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn describe(&self) -> Vec<LayerSummary> {
        let side = |n: usize| -> (usize, usize) {
            // (after conv_a, after conv_b) for a block starting at n
            (conv_out(n, 4, 1), conv_out(conv_out(n, 4, 1), 4, 2))
        };

        let mut layers = Vec::new();
        let widths = [(self.in_channels, 64), (64, 128), (128, 256)];
        let mut current = self.input_size;
        for (i, (cin, cout)) in widths.iter().enumerate() {
            let (a, b) = side(current);
            layers.push(LayerSummary {
                name: format!("conv2d_{}a (k4 s1)", i + 1),
                output_shape: format!("{cout}×{a}×{a}"),
                params: cin * cout * 16 + cout,
            });
            layers.push(LayerSummary {
                name: format!("conv2d_{}b (k4 s2)", i + 1),
                output_shape: format!("{cout}×{b}×{b}"),
                params: cout * cout * 16 + cout,
            });
            if i < 2 {
                layers.push(LayerSummary {
                    name: format!("dropout_{}", i + 1),
                    output_shape: format!("{cout}×{b}×{b}"),
                    params: 0,
                });
            }
            current = b;
        }

        let flat = 256 * self.feature_side * self.feature_side;
        layers.push(LayerSummary {
            name: "batch_norm".to_string(),
            output_shape: format!("256×{}×{}", self.feature_side, self.feature_side),
            params: 2 * 256,
        });
        layers.push(LayerSummary {
            name: "flatten".to_string(),
            output_shape: format!("{flat}"),
            params: 0,
        });
        layers.push(LayerSummary {
            name: "dropout_head".to_string(),
            output_shape: format!("{flat}"),
            params: 0,
        });
        layers.push(LayerSummary {
            name: "dense_512".to_string(),
            output_shape: "512".to_string(),
            params: flat * 512 + 512,
        });
        layers.push(LayerSummary {
            name: format!("dense_{}", self.num_classes),
            output_shape: format!("{}", self.num_classes),
            params: 512 * self.num_classes + self.num_classes,
        });

        layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_output_shape() {
        let device = Default::default();
        let config = SignConvNetConfig::new();
        let model = SignConvNet::<TestBackend>::new(&config, &device);

        let input = Tensor::<TestBackend, 4>::zeros([2, 3, 64, 64], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 29]);
    }

    #[test]
    fn test_spatial_out() {
        assert_eq!(SignConvNet::<TestBackend>::spatial_out(64), 3);
    }

    #[test]
    fn test_softmax_rows_are_distributions() {
        let device = Default::default();
        let config = SignConvNetConfig::new();
        let model = SignConvNet::<TestBackend>::new(&config, &device);

        let input = Tensor::<TestBackend, 4>::ones([1, 3, 64, 64], &device);
        let probs: Vec<f32> = model.forward_softmax(input).into_data().to_vec().unwrap();

        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_describe_covers_all_layers() {
        let device = Default::default();
        let config = SignConvNetConfig::new();
        let model = SignConvNet::<TestBackend>::new(&config, &device);

        let layers = model.describe();
        assert_eq!(layers.len(), 13);
        assert_eq!(layers.last().unwrap().output_shape, "29");
    }
}
