use candle_core::{D, DType, IndexOp, Result, Tensor};
use candle_nn::{Conv2d, Conv2dConfig, Module, VarBuilder, batch_norm, conv2d, conv2d_no_bias};

/// Depth and width multipliers of a YOLOv8 variant.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Multiples {
    depth: f64,
    width: f64,
    ratio: f64,
}

impl Multiples {
    pub fn n() -> Self {
        Self {
            depth: 0.33,
            width: 0.25,
            ratio: 2.0,
        }
    }

    pub fn s() -> Self {
        Self {
            depth: 0.33,
            width: 0.50,
            ratio: 2.0,
        }
    }

    pub fn m() -> Self {
        Self {
            depth: 0.67,
            width: 0.75,
            ratio: 1.5,
        }
    }

    pub fn l() -> Self {
        Self {
            depth: 1.00,
            width: 1.00,
            ratio: 1.0,
        }
    }

    pub fn x() -> Self {
        Self {
            depth: 1.00,
            width: 1.25,
            ratio: 1.0,
        }
    }

    /// Channels of the three feature maps fed to the detection head.
    fn filters(&self) -> (usize, usize, usize) {
        let f1 = (256. * self.width) as usize;
        let f2 = (512. * self.width) as usize;
        let f3 = (512. * self.width * self.ratio) as usize;
        (f1, f2, f3)
    }

    fn channels(&self, base: f64) -> usize {
        (base * self.width) as usize
    }

    fn repeats(&self, base: f64) -> usize {
        (base * self.depth).round() as usize
    }
}

#[derive(Debug)]
struct Upsample {
    scale_factor: usize,
}

impl Module for Upsample {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let (_b_size, _channels, h, w) = xs.dims4()?;
        xs.upsample_nearest2d(self.scale_factor * h, self.scale_factor * w)
    }
}

/// Convolution with the batch norm folded in, followed by SiLU.
#[derive(Debug)]
struct ConvBlock {
    conv: Conv2d,
    span: tracing::Span,
}

impl ConvBlock {
    fn load(
        vb: VarBuilder,
        c1: usize,
        c2: usize,
        k: usize,
        stride: usize,
        padding: Option<usize>,
    ) -> Result<Self> {
        let cfg = Conv2dConfig {
            padding: padding.unwrap_or(k / 2),
            stride,
            ..Default::default()
        };
        let bn = batch_norm(c2, 1e-3, vb.pp("bn"))?;
        let conv = conv2d_no_bias(c1, c2, k, cfg, vb.pp("conv"))?.absorb_bn(&bn)?;
        Ok(Self {
            conv,
            span: tracing::span!(tracing::Level::TRACE, "conv-block"),
        })
    }
}

impl Module for ConvBlock {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let _enter = self.span.enter();
        let xs = self.conv.forward(xs)?;
        candle_nn::ops::silu(&xs)
    }
}

#[derive(Debug)]
struct Bottleneck {
    cv1: ConvBlock,
    cv2: ConvBlock,
    residual: bool,
}

impl Bottleneck {
    fn load(vb: VarBuilder, c1: usize, c2: usize, shortcut: bool) -> Result<Self> {
        let cv1 = ConvBlock::load(vb.pp("cv1"), c1, c2, 3, 1, None)?;
        let cv2 = ConvBlock::load(vb.pp("cv2"), c2, c2, 3, 1, None)?;
        Ok(Self {
            cv1,
            cv2,
            residual: c1 == c2 && shortcut,
        })
    }
}

impl Module for Bottleneck {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let ys = self.cv2.forward(&self.cv1.forward(xs)?)?;
        if self.residual { xs + ys } else { Ok(ys) }
    }
}

/// CSP bottleneck with two convolutions.
#[derive(Debug)]
struct C2f {
    cv1: ConvBlock,
    cv2: ConvBlock,
    bottleneck: Vec<Bottleneck>,
    span: tracing::Span,
}

impl C2f {
    fn load(vb: VarBuilder, c1: usize, c2: usize, n: usize, shortcut: bool) -> Result<Self> {
        let c = c2 / 2;
        let cv1 = ConvBlock::load(vb.pp("cv1"), c1, 2 * c, 1, 1, None)?;
        let cv2 = ConvBlock::load(vb.pp("cv2"), (2 + n) * c, c2, 1, 1, None)?;
        let bottleneck = (0..n)
            .map(|idx| Bottleneck::load(vb.pp(format!("bottleneck.{idx}")), c, c, shortcut))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            cv1,
            cv2,
            bottleneck,
            span: tracing::span!(tracing::Level::TRACE, "c2f"),
        })
    }
}

impl Module for C2f {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let _enter = self.span.enter();
        let mut ys = self.cv1.forward(xs)?.chunk(2, 1)?;
        for m in self.bottleneck.iter() {
            let last = ys[ys.len() - 1].clone();
            ys.push(m.forward(&last)?);
        }
        let zs = Tensor::cat(ys.as_slice(), 1)?;
        self.cv2.forward(&zs)
    }
}

/// Spatial pyramid pooling, fast variant.
#[derive(Debug)]
struct Sppf {
    cv1: ConvBlock,
    cv2: ConvBlock,
    k: usize,
}

impl Sppf {
    fn load(vb: VarBuilder, c1: usize, c2: usize, k: usize) -> Result<Self> {
        let c_ = c1 / 2;
        let cv1 = ConvBlock::load(vb.pp("cv1"), c1, c_, 1, 1, None)?;
        let cv2 = ConvBlock::load(vb.pp("cv2"), c_ * 4, c2, 1, 1, None)?;
        Ok(Self { cv1, cv2, k })
    }

    fn pool(&self, xs: &Tensor) -> Result<Tensor> {
        let pad = self.k / 2;
        xs.pad_with_zeros(2, pad, pad)?
            .pad_with_zeros(3, pad, pad)?
            .max_pool2d_with_stride(self.k, 1)
    }
}

impl Module for Sppf {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let xs = self.cv1.forward(xs)?;
        let xs2 = self.pool(&xs)?;
        let xs3 = self.pool(&xs2)?;
        let xs4 = self.pool(&xs3)?;
        self.cv2.forward(&Tensor::cat(&[&xs, &xs2, &xs3, &xs4], 1)?)
    }
}

/// Distribution focal loss decoding of box distances.
#[derive(Debug)]
struct Dfl {
    conv: Conv2d,
    bins: usize,
}

impl Dfl {
    fn load(vb: VarBuilder, bins: usize) -> Result<Self> {
        let conv = conv2d_no_bias(bins, 1, 1, Default::default(), vb.pp("conv"))?;
        Ok(Self { conv, bins })
    }
}

impl Module for Dfl {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let (b_sz, _channels, anchors) = xs.dims3()?;
        let xs = xs
            .reshape((b_sz, 4, self.bins, anchors))?
            .transpose(2, 1)?;
        let xs = candle_nn::ops::softmax(&xs, 1)?;
        self.conv.forward(&xs)?.reshape((b_sz, 4, anchors))
    }
}

#[derive(Debug)]
struct DarkNet {
    b1_0: ConvBlock,
    b1_1: ConvBlock,
    b2_0: C2f,
    b2_1: ConvBlock,
    b2_2: C2f,
    b3_0: ConvBlock,
    b3_1: C2f,
    b4_0: ConvBlock,
    b4_1: C2f,
    b5: Sppf,
}

impl DarkNet {
    fn load(vb: VarBuilder, m: Multiples) -> Result<Self> {
        let c64 = m.channels(64.);
        let c128 = m.channels(128.);
        let c256 = m.channels(256.);
        let c512 = m.channels(512.);
        let c_last = (512. * m.width * m.ratio) as usize;
        Ok(Self {
            b1_0: ConvBlock::load(vb.pp("b1.0"), 3, c64, 3, 2, Some(1))?,
            b1_1: ConvBlock::load(vb.pp("b1.1"), c64, c128, 3, 2, Some(1))?,
            b2_0: C2f::load(vb.pp("b2.0"), c128, c128, m.repeats(3.), true)?,
            b2_1: ConvBlock::load(vb.pp("b2.1"), c128, c256, 3, 2, Some(1))?,
            b2_2: C2f::load(vb.pp("b2.2"), c256, c256, m.repeats(6.), true)?,
            b3_0: ConvBlock::load(vb.pp("b3.0"), c256, c512, 3, 2, Some(1))?,
            b3_1: C2f::load(vb.pp("b3.1"), c512, c512, m.repeats(6.), true)?,
            b4_0: ConvBlock::load(vb.pp("b4.0"), c512, c_last, 3, 2, Some(1))?,
            b4_1: C2f::load(vb.pp("b4.1"), c_last, c_last, m.repeats(3.), true)?,
            b5: Sppf::load(vb.pp("b5.0"), c_last, c_last, 5)?,
        })
    }

    fn forward(&self, xs: &Tensor) -> Result<(Tensor, Tensor, Tensor)> {
        let x1 = self.b1_1.forward(&self.b1_0.forward(xs)?)?;
        let x2 = self
            .b2_2
            .forward(&self.b2_1.forward(&self.b2_0.forward(&x1)?)?)?;
        let x3 = self.b3_1.forward(&self.b3_0.forward(&x2)?)?;
        let x4 = self.b4_1.forward(&self.b4_0.forward(&x3)?)?;
        let x5 = self.b5.forward(&x4)?;
        Ok((x2, x3, x5))
    }
}

#[derive(Debug)]
struct YoloV8Neck {
    up: Upsample,
    n1: C2f,
    n2: C2f,
    n3: ConvBlock,
    n4: C2f,
    n5: ConvBlock,
    n6: C2f,
}

impl YoloV8Neck {
    fn load(vb: VarBuilder, m: Multiples) -> Result<Self> {
        let (w, r) = (m.width, m.ratio);
        let n = m.repeats(3.);
        let c256 = m.channels(256.);
        let c512 = m.channels(512.);
        let c768 = m.channels(768.);
        let c_wide = (512. * w * (1. + r)) as usize;
        let c_last = (512. * w * r) as usize;
        Ok(Self {
            up: Upsample { scale_factor: 2 },
            n1: C2f::load(vb.pp("n1"), c_wide, c512, n, false)?,
            n2: C2f::load(vb.pp("n2"), c768, c256, n, false)?,
            n3: ConvBlock::load(vb.pp("n3"), c256, c256, 3, 2, Some(1))?,
            n4: C2f::load(vb.pp("n4"), c768, c512, n, false)?,
            n5: ConvBlock::load(vb.pp("n5"), c512, c512, 3, 2, Some(1))?,
            n6: C2f::load(vb.pp("n6"), c_wide, c_last, n, false)?,
        })
    }

    fn forward(&self, p3: &Tensor, p4: &Tensor, p5: &Tensor) -> Result<(Tensor, Tensor, Tensor)> {
        let x = self
            .n1
            .forward(&Tensor::cat(&[&self.up.forward(p5)?, p4], 1)?)?;
        let head_1 = self
            .n2
            .forward(&Tensor::cat(&[&self.up.forward(&x)?, p3], 1)?)?;
        let head_2 = self
            .n4
            .forward(&Tensor::cat(&[&self.n3.forward(&head_1)?, &x], 1)?)?;
        let head_3 = self
            .n6
            .forward(&Tensor::cat(&[&self.n5.forward(&head_2)?, p5], 1)?)?;
        Ok((head_1, head_2, head_3))
    }
}

type HeadBranch = (ConvBlock, ConvBlock, Conv2d);

#[derive(Debug)]
struct DetectionHead {
    dfl: Dfl,
    cv2: [HeadBranch; 3],
    cv3: [HeadBranch; 3],
    ch: usize,
    no: usize,
}

fn make_anchors(
    feats: [&Tensor; 3],
    strides: [usize; 3],
    grid_cell_offset: f64,
) -> Result<(Tensor, Tensor)> {
    let dev = feats[0].device();
    let mut anchor_points = Vec::with_capacity(3);
    let mut stride_tensor = Vec::with_capacity(3);
    for (xs, stride) in feats.into_iter().zip(strides) {
        // only the spatial dims of xs are used
        let (_, _, h, w) = xs.dims4()?;
        let sx = (Tensor::arange(0, w as u32, dev)?.to_dtype(DType::F32)? + grid_cell_offset)?;
        let sy = (Tensor::arange(0, h as u32, dev)?.to_dtype(DType::F32)? + grid_cell_offset)?;
        let sx = sx.reshape((1, w))?.repeat((h, 1))?.flatten_all()?;
        let sy = sy.reshape((h, 1))?.repeat((1, w))?.flatten_all()?;
        anchor_points.push(Tensor::stack(&[&sx, &sy], D::Minus1)?);
        stride_tensor.push((Tensor::ones(h * w, DType::F32, dev)? * stride as f64)?);
    }
    let anchor_points = Tensor::cat(anchor_points.as_slice(), 0)?;
    let stride_tensor = Tensor::cat(stride_tensor.as_slice(), 0)?.unsqueeze(1)?;
    Ok((anchor_points, stride_tensor))
}

/// Converts left-top/right-bottom distances into center-size boxes.
fn dist2bbox(distance: &Tensor, anchor_points: &Tensor) -> Result<Tensor> {
    let chunks = distance.chunk(2, 1)?;
    let x1y1 = anchor_points.sub(&chunks[0])?;
    let x2y2 = anchor_points.add(&chunks[1])?;
    let c_xy = ((&x1y1 + &x2y2)? * 0.5)?;
    let wh = (&x2y2 - &x1y1)?;
    Tensor::cat(&[c_xy, wh], 1)
}

impl DetectionHead {
    fn load(vb: VarBuilder, nc: usize, filters: (usize, usize, usize)) -> Result<Self> {
        let ch = 16;
        let dfl = Dfl::load(vb.pp("dfl"), ch)?;
        let c1 = usize::max(filters.0, nc.min(100));
        let c2 = usize::max(filters.0 / 4, ch * 4);
        let cv3 = [
            Self::load_branch(vb.pp("cv3.0"), filters.0, c1, nc)?,
            Self::load_branch(vb.pp("cv3.1"), filters.1, c1, nc)?,
            Self::load_branch(vb.pp("cv3.2"), filters.2, c1, nc)?,
        ];
        let cv2 = [
            Self::load_branch(vb.pp("cv2.0"), filters.0, c2, 4 * ch)?,
            Self::load_branch(vb.pp("cv2.1"), filters.1, c2, 4 * ch)?,
            Self::load_branch(vb.pp("cv2.2"), filters.2, c2, 4 * ch)?,
        ];
        Ok(Self {
            dfl,
            cv2,
            cv3,
            ch,
            no: nc + ch * 4,
        })
    }

    fn load_branch(vb: VarBuilder, filter: usize, hidden: usize, out: usize) -> Result<HeadBranch> {
        let block0 = ConvBlock::load(vb.pp("0"), filter, hidden, 3, 1, None)?;
        let block1 = ConvBlock::load(vb.pp("1"), hidden, hidden, 3, 1, None)?;
        let conv = conv2d(hidden, out, 1, Default::default(), vb.pp("2"))?;
        Ok((block0, block1, conv))
    }

    fn forward_branch(branch: &HeadBranch, xs: &Tensor) -> Result<Tensor> {
        let xs = branch.0.forward(xs)?;
        let xs = branch.1.forward(&xs)?;
        branch.2.forward(&xs)
    }

    fn forward(&self, xs0: &Tensor, xs1: &Tensor, xs2: &Tensor) -> Result<Tensor> {
        let forward_cv = |xs: &Tensor, i: usize| {
            let box_ = Self::forward_branch(&self.cv2[i], xs)?;
            let cls = Self::forward_branch(&self.cv3[i], xs)?;
            Tensor::cat(&[&box_, &cls], 1)
        };
        let xs0 = forward_cv(xs0, 0)?;
        let xs1 = forward_cv(xs1, 1)?;
        let xs2 = forward_cv(xs2, 2)?;

        let (anchors, strides) = make_anchors([&xs0, &xs1, &xs2], [8, 16, 32], 0.5)?;
        let anchors = anchors.transpose(0, 1)?.unsqueeze(0)?;
        let strides = strides.transpose(0, 1)?;

        let reshape = |xs: &Tensor| {
            let d = xs.dim(0)?;
            let el = xs.elem_count();
            xs.reshape((d, self.no, el / (d * self.no)))
        };
        let x_cat = Tensor::cat(&[reshape(&xs0)?, reshape(&xs1)?, reshape(&xs2)?], 2)?;
        let box_ = x_cat.i((.., ..self.ch * 4))?;
        let cls = x_cat.i((.., self.ch * 4..))?;

        let dbox = dist2bbox(&self.dfl.forward(&box_)?, &anchors)?;
        let dbox = dbox.broadcast_mul(&strides)?;
        Tensor::cat(&[dbox, candle_nn::ops::sigmoid(&cls)?], 1)
    }
}

/// YOLOv8 detection network: backbone, neck and head.
///
/// The forward pass returns a `(batch, 4 + num_classes, anchors)` tensor
/// holding `cx, cy, w, h` in input pixels followed by per-class scores.
#[derive(Debug)]
pub struct YoloV8 {
    net: DarkNet,
    fpn: YoloV8Neck,
    head: DetectionHead,
    span: tracing::Span,
}

impl YoloV8 {
    pub fn load(vb: VarBuilder, m: Multiples, num_classes: usize) -> Result<Self> {
        let net = DarkNet::load(vb.pp("net"), m)?;
        let fpn = YoloV8Neck::load(vb.pp("fpn"), m)?;
        let head = DetectionHead::load(vb.pp("head"), num_classes, m.filters())?;
        Ok(Self {
            net,
            fpn,
            head,
            span: tracing::span!(tracing::Level::TRACE, "yolo-v8"),
        })
    }
}

impl Module for YoloV8 {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let _enter = self.span.enter();
        let (xs1, xs2, xs3) = self.net.forward(xs)?;
        let (xs1, xs2, xs3) = self.fpn.forward(&xs1, &xs2, &xs3)?;
        self.head.forward(&xs1, &xs2, &xs3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_multiples_filters() {
        assert_eq!(Multiples::n().filters(), (64, 128, 256));
        assert_eq!(Multiples::l().filters(), (256, 512, 512));
    }

    #[test]
    fn test_make_anchors() -> Result<()> {
        let dev = Device::Cpu;
        let f0 = Tensor::zeros((1, 1, 2, 2), DType::F32, &dev)?;
        let f1 = Tensor::zeros((1, 1, 1, 1), DType::F32, &dev)?;
        let f2 = Tensor::zeros((1, 1, 1, 1), DType::F32, &dev)?;
        let (anchors, strides) = make_anchors([&f0, &f1, &f2], [8, 16, 32], 0.5)?;
        assert_eq!(anchors.dims(), &[6, 2]);
        assert_eq!(strides.dims(), &[6, 1]);
        let anchors = anchors.to_vec2::<f32>()?;
        assert_eq!(anchors[0], vec![0.5, 0.5]);
        assert_eq!(anchors[1], vec![1.5, 0.5]);
        assert_eq!(anchors[2], vec![0.5, 1.5]);
        let strides = strides.flatten_all()?.to_vec1::<f32>()?;
        assert_eq!(strides, vec![8., 8., 8., 8., 16., 32.]);
        Ok(())
    }

    #[test]
    fn test_dist2bbox() -> Result<()> {
        let dev = Device::Cpu;
        // one anchor at (10, 20), distances l=1 t=2 r=3 b=4
        let distance = Tensor::new(&[[[1f32], [2.], [3.], [4.]]], &dev)?;
        let anchors = Tensor::new(&[[[10f32], [20.]]], &dev)?;
        let bbox = dist2bbox(&distance, &anchors)?.flatten_all()?.to_vec1::<f32>()?;
        assert_eq!(bbox, vec![11., 21., 4., 6.]);
        Ok(())
    }

    #[test]
    fn test_load_with_zero_weights() -> Result<()> {
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let model = YoloV8::load(vb, Multiples::n(), 4)?;
        assert_eq!(model.head.no, 4 + 64);
        Ok(())
    }
}
