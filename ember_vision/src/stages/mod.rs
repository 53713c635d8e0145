// The four analysis stages the engine runs per frame, leaves first: color
// segmentation and motion modeling read the raw frame, region extraction
// fuses their masks, and the temporal filter turns per-frame evidence into a
// smoothed, duration-gated signal.

pub mod color;
pub mod motion;
pub mod regions;
pub mod temporal;
