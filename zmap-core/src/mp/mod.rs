pub mod extract;
pub mod fft;
pub mod moments;
pub mod states;
pub mod symmetry;
pub mod transform;

pub use extract::{Extractor, ExtractorConfig, Method, Projection, decompose};
pub use moments::{MomentArray, MomentData, Norm};
pub use states::States;
