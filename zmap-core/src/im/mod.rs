mod batch;

pub use batch::ImageBatch;
