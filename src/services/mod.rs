pub mod artifacts;
pub mod corpus;
pub mod encoder;
pub mod model;
pub mod patterns;
pub mod recommender;
pub mod similarity;

pub use artifacts::ArtifactStore;
pub use corpus::{CorpusSource, CsvCorpus, InMemoryCorpus};
pub use model::TrainedModel;
pub use recommender::RecommenderService;
