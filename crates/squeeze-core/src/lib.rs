pub mod codec;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod model;
pub mod progress;
pub mod scanner;

pub use codec::{Codec, CodecError, WebpLosslessCodec};
pub use config::AppConfig;
pub use convert::disposal::{DisposalError, DisposalSummary, SystemTrash, Trash};
pub use engine::{BatchResult, ConvertEngine};
pub use error::Error;
pub use model::{BatchProgress, CandidateSet, ConversionOutcome, SourceFile};
pub use progress::{ProgressReporter, SilentReporter};
