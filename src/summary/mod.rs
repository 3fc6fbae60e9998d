pub mod client;
pub mod fallback;
pub mod service;

pub use client::{OpenAiClient, OpenAiConfig, RemoteError, RemoteSummarizer};
pub use fallback::fallback_summary;
pub use service::{
    FallbackNote, InFlight, Provider, SummaryRequest, SummaryResponse, SummaryService,
};
