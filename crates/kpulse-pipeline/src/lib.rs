//! The kpulse news pipeline: collect feeds, translate and classify
//! articles, tag idols and groups, and write weekly roundups.
//!
//! [`Pipeline`] receives its feed fetcher, model client, and store through
//! the traits in [`ports`]; [`Pipeline::from_app_config`] wires the
//! production implementations.

pub mod collector;
pub mod error;
pub mod json_contract;
pub mod ledger;
pub mod model;
pub mod ports;
pub mod report;
pub mod resolver;
pub mod rotation;
pub mod roundup;
pub mod service;
pub mod store;
pub mod tagger;
pub mod translator;

#[cfg(test)]
mod testing;

pub use error::PipelineError;
pub use json_contract::extract_json_object;
pub use ledger::{RunType, TriggerSource};
pub use model::HttpModelClient;
pub use ports::{FeedFetcher, ModelClient, ModelRequest, PipelineStore};
pub use report::{CollectReport, FeedResult, NewsCycleReport, RoundupReport, TranslateReport};
pub use resolver::{source_name_from_url, SourceRef, SourceResolver};
pub use rotation::rotation_batch;
pub use roundup::{previous_week, RoundupWeek};
pub use service::{model_label, Pipeline, PipelineSettings};
pub use store::PgPipelineStore;
pub use tagger::{match_name, EntityIndex, TagSet, TagText};
pub use translator::{clamp_limit, parse_translation};
