//! skilltime - skill execution-time lookup data
//!
//! This library derives execution-duration records for named skills from two
//! sources: status events recorded by the skiller blackboard logger, and
//! samples of a bounded Gaussian mixture. Both produce [`lookup::LookupEntry`]
//! documents for the lookup execution-time estimator.

pub mod arguments;
pub mod cli;
pub mod config;
pub mod duration;
pub mod error;
pub mod event;
pub mod generate;
pub mod lookup;
pub mod mixture;
pub mod pairing;
pub mod skill_string;
pub mod store;
pub mod transform;

pub use error::{Result, SkillTimeError};
