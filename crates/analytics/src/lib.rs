//! Stateless option-chain aggregators.
//!
//! These analyses sit beside the incremental signal engine: each takes a
//! current [`option_pulse_core::ChainSnapshot`] (plus explicit
//! caller-held history where one is needed) and returns a typed report.
//! Nothing here touches the persisted cross-cycle state.

pub mod elasticity;
pub mod max_pain;
pub mod skew;
pub mod zone_pcr;

pub use elasticity::{ElasticityClass, ElasticityConfig, ElasticityReport, StrikeElasticity};
pub use max_pain::{MaxPainReport, OiCluster, PainPoint, ShiftDirection};
pub use skew::atm_iv_skew;
pub use zone_pcr::{DivergenceKind, PcrDivergence, PcrImplication, ZoneOi, ZonePcrReport};
