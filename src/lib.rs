//! # Capbox Optimizer Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Ottimizzazione post-build degli asset JS di un progetto Capacitor
//! - Downlevel + minify in-place di ogni file `.js` della build
//! - Artefatti `.gz` / `.br` affiancati quando la piattaforma è `pwa`
//! - Build di release Android tramite il wrapper Gradle
//!
//! ## Architettura dei moduli:
//! - `config`: configurazione, ambiente e `capacitor.config.json`
//! - `error`: tipi di errore per stage e per run
//! - `file_manager`: classificazione dei file candidati
//! - `external_tool` / `tool_resolver` / `platform`: lancio dei tool esterni
//! - `stages`: le singole trasformazioni
//! - `pipeline`: sequenza ordinata di stage per un file
//! - `optimizer`: orchestratore e progress tracking
//! - `progress` / `json_output`: feedback per utenti e processi padre
//! - `android`: build di release nativa
//!
//! ## Utilizzo:
//! ```rust,no_run
//! # async fn demo() -> Result<(), capbox_optimizer::OptimizeError> {
//! use capbox_optimizer::{AssetOptimizer, Config};
//!
//! let config = Config::from_env();
//! let optimizer = AssetOptimizer::new(config)?;
//! optimizer.run().await?.into_result()?;
//! # Ok(())
//! # }
//! ```

pub mod utils;

pub mod android;
pub mod config;
pub mod error;
pub mod external_tool;
pub mod file_manager;
pub mod json_output;
pub mod optimizer;
pub mod pipeline;
pub mod platform;
pub mod progress;
pub mod stages;
pub mod tool_resolver;

pub use android::AndroidBuilder;
pub use config::Config;
pub use error::{OptimizeError, StageError};
pub use external_tool::{ExternalTool, SystemTool, ToolOutput};
pub use file_manager::CandidateFile;
pub use optimizer::{AggregateOutcome, AssetOptimizer, RunReport};
pub use pipeline::{FilePipeline, PipelineResult};
pub use stages::TransformStage;
